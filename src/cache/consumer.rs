//! Event consumer that folds queued invalidation events into rebuilds.
//!
//! However many events are pending, one batch produces at most one snapshot
//! rebuild. Rebuild failures are logged here and never surfaced; the caches
//! simply stay invalidated until the next event or interval tick.

use std::sync::Arc;

use tracing::{debug, error};

use super::config::CacheConfig;
use super::events::EventQueue;
use super::snapshot::SnapshotManager;

pub struct CacheConsumer {
    config: CacheConfig,
    queue: Arc<EventQueue>,
    snapshots: Arc<SnapshotManager>,
}

impl CacheConsumer {
    pub fn new(
        config: CacheConfig,
        queue: Arc<EventQueue>,
        snapshots: Arc<SnapshotManager>,
    ) -> Self {
        Self {
            config,
            queue,
            snapshots,
        }
    }

    /// Drain one batch and rebuild once if anything was pending. Returns the
    /// number of events consumed.
    pub async fn consume(&self) -> usize {
        let events = self.queue.drain(self.config.consume_batch_limit);
        if events.is_empty() {
            return 0;
        }
        let last_epoch = events.last().map(|event| event.epoch).unwrap_or_default();
        debug!(
            count = events.len(),
            epoch = last_epoch,
            "consuming cache events"
        );

        match self.snapshots.rebuild().await {
            Ok(count) => {
                metrics::counter!("bazari_cache_events_consumed_total")
                    .increment(events.len() as u64);
                debug!(count, epoch = last_epoch, "rebuild complete");
            }
            Err(err) => {
                metrics::counter!("bazari_cache_rebuild_failed_total").increment(1);
                error!(error = %err, epoch = last_epoch, "snapshot rebuild failed");
            }
        }
        events.len()
    }
}
