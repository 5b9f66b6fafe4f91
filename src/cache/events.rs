//! Cache event system.
//!
//! Defines invalidation events and an in-memory queue connecting write
//! operations to the background rebuild consumer.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::lock::queue_guard;

/// Monotonic epoch for ordering events within this process.
pub type Epoch = u64;

/// Cache event with idempotency and ordering support.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Unique identifier for idempotency (UUIDv4).
    pub id: Uuid,
    /// Monotonic epoch for ordering within this process.
    pub epoch: Epoch,
    /// The type of cache event.
    pub kind: EventKind,
    /// When the event was created.
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Mutations that schedule a durable snapshot rebuild.
///
/// Every kind coalesces to the same rebuild; the distinction exists for
/// observability and for the startup warmup path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A new ad was submitted (pending; no effect on the approved set, but
    /// the snapshot is kept consistent anyway).
    AdSubmitted { ad_id: Uuid },
    /// An ad was approved.
    AdApproved { ad_id: Uuid },
    /// An ad was rejected.
    AdRejected { ad_id: Uuid },
    /// An ad was edited by its owner (demoted to pending).
    AdEdited { ad_id: Uuid },
    /// An ad was deleted.
    AdDeleted { ad_id: Uuid },
    /// A user was removed along with all of their ads.
    UserPurged { user_id: Uuid },
    /// Manual rebuild request (admin endpoint or CLI).
    RebuildRequested,
    /// Prime the cache on application startup.
    WarmupOnStartup,
}

/// In-memory event queue for snapshot rebuilds.
///
/// Events are published by write operations and consumed by the cache
/// consumer. A mutex suffices since contention is expected to be low.
pub struct EventQueue {
    queue: Mutex<VecDeque<CacheEvent>>,
    epoch_counter: AtomicU64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
        }
    }

    /// Get the next epoch number.
    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish an event to the queue.
    pub fn publish(&self, kind: EventKind) {
        let epoch = self.next_epoch();
        let event = CacheEvent::new(kind.clone(), epoch);

        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?kind,
            "Cache event enqueued"
        );

        queue_guard(&self.queue, "events.publish").push_back(event);
    }

    /// Drain up to `limit` events from the queue, FIFO.
    pub fn drain(&self, limit: usize) -> Vec<CacheEvent> {
        let mut queue = queue_guard(&self.queue, "events.drain");
        let count = limit.min(queue.len());
        queue.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        queue_guard(&self.queue, "events.len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        queue_guard(&self.queue, "events.clear").clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
