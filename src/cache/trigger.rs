//! Invalidation entry point for everything that mutates ads.
//!
//! Each trigger does two things in order: synchronously drop the in-memory
//! payload (so the very next read cannot observe the pre-mutation world),
//! then publish an event and kick the consumer on a detached task. Callers
//! never wait for the rebuild.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::config::CacheConfig;
use super::consumer::CacheConsumer;
use super::events::{EventKind, EventQueue};
use super::store::SnapshotStore;

pub struct CacheTrigger {
    config: CacheConfig,
    store: Arc<SnapshotStore>,
    queue: Arc<EventQueue>,
    consumer: Arc<CacheConsumer>,
}

impl CacheTrigger {
    pub fn new(
        config: CacheConfig,
        store: Arc<SnapshotStore>,
        queue: Arc<EventQueue>,
        consumer: Arc<CacheConsumer>,
    ) -> Self {
        Self {
            config,
            store,
            queue,
            consumer,
        }
    }

    pub fn ad_submitted(&self, ad_id: Uuid) {
        self.fire(EventKind::AdSubmitted { ad_id });
    }

    pub fn ad_approved(&self, ad_id: Uuid) {
        self.fire(EventKind::AdApproved { ad_id });
    }

    pub fn ad_rejected(&self, ad_id: Uuid) {
        self.fire(EventKind::AdRejected { ad_id });
    }

    pub fn ad_edited(&self, ad_id: Uuid) {
        self.fire(EventKind::AdEdited { ad_id });
    }

    pub fn ad_deleted(&self, ad_id: Uuid) {
        self.fire(EventKind::AdDeleted { ad_id });
    }

    pub fn user_purged(&self, user_id: Uuid) {
        self.fire(EventKind::UserPurged { user_id });
    }

    pub fn rebuild_requested(&self) {
        self.fire(EventKind::RebuildRequested);
    }

    pub fn warmup_on_startup(&self) {
        if !self.config.enabled {
            return;
        }
        self.queue.publish(EventKind::WarmupOnStartup);
        self.spawn_consume();
    }

    fn fire(&self, kind: EventKind) {
        if !self.config.enabled {
            return;
        }
        // Invalidate before the caller's response leaves the process.
        self.store.invalidate();
        debug!(?kind, "cache invalidated");
        self.queue.publish(kind);
        self.spawn_consume();
    }

    fn spawn_consume(&self) {
        let consumer = Arc::clone(&self.consumer);
        tokio::spawn(async move {
            consumer.consume().await;
        });
    }
}
