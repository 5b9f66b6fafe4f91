//! Read-side caching for the public ad listing.
//!
//! Two tiers back every public read: a process-local [`store::SnapshotStore`]
//! with a short freshness window, and a durable JSON snapshot file managed by
//! [`snapshot::SnapshotManager`] that survives restarts. Mutations flow
//! through [`trigger::CacheTrigger`], which invalidates synchronously and
//! hands the rebuild to [`consumer::CacheConsumer`] off the request path.

pub mod config;
pub mod consumer;
pub mod events;
pub(crate) mod lock;
pub mod snapshot;
pub mod store;
pub mod trigger;

pub use config::CacheConfig;
pub use consumer::CacheConsumer;
pub use events::{CacheEvent, EventKind, EventQueue};
pub use snapshot::{SnapshotDocument, SnapshotError, SnapshotManager};
pub use store::{CacheEntry, SnapshotRead, SnapshotStore};
pub use trigger::CacheTrigger;
