//! In-memory snapshot cache.
//!
//! Holds at most one authoritative copy of the published-ad set per process.
//! Mutations are whole-payload swaps, so readers never observe a partially
//! updated payload; concurrent writers race on last-write-wins, which is
//! acceptable because every write is derived from the same store.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use metrics::counter;
use time::OffsetDateTime;

use crate::domain::ads::PublicAd;

use super::lock::{read_guard, write_guard};

const METRIC_MEMORY_HIT: &str = "bazari_cache_memory_hit_total";
const METRIC_MEMORY_MISS: &str = "bazari_cache_memory_miss_total";

/// A captured, timestamped copy of the approved-ad set.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub ads: Arc<Vec<PublicAd>>,
    pub captured_at: OffsetDateTime,
}

impl CacheEntry {
    pub fn age(&self, now: OffsetDateTime) -> Duration {
        (now - self.captured_at).try_into().unwrap_or(Duration::ZERO)
    }
}

/// Outcome of a snapshot read.
#[derive(Debug, Clone)]
pub enum SnapshotRead {
    /// Payload exists and is inside the freshness window.
    Fresh(CacheEntry),
    /// Payload exists but has outlived the freshness window. Only served
    /// when a refill fails (stale-but-served policy).
    Stale(CacheEntry),
    /// No payload at all.
    Miss,
}

/// Process-local snapshot cache with a bounded freshness window.
pub struct SnapshotStore {
    entry: RwLock<Option<CacheEntry>>,
    ttl: Duration,
}

impl SnapshotStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    /// Read the cached payload, classified by age against the freshness
    /// window. `Stale` is returned (not `Miss`) so callers can fall back to
    /// it when the store is unreachable.
    pub fn get(&self) -> SnapshotRead {
        self.get_at(OffsetDateTime::now_utc())
    }

    pub fn get_at(&self, now: OffsetDateTime) -> SnapshotRead {
        let guard = read_guard(&self.entry, "store.get");
        match guard.as_ref() {
            Some(entry) if entry.age(now) < self.ttl => {
                counter!(METRIC_MEMORY_HIT).increment(1);
                SnapshotRead::Fresh(entry.clone())
            }
            Some(entry) => {
                counter!(METRIC_MEMORY_MISS).increment(1);
                SnapshotRead::Stale(entry.clone())
            }
            None => {
                counter!(METRIC_MEMORY_MISS).increment(1);
                SnapshotRead::Miss
            }
        }
    }

    /// Atomically replace the payload and reset its capture timestamp. The
    /// prior payload is discarded, never merged.
    pub fn put(&self, ads: Arc<Vec<PublicAd>>) {
        self.put_captured_at(ads, OffsetDateTime::now_utc());
    }

    /// Replace the payload with an explicit capture timestamp. Used when
    /// priming from the durable snapshot file, whose `generatedAt` is the
    /// honest capture time.
    pub fn put_captured_at(&self, ads: Arc<Vec<PublicAd>>, captured_at: OffsetDateTime) {
        let entry = CacheEntry { ads, captured_at };
        *write_guard(&self.entry, "store.put") = Some(entry);
    }

    /// Drop the payload immediately regardless of age. The next `get` is a
    /// guaranteed miss.
    pub fn invalidate(&self) {
        *write_guard(&self.entry, "store.invalidate") = None;
    }

    /// Return whatever payload exists, fresh or stale. Fallback path for
    /// store outages.
    pub fn peek_any(&self) -> Option<CacheEntry> {
        read_guard(&self.entry, "store.peek_any").clone()
    }
}
