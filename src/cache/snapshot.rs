//! Durable snapshot of the approved-ad payload.
//!
//! The snapshot is a single JSON document on disk. Rebuilds write a
//! temporary file next to the target and rename it into place, so readers
//! only ever observe a complete document. The same rebuild also primes the
//! in-memory [`SnapshotStore`] so both tiers move together.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

use crate::application::repos::{AdsRepo, RepoError};
use crate::domain::ads::{self, PublicAd};

use super::store::SnapshotStore;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot read failed: {0}")]
    Read(#[from] std::io::Error),
    #[error("snapshot document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("snapshot rebuild query failed: {0}")]
    Source(#[from] RepoError),
    #[error("snapshot timestamp is malformed: {0}")]
    Timestamp(#[from] time::error::Parse),
}

/// On-disk snapshot layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    /// RFC 3339 capture instant.
    pub generated_at: String,
    pub count: usize,
    pub ads: Vec<PublicAd>,
}

impl SnapshotDocument {
    pub fn generated_at(&self) -> Result<OffsetDateTime, time::error::Parse> {
        OffsetDateTime::parse(&self.generated_at, &Rfc3339)
    }
}

pub struct SnapshotManager {
    path: PathBuf,
    file_ttl: Duration,
    store: Arc<SnapshotStore>,
    repo: Arc<dyn AdsRepo>,
}

impl SnapshotManager {
    pub fn new(
        path: impl Into<PathBuf>,
        file_ttl: Duration,
        store: Arc<SnapshotStore>,
        repo: Arc<dyn AdsRepo>,
    ) -> Self {
        Self {
            path: path.into(),
            file_ttl,
            store,
            repo,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Query the full approved set, persist it, and prime the memory tier.
    pub async fn rebuild(&self) -> Result<usize, SnapshotError> {
        let started = std::time::Instant::now();
        let mut ads = self.repo.list_approved_public().await?;
        // The query already orders; keep the comparator authoritative.
        ads.sort_by(ads::canonical_order);

        let captured_at = OffsetDateTime::now_utc();
        let document = SnapshotDocument {
            generated_at: captured_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| captured_at.to_string()),
            count: ads.len(),
            ads,
        };

        self.write_atomic(&document).await?;
        let ads = Arc::new(document.ads);
        self.store.put_captured_at(Arc::clone(&ads), captured_at);

        metrics::histogram!("bazari_snapshot_rebuild_seconds")
            .record(started.elapsed().as_secs_f64());
        info!(count = ads.len(), path = %self.path.display(), "snapshot rebuilt");
        Ok(ads.len())
    }

    /// Read and parse the snapshot file, no freshness judgment.
    pub async fn read_document(&self) -> Result<SnapshotDocument, SnapshotError> {
        let raw = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Serve-from-file startup path.
    ///
    /// A snapshot younger than the file TTL primes the memory tier with its
    /// original capture instant and skips the database entirely. Anything
    /// else (missing, malformed, expired) falls through to a synchronous
    /// rebuild so the process never starts cold.
    pub async fn load_on_startup(&self) -> Result<usize, SnapshotError> {
        match self.read_document().await {
            Ok(document) => match document.generated_at() {
                Ok(captured_at) => {
                    let age = OffsetDateTime::now_utc() - captured_at;
                    if age >= time::Duration::ZERO && age <= self.file_ttl {
                        let count = document.count;
                        self.store
                            .put_captured_at(Arc::new(document.ads), captured_at);
                        info!(
                            count,
                            age_seconds = age.whole_seconds(),
                            "warm start from snapshot file"
                        );
                        metrics::counter!("bazari_snapshot_warm_start_total").increment(1);
                        return Ok(count);
                    }
                    debug!(
                        age_seconds = age.whole_seconds(),
                        "snapshot file expired, rebuilding"
                    );
                }
                Err(err) => {
                    warn!(error = %err, "snapshot timestamp unreadable, rebuilding");
                }
            },
            Err(SnapshotError::Read(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no snapshot file, rebuilding");
            }
            Err(err) => {
                warn!(error = %err, "snapshot file unreadable, rebuilding");
            }
        }
        self.rebuild().await
    }

    async fn write_atomic(&self, document: &SnapshotDocument) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec(document)?;
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
