//! Public listing reads over the snapshot tiers.
//!
//! Every public listing request resolves a base payload through the same
//! ladder: fresh memory, then fresh snapshot file, then the database. When
//! the database is unreachable the newest payload on hand is served marked
//! stale rather than failing the request. Filtering and pagination always
//! run over the full cached payload, never against the database.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::application::repos::{AdsRepo, RepoError};
use crate::cache::config::CacheConfig;
use crate::cache::snapshot::SnapshotManager;
use crate::cache::store::{SnapshotRead, SnapshotStore};
use crate::domain::ads::{self, PublicAd};
use crate::domain::types::Category;

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("listing payload is unavailable")]
    Unavailable,
}

/// Where the base payload came from, for logs and response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    Memory,
    File,
    Database,
}

impl PayloadSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Database => "database",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ListingPage {
    pub ads: Vec<PublicAd>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub stale: bool,
    pub source: PayloadSource,
}

/// Full payload with provenance, for the cache endpoint and stats.
#[derive(Debug, Clone)]
pub struct BasePayload {
    pub ads: Arc<Vec<PublicAd>>,
    pub captured_at: OffsetDateTime,
    pub stale: bool,
    pub source: PayloadSource,
}

pub struct ListingService {
    store: Arc<SnapshotStore>,
    snapshots: Arc<SnapshotManager>,
    repo: Arc<dyn AdsRepo>,
    cache_enabled: bool,
    file_ttl: Duration,
    store_query_timeout: Duration,
}

impl ListingService {
    pub fn new(
        store: Arc<SnapshotStore>,
        snapshots: Arc<SnapshotManager>,
        repo: Arc<dyn AdsRepo>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            store,
            snapshots,
            repo,
            cache_enabled: config.enabled,
            file_ttl: config.file_ttl(),
            store_query_timeout: config.store_query_timeout(),
        }
    }

    /// Filtered, paginated listing page.
    pub async fn list(&self, query: ListingQuery) -> Result<ListingPage, ListingError> {
        let base = self.resolve_base().await?;
        let filtered = Self::filter(&base.ads, &query);
        let (page, limit) = Self::clamp(query.page, query.limit);

        let total = filtered.len();
        let start = (page - 1).saturating_mul(limit);
        let ads = filtered
            .into_iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect();

        Ok(ListingPage {
            ads,
            total,
            page,
            limit,
            stale: base.stale,
            source: base.source,
        })
    }

    /// The whole approved payload, as served to snapshot-aware clients.
    pub async fn cache_payload(&self) -> Result<BasePayload, ListingError> {
        self.resolve_base().await
    }

    /// Approved-ad counts per category, computed over the cached payload.
    pub async fn category_counts(&self) -> Result<Vec<(Category, usize)>, ListingError> {
        let base = self.resolve_base().await?;
        Ok(Category::all()
            .iter()
            .map(|&category| {
                let count = base.ads.iter().filter(|ad| ad.category == category).count();
                (category, count)
            })
            .collect())
    }

    async fn resolve_base(&self) -> Result<BasePayload, ListingError> {
        // With the snapshot tiers disabled every read goes straight to the
        // database; nothing is cached, so nothing can go stale.
        if !self.cache_enabled {
            return match tokio::time::timeout(self.store_query_timeout, async {
                let mut ads = self.repo.list_approved_public().await?;
                ads.sort_by(ads::canonical_order);
                Ok::<_, RepoError>(ads)
            })
            .await
            {
                Ok(Ok(ads)) => Ok(BasePayload {
                    ads: Arc::new(ads),
                    captured_at: OffsetDateTime::now_utc(),
                    stale: false,
                    source: PayloadSource::Database,
                }),
                Ok(Err(err)) => {
                    warn!(error = %err, "uncached listing query failed");
                    Err(ListingError::Unavailable)
                }
                Err(_) => Err(ListingError::Unavailable),
            };
        }

        let now = OffsetDateTime::now_utc();
        let stale_fallback = match self.store.get_at(now) {
            SnapshotRead::Fresh(entry) => {
                return Ok(BasePayload {
                    ads: entry.ads,
                    captured_at: entry.captured_at,
                    stale: false,
                    source: PayloadSource::Memory,
                });
            }
            SnapshotRead::Stale(entry) => Some(entry),
            SnapshotRead::Miss => None,
        };

        // Memory missed; a fresh snapshot file can answer without the
        // database.
        if let Ok(document) = self.snapshots.read_document().await
            && let Ok(captured_at) = document.generated_at()
        {
            let age = now - captured_at;
            if age >= time::Duration::ZERO && age <= self.file_ttl {
                let ads = Arc::new(document.ads);
                self.store.put_captured_at(Arc::clone(&ads), captured_at);
                metrics::counter!("bazari_cache_file_hit_total").increment(1);
                return Ok(BasePayload {
                    ads,
                    captured_at,
                    stale: false,
                    source: PayloadSource::File,
                });
            }
        }

        match tokio::time::timeout(self.store_query_timeout, self.query_database()).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(err)) => {
                warn!(error = %err, "listing query failed, falling back to stale payload");
                self.stale_payload(stale_fallback).await
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.store_query_timeout.as_millis() as u64,
                    "listing query timed out, falling back to stale payload"
                );
                self.stale_payload(stale_fallback).await
            }
        }
    }

    async fn query_database(&self) -> Result<BasePayload, RepoError> {
        let mut ads = self.repo.list_approved_public().await?;
        ads.sort_by(ads::canonical_order);
        let ads = Arc::new(ads);
        let captured_at = OffsetDateTime::now_utc();
        self.store.put_captured_at(Arc::clone(&ads), captured_at);
        debug!(count = ads.len(), "listing payload refilled from database");
        Ok(BasePayload {
            ads,
            captured_at,
            stale: false,
            source: PayloadSource::Database,
        })
    }

    async fn stale_payload(
        &self,
        fallback: Option<crate::cache::store::CacheEntry>,
    ) -> Result<BasePayload, ListingError> {
        if let Some(entry) = fallback {
            metrics::counter!("bazari_cache_stale_served_total").increment(1);
            return Ok(BasePayload {
                ads: entry.ads,
                captured_at: entry.captured_at,
                stale: true,
                source: PayloadSource::Memory,
            });
        }
        // Last resort: an expired snapshot file still beats an error page.
        match self.snapshots.read_document().await {
            Ok(document) => {
                let captured_at = document
                    .generated_at()
                    .unwrap_or(OffsetDateTime::UNIX_EPOCH);
                metrics::counter!("bazari_cache_stale_served_total").increment(1);
                Ok(BasePayload {
                    ads: Arc::new(document.ads),
                    captured_at,
                    stale: true,
                    source: PayloadSource::File,
                })
            }
            Err(_) => Err(ListingError::Unavailable),
        }
    }

    fn filter<'a>(ads: &'a [PublicAd], query: &ListingQuery) -> Vec<&'a PublicAd> {
        let category = match query.category.as_deref().filter(|c| !c.is_empty()) {
            Some(raw) => match raw.parse::<Category>() {
                Ok(category) => Some(category),
                // Unknown category slugs match nothing rather than erroring.
                Err(_) => return Vec::new(),
            },
            None => None,
        };
        let sub_category = query
            .sub_category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        ads.iter()
            .filter(|ad| category.is_none_or(|c| ad.category == c))
            .filter(|ad| {
                // Sub-categories are free-form text, so no case folding here;
                // only category slugs get normalized.
                sub_category.is_none_or(|wanted| ad.sub_category.as_deref() == Some(wanted))
            })
            .collect()
    }

    fn clamp(page: Option<i64>, limit: Option<i64>) -> (usize, usize) {
        let page = page.unwrap_or(1).max(1) as usize;
        let limit = match limit {
            Some(limit) if limit > 0 => (limit as usize).min(MAX_PAGE_LIMIT),
            _ => DEFAULT_PAGE_LIMIT,
        };
        (page, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use uuid::Uuid;

    use crate::domain::entities::AdRecord;
    use crate::domain::types::AdStatus;

    struct ScriptedRepo {
        ads: Vec<PublicAd>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl ScriptedRepo {
        fn new(ads: Vec<PublicAd>) -> Arc<Self> {
            Arc::new(Self {
                ads,
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AdsRepo for ScriptedRepo {
        async fn list_approved_public(&self) -> Result<Vec<PublicAd>, RepoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(RepoError::Persistence("connection refused".into()))
            } else {
                Ok(self.ads.clone())
            }
        }
        async fn get(&self, _id: Uuid) -> Result<AdRecord, RepoError> {
            Err(RepoError::NotFound)
        }
        async fn list_all(&self) -> Result<Vec<AdRecord>, RepoError> {
            Ok(Vec::new())
        }
        async fn list_pending(&self) -> Result<Vec<AdRecord>, RepoError> {
            Ok(Vec::new())
        }
        async fn list_by_owner(&self, _owner_id: Uuid) -> Result<Vec<AdRecord>, RepoError> {
            Ok(Vec::new())
        }
        async fn count_all(&self) -> Result<u64, RepoError> {
            Ok(0)
        }
        async fn count_by_status(&self, _status: AdStatus) -> Result<u64, RepoError> {
            Ok(0)
        }
        async fn counts_by_category(&self) -> Result<Vec<(Category, u64)>, RepoError> {
            Ok(Vec::new())
        }
    }

    fn sample_ad(category: Category, sub: Option<&str>, minutes_ago: i64) -> PublicAd {
        PublicAd {
            id: Uuid::new_v4(),
            title: "item".to_string(),
            description: "desc".to_string(),
            category,
            sub_category: sub.map(str::to_owned),
            job_type: None,
            job_experience: None,
            price: "50".to_string(),
            location: "Erbil".to_string(),
            contact_handle: "9647700000000".to_string(),
            images: Vec::new(),
            is_featured: false,
            created_at: OffsetDateTime::now_utc() - time::Duration::minutes(minutes_ago),
            owner_name: "seller".to_string(),
        }
    }

    fn service(dir: &std::path::Path, repo: Arc<ScriptedRepo>) -> ListingService {
        let store = Arc::new(SnapshotStore::new(Duration::from_secs(120)));
        let snapshots = Arc::new(SnapshotManager::new(
            dir.join("ads-snapshot.json"),
            Duration::from_secs(300),
            Arc::clone(&store),
            Arc::clone(&repo) as Arc<dyn AdsRepo>,
        ));
        ListingService::new(store, snapshots, repo, &CacheConfig::default())
    }

    #[tokio::test]
    async fn database_fill_then_memory_hit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = ScriptedRepo::new(vec![sample_ad(Category::Home, None, 5)]);
        let listing = service(dir.path(), Arc::clone(&repo));

        let first = listing.list(ListingQuery::default()).await.expect("list");
        assert_eq!(first.source, PayloadSource::Database);
        assert_eq!(first.total, 1);

        let second = listing.list(ListingQuery::default()).await.expect("list");
        assert_eq!(second.source, PayloadSource::Memory);
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_tiers_query_the_database_every_time() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = ScriptedRepo::new(vec![sample_ad(Category::Home, None, 5)]);
        let store = Arc::new(SnapshotStore::new(Duration::from_secs(120)));
        let snapshots = Arc::new(SnapshotManager::new(
            dir.path().join("ads-snapshot.json"),
            Duration::from_secs(300),
            Arc::clone(&store),
            Arc::clone(&repo) as Arc<dyn AdsRepo>,
        ));
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        let listing = ListingService::new(
            Arc::clone(&store),
            snapshots,
            Arc::clone(&repo) as Arc<dyn AdsRepo>,
            &config,
        );

        for _ in 0..2 {
            let page = listing.list(ListingQuery::default()).await.expect("list");
            assert_eq!(page.source, PayloadSource::Database);
        }
        assert_eq!(repo.calls.load(Ordering::SeqCst), 2);
        // The memory tier stays cold; nothing was cached on the way through.
        assert!(matches!(store.get(), SnapshotRead::Miss));
    }

    #[tokio::test]
    async fn stale_memory_payload_survives_database_outage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = ScriptedRepo::new(vec![sample_ad(Category::Home, None, 5)]);
        let store = Arc::new(SnapshotStore::new(Duration::ZERO));
        let snapshots = Arc::new(SnapshotManager::new(
            dir.path().join("ads-snapshot.json"),
            Duration::ZERO,
            Arc::clone(&store),
            Arc::clone(&repo) as Arc<dyn AdsRepo>,
        ));
        let config = CacheConfig {
            file_ttl_seconds: 0,
            ..Default::default()
        };
        let listing = ListingService::new(
            Arc::clone(&store),
            snapshots,
            Arc::clone(&repo) as Arc<dyn AdsRepo>,
            &config,
        );

        // Seed a payload; with a zero TTL it is immediately stale.
        store.put(Arc::new(vec![sample_ad(Category::Cars, None, 1)]));
        repo.fail.store(true, Ordering::SeqCst);

        let page = listing.list(ListingQuery::default()).await.expect("stale serve");
        assert!(page.stale);
        assert_eq!(page.total, 1);
        assert_eq!(page.ads[0].category, Category::Cars);
    }

    #[tokio::test]
    async fn outage_with_no_payload_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = ScriptedRepo::new(Vec::new());
        repo.fail.store(true, Ordering::SeqCst);
        let listing = service(dir.path(), repo);
        assert!(listing.list(ListingQuery::default()).await.is_err());
    }

    #[tokio::test]
    async fn category_filter_runs_over_full_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = ScriptedRepo::new(vec![
            sample_ad(Category::Home, Some("phones"), 1),
            sample_ad(Category::Home, Some("laptops"), 2),
            sample_ad(Category::Cars, None, 3),
        ]);
        let listing = service(dir.path(), repo);

        let page = listing
            .list(ListingQuery {
                category: Some("home".into()),
                ..Default::default()
            })
            .await
            .expect("list");
        assert_eq!(page.total, 2);

        let narrowed = listing
            .list(ListingQuery {
                category: Some("home".into()),
                sub_category: Some("phones".into()),
                ..Default::default()
            })
            .await
            .expect("list");
        assert_eq!(narrowed.total, 1);
        assert_eq!(narrowed.ads[0].sub_category.as_deref(), Some("phones"));

        // The sub-category filter is exact; a case variant matches nothing.
        let cased = listing
            .list(ListingQuery {
                category: Some("home".into()),
                sub_category: Some("Phones".into()),
                ..Default::default()
            })
            .await
            .expect("list");
        assert_eq!(cased.total, 0);
    }

    #[tokio::test]
    async fn unknown_category_yields_empty_page_not_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = ScriptedRepo::new(vec![sample_ad(Category::Home, None, 1)]);
        let listing = service(dir.path(), repo);

        let page = listing
            .list(ListingQuery {
                category: Some("spaceships".into()),
                ..Default::default()
            })
            .await
            .expect("list");
        assert_eq!(page.total, 0);
        assert!(page.ads.is_empty());
    }

    #[tokio::test]
    async fn pagination_clamps_hostile_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ads: Vec<_> = (0..30)
            .map(|i| sample_ad(Category::Home, None, i))
            .collect();
        let repo = ScriptedRepo::new(ads);
        let listing = service(dir.path(), repo);

        let page = listing
            .list(ListingQuery {
                page: Some(-3),
                limit: Some(0),
                ..Default::default()
            })
            .await
            .expect("list");
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(page.ads.len(), DEFAULT_PAGE_LIMIT);
        assert_eq!(page.total, 30);

        let capped = listing
            .list(ListingQuery {
                limit: Some(10_000),
                ..Default::default()
            })
            .await
            .expect("list");
        assert_eq!(capped.limit, MAX_PAGE_LIMIT);

        let beyond = listing
            .list(ListingQuery {
                page: Some(99),
                ..Default::default()
            })
            .await
            .expect("list");
        assert!(beyond.ads.is_empty());
        assert_eq!(beyond.total, 30);
    }

    #[tokio::test]
    async fn pages_are_cut_in_canonical_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut featured = sample_ad(Category::Home, None, 60);
        featured.is_featured = true;
        let newest = sample_ad(Category::Home, None, 1);
        let older = sample_ad(Category::Home, None, 30);
        let repo = ScriptedRepo::new(vec![older.clone(), newest.clone(), featured.clone()]);
        let listing = service(dir.path(), repo);

        let page = listing
            .list(ListingQuery {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .expect("list");
        assert_eq!(page.ads[0].id, featured.id, "featured first despite age");
        assert_eq!(page.ads[1].id, newest.id);

        let second = listing
            .list(ListingQuery {
                page: Some(2),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .expect("list");
        assert_eq!(second.ads[0].id, older.id);
    }

    #[tokio::test]
    async fn category_counts_cover_every_category() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = ScriptedRepo::new(vec![
            sample_ad(Category::Home, None, 1),
            sample_ad(Category::Home, None, 2),
        ]);
        let listing = service(dir.path(), repo);

        let counts = listing.category_counts().await.expect("counts");
        assert_eq!(counts.len(), Category::all().len());
        let home = counts
            .iter()
            .find(|(c, _)| *c == Category::Home)
            .expect("present");
        assert_eq!(home.1, 2);
    }
}
