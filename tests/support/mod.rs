//! Shared fixtures: in-memory repositories and a fully wired router.
#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use time::OffsetDateTime;
use uuid::Uuid;

use bazari::application::auth::AuthService;
use bazari::application::listing::ListingService;
use bazari::application::moderation::ModerationService;
use bazari::application::repos::{
    AdminUpdateAdParams, AdsRepo, AdsWriteRepo, CreateAdParams, CreateUserParams, PricesRepo,
    RepoError, SetModerationParams, UpdateAdContentParams, UpdatePricesParams, UsersRepo,
};
use bazari::application::stats::StatsService;
use bazari::cache::{
    CacheConfig, CacheConsumer, CacheTrigger, EventQueue, SnapshotManager, SnapshotStore,
};
use bazari::domain::ads::PublicAd;
use bazari::domain::entities::{AdRecord, MarketPricesRecord, UserRecord};
use bazari::domain::types::{AdStatus, Category, PremiumPlan, UserRole};
use bazari::infra::http::{self, AppState};

pub const TOKEN_SECRET: &str = "integration-test-secret";

#[derive(Default)]
pub struct MemoryAds {
    pub ads: Mutex<Vec<AdRecord>>,
    pub fail_reads: AtomicBool,
    pub list_calls: AtomicUsize,
}

impl MemoryAds {
    pub fn insert(&self, ad: AdRecord) {
        self.ads.lock().expect("lock").push(ad);
    }

    pub fn set_status(&self, id: Uuid, status: AdStatus) {
        let mut ads = self.ads.lock().expect("lock");
        if let Some(ad) = ads.iter_mut().find(|ad| ad.id == id) {
            ad.status = status;
        }
    }

    fn snapshot(&self) -> Vec<AdRecord> {
        self.ads.lock().expect("lock").clone()
    }

    fn guard(&self) -> Result<(), RepoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(RepoError::Persistence("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AdsRepo for MemoryAds {
    async fn list_approved_public(&self) -> Result<Vec<PublicAd>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.guard()?;
        let mut ads: Vec<PublicAd> = self
            .snapshot()
            .iter()
            .filter(|ad| ad.status == AdStatus::Approved)
            .map(PublicAd::from_record)
            .collect();
        ads.sort_by(bazari::domain::ads::canonical_order);
        Ok(ads)
    }

    async fn get(&self, id: Uuid) -> Result<AdRecord, RepoError> {
        self.guard()?;
        self.snapshot()
            .into_iter()
            .find(|ad| ad.id == id)
            .ok_or(RepoError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<AdRecord>, RepoError> {
        self.guard()?;
        let mut ads = self.snapshot();
        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ads)
    }

    async fn list_pending(&self) -> Result<Vec<AdRecord>, RepoError> {
        self.guard()?;
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|ad| ad.status == AdStatus::Pending)
            .collect())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<AdRecord>, RepoError> {
        self.guard()?;
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|ad| ad.owner_id == owner_id)
            .collect())
    }

    async fn count_all(&self) -> Result<u64, RepoError> {
        self.guard()?;
        Ok(self.snapshot().len() as u64)
    }

    async fn count_by_status(&self, status: AdStatus) -> Result<u64, RepoError> {
        self.guard()?;
        Ok(self
            .snapshot()
            .iter()
            .filter(|ad| ad.status == status)
            .count() as u64)
    }

    async fn counts_by_category(&self) -> Result<Vec<(Category, u64)>, RepoError> {
        self.guard()?;
        let ads = self.snapshot();
        Ok(Category::all()
            .iter()
            .map(|&category| {
                let count = ads
                    .iter()
                    .filter(|ad| ad.category == category && ad.status == AdStatus::Approved)
                    .count() as u64;
                (category, count)
            })
            .collect())
    }
}

#[async_trait]
impl AdsWriteRepo for MemoryAds {
    async fn create(&self, params: CreateAdParams) -> Result<AdRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let record = AdRecord {
            id: Uuid::new_v4(),
            title: params.title,
            description: params.description,
            category: params.category,
            content: params.content,
            price: params.price,
            location: params.location,
            whatsapp: params.whatsapp,
            images: params.images,
            owner_id: params.owner_id,
            owner_name: "Fixture Owner".to_string(),
            status: AdStatus::Pending,
            admin_note: None,
            is_featured: false,
            views: 0,
            contact_clicks: 0,
            created_at: now,
            updated_at: now,
        };
        self.insert(record.clone());
        Ok(record)
    }

    async fn update_content(&self, params: UpdateAdContentParams) -> Result<AdRecord, RepoError> {
        let mut ads = self.ads.lock().expect("lock");
        let ad = ads
            .iter_mut()
            .find(|ad| ad.id == params.id)
            .ok_or(RepoError::NotFound)?;
        ad.title = params.title;
        ad.description = params.description;
        ad.category = params.category;
        ad.content = params.content;
        ad.price = params.price;
        ad.location = params.location;
        ad.whatsapp = params.whatsapp;
        ad.images = params.images;
        ad.status = AdStatus::Pending;
        ad.admin_note = None;
        ad.updated_at = OffsetDateTime::now_utc();
        Ok(ad.clone())
    }

    async fn admin_update(&self, params: AdminUpdateAdParams) -> Result<AdRecord, RepoError> {
        let mut ads = self.ads.lock().expect("lock");
        let ad = ads
            .iter_mut()
            .find(|ad| ad.id == params.id)
            .ok_or(RepoError::NotFound)?;
        ad.title = params.title;
        ad.description = params.description;
        ad.category = params.category;
        ad.content = params.content;
        ad.price = params.price;
        ad.location = params.location;
        ad.whatsapp = params.whatsapp;
        ad.images = params.images;
        if let Some(flag) = params.is_featured {
            ad.is_featured = flag;
        }
        ad.updated_at = OffsetDateTime::now_utc();
        Ok(ad.clone())
    }

    async fn set_moderation(&self, params: SetModerationParams) -> Result<AdRecord, RepoError> {
        let mut ads = self.ads.lock().expect("lock");
        let ad = ads
            .iter_mut()
            .find(|ad| ad.id == params.id)
            .ok_or(RepoError::NotFound)?;
        ad.status = params.status;
        ad.admin_note = params.admin_note;
        if let Some(flag) = params.is_featured {
            ad.is_featured = flag;
        }
        ad.updated_at = OffsetDateTime::now_utc();
        Ok(ad.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut ads = self.ads.lock().expect("lock");
        let before = ads.len();
        ads.retain(|ad| ad.id != id);
        if ads.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_owner(&self, owner_id: Uuid) -> Result<u64, RepoError> {
        let mut ads = self.ads.lock().expect("lock");
        let before = ads.len();
        ads.retain(|ad| ad.owner_id != owner_id);
        Ok((before - ads.len()) as u64)
    }

    async fn increment_views(&self, id: Uuid) -> Result<(), RepoError> {
        let mut ads = self.ads.lock().expect("lock");
        if let Some(ad) = ads.iter_mut().find(|ad| ad.id == id) {
            ad.views += 1;
        }
        Ok(())
    }

    async fn increment_contact_clicks(&self, id: Uuid) -> Result<(), RepoError> {
        let mut ads = self.ads.lock().expect("lock");
        if let Some(ad) = ads.iter_mut().find(|ad| ad.id == id) {
            ad.contact_clicks += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    pub users: Mutex<Vec<UserRecord>>,
}

#[async_trait]
impl UsersRepo for MemoryUsers {
    async fn create(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut users = self.users.lock().expect("lock");
        if users.iter().any(|u| u.email == params.email) {
            return Err(RepoError::Duplicate {
                constraint: "users_email_key".into(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let user = UserRecord {
            id: Uuid::new_v4(),
            name: params.name,
            email: params.email,
            password_hash: params.password_hash,
            password_salt: params.password_salt,
            phone: params.phone,
            role: params.role,
            is_active: true,
            is_premium: false,
            premium_plan: PremiumPlan::None,
            last_active: now,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .expect("lock")
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .expect("lock")
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn touch_last_active(&self, _id: Uuid) -> Result<(), RepoError> {
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, RepoError> {
        Ok(self.users.lock().expect("lock").clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut users = self.users.lock().expect("lock");
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn count_all(&self) -> Result<u64, RepoError> {
        Ok(self.users.lock().expect("lock").len() as u64)
    }

    async fn count_active_since(&self, since: OffsetDateTime) -> Result<u64, RepoError> {
        Ok(self
            .users
            .lock()
            .expect("lock")
            .iter()
            .filter(|u| u.last_active >= since)
            .count() as u64)
    }

    async fn admin_exists(&self) -> Result<bool, RepoError> {
        Ok(self
            .users
            .lock()
            .expect("lock")
            .iter()
            .any(|u| matches!(u.role, UserRole::Admin)))
    }
}

#[derive(Default)]
pub struct MemoryPrices {
    pub prices: Mutex<Option<MarketPricesRecord>>,
}

#[async_trait]
impl PricesRepo for MemoryPrices {
    async fn get(&self) -> Result<MarketPricesRecord, RepoError> {
        Ok(self
            .prices
            .lock()
            .expect("lock")
            .clone()
            .unwrap_or(MarketPricesRecord {
                gold_ounce: 2750.0,
                gold_lira: 580.0,
                silver_ounce: 32.0,
                dollar_rate: 89_500.0,
                updated_by: "admin".to_string(),
                updated_at: OffsetDateTime::now_utc(),
            }))
    }

    async fn update(
        &self,
        params: UpdatePricesParams,
        updated_by: &str,
    ) -> Result<MarketPricesRecord, RepoError> {
        let record = MarketPricesRecord {
            gold_ounce: params.gold_ounce,
            gold_lira: params.gold_lira,
            silver_ounce: params.silver_ounce,
            dollar_rate: params.dollar_rate,
            updated_by: updated_by.to_string(),
            updated_at: OffsetDateTime::now_utc(),
        };
        *self.prices.lock().expect("lock") = Some(record.clone());
        Ok(record)
    }
}

pub struct TestApp {
    pub router: Router,
    pub ads: Arc<MemoryAds>,
    pub users: Arc<MemoryUsers>,
    pub store: Arc<SnapshotStore>,
    pub queue: Arc<EventQueue>,
    pub consumer: Arc<CacheConsumer>,
    pub snapshots: Arc<SnapshotManager>,
    pub listing: Arc<ListingService>,
    pub moderation: Arc<ModerationService>,
    pub auth: Arc<AuthService>,
    pub _snapshot_dir: tempfile::TempDir,
}

pub fn build_app() -> TestApp {
    build_app_with(CacheConfig::default())
}

pub fn build_app_with(base_config: CacheConfig) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let ads = Arc::new(MemoryAds::default());
    let users = Arc::new(MemoryUsers::default());
    let prices = Arc::new(MemoryPrices::default());

    let cache_config = CacheConfig {
        snapshot_path: dir.path().join("ads-snapshot.json"),
        ..base_config
    };

    let store = Arc::new(SnapshotStore::new(cache_config.memory_ttl()));
    let snapshots = Arc::new(SnapshotManager::new(
        cache_config.snapshot_path.clone(),
        cache_config.file_ttl(),
        Arc::clone(&store),
        Arc::clone(&ads) as Arc<dyn AdsRepo>,
    ));
    let queue = Arc::new(EventQueue::new());
    let consumer = Arc::new(CacheConsumer::new(
        cache_config.clone(),
        Arc::clone(&queue),
        Arc::clone(&snapshots),
    ));
    let trigger = Arc::new(CacheTrigger::new(
        cache_config.clone(),
        Arc::clone(&store),
        Arc::clone(&queue),
        Arc::clone(&consumer),
    ));

    let listing = Arc::new(ListingService::new(
        Arc::clone(&store),
        Arc::clone(&snapshots),
        Arc::clone(&ads) as Arc<dyn AdsRepo>,
        &cache_config,
    ));
    let moderation = Arc::new(ModerationService::new(
        Arc::clone(&ads) as Arc<dyn AdsRepo>,
        Arc::clone(&ads) as Arc<dyn AdsWriteRepo>,
        Arc::clone(&trigger),
    ));
    let auth = Arc::new(AuthService::new(
        Arc::clone(&users) as Arc<dyn UsersRepo>,
        TOKEN_SECRET,
        Duration::from_secs(3600),
    ));
    let stats = Arc::new(StatsService::new(
        Arc::clone(&listing),
        Arc::clone(&ads) as Arc<dyn AdsRepo>,
        Arc::clone(&users) as Arc<dyn UsersRepo>,
    ));

    let state = AppState {
        listing: Arc::clone(&listing),
        moderation: Arc::clone(&moderation),
        auth: Arc::clone(&auth),
        stats,
        prices,
        users: Arc::clone(&users) as Arc<dyn UsersRepo>,
        snapshots: Arc::clone(&snapshots),
        trigger,
        db: None,
        client_cache_version: "test-1".to_string(),
    };

    TestApp {
        router: http::build_router(state),
        ads,
        users,
        store,
        queue,
        consumer,
        snapshots,
        listing,
        moderation,
        auth,
        _snapshot_dir: dir,
    }
}

pub fn approved_ad(title: &str, category: Category, minutes_ago: i64) -> AdRecord {
    let now = OffsetDateTime::now_utc();
    AdRecord {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: "fixture description".to_string(),
        category,
        content: bazari::domain::ads::AdContent::Generic { sub_category: None },
        price: "1000".to_string(),
        location: "Baghdad".to_string(),
        whatsapp: "9647700000000".to_string(),
        images: Vec::new(),
        owner_id: Uuid::new_v4(),
        owner_name: "Fixture Owner".to_string(),
        status: AdStatus::Approved,
        admin_note: None,
        is_featured: false,
        views: 0,
        contact_clicks: 0,
        created_at: now - time::Duration::minutes(minutes_ago),
        updated_at: now,
    }
}
