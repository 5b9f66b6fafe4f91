//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::ads::{AdContent, PublicAd};
use crate::domain::entities::{AdRecord, MarketPricesRecord, UserRecord};
use crate::domain::types::{AdStatus, Category, UserRole};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateAdParams {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub content: AdContent,
    pub price: String,
    pub location: String,
    pub whatsapp: String,
    pub images: Vec<String>,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdateAdContentParams {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub content: AdContent,
    pub price: String,
    pub location: String,
    pub whatsapp: String,
    pub images: Vec<String>,
}

/// Admin override of an ad: content plus the featured flag, keeping the
/// current status and note.
#[derive(Debug, Clone)]
pub struct AdminUpdateAdParams {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub content: AdContent,
    pub price: String,
    pub location: String,
    pub whatsapp: String,
    pub images: Vec<String>,
    /// `Some(flag)` overwrites the featured flag, `None` leaves it.
    pub is_featured: Option<bool>,
}

/// Moderation outcome to persist in one statement.
#[derive(Debug, Clone)]
pub struct SetModerationParams {
    pub id: Uuid,
    pub status: AdStatus,
    /// `Some(note)` stores a note, `None` clears it.
    pub admin_note: Option<String>,
    /// `Some(flag)` overwrites the featured flag, `None` leaves it.
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdatePricesParams {
    pub gold_ounce: f64,
    pub gold_lira: f64,
    pub silver_ounce: f64,
    pub dollar_rate: f64,
}

/// Read access to the ad store.
#[async_trait]
pub trait AdsRepo: Send + Sync {
    /// All approved ads in the canonical public order (featured first, then
    /// newest-created first).
    async fn list_approved_public(&self) -> Result<Vec<PublicAd>, RepoError>;

    async fn get(&self, id: Uuid) -> Result<AdRecord, RepoError>;

    /// All ads regardless of status, newest first (admin surface).
    async fn list_all(&self) -> Result<Vec<AdRecord>, RepoError>;

    /// Pending ads, newest first (moderation queue).
    async fn list_pending(&self) -> Result<Vec<AdRecord>, RepoError>;

    /// One user's ads regardless of status, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<AdRecord>, RepoError>;

    async fn count_all(&self) -> Result<u64, RepoError>;

    async fn count_by_status(&self, status: AdStatus) -> Result<u64, RepoError>;

    /// Approved-ad counts per category (admin dashboard).
    async fn counts_by_category(&self) -> Result<Vec<(Category, u64)>, RepoError>;
}

/// Write access to the ad store.
#[async_trait]
pub trait AdsWriteRepo: Send + Sync {
    async fn create(&self, params: CreateAdParams) -> Result<AdRecord, RepoError>;

    /// Overwrite content fields, demote to pending, and clear the admin
    /// note, in one statement.
    async fn update_content(&self, params: UpdateAdContentParams) -> Result<AdRecord, RepoError>;

    /// Overwrite content and optionally the featured flag without touching
    /// status or the admin note.
    async fn admin_update(&self, params: AdminUpdateAdParams) -> Result<AdRecord, RepoError>;

    async fn set_moderation(&self, params: SetModerationParams) -> Result<AdRecord, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Remove all of a user's ads; returns how many were removed.
    async fn delete_by_owner(&self, owner_id: Uuid) -> Result<u64, RepoError>;

    /// Fire-and-forget counter increments; failures are the caller's to
    /// swallow.
    async fn increment_views(&self, id: Uuid) -> Result<(), RepoError>;

    async fn increment_contact_clicks(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Registered-user persistence.
#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn touch_last_active(&self, id: Uuid) -> Result<(), RepoError>;

    async fn list_all(&self) -> Result<Vec<UserRecord>, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    async fn count_all(&self) -> Result<u64, RepoError>;

    async fn count_active_since(&self, since: OffsetDateTime) -> Result<u64, RepoError>;

    async fn admin_exists(&self) -> Result<bool, RepoError>;
}

/// Market reference prices (single row).
#[async_trait]
pub trait PricesRepo: Send + Sync {
    async fn get(&self) -> Result<MarketPricesRecord, RepoError>;

    async fn update(
        &self,
        params: UpdatePricesParams,
        updated_by: &str,
    ) -> Result<MarketPricesRecord, RepoError>;
}
