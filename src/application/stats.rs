//! Aggregate counts for the public landing page and the admin dashboard.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::listing::{ListingError, ListingService};
use crate::application::repos::{AdsRepo, RepoError, UsersRepo};
use crate::domain::types::{AdStatus, Category};

#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Listing(#[from] ListingError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// Landing-page numbers, computed over the cached payload so they stay
/// consistent with what the listing shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStats {
    pub total_ads: usize,
    pub categories: Vec<CategoryCount>,
}

/// Dashboard numbers, computed against the store directly so moderators see
/// pending work immediately.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_ads: u64,
    pub pending_ads: u64,
    pub approved_ads: u64,
    pub rejected_ads: u64,
    /// Approved ads per category, straight from the store.
    pub categories: Vec<CategoryCount>,
    pub total_users: u64,
    pub active_users_24h: u64,
}

pub struct StatsService {
    listing: Arc<ListingService>,
    ads: Arc<dyn AdsRepo>,
    users: Arc<dyn UsersRepo>,
}

impl StatsService {
    pub fn new(
        listing: Arc<ListingService>,
        ads: Arc<dyn AdsRepo>,
        users: Arc<dyn UsersRepo>,
    ) -> Self {
        Self {
            listing,
            ads,
            users,
        }
    }

    pub async fn public_stats(&self) -> Result<PublicStats, StatsError> {
        let counts = self.listing.category_counts().await?;
        let total_ads = counts.iter().map(|(_, count)| count).sum();
        Ok(PublicStats {
            total_ads,
            categories: counts
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
        })
    }

    pub async fn admin_stats(&self) -> Result<AdminStats, StatsError> {
        let total_ads = self.ads.count_all().await?;
        let pending_ads = self.ads.count_by_status(AdStatus::Pending).await?;
        let approved_ads = self.ads.count_by_status(AdStatus::Approved).await?;
        let rejected_ads = self.ads.count_by_status(AdStatus::Rejected).await?;
        let categories = self
            .ads
            .counts_by_category()
            .await?
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category,
                count: count as usize,
            })
            .collect();
        let total_users = self.users.count_all().await?;
        let since = OffsetDateTime::now_utc() - time::Duration::hours(24);
        let active_users_24h = self.users.count_active_since(since).await?;
        Ok(AdminStats {
            total_ads,
            pending_ads,
            approved_ads,
            rejected_ads,
            categories,
            total_users,
            active_users_24h,
        })
    }
}
