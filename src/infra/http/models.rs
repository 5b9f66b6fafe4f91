//! Request and response bodies for the JSON API.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::application::listing::{ListingPage, ListingQuery};
use crate::application::stats::CategoryCount;
use crate::domain::ads::{AdDraftFields, PublicAd};
use crate::domain::entities::{AdRecord, MarketPricesRecord, UserRecord};
use crate::domain::types::{AdStatus, Category, JobExperience, JobType, PremiumPlan, UserRole};

fn rfc3339(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .unwrap_or_else(|_| value.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<ListingParams> for ListingQuery {
    fn from(params: ListingParams) -> Self {
        Self {
            category: params.category,
            sub_category: params.sub_category,
            page: params.page,
            limit: params.limit,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub ads: Vec<PublicAd>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub stale: bool,
    pub source: &'static str,
}

impl From<ListingPage> for ListingResponse {
    fn from(page: ListingPage) -> Self {
        Self {
            ads: page.ads,
            total: page.total,
            page: page.page,
            limit: page.limit,
            stale: page.stale,
            source: page.source.as_str(),
        }
    }
}

/// Whole-payload response for snapshot-aware clients, mirroring the on-disk
/// snapshot document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePayloadResponse {
    pub generated_at: String,
    pub count: usize,
    pub stale: bool,
    pub ads: Vec<PublicAd>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdPayload {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub sub_category: Option<String>,
    pub job_type: Option<JobType>,
    pub job_experience: Option<JobExperience>,
    pub price: String,
    pub location: String,
    pub whatsapp: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl From<AdPayload> for AdDraftFields {
    fn from(payload: AdPayload) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            category: payload.category,
            sub_category: payload.sub_category,
            job_type: payload.job_type,
            job_experience: payload.job_experience,
            price: payload.price,
            location: payload.location,
            whatsapp: payload.whatsapp,
            images: payload.images,
        }
    }
}

/// Owner/admin view of an ad, including moderation fields the public payload
/// omits.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedAdView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_experience: Option<JobExperience>,
    pub price: String,
    pub location: String,
    pub whatsapp: String,
    pub images: Vec<String>,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub status: AdStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_note: Option<String>,
    pub is_featured: bool,
    pub views: i64,
    pub contact_clicks: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AdRecord> for OwnedAdView {
    fn from(ad: AdRecord) -> Self {
        Self {
            id: ad.id,
            title: ad.title,
            description: ad.description,
            category: ad.category,
            sub_category: ad.content.sub_category().map(str::to_owned),
            job_type: ad.content.job_type(),
            job_experience: ad.content.job_experience(),
            price: ad.price,
            location: ad.location,
            whatsapp: ad.whatsapp,
            images: ad.images,
            owner_id: ad.owner_id,
            owner_name: ad.owner_name,
            status: ad.status,
            admin_note: ad.admin_note,
            is_featured: ad.is_featured,
            views: ad.views,
            contact_clicks: ad.contact_clicks,
            created_at: rfc3339(ad.created_at),
            updated_at: rfc3339(ad.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub is_premium: bool,
    pub premium_plan: PremiumPlan,
    pub created_at: String,
}

impl From<UserRecord> for UserView {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            is_premium: user.is_premium,
            premium_plan: user.premium_plan,
            created_at: rfc3339(user.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

/// Admin edit body: content fields plus the featured flag.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminEditPayload {
    #[serde(flatten)]
    pub ad: AdPayload,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModerationPayload {
    pub admin_note: Option<String>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStatsResponse {
    pub total_ads: usize,
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricesView {
    pub gold_ounce: f64,
    pub gold_lira: f64,
    pub silver_ounce: f64,
    pub dollar_rate: f64,
    pub updated_by: String,
    pub updated_at: String,
}

impl From<MarketPricesRecord> for PricesView {
    fn from(prices: MarketPricesRecord) -> Self {
        Self {
            gold_ounce: prices.gold_ounce,
            gold_lira: prices.gold_lira,
            silver_ounce: prices.silver_ounce,
            dollar_rate: prices.dollar_rate,
            updated_by: prices.updated_by,
            updated_at: rfc3339(prices.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePricesPayload {
    pub gold_ounce: f64,
    pub gold_lira: f64,
    pub silver_ounce: f64,
    pub dollar_rate: f64,
}
