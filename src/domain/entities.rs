//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::ads::AdContent;
use crate::domain::types::{AdStatus, Category, PremiumPlan, UserRole};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub content: AdContent,
    pub price: String,
    pub location: String,
    pub whatsapp: String,
    pub images: Vec<String>,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub status: AdStatus,
    pub admin_note: Option<String>,
    pub is_featured: bool,
    pub views: i64,
    pub contact_clicks: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub is_premium: bool,
    pub premium_plan: PremiumPlan,
    pub last_active: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketPricesRecord {
    pub gold_ounce: f64,
    pub gold_lira: f64,
    pub silver_ounce: f64,
    pub dollar_rate: f64,
    pub updated_by: String,
    pub updated_at: OffsetDateTime,
}
