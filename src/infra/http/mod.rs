//! HTTP surface: router assembly, shared state, middleware.

mod account;
mod admin;
pub mod error;
pub mod middleware;
pub mod models;
mod public;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use crate::application::auth::AuthService;
use crate::application::listing::ListingService;
use crate::application::moderation::ModerationService;
use crate::application::repos::{PricesRepo, UsersRepo};
use crate::application::stats::StatsService;
use crate::cache::snapshot::SnapshotManager;
use crate::cache::trigger::CacheTrigger;
use crate::infra::assets;
use crate::infra::db::PostgresRepositories;

use middleware::{log_responses, require_admin, require_auth, set_request_context};

#[derive(Clone)]
pub struct AppState {
    pub listing: Arc<ListingService>,
    pub moderation: Arc<ModerationService>,
    pub auth: Arc<AuthService>,
    pub stats: Arc<StatsService>,
    pub prices: Arc<dyn PricesRepo>,
    pub users: Arc<dyn UsersRepo>,
    pub snapshots: Arc<SnapshotManager>,
    pub trigger: Arc<CacheTrigger>,
    pub db: Option<PostgresRepositories>,
    /// Marker the browser-side cache compares to purge stale local copies.
    pub client_cache_version: String,
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/ads", get(public::list_ads))
        .route("/api/ads/cache", get(public::cache_payload))
        .route("/api/ads/{id}", get(public::get_ad))
        .route("/api/ads/{id}/contact", post(public::record_contact_click))
        .route("/api/stats", get(public::public_stats))
        .route("/api/prices", get(public::market_prices))
        .route("/api/version", get(public::version))
        .route("/api/auth/register", post(account::register))
        .route("/api/auth/login", post(account::login))
        .route("/_health/db", get(public::db_health))
        .route("/static/{*path}", get(assets::serve_public));

    let authed_routes = Router::new()
        .route("/api/auth/me", get(account::me))
        .route("/api/ads", post(account::submit_ad))
        .route("/api/ads/{id}", put(account::edit_ad))
        .route("/api/ads/{id}", delete(account::delete_ad))
        .route("/api/my-ads", get(account::my_ads))
        .route("/api/my-ads/{id}", get(account::my_ad))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let admin_routes = Router::new()
        .route("/api/admin/ads", get(admin::list_all_ads))
        .route("/api/admin/ads/pending", get(admin::list_pending_ads))
        .route("/api/admin/ads/{id}/approve", post(admin::approve_ad))
        .route("/api/admin/ads/{id}/reject", post(admin::reject_ad))
        .route("/api/admin/ads/{id}", put(admin::edit_any_ad))
        .route("/api/admin/stats", get(admin::admin_stats))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{id}", delete(admin::purge_user))
        .route("/api/admin/prices", put(admin::update_prices))
        .route("/api/admin/cache/rebuild", post(admin::rebuild_cache))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    public_routes
        .merge(authed_routes)
        .merge(admin_routes)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
        .with_state(state)
}
