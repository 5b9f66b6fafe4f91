//! Admin-only endpoints: moderation queue, users, prices, cache controls.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::application::auth::AuthPrincipal;
use crate::application::moderation::ModerationDecision;
use crate::application::stats::AdminStats;

use super::AppState;
use super::error::{ApiError, repo_error_to_api};
use super::models::{
    AdminEditPayload, ModerationPayload, OwnedAdView, PricesView, UpdatePricesPayload, UserView,
};

pub async fn list_all_ads(
    State(state): State<AppState>,
) -> Result<Json<Vec<OwnedAdView>>, ApiError> {
    let ads = state.moderation.list_all().await?;
    Ok(Json(ads.into_iter().map(Into::into).collect()))
}

pub async fn list_pending_ads(
    State(state): State<AppState>,
) -> Result<Json<Vec<OwnedAdView>>, ApiError> {
    let ads = state.moderation.list_pending().await?;
    Ok(Json(ads.into_iter().map(Into::into).collect()))
}

pub async fn approve_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<ModerationPayload>>,
) -> Result<Json<OwnedAdView>, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let record = state
        .moderation
        .approve(
            id,
            ModerationDecision {
                admin_note: payload.admin_note,
                is_featured: payload.is_featured,
            },
        )
        .await?;
    Ok(Json(record.into()))
}

pub async fn reject_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<ModerationPayload>>,
) -> Result<Json<OwnedAdView>, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let record = state
        .moderation
        .reject(
            id,
            ModerationDecision {
                admin_note: payload.admin_note,
                is_featured: payload.is_featured,
            },
        )
        .await?;
    Ok(Json(record.into()))
}

/// Edit any ad in place, keeping its moderation status.
pub async fn edit_any_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminEditPayload>,
) -> Result<Json<OwnedAdView>, ApiError> {
    let record = state
        .moderation
        .admin_edit(id, payload.ad.into(), payload.is_featured)
        .await?;
    Ok(Json(record.into()))
}

pub async fn admin_stats(State(state): State<AppState>) -> Result<Json<AdminStats>, ApiError> {
    let stats = state.stats.admin_stats().await?;
    Ok(Json(stats))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = state.users.list_all().await.map_err(repo_error_to_api)?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Remove an account and every ad it owns.
pub async fn purge_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.moderation.delete_all_for_owner(id).await?;
    state.users.delete(id).await.map_err(repo_error_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_prices(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Json(payload): Json<UpdatePricesPayload>,
) -> Result<Json<PricesView>, ApiError> {
    let updated = state
        .prices
        .update(
            crate::application::repos::UpdatePricesParams {
                gold_ounce: payload.gold_ounce,
                gold_lira: payload.gold_lira,
                silver_ounce: payload.silver_ounce,
                dollar_rate: payload.dollar_rate,
            },
            &principal.name,
        )
        .await
        .map_err(repo_error_to_api)?;
    Ok(Json(updated.into()))
}

/// Force an invalidate-and-rebuild cycle.
pub async fn rebuild_cache(State(state): State<AppState>) -> StatusCode {
    state.trigger.rebuild_requested();
    StatusCode::ACCEPTED
}
