//! Unauthenticated endpoints: listings, ad details, stats, prices.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::application::error::ErrorReport;

use super::AppState;
use super::error::ApiError;
use super::models::{
    CachePayloadResponse, ListingParams, ListingResponse, PricesView, PublicStatsResponse,
    VersionResponse,
};

pub async fn list_ads(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<ListingResponse>, ApiError> {
    let page = state.listing.list(params.into()).await?;
    Ok(Json(page.into()))
}

/// The whole approved payload in snapshot-document shape, for clients that
/// keep their own local copy.
pub async fn cache_payload(
    State(state): State<AppState>,
) -> Result<Json<CachePayloadResponse>, ApiError> {
    let base = state.listing.cache_payload().await?;
    let generated_at = base
        .captured_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| base.captured_at.to_string());
    Ok(Json(CachePayloadResponse {
        generated_at,
        count: base.ads.len(),
        stale: base.stale,
        ads: base.ads.as_ref().clone(),
    }))
}

/// Detail view resolved against the cached payload, so only approved ads are
/// reachable here.
pub async fn get_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let base = state.listing.cache_payload().await?;
    let ad = base
        .ads
        .iter()
        .find(|ad| ad.id == id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("Ad not found"))?;

    // View counters never block or fail the read.
    let moderation = Arc::clone(&state.moderation);
    tokio::spawn(async move {
        moderation.record_view(id).await;
    });

    Ok(Json(ad).into_response())
}

pub async fn record_contact_click(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    let moderation = Arc::clone(&state.moderation);
    tokio::spawn(async move {
        moderation.record_contact_click(id).await;
    });
    StatusCode::NO_CONTENT
}

pub async fn public_stats(
    State(state): State<AppState>,
) -> Result<Json<PublicStatsResponse>, ApiError> {
    let stats = state.stats.public_stats().await?;
    Ok(Json(PublicStatsResponse {
        total_ads: stats.total_ads,
        categories: stats.categories,
    }))
}

pub async fn market_prices(State(state): State<AppState>) -> Result<Json<PricesView>, ApiError> {
    let prices = state
        .prices
        .get()
        .await
        .map_err(super::error::repo_error_to_api)?;
    Ok(Json(prices.into()))
}

/// Version marker the browser cache compares against to decide whether to
/// purge its local copy.
pub async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: state.client_cache_version.clone(),
    })
}

pub async fn db_health(State(state): State<AppState>) -> Response {
    let Some(db) = state.db.as_ref() else {
        return StatusCode::NO_CONTENT.into_response();
    };
    match db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
