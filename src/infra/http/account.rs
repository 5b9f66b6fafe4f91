//! Registration, login, and owner-facing ad management.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::application::auth::{AuthPrincipal, RegisterCommand};

use super::AppState;
use super::error::ApiError;
use super::models::{
    AdPayload, LoginPayload, LoginResponse, OwnedAdView, RegisterPayload, UserView,
};

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let user = state
        .auth
        .register(RegisterCommand {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            phone: payload.phone,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (user, token) = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

pub async fn me(Extension(principal): Extension<AuthPrincipal>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "id": principal.user_id,
        "name": principal.name,
        "role": principal.role,
    }))
}

pub async fn submit_ad(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Json(payload): Json<AdPayload>,
) -> Result<(StatusCode, Json<OwnedAdView>), ApiError> {
    let record = state.moderation.submit(&principal, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn edit_ad(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdPayload>,
) -> Result<Json<OwnedAdView>, ApiError> {
    let record = state
        .moderation
        .edit(&principal, id, payload.into())
        .await?;
    Ok(Json(record.into()))
}

pub async fn delete_ad(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.moderation.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_ads(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
) -> Result<Json<Vec<OwnedAdView>>, ApiError> {
    let ads = state.moderation.my_ads(&principal).await?;
    Ok(Json(ads.into_iter().map(Into::into).collect()))
}

pub async fn my_ad(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<Json<OwnedAdView>, ApiError> {
    let ad = state.moderation.get_owned(&principal, id).await?;
    Ok(Json(ad.into()))
}
