//! Bhav (mood tag) API endpoints
//!
//! Public: GET /api/bhavs (with published poem and performance counts)
//! Admin: GET/POST /api/admin/bhavs, GET/PUT/DELETE /api/admin/bhavs/{id}

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::ItemsResponse;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Bhav, BhavInput, BhavWithCounts};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_bhavs))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list).post(create_bhav))
        .route("/{id}", get(admin_get).put(update_bhav).delete(delete_bhav))
}

async fn list_bhavs(State(state): State<AppState>) -> Result<Json<ItemsResponse<BhavWithCounts>>, ApiError> {
    Ok(Json(state.bhav_service.list_public().await?.into()))
}

async fn admin_list(State(state): State<AppState>) -> Result<Json<ItemsResponse<Bhav>>, ApiError> {
    Ok(Json(state.bhav_service.list_admin().await?.into()))
}

async fn admin_get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<Bhav>, ApiError> {
    Ok(Json(state.bhav_service.get(id).await?))
}

async fn create_bhav(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<BhavInput>,
) -> Result<(StatusCode, Json<Bhav>), ApiError> {
    let bhav = state.bhav_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(bhav)))
}

async fn update_bhav(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<BhavInput>,
) -> Result<Json<Bhav>, ApiError> {
    Ok(Json(state.bhav_service.update(id, input).await?))
}

/// Join rows go with the bhav; poems and performances stay
async fn delete_bhav(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    state.bhav_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
