//! Homepage section API endpoints
//!
//! Public: GET /api/homepage (visible sections in display order)
//! Admin: GET/POST /api/admin/homepage, PUT /api/admin/homepage/reorder,
//! GET/PUT/DELETE /api/admin/homepage/{id}

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::ItemsResponse;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{HomepageSection, HomepageSectionInput};

/// Section ids in their new display order
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i64>,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_visible))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list).post(create_section))
        .route("/reorder", put(reorder_sections))
        .route("/{id}", get(admin_get).put(update_section).delete(delete_section))
}

async fn list_visible(
    State(state): State<AppState>,
) -> Result<Json<ItemsResponse<HomepageSection>>, ApiError> {
    Ok(Json(state.homepage_service.list_visible().await?.into()))
}

async fn admin_list(
    State(state): State<AppState>,
) -> Result<Json<ItemsResponse<HomepageSection>>, ApiError> {
    Ok(Json(state.homepage_service.list_admin().await?.into()))
}

async fn admin_get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<HomepageSection>, ApiError> {
    Ok(Json(state.homepage_service.get(id).await?))
}

async fn create_section(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<HomepageSectionInput>,
) -> Result<(StatusCode, Json<HomepageSection>), ApiError> {
    let section = state.homepage_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

async fn update_section(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<HomepageSectionInput>,
) -> Result<Json<HomepageSection>, ApiError> {
    Ok(Json(state.homepage_service.update(id, input).await?))
}

async fn delete_section(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.homepage_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/admin/homepage/reorder
async fn reorder_sections(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ReorderRequest>,
) -> Result<Json<ItemsResponse<HomepageSection>>, ApiError> {
    Ok(Json(state.homepage_service.reorder(&body.ids).await?.into()))
}
