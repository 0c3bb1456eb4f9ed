//! Performance API endpoints
//!
//! Public: GET /api/performances, GET /api/performances/{slug}
//! Admin: GET/POST /api/admin/performances, GET/PUT/DELETE /api/admin/performances/{id}

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, default_per_page, AdminPaginationQuery};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{ListParams, PagedResult, Performance, PerformanceDetail, PerformanceInput};

#[derive(Debug, Deserialize)]
pub struct PerformanceListQuery {
    #[serde(default)]
    pub bhav: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_performances))
        .route("/{slug}", get(get_performance))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list).post(create_performance))
        .route(
            "/{id}",
            get(admin_get).put(update_performance).delete(delete_performance),
        )
}

async fn list_performances(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PerformanceListQuery>,
) -> Result<Json<PagedResult<PerformanceDetail>>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let page = state
        .performance_service
        .list_published(query.bhav.as_deref(), query.featured, &params)
        .await?;
    Ok(Json(page))
}

async fn get_performance(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<PerformanceDetail>, ApiError> {
    Ok(Json(state.performance_service.get_published_by_slug(&slug).await?))
}

async fn admin_list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdminPaginationQuery>,
) -> Result<Json<PagedResult<Performance>>, ApiError> {
    Ok(Json(state.performance_service.list_admin(&query.params()).await?))
}

async fn admin_get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PerformanceDetail>, ApiError> {
    Ok(Json(state.performance_service.get(id).await?))
}

async fn create_performance(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PerformanceInput>,
) -> Result<(StatusCode, Json<PerformanceDetail>), ApiError> {
    let created = state.performance_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_performance(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<PerformanceInput>,
) -> Result<Json<PerformanceDetail>, ApiError> {
    Ok(Json(state.performance_service.update(id, input).await?))
}

async fn delete_performance(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.performance_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
