//! Poem API endpoints
//!
//! Public:
//! - GET /api/poems - Published poems (filter by bhav, book, featured)
//! - GET /api/poems/{slug} - Published poem with bhavs, book and rendered HTML
//! - POST /api/poems/{slug}/like - Toggle a like for the calling visitor
//! - POST /api/poems/{slug}/view - Count a view
//!
//! Admin:
//! - GET/POST /api/admin/poems
//! - GET/PUT/DELETE /api/admin/poems/{id}

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_page, default_per_page, AdminPaginationQuery};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{enforce, ApiError, AppState, ClientInfo};
use crate::models::{LikeResult, ListParams, PagedResult, Poem, PoemDetail, PoemFilter, PoemInput};
use crate::services::{fingerprint, markdown};

/// Query for the public poem listing
#[derive(Debug, Deserialize)]
pub struct PoemListQuery {
    #[serde(default)]
    pub bhav: Option<String>,
    #[serde(default)]
    pub book: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// A published poem as served to readers
#[derive(Debug, Serialize)]
pub struct PoemResponse {
    #[serde(flatten)]
    pub detail: PoemDetail,
    pub content_html: String,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub view_count: i64,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_poems))
        .route("/{slug}", get(get_poem))
        .route("/{slug}/like", post(toggle_like))
        .route("/{slug}/view", post(record_view))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list).post(create_poem))
        .route("/{id}", get(admin_get).put(update_poem).delete(delete_poem))
}

/// GET /api/poems
async fn list_poems(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PoemListQuery>,
) -> Result<Json<PagedResult<Poem>>, ApiError> {
    let filter = PoemFilter {
        bhav: query.bhav,
        book: query.book,
        featured: query.featured,
    };
    let params = ListParams::new(query.page, query.per_page);
    Ok(Json(state.poem_service.list_published(&filter, &params).await?))
}

/// GET /api/poems/{slug}
async fn get_poem(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<PoemResponse>, ApiError> {
    let detail = state.poem_service.get_published_by_slug(&slug).await?;
    let content_html = markdown::render_poem(&detail.poem.content);
    Ok(Json(PoemResponse { detail, content_html }))
}

/// POST /api/poems/{slug}/like
///
/// One like per visitor fingerprint; a second call takes it back.
async fn toggle_like(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<LikeResult>, ApiError> {
    enforce(
        state.rate_limiters.likes.check(&client.ip).await,
        "Too many likes, please slow down",
    )?;
    let fp = fingerprint(&client.ip, &client.user_agent);
    Ok(Json(state.poem_service.toggle_like(&slug, &fp).await?))
}

/// POST /api/poems/{slug}/view
async fn record_view(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<ViewResponse>, ApiError> {
    let view_count = state.poem_service.record_view(&slug).await?;
    Ok(Json(ViewResponse { view_count }))
}

/// GET /api/admin/poems - Drafts included
async fn admin_list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdminPaginationQuery>,
) -> Result<Json<PagedResult<Poem>>, ApiError> {
    Ok(Json(state.poem_service.list_admin(&query.params()).await?))
}

async fn admin_get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PoemDetail>, ApiError> {
    Ok(Json(state.poem_service.get(id).await?))
}

async fn create_poem(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PoemInput>,
) -> Result<(StatusCode, Json<PoemDetail>), ApiError> {
    let poem = state.poem_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(poem)))
}

async fn update_poem(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<PoemInput>,
) -> Result<Json<PoemDetail>, ApiError> {
    Ok(Json(state.poem_service.update(id, input).await?))
}

async fn delete_poem(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.poem_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
