//! Contact form API endpoints
//!
//! Public: POST /api/contact (rate limited per client IP)
//! Admin: GET /api/admin/contact, PUT /api/admin/contact/{id}/read,
//! DELETE /api/admin/contact/{id}

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_admin_per_page, default_page, FlagRequest};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{enforce, ApiError, AppState, ClientInfo};
use crate::models::{ContactInput, ContactSubmission, ListParams, PagedResult};

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    #[serde(default)]
    pub unread: bool,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_admin_per_page")]
    pub per_page: u32,
}

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    #[serde(flatten)]
    pub page: PagedResult<ContactSubmission>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: i64,
    pub message: String,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", post(submit))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_submissions))
        .route("/{id}/read", put(mark_read))
        .route("/{id}", delete(delete_submission))
}

/// POST /api/contact
async fn submit(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiJson(input): ApiJson<ContactInput>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    enforce(
        state.rate_limiters.contact.check(&client.ip).await,
        "Too many messages, please try again later",
    )?;
    let stored = state.contact_service.submit(input, Some(client.ip)).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id: stored.id,
            message: "Thank you, your message has been received".to_string(),
        }),
    ))
}

/// GET /api/admin/contact - Newest first, `?unread=true` for unread only
async fn list_submissions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ContactListQuery>,
) -> Result<Json<ContactListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let page = state.contact_service.list(query.unread, &params).await?;
    let unread_count = state.contact_service.unread_count().await?;
    Ok(Json(ContactListResponse { page, unread_count }))
}

/// PUT /api/admin/contact/{id}/read - Body `{"value": false}` marks unread
async fn mark_read(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    body: Option<ApiJson<FlagRequest>>,
) -> Result<Json<ContactSubmission>, ApiError> {
    let is_read = body.map_or(true, |ApiJson(flag)| flag.value);
    Ok(Json(state.contact_service.mark_read(id, is_read).await?))
}

async fn delete_submission(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.contact_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
