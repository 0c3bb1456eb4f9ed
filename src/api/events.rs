//! Event API endpoints
//!
//! Public: GET /api/events?when=upcoming|past|all, GET /api/events/{slug}
//! Admin: GET/POST /api/admin/events, GET/PUT/DELETE /api/admin/events/{id}

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::ItemsResponse;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Event, EventInput, EventWhen};

#[derive(Debug, Deserialize)]
pub struct EventListQuery {
    #[serde(default)]
    pub when: EventWhen,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events))
        .route("/{slug}", get(get_event))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list).post(create_event))
        .route("/{id}", get(admin_get).put(update_event).delete(delete_event))
}

/// GET /api/events - Upcoming by default
async fn list_events(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EventListQuery>,
) -> Result<Json<ItemsResponse<Event>>, ApiError> {
    let events = state.event_service.list_published(query.when).await?;
    Ok(Json(events.into()))
}

async fn get_event(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.event_service.get_published_by_slug(&slug).await?))
}

async fn admin_list(State(state): State<AppState>) -> Result<Json<ItemsResponse<Event>>, ApiError> {
    Ok(Json(state.event_service.list_admin().await?.into()))
}

async fn admin_get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.event_service.get(id).await?))
}

async fn create_event(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = state.event_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.event_service.update(id, input).await?))
}

async fn delete_event(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    state.event_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
