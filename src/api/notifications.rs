//! Push notification API endpoints
//!
//! Public:
//! - POST /api/notifications/subscribe
//! - POST /api/notifications/unsubscribe
//!
//! Admin:
//! - GET /api/admin/notifications - Subscriber count
//! - POST /api/admin/notifications/send - Broadcast to every subscriber

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::extract::ApiJson;
use crate::api::middleware::{ApiError, AppState, ClientInfo};
use crate::models::{BroadcastReport, NotificationPayload, SubscribeInput};

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct NotificationStatsResponse {
    pub subscribers: i64,
    pub push_enabled: bool,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(stats))
        .route("/send", post(send))
}

/// POST /api/notifications/subscribe - Re-subscribing refreshes the keys
async fn subscribe(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiJson(input): ApiJson<SubscribeInput>,
) -> Result<(StatusCode, Json<SubscribeResponse>), ApiError> {
    let settings = state.settings_service.get_notification_settings().await?;
    if !settings.push_enabled {
        return Err(ApiError::forbidden("Push notifications are disabled"));
    }
    let user_agent = Some(client.user_agent.as_str()).filter(|ua| !ua.is_empty());
    let subscription = state.notification_service.subscribe(input, user_agent).await?;
    Ok((StatusCode::CREATED, Json(SubscribeResponse { id: subscription.id })))
}

/// POST /api/notifications/unsubscribe
async fn unsubscribe(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UnsubscribeRequest>,
) -> Result<StatusCode, ApiError> {
    state.notification_service.unsubscribe(&body.endpoint).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stats(State(state): State<AppState>) -> Result<Json<NotificationStatsResponse>, ApiError> {
    let subscribers = state.notification_service.count().await?;
    let settings = state.settings_service.get_notification_settings().await?;
    Ok(Json(NotificationStatsResponse {
        subscribers,
        push_enabled: settings.push_enabled,
    }))
}

/// Site-relative paths get the public base URL in front
fn absolute_url(base_url: &str, url: &str) -> String {
    if url.starts_with('/') && !url.starts_with("//") {
        format!("{}{}", base_url, url)
    } else {
        url.to_string()
    }
}

/// POST /api/admin/notifications/send
///
/// Without an icon the configured default icon is used. Relative links get
/// the site base URL.
async fn send(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<NotificationPayload>,
) -> Result<Json<BroadcastReport>, ApiError> {
    let settings = state.settings_service.get_notification_settings().await?;
    if !settings.push_enabled {
        return Err(ApiError::validation_error("Push notifications are disabled in settings"));
    }
    if payload.icon.as_deref().map_or(true, str::is_empty) && !settings.default_icon.is_empty() {
        payload.icon = Some(settings.default_icon);
    }
    payload.url = payload.url.map(|url| absolute_url(&state.base_url, &url));
    payload.icon = payload.icon.map(|icon| absolute_url(&state.base_url, &icon));

    let report = state.notification_service.broadcast(&payload).await?;
    tracing::info!(
        "Broadcast '{}': {} sent, {} failed, {} removed",
        payload.title,
        report.sent,
        report.failed,
        report.removed
    );
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        let base = "https://kavya.example.com";
        assert_eq!(absolute_url(base, "/poems/barish"), "https://kavya.example.com/poems/barish");
        assert_eq!(absolute_url(base, "https://cdn.example.com/i.png"), "https://cdn.example.com/i.png");
        assert_eq!(absolute_url(base, "//cdn.example.com/i.png"), "//cdn.example.com/i.png");
    }
}
