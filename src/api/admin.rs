//! Admin API endpoints
//!
//! - GET /api/admin/dashboard - Counts per resource
//! - GET /api/admin/settings - All settings (SMTP password blanked)
//! - PUT /api/admin/settings - Replace all settings
//! - POST /api/admin/settings/test-email - Send a test message
//!
//! Content CRUD lives in the per-resource modules.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::extract::ApiJson;
use crate::api::middleware::{ApiError, AppState, AuthenticatedAdmin};
use crate::services::AllSettings;

/// Response for admin dashboard
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_poems: i64,
    pub published_poems: i64,
    pub total_performances: i64,
    pub published_performances: i64,
    pub upcoming_events: i64,
    pub total_books: i64,
    pub total_bhavs: i64,
    pub subscribers: i64,
    pub unread_messages: i64,
}

/// Request body for a test email
#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    /// Defaults to the logged-in admin's address
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestEmailResponse {
    pub sent_to: String,
}

/// Build the admin router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/settings/test-email", post(send_test_email))
}

/// GET /api/admin/dashboard
async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let (
        total_poems,
        published_poems,
        total_performances,
        published_performances,
        upcoming_events,
        total_books,
        bhavs,
        subscribers,
        unread_messages,
    ) = tokio::try_join!(
        state.poem_service.count(false),
        state.poem_service.count(true),
        state.performance_service.count(false),
        state.performance_service.count(true),
        state.event_service.count_upcoming(),
        state.book_service.count(),
        state.bhav_service.list_admin(),
        state.notification_service.count(),
        state.contact_service.unread_count(),
    )?;

    Ok(Json(DashboardResponse {
        total_poems,
        published_poems,
        total_performances,
        published_performances,
        upcoming_events,
        total_books,
        total_bhavs: bhavs.len() as i64,
        subscribers,
        unread_messages,
    }))
}

/// GET /api/admin/settings
async fn get_settings(State(state): State<AppState>) -> Result<Json<AllSettings>, ApiError> {
    Ok(Json(state.settings_service.get_all().await?))
}

/// PUT /api/admin/settings
///
/// A blank SMTP password keeps the stored one.
async fn update_settings(
    State(state): State<AppState>,
    auth: AuthenticatedAdmin,
    ApiJson(body): ApiJson<AllSettings>,
) -> Result<Json<AllSettings>, ApiError> {
    let saved = state.settings_service.update_all(&body).await?;
    tracing::info!("Settings updated by {}", auth.admin.username);
    Ok(Json(saved))
}

/// POST /api/admin/settings/test-email
async fn send_test_email(
    State(state): State<AppState>,
    auth: AuthenticatedAdmin,
    body: Option<ApiJson<TestEmailRequest>>,
) -> Result<(StatusCode, Json<TestEmailResponse>), ApiError> {
    let to = body
        .and_then(|ApiJson(b)| b.to)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or(auth.admin.email);

    state
        .email_service
        .send_test(&to)
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to send test email: {:#}", e)))?;

    Ok((StatusCode::OK, Json(TestEmailResponse { sent_to: to })))
}
