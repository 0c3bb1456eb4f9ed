//! Public site information API
//!
//! Provides public access to site settings (no authentication required).
//! SMTP settings are never part of this response.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::services::SiteSettings;

/// Response for public site info
#[derive(Debug, Serialize)]
pub struct SiteInfoResponse {
    pub version: String,
    #[serde(flatten)]
    pub site: SiteSettings,
    pub push_enabled: bool,
}

/// Build the public site router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_site_info))
}

/// GET /api/site
async fn get_site_info(State(state): State<AppState>) -> Result<Json<SiteInfoResponse>, ApiError> {
    let site = state.settings_service.get_site_settings().await?;
    let notifications = state.settings_service.get_notification_settings().await?;
    Ok(Json(SiteInfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        site,
        push_enabled: notifications.push_enabled,
    }))
}
