//! API middleware
//!
//! Contains:
//! - `AppState`, the services shared by every handler
//! - `ApiError`, the JSON error envelope
//! - the admin session gate (`require_admin`)
//! - request extractors for the authenticated admin and client info

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{Config, UploadConfig};
use crate::db::repositories::{
    SqlxAdminRepository, SqlxBhavRepository, SqlxBookRepository, SqlxContactRepository,
    SqlxEventRepository, SqlxHomepageSectionRepository, SqlxNotificationRepository,
    SqlxPerformanceRepository, SqlxPoemRepository, SqlxSessionRepository, SqlxSettingsRepository,
};
use crate::db::DbPool;
use crate::models::Admin;
use crate::services::{
    AuthError, AuthService, BhavService, BookService, ContactService, ContentError, EmailService,
    EventService, HomepageService, NotificationService, PerformanceService, PoemService,
    RateLimitDecision, RateLimiters, SettingsService, SettingsServiceError,
};
use crate::web::PageRenderer;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub auth_service: Arc<AuthService>,
    pub poem_service: Arc<PoemService>,
    pub performance_service: Arc<PerformanceService>,
    pub event_service: Arc<EventService>,
    pub book_service: Arc<BookService>,
    pub bhav_service: Arc<BhavService>,
    pub homepage_service: Arc<HomepageService>,
    pub contact_service: Arc<ContactService>,
    pub notification_service: Arc<NotificationService>,
    pub settings_service: Arc<SettingsService>,
    pub email_service: Arc<EmailService>,
    pub rate_limiters: RateLimiters,
    pub upload_config: Arc<UploadConfig>,
    pub pages: Arc<PageRenderer>,
    /// Absolute site URL without a trailing slash
    pub base_url: Arc<str>,
    /// Honour proxy headers when resolving the client IP
    pub trust_proxy: bool,
}

impl AppState {
    /// Wire repositories and services on top of a migrated pool
    pub fn new(pool: DbPool, config: &Config) -> anyhow::Result<Self> {
        let admin_repo = SqlxAdminRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let bhav_repo = SqlxBhavRepository::boxed(pool.clone());
        let book_repo = SqlxBookRepository::boxed(pool.clone());
        let poem_repo = SqlxPoemRepository::boxed(pool.clone());
        let performance_repo = SqlxPerformanceRepository::boxed(pool.clone());

        let settings_service = Arc::new(SettingsService::new(SqlxSettingsRepository::boxed(pool.clone())));
        let email_service = Arc::new(EmailService::new(settings_service.clone()));

        Ok(Self {
            auth_service: Arc::new(
                AuthService::new(admin_repo, session_repo).with_session_days(config.server.session_days),
            ),
            poem_service: Arc::new(PoemService::new(
                poem_repo.clone(),
                bhav_repo.clone(),
                book_repo.clone(),
            )),
            performance_service: Arc::new(PerformanceService::new(performance_repo, bhav_repo.clone())),
            event_service: Arc::new(EventService::new(SqlxEventRepository::boxed(pool.clone()))),
            book_service: Arc::new(BookService::new(book_repo, poem_repo)),
            bhav_service: Arc::new(BhavService::new(bhav_repo)),
            homepage_service: Arc::new(HomepageService::new(SqlxHomepageSectionRepository::boxed(
                pool.clone(),
            ))),
            contact_service: Arc::new(ContactService::new(
                SqlxContactRepository::boxed(pool.clone()),
                email_service.clone(),
            )),
            notification_service: Arc::new(NotificationService::new(
                SqlxNotificationRepository::boxed(pool.clone()),
            )?),
            settings_service,
            email_service,
            rate_limiters: RateLimiters::from_config(&config.rate_limit),
            upload_config: Arc::new(config.upload.clone()),
            pages: Arc::new(PageRenderer::new()?),
            base_url: Arc::from(config.site.base_url.trim_end_matches('/')),
            trust_proxy: config.server.trust_proxy,
            pool,
        })
    }
}

/// The admin behind the current request, with the session token used
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub admin: Admin,
    pub token: String,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: u64) -> Self {
        Self::with_details(
            "RATE_LIMITED",
            message,
            serde_json::json!({ "retry_after": retry_after }),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log the cause and hide it from the client
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", cause);
        Self::internal_error("Internal server error")
    }

    fn retry_after(&self) -> Option<u64> {
        self.error
            .details
            .as_ref()
            .and_then(|d| d.get("retry_after"))
            .and_then(|v| v.as_u64())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let retry_after = self.retry_after();
        let mut response = (status, Json(self)).into_response();
        if let Some(secs) = retry_after.filter(|_| status == StatusCode::TOO_MANY_REQUESTS) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            ContentError::Validation(msg) => ApiError::validation_error(msg),
            ContentError::DuplicateSlug(slug) => ApiError::with_details(
                "VALIDATION_ERROR",
                format!("Slug '{}' is already in use", slug),
                serde_json::json!({ "field": "slug" }),
            ),
            ContentError::Internal(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Authentication(msg) => ApiError::unauthorized(msg),
            AuthError::Validation(msg) => ApiError::validation_error(msg),
            AuthError::Internal(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

impl From<SettingsServiceError> for ApiError {
    fn from(err: SettingsServiceError) -> Self {
        match err {
            SettingsServiceError::InvalidValue(msg) => ApiError::validation_error(msg),
            other => ApiError::internal(other),
        }
    }
}

/// Turn a limiter decision into an error when the caller is over budget
pub fn enforce(decision: RateLimitDecision, message: &str) -> Result<(), ApiError> {
    match decision {
        RateLimitDecision::Allowed { .. } => Ok(()),
        RateLimitDecision::Limited { retry_after } => Err(ApiError::rate_limited(message, retry_after)),
    }
}

/// Extract session token from request headers. Bearer wins over the cookie.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Admin session gate
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let admin = state
        .auth_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request
        .extensions_mut()
        .insert(AuthenticatedAdmin { admin, token });
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedAdmin>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Who is calling: IP and user agent
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

impl ClientInfo {
    /// Resolve the caller. Proxy headers count only when `trust_proxy` is set.
    pub fn from_parts(parts: &Parts, trust_proxy: bool) -> Self {
        let ip = trust_proxy
            .then(|| forwarded_ip(&parts.headers))
            .flatten()
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("")
            .to_string();
        Self { ip, user_agent }
    }
}

/// Client IP from X-Forwarded-For (first hop) or X-Real-IP
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Some(ip.to_string());
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.trim().to_string());
        }
    }

    None
}

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts, state.trust_proxy))
    }
}
