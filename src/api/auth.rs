//! Authentication API endpoints
//!
//! - POST /api/auth/login - Admin login
//! - POST /api/auth/logout - Admin logout
//! - GET /api/auth/me - Current admin
//! - PUT /api/auth/password - Change password

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::extract::ApiJson;
use crate::api::middleware::{enforce, ApiError, AppState, AuthenticatedAdmin, ClientInfo};
use crate::models::Admin;
use crate::services::AuthError;

/// Request body for admin login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub admin: Admin,
    pub token: String,
}

/// Request body for changing the password
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/password", put(change_password))
}

/// POST /api/auth/login
///
/// Limited per client IP for every attempt and per username for failed
/// attempts only. A successful login clears the username's failures.
async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    enforce(
        state.rate_limiters.login_ip.check(&client.ip).await,
        "Too many login attempts, please try again later",
    )?;

    let username_key = body.username_or_email.trim().to_lowercase();
    enforce(
        state.rate_limiters.login_user.peek(&username_key).await,
        "Too many failed login attempts for this account, please try again later",
    )?;

    let (admin, session) = match state
        .auth_service
        .login(&body.username_or_email, &body.password)
        .await
    {
        Ok(result) => result,
        Err(AuthError::Authentication(_)) => {
            state.rate_limiters.login_user.record(&username_key).await;
            tracing::warn!("Failed login for '{}' from {}", username_key, client.ip);
            return Err(ApiError::unauthorized("Invalid username or password"));
        }
        Err(e) => return Err(e.into()),
    };

    state.rate_limiters.login_user.reset(&username_key).await;

    let max_age = state.auth_service.session_days() * 24 * 60 * 60;
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id, max_age
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(ApiError::internal)?,
    );

    Ok((
        headers,
        Json(AuthResponse {
            admin,
            token: session.id,
        }),
    ))
}

/// POST /api/auth/logout
async fn logout(
    State(state): State<AppState>,
    auth: AuthenticatedAdmin,
) -> Result<impl IntoResponse, ApiError> {
    state.auth_service.logout(&auth.token).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );
    Ok((StatusCode::NO_CONTENT, headers))
}

/// GET /api/auth/me
async fn me(auth: AuthenticatedAdmin) -> Json<Admin> {
    Json(auth.admin)
}

/// PUT /api/auth/password
///
/// Other sessions of the admin are closed; the current one survives.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthenticatedAdmin,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .auth_service
        .change_password(
            auth.admin.id,
            &body.current_password,
            &body.new_password,
            Some(&auth.token),
        )
        .await
        .map_err(|e| match e {
            // Wrong current password: 400, the session stays valid
            AuthError::Authentication(msg) => ApiError::validation_error(msg),
            other => other.into(),
        })?;
    Ok(StatusCode::NO_CONTENT)
}
