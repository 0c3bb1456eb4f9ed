//! Admin authentication service
//!
//! Handles:
//! - login by username or email (argon2id verification)
//! - session creation, validation and logout
//! - password changes
//! - creating the admin account on first start

use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AdminBootstrapConfig;
use crate::db::repositories::{AdminRepository, SessionRepository};
use crate::models::{Admin, Session};
use crate::services::content::is_valid_email;
use crate::services::password::{check_password_policy, hash_password, verify_password};

/// Default session expiration in days
pub const DEFAULT_SESSION_DAYS: i64 = 7;

/// Error types for auth service operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Invalid credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Invalid input data
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database or hashing error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct AuthService {
    admin_repo: Arc<dyn AdminRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_days: i64,
}

impl AuthService {
    pub fn new(admin_repo: Arc<dyn AdminRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            admin_repo,
            session_repo,
            session_days: DEFAULT_SESSION_DAYS,
        }
    }

    pub fn with_session_days(mut self, days: i64) -> Self {
        self.session_days = days.max(1);
        self
    }

    pub fn session_days(&self) -> i64 {
        self.session_days
    }

    /// Verify credentials and open a new session.
    ///
    /// Unknown users and wrong passwords produce the same error.
    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<(Admin, Session), AuthError> {
        let login = username_or_email.trim();
        if login.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let invalid = || AuthError::Authentication("Invalid username or password".to_string());

        let admin = self.find_admin(login).await?.ok_or_else(invalid)?;
        let valid = verify_password(password, &admin.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            tracing::warn!("Failed login for {}", admin.username);
            return Err(invalid());
        }

        let session = self.create_session(admin.id).await?;
        tracing::info!("Admin {} logged in", admin.username);
        Ok((admin, session))
    }

    /// Invalidate a session
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Return the admin behind a session token. Expired sessions are removed
    /// and treated as missing.
    pub async fn validate_session(&self, token: &str) -> Result<Option<Admin>, AuthError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {:#}", e);
            }
            return Ok(None);
        }

        let admin = self
            .admin_repo
            .get_by_id(session.admin_id)
            .await
            .context("Failed to get admin")?;
        Ok(admin)
    }

    /// Change the password after checking the current one. Every other
    /// session of the admin is closed; `keep_session` stays valid.
    pub async fn change_password(
        &self,
        admin_id: i64,
        current: &str,
        new: &str,
        keep_session: Option<&str>,
    ) -> Result<(), AuthError> {
        let admin = self
            .admin_repo
            .get_by_id(admin_id)
            .await
            .context("Failed to get admin")?
            .ok_or_else(|| AuthError::Authentication("Admin not found".to_string()))?;

        if !verify_password(current, &admin.password_hash).context("Failed to verify password")? {
            return Err(AuthError::Authentication(
                "Current password is incorrect".to_string(),
            ));
        }
        check_password_policy(new).map_err(AuthError::Validation)?;

        let hash = hash_password(new)?;
        self.admin_repo
            .update_password(admin_id, &hash)
            .await
            .context("Failed to update password")?;

        let closed = self
            .session_repo
            .delete_by_admin_except(admin_id, keep_session)
            .await
            .context("Failed to close sessions")?;
        tracing::info!("Password changed for {}, {} other sessions closed", admin.username, closed);
        Ok(())
    }

    /// Create the admin account from bootstrap credentials when no admin
    /// exists yet. Returns the created admin, or `None` when nothing was done.
    pub async fn ensure_admin(&self, bootstrap: &AdminBootstrapConfig) -> Result<Option<Admin>, AuthError> {
        let count = self.admin_repo.count().await.context("Failed to count admins")?;
        if count > 0 {
            return Ok(None);
        }

        if !bootstrap.is_complete() {
            tracing::warn!("No admin account exists and admin bootstrap credentials are not configured");
            return Ok(None);
        }

        let username = bootstrap.username.as_deref().unwrap_or_default().trim();
        let email = bootstrap.email.as_deref().unwrap_or_default().trim();
        let password = bootstrap.password.as_deref().unwrap_or_default();
        if !is_valid_email(email) {
            return Err(AuthError::Validation("Invalid admin email".to_string()));
        }
        check_password_policy(password).map_err(AuthError::Validation)?;

        let hash = hash_password(password)?;
        let admin = self
            .admin_repo
            .create(&Admin::new(username.to_string(), email.to_string(), hash))
            .await
            .context("Failed to create admin")?;
        tracing::info!("Created admin account '{}'", admin.username);
        Ok(Some(admin))
    }

    /// Delete all expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, AuthError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }

    async fn find_admin(&self, login: &str) -> Result<Option<Admin>, AuthError> {
        if let Some(admin) = self
            .admin_repo
            .get_by_username(login)
            .await
            .context("Failed to get admin by username")?
        {
            return Ok(Some(admin));
        }

        let admin = self
            .admin_repo
            .get_by_email(login)
            .await
            .context("Failed to get admin by email")?;
        Ok(admin)
    }

    async fn create_session(&self, admin_id: i64) -> Result<Session, AuthError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            admin_id,
            expires_at: now + Duration::days(self.session_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;
        Ok(created)
    }
}
