//! Contact form service

use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::ContactRepository;
use crate::models::{ContactInput, ContactSubmission, ListParams, PagedResult};
use crate::services::content::{is_valid_email, optional_text, require_text, ContentError, ContentResult};
use crate::services::email::EmailService;

pub const MAX_MESSAGE_LENGTH: usize = 5000;

pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
    email: Arc<EmailService>,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>, email: Arc<EmailService>) -> Self {
        Self { repo, email }
    }

    /// Validate and store a submission, then notify the admin in the
    /// background when enabled. Email failures never fail the submission.
    pub async fn submit(&self, input: ContactInput, ip: Option<String>) -> ContentResult<ContactSubmission> {
        let submission = validate(input, ip)?;
        let stored = self.repo.create(&submission).await?;
        tracing::info!("Contact submission {} from {}", stored.id, stored.email);

        if self.email.should_notify_contact().await {
            let email = self.email.clone();
            let notify = stored.clone();
            tokio::spawn(async move {
                if let Err(e) = email.notify_contact(&notify).await {
                    tracing::warn!("Failed to send contact notification: {}", e);
                }
            });
        }

        Ok(stored)
    }

    pub async fn list(&self, unread_only: bool, params: &ListParams) -> ContentResult<PagedResult<ContactSubmission>> {
        let items = self.repo.list(unread_only, params.offset(), params.limit()).await?;
        let total = self.repo.count(unread_only).await?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn unread_count(&self) -> ContentResult<i64> {
        Ok(self.repo.count(true).await?)
    }

    pub async fn mark_read(&self, id: i64, is_read: bool) -> ContentResult<ContactSubmission> {
        if !self.repo.mark_read(id, is_read).await? {
            return Err(ContentError::NotFound("Contact submission".into()));
        }
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::NotFound("Contact submission".into()))
    }

    pub async fn delete(&self, id: i64) -> ContentResult<()> {
        if !self.repo.delete(id).await? {
            return Err(ContentError::NotFound("Contact submission".into()));
        }
        Ok(())
    }
}

fn validate(input: ContactInput, ip: Option<String>) -> ContentResult<ContactSubmission> {
    let name = require_text("Name", &input.name, 100)?;
    let email = input.email.trim().to_string();
    if !is_valid_email(&email) {
        return Err(ContentError::Validation("Invalid email address".into()));
    }
    let subject = optional_text("Subject", input.subject, 200)?;
    let message = require_text("Message", &input.message, MAX_MESSAGE_LENGTH)?;

    Ok(ContactSubmission {
        id: 0,
        name,
        email,
        subject,
        message,
        ip_address: ip,
        is_read: false,
        created_at: Utc::now(),
    })
}
