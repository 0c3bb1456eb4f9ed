//! Email service
//!
//! Thin SMTP wrapper. Connection settings are read from the settings table
//! on every send so changes in the admin take effect immediately.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::models::ContactSubmission;
use crate::services::settings::{EmailSettings, SettingsService};

/// Email service for sending emails
pub struct EmailService {
    settings: Arc<SettingsService>,
}

impl EmailService {
    pub fn new(settings: Arc<SettingsService>) -> Self {
        Self { settings }
    }

    /// Whether contact submissions should be forwarded to the admin
    pub async fn should_notify_contact(&self) -> bool {
        match self.settings.get_email_settings().await {
            Ok(email) => email.notify_on_contact && email.is_configured(),
            Err(_) => false,
        }
    }

    /// Send a plain text email
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let smtp = self.settings.get_email_settings().await?;
        if !smtp.is_configured() {
            return Err(anyhow!(
                "SMTP is not configured. Please configure SMTP settings first."
            ));
        }

        let email = build_message(&smtp, to, subject, body)?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(smtp.smtp_port);
        if !smtp.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                smtp.smtp_username.clone(),
                smtp.smtp_password.clone(),
            ));
        }
        let mailer: AsyncSmtpTransport<Tokio1Executor> = builder.build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        tracing::info!("Email sent to {}", to);
        Ok(())
    }

    /// Send a test email
    pub async fn send_test(&self, to: &str) -> Result<()> {
        let site = self.settings.get_site_settings().await?;
        self.send(
            to,
            &format!("[{}] Test email", site.site_name),
            &format!(
                "This is a test email from {}.\n\nIf you received it, SMTP is configured correctly.",
                site.site_name
            ),
        )
        .await
    }

    /// Forward a contact submission to the site's contact address, falling
    /// back to the SMTP sender address.
    pub async fn notify_contact(&self, submission: &ContactSubmission) -> Result<()> {
        let site = self.settings.get_site_settings().await?;
        let smtp = self.settings.get_email_settings().await?;
        let to = if site.contact_email.is_empty() {
            smtp.smtp_from
        } else {
            site.contact_email.clone()
        };

        let (subject, body) = contact_email(&site.site_name, submission);
        self.send(&to, &subject, &body).await
    }
}

fn build_message(smtp: &EmailSettings, to: &str, subject: &str, body: &str) -> Result<Message> {
    let from = if smtp.smtp_from_name.is_empty() {
        smtp.smtp_from.clone()
    } else {
        format!("{} <{}>", smtp.smtp_from_name, smtp.smtp_from)
    };

    Message::builder()
        .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
        .to(to.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| anyhow!("Failed to build email: {}", e))
}

fn contact_email(site_name: &str, submission: &ContactSubmission) -> (String, String) {
    let subject = match submission.subject.as_deref() {
        Some(s) => format!("[{}] Contact: {}", site_name, s),
        None => format!("[{}] New contact message from {}", site_name, submission.name),
    };
    let body = format!(
        "From: {} <{}>\nReceived: {}\n\n{}\n",
        submission.name,
        submission.email,
        submission.created_at.format("%Y-%m-%d %H:%M UTC"),
        submission.message
    );
    (subject, body)
}
