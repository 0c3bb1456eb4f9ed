//! Settings service
//!
//! Typed views over the key/value settings table: public site settings,
//! SMTP settings and push notification settings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::db::repositories::SettingsRepository;

/// Known setting keys
pub mod keys {
    pub const SITE_NAME: &str = "site_name";
    pub const SITE_TAGLINE: &str = "site_tagline";
    pub const SITE_ABOUT: &str = "site_about";
    pub const CONTACT_EMAIL: &str = "contact_email";
    pub const SOCIAL_INSTAGRAM: &str = "social_instagram";
    pub const SOCIAL_YOUTUBE: &str = "social_youtube";
    pub const SOCIAL_TWITTER: &str = "social_twitter";
    pub const SOCIAL_FACEBOOK: &str = "social_facebook";

    pub const SMTP_HOST: &str = "smtp_host";
    pub const SMTP_PORT: &str = "smtp_port";
    pub const SMTP_USERNAME: &str = "smtp_username";
    pub const SMTP_PASSWORD: &str = "smtp_password";
    pub const SMTP_FROM: &str = "smtp_from";
    pub const SMTP_FROM_NAME: &str = "smtp_from_name";
    pub const NOTIFY_ON_CONTACT: &str = "notify_on_contact";

    pub const PUSH_ENABLED: &str = "push_enabled";
    pub const PUSH_DEFAULT_ICON: &str = "push_default_icon";
}

/// Public site settings, injected into every page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub site_name: String,
    pub tagline: String,
    pub about: String,
    pub contact_email: String,
    pub instagram: String,
    pub youtube: String,
    pub twitter: String,
    pub facebook: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Kavya".to_string(),
            tagline: "Poems, performances and books".to_string(),
            about: String::new(),
            contact_email: String::new(),
            instagram: String::new(),
            youtube: String::new(),
            twitter: String::new(),
            facebook: String::new(),
        }
    }
}

/// SMTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    /// Write-only: blank on read, and a blank value on update keeps the stored one
    pub smtp_password: String,
    pub smtp_from: String,
    pub smtp_from_name: String,
    /// Email the admin when a contact form arrives
    pub notify_on_contact: bool,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from: String::new(),
            smtp_from_name: String::new(),
            notify_on_contact: false,
        }
    }
}

impl EmailSettings {
    pub fn is_configured(&self) -> bool {
        !self.smtp_host.trim().is_empty() && !self.smtp_from.trim().is_empty()
    }
}

/// Push notification settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub push_enabled: bool,
    pub default_icon: String,
}

/// Everything the admin settings screen edits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllSettings {
    pub site: SiteSettings,
    pub email: EmailSettings,
    pub notifications: NotificationSettings,
}

/// Settings service errors
#[derive(Debug, Error)]
pub enum SettingsServiceError {
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    #[error("Failed to save settings: {0}")]
    SaveError(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

/// Settings service for managing site configuration
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

fn text(map: &HashMap<String, String>, key: &str, default: String) -> String {
    map.get(key).cloned().unwrap_or(default)
}

fn flag(map: &HashMap<String, String>, key: &str) -> bool {
    map.get(key).map(|v| v == "true" || v == "1").unwrap_or(false)
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    async fn load(&self) -> Result<HashMap<String, String>, SettingsServiceError> {
        let settings = self
            .repo
            .get_all()
            .await
            .map_err(|e| SettingsServiceError::LoadError(e.to_string()))?;
        Ok(settings.into_iter().map(|s| (s.key, s.value)).collect())
    }

    /// Public site settings
    pub async fn get_site_settings(&self) -> Result<SiteSettings, SettingsServiceError> {
        let map = self.load().await?;
        Ok(site_from_map(&map))
    }

    /// SMTP settings including the stored password
    pub async fn get_email_settings(&self) -> Result<EmailSettings, SettingsServiceError> {
        let map = self.load().await?;
        Ok(email_from_map(&map))
    }

    pub async fn get_notification_settings(&self) -> Result<NotificationSettings, SettingsServiceError> {
        let map = self.load().await?;
        Ok(NotificationSettings {
            push_enabled: flag(&map, keys::PUSH_ENABLED),
            default_icon: text(&map, keys::PUSH_DEFAULT_ICON, String::new()),
        })
    }

    /// All settings for the admin screen, with the SMTP password blanked
    pub async fn get_all(&self) -> Result<AllSettings, SettingsServiceError> {
        let map = self.load().await?;
        let mut email = email_from_map(&map);
        email.smtp_password = String::new();
        Ok(AllSettings {
            site: site_from_map(&map),
            email,
            notifications: NotificationSettings {
                push_enabled: flag(&map, keys::PUSH_ENABLED),
                default_icon: text(&map, keys::PUSH_DEFAULT_ICON, String::new()),
            },
        })
    }

    /// Save all settings. A blank SMTP password keeps the stored one.
    pub async fn update_all(&self, settings: &AllSettings) -> Result<AllSettings, SettingsServiceError> {
        if settings.site.site_name.trim().is_empty() {
            return Err(SettingsServiceError::InvalidValue(
                "Site name cannot be empty".to_string(),
            ));
        }
        if settings.email.smtp_port == 0 {
            return Err(SettingsServiceError::InvalidValue(
                "SMTP port must be between 1 and 65535".to_string(),
            ));
        }

        let site = &settings.site;
        let email = &settings.email;
        let mut map: HashMap<String, String> = [
            (keys::SITE_NAME, site.site_name.trim()),
            (keys::SITE_TAGLINE, site.tagline.trim()),
            (keys::SITE_ABOUT, site.about.as_str()),
            (keys::CONTACT_EMAIL, site.contact_email.trim()),
            (keys::SOCIAL_INSTAGRAM, site.instagram.trim()),
            (keys::SOCIAL_YOUTUBE, site.youtube.trim()),
            (keys::SOCIAL_TWITTER, site.twitter.trim()),
            (keys::SOCIAL_FACEBOOK, site.facebook.trim()),
            (keys::SMTP_HOST, email.smtp_host.trim()),
            (keys::SMTP_USERNAME, email.smtp_username.trim()),
            (keys::SMTP_FROM, email.smtp_from.trim()),
            (keys::SMTP_FROM_NAME, email.smtp_from_name.trim()),
            (keys::PUSH_DEFAULT_ICON, settings.notifications.default_icon.trim()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        map.insert(keys::SMTP_PORT.to_string(), email.smtp_port.to_string());
        map.insert(keys::NOTIFY_ON_CONTACT.to_string(), email.notify_on_contact.to_string());
        map.insert(
            keys::PUSH_ENABLED.to_string(),
            settings.notifications.push_enabled.to_string(),
        );
        if !email.smtp_password.is_empty() {
            map.insert(keys::SMTP_PASSWORD.to_string(), email.smtp_password.clone());
        }

        self.repo
            .set_many(&map)
            .await
            .map_err(|e| SettingsServiceError::SaveError(e.to_string()))?;

        tracing::info!("Settings updated ({} keys)", map.len());
        self.get_all().await
    }

    /// Get a single setting value
    pub async fn get(&self, key: &str) -> Result<Option<String>, SettingsServiceError> {
        let setting = self
            .repo
            .get(key)
            .await
            .map_err(|e| SettingsServiceError::LoadError(e.to_string()))?;
        Ok(setting.map(|s| s.value))
    }
}

fn site_from_map(map: &HashMap<String, String>) -> SiteSettings {
    let defaults = SiteSettings::default();
    SiteSettings {
        site_name: text(map, keys::SITE_NAME, defaults.site_name),
        tagline: text(map, keys::SITE_TAGLINE, defaults.tagline),
        about: text(map, keys::SITE_ABOUT, defaults.about),
        contact_email: text(map, keys::CONTACT_EMAIL, defaults.contact_email),
        instagram: text(map, keys::SOCIAL_INSTAGRAM, defaults.instagram),
        youtube: text(map, keys::SOCIAL_YOUTUBE, defaults.youtube),
        twitter: text(map, keys::SOCIAL_TWITTER, defaults.twitter),
        facebook: text(map, keys::SOCIAL_FACEBOOK, defaults.facebook),
    }
}

fn email_from_map(map: &HashMap<String, String>) -> EmailSettings {
    EmailSettings {
        smtp_host: text(map, keys::SMTP_HOST, String::new()),
        smtp_port: map
            .get(keys::SMTP_PORT)
            .and_then(|v| v.parse().ok())
            .unwrap_or(587),
        smtp_username: text(map, keys::SMTP_USERNAME, String::new()),
        smtp_password: text(map, keys::SMTP_PASSWORD, String::new()),
        smtp_from: text(map, keys::SMTP_FROM, String::new()),
        smtp_from_name: text(map, keys::SMTP_FROM_NAME, String::new()),
        notify_on_contact: flag(map, keys::NOTIFY_ON_CONTACT),
    }
}
