//! Configuration management
//!
//! This module handles loading and parsing configuration for the Kavya site.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Bootstrap admin account
    #[serde(default)]
    pub admin: AdminBootstrapConfig,
    /// Public site configuration
    #[serde(default)]
    pub site: SiteConfig,
    /// Rate limiter tuning
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Admin session lifetime in days
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    /// Take the client IP from X-Forwarded-For / X-Real-IP. Only enable
    /// behind a reverse proxy that overwrites those headers.
    #[serde(default)]
    pub trust_proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            session_days: default_session_days(),
            trust_proxy: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_session_days() -> i64 {
    7
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or `sqlite:` URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/kavya.db".to_string()
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload directory path
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "bin",
        }
    }
}

/// Credentials used to create the admin account on first start.
///
/// Ignored once an admin exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminBootstrapConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl AdminBootstrapConfig {
    /// All three fields present and non-empty
    pub fn is_complete(&self) -> bool {
        [&self.username, &self.email, &self.password]
            .iter()
            .all(|v| v.as_deref().map_or(false, |s| !s.trim().is_empty()))
    }
}

/// Public site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute base URL, used for links in notifications and emails
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

/// A single sliding window: at most `max_requests` within `window_seconds`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub max_requests: usize,
    pub window_seconds: u64,
}

impl WindowConfig {
    pub const fn new(max_requests: usize, window_seconds: u64) -> Self {
        Self { max_requests, window_seconds }
    }
}

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Upper bound on tracked keys per limiter
    #[serde(default = "default_max_tracked_keys")]
    pub max_tracked_keys: u64,
    #[serde(default = "default_contact_window")]
    pub contact: WindowConfig,
    #[serde(default = "default_likes_window")]
    pub likes: WindowConfig,
    #[serde(default = "default_login_ip_window")]
    pub login_ip: WindowConfig,
    #[serde(default = "default_login_user_window")]
    pub login_user: WindowConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_tracked_keys: default_max_tracked_keys(),
            contact: default_contact_window(),
            likes: default_likes_window(),
            login_ip: default_login_ip_window(),
            login_user: default_login_user_window(),
        }
    }
}

fn default_max_tracked_keys() -> u64 {
    500
}

fn default_contact_window() -> WindowConfig {
    WindowConfig::new(5, 3600)
}

fn default_likes_window() -> WindowConfig {
    WindowConfig::new(30, 60)
}

fn default_login_ip_window() -> WindowConfig {
    WindowConfig::new(10, 60)
}

fn default_login_user_window() -> WindowConfig {
    WindowConfig::new(5, 900)
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - KAVYA_SERVER_HOST
    /// - KAVYA_SERVER_PORT
    /// - KAVYA_SERVER_CORS_ORIGIN
    /// - KAVYA_SERVER_TRUST_PROXY
    /// - KAVYA_DATABASE_URL
    /// - KAVYA_UPLOAD_PATH
    /// - KAVYA_ADMIN_USERNAME / KAVYA_ADMIN_EMAIL / KAVYA_ADMIN_PASSWORD
    /// - KAVYA_SITE_BASE_URL
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("KAVYA_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("KAVYA_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("KAVYA_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(trust_proxy) = std::env::var("KAVYA_SERVER_TRUST_PROXY") {
            if let Ok(trust_proxy) = trust_proxy.parse::<bool>() {
                self.server.trust_proxy = trust_proxy;
            }
        }

        if let Ok(url) = std::env::var("KAVYA_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(path) = std::env::var("KAVYA_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }

        if let Ok(username) = std::env::var("KAVYA_ADMIN_USERNAME") {
            self.admin.username = Some(username);
        }
        if let Ok(email) = std::env::var("KAVYA_ADMIN_EMAIL") {
            self.admin.email = Some(email);
        }
        if let Ok(password) = std::env::var("KAVYA_ADMIN_PASSWORD") {
            self.admin.password = Some(password);
        }

        if let Ok(base_url) = std::env::var("KAVYA_SITE_BASE_URL") {
            self.site.base_url = base_url.trim_end_matches('/').to_string();
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENV_KEYS: &[&str] = &[
        "KAVYA_SERVER_HOST",
        "KAVYA_SERVER_PORT",
        "KAVYA_SERVER_CORS_ORIGIN",
        "KAVYA_SERVER_TRUST_PROXY",
        "KAVYA_DATABASE_URL",
        "KAVYA_UPLOAD_PATH",
        "KAVYA_ADMIN_USERNAME",
        "KAVYA_ADMIN_EMAIL",
        "KAVYA_ADMIN_PASSWORD",
        "KAVYA_SITE_BASE_URL",
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
        guard
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.session_days, 7);
        assert!(!config.server.trust_proxy);
        assert_eq!(config.database.url, "data/kavya.db");
        assert_eq!(config.upload.path, PathBuf::from("uploads"));
        assert!(!config.admin.is_complete());
        assert_eq!(config.rate_limit.contact, WindowConfig::new(5, 3600));
        assert_eq!(config.rate_limit.likes, WindowConfig::new(30, 60));
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 3000\nrate_limit:\n  contact:\n    max_requests: 2\n    window_seconds: 60\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.rate_limit.contact, WindowConfig::new(2, 60));
        assert_eq!(config.rate_limit.login_user, WindowConfig::new(5, 900));
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"
server:
  host: "127.0.0.1"
  port: 9000
  session_days: 30
database:
  url: "sqlite:/var/lib/kavya/site.db"
upload:
  path: "/var/lib/kavya/uploads"
  max_file_size: 1024
admin:
  username: "poet"
  email: "poet@example.com"
  password: "a-long-password"
site:
  base_url: "https://poet.example.com"
"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.session_days, 30);
        assert_eq!(config.database.url, "sqlite:/var/lib/kavya/site.db");
        assert_eq!(config.upload.max_file_size, 1024);
        assert!(config.admin.is_complete());
        assert_eq!(config.site.base_url, "https://poet.example.com");
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err().to_string();
        assert!(err.contains("parse"));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: [invalid yaml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_env_override_server_config() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: \"0.0.0.0\"\n  port: 8080\n").unwrap();

        std::env::set_var("KAVYA_SERVER_HOST", "192.168.1.1");
        std::env::set_var("KAVYA_SERVER_PORT", "4000");
        std::env::set_var("KAVYA_SERVER_TRUST_PROXY", "true");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 4000);
        assert!(config.server.trust_proxy);

        std::env::remove_var("KAVYA_SERVER_HOST");
        std::env::remove_var("KAVYA_SERVER_PORT");
        std::env::remove_var("KAVYA_SERVER_TRUST_PROXY");
    }

    #[test]
    fn test_env_override_admin_and_site() {
        let _guard = lock_env();

        let file = NamedTempFile::new().unwrap();

        std::env::set_var("KAVYA_ADMIN_USERNAME", "poet");
        std::env::set_var("KAVYA_ADMIN_EMAIL", "poet@example.com");
        std::env::set_var("KAVYA_ADMIN_PASSWORD", "secret-secret");
        std::env::set_var("KAVYA_SITE_BASE_URL", "https://poet.example.com/");

        let config = Config::load_with_env(file.path()).unwrap();

        assert!(config.admin.is_complete());
        assert_eq!(config.admin.username.as_deref(), Some("poet"));
        assert_eq!(config.site.base_url, "https://poet.example.com");

        for key in ["KAVYA_ADMIN_USERNAME", "KAVYA_ADMIN_EMAIL", "KAVYA_ADMIN_PASSWORD", "KAVYA_SITE_BASE_URL"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_override_invalid_port_ignored() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("KAVYA_SERVER_PORT", "not_a_number");

        let config = Config::load_with_env(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);

        std::env::remove_var("KAVYA_SERVER_PORT");
    }

    #[test]
    fn test_upload_type_checks() {
        let upload = UploadConfig::default();
        assert!(upload.is_type_allowed("image/png"));
        assert!(!upload.is_type_allowed("application/pdf"));
        assert_eq!(upload.get_extension("image/jpeg"), "jpg");
        assert_eq!(upload.get_extension("text/plain"), "bin");
    }

    #[test]
    fn test_admin_bootstrap_requires_all_fields() {
        let partial = AdminBootstrapConfig {
            username: Some("poet".to_string()),
            email: Some("  ".to_string()),
            password: Some("secret".to_string()),
        };
        assert!(!partial.is_complete());
    }
}
