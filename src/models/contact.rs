//! Contact form model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored contact form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub ip_address: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Public contact form body
#[derive(Debug, Clone, Deserialize)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}
