//! Admin account model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The site administrator.
///
/// The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Password hash (argon2id)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    /// Create a new admin. The password must already be hashed.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username,
            email,
            password_hash,
            display_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name shown in the admin header
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}
