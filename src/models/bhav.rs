//! Bhav model
//!
//! A bhav is a thematic tag ("mood") attached to poems and performances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bhav {
    pub id: i64,
    pub name: String,
    /// URL-friendly slug
    pub slug: String,
    pub description: Option<String>,
    /// Display color (e.g. `#c0392b`)
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Admin create/update body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BhavInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Bhav with counts of published content, for the public listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BhavWithCounts {
    #[serde(flatten)]
    pub bhav: Bhav,
    pub poem_count: i64,
    pub performance_count: i64,
}
