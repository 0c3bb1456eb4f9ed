//! Homepage section model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A block of the homepage (hero, about, featured poems, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HomepageSection {
    pub id: i64,
    /// Stable key used by templates, follows slug rules
    pub section_key: String,
    pub title: String,
    pub subtitle: Option<String>,
    /// Markdown body
    pub content: Option<String>,
    pub image: Option<String>,
    pub cta_label: Option<String>,
    pub cta_url: Option<String>,
    pub sort_order: i32,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_visible() -> bool {
    true
}

/// Admin create/update body
#[derive(Debug, Clone, Deserialize)]
pub struct HomepageSectionInput {
    /// Derived from the title when empty
    #[serde(default)]
    pub section_key: Option<String>,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub cta_label: Option<String>,
    #[serde(default)]
    pub cta_url: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}
