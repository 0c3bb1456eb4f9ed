//! Book model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Poem;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    /// Where readers can buy the book
    pub purchase_url: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<i32>,
    pub is_published: bool,
    /// Lower sorts first on the books page
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin create/update body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub purchase_url: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// A book with its published poems
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub poems: Vec<Poem>,
}
