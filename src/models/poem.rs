//! Poem model
//!
//! This module provides:
//! - `Poem` entity
//! - `PoemInput` for admin create/update
//! - `PoemDetail`, a poem hydrated with its bhavs and book
//! - `PoemFilter` for the public listing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Bhav, Book};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Poem {
    pub id: i64,
    pub title: String,
    pub slug: String,
    /// Markdown text; line breaks are significant
    pub content: String,
    pub excerpt: Option<String>,
    /// Language code or name (e.g. `hi`, `en`)
    pub language: Option<String>,
    pub cover_image: Option<String>,
    pub book_id: Option<i64>,
    pub is_featured: bool,
    pub is_published: bool,
    /// Never negative
    pub like_count: i64,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin create/update body.
///
/// `bhav_ids` replaces the poem's bhav set when present and leaves it alone
/// when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoemInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub book_id: Option<i64>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bhav_ids: Option<Vec<i64>>,
}

/// A poem with its bhavs and book
#[derive(Debug, Clone, Serialize)]
pub struct PoemDetail {
    #[serde(flatten)]
    pub poem: Poem,
    pub bhavs: Vec<Bhav>,
    pub book: Option<Book>,
}

/// Public listing filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoemFilter {
    /// Bhav slug
    #[serde(default)]
    pub bhav: Option<String>,
    /// Book slug
    #[serde(default)]
    pub book: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
}

/// Result of a like toggle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeResult {
    /// Whether the visitor now likes the poem
    pub liked: bool,
    pub like_count: i64,
}
