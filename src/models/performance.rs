//! Performance model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Bhav;

/// A recorded performance (video)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Performance {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    /// http(s) URL of the video
    pub video_url: String,
    pub thumbnail: Option<String>,
    pub venue: Option<String>,
    pub performed_at: Option<DateTime<Utc>>,
    /// Free-form duration, e.g. `4:32`
    pub duration: Option<String>,
    pub is_featured: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin create/update body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformanceInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub performed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub bhav_ids: Option<Vec<i64>>,
}

/// A performance with its bhavs and embed id
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceDetail {
    #[serde(flatten)]
    pub performance: Performance,
    pub bhavs: Vec<Bhav>,
    /// YouTube video id when `video_url` points at YouTube
    pub youtube_id: Option<String>,
}
