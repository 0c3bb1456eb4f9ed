//! Performance service
//!
//! Performances are recorded readings, usually hosted on YouTube. The
//! `youtube_id` helper extracts the video id so pages can embed the player.

use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::{BhavRepository, PerformanceQuery, PerformanceRepository};
use crate::models::{ListParams, PagedResult, Performance, PerformanceDetail, PerformanceInput};
use crate::services::bhav::resolve_bhav_ids;
use crate::services::content::{
    is_http_url, optional_text, optional_url, require_slug, require_text, slug_conflict, ContentError,
    ContentResult,
};
use crate::services::slug::slug_or_title;

/// YouTube video id from a watch, short, embed or shorts URL
pub fn youtube_id(video_url: &str) -> Option<String> {
    let rest = video_url
        .strip_prefix("https://")
        .or_else(|| video_url.strip_prefix("http://"))?;
    let rest = rest.strip_prefix("www.").or_else(|| rest.strip_prefix("m.")).unwrap_or(rest);

    let candidate = if let Some(path) = rest.strip_prefix("youtu.be/") {
        path
    } else if let Some(path) = rest.strip_prefix("youtube.com/") {
        if let Some(query) = path.strip_prefix("watch?") {
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix("v="))?
        } else if let Some(id) = path.strip_prefix("embed/") {
            id
        } else if let Some(id) = path.strip_prefix("shorts/") {
            id
        } else {
            return None;
        }
    } else {
        return None;
    };

    let id: String = candidate
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if id.len() == 11 {
        Some(id)
    } else {
        None
    }
}

pub struct PerformanceService {
    repo: Arc<dyn PerformanceRepository>,
    bhav_repo: Arc<dyn BhavRepository>,
}

impl PerformanceService {
    pub fn new(repo: Arc<dyn PerformanceRepository>, bhav_repo: Arc<dyn BhavRepository>) -> Self {
        Self { repo, bhav_repo }
    }

    /// Published performances, most recent first. An unknown bhav slug
    /// matches nothing.
    pub async fn list_published(
        &self,
        bhav: Option<&str>,
        featured: Option<bool>,
        params: &ListParams,
    ) -> ContentResult<PagedResult<PerformanceDetail>> {
        let mut query = PerformanceQuery {
            featured,
            published_only: true,
            ..Default::default()
        };
        if let Some(slug) = bhav.filter(|s| !s.is_empty()) {
            match self.bhav_repo.get_by_slug(slug).await? {
                Some(b) => query.bhav_id = Some(b.id),
                None => return Ok(PagedResult::new(Vec::new(), 0, params)),
            }
        }
        let page = self.page(&query, params).await?;

        let mut items = Vec::with_capacity(page.items.len());
        for performance in page.items {
            items.push(self.hydrate(performance).await?);
        }
        Ok(PagedResult::new(items, page.total, params))
    }

    pub async fn get_published_by_slug(&self, slug: &str) -> ContentResult<PerformanceDetail> {
        match self.repo.get_by_slug(slug).await? {
            Some(p) if p.is_published => self.hydrate(p).await,
            _ => Err(ContentError::NotFound("Performance".into())),
        }
    }

    pub async fn list_admin(&self, params: &ListParams) -> ContentResult<PagedResult<Performance>> {
        self.page(&PerformanceQuery::default(), params).await
    }

    pub async fn get(&self, id: i64) -> ContentResult<PerformanceDetail> {
        let performance = self.find(id).await?;
        self.hydrate(performance).await
    }

    pub async fn create(&self, input: PerformanceInput) -> ContentResult<PerformanceDetail> {
        let now = Utc::now();
        let mut performance = Performance {
            id: 0,
            title: String::new(),
            slug: String::new(),
            description: None,
            video_url: String::new(),
            thumbnail: None,
            venue: None,
            performed_at: None,
            duration: None,
            is_featured: false,
            is_published: false,
            created_at: now,
            updated_at: now,
        };
        let bhav_ids = self.apply(&mut performance, input, None).await?;

        let created = self.repo.create(&performance).await.map_err(slug_conflict(&performance.slug))?;
        if let Some(ids) = bhav_ids {
            self.repo.set_bhavs(created.id, &ids).await?;
        }
        tracing::info!("Created performance '{}'", created.slug);
        self.hydrate(created).await
    }

    pub async fn update(&self, id: i64, input: PerformanceInput) -> ContentResult<PerformanceDetail> {
        let mut performance = self.find(id).await?;
        let bhav_ids = self.apply(&mut performance, input, Some(id)).await?;

        let updated = self.repo.update(&performance).await.map_err(slug_conflict(&performance.slug))?;
        if let Some(ids) = bhav_ids {
            self.repo.set_bhavs(id, &ids).await?;
        }
        self.hydrate(updated).await
    }

    pub async fn delete(&self, id: i64) -> ContentResult<()> {
        let performance = self.find(id).await?;
        self.repo.delete(id).await?;
        tracing::info!("Deleted performance '{}'", performance.slug);
        Ok(())
    }

    pub async fn count(&self, published_only: bool) -> ContentResult<i64> {
        let query = PerformanceQuery {
            published_only,
            ..Default::default()
        };
        Ok(self.repo.count(&query).await?)
    }

    async fn page(&self, query: &PerformanceQuery, params: &ListParams) -> ContentResult<PagedResult<Performance>> {
        let items = self.repo.list(query, params.offset(), params.limit()).await?;
        let total = self.repo.count(query).await?;
        Ok(PagedResult::new(items, total, params))
    }

    async fn find(&self, id: i64) -> ContentResult<Performance> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::NotFound("Performance".into()))
    }

    async fn hydrate(&self, performance: Performance) -> ContentResult<PerformanceDetail> {
        let bhavs = self.bhav_repo.list_for_performance(performance.id).await?;
        let youtube_id = youtube_id(&performance.video_url);
        Ok(PerformanceDetail {
            performance,
            bhavs,
            youtube_id,
        })
    }

    async fn apply(
        &self,
        performance: &mut Performance,
        input: PerformanceInput,
        exclude_id: Option<i64>,
    ) -> ContentResult<Option<Vec<i64>>> {
        let title = require_text("Title", &input.title, 200)?;
        let slug = require_slug(slug_or_title(input.slug.as_deref(), &title))?;
        if self.repo.exists_by_slug(&slug, exclude_id).await? {
            return Err(ContentError::DuplicateSlug(slug));
        }

        let video_url = require_text("Video URL", &input.video_url, 500)?;
        if !is_http_url(&video_url) {
            return Err(ContentError::Validation("Video URL must be an http(s) URL".into()));
        }

        let bhav_ids = match input.bhav_ids {
            Some(ids) => Some(resolve_bhav_ids(self.bhav_repo.as_ref(), &ids).await?),
            None => None,
        };

        performance.title = title;
        performance.slug = slug;
        performance.description = optional_text("Description", input.description, 5000)?;
        performance.video_url = video_url;
        performance.thumbnail = optional_url("Thumbnail", input.thumbnail)?;
        performance.venue = optional_text("Venue", input.venue, 200)?;
        performance.performed_at = input.performed_at;
        performance.duration = optional_text("Duration", input.duration, 20)?;
        performance.is_featured = input.is_featured;
        performance.is_published = input.is_published;
        Ok(bhav_ids)
    }
}
