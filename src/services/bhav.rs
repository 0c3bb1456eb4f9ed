//! Bhav service
//!
//! Bhavs are the moods poems and performances are tagged with. Besides CRUD
//! this module owns the check that a submitted bhav set only names existing
//! bhavs.

use chrono::Utc;
use std::sync::Arc;

use crate::db::repositories::BhavRepository;
use crate::db::repositories::poem::dedup;
use crate::models::{Bhav, BhavInput, BhavWithCounts};
use crate::services::content::{
    optional_text, require_slug, require_text, slug_conflict, ContentError, ContentResult,
};
use crate::services::slug::slug_or_title;

pub struct BhavService {
    repo: Arc<dyn BhavRepository>,
}

impl BhavService {
    pub fn new(repo: Arc<dyn BhavRepository>) -> Self {
        Self { repo }
    }

    /// All bhavs with counts of published poems and performances
    pub async fn list_public(&self) -> ContentResult<Vec<BhavWithCounts>> {
        Ok(self.repo.list_with_counts().await?)
    }

    pub async fn list_admin(&self) -> ContentResult<Vec<Bhav>> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: i64) -> ContentResult<Bhav> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::NotFound("Bhav".into()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> ContentResult<Option<Bhav>> {
        Ok(self.repo.get_by_slug(slug).await?)
    }

    pub async fn create(&self, input: BhavInput) -> ContentResult<Bhav> {
        let mut bhav = Bhav {
            id: 0,
            name: String::new(),
            slug: String::new(),
            description: None,
            color: None,
            created_at: Utc::now(),
        };
        self.apply(&mut bhav, input, None).await?;
        let created = self.repo.create(&bhav).await.map_err(slug_conflict(&bhav.slug))?;
        tracing::info!("Created bhav '{}'", created.slug);
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: BhavInput) -> ContentResult<Bhav> {
        let mut bhav = self.get(id).await?;
        self.apply(&mut bhav, input, Some(id)).await?;
        Ok(self.repo.update(&bhav).await.map_err(slug_conflict(&bhav.slug))?)
    }

    /// Delete a bhav. Its join rows go with it; tagged content stays.
    pub async fn delete(&self, id: i64) -> ContentResult<()> {
        let bhav = self.get(id).await?;
        self.repo.delete(id).await?;
        tracing::info!("Deleted bhav '{}'", bhav.slug);
        Ok(())
    }

    async fn apply(&self, bhav: &mut Bhav, input: BhavInput, exclude_id: Option<i64>) -> ContentResult<()> {
        let name = require_text("Name", &input.name, 100)?;
        let slug = require_slug(slug_or_title(input.slug.as_deref(), &name))?;
        if self.repo.exists_by_slug(&slug, exclude_id).await? {
            return Err(ContentError::DuplicateSlug(slug));
        }
        let color = optional_text("Color", input.color, 20)?;
        if let Some(ref c) = color {
            if !is_hex_color(c) {
                return Err(ContentError::Validation(
                    "Color must be a hex value like #c0392b".into(),
                ));
            }
        }

        bhav.name = name;
        bhav.slug = slug;
        bhav.description = optional_text("Description", input.description, 1000)?;
        bhav.color = color;
        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Deduplicate `ids` and make sure each names an existing bhav
pub async fn resolve_bhav_ids(repo: &dyn BhavRepository, ids: &[i64]) -> ContentResult<Vec<i64>> {
    let ids = dedup(ids);
    if ids.is_empty() {
        return Ok(ids);
    }
    let existing = repo.existing_ids(&ids).await?;
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !existing.contains(id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ContentError::Validation(format!(
            "Unknown bhav ids: {}",
            missing.join(", ")
        )));
    }
    Ok(ids)
}
