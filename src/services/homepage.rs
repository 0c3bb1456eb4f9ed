//! Homepage section service
//!
//! Sections are keyed by `section_key` (slug rules) and rendered on the home
//! page in `sort_order`.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::repositories::HomepageSectionRepository;
use crate::models::{HomepageSection, HomepageSectionInput};
use crate::services::content::{
    optional_text, optional_url, require_slug, require_text, slug_conflict, ContentError, ContentResult,
};
use crate::services::slug::slug_or_title;

pub struct HomepageService {
    repo: Arc<dyn HomepageSectionRepository>,
}

impl HomepageService {
    pub fn new(repo: Arc<dyn HomepageSectionRepository>) -> Self {
        Self { repo }
    }

    /// Visible sections in display order
    pub async fn list_visible(&self) -> ContentResult<Vec<HomepageSection>> {
        Ok(self.repo.list(true).await?)
    }

    pub async fn list_admin(&self) -> ContentResult<Vec<HomepageSection>> {
        Ok(self.repo.list(false).await?)
    }

    pub async fn get(&self, id: i64) -> ContentResult<HomepageSection> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::NotFound("Homepage section".into()))
    }

    /// Create a section; without a `sort_order` it goes last
    pub async fn create(&self, input: HomepageSectionInput) -> ContentResult<HomepageSection> {
        let now = Utc::now();
        let sort_order = match input.sort_order {
            Some(order) => order,
            None => self.repo.next_sort_order().await?,
        };
        let mut section = HomepageSection {
            id: 0,
            section_key: String::new(),
            title: String::new(),
            subtitle: None,
            content: None,
            image: None,
            cta_label: None,
            cta_url: None,
            sort_order,
            is_visible: true,
            created_at: now,
            updated_at: now,
        };
        self.apply(&mut section, input, None).await?;
        let created = self.repo.create(&section).await.map_err(slug_conflict(&section.section_key))?;
        tracing::info!("Created homepage section '{}'", created.section_key);
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: HomepageSectionInput) -> ContentResult<HomepageSection> {
        let mut section = self.get(id).await?;
        self.apply(&mut section, input, Some(id)).await?;
        Ok(self.repo.update(&section).await.map_err(slug_conflict(&section.section_key))?)
    }

    pub async fn delete(&self, id: i64) -> ContentResult<()> {
        let section = self.get(id).await?;
        self.repo.delete(id).await?;
        tracing::info!("Deleted homepage section '{}'", section.section_key);
        Ok(())
    }

    /// Assign `sort_order` by position in `ids`. Sections not listed keep
    /// their current order value.
    pub async fn reorder(&self, ids: &[i64]) -> ContentResult<Vec<HomepageSection>> {
        let mut seen = HashSet::new();
        if let Some(dup) = ids.iter().find(|id| !seen.insert(**id)) {
            return Err(ContentError::Validation(format!("Duplicate section id: {}", dup)));
        }

        let existing: HashSet<i64> = self.repo.list(false).await?.iter().map(|s| s.id).collect();
        if let Some(missing) = ids.iter().find(|id| !existing.contains(id)) {
            return Err(ContentError::Validation(format!("Unknown section id: {}", missing)));
        }

        self.repo.reorder(ids).await?;
        self.list_admin().await
    }

    async fn apply(
        &self,
        section: &mut HomepageSection,
        input: HomepageSectionInput,
        exclude_id: Option<i64>,
    ) -> ContentResult<()> {
        let title = require_text("Title", &input.title, 200)?;
        let key = require_slug(slug_or_title(input.section_key.as_deref(), &title))?;
        if self.repo.exists_by_key(&key, exclude_id).await? {
            return Err(ContentError::DuplicateSlug(key));
        }

        let cta_label = optional_text("CTA label", input.cta_label, 100)?;
        let cta_url = optional_url("CTA URL", input.cta_url)?;
        if cta_label.is_some() != cta_url.is_some() {
            return Err(ContentError::Validation(
                "CTA label and CTA URL must be set together".into(),
            ));
        }

        section.section_key = key;
        section.title = title;
        section.subtitle = optional_text("Subtitle", input.subtitle, 300)?;
        section.content = optional_text("Content", input.content, 10_000)?;
        section.image = optional_url("Image", input.image)?;
        section.cta_label = cta_label;
        section.cta_url = cta_url;
        if let Some(order) = input.sort_order {
            section.sort_order = order;
        }
        section.is_visible = input.is_visible;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxHomepageSectionRepository;
    use crate::db::{create_test_pool, migrations::run_migrations};

    async fn service() -> HomepageService {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        HomepageService::new(SqlxHomepageSectionRepository::boxed(pool))
    }

    fn input(title: &str) -> HomepageSectionInput {
        HomepageSectionInput {
            section_key: None,
            title: title.into(),
            subtitle: None,
            content: None,
            image: None,
            cta_label: None,
            cta_url: None,
            sort_order: None,
            is_visible: true,
        }
    }

    #[tokio::test]
    async fn test_new_sections_go_last() {
        let service = service().await;
        let hero = service.create(input("Hero")).await.unwrap();
        let about = service.create(input("About Me")).await.unwrap();
        assert_eq!(about.section_key, "about-me");
        assert!(about.sort_order > hero.sort_order);

        assert!(matches!(
            service.create(input("hero")).await,
            Err(ContentError::DuplicateSlug(_))
        ));
    }

    #[tokio::test]
    async fn test_reorder_and_visibility() {
        let service = service().await;
        let a = service.create(input("A")).await.unwrap();
        let b = service.create(input("B")).await.unwrap();
        let c = service.create(input("C")).await.unwrap();

        let ordered = service.reorder(&[c.id, a.id, b.id]).await.unwrap();
        assert_eq!(
            ordered.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![c.id, a.id, b.id]
        );

        let mut hidden = input("A");
        hidden.is_visible = false;
        service.update(a.id, hidden).await.unwrap();
        let visible = service.list_visible().await.unwrap();
        assert_eq!(visible.iter().map(|s| s.id).collect::<Vec<_>>(), vec![c.id, b.id]);

        assert!(service.reorder(&[a.id, a.id]).await.is_err());
        assert!(service.reorder(&[a.id, 999]).await.is_err());
    }

    #[tokio::test]
    async fn test_cta_pair_required() {
        let service = service().await;
        let mut half = input("Books");
        half.cta_label = Some("Buy now".into());
        assert!(matches!(service.create(half).await, Err(ContentError::Validation(_))));

        let mut full = input("Books");
        full.cta_label = Some("Buy now".into());
        full.cta_url = Some("/books".into());
        assert!(service.create(full).await.is_ok());
    }
}
