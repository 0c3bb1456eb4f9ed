//! Homepage section repository

use crate::db::DbPool;
use crate::models::HomepageSection;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Homepage section repository trait
#[async_trait]
pub trait HomepageSectionRepository: Send + Sync {
    async fn create(&self, section: &HomepageSection) -> Result<HomepageSection>;

    async fn get_by_id(&self, id: i64) -> Result<Option<HomepageSection>>;

    async fn update(&self, section: &HomepageSection) -> Result<HomepageSection>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Sections by `sort_order`
    async fn list(&self, visible_only: bool) -> Result<Vec<HomepageSection>>;

    async fn exists_by_key(&self, section_key: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Next free `sort_order` at the end of the list
    async fn next_sort_order(&self) -> Result<i32>;

    /// Set `sort_order` to each id's position, in one transaction
    async fn reorder(&self, ids: &[i64]) -> Result<()>;
}

/// SQLx-based homepage section repository implementation
pub struct SqlxHomepageSectionRepository {
    pool: DbPool,
}

impl SqlxHomepageSectionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn HomepageSectionRepository> {
        Arc::new(Self::new(pool))
    }
}

const SECTION_COLUMNS: &str = "id, section_key, title, subtitle, content, image, cta_label, cta_url, \
     sort_order, is_visible, created_at, updated_at";

#[async_trait]
impl HomepageSectionRepository for SqlxHomepageSectionRepository {
    async fn create(&self, section: &HomepageSection) -> Result<HomepageSection> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO homepage_sections (section_key, title, subtitle, content, image,
                cta_label, cta_url, sort_order, is_visible, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&section.section_key)
        .bind(&section.title)
        .bind(&section.subtitle)
        .bind(&section.content)
        .bind(&section.image)
        .bind(&section.cta_label)
        .bind(&section.cta_url)
        .bind(section.sort_order)
        .bind(section.is_visible)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create homepage section")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Homepage section not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<HomepageSection>> {
        let row = sqlx::query(&format!("SELECT {} FROM homepage_sections WHERE id = ?", SECTION_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get homepage section by ID")?;
        Ok(row.map(|r| row_to_section(&r)))
    }

    async fn update(&self, section: &HomepageSection) -> Result<HomepageSection> {
        sqlx::query(
            r#"
            UPDATE homepage_sections SET section_key = ?, title = ?, subtitle = ?, content = ?,
                image = ?, cta_label = ?, cta_url = ?, sort_order = ?, is_visible = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&section.section_key)
        .bind(&section.title)
        .bind(&section.subtitle)
        .bind(&section.content)
        .bind(&section.image)
        .bind(&section.cta_label)
        .bind(&section.cta_url)
        .bind(section.sort_order)
        .bind(section.is_visible)
        .bind(Utc::now())
        .bind(section.id)
        .execute(&self.pool)
        .await
        .context("Failed to update homepage section")?;

        self.get_by_id(section.id)
            .await?
            .context("Homepage section not found after update")
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM homepage_sections WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete homepage section")?;
        Ok(())
    }

    async fn list(&self, visible_only: bool) -> Result<Vec<HomepageSection>> {
        let sql = format!(
            "SELECT {} FROM homepage_sections {} ORDER BY sort_order ASC, id ASC",
            SECTION_COLUMNS,
            if visible_only { "WHERE is_visible = 1" } else { "" }
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list homepage sections")?;
        Ok(rows.iter().map(row_to_section).collect())
    }

    async fn exists_by_key(&self, section_key: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM homepage_sections WHERE section_key = ? AND id != ?",
        )
        .bind(section_key)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(&self.pool)
        .await
        .context("Failed to check homepage section key")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn next_sort_order(&self) -> Result<i32> {
        let row = sqlx::query("SELECT COALESCE(MAX(sort_order) + 1, 0) as next FROM homepage_sections")
            .fetch_one(&self.pool)
            .await
            .context("Failed to compute next sort order")?;
        Ok(row.get("next"))
    }

    async fn reorder(&self, ids: &[i64]) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for (position, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE homepage_sections SET sort_order = ?, updated_at = ? WHERE id = ?")
                .bind(position as i32)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to reorder homepage section")?;
        }
        tx.commit().await.context("Failed to commit homepage order")?;
        Ok(())
    }
}

fn row_to_section(row: &sqlx::sqlite::SqliteRow) -> HomepageSection {
    HomepageSection {
        id: row.get("id"),
        section_key: row.get("section_key"),
        title: row.get("title"),
        subtitle: row.get("subtitle"),
        content: row.get("content"),
        image: row.get("image"),
        cta_label: row.get("cta_label"),
        cta_url: row.get("cta_url"),
        sort_order: row.get("sort_order"),
        is_visible: row.get("is_visible"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
