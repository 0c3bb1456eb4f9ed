//! Performance repository

use crate::db::repositories::poem::dedup;
use crate::db::DbPool;
use crate::models::Performance;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

/// Listing filter with slugs already resolved to ids
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceQuery {
    pub bhav_id: Option<i64>,
    pub featured: Option<bool>,
    pub published_only: bool,
}

/// Performance repository trait
#[async_trait]
pub trait PerformanceRepository: Send + Sync {
    async fn create(&self, performance: &Performance) -> Result<Performance>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Performance>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Performance>>;

    async fn update(&self, performance: &Performance) -> Result<Performance>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Most recently performed first
    async fn list(&self, query: &PerformanceQuery, offset: i64, limit: i64) -> Result<Vec<Performance>>;

    async fn count(&self, query: &PerformanceQuery) -> Result<i64>;

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Replace the performance's bhav set in one transaction
    async fn set_bhavs(&self, performance_id: i64, bhav_ids: &[i64]) -> Result<()>;
}

/// SQLx-based performance repository implementation
pub struct SqlxPerformanceRepository {
    pool: DbPool,
}

impl SqlxPerformanceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn PerformanceRepository> {
        Arc::new(Self::new(pool))
    }
}

const PERFORMANCE_COLUMNS: &str = "f.id, f.title, f.slug, f.description, f.video_url, f.thumbnail, \
     f.venue, f.performed_at, f.duration, f.is_featured, f.is_published, f.created_at, f.updated_at";

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, query: &PerformanceQuery) {
    qb.push(" WHERE 1 = 1");
    if query.published_only {
        qb.push(" AND f.is_published = 1");
    }
    if let Some(featured) = query.featured {
        qb.push(" AND f.is_featured = ").push_bind(featured);
    }
    if let Some(bhav_id) = query.bhav_id {
        qb.push(" AND EXISTS (SELECT 1 FROM performance_bhavs pb WHERE pb.performance_id = f.id AND pb.bhav_id = ")
            .push_bind(bhav_id)
            .push(")");
    }
}

#[async_trait]
impl PerformanceRepository for SqlxPerformanceRepository {
    async fn create(&self, performance: &Performance) -> Result<Performance> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO performances (title, slug, description, video_url, thumbnail, venue,
                performed_at, duration, is_featured, is_published, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&performance.title)
        .bind(&performance.slug)
        .bind(&performance.description)
        .bind(&performance.video_url)
        .bind(&performance.thumbnail)
        .bind(&performance.venue)
        .bind(performance.performed_at)
        .bind(&performance.duration)
        .bind(performance.is_featured)
        .bind(performance.is_published)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create performance")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Performance not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Performance>> {
        let row = sqlx::query(&format!("SELECT {} FROM performances f WHERE f.id = ?", PERFORMANCE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get performance by ID")?;
        Ok(row.map(|r| row_to_performance(&r)))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Performance>> {
        let row = sqlx::query(&format!("SELECT {} FROM performances f WHERE f.slug = ?", PERFORMANCE_COLUMNS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get performance by slug")?;
        Ok(row.map(|r| row_to_performance(&r)))
    }

    async fn update(&self, performance: &Performance) -> Result<Performance> {
        sqlx::query(
            r#"
            UPDATE performances SET title = ?, slug = ?, description = ?, video_url = ?,
                thumbnail = ?, venue = ?, performed_at = ?, duration = ?, is_featured = ?,
                is_published = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&performance.title)
        .bind(&performance.slug)
        .bind(&performance.description)
        .bind(&performance.video_url)
        .bind(&performance.thumbnail)
        .bind(&performance.venue)
        .bind(performance.performed_at)
        .bind(&performance.duration)
        .bind(performance.is_featured)
        .bind(performance.is_published)
        .bind(Utc::now())
        .bind(performance.id)
        .execute(&self.pool)
        .await
        .context("Failed to update performance")?;

        self.get_by_id(performance.id)
            .await?
            .context("Performance not found after update")
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM performances WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete performance")?;
        Ok(())
    }

    async fn list(&self, query: &PerformanceQuery, offset: i64, limit: i64) -> Result<Vec<Performance>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM performances f", PERFORMANCE_COLUMNS));
        push_filters(&mut qb, query);
        qb.push(" ORDER BY COALESCE(f.performed_at, f.created_at) DESC, f.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list performances")?;
        Ok(rows.iter().map(row_to_performance).collect())
    }

    async fn count(&self, query: &PerformanceQuery) -> Result<i64> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) as count FROM performances f");
        push_filters(&mut qb, query);
        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count performances")?;
        Ok(row.get("count"))
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM performances WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(&self.pool)
            .await
            .context("Failed to check performance slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn set_bhavs(&self, performance_id: i64, bhav_ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM performance_bhavs WHERE performance_id = ?")
            .bind(performance_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear performance bhavs")?;

        for bhav_id in dedup(bhav_ids) {
            sqlx::query("INSERT INTO performance_bhavs (performance_id, bhav_id) VALUES (?, ?)")
                .bind(performance_id)
                .bind(bhav_id)
                .execute(&mut *tx)
                .await
                .context("Failed to link bhav to performance")?;
        }

        tx.commit().await.context("Failed to commit performance bhavs")?;
        Ok(())
    }
}

fn row_to_performance(row: &sqlx::sqlite::SqliteRow) -> Performance {
    Performance {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        video_url: row.get("video_url"),
        thumbnail: row.get("thumbnail"),
        venue: row.get("venue"),
        performed_at: row.get("performed_at"),
        duration: row.get("duration"),
        is_featured: row.get("is_featured"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
