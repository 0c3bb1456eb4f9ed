//! Poem repository
//!
//! Database operations for poems, their bhav joins and visitor likes.
//!
//! This module provides:
//! - `PoemRepository` trait defining the interface for poem data access
//! - `SqlxPoemRepository` implementing the trait for SQLite
//! - `PoemQuery`, the resolved listing filter

use crate::db::DbPool;
use crate::models::{LikeResult, Poem};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

/// Listing filter with slugs already resolved to ids
#[derive(Debug, Clone, Copy, Default)]
pub struct PoemQuery {
    pub bhav_id: Option<i64>,
    pub book_id: Option<i64>,
    pub featured: Option<bool>,
    pub published_only: bool,
}

/// Poem repository trait
#[async_trait]
pub trait PoemRepository: Send + Sync {
    async fn create(&self, poem: &Poem) -> Result<Poem>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Poem>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Poem>>;

    /// Overwrite the editable columns of `poem`
    async fn update(&self, poem: &Poem) -> Result<Poem>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Poems matching `query`, newest first
    async fn list(&self, query: &PoemQuery, offset: i64, limit: i64) -> Result<Vec<Poem>>;

    async fn count(&self, query: &PoemQuery) -> Result<i64>;

    /// Whether `slug` is taken by a poem other than `exclude_id`
    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Replace the poem's bhav set in one transaction
    async fn set_bhavs(&self, poem_id: i64, bhav_ids: &[i64]) -> Result<()>;

    /// Like when the fingerprint has not liked the poem yet, otherwise unlike
    async fn toggle_like(&self, poem_id: i64, fingerprint: &str) -> Result<LikeResult>;

    async fn increment_view(&self, poem_id: i64) -> Result<i64>;
}

/// SQLx-based poem repository implementation
pub struct SqlxPoemRepository {
    pool: DbPool,
}

impl SqlxPoemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn PoemRepository> {
        Arc::new(Self::new(pool))
    }
}

const POEM_COLUMNS: &str = "p.id, p.title, p.slug, p.content, p.excerpt, p.language, p.cover_image, \
     p.book_id, p.is_featured, p.is_published, p.like_count, p.view_count, p.published_at, \
     p.created_at, p.updated_at";

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, query: &PoemQuery) {
    qb.push(" WHERE 1 = 1");
    if query.published_only {
        qb.push(" AND p.is_published = 1");
    }
    if let Some(book_id) = query.book_id {
        qb.push(" AND p.book_id = ").push_bind(book_id);
    }
    if let Some(featured) = query.featured {
        qb.push(" AND p.is_featured = ").push_bind(featured);
    }
    if let Some(bhav_id) = query.bhav_id {
        qb.push(" AND EXISTS (SELECT 1 FROM poem_bhavs pb WHERE pb.poem_id = p.id AND pb.bhav_id = ")
            .push_bind(bhav_id)
            .push(")");
    }
}

#[async_trait]
impl PoemRepository for SqlxPoemRepository {
    async fn create(&self, poem: &Poem) -> Result<Poem> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO poems (title, slug, content, excerpt, language, cover_image, book_id,
                is_featured, is_published, like_count, view_count, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?, ?)
            "#,
        )
        .bind(&poem.title)
        .bind(&poem.slug)
        .bind(&poem.content)
        .bind(&poem.excerpt)
        .bind(&poem.language)
        .bind(&poem.cover_image)
        .bind(poem.book_id)
        .bind(poem.is_featured)
        .bind(poem.is_published)
        .bind(poem.published_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create poem")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Poem not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Poem>> {
        let row = sqlx::query(&format!("SELECT {} FROM poems p WHERE p.id = ?", POEM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get poem by ID")?;
        Ok(row.map(|r| row_to_poem(&r)))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Poem>> {
        let row = sqlx::query(&format!("SELECT {} FROM poems p WHERE p.slug = ?", POEM_COLUMNS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get poem by slug")?;
        Ok(row.map(|r| row_to_poem(&r)))
    }

    async fn update(&self, poem: &Poem) -> Result<Poem> {
        sqlx::query(
            r#"
            UPDATE poems SET title = ?, slug = ?, content = ?, excerpt = ?, language = ?,
                cover_image = ?, book_id = ?, is_featured = ?, is_published = ?,
                published_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&poem.title)
        .bind(&poem.slug)
        .bind(&poem.content)
        .bind(&poem.excerpt)
        .bind(&poem.language)
        .bind(&poem.cover_image)
        .bind(poem.book_id)
        .bind(poem.is_featured)
        .bind(poem.is_published)
        .bind(poem.published_at)
        .bind(Utc::now())
        .bind(poem.id)
        .execute(&self.pool)
        .await
        .context("Failed to update poem")?;

        self.get_by_id(poem.id)
            .await?
            .context("Poem not found after update")
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM poems WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete poem")?;
        Ok(())
    }

    async fn list(&self, query: &PoemQuery, offset: i64, limit: i64) -> Result<Vec<Poem>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM poems p", POEM_COLUMNS));
        push_filters(&mut qb, query);
        qb.push(" ORDER BY COALESCE(p.published_at, p.created_at) DESC, p.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list poems")?;
        Ok(rows.iter().map(row_to_poem).collect())
    }

    async fn count(&self, query: &PoemQuery) -> Result<i64> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) as count FROM poems p");
        push_filters(&mut qb, query);

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count poems")?;
        Ok(row.get("count"))
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM poems WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(&self.pool)
            .await
            .context("Failed to check poem slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn set_bhavs(&self, poem_id: i64, bhav_ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM poem_bhavs WHERE poem_id = ?")
            .bind(poem_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear poem bhavs")?;

        for bhav_id in dedup(bhav_ids) {
            sqlx::query("INSERT INTO poem_bhavs (poem_id, bhav_id) VALUES (?, ?)")
                .bind(poem_id)
                .bind(bhav_id)
                .execute(&mut *tx)
                .await
                .context("Failed to link bhav to poem")?;
        }

        tx.commit().await.context("Failed to commit poem bhavs")?;
        Ok(())
    }

    async fn toggle_like(&self, poem_id: i64, fingerprint: &str) -> Result<LikeResult> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM poem_likes WHERE poem_id = ? AND fingerprint = ?")
            .bind(poem_id)
            .bind(fingerprint)
            .execute(&mut *tx)
            .await
            .context("Failed to remove like")?
            .rows_affected();

        let liked = if removed > 0 {
            sqlx::query("UPDATE poems SET like_count = MAX(like_count - 1, 0) WHERE id = ?")
                .bind(poem_id)
                .execute(&mut *tx)
                .await
                .context("Failed to decrement like count")?;
            false
        } else {
            sqlx::query("INSERT INTO poem_likes (poem_id, fingerprint, created_at) VALUES (?, ?, ?)")
                .bind(poem_id)
                .bind(fingerprint)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .context("Failed to add like")?;
            sqlx::query("UPDATE poems SET like_count = like_count + 1 WHERE id = ?")
                .bind(poem_id)
                .execute(&mut *tx)
                .await
                .context("Failed to increment like count")?;
            true
        };

        let row = sqlx::query("SELECT like_count FROM poems WHERE id = ?")
            .bind(poem_id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to read like count")?;
        let like_count: i64 = row.get("like_count");

        tx.commit().await.context("Failed to commit like")?;
        Ok(LikeResult { liked, like_count })
    }

    async fn increment_view(&self, poem_id: i64) -> Result<i64> {
        let row = sqlx::query("UPDATE poems SET view_count = view_count + 1 WHERE id = ? RETURNING view_count")
            .bind(poem_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to increment view count")?;
        Ok(row.get("view_count"))
    }
}

/// Drop repeated ids, keeping first-seen order
pub(crate) fn dedup(ids: &[i64]) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

fn row_to_poem(row: &sqlx::sqlite::SqliteRow) -> Poem {
    Poem {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        language: row.get("language"),
        cover_image: row.get("cover_image"),
        book_id: row.get("book_id"),
        is_featured: row.get("is_featured"),
        is_published: row.get("is_published"),
        like_count: row.get("like_count"),
        view_count: row.get("view_count"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
