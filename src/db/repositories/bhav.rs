//! Bhav repository
//!
//! Database operations for bhavs and their join lookups.

use crate::db::DbPool;
use crate::models::{Bhav, BhavWithCounts};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

/// Bhav repository trait
#[async_trait]
pub trait BhavRepository: Send + Sync {
    async fn create(&self, bhav: &Bhav) -> Result<Bhav>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Bhav>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Bhav>>;

    /// All bhavs ordered by name
    async fn list(&self) -> Result<Vec<Bhav>>;

    /// All bhavs with counts of published poems and performances
    async fn list_with_counts(&self) -> Result<Vec<BhavWithCounts>>;

    async fn update(&self, bhav: &Bhav) -> Result<Bhav>;

    /// Delete a bhav; join rows go with it
    async fn delete(&self, id: i64) -> Result<()>;

    /// Whether `slug` is taken by a bhav other than `exclude_id`
    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// The subset of `ids` that exist
    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>>;

    async fn list_for_poem(&self, poem_id: i64) -> Result<Vec<Bhav>>;

    async fn list_for_performance(&self, performance_id: i64) -> Result<Vec<Bhav>>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based bhav repository implementation
pub struct SqlxBhavRepository {
    pool: DbPool,
}

impl SqlxBhavRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn BhavRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BhavRepository for SqlxBhavRepository {
    async fn create(&self, bhav: &Bhav) -> Result<Bhav> {
        let result = sqlx::query(
            "INSERT INTO bhavs (name, slug, description, color, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&bhav.name)
        .bind(&bhav.slug)
        .bind(&bhav.description)
        .bind(&bhav.color)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to create bhav")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Bhav not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Bhav>> {
        let row = sqlx::query("SELECT id, name, slug, description, color, created_at FROM bhavs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get bhav by ID")?;
        Ok(row.map(|r| row_to_bhav(&r)))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Bhav>> {
        let row = sqlx::query("SELECT id, name, slug, description, color, created_at FROM bhavs WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get bhav by slug")?;
        Ok(row.map(|r| row_to_bhav(&r)))
    }

    async fn list(&self) -> Result<Vec<Bhav>> {
        let rows = sqlx::query("SELECT id, name, slug, description, color, created_at FROM bhavs ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list bhavs")?;
        Ok(rows.iter().map(row_to_bhav).collect())
    }

    async fn list_with_counts(&self) -> Result<Vec<BhavWithCounts>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.name, b.slug, b.description, b.color, b.created_at,
                (SELECT COUNT(*) FROM poem_bhavs pb JOIN poems p ON p.id = pb.poem_id
                    WHERE pb.bhav_id = b.id AND p.is_published = 1) AS poem_count,
                (SELECT COUNT(*) FROM performance_bhavs fb JOIN performances f ON f.id = fb.performance_id
                    WHERE fb.bhav_id = b.id AND f.is_published = 1) AS performance_count
            FROM bhavs b
            ORDER BY b.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list bhavs with counts")?;

        Ok(rows
            .iter()
            .map(|r| BhavWithCounts {
                bhav: row_to_bhav(r),
                poem_count: r.get("poem_count"),
                performance_count: r.get("performance_count"),
            })
            .collect())
    }

    async fn update(&self, bhav: &Bhav) -> Result<Bhav> {
        sqlx::query("UPDATE bhavs SET name = ?, slug = ?, description = ?, color = ? WHERE id = ?")
            .bind(&bhav.name)
            .bind(&bhav.slug)
            .bind(&bhav.description)
            .bind(&bhav.color)
            .bind(bhav.id)
            .execute(&self.pool)
            .await
            .context("Failed to update bhav")?;

        self.get_by_id(bhav.id)
            .await?
            .context("Bhav not found after update")
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM poem_bhavs WHERE bhav_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete poem bhav links")?;
        sqlx::query("DELETE FROM performance_bhavs WHERE bhav_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete performance bhav links")?;
        sqlx::query("DELETE FROM bhavs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete bhav")?;
        tx.commit().await?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM bhavs WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(&self.pool)
            .await
            .context("Failed to check bhav slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM bhavs WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to check bhav ids")?;
        Ok(rows.iter().map(|r| r.get("id")).collect())
    }

    async fn list_for_poem(&self, poem_id: i64) -> Result<Vec<Bhav>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.name, b.slug, b.description, b.color, b.created_at
            FROM bhavs b
            JOIN poem_bhavs pb ON pb.bhav_id = b.id
            WHERE pb.poem_id = ?
            ORDER BY b.name
            "#,
        )
        .bind(poem_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list bhavs for poem")?;
        Ok(rows.iter().map(row_to_bhav).collect())
    }

    async fn list_for_performance(&self, performance_id: i64) -> Result<Vec<Bhav>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.name, b.slug, b.description, b.color, b.created_at
            FROM bhavs b
            JOIN performance_bhavs pb ON pb.bhav_id = b.id
            WHERE pb.performance_id = ?
            ORDER BY b.name
            "#,
        )
        .bind(performance_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list bhavs for performance")?;
        Ok(rows.iter().map(row_to_bhav).collect())
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM bhavs")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count bhavs")?;
        Ok(row.get("count"))
    }
}

fn row_to_bhav(row: &sqlx::sqlite::SqliteRow) -> Bhav {
    Bhav {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    fn bhav(name: &str, slug: &str) -> Bhav {
        Bhav {
            id: 0,
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            color: Some("#aa3355".to_string()),
            created_at: Utc::now(),
        }
    }

    async fn repo() -> SqlxBhavRepository {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqlxBhavRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let repo = repo().await;
        let created = repo.create(&bhav("Viraha", "viraha")).await.unwrap();
        assert!(created.id > 0);

        let by_slug = repo.get_by_slug("viraha").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);

        let mut changed = created.clone();
        changed.name = "Viraha (longing)".to_string();
        let updated = repo.update(&changed).await.unwrap();
        assert_eq!(updated.name, "Viraha (longing)");
    }

    #[tokio::test]
    async fn test_exists_by_slug_excludes_self() {
        let repo = repo().await;
        let created = repo.create(&bhav("Prem", "prem")).await.unwrap();
        assert!(repo.exists_by_slug("prem", None).await.unwrap());
        assert!(!repo.exists_by_slug("prem", Some(created.id)).await.unwrap());
        assert!(!repo.exists_by_slug("other", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_ids() {
        let repo = repo().await;
        let a = repo.create(&bhav("A", "a")).await.unwrap();
        let b = repo.create(&bhav("B", "b")).await.unwrap();

        let mut found = repo.existing_ids(&[a.id, b.id, 999]).await.unwrap();
        found.sort();
        assert_eq!(found, vec![a.id, b.id]);
        assert!(repo.existing_ids(&[]).await.unwrap().is_empty());
    }
}
