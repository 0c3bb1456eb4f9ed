//! Admin repository
//!
//! Database operations for admin accounts.

use crate::db::DbPool;
use crate::models::Admin;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Admin repository trait
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(&self, admin: &Admin) -> Result<Admin>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>>;

    async fn get_by_username(&self, username: &str) -> Result<Option<Admin>>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>>;

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based admin repository implementation
pub struct SqlxAdminRepository {
    pool: DbPool,
}

impl SqlxAdminRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn AdminRepository> {
        Arc::new(Self::new(pool))
    }
}

const ADMIN_COLUMNS: &str =
    "id, username, email, password_hash, display_name, created_at, updated_at";

#[async_trait]
impl AdminRepository for SqlxAdminRepository {
    async fn create(&self, admin: &Admin) -> Result<Admin> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO admins (username, email, password_hash, display_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&admin.username)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(&admin.display_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create admin")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .context("Admin not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>> {
        let row = sqlx::query(&format!("SELECT {} FROM admins WHERE id = ?", ADMIN_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get admin by ID")?;

        Ok(row.map(|r| row_to_admin(&r)))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Admin>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM admins WHERE username = ? COLLATE NOCASE",
            ADMIN_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get admin by username")?;

        Ok(row.map(|r| row_to_admin(&r)))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM admins WHERE email = ? COLLATE NOCASE",
            ADMIN_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get admin by email")?;

        Ok(row.map(|r| row_to_admin(&r)))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE admins SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update admin password")?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM admins")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count admins")?;
        Ok(row.get("count"))
    }
}

fn row_to_admin(row: &sqlx::sqlite::SqliteRow) -> Admin {
    Admin {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        display_name: row.get("display_name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    async fn repo() -> SqlxAdminRepository {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqlxAdminRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = repo().await;
        assert_eq!(repo.count().await.unwrap(), 0);

        let admin = repo
            .create(&Admin::new("Poet".into(), "poet@example.com".into(), "hash".into()))
            .await
            .unwrap();
        assert!(admin.id > 0);
        assert_eq!(repo.count().await.unwrap(), 1);

        assert!(repo.get_by_username("poet").await.unwrap().is_some());
        assert!(repo.get_by_email("POET@example.com").await.unwrap().is_some());
        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let repo = repo().await;
        repo.create(&Admin::new("poet".into(), "a@example.com".into(), "h".into()))
            .await
            .unwrap();
        let dup = repo
            .create(&Admin::new("poet".into(), "b@example.com".into(), "h".into()))
            .await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_update_password() {
        let repo = repo().await;
        let admin = repo
            .create(&Admin::new("poet".into(), "poet@example.com".into(), "old".into()))
            .await
            .unwrap();
        repo.update_password(admin.id, "new").await.unwrap();
        let reloaded = repo.get_by_id(admin.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "new");
    }
}
