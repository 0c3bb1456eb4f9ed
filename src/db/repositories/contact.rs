//! Contact submission repository

use crate::db::DbPool;
use crate::models::ContactSubmission;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, submission: &ContactSubmission) -> Result<ContactSubmission>;

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactSubmission>>;

    /// Newest first
    async fn list(&self, unread_only: bool, offset: i64, limit: i64) -> Result<Vec<ContactSubmission>>;

    async fn count(&self, unread_only: bool) -> Result<i64>;

    /// Returns false when no row matched
    async fn mark_read(&self, id: i64, is_read: bool) -> Result<bool>;

    /// Returns false when no row matched
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxContactRepository {
    pool: DbPool,
}

impl SqlxContactRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

const CONTACT_COLUMNS: &str = "id, name, email, subject, message, ip_address, is_read, created_at";

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, submission: &ContactSubmission) -> Result<ContactSubmission> {
        let result = sqlx::query(
            r#"
            INSERT INTO contact_submissions (name, email, subject, message, ip_address, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(&submission.subject)
        .bind(&submission.message)
        .bind(&submission.ip_address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to store contact submission")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Contact submission not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactSubmission>> {
        let row = sqlx::query(&format!("SELECT {} FROM contact_submissions WHERE id = ?", CONTACT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get contact submission")?;
        Ok(row.map(|r| row_to_submission(&r)))
    }

    async fn list(&self, unread_only: bool, offset: i64, limit: i64) -> Result<Vec<ContactSubmission>> {
        let sql = format!(
            "SELECT {} FROM contact_submissions {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            CONTACT_COLUMNS,
            if unread_only { "WHERE is_read = 0" } else { "" }
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list contact submissions")?;
        Ok(rows.iter().map(row_to_submission).collect())
    }

    async fn count(&self, unread_only: bool) -> Result<i64> {
        let sql = if unread_only {
            "SELECT COUNT(*) as count FROM contact_submissions WHERE is_read = 0"
        } else {
            "SELECT COUNT(*) as count FROM contact_submissions"
        };
        let row = sqlx::query(sql)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count contact submissions")?;
        Ok(row.get("count"))
    }

    async fn mark_read(&self, id: i64, is_read: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE contact_submissions SET is_read = ? WHERE id = ?")
            .bind(is_read)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to mark contact submission")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contact_submissions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete contact submission")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_submission(row: &sqlx::sqlite::SqliteRow) -> ContactSubmission {
    ContactSubmission {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        subject: row.get("subject"),
        message: row.get("message"),
        ip_address: row.get("ip_address"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    }
}
