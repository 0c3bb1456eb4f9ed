//! Push subscription repository

use crate::db::DbPool;
use crate::models::NotificationSubscription;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert, or refresh the keys of an existing endpoint
    async fn upsert(
        &self,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
        user_agent: Option<&str>,
    ) -> Result<NotificationSubscription>;

    async fn get_by_endpoint(&self, endpoint: &str) -> Result<Option<NotificationSubscription>>;

    async fn list(&self) -> Result<Vec<NotificationSubscription>>;

    async fn count(&self) -> Result<i64>;

    /// Returns false when the endpoint was not subscribed
    async fn delete_by_endpoint(&self, endpoint: &str) -> Result<bool>;

    async fn delete_many(&self, ids: &[i64]) -> Result<u64>;
}

pub struct SqlxNotificationRepository {
    pool: DbPool,
}

impl SqlxNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn NotificationRepository> {
        Arc::new(Self::new(pool))
    }
}

const SUBSCRIPTION_COLUMNS: &str = "id, endpoint, p256dh, auth, user_agent, created_at";

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn upsert(
        &self,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
        user_agent: Option<&str>,
    ) -> Result<NotificationSubscription> {
        sqlx::query(
            r#"
            INSERT INTO notification_subscriptions (endpoint, p256dh, auth, user_agent, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(endpoint) DO UPDATE SET
                p256dh = excluded.p256dh,
                auth = excluded.auth,
                user_agent = excluded.user_agent
            "#,
        )
        .bind(endpoint)
        .bind(p256dh)
        .bind(auth)
        .bind(user_agent)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to store subscription")?;

        self.get_by_endpoint(endpoint)
            .await?
            .context("Subscription not found after upsert")
    }

    async fn get_by_endpoint(&self, endpoint: &str) -> Result<Option<NotificationSubscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM notification_subscriptions WHERE endpoint = ?",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(endpoint)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get subscription")?;
        Ok(row.map(|r| row_to_subscription(&r)))
    }

    async fn list(&self) -> Result<Vec<NotificationSubscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notification_subscriptions ORDER BY id",
            SUBSCRIPTION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list subscriptions")?;
        Ok(rows.iter().map(row_to_subscription).collect())
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM notification_subscriptions")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count subscriptions")?;
        Ok(row.get("count"))
    }

    async fn delete_by_endpoint(&self, endpoint: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notification_subscriptions WHERE endpoint = ?")
            .bind(endpoint)
            .execute(&self.pool)
            .await
            .context("Failed to delete subscription")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        let mut removed = 0;
        let mut tx = self.pool.begin().await?;
        for id in ids {
            removed += sqlx::query("DELETE FROM notification_subscriptions WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to delete subscription")?
                .rows_affected();
        }
        tx.commit().await?;
        Ok(removed)
    }
}

fn row_to_subscription(row: &sqlx::sqlite::SqliteRow) -> NotificationSubscription {
    NotificationSubscription {
        id: row.get("id"),
        endpoint: row.get("endpoint"),
        p256dh: row.get("p256dh"),
        auth: row.get("auth"),
        user_agent: row.get("user_agent"),
        created_at: row.get("created_at"),
    }
}
