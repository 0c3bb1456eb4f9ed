//! Event repository

use crate::db::DbPool;
use crate::models::{Event, EventWhen};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

/// Event repository trait
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Event>>;

    async fn update(&self, event: &Event) -> Result<Event>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Events relative to `now`: upcoming soonest first, past latest first
    async fn list(
        &self,
        when: EventWhen,
        now: DateTime<Utc>,
        published_only: bool,
        limit: i64,
    ) -> Result<Vec<Event>>;

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn count_upcoming(&self, now: DateTime<Utc>) -> Result<i64>;
}

/// SQLx-based event repository implementation
pub struct SqlxEventRepository {
    pool: DbPool,
}

impl SqlxEventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn EventRepository> {
        Arc::new(Self::new(pool))
    }
}

const EVENT_COLUMNS: &str = "id, title, slug, description, venue, city, address, starts_at, ends_at, \
     ticket_url, image, is_published, created_at, updated_at";

#[async_trait]
impl EventRepository for SqlxEventRepository {
    async fn create(&self, event: &Event) -> Result<Event> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO events (title, slug, description, venue, city, address, starts_at,
                ends_at, ticket_url, image, is_published, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.title)
        .bind(&event.slug)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(&event.city)
        .bind(&event.address)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(&event.ticket_url)
        .bind(&event.image)
        .bind(event.is_published)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create event")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .context("Event not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get event by ID")?;
        Ok(row.map(|r| row_to_event(&r)))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE slug = ?", EVENT_COLUMNS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get event by slug")?;
        Ok(row.map(|r| row_to_event(&r)))
    }

    async fn update(&self, event: &Event) -> Result<Event> {
        sqlx::query(
            r#"
            UPDATE events SET title = ?, slug = ?, description = ?, venue = ?, city = ?,
                address = ?, starts_at = ?, ends_at = ?, ticket_url = ?, image = ?,
                is_published = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&event.title)
        .bind(&event.slug)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(&event.city)
        .bind(&event.address)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(&event.ticket_url)
        .bind(&event.image)
        .bind(event.is_published)
        .bind(Utc::now())
        .bind(event.id)
        .execute(&self.pool)
        .await
        .context("Failed to update event")?;

        self.get_by_id(event.id)
            .await?
            .context("Event not found after update")
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete event")?;
        Ok(())
    }

    async fn list(
        &self,
        when: EventWhen,
        now: DateTime<Utc>,
        published_only: bool,
        limit: i64,
    ) -> Result<Vec<Event>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM events WHERE 1 = 1", EVENT_COLUMNS));
        if published_only {
            qb.push(" AND is_published = 1");
        }
        match when {
            EventWhen::Upcoming => {
                qb.push(" AND COALESCE(ends_at, starts_at) >= ")
                    .push_bind(now)
                    .push(" ORDER BY starts_at ASC");
            }
            EventWhen::Past => {
                qb.push(" AND COALESCE(ends_at, starts_at) < ")
                    .push_bind(now)
                    .push(" ORDER BY starts_at DESC");
            }
            EventWhen::All => {
                qb.push(" ORDER BY starts_at DESC");
            }
        }
        qb.push(" LIMIT ").push_bind(limit);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list events")?;
        Ok(rows.iter().map(row_to_event).collect())
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM events WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(&self.pool)
            .await
            .context("Failed to check event slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn count_upcoming(&self, now: DateTime<Utc>) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM events WHERE is_published = 1 AND COALESCE(ends_at, starts_at) >= ?",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count upcoming events")?;
        Ok(row.get("count"))
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Event {
    Event {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        venue: row.get("venue"),
        city: row.get("city"),
        address: row.get("address"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        ticket_url: row.get("ticket_url"),
        image: row.get("image"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use chrono::Duration;

    fn event(slug: &str, starts_at: DateTime<Utc>) -> Event {
        Event {
            id: 0,
            title: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            venue: Some("Prithvi Theatre".to_string()),
            city: Some("Mumbai".to_string()),
            address: None,
            starts_at,
            ends_at: None,
            ticket_url: None,
            image: None,
            is_published: true,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    #[tokio::test]
    async fn test_upcoming_and_past() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqlxEventRepository::new(pool);
        let now = Utc::now();

        repo.create(&event("later", now + Duration::days(10))).await.unwrap();
        repo.create(&event("soon", now + Duration::days(1))).await.unwrap();
        repo.create(&event("done", now - Duration::days(3))).await.unwrap();

        let upcoming = repo.list(EventWhen::Upcoming, now, true, 50).await.unwrap();
        let slugs: Vec<_> = upcoming.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["soon", "later"]);

        let past = repo.list(EventWhen::Past, now, true, 50).await.unwrap();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].slug, "done");

        assert_eq!(repo.list(EventWhen::All, now, true, 50).await.unwrap().len(), 3);
        assert_eq!(repo.count_upcoming(now).await.unwrap(), 2);
    }
}
