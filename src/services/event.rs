//! Event service

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::repositories::EventRepository;
use crate::models::{Event, EventInput, EventWhen};
use crate::services::content::{
    is_http_url, optional_text, optional_url, require_slug, require_text, slug_conflict, ContentError,
    ContentResult,
};
use crate::services::slug::slug_or_title;

/// Most events returned by one listing
pub const EVENT_LIST_LIMIT: i64 = 200;

pub struct EventService {
    repo: Arc<dyn EventRepository>,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>) -> Self {
        Self { repo }
    }

    /// Published events relative to now
    pub async fn list_published(&self, when: EventWhen) -> ContentResult<Vec<Event>> {
        Ok(self.repo.list(when, Utc::now(), true, EVENT_LIST_LIMIT).await?)
    }

    /// Published events that have not ended, soonest first
    pub async fn list_upcoming(&self, limit: i64) -> ContentResult<Vec<Event>> {
        Ok(self.repo.list(EventWhen::Upcoming, Utc::now(), true, limit).await?)
    }

    /// Published events that have ended, latest first
    pub async fn list_past(&self, limit: i64) -> ContentResult<Vec<Event>> {
        Ok(self.repo.list(EventWhen::Past, Utc::now(), true, limit).await?)
    }

    pub async fn get_published_by_slug(&self, slug: &str) -> ContentResult<Event> {
        match self.repo.get_by_slug(slug).await? {
            Some(event) if event.is_published => Ok(event),
            _ => Err(ContentError::NotFound("Event".into())),
        }
    }

    pub async fn list_admin(&self) -> ContentResult<Vec<Event>> {
        Ok(self.repo.list(EventWhen::All, Utc::now(), false, EVENT_LIST_LIMIT).await?)
    }

    pub async fn get(&self, id: i64) -> ContentResult<Event> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ContentError::NotFound("Event".into()))
    }

    pub async fn create(&self, input: EventInput) -> ContentResult<Event> {
        let now = Utc::now();
        let mut event = Event {
            id: 0,
            title: String::new(),
            slug: String::new(),
            description: None,
            venue: None,
            city: None,
            address: None,
            starts_at: input.starts_at,
            ends_at: None,
            ticket_url: None,
            image: None,
            is_published: false,
            created_at: now,
            updated_at: now,
        };
        self.apply(&mut event, input, None).await?;
        let created = self.repo.create(&event).await.map_err(slug_conflict(&event.slug))?;
        tracing::info!("Created event '{}'", created.slug);
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: EventInput) -> ContentResult<Event> {
        let mut event = self.get(id).await?;
        self.apply(&mut event, input, Some(id)).await?;
        Ok(self.repo.update(&event).await.map_err(slug_conflict(&event.slug))?)
    }

    pub async fn delete(&self, id: i64) -> ContentResult<()> {
        let event = self.get(id).await?;
        self.repo.delete(id).await?;
        tracing::info!("Deleted event '{}'", event.slug);
        Ok(())
    }

    pub async fn count_upcoming(&self) -> ContentResult<i64> {
        Ok(self.repo.count_upcoming(Utc::now()).await?)
    }

    async fn apply(&self, event: &mut Event, input: EventInput, exclude_id: Option<i64>) -> ContentResult<()> {
        let title = require_text("Title", &input.title, 200)?;
        let slug = require_slug(slug_or_title(input.slug.as_deref(), &title))?;
        if self.repo.exists_by_slug(&slug, exclude_id).await? {
            return Err(ContentError::DuplicateSlug(slug));
        }
        check_range(input.starts_at, input.ends_at)?;

        let ticket_url = optional_text("Ticket URL", input.ticket_url, 500)?;
        if let Some(ref url) = ticket_url {
            if !is_http_url(url) {
                return Err(ContentError::Validation("Ticket URL must be an http(s) URL".into()));
            }
        }

        event.title = title;
        event.slug = slug;
        event.description = optional_text("Description", input.description, 5000)?;
        event.venue = optional_text("Venue", input.venue, 200)?;
        event.city = optional_text("City", input.city, 100)?;
        event.address = optional_text("Address", input.address, 500)?;
        event.starts_at = input.starts_at;
        event.ends_at = input.ends_at;
        event.ticket_url = ticket_url;
        event.image = optional_url("Image", input.image)?;
        event.is_published = input.is_published;
        Ok(())
    }
}

fn check_range(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> ContentResult<()> {
    match ends_at {
        Some(end) if end < starts_at => Err(ContentError::Validation(
            "Event cannot end before it starts".into(),
        )),
        _ => Ok(()),
    }
}
