//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled reading, show or workshop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub starts_at: DateTime<Utc>,
    /// Not before `starts_at` when present
    pub ends_at: Option<DateTime<Utc>>,
    pub ticket_url: Option<String>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// An event is upcoming until it has ended (or started, when it has no end)
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.ends_at.unwrap_or(self.starts_at) >= now
    }
}

/// Admin create/update body
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ticket_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

/// Which slice of the calendar to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventWhen {
    #[default]
    Upcoming,
    Past,
    All,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> Event {
        Event {
            id: 1,
            title: "Reading".into(),
            slug: "reading".into(),
            description: None,
            venue: None,
            city: None,
            address: None,
            starts_at,
            ends_at,
            ticket_url: None,
            image: None,
            is_published: true,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    #[test]
    fn test_running_event_is_upcoming() {
        let now = Utc::now();
        let e = event(now - Duration::hours(1), Some(now + Duration::hours(1)));
        assert!(e.is_upcoming(now));
    }

    #[test]
    fn test_finished_event_is_past() {
        let now = Utc::now();
        assert!(!event(now - Duration::days(2), None).is_upcoming(now));
        assert!(!event(now - Duration::days(2), Some(now - Duration::days(1))).is_upcoming(now));
    }

    #[test]
    fn test_when_parses_lowercase() {
        let when: EventWhen = serde_json::from_str("\"past\"").unwrap();
        assert_eq!(when, EventWhen::Past);
    }
}
