//! Services layer - Business logic
//!
//! Services validate input, apply slug rules and coordinate repositories.
//! HTTP handlers only talk to services.

pub mod auth;
pub mod bhav;
pub mod book;
pub mod contact;
pub mod content;
pub mod email;
pub mod event;
pub mod homepage;
pub mod markdown;
pub mod notification;
pub mod password;
pub mod performance;
pub mod poem;
pub mod rate_limiter;
pub mod settings;
pub mod slug;

pub use auth::{AuthError, AuthService};
pub use bhav::BhavService;
pub use book::BookService;
pub use contact::ContactService;
pub use content::{ContentError, ContentResult};
pub use email::EmailService;
pub use event::EventService;
pub use homepage::HomepageService;
pub use notification::NotificationService;
pub use password::{hash_password, verify_password};
pub use performance::{youtube_id, PerformanceService};
pub use poem::{fingerprint, PoemService};
pub use rate_limiter::{RateLimitDecision, RateLimiter, RateLimiters};
pub use settings::{
    AllSettings, EmailSettings, NotificationSettings, SettingsService, SettingsServiceError, SiteSettings,
};
pub use slug::slugify;
