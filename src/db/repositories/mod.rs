//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for one table group.

pub mod admin;
pub mod bhav;
pub mod book;
pub mod contact;
pub mod event;
pub mod homepage_section;
pub mod notification;
pub mod performance;
pub mod poem;
pub mod session;
pub mod settings;

pub use admin::{AdminRepository, SqlxAdminRepository};
pub use bhav::{BhavRepository, SqlxBhavRepository};
pub use book::{BookRepository, SqlxBookRepository};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use event::{EventRepository, SqlxEventRepository};
pub use homepage_section::{HomepageSectionRepository, SqlxHomepageSectionRepository};
pub use notification::{NotificationRepository, SqlxNotificationRepository};
pub use performance::{PerformanceQuery, PerformanceRepository, SqlxPerformanceRepository};
pub use poem::{PoemQuery, PoemRepository, SqlxPoemRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use settings::{Setting, SettingsRepository, SqlxSettingsRepository};
