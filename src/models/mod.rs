//! Data models
//!
//! This module contains the data structures used throughout the site:
//! - Database entities (Poem, Performance, Event, Book, Bhav, HomepageSection,
//!   ContactSubmission, NotificationSubscription, Admin, Session)
//! - API request types (`*Input`)
//! - Pagination and response shapes

mod admin;
mod bhav;
mod book;
mod contact;
mod event;
mod homepage;
mod notification;
mod pagination;
mod performance;
mod poem;
mod session;

pub use admin::Admin;
pub use bhav::{Bhav, BhavInput, BhavWithCounts};
pub use book::{Book, BookDetail, BookInput};
pub use contact::{ContactInput, ContactSubmission};
pub use event::{Event, EventInput, EventWhen};
pub use homepage::{HomepageSection, HomepageSectionInput};
pub use notification::{
    BroadcastReport, NotificationPayload, NotificationSubscription, SubscribeInput, SubscriptionKeys,
};
pub use pagination::{ListParams, PagedResult};
pub use performance::{Performance, PerformanceDetail, PerformanceInput};
pub use poem::{LikeResult, Poem, PoemDetail, PoemFilter, PoemInput};
pub use session::Session;
