//! Database layer
//!
//! SQLite storage for the site: a connection pool, embedded migrations and
//! one repository per table group.
//!
//! # Usage
//!
//! ```ignore
//! use kavya::config::DatabaseConfig;
//! use kavya::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, ping, DbPool};
