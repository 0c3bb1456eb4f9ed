//! SQLite connection pool
//!
//! File-backed databases get their parent directory created on first start.
//! Foreign keys are enabled on every connection so `ON DELETE` clauses apply.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::DatabaseConfig;

/// Pool type shared by every repository
pub type DbPool = SqlitePool;

/// Normalize a configured database location into a `sqlite:` URL.
fn connection_url(url: &str) -> String {
    if url == ":memory:" || url == "sqlite::memory:" {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        if url.contains('?') {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else {
        format!("sqlite:{}?mode=rwc", url)
    }
}

fn ensure_parent_dir(url: &str) -> Result<()> {
    if url.contains(":memory:") {
        return Ok(());
    }

    let path = url.trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }
    }
    Ok(())
}

/// Create the SQLite connection pool described by the configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    ensure_parent_dir(&config.url)?;

    let url = connection_url(&config.url);
    let in_memory = url.contains(":memory:");

    let options = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("Invalid SQLite database URL: {}", config.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to `:memory:` opens a fresh database, so keep one.
    let max_connections = if in_memory { 1 } else { 10 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", config.url))?;

    Ok(pool)
}

/// Create an in-memory pool for tests
pub async fn create_test_pool() -> Result<DbPool> {
    create_pool(&DatabaseConfig {
        url: ":memory:".to_string(),
    })
    .await
}

/// Check that the database answers
pub async fn ping(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Database ping failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[test]
    fn test_connection_url_forms() {
        assert_eq!(connection_url(":memory:"), "sqlite::memory:");
        assert_eq!(connection_url("data/kavya.db"), "sqlite:data/kavya.db?mode=rwc");
        assert_eq!(connection_url("sqlite:site.db"), "sqlite:site.db?mode=rwc");
        assert_eq!(connection_url("sqlite:site.db?mode=ro"), "sqlite:site.db?mode=ro");
    }

    #[tokio::test]
    async fn test_create_test_pool() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        ping(&pool).await.expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_pool().await.unwrap();
        let row = sqlx::query("PRAGMA foreign_keys").fetch_one(&pool).await.unwrap();
        let enabled: i64 = row.get(0);
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_in_memory_state_shared_across_queries() {
        let pool = create_test_pool().await.unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (id) VALUES (1)").execute(&pool).await.unwrap();

        let row = sqlx::query("SELECT COUNT(*) FROM t").fetch_one(&pool).await.unwrap();
        let count: i64 = row.get(0);
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_sqlite_nested_directory_creation() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("site.db");

        let config = DatabaseConfig {
            url: db_path.to_string_lossy().to_string(),
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        ping(&pool).await.expect("Ping should succeed");
        assert!(db_path.exists());
    }
}
