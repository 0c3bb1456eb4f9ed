//! Shared pieces of the admin content mutation path
//!
//! Every content service validates its input with these helpers and reports
//! failures as `ContentError`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Error type shared by the content services
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Slug '{0}' is already in use")]
    DuplicateSlug(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type ContentResult<T> = std::result::Result<T, ContentError>;

/// Map a failed insert/update. Two writers can both pass the slug check;
/// the unique index then rejects the second one, which is still a duplicate.
pub fn slug_conflict(slug: &str) -> impl FnOnce(anyhow::Error) -> ContentError + '_ {
    move |err| {
        if is_unique_violation(&err) {
            ContentError::DuplicateSlug(slug.to_string())
        } else {
            ContentError::Internal(err)
        }
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Trimmed, non-empty, at most `max` characters
pub fn require_text(field: &str, value: &str, max: usize) -> ContentResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ContentError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(ContentError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// Blank strings become `None`; long ones are rejected
pub fn optional_text(field: &str, value: Option<String>, max: usize) -> ContentResult<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if v.chars().count() > max => Err(ContentError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        other => Ok(other),
    }
}

/// Absolute http(s) URL or a site-relative path (uploads)
pub fn optional_url(field: &str, value: Option<String>) -> ContentResult<Option<String>> {
    let value = optional_text(field, value, 500)?;
    if let Some(ref url) = value {
        if !(is_http_url(url) || url.starts_with('/')) {
            return Err(ContentError::Validation(format!(
                "{} must be an http(s) URL or a site path",
                field
            )));
        }
    }
    Ok(value)
}

/// `http://` or `https://` followed by a host
pub fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(r) if !r.is_empty() && !r.starts_with('/') && !r.contains(char::is_whitespace))
}

pub fn is_valid_email(value: &str) -> bool {
    value.len() <= 255 && EMAIL_RE.is_match(value)
}

/// Reject an empty slug (a title made only of punctuation)
pub fn require_slug(slug: String) -> ContentResult<String> {
    if slug.is_empty() {
        return Err(ContentError::Validation(
            "Slug cannot be empty; use letters or digits in the title".to_string(),
        ));
    }
    if slug.chars().count() > 200 {
        return Err(ContentError::Validation("Slug is too long".to_string()));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("Title", "  Rain  ", 10).unwrap(), "Rain");
        assert!(matches!(require_text("Title", "   ", 10), Err(ContentError::Validation(_))));
        assert!(require_text("Title", "abcdefghijk", 10).is_err());
    }

    #[test]
    fn test_optional_text_blank_is_none() {
        assert_eq!(optional_text("Venue", Some("  ".into()), 10).unwrap(), None);
        assert_eq!(optional_text("Venue", None, 10).unwrap(), None);
        assert_eq!(optional_text("Venue", Some(" Hall ".into()), 10).unwrap(), Some("Hall".into()));
    }

    #[test]
    fn test_urls() {
        assert!(is_http_url("https://youtube.com/watch?v=x"));
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("javascript:alert(1)"));

        assert!(optional_url("Image", Some("/uploads/a.png".into())).is_ok());
        assert!(optional_url("Image", Some("data:image/png;base64,xx".into())).is_err());
    }

    #[tokio::test]
    async fn test_unique_index_violation_is_duplicate_slug() {
        use anyhow::Context;
        use crate::db::{create_test_pool, migrations::run_migrations};

        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        const INSERT: &str = "INSERT INTO bhavs (name, slug) VALUES ('Virah', 'virah')";
        sqlx::query(INSERT).execute(&pool).await.unwrap();

        let err = sqlx::query(INSERT)
            .execute(&pool)
            .await
            .context("Failed to create bhav")
            .unwrap_err();
        assert!(matches!(
            slug_conflict("virah")(err),
            ContentError::DuplicateSlug(s) if s == "virah"
        ));

        let other = anyhow::anyhow!("connection reset");
        assert!(matches!(slug_conflict("virah")(other), ContentError::Internal(_)));
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("reader@example.com"));
        assert!(!is_valid_email("reader@example"));
        assert!(!is_valid_email("two words@example.com"));
    }
}
