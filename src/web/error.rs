//! Page error types

use thiserror::Error;

use crate::services::{ContentError, SettingsServiceError};

/// Errors that end a page request
#[derive(Debug, Error)]
pub enum PageError {
    /// Unknown or unpublished slug
    #[error("Page not found")]
    NotFound,

    /// Template rendering error
    #[error("Template error: {0}")]
    Render(String),

    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl From<ContentError> for PageError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound(_) => PageError::NotFound,
            other => PageError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<SettingsServiceError> for PageError {
    fn from(err: SettingsServiceError) -> Self {
        PageError::Internal(anyhow::Error::new(err))
    }
}
