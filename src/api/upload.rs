//! Upload API endpoints
//!
//! - POST /api/admin/upload/image - Upload a single image (cover art,
//!   performance thumbnails, homepage images)
//!
//! Files land in `upload.path` under a random name and are served back at
//! `/uploads/{filename}`.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState, AuthenticatedAdmin};

/// Multipart framing allowance on top of the file itself
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Response for successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: u64,
    pub content_type: String,
}

/// Build the upload router. The body limit follows the configured file size.
pub fn router(max_file_size: u64) -> Router<AppState> {
    let limit = usize::try_from(max_file_size.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX);
    Router::new()
        .route("/image", post(upload_image))
        .layer(DefaultBodyLimit::max(limit))
}

/// POST /api/admin/upload/image
///
/// Accepts multipart/form-data with a single file field named "file".
async fn upload_image(
    State(state): State<AppState>,
    auth: AuthenticatedAdmin,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let config = &state.upload_config;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !config.is_type_allowed(&content_type) {
            return Err(ApiError::validation_error(format!(
                "Invalid file type: {}. Allowed types: {}",
                content_type,
                config.allowed_types.join(", ")
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        if data.is_empty() {
            return Err(ApiError::validation_error("File is empty"));
        }
        if data.len() as u64 > config.max_file_size {
            return Err(ApiError::validation_error(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                config.max_file_size,
                config.max_file_size / 1024 / 1024
            )));
        }

        ensure_upload_dir(&config.path).await?;

        let filename = format!("{}.{}", Uuid::new_v4(), config.get_extension(&content_type));
        fs::write(config.path.join(&filename), &data)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to save upload: {}", e)))?;

        tracing::info!(
            "{} uploaded {} ({} bytes)",
            auth.admin.username,
            filename,
            data.len()
        );

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: format!("/uploads/{}", filename),
                filename,
                size: data.len() as u64,
                content_type,
            }),
        ));
    }

    Err(ApiError::validation_error("No file provided"))
}

async fn ensure_upload_dir(path: &Path) -> Result<(), ApiError> {
    if !path.exists() {
        fs::create_dir_all(path)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create upload directory: {}", e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_upload_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_upload_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        // Existing directory is fine
        ensure_upload_dir(&nested).await.unwrap();
    }
}
