//! Book API endpoints
//!
//! Public: GET /api/books, GET /api/books/{slug} (with its published poems)
//! Admin: GET/POST /api/admin/books, GET/PUT/DELETE /api/admin/books/{id}
//!
//! Deleting a book keeps its poems and clears their book reference.

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::ItemsResponse;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Book, BookDetail, BookInput};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books))
        .route("/{slug}", get(get_book))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list).post(create_book))
        .route("/{id}", get(admin_get).put(update_book).delete(delete_book))
}

async fn list_books(State(state): State<AppState>) -> Result<Json<ItemsResponse<Book>>, ApiError> {
    Ok(Json(state.book_service.list_published().await?.into()))
}

async fn get_book(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<BookDetail>, ApiError> {
    Ok(Json(state.book_service.get_published_by_slug(&slug).await?))
}

async fn admin_list(State(state): State<AppState>) -> Result<Json<ItemsResponse<Book>>, ApiError> {
    Ok(Json(state.book_service.list_admin().await?.into()))
}

async fn admin_get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<Book>, ApiError> {
    Ok(Json(state.book_service.get(id).await?))
}

async fn create_book(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<BookInput>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let book = state.book_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<BookInput>,
) -> Result<Json<Book>, ApiError> {
    Ok(Json(state.book_service.update(id, input).await?))
}

async fn delete_book(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    state.book_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
