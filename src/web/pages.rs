//! Page handlers
//!
//! - GET / - Homepage sections, featured poems, upcoming events
//! - GET /poems, /poems/{slug}
//! - GET /performances
//! - GET /events
//! - GET /books, /books/{slug}
//! - GET /contact

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use tera::Context as TeraContext;

use super::PageError;
use crate::api::{ApiError, AppState};
use crate::models::{EventWhen, ListParams, PagedResult, PoemFilter};

const FEATURED_POEMS: u32 = 6;
const HOME_PERFORMANCES: u32 = 3;
const HOME_EVENTS: i64 = 3;
const PAST_EVENTS: i64 = 20;

/// Listing filters shared by the poem and performance pages
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub bhav: Option<String>,
    #[serde(default)]
    pub book: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl ListingQuery {
    fn params(&self) -> ListParams {
        ListParams::new(self.page.unwrap_or(1), ListParams::default().per_page)
    }
}

type PageResult = Result<(&'static str, TeraContext), PageError>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/poems", get(poems))
        .route("/poems/{slug}", get(poem))
        .route("/performances", get(performances))
        .route("/events", get(events))
        .route("/books", get(books))
        .route("/books/{slug}", get(book))
        .route("/contact", get(contact))
}

async fn index(State(state): State<AppState>) -> Response {
    respond(&state, "/", index_page(&state).await).await
}

async fn index_page(state: &AppState) -> PageResult {
    let featured_performances = state
        .performance_service
        .list_published(None, Some(true), &ListParams::new(1, HOME_PERFORMANCES))
        .await?;

    let mut ctx = TeraContext::new();
    ctx.insert("sections", &state.homepage_service.list_visible().await?);
    ctx.insert("featured_poems", &state.poem_service.list_featured(FEATURED_POEMS).await?);
    ctx.insert("upcoming_events", &state.event_service.list_upcoming(HOME_EVENTS).await?);
    ctx.insert("featured_performances", &featured_performances.items);
    Ok(("index.html", ctx))
}

async fn poems(State(state): State<AppState>, Query(query): Query<ListingQuery>) -> Response {
    respond(&state, "/poems", poems_page(&state, &query).await).await
}

async fn poems_page(state: &AppState, query: &ListingQuery) -> PageResult {
    let filter = PoemFilter {
        bhav: query.bhav.clone(),
        book: query.book.clone(),
        featured: None,
    };
    let result = state.poem_service.list_published(&filter, &query.params()).await?;

    let mut ctx = TeraContext::new();
    insert_pagination(&mut ctx, &result);
    ctx.insert("poems", &result);
    ctx.insert("bhavs", &state.bhav_service.list_public().await?);
    ctx.insert("current_bhav", &query.bhav);
    Ok(("poems.html", ctx))
}

async fn poem(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    respond(&state, "/poems", poem_page(&state, &slug).await).await
}

async fn poem_page(state: &AppState, slug: &str) -> PageResult {
    let detail = state.poem_service.get_published_by_slug(slug).await?;
    let mut ctx = TeraContext::new();
    ctx.insert("poem", &detail);
    Ok(("poem.html", ctx))
}

async fn performances(State(state): State<AppState>, Query(query): Query<ListingQuery>) -> Response {
    respond(&state, "/performances", performances_page(&state, &query).await).await
}

async fn performances_page(state: &AppState, query: &ListingQuery) -> PageResult {
    let result = state
        .performance_service
        .list_published(query.bhav.as_deref(), None, &query.params())
        .await?;

    let mut ctx = TeraContext::new();
    insert_pagination(&mut ctx, &result);
    ctx.insert("performances", &result);
    ctx.insert("bhavs", &state.bhav_service.list_public().await?);
    ctx.insert("current_bhav", &query.bhav);
    Ok(("performances.html", ctx))
}

async fn events(State(state): State<AppState>) -> Response {
    respond(&state, "/events", events_page(&state).await).await
}

async fn events_page(state: &AppState) -> PageResult {
    let mut ctx = TeraContext::new();
    ctx.insert("upcoming", &state.event_service.list_published(EventWhen::Upcoming).await?);
    ctx.insert("past", &state.event_service.list_past(PAST_EVENTS).await?);
    Ok(("events.html", ctx))
}

async fn books(State(state): State<AppState>) -> Response {
    respond(&state, "/books", books_page(&state).await).await
}

async fn books_page(state: &AppState) -> PageResult {
    let mut ctx = TeraContext::new();
    ctx.insert("books", &state.book_service.list_published().await?);
    Ok(("books.html", ctx))
}

async fn book(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    respond(&state, "/books", book_page(&state, &slug).await).await
}

async fn book_page(state: &AppState, slug: &str) -> PageResult {
    let detail = state.book_service.get_published_by_slug(slug).await?;
    let mut ctx = TeraContext::new();
    ctx.insert("book", &detail);
    Ok(("book.html", ctx))
}

async fn contact(State(state): State<AppState>) -> Response {
    respond(&state, "/contact", Ok(("contact.html", TeraContext::new()))).await
}

fn insert_pagination<T>(ctx: &mut TeraContext, page: &PagedResult<T>) {
    ctx.insert("total_pages", &page.total_pages());
    ctx.insert("has_next", &page.has_next());
    ctx.insert("has_prev", &page.has_prev());
}

/// Fallback for unmatched paths: JSON under `/api`, the 404 page elsewhere
pub async fn not_found(State(state): State<AppState>, uri: Uri) -> Response {
    if uri.path() == "/api" || uri.path().starts_with("/api/") {
        return ApiError::not_found(format!("No route for {}", uri.path())).into_response();
    }
    respond(&state, uri.path(), Err(PageError::NotFound)).await
}

/// Add the shared context and render; errors become the 404 or error page
async fn respond(state: &AppState, section: &str, page: PageResult) -> Response {
    let (status, template, mut ctx) = match page {
        Ok((template, ctx)) => (StatusCode::OK, template, ctx),
        Err(PageError::NotFound) => (StatusCode::NOT_FOUND, "404.html", TeraContext::new()),
        Err(e) => {
            tracing::error!("Page {} failed: {}", section, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "error.html", TeraContext::new())
        }
    };

    let site = match state.settings_service.get_site_settings().await {
        Ok(site) => site,
        Err(e) => {
            tracing::warn!("Falling back to default site settings: {}", e);
            Default::default()
        }
    };
    let push_enabled = state
        .settings_service
        .get_notification_settings()
        .await
        .map(|n| n.push_enabled)
        .unwrap_or(false);

    ctx.insert("site", &site);
    ctx.insert("push_enabled", &push_enabled);
    ctx.insert("section", section);
    ctx.insert("current_year", &Utc::now().year());

    match state.pages.render(template, &ctx) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>Internal Server Error</h1>".to_string()))
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::{build_router, AppState};
    use crate::config::Config;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::{BookInput, PoemInput};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    async fn setup() -> (AppState, Router) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let state = AppState::new(pool, &Config::default()).unwrap();
        let app = build_router(state.clone(), "http://localhost:3000");
        (state, app)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_static_pages_render_with_site_name() {
        let (_, app) = setup().await;
        for uri in ["/", "/poems", "/performances", "/events", "/books", "/contact"] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert!(body.contains("Kavya"), "{} lacks site name", uri);
        }
    }

    #[tokio::test]
    async fn test_poem_page_and_unpublished_404() {
        let (state, app) = setup().await;
        state
            .poem_service
            .create(PoemInput {
                title: "Pehli Barish".into(),
                content: "pehli barish\nmitti ki khushboo".into(),
                is_published: true,
                ..Default::default()
            })
            .await
            .unwrap();
        state
            .poem_service
            .create(PoemInput {
                title: "Hidden".into(),
                content: "draft".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let (status, body) = get(&app, "/poems/pehli-barish").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("mitti ki khushboo"));
        assert!(body.contains("<br"));

        let (status, body) = get(&app, "/poems/hidden").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Kavya"));
        let (status, _) = get(&app, "/poems/no-such-poem").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_book_page_lists_poems() {
        let (state, app) = setup().await;
        let book = state
            .book_service
            .create(BookInput {
                title: "Khidki".into(),
                is_published: true,
                ..Default::default()
            })
            .await
            .unwrap();
        state
            .poem_service
            .create(PoemInput {
                title: "Khuli Khidki".into(),
                content: "hawa".into(),
                book_id: Some(book.id),
                is_published: true,
                ..Default::default()
            })
            .await
            .unwrap();

        let (status, body) = get(&app, "/books/khidki").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Khuli Khidki"));
    }

    #[tokio::test]
    async fn test_unknown_paths() {
        let (_, app) = setup().await;
        let (status, body) = get(&app, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<html"));

        let (status, body) = get(&app, "/api/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("NOT_FOUND"));
    }
}
