//! API layer - HTTP handlers and routing
//!
//! This module contains the JSON endpoints under `/api`:
//! - Public content (poems, performances, events, books, bhavs, homepage)
//! - Contact form and push subscriptions
//! - Admin authentication
//! - Admin content management, settings, uploads and dashboard
//!
//! `build_router` puts the API, the uploaded files and the HTML pages
//! together behind the shared middleware stack.

pub mod admin;
pub mod auth;
pub mod bhavs;
pub mod books;
pub mod common;
pub mod contact;
pub mod events;
pub mod extract;
pub mod homepage;
pub mod middleware;
pub mod notifications;
pub mod performances;
pub mod poems;
pub mod site;
pub mod upload;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedAdmin, ClientInfo};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need an admin session)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .nest("/admin/poems", poems::admin_router())
        .nest("/admin/performances", performances::admin_router())
        .nest("/admin/events", events::admin_router())
        .nest("/admin/books", books::admin_router())
        .nest("/admin/bhavs", bhavs::admin_router())
        .nest("/admin/homepage", homepage::admin_router())
        .nest("/admin/contact", contact::admin_router())
        .nest("/admin/notifications", notifications::admin_router())
        .nest("/admin/upload", upload::router(state.upload_config.max_file_size))
        .nest("/auth", auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    // Public routes
    Router::new()
        .nest("/poems", poems::public_router())
        .nest("/performances", performances::public_router())
        .nest("/events", events::public_router())
        .nest("/books", books::public_router())
        .nest("/bhavs", bhavs::public_router())
        .nest("/homepage", homepage::public_router())
        .nest("/contact", contact::public_router())
        .nest("/notifications", notifications::public_router())
        .nest("/site", site::router())
        .nest("/auth", auth::public_router())
        .merge(admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!("Ignoring invalid CORS origin '{}'", cors_origin),
    }

    let uploads = ServeDir::new(&state.upload_config.path);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .nest_service("/uploads", uploads)
        .merge(crate::web::router())
        .fallback(crate::web::not_found)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdminBootstrapConfig, Config, WindowConfig};
    use crate::db::{create_test_pool, migrations::run_migrations};
    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderMap, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const PASSWORD: &str = "correct horse battery";

    async fn app_with(config: Config) -> Router {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let state = AppState::new(pool, &config).unwrap();
        state
            .auth_service
            .ensure_admin(&AdminBootstrapConfig {
                username: Some("poet".into()),
                email: Some("poet@example.com".into()),
                password: Some(PASSWORD.into()),
            })
            .await
            .unwrap();
        build_router(state, "http://localhost:3000")
    }

    async fn app() -> Router {
        app_with(Config::default()).await
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, json)
    }

    async fn login(app: &Router) -> String {
        let (status, _, body) = call(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username_or_email": "poet", "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        let app = app().await;
        for uri in ["/api/admin/poems", "/api/admin/dashboard", "/api/admin/settings", "/api/auth/me"] {
            let (status, _, body) = call(&app, Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        }
        let (status, _, _) = call(&app, Method::GET, "/api/admin/poems", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_logout_clears_it() {
        let app = app().await;
        let (status, headers, body) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username_or_email": "poet@example.com", "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["admin"].get("password_hash").is_none());
        let token = body["token"].as_str().unwrap();
        let cookie = headers[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!("session={};", token)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        // Cookie works as well as the bearer header
        let request = Request::builder()
            .uri("/api/auth/me")
            .header(header::COOKIE, format!("session={}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, headers, _) = call(&app, Method::POST, "/api/auth/logout", Some(token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(headers[header::SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

        let (status, _, _) = call(&app, Method::GET, "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = app().await;
        let (status, _, body) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username_or_email": "poet", "password": "nope-nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_failed_logins_are_limited_per_username() {
        let mut config = Config::default();
        config.rate_limit.login_user = WindowConfig::new(2, 900);
        let app = app_with(config).await;

        let attempt = json!({ "username_or_email": "Poet", "password": "wrong-password" });
        for _ in 0..2 {
            let (status, _, _) = call(&app, Method::POST, "/api/auth/login", None, Some(attempt.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        // Even the right password is refused while the username is locked
        let (status, headers, body) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username_or_email": "poet", "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(headers.contains_key(header::RETRY_AFTER));
        assert!(body["error"]["details"]["retry_after"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_change_password_keeps_current_session() {
        let app = app().await;
        let token = login(&app).await;
        let other = login(&app).await;

        let (status, _, body) = call(
            &app,
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({ "current_password": "wrong", "new_password": "another long one" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

        let (status, _, _) = call(
            &app,
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({ "current_password": PASSWORD, "new_password": "another long one" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, _) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, _) = call(&app, Method::GET, "/api/auth/me", Some(&other), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_validation_error() {
        let app = app().await;
        let token = login(&app).await;
        let poem = json!({ "title": "Barish", "content": "rain\non the roof", "is_published": true });

        let (status, _, body) = call(&app, Method::POST, "/api/admin/poems", Some(&token), Some(poem.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["slug"], "barish");

        let (status, _, body) = call(&app, Method::POST, "/api/admin/poems", Some(&token), Some(poem)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["field"], "slug");
    }

    #[tokio::test]
    async fn test_admin_crud_status_codes() {
        let app = app().await;
        let token = login(&app).await;

        let (status, _, event) = call(
            &app,
            Method::POST,
            "/api/admin/events",
            Some(&token),
            Some(json!({ "title": "Kavi Sammelan", "starts_at": "2099-01-01T18:00:00Z", "is_published": true })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = event["id"].as_i64().unwrap();

        let (status, _, _) = call(&app, Method::GET, &format!("/api/admin/events/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, _) = call(&app, Method::DELETE, &format!("/api/admin/events/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _, body) = call(&app, Method::GET, &format!("/api/admin/events/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        let (status, _, _) = call(&app, Method::DELETE, "/api/admin/books/999", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_deleting_book_detaches_poems() {
        let app = app().await;
        let token = login(&app).await;

        let (_, _, book) = call(
            &app,
            Method::POST,
            "/api/admin/books",
            Some(&token),
            Some(json!({ "title": "Dhoop Chhaon", "is_published": true })),
        )
        .await;
        let book_id = book["id"].as_i64().unwrap();
        let (status, _, poem) = call(
            &app,
            Method::POST,
            "/api/admin/poems",
            Some(&token),
            Some(json!({ "title": "Dhoop", "content": "sun", "book_id": book_id, "is_published": true })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(poem["book_id"], book_id);

        let (status, _, detail) = call(&app, Method::GET, "/api/books/dhoop-chhaon", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["poems"].as_array().unwrap().len(), 1);

        let (status, _, _) =
            call(&app, Method::DELETE, &format!("/api/admin/books/{}", book_id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, poem) = call(&app, Method::GET, "/api/poems/dhoop", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(poem["book_id"].is_null());
        assert!(poem["book"].is_null());
    }

    #[tokio::test]
    async fn test_bhav_set_is_replaced_and_bhav_delete_keeps_poem() {
        let app = app().await;
        let token = login(&app).await;

        let mut ids = Vec::new();
        for name in ["Shringar", "Karuna"] {
            let (status, _, bhav) = call(
                &app,
                Method::POST,
                "/api/admin/bhavs",
                Some(&token),
                Some(json!({ "name": name, "color": "#aa3344" })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            ids.push(bhav["id"].as_i64().unwrap());
        }

        let (_, _, poem) = call(
            &app,
            Method::POST,
            "/api/admin/poems",
            Some(&token),
            Some(json!({ "title": "Viraha", "content": "longing", "is_published": true, "bhav_ids": [ids[0]] })),
        )
        .await;
        let poem_id = poem["id"].as_i64().unwrap();

        let (status, _, updated) = call(
            &app,
            Method::PUT,
            &format!("/api/admin/poems/{}", poem_id),
            Some(&token),
            Some(json!({ "title": "Viraha", "content": "longing", "is_published": true, "bhav_ids": [ids[1]] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let bhavs: Vec<i64> = updated["bhavs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].as_i64().unwrap())
            .collect();
        assert_eq!(bhavs, vec![ids[1]]);

        let (_, _, page) = call(&app, Method::GET, "/api/poems?bhav=shringar", None, None).await;
        assert_eq!(page["total"], 0);
        let (_, _, page) = call(&app, Method::GET, "/api/poems?bhav=karuna", None, None).await;
        assert_eq!(page["total"], 1);

        let (status, _, _) =
            call(&app, Method::DELETE, &format!("/api/admin/bhavs/{}", ids[1]), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _, poem) = call(&app, Method::GET, "/api/poems/viraha", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(poem["bhavs"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_public_reads_hide_drafts() {
        let app = app().await;
        let token = login(&app).await;
        call(
            &app,
            Method::POST,
            "/api/admin/poems",
            Some(&token),
            Some(json!({ "title": "Unfinished", "content": "..." })),
        )
        .await;

        let (status, _, _) = call(&app, Method::GET, "/api/poems/unfinished", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = call(&app, Method::GET, "/api/poems/never-written", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, _, page) = call(&app, Method::GET, "/api/poems", None, None).await;
        assert_eq!(page["total"], 0);
        let (_, _, page) = call(&app, Method::GET, "/api/admin/poems", Some(&token), None).await;
        assert_eq!(page["total"], 1);
    }

    #[tokio::test]
    async fn test_like_toggles_and_view_counts() {
        let app = app().await;
        let token = login(&app).await;
        call(
            &app,
            Method::POST,
            "/api/admin/poems",
            Some(&token),
            Some(json!({ "title": "Chand", "content": "moon\nlight", "is_published": true })),
        )
        .await;

        let (status, _, first) = call(&app, Method::POST, "/api/poems/chand/like", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, json!({ "liked": true, "like_count": 1 }));
        let (_, _, second) = call(&app, Method::POST, "/api/poems/chand/like", None, None).await;
        assert_eq!(second, json!({ "liked": false, "like_count": 0 }));

        let (_, _, view) = call(&app, Method::POST, "/api/poems/chand/view", None, None).await;
        assert_eq!(view["view_count"], 1);

        let (_, _, poem) = call(&app, Method::GET, "/api/poems/chand", None, None).await;
        assert!(poem["content_html"].as_str().unwrap().contains("<br"));
    }

    #[tokio::test]
    async fn test_contact_is_rate_limited() {
        let mut config = Config::default();
        config.rate_limit.contact = WindowConfig::new(1, 3600);
        let app = app_with(config).await;
        let message = json!({ "name": "Reader", "email": "reader@example.com", "message": "Loved the reading" });

        let (status, _, _) = call(&app, Method::POST, "/api/contact", None, Some(message.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, headers, body) = call(&app, Method::POST, "/api/contact", None, Some(message)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "RATE_LIMITED");
        let retry: u64 = headers[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!(retry > 0 && retry <= 3600);

        let token = login(&app).await;
        let (_, _, inbox) = call(&app, Method::GET, "/api/admin/contact?unread=true", Some(&token), None).await;
        assert_eq!(inbox["total"], 1);
        assert_eq!(inbox["unread_count"], 1);
        let id = inbox["items"][0]["id"].as_i64().unwrap();

        let (status, _, read) =
            call(&app, Method::PUT, &format!("/api/admin/contact/{}/read", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read["is_read"], true);

        let (_, _, dashboard) = call(&app, Method::GET, "/api/admin/dashboard", Some(&token), None).await;
        assert_eq!(dashboard["unread_messages"], 0);
    }

    #[tokio::test]
    async fn test_forwarded_for_does_not_bypass_limits() {
        let mut config = Config::default();
        config.rate_limit.contact = WindowConfig::new(1, 3600);
        let app = app_with(config).await;

        let mut statuses = Vec::new();
        for i in 0..3 {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/contact")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", format!("10.9.{}.1", i))
                .body(Body::from(
                    json!({ "name": "Reader", "email": "reader@example.com", "message": "Again" }).to_string(),
                ))
                .unwrap();
            statuses.push(app.clone().oneshot(request).await.unwrap().status());
        }
        assert_eq!(
            statuses,
            [StatusCode::CREATED, StatusCode::TOO_MANY_REQUESTS, StatusCode::TOO_MANY_REQUESTS]
        );
    }

    #[tokio::test]
    async fn test_bad_input_uses_error_envelope() {
        let app = app().await;
        let token = login(&app).await;

        let (status, _, body) = call(
            &app,
            Method::POST,
            "/api/admin/poems",
            Some(&token),
            Some(json!({ "content": "no title here" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _, body) = call(&app, Method::GET, "/api/admin/poems/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _, body) = call(&app, Method::GET, "/api/poems?page=first", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{broken"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_settings_hide_smtp_password() {
        let app = app().await;
        let token = login(&app).await;

        let (_, _, mut settings) = call(&app, Method::GET, "/api/admin/settings", Some(&token), None).await;
        settings["site"]["site_name"] = json!("Meera Kavya");
        settings["email"]["smtp_host"] = json!("smtp.example.com");
        settings["email"]["smtp_password"] = json!("hunter22");
        let (status, _, saved) = call(&app, Method::PUT, "/api/admin/settings", Some(&token), Some(settings)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["email"]["smtp_password"], "");

        let (status, _, site) = call(&app, Method::GET, "/api/site", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(site["site_name"], "Meera Kavya");
        assert!(site.get("smtp_host").is_none());
        assert!(!site.to_string().contains("hunter22"));
    }

    #[tokio::test]
    async fn test_homepage_reorder() {
        let app = app().await;
        let token = login(&app).await;
        let mut ids = Vec::new();
        for title in ["Hero", "Latest", "Books"] {
            let (_, _, s) = call(
                &app,
                Method::POST,
                "/api/admin/homepage",
                Some(&token),
                Some(json!({ "title": title })),
            )
            .await;
            ids.push(s["id"].as_i64().unwrap());
        }
        let (status, _, _) = call(
            &app,
            Method::PUT,
            "/api/admin/homepage/reorder",
            Some(&token),
            Some(json!({ "ids": [ids[2], ids[0], ids[1]] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, _, public) = call(&app, Method::GET, "/api/homepage", None, None).await;
        let keys: Vec<&str> = public["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["section_key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["books", "hero", "latest"]);
    }

    #[tokio::test]
    async fn test_upload_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.upload.path = dir.path().join("uploads");
        let app = app_with(config).await;
        let token = login(&app).await;

        let boundary = "kavyaboundary";
        let multipart = |content_type: &str| {
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cover.png\"\r\n\
                 Content-Type: {ct}\r\n\r\nPNGDATA\r\n--{b}--\r\n",
                b = boundary,
                ct = content_type
            )
        };
        let upload = |body: String| {
            Request::builder()
                .method(Method::POST)
                .uri("/api/admin/upload/image")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap()
        };

        let response = app.clone().oneshot(upload(multipart("image/png"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let filename = body["filename"].as_str().unwrap();
        assert!(filename.ends_with(".png"));
        assert_eq!(body["url"], format!("/uploads/{}", filename));
        assert!(dir.path().join("uploads").join(filename).exists());

        let response = app.clone().oneshot(upload(multipart("text/html"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
