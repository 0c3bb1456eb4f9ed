//! Push notification service
//!
//! Stores browser push subscriptions and delivers a JSON payload to each
//! endpoint. Payloads are sent unencrypted, so this works with relays that
//! accept plain JSON rather than with browser push services directly.

use anyhow::Context;
use futures::future::join_all;
use reqwest::{StatusCode, Url};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use crate::db::repositories::NotificationRepository;
use crate::models::{BroadcastReport, NotificationPayload, NotificationSubscription, SubscribeInput};
use crate::services::content::{require_text, ContentError, ContentResult};

/// Push endpoints must be `https://` and must not name this machine or a
/// private network by IP literal or `localhost`
pub fn is_public_endpoint(endpoint: &str) -> bool {
    let Ok(url) = Url::parse(endpoint) else {
        return false;
    };
    if url.scheme() != "https" {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => is_public_v4(ip),
        Ok(IpAddr::V6(ip)) => is_public_v6(ip),
        Err(_) => {
            let host = host.trim_end_matches('.').to_ascii_lowercase();
            host != "localhost" && !host.ends_with(".localhost")
        }
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        // 100.64.0.0/10 carrier-grade NAT
        || (a == 100 && (b & 0xc0) == 64)
        || a == 0)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_v4(v4);
    }
    let first = ip.segments()[0];
    !(ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80)
}

enum Delivery {
    Sent,
    Failed,
    Gone(i64),
}

pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    client: reqwest::Client,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("kavya/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { repo, client })
    }

    pub async fn subscribe(
        &self,
        input: SubscribeInput,
        user_agent: Option<&str>,
    ) -> ContentResult<NotificationSubscription> {
        let endpoint = input.endpoint.trim();
        if endpoint.len() > 1000 || !is_public_endpoint(endpoint) {
            return Err(ContentError::Validation("Invalid subscription endpoint".into()));
        }
        let p256dh = require_text("p256dh", &input.keys.p256dh, 200)?;
        let auth = require_text("auth", &input.keys.auth, 200)?;
        let user_agent = user_agent.map(|ua| ua.chars().take(300).collect::<String>());

        Ok(self
            .repo
            .upsert(endpoint, &p256dh, &auth, user_agent.as_deref())
            .await?)
    }

    pub async fn unsubscribe(&self, endpoint: &str) -> ContentResult<()> {
        if !self.repo.delete_by_endpoint(endpoint.trim()).await? {
            return Err(ContentError::NotFound("Subscription".into()));
        }
        Ok(())
    }

    pub async fn count(&self) -> ContentResult<i64> {
        Ok(self.repo.count().await?)
    }

    /// Deliver `payload` to every subscriber concurrently. Endpoints that
    /// answer 404 or 410 are removed.
    pub async fn broadcast(&self, payload: &NotificationPayload) -> ContentResult<BroadcastReport> {
        require_text("Title", &payload.title, 200)?;
        require_text("Body", &payload.body, 1000)?;

        let subscriptions = self.repo.list().await?;
        let deliveries = join_all(subscriptions.iter().map(|s| self.deliver(s, payload))).await;

        let mut report = BroadcastReport::default();
        let mut gone = Vec::new();
        for delivery in deliveries {
            match delivery {
                Delivery::Sent => report.sent += 1,
                Delivery::Failed => report.failed += 1,
                Delivery::Gone(id) => {
                    report.failed += 1;
                    gone.push(id);
                }
            }
        }
        if !gone.is_empty() {
            report.removed = self.repo.delete_many(&gone).await? as usize;
        }

        tracing::info!(
            "Broadcast '{}': {} sent, {} failed, {} removed",
            payload.title,
            report.sent,
            report.failed,
            report.removed
        );
        Ok(report)
    }

    async fn deliver(&self, subscription: &NotificationSubscription, payload: &NotificationPayload) -> Delivery {
        match self.client.post(&subscription.endpoint).json(payload).send().await {
            Ok(resp) if resp.status().is_success() => Delivery::Sent,
            Ok(resp) if matches!(resp.status(), StatusCode::NOT_FOUND | StatusCode::GONE) => {
                Delivery::Gone(subscription.id)
            }
            Ok(resp) => {
                tracing::warn!("Push to {} failed: {}", subscription.endpoint, resp.status());
                Delivery::Failed
            }
            Err(e) => {
                tracing::warn!("Push to {} failed: {}", subscription.endpoint, e);
                Delivery::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxNotificationRepository;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::SubscriptionKeys;
    use axum::{http::StatusCode as AxumStatus, routing::post, Router};

    async fn repo() -> Arc<dyn NotificationRepository> {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqlxNotificationRepository::boxed(pool)
    }

    async fn service() -> NotificationService {
        NotificationService::new(repo().await).unwrap()
    }

    fn input(endpoint: &str) -> SubscribeInput {
        SubscribeInput {
            endpoint: endpoint.into(),
            keys: SubscriptionKeys {
                p256dh: "BNcRd".into(),
                auth: "tBHI".into(),
            },
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload {
            title: "New poem".into(),
            body: "Monsoon Letters is up".into(),
            url: Some("/poems/monsoon-letters".into()),
            icon: None,
        }
    }

    /// Local push relay: `/ok` accepts, `/gone` reports the subscription expired
    async fn relay() -> String {
        let app = Router::new()
            .route("/ok", post(|| async { AxumStatus::CREATED }))
            .route("/gone", post(|| async { AxumStatus::GONE }))
            .route("/broken", post(|| async { AxumStatus::INTERNAL_SERVER_ERROR }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_public_endpoint_rules() {
        for ok in [
            "https://fcm.googleapis.com/fcm/send/abc",
            "https://updates.push.services.mozilla.com/wpush/v2/x",
            "https://93.184.216.34/push",
            "https://[2606:4700::1111]/push",
        ] {
            assert!(is_public_endpoint(ok), "{} should be accepted", ok);
        }
        for bad in [
            "http://push.example.com/a",
            "https://localhost/a",
            "https://LOCALHOST./a",
            "https://relay.localhost/a",
            "https://127.0.0.1:8080/a",
            "https://169.254.169.254/latest/meta-data",
            "https://10.0.0.5/a",
            "https://172.16.3.4/a",
            "https://192.168.1.20/a",
            "https://100.64.0.1/a",
            "https://0.0.0.0/a",
            "https://[::1]/a",
            "https://[fd00::1]/a",
            "https://[fe80::1]/a",
            "https://[::ffff:127.0.0.1]/a",
            "ftp://push.example.com/a",
            "not-a-url",
        ] {
            assert!(!is_public_endpoint(bad), "{} should be rejected", bad);
        }
    }

    #[tokio::test]
    async fn test_subscribe_validation() {
        let service = service().await;
        assert!(service.subscribe(input("not-a-url"), None).await.is_err());
        assert!(matches!(
            service.subscribe(input("http://169.254.169.254/latest"), None).await,
            Err(ContentError::Validation(_))
        ));
        assert!(service.subscribe(input("https://127.0.0.1:9/push"), None).await.is_err());
        let mut bad_keys = input("https://push.example.com/a");
        bad_keys.keys.auth = " ".into();
        assert!(service.subscribe(bad_keys, None).await.is_err());

        service.subscribe(input("https://push.example.com/a"), Some("Firefox")).await.unwrap();
        service.subscribe(input("https://push.example.com/a"), None).await.unwrap();
        assert_eq!(service.count().await.unwrap(), 1);

        service.unsubscribe("https://push.example.com/a").await.unwrap();
        assert!(matches!(
            service.unsubscribe("https://push.example.com/a").await,
            Err(ContentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_broadcast_prunes_gone_endpoints() {
        let base = relay().await;
        let repo = repo().await;
        // The relay listens on loopback, which subscribe refuses
        for path in ["ok", "gone", "broken"] {
            repo.upsert(&format!("{}/{}", base, path), "BNcRd", "tBHI", None)
                .await
                .unwrap();
        }
        let service = NotificationService::new(repo).unwrap();

        let report = service.broadcast(&payload()).await.unwrap();
        assert_eq!(report, BroadcastReport { sent: 1, failed: 2, removed: 1 });
        assert_eq!(service.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers() {
        let service = service().await;
        let report = service.broadcast(&payload()).await.unwrap();
        assert_eq!(report, BroadcastReport::default());

        let mut empty = payload();
        empty.title = String::new();
        assert!(service.broadcast(&empty).await.is_err());
    }
}
