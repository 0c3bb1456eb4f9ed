//! Sliding-window rate limiter
//!
//! Single-process and in-memory. Each key (client IP or username) owns a
//! queue of hit timestamps inside a bounded moka cache, so the number of
//! tracked keys never exceeds `max_tracked_keys` and a key is forgotten once
//! it has been idle for a whole window.
//!
//! Used for:
//! - the contact form (per IP)
//! - poem likes (per IP)
//! - login attempts (per IP, and failed attempts per username)

use moka::future::Cache;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::{RateLimitConfig, WindowConfig};

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The hit was recorded; `remaining` more fit in the current window
    Allowed { remaining: usize },
    /// Rejected; the oldest hit leaves the window in `retry_after` seconds
    Limited { retry_after: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

type Window = Arc<Mutex<VecDeque<Instant>>>;

/// One named limiter: at most `max_requests` hits per key within `window`
#[derive(Clone)]
pub struct RateLimiter {
    name: &'static str,
    max_requests: usize,
    window: Duration,
    hits: Cache<String, Window>,
}

impl RateLimiter {
    pub fn new(name: &'static str, config: WindowConfig, max_tracked_keys: u64) -> Self {
        let window = Duration::from_secs(config.window_seconds.max(1));
        Self {
            name,
            max_requests: config.max_requests,
            window,
            hits: Cache::builder()
                .max_capacity(max_tracked_keys)
                .time_to_idle(window)
                .build(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check `key` and record the hit when it is allowed.
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        self.evaluate(key, Instant::now(), true).await
    }

    /// Check `key` without recording anything.
    pub async fn peek(&self, key: &str) -> RateLimitDecision {
        self.evaluate(key, Instant::now(), false).await
    }

    /// Record a hit regardless of the current count.
    pub async fn record(&self, key: &str) {
        let window = self.window_for(key).await;
        window.lock().await.push_back(Instant::now());
    }

    /// Forget every hit for `key`.
    pub async fn reset(&self, key: &str) {
        self.hits.invalidate(key).await;
    }

    async fn window_for(&self, key: &str) -> Window {
        self.hits
            .get_with(key.to_string(), async { Arc::new(Mutex::new(VecDeque::new())) })
            .await
    }

    async fn evaluate(&self, key: &str, now: Instant, record: bool) -> RateLimitDecision {
        let window = self.window_for(key).await;
        let mut hits = window.lock().await;

        while let Some(oldest) = hits.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() >= self.max_requests {
            let wait = match hits.front() {
                Some(oldest) => self.window.saturating_sub(now.saturating_duration_since(*oldest)),
                None => self.window,
            };
            tracing::debug!(limiter = self.name, key, "rate limited");
            return RateLimitDecision::Limited {
                retry_after: ceil_secs(wait).max(1),
            };
        }

        if record {
            hits.push_back(now);
        }
        RateLimitDecision::Allowed {
            remaining: self.max_requests - hits.len(),
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

/// The limiters shared by the HTTP handlers
#[derive(Clone)]
pub struct RateLimiters {
    pub contact: RateLimiter,
    pub likes: RateLimiter,
    pub login_ip: RateLimiter,
    /// Counts failed attempts only
    pub login_user: RateLimiter,
}

impl RateLimiters {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        let cap = config.max_tracked_keys;
        Self {
            contact: RateLimiter::new("contact", config.contact, cap),
            likes: RateLimiter::new("likes", config.likes, cap),
            login_ip: RateLimiter::new("login_ip", config.login_ip, cap),
            login_user: RateLimiter::new("login_user", config.login_user, cap),
        }
    }
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limiter(max: usize, secs: u64) -> RateLimiter {
        RateLimiter::new("test", WindowConfig::new(max, secs), 100)
    }

    #[tokio::test]
    async fn test_admits_max_then_limits() {
        let limiter = limiter(3, 60);
        for expected_remaining in [2, 1, 0] {
            assert_eq!(
                limiter.check("1.2.3.4").await,
                RateLimitDecision::Allowed { remaining: expected_remaining }
            );
        }
        match limiter.check("1.2.3.4").await {
            RateLimitDecision::Limited { retry_after } => assert!(retry_after > 0 && retry_after <= 60),
            other => panic!("expected limit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = limiter(2, 10);
        let start = Instant::now();

        assert!(limiter.evaluate("k", start, true).await.is_allowed());
        assert!(limiter.evaluate("k", start + Duration::from_secs(4), true).await.is_allowed());
        assert_eq!(
            limiter.evaluate("k", start + Duration::from_secs(5), true).await,
            RateLimitDecision::Limited { retry_after: 5 }
        );
        // First hit has left the window
        assert!(limiter.evaluate("k", start + Duration::from_secs(10), true).await.is_allowed());
    }

    #[tokio::test]
    async fn test_peek_does_not_record() {
        let limiter = limiter(1, 60);
        assert!(limiter.peek("user").await.is_allowed());
        assert!(limiter.peek("user").await.is_allowed());
        limiter.record("user").await;
        assert!(!limiter.peek("user").await.is_allowed());
    }

    #[tokio::test]
    async fn test_reset() {
        let limiter = limiter(1, 60);
        assert!(limiter.check("k").await.is_allowed());
        assert!(!limiter.check("k").await.is_allowed());
        limiter.reset("k").await;
        assert!(limiter.check("k").await.is_allowed());
    }

    #[tokio::test]
    async fn test_zero_budget_always_limits() {
        let limiter = limiter(0, 30);
        assert_eq!(limiter.check("k").await, RateLimitDecision::Limited { retry_after: 30 });
    }

    #[test]
    fn test_default_limiters() {
        let limiters = RateLimiters::default();
        assert_eq!(limiters.contact.max_requests, 5);
        assert_eq!(limiters.contact.window, Duration::from_secs(3600));
        assert_eq!(limiters.login_user.window, Duration::from_secs(900));
        assert_eq!(limiters.likes.name(), "likes");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Each key gets exactly `max` hits per window, independent of other keys
        #[test]
        fn keys_are_independent(max in 1usize..8, keys in 1usize..5, window in 1u64..3600) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            rt.block_on(async {
                let limiter = limiter(max, window);
                let now = Instant::now();
                for k in 0..keys {
                    let key = format!("10.0.0.{}", k);
                    for _ in 0..max {
                        prop_assert!(limiter.evaluate(&key, now, true).await.is_allowed());
                    }
                    match limiter.evaluate(&key, now, true).await {
                        RateLimitDecision::Limited { retry_after } => {
                            prop_assert!(retry_after > 0);
                            prop_assert!(retry_after <= window);
                        }
                        other => prop_assert!(false, "expected limit, got {:?}", other),
                    }
                }
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
