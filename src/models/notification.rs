//! Push notification models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A browser push subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSubscription {
    pub id: i64,
    /// Push service URL, unique per browser
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Keys as sent by `PushSubscription.toJSON()`
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Subscribe body
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeInput {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// Payload delivered to every subscriber
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Outcome of a broadcast
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
    /// Subscriptions removed because the push service reported them gone
    pub removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_input_matches_browser_json() {
        let json = r#"{"endpoint":"https://push.example.com/abc","expirationTime":null,"keys":{"p256dh":"BNc","auth":"tBH"}}"#;
        let input: SubscribeInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.endpoint, "https://push.example.com/abc");
        assert_eq!(input.keys.auth, "tBH");
    }
}
