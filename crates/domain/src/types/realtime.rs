//! Realtime pub/sub messages

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Meta channel used to open a subscription
pub const META_SUBSCRIBE: &str = "/meta/subscribe";
/// Meta channel used to close a subscription
pub const META_UNSUBSCRIBE: &str = "/meta/unsubscribe";

/// Message exchanged with the realtime endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeMessage {
    pub channel: String,
    /// Channel a meta message refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RealtimeMessage {
    pub fn subscribe(channel: impl Into<String>) -> Self {
        Self {
            channel: META_SUBSCRIBE.to_string(),
            subscription: Some(channel.into()),
            ..Self::default()
        }
    }

    pub fn unsubscribe(channel: impl Into<String>) -> Self {
        Self {
            channel: META_UNSUBSCRIBE.to_string(),
            subscription: Some(channel.into()),
            ..Self::default()
        }
    }

    pub fn publish(channel: impl Into<String>, data: Value) -> Self {
        Self { channel: channel.into(), data: Some(data), ..Self::default() }
    }
}

/// Registered channel with the credentials used to authorize it
#[derive(Clone, PartialEq, Eq)]
pub struct Subscription {
    pub channel: String,
    pub user_id: String,
    pub token: String,
}

impl Subscription {
    pub fn new(
        channel: impl Into<String>,
        user_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self { channel: channel.into(), user_id: user_id.into(), token: token.into() }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Extension payload attached to outgoing messages for registered channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionExt {
    pub user_id: String,
    pub api_key: String,
    pub signature: String,
}
