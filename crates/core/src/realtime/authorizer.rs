//! Credential injection for realtime subscriptions

use feedstream_domain::{RealtimeMessage, SubscriptionExt};
use serde_json::json;
use tracing::debug;

use crate::realtime::ports::MessageExtension;
use crate::realtime::registry::SubscriptionRegistry;

/// Attaches per-channel credentials to outgoing subscription messages
///
/// Reads the registry at send time; a message naming a channel that is not
/// registered leaves unchanged.
#[derive(Debug, Clone)]
pub struct SubscriptionAuthorizer {
    api_key: String,
    registry: SubscriptionRegistry,
}

impl SubscriptionAuthorizer {
    pub fn new(api_key: impl Into<String>, registry: SubscriptionRegistry) -> Self {
        Self { api_key: api_key.into(), registry }
    }

    /// Extension payload for `channel`, if it is registered.
    pub fn ext_for(&self, channel: &str) -> Option<SubscriptionExt> {
        self.registry.get(channel).map(|subscription| SubscriptionExt {
            user_id: subscription.user_id,
            api_key: self.api_key.clone(),
            signature: subscription.token,
        })
    }
}

impl MessageExtension for SubscriptionAuthorizer {
    fn outgoing(&self, mut message: RealtimeMessage) -> RealtimeMessage {
        let Some(ext) = message.subscription.as_deref().and_then(|channel| self.ext_for(channel))
        else {
            return message;
        };

        debug!(channel = ?message.subscription, user_id = %ext.user_id, "authorizing subscription");
        message.ext = Some(json!({
            "user_id": ext.user_id,
            "api_key": ext.api_key,
            "signature": ext.signature,
        }));
        message
    }
}
