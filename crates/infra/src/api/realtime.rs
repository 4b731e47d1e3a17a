//! Realtime client
//!
//! Runs outgoing messages through the extension pipeline before handing
//! them to a [`RealtimeTransport`].

use std::sync::Arc;

use feedstream_core::realtime::{
    MessageExtension, RealtimeTransport, SubscriptionAuthorizer, SubscriptionRegistry,
};
use feedstream_domain::{RealtimeMessage, Result, Subscription};
use tracing::{debug, info, instrument};

/// Pub/sub client bound to one stream client
pub struct RealtimeClient {
    transport: Arc<dyn RealtimeTransport>,
    extensions: Vec<Arc<dyn MessageExtension>>,
    registry: SubscriptionRegistry,
}

impl RealtimeClient {
    /// Build a client whose only extension is the subscription authorizer
    /// over `registry`.
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        api_key: impl Into<String>,
        registry: SubscriptionRegistry,
    ) -> Self {
        let authorizer = SubscriptionAuthorizer::new(api_key, registry.clone());
        Self { transport, extensions: vec![Arc::new(authorizer)], registry }
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Apply outgoing extensions in order and deliver the message.
    ///
    /// The server's reply, if any, comes back through [`receive`](Self::receive).
    #[instrument(skip(self, message), fields(channel = %message.channel))]
    pub async fn send(&self, message: RealtimeMessage) -> Result<Option<RealtimeMessage>> {
        let message = self.extensions.iter().fold(message, |msg, ext| ext.outgoing(msg));
        debug!(subscription = ?message.subscription, "sending realtime message");
        let reply = self.transport.send(message).await?;
        Ok(reply.map(|reply| self.receive(reply)))
    }

    /// Apply incoming extensions in order.
    pub fn receive(&self, message: RealtimeMessage) -> RealtimeMessage {
        self.extensions.iter().fold(message, |msg, ext| ext.incoming(msg))
    }

    /// Register `subscription` and announce it.
    ///
    /// The registration is rolled back if the announcement fails.
    pub async fn subscribe(&self, subscription: Subscription) -> Result<()> {
        let channel = subscription.channel.clone();
        self.registry.register(subscription);

        if let Err(err) = self.send(RealtimeMessage::subscribe(channel.as_str())).await {
            self.registry.remove(&channel);
            return Err(err);
        }

        info!(channel = %channel, "subscribed to realtime channel");
        Ok(())
    }

    /// Drop the registration for `channel` and announce it.
    pub async fn unsubscribe(&self, channel: &str) -> Result<()> {
        self.registry.remove(channel);
        self.send(RealtimeMessage::unsubscribe(channel)).await?;
        info!(channel = %channel, "unsubscribed from realtime channel");
        Ok(())
    }
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("extensions", &self.extensions.len())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
