//! Port interfaces for the realtime channel

use async_trait::async_trait;
use feedstream_domain::{RealtimeMessage, Result};

/// Hook applied to every message crossing the realtime boundary
pub trait MessageExtension: Send + Sync {
    /// Rewrite a message before it leaves the process
    fn outgoing(&self, message: RealtimeMessage) -> RealtimeMessage;

    /// Rewrite a message as it arrives; pass-through by default
    fn incoming(&self, message: RealtimeMessage) -> RealtimeMessage {
        message
    }
}

/// Trait for delivering messages to the realtime endpoint
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Deliver an already-extended message, returning the server's reply
    /// when the transport receives one
    async fn send(&self, message: RealtimeMessage) -> Result<Option<RealtimeMessage>>;
}
