//! Realtime transport over Bayeux long-polling
//!
//! Performs the handshake once, then posts each message with the client id
//! it was given.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use feedstream_core::realtime::RealtimeTransport;
use feedstream_domain::{FeedError, RealtimeMessage, Result};
use reqwest::Client as ReqwestClient;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::errors::InfraError;

const META_HANDSHAKE: &str = "/meta/handshake";
const BAYEUX_VERSION: &str = "1.0";

/// Bayeux long-polling transport
#[derive(Debug)]
pub struct BayeuxTransport {
    client: ReqwestClient,
    endpoint: String,
    timeout: Duration,
    client_id: OnceCell<String>,
    next_id: AtomicU64,
}

impl BayeuxTransport {
    /// # Errors
    /// Returns `FeedError::Configuration` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(|err| FeedError::from(InfraError::from(err)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
            client_id: OnceCell::new(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Client id assigned by the server, once the handshake has happened.
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.get().map(String::as_str)
    }

    async fn handshake(&self) -> Result<String> {
        let request = json!({
            "channel": META_HANDSHAKE,
            "version": BAYEUX_VERSION,
            "supportedConnectionTypes": ["long-polling"],
            "id": self.message_id(),
        });

        let reply = self.post(request).await?;
        let client_id = reply
            .get("clientId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                FeedError::transport("handshake reply has no clientId", Some(reply.clone()))
            })?;

        info!(endpoint = %self.endpoint, "realtime handshake completed");
        Ok(client_id)
    }

    /// Post one message and return the first reply, failing on
    /// `successful: false`.
    async fn post(&self, message: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&[message])
            .send()
            .await
            .map_err(|err| FeedError::from(InfraError::from(err)))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|err| FeedError::from(InfraError::from(err)))?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !status.to_string().starts_with('2') {
            return Err(FeedError::api_failure(status, body));
        }

        let reply = body.as_array().and_then(|replies| replies.first()).cloned().unwrap_or(body);
        if reply.get("successful").and_then(Value::as_bool) == Some(false) {
            let reason =
                reply.get("error").and_then(Value::as_str).unwrap_or("rejected").to_string();
            return Err(FeedError::transport(format!("realtime server: {reason}"), Some(reply)));
        }

        Ok(reply)
    }

    fn message_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

#[async_trait]
impl RealtimeTransport for BayeuxTransport {
    async fn send(&self, mut message: RealtimeMessage) -> Result<Option<RealtimeMessage>> {
        let client_id = self.client_id.get_or_try_init(|| self.handshake()).await?;
        message.client_id = Some(client_id.clone());
        if message.id.is_none() {
            message.id = Some(self.message_id());
        }

        let payload = serde_json::to_value(&message).map_err(|e| {
            FeedError::Validation(format!("realtime message is not serializable: {e}"))
        })?;

        debug!(channel = %message.channel, "posting realtime message");
        let reply = self.post(payload).await?;
        Ok(serde_json::from_value(reply).ok())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn mount_handshake(server: &MockServer) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!([{"channel": "/meta/handshake"}])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "channel": "/meta/handshake",
                "successful": true,
                "clientId": "client-1"
            }])))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn handshakes_once_then_sends_with_client_id() {
        let server = MockServer::start().await;
        mount_handshake(&server).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!([{"channel": "/meta/subscribe", "clientId": "client-1"}])))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"channel": "/meta/subscribe", "successful": true}])),
            )
            .expect(2)
            .mount(&server)
            .await;

        let transport = BayeuxTransport::new(server.uri(), Duration::from_secs(5)).unwrap();
        transport.send(RealtimeMessage::subscribe("/a")).await.unwrap();
        let reply = transport.send(RealtimeMessage::subscribe("/b")).await.unwrap();

        assert_eq!(transport.client_id(), Some("client-1"));
        assert_eq!(reply.map(|r| r.channel).as_deref(), Some("/meta/subscribe"));
    }

    #[tokio::test]
    async fn unsuccessful_reply_is_an_error() {
        let server = MockServer::start().await;
        mount_handshake(&server).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!([{"channel": "/meta/subscribe"}])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "channel": "/meta/subscribe",
                "successful": false,
                "error": "403::Forbidden"
            }])))
            .mount(&server)
            .await;

        let transport = BayeuxTransport::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = transport.send(RealtimeMessage::subscribe("/a")).await.unwrap_err();

        assert!(matches!(err, FeedError::Transport { ref message, .. } if message.contains("403")));
    }
}
