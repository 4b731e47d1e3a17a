//! Stream client
//!
//! Owns the immutable configuration together with the token issuer, the
//! request enricher and the dispatcher. Every resource wrapper goes through
//! [`StreamClient::send`].

use std::sync::Arc;

use feedstream_core::auth::decode_claims;
use feedstream_core::events::EventBus;
use feedstream_core::realtime::{RealtimeTransport, SubscriptionRegistry};
use feedstream_core::request::{
    Environment, HttpTransport, ProcessEnvironment, RequestEnricher, REQUEST_TIMEOUT,
};
use feedstream_core::{FeedId, TokenIssuer};
use feedstream_domain::constants::{API_VERSION, HEADER_AUTH_TYPE, QUERY_API_KEY};
use feedstream_domain::{
    ClientConfig, FeedError, RawResponse, RequestDescriptor, Result, ServiceName, UserSession,
};
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};
use url::Url;

use super::batch::BatchOperations;
use super::dispatcher::Dispatcher;
use super::feed::Feed;
use super::realtime::RealtimeClient;
use crate::http::{BayeuxTransport, HttpClient};

/// Client for the feed API
pub struct StreamClient {
    config: ClientConfig,
    issuer: TokenIssuer,
    enricher: RequestEnricher,
    dispatcher: Dispatcher,
    events: EventBus,
    realtime_transport: Option<Arc<dyn RealtimeTransport>>,
    realtime: OnceCell<RealtimeClient>,
}

impl StreamClient {
    /// Create a client with the default reqwest transport.
    ///
    /// # Errors
    /// Returns `FeedError::Configuration` if the configuration is invalid
    /// or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> StreamClientBuilder {
        StreamClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    /// Observer bus fired around every dispatched request.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn enricher(&self) -> &RequestEnricher {
        &self.enricher
    }

    pub fn base_url_for(&self, service: ServiceName) -> String {
        self.enricher.base_url_for(service)
    }

    pub fn personalization_token(&self) -> Result<&str> {
        self.issuer.personalization_token()
    }

    pub fn collections_token(&self) -> Result<&str> {
        self.issuer.collections_token()
    }

    pub fn analytics_token(&self) -> Result<&str> {
        self.issuer.analytics_token()
    }

    /// The user token in client mode, `None` in server mode.
    pub fn user_token(&self) -> Option<&str> {
        self.config.credential.user_token()
    }

    /// Enrich `descriptor` and dispatch it.
    ///
    /// # Errors
    /// Enrichment failures are returned before anything is sent. See
    /// [`Dispatcher::send`] for the rest.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<Value> {
        let request = self.enricher.enrich(descriptor)?;
        self.dispatcher.send(request).await
    }

    /// Like [`send`](Self::send), also reporting the outcome to `callback`.
    ///
    /// Enrichment failures are returned without invoking `callback`, since
    /// nothing was sent.
    pub async fn send_with_callback<F>(
        &self,
        descriptor: RequestDescriptor,
        callback: F,
    ) -> Result<Value>
    where
        F: FnOnce(std::result::Result<&Value, &FeedError>, Option<&RawResponse>) + Send,
    {
        let request = self.enricher.enrich(descriptor)?;
        self.dispatcher.send_with_callback(request, callback).await
    }

    /// Handle on the feed `slug:user_id`.
    ///
    /// # Errors
    /// - `FeedError::Validation` for a malformed slug or user id
    /// - `FeedError::Configuration` if a server-mode token cannot be signed
    pub fn feed(&self, slug: &str, user_id: &str) -> Result<Feed<'_>> {
        let id = FeedId::new(slug, user_id)?;
        let token = match self.user_token() {
            Some(token) => token.to_string(),
            None => self.issuer.read_write_token(id.slug(), id.user_id())?,
        };
        Ok(Feed::new(self, id, token))
    }

    /// Batch operations on activities.
    pub fn batch(&self) -> BatchOperations<'_> {
        BatchOperations::new(self)
    }

    /// Session for `user_id` without extra data.
    pub fn user_session(&self, user_id: &str) -> Result<UserSession> {
        self.user_session_with_data(user_id, Map::new())
    }

    /// Session for `user_id`.
    ///
    /// In server mode a session token is minted with `data` as extra claims.
    /// In client mode the configured user token is reused after checking
    /// that its `user_id` claim matches.
    ///
    /// # Errors
    /// Returns `FeedError::Validation` if the user token belongs to someone
    /// else or cannot be decoded.
    #[instrument(skip(self, data))]
    pub fn user_session_with_data(
        &self,
        user_id: &str,
        data: Map<String, Value>,
    ) -> Result<UserSession> {
        let token = match self.user_token() {
            Some(token) => {
                let claims = decode_claims(token)?;
                let claimed = claims.get("user_id").and_then(Value::as_str);
                if claimed != Some(user_id) {
                    return Err(FeedError::Validation(format!(
                        "user token was issued for {}, not {user_id}",
                        claimed.unwrap_or("an unknown user")
                    )));
                }
                token.to_string()
            }
            None => self.issuer.user_session_token(user_id, data.clone())?,
        };

        debug!(user_id, "user session ready");
        Ok(UserSession::new(user_id, token).with_data(data))
    }

    /// Realtime client, created on first use.
    ///
    /// # Errors
    /// Returns `FeedError::Configuration` if the default transport cannot
    /// be built.
    pub fn realtime(&self) -> Result<&RealtimeClient> {
        self.realtime.get_or_try_init(|| {
            let transport: Arc<dyn RealtimeTransport> = match &self.realtime_transport {
                Some(transport) => Arc::clone(transport),
                None => {
                    Arc::new(BayeuxTransport::new(&self.config.realtime_url, REQUEST_TIMEOUT)?)
                }
            };
            info!(endpoint = %self.config.realtime_url, "realtime client created");
            Ok(RealtimeClient::new(transport, &self.config.api_key, SubscriptionRegistry::new()))
        })
    }

    /// Tracked redirect link that records `events` before forwarding the
    /// user to `target`.
    ///
    /// # Errors
    /// - `FeedError::Schema` if `target` is not an absolute URL with a host
    /// - `FeedError::Configuration` if no secret is configured
    #[instrument(skip(self, events))]
    pub fn create_redirect_url(
        &self,
        target: &str,
        user_id: &str,
        events: &[Value],
    ) -> Result<String> {
        let parsed = Url::parse(target)
            .map_err(|e| FeedError::Schema(format!("invalid redirect target {target}: {e}")))?;
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(FeedError::Schema(format!("redirect target {target} has no host")));
        }

        let token = self.issuer.redirect_token(user_id)?;
        let events = serde_json::to_string(events)
            .map_err(|e| FeedError::Validation(format!("events are not serializable: {e}")))?;

        let endpoint = format!(
            "{}{API_VERSION}/redirect/",
            self.enricher.base_url_for(ServiceName::Analytics)
        );
        let url = Url::parse_with_params(
            &endpoint,
            [
                (QUERY_API_KEY, self.config.api_key.as_str()),
                ("url", target),
                ("auth_type", "jwt"),
                ("authorization", token.as_str()),
                (HEADER_AUTH_TYPE, "jwt"),
                ("events", events.as_str()),
            ],
        )
        .map_err(|e| FeedError::Configuration(format!("invalid analytics url {endpoint}: {e}")))?;

        Ok(url.to_string())
    }
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("api_key", &self.config.api_key)
            .field("credential", &self.config.credential)
            .field("enricher", &self.enricher)
            .finish_non_exhaustive()
    }
}

/// Builder for [`StreamClient`] with replaceable ports
pub struct StreamClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    environment: Option<Arc<dyn Environment>>,
    realtime_transport: Option<Arc<dyn RealtimeTransport>>,
    events: EventBus,
}

impl StreamClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            environment: None,
            realtime_transport: None,
            events: EventBus::new(),
        }
    }

    /// Use `transport` instead of the default reqwest client.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Read environment overrides from `environment` instead of the process.
    pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn realtime_transport(mut self, transport: Arc<dyn RealtimeTransport>) -> Self {
        self.realtime_transport = Some(transport);
        self
    }

    pub fn events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// # Errors
    /// Returns `FeedError::Configuration` if the configuration is invalid
    /// or the default HTTP client cannot be built.
    pub fn build(self) -> Result<StreamClient> {
        self.config.validate()?;

        let environment = self.environment.unwrap_or_else(|| Arc::new(ProcessEnvironment));
        let enricher = RequestEnricher::new(&self.config, environment);

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                HttpClient::builder()
                    .connect_timeout(REQUEST_TIMEOUT)
                    .user_agent(enricher.client_identity())
                    .build()?,
            ),
        };
        let issuer = TokenIssuer::from_config(&self.config);
        let dispatcher = Dispatcher::new(transport, self.events.clone());

        info!(
            api_key = %self.config.api_key,
            server_side = self.config.credential.is_server_side(),
            runtime = %self.config.runtime,
            "stream client created"
        );

        Ok(StreamClient {
            config: self.config,
            issuer,
            enricher,
            dispatcher,
            events: self.events,
            realtime_transport: self.realtime_transport,
            realtime: OnceCell::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use feedstream_core::request::StaticEnvironment;
    use feedstream_domain::{EnrichedRequest, RuntimeKind};
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<EnrichedRequest>>,
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn execute(&self, request: EnrichedRequest) -> Result<RawResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(RawResponse::new(200, json!({"ok": true})))
        }
    }

    fn client(config: ClientConfig) -> (StreamClient, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let client = StreamClient::builder(config)
            .transport(transport.clone())
            .environment(Arc::new(StaticEnvironment::new()))
            .build()
            .unwrap();
        (client, transport)
    }

    fn claims(token: &str, secret: &str) -> Value {
        let mut validation = Validation::default();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        decode::<Value>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .unwrap()
            .claims
    }

    fn user_token(user_id: &str) -> String {
        TokenIssuer::new(feedstream_domain::Credential::Secret("s".into()), false)
            .user_session_token(user_id, Map::new())
            .unwrap()
    }

    #[test]
    fn browser_secret_is_rejected() {
        let config = ClientConfig::server("key", "secret").runtime(RuntimeKind::Browser);
        let err = StreamClient::builder(config)
            .transport(Arc::new(RecordingTransport::default()))
            .build()
            .unwrap_err();
        assert!(matches!(err, FeedError::Configuration(_)));
    }

    #[tokio::test]
    async fn missing_signature_is_not_sent() {
        let (client, transport) = client(ClientConfig::server("key", "secret"));

        let err = client.send(RequestDescriptor::get("activities/")).await.unwrap_err();

        assert!(matches!(err, FeedError::Configuration(_)));
        assert!(!err.was_dispatched());
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn client_mode_signs_with_user_token() {
        let token = user_token("alice");
        let (client, transport) = client(ClientConfig::client("key", &token));

        client.send(RequestDescriptor::get("feed/user/alice/")).await.unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].header("Authorization"), Some(token.as_str()));
        assert_eq!(requests[0].header("stream-auth-type"), Some("jwt"));
    }

    #[test]
    fn server_feed_uses_read_write_token() {
        let (client, _) = client(ClientConfig::server("key", "secret"));

        let feed = client.feed("user", "1").unwrap();

        assert_eq!(
            claims(feed.token(), "secret"),
            json!({"resource": "*", "action": "*", "feed_id": "user1"})
        );
        assert_eq!(feed.signature(), format!("user1 {}", feed.token()));
    }

    #[test]
    fn malformed_feed_ids_are_rejected() {
        let (client, _) = client(ClientConfig::server("key", "secret"));
        assert!(matches!(client.feed("user:x", "1"), Err(FeedError::Validation(_))));
        assert!(matches!(client.feed("user", "a b"), Err(FeedError::Validation(_))));
    }

    #[test]
    fn server_session_mints_token_with_data() {
        let (client, _) = client(ClientConfig::server("key", "secret"));
        let mut data = Map::new();
        data.insert("name".into(), json!("Alice"));

        let session = client.user_session_with_data("alice", data).unwrap();

        assert_eq!(session.user_id, "alice");
        assert_eq!(claims(&session.token, "secret"), json!({"name": "Alice", "user_id": "alice"}));
    }

    #[test]
    fn client_session_checks_token_owner() {
        let (client, _) = client(ClientConfig::client("key", user_token("alice")));

        assert!(client.user_session("alice").is_ok());
        assert!(matches!(client.user_session("bob"), Err(FeedError::Validation(_))));
    }

    #[test]
    fn redirect_url_carries_tracking_parameters() {
        let (client, _) = client(ClientConfig::server("key", "secret"));

        let link = client
            .create_redirect_url("https://example.com/page", "alice", &[json!({"foreign_id": "a"})])
            .unwrap();
        let parsed = Url::parse(&link).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert!(link.starts_with("https://analytics.stream-io-api.com/analytics/v1.0/redirect/"));
        assert_eq!(params["api_key"], "key");
        assert_eq!(params["url"], "https://example.com/page");
        assert_eq!(params["auth_type"], "jwt");
        assert_eq!(params["stream-auth-type"], "jwt");
        assert_eq!(params["events"], r#"[{"foreign_id":"a"}]"#);
        assert_eq!(
            claims(&params["authorization"], "secret"),
            json!({"resource": "redirect_and_track", "action": "*", "user_id": "alice"})
        );
    }

    #[test]
    fn redirect_target_without_host_is_a_schema_error() {
        let (client, _) = client(ClientConfig::server("key", "secret"));
        for target in ["not a url", "mailto:someone@example.com"] {
            let err = client.create_redirect_url(target, "alice", &[]).unwrap_err();
            assert!(matches!(err, FeedError::Schema(_)), "{target}");
        }
    }

    #[test]
    fn realtime_client_is_created_once() {
        let (client, _) = client(ClientConfig::server("key", "secret"));
        let first = client.realtime().unwrap() as *const RealtimeClient;
        let second = client.realtime().unwrap() as *const RealtimeClient;
        assert_eq!(first, second);
    }
}
