//! Request enrichment
//!
//! Turns a relative [`RequestDescriptor`] into an absolute, authenticated
//! [`EnrichedRequest`]. Pure: nothing here touches the network.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use feedstream_domain::constants::{
    API_VERSION, CLIENT_IMPLEMENTATION, HEADER_AUTHORIZATION, HEADER_AUTH_TYPE, HEADER_CLIENT,
    QUERY_API_KEY, QUERY_LOCATION, REQUEST_TIMEOUT_SECS,
};
use feedstream_domain::{
    ClientConfig, EnrichedRequest, FeedError, RequestDescriptor, Result, RuntimeKind, ServiceName,
};
use tracing::debug;
use url::Url;

use crate::auth::signature::{auth_header_value, classify};
use crate::request::base_url::BaseUrlResolver;
use crate::request::ports::Environment;

/// Fixed wall-clock budget for every dispatched request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(REQUEST_TIMEOUT_SECS);

/// Adds addressing, query parameters and auth headers to outgoing requests
#[derive(Clone)]
pub struct RequestEnricher {
    api_key: String,
    group: String,
    runtime: RuntimeKind,
    /// Signature used when a descriptor carries none; only set in client mode
    ambient_signature: Option<String>,
    resolver: BaseUrlResolver,
}

impl RequestEnricher {
    pub fn new(config: &ClientConfig, env: Arc<dyn Environment>) -> Self {
        Self {
            api_key: config.api_key.clone(),
            group: config.group.clone(),
            runtime: config.runtime,
            ambient_signature: config.credential.user_token().map(str::to_string),
            resolver: BaseUrlResolver::new(config, env),
        }
    }

    pub fn base_url_for(&self, service: ServiceName) -> String {
        self.resolver.base_url_for(service)
    }

    /// Versioned root for `service`, e.g. `https://api.stream-io-api.com/api/v1.0/`.
    pub fn versioned_root(&self, service: ServiceName) -> String {
        format!("{}{API_VERSION}/", self.base_url_for(service))
    }

    /// Identity string sent in `X-Stream-Client`.
    pub fn client_identity(&self) -> String {
        format!("{CLIENT_IMPLEMENTATION}-{}-{}", self.runtime, env!("CARGO_PKG_VERSION"))
    }

    /// Build the final request.
    ///
    /// # Errors
    /// - `FeedError::Configuration` when no signature resolves
    /// - `FeedError::Configuration` when the service root is malformed
    /// - `FeedError::Validation` when the relative URL leaves the service root
    pub fn enrich(&self, descriptor: RequestDescriptor) -> Result<EnrichedRequest> {
        let RequestDescriptor { method, url, query, body, signature, service } = descriptor;

        let absolute = resolve_under(&self.versioned_root(service), &url)?;

        let mut merged: Vec<(String, String)> = query
            .into_iter()
            .filter(|(key, _)| key != QUERY_API_KEY && key != QUERY_LOCATION)
            .collect();
        merged.push((QUERY_API_KEY.to_string(), self.api_key.clone()));
        merged.push((QUERY_LOCATION.to_string(), self.group.clone()));

        let signature = signature.or_else(|| self.ambient_signature.clone()).ok_or_else(|| {
            FeedError::Configuration(
                "request has no signature; server-side calls need a scoped token".into(),
            )
        })?;
        let kind = classify(&signature);

        let mut headers = BTreeMap::new();
        headers.insert(HEADER_AUTH_TYPE.to_string(), kind.to_string());
        headers.insert(
            HEADER_AUTHORIZATION.to_string(),
            auth_header_value(&signature, kind).to_string(),
        );
        headers.insert(HEADER_CLIENT.to_string(), self.client_identity());

        debug!(%method, url = %absolute, %service, auth_type = %kind, "enriched request");

        Ok(EnrichedRequest {
            method,
            url: absolute.to_string(),
            query: merged,
            headers,
            body,
            timeout: REQUEST_TIMEOUT,
            with_credentials: false,
        })
    }
}

/// Append `relative` to `root`, refusing anything that resolves outside it.
fn resolve_under(root: &str, relative: &str) -> Result<Url> {
    let base = Url::parse(root)
        .map_err(|e| FeedError::Configuration(format!("invalid service root {root}: {e}")))?;

    let joined = Url::parse(&format!("{base}{}", relative.trim_start_matches('/')))
        .map_err(|e| FeedError::Validation(format!("invalid request url {relative}: {e}")))?;
    if !joined.as_str().starts_with(base.as_str()) {
        return Err(FeedError::Validation(format!(
            "request url {relative} resolves outside {base}"
        )));
    }

    Ok(joined)
}

impl std::fmt::Debug for RequestEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEnricher")
            .field("api_key", &self.api_key)
            .field("group", &self.group)
            .field("runtime", &self.runtime)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use feedstream_domain::HttpMethod;
    use serde_json::json;

    use super::*;
    use crate::request::ports::StaticEnvironment;

    const JWT: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJ1c2VyX2lkIjoiYWxpY2UifQ.c2ln";

    fn enricher(config: &ClientConfig) -> RequestEnricher {
        RequestEnricher::new(config, Arc::new(StaticEnvironment::new()))
    }

    #[test]
    fn builds_absolute_versioned_url() {
        let request = enricher(&ClientConfig::server("key", "secret"))
            .enrich(RequestDescriptor::get("feed/user/1/").signature(JWT))
            .unwrap();

        assert_eq!(request.url, "https://api.stream-io-api.com/api/v1.0/feed/user/1/");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.timeout, Duration::from_secs(10));
        assert!(!request.with_credentials);
    }

    #[test]
    fn relative_urls_stay_under_the_versioned_root() {
        let enricher = enricher(&ClientConfig::server("key", "secret"));
        let root = "https://api.stream-io-api.com/api/v1.0/";

        for relative in ["https://evil.example/steal", "user:1/"] {
            let request =
                enricher.enrich(RequestDescriptor::get(relative).signature(JWT)).unwrap();
            assert!(request.url.starts_with(root), "{relative} -> {}", request.url);
            assert_eq!(
                Url::parse(&request.url).unwrap().host_str(),
                Some("api.stream-io-api.com")
            );
        }
    }

    #[test]
    fn parent_segments_cannot_leave_the_root() {
        let enricher = enricher(&ClientConfig::server("key", "secret"));

        for relative in ["../../admin/", "feed/%2e%2e/%2e%2e/%2e%2e/admin/"] {
            let err = enricher.enrich(RequestDescriptor::get(relative).signature(JWT)).unwrap_err();
            assert!(matches!(err, FeedError::Validation(_)), "{relative}");
            assert!(!err.was_dispatched());
        }
    }

    #[test]
    fn reserved_query_params_are_set_last() {
        let config = ClientConfig::server("key", "secret").group("eu-cluster");
        let request = enricher(&config)
            .enrich(
                RequestDescriptor::get("activities/")
                    .query("ids", "a,b")
                    .query("api_key", "spoofed")
                    .signature(JWT),
            )
            .unwrap();

        assert_eq!(
            request.query,
            vec![
                ("ids".to_string(), "a,b".to_string()),
                ("api_key".to_string(), "key".to_string()),
                ("location".to_string(), "eu-cluster".to_string()),
            ]
        );
    }

    #[test]
    fn default_group_is_unspecified() {
        let request = enricher(&ClientConfig::server("key", "secret"))
            .enrich(RequestDescriptor::get("activities/").signature(JWT))
            .unwrap();
        assert_eq!(request.query_param("location"), Some("unspecified"));
    }

    #[test]
    fn jwt_signature_sends_trailing_segment() {
        let request = enricher(&ClientConfig::server("key", "secret"))
            .enrich(RequestDescriptor::post("activity/").signature(format!("user1 {JWT}")))
            .unwrap();

        assert_eq!(request.header("stream-auth-type"), Some("jwt"));
        assert_eq!(request.header("Authorization"), Some(JWT));
    }

    #[test]
    fn simple_signature_is_forwarded_whole() {
        let request = enricher(&ClientConfig::server("key", "secret"))
            .enrich(RequestDescriptor::get("activities/").signature("user1 opaque"))
            .unwrap();

        assert_eq!(request.header("stream-auth-type"), Some("simple"));
        assert_eq!(request.header("Authorization"), Some("user1 opaque"));
    }

    #[test]
    fn client_mode_uses_user_token() {
        let request = enricher(&ClientConfig::client("key", JWT))
            .enrich(RequestDescriptor::get("activities/"))
            .unwrap();
        assert_eq!(request.header("Authorization"), Some(JWT));
    }

    #[test]
    fn server_mode_without_signature_fails_before_dispatch() {
        let err = enricher(&ClientConfig::server("key", "secret"))
            .enrich(RequestDescriptor::get("activities/"))
            .unwrap_err();
        assert!(matches!(err, FeedError::Configuration(_)));
        assert!(!err.was_dispatched());
    }

    #[test]
    fn identity_header_names_runtime_and_version() {
        let config = ClientConfig::client("key", JWT).runtime(RuntimeKind::Browser);
        let request = enricher(&config).enrich(RequestDescriptor::get("x/")).unwrap();

        assert_eq!(
            request.header("X-Stream-Client"),
            Some(format!("stream-rust-client-browser-{}", env!("CARGO_PKG_VERSION")).as_str())
        );
    }

    #[test]
    fn service_selects_base_url_and_body_is_kept() {
        let request = enricher(&ClientConfig::server("key", "secret"))
            .enrich(
                RequestDescriptor::post("/impression/")
                    .service(ServiceName::Analytics)
                    .body(json!({"content_list": []}))
                    .signature(JWT),
            )
            .unwrap();

        assert_eq!(request.url, "https://analytics.stream-io-api.com/analytics/v1.0/impression/");
        assert_eq!(request.body, Some(json!({"content_list": []})));
    }
}
