//! Token issuance feeding request enrichment

use std::sync::Arc;

use feedstream_core::auth::{classify, decode_claims};
use feedstream_core::request::{RequestEnricher, StaticEnvironment, REQUEST_TIMEOUT};
use feedstream_core::{FeedId, SignatureKind, TokenIssuer};
use feedstream_domain::{ClientConfig, FeedError, RequestDescriptor, ServiceName};
use serde_json::json;

fn pipeline(config: &ClientConfig) -> (TokenIssuer, RequestEnricher) {
    (
        TokenIssuer::from_config(config),
        RequestEnricher::new(config, Arc::new(StaticEnvironment::new())),
    )
}

#[test]
fn feed_request_carries_scoped_token() {
    let config = ClientConfig::server("key", "secret").location("eu-west");
    let (issuer, enricher) = pipeline(&config);
    let feed = FeedId::new("user", "alice").unwrap();
    let token = issuer.read_only_token(feed.slug(), feed.user_id()).unwrap();

    let request = enricher
        .enrich(
            RequestDescriptor::get(feed.url_path())
                .query("limit", "5")
                .signature(feed.signature(&token)),
        )
        .unwrap();

    assert_eq!(request.url, "https://eu-west-api.stream-io-api.com/api/v1.0/feed/user/alice/");
    assert_eq!(request.header("Authorization"), Some(token.as_str()));
    assert_eq!(request.header("stream-auth-type"), Some("jwt"));
    assert_eq!(request.query_param("limit"), Some("5"));
    assert_eq!(request.query_param("api_key"), Some("key"));
    assert_eq!(request.timeout, REQUEST_TIMEOUT);
    assert!(!request.with_credentials);

    let claims = decode_claims(&token).unwrap();
    assert_eq!(claims.get("feed_id"), Some(&json!("useralice")));
    assert_eq!(claims.get("action"), Some(&json!("read")));
}

#[test]
fn privileged_tokens_route_to_their_services() {
    let config = ClientConfig::server("key", "secret");
    let (issuer, enricher) = pipeline(&config);

    let token = issuer.personalization_token().unwrap();
    let request = enricher
        .enrich(
            RequestDescriptor::get("follow_recommendations/")
                .service(ServiceName::Personalization)
                .signature(token),
        )
        .unwrap();

    assert!(request
        .url
        .starts_with("https://personalization.stream-io-api.com/personalization/v1.0/"));
    assert_eq!(classify(token), SignatureKind::Jwt);
    assert!(std::ptr::eq(token, issuer.personalization_token().unwrap()));
}

#[test]
fn simple_signatures_keep_their_full_value() {
    let config = ClientConfig::server("key", "secret");
    let (_, enricher) = pipeline(&config);

    let request =
        enricher.enrich(RequestDescriptor::get("feed/user/1/").signature("opaque")).unwrap();

    assert_eq!(request.header("stream-auth-type"), Some("simple"));
    assert_eq!(request.header("Authorization"), Some("opaque"));
}

#[test]
fn client_mode_issues_nothing_but_still_signs() {
    let config = ClientConfig::client("key", "h.p.s");
    let (issuer, enricher) = pipeline(&config);

    assert!(matches!(issuer.analytics_token(), Err(FeedError::Configuration(_))));
    assert!(matches!(issuer.read_write_token("user", "1"), Err(FeedError::Configuration(_))));

    let request = enricher.enrich(RequestDescriptor::get("feed/user/1/")).unwrap();
    assert_eq!(request.header("Authorization"), Some("h.p.s"));
}
