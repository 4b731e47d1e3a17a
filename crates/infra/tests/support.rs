#![allow(dead_code)]

use std::sync::{Arc, Once};

use feedstream_core::request::StaticEnvironment;
use feedstream_domain::{ClientConfig, ServiceName};
use feedstream_infra::StreamClient;
use tracing_subscriber::EnvFilter;

pub const API_KEY: &str = "key";
pub const API_SECRET: &str = "secret";

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Server-mode client whose API root points at `uri`.
pub fn server_client(uri: &str) -> StreamClient {
    client(ClientConfig::server(API_KEY, API_SECRET), uri)
}

/// Client built from `config`, with every service pointed at `uri` and no
/// process environment overrides.
pub fn client(config: ClientConfig, uri: &str) -> StreamClient {
    init_tracing();
    let config = config
        .url_override(ServiceName::Api, uri)
        .url_override(ServiceName::Analytics, format!("{uri}/analytics"));
    StreamClient::builder(config)
        .environment(Arc::new(StaticEnvironment::new()))
        .build()
        .expect("test client should build")
}
