use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use feedstream_core::request::HttpTransport;
use feedstream_domain::{EnrichedRequest, FeedError, HttpMethod, RawResponse, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::errors::InfraError;

/// HTTP transport over reqwest.
///
/// Sends each request exactly once; the only cancellation is the request's
/// own timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    fn request(&self, request: &EnrichedRequest) -> RequestBuilder {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .query(&request.query)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn execute(&self, request: EnrichedRequest) -> Result<RawResponse> {
        let built =
            self.request(&request).build().map_err(|err| FeedError::from(InfraError::from(err)))?;

        let method = built.method().clone();
        let url = built.url().clone();
        debug!(%method, url = %url.path(), "sending HTTP request");

        match self.client.execute(built).await {
            Ok(response) => {
                let status = response.status();
                debug!(%method, url = %url.path(), %status, "received HTTP response");
                read_response(response).await
            }
            Err(err) => {
                debug!(%method, url = %url.path(), error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }
}

async fn read_response(response: Response) -> Result<RawResponse> {
    let status = response.status().as_u16();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let text = response.text().await.map_err(|err| FeedError::from(InfraError::from(err)))?;
    let body = decode_body(&text);

    Ok(RawResponse { status, headers, body })
}

/// JSON when possible, otherwise the raw text; empty bodies become `null`.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    connect_timeout: Duration,
    user_agent: Option<String>,
    use_system_proxy: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { connect_timeout: Duration::from_secs(10), user_agent: None, use_system_proxy: true }
    }
}

impl HttpClientBuilder {
    /// Budget for establishing a connection; the request timeout is per call.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Ignore `HTTP_PROXY` / `HTTPS_PROXY` and connect directly.
    pub fn no_proxy(mut self) -> Self {
        self.use_system_proxy = false;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().connect_timeout(self.connect_timeout);

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if !self.use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(|err| FeedError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}
