//! Request and response descriptors
//!
//! A [`RequestDescriptor`] is what resource wrappers build. The enricher turns
//! it into an [`EnrichedRequest`], the transport answers with a
//! [`RawResponse`].

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{FeedError, Result};
use crate::impl_wire_name_conversions;

/// HTTP verbs used by the feed API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical backend a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceName {
    #[default]
    Api,
    Analytics,
    Personalization,
    Collections,
}

impl_wire_name_conversions!(ServiceName {
    Api => "api",
    Analytics => "analytics",
    Personalization => "personalization",
    Collections => "collections",
});

impl ServiceName {
    /// Environment variable that overrides this service's base URL.
    pub fn env_override_key(&self) -> String {
        match self {
            Self::Api => crate::constants::ENV_BASE_URL.to_string(),
            other => format!("STREAM_{}_URL", other.to_string().to_uppercase()),
        }
    }
}

/// Outbound request as built by a resource wrapper
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// Path relative to the versioned service root, e.g. `activity/`
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Credential for this call; falls back to the client's ambient one
    pub signature: Option<String>,
    pub service: ServiceName,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
            signature: None,
            service: ServiceName::Api,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `data` as the request body.
    ///
    /// # Errors
    /// Returns `FeedError::Validation` if `data` cannot be represented as JSON.
    pub fn json<T: Serialize>(mut self, data: &T) -> Result<Self> {
        let value = serde_json::to_value(data)
            .map_err(|e| FeedError::Validation(format!("body is not serializable: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn service(mut self, service: ServiceName) -> Self {
        self.service = service;
        self
    }
}

/// Fully addressed and authenticated request, ready for the transport
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Duration,
    /// Attach ambient cookies; only meaningful in a browser runtime
    pub with_credentials: bool,
}

impl EnrichedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Last value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.iter().rev().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }
}

/// Response as reported by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Decoded JSON body; non-JSON payloads are kept as a string value
    pub body: Value,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, headers: BTreeMap::new(), body }
    }

    /// Success means the status code's first digit is `2`.
    pub fn is_success(&self) -> bool {
        self.status.to_string().starts_with('2')
    }
}
