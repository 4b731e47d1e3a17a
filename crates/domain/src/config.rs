//! Client configuration

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_GROUP, DEFAULT_REALTIME_URL};
use crate::errors::{FeedError, Result};
use crate::impl_wire_name_conversions;
use crate::types::ServiceName;

/// Credential held by a client instance
///
/// Fixed at construction. A `Secret` lets the client mint scoped tokens; a
/// `UserToken` is a pre-issued credential forwarded as-is.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    Secret(String),
    UserToken(String),
}

impl Credential {
    pub fn secret(&self) -> Option<&str> {
        match self {
            Self::Secret(secret) => Some(secret),
            Self::UserToken(_) => None,
        }
    }

    pub fn user_token(&self) -> Option<&str> {
        match self {
            Self::UserToken(token) => Some(token),
            Self::Secret(_) => None,
        }
    }

    /// `true` when the client can mint tokens itself.
    pub fn is_server_side(&self) -> bool {
        matches!(self, Self::Secret(_))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secret(_) => write!(f, "Secret([REDACTED])"),
            Self::UserToken(_) => write!(f, "UserToken([REDACTED])"),
        }
    }
}

/// Kind of runtime the client is embedded in
///
/// `Browser` is the untrusted context: secrets are refused and ambient
/// credentials are never attached to requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeKind {
    Server,
    Browser,
}

impl_wire_name_conversions!(RuntimeKind {
    Server => "server",
    Browser => "browser",
});

impl Default for RuntimeKind {
    fn default() -> Self {
        if cfg!(target_arch = "wasm32") {
            Self::Browser
        } else {
            Self::Server
        }
    }
}

/// Client configuration
///
/// Immutable once handed to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,
    pub credential: Credential,
    #[serde(default)]
    pub app_id: Option<String>,
    /// Data-center prefix, e.g. `us-east`
    #[serde(default)]
    pub location: Option<String>,
    /// Opaque routing tag sent as the `location` query parameter
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub url_overrides: HashMap<ServiceName, String>,
    #[serde(default)]
    pub expire_tokens: bool,
    #[serde(default)]
    pub runtime: RuntimeKind,
    #[serde(default)]
    pub allow_secret_in_browser: bool,
    #[serde(default = "default_realtime_url")]
    pub realtime_url: String,
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

fn default_realtime_url() -> String {
    DEFAULT_REALTIME_URL.to_string()
}

impl ClientConfig {
    fn with_credential(api_key: impl Into<String>, credential: Credential) -> Self {
        Self {
            api_key: api_key.into(),
            credential,
            app_id: None,
            location: None,
            group: default_group(),
            protocol: None,
            local: false,
            url_overrides: HashMap::new(),
            expire_tokens: false,
            runtime: RuntimeKind::default(),
            allow_secret_in_browser: false,
            realtime_url: default_realtime_url(),
        }
    }

    /// Server-mode configuration holding the shared secret.
    pub fn server(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::with_credential(api_key, Credential::Secret(secret.into()))
    }

    /// Client-mode configuration holding a pre-issued user token.
    pub fn client(api_key: impl Into<String>, user_token: impl Into<String>) -> Self {
        Self::with_credential(api_key, Credential::UserToken(user_token.into()))
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Point every service at the local development endpoint.
    pub fn local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    pub fn url_override(mut self, service: ServiceName, url: impl Into<String>) -> Self {
        self.url_overrides.insert(service, url.into());
        self
    }

    /// Embed an issuance timestamp in minted tokens.
    pub fn expire_tokens(mut self, expire: bool) -> Self {
        self.expire_tokens = expire;
        self
    }

    pub fn runtime(mut self, runtime: RuntimeKind) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn allow_secret_in_browser(mut self, allow: bool) -> Self {
        self.allow_secret_in_browser = allow;
        self
    }

    pub fn realtime_url(mut self, url: impl Into<String>) -> Self {
        self.realtime_url = url.into();
        self
    }

    /// Check the configuration before a client is built from it.
    ///
    /// # Errors
    /// Returns `FeedError::Configuration` if the API key or credential is
    /// empty, or a secret is configured for a browser runtime without an
    /// explicit opt-in.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(FeedError::Configuration("missing api key".into()));
        }

        let empty = match &self.credential {
            Credential::Secret(value) | Credential::UserToken(value) => value.trim().is_empty(),
        };
        if empty {
            return Err(FeedError::Configuration("missing secret or user token".into()));
        }

        if self.credential.is_server_side()
            && self.runtime == RuntimeKind::Browser
            && !self.allow_secret_in_browser
        {
            return Err(FeedError::Configuration(
                "refusing to use an api secret in a browser runtime; \
                 use a user token or set allow_secret_in_browser"
                    .into(),
            ));
        }

        Ok(())
    }
}
