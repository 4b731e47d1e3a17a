//! Base URL resolution per service
//!
//! Precedence, highest first:
//! 1. explicit per-service override in the client configuration
//! 2. environment override (`STREAM_BASE_URL`, `STREAM_<SERVICE>_URL`)
//! 3. local development flag (config `local` or env `LOCAL`)
//! 4. data-center location, combined with the protocol override
//! 5. hosted default

use std::collections::HashMap;
use std::sync::Arc;

use feedstream_domain::constants::{
    API_HOST_SUFFIX, DEFAULT_API_BASE_URL, DEFAULT_PROTOCOL, ENV_LOCAL, LOCAL_BASE_URL,
};
use feedstream_domain::{ClientConfig, ServiceName};

use crate::request::ports::Environment;

/// Resolves the root URL of each backend service
#[derive(Clone)]
pub struct BaseUrlResolver {
    overrides: HashMap<ServiceName, String>,
    location: Option<String>,
    protocol: Option<String>,
    local: bool,
    env: Arc<dyn Environment>,
}

impl BaseUrlResolver {
    pub fn new(config: &ClientConfig, env: Arc<dyn Environment>) -> Self {
        Self {
            overrides: config.url_overrides.clone(),
            location: config.location.clone(),
            protocol: config.protocol.clone(),
            local: config.local,
            env,
        }
    }

    /// Root URL for `service`, always ending in `/`.
    pub fn base_url_for(&self, service: ServiceName) -> String {
        if let Some(url) = self.overrides.get(&service) {
            return with_trailing_slash(url);
        }

        if let Some(url) = self.env.var(&service.env_override_key()).filter(|v| !v.is_empty()) {
            return with_trailing_slash(&url);
        }

        if self.local || self.env.var(ENV_LOCAL).is_some_and(|v| is_truthy(&v)) {
            return format!("{LOCAL_BASE_URL}/{service}/");
        }

        if let Some(location) = &self.location {
            let protocol = self.protocol.as_deref().unwrap_or(DEFAULT_PROTOCOL);
            return format!("{protocol}://{location}-{service}.{API_HOST_SUFFIX}/{service}/");
        }

        match service {
            ServiceName::Api => DEFAULT_API_BASE_URL.to_string(),
            other => format!("{DEFAULT_PROTOCOL}://{other}.{API_HOST_SUFFIX}/{other}/"),
        }
    }
}

impl std::fmt::Debug for BaseUrlResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseUrlResolver")
            .field("overrides", &self.overrides)
            .field("location", &self.location)
            .field("protocol", &self.protocol)
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "" | "0" | "false" | "no" | "off")
}
