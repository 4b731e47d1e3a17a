//! Port interfaces for request dispatch

use std::collections::HashMap;

use async_trait::async_trait;
use feedstream_domain::{EnrichedRequest, RawResponse, Result};

/// Trait for executing an enriched request against the network
///
/// Implementations return `Ok` for every response that arrived, whatever its
/// status, and `FeedError::Transport` when no response arrived at all.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request once and report the raw response
    async fn execute(&self, request: EnrichedRequest) -> Result<RawResponse>;
}

/// Trait for reading environment overrides
pub trait Environment: Send + Sync {
    /// Value of the variable `key`, if set
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed set of variables, for tests and embedded runtimes without a process
/// environment
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    vars: HashMap<String, String>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl Environment for StaticEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}
