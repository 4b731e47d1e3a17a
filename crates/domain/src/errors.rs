//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::impl_wire_name_conversions;

/// Main error type for feed API operations
///
/// `Configuration`, `Validation` and `Schema` are raised before anything is
/// handed to the transport. `Transport` and `Api` only ever come back from a
/// dispatched request.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum FeedError {
    /// The operation needs a shared secret the client does not hold, or the
    /// secret would be exposed in an untrusted runtime.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed feed identifier, changeset or argument shape.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed target URL for link generation.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Network failure or timeout. `message` carries the low-level cause.
    #[error("Transport error: {message}")]
    Transport { message: String, body: Option<Value> },

    /// Non-2xx response from the API.
    #[error("API error: {message}")]
    Api { status: u16, body: Value, message: String },
}

/// Coarse classification of a [`FeedError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Schema,
    Transport,
    ApiFailure,
}

impl_wire_name_conversions!(ErrorKind {
    Configuration => "configuration",
    Validation => "validation",
    Schema => "schema",
    Transport => "transport",
    ApiFailure => "api_failure",
});

impl FeedError {
    /// Build an API failure from a status code and the decoded body.
    ///
    /// The message embeds the serialized body and the status code.
    pub fn api_failure(status: u16, body: Value) -> Self {
        let message = format!("{} with HTTP status code {}", body, status);
        Self::Api { status, body, message }
    }

    /// Build a transport failure wrapping a low-level cause.
    pub fn transport(cause: impl std::fmt::Display, body: Option<Value>) -> Self {
        Self::Transport { message: cause.to_string(), body }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Schema(_) => ErrorKind::Schema,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Api { .. } => ErrorKind::ApiFailure,
        }
    }

    /// Whether the request reached the transport before failing.
    ///
    /// `false` means the failure was raised locally and nothing was sent.
    pub fn was_dispatched(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Api { .. })
    }

    /// HTTP status code for API failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, if one was received.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Api { body, .. } => Some(body),
            Self::Transport { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

/// Result type alias for feed API operations
pub type Result<T> = std::result::Result<T, FeedError>;
