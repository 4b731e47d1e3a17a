//! Outbound request preparation
//!
//! Base URL resolution, request enrichment and the transport port.

pub mod base_url;
pub mod enricher;
pub mod ports;

pub use base_url::BaseUrlResolver;
pub use enricher::{RequestEnricher, REQUEST_TIMEOUT};
pub use ports::{Environment, HttpTransport, ProcessEnvironment, StaticEnvironment};
