//! # Feedstream Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The reqwest HTTP transport and the Bayeux realtime transport
//! - The dispatcher and the [`StreamClient`] facade
//! - Configuration loading from the environment and config files
//!
//! ## Architecture
//! - Implements traits defined in `feedstream-core`
//! - Depends on `feedstream-domain` and `feedstream-core`
//! - Contains all "impure" code (network and filesystem I/O)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::{BatchOperations, Dispatcher, Feed, RealtimeClient, StreamClient, StreamClientBuilder};
pub use errors::InfraError;
pub use http::{BayeuxTransport, HttpClient, HttpClientBuilder};
