//! # Feedstream Domain
//!
//! Data model and error taxonomy for the feed API client.
//!
//! This crate contains:
//! - Client configuration and credentials
//! - Request/response descriptors exchanged between enricher, dispatcher and
//!   transport
//! - Token claims, changesets and realtime message shapes
//! - The `FeedError` taxonomy and `Result` alias
//!
//! ## Architecture
//! - No dependencies on other feedstream crates
//! - No I/O; pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
