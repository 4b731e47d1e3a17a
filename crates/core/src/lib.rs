//! # Feedstream Core
//!
//! Authentication and request orchestration logic - no network code.
//!
//! This crate contains:
//! - Scoped token issuance and signature classification
//! - Base URL resolution and request enrichment
//! - Changeset validation for batch partial updates
//! - Realtime subscription authorization
//! - The per-client event bus
//! - Port interfaces (traits) implemented by `feedstream-infra`
//!
//! ## Architecture Principles
//! - Only depends on `feedstream-domain`
//! - No HTTP or socket code
//! - All external dependencies via traits

pub mod auth;
pub mod batch;
pub mod events;
pub mod feed;
pub mod realtime;
pub mod request;

// Re-export specific items to avoid ambiguity
pub use auth::{SignatureKind, TokenIssuer};
pub use batch::validate_changes;
pub use events::{ClientEvent, ClientEventPayload, EventBus, HookError};
pub use feed::FeedId;
pub use realtime::{
    MessageExtension, RealtimeTransport, SubscriptionAuthorizer, SubscriptionRegistry,
};
pub use request::{
    BaseUrlResolver, Environment, HttpTransport, ProcessEnvironment, RequestEnricher,
    StaticEnvironment, REQUEST_TIMEOUT,
};
