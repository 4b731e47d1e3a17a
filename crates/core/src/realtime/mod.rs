//! Realtime subscriptions
//!
//! Registry of subscribed channels and the extension that authorizes them.

pub mod authorizer;
pub mod ports;
pub mod registry;

pub use authorizer::SubscriptionAuthorizer;
pub use ports::{MessageExtension, RealtimeTransport};
pub use registry::SubscriptionRegistry;
