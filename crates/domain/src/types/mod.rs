//! Domain types and models

pub mod changeset;
pub mod claims;
pub mod realtime;
pub mod request;

pub use changeset::Changeset;
pub use claims::{ScopeClaims, TokenScope, UserSession};
pub use realtime::{RealtimeMessage, Subscription, SubscriptionExt};
pub use request::{EnrichedRequest, HttpMethod, RawResponse, RequestDescriptor, ServiceName};
