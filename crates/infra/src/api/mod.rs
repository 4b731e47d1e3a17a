//! Feed API client
//!
//! [`StreamClient`] ties together token issuance, request enrichment and
//! dispatch. Feed handles, batch operations and the realtime client borrow
//! from it.

pub mod batch;
pub mod client;
pub mod dispatcher;
pub mod feed;
pub mod realtime;

pub use batch::BatchOperations;
pub use client::{StreamClient, StreamClientBuilder};
pub use dispatcher::{classify, Dispatcher};
pub use feed::Feed;
pub use realtime::RealtimeClient;
