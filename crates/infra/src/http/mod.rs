//! HTTP transports

pub mod bayeux;
pub mod client;

pub use bayeux::BayeuxTransport;
pub use client::{HttpClient, HttpClientBuilder};
