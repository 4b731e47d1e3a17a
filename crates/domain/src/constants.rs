//! Protocol constants
//!
//! Centralized location for the fixed values of the feed API protocol.

// API addressing
pub const API_VERSION: &str = "v1.0";
pub const DEFAULT_API_BASE_URL: &str = "https://api.stream-io-api.com/api/";
pub const API_HOST_SUFFIX: &str = "stream-io-api.com";
pub const LOCAL_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PROTOCOL: &str = "https";
pub const DEFAULT_REALTIME_URL: &str = "https://faye-us-east.stream-io-api.com/faye";

// Environment overrides
pub const ENV_BASE_URL: &str = "STREAM_BASE_URL";
pub const ENV_LOCAL: &str = "LOCAL";

// Request enrichment
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_GROUP: &str = "unspecified";
pub const CLIENT_IMPLEMENTATION: &str = "stream-rust-client";

// Header and query names
pub const HEADER_AUTH_TYPE: &str = "stream-auth-type";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CLIENT: &str = "X-Stream-Client";
pub const QUERY_API_KEY: &str = "api_key";
pub const QUERY_LOCATION: &str = "location";

// Token scopes
pub const WILDCARD: &str = "*";
pub const ACTION_READ: &str = "read";
pub const RESOURCE_PERSONALIZATION: &str = "personalization";
pub const RESOURCE_COLLECTIONS: &str = "collections";
pub const RESOURCE_ANALYTICS: &str = "analytics";
pub const RESOURCE_ACTIVITIES: &str = "activities";
pub const RESOURCE_REDIRECT: &str = "redirect_and_track";
