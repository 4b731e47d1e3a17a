//! Token claims and user sessions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::WILDCARD;

/// Scope narrowing what a token authorizes
///
/// `None` leaves the attribute out of the token entirely. `Some("*")`
/// authorizes every item of that kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenScope {
    pub feed_id: Option<String>,
    pub user_id: Option<String>,
}

impl TokenScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(mut self, feed_id: impl Into<String>) -> Self {
        self.feed_id = Some(feed_id.into());
        self
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Every feed and every user.
    pub fn everything() -> Self {
        Self::new().feed(WILDCARD).user(WILDCARD)
    }
}

/// Claims carried by a scoped access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeClaims {
    pub resource: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Issued-at, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

impl ScopeClaims {
    pub fn new(resource: impl Into<String>, action: impl Into<String>, scope: TokenScope) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            feed_id: scope.feed_id,
            user_id: scope.user_id,
            iat: None,
        }
    }

    pub fn scope(&self) -> TokenScope {
        TokenScope { feed_id: self.feed_id.clone(), user_id: self.user_id.clone() }
    }
}

/// Session state for one end user
///
/// Returned by the client and held by the caller; the client itself keeps
/// no notion of a current user.
#[derive(Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: String,
    pub token: String,
    /// Extra claims embedded in a server-minted token
    pub data: Map<String, Value>,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), token: token.into(), data: Map::new() }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }
}

impl std::fmt::Debug for UserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSession")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_scope_attributes_are_not_serialized() {
        let claims = ScopeClaims::new("analytics", "*", TokenScope::new().user("*"));
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value, json!({"resource": "analytics", "action": "*", "user_id": "*"}));
    }

    #[test]
    fn everything_scope_uses_wildcards() {
        let claims = ScopeClaims::new("personalization", "*", TokenScope::everything());
        assert_eq!(claims.feed_id.as_deref(), Some("*"));
        assert_eq!(claims.user_id.as_deref(), Some("*"));
        assert_eq!(claims.scope(), TokenScope::everything());
    }

    #[test]
    fn session_debug_hides_token() {
        let session = UserSession::new("alice", "secret.token.value");
        let debug = format!("{:?}", session);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("secret.token.value"));
    }
}
