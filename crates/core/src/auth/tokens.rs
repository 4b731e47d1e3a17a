//! Scoped token issuance
//!
//! Tokens are HS256 JWTs signed with the client's shared secret. A client
//! built from a pre-issued user token cannot mint anything and every call
//! here fails with `FeedError::Configuration`.

use std::time::{SystemTime, UNIX_EPOCH};

use feedstream_domain::constants::{
    ACTION_READ, RESOURCE_ACTIVITIES, RESOURCE_ANALYTICS, RESOURCE_COLLECTIONS,
    RESOURCE_PERSONALIZATION, RESOURCE_REDIRECT, WILDCARD,
};
use feedstream_domain::{ClientConfig, Credential, FeedError, Result, ScopeClaims, TokenScope};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Mints scoped access tokens from the shared secret
///
/// Privileged wildcard tokens are computed once and reused for the lifetime
/// of the issuer. Feed-scoped tokens are minted on every call.
pub struct TokenIssuer {
    credential: Credential,
    expire_tokens: bool,
    personalization: OnceCell<String>,
    collections: OnceCell<String>,
    analytics: OnceCell<String>,
}

impl TokenIssuer {
    pub fn new(credential: Credential, expire_tokens: bool) -> Self {
        Self {
            credential,
            expire_tokens,
            personalization: OnceCell::new(),
            collections: OnceCell::new(),
            analytics: OnceCell::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.credential.clone(), config.expire_tokens)
    }

    /// `true` when the issuer holds a secret and can mint tokens.
    pub fn can_issue(&self) -> bool {
        self.credential.is_server_side()
    }

    /// Mint a token for `action` on `resource`, narrowed by `scope`.
    ///
    /// # Errors
    /// Returns `FeedError::Configuration` if no secret is configured.
    pub fn issue(&self, resource: &str, action: &str, scope: TokenScope) -> Result<String> {
        let mut claims = ScopeClaims::new(resource, action, scope);
        if self.expire_tokens {
            claims.iat = Some(issued_at());
        }
        debug!(resource, action, "issuing scoped token");
        self.sign(&claims)
    }

    /// Wildcard token for the personalization service.
    pub fn personalization_token(&self) -> Result<&str> {
        self.memoized(&self.personalization, RESOURCE_PERSONALIZATION, TokenScope::everything())
    }

    /// Wildcard token for the collections service.
    pub fn collections_token(&self) -> Result<&str> {
        self.memoized(&self.collections, RESOURCE_COLLECTIONS, TokenScope::everything())
    }

    /// Wildcard token for the analytics service.
    pub fn analytics_token(&self) -> Result<&str> {
        self.memoized(&self.analytics, RESOURCE_ANALYTICS, TokenScope::new().user(WILDCARD))
    }

    /// Read-only token for the feed `slug:user_id`.
    pub fn read_only_token(&self, slug: &str, user_id: &str) -> Result<String> {
        self.issue(WILDCARD, ACTION_READ, TokenScope::new().feed(format!("{slug}{user_id}")))
    }

    /// Read-write token for the feed `slug:user_id`.
    pub fn read_write_token(&self, slug: &str, user_id: &str) -> Result<String> {
        self.issue(WILDCARD, WILDCARD, TokenScope::new().feed(format!("{slug}{user_id}")))
    }

    /// Server-side token for activity batch operations.
    pub fn activities_token(&self) -> Result<String> {
        self.issue(RESOURCE_ACTIVITIES, WILDCARD, TokenScope::new().feed(WILDCARD))
    }

    /// Token authorizing tracked redirects on behalf of `user_id`.
    pub fn redirect_token(&self, user_id: &str) -> Result<String> {
        self.issue(RESOURCE_REDIRECT, WILDCARD, TokenScope::new().user(user_id))
    }

    /// Session token identifying an end user, with optional extra claims.
    ///
    /// `user_id` always wins over a `user_id` key in `extra`.
    pub fn user_session_token(&self, user_id: &str, extra: Map<String, Value>) -> Result<String> {
        let mut claims = extra;
        claims.insert("user_id".into(), Value::String(user_id.to_string()));
        if self.expire_tokens {
            claims.insert("iat".into(), Value::from(issued_at()));
        }
        debug!(user_id, "issuing user session token");
        self.sign(&claims)
    }

    fn memoized<'a>(
        &'a self,
        cell: &'a OnceCell<String>,
        resource: &str,
        scope: TokenScope,
    ) -> Result<&'a str> {
        cell.get_or_try_init(|| self.issue(resource, WILDCARD, scope)).map(String::as_str)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        let secret = self.credential.secret().ok_or_else(|| {
            FeedError::Configuration(
                "minting tokens requires an api secret; this client only holds a user token"
                    .into(),
            )
        })?;

        encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| FeedError::Configuration(format!("failed to sign token: {}", e)))
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("credential", &self.credential)
            .field("expire_tokens", &self.expire_tokens)
            .finish_non_exhaustive()
    }
}

fn issued_at() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}
