//! Feed identifiers

use std::fmt;

use feedstream_domain::{FeedError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+$").expect("SLUG_PATTERN is valid and well-formed")
});

static USER_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("USER_ID_PATTERN is valid and well-formed")
});

/// Validated `slug:user_id` feed identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedId {
    slug: String,
    user_id: String,
}

impl FeedId {
    /// # Errors
    /// Returns `FeedError::Validation` if the slug is not a word or the user
    /// id contains anything besides word characters and dashes.
    pub fn new(slug: impl Into<String>, user_id: impl Into<String>) -> Result<Self> {
        let slug = slug.into();
        let user_id = user_id.into();

        if !SLUG_PATTERN.is_match(&slug) {
            return Err(FeedError::Validation(format!(
                "invalid feed slug {slug:?}: only letters, digits and underscores are allowed"
            )));
        }
        if !USER_ID_PATTERN.is_match(&user_id) {
            return Err(FeedError::Validation(format!(
                "invalid user id {user_id:?}: only letters, digits, underscores and dashes are allowed"
            )));
        }

        Ok(Self { slug, user_id })
    }

    /// Parse the `slug:user_id` form.
    pub fn parse(id: &str) -> Result<Self> {
        let (slug, user_id) = id.split_once(':').ok_or_else(|| {
            FeedError::Validation(format!("invalid feed id {id:?}: expected slug:user_id"))
        })?;
        Self::new(slug, user_id)
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Concatenated form used in token scopes and signatures.
    pub fn scope_id(&self) -> String {
        format!("{}{}", self.slug, self.user_id)
    }

    /// Relative API path of the feed.
    pub fn url_path(&self) -> String {
        format!("feed/{}/{}/", self.slug, self.user_id)
    }

    /// Feed signature: scope id, a space, then the token.
    pub fn signature(&self, token: &str) -> String {
        format!("{} {}", self.scope_id(), token)
    }

    /// Realtime channel carrying this feed's notifications.
    pub fn notification_channel(&self, app_id: &str) -> String {
        format!("site-{}-feed-{}", app_id, self.scope_id())
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.slug, self.user_id)
    }
}
