//! Feed handles

use feedstream_core::FeedId;
use feedstream_domain::{FeedError, Result, Subscription};
use tracing::instrument;

use super::client::StreamClient;

/// Handle on one feed, carrying the token used to access it
#[derive(Debug, Clone)]
pub struct Feed<'a> {
    client: &'a StreamClient,
    id: FeedId,
    token: String,
}

impl<'a> Feed<'a> {
    pub(crate) fn new(client: &'a StreamClient, id: FeedId, token: String) -> Self {
        Self { client, id, token }
    }

    pub fn id(&self) -> &FeedId {
        &self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Signature sent with requests for this feed: `<slug><user_id> <token>`.
    pub fn signature(&self) -> String {
        self.id.signature(&self.token)
    }

    /// Realtime channel for this feed's notifications, with leading `/`.
    ///
    /// # Errors
    /// Returns `FeedError::Configuration` if the client has no app id.
    pub fn notification_channel(&self) -> Result<String> {
        let app_id = self.client.config().app_id.as_deref().ok_or_else(|| {
            FeedError::Configuration("realtime channels need an app id".into())
        })?;
        Ok(format!("/{}", self.id.notification_channel(app_id)))
    }

    /// Start receiving realtime notifications for this feed.
    #[instrument(skip(self), fields(feed = %self.id))]
    pub async fn subscribe(&self) -> Result<()> {
        let channel = self.notification_channel()?;
        let realtime = self.client.realtime()?;
        // the realtime server identifies feed subscribers by their channel
        let subscription =
            Subscription::new(channel.clone(), channel.trim_start_matches('/'), &self.token);
        realtime.subscribe(subscription).await
    }

    /// Stop receiving realtime notifications for this feed.
    #[instrument(skip(self), fields(feed = %self.id))]
    pub async fn unsubscribe(&self) -> Result<()> {
        let channel = self.notification_channel()?;
        self.client.realtime()?.unsubscribe(&channel).await
    }
}
