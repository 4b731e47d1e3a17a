//! Registered realtime channels

use std::sync::Arc;

use dashmap::DashMap;
use feedstream_domain::Subscription;

/// Concurrent map from channel name to its subscription credentials
///
/// Cloning shares the underlying map. A lookup of a channel removed by a
/// concurrent unsubscribe simply misses.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    entries: Arc<DashMap<String, Subscription>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel, returning the subscription it replaced.
    pub fn register(&self, subscription: Subscription) -> Option<Subscription> {
        self.entries.insert(subscription.channel.clone(), subscription)
    }

    pub fn remove(&self, channel: &str) -> Option<Subscription> {
        self.entries.remove(channel).map(|(_, subscription)| subscription)
    }

    pub fn get(&self, channel: &str) -> Option<Subscription> {
        self.entries.get(channel).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.entries.contains_key(channel)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
