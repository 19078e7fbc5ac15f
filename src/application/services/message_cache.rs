//! Per-channel message cache kept by the chat client.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::domain::entities::{ChannelId, Message, MessageId};

/// Default number of channels whose history stays cached.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Messages per channel beyond which the oldest are dropped.
const MAX_MESSAGES_PER_CHANNEL: usize = 1_000;

/// LRU over channels; each channel keeps its messages ordered by id.
pub struct MessageCache {
    channels: LruCache<ChannelId, BTreeMap<MessageId, Message>>,
}

impl MessageCache {
    #[must_use]
    pub fn new(channel_capacity: usize) -> Self {
        let cap = NonZeroUsize::new(channel_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            channels: LruCache::new(cap),
        }
    }

    pub fn insert(&mut self, message: Message) {
        let channel_id = message.channel_id();
        self.insert_many(channel_id, std::iter::once(message));
    }

    /// Inserts messages into one channel, replacing entries with the same id.
    pub fn insert_many(&mut self, channel_id: ChannelId, messages: impl IntoIterator<Item = Message>) {
        let entries = self.channels.get_or_insert_mut(channel_id, BTreeMap::new);
        for message in messages {
            entries.insert(message.id(), message);
        }
        while entries.len() > MAX_MESSAGES_PER_CHANNEL {
            entries.pop_first();
        }
    }

    /// Returns up to `limit` messages, newest first.
    #[must_use]
    pub fn newest(&self, channel_id: ChannelId, limit: usize) -> Vec<Message> {
        self.channels
            .peek(&channel_id)
            .map(|entries| entries.values().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self, channel_id: ChannelId) -> usize {
        self.channels.peek(&channel_id).map_or(0, BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self, channel_id: ChannelId) -> bool {
        self.len(channel_id) == 0
    }
}

impl Default for MessageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;
    use chrono::Utc;

    fn msg(id: u64, channel: u64) -> Message {
        let author = User::new(1_u64, "a", "0", None, false);
        Message::new(id, channel, author, format!("m{id}"), Utc::now())
    }

    #[test]
    fn test_newest_orders_descending_and_dedups() {
        let mut cache = MessageCache::new(4);
        cache.insert_many(ChannelId(1), [msg(3, 1), msg(1, 1), msg(2, 1)]);
        cache.insert(msg(2, 1));

        let ids: Vec<u64> = cache
            .newest(ChannelId(1), 10)
            .iter()
            .map(|m| m.id().as_u64())
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(cache.len(ChannelId(1)), 3);
        assert_eq!(cache.newest(ChannelId(1), 2).len(), 2);
    }

    #[test]
    fn test_least_recent_channel_evicted() {
        let mut cache = MessageCache::new(2);
        cache.insert(msg(1, 10));
        cache.insert(msg(2, 20));
        cache.insert(msg(3, 30));

        assert!(cache.is_empty(ChannelId(10)));
        assert_eq!(cache.len(ChannelId(20)), 1);
        assert_eq!(cache.len(ChannelId(30)), 1);
    }
}
