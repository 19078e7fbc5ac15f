//! Port for the chat API client: data fetches plus the live event stream.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::entities::{
    Channel, ChannelId, Guild, GuildId, Member, Message, MessageId, Presence, User, UserId,
};
use crate::domain::errors::ClientError;

/// Events pushed by the chat client after `connect`.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Ready { user: User },
    PresenceUpdate { user_id: UserId, presence: Presence },
    MemberUpdate { old: Member, new: Member },
    UserUpdate { old: User, new: User },
    MessageCreate { message: Message },
}

/// Options for fetching messages from a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchMessagesOptions {
    pub limit: Option<u8>,
    pub before: Option<MessageId>,
}

impl FetchMessagesOptions {
    #[must_use]
    pub const fn with_limit(mut self, limit: u8) -> Self {
        self.limit = Some(if limit < 100 { limit } else { 100 });
        self
    }

    #[must_use]
    pub const fn before_message(mut self, message_id: MessageId) -> Self {
        self.before = Some(message_id);
        self
    }
}

#[async_trait]
pub trait ChatClientPort: Send + Sync {
    /// Validates the session and starts delivering events.
    ///
    /// `ClientEvent::Ready` is the first event on the returned stream.
    async fn connect(&self) -> Result<(User, mpsc::UnboundedReceiver<ClientEvent>), ClientError>;

    async fn fetch_guilds(&self) -> Result<Vec<Guild>, ClientError>;

    async fn fetch_channels(&self, guild_id: GuildId) -> Result<Vec<Channel>, ClientError>;

    async fn fetch_dm_channels(&self) -> Result<Vec<Channel>, ClientError>;

    /// Fetches messages and stores them in the client's message cache.
    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        options: FetchMessagesOptions,
    ) -> Result<Vec<Message>, ClientError>;

    /// Returns up to `limit` cached messages for a channel, newest first.
    fn cached_messages(&self, channel_id: ChannelId, limit: usize) -> Vec<Message>;

    /// Whether the event stream keeps the message cache current. Without
    /// live updates a cached page may be stale and is refetched on open.
    fn has_live_updates(&self) -> bool;

    /// Members that can see the given guild channel.
    async fn channel_members(&self, channel: &Channel) -> Result<Vec<Member>, ClientError>;

    /// Returns (creating if needed) the direct message channel with a user.
    async fn open_dm(&self, user_id: UserId) -> Result<Channel, ClientError>;
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::application::services::MessageCache;

    /// In-memory chat client serving canned history.
    pub struct MockChatClient {
        pub me: User,
        pub history: Mutex<HashMap<ChannelId, Vec<Message>>>,
        pub members: Mutex<HashMap<ChannelId, Vec<Member>>>,
        pub cache: Mutex<MessageCache>,
        pub fetch_calls: AtomicUsize,
        pub live: bool,
    }

    impl MockChatClient {
        pub fn new() -> Self {
            Self {
                me: User::new(1_u64, "me", "0", None, false),
                history: Mutex::new(HashMap::new()),
                members: Mutex::new(HashMap::new()),
                cache: Mutex::new(MessageCache::new(8)),
                fetch_calls: AtomicUsize::new(0),
                live: false,
            }
        }

        pub fn with_live_updates(mut self) -> Self {
            self.live = true;
            self
        }

        /// Messages posted server-side after the client started.
        pub fn post(&self, channel_id: ChannelId, messages: Vec<Message>) {
            self.history.lock().entry(channel_id).or_default().extend(messages);
        }

        pub fn with_history(self, channel_id: ChannelId, messages: Vec<Message>) -> Self {
            self.history.lock().insert(channel_id, messages);
            self
        }

        pub fn with_members(self, channel_id: ChannelId, members: Vec<Member>) -> Self {
            self.members.lock().insert(channel_id, members);
            self
        }

        pub fn fetch_calls(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatClientPort for MockChatClient {
        async fn connect(
            &self,
        ) -> Result<(User, mpsc::UnboundedReceiver<ClientEvent>), ClientError> {
            let (tx, rx) = mpsc::unbounded_channel();
            let _ = tx.send(ClientEvent::Ready {
                user: self.me.clone(),
            });
            Ok((self.me.clone(), rx))
        }

        async fn fetch_guilds(&self) -> Result<Vec<Guild>, ClientError> {
            Ok(Vec::new())
        }

        async fn fetch_channels(&self, _guild_id: GuildId) -> Result<Vec<Channel>, ClientError> {
            Ok(Vec::new())
        }

        async fn fetch_dm_channels(&self) -> Result<Vec<Channel>, ClientError> {
            Ok(Vec::new())
        }

        async fn fetch_messages(
            &self,
            channel_id: ChannelId,
            options: FetchMessagesOptions,
        ) -> Result<Vec<Message>, ClientError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            let limit = usize::from(options.limit.unwrap_or(50));
            let mut page: Vec<Message> = self
                .history
                .lock()
                .get(&channel_id)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter(|m| options.before.is_none_or(|before| m.id() < before))
                .collect();
            page.sort_by_key(|m| std::cmp::Reverse(m.id()));
            page.truncate(limit);
            self.cache.lock().insert_many(channel_id, page.iter().cloned());
            Ok(page)
        }

        fn cached_messages(&self, channel_id: ChannelId, limit: usize) -> Vec<Message> {
            self.cache.lock().newest(channel_id, limit)
        }

        fn has_live_updates(&self) -> bool {
            self.live
        }

        async fn channel_members(&self, channel: &Channel) -> Result<Vec<Member>, ClientError> {
            Ok(self
                .members
                .lock()
                .get(&channel.id())
                .cloned()
                .unwrap_or_default())
        }

        async fn open_dm(&self, user_id: UserId) -> Result<Channel, ClientError> {
            let user = User::new(user_id, format!("user{user_id}"), "0", None, false);
            Ok(Channel::direct(user_id.as_u64() + 1_000, user))
        }
    }
}
