//! Discord REST client implementing the chat client port.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use super::dto::{
    ChannelResponse, ErrorResponse, GuildResponse, MemberResponse, MessageResponse, UserResponse,
};
use crate::application::services::MessageCache;
use crate::domain::entities::{
    AuthToken, Channel, ChannelId, ChannelKind, Guild, GuildId, Member, Message, User, UserId,
};
use crate::domain::errors::ClientError;
use crate::domain::ports::{ChatClientPort, ClientEvent, FetchMessagesOptions};

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_PAGE_SIZE: u8 = 50;
const MEMBER_PAGE_SIZE: u16 = 1000;
const CACHED_CHANNELS: usize = 64;

/// REST-backed Discord client.
///
/// Live gateway events are not received; the event stream only carries what
/// the client publishes itself, so cached pages are never trusted as current.
pub struct DiscordClient {
    client: Client,
    base_url: String,
    token: AuthToken,
    cache: Mutex<MessageCache>,
    events: Mutex<Option<mpsc::UnboundedSender<ClientEvent>>>,
}

impl DiscordClient {
    /// Creates a client against the public API.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(token: AuthToken) -> Result<Self, ClientError> {
        Self::with_base_url(token, DISCORD_API_BASE)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn with_base_url(token: AuthToken, base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
            cache: Mutex::new(MessageCache::new(CACHED_CHANNELS)),
            events: Mutex::new(None),
        })
    }

    /// Sends an event to the connected session. Created messages are
    /// recorded in the cache first.
    pub fn publish(&self, event: ClientEvent) {
        if let ClientEvent::MessageCreate { message } = &event {
            self.cache.lock().insert(message.clone());
        }
        if let Some(tx) = self.events.lock().as_ref()
            && tx.send(event).is_err()
        {
            debug!("Event receiver dropped");
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request
            .header(header::AUTHORIZATION, self.token.as_str())
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to reach Discord API");
                if e.is_timeout() {
                    ClientError::network("request timed out")
                } else if e.is_connect() {
                    ClientError::network("failed to connect to Discord")
                } else {
                    ClientError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(status, response).await);
        }

        response.json::<T>().await.map_err(|e| {
            warn!(error = %e, "Failed to parse Discord response");
            ClientError::decode(e.to_string())
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn error_from_response(status: StatusCode, response: reqwest::Response) -> ClientError {
        let body = response.json::<ErrorResponse>().await.ok();
        let message = body
            .as_ref()
            .map_or_else(|| format!("HTTP {status}"), |e| e.message.clone());

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::forbidden(message),
            StatusCode::NOT_FOUND => ClientError::not_found(message),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = body.and_then(|e| e.retry_after).unwrap_or(5.0);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let retry_after_ms = (retry_after * 1000.0) as u64;
                ClientError::RateLimited { retry_after_ms }
            }
            s if s.is_server_error() => {
                ClientError::network("Discord API is temporarily unavailable")
            }
            _ => ClientError::unexpected(format!("unexpected response: {status} - {message}")),
        }
    }
}

#[async_trait]
impl ChatClientPort for DiscordClient {
    #[instrument(skip(self))]
    async fn connect(&self) -> Result<(User, mpsc::UnboundedReceiver<ClientEvent>), ClientError> {
        let user: User = self.get::<UserResponse>("/users/@me").await?.into();
        debug!(user_id = %user.id(), username = %user.username(), "Session established");

        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock() = Some(tx);
        self.publish(ClientEvent::Ready { user: user.clone() });

        Ok((user, rx))
    }

    async fn fetch_guilds(&self) -> Result<Vec<Guild>, ClientError> {
        let guilds: Vec<GuildResponse> = self.get("/users/@me/guilds").await?;
        Ok(guilds.into_iter().map(Into::into).collect())
    }

    async fn fetch_channels(&self, guild_id: GuildId) -> Result<Vec<Channel>, ClientError> {
        let channels: Vec<ChannelResponse> =
            self.get(&format!("/guilds/{guild_id}/channels")).await?;

        let mut channels: Vec<Channel> = channels
            .into_iter()
            .map(|c| c.into_channel(Some(guild_id)))
            .collect();
        channels.sort_by_key(Channel::position);
        Ok(channels)
    }

    async fn fetch_dm_channels(&self) -> Result<Vec<Channel>, ClientError> {
        let channels: Vec<ChannelResponse> = self.get("/users/@me/channels").await?;
        Ok(channels
            .into_iter()
            .map(|c| c.into_channel(None))
            .filter(|c| matches!(c.kind(), ChannelKind::Dm | ChannelKind::GroupDm))
            .collect())
    }

    #[instrument(skip(self))]
    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        options: FetchMessagesOptions,
    ) -> Result<Vec<Message>, ClientError> {
        let mut query = vec![(
            "limit",
            options.limit.unwrap_or(DEFAULT_PAGE_SIZE).to_string(),
        )];
        if let Some(before) = options.before {
            query.push(("before", before.to_string()));
        }

        let request = self
            .client
            .get(self.url(&format!("/channels/{channel_id}/messages")))
            .query(&query);
        let messages: Vec<MessageResponse> = self.send(request).await?;
        let messages: Vec<Message> = messages.into_iter().map(Into::into).collect();

        debug!(count = messages.len(), "Fetched messages");
        self.cache
            .lock()
            .insert_many(channel_id, messages.iter().cloned());

        Ok(messages)
    }

    fn cached_messages(&self, channel_id: ChannelId, limit: usize) -> Vec<Message> {
        self.cache.lock().newest(channel_id, limit)
    }

    fn has_live_updates(&self) -> bool {
        false
    }

    async fn channel_members(&self, channel: &Channel) -> Result<Vec<Member>, ClientError> {
        let Some(guild_id) = channel.guild_id() else {
            return Ok(Vec::new());
        };

        let request = self
            .client
            .get(self.url(&format!("/guilds/{guild_id}/members")))
            .query(&[("limit", MEMBER_PAGE_SIZE)]);
        let members: Vec<MemberResponse> = self.send(request).await?;

        Ok(members
            .into_iter()
            .filter_map(|m| m.into_member(guild_id))
            .collect())
    }

    async fn open_dm(&self, user_id: UserId) -> Result<Channel, ClientError> {
        let request = self
            .client
            .post(self.url("/users/@me/channels"))
            .json(&json!({ "recipient_id": user_id.to_string() }));
        let channel: ChannelResponse = self.send(request).await?;
        Ok(channel.into_channel(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MessageId;

    fn token() -> AuthToken {
        AuthToken::parse("MTIzNDU2Nzg5MDEyMzQ1Njc4.GabcDe.abcdefghijklmnopqrstuvwxyz0123456789").unwrap()
    }

    #[test]
    fn test_client_creation() {
        assert!(DiscordClient::new(token()).is_ok());
    }

    #[test]
    fn test_url_joins_base() {
        let client = DiscordClient::with_base_url(token(), "http://localhost:1").unwrap();
        assert_eq!(client.url("/users/@me"), "http://localhost:1/users/@me");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = DiscordClient::with_base_url(token(), "http://127.0.0.1:9").unwrap();
        let err = client.fetch_guilds().await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_cache_starts_empty() {
        let client = DiscordClient::new(token()).unwrap();
        assert!(client.cached_messages(ChannelId(1), 10).is_empty());
        assert!(!client.has_live_updates());
    }

    #[tokio::test]
    async fn test_published_message_is_cached_and_forwarded() {
        let client = DiscordClient::new(token()).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        *client.events.lock() = Some(tx);

        let author = User::new(2_u64, "bob", "0", None, false);
        let message = Message::new(9_u64, 3_u64, author, "hi", chrono::Utc::now());
        client.publish(ClientEvent::MessageCreate { message });

        let cached = client.cached_messages(ChannelId(3), 10);
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id(), MessageId(9));
        assert!(matches!(rx.recv().await, Some(ClientEvent::MessageCreate { .. })));
    }
}
