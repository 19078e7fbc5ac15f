//! Wire shapes of the Discord REST API and their conversion into entities.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::entities::{
    Attachment, Channel, ChannelKind, Guild, GuildId, Member, Message, User,
};

/// Discord API user response structure.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    #[serde(default = "default_discriminator")]
    pub discriminator: String,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

fn default_discriminator() -> String {
    "0".to_string()
}

impl From<UserResponse> for User {
    fn from(dto: UserResponse) -> Self {
        let user = Self::new(dto.id.as_str(), dto.username, dto.discriminator, dto.avatar, dto.bot);
        match dto.global_name {
            Some(global_name) => user.with_global_name(global_name),
            None => user,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GuildResponse {
    pub id: String,
    pub name: String,
}

impl From<GuildResponse> for Guild {
    fn from(dto: GuildResponse) -> Self {
        Self::new(dto.id.as_str(), dto.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChannelResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub guild_id: Option<String>,
    pub name: Option<String>,
    pub position: Option<i32>,
    #[serde(default)]
    pub recipients: Vec<UserResponse>,
}

impl ChannelResponse {
    /// Converts into a channel, attaching `guild_id` when the payload omits it.
    pub fn into_channel(self, guild_id: Option<GuildId>) -> Channel {
        let kind = ChannelKind::from(self.kind);

        if kind == ChannelKind::Dm
            && let Some(recipient) = self.recipients.first().cloned()
        {
            return Channel::direct(self.id.as_str(), recipient.into());
        }

        let name = self.name.unwrap_or_else(|| {
            self.recipients
                .iter()
                .map(|r| r.username.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        });
        let channel = Channel::new(self.id.as_str(), name, kind)
            .with_position(self.position.unwrap_or_default());

        match self
            .guild_id
            .as_deref()
            .map(GuildId::from)
            .or(guild_id)
        {
            Some(guild_id) => channel.with_guild(guild_id),
            None => channel,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AttachmentResponse {
    pub id: String,
    pub filename: String,
    pub url: String,
    pub content_type: Option<String>,
}

impl From<AttachmentResponse> for Attachment {
    fn from(dto: AttachmentResponse) -> Self {
        let attachment = Self::new(dto.id, dto.filename, dto.url);
        match dto.content_type {
            Some(content_type) => attachment.with_content_type(content_type),
            None => attachment,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub channel_id: String,
    pub author: UserResponse,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub edited_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attachments: Vec<AttachmentResponse>,
}

impl From<MessageResponse> for Message {
    fn from(dto: MessageResponse) -> Self {
        let message = Self::new(
            dto.id.as_str(),
            dto.channel_id.as_str(),
            dto.author.into(),
            dto.content,
            dto.timestamp,
        )
        .with_attachments(dto.attachments.into_iter().map(Into::into).collect());

        match dto.edited_timestamp {
            Some(edited) => message.with_edited_timestamp(edited),
            None => message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MemberResponse {
    pub user: Option<UserResponse>,
    pub nick: Option<String>,
    pub avatar: Option<String>,
}

impl MemberResponse {
    /// Members arrive without their guild id; payloads lacking a user are skipped.
    pub fn into_member(self, guild_id: GuildId) -> Option<Member> {
        let member = Member::new(guild_id, self.user?.into()).with_avatar(self.avatar);
        Some(match self.nick {
            Some(nick) => member.with_nick(nick),
            None => member,
        })
    }
}

/// Discord API error response structure.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    /// Seconds to wait, present on 429 responses.
    pub retry_after: Option<f64>,
}
