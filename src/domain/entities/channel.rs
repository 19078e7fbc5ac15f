//! Discord channel entity.

use serde::{Deserialize, Serialize};

use super::{GuildId, User};

/// Unique identifier for a Discord channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// Returns the underlying u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChannelId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self(value.parse().unwrap_or(0))
    }
}

/// Discord channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Text channel.
    #[default]
    Text,
    /// Direct message channel.
    Dm,
    /// Voice channel.
    Voice,
    /// Group direct message channel.
    GroupDm,
    /// Category channel.
    Category,
    /// Announcement (news) channel.
    Announcement,
    /// Threads, forums, stages and anything newer.
    Other,
}

impl ChannelKind {
    /// Returns true if this channel type supports text messages.
    #[must_use]
    pub const fn is_text_based(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Dm | Self::GroupDm | Self::Announcement
        )
    }

    /// Returns true for the guild channel types that carry a member list.
    #[must_use]
    pub const fn supports_member_list(self) -> bool {
        matches!(self, Self::Text | Self::Announcement)
    }

    /// Returns the display prefix for this channel type.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Voice => "🔊",
            Self::Dm | Self::GroupDm => "@",
            Self::Category | Self::Other => "",
            Self::Text | Self::Announcement => "#",
        }
    }
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Text,
            1 => Self::Dm,
            2 => Self::Voice,
            3 => Self::GroupDm,
            4 => Self::Category,
            5 => Self::Announcement,
            _ => Self::Other,
        }
    }
}

/// Discord channel information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    id: ChannelId,
    guild_id: Option<GuildId>,
    name: String,
    kind: ChannelKind,
    position: i32,
    recipient: Option<User>,
}

impl Channel {
    /// Creates a new channel with the given ID, name, and type.
    #[must_use]
    pub fn new(id: impl Into<ChannelId>, name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            id: id.into(),
            guild_id: None,
            name: name.into(),
            kind,
            position: 0,
            recipient: None,
        }
    }

    /// Creates a direct message channel with a single recipient.
    #[must_use]
    pub fn direct(id: impl Into<ChannelId>, recipient: User) -> Self {
        Self {
            id: id.into(),
            guild_id: None,
            name: recipient.display_name(),
            kind: ChannelKind::Dm,
            position: 0,
            recipient: Some(recipient),
        }
    }

    /// Sets the guild ID for this channel.
    #[must_use]
    pub fn with_guild(mut self, guild_id: impl Into<GuildId>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Sets the position of this channel in the channel list.
    #[must_use]
    pub const fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    #[must_use]
    pub const fn guild_id(&self) -> Option<GuildId> {
        self.guild_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        self.kind
    }

    #[must_use]
    pub const fn position(&self) -> i32 {
        self.position
    }

    /// The other participant of a direct message channel.
    #[must_use]
    pub const fn recipient(&self) -> Option<&User> {
        self.recipient.as_ref()
    }

    /// Returns the display name with the channel type prefix.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_creation() {
        let channel = Channel::new(123_u64, "general", ChannelKind::Text).with_guild(456_u64);

        assert_eq!(channel.id().as_u64(), 123);
        assert_eq!(channel.guild_id(), Some(GuildId(456)));
        assert_eq!(channel.display_name(), "#general");
    }

    #[test]
    fn test_direct_channel_uses_recipient_name() {
        let user = User::new(7_u64, "bob", "0", None, false);
        let channel = Channel::direct(55_u64, user);

        assert_eq!(channel.kind(), ChannelKind::Dm);
        assert_eq!(channel.display_name(), "@bob");
        assert_eq!(channel.recipient().map(User::username), Some("bob"));
    }

    #[test]
    fn test_member_list_support() {
        assert!(ChannelKind::Text.supports_member_list());
        assert!(ChannelKind::Announcement.supports_member_list());
        assert!(!ChannelKind::Dm.supports_member_list());
        assert!(!ChannelKind::Voice.supports_member_list());
        assert_eq!(ChannelKind::from(5), ChannelKind::Announcement);
        assert_eq!(ChannelKind::from(15), ChannelKind::Other);
    }
}
