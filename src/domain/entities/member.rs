use serde::{Deserialize, Serialize};

use super::{GuildId, User, UserId};

/// A user's membership in a guild.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    guild_id: GuildId,
    user: User,
    nick: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

impl Member {
    #[must_use]
    pub fn new(guild_id: impl Into<GuildId>, user: User) -> Self {
        Self {
            guild_id: guild_id.into(),
            user,
            nick: None,
            avatar: None,
        }
    }

    #[must_use]
    pub fn with_nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = Some(nick.into());
        self
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }

    #[must_use]
    pub const fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user.id()
    }

    #[must_use]
    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    /// Guild-specific avatar hash, if the member set one.
    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// Nickname, falling back to the account username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or_else(|| self.user.username())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_nick() {
        let user = User::new(1_u64, "alice", "0", None, false);
        let member = Member::new(9_u64, user.clone());
        assert_eq!(member.display_name(), "alice");

        let member = Member::new(9_u64, user).with_nick("Al");
        assert_eq!(member.display_name(), "Al");
        assert_eq!(member.guild_id(), GuildId(9));
    }
}
