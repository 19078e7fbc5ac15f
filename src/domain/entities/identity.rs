use super::{GuildId, Member, User, UserId};

/// Key under which a person is represented in the UI.
///
/// The same account shows up as a plain user (DMs) and as a member of each
/// guild it joined; guild members can carry their own nickname and avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    User(UserId),
    Member { guild_id: GuildId, user_id: UserId },
}

impl Identity {
    #[must_use]
    pub const fn user_id(self) -> UserId {
        match self {
            Self::User(user_id) | Self::Member { user_id, .. } => user_id,
        }
    }

    #[must_use]
    pub const fn guild_id(self) -> Option<GuildId> {
        match self {
            Self::User(_) => None,
            Self::Member { guild_id, .. } => Some(guild_id),
        }
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self::User(user.id())
    }
}

impl From<&Member> for Identity {
    fn from(member: &Member) -> Self {
        Self::Member {
            guild_id: member.guild_id(),
            user_id: member.user_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_and_user_identities_differ() {
        let user = User::new(5_u64, "eve", "0", None, false);
        let member = Member::new(3_u64, user.clone());

        let as_user = Identity::from(&user);
        let as_member = Identity::from(&member);

        assert_ne!(as_user, as_member);
        assert_eq!(as_user.user_id(), as_member.user_id());
        assert_eq!(as_member.guild_id(), Some(GuildId(3)));
        assert_eq!(as_user.guild_id(), None);
    }
}
