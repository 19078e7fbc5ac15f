//! Guilds as the channel switcher groups them.

use serde::{Deserialize, Serialize};

/// Snowflake of a guild (server). Member identities are scoped by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuildId(pub u64);

impl std::fmt::Display for GuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for GuildId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Unparseable snowflakes map to 0, which never matches a real guild.
impl From<&str> for GuildId {
    fn from(value: &str) -> Self {
        Self(value.parse().unwrap_or(0))
    }
}

const UNNAMED: &str = "(unnamed guild)";

/// A guild the user belongs to. Its text channels are listed beneath a
/// header carrying [`Guild::label`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guild {
    id: GuildId,
    name: String,
}

impl Guild {
    #[must_use]
    pub fn new(id: impl Into<GuildId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> GuildId {
        self.id
    }

    /// Switcher header text; blank names get a placeholder.
    #[must_use]
    pub fn label(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { UNNAMED } else { name }
    }
}
