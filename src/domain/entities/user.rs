//! Discord user entity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl UserId {
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.parse().unwrap_or(0))
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: String,
    discriminator: String,
    global_name: Option<String>,
    avatar: Option<String>,
    #[serde(default)]
    bot: bool,
}

impl User {
    #[must_use]
    pub fn new(
        id: impl Into<UserId>,
        username: impl Into<String>,
        discriminator: impl Into<String>,
        avatar: Option<String>,
        bot: bool,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            discriminator: discriminator.into(),
            global_name: None,
            avatar,
            bot,
        }
    }

    #[must_use]
    pub fn with_global_name(mut self, global_name: impl Into<String>) -> Self {
        self.global_name = Some(global_name.into());
        self
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }

    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    #[must_use]
    pub fn global_name(&self) -> Option<&str> {
        self.global_name.as_deref()
    }

    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    #[must_use]
    pub const fn is_bot(&self) -> bool {
        self.bot
    }

    #[must_use]
    pub fn is_migrated(&self) -> bool {
        self.discriminator == "0"
    }

    /// Returns `username#discriminator`, or the bare username for migrated accounts.
    #[must_use]
    pub fn tag(&self) -> String {
        if self.is_migrated() {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        self.global_name.clone().unwrap_or_else(|| self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new(123_456_789_u64, "testuser", "1234", Some("abc123".into()), false);

        assert_eq!(user.id().as_u64(), 123_456_789);
        assert_eq!(user.username(), "testuser");
        assert_eq!(user.avatar(), Some("abc123"));
        assert!(!user.is_bot());
    }

    #[test]
    fn test_display_name_legacy() {
        let user = User::new(123_u64, "olduser", "1234", None, false);
        assert_eq!(user.display_name(), "olduser#1234");
        assert!(!user.is_migrated());
    }

    #[test]
    fn test_display_name_with_global_name() {
        let user = User::new(123_u64, "handle", "0", None, false).with_global_name("Display Name");
        assert_eq!(user.display_name(), "Display Name");
        assert_eq!(user.tag(), "handle");
    }

    #[test]
    fn test_user_id_from_string() {
        assert_eq!(UserId::from("123456789").as_u64(), 123_456_789);
        assert_eq!(UserId::from("garbage").as_u64(), 0);
    }
}
