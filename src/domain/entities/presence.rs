//! User presence: online status plus the activities a user broadcasts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PresenceStatus {
    Online,
    Idle,
    DoNotDisturb,
    Invisible,
    #[default]
    Offline,
}

impl PresenceStatus {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "online" => Self::Online,
            "idle" => Self::Idle,
            "dnd" => Self::DoNotDisturb,
            "invisible" => Self::Invisible,
            _ => Self::Offline,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::DoNotDisturb => "dnd",
            Self::Invisible => "invisible",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityKind {
    #[default]
    Playing,
    Streaming,
    Listening,
    Watching,
    Custom,
    Competing,
}

impl ActivityKind {
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Streaming,
            2 => Self::Listening,
            3 => Self::Watching,
            4 => Self::Custom,
            5 => Self::Competing,
            _ => Self::Playing,
        }
    }
}

/// Emoji attached to an activity. Custom emoji carry an id, unicode emoji only a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEmoji {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub animated: bool,
}

impl ActivityEmoji {
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        self.id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub name: String,
    pub state: Option<String>,
    pub emoji: Option<ActivityEmoji>,
}

impl Activity {
    #[must_use]
    pub fn new(kind: ActivityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            state: None,
            emoji: None,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    #[must_use]
    pub fn with_emoji(mut self, emoji: ActivityEmoji) -> Self {
        self.emoji = Some(emoji);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Presence {
    pub status: PresenceStatus,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Presence {
    #[must_use]
    pub const fn new(status: PresenceStatus) -> Self {
        Self {
            status,
            activities: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    /// The activity shown on the status line.
    #[must_use]
    pub fn primary_activity(&self) -> Option<&Activity> {
        self.activities.first()
    }

    /// The first emoji found across all activities.
    #[must_use]
    pub fn status_emoji(&self) -> Option<&ActivityEmoji> {
        self.activities.iter().find_map(|a| a.emoji.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(PresenceStatus::parse("dnd"), PresenceStatus::DoNotDisturb);
        assert_eq!(PresenceStatus::parse("ONLINE"), PresenceStatus::Online);
        assert_eq!(PresenceStatus::parse("bogus"), PresenceStatus::Offline);
    }

    #[test]
    fn test_status_emoji_searches_all_activities() {
        let presence = Presence::new(PresenceStatus::Online)
            .with_activity(Activity::new(ActivityKind::Playing, "Factorio"))
            .with_activity(Activity::new(ActivityKind::Custom, "Custom Status").with_emoji(
                ActivityEmoji {
                    id: None,
                    name: "🔥".to_string(),
                    animated: false,
                },
            ));

        assert_eq!(presence.primary_activity().map(|a| a.kind), Some(ActivityKind::Playing));
        assert_eq!(presence.status_emoji().map(|e| e.name.as_str()), Some("🔥"));
    }
}
