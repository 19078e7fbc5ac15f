//! Application-wide event bus.
//!
//! Components never call each other directly; they publish an [`AppEvent`]
//! and the application loop fans it out to every interested widget.

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::entities::{Channel, GuildId, Identity, User, UserId};
use crate::infrastructure::config::UiConfig;

/// Top-level view the main screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Dm,
    Guild,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub guild: Option<GuildId>,
    pub channel: Option<Channel>,
    pub dm: Option<Channel>,
}

impl ViewOptions {
    #[must_use]
    pub fn guild(guild: GuildId) -> Self {
        Self {
            guild: Some(guild),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn channel(channel: Channel) -> Self {
        Self {
            guild: channel.guild_id(),
            channel: Some(channel),
            dm: None,
        }
    }

    #[must_use]
    pub fn dm(dm: Channel) -> Self {
        Self {
            guild: None,
            channel: None,
            dm: Some(dm),
        }
    }

    /// The channel whose messages should be displayed, DMs taking precedence.
    #[must_use]
    pub fn target_channel(&self) -> Option<&Channel> {
        self.dm.as_ref().or(self.channel.as_ref())
    }
}

/// Screen cell a popup is anchored to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anchor {
    pub x: u16,
    pub y: u16,
}

impl Anchor {
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn shifted_left(self, by: u16) -> Self {
        Self {
            x: self.x.saturating_sub(by),
            y: self.y,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    SwitchView { view: View, options: ViewOptions },
    ConfigUpdate(UiConfig),
    NewClient { user: User },
    OpenUserMenu { identity: Identity, anchor: Anchor },
    OpenUserProfile {
        user_id: UserId,
        guild_id: Option<GuildId>,
        anchor: Anchor,
    },
}

impl AppEvent {
    #[must_use]
    pub const fn switch_view(view: View, options: ViewOptions) -> Self {
        Self::SwitchView { view, options }
    }
}

/// Cloneable publisher half of the event bus.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event bus closed, dropping event");
        }
    }
}
