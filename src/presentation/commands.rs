//! Key bindings and the commands widgets hand back to the application.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio_util::sync::CancellationToken;

use crate::application::AppEvent;
use crate::domain::entities::{Channel, ChannelId, MessageId, UserId};
use crate::presentation::widgets::ImageRequest;

/// What a key press means, independent of the focused widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Quit,
    ToggleMembersList,
    ToggleAvatars,
    FocusNext,
    FocusPrevious,
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Activate,
    ContextMenu,
    Cancel,
}

impl KeyAction {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::ToggleMembersList => "members",
            Self::ToggleAvatars => "avatars",
            Self::FocusNext => "next pane",
            Self::FocusPrevious => "prev pane",
            Self::Up => "up",
            Self::Down => "down",
            Self::PageUp => "page up",
            Self::PageDown => "page down",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Activate => "open",
            Self::ContextMenu => "menu",
            Self::Cancel => "close",
        }
    }
}

/// Work a widget asks the application to carry out.
#[derive(Debug)]
pub enum UiCommand {
    Emit(AppEvent),
    OpenDm(UserId),
    LoadMembers(Channel),
    LoadHistory {
        channel: Channel,
        token: CancellationToken,
    },
    LoadOlder {
        channel_id: ChannelId,
        before: MessageId,
        token: CancellationToken,
    },
    LoadImages(Vec<ImageRequest>),
}

pub struct CommandRegistry {
    display_bindings: HashMap<KeyAction, KeyEvent>,
    input_bindings: Vec<(KeyEvent, KeyAction)>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut display_bindings = HashMap::new();
        let mut input_bindings = Vec::new();

        let mut register = |action: KeyAction, code: KeyCode, modifiers: KeyModifiers, is_primary: bool| {
            let key = KeyEvent::new(code, modifiers);
            if is_primary {
                display_bindings.insert(action, key);
            }
            input_bindings.push((key, action));
        };

        register(KeyAction::Quit, KeyCode::Char('c'), KeyModifiers::CONTROL, true);
        register(KeyAction::Quit, KeyCode::Char('q'), KeyModifiers::NONE, false);
        register(KeyAction::ToggleMembersList, KeyCode::Char('h'), KeyModifiers::CONTROL, true);
        register(KeyAction::ToggleAvatars, KeyCode::Char('a'), KeyModifiers::CONTROL, true);
        register(KeyAction::FocusNext, KeyCode::Tab, KeyModifiers::NONE, true);
        register(KeyAction::FocusPrevious, KeyCode::BackTab, KeyModifiers::SHIFT, true);
        register(KeyAction::FocusPrevious, KeyCode::BackTab, KeyModifiers::NONE, false);
        register(KeyAction::Up, KeyCode::Up, KeyModifiers::NONE, true);
        register(KeyAction::Up, KeyCode::Char('k'), KeyModifiers::NONE, false);
        register(KeyAction::Down, KeyCode::Down, KeyModifiers::NONE, true);
        register(KeyAction::Down, KeyCode::Char('j'), KeyModifiers::NONE, false);
        register(KeyAction::PageUp, KeyCode::PageUp, KeyModifiers::NONE, true);
        register(KeyAction::PageDown, KeyCode::PageDown, KeyModifiers::NONE, true);
        register(KeyAction::Top, KeyCode::Home, KeyModifiers::NONE, true);
        register(KeyAction::Top, KeyCode::Char('g'), KeyModifiers::NONE, false);
        register(KeyAction::Bottom, KeyCode::End, KeyModifiers::NONE, true);
        register(KeyAction::Bottom, KeyCode::Char('G'), KeyModifiers::SHIFT, false);
        register(KeyAction::Activate, KeyCode::Enter, KeyModifiers::NONE, true);
        register(KeyAction::ContextMenu, KeyCode::Char('m'), KeyModifiers::NONE, true);
        register(KeyAction::Cancel, KeyCode::Esc, KeyModifiers::NONE, true);

        Self {
            display_bindings,
            input_bindings,
        }
    }
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, action: KeyAction) -> Option<KeyEvent> {
        self.display_bindings.get(&action).copied()
    }

    #[must_use]
    pub fn find_action(&self, key: KeyEvent) -> Option<KeyAction> {
        self.input_bindings
            .iter()
            .find(|(k, _)| k.code == key.code && k.modifiers == key.modifiers)
            .map(|(_, a)| *a)
    }

    /// Display text of the primary binding, such as `^H`.
    #[must_use]
    pub fn key_label(&self, action: KeyAction) -> Option<String> {
        self.get(action).map(format_key)
    }
}

fn format_key(key: KeyEvent) -> String {
    let base = match key.code {
        KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "S-Tab".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        other => format!("{other:?}"),
    };

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        format!("^{base}")
    } else if matches!(key.code, KeyCode::Char(_)) {
        base.to_lowercase()
    } else {
        base
    }
}
