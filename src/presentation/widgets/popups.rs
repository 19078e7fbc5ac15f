//! User context menu and profile card.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use tracing::debug;

use super::button_registry::ButtonRegistry;
use super::user_button::{PROFILE_POPUP_WIDTH, activity_text, status_color};
use crate::application::{Anchor, AppEvent};
use crate::domain::entities::{GuildId, Identity, Member, Presence, User, UserId};
use crate::presentation::commands::{KeyAction, UiCommand};

const MENU_ITEMS: [&str; 2] = ["Profile", "Message"];
const MENU_WIDTH: u16 = 14;

#[derive(Debug)]
pub enum PopupOutcome {
    Keep,
    Close,
    Run(UiCommand),
}

#[derive(Debug, Clone)]
pub struct UserMenu {
    identity: Identity,
    anchor: Anchor,
    selected: usize,
}

impl UserMenu {
    #[must_use]
    pub const fn new(identity: Identity, anchor: Anchor) -> Self {
        Self {
            identity,
            anchor,
            selected: 0,
        }
    }

    pub fn handle_action(&mut self, action: KeyAction) -> PopupOutcome {
        match action {
            KeyAction::Up => self.selected = self.selected.saturating_sub(1),
            KeyAction::Down => self.selected = (self.selected + 1).min(MENU_ITEMS.len() - 1),
            KeyAction::Cancel => return PopupOutcome::Close,
            KeyAction::Activate => {
                let user_id = self.identity.user_id();
                let command = if self.selected == 0 {
                    UiCommand::Emit(AppEvent::OpenUserProfile {
                        user_id,
                        guild_id: self.identity.guild_id(),
                        anchor: self.anchor.shifted_left(PROFILE_POPUP_WIDTH),
                    })
                } else {
                    UiCommand::OpenDm(user_id)
                };
                return PopupOutcome::Run(command);
            }
            _ => {}
        }
        PopupOutcome::Keep
    }

    fn area(&self, screen: Rect) -> Rect {
        let height = u16::try_from(MENU_ITEMS.len()).unwrap_or(0) + 2;
        place(self.anchor, MENU_WIDTH, height, screen)
    }
}

impl Widget for &UserMenu {
    fn render(self, screen: Rect, buf: &mut Buffer) {
        let area = self.area(screen);
        Clear.render(area, buf);
        let lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let style = if i == self.selected {
                    Style::default().bg(Color::Cyan).fg(Color::Black)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!(" {item:<width$}", width = usize::from(MENU_WIDTH) - 3), style))
            })
            .collect();
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)))
            .render(area, buf);
    }
}

/// Snapshot of a user shown in the profile card.
#[derive(Debug, Clone)]
pub struct ProfileCard {
    user: User,
    member: Option<Member>,
    presence: Presence,
    anchor: Anchor,
}

impl ProfileCard {
    /// Builds the card from the buttons currently on screen.
    #[must_use]
    pub fn resolve(
        registry: &ButtonRegistry,
        user_id: UserId,
        guild_id: Option<GuildId>,
        anchor: Anchor,
    ) -> Option<Self> {
        let identity = guild_id.map_or(Identity::User(user_id), |guild_id| Identity::Member {
            guild_id,
            user_id,
        });
        let Some(button) = registry
            .get(identity)
            .or_else(|| registry.get(Identity::User(user_id)))
        else {
            debug!(user_id = %user_id, "No visible button for profile");
            return None;
        };
        let button = button.borrow();

        Some(Self {
            user: button.user().clone(),
            member: button.member().cloned(),
            presence: registry.presence(user_id).cloned().unwrap_or_default(),
            anchor,
        })
    }

    #[must_use]
    pub fn lines(&self) -> Vec<Line<'static>> {
        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = vec![
            Line::from(Span::styled(
                self.user.display_name(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(self.user.tag(), dim)),
            Line::from(vec![
                Span::styled("● ", Style::default().fg(status_color(self.presence.status))),
                Span::raw(self.presence.status.as_str()),
            ]),
        ];
        if let Some(activity) = self.presence.primary_activity().and_then(activity_text) {
            lines.push(Line::from(activity));
        }
        if let Some(nick) = self.member.as_ref().and_then(Member::nick) {
            lines.push(Line::from(vec![
                Span::styled("Nickname: ", dim),
                Span::raw(nick.to_string()),
            ]));
        }
        lines
    }
}

impl Widget for &ProfileCard {
    fn render(self, screen: Rect, buf: &mut Buffer) {
        let lines = self.lines();
        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
        let area = place(self.anchor, PROFILE_POPUP_WIDTH, height, screen);
        Clear.render(area, buf);
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(" Profile "),
            )
            .render(area, buf);
    }
}

#[derive(Debug, Clone)]
pub enum Popup {
    UserMenu(UserMenu),
    Profile(ProfileCard),
}

impl Popup {
    /// Opens a popup for menu and profile events; other events yield `None`.
    #[must_use]
    pub fn from_event(event: &AppEvent, registry: &ButtonRegistry) -> Option<Self> {
        match event {
            AppEvent::OpenUserMenu { identity, anchor } => {
                Some(Self::UserMenu(UserMenu::new(*identity, *anchor)))
            }
            AppEvent::OpenUserProfile {
                user_id,
                guild_id,
                anchor,
            } => ProfileCard::resolve(registry, *user_id, *guild_id, *anchor).map(Self::Profile),
            _ => None,
        }
    }

    pub fn handle_action(&mut self, action: KeyAction) -> PopupOutcome {
        match self {
            Self::UserMenu(menu) => menu.handle_action(action),
            Self::Profile(_) => match action {
                KeyAction::Cancel | KeyAction::Activate => PopupOutcome::Close,
                _ => PopupOutcome::Keep,
            },
        }
    }
}

impl Widget for &Popup {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self {
            Popup::UserMenu(menu) => menu.render(area, buf),
            Popup::Profile(card) => card.render(area, buf),
        }
    }
}

/// Rectangle of `width`x`height` at `anchor`, pushed back inside `screen`.
fn place(anchor: Anchor, width: u16, height: u16, screen: Rect) -> Rect {
    let width = width.min(screen.width);
    let height = height.min(screen.height);
    let x = anchor.x.clamp(screen.x, screen.right().saturating_sub(width));
    let y = anchor.y.clamp(screen.y, screen.bottom().saturating_sub(height));
    Rect::new(x, y, width, height)
}
