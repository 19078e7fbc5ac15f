//! Left sidebar: guilds with their text channels, then direct messages.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget},
};

use super::button_registry::ButtonRegistry;
use super::user_button::status_color;
use crate::application::{AppEvent, View, ViewOptions};
use crate::domain::entities::{Channel, ChannelId, Guild, PresenceStatus};
use crate::presentation::commands::{KeyAction, UiCommand};

pub const CHANNEL_LIST_WIDTH: u16 = 26;

#[derive(Debug, Clone)]
pub enum ChannelEntry {
    Guild(Guild),
    /// Header of the direct messages section; opens the home view.
    Home,
    Channel(Channel),
    Dm(Channel),
}

impl ChannelEntry {
    /// Event emitted when the entry is activated.
    #[must_use]
    pub fn switch_event(&self) -> AppEvent {
        match self {
            Self::Guild(guild) => AppEvent::switch_view(View::Guild, ViewOptions::guild(guild.id())),
            Self::Home => AppEvent::switch_view(View::Home, ViewOptions::default()),
            Self::Channel(channel) => {
                AppEvent::switch_view(View::Guild, ViewOptions::channel(channel.clone()))
            }
            Self::Dm(channel) => AppEvent::switch_view(View::Dm, ViewOptions::dm(channel.clone())),
        }
    }

    const fn channel_id(&self) -> Option<ChannelId> {
        match self {
            Self::Guild(_) | Self::Home => None,
            Self::Channel(channel) | Self::Dm(channel) => Some(channel.id()),
        }
    }
}

#[derive(Default)]
pub struct ChannelListState {
    entries: Vec<ChannelEntry>,
    list_state: ListState,
    active: Option<ChannelId>,
    focused: bool,
}

impl ChannelListState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    #[must_use]
    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    /// Replaces the listing. Only text and announcement channels are kept.
    pub fn set_data(&mut self, guilds: Vec<(Guild, Vec<Channel>)>, dms: Vec<Channel>) {
        self.entries.clear();
        for (guild, channels) in guilds {
            self.entries.push(ChannelEntry::Guild(guild));
            self.entries.extend(
                channels
                    .into_iter()
                    .filter(|c| c.kind().supports_member_list())
                    .map(ChannelEntry::Channel),
            );
        }
        self.entries.push(ChannelEntry::Home);
        self.entries.extend(dms.into_iter().map(ChannelEntry::Dm));
        self.list_state.select(Some(0));
    }

    /// Adds a freshly opened DM, or finds the existing one, and selects it.
    pub fn add_dm(&mut self, channel: Channel) -> AppEvent {
        let index = self
            .entries
            .iter()
            .position(|e| matches!(e, ChannelEntry::Dm(c) if c.id() == channel.id()))
            .unwrap_or_else(|| {
                self.entries.push(ChannelEntry::Dm(channel.clone()));
                self.entries.len() - 1
            });
        self.list_state.select(Some(index));
        AppEvent::switch_view(View::Dm, ViewOptions::dm(channel))
    }

    pub fn handle_app_event(&mut self, event: &AppEvent) {
        if let AppEvent::SwitchView { options, .. } = event {
            self.active = options.target_channel().map(Channel::id);
        }
    }

    pub fn handle_action(&mut self, action: KeyAction) -> Option<UiCommand> {
        match action {
            KeyAction::Up => self.select(self.selected().saturating_sub(1)),
            KeyAction::Down => self.select(self.selected() + 1),
            KeyAction::Top => self.select(0),
            KeyAction::Bottom => self.select(usize::MAX),
            KeyAction::Activate => {
                let entry = self.entries.get(self.list_state.selected()?)?;
                return Some(UiCommand::Emit(entry.switch_event()));
            }
            _ => {}
        }
        None
    }

    fn selected(&self) -> usize {
        self.list_state.selected().unwrap_or(0)
    }

    fn select(&mut self, index: usize) {
        if let Some(last) = self.entries.len().checked_sub(1) {
            self.list_state.select(Some(index.min(last)));
        }
    }

    fn item(&self, entry: &ChannelEntry, registry: &ButtonRegistry) -> ListItem<'static> {
        let active = entry.channel_id().is_some() && entry.channel_id() == self.active;
        let base = if active {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let line = match entry {
            ChannelEntry::Guild(guild) => Line::from(Span::styled(
                guild.label().to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            ChannelEntry::Home => Line::from(Span::styled(
                "Direct Messages",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            ChannelEntry::Channel(channel) => {
                Line::from(Span::styled(format!("  {}", channel.display_name()), base))
            }
            ChannelEntry::Dm(channel) => {
                let status = channel
                    .recipient()
                    .and_then(|user| registry.presence(user.id()))
                    .map_or(PresenceStatus::Offline, |p| p.status);
                Line::from(vec![
                    Span::styled("● ", Style::default().fg(status_color(status))),
                    Span::styled(channel.name().to_string(), base),
                ])
            }
        };
        ListItem::new(line)
    }
}

/// Renders [`ChannelListState`]; DM status dots come from the registry.
pub struct ChannelList<'a> {
    registry: &'a ButtonRegistry,
}

impl<'a> ChannelList<'a> {
    #[must_use]
    pub const fn new(registry: &'a ButtonRegistry) -> Self {
        Self { registry }
    }
}

impl StatefulWidget for ChannelList<'_> {
    type State = ChannelListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border_style = if state.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let items: Vec<ListItem> = state
            .entries
            .iter()
            .map(|entry| state.item(entry, self.registry))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::RIGHT | Borders::TOP)
                    .border_style(border_style)
                    .title(" Channels "),
            )
            .highlight_style(Style::default().bg(Color::Rgb(40, 40, 48)));
        StatefulWidget::render(list, area, buf, &mut state.list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ChannelKind, GuildId, User};

    fn populated() -> ChannelListState {
        let mut state = ChannelListState::new();
        state.set_data(
            vec![(
                Guild::new(1_u64, "rustaceans"),
                vec![
                    Channel::new(10_u64, "general", ChannelKind::Text).with_guild(1_u64),
                    Channel::new(11_u64, "lounge", ChannelKind::Voice).with_guild(1_u64),
                ],
            )],
            vec![Channel::direct(20_u64, User::new(5_u64, "eve", "0", None, false))],
        );
        state
    }

    #[test]
    fn test_voice_channels_are_skipped() {
        let state = populated();
        assert_eq!(state.entries().len(), 4);
        assert!(matches!(state.entries()[2], ChannelEntry::Home));
    }

    #[test]
    fn test_home_header_switches_to_home_view() {
        let mut state = populated();
        state.handle_action(KeyAction::Down);
        state.handle_action(KeyAction::Down);
        assert!(matches!(
            state.handle_action(KeyAction::Activate),
            Some(UiCommand::Emit(AppEvent::SwitchView { view: View::Home, ref options }))
                if options.target_channel().is_none()
        ));
    }

    #[test]
    fn test_activate_emits_switch_view() {
        let mut state = populated();

        let guild = state.handle_action(KeyAction::Activate);
        assert!(matches!(
            guild,
            Some(UiCommand::Emit(AppEvent::SwitchView { view: View::Guild, ref options }))
                if options.guild == Some(GuildId(1)) && options.channel.is_none()
        ));

        state.handle_action(KeyAction::Down);
        let channel = state.handle_action(KeyAction::Activate);
        assert!(matches!(
            channel,
            Some(UiCommand::Emit(AppEvent::SwitchView { view: View::Guild, ref options }))
                if options.channel.as_ref().map(Channel::id) == Some(ChannelId(10))
        ));

        state.handle_action(KeyAction::Bottom);
        let dm = state.handle_action(KeyAction::Activate);
        assert!(matches!(
            dm,
            Some(UiCommand::Emit(AppEvent::SwitchView { view: View::Dm, ref options }))
                if options.dm.as_ref().map(Channel::id) == Some(ChannelId(20))
        ));
    }

    #[test]
    fn test_add_dm_reuses_existing_entry() {
        let mut state = populated();
        let existing = Channel::direct(20_u64, User::new(5_u64, "eve", "0", None, false));
        let _ = state.add_dm(existing);
        assert_eq!(state.entries().len(), 4);
        assert_eq!(state.list_state.selected(), Some(3));

        let fresh = Channel::direct(21_u64, User::new(6_u64, "fay", "0", None, false));
        let event = state.add_dm(fresh);
        assert_eq!(state.entries().len(), 5);
        assert!(matches!(event, AppEvent::SwitchView { view: View::Dm, .. }));
    }
}
