//! Main screen: channel switcher, message panel and members sidebar.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    widgets::{StatefulWidget, Widget},
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::application::AppEvent;
use crate::domain::entities::{Channel, ChannelId, Guild, LoadedImage, Member, User};
use crate::domain::ports::ClientEvent;
use crate::infrastructure::config::UiConfig;
use crate::presentation::commands::{CommandRegistry, KeyAction, UiCommand};
use crate::presentation::widgets::{
    ButtonRegistry, CHANNEL_LIST_WIDTH, ChannelList, ChannelListState, FocusContext, FooterBar,
    HistoryOutcome, ImageTarget, MEMBERS_LIST_WIDTH, MembersList, MembersListState, MessagePanel,
    MessagePanelState, Popup, PopupOutcome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Channels,
    Messages,
    Members,
}

/// Owns every widget state; the application loop feeds it events and
/// carries out the commands it returns.
pub struct MainScreen {
    user: Option<User>,
    commands: CommandRegistry,
    registry: ButtonRegistry,
    channels: ChannelListState,
    panel: MessagePanelState,
    members: MembersListState,
    popup: Option<Popup>,
    focus: Focus,
}

impl MainScreen {
    #[must_use]
    pub fn new(config: &UiConfig) -> Self {
        let mut screen = Self {
            user: None,
            commands: CommandRegistry::new(),
            registry: ButtonRegistry::new(),
            channels: ChannelListState::new(),
            panel: MessagePanelState::new(config),
            members: MembersListState::new(config),
            popup: None,
            focus: Focus::Channels,
        };
        screen.apply_focus();
        screen
    }

    #[must_use]
    pub const fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn focus(&self) -> Focus {
        self.focus
    }

    #[must_use]
    pub const fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    #[must_use]
    pub const fn members(&self) -> &MembersListState {
        &self.members
    }

    #[must_use]
    pub const fn panel(&self) -> &MessagePanelState {
        &self.panel
    }

    /// Delivers an application event to every widget, panel first.
    pub fn handle_app_event(&mut self, event: &AppEvent, now: Instant) -> Vec<UiCommand> {
        let mut commands = Vec::new();
        if let AppEvent::NewClient { user } = event {
            self.user = Some(user.clone());
        }

        self.channels.handle_app_event(event);
        commands.extend(self.panel.handle_app_event(event, now));
        commands.extend(self.members.handle_app_event(event, &mut self.registry));
        if let Some(popup) = Popup::from_event(event, &self.registry) {
            self.popup = Some(popup);
        }
        if matches!(event, AppEvent::SwitchView { .. }) {
            self.popup = None;
        }
        self.apply_focus();
        commands
    }

    /// Handles a key action not claimed by the application loop.
    pub fn handle_action(&mut self, action: KeyAction) -> Vec<UiCommand> {
        if let Some(popup) = &mut self.popup {
            return match popup.handle_action(action) {
                PopupOutcome::Keep => Vec::new(),
                PopupOutcome::Close => {
                    self.popup = None;
                    Vec::new()
                }
                PopupOutcome::Run(command) => {
                    self.popup = None;
                    vec![command]
                }
            };
        }

        match action {
            KeyAction::FocusNext => self.cycle_focus(true),
            KeyAction::FocusPrevious => self.cycle_focus(false),
            _ => {
                return match self.focus {
                    Focus::Channels => self.channels.handle_action(action).into_iter().collect(),
                    Focus::Messages => {
                        self.panel.handle_action(action);
                        Vec::new()
                    }
                    Focus::Members => self.members.handle_action(action).into_iter().collect(),
                };
            }
        }
        Vec::new()
    }

    fn cycle_focus(&mut self, forward: bool) {
        let mut order = vec![Focus::Channels, Focus::Messages];
        if self.members.is_visible() {
            order.push(Focus::Members);
        }
        let current = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % order.len()
        } else {
            (current + order.len() - 1) % order.len()
        };
        self.focus = order[next];
        self.apply_focus();
    }

    fn apply_focus(&mut self) {
        if self.focus == Focus::Members && !self.members.is_visible() {
            self.focus = Focus::Messages;
        }
        self.channels.set_focused(self.focus == Focus::Channels);
        self.panel.set_focused(self.focus == Focus::Messages);
        self.members.set_focused(self.focus == Focus::Members);
    }

    /// Routes a live chat event; returns true when a redraw is due.
    pub fn handle_client_event(&mut self, event: ClientEvent) -> bool {
        if let ClientEvent::MessageCreate { message } = event {
            self.panel.on_message(message);
            return true;
        }
        self.registry.apply_client_event(&event)
    }

    pub fn on_data_loaded(&mut self, guilds: Vec<(Guild, Vec<Channel>)>, dms: Vec<Channel>) {
        self.channels.set_data(guilds, dms);
    }

    pub fn on_history_loaded(&mut self, token: &CancellationToken, outcome: HistoryOutcome) {
        self.panel.on_history_loaded(token, outcome);
    }

    pub fn on_older_loaded(
        &mut self,
        channel_id: ChannelId,
        token: &CancellationToken,
        outcome: HistoryOutcome,
    ) {
        self.panel.on_older_loaded(channel_id, token, outcome);
    }

    pub fn on_members_loaded(&mut self, channel_id: ChannelId, result: Result<Vec<Member>, String>) {
        self.members.on_members_loaded(channel_id, result);
    }

    /// Opened DMs are listed and switched to.
    pub fn on_dm_opened(&mut self, channel: Channel) -> AppEvent {
        self.channels.add_dm(channel)
    }

    pub fn on_image_loaded(&mut self, target: &ImageTarget, result: Result<LoadedImage, String>) {
        match target {
            ImageTarget::Attachment { .. } => {
                self.panel.apply_image(target, result);
            }
            ImageTarget::Avatar(_) | ImageTarget::StatusEmoji(_) => {
                self.registry.apply_image(target, result);
                self.members.image_done(target);
            }
        }
    }

    /// Work scheduled after each draw: viewport image passes and backfill.
    pub fn after_draw(&mut self, now: Instant) -> Vec<UiCommand> {
        let mut commands = self.panel.viewport_pass();
        commands.extend(self.members.avatar_pass(now, &mut self.registry));
        commands
    }

    pub fn on_tick(&mut self, now: Instant) -> Option<UiCommand> {
        self.panel.on_tick(now)
    }

    /// A draw is due so that a throttled avatar pass can run.
    #[must_use]
    pub fn has_deferred_pass(&self, now: Instant) -> bool {
        self.members.wants_pass(now)
    }

    pub fn sweep(&mut self) -> usize {
        self.registry.sweep()
    }

    fn focus_context(&self) -> FocusContext {
        if self.popup.is_some() {
            return FocusContext::Popup;
        }
        match self.focus {
            Focus::Channels => FocusContext::Channels,
            Focus::Messages => FocusContext::Messages,
            Focus::Members => FocusContext::Members,
        }
    }

    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let [content_area, footer_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

        let members_width = if self.members.is_visible() {
            MEMBERS_LIST_WIDTH
        } else {
            0
        };
        let [channels_area, panel_area, members_area] = Layout::horizontal([
            Constraint::Length(CHANNEL_LIST_WIDTH),
            Constraint::Fill(1),
            Constraint::Length(members_width),
        ])
        .areas(content_area);

        ChannelList::new(&self.registry).render(channels_area, buf, &mut self.channels);
        MessagePanel.render(panel_area, buf, &mut self.panel);
        if self.members.is_visible() {
            MembersList.render(members_area, buf, &mut self.members);
        }

        let user = self.user.as_ref().map(User::tag);
        FooterBar::new(&self.commands, self.focus_context())
            .right_info(user.as_deref())
            .render(footer_area, buf);

        if let Some(popup) = &self.popup {
            popup.render(content_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{Anchor, View, ViewOptions};
    use crate::domain::entities::{ChannelKind, GuildId, Identity};

    fn screen() -> MainScreen {
        MainScreen::new(&UiConfig::default())
    }

    fn text_channel() -> Channel {
        Channel::new(5_u64, "general", ChannelKind::Text).with_guild(1_u64)
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_view_loads_history_and_members() {
        let mut screen = screen();
        let commands = screen.handle_app_event(
            &AppEvent::switch_view(View::Guild, ViewOptions::channel(text_channel())),
            Instant::now(),
        );

        assert!(matches!(commands.as_slice(), [UiCommand::LoadHistory { .. }, UiCommand::LoadMembers(_)]));
    }

    #[test]
    fn test_focus_skips_hidden_members_list() {
        let mut screen = screen();
        assert!(!screen.members().is_visible());

        screen.handle_action(KeyAction::FocusNext);
        assert_eq!(screen.focus(), Focus::Messages);
        screen.handle_action(KeyAction::FocusNext);
        assert_eq!(screen.focus(), Focus::Channels);
        screen.handle_action(KeyAction::FocusPrevious);
        assert_eq!(screen.focus(), Focus::Messages);
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_menu_captures_keys_until_closed() {
        let mut screen = screen();
        let identity = Identity::Member {
            guild_id: GuildId(1),
            user_id: 4_u64.into(),
        };
        let _ = screen.handle_app_event(
            &AppEvent::OpenUserMenu {
                identity,
                anchor: Anchor::new(10, 10),
            },
            Instant::now(),
        );
        assert!(screen.popup().is_some());

        assert!(screen.handle_action(KeyAction::FocusNext).is_empty());
        assert_eq!(screen.focus(), Focus::Channels);

        let commands = screen.handle_action(KeyAction::Cancel);
        assert!(commands.is_empty());
        assert!(screen.popup().is_none());
    }

    #[test]
    fn test_new_client_sets_user() {
        let mut screen = screen();
        let user = User::new(1_u64, "me", "0", None, false);
        let _ = screen.handle_app_event(&AppEvent::NewClient { user }, Instant::now());
        assert_eq!(screen.user().map(User::tag).as_deref(), Some("me"));
    }

    #[test]
    fn test_render_draws_footer() {
        let mut screen = screen();
        let area = Rect::new(0, 0, 100, 20);
        let mut buf = Buffer::empty(area);
        screen.render(area, &mut buf);

        let footer: String = (0..100).map(|x| buf[(x, 19)].symbol().to_string()).collect();
        assert!(footer.contains("CHANNELS"));
    }
}
