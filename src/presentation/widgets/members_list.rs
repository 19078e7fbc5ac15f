//! Members sidebar for the channel being viewed.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::button_registry::ButtonRegistry;
use super::thumbnail::ImageTarget;
use super::user_button::{BUTTON_HEIGHT, UserButton, UserButtonView};
use super::viewport::Viewport;
use crate::application::services::Throttle;
use crate::application::{Anchor, AppEvent, View};
use crate::domain::entities::{Channel, ChannelId, Member};
use crate::infrastructure::config::UiConfig;
use crate::presentation::commands::{KeyAction, UiCommand};

pub const MEMBERS_LIST_WIDTH: u16 = 24;
/// Rows above and below the viewport whose avatars are fetched early.
pub const AVATAR_MARGIN_ROWS: usize = 2;
const AVATAR_PASS_INTERVAL: Duration = Duration::from_millis(100);

pub struct MembersListState {
    hidden_by_config: bool,
    hidden_by_view: bool,
    avatars_enabled: bool,
    channel: Option<Channel>,
    rows: Vec<Rc<RefCell<UserButton>>>,
    loading: bool,
    selected: usize,
    viewport: Viewport,
    area: Rect,
    avatar_throttle: Throttle,
    pass_deferred: bool,
    pending_images: HashSet<ImageTarget>,
    focused: bool,
}

impl MembersListState {
    #[must_use]
    pub fn new(config: &UiConfig) -> Self {
        Self {
            hidden_by_config: config.hide_members_list,
            hidden_by_view: true,
            avatars_enabled: config.enable_avatars,
            channel: None,
            rows: Vec::new(),
            loading: false,
            selected: 0,
            viewport: Viewport::default(),
            area: Rect::default(),
            avatar_throttle: Throttle::new(AVATAR_PASS_INTERVAL),
            pass_deferred: false,
            pending_images: HashSet::new(),
            focused: false,
        }
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !self.hidden_by_config && !self.hidden_by_view
    }

    #[must_use]
    pub const fn channel(&self) -> Option<&Channel> {
        self.channel.as_ref()
    }

    #[must_use]
    pub fn rows(&self) -> &[Rc<RefCell<UserButton>>] {
        &self.rows
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// True while an avatar batch is waiting for results.
    #[must_use]
    pub fn is_fetching_avatars(&self) -> bool {
        !self.pending_images.is_empty()
    }

    pub const fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn handle_app_event(
        &mut self,
        event: &AppEvent,
        registry: &mut ButtonRegistry,
    ) -> Vec<UiCommand> {
        match event {
            AppEvent::SwitchView { view, options } => match (view, &options.channel) {
                (View::Guild, Some(channel)) => {
                    let mut commands = Vec::new();
                    let is_new = self.channel.as_ref().map(Channel::id) != Some(channel.id());
                    if self.is_visible() && is_new {
                        commands.extend(self.load_list(channel.clone(), registry));
                    }
                    self.channel = Some(channel.clone());
                    commands.extend(self.set_hidden_by_view(false, registry));
                    commands
                }
                (View::Dm | View::Guild, _) => self.set_hidden_by_view(true, registry),
                (View::Home, _) => Vec::new(),
            },
            AppEvent::ConfigUpdate(config) => {
                self.set_avatars_enabled(config.enable_avatars);
                self.set_hidden_by_config(config.hide_members_list, registry)
            }
            _ => Vec::new(),
        }
    }

    pub fn set_hidden_by_view(
        &mut self,
        hidden: bool,
        registry: &mut ButtonRegistry,
    ) -> Vec<UiCommand> {
        let was_visible = self.is_visible();
        self.hidden_by_view = hidden;
        self.reload_if_shown(was_visible, registry)
    }

    pub fn set_hidden_by_config(
        &mut self,
        hidden: bool,
        registry: &mut ButtonRegistry,
    ) -> Vec<UiCommand> {
        let was_visible = self.is_visible();
        self.hidden_by_config = hidden;
        self.reload_if_shown(was_visible, registry)
    }

    fn reload_if_shown(&mut self, was_visible: bool, registry: &mut ButtonRegistry) -> Vec<UiCommand> {
        if was_visible || !self.is_visible() {
            return Vec::new();
        }
        self.channel
            .clone()
            .map(|channel| self.load_list(channel, registry))
            .unwrap_or_default()
    }

    pub fn set_avatars_enabled(&mut self, enabled: bool) {
        if self.avatars_enabled == enabled {
            return;
        }
        self.avatars_enabled = enabled;
        for row in &self.rows {
            row.borrow_mut().set_avatars_enabled(enabled);
        }
    }

    /// Clears the rows and requests the roster of `channel`.
    ///
    /// Only text and announcement channels carry a member list.
    pub fn load_list(&mut self, channel: Channel, registry: &mut ButtonRegistry) -> Vec<UiCommand> {
        if !channel.kind().supports_member_list() {
            return Vec::new();
        }

        debug!("Loading members list for #{} ({})...", channel.name(), channel.id());
        for row in self.rows.drain(..) {
            registry.deregister(&row);
        }
        self.selected = 0;
        self.viewport.offset = 0;
        self.pending_images.clear();
        self.loading = true;
        self.channel = Some(channel.clone());

        vec![UiCommand::LoadMembers(channel)]
    }

    /// Builds one button per member once the roster arrives.
    ///
    /// Rosters for a channel that is no longer current are dropped.
    pub fn on_members_loaded(&mut self, channel_id: ChannelId, result: Result<Vec<Member>, String>) {
        if self.channel.as_ref().map(Channel::id) != Some(channel_id) {
            return;
        }
        self.loading = false;

        match result {
            Ok(mut members) => {
                members.sort_by_cached_key(|m| m.display_name().to_lowercase());
                self.rows = members
                    .into_iter()
                    .map(|m| UserButton::for_member(m, self.avatars_enabled).into_shared())
                    .collect();
                debug!("Finished loading members list.");
            }
            Err(e) => warn!(channel_id = %channel_id, error = %e, "Failed to load members"),
        }
    }

    /// Loads the rows near the viewport and collects their missing images.
    ///
    /// Sends at most one batch per interval and never while a previous batch
    /// is still pending. A pass refused by the interval is remembered, see
    /// [`Self::wants_pass`].
    pub fn avatar_pass(&mut self, now: Instant, registry: &mut ButtonRegistry) -> Option<UiCommand> {
        if !self.is_visible() || self.is_fetching_avatars() {
            return None;
        }
        if !self.avatar_throttle.is_ready(now) {
            self.pass_deferred = true;
            return None;
        }
        self.pass_deferred = false;

        let height = usize::from(BUTTON_HEIGHT);
        let mut requests = Vec::new();
        for (index, row) in self.rows.iter().enumerate() {
            if !self.viewport.intersects(index * height, height, AVATAR_MARGIN_ROWS) {
                continue;
            }
            UserButton::load(row, registry);
            let mut button = row.borrow_mut();
            requests.extend(button.avatar_request());
            requests.extend(button.emoji_request());
        }

        if requests.is_empty() {
            return None;
        }
        self.avatar_throttle.record(now);
        self.pending_images = requests.iter().map(|r| r.target.clone()).collect();
        Some(UiCommand::LoadImages(requests))
    }

    /// True once a pass refused by the interval may run; the caller redraws.
    #[must_use]
    pub fn wants_pass(&self, now: Instant) -> bool {
        self.pass_deferred
            && self.is_visible()
            && !self.is_fetching_avatars()
            && self.avatar_throttle.is_ready(now)
    }

    /// Marks an image result as applied; the batch ends with its last result.
    pub fn image_done(&mut self, target: &ImageTarget) -> bool {
        self.pending_images.remove(target)
    }

    pub fn handle_action(&mut self, action: KeyAction) -> Option<UiCommand> {
        match action {
            KeyAction::Up => self.select(self.selected.saturating_sub(1)),
            KeyAction::Down => self.select(self.selected + 1),
            KeyAction::Top => self.select(0),
            KeyAction::Bottom => self.select(self.rows.len().saturating_sub(1)),
            KeyAction::PageUp => self.select(self.selected.saturating_sub(self.page_rows())),
            KeyAction::PageDown => self.select(self.selected + self.page_rows()),
            KeyAction::Activate => {
                return self
                    .rows
                    .get(self.selected)
                    .map(|row| row.borrow().click(self.selected_anchor()));
            }
            KeyAction::ContextMenu => {
                return self
                    .rows
                    .get(self.selected)
                    .map(|row| row.borrow().context_menu(self.selected_anchor()));
            }
            _ => {}
        }
        None
    }

    fn page_rows(&self) -> usize {
        (self.viewport.height / usize::from(BUTTON_HEIGHT)).max(1)
    }

    fn select(&mut self, index: usize) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = index.min(self.rows.len() - 1);
        let height = usize::from(BUTTON_HEIGHT);
        self.viewport.reveal(self.selected * height, height);
    }

    /// Screen position of the selected row, for popups.
    fn selected_anchor(&self) -> Anchor {
        let row_top = self.selected * usize::from(BUTTON_HEIGHT);
        let visible = row_top.saturating_sub(self.viewport.offset);
        let y = u16::try_from(visible).unwrap_or(u16::MAX);
        Anchor::new(self.area.x, self.area.y.saturating_add(y))
    }
}

/// Renders [`MembersListState`] as a bordered sidebar.
pub struct MembersList;

impl StatefulWidget for MembersList {
    type State = MembersListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border_style = if state.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let title = format!(" Members ({}) ", state.rows.len());
        let block = Block::default()
            .borders(Borders::LEFT | Borders::TOP)
            .border_style(border_style)
            .title(title);
        let inner = block.inner(area);
        block.render(area, buf);

        state.area = inner;
        state.viewport.height = usize::from(inner.height);
        let content = state.rows.len() * usize::from(BUTTON_HEIGHT);
        state.viewport.offset = state.viewport.offset.min(state.viewport.max_offset(content));

        if state.rows.is_empty() {
            let text = if state.loading { "Loading..." } else { "" };
            Paragraph::new(Line::from(text))
                .style(Style::default().fg(Color::DarkGray))
                .render(inner, buf);
            return;
        }

        let height = usize::from(BUTTON_HEIGHT);
        for (index, row) in state.rows.iter().enumerate() {
            let top = index * height;
            if !state.viewport.intersects(top, height, 0) {
                continue;
            }
            let Some(y) = top
                .checked_sub(state.viewport.offset)
                .and_then(|dy| u16::try_from(dy).ok())
            else {
                continue;
            };
            let rows_left = inner.height.saturating_sub(y);
            let row_area = Rect::new(inner.x, inner.y + y, inner.width, BUTTON_HEIGHT.min(rows_left));
            UserButtonView::new(&row.borrow())
                .selected(state.focused && index == state.selected)
                .render(row_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ViewOptions;
    use crate::domain::entities::{ChannelKind, GuildId, User};
    use test_case::test_case;

    fn config(hide: bool) -> UiConfig {
        UiConfig {
            hide_members_list: hide,
            ..UiConfig::default()
        }
    }

    fn text_channel(id: u64) -> Channel {
        Channel::new(id, format!("chan{id}"), ChannelKind::Text).with_guild(1_u64)
    }

    fn member(id: u64) -> Member {
        Member::new(GuildId(1), User::new(id, format!("user{id}"), "0", None, false))
    }

    fn guild_view(channel: Channel) -> AppEvent {
        AppEvent::switch_view(View::Guild, ViewOptions::channel(channel))
    }

    fn loads(commands: &[UiCommand]) -> Vec<ChannelId> {
        commands
            .iter()
            .filter_map(|c| match c {
                UiCommand::LoadMembers(channel) => Some(channel.id()),
                _ => None,
            })
            .collect()
    }

    #[test_case(false, false, true ; "shown")]
    #[test_case(true, false, false ; "hidden by config")]
    #[test_case(false, true, false ; "hidden by view")]
    #[test_case(true, true, false ; "hidden by both")]
    fn test_visibility(by_config: bool, by_view: bool, visible: bool) {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(by_config));
        let _ = state.set_hidden_by_view(by_view, &mut registry);
        assert_eq!(state.is_visible(), visible);
    }

    #[test]
    fn test_switching_to_channel_loads_once() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(false));

        let commands = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);
        assert_eq!(loads(&commands), vec![ChannelId(5)]);
        assert!(state.is_loading());

        let again = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);
        assert!(loads(&again).is_empty());
    }

    #[test]
    fn test_dm_view_hides_and_guild_view_reloads() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(false));
        let _ = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);

        let dm = Channel::direct(9_u64, User::new(2_u64, "x", "0", None, false));
        let hidden = state.handle_app_event(&AppEvent::switch_view(View::Dm, ViewOptions::dm(dm)), &mut registry);
        assert!(hidden.is_empty());
        assert!(!state.is_visible());

        let shown = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);
        assert_eq!(loads(&shown), vec![ChannelId(5)]);
    }

    #[test]
    fn test_hidden_list_remembers_channel_and_loads_when_shown() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(true));

        let commands = state.handle_app_event(&guild_view(text_channel(6)), &mut registry);
        assert!(commands.is_empty());

        let shown = state.handle_app_event(&AppEvent::ConfigUpdate(config(false)), &mut registry);
        assert_eq!(loads(&shown), vec![ChannelId(6)]);
    }

    #[test]
    fn test_voice_channel_has_no_member_list() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(false));
        let voice = Channel::new(8_u64, "talk", ChannelKind::Voice).with_guild(1_u64);
        assert!(state.load_list(voice, &mut registry).is_empty());
    }

    #[test]
    fn test_stale_roster_is_ignored() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(false));
        let _ = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);
        let _ = state.handle_app_event(&guild_view(text_channel(6)), &mut registry);

        state.on_members_loaded(ChannelId(5), Ok(vec![member(1)]));
        assert!(state.rows().is_empty());

        state.on_members_loaded(ChannelId(6), Ok(vec![member(2), member(1)]));
        assert_eq!(state.rows().len(), 2);
        assert_eq!(state.rows()[0].borrow().user().username(), "user1");
        assert!(!state.is_loading());
    }

    #[test]
    fn test_reload_deregisters_previous_members() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(false));
        let _ = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);
        state.on_members_loaded(ChannelId(5), Ok(vec![member(1)]));
        state.viewport.height = 10;
        let _ = state.avatar_pass(Instant::now(), &mut registry);
        assert!(!registry.is_empty());

        let _ = state.handle_app_event(&guild_view(text_channel(6)), &mut registry);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_avatar_pass_is_throttled_and_single_flight() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(false));
        let _ = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);
        state.on_members_loaded(ChannelId(5), Ok((1..=20).map(member).collect()));
        state.viewport.height = 4;

        let Some(UiCommand::LoadImages(batch)) = state.avatar_pass(Instant::now(), &mut registry) else {
            panic!("expected an avatar batch");
        };
        // Rows 0..6 intersect the four visible rows plus the two-row margin.
        assert_eq!(batch.len(), 3);
        assert!(state.is_fetching_avatars());

        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(state.avatar_pass(Instant::now(), &mut registry).is_none());

        for request in &batch {
            assert!(state.image_done(&request.target));
        }
        assert!(!state.is_fetching_avatars());

        state.viewport.offset = 10;
        tokio::time::advance(Duration::from_millis(50)).await;
        let next = state.avatar_pass(Instant::now(), &mut registry);
        assert!(matches!(next, Some(UiCommand::LoadImages(ref r)) if !r.is_empty()));

        state.pending_images.clear();
        state.viewport.offset = 20;
        assert!(state.avatar_pass(Instant::now(), &mut registry).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_over_empty_roster_does_not_delay_first_batch() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(false));
        let _ = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);
        state.viewport.height = 4;

        assert!(state.avatar_pass(Instant::now(), &mut registry).is_none());
        assert!(!state.wants_pass(Instant::now()));

        tokio::time::advance(Duration::from_millis(50)).await;
        state.on_members_loaded(ChannelId(5), Ok((1..=3).map(member).collect()));
        assert!(matches!(
            state.avatar_pass(Instant::now(), &mut registry),
            Some(UiCommand::LoadImages(ref r)) if r.len() == 3
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_pass_is_requested_again_after_interval() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(false));
        let _ = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);
        state.on_members_loaded(ChannelId(5), Ok((1..=20).map(member).collect()));
        state.viewport.height = 4;

        let Some(UiCommand::LoadImages(batch)) = state.avatar_pass(Instant::now(), &mut registry) else {
            panic!("expected an avatar batch");
        };
        for request in &batch {
            state.image_done(&request.target);
        }

        state.viewport.offset = 12;
        tokio::time::advance(Duration::from_millis(30)).await;
        assert!(state.avatar_pass(Instant::now(), &mut registry).is_none());
        assert!(!state.wants_pass(Instant::now()));

        tokio::time::advance(Duration::from_millis(70)).await;
        assert!(state.wants_pass(Instant::now()));
        assert!(state.avatar_pass(Instant::now(), &mut registry).is_some());
        assert!(!state.wants_pass(Instant::now()));
    }

    #[test]
    fn test_home_view_keeps_list_visibility() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(false));
        let _ = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);

        let home = AppEvent::switch_view(View::Home, ViewOptions::default());
        assert!(state.handle_app_event(&home, &mut registry).is_empty());
        assert!(state.is_visible());
    }

    #[test]
    fn test_enter_clicks_selected_member() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&config(false));
        let _ = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);
        state.on_members_loaded(ChannelId(5), Ok(vec![member(1), member(2)]));
        state.viewport.height = 10;
        state.area = Rect::new(60, 1, 24, 10);

        let _ = state.handle_action(KeyAction::Down);
        match state.handle_action(KeyAction::Activate) {
            Some(UiCommand::Emit(AppEvent::OpenUserProfile { user_id, anchor, .. })) => {
                assert_eq!(user_id, 2_u64.into());
                assert_eq!(anchor.y, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_render_lists_members() {
        let mut registry = ButtonRegistry::new();
        let mut state = MembersListState::new(&UiConfig {
            enable_avatars: false,
            ..config(false)
        });
        let _ = state.handle_app_event(&guild_view(text_channel(5)), &mut registry);
        state.on_members_loaded(ChannelId(5), Ok(vec![member(1)]));

        let area = Rect::new(0, 0, MEMBERS_LIST_WIDTH, 6);
        let mut buf = Buffer::empty(area);
        MembersList.render(area, &mut buf, &mut state);

        let row: String = (0..MEMBERS_LIST_WIDTH).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains("user1"));
        assert_eq!(state.viewport.height, 5);
    }
}
