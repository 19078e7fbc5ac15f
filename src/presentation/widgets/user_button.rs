//! A row showing a user's avatar, name, presence and activity.

use std::cell::RefCell;
use std::rc::Rc;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use tracing::error;

use super::button_registry::ButtonRegistry;
use super::thumbnail::{ImageRequest, ImageSlot, ImageTarget, Thumbnail};
use crate::application::{Anchor, AppEvent};
use crate::domain::entities::{
    Activity, ActivityEmoji, ActivityKind, CellBox, Identity, ImageId, LoadedImage, Member,
    Presence, PresenceStatus, User,
};
use crate::infrastructure::discord::cdn;
use crate::presentation::commands::UiCommand;

/// Rows taken by one button.
pub const BUTTON_HEIGHT: u16 = 2;
/// Width of the user profile popup; member clicks open it left of the button.
pub const PROFILE_POPUP_WIDTH: u16 = 34;

/// Status emoji next to the activity line.
#[derive(Debug, Clone)]
pub enum StatusEmoji {
    Unicode(String),
    Custom { emoji: ActivityEmoji, slot: ImageSlot },
}

#[derive(Debug)]
pub struct UserButton {
    user: User,
    member: Option<Member>,
    name: String,
    avatar: ImageSlot,
    avatars_enabled: bool,
    status: PresenceStatus,
    activity: Option<String>,
    emoji: Option<StatusEmoji>,
    loaded: bool,
}

impl UserButton {
    #[must_use]
    pub fn for_user(user: User, avatars_enabled: bool) -> Self {
        Self {
            name: user.username().to_string(),
            user,
            member: None,
            avatar: ImageSlot::Empty,
            avatars_enabled,
            status: PresenceStatus::Offline,
            activity: None,
            emoji: None,
            loaded: false,
        }
    }

    #[must_use]
    pub fn for_member(member: Member, avatars_enabled: bool) -> Self {
        let mut button = Self::for_user(member.user().clone(), avatars_enabled);
        button.member = Some(member);
        button
    }

    #[must_use]
    pub fn into_shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub const fn member(&self) -> Option<&Member> {
        self.member.as_ref()
    }

    /// Primary key: the member identity for guild members, else the user.
    #[must_use]
    pub fn identity(&self) -> Identity {
        self.member
            .as_ref()
            .map_or_else(|| Identity::from(&self.user), Identity::from)
    }

    /// Every identity the button answers to.
    #[must_use]
    pub fn identities(&self) -> Vec<Identity> {
        let mut identities = vec![Identity::from(&self.user)];
        if let Some(member) = &self.member {
            identities.push(Identity::from(member));
        }
        identities
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn status(&self) -> PresenceStatus {
        self.status
    }

    /// Tooltip of the status indicator.
    #[must_use]
    pub const fn tooltip(&self) -> &'static str {
        self.status.as_str()
    }

    #[must_use]
    pub fn activity_text(&self) -> Option<&str> {
        self.activity.as_deref()
    }

    #[must_use]
    pub const fn status_emoji(&self) -> Option<&StatusEmoji> {
        self.emoji.as_ref()
    }

    #[must_use]
    pub const fn avatar(&self) -> &ImageSlot {
        &self.avatar
    }

    /// Fills in name and presence, then registers under every identity.
    /// Runs once per button.
    pub fn load(this: &Rc<RefCell<Self>>, registry: &mut ButtonRegistry) {
        let mut button = this.borrow_mut();
        if button.loaded {
            return;
        }

        button.refresh();
        let presence = registry
            .presence(button.user.id())
            .cloned()
            .unwrap_or_default();
        button.load_presence(&presence);

        for identity in button.identities() {
            registry.register(identity, this);
        }
        button.loaded = true;
    }

    /// Re-renders the name label.
    pub fn refresh(&mut self) {
        self.name = self.member.as_ref().map_or_else(
            || self.user.username().to_string(),
            |m| m.display_name().to_string(),
        );
    }

    /// Swaps in updated member data; returns whether the avatar changed.
    pub fn set_member(&mut self, member: Member) -> bool {
        let changed = self.member.as_ref().is_none_or(|old| {
            old.avatar() != member.avatar() || old.user().avatar() != member.user().avatar()
        });
        self.user = member.user().clone();
        self.member = Some(member);
        changed
    }

    /// Swaps in updated user data; returns whether the avatar changed.
    pub fn set_user(&mut self, user: User) -> bool {
        let changed = self.user.avatar() != user.avatar();
        self.user = user;
        changed
    }

    /// Drops the current avatar so the next viewport pass fetches it again.
    pub fn reset_avatar(&mut self) {
        self.avatar = ImageSlot::Empty;
    }

    pub fn set_avatars_enabled(&mut self, enabled: bool) {
        self.avatars_enabled = enabled;
        if !enabled {
            self.avatar = ImageSlot::Empty;
        }
    }

    fn avatar_url(&self) -> String {
        self.member
            .as_ref()
            .map_or_else(|| cdn::user_avatar_url(&self.user), cdn::member_avatar_url)
    }

    /// Returns the avatar to fetch, marking the slot in flight.
    ///
    /// `None` while avatars are disabled or one is already loaded or loading.
    pub fn avatar_request(&mut self) -> Option<ImageRequest> {
        if !self.avatars_enabled || !self.avatar.is_empty() {
            return None;
        }

        self.avatar = ImageSlot::Loading;
        let url = self.avatar_url();
        Some(ImageRequest {
            target: ImageTarget::Avatar(self.identity()),
            id: ImageId::from_url(&url),
            url,
            cells: CellBox::AVATAR,
        })
    }

    pub fn set_avatar(&mut self, result: Result<LoadedImage, String>) {
        match result {
            Ok(loaded) if self.avatars_enabled => self.avatar = ImageSlot::Ready(loaded.image),
            Ok(_) => self.avatar = ImageSlot::Empty,
            Err(e) => {
                self.avatar = ImageSlot::Empty;
                error!(error = %e, "Could not load avatar of user {}", self.user.tag());
            }
        }
    }

    /// Returns the custom status emoji to fetch, marking it in flight.
    pub fn emoji_request(&mut self) -> Option<ImageRequest> {
        let target = ImageTarget::StatusEmoji(self.identity());
        let Some(StatusEmoji::Custom { emoji, slot }) = &mut self.emoji else {
            return None;
        };
        if !slot.is_empty() {
            return None;
        }

        let url = cdn::emoji_url(emoji)?;
        *slot = ImageSlot::Loading;
        Some(ImageRequest {
            target,
            id: ImageId::from_url(&url),
            url,
            cells: CellBox::EMOJI,
        })
    }

    pub fn set_emoji(&mut self, result: Result<LoadedImage, String>) {
        let tag = self.user.tag();
        let Some(StatusEmoji::Custom { emoji, slot }) = &mut self.emoji else {
            return;
        };
        match result {
            Ok(loaded) => *slot = ImageSlot::Ready(loaded.image),
            Err(e) => {
                *slot = ImageSlot::Failed;
                error!(
                    error = %e,
                    "Couldn't load status emoji for user {tag}, emoji {}",
                    emoji.name
                );
            }
        }
    }

    /// Renders status, activity line and status emoji.
    pub fn load_presence(&mut self, presence: &Presence) {
        self.status = presence.status;
        self.activity = presence.primary_activity().and_then(activity_text);
        self.emoji = presence.status_emoji().map(|emoji| {
            if emoji.is_custom() {
                StatusEmoji::Custom {
                    emoji: emoji.clone(),
                    slot: ImageSlot::Empty,
                }
            } else {
                StatusEmoji::Unicode(emoji.name.clone())
            }
        });
    }

    /// Primary action: guild members open their profile, plain users their DM.
    #[must_use]
    pub fn click(&self, anchor: Anchor) -> UiCommand {
        match &self.member {
            Some(member) => UiCommand::Emit(AppEvent::OpenUserProfile {
                user_id: member.user_id(),
                guild_id: Some(member.guild_id()),
                anchor: anchor.shifted_left(PROFILE_POPUP_WIDTH),
            }),
            None => UiCommand::OpenDm(self.user.id()),
        }
    }

    #[must_use]
    pub fn context_menu(&self, anchor: Anchor) -> UiCommand {
        UiCommand::Emit(AppEvent::OpenUserMenu {
            identity: self.identity(),
            anchor,
        })
    }
}

/// Status line text for an activity; custom statuses show their state.
#[must_use]
pub fn activity_text(activity: &Activity) -> Option<String> {
    let name = &activity.name;
    match activity.kind {
        ActivityKind::Custom => activity.state.clone(),
        ActivityKind::Listening => Some(format!("Listening to {name}")),
        ActivityKind::Playing => Some(format!("Playing {name}")),
        ActivityKind::Watching => Some(format!("Watching {name}")),
        ActivityKind::Streaming => Some(format!("Streaming {name}")),
        ActivityKind::Competing => Some(format!("Competing in {name}")),
    }
}

#[must_use]
pub const fn status_color(status: PresenceStatus) -> Color {
    match status {
        PresenceStatus::Online => Color::Green,
        PresenceStatus::Idle => Color::Yellow,
        PresenceStatus::DoNotDisturb => Color::Red,
        PresenceStatus::Invisible | PresenceStatus::Offline => Color::DarkGray,
    }
}

/// Renders a [`UserButton`] into a two-row area.
pub struct UserButtonView<'a> {
    button: &'a UserButton,
    selected: bool,
}

impl<'a> UserButtonView<'a> {
    #[must_use]
    pub const fn new(button: &'a UserButton) -> Self {
        Self {
            button,
            selected: false,
        }
    }

    #[must_use]
    pub const fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    fn render_avatar(&self, area: Rect, buf: &mut Buffer) {
        if let Some(image) = self.button.avatar.image() {
            Thumbnail::new(image).render(area, buf);
        } else {
            let initial = self
                .button
                .name
                .chars()
                .next()
                .map(|c| c.to_uppercase().to_string())
                .unwrap_or_default();
            Paragraph::new(vec![Line::from(format!(" {initial}")), Line::from("")])
                .style(Style::default().bg(Color::DarkGray).fg(Color::White))
                .render(area, buf);
        }

        let dot_x = area.right().saturating_sub(1);
        let dot_y = area.bottom().saturating_sub(1);
        if let Some(cell) = buf.cell_mut((dot_x, dot_y)) {
            cell.set_symbol("●").set_fg(status_color(self.button.status));
        }
    }

    fn emoji_span(&self) -> Option<Span<'static>> {
        match self.button.emoji.as_ref()? {
            StatusEmoji::Unicode(name) => Some(Span::raw(format!("{name} "))),
            StatusEmoji::Custom { slot, .. } if slot.image().is_some() => Some(Span::raw("   ")),
            StatusEmoji::Custom { emoji, .. } => Some(Span::raw(format!(":{}: ", emoji.name))),
        }
    }
}

impl Widget for UserButtonView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let base = if self.selected {
            Style::default().bg(Color::Rgb(40, 40, 48))
        } else {
            Style::default()
        };
        buf.set_style(area, base);

        let mut text_x = area.x;
        if self.button.avatars_enabled && area.width > CellBox::AVATAR.width + 1 {
            let avatar_area = Rect::new(
                area.x,
                area.y,
                CellBox::AVATAR.width,
                area.height.min(CellBox::AVATAR.height),
            );
            self.render_avatar(avatar_area, buf);
            text_x += CellBox::AVATAR.width + 1;
        } else {
            let dot = Span::styled("● ", Style::default().fg(status_color(self.button.status)));
            buf.set_span(text_x, area.y, &dot, 2);
            text_x += 2;
        }

        let text_width = area.right().saturating_sub(text_x);
        let mut name_style = Style::default().fg(Color::White);
        if self.selected {
            name_style = name_style.add_modifier(Modifier::BOLD);
        }
        if self.button.user.is_bot() {
            let spans = Line::from(vec![
                Span::styled(self.button.name.clone(), name_style),
                Span::styled(" BOT", Style::default().fg(Color::Blue)),
            ]);
            buf.set_line(text_x, area.y, &spans, text_width);
        } else {
            buf.set_stringn(text_x, area.y, &self.button.name, text_width as usize, name_style);
        }

        if area.height < 2 || (self.button.activity.is_none() && self.button.emoji.is_none()) {
            return;
        }

        let status_y = area.y + 1;
        let mut spans = Vec::new();
        if let Some(span) = self.emoji_span() {
            spans.push(span);
        }
        if let Some(activity) = &self.button.activity {
            spans.push(Span::styled(activity.clone(), Style::default().fg(Color::Gray)));
        }
        buf.set_line(text_x, status_y, &Line::from(spans), text_width);

        if let Some(StatusEmoji::Custom { slot, .. }) = &self.button.emoji
            && let Some(image) = slot.image()
        {
            let emoji_area = Rect::new(text_x, status_y, CellBox::EMOJI.width.min(text_width), 1);
            Thumbnail::new(image).render(emoji_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{GuildId, ImageSource};
    use std::sync::Arc;
    use test_case::test_case;

    fn alice() -> User {
        User::new(7_u64, "alice", "0", Some("hash".into()), false)
    }

    fn loaded() -> LoadedImage {
        LoadedImage {
            id: ImageId::new("x"),
            image: Arc::new(image::DynamicImage::new_rgba8(4, 4)),
            source: ImageSource::Network,
        }
    }

    #[test_case(ActivityKind::Listening, "Listening to Spotify" ; "listening")]
    #[test_case(ActivityKind::Playing, "Playing Spotify" ; "playing")]
    #[test_case(ActivityKind::Watching, "Watching Spotify" ; "watching")]
    #[test_case(ActivityKind::Streaming, "Streaming Spotify" ; "streaming")]
    #[test_case(ActivityKind::Competing, "Competing in Spotify" ; "competing")]
    fn test_activity_text(kind: ActivityKind, expected: &str) {
        let activity = Activity::new(kind, "Spotify");
        assert_eq!(activity_text(&activity).as_deref(), Some(expected));
    }

    #[test]
    fn test_custom_status_shows_state() {
        let activity = Activity::new(ActivityKind::Custom, "Custom Status").with_state("brb");
        assert_eq!(activity_text(&activity).as_deref(), Some("brb"));
        assert_eq!(
            activity_text(&Activity::new(ActivityKind::Custom, "Custom Status")),
            None
        );
    }

    #[test]
    fn test_presence_without_activity_collapses_status_line() {
        let mut button = UserButton::for_user(alice(), true);
        button.load_presence(
            &Presence::new(PresenceStatus::Idle)
                .with_activity(Activity::new(ActivityKind::Playing, "Doom")),
        );
        assert_eq!(button.activity_text(), Some("Playing Doom"));

        button.load_presence(&Presence::new(PresenceStatus::DoNotDisturb));
        assert_eq!(button.activity_text(), None);
        assert_eq!(button.tooltip(), "dnd");
        assert_eq!(status_color(button.status()), Color::Red);
    }

    #[test]
    fn test_load_registers_once_under_all_identities() {
        let member = Member::new(GuildId(3), alice()).with_nick("Al");
        let button = UserButton::for_member(member, true).into_shared();
        let mut registry = ButtonRegistry::new();

        UserButton::load(&button, &mut registry);
        UserButton::load(&button, &mut registry);

        assert_eq!(button.borrow().name(), "Al");
        assert!(registry.get(Identity::User(7_u64.into())).is_some());
        assert!(
            registry
                .get(Identity::Member {
                    guild_id: GuildId(3),
                    user_id: 7_u64.into()
                })
                .is_some()
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_avatar_request_is_single_flight() {
        let mut button = UserButton::for_user(alice(), true);

        let request = button.avatar_request().unwrap();
        assert_eq!(request.url, "https://cdn.discordapp.com/avatars/7/hash.png?size=256");
        assert_eq!(request.target, ImageTarget::Avatar(Identity::User(7_u64.into())));
        assert!(button.avatar_request().is_none());

        button.set_avatar(Ok(loaded()));
        assert!(button.avatar().image().is_some());
        assert!(button.avatar_request().is_none());
    }

    #[test]
    fn test_failed_avatar_is_retried() {
        let mut button = UserButton::for_user(alice(), true);
        let _ = button.avatar_request();
        button.set_avatar(Err("timeout".into()));
        assert!(button.avatar_request().is_some());
    }

    #[test]
    fn test_disabled_avatars_request_nothing() {
        let mut button = UserButton::for_user(alice(), false);
        assert!(button.avatar_request().is_none());
    }

    #[test]
    fn test_custom_emoji_falls_back_to_name() {
        let mut button = UserButton::for_user(alice(), true);
        button.load_presence(&Presence::new(PresenceStatus::Online).with_activity(
            Activity::new(ActivityKind::Custom, "Custom Status").with_emoji(ActivityEmoji {
                id: Some("55".into()),
                name: "party".into(),
                animated: false,
            }),
        ));

        let request = button.emoji_request().unwrap();
        assert_eq!(request.cells, CellBox::EMOJI);
        button.set_emoji(Err("404".into()));

        let view = UserButtonView::new(&button);
        assert_eq!(
            view.emoji_span().map(|s| s.content.into_owned()).as_deref(),
            Some(":party: ")
        );
        assert!(button.emoji_request().is_none());
    }

    #[test]
    fn test_member_click_opens_profile_left_of_anchor() {
        let member = Member::new(GuildId(3), alice());
        let button = UserButton::for_member(member, true);

        match button.click(Anchor::new(100, 5)) {
            UiCommand::Emit(AppEvent::OpenUserProfile {
                user_id,
                guild_id,
                anchor,
            }) => {
                assert_eq!(user_id, 7_u64.into());
                assert_eq!(guild_id, Some(GuildId(3)));
                assert_eq!(anchor, Anchor::new(100 - PROFILE_POPUP_WIDTH, 5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_user_click_opens_dm() {
        let button = UserButton::for_user(alice(), true);
        assert!(matches!(
            button.click(Anchor::default()),
            UiCommand::OpenDm(id) if id == 7_u64.into()
        ));
    }

    #[test]
    fn test_context_menu_uses_member_identity() {
        let button = UserButton::for_member(Member::new(GuildId(3), alice()), true);
        assert!(matches!(
            button.context_menu(Anchor::new(1, 1)),
            UiCommand::Emit(AppEvent::OpenUserMenu {
                identity: Identity::Member { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_render_shows_name_and_activity() {
        let mut button = UserButton::for_user(alice(), false);
        button.refresh();
        button.load_presence(
            &Presence::new(PresenceStatus::Online)
                .with_activity(Activity::new(ActivityKind::Watching, "TV")),
        );

        let area = Rect::new(0, 0, 20, 2);
        let mut buf = Buffer::empty(area);
        UserButtonView::new(&button).render(area, &mut buf);

        let top: String = (0..20).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        let bottom: String = (0..20).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(top.contains("alice"));
        assert!(bottom.contains("Watching TV"));
        assert_eq!(buf[(0, 0)].fg, Color::Green);
    }
}
