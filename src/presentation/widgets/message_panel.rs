//! Scrollable channel history with lazy backfill.
//!
//! The panel shows one channel at a time. Switching is debounced: a switch
//! arriving while the previous load runs, or within [`SWITCH_WINDOW`] of it,
//! is parked and applied on a later tick. Every switch cancels the previous
//! [`CancellationToken`], so results of superseded loads are discarded.
//!
//! After each draw [`MessagePanelState::viewport_pass`] requests attachment
//! previews near the viewport and, once the user scrolls close to the top,
//! the page of messages preceding the oldest row.

use std::collections::HashSet;
use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use unicode_width::UnicodeWidthChar;

use super::thumbnail::{ImageRequest, ImageSlot, ImageTarget, Thumbnail};
use super::viewport::Viewport;
use crate::application::services::RateWindow;
use crate::application::{AppEvent, View};
use crate::domain::entities::{Attachment, CellBox, Channel, ChannelId, ImageId, LoadedImage, Message};
use crate::infrastructure::config::UiConfig;
use crate::infrastructure::discord::cdn;
use crate::presentation::commands::{KeyAction, UiCommand};

/// Messages requested when a channel is opened.
pub const INITIAL_HISTORY: u8 = 30;
/// Minimum spacing between two channel loads.
pub const SWITCH_WINDOW: Duration = Duration::from_secs(1);
/// Backfill starts when the viewport is this close to the top.
const BACKFILL_TRIGGER_ROWS: usize = 2;
const IMAGE_MARGIN_ROWS: usize = 2;

/// Result of a history request, as reported by the backend.
#[derive(Debug, Clone)]
pub enum HistoryOutcome {
    Loaded(Vec<Message>),
    Cancelled,
    Failed(String),
}

#[derive(Debug)]
struct AttachmentView {
    attachment: Attachment,
    slot: ImageSlot,
}

impl AttachmentView {
    fn height(&self) -> usize {
        if self.attachment.is_image() {
            usize::from(CellBox::ATTACHMENT.height)
        } else {
            1
        }
    }
}

#[derive(Debug)]
struct MessageRow {
    message: Message,
    attachments: Vec<AttachmentView>,
}

impl MessageRow {
    fn new(message: Message) -> Self {
        let attachments = message
            .attachments()
            .iter()
            .cloned()
            .map(|attachment| AttachmentView {
                attachment,
                slot: ImageSlot::Empty,
            })
            .collect();
        Self {
            message,
            attachments,
        }
    }

    fn height(&self, width: u16) -> usize {
        1 + wrap_text(self.message.content(), width).len()
            + self.attachments.iter().map(AttachmentView::height).sum::<usize>()
    }

    fn image_requests(&mut self) -> Vec<ImageRequest> {
        let message_id = self.message.id();
        self.attachments
            .iter_mut()
            .filter(|view| view.attachment.is_image() && view.slot.is_empty())
            .map(|view| {
                view.slot = ImageSlot::Loading;
                let url = cdn::attachment_preview_url(&view.attachment);
                ImageRequest {
                    target: ImageTarget::Attachment {
                        message_id,
                        attachment_id: view.attachment.id().to_string(),
                    },
                    id: ImageId::from_url(&url),
                    url,
                    cells: CellBox::ATTACHMENT,
                }
            })
            .collect()
    }
}

pub struct MessagePanelState {
    channel: Option<Channel>,
    rows: Vec<MessageRow>,
    token: CancellationToken,
    switch_window: RateWindow,
    pending_switch: Option<Channel>,
    loading: bool,
    loading_older: bool,
    history_exhausted: bool,
    images_only_pass: bool,
    pending_images: HashSet<ImageTarget>,
    viewport: Viewport,
    width: u16,
    follow_tail: bool,
    timestamp_format: String,
    focused: bool,
}

impl MessagePanelState {
    #[must_use]
    pub fn new(config: &UiConfig) -> Self {
        Self {
            channel: None,
            rows: Vec::new(),
            token: CancellationToken::new(),
            switch_window: RateWindow::new(SWITCH_WINDOW),
            pending_switch: None,
            loading: false,
            loading_older: false,
            history_exhausted: false,
            images_only_pass: false,
            pending_images: HashSet::new(),
            viewport: Viewport::default(),
            width: 0,
            follow_tail: true,
            timestamp_format: config.timestamp_format.clone(),
            focused: false,
        }
    }

    #[must_use]
    pub const fn channel(&self) -> Option<&Channel> {
        self.channel.as_ref()
    }

    #[must_use]
    pub const fn pending_switch(&self) -> Option<&Channel> {
        self.pending_switch.as_ref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn is_history_exhausted(&self) -> bool {
        self.history_exhausted
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.rows.len()
    }

    pub const fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn handle_app_event(&mut self, event: &AppEvent, now: Instant) -> Option<UiCommand> {
        match event {
            AppEvent::SwitchView {
                view: View::Dm | View::Guild,
                options,
            } => {
                let channel = options.target_channel()?.clone();
                self.token.cancel();
                self.token = CancellationToken::new();
                self.open_channel(channel, now)
            }
            AppEvent::ConfigUpdate(config) => {
                self.timestamp_format.clone_from(&config.timestamp_format);
                None
            }
            _ => None,
        }
    }

    /// Starts loading `channel`, or parks it when a load is running or
    /// the switch window is still open.
    pub fn open_channel(&mut self, channel: Channel, now: Instant) -> Option<UiCommand> {
        if self.switch_window.is_active(now) || self.loading {
            debug!(channel_id = %channel.id(), "Deferring channel switch");
            self.pending_switch = Some(channel);
            return None;
        }
        self.pending_switch = None;
        if self.channel.as_ref().is_some_and(|c| c.id() == channel.id()) {
            return None;
        }

        self.loading = true;
        self.switch_window.trigger(now);
        self.rows.clear();
        self.pending_images.clear();
        self.viewport.offset = 0;
        self.history_exhausted = false;
        self.follow_tail = true;
        self.channel = Some(channel.clone());

        Some(UiCommand::LoadHistory {
            channel,
            token: self.token.clone(),
        })
    }

    /// Applies a parked switch once nothing blocks it.
    pub fn on_tick(&mut self, now: Instant) -> Option<UiCommand> {
        if self.pending_switch.is_none() || self.switch_window.is_active(now) || self.loading {
            return None;
        }
        let channel = self.pending_switch.take()?;
        self.open_channel(channel, now)
    }

    /// Shows a loaded page merged with any live messages that arrived while
    /// it was in flight.
    pub fn on_history_loaded(&mut self, token: &CancellationToken, outcome: HistoryOutcome) {
        self.loading = false;
        let live = std::mem::take(&mut self.rows);

        // Without rows the channel is forgotten, so switching back reloads it.
        let mut messages = match outcome {
            _ if token.is_cancelled() => {
                self.channel = None;
                return;
            }
            HistoryOutcome::Loaded(messages) => messages,
            HistoryOutcome::Cancelled => {
                self.channel = None;
                return;
            }
            HistoryOutcome::Failed(e) => {
                warn!(error = %e, "Failed to load channel history");
                self.channel = None;
                return;
            }
        };

        messages.extend(live.into_iter().map(|row| row.message));
        messages.sort_by_key(Message::id);
        messages.dedup_by_key(|m| m.id());
        self.rows = messages.into_iter().map(MessageRow::new).collect();
        self.follow_tail = true;
        self.scroll_to_bottom();
        self.images_only_pass = true;
    }

    /// Appends a live message for the displayed channel. During a history
    /// load it is held until the page arrives.
    pub fn on_message(&mut self, message: Message) {
        if self.channel.as_ref().map(Channel::id) != Some(message.channel_id()) {
            return;
        }
        if self.rows.iter().any(|row| row.message.id() == message.id()) {
            return;
        }
        self.rows.push(MessageRow::new(message));
        if self.follow_tail {
            self.scroll_to_bottom();
        }
    }

    /// Requests previews near the viewport and, near the top, older history.
    ///
    /// Does nothing while a history load, backfill or image batch is pending.
    pub fn viewport_pass(&mut self) -> Vec<UiCommand> {
        if self.loading || self.loading_older || !self.pending_images.is_empty() {
            return Vec::new();
        }
        let images_only = std::mem::take(&mut self.images_only_pass);

        let mut commands = Vec::new();
        let mut requests = Vec::new();
        let mut top = 0;
        for row in &mut self.rows {
            let height = row.height(self.width);
            if self.viewport.intersects(top, height, IMAGE_MARGIN_ROWS) {
                requests.extend(row.image_requests());
            }
            top += height;
        }
        if !requests.is_empty() {
            self.pending_images = requests.iter().map(|r| r.target.clone()).collect();
            commands.push(UiCommand::LoadImages(requests));
        }

        if !images_only
            && !self.history_exhausted
            && self.viewport.offset <= BACKFILL_TRIGGER_ROWS
            && let Some(channel) = &self.channel
            && let Some(oldest) = self.rows.first()
        {
            self.loading_older = true;
            commands.push(UiCommand::LoadOlder {
                channel_id: channel.id(),
                before: oldest.message.id(),
                token: self.token.clone(),
            });
        }

        commands
    }

    /// Inserts a backfilled page above the current rows, keeping the
    /// visible rows where they were.
    pub fn on_older_loaded(
        &mut self,
        channel_id: ChannelId,
        token: &CancellationToken,
        outcome: HistoryOutcome,
    ) {
        self.loading_older = false;
        if token.is_cancelled() || self.channel.as_ref().map(Channel::id) != Some(channel_id) {
            return;
        }

        let mut messages = match outcome {
            HistoryOutcome::Loaded(messages) => messages,
            HistoryOutcome::Cancelled => return,
            HistoryOutcome::Failed(e) => {
                warn!(channel_id = %channel_id, error = %e, "Failed to load older messages");
                return;
            }
        };

        if let Some(oldest) = self.rows.first().map(|row| row.message.id()) {
            messages.retain(|m| m.id() < oldest);
        }
        if messages.is_empty() {
            debug!(channel_id = %channel_id, "Reached the start of the channel history");
            self.history_exhausted = true;
            return;
        }

        messages.sort_by_key(Message::id);
        let older: Vec<MessageRow> = messages.into_iter().map(MessageRow::new).collect();
        let inserted: usize = older.iter().map(|row| row.height(self.width)).sum();
        self.rows.splice(0..0, older);
        self.viewport.offset += inserted;
    }

    pub fn apply_image(&mut self, target: &ImageTarget, result: Result<LoadedImage, String>) -> bool {
        let ImageTarget::Attachment {
            message_id,
            attachment_id,
        } = target
        else {
            return false;
        };
        self.pending_images.remove(target);

        let Some(view) = self
            .rows
            .iter_mut()
            .find(|row| row.message.id() == *message_id)
            .and_then(|row| {
                row.attachments
                    .iter_mut()
                    .find(|view| view.attachment.id() == attachment_id.as_str())
            })
        else {
            return false;
        };

        match result {
            Ok(loaded) => view.slot = ImageSlot::Ready(loaded.image),
            Err(e) => {
                error!(error = %e, "Could not load attachment {}", view.attachment.filename());
                view.slot = ImageSlot::Failed;
            }
        }
        true
    }

    pub fn handle_action(&mut self, action: KeyAction) {
        let content = self.content_height();
        let page = isize::try_from(self.viewport.height.max(1)).unwrap_or(isize::MAX);
        match action {
            KeyAction::Up => self.viewport.scroll_by(-1, content),
            KeyAction::Down => self.viewport.scroll_by(1, content),
            KeyAction::PageUp => self.viewport.scroll_by(-page, content),
            KeyAction::PageDown => self.viewport.scroll_by(page, content),
            KeyAction::Top => self.viewport.offset = 0,
            KeyAction::Bottom => self.viewport.scroll_to_bottom(content),
            _ => return,
        }
        self.follow_tail = self.viewport.is_at_bottom(content);
    }

    fn content_height(&self) -> usize {
        self.rows.iter().map(|row| row.height(self.width)).sum()
    }

    fn scroll_to_bottom(&mut self) {
        let content = self.content_height();
        self.viewport.scroll_to_bottom(content);
    }
}

/// Splits text into lines no wider than `width` cells.
fn wrap_text(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    let mut lines = Vec::new();
    for source in text.lines() {
        let mut line = String::new();
        let mut used = 0;
        for c in source.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(c);
            used += w;
        }
        lines.push(line);
    }
    lines
}

fn render_row(row: &MessageRow, width: u16, timestamp_format: &str) -> Buffer {
    let height = u16::try_from(row.height(width)).unwrap_or(u16::MAX);
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);

    let message = &row.message;
    let mut header = vec![
        Span::styled(
            message.author().display_name(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            message.formatted_timestamp(timestamp_format),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if message.is_edited() {
        header.push(Span::styled(" (edited)", Style::default().fg(Color::DarkGray)));
    }
    buf.set_line(0, 0, &Line::from(header), width);

    let mut y = 1;
    for line in wrap_text(message.content(), width) {
        buf.set_stringn(0, y, &line, usize::from(width), Style::default());
        y += 1;
    }

    for view in &row.attachments {
        let name = view.attachment.filename();
        if !view.attachment.is_image() {
            buf.set_stringn(0, y, format!("📎 {name}"), usize::from(width), Style::default().fg(Color::Blue));
            y += 1;
            continue;
        }

        let box_height = CellBox::ATTACHMENT.height;
        match view.slot.image() {
            Some(image) => {
                let box_area = Rect::new(0, y, CellBox::ATTACHMENT.width.min(width), box_height);
                Thumbnail::new(image).render(box_area, &mut buf);
            }
            None => {
                let status = if matches!(view.slot, ImageSlot::Failed) {
                    "unavailable"
                } else {
                    "loading"
                };
                Paragraph::new(Line::from(format!("[{name}: {status}]")))
                    .style(Style::default().fg(Color::DarkGray))
                    .render(Rect::new(0, y, width, 1), &mut buf);
            }
        }
        y += box_height;
    }

    buf
}

/// Renders [`MessagePanelState`] inside a titled block.
pub struct MessagePanel;

impl StatefulWidget for MessagePanel {
    type State = MessagePanelState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border_style = if state.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let title = state
            .channel
            .as_ref()
            .map_or_else(String::new, |c| format!(" {} ", c.display_name()));
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(border_style)
            .title(title);
        let inner = block.inner(area);
        block.render(area, buf);

        state.width = inner.width;
        state.viewport.height = usize::from(inner.height);
        let content = state.content_height();
        if state.follow_tail {
            state.viewport.scroll_to_bottom(content);
        } else {
            state.viewport.offset = state.viewport.offset.min(state.viewport.max_offset(content));
        }

        if state.rows.is_empty() {
            let text = if state.loading {
                "Loading messages..."
            } else if state.channel.is_some() {
                "No messages yet."
            } else {
                "Select a channel."
            };
            Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .render(inner, buf);
            return;
        }

        let mut top = 0;
        for row in &state.rows {
            let height = row.height(inner.width);
            if state.viewport.intersects(top, height, 0) {
                let scratch = render_row(row, inner.width, &state.timestamp_format);
                for line in 0..height {
                    let Some(screen_y) = (top + line)
                        .checked_sub(state.viewport.offset)
                        .filter(|y| *y < state.viewport.height)
                        .and_then(|y| u16::try_from(y).ok())
                    else {
                        continue;
                    };
                    let Ok(line) = u16::try_from(line) else {
                        break;
                    };
                    for x in 0..inner.width {
                        buf[(inner.x + x, inner.y + screen_y)] = scratch[(x, line)].clone();
                    }
                }
            }
            top += height;
            if top >= state.viewport.offset + state.viewport.height {
                break;
            }
        }
    }
}
