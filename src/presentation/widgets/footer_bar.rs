use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::presentation::commands::{CommandRegistry, KeyAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusContext {
    #[default]
    Channels,
    Messages,
    Members,
    Popup,
}

impl FocusContext {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Channels => "CHANNELS",
            Self::Messages => "MESSAGES",
            Self::Members => "MEMBERS",
            Self::Popup => "POPUP",
        }
    }

    /// Actions worth advertising while this pane has focus.
    #[must_use]
    pub const fn hints(self) -> &'static [KeyAction] {
        match self {
            Self::Channels => &[
                KeyAction::Activate,
                KeyAction::FocusNext,
                KeyAction::ToggleMembersList,
                KeyAction::ToggleAvatars,
                KeyAction::Quit,
            ],
            Self::Messages => &[
                KeyAction::PageUp,
                KeyAction::Bottom,
                KeyAction::FocusNext,
                KeyAction::ToggleMembersList,
                KeyAction::Quit,
            ],
            Self::Members => &[
                KeyAction::Activate,
                KeyAction::ContextMenu,
                KeyAction::FocusNext,
                KeyAction::ToggleAvatars,
                KeyAction::Quit,
            ],
            Self::Popup => &[KeyAction::Activate, KeyAction::Cancel],
        }
    }
}

pub struct FooterBarStyle {
    pub background: Style,
    pub label_style: Style,
    pub key_style: Style,
    pub info: Style,
    pub focus_indicator: Style,
}

impl Default for FooterBarStyle {
    fn default() -> Self {
        Self {
            background: Style::default(),
            label_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            key_style: Style::default().fg(Color::White).bg(Color::DarkGray),
            info: Style::default().fg(Color::DarkGray),
            focus_indicator: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        }
    }
}

pub struct FooterBar<'a> {
    commands: &'a CommandRegistry,
    focus_context: FocusContext,
    right_info: Option<&'a str>,
    style: FooterBarStyle,
}

impl<'a> FooterBar<'a> {
    #[must_use]
    pub fn new(commands: &'a CommandRegistry, focus_context: FocusContext) -> Self {
        Self {
            commands,
            focus_context,
            right_info: None,
            style: FooterBarStyle::default(),
        }
    }

    #[must_use]
    pub const fn right_info(mut self, info: Option<&'a str>) -> Self {
        self.right_info = info;
        self
    }

    fn build_left_spans(&self) -> Vec<Span<'static>> {
        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.focus_context.display_name()),
                self.style.focus_indicator,
            ),
            Span::raw(" "),
        ];

        let bound = self
            .focus_context
            .hints()
            .iter()
            .filter_map(|action| self.commands.key_label(*action).map(|key| (action, key)));
        for (i, (action, key)) in bound.enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(format!(" {} ", action.label()), self.style.label_style));
            spans.push(Span::styled(format!(" {key} "), self.style.key_style));
        }

        spans
    }
}

impl Widget for FooterBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_char(' ').set_style(self.style.background);
        }

        let right_width = self
            .right_info
            .map_or(0, |s| u16::try_from(s.width()).unwrap_or(u16::MAX));
        let left_width = area.width.saturating_sub(right_width.saturating_add(1));
        Paragraph::new(Line::from(self.build_left_spans()))
            .render(Rect::new(area.x, area.y, left_width, 1), buf);

        if let Some(info) = self.right_info
            && right_width < area.width
        {
            let right_x = area.right().saturating_sub(right_width);
            Paragraph::new(Span::styled(info, self.style.info))
                .render(Rect::new(right_x, area.y, right_width, 1), buf);
        }
    }
}
