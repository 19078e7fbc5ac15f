/// Vertical scroll window over a list of fixed-position rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// First visible row.
    pub offset: usize,
    /// Visible rows.
    pub height: usize,
}

impl Viewport {
    #[must_use]
    pub const fn new(offset: usize, height: usize) -> Self {
        Self { offset, height }
    }

    /// Whether rows `[top, top + len)` touch the viewport widened by `margin`.
    #[must_use]
    pub const fn intersects(&self, top: usize, len: usize, margin: usize) -> bool {
        let start = self.offset.saturating_sub(margin);
        let end = self.offset + self.height + margin;
        top < end && top + len > start
    }

    /// Largest offset that still fills the viewport.
    #[must_use]
    pub const fn max_offset(&self, content: usize) -> usize {
        content.saturating_sub(self.height)
    }

    pub fn scroll_by(&mut self, delta: isize, content: usize) {
        let max = self.max_offset(content);
        self.offset = self.offset.saturating_add_signed(delta).min(max);
    }

    pub const fn scroll_to_bottom(&mut self, content: usize) {
        self.offset = self.max_offset(content);
    }

    #[must_use]
    pub const fn is_at_bottom(&self, content: usize) -> bool {
        self.offset >= self.max_offset(content)
    }

    /// Moves the window the minimum distance needed to show `[top, top + len)`.
    pub const fn reveal(&mut self, top: usize, len: usize) {
        if top < self.offset {
            self.offset = top;
        } else if top + len > self.offset + self.height {
            self.offset = (top + len).saturating_sub(self.height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, 2, true ; "row above within margin")]
    #[test_case(4, 2, true ; "row inside")]
    #[test_case(15, 2, true ; "row below within margin")]
    #[test_case(17, 2, false ; "row far below")]
    #[test_case(0, 1, false ; "row far above")]
    fn test_intersects(top: usize, len: usize, expected: bool) {
        let viewport = Viewport::new(4, 10);
        assert_eq!(viewport.intersects(top, len, 2), expected);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut viewport = Viewport::new(0, 10);
        viewport.scroll_by(-3, 30);
        assert_eq!(viewport.offset, 0);
        viewport.scroll_by(100, 30);
        assert_eq!(viewport.offset, 20);
        assert!(viewport.is_at_bottom(30));
    }

    #[test]
    fn test_reveal_moves_minimally() {
        let mut viewport = Viewport::new(10, 4);
        viewport.reveal(15, 2);
        assert_eq!(viewport.offset, 13);
        viewport.reveal(2, 2);
        assert_eq!(viewport.offset, 2);
    }
}
