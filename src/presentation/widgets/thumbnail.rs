//! Half-block image rendering.

use std::sync::Arc;

use image::{DynamicImage, GenericImageView, Rgba};
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use crate::domain::entities::{CellBox, Identity, ImageId, MessageId};

const UPPER_HALF: &str = "▀";

/// Widget slot an image result is routed back to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    Avatar(Identity),
    StatusEmoji(Identity),
    Attachment {
        message_id: MessageId,
        attachment_id: String,
    },
}

/// An image a widget wants fetched and scaled into `cells`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub target: ImageTarget,
    pub id: ImageId,
    pub url: String,
    pub cells: CellBox,
}

/// Load state of an image shown inside a widget.
#[derive(Debug, Clone, Default)]
pub enum ImageSlot {
    #[default]
    Empty,
    Loading,
    Ready(Arc<DynamicImage>),
    Failed,
}

impl ImageSlot {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn image(&self) -> Option<&DynamicImage> {
        match self {
            Self::Ready(image) => Some(image),
            _ => None,
        }
    }
}

/// Draws an image with one `▀` per cell: foreground is the upper pixel,
/// background the lower one.
pub struct Thumbnail<'a> {
    image: &'a DynamicImage,
}

impl<'a> Thumbnail<'a> {
    #[must_use]
    pub const fn new(image: &'a DynamicImage) -> Self {
        Self { image }
    }

    /// Cells needed to draw the whole image.
    #[must_use]
    pub fn size(&self) -> (u16, u16) {
        let (w, h) = self.image.dimensions();
        (
            u16::try_from(w).unwrap_or(u16::MAX),
            u16::try_from(h.div_ceil(2)).unwrap_or(u16::MAX),
        )
    }
}

fn to_color(pixel: Rgba<u8>) -> Color {
    let [r, g, b, a] = pixel.0;
    if a < 128 {
        Color::Reset
    } else {
        Color::Rgb(r, g, b)
    }
}

impl Widget for Thumbnail<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = self.image.height();
        let cols = area.width.min(self.size().0);
        let rows = area.height.min(self.size().1);

        for row in 0..rows {
            for col in 0..cols {
                let px = u32::from(col);
                let top_y = u32::from(row) * 2;
                let upper = to_color(self.image.get_pixel(px, top_y));
                let lower = if top_y + 1 < height {
                    to_color(self.image.get_pixel(px, top_y + 1))
                } else {
                    Color::Reset
                };

                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol(UPPER_HALF).set_fg(upper).set_bg(lower);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_renders_pixel_pairs() {
        let mut img = RgbaImage::new(1, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        let img = DynamicImage::ImageRgba8(img);

        let area = Rect::new(0, 0, 3, 3);
        let mut buf = Buffer::empty(area);
        Thumbnail::new(&img).render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), UPPER_HALF);
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
        assert_eq!(buf[(1, 0)].symbol(), " ");
    }

    #[test]
    fn test_odd_height_leaves_lower_half_blank() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 3, Rgba([9, 9, 9, 255])));
        let thumb = Thumbnail::new(&img);
        assert_eq!(thumb.size(), (2, 2));

        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        thumb.render(area, &mut buf);
        assert_eq!(buf[(0, 1)].bg, Color::Reset);
    }

    #[test]
    fn test_clipped_to_area() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255])));
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        Thumbnail::new(&img).render(area, &mut buf);
        assert_eq!(buf[(1, 0)].fg, Color::Rgb(1, 2, 3));
    }
}
