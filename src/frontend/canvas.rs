//! Drawing primitives the painter needs, plus their ratatui implementation.

use crate::assets::Frame;
use crate::config::ColorConfig;
use crate::data::geometry::Bounds;
use crate::data::widget::VisualState;
use crate::error::{ViewerError, ViewerResult};
use ratatui::buffer::Buffer;
use ratatui::style::Color;

/// Upper half block: foreground paints the top pixel, background the bottom
const HALF_BLOCK: &str = "▀";

pub trait Canvas {
    /// Drawable area in absolute cells
    fn area(&self) -> Bounds;

    /// Fill a rectangle. A non-zero radius leaves the corner cells alone.
    fn draw_rect(&mut self, bounds: Bounds, color: Color, corner_radius: u16);

    /// Draw text starting at `position`, keeping the background underneath
    fn draw_text(&mut self, text: &str, position: (i32, i32), color: Color);

    /// Draw a frame scaled to fit `area`, centered, two pixels per cell
    fn draw_image(&mut self, frame: &Frame, area: Bounds);
}

/// Convert ratatui Color to hex string
pub fn color_to_hex(color: &Color) -> String {
    match color {
        Color::Rgb(r, g, b) => format!("#{:02x}{:02x}{:02x}", r, g, b),
        _ => "#ffffff".to_string(), // Default to white for non-RGB colors
    }
}

/// Convert hex string to ratatui Color
pub fn hex_to_color(hex: &str) -> Option<Color> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some(Color::Rgb(r, g, b))
}

/// Resolved widget colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub active_current: Color,
    pub current: Color,
    pub active: Color,
    pub inactive: Color,
    pub text: Color,
    pub shadow: Color,
    pub locked: Color,
    pub background: Color,
}

impl Palette {
    pub fn from_config(colors: &ColorConfig) -> ViewerResult<Self> {
        let parse = |name: &str, hex: &str| {
            hex_to_color(hex).ok_or_else(|| {
                ViewerError::invalid(format!("color '{}' has bad hex value '{}'", name, hex))
            })
        };
        Ok(Self {
            active_current: parse("active_current", &colors.active_current)?,
            current: parse("current", &colors.current)?,
            active: parse("active", &colors.active)?,
            inactive: parse("inactive", &colors.inactive)?,
            text: parse("text", &colors.text)?,
            shadow: parse("shadow", &colors.shadow)?,
            locked: parse("locked", &colors.locked)?,
            background: parse("background", &colors.background)?,
        })
    }

    pub fn body(&self, state: VisualState) -> Color {
        match state {
            VisualState::ActiveCurrent => self.active_current,
            VisualState::Current => self.current,
            VisualState::Active => self.active,
            VisualState::Inactive => self.inactive,
        }
    }
}

/// Canvas over a ratatui buffer; everything outside the buffer is clipped
pub struct BufferCanvas<'a> {
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    pub fn new(buf: &'a mut Buffer) -> Self {
        Self { buf }
    }

    fn cell_position(&self, x: i32, y: i32) -> Option<(u16, u16)> {
        let area = self.area();
        if area.contains(x, y) {
            Some((x as u16, y as u16))
        } else {
            None
        }
    }
}

impl Canvas for BufferCanvas<'_> {
    fn area(&self) -> Bounds {
        let area = self.buf.area;
        Bounds::new(
            i32::from(area.x),
            i32::from(area.y),
            i32::from(area.width),
            i32::from(area.height),
        )
    }

    fn draw_rect(&mut self, bounds: Bounds, color: Color, corner_radius: u16) {
        let rounded = corner_radius > 0 && bounds.width >= 3 && bounds.height >= 2;
        for y in bounds.y..bounds.bottom() {
            for x in bounds.x..bounds.right() {
                let corner_x = x == bounds.x || x == bounds.right() - 1;
                let corner_y = y == bounds.y || y == bounds.bottom() - 1;
                if rounded && corner_x && corner_y {
                    continue;
                }
                if let Some(pos) = self.cell_position(x, y) {
                    if let Some(cell) = self.buf.cell_mut(pos) {
                        cell.set_char(' ').set_bg(color);
                    }
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, position: (i32, i32), color: Color) {
        let (x0, y) = position;
        for (i, ch) in text.chars().enumerate() {
            if let Some(pos) = self.cell_position(x0 + i as i32, y) {
                if let Some(cell) = self.buf.cell_mut(pos) {
                    cell.set_char(ch).set_fg(color);
                }
            }
        }
    }

    fn draw_image(&mut self, frame: &Frame, area: Bounds) {
        let Some(fit) = fit_image(frame.width, frame.height, area) else {
            return;
        };
        for cy in 0..fit.cell_height {
            for cx in 0..fit.width {
                let [r, g, b] = fit.sample(frame, cx, cy * 2);
                // Odd pixel heights leave the last bottom half empty
                let bottom = if cy * 2 + 1 < fit.pixel_rows {
                    let [r, g, b] = fit.sample(frame, cx, cy * 2 + 1);
                    Color::Rgb(r, g, b)
                } else {
                    Color::Reset
                };
                let (x, y) = (fit.x + cx, area.y + fit.top_offset / 2 + cy);
                if let Some(pos) = self.cell_position(x, y) {
                    if let Some(cell) = self.buf.cell_mut(pos) {
                        cell.set_symbol(HALF_BLOCK)
                            .set_fg(Color::Rgb(r, g, b))
                            .set_bg(bottom);
                    }
                }
            }
        }
    }
}

/// Placement of an image inside a cell area where each cell holds two
/// vertically stacked pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFit {
    /// First column
    pub x: i32,
    /// Columns used
    pub width: i32,
    /// Rows used
    pub cell_height: i32,
    /// Pixel rows of the scaled image
    pub pixel_rows: i32,
    /// Pixel rows left empty above the image (kept even)
    pub top_offset: i32,
    src_width: u32,
    src_height: u32,
}

impl ImageFit {
    /// Nearest-neighbour pixel for scaled column `cx`, scaled pixel row `py`
    fn sample(&self, frame: &Frame, cx: i32, py: i32) -> [u8; 3] {
        let sx = (cx as u64 * u64::from(self.src_width) / self.width.max(1) as u64) as u32;
        let sy = (py as u64 * u64::from(self.src_height) / self.pixel_rows.max(1) as u64) as u32;
        frame.pixel(sx.min(frame.width - 1), sy.min(frame.height - 1))
    }
}

/// Largest aspect-preserving fit of a `width`x`height` image in `area`
pub fn fit_image(width: u32, height: u32, area: Bounds) -> Option<ImageFit> {
    if width == 0 || height == 0 || area.width <= 0 || area.height <= 0 {
        return None;
    }
    let avail_w = area.width as f64;
    let avail_h = (area.height * 2) as f64;
    let scale = (avail_w / width as f64).min(avail_h / height as f64);
    let scaled_w = ((width as f64 * scale).floor() as i32).clamp(1, area.width);
    let scaled_h = ((height as f64 * scale).floor() as i32).clamp(1, area.height * 2);

    let top_offset = ((area.height * 2 - scaled_h) / 2) & !1;
    Some(ImageFit {
        x: area.x + (area.width - scaled_w) / 2,
        width: scaled_w,
        cell_height: (scaled_h + 1) / 2,
        pixel_rows: scaled_h,
        top_offset,
        src_width: width,
        src_height: height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::tests::solid_frame;
    use ratatui::layout::Rect;

    #[test]
    fn test_hex_round_trip_and_rejects() {
        assert_eq!(hex_to_color("#ff8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(color_to_hex(&Color::Rgb(255, 128, 0)), "#ff8000");
        assert_eq!(hex_to_color("#fff"), None);
        assert_eq!(hex_to_color("#gg0000"), None);
    }

    #[test]
    fn test_palette_from_config() {
        let palette = Palette::from_config(&ColorConfig::default()).unwrap();
        assert_eq!(palette.body(VisualState::Inactive), Color::Rgb(0x80, 0x80, 0x80));

        let mut bad = ColorConfig::default();
        bad.locked = "orange".into();
        let err = Palette::from_config(&bad).unwrap_err();
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_rect_clips_and_rounds() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 5));
        let mut canvas = BufferCanvas::new(&mut buf);
        canvas.draw_rect(Bounds::new(-2, 1, 6, 3), Color::Red, 0);
        canvas.draw_rect(Bounds::new(5, 0, 4, 3), Color::Blue, 1);

        assert_eq!(buf[(0, 1)].bg, Color::Red);
        assert_eq!(buf[(3, 3)].bg, Color::Red);
        assert_eq!(buf[(4, 1)].bg, Color::Reset);
        // Rounded corners untouched, edges filled
        assert_eq!(buf[(5, 0)].bg, Color::Reset);
        assert_eq!(buf[(6, 0)].bg, Color::Blue);
        assert_eq!(buf[(5, 1)].bg, Color::Blue);
    }

    #[test]
    fn test_text_keeps_background() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 1));
        let mut canvas = BufferCanvas::new(&mut buf);
        canvas.draw_rect(Bounds::new(0, 0, 10, 1), Color::White, 0);
        canvas.draw_text("Play", (8, 0), Color::Black);
        assert_eq!(buf[(8, 0)].symbol(), "P");
        assert_eq!(buf[(9, 0)].symbol(), "l");
        assert_eq!(buf[(9, 0)].bg, Color::White);
        assert_eq!(buf[(9, 0)].fg, Color::Black);
    }

    #[test]
    fn test_fit_wide_image() {
        // 40x10 pixels into 20x10 cells (20x20 pixels): width bound
        let fit = fit_image(40, 10, Bounds::new(0, 0, 20, 10)).unwrap();
        assert_eq!(fit.width, 20);
        assert_eq!(fit.pixel_rows, 5);
        assert_eq!(fit.cell_height, 3);
        assert_eq!(fit.top_offset, 6);
        assert!(fit_image(0, 10, Bounds::new(0, 0, 20, 10)).is_none());
    }

    #[test]
    fn test_fit_tall_image_is_centered() {
        let fit = fit_image(10, 40, Bounds::new(4, 0, 30, 10)).unwrap();
        assert_eq!(fit.pixel_rows, 20);
        assert_eq!(fit.width, 5);
        assert_eq!(fit.x, 4 + 12);
    }

    #[test]
    fn test_draw_image_half_blocks() {
        // 4x4 pixels in 4x3 cells: two cell rows, one row of padding on top
        let mut buf = Buffer::empty(Rect::new(0, 0, 4, 3));
        let frame = solid_frame(4, 4, [200, 10, 10]);
        BufferCanvas::new(&mut buf).draw_image(&frame, Bounds::new(0, 0, 4, 3));
        assert_eq!(buf[(0, 0)].symbol(), " ");
        assert_eq!(buf[(0, 1)].symbol(), HALF_BLOCK);
        assert_eq!(buf[(3, 2)].fg, Color::Rgb(200, 10, 10));
        assert_eq!(buf[(3, 2)].bg, Color::Rgb(200, 10, 10));
    }
}
