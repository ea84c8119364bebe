// SPDX-License-Identifier: GPL-3.0-only

//! Half-block terminal rendering of a texture
//!
//! Each terminal cell shows two vertical pixels: the upper one as the `▀`
//! foreground and the lower one as the background.

use super::texture::ImageTexture;
use image::imageops;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, style::Style, widgets::Widget};

/// Draws the current texture, letterboxed to keep its aspect ratio
pub struct FrameWidget<'a> {
    texture: &'a ImageTexture,
    placeholder: &'a str,
}

impl<'a> FrameWidget<'a> {
    pub fn new(texture: &'a ImageTexture) -> Self {
        Self {
            texture,
            placeholder: "Waiting for video...",
        }
    }

    /// Text shown while no frame has been uploaded
    pub fn placeholder(mut self, text: &'a str) -> Self {
        self.placeholder = text;
        self
    }
}

/// Cell columns and rows that fit a `width`x`height` image into `area`
fn fit(width: u32, height: u32, area: Rect) -> (u16, u16) {
    let aspect = width as f64 / height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height as f64) * 2.0;

    if term_width / term_height > aspect {
        let w = term_height * aspect;
        (w as u16, area.height)
    } else {
        let h = term_width / aspect;
        (area.width, (h / 2.0) as u16)
    }
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = self.texture.image() else {
            let x = area.x + area.width.saturating_sub(self.placeholder.len() as u16) / 2;
            let y = area.y + area.height / 2;
            if y < area.bottom() && x < area.right() {
                buf.set_string(x, y, self.placeholder, Style::default());
            }
            return;
        };

        if image.width() == 0 || image.height() == 0 {
            return;
        }

        let (cols, rows) = fit(image.width(), image.height(), area);
        if cols == 0 || rows == 0 {
            return;
        }

        let scaled = imageops::resize(
            image,
            cols as u32,
            rows as u32 * 2,
            self.texture.filter(),
        );

        let x_offset = area.x + area.width.saturating_sub(cols) / 2;
        let y_offset = area.y + area.height.saturating_sub(rows) / 2;

        for ty in 0..rows {
            for tx in 0..cols {
                let top = scaled.get_pixel(tx as u32, ty as u32 * 2).0;
                let bottom = scaled.get_pixel(tx as u32, ty as u32 * 2 + 1).0;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(Color::Rgb(top[0], top[1], top[2]));
                    cell.set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
                }
            }
        }
    }
}

/// One-line status bar
pub struct StatusBar<'a> {
    pub message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(area.x, area.y, text, style);
    }
}
