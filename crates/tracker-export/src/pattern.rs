//! Mock pattern editor view used to drive the drawing layer.

use std::rc::Rc;

use tracker_gfx::Graphics;
use tracker_gfx::backend::Backend;
use tracker_gfx::coords::{Rect, Vec2};
use tracker_gfx::geometry::Geometry;
use tracker_gfx::paint::{Brush, Color};
use tracker_gfx::resources::Bitmap;
use tracker_gfx::text::Font;

const NOTE_NAMES: [&str; 12] =
    ["C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-"];

/// Rows between highlighted beat rows.
const BEAT: u32 = 4;

#[derive(Debug, Copy, Clone)]
pub struct Theme {
    pub background: Color,
    pub header: Color,
    pub row: Color,
    pub beat_row: Color,
    pub separator: Color,
    pub text: Color,
    pub playhead: Color,
    pub playhead_edge: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::from_argb(0xFF10_1218),
            header: Color::from_argb(0xFF3C_465A),
            row: Color::from_argb(0xFF18_1C24),
            beat_row: Color::from_argb(0xFF22_2834),
            separator: Color::from_argb(0xFF44_4C5C),
            text: Color::from_argb(0xFFC8_D0E0),
            playhead: Color::from_argb(0x60FF_B040),
            playhead_edge: Color::from_argb(0xFFFF_B040),
        }
    }
}

/// Scrolling channel/row grid with a centered playhead.
#[derive(Debug)]
pub struct PatternView {
    pub channels: u32,
    pub rows: u32,
    pub row_height: f32,
    pub header_height: f32,
    pub gutter: f32,
    pub theme: Theme,
    marker: Geometry,
}

impl PatternView {
    pub fn new(channels: u32, rows: u32) -> Self {
        let (row_height, gutter) = (14.0, 12.0);
        let tip = Vec2::new(gutter - 4.0, row_height * 0.5);
        let marker = Geometry::new(
            vec![Vec2::new(0.0, 0.0), tip, Vec2::new(0.0, row_height)],
            true,
        );
        Self {
            channels: channels.max(1),
            rows: rows.max(1),
            row_height,
            header_height: 20.0,
            gutter,
            theme: Theme::default(),
            marker,
        }
    }

    /// Row under the playhead at `frame`; playback loops over the pattern.
    pub fn playhead_row(&self, frame: u32) -> u32 {
        frame % self.rows
    }

    pub fn draw<B: Backend>(
        &self,
        g: &mut Graphics<B>,
        size: Vec2,
        frame: u32,
        font: Option<&Font>,
        swatch: Option<&Rc<Bitmap>>,
    ) {
        let theme = &self.theme;
        g.clear(theme.background);

        let header = g.vertical_gradient(theme.header, self.header_height);
        g.fill_rectangle(Rect::new(0.0, 0.0, size.x, self.header_height), &header);

        if let Some(swatch) = swatch {
            let tiles = g.create_bitmap_brush(Rc::clone(swatch), true, true);
            let gutter =
                Rect::new(0.0, self.header_height, self.gutter, size.y - self.header_height);
            g.fill_rectangle(gutter, &tiles);
        }

        let body = Vec2::new(size.x - self.gutter, size.y - self.header_height);
        let channel_width = body.x / self.channels as f32;
        let playhead = self.playhead_row(frame);
        let playhead_y = playhead as f32 * self.row_height;
        // Keep the playhead row centered in the body.
        let scroll = playhead_y - (body.y - self.row_height) * 0.5;

        let first = (scroll / self.row_height).floor().max(0.0) as u32;
        let last = (((scroll + body.y) / self.row_height).ceil().max(0.0) as u32).min(self.rows);
        let (top, bottom) = (first as f32 * self.row_height, last as f32 * self.row_height);

        g.push_clip(self.gutter, self.header_height, size.x, size.y);
        g.push_translation(self.gutter, self.header_height - scroll);

        for row in first..last {
            let color = if row % BEAT == 0 { theme.beat_row } else { theme.row };
            let y = row as f32 * self.row_height;
            g.fill_rectangle(Rect::new(0.0, y, body.x, self.row_height), &Brush::Solid(color));
        }

        let highlight = Rect::new(0.0, playhead_y, body.x, self.row_height);
        let playhead_fill = g.create_solid_brush(theme.playhead);
        g.fill_rectangle(highlight, &playhead_fill);
        g.draw_rectangle(highlight, &Brush::Solid(theme.playhead_edge), 2.0);

        let separator = Brush::Solid(theme.separator);
        let text = Brush::Solid(theme.text);
        for channel in 0..self.channels {
            let x = channel as f32 * channel_width;
            if channel > 0 {
                g.draw_line(Vec2::new(x, top), Vec2::new(x, bottom), &separator, 1.0);
            }
            let Some(font) = font else { continue };

            g.push_clip(x, top, x + channel_width, bottom);
            let inset = ((self.row_height - font.line_height()) * 0.5).max(0.0);
            for row in first..last {
                if let Some(note) = note_at(row, channel) {
                    let baseline = row as f32 * self.row_height + inset + font.baseline();
                    g.draw_text_fitted(&note, font, x + 4.0, baseline, channel_width - 8.0, &text);
                }
            }
            g.pop_clip();
        }

        g.pop_transform();
        g.pop_clip();

        let marker_y = self.header_height + playhead_y - scroll;
        g.fill_geometry(&self.marker, Vec2::new(2.0, marker_y), &Brush::Solid(theme.playhead_edge));
        g.draw_geometry(&self.marker, Vec2::new(2.0, marker_y), &separator, 1.0);

        if let Some(font) = font {
            let inset = ((self.header_height - font.line_height()) * 0.5).max(0.0);
            let baseline = inset + font.baseline();
            for channel in 0..self.channels {
                let x = self.gutter + channel as f32 * channel_width;
                let label = format!("Channel {}", channel + 1);
                g.draw_text_fitted(&label, font, x + 4.0, baseline, channel_width - 8.0, &text);
            }
        }
    }
}

/// Deterministic demo content: a note every third cell along each diagonal.
pub fn note_at(row: u32, channel: u32) -> Option<String> {
    if (row + channel) % 3 != 0 {
        return None;
    }
    let n = ((row * 7 + channel * 5) % 36) as usize;
    Some(format!("{}{} {:02X}", NOTE_NAMES[n % 12], 3 + n / 12, channel + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_gfx::backend::SoftwareBackend;
    use tracker_gfx::{GraphicsConfig, OffscreenGraphics};

    #[test]
    fn notes_follow_diagonals() {
        assert_eq!(note_at(0, 0).as_deref(), Some("C-3 01"));
        assert_eq!(note_at(1, 2).as_deref(), Some("F-4 03"));
        assert_eq!(note_at(1, 0), None);
    }

    #[test]
    fn playhead_loops() {
        let view = PatternView::new(4, 16);
        assert_eq!(view.playhead_row(3), 3);
        assert_eq!(view.playhead_row(17), 1);
    }

    #[test]
    fn frame_is_opaque_with_header_on_top() {
        let (w, h) = (64u32, 48u32);
        let backend = SoftwareBackend::new(1, 1);
        let mut g = OffscreenGraphics::new(backend, w, h, GraphicsConfig::default());
        let view = PatternView::new(2, 8);

        g.begin_draw();
        view.draw(&mut *g, Vec2::new(w as f32, h as f32), 0, None, None);
        g.end_draw();

        let mut px = vec![0u8; (w * h * 4) as usize];
        g.get_bitmap(&mut px).unwrap();
        assert!(px.chunks_exact(4).all(|p| p[3] == 255));

        let background = view.theme.background.to_premul_u8();
        let header = [px[128], px[129], px[130], px[131]];
        assert_ne!(header, background);
    }
}
