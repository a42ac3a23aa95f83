use std::borrow::Cow;

use crate::coords::{Rect, Vec2};

use super::{Alignment, Font, Glyph};

/// Suffix appended by ellipsis fitting. Bitmap fonts rarely carry `…`.
pub const ELLIPSIS: &str = "...";

/// Horizontal ink extent of a run, relative to the pen start.
///
/// `left` is negative when the first glyph overhangs the pen start.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TextExtent {
    pub left: f32,
    pub right: f32,
}

impl TextExtent {
    #[inline]
    pub fn width(self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn contains(self, other: TextExtent) -> bool {
        self.left <= other.left && other.right <= self.right
    }
}

/// A visible glyph positioned in local space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub rect: Rect,
    /// `[u0, v0, u1, v1]` in the atlas.
    pub uv: [f32; 4],
}

impl Font {
    /// Walks the pen over `text`, yielding each glyph with its pen position.
    fn walk<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (f32, &'a Glyph)> + 'a {
        let mut x = 0.0;
        let mut prev: Option<char> = None;
        text.chars().map(move |c| {
            if let Some(p) = prev {
                x += self.kerning(p, c);
            }
            let glyph = self.glyph(c);
            let pen = x;
            x += glyph.x_advance;
            prev = Some(c);
            (pen, glyph)
        })
    }

    /// Tight horizontal bounds of the inked area of `text`.
    pub fn measure(&self, text: &str) -> TextExtent {
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for (pen, g) in self.walk(text) {
            lo = lo.min(pen + g.x_offset);
            hi = hi.max(pen + g.x_offset + g.width);
        }
        if lo > hi { TextExtent::default() } else { TextExtent { left: lo, right: hi } }
    }

    /// Horizontal shift applied to a run so that it sits on its anchor
    /// according to [`alignment`](Font::alignment).
    pub fn alignment_offset(&self, text: &str) -> f32 {
        match self.alignment {
            Alignment::Left => 0.0,
            Alignment::Center => {
                let e = self.measure(text);
                -(e.left + e.right) * 0.5
            }
            Alignment::Right => -self.measure(text).right,
        }
    }

    /// Visible glyph quads for `text` with the baseline starting at `origin`.
    pub fn layout(&self, text: &str, origin: Vec2) -> Vec<PlacedGlyph> {
        let top = origin.y - self.baseline();
        self.walk(text)
            .filter(|(_, g)| g.is_visible())
            .map(|(pen, g)| PlacedGlyph {
                rect: Rect::new(origin.x + pen + g.x_offset, top + g.y_offset, g.width, g.height),
                uv: [g.u0, g.v0, g.u1, g.v1],
            })
            .collect()
    }

    /// `text` shortened with [`ELLIPSIS`] so it fits in `max_width`.
    ///
    /// Returns the text untouched when it already fits or when the font's
    /// ellipsis policy is off. When not even the ellipsis fits, it is returned alone.
    pub fn fit<'a>(&self, text: &'a str, max_width: f32) -> Cow<'a, str> {
        if !self.ellipsis || self.measure(text).width() <= max_width {
            return Cow::Borrowed(text);
        }
        for (cut, _) in text.char_indices().rev() {
            let candidate = format!("{}{ELLIPSIS}", &text[..cut]);
            if self.measure(&candidate).width() <= max_width {
                return Cow::Owned(candidate);
            }
        }
        Cow::Borrowed(ELLIPSIS)
    }
}

#[cfg(test)]
mod tests {
    use super::super::font::tests::test_font;
    use super::*;

    // ── measure ───────────────────────────────────────────────────────────

    #[test]
    fn empty_text_measures_zero() {
        assert_eq!(test_font().measure(""), TextExtent::default());
    }

    #[test]
    fn kerning_tightens_pairs() {
        let f = test_font();
        // A at 0..6, V pen at 7 - 2 = 5, ink 6..12.
        assert_eq!(f.measure("AV"), TextExtent { left: 0.0, right: 12.0 });
        // V ink 1..7 (xoffset 1), then A at pen 7 with no kerning: 7..13.
        assert_eq!(f.measure("VA"), TextExtent { left: 1.0, right: 13.0 });
    }

    #[test]
    fn overhang_makes_left_negative() {
        // Sentinel glyph has xoffset -1.
        assert_eq!(test_font().measure("é").left, -1.0);
    }

    #[test]
    fn appending_a_char_only_extends_bounds() {
        let f = test_font();
        let mut s = String::from("A");
        for c in "V.A VéA".chars() {
            let before = f.measure(&s);
            s.push(c);
            let after = f.measure(&s);
            assert!(after.contains(before), "{s:?}: {after:?} does not contain {before:?}");
        }
    }

    // ── alignment ─────────────────────────────────────────────────────────

    #[test]
    fn alignment_offsets() {
        let f = test_font();
        assert_eq!(f.alignment_offset("AV"), 0.0);
        let f = test_font().with_alignment(Alignment::Center);
        assert_eq!(f.alignment_offset("AV"), -6.0);
        let f = test_font().with_alignment(Alignment::Right);
        assert_eq!(f.alignment_offset("AV"), -12.0);
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn layout_skips_blank_glyphs_and_hangs_from_baseline() {
        let f = test_font();
        let placed = f.layout("A A", Vec2::new(10.0, 20.0));
        assert_eq!(placed.len(), 2);
        // top = 20 - base(10) + yoffset(2)
        assert_eq!(placed[0].rect, Rect::new(10.0, 12.0, 6.0, 8.0));
        // second A after A(7) + space(4)
        assert_eq!(placed[1].rect.origin.x, 21.0);
        assert_eq!(placed[0].uv, [0.0, 0.0, 6.0 / 64.0, 8.0 / 32.0]);
    }

    // ── ellipsis ──────────────────────────────────────────────────────────

    #[test]
    fn fit_without_policy_keeps_text() {
        assert_eq!(test_font().fit("AAAA", 5.0), "AAAA");
    }

    #[test]
    fn fit_truncates_with_ellipsis() {
        let f = test_font().with_ellipsis(true);
        // "A..." measures 0..(7 + 3 + 3 + 1 + 2) = 16
        assert_eq!(f.measure("A...").width(), 16.0);
        assert_eq!(f.fit("AAAA", 16.0), "A...");
        assert_eq!(f.fit("AA", 100.0), "AA");
    }

    #[test]
    fn fit_falls_back_to_bare_ellipsis() {
        let f = test_font().with_ellipsis(true);
        assert_eq!(f.fit("AAAA", 1.0), ELLIPSIS);
    }
}
