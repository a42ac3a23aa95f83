use std::collections::HashMap;
use std::rc::Rc;

use crate::resources::Bitmap;

use super::{FontDescription, FontError};

/// Glyph metrics in pixels plus its atlas rect in normalized coordinates.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Glyph {
    pub width: f32,
    pub height: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub x_advance: f32,
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl Glyph {
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Horizontal placement of a text run relative to its anchor.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Bitmap font bound to its atlas texture.
///
/// Lookups never fail: characters missing from the glyph table resolve to
/// the sentinel glyph (the description's `char id=-1`, else `?`, else an
/// empty glyph with no advance).
#[derive(Debug)]
pub struct Font {
    glyphs: HashMap<char, Glyph>,
    kerning: HashMap<(char, char), f32>,
    sentinel: Glyph,
    line_height: f32,
    baseline: f32,
    atlas: Rc<Bitmap>,
    pub alignment: Alignment,
    pub ellipsis: bool,
}

impl Font {
    /// Binds a parsed description to its uploaded atlas.
    pub fn new(description: &FontDescription, atlas: Rc<Bitmap>) -> Result<Self, FontError> {
        let expected = (description.scale_w, description.scale_h);
        let actual = (atlas.width(), atlas.height());
        if expected != actual {
            return Err(FontError::AtlasMismatch { expected, actual });
        }

        let sw = description.scale_w.max(1) as f32;
        let sh = description.scale_h.max(1) as f32;

        let mut glyphs = HashMap::with_capacity(description.chars.len());
        let mut reserved = None;
        for rec in &description.chars {
            let glyph = Glyph {
                width: rec.width,
                height: rec.height,
                x_offset: rec.x_offset,
                y_offset: rec.y_offset,
                x_advance: rec.x_advance,
                u0: rec.x / sw,
                v0: rec.y / sh,
                u1: (rec.x + rec.width) / sw,
                v1: (rec.y + rec.height) / sh,
            };
            if rec.id == -1 {
                reserved = Some(glyph);
                continue;
            }
            if let Some(c) = to_char(rec.id) {
                glyphs.insert(c, glyph);
            }
        }

        let mut kerning = HashMap::new();
        for k in &description.kernings {
            let pair = (to_char(k.first), to_char(k.second));
            if let (Some(a), Some(b)) = pair {
                kerning.insert((a, b), k.amount);
            }
        }

        let sentinel = reserved.or_else(|| glyphs.get(&'?').copied()).unwrap_or_default();

        Ok(Self {
            glyphs,
            kerning,
            sentinel,
            line_height: description.line_height,
            baseline: description.base,
            atlas,
            alignment: Alignment::Left,
            ellipsis: false,
        })
    }

    /// Parses `source` and binds it to `atlas` in one step.
    pub fn parse(source: &str, atlas: Rc<Bitmap>) -> Result<Self, FontError> {
        Self::new(&FontDescription::parse(source)?, atlas)
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_ellipsis(mut self, ellipsis: bool) -> Self {
        self.ellipsis = ellipsis;
        self
    }

    /// Glyph for `c`, or the sentinel glyph when `c` is not in the table.
    #[inline]
    pub fn glyph(&self, c: char) -> &Glyph {
        self.glyphs.get(&c).unwrap_or(&self.sentinel)
    }

    #[inline]
    pub fn has_glyph(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    /// Advance adjustment between `first` and the character following it.
    #[inline]
    pub fn kerning(&self, first: char, second: char) -> f32 {
        self.kerning.get(&(first, second)).copied().unwrap_or(0.0)
    }

    /// Distance from the top of a line to the baseline.
    #[inline]
    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    #[inline]
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    #[inline]
    pub fn atlas(&self) -> &Rc<Bitmap> {
        &self.atlas
    }
}

pub(super) fn to_char(id: i64) -> Option<char> {
    u32::try_from(id).ok().and_then(char::from_u32)
}
