use std::rc::Rc;

use crate::backend::{TextureId, Wrap, WrapMode};
use crate::coords::Vec2;
use crate::resources::Bitmap;

use super::{Color, Gradient};

/// Bitmap paint: the texture is a swatch addressed by the shape's own local
/// coordinates, not an image stretched over the shape.
#[derive(Debug, Clone)]
pub struct BitmapBrush {
    pub bitmap: Rc<Bitmap>,
    pub tile_x: bool,
    pub tile_y: bool,
}

impl BitmapBrush {
    #[inline]
    pub fn wrap(&self) -> WrapMode {
        WrapMode { x: Wrap::tiled(self.tile_x), y: Wrap::tiled(self.tile_y) }
    }

    /// Normalized texture coordinate for a local-space point.
    #[inline]
    pub fn uv_at(&self, local: Vec2) -> [f32; 2] {
        let size = self.bitmap.size();
        [local.x / size.x.max(1.0), local.y / size.y.max(1.0)]
    }
}

/// Paint descriptor consumed by fill and stroke operations.
#[derive(Debug, Clone)]
pub enum Brush {
    Solid(Color),
    Gradient(Gradient),
    Bitmap(BitmapBrush),
}

impl Brush {
    #[inline]
    pub fn solid(color: Color) -> Self {
        Brush::Solid(color)
    }

    /// Texture sampled by this brush, if any.
    #[inline]
    pub fn texture(&self) -> Option<(TextureId, WrapMode)> {
        match self {
            Brush::Bitmap(b) => Some((b.bitmap.texture(), b.wrap())),
            _ => None,
        }
    }

    /// Vertex color and texture coordinate at `point`, for a shape whose
    /// gradient ramp starts at `origin`. Both are local-space positions.
    #[inline]
    pub fn shade(&self, origin: Vec2, point: Vec2) -> (Color, [f32; 2]) {
        match self {
            Brush::Solid(c) => (*c, [0.0, 0.0]),
            Brush::Gradient(g) => (g.color_at(point - origin), [0.0, 0.0]),
            Brush::Bitmap(b) => (Color::WHITE, b.uv_at(point)),
        }
    }

    /// Single color used where a brush tints a textured run (text).
    #[inline]
    pub fn tint(&self) -> Color {
        match self {
            Brush::Solid(c) => *c,
            Brush::Gradient(g) => g.color0,
            Brush::Bitmap(_) => Color::WHITE,
        }
    }
}

impl From<Color> for Brush {
    #[inline]
    fn from(color: Color) -> Self {
        Brush::Solid(color)
    }
}

impl From<Gradient> for Brush {
    #[inline]
    fn from(gradient: Gradient) -> Self {
        Brush::Gradient(gradient)
    }
}
