//! Rectangle fill algorithms per brush kind.
//!
//! Output quads are in local space; the graphics context maps them through
//! the transform stack.

use crate::coords::{Rect, Vec2};

use super::{Brush, Color, Gradient, GradientAxis};

/// A local-space quad with per-corner shading.
///
/// Corner order: top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    pub corners: [Vec2; 4],
    pub colors: [Color; 4],
    pub uvs: [[f32; 2]; 4],
}

impl Quad {
    /// Quad over `rect` with every corner shaded by `brush`.
    pub fn shaded(rect: Rect, brush: &Brush, origin: Vec2) -> Self {
        let corners = rect.corners();
        let shade = corners.map(|p| brush.shade(origin, p));
        Self {
            corners,
            colors: shade.map(|(c, _)| c),
            uvs: shade.map(|(_, uv)| uv),
        }
    }

    fn solid(rect: Rect, color: Color) -> Self {
        Self { corners: rect.corners(), colors: [color; 4], uvs: [[0.0; 2]; 4] }
    }

    /// Ramp along `axis` from `near` at the leading edge to `far` at the trailing one.
    fn ramp(rect: Rect, axis: GradientAxis, near: Color, far: Color) -> Self {
        let colors = match axis {
            GradientAxis::Horizontal => [near, far, far, near],
            GradientAxis::Vertical => [near, near, far, far],
        };
        Self { corners: rect.corners(), colors, uvs: [[0.0; 2]; 4] }
    }
}

/// Quads filling `rect` with `brush`.
///
/// - solid: one quad
/// - gradient reaching or passing the far edge: one ramp quad
/// - gradient ending inside the rect: a ramp quad over the extent plus a quad
///   of the end color over the remainder, so nothing is extrapolated
/// - bitmap: one quad whose uvs are the local corner positions over the
///   bitmap size
pub fn fill_rect(rect: Rect, brush: &Brush) -> Vec<Quad> {
    let rect = rect.normalized();
    if rect.is_empty() {
        return Vec::new();
    }
    match brush {
        Brush::Solid(c) => vec![Quad::solid(rect, *c)],
        Brush::Gradient(g) => fill_gradient(rect, g),
        Brush::Bitmap(_) => vec![Quad::shaded(rect, brush, rect.origin)],
    }
}

fn fill_gradient(rect: Rect, g: &Gradient) -> Vec<Quad> {
    let axis = g.axis();
    let len = g.length();
    let span = match axis {
        GradientAxis::Horizontal => rect.width(),
        GradientAxis::Vertical => rect.height(),
    };

    if len <= 0.0 {
        return vec![Quad::solid(rect, g.color0)];
    }
    if len >= span {
        return vec![Quad::ramp(rect, axis, g.color0, g.color_at_distance(span))];
    }

    let (ramp, rest) = match axis {
        GradientAxis::Horizontal => (
            Rect::new(rect.origin.x, rect.origin.y, len, rect.height()),
            Rect::new(rect.origin.x + len, rect.origin.y, span - len, rect.height()),
        ),
        GradientAxis::Vertical => (
            Rect::new(rect.origin.x, rect.origin.y, rect.width(), len),
            Rect::new(rect.origin.x, rect.origin.y + len, rect.width(), span - len),
        ),
    };
    vec![Quad::ramp(ramp, axis, g.color0, g.color1), Quad::solid(rest, g.color1)]
}
