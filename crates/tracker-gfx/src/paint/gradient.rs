use crate::coords::Vec2;

use super::Color;

/// Direction of a [`Gradient`] ramp.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GradientAxis {
    Horizontal,
    Vertical,
}

/// Two-color axis-aligned gradient with an explicit extent.
///
/// Invariant: exactly one of `extent_x` / `extent_y` is nonzero. The ramp
/// starts at the origin of the filled shape, reaches `color1` at the extent and
/// holds `color1` beyond it. A negative extent points away from the shape, so
/// the whole fill sits before the ramp and takes `color0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Gradient {
    pub color0: Color,
    pub color1: Color,
    extent_x: f32,
    extent_y: f32,
}

impl Gradient {
    /// # Panics
    /// Panics unless exactly one extent is nonzero and both are finite.
    pub fn new(color0: Color, color1: Color, extent_x: f32, extent_y: f32) -> Self {
        assert!(
            extent_x.is_finite()
                && extent_y.is_finite()
                && ((extent_x != 0.0) != (extent_y != 0.0)),
            "gradient must span exactly one axis (extent {extent_x} x {extent_y})"
        );
        Self { color0, color1, extent_x, extent_y }
    }

    #[inline]
    pub fn horizontal(color0: Color, color1: Color, width: f32) -> Self {
        Self::new(color0, color1, width, 0.0)
    }

    #[inline]
    pub fn vertical(color0: Color, color1: Color, height: f32) -> Self {
        Self::new(color0, color1, 0.0, height)
    }

    #[inline]
    pub fn axis(&self) -> GradientAxis {
        if self.extent_x != 0.0 { GradientAxis::Horizontal } else { GradientAxis::Vertical }
    }

    /// Signed extent along [`axis`](Self::axis).
    #[inline]
    pub fn length(&self) -> f32 {
        match self.axis() {
            GradientAxis::Horizontal => self.extent_x,
            GradientAxis::Vertical => self.extent_y,
        }
    }

    #[inline]
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.extent_x, self.extent_y)
    }

    /// Color at a distance `d` along the axis from the ramp start.
    #[inline]
    pub fn color_at_distance(&self, d: f32) -> Color {
        self.color0.lerp(self.color1, d / self.length())
    }

    /// Color at `offset` from the ramp start.
    #[inline]
    pub fn color_at(&self, offset: Vec2) -> Color {
        match self.axis() {
            GradientAxis::Horizontal => self.color_at_distance(offset.x),
            GradientAxis::Vertical => self.color_at_distance(offset.y),
        }
    }
}
