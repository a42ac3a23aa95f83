/// Linear premultiplied RGBA color.
///
/// Invariant:
/// - `rgb` components are expected to be multiplied by `a` (premultiplied alpha).
///
/// Premultiplied colors blend correctly under linear interpolation, which the
/// gradient fill relies on (per-vertex colors are interpolated by the backend).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32, // premultiplied
    pub g: f32, // premultiplied
    pub b: f32, // premultiplied
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::from_premul(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::from_premul(0.0, 0.0, 0.0, 1.0);

    /// Creates a premultiplied color from straight sRGB bytes (`0`–`255`).
    #[inline]
    pub fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_straight(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Creates a color from a packed `0xAARRGGBB` value, the form used by song
    /// and theme data.
    #[inline]
    pub fn from_argb(argb: u32) -> Self {
        let [a, r, g, b] = argb.to_be_bytes();
        Self::from_srgb_u8(r, g, b, a)
    }

    /// Creates a premultiplied color from premultiplied components.
    #[inline]
    pub const fn from_premul(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a premultiplied color from straight alpha components.
    #[inline]
    pub fn from_straight(r: f32, g: f32, b: f32, a: f32) -> Self {
        let a = a.clamp(0.0, 1.0);
        Self {
            r: (r.clamp(0.0, 1.0)) * a,
            g: (g.clamp(0.0, 1.0)) * a,
            b: (b.clamp(0.0, 1.0)) * a,
            a,
        }
    }

    /// Debug-only validation: asserts that RGB channels do not exceed alpha,
    /// which would indicate a straight-alpha color was passed where premul was expected.
    #[inline]
    pub fn debug_assert_premul(self) {
        debug_assert!(
            self.r <= self.a + f32::EPSILON
                && self.g <= self.a + f32::EPSILON
                && self.b <= self.a + f32::EPSILON,
            "Color::debug_assert_premul: rgb exceeds alpha in {self:?}, \
             looks like straight-alpha was passed as premul"
        );
    }

    /// Premultiplied RGBA bytes, rounded to nearest.
    #[inline]
    pub fn to_premul_u8(self) -> [u8; 4] {
        let c = self.clamped();
        let q = |v: f32| (v * 255.0).round() as u8;
        [q(c.r), q(c.g), q(c.b), q(c.a)]
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Linear interpolation in premultiplied space.
    ///
    /// `t <= 0` returns `self` and `t >= 1` returns `other` exactly.
    #[inline]
    pub fn lerp(self, other: Color, t: f32) -> Color {
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return other;
        }
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Scales RGB by `factor` keeping alpha, clamped so the result stays premultiplied.
    #[inline]
    pub fn shaded(self, factor: f32) -> Color {
        Color {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
        .clamped()
    }

    /// Multiplies every channel by `opacity` (premultiplied fade).
    #[inline]
    pub fn with_opacity(self, opacity: f32) -> Color {
        let o = opacity.clamp(0.0, 1.0);
        Color { r: self.r * o, g: self.g * o, b: self.b * o, a: self.a * o }
    }

    /// Clamps all channels to [0, 1] and enforces premultiplication.
    #[inline]
    pub fn clamped(self) -> Self {
        let a = self.a.clamp(0.0, 1.0);

        // Clamp premultiplied rgb so it cannot exceed alpha.
        let r = self.r.clamp(0.0, a);
        let g = self.g.clamp(0.0, a);
        let b = self.b.clamp(0.0, a);

        Self { r, g, b, a }
    }

    /// Bit pattern usable as a hash key.
    #[inline]
    pub(crate) fn key_bits(self) -> [u32; 4] {
        [self.r.to_bits(), self.g.to_bits(), self.b.to_bits(), self.a.to_bits()]
    }
}
