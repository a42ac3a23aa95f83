use super::{BitmapData, ResourceError};

/// Pre-rendered resolution of a bitmap resource.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScaleVariant {
    X1,
    X1_5,
    X2,
}

impl ScaleVariant {
    /// Picks the variant matching a device pixel-scale factor.
    pub fn for_scale(pixel_scale: f32) -> Self {
        if pixel_scale >= 1.75 {
            ScaleVariant::X2
        } else if pixel_scale >= 1.25 {
            ScaleVariant::X1_5
        } else {
            ScaleVariant::X1
        }
    }

    #[inline]
    pub fn factor(self) -> f32 {
        match self {
            ScaleVariant::X1 => 1.0,
            ScaleVariant::X1_5 => 1.5,
            ScaleVariant::X2 => 2.0,
        }
    }

    /// File-name suffix conventionally used for the variant (`""`, `"@1.5x"`, `"@2x"`).
    #[inline]
    pub fn suffix(self) -> &'static str {
        match self {
            ScaleVariant::X1 => "",
            ScaleVariant::X1_5 => "@1.5x",
            ScaleVariant::X2 => "@2x",
        }
    }

    /// `self` followed by every smaller variant, down to 1x.
    pub fn fallbacks(self) -> impl Iterator<Item = ScaleVariant> {
        [ScaleVariant::X2, ScaleVariant::X1_5, ScaleVariant::X1]
            .into_iter()
            .filter(move |v| v.factor() <= self.factor())
    }
}

/// Platform hook returning decoded pixels for a logical resource name.
///
/// Implementations do the file lookup and image decoding; the drawing layer
/// only uploads what it gets. `Ok(None)` means the variant does not exist and
/// a smaller one may be tried; a variant that exists but cannot be decoded is
/// [`ResourceError::Malformed`].
pub trait ResourceLoader {
    fn load(&self, name: &str, variant: ScaleVariant) -> Result<Option<BitmapData>, ResourceError>;
}
