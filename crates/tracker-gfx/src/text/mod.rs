//! Bitmap-font text.
//!
//! - [`FontDescription`]: parsed BMFont text description (atlas metrics,
//!   glyph rects, kerning pairs)
//! - [`Font`]: glyph/kerning lookup bound to its uploaded atlas bitmap
//! - layout: measurement, glyph placement, alignment and ellipsis fitting

mod description;
mod error;
mod font;
mod layout;

pub use description::{CharRecord, FontDescription, KerningRecord};
pub use error::FontError;
pub use font::{Alignment, Font, Glyph};
pub use layout::{PlacedGlyph, TextExtent, ELLIPSIS};

#[cfg(test)]
pub(crate) use font::tests::test_font;
