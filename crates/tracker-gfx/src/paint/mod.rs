//! Paint model.
//!
//! Scope:
//! - color representation (linear premultiplied alpha)
//! - brushes (solid, single-axis gradient, bitmap swatch)
//! - rectangle fill algorithms and the vertical-gradient cache

pub mod color;
pub mod gradient;

mod brush;
mod cache;
mod fill;

pub use brush::{BitmapBrush, Brush};
pub use cache::GradientCache;
pub use color::Color;
pub use fill::{fill_rect, Quad};
pub use gradient::{Gradient, GradientAxis};
