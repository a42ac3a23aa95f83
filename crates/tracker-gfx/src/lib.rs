//! Tracker graphics crate.
//!
//! Immediate-mode 2D drawing for the pattern editor: rectangles, lines,
//! polylines, bitmaps and bitmap-font text, batched onto a swappable
//! [`backend::Backend`] (wgpu or the CPU reference rasterizer).

pub mod backend;
pub mod coords;
pub mod geometry;
pub mod graphics;
pub mod logging;
pub mod paint;
pub mod resources;
pub mod text;

pub use graphics::{Graphics, GraphicsConfig, OffscreenGraphics};
