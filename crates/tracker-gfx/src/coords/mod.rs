//! Coordinate and geometry types shared by the drawing layer.
//!
//! Two spaces are in play:
//! - local content space: logical pixels, origin top-left, +Y down. Every draw
//!   call and `push_clip` is expressed here and mapped through the transform stack.
//! - device space: physical pixels. Vertex positions are top-left relative to the
//!   active viewport; [`DeviceRect`] (viewport, scissor) uses the bottom-left
//!   origin convention of the backend.

mod device_rect;
mod rect;
mod vec2;

pub use device_rect::DeviceRect;
pub use rect::Rect;
pub use vec2::Vec2;
