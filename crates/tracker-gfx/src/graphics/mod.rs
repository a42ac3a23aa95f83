//! Immediate-mode drawing context.
//!
//! [`Graphics`] turns draw calls in local content space into backend batches:
//! - transforms compose as scale + translation ([`TransformStack`])
//! - clips are device scissors that only shrink ([`ClipStack`])
//! - consecutive draws with the same primitive, texture and wrap share a batch
//!
//! [`OffscreenGraphics`] is the same context bound to its own render target,
//! with readback of the finished image.

mod clip;
mod config;
mod context;
mod offscreen;
pub(crate) mod readback;
mod transform;

pub use clip::{ClipStack, DeviceMapping};
pub use config::GraphicsConfig;
pub use context::Graphics;
pub use offscreen::OffscreenGraphics;
pub use transform::{Transform, TransformStack};
