//! GPU-backed resources and their loading.
//!
//! - [`Bitmap`]: texture handle + pixel size, released through a [`ReleaseQueue`]
//!   when the last reference drops (unless it wraps a render target)
//! - [`BitmapData`]: decoded pixels supplied by the platform loader
//! - [`ResourceLoader`] / [`ScaleVariant`]: scale-aware lookup by logical name

mod bitmap;
mod error;
mod loader;

pub use bitmap::{Bitmap, BitmapData};
pub use error::ResourceError;
pub use loader::{ResourceLoader, ScaleVariant};

pub(crate) use bitmap::ReleaseQueue;
