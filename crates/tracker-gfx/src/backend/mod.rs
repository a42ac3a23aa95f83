//! Drawing backends.
//!
//! [`Backend`] is the generic stateful immediate-mode 2D API the
//! [`Graphics`](crate::graphics::Graphics) context drives: textures, render
//! targets, one scissor rectangle, premultiplied blending and batched
//! triangle/line submissions. Implementations:
//! - [`SoftwareBackend`]: CPU reference rasterizer (headless export, tests)
//! - [`WgpuBackend`]: GPU implementation on top of wgpu
//!
//! Coordinate conventions:
//! - vertex positions are device pixels, top-left relative to the viewport
//! - viewport and scissor [`DeviceRect`]s use the bottom-left origin

mod software;
mod gpu;

#[cfg(test)]
pub(crate) mod recording;

use bytemuck::{Pod, Zeroable};

use crate::coords::DeviceRect;
use crate::paint::Color;

pub use self::software::SoftwareBackend;
pub use self::gpu::{SurfaceTarget, WgpuBackend, WgpuInit};

/// Opaque texture handle issued by a backend device.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub(crate) u32);

/// Opaque render-target (framebuffer) handle issued by a backend device.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FramebufferId(pub(crate) u32);

/// Handles created together for an offscreen target.
///
/// The texture belongs to the framebuffer and is released with it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RenderTargetIds {
    pub framebuffer: FramebufferId,
    pub texture: TextureId,
}

/// Texture coordinate addressing outside [0, 1].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Wrap {
    #[default]
    Clamp,
    Repeat,
}

impl Wrap {
    #[inline]
    pub fn tiled(tile: bool) -> Self {
        if tile { Wrap::Repeat } else { Wrap::Clamp }
    }
}

/// Per-axis texture addressing.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct WrapMode {
    pub x: Wrap,
    pub y: Wrap,
}

/// Primitive topology of a batch. Strips, fans and loops are expanded to
/// lists before submission.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Primitive {
    Triangles,
    /// Independent segments; `width` above 1 requires [`Capabilities::wide_lines`].
    Lines { width: f32 },
}

/// Batch vertex: device position, texture coordinate, premultiplied color.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    #[inline]
    pub fn new(pos: [f32; 2], uv: [f32; 2], color: Color) -> Self {
        Self { pos, uv, color: color.to_array() }
    }
}

/// A run of vertices sharing primitive type, texture and addressing.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub primitive: Primitive,
    pub texture: Option<TextureId>,
    pub wrap: WrapMode,
    pub vertices: Vec<Vertex>,
}

impl Batch {
    #[inline]
    pub fn new(primitive: Primitive, texture: Option<TextureId>, wrap: WrapMode) -> Self {
        Self { primitive, texture, wrap, vertices: Vec::new() }
    }

    /// True when a submission with this state can be appended to the batch.
    #[inline]
    pub fn accepts(
        &self,
        primitive: Primitive,
        texture: Option<TextureId>,
        wrap: WrapMode,
    ) -> bool {
        self.primitive == primitive
            && self.texture == texture
            && (texture.is_none() || self.wrap == wrap)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Feature flags resolved once when a context is created.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Capabilities {
    /// Line primitives honour widths above one pixel.
    pub wide_lines: bool,
}

/// Scanline order of a readback buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RowOrder {
    TopDown,
    BottomUp,
}

/// Byte order of the four channels of a pixel.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ChannelOrder {
    #[default]
    Rgba,
    Bgra,
}

/// Native layout produced by [`Backend::read_pixels`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PixelLayout {
    pub rows: RowOrder,
    pub channels: ChannelOrder,
}

/// Generic stateful immediate-mode drawing API.
///
/// All calls happen on the thread owning the device. Binding state (target,
/// viewport, scissor, antialias) is per handle; textures and targets live on
/// the device and are visible to every handle obtained through [`share`](Backend::share).
pub trait Backend {
    /// Returns another handle on the same device with fresh binding state.
    fn share(&self) -> Self
    where
        Self: Sized;

    fn capabilities(&self) -> Capabilities;

    /// Size in pixels of the default surface.
    fn surface_size(&self) -> (u32, u32);

    /// Uploads premultiplied RGBA8 pixels (top row first).
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> TextureId;

    fn destroy_texture(&mut self, texture: TextureId);

    fn create_render_target(&mut self, width: u32, height: u32) -> RenderTargetIds;

    /// Destroys the framebuffer together with its color texture.
    fn destroy_render_target(&mut self, framebuffer: FramebufferId);

    /// Redirects drawing into `framebuffer`, or the default surface for `None`.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    fn set_viewport(&mut self, viewport: DeviceRect);

    fn set_scissor(&mut self, scissor: DeviceRect);

    fn set_antialias(&mut self, enabled: bool);

    /// Fills the scissor area of the bound target with `color`, ignoring blending.
    fn clear(&mut self, color: Color);

    fn draw(&mut self, batch: &Batch);

    /// Makes all submitted work visible in the bound target.
    fn flush(&mut self);

    /// Blocks until prior work is done and copies `framebuffer` into `out`
    /// (`width * height * 4` bytes) in the backend's native layout.
    fn read_pixels(
        &mut self,
        framebuffer: FramebufferId,
        out: &mut [u8],
    ) -> anyhow::Result<PixelLayout>;
}
