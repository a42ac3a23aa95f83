use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::backend::TextureId;
use crate::coords::Vec2;

use super::ResourceError;

/// Decoded straight-alpha RGBA8 pixels, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl BitmapData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ResourceError> {
        if pixels.len() != width as usize * height as usize * 4 {
            return Err(ResourceError::InvalidSize { width, height, len: pixels.len() });
        }
        Ok(Self { width, height, pixels })
    }

    /// A `width × height` bitmap filled with one straight RGBA color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self { width, height, pixels }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixels converted to premultiplied alpha, the format backends upload.
    pub fn premultiplied(&self) -> Vec<u8> {
        let mut out = self.pixels.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u16;
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
        out
    }
}

/// Textures waiting to be destroyed on the owning context's thread.
///
/// Dropping a [`Bitmap`] cannot reach the backend, so the handle is parked
/// here and the context destroys it at its next drain point.
#[derive(Debug, Default)]
pub(crate) struct ReleaseQueue {
    pending: RefCell<Vec<TextureId>>,
}

impl ReleaseQueue {
    pub(crate) fn push(&self, texture: TextureId) {
        self.pending.borrow_mut().push(texture);
    }

    pub(crate) fn drain(&self) -> Vec<TextureId> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.borrow().len()
    }
}

/// A texture resource with its pixel size.
///
/// `scale` is the pixel density the bitmap was authored at (2.0 for a `@2x`
/// variant); drawing and swatch addressing use the logical size
/// `pixels / scale`.
///
/// Owning bitmaps release their texture exactly once, when the last `Rc`
/// drops. Bitmaps wrapping a render target's color texture are non-owning:
/// the target destroys the texture itself.
pub struct Bitmap {
    texture: TextureId,
    width: u32,
    height: u32,
    scale: f32,
    owns_texture: bool,
    releases: Rc<ReleaseQueue>,
}

impl Bitmap {
    pub(crate) fn owned(
        texture: TextureId,
        width: u32,
        height: u32,
        scale: f32,
        releases: Rc<ReleaseQueue>,
    ) -> Self {
        Self { texture, width, height, scale, owns_texture: true, releases }
    }

    pub(crate) fn borrowed(
        texture: TextureId,
        width: u32,
        height: u32,
        releases: Rc<ReleaseQueue>,
    ) -> Self {
        Self { texture, width, height, scale: 1.0, owns_texture: false, releases }
    }

    #[inline]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Size in logical pixels.
    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) / self.scale
    }

    #[inline]
    pub fn owns_texture(&self) -> bool {
        self.owns_texture
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("texture", &self.texture)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale", &self.scale)
            .field("owns_texture", &self.owns_texture)
            .finish()
    }
}

impl Drop for Bitmap {
    fn drop(&mut self) {
        if self.owns_texture {
            log::trace!("bitmap {:?} released", self.texture);
            self.releases.push(self.texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_wrong_length() {
        let err = BitmapData::new(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(err, ResourceError::InvalidSize { width: 2, height: 2, len: 15 });
    }

    #[test]
    fn premultiplied_scales_rgb_by_alpha() {
        let data = BitmapData::new(1, 1, vec![255, 128, 0, 128]).unwrap();
        assert_eq!(data.premultiplied(), vec![128, 64, 0, 128]);
    }

    #[test]
    fn owning_bitmap_releases_once() {
        let q = Rc::new(ReleaseQueue::default());
        let bmp = Rc::new(Bitmap::owned(TextureId(7), 4, 4, 1.0, q.clone()));
        let other = bmp.clone();
        drop(bmp);
        assert_eq!(q.len(), 0);
        drop(other);
        assert_eq!(q.drain(), vec![TextureId(7)]);
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn logical_size_divides_by_scale() {
        let q = Rc::new(ReleaseQueue::default());
        let bmp = Bitmap::owned(TextureId(1), 32, 16, 2.0, q);
        assert_eq!(bmp.size(), Vec2::new(16.0, 8.0));
    }

    #[test]
    fn borrowed_bitmap_never_releases() {
        let q = Rc::new(ReleaseQueue::default());
        drop(Bitmap::borrowed(TextureId(3), 4, 4, q.clone()));
        assert_eq!(q.len(), 0);
    }
}
