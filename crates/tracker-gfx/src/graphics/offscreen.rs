use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use anyhow::{Result, ensure};

use crate::backend::{Backend, ChannelOrder, RenderTargetIds};
use crate::coords::DeviceRect;
use crate::resources::Bitmap;

use super::config::GraphicsConfig;
use super::context::Graphics;
use super::readback;

/// A [`Graphics`] context drawing into its own texture-backed render target.
///
/// Drawing works exactly as on the default surface (through `Deref`);
/// [`get_bitmap`](Self::get_bitmap) reads the finished frame back. The
/// target is destroyed when the context drops.
pub struct OffscreenGraphics<B: Backend> {
    graphics: Graphics<B>,
    target: RenderTargetIds,
    bitmap: Rc<Bitmap>,
    width: u32,
    height: u32,
}

impl<B: Backend> OffscreenGraphics<B> {
    pub fn new(backend: B, width: u32, height: u32, config: GraphicsConfig) -> Self {
        let mut graphics = Graphics::new(backend, config);
        let target = graphics.backend_mut().create_render_target(width, height);
        let releases = graphics.release_queue();
        let bitmap = Rc::new(Bitmap::borrowed(target.texture, width, height, releases));
        log::debug!("offscreen target {width}x{height}: {target:?}");
        Self { graphics, target, bitmap, width, height }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The target texture as a drawable bitmap. It does not own the texture.
    #[inline]
    pub fn bitmap(&self) -> &Rc<Bitmap> {
        &self.bitmap
    }

    /// Redirects drawing into the target, covering all of it.
    pub fn begin_draw(&mut self) {
        let full = DeviceRect::new(0, 0, self.width as i32, self.height as i32);
        self.graphics.begin_session(Some(self.target.framebuffer), full, self.height);
    }

    /// Finishes the session and rebinds the default surface.
    pub fn end_draw(&mut self) {
        self.graphics.end_draw();
        self.graphics.backend_mut().bind_framebuffer(None);
    }

    /// Blocks until prior drawing is done and copies the target into `out`
    /// as top-down RGBA.
    pub fn get_bitmap(&mut self, out: &mut [u8]) -> Result<()> {
        self.get_bitmap_ordered(out, ChannelOrder::Rgba)
    }

    /// [`get_bitmap`](Self::get_bitmap) with a caller-chosen channel order.
    pub fn get_bitmap_ordered(&mut self, out: &mut [u8], order: ChannelOrder) -> Result<()> {
        let expected = self.width as usize * self.height as usize * 4;
        ensure!(
            out.len() == expected,
            "readback buffer is {} bytes, {}x{} target needs {expected}",
            out.len(),
            self.width,
            self.height
        );
        let native = self.graphics.backend_mut().read_pixels(self.target.framebuffer, out)?;
        readback::normalize(out, self.width, self.height, native, order);
        Ok(())
    }
}

impl<B: Backend> Deref for OffscreenGraphics<B> {
    type Target = Graphics<B>;

    fn deref(&self) -> &Self::Target {
        &self.graphics
    }
}

impl<B: Backend> DerefMut for OffscreenGraphics<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.graphics
    }
}

impl<B: Backend> Drop for OffscreenGraphics<B> {
    fn drop(&mut self) {
        self.graphics.backend_mut().destroy_render_target(self.target.framebuffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareBackend;
    use crate::coords::{Rect, Vec2};
    use crate::paint::{Brush, Color};
    use crate::resources::{BitmapData, ResourceError, ResourceLoader, ScaleVariant};

    fn offscreen(w: u32, h: u32) -> OffscreenGraphics<SoftwareBackend> {
        OffscreenGraphics::new(SoftwareBackend::new(1, 1), w, h, GraphicsConfig::default())
    }

    fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    // ── readback ──────────────────────────────────────────────────────────

    #[test]
    fn marker_at_origin_is_first_pixel() {
        let mut g = offscreen(5, 4);
        g.begin_draw();
        let red = Brush::Solid(Color::from_srgb_u8(255, 0, 0, 255));
        g.fill_rectangle(Rect::new(0.0, 0.0, 1.0, 1.0), &red);
        g.end_draw();

        let mut buf = vec![0u8; 5 * 4 * 4];
        g.get_bitmap(&mut buf).unwrap();
        assert_eq!(&buf[..4], &[255, 0, 0, 255]);
        assert!(buf[4..].iter().all(|&b| b == 0));

        g.get_bitmap_ordered(&mut buf, ChannelOrder::Bgra).unwrap();
        assert_eq!(&buf[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn solid_fill_covers_whole_target() {
        let c = Color::from_srgb_u8(40, 120, 200, 255);
        let mut g = offscreen(100, 50);
        g.begin_draw();
        g.fill_rectangle(Rect::new(0.0, 0.0, 100.0, 50.0), &Brush::Solid(c));
        g.end_draw();

        let mut buf = vec![0u8; 100 * 50 * 4];
        g.get_bitmap(&mut buf).unwrap();
        assert!(buf.chunks_exact(4).all(|px| px == [40, 120, 200, 255]));
    }

    #[test]
    fn wrong_buffer_size_is_rejected() {
        let mut g = offscreen(2, 2);
        let mut buf = vec![0u8; 3];
        assert!(g.get_bitmap(&mut buf).is_err());
    }

    // ── drawing ───────────────────────────────────────────────────────────

    #[test]
    fn clip_lands_on_the_top_left_region() {
        let mut g = offscreen(4, 4);
        g.begin_draw();
        g.push_clip(0.0, 0.0, 2.0, 2.0);
        g.fill_rectangle(Rect::new(0.0, 0.0, 4.0, 4.0), &Brush::Solid(Color::WHITE));
        g.pop_clip();
        g.end_draw();

        let mut buf = vec![0u8; 4 * 4 * 4];
        g.get_bitmap(&mut buf).unwrap();
        assert_eq!(pixel(&buf, 4, 1, 1), [255; 4]);
        assert_eq!(pixel(&buf, 4, 2, 1), [0; 4]);
        assert_eq!(pixel(&buf, 4, 1, 2), [0; 4]);
    }

    #[test]
    fn translated_wide_stroke_reaches_the_target() {
        let mut g = offscreen(8, 8);
        g.begin_draw();
        g.push_translation(0.0, 4.0);
        g.draw_line(Vec2::new(0.0, 0.0), Vec2::new(8.0, 0.0), &Brush::Solid(Color::WHITE), 2.0);
        g.pop_transform();
        g.end_draw();

        let mut buf = vec![0u8; 8 * 8 * 4];
        g.get_bitmap(&mut buf).unwrap();
        assert_eq!(pixel(&buf, 8, 0, 3), [255; 4]);
        assert_eq!(pixel(&buf, 8, 7, 4), [255; 4]);
        assert_eq!(pixel(&buf, 8, 0, 5), [0; 4]);
    }

    #[test]
    fn clear_fills_target() {
        let mut g = offscreen(3, 2);
        g.begin_draw();
        g.clear(Color::BLACK);
        g.end_draw();

        let mut buf = vec![0u8; 3 * 2 * 4];
        g.get_bitmap(&mut buf).unwrap();
        assert!(buf.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    // ── bitmap brushes ────────────────────────────────────────────────────

    const A: [u8; 4] = [255, 0, 0, 255];
    const B: [u8; 4] = [0, 0, 255, 255];

    /// Straight RGBA rows, `columns` repeated `rows` times.
    fn swatch(columns: &[[u8; 4]], rows: u32) -> BitmapData {
        let row: Vec<u8> = columns.iter().flatten().copied().collect();
        BitmapData::new(columns.len() as u32, rows, row.repeat(rows as usize)).unwrap()
    }

    fn fill_with_swatch(
        g: &mut OffscreenGraphics<SoftwareBackend>,
        bitmap: Rc<Bitmap>,
        tile_x: bool,
    ) {
        let brush = g.create_bitmap_brush(bitmap, tile_x, false);
        g.begin_draw();
        g.fill_rectangle(Rect::new(0.0, 0.0, 4.0, 1.0), &brush);
        g.end_draw();
    }

    fn row(g: &mut OffscreenGraphics<SoftwareBackend>, y: u32) -> Vec<[u8; 4]> {
        let (w, h) = (g.width(), g.height());
        let mut buf = vec![0u8; (w * h * 4) as usize];
        g.get_bitmap(&mut buf).unwrap();
        (0..w).map(|x| pixel(&buf, w, x, y)).collect()
    }

    #[test]
    fn repeating_swatch_tiles_across_the_fill() {
        let mut g = offscreen(4, 1);
        let bitmap = g.create_bitmap(&swatch(&[A, B], 1));
        fill_with_swatch(&mut g, bitmap, true);
        assert_eq!(row(&mut g, 0), vec![A, B, A, B]);
    }

    #[test]
    fn clamped_swatch_holds_the_edge_texel() {
        let mut g = offscreen(4, 1);
        let bitmap = g.create_bitmap(&swatch(&[A, B], 1));
        fill_with_swatch(&mut g, bitmap, false);
        assert_eq!(row(&mut g, 0), vec![A, B, B, B]);
    }

    struct DoubleOnly(BitmapData);

    impl ResourceLoader for DoubleOnly {
        fn load(
            &self,
            _name: &str,
            variant: ScaleVariant,
        ) -> Result<Option<BitmapData>, ResourceError> {
            Ok((variant == ScaleVariant::X2).then(|| self.0.clone()))
        }
    }

    #[test]
    fn double_scale_swatch_is_addressed_by_logical_size() {
        let config = GraphicsConfig { pixel_scale: 2.0, ..Default::default() };
        let mut g = OffscreenGraphics::new(SoftwareBackend::new(1, 1), 8, 2, config);
        // 4x2 texels at 2x: a 2x1 logical swatch, one logical pixel per color.
        let loader = DoubleOnly(swatch(&[A, A, B, B], 2));
        let bitmap = g.load_bitmap(&loader, "swatch").unwrap();
        assert_eq!(bitmap.size(), Vec2::new(2.0, 1.0));

        fill_with_swatch(&mut g, bitmap, true);
        let expected = vec![A, A, B, B, A, A, B, B];
        assert_eq!(row(&mut g, 0), expected);
        assert_eq!(row(&mut g, 1), expected);
    }

    // ── lifetime ──────────────────────────────────────────────────────────

    #[test]
    fn target_bitmap_is_not_owned() {
        let g = offscreen(2, 2);
        assert!(!g.bitmap().owns_texture());
        assert_eq!(g.bitmap().size(), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn drop_destroys_the_target() {
        let device = SoftwareBackend::new(1, 1);
        let probe = device.share();
        let g = OffscreenGraphics::new(device, 2, 2, GraphicsConfig::default());
        assert_eq!(probe.texture_count(), 1);
        drop(g);
        assert_eq!(probe.texture_count(), 0);
    }

    #[test]
    fn offscreen_result_can_be_drawn_elsewhere() {
        let device = SoftwareBackend::new(4, 4);
        let mut screen = Graphics::new(device.share(), GraphicsConfig::default());
        let mut off = OffscreenGraphics::new(device, 2, 2, GraphicsConfig::default());
        off.begin_draw();
        off.clear(Color::WHITE);
        off.end_draw();

        screen.begin_draw(DeviceRect::new(0, 0, 4, 4), 4);
        screen.draw_bitmap(off.bitmap(), 1.0, 1.0, 1.0);
        screen.end_draw();

        let rgba = screen.backend().surface_rgba();
        assert_eq!(&rgba[(4 + 1) * 4..(4 + 1) * 4 + 4], &[255; 4]);
        assert_eq!(&rgba[..4], &[0; 4]);
    }
}
