use std::rc::Rc;

use crate::backend::{
    Backend, Batch, Capabilities, FramebufferId, Primitive, TextureId, Vertex, WrapMode,
};
use crate::coords::{DeviceRect, Rect, Vec2};
use crate::geometry::{Geometry, stroke};
use crate::paint::{BitmapBrush, Brush, Color, Gradient, GradientCache, Quad, fill_rect};
use crate::resources::{
    Bitmap, BitmapData, ReleaseQueue, ResourceError, ResourceLoader, ScaleVariant,
};
use crate::text::{Font, FontError, TextExtent};

use super::clip::{ClipStack, DeviceMapping};
use super::config::GraphicsConfig;
use super::transform::{Transform, TransformStack};

/// Quad corner indices as two triangles.
const QUAD_TRIANGLES: [usize; 6] = [0, 1, 2, 0, 2, 3];

/// Immediate-mode 2D drawing context over a [`Backend`].
///
/// Frame lifecycle:
/// - `begin_draw` binds the target and resets the transform and clip stacks
/// - draw calls append to the current batch; state changes flush it
/// - `end_draw` flushes and checks that every push was popped
///
/// Resources created here (bitmaps, brushes, fonts, geometries) may outlive
/// a session. Textures of dropped bitmaps are destroyed at the next session
/// boundary.
pub struct Graphics<B: Backend> {
    backend: B,
    config: GraphicsConfig,
    capabilities: Capabilities,

    transforms: TransformStack,
    clips: ClipStack,
    mapping: DeviceMapping,
    drawing: bool,

    batch: Option<Batch>,
    gradients: GradientCache,
    releases: Rc<ReleaseQueue>,
}

impl<B: Backend> Graphics<B> {
    pub fn new(backend: B, config: GraphicsConfig) -> Self {
        let capabilities = backend.capabilities();
        let (w, h) = backend.surface_size();
        let viewport = DeviceRect::new(0, 0, w as i32, h as i32);
        log::debug!("graphics context: {capabilities:?}, pixel scale {}", config.pixel_scale);

        Self {
            backend,
            config,
            capabilities,
            transforms: TransformStack::new(),
            clips: ClipStack::new(viewport),
            mapping: DeviceMapping {
                viewport,
                surface_height: h as i32,
                pixel_scale: config.pixel_scale,
            },
            drawing: false,
            batch: None,
            gradients: GradientCache::new(),
            releases: Rc::new(ReleaseQueue::default()),
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    #[inline]
    pub fn pixel_scale(&self) -> f32 {
        self.config.pixel_scale
    }

    pub(crate) fn release_queue(&self) -> Rc<ReleaseQueue> {
        Rc::clone(&self.releases)
    }

    // ── session ───────────────────────────────────────────────────────────

    /// Starts drawing into `viewport` of the default surface, which is
    /// `surface_height` device pixels tall.
    pub fn begin_draw(&mut self, viewport: DeviceRect, surface_height: u32) {
        self.begin_session(None, viewport, surface_height);
    }

    pub(crate) fn begin_session(
        &mut self,
        target: Option<FramebufferId>,
        viewport: DeviceRect,
        surface_height: u32,
    ) {
        debug_assert!(!self.drawing, "begin_draw while a session is open");
        self.release_pending();

        self.backend.bind_framebuffer(target);
        self.backend.set_viewport(viewport);
        self.backend.set_scissor(viewport);
        self.backend.set_antialias(self.config.antialias);

        self.mapping = DeviceMapping {
            viewport,
            surface_height: surface_height as i32,
            pixel_scale: self.config.pixel_scale,
        };
        self.transforms.reset();
        self.clips.reset(viewport);
        self.drawing = true;
    }

    /// Submits everything drawn since `begin_draw`.
    pub fn end_draw(&mut self) {
        debug_assert!(self.drawing, "end_draw without begin_draw");
        debug_assert_eq!(self.transforms.depth(), 0, "unbalanced push_transform at end_draw");
        debug_assert_eq!(self.clips.depth(), 0, "unbalanced push_clip at end_draw");

        self.flush_batch();
        self.backend.flush();
        self.drawing = false;
        self.release_pending();
    }

    /// Clears the active clip area, ignoring blending.
    pub fn clear(&mut self, color: Color) {
        self.flush_batch();
        self.backend.clear(color);
    }

    pub fn set_antialias(&mut self, enabled: bool) {
        if self.config.antialias != enabled {
            self.flush_batch();
            self.backend.set_antialias(enabled);
            self.config.antialias = enabled;
        }
    }

    // ── transform & clip ──────────────────────────────────────────────────

    #[inline]
    pub fn transform(&self) -> Transform {
        self.transforms.current()
    }

    pub fn push_translation(&mut self, dx: f32, dy: f32) {
        self.transforms.push_translation(dx, dy);
    }

    pub fn push_transform(&mut self, tx: f32, ty: f32, sx: f32, sy: f32) {
        self.transforms.push_transform(tx, ty, sx, sy);
    }

    pub fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    /// Active scissor rectangle in device pixels (bottom-left origin).
    #[inline]
    pub fn current_clip(&self) -> DeviceRect {
        self.clips.current()
    }

    /// Restricts drawing to the local rectangle `(x0, y0)–(x1, y1)`,
    /// intersected with the enclosing clip.
    pub fn push_clip(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        let local = Rect::from_corners(Vec2::new(x0, y0), Vec2::new(x1, y1));
        let device = self.mapping.to_device(local, self.transforms.current());
        self.flush_batch();
        let active = self.clips.push(device);
        self.backend.set_scissor(active);
    }

    pub fn pop_clip(&mut self) {
        self.flush_batch();
        let active = self.clips.pop();
        self.backend.set_scissor(active);
    }

    // ── resources ─────────────────────────────────────────────────────────

    /// Uploads decoded straight-alpha pixels.
    pub fn create_bitmap(&mut self, data: &BitmapData) -> Rc<Bitmap> {
        self.upload_bitmap(data, 1.0)
    }

    /// Loads `name` at the variant matching the pixel scale, falling back to
    /// smaller variants when one is absent. A malformed variant is an error,
    /// never a reason to fall back.
    pub fn load_bitmap(
        &mut self,
        loader: &dyn ResourceLoader,
        name: &str,
    ) -> Result<Rc<Bitmap>, ResourceError> {
        let preferred = ScaleVariant::for_scale(self.config.pixel_scale);
        for variant in preferred.fallbacks() {
            if let Some(data) = loader.load(name, variant)? {
                if variant != preferred {
                    log::debug!("bitmap `{name}`: no {preferred:?} variant, using {variant:?}");
                }
                return Ok(self.upload_bitmap(&data, variant.factor()));
            }
        }
        Err(ResourceError::Missing { name: name.to_owned() })
    }

    fn upload_bitmap(&mut self, data: &BitmapData, scale: f32) -> Rc<Bitmap> {
        let (width, height) = (data.width(), data.height());
        let texture = self.backend.create_texture(width, height, &data.premultiplied());
        let releases = Rc::clone(&self.releases);
        Rc::new(Bitmap::owned(texture, width, height, scale, releases))
    }

    pub fn create_solid_brush(&self, color: Color) -> Brush {
        color.debug_assert_premul();
        Brush::solid(color)
    }

    /// Two-color gradient; exactly one of `extent_x`/`extent_y` must be nonzero.
    pub fn create_gradient_brush(
        &self,
        color0: Color,
        color1: Color,
        extent_x: f32,
        extent_y: f32,
    ) -> Brush {
        Brush::Gradient(Gradient::new(color0, color1, extent_x, extent_y))
    }

    pub fn create_bitmap_brush(&self, bitmap: Rc<Bitmap>, tile_x: bool, tile_y: bool) -> Brush {
        Brush::Bitmap(BitmapBrush { bitmap, tile_x, tile_y })
    }

    /// Cached vertical bevel gradient for `color` over `height`.
    pub fn vertical_gradient(&mut self, color: Color, height: f32) -> Rc<Brush> {
        self.gradients.vertical(color, height)
    }

    pub fn create_geometry(&self, points: impl Into<Vec<Vec2>>, closed: bool) -> Geometry {
        Geometry::new(points, closed)
    }

    /// Parses a BMFont description bound to its already uploaded atlas.
    pub fn create_font(&self, description: &str, atlas: Rc<Bitmap>) -> Result<Font, FontError> {
        Font::parse(description, atlas)
    }

    // ── drawing ───────────────────────────────────────────────────────────

    pub fn fill_rectangle(&mut self, rect: Rect, brush: &Brush) {
        let vertices: Vec<Vertex> =
            fill_rect(rect, brush).iter().flat_map(|q| self.quad_vertices(q)).collect();
        self.submit(Primitive::Triangles, brush.texture(), vertices);
    }

    /// Outlines `rect` with a stroke of `width` centered on its edges.
    pub fn draw_rectangle(&mut self, rect: Rect, brush: &Brush, width: f32) {
        let rect = rect.normalized();
        let origin = rect.min();
        let [tl, tr, br, bl] = rect.corners();

        if width <= 1.0 || self.capabilities.wide_lines {
            let edges = [(tl, tr), (tr, br), (br, bl), (bl, tl)];
            self.stroke_lines(&edges, origin, brush, width);
            return;
        }

        // Horizontal edges carry the corners; vertical edges stop short of them.
        let half = width * 0.5;
        let mut quads = vec![
            stroke::segment_quad(tl, tr, width, half),
            stroke::segment_quad(bl, br, width, half),
        ];
        if rect.height() > width {
            quads.push(stroke::segment_quad(tl, bl, width, -half));
            quads.push(stroke::segment_quad(tr, br, width, -half));
        }
        self.stroke_quads(&quads, origin, brush);
    }

    pub fn draw_line(&mut self, p0: Vec2, p1: Vec2, brush: &Brush, width: f32) {
        let origin = Rect::from_corners(p0, p1).min();
        if width <= 1.0 || self.capabilities.wide_lines {
            self.stroke_lines(&[(p0, p1)], origin, brush, width);
        } else {
            self.stroke_quads(&[stroke::segment_quad(p0, p1, width, 0.0)], origin, brush);
        }
    }

    /// Fills `geometry` placed at `offset` with a fan around its first point.
    pub fn fill_geometry(&mut self, geometry: &Geometry, offset: Vec2, brush: &Brush) {
        let vertices: Vec<Vertex> = geometry
            .fan_triangles()
            .flatten()
            .map(|p| self.shaded_vertex(brush, offset, p + offset))
            .collect();
        self.submit(Primitive::Triangles, brush.texture(), vertices);
    }

    /// Strokes `geometry` placed at `offset`. Widths above one use the
    /// geometry's cached outline.
    pub fn draw_geometry(&mut self, geometry: &Geometry, offset: Vec2, brush: &Brush, width: f32) {
        if width <= 1.0 {
            let segments: Vec<(Vec2, Vec2)> =
                geometry.segments().map(|(a, b)| (a + offset, b + offset)).collect();
            self.stroke_lines(&segments, offset, brush, 1.0);
            return;
        }

        let outline = geometry.stroke_outline(width);
        let mut vertices = Vec::with_capacity(outline.len().saturating_sub(2) * 3);
        for k in 0..(outline.len() / 2).saturating_sub(1) {
            let quad = [outline[2 * k], outline[2 * k + 2], outline[2 * k + 3], outline[2 * k + 1]];
            vertices.extend(
                QUAD_TRIANGLES.map(|i| self.shaded_vertex(brush, offset, quad[i] + offset)),
            );
        }
        self.submit(Primitive::Triangles, brush.texture(), vertices);
    }

    /// Draws `bitmap` at its logical size with the top-left corner at `(x, y)`.
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, x: f32, y: f32, opacity: f32) {
        let size = bitmap.size();
        let src = Rect::new(0.0, 0.0, bitmap.width() as f32, bitmap.height() as f32);
        self.draw_bitmap_rect(bitmap, src, Rect::new(x, y, size.x, size.y), opacity);
    }

    /// Draws the `src` region of `bitmap` (in bitmap pixels) stretched over `dst`.
    pub fn draw_bitmap_rect(&mut self, bitmap: &Bitmap, src: Rect, dst: Rect, opacity: f32) {
        let w = (bitmap.width() as f32).max(1.0);
        let h = (bitmap.height() as f32).max(1.0);
        let (s0, s1) = (src.min(), src.max());
        let quad = Quad {
            corners: dst.corners(),
            colors: [Color::WHITE.with_opacity(opacity); 4],
            uvs: [
                [s0.x / w, s0.y / h],
                [s1.x / w, s0.y / h],
                [s1.x / w, s1.y / h],
                [s0.x / w, s1.y / h],
            ],
        };
        let vertices = self.quad_vertices(&quad).to_vec();
        self.submit(Primitive::Triangles, Some((bitmap.texture(), WrapMode::default())), vertices);
    }

    /// Draws one line of text with its baseline at `y`, anchored at `x`
    /// according to the font's alignment. All glyphs go out in one batch.
    pub fn draw_text(&mut self, text: &str, font: &Font, x: f32, y: f32, brush: &Brush) {
        let dx = font.alignment_offset(text);
        let color = brush.tint();
        let vertices: Vec<Vertex> = font
            .layout(text, Vec2::new(x + dx, y))
            .iter()
            .flat_map(|g| {
                let [u0, v0, u1, v1] = g.uv;
                let quad = Quad {
                    corners: g.rect.corners(),
                    colors: [color; 4],
                    uvs: [[u0, v0], [u1, v0], [u1, v1], [u0, v1]],
                };
                self.quad_vertices(&quad)
            })
            .collect();
        let atlas = Some((font.atlas().texture(), WrapMode::default()));
        self.submit(Primitive::Triangles, atlas, vertices);
    }

    /// [`draw_text`](Self::draw_text) after shortening `text` to `max_width`
    /// under the font's ellipsis policy.
    pub fn draw_text_fitted(
        &mut self,
        text: &str,
        font: &Font,
        x: f32,
        y: f32,
        max_width: f32,
        brush: &Brush,
    ) {
        let fitted = font.fit(text, max_width);
        self.draw_text(&fitted, font, x, y, brush);
    }

    pub fn measure_string(&self, text: &str, font: &Font) -> TextExtent {
        font.measure(text)
    }

    /// Drops cached brushes and destroys textures of released bitmaps.
    /// Also run on drop.
    pub fn dispose(&mut self) {
        self.batch = None;
        if !self.gradients.is_empty() {
            log::debug!("graphics context: dropping {} cached gradients", self.gradients.len());
        }
        self.gradients.clear();
        self.release_pending();
    }

    // ── batching ──────────────────────────────────────────────────────────

    fn device_point(&self, p: Vec2) -> [f32; 2] {
        let d = self.transforms.current().apply(p) * self.config.pixel_scale;
        [d.x, d.y]
    }

    fn shaded_vertex(&self, brush: &Brush, origin: Vec2, p: Vec2) -> Vertex {
        let (color, uv) = brush.shade(origin, p);
        Vertex::new(self.device_point(p), uv, color)
    }

    fn quad_vertices(&self, q: &Quad) -> [Vertex; 6] {
        QUAD_TRIANGLES.map(|i| Vertex::new(self.device_point(q.corners[i]), q.uvs[i], q.colors[i]))
    }

    /// Line width in device pixels for the current transform.
    fn device_line_width(&self, width: f32) -> f32 {
        if width <= 1.0 {
            return 1.0;
        }
        let s = self.transforms.current().scale;
        width * self.config.pixel_scale * (s.x.abs() + s.y.abs()) * 0.5
    }

    fn stroke_lines(&mut self, segments: &[(Vec2, Vec2)], origin: Vec2, brush: &Brush, width: f32) {
        let vertices: Vec<Vertex> = segments
            .iter()
            .flat_map(|&(a, b)| {
                [self.shaded_vertex(brush, origin, a), self.shaded_vertex(brush, origin, b)]
            })
            .collect();
        let primitive = Primitive::Lines { width: self.device_line_width(width) };
        self.submit(primitive, brush.texture(), vertices);
    }

    fn stroke_quads(&mut self, quads: &[[Vec2; 4]], origin: Vec2, brush: &Brush) {
        let vertices: Vec<Vertex> = quads
            .iter()
            .flat_map(|q| QUAD_TRIANGLES.map(|i| self.shaded_vertex(brush, origin, q[i])))
            .collect();
        self.submit(Primitive::Triangles, brush.texture(), vertices);
    }

    fn submit(
        &mut self,
        primitive: Primitive,
        texture: Option<(TextureId, WrapMode)>,
        vertices: Vec<Vertex>,
    ) {
        debug_assert!(self.drawing, "draw call outside begin_draw/end_draw");
        if vertices.is_empty() {
            return;
        }
        let (texture, wrap) = match texture {
            Some((t, w)) => (Some(t), w),
            None => (None, WrapMode::default()),
        };
        if !self.batch.as_ref().is_some_and(|b| b.accepts(primitive, texture, wrap)) {
            self.flush_batch();
            self.batch = Some(Batch::new(primitive, texture, wrap));
        }
        if let Some(batch) = self.batch.as_mut() {
            batch.vertices.extend(vertices);
        }
    }

    fn flush_batch(&mut self) {
        if let Some(batch) = self.batch.take() {
            if !batch.is_empty() {
                self.backend.draw(&batch);
            }
        }
    }

    fn release_pending(&mut self) {
        let released = self.releases.drain();
        if !released.is_empty() {
            log::trace!("releasing {} textures", released.len());
        }
        for texture in released {
            self.backend.destroy_texture(texture);
        }
    }
}

impl<B: Backend> Drop for Graphics<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::backend::recording::{Call, RecordingBackend, draws, scissors};
    use crate::text::Alignment;

    type Log = Rc<RefCell<Vec<Call>>>;

    fn context(caps: Capabilities) -> (Graphics<RecordingBackend>, Log) {
        let backend = RecordingBackend::new(caps);
        let log = backend.log();
        let config = GraphicsConfig { antialias: false, ..Default::default() };
        let mut g = Graphics::new(backend, config);
        g.begin_draw(DeviceRect::new(0, 0, 200, 100), 100);
        (g, log)
    }

    fn red() -> Color {
        Color::from_straight(1.0, 0.0, 0.0, 1.0)
    }

    fn blue() -> Color {
        Color::from_straight(0.0, 0.0, 1.0, 1.0)
    }

    // ── batching ──────────────────────────────────────────────────────────

    #[test]
    fn same_state_fills_merge_into_one_batch() {
        let (mut g, log) = context(Capabilities::default());
        g.fill_rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), &Brush::Solid(red()));
        g.fill_rectangle(Rect::new(20.0, 0.0, 10.0, 10.0), &Brush::Solid(blue()));
        g.end_draw();

        let d = draws(&log.borrow());
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].vertices.len(), 12);
    }

    #[test]
    fn texture_change_splits_batches() {
        let (mut g, log) = context(Capabilities::default());
        let bmp = g.create_bitmap(&BitmapData::filled(2, 2, [255; 4]));
        g.fill_rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), &Brush::Solid(red()));
        let swatch = g.create_bitmap_brush(bmp.clone(), true, false);
        g.fill_rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), &swatch);
        g.fill_rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), &Brush::Solid(red()));
        g.end_draw();

        let d = draws(&log.borrow());
        assert_eq!(d.len(), 3);
        assert_eq!(d[1].texture, Some(bmp.texture()));
        assert_eq!(d[1].wrap.x, crate::backend::Wrap::Repeat);
    }

    #[test]
    fn clip_push_flushes_pending_batch() {
        let (mut g, log) = context(Capabilities::default());
        g.fill_rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), &Brush::Solid(red()));
        g.push_clip(0.0, 0.0, 5.0, 5.0);
        assert_eq!(draws(&log.borrow()).len(), 1);
        g.pop_clip();
        g.end_draw();
    }

    #[test]
    fn vertices_are_scaled_to_device_pixels() {
        let backend = RecordingBackend::new(Capabilities::default());
        let log = backend.log();
        let mut g = Graphics::new(backend, GraphicsConfig { pixel_scale: 2.0, antialias: false });
        g.begin_draw(DeviceRect::new(0, 0, 200, 100), 100);
        g.push_translation(1.0, 0.0);
        g.fill_rectangle(Rect::new(1.0, 1.0, 2.0, 2.0), &Brush::Solid(red()));
        g.pop_transform();
        g.end_draw();

        let d = draws(&log.borrow());
        assert_eq!(d[0].vertices[0].pos, [4.0, 2.0]);
        assert_eq!(d[0].vertices[2].pos, [8.0, 6.0]);
    }

    // ── clips ─────────────────────────────────────────────────────────────

    #[test]
    fn clip_follows_translation_and_restores_on_pop() {
        let (mut g, log) = context(Capabilities::default());
        g.push_translation(5.0, 10.0);
        g.push_clip(0.0, 0.0, 10.0, 10.0);
        assert_eq!(g.current_clip(), DeviceRect::new(5, 80, 10, 10));
        g.push_clip(-100.0, -100.0, 100.0, 100.0);
        assert_eq!(g.current_clip(), DeviceRect::new(5, 80, 10, 10));
        g.pop_clip();
        g.pop_clip();
        g.pop_transform();
        g.end_draw();

        let s = scissors(&log.borrow());
        let viewport = DeviceRect::new(0, 0, 200, 100);
        assert_eq!(s.first(), Some(&viewport));
        assert_eq!(s.last(), Some(&viewport));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "unbalanced push_clip")]
    fn unbalanced_clip_asserts_at_end_draw() {
        let (mut g, _log) = context(Capabilities::default());
        g.push_clip(0.0, 0.0, 5.0, 5.0);
        g.end_draw();
    }

    // ── brushes ───────────────────────────────────────────────────────────

    #[test]
    fn gradient_spanning_fill_hits_both_colors_exactly() {
        let (mut g, log) = context(Capabilities::default());
        let brush = g.create_gradient_brush(red(), blue(), 40.0, 0.0);
        g.fill_rectangle(Rect::new(0.0, 0.0, 40.0, 10.0), &brush);
        g.end_draw();

        let d = draws(&log.borrow());
        let v = &d[0].vertices;
        // Triangle order: TL, TR, BR, TL, BR, BL.
        assert_eq!(v[0].color, red().to_array());
        assert_eq!(v[1].color, blue().to_array());
        assert_eq!(v[5].color, red().to_array());
    }

    #[test]
    fn vertical_gradients_are_cached_until_dispose() {
        let (mut g, _log) = context(Capabilities::default());
        let a = g.vertical_gradient(red(), 20.0);
        let b = g.vertical_gradient(red(), 20.0);
        let c = g.vertical_gradient(red(), 21.0);
        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        g.end_draw();
        g.dispose();
        let d = g.vertical_gradient(red(), 20.0);
        assert!(!Rc::ptr_eq(&a, &d));
    }

    // ── strokes ───────────────────────────────────────────────────────────

    #[test]
    fn thin_lines_use_line_primitive() {
        let (mut g, log) = context(Capabilities::default());
        g.draw_line(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), &Brush::Solid(red()), 1.0);
        g.end_draw();
        let d = draws(&log.borrow());
        assert_eq!(d[0].primitive, Primitive::Lines { width: 1.0 });
        assert_eq!(d[0].vertices.len(), 2);
    }

    #[test]
    fn wide_lines_without_capability_become_quads() {
        let (mut g, log) = context(Capabilities { wide_lines: false });
        g.draw_line(Vec2::new(0.0, 5.0), Vec2::new(10.0, 5.0), &Brush::Solid(red()), 4.0);
        g.end_draw();
        let d = draws(&log.borrow());
        assert_eq!(d[0].primitive, Primitive::Triangles);
        let ys: Vec<f32> = d[0].vertices.iter().map(|v| v.pos[1]).collect();
        assert!(ys.iter().all(|&y| y == 3.0 || y == 7.0));
    }

    #[test]
    fn wide_lines_with_capability_stay_lines() {
        let (mut g, log) = context(Capabilities { wide_lines: true });
        g.draw_rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), &Brush::Solid(red()), 3.0);
        g.end_draw();
        let d = draws(&log.borrow());
        assert_eq!(d[0].primitive, Primitive::Lines { width: 3.0 });
        assert_eq!(d[0].vertices.len(), 8);
    }

    #[test]
    fn rectangle_stroke_fallback_does_not_overlap_corners() {
        let (mut g, log) = context(Capabilities { wide_lines: false });
        g.draw_rectangle(Rect::new(10.0, 10.0, 20.0, 20.0), &Brush::Solid(red()), 4.0);
        g.end_draw();
        let d = draws(&log.borrow());
        // Four edge quads of two triangles each.
        assert_eq!(d[0].vertices.len(), 24);
        // Left edge spans only between the horizontal bands.
        let left: Vec<f32> = d[0].vertices[12..18].iter().map(|v| v.pos[1]).collect();
        assert!(left.iter().all(|&y| y == 12.0 || y == 28.0));
    }

    #[test]
    fn geometry_stroke_reuses_cached_outline() {
        let (mut g, log) = context(Capabilities::default());
        let points = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let geo = g.create_geometry(points, false);
        let brush = Brush::Solid(red());
        g.draw_geometry(&geo, Vec2::zero(), &brush, 3.0);
        g.draw_geometry(&geo, Vec2::new(5.0, 5.0), &brush, 3.0);
        assert_eq!(geo.cached_outlines(), 1);
        g.draw_geometry(&geo, Vec2::zero(), &brush, 5.0);
        assert_eq!(geo.cached_outlines(), 2);
        g.end_draw();

        let d = draws(&log.borrow());
        // Three points: two strip quads, twelve vertices per draw.
        assert_eq!(d[0].vertices.len(), 36);
    }

    #[test]
    fn thin_closed_geometry_strokes_every_edge() {
        let (mut g, log) = context(Capabilities::default());
        let geo = Geometry::rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        g.draw_geometry(&geo, Vec2::zero(), &Brush::Solid(red()), 1.0);
        g.end_draw();
        assert_eq!(draws(&log.borrow())[0].vertices.len(), 8);
    }

    #[test]
    fn geometry_fill_is_a_fan() {
        let (mut g, log) = context(Capabilities::default());
        let geo = Geometry::rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        g.fill_geometry(&geo, Vec2::new(1.0, 1.0), &Brush::Solid(red()));
        g.end_draw();
        let d = draws(&log.borrow());
        assert_eq!(d[0].vertices.len(), 6);
        assert_eq!(d[0].vertices[0].pos, [1.0, 1.0]);
    }

    // ── text ──────────────────────────────────────────────────────────────

    #[test]
    fn text_is_one_batch_on_the_atlas() {
        let (mut g, log) = context(Capabilities::default());
        let font = crate::text::test_font();
        g.draw_text("AV.", &font, 0.0, 10.0, &Brush::Solid(red()));
        g.end_draw();

        let d = draws(&log.borrow());
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].texture, Some(font.atlas().texture()));
        assert_eq!(d[0].vertices.len(), 18);
        assert!(d[0].vertices.iter().all(|v| v.color == red().to_array()));
    }

    #[test]
    fn right_aligned_text_ends_at_anchor() {
        let (mut g, log) = context(Capabilities::default());
        let font = crate::text::test_font().with_alignment(Alignment::Right);
        g.draw_text("AV", &font, 100.0, 10.0, &Brush::Solid(red()));
        g.end_draw();

        let d = draws(&log.borrow());
        let right = d[0].vertices.iter().map(|v| v.pos[0]).fold(f32::MIN, f32::max);
        assert_eq!(right, 100.0);
    }

    #[test]
    fn blank_text_submits_nothing() {
        let (mut g, log) = context(Capabilities::default());
        let font = crate::text::test_font();
        g.draw_text("   ", &font, 0.0, 0.0, &Brush::Solid(red()));
        g.end_draw();
        assert!(draws(&log.borrow()).is_empty());
    }

    // ── resources ─────────────────────────────────────────────────────────

    struct Only(ScaleVariant);

    impl ResourceLoader for Only {
        fn load(
            &self,
            name: &str,
            variant: ScaleVariant,
        ) -> Result<Option<BitmapData>, ResourceError> {
            let hit = name == "icon" && variant == self.0;
            Ok(hit.then(|| BitmapData::filled(8, 8, [0, 0, 0, 255])))
        }
    }

    /// Has a valid 1x variant and a corrupt 2x one.
    struct CorruptLarge;

    impl ResourceLoader for CorruptLarge {
        fn load(
            &self,
            name: &str,
            variant: ScaleVariant,
        ) -> Result<Option<BitmapData>, ResourceError> {
            match variant {
                ScaleVariant::X2 => Err(ResourceError::Malformed {
                    name: name.to_owned(),
                    variant,
                    reason: "truncated".into(),
                }),
                ScaleVariant::X1_5 => Ok(None),
                ScaleVariant::X1 => Ok(Some(BitmapData::filled(8, 8, [0, 0, 0, 255]))),
            }
        }
    }

    #[test]
    fn load_bitmap_falls_back_to_smaller_variant() {
        let backend = RecordingBackend::new(Capabilities::default());
        let mut g = Graphics::new(backend, GraphicsConfig { pixel_scale: 2.0, antialias: false });

        let bmp = g.load_bitmap(&Only(ScaleVariant::X1_5), "icon").unwrap();
        assert_eq!(bmp.scale(), 1.5);
        let bmp = g.load_bitmap(&Only(ScaleVariant::X2), "icon").unwrap();
        assert_eq!(bmp.size(), Vec2::new(4.0, 4.0));
        assert_eq!(
            g.load_bitmap(&Only(ScaleVariant::X2), "other").unwrap_err(),
            ResourceError::Missing { name: "other".into() }
        );
    }

    #[test]
    fn malformed_variant_fails_instead_of_falling_back() {
        let backend = RecordingBackend::new(Capabilities::default());
        let log = backend.log();
        let mut g = Graphics::new(backend, GraphicsConfig { pixel_scale: 2.0, antialias: false });

        let err = g.load_bitmap(&CorruptLarge, "icon").unwrap_err();
        assert!(matches!(err, ResourceError::Malformed { variant: ScaleVariant::X2, .. }));
        assert!(!log.borrow().iter().any(|c| matches!(c, Call::CreateTexture(_))));

        let backend = RecordingBackend::new(Capabilities::default());
        let mut g = Graphics::new(backend, GraphicsConfig::default());
        assert_eq!(g.load_bitmap(&CorruptLarge, "icon").unwrap().scale(), 1.0);
    }

    #[test]
    fn larger_variants_are_never_used_at_low_scale() {
        let backend = RecordingBackend::new(Capabilities::default());
        let mut g = Graphics::new(backend, GraphicsConfig::default());
        assert!(g.load_bitmap(&Only(ScaleVariant::X2), "icon").is_err());
    }

    #[test]
    fn dropped_bitmaps_are_destroyed_at_session_boundary() {
        let (mut g, log) = context(Capabilities::default());
        let bmp = g.create_bitmap(&BitmapData::filled(1, 1, [255; 4]));
        let id = bmp.texture();
        drop(bmp);
        assert!(!log.borrow().contains(&Call::DestroyTexture(id)));
        g.end_draw();
        assert!(log.borrow().contains(&Call::DestroyTexture(id)));
    }

    #[test]
    fn bitmap_draw_uses_logical_size_and_opacity() {
        let (mut g, log) = context(Capabilities::default());
        let bmp = g.load_bitmap(&Only(ScaleVariant::X1), "icon").unwrap();
        g.draw_bitmap(&bmp, 2.0, 3.0, 0.5);
        g.end_draw();

        let d = draws(&log.borrow());
        let v = &d[0].vertices;
        assert_eq!(v[2].pos, [10.0, 11.0]);
        assert_eq!(v[2].uv, [1.0, 1.0]);
        assert_eq!(v[0].color, [0.5; 4]);
    }
}
