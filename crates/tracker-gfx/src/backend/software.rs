//! CPU reference rasterizer.
//!
//! Renders into premultiplied RGBA8 images held by a shared device. Sampling
//! is nearest-neighbour, triangles use a top-left fill rule on pixel centers
//! and blending is premultiplied source-over. Readback mimics a GL
//! framebuffer (bottom row first, BGRA) so the offscreen normalization path
//! is exercised without a GPU.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{anyhow, bail};

use super::{
    Backend, Batch, Capabilities, ChannelOrder, FramebufferId, PixelLayout, Primitive,
    RenderTargetIds, RowOrder, TextureId, Vertex, Wrap, WrapMode,
};
use crate::coords::{DeviceRect, Vec2};
use crate::geometry::stroke::segment_quad;
use crate::paint::Color;

/// Sample offsets inside a pixel when antialiasing is on.
const AA_SAMPLES: [(f32, f32); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

#[derive(Debug, Clone, Default)]
struct Image {
    width: u32,
    height: u32,
    /// Premultiplied RGBA, top row first.
    pixels: Vec<[u8; 4]>,
}

impl Image {
    fn new(width: u32, height: u32) -> Self {
        Self { width, height, pixels: vec![[0; 4]; (width * height) as usize] }
    }

    fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Self {
        let mut pixels: Vec<[u8; 4]> =
            rgba.chunks_exact(4).map(|px| [px[0], px[1], px[2], px[3]]).collect();
        pixels.resize((width * height) as usize, [0; 4]);
        Self { width, height, pixels }
    }

    /// Nearest texel at `uv`, as premultiplied floats.
    fn sample(&self, uv: [f32; 2], wrap: WrapMode) -> [f32; 4] {
        if self.width == 0 || self.height == 0 {
            return [0.0; 4];
        }
        let x = address((uv[0] * self.width as f32).floor() as i64, self.width, wrap.x);
        let y = address((uv[1] * self.height as f32).floor() as i64, self.height, wrap.y);
        let px = self.pixels[(y * self.width + x) as usize];
        px.map(|c| c as f32 / 255.0)
    }

    fn blend(&mut self, x: u32, y: u32, src: [f32; 4]) {
        let idx = (y * self.width + x) as usize;
        let dst = self.pixels[idx];
        let inv = 1.0 - src[3];
        let mut out = [0u8; 4];
        for i in 0..4 {
            let v = src[i] + dst[i] as f32 / 255.0 * inv;
            out[i] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        self.pixels[idx] = out;
    }
}

fn address(i: i64, size: u32, wrap: Wrap) -> u32 {
    let size = size as i64;
    match wrap {
        Wrap::Clamp => i.clamp(0, size - 1) as u32,
        Wrap::Repeat => i.rem_euclid(size) as u32,
    }
}

#[derive(Debug)]
struct Device {
    next_id: u32,
    surface: Image,
    textures: HashMap<TextureId, Image>,
    framebuffers: HashMap<FramebufferId, TextureId>,
}

impl Device {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Clip bounds of the bound target in top-left pixel coordinates.
#[derive(Debug, Copy, Clone)]
struct Bounds {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

/// Vertex mapped into target pixel space.
#[derive(Debug, Copy, Clone)]
struct Texel {
    p: Vec2,
    uv: [f32; 2],
    color: [f32; 4],
}

/// Software [`Backend`]. Cloning the handle is done through [`Backend::share`].
#[derive(Debug)]
pub struct SoftwareBackend {
    device: Rc<RefCell<Device>>,
    wide_lines: bool,
    target: Option<FramebufferId>,
    viewport: DeviceRect,
    scissor: DeviceRect,
    antialias: bool,
}

impl SoftwareBackend {
    /// Creates a device whose default surface is `width × height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        let full = DeviceRect::new(0, 0, width as i32, height as i32);
        Self {
            device: Rc::new(RefCell::new(Device {
                next_id: 0,
                surface: Image::new(width, height),
                textures: HashMap::new(),
                framebuffers: HashMap::new(),
            })),
            wide_lines: true,
            target: None,
            viewport: full,
            scissor: full,
            antialias: false,
        }
    }

    /// Toggles native wide-line support, so callers can exercise the
    /// quad-expansion fallback.
    pub fn with_wide_lines(mut self, enabled: bool) -> Self {
        self.wide_lines = enabled;
        self
    }

    /// Copy of the default surface as premultiplied RGBA, top row first.
    pub fn surface_rgba(&self) -> Vec<u8> {
        self.device.borrow().surface.pixels.iter().flatten().copied().collect()
    }

    /// Number of live textures, render-target textures included.
    pub fn texture_count(&self) -> usize {
        self.device.borrow().textures.len()
    }

    fn bounds(&self, width: u32, height: u32) -> Option<Bounds> {
        let (x, y, w, h) = self.scissor.to_top_left(width, height)?;
        Some(Bounds { x0: x, y0: y, x1: x + w, y1: y + h })
    }

    /// Runs `f` on the bound target image and the device's textures.
    ///
    /// The target is detached from the texture map for the duration, so a
    /// target sampling itself reads nothing.
    fn with_target(&self, f: impl FnOnce(&mut Image, &HashMap<TextureId, Image>)) {
        let mut dev = self.device.borrow_mut();
        let dev = &mut *dev;
        match self.target {
            None => f(&mut dev.surface, &dev.textures),
            Some(fb) => {
                let Some(&tex) = dev.framebuffers.get(&fb) else {
                    log::warn!("software: draw into destroyed framebuffer {fb:?} ignored");
                    return;
                };
                let Some(mut image) = dev.textures.remove(&tex) else {
                    return;
                };
                f(&mut image, &dev.textures);
                dev.textures.insert(tex, image);
            }
        }
    }

    /// Maps a batch vertex from viewport-relative to target pixel space.
    fn texel(&self, v: &Vertex, target_height: u32) -> Texel {
        let top = target_height as i32 - self.viewport.top();
        Texel {
            p: Vec2::new(v.pos[0] + self.viewport.x as f32, v.pos[1] + top as f32),
            uv: v.uv,
            color: v.color,
        }
    }
}

impl Backend for SoftwareBackend {
    fn share(&self) -> Self {
        let (w, h) = self.surface_size();
        let full = DeviceRect::new(0, 0, w as i32, h as i32);
        Self {
            device: Rc::clone(&self.device),
            wide_lines: self.wide_lines,
            target: None,
            viewport: full,
            scissor: full,
            antialias: false,
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { wide_lines: self.wide_lines }
    }

    fn surface_size(&self) -> (u32, u32) {
        let dev = self.device.borrow();
        (dev.surface.width, dev.surface.height)
    }

    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> TextureId {
        let mut dev = self.device.borrow_mut();
        let id = TextureId(dev.next_id());
        dev.textures.insert(id, Image::from_rgba(width, height, rgba));
        id
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.device.borrow_mut().textures.remove(&texture).is_none() {
            log::debug!("software: destroy of unknown texture {texture:?}");
        }
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> RenderTargetIds {
        let mut dev = self.device.borrow_mut();
        let texture = TextureId(dev.next_id());
        let framebuffer = FramebufferId(dev.next_id());
        dev.textures.insert(texture, Image::new(width, height));
        dev.framebuffers.insert(framebuffer, texture);
        RenderTargetIds { framebuffer, texture }
    }

    fn destroy_render_target(&mut self, framebuffer: FramebufferId) {
        let mut dev = self.device.borrow_mut();
        if let Some(tex) = dev.framebuffers.remove(&framebuffer) {
            dev.textures.remove(&tex);
        }
        if self.target == Some(framebuffer) {
            self.target = None;
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.target = framebuffer;
    }

    fn set_viewport(&mut self, viewport: DeviceRect) {
        self.viewport = viewport;
    }

    fn set_scissor(&mut self, scissor: DeviceRect) {
        self.scissor = scissor;
    }

    fn set_antialias(&mut self, enabled: bool) {
        self.antialias = enabled;
    }

    fn clear(&mut self, color: Color) {
        let px = color.to_premul_u8();
        self.with_target(|image, _| {
            let Some(b) = self.bounds(image.width, image.height) else {
                return;
            };
            for y in b.y0..b.y1 {
                let row = (y * image.width) as usize;
                image.pixels[row + b.x0 as usize..row + b.x1 as usize].fill(px);
            }
        });
    }

    fn draw(&mut self, batch: &Batch) {
        if batch.is_empty() {
            return;
        }
        self.with_target(|image, textures| {
            let Some(bounds) = self.bounds(image.width, image.height) else {
                return;
            };
            let source = match batch.texture {
                Some(id) => match textures.get(&id) {
                    Some(img) => Some(img),
                    None => {
                        log::warn!("software: batch samples unknown texture {id:?}");
                        return;
                    }
                },
                None => None,
            };
            let h = image.height;
            let mut raster = Raster {
                image,
                bounds,
                source,
                wrap: batch.wrap,
                antialias: self.antialias,
            };

            match batch.primitive {
                Primitive::Triangles => {
                    for tri in batch.vertices.chunks_exact(3) {
                        raster.triangle([&tri[0], &tri[1], &tri[2]].map(|v| self.texel(v, h)));
                    }
                }
                Primitive::Lines { width } => {
                    for seg in batch.vertices.chunks_exact(2) {
                        let (a, b) = (self.texel(&seg[0], h), self.texel(&seg[1], h));
                        if width > 1.0 {
                            raster.wide_line(a, b, width);
                        } else {
                            raster.line(a, b);
                        }
                    }
                }
            }
        });
    }

    fn flush(&mut self) {}

    fn read_pixels(
        &mut self,
        framebuffer: FramebufferId,
        out: &mut [u8],
    ) -> anyhow::Result<PixelLayout> {
        let dev = self.device.borrow();
        let tex = dev
            .framebuffers
            .get(&framebuffer)
            .ok_or_else(|| anyhow!("unknown framebuffer {framebuffer:?}"))?;
        let image = dev
            .textures
            .get(tex)
            .ok_or_else(|| anyhow!("framebuffer {framebuffer:?} has no texture"))?;

        let row_bytes = image.width as usize * 4;
        if out.len() != row_bytes * image.height as usize {
            bail!(
                "readback buffer is {} bytes, target {}x{} needs {}",
                out.len(),
                image.width,
                image.height,
                row_bytes * image.height as usize
            );
        }
        for (row, dst) in out.chunks_exact_mut(row_bytes).enumerate() {
            let src_row = image.height as usize - 1 - row;
            let src = &image.pixels[src_row * image.width as usize..][..image.width as usize];
            for (d, [r, g, b, a]) in dst.chunks_exact_mut(4).zip(src.iter().copied()) {
                d.copy_from_slice(&[b, g, r, a]);
            }
        }
        Ok(PixelLayout { rows: RowOrder::BottomUp, channels: ChannelOrder::Bgra })
    }
}

/// Per-draw rasterization state.
struct Raster<'a> {
    image: &'a mut Image,
    bounds: Bounds,
    source: Option<&'a Image>,
    wrap: WrapMode,
    antialias: bool,
}

/// Twice the signed area of `(a, b, p)`; positive when `p` is on the interior
/// side of `a → b` for clockwise (y-down) winding.
#[inline]
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Top edges (horizontal, heading right) and left edges (heading up) own
/// the samples lying exactly on them.
#[inline]
fn is_top_left(a: Vec2, b: Vec2) -> bool {
    let d = b - a;
    (d.y == 0.0 && d.x > 0.0) || d.y < 0.0
}

#[inline]
fn covers(w: f32, top_left: bool) -> bool {
    w > 0.0 || (w == 0.0 && top_left)
}

impl Raster<'_> {
    fn triangle(&mut self, mut v: [Texel; 3]) {
        let mut area = edge(v[0].p, v[1].p, v[2].p);
        if area == 0.0 || !area.is_finite() {
            return;
        }
        if area < 0.0 {
            v.swap(1, 2);
            area = -area;
        }
        let edges = [(v[1].p, v[2].p), (v[2].p, v[0].p), (v[0].p, v[1].p)];
        let owns = edges.map(|(a, b)| is_top_left(a, b));

        let min_x = v.iter().map(|t| t.p.x).fold(f32::INFINITY, f32::min);
        let max_x = v.iter().map(|t| t.p.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = v.iter().map(|t| t.p.y).fold(f32::INFINITY, f32::min);
        let max_y = v.iter().map(|t| t.p.y).fold(f32::NEG_INFINITY, f32::max);
        let x0 = (min_x.floor().max(self.bounds.x0 as f32)) as u32;
        let y0 = (min_y.floor().max(self.bounds.y0 as f32)) as u32;
        let x1 = (max_x.ceil().min(self.bounds.x1 as f32)).max(x0 as f32) as u32;
        let y1 = (max_y.ceil().min(self.bounds.y1 as f32)).max(y0 as f32) as u32;

        let weights = |p: Vec2| edges.map(|(a, b)| edge(a, b, p));
        let inside = |w: [f32; 3]| (0..3).all(|i| covers(w[i], owns[i]));

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = if self.antialias {
                    let hits = AA_SAMPLES
                        .iter()
                        .filter(|(dx, dy)| inside(weights(Vec2::new(x as f32 + dx, y as f32 + dy))))
                        .count();
                    hits as f32 / AA_SAMPLES.len() as f32
                } else if inside(weights(center)) {
                    1.0
                } else {
                    0.0
                };
                if coverage == 0.0 {
                    continue;
                }

                // Edge samples may sit outside the triangle; clamp so the
                // interpolated attributes stay inside the vertex hull.
                let w = weights(center).map(|w| (w / area).max(0.0));
                let sum = (w[0] + w[1] + w[2]).max(f32::EPSILON);
                let b = w.map(|w| w / sum);
                let color: [f32; 4] = std::array::from_fn(|i| {
                    v[0].color[i] * b[0] + v[1].color[i] * b[1] + v[2].color[i] * b[2]
                });
                let uv = [
                    v[0].uv[0] * b[0] + v[1].uv[0] * b[1] + v[2].uv[0] * b[2],
                    v[0].uv[1] * b[0] + v[1].uv[1] * b[1] + v[2].uv[1] * b[2],
                ];
                self.shade(x, y, color, uv, coverage);
            }
        }
    }

    /// One-pixel line; the end point is not drawn so joined segments don't
    /// double-blend their shared vertex.
    fn line(&mut self, a: Texel, b: Texel) {
        let d = b.p - a.p;
        let steps = d.x.abs().max(d.y.abs()).ceil() as u32;
        for i in 0..steps {
            let t = (i as f32 + 0.5) / steps as f32;
            let p = a.p + d * t;
            if p.x < self.bounds.x0 as f32
                || p.y < self.bounds.y0 as f32
                || p.x >= self.bounds.x1 as f32
                || p.y >= self.bounds.y1 as f32
            {
                continue;
            }
            let color: [f32; 4] =
                std::array::from_fn(|k| a.color[k] + (b.color[k] - a.color[k]) * t);
            let uv = [a.uv[0] + (b.uv[0] - a.uv[0]) * t, a.uv[1] + (b.uv[1] - a.uv[1]) * t];
            self.shade(p.x as u32, p.y as u32, color, uv, 1.0);
        }
    }

    fn wide_line(&mut self, a: Texel, b: Texel, width: f32) {
        let q = segment_quad(a.p, b.p, width, 0.0);
        let at = |p: Vec2, from: Texel| Texel { p, ..from };
        self.triangle([at(q[0], a), at(q[1], b), at(q[2], b)]);
        self.triangle([at(q[0], a), at(q[2], b), at(q[3], a)]);
    }

    fn shade(&mut self, x: u32, y: u32, color: [f32; 4], uv: [f32; 2], coverage: f32) {
        let texel = match self.source {
            Some(img) => img.sample(uv, self.wrap),
            None => [1.0; 4],
        };
        let src: [f32; 4] = std::array::from_fn(|i| color[i] * texel[i] * coverage);
        self.image.blend(x, y, src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(x: f32, y: f32, w: f32, h: f32, color: Color) -> Batch {
        let mut b = Batch::new(Primitive::Triangles, None, WrapMode::default());
        let p = [[x, y], [x + w, y], [x + w, y + h], [x, y + h]];
        for i in [0, 1, 2, 0, 2, 3] {
            b.vertices.push(Vertex::new(p[i], [0.0, 0.0], color));
        }
        b
    }

    fn pixel(backend: &SoftwareBackend, x: usize, y: usize) -> [u8; 4] {
        let (w, _) = backend.surface_size();
        let rgba = backend.surface_rgba();
        let i = (y * w as usize + x) * 4;
        [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
    }

    // ── triangles ─────────────────────────────────────────────────────────

    #[test]
    fn quad_covers_exactly_its_pixels() {
        let mut be = SoftwareBackend::new(8, 8);
        be.draw(&quad(2.0, 2.0, 3.0, 2.0, Color::WHITE));
        let painted: usize = be.surface_rgba().chunks_exact(4).filter(|p| p[3] == 255).count();
        assert_eq!(painted, 6);
        assert_eq!(pixel(&be, 2, 2), [255; 4]);
        assert_eq!(pixel(&be, 4, 3), [255; 4]);
        assert_eq!(pixel(&be, 5, 3), [0; 4]);
    }

    #[test]
    fn shared_diagonal_is_not_blended_twice() {
        let mut be = SoftwareBackend::new(4, 4);
        let half = Color::from_premul(0.0, 0.0, 0.5, 0.5);
        be.draw(&quad(0.0, 0.0, 4.0, 4.0, half));
        let px: Vec<[u8; 4]> = (0..4).map(|i| pixel(&be, i, i)).collect();
        assert!(px.iter().all(|p| *p == px[0]));
        assert_eq!(px[0][3], 128);
    }

    #[test]
    fn premultiplied_source_over() {
        let mut be = SoftwareBackend::new(1, 1);
        be.draw(&quad(0.0, 0.0, 1.0, 1.0, Color::from_premul(1.0, 0.0, 0.0, 1.0)));
        be.draw(&quad(0.0, 0.0, 1.0, 1.0, Color::from_premul(0.0, 0.0, 0.5, 0.5)));
        assert_eq!(pixel(&be, 0, 0), [128, 0, 128, 255]);
    }

    #[test]
    fn antialias_gives_partial_coverage() {
        let mut be = SoftwareBackend::new(2, 1);
        be.set_antialias(true);
        be.draw(&quad(0.0, 0.0, 1.5, 1.0, Color::WHITE));
        assert_eq!(pixel(&be, 0, 0)[3], 255);
        assert_eq!(pixel(&be, 1, 0)[3], 128);
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[test]
    fn scissor_limits_drawing() {
        let mut be = SoftwareBackend::new(4, 4);
        // Bottom-left origin: the top row of the surface.
        be.set_scissor(DeviceRect::new(0, 3, 4, 1));
        be.draw(&quad(0.0, 0.0, 4.0, 4.0, Color::WHITE));
        assert_eq!(pixel(&be, 0, 0), [255; 4]);
        assert_eq!(pixel(&be, 0, 1), [0; 4]);
    }

    #[test]
    fn viewport_offsets_vertices() {
        let mut be = SoftwareBackend::new(4, 4);
        be.set_viewport(DeviceRect::new(2, 0, 2, 2));
        be.draw(&quad(0.0, 0.0, 1.0, 1.0, Color::WHITE));
        // Viewport top-left sits at row 2 counted from the top.
        assert_eq!(pixel(&be, 2, 2), [255; 4]);
        assert_eq!(pixel(&be, 0, 0), [0; 4]);
    }

    #[test]
    fn clear_respects_scissor() {
        let mut be = SoftwareBackend::new(2, 2);
        be.set_scissor(DeviceRect::new(0, 0, 1, 2));
        be.clear(Color::BLACK);
        assert_eq!(pixel(&be, 0, 1), [0, 0, 0, 255]);
        assert_eq!(pixel(&be, 1, 1), [0; 4]);
    }

    // ── textures ──────────────────────────────────────────────────────────

    #[test]
    fn repeat_wrap_tiles_texture() {
        let mut be = SoftwareBackend::new(4, 1);
        let tex = be.create_texture(2, 1, &[255, 0, 0, 255, 0, 0, 255, 255]);
        let wrap = WrapMode { x: Wrap::Repeat, y: Wrap::Clamp };
        let mut b = Batch::new(Primitive::Triangles, Some(tex), wrap);
        let p = [[0.0, 0.0], [4.0, 0.0], [4.0, 1.0], [0.0, 1.0]];
        let uv = [[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [0.0, 1.0]];
        for i in [0, 1, 2, 0, 2, 3] {
            b.vertices.push(Vertex::new(p[i], uv[i], Color::WHITE));
        }
        be.draw(&b);
        assert_eq!(pixel(&be, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&be, 1, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&be, 2, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn shared_handles_see_the_same_textures() {
        let mut a = SoftwareBackend::new(1, 1);
        let b = a.share();
        a.create_texture(1, 1, &[0; 4]);
        assert_eq!(b.texture_count(), 1);
    }

    // ── lines ─────────────────────────────────────────────────────────────

    #[test]
    fn thin_line_skips_last_pixel() {
        let mut be = SoftwareBackend::new(4, 1);
        let mut b = Batch::new(Primitive::Lines { width: 1.0 }, None, WrapMode::default());
        b.vertices.push(Vertex::new([0.0, 0.5], [0.0; 2], Color::WHITE));
        b.vertices.push(Vertex::new([3.0, 0.5], [0.0; 2], Color::WHITE));
        be.draw(&b);
        assert_eq!(pixel(&be, 2, 0), [255; 4]);
        assert_eq!(pixel(&be, 3, 0), [0; 4]);
    }

    #[test]
    fn wide_line_covers_its_width() {
        let mut be = SoftwareBackend::new(4, 4);
        let mut b = Batch::new(Primitive::Lines { width: 2.0 }, None, WrapMode::default());
        b.vertices.push(Vertex::new([0.0, 2.0], [0.0; 2], Color::WHITE));
        b.vertices.push(Vertex::new([4.0, 2.0], [0.0; 2], Color::WHITE));
        be.draw(&b);
        assert_eq!(pixel(&be, 0, 1), [255; 4]);
        assert_eq!(pixel(&be, 3, 2), [255; 4]);
        assert_eq!(pixel(&be, 0, 0), [0; 4]);
    }

    // ── readback ──────────────────────────────────────────────────────────

    #[test]
    fn readback_is_bottom_up_bgra() {
        let mut be = SoftwareBackend::new(1, 1);
        let rt = be.create_render_target(1, 2);
        be.bind_framebuffer(Some(rt.framebuffer));
        be.set_viewport(DeviceRect::new(0, 0, 1, 2));
        be.set_scissor(DeviceRect::new(0, 0, 1, 2));
        be.draw(&quad(0.0, 0.0, 1.0, 1.0, Color::from_premul(1.0, 0.0, 0.0, 1.0)));

        let mut out = vec![0u8; 8];
        let layout = be.read_pixels(rt.framebuffer, &mut out).unwrap();
        assert_eq!(layout, PixelLayout { rows: RowOrder::BottomUp, channels: ChannelOrder::Bgra });
        // Top row (red) comes last.
        assert_eq!(&out[..4], &[0, 0, 0, 0]);
        assert_eq!(&out[4..], &[0, 0, 255, 255]);
    }

    #[test]
    fn readback_rejects_wrong_buffer_size() {
        let mut be = SoftwareBackend::new(1, 1);
        let rt = be.create_render_target(2, 2);
        let mut out = vec![0u8; 4];
        assert!(be.read_pixels(rt.framebuffer, &mut out).is_err());
    }

    #[test]
    fn destroying_target_frees_its_texture() {
        let mut be = SoftwareBackend::new(1, 1);
        let rt = be.create_render_target(2, 2);
        assert_eq!(be.texture_count(), 1);
        be.destroy_render_target(rt.framebuffer);
        assert_eq!(be.texture_count(), 0);
    }
}
