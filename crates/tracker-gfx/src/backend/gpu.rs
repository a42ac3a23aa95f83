//! wgpu implementation of [`Backend`].
//!
//! Draws are recorded into a vertex list and encoded as one render pass per
//! [`flush`](Backend::flush). The bound viewport is fixed for the lifetime of
//! a pass, so binding changes flush first. Offscreen targets are
//! `Rgba8Unorm`; the default surface is whatever view the host hands over
//! through [`WgpuBackend::set_surface`] each frame.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::{
    Backend, Batch, Capabilities, ChannelOrder, FramebufferId, PixelLayout, Primitive,
    RenderTargetIds, RowOrder, TextureId, Vertex, Wrap, WrapMode,
};
use crate::coords::DeviceRect;
use crate::paint::Color;

/// Color format of offscreen targets and uploaded bitmaps.
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Initialization parameters for a headless device.
#[derive(Debug, Clone)]
pub struct WgpuInit {
    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for WgpuInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}

/// The host's drawable for the current frame.
#[derive(Debug, Clone)]
pub struct SurfaceTarget {
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

// ── GPU types ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    viewport: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

const VERTEX_ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x2, // pos
    1 => Float32x2, // uv
    2 => Float32x4  // color
];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }
}

fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: component, alpha: component }
}

fn address_mode(wrap: Wrap) -> wgpu::AddressMode {
    match wrap {
        Wrap::Clamp => wgpu::AddressMode::ClampToEdge,
        Wrap::Repeat => wgpu::AddressMode::Repeat,
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
enum PipelineKind {
    Triangles,
    Lines,
    /// Triangles written without blending (clears).
    Replace,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// A recorded draw: a vertex range plus the state it was submitted under.
#[derive(Debug, Clone)]
struct Command {
    kind: PipelineKind,
    texture: TextureId,
    wrap: WrapMode,
    scissor: DeviceRect,
    range: Range<u32>,
}

impl Command {
    fn same_state(&self, other: &Command) -> bool {
        self.kind == other.kind
            && self.texture == other.texture
            && self.wrap == other.wrap
            && self.scissor == other.scissor
    }
}

// ── device ────────────────────────────────────────────────────────────────

/// Device-wide objects shared by every handle.
struct Shared {
    device: wgpu::Device,
    queue: wgpu::Queue,
    next_id: u32,

    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    viewport_ubo: wgpu::Buffer,

    pipelines: HashMap<(wgpu::TextureFormat, PipelineKind), wgpu::RenderPipeline>,
    samplers: HashMap<WrapMode, wgpu::Sampler>,
    bind_groups: HashMap<(TextureId, WrapMode), wgpu::BindGroup>,

    textures: HashMap<TextureId, GpuTexture>,
    framebuffers: HashMap<FramebufferId, TextureId>,
    /// 1×1 white texture bound for untextured runs.
    white: TextureId,
}

impl Shared {
    fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tracker batch shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/batch.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tracker batch bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ViewportUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tracker batch pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tracker viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut shared = Self {
            device,
            queue,
            next_id: 0,
            shader,
            bind_group_layout,
            pipeline_layout,
            viewport_ubo,
            pipelines: HashMap::new(),
            samplers: HashMap::new(),
            bind_groups: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            white: TextureId(0),
        };
        shared.white = shared.upload(1, 1, &[255; 4]);
        shared
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn allocate(&mut self, width: u32, height: u32, usage: wgpu::TextureUsages) -> TextureId {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tracker texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let id = TextureId(self.next_id());
        self.textures.insert(id, GpuTexture { texture, view, width, height });
        id
    }

    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]) -> TextureId {
        let usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        let id = self.allocate(width, height, usage);
        let Some(tex) = self.textures.get(&id) else {
            return id;
        };
        if width > 0 && height > 0 && rgba.len() as u64 == 4 * width as u64 * height as u64 {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &tex.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            );
        } else {
            log::warn!("wgpu: texture {width}x{height} given {} bytes; left blank", rgba.len());
        }
        id
    }

    fn remove_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.bind_groups.retain(|(t, _), _| *t != texture);
    }

    // ── lazy-init helpers ─────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, format: wgpu::TextureFormat, kind: PipelineKind) {
        if self.pipelines.contains_key(&(format, kind)) {
            return;
        }
        let (topology, blend) = match kind {
            PipelineKind::Triangles => {
                (wgpu::PrimitiveTopology::TriangleList, Some(premul_alpha_blend()))
            }
            PipelineKind::Lines => (wgpu::PrimitiveTopology::LineList, Some(premul_alpha_blend())),
            PipelineKind::Replace => (wgpu::PrimitiveTopology::TriangleList, None),
        };

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tracker batch pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        self.pipelines.insert((format, kind), pipeline);
    }

    /// Returns false when `texture` no longer exists.
    fn ensure_bind_group(&mut self, texture: TextureId, wrap: WrapMode) -> bool {
        if self.bind_groups.contains_key(&(texture, wrap)) {
            return true;
        }
        let Some(tex) = self.textures.get(&texture) else {
            return false;
        };
        let device = &self.device;
        let sampler = self.samplers.entry(wrap).or_insert_with(|| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("tracker sampler"),
                address_mode_u: address_mode(wrap.x),
                address_mode_v: address_mode(wrap.y),
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            })
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tracker batch bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.viewport_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&tex.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        self.bind_groups.insert((texture, wrap), bind_group);
        true
    }
}

// ── backend handle ────────────────────────────────────────────────────────

/// GPU [`Backend`] handle.
pub struct WgpuBackend {
    shared: Rc<RefCell<Shared>>,
    surface: Option<SurfaceTarget>,
    target: Option<FramebufferId>,
    viewport: DeviceRect,
    scissor: DeviceRect,

    vertices: Vec<Vertex>,
    commands: Vec<Command>,

    warned_antialias: bool,
    warned_wide_lines: bool,
    warned_no_surface: bool,
}

impl WgpuBackend {
    /// Wraps a device owned by the host (typically the one driving its window surface).
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self::from_shared(Rc::new(RefCell::new(Shared::new(device, queue))))
    }

    /// Creates a device without a window, for offscreen rendering.
    pub fn headless(init: WgpuInit) -> Result<Self> {
        pollster::block_on(Self::request(init))
    }

    async fn request(init: WgpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tracker-gfx device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        log::info!("wgpu: headless device on {:?}", adapter.get_info().backend);
        Ok(Self::new(device, queue))
    }

    fn from_shared(shared: Rc<RefCell<Shared>>) -> Self {
        Self {
            shared,
            surface: None,
            target: None,
            viewport: DeviceRect::default(),
            scissor: DeviceRect::default(),
            vertices: Vec::new(),
            commands: Vec::new(),
            warned_antialias: false,
            warned_wide_lines: false,
            warned_no_surface: false,
        }
    }

    /// Sets the drawable backing the default surface. Pending work is
    /// flushed to the previous one.
    pub fn set_surface(&mut self, surface: Option<SurfaceTarget>) {
        self.flush();
        self.surface = surface;
    }

    pub fn device(&self) -> wgpu::Device {
        self.shared.borrow().device.clone()
    }

    pub fn queue(&self) -> wgpu::Queue {
        self.shared.borrow().queue.clone()
    }

    fn record(
        &mut self,
        kind: PipelineKind,
        texture: TextureId,
        wrap: WrapMode,
        vertices: &[Vertex],
    ) {
        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        let cmd = Command {
            kind,
            texture,
            wrap,
            scissor: self.scissor,
            range: start..self.vertices.len() as u32,
        };

        match self.commands.last_mut() {
            Some(last) if last.same_state(&cmd) && last.range.end == start => {
                last.range.end = cmd.range.end
            }
            _ => self.commands.push(cmd),
        }
    }
}

impl Backend for WgpuBackend {
    fn share(&self) -> Self {
        Self::from_shared(Rc::clone(&self.shared))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { wide_lines: false }
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface.as_ref().map_or((0, 0), |s| (s.width, s.height))
    }

    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> TextureId {
        self.shared.borrow_mut().upload(width, height, rgba)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.flush();
        self.shared.borrow_mut().remove_texture(texture);
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> RenderTargetIds {
        let mut shared = self.shared.borrow_mut();
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;
        let texture = shared.allocate(width, height, usage);
        let framebuffer = FramebufferId(shared.next_id());
        shared.framebuffers.insert(framebuffer, texture);
        RenderTargetIds { framebuffer, texture }
    }

    fn destroy_render_target(&mut self, framebuffer: FramebufferId) {
        self.flush();
        let mut shared = self.shared.borrow_mut();
        if let Some(texture) = shared.framebuffers.remove(&framebuffer) {
            shared.remove_texture(texture);
        }
        if self.target == Some(framebuffer) {
            self.target = None;
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        if self.target != framebuffer {
            self.flush();
            self.target = framebuffer;
        }
    }

    fn set_viewport(&mut self, viewport: DeviceRect) {
        if self.viewport != viewport {
            self.flush();
            self.viewport = viewport;
        }
    }

    fn set_scissor(&mut self, scissor: DeviceRect) {
        self.scissor = scissor;
    }

    fn set_antialias(&mut self, enabled: bool) {
        if enabled && !self.warned_antialias {
            log::debug!("wgpu: antialiasing is not supported; drawing aliased");
            self.warned_antialias = true;
        }
    }

    fn clear(&mut self, color: Color) {
        let w = self.viewport.width as f32;
        let h = self.viewport.height as f32;
        let p = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];
        let quad: Vec<Vertex> = [0, 1, 2, 0, 2, 3]
            .iter()
            .map(|&i| Vertex::new(p[i], [0.0, 0.0], color))
            .collect();
        let white = self.shared.borrow().white;
        self.record(PipelineKind::Replace, white, WrapMode::default(), &quad);
    }

    fn draw(&mut self, batch: &Batch) {
        if batch.is_empty() {
            return;
        }
        let kind = match batch.primitive {
            Primitive::Triangles => PipelineKind::Triangles,
            Primitive::Lines { width } => {
                if width > 1.0 && !self.warned_wide_lines {
                    log::warn!("wgpu: line width {width} unsupported; drawing 1px lines");
                    self.warned_wide_lines = true;
                }
                PipelineKind::Lines
            }
        };
        let texture = batch.texture.unwrap_or_else(|| self.shared.borrow().white);
        self.record(kind, texture, batch.wrap, &batch.vertices);
    }

    fn flush(&mut self) {
        if self.commands.is_empty() {
            return;
        }
        let commands = std::mem::take(&mut self.commands);
        let vertices = std::mem::take(&mut self.vertices);

        let mut shared = self.shared.borrow_mut();
        let shared = &mut *shared;

        let (view, format, width, height) = match self.target {
            None => match &self.surface {
                Some(s) => (s.view.clone(), s.format, s.width, s.height),
                None => {
                    if !self.warned_no_surface {
                        log::warn!("wgpu: no surface bound; dropping {} draws", commands.len());
                        self.warned_no_surface = true;
                    }
                    return;
                }
            },
            Some(fb) => {
                let tex = shared.framebuffers.get(&fb).and_then(|t| shared.textures.get(t));
                let Some(tex) = tex else {
                    log::warn!("wgpu: draw into destroyed framebuffer {fb:?} ignored");
                    return;
                };
                (tex.view.clone(), TARGET_FORMAT, tex.width, tex.height)
            }
        };
        let Some((vx, vy, vw, vh)) = self.viewport.to_top_left(width, height) else {
            return;
        };

        // ── mutable operations before any immutable borrows ───────────────
        let mut live = Vec::with_capacity(commands.len());
        for cmd in commands {
            shared.ensure_pipeline(format, cmd.kind);
            if shared.ensure_bind_group(cmd.texture, cmd.wrap) {
                live.push(cmd);
            } else {
                log::warn!("wgpu: batch samples destroyed texture {:?}", cmd.texture);
            }
        }
        shared.queue.write_buffer(
            &shared.viewport_ubo,
            0,
            bytemuck::bytes_of(&ViewportUniform {
                viewport: [self.viewport.width as f32, self.viewport.height as f32],
                _pad: [0.0; 2],
            }),
        );
        let vbo = shared.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tracker batch vbo"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // ── immutable borrows ─────────────────────────────────────────────
        let mut encoder = shared.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tracker batch encoder"),
        });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tracker batch pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_viewport(vx as f32, vy as f32, vw as f32, vh as f32, 0.0, 1.0);
            rpass.set_vertex_buffer(0, vbo.slice(..));

            for cmd in &live {
                let Some((sx, sy, sw, sh)) = cmd.scissor.to_top_left(width, height) else {
                    continue;
                };
                let pipeline = shared.pipelines.get(&(format, cmd.kind));
                let bind_group = shared.bind_groups.get(&(cmd.texture, cmd.wrap));
                let (Some(pipeline), Some(bind_group)) = (pipeline, bind_group) else {
                    continue;
                };
                rpass.set_scissor_rect(sx, sy, sw, sh);
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, bind_group, &[]);
                rpass.draw(cmd.range.clone(), 0..1);
            }
        }
        shared.queue.submit(std::iter::once(encoder.finish()));
    }

    fn read_pixels(&mut self, framebuffer: FramebufferId, out: &mut [u8]) -> Result<PixelLayout> {
        self.flush();
        let shared = self.shared.borrow();
        let tex = shared
            .framebuffers
            .get(&framebuffer)
            .and_then(|t| shared.textures.get(t))
            .with_context(|| format!("unknown framebuffer {framebuffer:?}"))?;

        let row_bytes = tex.width as usize * 4;
        if out.len() != row_bytes * tex.height as usize {
            bail!(
                "readback buffer is {} bytes, target {}x{} needs {}",
                out.len(),
                tex.width,
                tex.height,
                row_bytes * tex.height as usize
            );
        }
        if out.is_empty() {
            return Ok(PixelLayout { rows: RowOrder::TopDown, channels: ChannelOrder::Rgba });
        }

        let bytes_per_row = (tex.width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer = shared.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tracker readback buffer"),
            size: u64::from(bytes_per_row) * u64::from(tex.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = shared.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tracker readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d { width: tex.width, height: tex.height, depth_or_array_layers: 1 },
        );
        shared.queue.submit(std::iter::once(encoder.finish()));

        let (sender, receiver) = std::sync::mpsc::channel();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        shared.device.poll(wgpu::PollType::wait_indefinitely()).context("device poll failed")?;
        receiver
            .recv()
            .context("readback map callback dropped")?
            .context("failed to map readback buffer")?;

        {
            let data = buffer.slice(..).get_mapped_range();
            let rows = data.chunks_exact(bytes_per_row as usize);
            for (dst, src) in out.chunks_exact_mut(row_bytes).zip(rows) {
                dst.copy_from_slice(&src[..row_bytes]);
            }
        }
        buffer.unmap();

        Ok(PixelLayout { rows: RowOrder::TopDown, channels: ChannelOrder::Rgba })
    }
}
