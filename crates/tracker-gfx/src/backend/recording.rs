//! Test backend that records every call instead of drawing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{
    Backend, Batch, Capabilities, ChannelOrder, FramebufferId, PixelLayout, RenderTargetIds,
    RowOrder, TextureId,
};
use crate::coords::DeviceRect;
use crate::paint::Color;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateTexture(TextureId),
    DestroyTexture(TextureId),
    CreateTarget(RenderTargetIds),
    DestroyTarget(FramebufferId),
    Bind(Option<FramebufferId>),
    Viewport(DeviceRect),
    Scissor(DeviceRect),
    Antialias(bool),
    Clear(Color),
    Draw(Batch),
    Flush,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordingBackend {
    log: Rc<RefCell<Vec<Call>>>,
    next_id: Rc<Cell<u32>>,
    caps: Capabilities,
}

impl RecordingBackend {
    pub(crate) fn new(caps: Capabilities) -> Self {
        Self { log: Rc::default(), next_id: Rc::default(), caps }
    }

    /// Shared view of the call log, readable after the backend moved into a context.
    pub(crate) fn log(&self) -> Rc<RefCell<Vec<Call>>> {
        Rc::clone(&self.log)
    }

    fn next(&self) -> u32 {
        self.next_id.set(self.next_id.get() + 1);
        self.next_id.get()
    }

    fn push(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

/// Batches recorded in `log`, in submission order.
pub(crate) fn draws(log: &[Call]) -> Vec<Batch> {
    log.iter()
        .filter_map(|c| match c {
            Call::Draw(b) => Some(b.clone()),
            _ => None,
        })
        .collect()
}

/// Scissor rectangles recorded in `log`, in call order.
pub(crate) fn scissors(log: &[Call]) -> Vec<DeviceRect> {
    log.iter()
        .filter_map(|c| match c {
            Call::Scissor(r) => Some(*r),
            _ => None,
        })
        .collect()
}

impl Backend for RecordingBackend {
    fn share(&self) -> Self {
        self.clone()
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn surface_size(&self) -> (u32, u32) {
        (640, 480)
    }

    fn create_texture(&mut self, _width: u32, _height: u32, _rgba: &[u8]) -> TextureId {
        let id = TextureId(self.next());
        self.push(Call::CreateTexture(id));
        id
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.push(Call::DestroyTexture(texture));
    }

    fn create_render_target(&mut self, _width: u32, _height: u32) -> RenderTargetIds {
        let ids = RenderTargetIds {
            texture: TextureId(self.next()),
            framebuffer: FramebufferId(self.next()),
        };
        self.push(Call::CreateTarget(ids));
        ids
    }

    fn destroy_render_target(&mut self, framebuffer: FramebufferId) {
        self.push(Call::DestroyTarget(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.push(Call::Bind(framebuffer));
    }

    fn set_viewport(&mut self, viewport: DeviceRect) {
        self.push(Call::Viewport(viewport));
    }

    fn set_scissor(&mut self, scissor: DeviceRect) {
        self.push(Call::Scissor(scissor));
    }

    fn set_antialias(&mut self, enabled: bool) {
        self.push(Call::Antialias(enabled));
    }

    fn clear(&mut self, color: Color) {
        self.push(Call::Clear(color));
    }

    fn draw(&mut self, batch: &Batch) {
        self.push(Call::Draw(batch.clone()));
    }

    fn flush(&mut self) {
        self.push(Call::Flush);
    }

    fn read_pixels(
        &mut self,
        _framebuffer: FramebufferId,
        out: &mut [u8],
    ) -> anyhow::Result<PixelLayout> {
        out.fill(0);
        Ok(PixelLayout { rows: RowOrder::TopDown, channels: ChannelOrder::Rgba })
    }
}
