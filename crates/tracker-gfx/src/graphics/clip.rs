use crate::coords::{DeviceRect, Rect};

use super::transform::Transform;

/// Placement of a drawing session on its target.
///
/// `viewport` is in device pixels with a bottom-left origin; local content
/// coordinates are top-left relative to it and scaled by `pixel_scale`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DeviceMapping {
    pub viewport: DeviceRect,
    pub surface_height: i32,
    pub pixel_scale: f32,
}

impl DeviceMapping {
    /// Device rectangle covered by local `rect` under `transform`: local to
    /// device pixels, then the Y flip against the surface height.
    pub fn to_device(&self, rect: Rect, transform: Transform) -> DeviceRect {
        let r = transform.apply_rect(rect);
        let s = self.pixel_scale;
        let x0 = (r.min().x * s).round() as i32;
        let x1 = (r.max().x * s).round() as i32;
        let y0 = (r.min().y * s).round() as i32;
        let y1 = (r.max().y * s).round() as i32;

        // Rows counted from the surface top edge.
        let viewport_top = self.surface_height - self.viewport.top();
        let bottom = viewport_top + y1;
        DeviceRect::new(self.viewport.x + x0, self.surface_height - bottom, x1 - x0, y1 - y0)
    }
}

/// Nested scissor rectangles. The base entry is the session viewport; each
/// push stores its intersection with the entry below, so clips only shrink.
#[derive(Debug, Clone, Default)]
pub struct ClipStack {
    stack: Vec<DeviceRect>,
}

impl ClipStack {
    pub fn new(base: DeviceRect) -> Self {
        Self { stack: vec![base] }
    }

    pub fn reset(&mut self, base: DeviceRect) {
        self.stack.clear();
        self.stack.push(base);
    }

    /// Active scissor rectangle.
    #[inline]
    pub fn current(&self) -> DeviceRect {
        self.stack.last().copied().unwrap_or_default()
    }

    /// Number of pushes not yet popped.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// Pushes `rect ∩ current` and returns it.
    pub fn push(&mut self, rect: DeviceRect) -> DeviceRect {
        let clipped = self.current().intersect(rect);
        self.stack.push(clipped);
        clipped
    }

    /// Pops one level and returns the restored rectangle. The base entry is
    /// never popped.
    pub fn pop(&mut self) -> DeviceRect {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            debug_assert!(false, "pop_clip without matching push");
        }
        self.current()
    }
}
