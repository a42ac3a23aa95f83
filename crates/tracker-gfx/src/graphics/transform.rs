use crate::coords::{Rect, Vec2};

/// Axis-aligned scale + translation, applied as `p * scale + translate`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub scale: Vec2,
    pub translate: Vec2,
}

impl Transform {
    pub const IDENTITY: Transform =
        Transform { scale: Vec2::new(1.0, 1.0), translate: Vec2::zero() };

    #[inline]
    pub fn apply(self, p: Vec2) -> Vec2 {
        p.scale(self.scale) + self.translate
    }

    /// Maps both corners; the result is normalized for negative scales.
    #[inline]
    pub fn apply_rect(self, r: Rect) -> Rect {
        Rect::from_corners(self.apply(r.min()), self.apply(r.max()))
    }

    /// Child transform: scale multiplies, translation accumulates unscaled.
    #[inline]
    pub fn then(self, tx: f32, ty: f32, sx: f32, sy: f32) -> Transform {
        Transform {
            scale: self.scale.scale(Vec2::new(sx, sy)),
            translate: self.translate + Vec2::new(tx, ty),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// LIFO stack of composed transforms. Pure bookkeeping: nothing here talks
/// to the backend.
#[derive(Debug, Clone, Default)]
pub struct TransformStack {
    current: Transform,
    saved: Vec<Transform>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> Transform {
        self.current
    }

    /// Number of pushes not yet popped.
    #[inline]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn push_translation(&mut self, dx: f32, dy: f32) {
        self.push_transform(dx, dy, 1.0, 1.0);
    }

    pub fn push_transform(&mut self, tx: f32, ty: f32, sx: f32, sy: f32) {
        self.saved.push(self.current);
        self.current = self.current.then(tx, ty, sx, sy);
    }

    /// Restores the transform active before the matching push.
    ///
    /// Popping an empty stack is a caller bug; release builds keep the
    /// identity transform.
    pub fn pop(&mut self) {
        match self.saved.pop() {
            Some(t) => self.current = t,
            None => debug_assert!(false, "pop_transform without matching push"),
        }
    }

    pub fn reset(&mut self) {
        self.current = Transform::IDENTITY;
        self.saved.clear();
    }
}
