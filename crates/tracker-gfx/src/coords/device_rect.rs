/// Integer rectangle in device pixels, bottom-left origin.
///
/// Used for viewports and scissor rectangles handed to a [`Backend`](crate::backend::Backend).
/// `y` is measured upward from the bottom edge of the bound surface.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct DeviceRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DeviceRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn right(self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub fn contains_rect(self, other: DeviceRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.top() <= self.top()
    }

    /// Intersection with `other`.
    ///
    /// Disjoint inputs collapse to a zero-area rect placed inside `self`, so the
    /// result is always contained in both operands and can never grow a clip.
    pub fn intersect(self, other: DeviceRect) -> DeviceRect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.top().min(other.top());

        if x1 <= x0 || y1 <= y0 {
            let x = x0.clamp(self.x, self.right());
            let y = y0.clamp(self.y, self.top());
            return DeviceRect::new(x, y, 0, 0);
        }
        DeviceRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Converts to a top-left-origin rect `(x, y, w, h)` for a surface of
    /// `surface_height` rows, clamped to `surface_width × surface_height`.
    ///
    /// Returns `None` when nothing of the rect lies on the surface.
    pub fn to_top_left(
        self,
        surface_width: u32,
        surface_height: u32,
    ) -> Option<(u32, u32, u32, u32)> {
        let sw = surface_width as i32;
        let sh = surface_height as i32;
        let x0 = self.x.clamp(0, sw);
        let x1 = self.right().clamp(0, sw);
        let top = (sh - self.top()).clamp(0, sh);
        let bottom = (sh - self.y).clamp(0, sh);

        if x1 <= x0 || bottom <= top {
            return None;
        }
        Some((x0 as u32, top as u32, (x1 - x0) as u32, (bottom - top) as u32))
    }
}
