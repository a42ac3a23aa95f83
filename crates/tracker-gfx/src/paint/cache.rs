use std::collections::HashMap;
use std::rc::Rc;

use super::{Brush, Color, Gradient};

/// Shade applied to the bottom edge of cached vertical gradients.
const VERTICAL_SHADE: f32 = 0.7;

/// Vertical-gradient brushes keyed by `(color, height)`.
///
/// Widgets ask for the same bevel gradient every frame; the cache hands back
/// one shared brush per key for the lifetime of the owning context. Entries
/// are never pruned, only dropped wholesale by [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct GradientCache {
    vertical: HashMap<([u32; 4], u32), Rc<Brush>>,
}

impl GradientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gradient from `color` at the top to a darker shade of it at `height`.
    ///
    /// A height that spans nothing (zero, negative or non-finite) yields a
    /// solid `color` brush.
    pub fn vertical(&mut self, color: Color, height: f32) -> Rc<Brush> {
        let key = (color.key_bits(), height.to_bits());
        self.vertical
            .entry(key)
            .or_insert_with(|| {
                log::trace!("gradient cache miss for {color:?} over {height}");
                if !(height.is_finite() && height > 0.0) {
                    return Rc::new(Brush::Solid(color));
                }
                let shade = color.shaded(VERTICAL_SHADE);
                Rc::new(Brush::Gradient(Gradient::vertical(color, shade, height)))
            })
            .clone()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertical.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertical.clear();
    }
}
