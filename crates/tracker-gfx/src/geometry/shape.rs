use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::coords::{Rect, Vec2};

use super::stroke;

/// Immutable ordered point list, optionally closed.
///
/// Filling renders a triangle fan around the first point, so the shape must
/// be star-shaped from that point (convex shapes always are). This is not
/// validated; other shapes render incorrectly.
///
/// Stroke outlines are computed on first request per width and kept for the
/// geometry's lifetime.
#[derive(Debug)]
pub struct Geometry {
    points: Vec<Vec2>,
    closed: bool,
    stroke_cache: RefCell<HashMap<u32, Rc<[Vec2]>>>,
}

impl Geometry {
    pub fn new(points: impl Into<Vec<Vec2>>, closed: bool) -> Self {
        Self {
            points: points.into(),
            closed,
            stroke_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Closed four-point outline of `rect`.
    pub fn rect(rect: Rect) -> Self {
        Self::new(rect.normalized().corners(), true)
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Triangles of the fan around the first point.
    pub fn fan_triangles(&self) -> impl Iterator<Item = [Vec2; 3]> + '_ {
        let first = self.points.first().copied().unwrap_or_default();
        self.points
            .windows(2)
            .skip(1)
            .map(move |w| [first, w[0], w[1]])
    }

    /// Line segments of the polyline, including the closing edge.
    pub fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let closing = match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(&first), Some(&last)) if self.points.len() > 2 => Some((last, first)),
            _ => None,
        };
        self.points.windows(2).map(|w| (w[0], w[1])).chain(closing)
    }

    /// Stroke outline at exactly `width`, computed once and then shared.
    pub fn stroke_outline(&self, width: f32) -> Rc<[Vec2]> {
        let mut cache = self.stroke_cache.borrow_mut();
        cache
            .entry(width.to_bits())
            .or_insert_with(|| {
                log::trace!("stroke outline for {} points at width {width}", self.points.len());
                stroke::outline(&self.points, self.closed, width).into()
            })
            .clone()
    }

    /// Number of widths with a memoized outline.
    pub fn cached_outlines(&self) -> usize {
        self.stroke_cache.borrow().len()
    }

    pub fn clear_stroke_cache(&self) {
        self.stroke_cache.borrow_mut().clear();
    }
}
