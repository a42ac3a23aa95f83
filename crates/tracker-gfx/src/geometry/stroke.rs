//! Perpendicular-offset math shared by every thick-line path.
//!
//! An outline holds two points per input point (`p + offset`, `p - offset`)
//! in triangle-strip order, so a polyline of width `w` renders as a ribbon.

use crate::coords::Vec2;

/// Longest miter, as a multiple of the half width, before it is clamped.
pub const MITER_LIMIT: f32 = 4.0;

/// Offset points for a polyline stroked at `width`.
///
/// Interior points of the polyline use a miter join; endpoints of an open
/// polyline use their single segment's normal. Closed outlines repeat the
/// first pair at the end so the strip closes on itself. Zero-length segments
/// take the direction of the nearest proper segment.
pub fn outline(points: &[Vec2], closed: bool, width: f32) -> Vec<Vec2> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    let half = width * 0.5;
    let segments = if closed { n } else { n - 1 };

    let mut normals: Vec<Option<Vec2>> = (0..segments)
        .map(|i| {
            let d = (points[(i + 1) % n] - points[i]).normalized_or_zero();
            (d != Vec2::zero()).then(|| d.perp())
        })
        .collect();

    // Degenerate segments borrow the direction of their nearest neighbour.
    let mut last = None;
    for slot in normals.iter_mut() {
        match slot {
            Some(_) => last = *slot,
            None => *slot = last,
        }
    }
    let mut next = None;
    for slot in normals.iter_mut().rev() {
        match slot {
            Some(_) => next = *slot,
            None => *slot = next,
        }
    }

    let mut out = Vec::with_capacity(2 * n + 2);
    for (i, &p) in points.iter().enumerate() {
        let before = if i > 0 {
            normals[i - 1]
        } else if closed {
            normals[segments - 1]
        } else {
            None
        };
        let after = if i < segments { normals[i] } else { None };

        let offset = join_offset(before, after, half);
        out.push(p + offset);
        out.push(p - offset);
    }
    if closed {
        out.push(out[0]);
        out.push(out[1]);
    }
    out
}

/// Offset at a joint between two segment normals.
fn join_offset(before: Option<Vec2>, after: Option<Vec2>, half: f32) -> Vec2 {
    match (before, after) {
        (Some(a), Some(b)) => {
            let m = (a + b).normalized_or_zero();
            let d = m.dot(b);
            if m == Vec2::zero() || d.abs() <= f32::EPSILON {
                // Full reversal: no usable miter.
                return b * half;
            }
            m * (half / d).min(half * MITER_LIMIT)
        }
        (Some(n), None) | (None, Some(n)) => n * half,
        (None, None) => Vec2::zero(),
    }
}

/// Quad covering the segment `a → b` at `width`, corners in fan order.
///
/// `cap` extends both ends along the segment (half the width squares off
/// butt joints of rectangle edges). Degenerate segments yield a zero-area quad.
pub fn segment_quad(a: Vec2, b: Vec2, width: f32, cap: f32) -> [Vec2; 4] {
    let dir = (b - a).normalized_or_zero();
    let off = dir.perp() * (width * 0.5);
    let a = a - dir * cap;
    let b = b + dir * cap;
    [a + off, b + off, b - off, a - off]
}
