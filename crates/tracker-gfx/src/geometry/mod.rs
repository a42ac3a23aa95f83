//! Immutable point-list shapes and stroke outline math.

mod shape;
pub mod stroke;

pub use shape::Geometry;
