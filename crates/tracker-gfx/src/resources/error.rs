use std::fmt;

use super::ScaleVariant;

/// Error returned when building or loading a bitmap resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// Pixel buffer length does not match `width * height * 4`.
    InvalidSize { width: u32, height: u32, len: usize },
    /// No scale variant of the named resource could be loaded.
    Missing { name: String },
    /// A variant exists but its contents could not be decoded.
    Malformed { name: String, variant: ScaleVariant, reason: String },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::InvalidSize { width, height, len } => write!(
                f,
                "bitmap of {width}x{height} needs {} bytes, got {len}",
                *width as usize * *height as usize * 4
            ),
            ResourceError::Missing { name } => write!(f, "missing bitmap resource `{name}`"),
            ResourceError::Malformed { name, variant, reason } => {
                write!(f, "bitmap resource `{name}` ({variant:?}) is malformed: {reason}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}
