use std::fmt;

/// Error returned while building a [`Font`](super::Font).
///
/// Font descriptions ship with the application, so every variant points at a
/// broken asset; callers treat them as fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum FontError {
    /// The description has no `common` record.
    MissingCommon,
    /// A required key is absent from a record.
    MissingKey { line: usize, key: &'static str },
    /// A value failed to parse as a number.
    InvalidValue { line: usize, key: String, value: String },
    /// A `char` id is not a Unicode scalar value.
    InvalidChar { line: usize, id: i64 },
    /// The atlas bitmap does not match the `scaleW`/`scaleH` of the description.
    AtlasMismatch { expected: (u32, u32), actual: (u32, u32) },
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::MissingCommon => write!(f, "font description has no `common` record"),
            FontError::MissingKey { line, key } => write!(f, "line {line}: missing `{key}`"),
            FontError::InvalidValue { line, key, value } => {
                write!(f, "line {line}: invalid value `{value}` for `{key}`")
            }
            FontError::InvalidChar { line, id } => write!(f, "line {line}: invalid char id {id}"),
            FontError::AtlasMismatch { expected, actual } => write!(
                f,
                "atlas is {}x{} but the description expects {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl std::error::Error for FontError {}
