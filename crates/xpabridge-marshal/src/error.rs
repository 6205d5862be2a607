//! Error types for the marshalling layer.

use crate::ElementKind;

/// Errors that can occur while converting arrays or container files.
///
/// None of these are ever recovered from by silently coercing the data:
/// an element kind the wire format cannot carry is an error, not a guess.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    /// The bitpix code has no element kind.
    #[error("unsupported bitpix: {0}")]
    UnsupportedBitpix(i32),

    /// The element kind has no bitpix code.
    #[error("unsupported dtype: {0}")]
    UnsupportedKind(ElementKind),

    /// The buffer length disagrees with the shape and element width.
    #[error("shape {dims:?} of {kind} needs {expected} bytes, got {actual}")]
    ShapeMismatch {
        dims: Vec<usize>,
        kind: ElementKind,
        expected: usize,
        actual: usize,
    },

    /// The shape's byte length overflows `usize`.
    #[error("shape {dims:?} of {kind} is too large")]
    TooLarge { dims: Vec<usize>, kind: ElementKind },

    /// Only 2-D and 3-D arrays travel over the wire.
    #[error("unsupported array rank {0} (expected 2 or 3 dimensions)")]
    UnsupportedRank(usize),

    /// A typed read asked for a different element kind than the buffer holds.
    #[error("buffer holds {actual}, not {requested}")]
    KindMismatch {
        requested: ElementKind,
        actual: ElementKind,
    },

    /// An array parameter string could not be parsed.
    #[error("invalid array parameters: {0}")]
    InvalidParams(String),

    /// A numeric reply (width, height, bitpix...) was not a number.
    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: String, value: String },

    /// The bytes or document are not the container structure expected.
    #[error("not a valid container: {0}")]
    WrongContainer(String),

    /// No codec is available for this capability.
    #[error("{0} support is not available")]
    CodecUnavailable(&'static str),
}
