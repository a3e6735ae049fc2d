//! Error types for frame encoding.

use thiserror::Error;

/// Every way a frame encode can fail.
///
/// Nothing in the encoders panics on bad input or size arithmetic; all of
/// these are returned to the immediate caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// A required argument was empty or out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The value does not fit in a 62-bit variable-length integer.
    #[error("Value {value} exceeds the varint range (max 4611686018427387903)")]
    EncodingOverflow { value: u64 },

    /// The output buffer could not be allocated.
    #[error("Out of memory allocating {requested} bytes")]
    OutOfMemory { requested: usize },

    /// The caller-supplied buffer is shorter than the encoding.
    #[error("Buffer too small ({needed} bytes needed)")]
    BufferTooSmall { needed: usize },

    /// The request is well-formed but cannot be expressed in one frame.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The header-compression context rejected the header list.
    #[error("Header compression error: {0}")]
    Compression(String),

    /// Computed sizes disagreed with what was written.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using FrameError.
pub type Result<T> = std::result::Result<T, FrameError>;
