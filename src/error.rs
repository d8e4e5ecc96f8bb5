//! Error types for edf

use std::fmt;

/// Result type alias for edf operations
pub type Result<T> = std::result::Result<T, EdfError>;

/// Error types that can occur in edf.
///
/// Flow-control conditions (a full destination buffer, an exhausted value
/// source, a drained frame) are *not* errors: they are reported through the
/// outcome enums of the streaming encoder and decoder. Everything here is
/// fatal for the current operation.
#[derive(Debug)]
pub enum EdfError {
    /// I/O error from the underlying sink or source
    Io(std::io::Error),

    /// Corrupt or unparseable on-disk data: unknown frame tag, CRC
    /// mismatch, invalid schema bytes, reserved string-length sentinel
    Malformed {
        /// Error message
        msg: String,
    },

    /// A schema leaf kind that the active codec cannot encode or decode,
    /// or a value whose type does not match the schema leaf
    WrongType {
        /// Error message
        msg: String,
    },

    /// Schema descriptor bytes ended before a complete node was parsed.
    /// Distinct from [`EdfError::Malformed`]: the caller may retry with
    /// more input.
    SchemaTruncated,

    /// A value operation was attempted before any schema was declared
    NoActiveSchema,

    /// Invalid caller-supplied input (record/schema mismatch, oversized
    /// schema descriptor, leaf larger than the block size)
    InvalidInput {
        /// Error message
        msg: String,
    },

    /// Operation not supported by the selected codec (e.g. decoding the
    /// one-way text rendering)
    Unsupported {
        /// Error message
        msg: String,
    },
}

impl fmt::Display for EdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdfError::Io(e) => write!(f, "I/O error: {}", e),
            EdfError::Malformed { msg } => write!(f, "Malformed data: {}", msg),
            EdfError::WrongType { msg } => write!(f, "Wrong type: {}", msg),
            EdfError::SchemaTruncated => write!(f, "Schema bytes truncated: need more data"),
            EdfError::NoActiveSchema => write!(f, "No active schema declared"),
            EdfError::InvalidInput { msg } => write!(f, "Invalid input: {}", msg),
            EdfError::Unsupported { msg } => write!(f, "Unsupported operation: {}", msg),
        }
    }
}

impl std::error::Error for EdfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EdfError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EdfError {
    fn from(error: std::io::Error) -> Self {
        EdfError::Io(error)
    }
}
