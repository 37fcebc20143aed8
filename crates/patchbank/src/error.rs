//! Error types for state load operations.

/// Errors that can occur while decoding persisted state.
#[derive(Debug)]
pub enum StateError {
    /// The buffer ended before a field or record it declares.
    TruncatedBuffer,
    /// A magic tag did not match in either byte order.
    MagicMismatch,
    /// The record declares a format version newer than this codec.
    UnsupportedVersion(i32),
    /// A nested chunk declares a length that does not fit its container.
    MalformedNestedChunk,
    /// The text document could not be parsed.
    ParseFailure(String),
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TruncatedBuffer => write!(f, "buffer truncated"),
            Self::MagicMismatch => write!(f, "magic mismatch"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported format version {v}"),
            Self::MalformedNestedChunk => write!(f, "nested chunk exceeds container"),
            Self::ParseFailure(msg) => write!(f, "text parse failed: {msg}"),
        }
    }
}

impl std::error::Error for StateError {}

/// Result type for state load operations.
pub type Result<T> = std::result::Result<T, StateError>;
