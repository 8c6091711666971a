//! Error types for pakrat-common.

use thiserror::Error;

/// Error raised by the binary cursor.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// Missing null terminator in string.
    #[error("string missing null terminator")]
    MissingNullTerminator,
}

impl Error {
    /// Whether the failure was caused by running out of input.
    ///
    /// Both variants mean the same thing for a sentinel-terminated format: the
    /// data stopped before the field did.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. } | Self::MissingNullTerminator)
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
