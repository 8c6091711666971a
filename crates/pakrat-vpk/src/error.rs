//! Error types for the VPK crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when working with VPK archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while opening or mapping the directory file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Header magic mismatch.
    #[error("invalid VPK signature: expected {expected:#010x}, got {actual:#010x}")]
    InvalidSignature { expected: u32, actual: u32 },

    /// The directory file ended inside the header.
    #[error("truncated VPK header: {0}")]
    TruncatedHeader(#[source] pakrat_common::Error),

    /// The directory file ended inside the directory tree.
    #[error("truncated VPK directory tree: {0}")]
    TruncatedDirectoryTree(#[source] pakrat_common::Error),

    /// Entry payload is stored after the directory tree, which is not supported.
    #[error("inline entry data is not supported: {path}")]
    UnsupportedInlineData { path: String },

    /// Entry path would resolve outside the extraction directory.
    #[error("entry path escapes the target directory: {path}")]
    UnsafeEntryPath { path: String },

    /// A numbered pack file does not exist.
    #[error("archive part {index:03} is unavailable: {}", path.display())]
    ArchiveUnavailable { index: u16, path: PathBuf },

    /// A numbered pack file holds fewer bytes than the entry declares.
    #[error(
        "archive part {index:03} truncated at offset {offset}: expected {expected} bytes, got {actual}"
    )]
    TruncatedArchivePart {
        index: u16,
        offset: u32,
        expected: u32,
        actual: u64,
    },

    /// Creating directories or writing an extracted file failed.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No entry exists with the requested path.
    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

impl Error {
    /// Whether this error concerns a single entry rather than the whole archive.
    ///
    /// Parse-time failures invalidate the archive; entry-scoped failures leave it
    /// usable for other entries.
    pub fn is_entry_scoped(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedInlineData { .. }
                | Self::UnsafeEntryPath { .. }
                | Self::ArchiveUnavailable { .. }
                | Self::TruncatedArchivePart { .. }
                | Self::Filesystem { .. }
                | Self::EntryNotFound(_)
        )
    }
}

/// Result type for VPK operations.
pub type Result<T> = std::result::Result<T, Error>;
