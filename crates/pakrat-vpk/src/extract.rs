//! Writing entry data to disk.

use std::fs;
use std::path::{Component, Path};

use crate::resolver::ArchiveResolver;
use crate::{Error, Result, VpkEntry};

/// Outcome of a successful extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// The entry was read from its pack part and written.
    Written {
        /// Number of bytes written.
        bytes: u64,
    },
    /// A file already existed at the destination; nothing was read or written.
    AlreadyPresent,
}

impl Extraction {
    /// Check if this extraction performed any I/O.
    #[inline]
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Read an entry's bytes from its pack part.
pub(crate) fn read_entry(resolver: &ArchiveResolver, entry: &VpkEntry) -> Result<Vec<u8>> {
    if entry.is_inline() {
        return Err(Error::UnsupportedInlineData {
            path: entry.path().to_string(),
        });
    }

    resolver.read_range(
        entry.archive_index(),
        entry.entry_offset(),
        entry.entry_length(),
    )
}

/// Extract one entry below `target_dir`.
///
/// An existing file at the destination counts as already extracted, whatever its
/// contents. Paths with root, prefix or `..` components are refused.
pub(crate) fn extract_entry(
    resolver: &ArchiveResolver,
    entry: &VpkEntry,
    target_dir: &Path,
) -> Result<Extraction> {
    let relative = entry.output_path();
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(Error::UnsafeEntryPath {
            path: entry.path().to_string(),
        });
    }

    let output_path = target_dir.join(relative);

    if output_path.exists() {
        tracing::trace!(path = entry.path(), "already extracted");
        return Ok(Extraction::AlreadyPresent);
    }

    let data = read_entry(resolver, entry)?;

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::Filesystem {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&output_path, &data).map_err(|source| Error::Filesystem {
        path: output_path.clone(),
        source,
    })?;

    tracing::trace!(path = entry.path(), bytes = data.len(), "extracted");
    Ok(Extraction::Written {
        bytes: data.len() as u64,
    })
}
