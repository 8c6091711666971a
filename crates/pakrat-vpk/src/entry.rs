//! VPK directory entry.

use std::path::PathBuf;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Fixed-layout metadata that follows every file name in the directory tree.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub(crate) struct EntryMetadata {
    /// CRC32 of the file data
    pub crc: u32,
    /// Bytes of preload data stored in the directory file
    pub preload_bytes: u16,
    /// Pack file holding the data
    pub archive_index: u16,
    /// Offset of the data within the pack file
    pub entry_offset: u32,
    /// Length of the data within the pack file
    pub entry_length: u32,
    /// Always 0xFFFF in well-formed files
    pub terminator: u16,
}

/// Placeholder the tree uses for "no extension" and "no directory".
const EMPTY_SENTINEL: &str = " ";

/// A file stored in a VPK archive.
///
/// This contains metadata about the file, not the file data itself.
/// Use [`VpkArchive::read_entry`](crate::VpkArchive::read_entry) to get the contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpkEntry {
    extension: String,
    directory: String,
    name: String,
    path: String,
    crc: u32,
    preload_bytes: u16,
    archive_index: u16,
    entry_offset: u32,
    entry_length: u32,
    terminator: u16,
}

impl VpkEntry {
    /// Archive index marking data stored after the directory tree.
    pub const INLINE_ARCHIVE_INDEX: u16 = 0x7FFF;

    /// Expected value of the metadata terminator.
    pub const TERMINATOR: u16 = 0xFFFF;

    /// Build an entry from the three tree levels and its metadata.
    pub(crate) fn new(extension: &str, directory: &str, name: &str, meta: EntryMetadata) -> Self {
        let extension = normalize(extension);
        let directory = normalize(directory);

        let mut path = String::with_capacity(directory.len() + name.len() + extension.len() + 2);
        if !directory.is_empty() {
            path.push_str(directory);
            path.push('/');
        }
        path.push_str(name);
        if !extension.is_empty() {
            path.push('.');
            path.push_str(extension);
        }

        Self {
            extension: extension.to_string(),
            directory: directory.to_string(),
            name: name.to_string(),
            path,
            crc: meta.crc,
            preload_bytes: meta.preload_bytes,
            archive_index: meta.archive_index,
            entry_offset: meta.entry_offset,
            entry_length: meta.entry_length,
            terminator: meta.terminator,
        }
    }

    /// Get the file extension, empty when the file has none.
    #[inline]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Get the directory, empty for files at the archive root.
    #[inline]
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Get the file name without extension.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the full path within the archive (`dir/name.ext`).
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the file name with extension.
    pub fn file_name(&self) -> &str {
        match self.path.rfind('/') {
            Some(pos) => &self.path[pos + 1..],
            None => &self.path,
        }
    }

    /// Get the CRC32 of the file data.
    #[inline]
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Get the number of preload bytes.
    #[inline]
    pub fn preload_bytes(&self) -> u16 {
        self.preload_bytes
    }

    /// Get the index of the pack file holding the data.
    #[inline]
    pub fn archive_index(&self) -> u16 {
        self.archive_index
    }

    /// Get the data offset within the pack file.
    #[inline]
    pub fn entry_offset(&self) -> u32 {
        self.entry_offset
    }

    /// Get the data length in bytes.
    #[inline]
    pub fn entry_length(&self) -> u32 {
        self.entry_length
    }

    /// Get the raw terminator value.
    #[inline]
    pub fn terminator(&self) -> u16 {
        self.terminator
    }

    /// Check if the data follows the directory tree in the directory file.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.archive_index == Self::INLINE_ARCHIVE_INDEX
    }

    /// Check if the terminator has its expected value.
    ///
    /// A mismatch is not rejected during parsing.
    #[inline]
    pub fn has_valid_terminator(&self) -> bool {
        self.terminator == Self::TERMINATOR
    }

    /// Get the relative output path for extraction.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

fn normalize(level: &str) -> &str {
    if level == EMPTY_SENTINEL {
        ""
    } else {
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(archive_index: u16) -> EntryMetadata {
        EntryMetadata {
            crc: 0x1234_5678,
            preload_bytes: 0,
            archive_index,
            entry_offset: 16,
            entry_length: 32,
            terminator: VpkEntry::TERMINATOR,
        }
    }

    #[test]
    fn test_path_derivation() {
        let entry = VpkEntry::new("vmt", "materials/brick", "wall01", meta(0));
        assert_eq!(entry.path(), "materials/brick/wall01.vmt");
        assert_eq!(entry.file_name(), "wall01.vmt");
        assert_eq!(entry.output_path(), PathBuf::from("materials/brick/wall01.vmt"));
    }

    #[test]
    fn test_empty_sentinels() {
        let entry = VpkEntry::new(" ", "scripts", "README", meta(0));
        assert_eq!(entry.extension(), "");
        assert_eq!(entry.path(), "scripts/README");

        let entry = VpkEntry::new("txt", " ", "credits", meta(0));
        assert_eq!(entry.directory(), "");
        assert_eq!(entry.path(), "credits.txt");

        let entry = VpkEntry::new(" ", " ", "LICENSE", meta(0));
        assert_eq!(entry.path(), "LICENSE");
        assert_eq!(entry.file_name(), "LICENSE");
    }

    #[test]
    fn test_inline_and_terminator() {
        let entry = VpkEntry::new("txt", "dir", "file", meta(VpkEntry::INLINE_ARCHIVE_INDEX));
        assert!(entry.is_inline());
        assert!(entry.has_valid_terminator());
        assert_eq!(entry.crc(), 0x1234_5678);

        let mut raw = meta(2);
        raw.terminator = 0;
        let entry = VpkEntry::new("txt", "dir", "file", raw);
        assert!(!entry.is_inline());
        assert!(!entry.has_valid_terminator());
        assert_eq!(entry.archive_index(), 2);
    }
}
