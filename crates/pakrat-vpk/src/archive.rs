//! VPK archive reader.

use std::fmt::Write as _;
use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use pakrat_common::BinaryReader;

use crate::extract::{self, Extraction};
use crate::header::VpkHeader;
use crate::resolver::{ArchiveResolver, PartState};
use crate::tree::{self, EntryTable};
use crate::{Error, Result, VpkEntry};

/// An opened VPK archive.
///
/// Opening parses the whole directory tree; entry data is read from the numbered
/// pack files on demand.
pub struct VpkArchive {
    /// Path of the `_dir.vpk` file
    path: PathBuf,
    /// File name of the `_dir.vpk` file
    name: String,
    /// Directory holding the directory file and its pack parts
    directory: PathBuf,
    header: VpkHeader,
    table: EntryTable,
    resolver: ArchiveResolver,
}

impl VpkArchive {
    /// Open a VPK directory file and parse its tree.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (header, table) = Self::parse(&mmap)?;

        tracing::debug!(
            archive = %name,
            version = header.version,
            entries = table.len(),
            "parsed VPK directory"
        );

        Ok(Self {
            path: path.to_path_buf(),
            resolver: ArchiveResolver::new(&directory, &name),
            name,
            directory,
            header,
            table,
        })
    }

    /// Parse a header and directory tree from raw bytes.
    pub fn parse(data: &[u8]) -> Result<(VpkHeader, EntryTable)> {
        let mut reader = BinaryReader::new(data);
        let header = VpkHeader::read(&mut reader)?;
        let table = tree::parse_tree(&mut reader)?;
        Ok((header, table))
    }

    /// Get the path of the directory file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file name of the directory file.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the directory containing the archive.
    #[inline]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Get the decoded header.
    #[inline]
    pub fn header(&self) -> &VpkHeader {
        &self.header
    }

    /// Get the number of entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.table.len()
    }

    /// Entries in directory tree order.
    #[inline]
    pub fn entries(&self) -> &[VpkEntry] {
        self.table.entries()
    }

    /// Iterate over entries in directory tree order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &VpkEntry> + '_ {
        self.table.entries().iter()
    }

    /// Find an entry by its full path.
    #[inline]
    pub fn get(&self, path: &str) -> Option<&VpkEntry> {
        self.table.get(path)
    }

    /// Check if an entry exists for `path`.
    #[inline]
    pub fn contains(&self, path: &str) -> bool {
        self.table.get(path).is_some()
    }

    /// Paths of all entries in directory tree order.
    pub fn files(&self) -> Vec<&str> {
        self.iter().map(VpkEntry::path).collect()
    }

    /// Cache state of pack part `index`.
    pub fn part_state(&self, index: u16) -> PartState {
        self.resolver.state(index)
    }

    /// Read an entry's contents from its pack part.
    pub fn read_entry(&self, entry: &VpkEntry) -> Result<Vec<u8>> {
        extract::read_entry(&self.resolver, entry)
    }

    /// Extract the entry stored at `path`.
    ///
    /// Files go below `target_dir`, or next to the archive when it is `None`.
    pub fn extract(&self, path: &str, target_dir: Option<&Path>) -> Result<Extraction> {
        let entry = self
            .get(path)
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))?;
        self.extract_entry(entry, target_dir)
    }

    /// Extract a single entry.
    ///
    /// Files go below `target_dir`, or next to the archive when it is `None`.
    pub fn extract_entry(
        &self,
        entry: &VpkEntry,
        target_dir: Option<&Path>,
    ) -> Result<Extraction> {
        let target_dir = target_dir.unwrap_or(&self.directory);
        extract::extract_entry(&self.resolver, entry, target_dir)
    }

    /// Extract every entry, continuing past failures.
    ///
    /// The returned outcomes line up with [`entries`](Self::entries).
    pub fn extract_all(&self, target_dir: Option<&Path>) -> Vec<Result<Extraction>> {
        self.extract_all_with(target_dir, |_, _| {})
    }

    /// Extract every entry, calling `progress` after each one.
    pub fn extract_all_with<F>(
        &self,
        target_dir: Option<&Path>,
        mut progress: F,
    ) -> Vec<Result<Extraction>>
    where
        F: FnMut(&VpkEntry, &Result<Extraction>),
    {
        self.iter()
            .map(|entry| {
                let result = self.extract_logged(entry, target_dir);
                progress(entry, &result);
                result
            })
            .collect()
    }

    /// Parallel extraction of every entry.
    ///
    /// Outcomes line up with [`entries`](Self::entries); `progress` may be called
    /// from several threads.
    #[cfg(feature = "parallel")]
    pub fn extract_all_parallel<F>(
        &self,
        target_dir: Option<&Path>,
        progress: F,
    ) -> Vec<Result<Extraction>>
    where
        F: Fn(&VpkEntry, &Result<Extraction>) + Sync,
    {
        use rayon::prelude::*;

        self.table
            .entries()
            .par_iter()
            .map(|entry| {
                let result = self.extract_logged(entry, target_dir);
                progress(entry, &result);
                result
            })
            .collect()
    }

    /// Parallel extraction of a subset of entries.
    ///
    /// Outcomes line up with `entries`.
    #[cfg(feature = "parallel")]
    pub fn extract_entries_parallel<F>(
        &self,
        entries: &[&VpkEntry],
        target_dir: Option<&Path>,
        progress: F,
    ) -> Vec<Result<Extraction>>
    where
        F: Fn(&VpkEntry, &Result<Extraction>) + Sync,
    {
        use rayon::prelude::*;

        entries
            .par_iter()
            .map(|&entry| {
                let result = self.extract_logged(entry, target_dir);
                progress(entry, &result);
                result
            })
            .collect()
    }

    fn extract_logged(&self, entry: &VpkEntry, target_dir: Option<&Path>) -> Result<Extraction> {
        let result = self.extract_entry(entry, target_dir);
        if let Err(e) = &result {
            tracing::warn!(path = entry.path(), error = %e, "extraction failed");
        }
        result
    }

    /// One line per entry: path, CRC in hex, length.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for entry in self.iter() {
            let _ = writeln!(
                out,
                "{} {:x} {}",
                entry.path(),
                entry.crc(),
                entry.entry_length()
            );
        }
        out
    }

    /// Release all pack file handles.
    pub fn close(self) {
        self.resolver.release();
    }
}

impl std::fmt::Debug for VpkArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VpkArchive")
            .field("name", &self.name)
            .field("version", &self.header.version)
            .field("entries", &self.table.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_archive() {
        let data: Vec<u8> = [
            &[0x34, 0x12, 0xAA, 0x55][..],
            &[0x01, 0x00, 0x00, 0x00],
            &[0x00, 0x00, 0x00, 0x00],
            b"txt\0dir\0file\0",
            &[0x00, 0x00, 0x00, 0x00], // crc
            &[0x00, 0x00],             // preload
            &[0x00, 0x00],             // archive index
            &[0x00, 0x00, 0x00, 0x00], // offset
            &[0x05, 0x00, 0x00, 0x00], // length
            &[0xFF, 0xFF],             // terminator
            &[0x00, 0x00, 0x00],
        ]
        .concat();

        let (header, table) = VpkArchive::parse(&data).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.tree_size, 0);
        assert_eq!(table.len(), 1);

        let entry = &table.entries()[0];
        assert_eq!(entry.path(), "dir/file.txt");
        assert_eq!(entry.archive_index(), 0);
        assert_eq!(entry.entry_offset(), 0);
        assert_eq!(entry.entry_length(), 5);
    }

    #[test]
    fn test_parse_bad_signature() {
        let data = [0u8; 16];
        assert!(matches!(
            VpkArchive::parse(&data),
            Err(Error::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_parse_truncated_header() {
        let data = [0x34, 0x12, 0xAA, 0x55, 0x02, 0x00, 0x00, 0x00, 0x10];
        assert!(matches!(
            VpkArchive::parse(&data),
            Err(Error::TruncatedHeader(_))
        ));
    }
}
