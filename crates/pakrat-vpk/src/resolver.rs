//! Lazy lookup of numbered pack files.
//!
//! Pack files are opened on first use and kept open for the lifetime of the
//! archive. A pack file found missing is remembered so the filesystem is probed
//! at most once per index.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Error, Result};

/// Suffix of the directory file that sibling names are derived from.
const DIR_SUFFIX: &str = "dir.vpk";

/// Cache state of one pack file index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartState {
    /// No lookup has happened yet.
    Unattempted,
    /// The pack file is open.
    Open,
    /// The pack file was missing when first looked up.
    Unavailable,
}

#[derive(Debug)]
enum Slot {
    Open(Arc<Mutex<File>>),
    Unavailable,
}

/// Derive the file name of pack part `index` from the directory file name.
///
/// `pak01_dir.vpk` with index 2 gives `pak01_002.vpk`. Names without the
/// `dir.vpk` suffix get `_NNN.vpk` appended to their stem.
pub fn pack_file_name(dir_file_name: &str, index: u16) -> String {
    let stem = match dir_file_name.strip_suffix(DIR_SUFFIX) {
        Some(stem) => stem.to_string(),
        None => {
            let base = dir_file_name.strip_suffix(".vpk").unwrap_or(dir_file_name);
            format!("{base}_")
        }
    };
    format!("{stem}{index:03}.vpk")
}

/// Opens and caches pack file handles by index.
#[derive(Debug)]
pub struct ArchiveResolver {
    directory: PathBuf,
    dir_file_name: String,
    slots: Mutex<HashMap<u16, Slot>>,
}

impl ArchiveResolver {
    /// Create a resolver for the directory file `dir_file_name` located in `directory`.
    pub fn new(directory: impl Into<PathBuf>, dir_file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            dir_file_name: dir_file_name.into(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Full path of pack part `index`.
    pub fn part_path(&self, index: u16) -> PathBuf {
        self.directory.join(pack_file_name(&self.dir_file_name, index))
    }

    /// Current cache state for `index`.
    pub fn state(&self, index: u16) -> PartState {
        match self.slots.lock().get(&index) {
            None => PartState::Unattempted,
            Some(Slot::Open(_)) => PartState::Open,
            Some(Slot::Unavailable) => PartState::Unavailable,
        }
    }

    /// Get the handle for pack part `index`, opening it on first use.
    ///
    /// A missing file yields [`Error::ArchiveUnavailable`], now and on every later
    /// call, without touching the filesystem again.
    pub fn resolve(&self, index: u16) -> Result<Arc<Mutex<File>>> {
        let mut slots = self.slots.lock();

        match slots.get(&index) {
            Some(Slot::Open(handle)) => return Ok(Arc::clone(handle)),
            Some(Slot::Unavailable) => {
                return Err(Error::ArchiveUnavailable {
                    index,
                    path: self.part_path(index),
                })
            }
            None => {}
        }

        let path = self.part_path(index);
        match File::open(&path) {
            Ok(file) => {
                tracing::debug!(index, path = %path.display(), "opened archive part");
                let handle = Arc::new(Mutex::new(file));
                slots.insert(index, Slot::Open(Arc::clone(&handle)));
                Ok(handle)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(index, path = %path.display(), "archive part missing");
                slots.insert(index, Slot::Unavailable);
                Err(Error::ArchiveUnavailable { index, path })
            }
            Err(source) => Err(Error::Filesystem { path, source }),
        }
    }

    /// Read `length` bytes at `offset` from pack part `index`.
    ///
    /// The seek and read happen under the part's lock so concurrent readers of the
    /// same part do not interleave.
    pub fn read_range(&self, index: u16, offset: u32, length: u32) -> Result<Vec<u8>> {
        let handle = self.resolve(index)?;
        let mut file = handle.lock();

        let data = read_at(&mut *file, offset, length).map_err(|source| Error::Filesystem {
            path: self.part_path(index),
            source,
        })?;

        if data.len() != length as usize {
            return Err(Error::TruncatedArchivePart {
                index,
                offset,
                expected: length,
                actual: data.len() as u64,
            });
        }

        Ok(data)
    }

    /// Drop every cached handle and forget unavailable parts.
    pub fn release(&self) {
        self.slots.lock().clear();
    }

}

fn read_at<R: Read + Seek>(source: &mut R, offset: u32, length: u32) -> io::Result<Vec<u8>> {
    // A corrupt length must not size the buffer beyond what the part holds.
    let end = source.seek(SeekFrom::End(0))?;
    let available = end.saturating_sub(offset as u64).min(length as u64);
    source.seek(SeekFrom::Start(offset as u64))?;

    let mut data = Vec::with_capacity(available as usize);
    source.by_ref().take(length as u64).read_to_end(&mut data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_pack_file_name() {
        assert_eq!(pack_file_name("pak01_dir.vpk", 2), "pak01_002.vpk");
        assert_eq!(pack_file_name("pak01_dir.vpk", 0), "pak01_000.vpk");
        assert_eq!(pack_file_name("tf2_misc_dir.vpk", 117), "tf2_misc_117.vpk");
        assert_eq!(pack_file_name("custom.vpk", 3), "custom_003.vpk");
    }

    #[test]
    fn test_part_path() {
        let resolver = ArchiveResolver::new("/games/hl2", "pak01_dir.vpk");
        assert_eq!(
            resolver.part_path(5),
            PathBuf::from("/games/hl2/pak01_005.vpk")
        );
        assert_eq!(resolver.state(5), PartState::Unattempted);
    }

    #[test]
    fn test_read_at() {
        let mut cursor = Cursor::new(b"0123456789".to_vec());
        assert_eq!(read_at(&mut cursor, 2, 4).unwrap(), b"2345");
        // Short read past the end returns what is available.
        assert_eq!(read_at(&mut cursor, 8, 4).unwrap(), b"89");
        assert!(read_at(&mut cursor, 20, 4).unwrap().is_empty());
    }

    #[test]
    fn test_read_at_corrupt_length() {
        let mut cursor = Cursor::new(b"abc".to_vec());
        let data = read_at(&mut cursor, 0, 0xFFFF_FFF0).unwrap();
        assert_eq!(data, b"abc");
        assert!(data.capacity() < 1024);
    }
}
