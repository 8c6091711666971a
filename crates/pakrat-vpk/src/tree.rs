//! Directory tree parsing.
//!
//! The tree is three levels of null-terminated strings (extension, directory,
//! file name). Each level ends with an empty string and there is no entry count,
//! so parsing is driven entirely by those sentinels.

use std::borrow::Cow;
use std::collections::HashMap;

use pakrat_common::BinaryReader;

use crate::entry::{EntryMetadata, VpkEntry};
use crate::{Error, Result};

/// Ordered entries plus a path index.
#[derive(Debug, Default, Clone)]
pub struct EntryTable {
    entries: Vec<VpkEntry>,
    by_path: HashMap<String, usize>,
}

impl EntryTable {
    /// Entries in tree order.
    #[inline]
    pub fn entries(&self) -> &[VpkEntry] {
        &self.entries
    }

    /// Look up an entry by its full path.
    ///
    /// When the tree lists a path more than once, the last occurrence wins.
    pub fn get(&self, path: &str) -> Option<&VpkEntry> {
        self.by_path.get(path).map(|&idx| &self.entries[idx])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, entry: VpkEntry) {
        self.by_path.insert(entry.path().to_string(), self.entries.len());
        self.entries.push(entry);
    }
}

/// Where the parser is in the tree.
enum TreeState<'a> {
    ReadingExtensions,
    ReadingDirectories {
        extension: Cow<'a, str>,
    },
    ReadingFilenames {
        extension: Cow<'a, str>,
        directory: Cow<'a, str>,
    },
    ReadingEntryMetadata {
        extension: Cow<'a, str>,
        directory: Cow<'a, str>,
        name: Cow<'a, str>,
    },
}

/// Parse the directory tree starting at the reader's position.
///
/// Any read failure is reported as [`Error::TruncatedDirectoryTree`]; the partial
/// table is discarded.
pub fn parse_tree(reader: &mut BinaryReader<'_>) -> Result<EntryTable> {
    let mut table = EntryTable::default();
    let mut state = TreeState::ReadingExtensions;

    loop {
        state = match state {
            TreeState::ReadingExtensions => {
                let extension = read_level(reader)?;
                if extension.is_empty() {
                    return Ok(table);
                }
                TreeState::ReadingDirectories { extension }
            }
            TreeState::ReadingDirectories { extension } => {
                let directory = read_level(reader)?;
                if directory.is_empty() {
                    TreeState::ReadingExtensions
                } else {
                    TreeState::ReadingFilenames {
                        extension,
                        directory,
                    }
                }
            }
            TreeState::ReadingFilenames {
                extension,
                directory,
            } => {
                let name = read_level(reader)?;
                if name.is_empty() {
                    TreeState::ReadingDirectories { extension }
                } else {
                    TreeState::ReadingEntryMetadata {
                        extension,
                        directory,
                        name,
                    }
                }
            }
            TreeState::ReadingEntryMetadata {
                extension,
                directory,
                name,
            } => {
                let meta: EntryMetadata = reader
                    .read_struct()
                    .map_err(Error::TruncatedDirectoryTree)?;
                let entry = VpkEntry::new(&extension, &directory, &name, meta);

                if !entry.has_valid_terminator() {
                    tracing::trace!(
                        path = entry.path(),
                        terminator = entry.terminator(),
                        "unexpected entry terminator"
                    );
                }

                table.push(entry);
                TreeState::ReadingFilenames {
                    extension,
                    directory,
                }
            }
        };
    }
}

fn read_level<'a>(reader: &mut BinaryReader<'a>) -> Result<Cow<'a, str>> {
    reader
        .read_cstring_lossy()
        .map_err(Error::TruncatedDirectoryTree)
}
