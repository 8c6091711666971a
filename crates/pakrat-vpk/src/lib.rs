//! Valve Pak (VPK) archive reader.
//!
//! A VPK archive is a `_dir.vpk` directory file plus numbered pack files
//! (`pak01_000.vpk`, `pak01_001.vpk`, ...) that hold the file data. This crate
//! supports:
//!
//! - Directory file versions 0, 1 and 2
//! - Ordered and by-path entry lookup
//! - Lazy opening of pack files, remembering the ones that are missing
//! - Idempotent extraction of single entries or the whole archive
//! - Parallel extraction with rayon (with `parallel` feature)
//!
//! Data stored inline after the directory tree is not supported.
//!
//! # Example
//!
//! ```no_run
//! use pakrat_vpk::VpkArchive;
//!
//! let archive = VpkArchive::open("pak01_dir.vpk")?;
//!
//! for entry in archive.iter() {
//!     println!("{}: {} bytes", entry.path(), entry.entry_length());
//! }
//!
//! archive.extract("materials/brick/wall01.vmt", Some("out".as_ref()))?;
//! # Ok::<(), pakrat_vpk::Error>(())
//! ```

mod archive;
mod entry;
mod error;
mod extract;
mod header;
mod resolver;
mod tree;

pub use archive::VpkArchive;
pub use entry::VpkEntry;
pub use error::{Error, Result};
pub use extract::Extraction;
pub use header::VpkHeader;
pub use resolver::{pack_file_name, ArchiveResolver, PartState};
pub use tree::{parse_tree, EntryTable};
