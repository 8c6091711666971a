//! Common utilities for pakrat.
//!
//! This crate provides the foundational binary reading used by the archive crates:
//!
//! - [`BinaryReader`] - Zero-copy little-endian reading from byte slices
//! - [`Error`] - Cursor failures (end of data, unterminated strings)

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::BinaryReader;
