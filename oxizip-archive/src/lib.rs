//! # OxiZip Archive
//!
//! ZIP container support for OxiZip.
//!
//! - **Directory reading**: end of central directory search, zip64 records
//!   and extra fields, one pass over the central directory
//! - **Extraction**: stored entries are copied, deflated entries are
//!   streamed through [`oxizip_deflate::Inflater`]
//! - **Writing**: store-only entries plus a finalized central directory
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxizip_archive::zip::ZipReader;
//! use std::fs::File;
//!
//! let reader = ZipReader::new(File::open("archive.zip")?)?;
//! for (entry, name) in reader.directory().iter() {
//!     println!("{name}: {} bytes", entry.uncompressed_size);
//! }
//! # Ok::<(), oxizip_core::OxiZipError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod zip;

// Re-exports
pub use zip::{CompressionMethod, DirEntry, Directory, ZipReader, ZipWriter, read_directory};
