//! ZIP archive format support.
//!
//! This module provides reading of single-disk ZIP archives (including
//! zip64) as specified in the PKWARE APPNOTE, and store-only writing.
//!
//! Reading is split into two steps: [`read_directory`] parses the central
//! directory once, then [`locate`] positions the source at an entry's payload
//! for copying or inflating. [`ZipReader`] wraps both.

mod directory;
mod dostime;
mod locate;
mod reader;
mod records;
mod writer;

pub use directory::{DirEntry, Directory, read_directory};
pub use dostime::{dos_to_local, local_to_dos};
pub use locate::locate;
pub use reader::ZipReader;
pub use records::{
    CentralDirectoryHeader, CompressionMethod, EndOfCentralDirectory, LocalFileHeader,
    Zip64EndOfCentralDirectory, Zip64Locator,
};
pub use writer::{ZipWriter, finalize, store};

use oxizip_core::error::Result;
use std::io::{Read, Seek, Write};

/// Read a ZIP archive.
pub fn read_zip<R: Read + Seek>(reader: R) -> Result<ZipReader<R>> {
    ZipReader::new(reader)
}

/// Create a new ZIP archive writer.
pub fn write_zip<W: Write + Seek>(writer: W) -> ZipWriter<W> {
    ZipWriter::new(writer)
}
