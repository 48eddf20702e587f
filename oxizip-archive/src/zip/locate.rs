//! Positioning a source at an entry's payload.

use super::directory::DirEntry;
use super::records::LocalFileHeader;
use oxizip_core::error::Result;
use std::io::{Read, Seek, SeekFrom};

/// Seek to the entry's local header, validate it, and skip to the payload.
///
/// Returns the payload offset; the source is left positioned there. The
/// local header's own sizes are ignored in favour of the central directory.
pub fn locate<R: Read + Seek>(source: &mut R, entry: &DirEntry) -> Result<u64> {
    source.seek(SeekFrom::Start(entry.local_header_offset))?;
    let header = LocalFileHeader::read(source)?;
    let payload = entry.local_header_offset + header.header_len();
    source.seek(SeekFrom::Start(payload))?;
    Ok(payload)
}
