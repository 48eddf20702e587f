//! Store-only archive writing.
//!
//! Entries are appended with [`store`] as a local header followed by the raw
//! payload. [`finalize`] re-reads those headers from the start of the stream
//! and appends the matching central directory and end record, so a stream
//! can be built up across several sessions before it is finalized.

use super::dostime::now_dos;
use super::records::{
    CentralDirectoryHeader, CompressionMethod, EndOfCentralDirectory, LocalFileHeader, read_field,
};
use oxizip_core::error::{OxiZipError, Result};
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::{debug, trace};

/// Version needed to extract a stored entry (1.0).
const VERSION_STORED: u16 = 10;

/// Append one uncompressed entry at the end of the stream.
///
/// Returns the offset of the entry's local header. The CRC field is written
/// as zero.
pub fn store<W: Write + Seek>(stream: &mut W, name: &str, bytes: &[u8]) -> Result<u64> {
    let name_len = u16::try_from(name.len()).map_err(|_| {
        OxiZipError::invalid_header(format!("file name is {} bytes", name.len()))
    })?;
    let size = u32::try_from(bytes.len())
        .ok()
        .filter(|&size| size < u32::MAX)
        .ok_or_else(|| {
            OxiZipError::invalid_header(format!(
                "{}: {} bytes needs zip64, which is not written",
                name,
                bytes.len()
            ))
        })?;

    let offset = stream.seek(SeekFrom::End(0))?;
    let (dos_date, dos_time) = now_dos();

    let header = LocalFileHeader {
        version_needed: VERSION_STORED,
        flags: 0,
        method: CompressionMethod::Stored.as_u16(),
        dos_time,
        dos_date,
        crc32: 0,
        compressed_size: size,
        uncompressed_size: size,
        name_len,
        extra_len: 0,
    };
    header.write(stream)?;
    stream.write_all(name.as_bytes())?;
    stream.write_all(bytes)?;

    trace!(name, offset, size, "stored entry");
    Ok(offset)
}

/// Append a central directory describing every local header in the stream.
///
/// Returns the number of entries written.
pub fn finalize<W: Read + Write + Seek>(stream: &mut W) -> Result<usize> {
    let end = stream.seek(SeekFrom::End(0))?;

    let mut central = Vec::new();
    let mut count = 0usize;
    let mut offset = 0u64;
    let mut name = Vec::new();

    while offset < end {
        stream.seek(SeekFrom::Start(offset))?;
        let local = LocalFileHeader::read(stream)?;
        name.resize(local.name_len as usize, 0);
        read_field(stream, &mut name, "file name")?;

        let local_header_offset = u32::try_from(offset).map_err(|_| {
            OxiZipError::invalid_header(format!("local header at {offset} needs zip64"))
        })?;

        let header = CentralDirectoryHeader {
            version_made_by: local.version_needed,
            version_needed: local.version_needed,
            flags: local.flags,
            method: local.method,
            dos_time: local.dos_time,
            dos_date: local.dos_date,
            crc32: local.crc32,
            compressed_size: local.compressed_size,
            uncompressed_size: local.uncompressed_size,
            name_len: local.name_len,
            extra_len: 0,
            comment_len: 0,
            disk_start: 0,
            internal_attr: 0,
            external_attr: 0,
            local_header_offset,
        };
        header.write(&mut central)?;
        central.extend_from_slice(&name);

        count += 1;
        offset += local.header_len() + u64::from(local.compressed_size);
    }

    if offset != end {
        return Err(OxiZipError::invalid_header(format!(
            "last entry runs {} bytes past the end of the stream",
            offset - end
        )));
    }

    let total_entries = u16::try_from(count)
        .map_err(|_| OxiZipError::invalid_header(format!("{count} entries need zip64")))?;
    let cd_offset = u32::try_from(end).map_err(|_| {
        OxiZipError::invalid_header(format!("central directory at {end} needs zip64"))
    })?;
    let cd_size = u32::try_from(central.len()).map_err(|_| {
        OxiZipError::invalid_header(format!("central directory of {} bytes", central.len()))
    })?;

    let eocd = EndOfCentralDirectory {
        disk_number: 0,
        directory_disk: 0,
        entries_on_disk: total_entries,
        total_entries,
        cd_size,
        cd_offset,
        comment_len: 0,
    };

    stream.seek(SeekFrom::Start(end))?;
    stream.write_all(&central)?;
    eocd.write(stream)?;
    stream.flush()?;

    debug!(entries = count, cd_offset, cd_size, "finalized central directory");
    Ok(count)
}

/// Owned stream wrapper around [`store`] and [`finalize`].
#[derive(Debug)]
pub struct ZipWriter<W> {
    inner: W,
}

impl<W> ZipWriter<W> {
    /// Wrap a stream. Entries are appended at its end.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consume the writer and return the stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Seek> ZipWriter<W> {
    /// Append a stored entry.
    pub fn store(&mut self, name: &str, bytes: &[u8]) -> Result<u64> {
        store(&mut self.inner, name, bytes)
    }
}

impl<W: Read + Write + Seek> ZipWriter<W> {
    /// Write the central directory and end record.
    pub fn finalize(&mut self) -> Result<usize> {
        finalize(&mut self.inner)
    }
}
