//! ZIP record layouts.
//!
//! Each record is read as one fixed-size block and decoded field by field
//! (all integers little-endian). Variable-length tails such as file names and
//! extra fields are left to the caller.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use oxizip_core::error::{OxiZipError, Result};
use std::io::{ErrorKind, Read, Write};

/// ZIP local file header signature.
pub const LOCAL_FILE_HEADER_SIG: u32 = 0x04034B50;

/// ZIP central directory header signature.
pub const CENTRAL_DIR_HEADER_SIG: u32 = 0x02014B50;

/// ZIP end of central directory signature.
pub const END_OF_CENTRAL_DIR_SIG: u32 = 0x06054B50;

/// ZIP64 end of central directory signature.
pub const ZIP64_END_OF_CENTRAL_DIR_SIG: u32 = 0x06064B50;

/// ZIP64 end of central directory locator signature.
pub const ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIG: u32 = 0x07064B50;

/// ZIP64 extra field header ID.
pub const ZIP64_EXTRA_FIELD_ID: u16 = 0x0001;

/// Marker value for Zip64 (0xFFFFFFFF for 32-bit fields).
pub const ZIP64_MARKER_32: u32 = 0xFFFF_FFFF;

/// Marker value for Zip64 (0xFFFF for 16-bit fields).
pub const ZIP64_MARKER_16: u16 = 0xFFFF;

/// Fixed size of a local file header.
pub const LOCAL_FILE_HEADER_SIZE: usize = 30;

/// Fixed size of a central directory header.
pub const CENTRAL_DIR_HEADER_SIZE: usize = 46;

/// Fixed size of the end of central directory record.
pub const END_OF_CENTRAL_DIR_SIZE: usize = 22;

/// Size of the zip64 end of central directory locator.
pub const ZIP64_LOCATOR_SIZE: usize = 20;

/// Fixed size of the zip64 end of central directory record.
pub const ZIP64_END_OF_CENTRAL_DIR_SIZE: usize = 56;

/// Longest archive comment the end record can announce.
pub const MAX_COMMENT_LEN: usize = 0xFFFF;

/// ZIP compression methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Stored (no compression).
    Stored,
    /// Deflate compression.
    Deflate,
    /// Unknown method.
    Unknown(u16),
}

impl CompressionMethod {
    /// Create from a u16 value.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::Stored,
            8 => Self::Deflate,
            _ => Self::Unknown(value),
        }
    }

    /// The method identifier as stored in headers.
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::Stored => 0,
            Self::Deflate => 8,
            Self::Unknown(value) => *value,
        }
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Deflate => "deflate",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Read a fixed-size record into a buffer and check its signature.
fn read_record<R: Read, const N: usize>(reader: &mut R, signature: u32) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            OxiZipError::invalid_header(format!("truncated record {signature:#010x}"))
        }
        _ => e.into(),
    })?;
    let found = (&buf[..]).read_u32::<LittleEndian>()?;
    if found != signature {
        return Err(OxiZipError::invalid_magic(signature, found));
    }
    Ok(buf)
}

/// `read_exact` that reports running out of input as a truncated field.
pub(crate) fn read_field<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => OxiZipError::invalid_header(format!("truncated {what}")),
        _ => e.into(),
    })
}

/// End of central directory record (22 bytes plus comment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    /// Number of this disk.
    pub disk_number: u16,
    /// Disk where the central directory starts.
    pub directory_disk: u16,
    /// Central directory entries on this disk.
    pub entries_on_disk: u16,
    /// Total central directory entries.
    pub total_entries: u16,
    /// Size of the central directory in bytes.
    pub cd_size: u32,
    /// Offset of the central directory.
    pub cd_offset: u32,
    /// Length of the trailing comment.
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    /// Read the record, signature included.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let buf: [u8; END_OF_CENTRAL_DIR_SIZE] = read_record(reader, END_OF_CENTRAL_DIR_SIG)?;
        let mut cursor = &buf[4..];

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            directory_disk: cursor.read_u16::<LittleEndian>()?,
            entries_on_disk: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Write the record without a comment.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(END_OF_CENTRAL_DIR_SIG)?;
        writer.write_u16::<LittleEndian>(self.disk_number)?;
        writer.write_u16::<LittleEndian>(self.directory_disk)?;
        writer.write_u16::<LittleEndian>(self.entries_on_disk)?;
        writer.write_u16::<LittleEndian>(self.total_entries)?;
        writer.write_u32::<LittleEndian>(self.cd_size)?;
        writer.write_u32::<LittleEndian>(self.cd_offset)?;
        writer.write_u16::<LittleEndian>(self.comment_len)?;
        Ok(())
    }

    /// Whether any field is saturated and the zip64 record must be consulted.
    pub fn needs_zip64(&self) -> bool {
        self.total_entries == ZIP64_MARKER_16
            || self.cd_size == ZIP64_MARKER_32
            || self.cd_offset == ZIP64_MARKER_32
    }

    /// Whether the disk fields describe a single-disk archive.
    pub fn is_single_disk(&self) -> bool {
        self.disk_number == 0
            && self.directory_disk == 0
            && self.entries_on_disk == self.total_entries
    }
}

/// Zip64 end of central directory locator (20 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64Locator {
    /// Disk holding the zip64 end record.
    pub record_disk: u32,
    /// Offset of the zip64 end record.
    pub record_offset: u64,
    /// Total number of disks.
    pub total_disks: u32,
}

impl Zip64Locator {
    /// Read the locator, signature included.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let buf: [u8; ZIP64_LOCATOR_SIZE] =
            read_record(reader, ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIG)?;
        let mut cursor = &buf[4..];

        Ok(Self {
            record_disk: cursor.read_u32::<LittleEndian>()?,
            record_offset: cursor.read_u64::<LittleEndian>()?,
            total_disks: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// Zip64 end of central directory record (56 bytes, extensible data ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64EndOfCentralDirectory {
    /// Size of the rest of the record.
    pub record_size: u64,
    /// Version made by.
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// Number of this disk.
    pub disk_number: u32,
    /// Disk where the central directory starts.
    pub directory_disk: u32,
    /// Central directory entries on this disk.
    pub entries_on_disk: u64,
    /// Total central directory entries.
    pub total_entries: u64,
    /// Size of the central directory in bytes.
    pub cd_size: u64,
    /// Offset of the central directory.
    pub cd_offset: u64,
}

impl Zip64EndOfCentralDirectory {
    /// Read the record, signature included.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let buf: [u8; ZIP64_END_OF_CENTRAL_DIR_SIZE] =
            read_record(reader, ZIP64_END_OF_CENTRAL_DIR_SIG)?;
        let mut cursor = &buf[4..];

        Ok(Self {
            record_size: cursor.read_u64::<LittleEndian>()?,
            version_made_by: cursor.read_u16::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            disk_number: cursor.read_u32::<LittleEndian>()?,
            directory_disk: cursor.read_u32::<LittleEndian>()?,
            entries_on_disk: cursor.read_u64::<LittleEndian>()?,
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }

    /// Whether the disk fields describe a single-disk archive.
    pub fn is_single_disk(&self) -> bool {
        self.disk_number == 0
            && self.directory_disk == 0
            && self.entries_on_disk == self.total_entries
    }
}

/// Fixed part of a central directory header (46 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    /// Version made by.
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flag.
    pub flags: u16,
    /// Compression method.
    pub method: u16,
    /// Last modification time.
    pub dos_time: u16,
    /// Last modification date.
    pub dos_date: u16,
    /// CRC-32 of uncompressed data.
    pub crc32: u32,
    /// Compressed size, or the zip64 marker.
    pub compressed_size: u32,
    /// Uncompressed size, or the zip64 marker.
    pub uncompressed_size: u32,
    /// File name length.
    pub name_len: u16,
    /// Extra field length.
    pub extra_len: u16,
    /// File comment length.
    pub comment_len: u16,
    /// Disk number start, or the zip64 marker.
    pub disk_start: u16,
    /// Internal file attributes.
    pub internal_attr: u16,
    /// External file attributes.
    pub external_attr: u32,
    /// Offset of the local header, or the zip64 marker.
    pub local_header_offset: u32,
}

impl CentralDirectoryHeader {
    /// Read the fixed part, signature included.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let buf: [u8; CENTRAL_DIR_HEADER_SIZE] = read_record(reader, CENTRAL_DIR_HEADER_SIG)?;
        let mut cursor = &buf[4..];

        Ok(Self {
            version_made_by: cursor.read_u16::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            flags: cursor.read_u16::<LittleEndian>()?,
            method: cursor.read_u16::<LittleEndian>()?,
            dos_time: cursor.read_u16::<LittleEndian>()?,
            dos_date: cursor.read_u16::<LittleEndian>()?,
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            name_len: cursor.read_u16::<LittleEndian>()?,
            extra_len: cursor.read_u16::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
            disk_start: cursor.read_u16::<LittleEndian>()?,
            internal_attr: cursor.read_u16::<LittleEndian>()?,
            external_attr: cursor.read_u32::<LittleEndian>()?,
            local_header_offset: cursor.read_u32::<LittleEndian>()?,
        })
    }

    /// Write the fixed part.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(CENTRAL_DIR_HEADER_SIG)?;
        writer.write_u16::<LittleEndian>(self.version_made_by)?;
        writer.write_u16::<LittleEndian>(self.version_needed)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.method)?;
        writer.write_u16::<LittleEndian>(self.dos_time)?;
        writer.write_u16::<LittleEndian>(self.dos_date)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        writer.write_u16::<LittleEndian>(self.name_len)?;
        writer.write_u16::<LittleEndian>(self.extra_len)?;
        writer.write_u16::<LittleEndian>(self.comment_len)?;
        writer.write_u16::<LittleEndian>(self.disk_start)?;
        writer.write_u16::<LittleEndian>(self.internal_attr)?;
        writer.write_u32::<LittleEndian>(self.external_attr)?;
        writer.write_u32::<LittleEndian>(self.local_header_offset)?;
        Ok(())
    }
}

/// Fixed part of a local file header (30 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFileHeader {
    /// Minimum version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flag.
    pub flags: u16,
    /// Compression method.
    pub method: u16,
    /// Last modification time.
    pub dos_time: u16,
    /// Last modification date.
    pub dos_date: u16,
    /// CRC-32 of uncompressed data.
    pub crc32: u32,
    /// Compressed size.
    pub compressed_size: u32,
    /// Uncompressed size.
    pub uncompressed_size: u32,
    /// File name length.
    pub name_len: u16,
    /// Extra field length.
    pub extra_len: u16,
}

impl LocalFileHeader {
    /// Read the fixed part, signature included.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let buf: [u8; LOCAL_FILE_HEADER_SIZE] = read_record(reader, LOCAL_FILE_HEADER_SIG)?;
        let mut cursor = &buf[4..];

        Ok(Self {
            version_needed: cursor.read_u16::<LittleEndian>()?,
            flags: cursor.read_u16::<LittleEndian>()?,
            method: cursor.read_u16::<LittleEndian>()?,
            dos_time: cursor.read_u16::<LittleEndian>()?,
            dos_date: cursor.read_u16::<LittleEndian>()?,
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            name_len: cursor.read_u16::<LittleEndian>()?,
            extra_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Write the fixed part.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(LOCAL_FILE_HEADER_SIG)?;
        writer.write_u16::<LittleEndian>(self.version_needed)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.method)?;
        writer.write_u16::<LittleEndian>(self.dos_time)?;
        writer.write_u16::<LittleEndian>(self.dos_date)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        writer.write_u16::<LittleEndian>(self.name_len)?;
        writer.write_u16::<LittleEndian>(self.extra_len)?;
        Ok(())
    }

    /// Bytes from the start of the header to the payload.
    pub fn header_len(&self) -> u64 {
        LOCAL_FILE_HEADER_SIZE as u64 + self.name_len as u64 + self.extra_len as u64
    }
}
