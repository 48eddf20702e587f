//! Central directory reading.
//!
//! [`read_directory`] finds the end of central directory record at the tail
//! of a seekable source, follows the zip64 locator when any 32-bit field is
//! saturated, then walks the central directory once to build a [`Directory`].

use super::dostime::dos_to_local;
use super::records::{
    CENTRAL_DIR_HEADER_SIZE, CentralDirectoryHeader, CompressionMethod, END_OF_CENTRAL_DIR_SIG,
    END_OF_CENTRAL_DIR_SIZE, EndOfCentralDirectory, MAX_COMMENT_LEN, ZIP64_EXTRA_FIELD_ID,
    ZIP64_LOCATOR_SIZE, ZIP64_MARKER_16, ZIP64_MARKER_32, Zip64EndOfCentralDirectory,
    Zip64Locator, read_field,
};
use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{DateTime, Local};
use oxizip_core::error::{OxiZipError, Result};
use std::borrow::Cow;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use tracing::{debug, trace, warn};

/// One archived file as described by the central directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    name_offset: usize,
    name_len: usize,
    /// Uncompressed size.
    pub uncompressed_size: u64,
    /// Compressed size.
    pub compressed_size: u64,
    /// Offset of the local file header.
    pub local_header_offset: u64,
    /// Modification time, with out-of-range DOS fields normalized.
    pub modification_time: Option<DateTime<Local>>,
    /// Raw DOS date.
    pub dos_date: u16,
    /// Raw DOS time.
    pub dos_time: u16,
    /// Compression method.
    pub method: CompressionMethod,
    /// CRC-32 as recorded. Never verified.
    pub crc32: u32,
    /// General purpose bit flag.
    pub flags: u16,
}

impl DirEntry {
    /// Whether the entry is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.flags & 0x0001 != 0
    }
}

/// The entry table of an archive plus the arena holding every file name.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: Vec<DirEntry>,
    names: Vec<u8>,
}

impl Directory {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in central directory order.
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Entries paired with their names.
    pub fn iter(&self) -> impl Iterator<Item = (&DirEntry, Cow<'_, str>)> {
        self.entries.iter().map(|entry| (entry, self.name(entry)))
    }

    /// Raw name bytes of an entry.
    pub fn name_bytes(&self, entry: &DirEntry) -> &[u8] {
        &self.names[entry.name_offset..entry.name_offset + entry.name_len]
    }

    /// Name of an entry, invalid UTF-8 replaced.
    pub fn name(&self, entry: &DirEntry) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name_bytes(entry))
    }

    /// Whether the entry names a directory.
    pub fn is_dir(&self, entry: &DirEntry) -> bool {
        self.name_bytes(entry).ends_with(b"/")
    }

    /// First entry whose name matches exactly.
    pub fn find(&self, name: &str) -> Option<&DirEntry> {
        self.entries
            .iter()
            .find(|entry| self.name_bytes(entry) == name.as_bytes())
    }

    /// Like [`find`](Self::find), failing with `EntryNotFound`.
    pub fn entry_by_name(&self, name: &str) -> Result<&DirEntry> {
        self.find(name)
            .ok_or_else(|| OxiZipError::entry_not_found(name))
    }
}

/// Central directory location after resolving zip64.
#[derive(Debug, Clone, Copy)]
struct DirectoryBounds {
    total_entries: u64,
    cd_size: u64,
    cd_offset: u64,
}

/// Read the central directory of a seekable source.
pub fn read_directory<R: Read + Seek>(source: &mut R) -> Result<Directory> {
    let source_len = source.seek(SeekFrom::End(0))?;
    let eocd_offset = find_end_of_central_directory(source, source_len)?;

    source.seek(SeekFrom::Start(eocd_offset))?;
    let eocd = EndOfCentralDirectory::read(source)?;
    if !eocd.is_single_disk() {
        return Err(OxiZipError::multi_disk(
            eocd.disk_number.into(),
            eocd.directory_disk.into(),
            eocd.entries_on_disk.into(),
            eocd.total_entries.into(),
        ));
    }

    let zip64 = eocd.needs_zip64();
    let bounds = if zip64 {
        read_zip64_bounds(source, eocd_offset)?
    } else {
        DirectoryBounds {
            total_entries: eocd.total_entries.into(),
            cd_size: eocd.cd_size.into(),
            cd_offset: eocd.cd_offset.into(),
        }
    };

    debug!(
        eocd_offset,
        zip64,
        entries = bounds.total_entries,
        cd_offset = bounds.cd_offset,
        cd_size = bounds.cd_size,
        "located end of central directory"
    );

    match bounds.cd_offset.checked_add(bounds.cd_size) {
        Some(end) if end <= source_len => {}
        _ => {
            return Err(OxiZipError::invalid_header(format!(
                "central directory at {} ({} bytes) lies outside the {}-byte source",
                bounds.cd_offset, bounds.cd_size, source_len
            )));
        }
    }

    read_entries(source, bounds)
}

/// Offset of the last end of central directory signature within reach.
fn find_end_of_central_directory<R: Read + Seek>(source: &mut R, source_len: u64) -> Result<u64> {
    if source_len < END_OF_CENTRAL_DIR_SIZE as u64 {
        return Err(OxiZipError::invalid_header(
            "file too small for end of central directory",
        ));
    }

    let search_len = source_len.min((END_OF_CENTRAL_DIR_SIZE + MAX_COMMENT_LEN) as u64);
    let search_start = source_len - search_len;
    let mut tail = vec![0u8; search_len as usize];
    source.seek(SeekFrom::Start(search_start))?;
    source.read_exact(&mut tail)?;

    let signature = END_OF_CENTRAL_DIR_SIG.to_le_bytes();
    (0..=tail.len() - END_OF_CENTRAL_DIR_SIZE)
        .rev()
        .find(|&i| tail[i..i + 4] == signature)
        .map(|i| search_start + i as u64)
        .ok_or_else(|| OxiZipError::invalid_header("end of central directory not found"))
}

/// Follow the zip64 locator preceding the end record at `eocd_offset`.
fn read_zip64_bounds<R: Read + Seek>(source: &mut R, eocd_offset: u64) -> Result<DirectoryBounds> {
    let locator_offset = eocd_offset
        .checked_sub(ZIP64_LOCATOR_SIZE as u64)
        .ok_or_else(|| OxiZipError::invalid_header("no room for zip64 locator"))?;
    source.seek(SeekFrom::Start(locator_offset))?;
    let locator = Zip64Locator::read(source)?;

    if locator.record_disk != 0 || locator.total_disks > 1 {
        return Err(OxiZipError::invalid_header(format!(
            "zip64 locator names disk {} of {}",
            locator.record_disk, locator.total_disks
        )));
    }
    if locator.total_disks == 0 {
        warn!("zip64 locator reports zero disks, treating as one");
    }

    source.seek(SeekFrom::Start(locator.record_offset))?;
    let record = Zip64EndOfCentralDirectory::read(source)?;
    if !record.is_single_disk() {
        return Err(OxiZipError::multi_disk(
            record.disk_number,
            record.directory_disk,
            record.entries_on_disk,
            record.total_entries,
        ));
    }

    Ok(DirectoryBounds {
        total_entries: record.total_entries,
        cd_size: record.cd_size,
        cd_offset: record.cd_offset,
    })
}

/// Walk the central directory and build the entry table.
fn read_entries<R: Read + Seek>(source: &mut R, bounds: DirectoryBounds) -> Result<Directory> {
    let mut names = Vec::new();
    let names_capacity = usize::try_from(bounds.cd_size)
        .map_err(|_| OxiZipError::allocation_failed(bounds.cd_size))?;
    names
        .try_reserve(names_capacity)
        .map_err(|_| OxiZipError::allocation_failed(bounds.cd_size))?;

    let mut entries: Vec<DirEntry> = Vec::new();
    let entries_capacity = bounds
        .total_entries
        .min(bounds.cd_size / CENTRAL_DIR_HEADER_SIZE as u64);
    entries
        .try_reserve(entries_capacity as usize)
        .map_err(|_| {
            OxiZipError::allocation_failed(
                entries_capacity.saturating_mul(std::mem::size_of::<DirEntry>() as u64),
            )
        })?;

    source.seek(SeekFrom::Start(bounds.cd_offset))?;
    let mut reader = BufReader::new(&mut *source);
    let mut extra = Vec::new();

    for index in 0..bounds.total_entries {
        let header = CentralDirectoryHeader::read(&mut reader)?;

        let name_offset = names.len();
        let name_len = header.name_len as usize;
        names.resize(name_offset + name_len, 0);
        read_field(&mut reader, &mut names[name_offset..], "file name")?;

        extra.resize(header.extra_len as usize, 0);
        read_field(&mut reader, &mut extra, "extra field")?;

        let comment_len = u64::from(header.comment_len);
        let skipped = io::copy(&mut (&mut reader).take(comment_len), &mut io::sink())?;
        if skipped < comment_len {
            return Err(OxiZipError::invalid_header(format!(
                "entry {index}: file comment truncated"
            )));
        }

        let sizes = resolve_sizes(&header, &extra)?;
        let entry = DirEntry {
            name_offset,
            name_len,
            uncompressed_size: sizes.uncompressed_size,
            compressed_size: sizes.compressed_size,
            local_header_offset: sizes.local_header_offset,
            modification_time: dos_to_local(header.dos_date, header.dos_time),
            dos_date: header.dos_date,
            dos_time: header.dos_time,
            method: CompressionMethod::from_u16(header.method),
            crc32: header.crc32,
            flags: header.flags,
        };

        trace!(
            index,
            name = %String::from_utf8_lossy(&names[name_offset..]),
            method = header.method,
            compressed = entry.compressed_size,
            uncompressed = entry.uncompressed_size,
            offset = entry.local_header_offset,
            "central directory entry"
        );

        entries.push(entry);
    }

    Ok(Directory { entries, names })
}

/// Sizes and offset with zip64 overrides applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResolvedSizes {
    uncompressed_size: u64,
    compressed_size: u64,
    local_header_offset: u64,
}

/// Apply the zip64 extra block to every field holding its sentinel.
fn resolve_sizes(header: &CentralDirectoryHeader, extra: &[u8]) -> Result<ResolvedSizes> {
    let mut sizes = ResolvedSizes {
        uncompressed_size: header.uncompressed_size.into(),
        compressed_size: header.compressed_size.into(),
        local_header_offset: header.local_header_offset.into(),
    };

    let needs_zip64 = header.uncompressed_size == ZIP64_MARKER_32
        || header.compressed_size == ZIP64_MARKER_32
        || header.local_header_offset == ZIP64_MARKER_32
        || header.disk_start == ZIP64_MARKER_16;

    let mut found = false;
    let mut rest = extra;
    while rest.len() >= 4 {
        let id = rest.read_u16::<LittleEndian>()?;
        let size = rest.read_u16::<LittleEndian>()? as usize;
        if size > rest.len() {
            return Err(OxiZipError::invalid_header(format!(
                "extra block {id:#06x} declares {size} bytes but only {} remain",
                rest.len()
            )));
        }
        let (block, tail) = rest.split_at(size);
        rest = tail;

        if id == ZIP64_EXTRA_FIELD_ID && needs_zip64 {
            apply_zip64_block(header, block, &mut sizes)?;
            found = true;
        }
    }

    if needs_zip64 && !found {
        warn!("zip64 sentinel without zip64 extra block, keeping 32-bit values");
    }

    Ok(sizes)
}

/// Read the sub-fields of a zip64 block in their fixed order.
fn apply_zip64_block(
    header: &CentralDirectoryHeader,
    mut block: &[u8],
    sizes: &mut ResolvedSizes,
) -> Result<()> {
    let missing =
        |field: &str| OxiZipError::invalid_header(format!("zip64 extra block missing {field}"));

    if header.uncompressed_size == ZIP64_MARKER_32 {
        sizes.uncompressed_size = block
            .read_u64::<LittleEndian>()
            .map_err(|_| missing("uncompressed size"))?;
    }
    if header.compressed_size == ZIP64_MARKER_32 {
        sizes.compressed_size = block
            .read_u64::<LittleEndian>()
            .map_err(|_| missing("compressed size"))?;
    }
    if header.local_header_offset == ZIP64_MARKER_32 {
        sizes.local_header_offset = block
            .read_u64::<LittleEndian>()
            .map_err(|_| missing("local header offset"))?;
    }
    if header.disk_start == ZIP64_MARKER_16 {
        let disk = block
            .read_u32::<LittleEndian>()
            .map_err(|_| missing("disk number"))?;
        if disk != 0 {
            return Err(OxiZipError::invalid_header(format!(
                "entry starts on disk {disk}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(compressed: u32, uncompressed: u32, offset: u32) -> CentralDirectoryHeader {
        CentralDirectoryHeader {
            version_made_by: 45,
            version_needed: 45,
            flags: 0,
            method: 8,
            dos_time: 0,
            dos_date: 0x21,
            crc32: 0,
            compressed_size: compressed,
            uncompressed_size: uncompressed,
            name_len: 0,
            extra_len: 0,
            comment_len: 0,
            disk_start: 0,
            internal_attr: 0,
            external_attr: 0,
            local_header_offset: offset,
        }
    }

    fn zip64_block(values: &[u64]) -> Vec<u8> {
        let mut extra = Vec::new();
        extra.extend_from_slice(&ZIP64_EXTRA_FIELD_ID.to_le_bytes());
        extra.extend_from_slice(&((values.len() * 8) as u16).to_le_bytes());
        for value in values {
            extra.extend_from_slice(&value.to_le_bytes());
        }
        extra
    }

    #[test]
    fn test_plain_sizes() {
        let sizes = resolve_sizes(&header(10, 20, 30), &[]).unwrap();
        assert_eq!(sizes.compressed_size, 10);
        assert_eq!(sizes.uncompressed_size, 20);
        assert_eq!(sizes.local_header_offset, 30);
    }

    #[test]
    fn test_zip64_overrides_only_sentinels() {
        // Only the compressed size is saturated, so the block holds just that.
        let extra = zip64_block(&[5_000_000_000]);
        let sizes = resolve_sizes(&header(ZIP64_MARKER_32, 20, 30), &extra).unwrap();
        assert_eq!(sizes.compressed_size, 5_000_000_000);
        assert_eq!(sizes.uncompressed_size, 20);
        assert_eq!(sizes.local_header_offset, 30);
    }

    #[test]
    fn test_zip64_field_order() {
        let extra = zip64_block(&[1 << 33, 1 << 32, 1 << 34]);
        let sizes = resolve_sizes(
            &header(ZIP64_MARKER_32, ZIP64_MARKER_32, ZIP64_MARKER_32),
            &extra,
        )
        .unwrap();
        assert_eq!(sizes.uncompressed_size, 1 << 33);
        assert_eq!(sizes.compressed_size, 1 << 32);
        assert_eq!(sizes.local_header_offset, 1 << 34);
    }

    #[test]
    fn test_zip64_block_ignored_without_sentinel() {
        let extra = zip64_block(&[999]);
        let sizes = resolve_sizes(&header(10, 20, 30), &extra).unwrap();
        assert_eq!(sizes.compressed_size, 10);
    }

    #[test]
    fn test_other_blocks_skipped() {
        let mut extra = vec![0x55, 0x54, 5, 0, 1, 2, 3, 4, 5];
        extra.extend(zip64_block(&[77]));
        let sizes = resolve_sizes(&header(10, ZIP64_MARKER_32, 30), &extra).unwrap();
        assert_eq!(sizes.uncompressed_size, 77);
    }

    #[test]
    fn test_block_overrunning_extra() {
        let extra = [0x55, 0x54, 9, 0, 1, 2];
        assert!(matches!(
            resolve_sizes(&header(10, 20, 30), &extra),
            Err(OxiZipError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_short_zip64_block() {
        let extra = zip64_block(&[77]);
        let result = resolve_sizes(
            &header(ZIP64_MARKER_32, ZIP64_MARKER_32, 30),
            &extra,
        );
        assert!(matches!(result, Err(OxiZipError::InvalidHeader { .. })));
    }

    #[test]
    fn test_missing_zip64_block_keeps_sentinel() {
        let sizes = resolve_sizes(&header(ZIP64_MARKER_32, 20, 30), &[]).unwrap();
        assert_eq!(sizes.compressed_size, u64::from(ZIP64_MARKER_32));
    }

    #[test]
    fn test_directory_lookup() {
        let entry = |name_offset, name_len| DirEntry {
            name_offset,
            name_len,
            uncompressed_size: 0,
            compressed_size: 0,
            local_header_offset: 0,
            modification_time: None,
            dos_date: 0,
            dos_time: 0,
            method: CompressionMethod::Stored,
            crc32: 0,
            flags: 0,
        };
        let directory = Directory {
            entries: vec![entry(0, 4), entry(4, 5), entry(9, 4)],
            names: b"dir/a.txtdir/".to_vec(),
        };

        assert_eq!(directory.len(), 3);
        assert_eq!(directory.name(&directory.entries()[1]), "a.txt");
        assert!(directory.is_dir(&directory.entries()[0]));
        assert!(!directory.is_dir(&directory.entries()[1]));

        // Duplicates resolve to the first occurrence.
        let found = directory.find("dir/").unwrap();
        assert!(std::ptr::eq(found, &directory.entries()[0]));
        assert!(matches!(
            directory.entry_by_name("missing"),
            Err(OxiZipError::EntryNotFound { .. })
        ));
    }
}
