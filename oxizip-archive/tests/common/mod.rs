//! Byte-level archive builder for directory reader tests.

#![allow(dead_code)]

/// 2021-06-15
pub const DOS_DATE: u16 = (41 << 9) | (6 << 5) | 15;
/// 13:45:30
pub const DOS_TIME: u16 = (13 << 11) | (45 << 5) | 15;

/// Encode `data` as one final fixed-Huffman block of literals only.
pub fn fixed_literals(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut acc = 0u32;
    let mut num_bits = 0u32;
    let mut put = |value: u32, count: u32, msb_first: bool| {
        for i in 0..count {
            let bit = if msb_first {
                (value >> (count - 1 - i)) & 1
            } else {
                (value >> i) & 1
            };
            acc |= bit << num_bits;
            num_bits += 1;
            if num_bits == 8 {
                out.push(acc as u8);
                acc = 0;
                num_bits = 0;
            }
        }
    };

    // BFINAL=1, BTYPE=01
    put(1, 1, false);
    put(1, 2, false);
    for &byte in data {
        let byte = byte as u32;
        if byte < 144 {
            put(0x30 + byte, 8, true);
        } else {
            put(0x190 + byte - 144, 9, true);
        }
    }
    // End of block
    put(0, 7, true);

    if num_bits > 0 {
        out.push(acc as u8);
    }
    out
}

/// One entry as it will be laid out in the archive.
#[derive(Debug, Clone)]
pub struct TestEntry {
    pub name: Vec<u8>,
    pub method: u16,
    pub payload: Vec<u8>,
    pub uncompressed_size: u32,
    /// Replaces the central directory compressed size when set.
    pub compressed_field: Option<u32>,
    pub central_extra: Vec<u8>,
    pub comment: Vec<u8>,
}

impl TestEntry {
    pub fn stored(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            method: 0,
            payload: data.to_vec(),
            uncompressed_size: data.len() as u32,
            compressed_field: None,
            central_extra: Vec::new(),
            comment: Vec::new(),
        }
    }

    pub fn deflated(name: &str, compressed: Vec<u8>, uncompressed_size: usize) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            method: 8,
            payload: compressed,
            uncompressed_size: uncompressed_size as u32,
            compressed_field: None,
            central_extra: Vec::new(),
            comment: Vec::new(),
        }
    }
}

/// Build a zip64 extra block holding `values` in order.
pub fn zip64_extra(values: &[u64]) -> Vec<u8> {
    let mut extra = Vec::new();
    extra.extend_from_slice(&1u16.to_le_bytes());
    extra.extend_from_slice(&((values.len() * 8) as u16).to_le_bytes());
    for value in values {
        extra.extend_from_slice(&value.to_le_bytes());
    }
    extra
}

/// Archive layout knobs.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    pub entries: Vec<TestEntry>,
    pub comment: Vec<u8>,
    pub disk_number: u16,
    /// Replaces "entries on this disk" when set.
    pub entries_on_disk: Option<u16>,
    /// Write the central directory through a zip64 end record.
    pub zip64_end: bool,
    /// Total disks announced by the zip64 locator.
    pub zip64_total_disks: u32,
    pub corrupt_central_signature: bool,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            zip64_total_disks: 1,
            ..Self::default()
        }
    }

    pub fn entry(mut self, entry: TestEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();

        for entry in &self.entries {
            offsets.push(out.len() as u32);
            out.extend_from_slice(&0x04034B50u32.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&entry.method.to_le_bytes());
            out.extend_from_slice(&DOS_TIME.to_le_bytes());
            out.extend_from_slice(&DOS_DATE.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&(entry.payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(&entry.payload);
        }

        let cd_offset = out.len() as u32;
        for (entry, offset) in self.entries.iter().zip(&offsets) {
            let signature: u32 = if self.corrupt_central_signature {
                0x02014B51
            } else {
                0x02014B50
            };
            let compressed = entry
                .compressed_field
                .unwrap_or(entry.payload.len() as u32);
            out.extend_from_slice(&signature.to_le_bytes());
            out.extend_from_slice(&45u16.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&entry.method.to_le_bytes());
            out.extend_from_slice(&DOS_TIME.to_le_bytes());
            out.extend_from_slice(&DOS_DATE.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&compressed.to_le_bytes());
            out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&(entry.central_extra.len() as u16).to_le_bytes());
            out.extend_from_slice(&(entry.comment.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(&entry.central_extra);
            out.extend_from_slice(&entry.comment);
        }
        let cd_size = out.len() as u32 - cd_offset;
        let count = self.entries.len() as u16;

        if self.zip64_end {
            let record_offset = out.len() as u64;
            out.extend_from_slice(&0x06064B50u32.to_le_bytes());
            out.extend_from_slice(&44u64.to_le_bytes());
            out.extend_from_slice(&45u16.to_le_bytes());
            out.extend_from_slice(&45u16.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&(count as u64).to_le_bytes());
            out.extend_from_slice(&(count as u64).to_le_bytes());
            out.extend_from_slice(&(cd_size as u64).to_le_bytes());
            out.extend_from_slice(&(cd_offset as u64).to_le_bytes());

            out.extend_from_slice(&0x07064B50u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&record_offset.to_le_bytes());
            out.extend_from_slice(&self.zip64_total_disks.to_le_bytes());
        }

        let (eocd_count, eocd_size, eocd_offset) = if self.zip64_end {
            (0xFFFF, 0xFFFF_FFFF, 0xFFFF_FFFF)
        } else {
            (count, cd_size, cd_offset)
        };
        out.extend_from_slice(&0x06054B50u32.to_le_bytes());
        out.extend_from_slice(&self.disk_number.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&self.entries_on_disk.unwrap_or(eocd_count).to_le_bytes());
        out.extend_from_slice(&eocd_count.to_le_bytes());
        out.extend_from_slice(&eocd_size.to_le_bytes());
        out.extend_from_slice(&eocd_offset.to_le_bytes());
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.comment);
        out
    }
}
