//! Canonical Huffman decoding tables for DEFLATE.
//!
//! This module implements Huffman table construction and decoding as specified
//! in RFC 1951. DEFLATE uses canonical Huffman codes, where codes of the same
//! length are assigned consecutive values in lexicographic order, so a table
//! is fully determined by its array of per-symbol code lengths.
//!
//! # Alphabets
//!
//! DEFLATE uses three Huffman alphabets:
//! - **Literal/Length**: 0-287 (0-255 literals, 256 EOB, 257-285 lengths,
//!   286-287 reserved)
//! - **Distance**: 0-31 (0-29 distances, 30-31 reserved)
//! - **Code Length**: 0-18 (for encoding dynamic Huffman tables)
//!
//! # Lookup
//!
//! Codes of up to [`FAST_BITS`] bits are decoded with a single lookup into a
//! direct table indexed by the next 9 bits of input. Longer codes miss the
//! fast table and are resolved by comparing the bit-reversed 16-bit window
//! against the per-length upper bounds.

use oxizip_core::BitReader;
use oxizip_core::error::{OxiZipError, Result};
use oxizip_core::stream::ByteSource;

/// Maximum code length in DEFLATE (15 bits).
pub const MAX_CODE_LENGTH: usize = 15;

/// Number of bits resolved by the fast lookup table.
pub const FAST_BITS: u32 = 9;

/// Largest alphabet a table can hold (the literal/length alphabet).
pub const MAX_SYMBOLS: usize = 288;

/// Size of the literal/length alphabet including the two reserved symbols.
pub const LITLEN_ALPHABET_SIZE: usize = 288;

/// Size of the distance alphabet including the two reserved symbols.
pub const DISTANCE_ALPHABET_SIZE: usize = 32;

/// Size of the code length alphabet (0-18).
pub const CODELEN_ALPHABET_SIZE: usize = 19;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

const FAST_SIZE: usize = 1 << FAST_BITS;
const FAST_MASK: u32 = (FAST_SIZE as u32) - 1;

/// A canonical Huffman decoding table.
///
/// Fast entries pack `(code_length << 9) | symbol`; zero marks a miss.
#[derive(Clone)]
pub struct HuffmanTable {
    /// Direct lookup for codes of at most `FAST_BITS` bits.
    fast: [u16; FAST_SIZE],
    /// First canonical code of each length.
    first_code: [u16; 16],
    /// One past the last code of each length, left-aligned to 16 bits.
    max_code: [u32; 17],
    /// Index into `value` of the first symbol of each length.
    first_symbol: [u16; 16],
    /// Code length of each sorted slot.
    size: [u8; MAX_SYMBOLS],
    /// Symbol of each sorted slot.
    value: [u16; MAX_SYMBOLS],
}

impl std::fmt::Debug for HuffmanTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuffmanTable")
            .field("first_code", &self.first_code)
            .field("first_symbol", &self.first_symbol)
            .finish_non_exhaustive()
    }
}

impl HuffmanTable {
    /// Build a table from code lengths.
    ///
    /// `code_lengths[i]` is the bit length for symbol `i`; zero means the
    /// symbol is not used. Incomplete codes (including the all-zero array)
    /// are accepted, decoding an unassigned code then fails.
    pub fn build(code_lengths: &[u8]) -> Result<Self> {
        if code_lengths.len() > MAX_SYMBOLS {
            return Err(OxiZipError::invalid_code_lengths(format!(
                "{} symbols exceed the maximum of {}",
                code_lengths.len(),
                MAX_SYMBOLS
            )));
        }

        // Count codes of each length
        let mut sizes = [0u32; 17];
        for &len in code_lengths {
            if len as usize > MAX_CODE_LENGTH {
                return Err(OxiZipError::invalid_code_lengths(format!(
                    "Code length {} exceeds maximum {}",
                    len, MAX_CODE_LENGTH
                )));
            }
            sizes[len as usize] += 1;
        }
        sizes[0] = 0;
        for (len, &count) in sizes.iter().enumerate().take(16).skip(1) {
            if count > 1 << len {
                return Err(OxiZipError::invalid_code_lengths(format!(
                    "{} codes of length {} do not fit",
                    count, len
                )));
            }
        }

        let mut table = Self {
            fast: [0; FAST_SIZE],
            first_code: [0; 16],
            max_code: [0; 17],
            first_symbol: [0; 16],
            size: [0; MAX_SYMBOLS],
            value: [0; MAX_SYMBOLS],
        };

        // Compute first code for each length (RFC 1951 algorithm)
        let mut next_code = [0u32; 16];
        let mut code = 0u32;
        let mut k = 0u32;
        for len in 1..16 {
            next_code[len] = code;
            table.first_code[len] = code as u16;
            table.first_symbol[len] = k as u16;
            code += sizes[len];
            if sizes[len] > 0 && code - 1 >= 1 << len {
                return Err(OxiZipError::invalid_code_lengths(
                    "Over-subscribed Huffman code",
                ));
            }
            table.max_code[len] = code << (16 - len);
            code <<= 1;
            k += sizes[len];
        }
        table.max_code[16] = 0x10000;

        // Assign symbols to codes by increasing length, then symbol
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len == 0 {
                continue;
            }
            let len = len as usize;
            let slot = (next_code[len] - table.first_code[len] as u32
                + table.first_symbol[len] as u32) as usize;
            table.size[slot] = len as u8;
            table.value[slot] = symbol as u16;

            if len as u32 <= FAST_BITS {
                let entry = ((len as u16) << FAST_BITS) | symbol as u16;
                let mut index = reverse_bits(next_code[len], len as u32) as usize;
                while index < FAST_SIZE {
                    table.fast[index] = entry;
                    index += 1 << len;
                }
            }
            next_code[len] += 1;
        }

        Ok(table)
    }

    /// Decode one symbol from the bit stream.
    #[inline]
    pub fn decode<S: ByteSource>(&self, reader: &mut BitReader<S>) -> Result<u16> {
        reader.ensure(16)?;
        let entry = self.fast[(reader.code_buffer() & FAST_MASK) as usize];
        if entry != 0 {
            reader.consume(u32::from(entry >> FAST_BITS));
            return Ok(entry & FAST_MASK as u16);
        }
        self.decode_slow(reader)
    }

    /// Resolve a code longer than `FAST_BITS`.
    fn decode_slow<S: ByteSource>(&self, reader: &mut BitReader<S>) -> Result<u16> {
        let k = reverse_bits(reader.code_buffer() & 0xFFFF, 16);
        let mut len = FAST_BITS as usize + 1;
        while k >= self.max_code[len] {
            len += 1;
        }
        if len >= 16 {
            return Err(OxiZipError::invalid_huffman(reader.bit_position()));
        }

        let slot = (k >> (16 - len))
            .checked_sub(self.first_code[len] as u32)
            .map(|offset| offset as usize + self.first_symbol[len] as usize)
            .filter(|&slot| slot < MAX_SYMBOLS && self.size[slot] as usize == len)
            .ok_or_else(|| OxiZipError::invalid_huffman(reader.bit_position()))?;

        reader.consume(len as u32);
        Ok(self.value[slot])
    }
}

/// Reverse the low `length` bits of `code`.
#[inline]
pub fn reverse_bits(code: u32, length: u32) -> u32 {
    debug_assert!((1..=16).contains(&length));
    (code as u16).reverse_bits() as u32 >> (16 - length)
}
