//! Bit-level input for DEFLATE decoding.
//!
//! [`BitReader`] pulls bytes from a [`ByteSource`] into an owned input
//! window and serves bits from a 32-bit code accumulator.
//!
//! # Bit Ordering
//!
//! DEFLATE packs bits LSB-first within bytes: the first bit of the stream is
//! the least significant bit of the first byte. Huffman codes are the one
//! exception, they are packed starting from their most significant bit, which
//! is why the Huffman tables index with bit-reversed codes.
//!
//! # Exhausted sources
//!
//! Once the source reports exhaustion the reader keeps supplying zero bytes.
//! DEFLATE streams end on a bit boundary and the accumulator reads ahead of
//! the last needed bit, so running off the end is normal. The number of
//! padding bytes consumed is reported by [`BitReader::overrun`] and lets the
//! caller decide when a stream is truncated.
//!
//! # Example
//!
//! ```
//! use oxizip_core::bitstream::BitReader;
//! use oxizip_core::stream::SliceSource;
//!
//! let data = [0b1010_1101u8, 0xFF];
//! let mut reader = BitReader::new(SliceSource::new(&data));
//! assert_eq!(reader.receive(3).unwrap(), 0b101);
//! assert_eq!(reader.receive(5).unwrap(), 0b10101);
//! assert_eq!(reader.receive(8).unwrap(), 0xFF);
//! // Past the end: zero padding. The first refill already read ahead two
//! // bytes past the end.
//! assert_eq!(reader.receive(8).unwrap(), 0);
//! assert_eq!(reader.overrun(), 2);
//! ```

use crate::error::Result;
use crate::stream::ByteSource;

/// Default size of the input window.
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 8 * 1024;

/// Largest bit count [`BitReader::receive`] accepts.
pub const MAX_RECEIVE_BITS: u32 = 24;

/// Zero bytes handed out once the source is exhausted.
static ZEROS: [u8; 64] = [0; 64];

/// A bit-level reader over a refillable byte source.
#[derive(Debug)]
pub struct BitReader<S: ByteSource> {
    /// Byte source.
    source: S,
    /// Input window.
    input: Box<[u8]>,
    /// Next unread byte in `input`.
    pos: usize,
    /// End of valid bytes in `input`.
    end: usize,
    /// Bit accumulator (LSB-first).
    code_buffer: u32,
    /// Number of valid bits in `code_buffer`.
    num_bits: u32,
    /// Source bytes moved out of the input window.
    bytes_consumed: u64,
    /// Padding bytes supplied after exhaustion.
    overrun: u64,
    /// Source reported exhaustion.
    exhausted: bool,
}

impl<S: ByteSource> BitReader<S> {
    /// Create a reader with the default input window.
    pub fn new(source: S) -> Self {
        Self::with_capacity(source, DEFAULT_INPUT_BUFFER_SIZE)
    }

    /// Create a reader with an input window of `capacity` bytes (at least 1).
    pub fn with_capacity(source: S, capacity: usize) -> Self {
        Self {
            source,
            input: vec![0u8; capacity.max(1)].into_boxed_slice(),
            pos: 0,
            end: 0,
            code_buffer: 0,
            num_bits: 0,
            bytes_consumed: 0,
            overrun: 0,
            exhausted: false,
        }
    }

    /// Get a reference to the source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the reader and return the source.
    ///
    /// Bytes already pulled into the input window are lost.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Number of valid bits in the accumulator.
    #[inline]
    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// The raw accumulator; bit 0 is the next bit of the stream.
    #[inline]
    pub fn code_buffer(&self) -> u32 {
        self.code_buffer
    }

    /// Padding bytes consumed after the source was exhausted.
    pub fn overrun(&self) -> u64 {
        self.overrun
    }

    /// Bits consumed so far, for error reporting.
    pub fn bit_position(&self) -> u64 {
        (self.bytes_consumed + self.overrun) * 8 - self.num_bits as u64
    }

    /// Source bytes consumed by bit reads, excluding what sits in the accumulator.
    pub fn bytes_consumed(&self) -> u64 {
        (self.bytes_consumed + self.overrun)
            .saturating_sub((self.num_bits / 8) as u64)
            .min(self.bytes_consumed)
    }

    /// Pull the next batch of bytes from the source into the input window.
    fn refill(&mut self) -> Result<()> {
        self.pos = 0;
        self.end = 0;
        if self.exhausted {
            return Ok(());
        }
        let n = self.source.refill(&mut self.input)?;
        if n == 0 {
            self.exhausted = true;
        }
        self.end = n.min(self.input.len());
        Ok(())
    }

    /// Next input byte, or zero once the source is exhausted.
    #[inline]
    fn next_byte(&mut self) -> Result<u8> {
        if self.pos == self.end {
            self.refill()?;
            if self.pos == self.end {
                self.overrun += 1;
                return Ok(0);
            }
        }
        let byte = self.input[self.pos];
        self.pos += 1;
        self.bytes_consumed += 1;
        Ok(byte)
    }

    /// Top the accumulator up to more than 24 valid bits.
    #[inline]
    pub fn fill(&mut self) -> Result<()> {
        while self.num_bits <= MAX_RECEIVE_BITS {
            let byte = self.next_byte()?;
            self.code_buffer |= (byte as u32) << self.num_bits;
            self.num_bits += 8;
        }
        Ok(())
    }

    /// Make sure at least `count` bits (at most 24) are buffered.
    #[inline]
    pub fn ensure(&mut self, count: u32) -> Result<()> {
        if self.num_bits < count {
            self.fill()?;
        }
        Ok(())
    }

    /// Drop `count` already-buffered bits.
    #[inline]
    pub fn consume(&mut self, count: u32) {
        debug_assert!(count <= self.num_bits, "Consuming unbuffered bits");
        self.code_buffer >>= count;
        self.num_bits -= count;
    }

    /// Read and consume `count` bits (0-24), first bit in the LSB position.
    #[inline]
    pub fn receive(&mut self, count: u32) -> Result<u32> {
        debug_assert!(count <= MAX_RECEIVE_BITS, "Cannot receive more than 24 bits");

        if count == 0 {
            return Ok(0);
        }
        self.ensure(count)?;
        let value = self.code_buffer & ((1u32 << count) - 1);
        self.consume(count);
        Ok(value)
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.receive(1)? != 0)
    }

    /// Discard bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        let partial = self.num_bits & 7;
        self.consume(partial);
    }

    /// Read one byte after [`align_to_byte`](Self::align_to_byte).
    ///
    /// Whole bytes still sitting in the accumulator are drained first.
    pub fn read_aligned_byte(&mut self) -> Result<u8> {
        debug_assert!(self.num_bits % 8 == 0, "Reader is not byte aligned");

        if self.num_bits >= 8 {
            let byte = (self.code_buffer & 0xFF) as u8;
            self.consume(8);
            return Ok(byte);
        }
        self.next_byte()
    }

    /// Borrow up to `max` raw bytes directly from the input window.
    ///
    /// The accumulator must be empty, which holds after reading a stored
    /// block header. Never returns an empty slice for `max > 0`: once the
    /// source is exhausted the slice is zero padding.
    pub fn read_aligned_chunk(&mut self, max: usize) -> Result<&[u8]> {
        debug_assert!(self.num_bits == 0, "Accumulator still holds bits");

        if max == 0 {
            return Ok(&[]);
        }
        if self.pos == self.end {
            self.refill()?;
        }
        if self.pos == self.end {
            let n = max.min(ZEROS.len());
            self.overrun += n as u64;
            return Ok(&ZEROS[..n]);
        }
        let n = max.min(self.end - self.pos);
        let start = self.pos;
        self.pos += n;
        self.bytes_consumed += n as u64;
        Ok(&self.input[start..start + n])
    }
}
