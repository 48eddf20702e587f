//! Streaming DEFLATE decompression (inflate).
//!
//! This module implements the DEFLATE decompression algorithm as specified
//! in RFC 1951. It supports all three block types:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes
//!
//! Input is pulled through a [`ByteSource`] and output is pushed through a
//! [`ByteSink`]; the decoder itself only holds the input window of its
//! [`BitReader`] and the circular [`OutputWindow`], so neither the compressed
//! nor the decompressed payload has to fit in memory.

use crate::huffman::{HuffmanTable, END_OF_BLOCK};
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_EXTRA_BITS, LENGTH_EXTRA_BITS, decode_distance, decode_length,
    fixed_distance_table, fixed_litlen_table,
};
use crate::window::{DEFLATE_WINDOW_SIZE, OutputWindow};
use oxizip_core::bitstream::DEFAULT_INPUT_BUFFER_SIZE;
use oxizip_core::error::{OxiZipError, Result};
use oxizip_core::stream::{ByteSink, ByteSource, ReaderSource, SliceSource, WriterSink};
use oxizip_core::BitReader;
use std::io::{Read, Write};
use tracing::{debug, trace};

/// Default number of zero padding bytes a decode may consume.
pub const DEFAULT_OVERRUN_LIMIT: u64 = 32;

/// Literal/length plus distance code lengths of a dynamic block header.
const MAX_DYNAMIC_LENGTHS: usize = 288 + 32;

/// Tunables for [`Inflater`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflateOptions {
    /// Size of the circular output window in bytes.
    ///
    /// Back-references reaching further than this fail, so anything below
    /// 32 KiB only works for streams known to use short distances.
    pub window_size: usize,
    /// Size of the bit reader's input window in bytes.
    pub input_buffer_size: usize,
    /// Padding bytes tolerated after the source is exhausted, `None` for no limit.
    pub overrun_limit: Option<u64>,
}

impl Default for InflateOptions {
    fn default() -> Self {
        Self {
            window_size: DEFLATE_WINDOW_SIZE,
            input_buffer_size: DEFAULT_INPUT_BUFFER_SIZE,
            overrun_limit: Some(DEFAULT_OVERRUN_LIMIT),
        }
    }
}

impl InflateOptions {
    /// Set the output window size.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the input buffer size.
    pub fn with_input_buffer_size(mut self, input_buffer_size: usize) -> Self {
        self.input_buffer_size = input_buffer_size;
        self
    }

    /// Set the overrun limit.
    pub fn with_overrun_limit(mut self, overrun_limit: Option<u64>) -> Self {
        self.overrun_limit = overrun_limit;
        self
    }
}

/// Decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateState {
    /// Expecting a 3-bit block header.
    BlockHeader,
    /// Copying the body of a stored block.
    StoredBlock,
    /// Decoding symbols with the fixed tables.
    FixedHuffmanBlock,
    /// Decoding symbols with tables read from the block header.
    DynamicHuffmanBlock,
    /// The final block has ended.
    Done,
    /// Decoding stopped on an error.
    Failed,
}

/// Totals of a completed decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InflateSummary {
    /// Compressed bytes consumed.
    pub bytes_in: u64,
    /// Decompressed bytes produced.
    pub bytes_out: u64,
    /// Number of blocks decoded.
    pub blocks: u64,
}

/// Tables of the dynamic block being decoded.
#[derive(Debug)]
struct DynamicTables {
    litlen: HuffmanTable,
    distance: HuffmanTable,
}

/// DEFLATE decompressor.
#[derive(Debug)]
pub struct Inflater {
    options: InflateOptions,
    state: InflateState,
    window: OutputWindow,
    /// Whether the current block is the last one.
    final_block: bool,
    /// Bytes left in the current stored block.
    stored_remaining: usize,
    dynamic: Option<Box<DynamicTables>>,
    blocks: u64,
}

impl Inflater {
    /// Create a decompressor with default options.
    pub fn new() -> Self {
        Self::with_options(InflateOptions::default())
    }

    /// Create a decompressor with the given options.
    pub fn with_options(options: InflateOptions) -> Self {
        Self {
            options,
            state: InflateState::BlockHeader,
            window: OutputWindow::new(options.window_size),
            final_block: false,
            stored_remaining: 0,
            dynamic: None,
            blocks: 0,
        }
    }

    /// The options this decompressor was built with.
    pub fn options(&self) -> &InflateOptions {
        &self.options
    }

    /// Current state; `Done` or `Failed` after a call to [`inflate`](Self::inflate).
    pub fn state(&self) -> InflateState {
        self.state
    }

    /// Reset the decompressor for a new stream.
    pub fn reset(&mut self) {
        self.state = InflateState::BlockHeader;
        self.window.reset();
        self.final_block = false;
        self.stored_remaining = 0;
        self.dynamic = None;
        self.blocks = 0;
    }

    /// Decompress a whole stream from `source` into `sink`.
    pub fn inflate_source<S: ByteSource, K: ByteSink>(
        &mut self,
        source: S,
        sink: &mut K,
    ) -> Result<InflateSummary> {
        let mut reader = BitReader::with_capacity(source, self.options.input_buffer_size);
        self.inflate(&mut reader, sink)
    }

    /// Decompress one complete stream from a bit reader.
    ///
    /// Every produced byte has been handed to `sink` when this returns `Ok`.
    /// The decompressor is reset first, so it can be reused across streams.
    pub fn inflate<S: ByteSource, K: ByteSink>(
        &mut self,
        reader: &mut BitReader<S>,
        sink: &mut K,
    ) -> Result<InflateSummary> {
        self.reset();
        match self.run(reader, sink) {
            Ok(()) => {
                let summary = InflateSummary {
                    bytes_in: reader.bytes_consumed(),
                    bytes_out: self.window.total_out(),
                    blocks: self.blocks,
                };
                debug!(
                    bytes_in = summary.bytes_in,
                    bytes_out = summary.bytes_out,
                    blocks = summary.blocks,
                    "inflate complete"
                );
                Ok(summary)
            }
            Err(e) => {
                self.state = InflateState::Failed;
                debug!(error = %e, bit_position = reader.bit_position(), "inflate failed");
                Err(e)
            }
        }
    }

    fn run<S: ByteSource, K: ByteSink>(
        &mut self,
        reader: &mut BitReader<S>,
        sink: &mut K,
    ) -> Result<()> {
        let overrun_limit = self.options.overrun_limit;
        loop {
            match self.state {
                InflateState::BlockHeader => self.read_block_header(reader)?,
                InflateState::StoredBlock => {
                    self.inflate_stored(reader, sink)?;
                    self.end_block();
                }
                InflateState::FixedHuffmanBlock => {
                    decode_block(
                        &mut self.window,
                        reader,
                        sink,
                        fixed_litlen_table(),
                        fixed_distance_table(),
                        overrun_limit,
                    )?;
                    self.end_block();
                }
                InflateState::DynamicHuffmanBlock => {
                    let tables = self.dynamic.as_deref().ok_or_else(|| {
                        OxiZipError::invalid_code_lengths("Dynamic block without tables")
                    })?;
                    decode_block(
                        &mut self.window,
                        reader,
                        sink,
                        &tables.litlen,
                        &tables.distance,
                        overrun_limit,
                    )?;
                    self.end_block();
                }
                InflateState::Done => break,
                InflateState::Failed => {
                    return Err(OxiZipError::invalid_header("Decoder is in a failed state"));
                }
            }
        }

        self.window.finish(sink)
    }

    /// Advance past a finished block.
    fn end_block(&mut self) {
        self.blocks += 1;
        self.dynamic = None;
        self.state = if self.final_block {
            InflateState::Done
        } else {
            InflateState::BlockHeader
        };
    }

    /// Read a block header and move to the matching block state.
    fn read_block_header<S: ByteSource>(&mut self, reader: &mut BitReader<S>) -> Result<()> {
        self.final_block = reader.receive(1)? != 0;
        let block_type = reader.receive(2)? as u8;
        check_overrun(reader, self.options.overrun_limit)?;

        trace!(
            block = self.blocks,
            block_type,
            final_block = self.final_block,
            bit_position = reader.bit_position(),
            "block header"
        );

        self.state = match block_type {
            0 => {
                self.read_stored_header(reader)?;
                InflateState::StoredBlock
            }
            1 => InflateState::FixedHuffmanBlock,
            2 => {
                self.dynamic = Some(Box::new(read_dynamic_tables(reader)?));
                InflateState::DynamicHuffmanBlock
            }
            _ => return Err(OxiZipError::invalid_block_type(block_type)),
        };
        Ok(())
    }

    /// Read LEN and NLEN of a stored block.
    fn read_stored_header<S: ByteSource>(&mut self, reader: &mut BitReader<S>) -> Result<()> {
        reader.align_to_byte();

        let mut header = [0u8; 4];
        for byte in &mut header {
            *byte = reader.read_aligned_byte()?;
        }
        let len = u16::from_le_bytes([header[0], header[1]]);
        let nlen = u16::from_le_bytes([header[2], header[3]]);
        if len != !nlen {
            return Err(OxiZipError::stored_length_mismatch(len, nlen));
        }

        self.stored_remaining = len as usize;
        Ok(())
    }

    /// Copy the body of a stored block chunk by chunk.
    fn inflate_stored<S: ByteSource, K: ByteSink>(
        &mut self,
        reader: &mut BitReader<S>,
        sink: &mut K,
    ) -> Result<()> {
        while self.stored_remaining > 0 && reader.num_bits() >= 8 {
            let byte = reader.read_aligned_byte()?;
            self.window.push(byte, sink)?;
            self.stored_remaining -= 1;
        }

        while self.stored_remaining > 0 {
            let chunk = reader.read_aligned_chunk(self.stored_remaining)?;
            let n = chunk.len();
            self.window.write_slice(chunk, sink)?;
            self.stored_remaining -= n;
            check_overrun(reader, self.options.overrun_limit)?;
        }
        Ok(())
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail once the reader has consumed more padding than allowed.
#[inline]
fn check_overrun<S: ByteSource>(reader: &BitReader<S>, limit: Option<u64>) -> Result<()> {
    match limit {
        Some(limit) if reader.overrun() > limit => {
            Err(OxiZipError::unexpected_eof(reader.overrun()))
        }
        _ => Ok(()),
    }
}

/// Read the code length tables of a dynamic block header.
fn read_dynamic_tables<S: ByteSource>(reader: &mut BitReader<S>) -> Result<DynamicTables> {
    // HLIT and HDIST are accepted up to 288 and 32; the reserved symbols only
    // fail if they are actually decoded.
    let hlit = reader.receive(5)? as usize + 257;
    let hdist = reader.receive(5)? as usize + 1;
    let hclen = reader.receive(4)? as usize + 4;

    let mut code_length_lengths = [0u8; 19];
    for &symbol in CODE_LENGTH_ORDER.iter().take(hclen) {
        code_length_lengths[symbol] = reader.receive(3)? as u8;
    }
    let code_length_table = HuffmanTable::build(&code_length_lengths)?;

    let total = hlit + hdist;
    let mut lengths = [0u8; MAX_DYNAMIC_LENGTHS];
    let mut i = 0;
    while i < total {
        let symbol = code_length_table.decode(reader)?;
        let (value, repeat) = match symbol {
            0..=15 => (symbol as u8, 1),
            16 => {
                if i == 0 {
                    return Err(OxiZipError::invalid_code_lengths(
                        "Repeat code with no previous length",
                    ));
                }
                (lengths[i - 1], reader.receive(2)? as usize + 3)
            }
            17 => (0, reader.receive(3)? as usize + 3),
            18 => (0, reader.receive(7)? as usize + 11),
            _ => return Err(OxiZipError::invalid_huffman(reader.bit_position())),
        };
        if i + repeat > total {
            return Err(OxiZipError::invalid_code_lengths(format!(
                "Run of {} overflows {} code lengths",
                repeat, total
            )));
        }
        lengths[i..i + repeat].fill(value);
        i += repeat;
    }

    Ok(DynamicTables {
        litlen: HuffmanTable::build(&lengths[..hlit])?,
        distance: HuffmanTable::build(&lengths[hlit..total])?,
    })
}

/// Decode literal/length and distance symbols until end of block.
fn decode_block<S: ByteSource, K: ByteSink>(
    window: &mut OutputWindow,
    reader: &mut BitReader<S>,
    sink: &mut K,
    litlen: &HuffmanTable,
    distance: &HuffmanTable,
    overrun_limit: Option<u64>,
) -> Result<()> {
    loop {
        check_overrun(reader, overrun_limit)?;
        let symbol = litlen.decode(reader)?;

        if symbol < 256 {
            window.push(symbol as u8, sink)?;
        } else if symbol == END_OF_BLOCK {
            return Ok(());
        } else if symbol <= 285 {
            let length_idx = (symbol - 257) as usize;
            let extra = reader.receive(LENGTH_EXTRA_BITS[length_idx] as u32)? as u16;
            let length = decode_length(symbol, extra);

            let dist_symbol = distance.decode(reader)?;
            if dist_symbol >= 30 {
                return Err(OxiZipError::invalid_huffman(reader.bit_position()));
            }
            let dist_extra =
                reader.receive(DISTANCE_EXTRA_BITS[dist_symbol as usize] as u32)? as u16;
            let dist = decode_distance(dist_symbol, dist_extra);

            window.copy_match(dist as usize, length as usize, sink)?;
        } else {
            return Err(OxiZipError::invalid_huffman(reader.bit_position()));
        }
    }
}

/// Decompress DEFLATE data held in memory.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    Inflater::new().inflate_source(SliceSource::new(data), &mut output)?;
    Ok(output)
}

/// Decompress DEFLATE data from a reader into a writer.
///
/// Returns the number of bytes written.
pub fn inflate_to<R: Read, W: Write>(reader: R, writer: W) -> Result<u64> {
    let mut sink = WriterSink::new(writer);
    let summary = Inflater::new().inflate_source(ReaderSource::new(reader), &mut sink)?;
    Ok(summary.bytes_out)
}
