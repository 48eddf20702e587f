//! Hand-rolled fixed-Huffman encoder for building precise test streams.

#![allow(dead_code)]

use oxizip_deflate::tables::{
    DISTANCE_BASE, DISTANCE_EXTRA_BITS, LENGTH_BASE, LENGTH_EXTRA_BITS,
};

/// Map a match length (3-258) to `(symbol, extra_bits, extra_value)`.
pub fn length_to_code(length: u16) -> (u16, u8, u16) {
    assert!((3..=258).contains(&length), "length out of range: {length}");
    let index = LENGTH_BASE
        .iter()
        .rposition(|&base| base <= length)
        .unwrap();
    (
        257 + index as u16,
        LENGTH_EXTRA_BITS[index],
        length - LENGTH_BASE[index],
    )
}

/// Map a match distance (1-32768) to `(symbol, extra_bits, extra_value)`.
pub fn distance_to_code(distance: u16) -> (u16, u8, u16) {
    assert!(
        (1..=32768).contains(&distance),
        "distance out of range: {distance}"
    );
    let index = DISTANCE_BASE
        .iter()
        .rposition(|&base| base <= distance)
        .unwrap();
    (
        index as u16,
        DISTANCE_EXTRA_BITS[index],
        distance - DISTANCE_BASE[index],
    )
}

/// LSB-first bit writer.
#[derive(Debug, Default)]
pub struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    num_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `count` bits of `value`, least significant first.
    pub fn write_bits(&mut self, value: u32, count: u32) {
        for i in 0..count {
            self.acc |= ((value >> i) & 1) << self.num_bits;
            self.num_bits += 1;
            if self.num_bits == 8 {
                self.out.push(self.acc as u8);
                self.acc = 0;
                self.num_bits = 0;
            }
        }
    }

    /// Write a Huffman code, most significant bit first.
    pub fn write_code(&mut self, code: u32, len: u32) {
        for i in (0..len).rev() {
            self.write_bits((code >> i) & 1, 1);
        }
    }

    /// Pad to a byte boundary and return the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.num_bits > 0 {
            self.out.push(self.acc as u8);
        }
        self.out
    }
}

/// Encoder for a single fixed-Huffman block.
#[derive(Debug)]
pub struct FixedBlock {
    bits: BitWriter,
}

impl FixedBlock {
    /// Start a block; `final_block` sets BFINAL.
    pub fn new(final_block: bool) -> Self {
        let mut bits = BitWriter::new();
        bits.write_bits(final_block as u32, 1);
        bits.write_bits(1, 2);
        Self { bits }
    }

    /// Emit a literal/length symbol with the fixed code.
    pub fn symbol(&mut self, symbol: u16) {
        let symbol = symbol as u32;
        match symbol {
            0..=143 => self.bits.write_code(0x30 + symbol, 8),
            144..=255 => self.bits.write_code(0x190 + symbol - 144, 9),
            256..=279 => self.bits.write_code(symbol - 256, 7),
            _ => self.bits.write_code(0xC0 + symbol - 280, 8),
        }
    }

    pub fn literal(&mut self, byte: u8) {
        self.symbol(byte as u16);
    }

    pub fn literals(&mut self, data: &[u8]) {
        for &byte in data {
            self.literal(byte);
        }
    }

    /// Emit a distance symbol with the fixed 5-bit code.
    pub fn distance_symbol(&mut self, symbol: u16) {
        self.bits.write_code(symbol as u32, 5);
    }

    pub fn back_reference(&mut self, length: u16, distance: u16) {
        let (code, extra_bits, extra) = length_to_code(length);
        self.symbol(code);
        self.bits.write_bits(extra as u32, extra_bits as u32);
        let (code, extra_bits, extra) = distance_to_code(distance);
        self.distance_symbol(code);
        self.bits.write_bits(extra as u32, extra_bits as u32);
    }

    /// Emit end of block and return the stream.
    pub fn finish(mut self) -> Vec<u8> {
        self.symbol(256);
        self.bits.finish()
    }

    /// Return the stream without an end-of-block symbol.
    pub fn truncate(self) -> Vec<u8> {
        self.bits.finish()
    }
}

/// Reference LZ77 expansion used to compute expected output.
pub fn expand(output: &mut Vec<u8>, length: usize, distance: usize) {
    for _ in 0..length {
        let byte = output[output.len() - distance];
        output.push(byte);
    }
}
