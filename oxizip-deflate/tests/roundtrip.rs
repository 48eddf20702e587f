//! Decoding of streams produced by a conforming encoder.

mod common;

use flate2::Compression;
use flate2::write::DeflateEncoder;
use oxizip_core::stream::{NullSink, ReaderSource, SliceSource};
use oxizip_deflate::{InflateOptions, Inflater, inflate, inflate_to};
use std::io::{Cursor, Write};

fn compress(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn text(size: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. 0123456789\n";
    let mut data: Vec<u8> = pattern.iter().copied().cycle().take(size).collect();
    // Sprinkle some variation so the encoder emits dynamic blocks.
    for (i, byte) in data.iter_mut().enumerate().step_by(97) {
        *byte = (i % 251) as u8;
    }
    data
}

fn random(size: usize) -> Vec<u8> {
    let mut seed: u64 = 0x9E3779B97F4A7C15;
    (0..size)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            (seed >> 33) as u8
        })
        .collect()
}

#[test]
fn test_all_levels() {
    let input = text(100 * 1024);
    for level in 0..=9 {
        let compressed = compress(&input, level);
        let decompressed = inflate(&compressed).unwrap();
        assert_eq!(decompressed, input, "Level {} failed", level);
    }
}

#[test]
fn test_empty_input() {
    let compressed = compress(b"", 6);
    assert!(inflate(&compressed).unwrap().is_empty());
}

#[test]
fn test_single_byte() {
    let compressed = compress(b"A", 6);
    assert_eq!(inflate(&compressed).unwrap(), b"A");
}

#[test]
fn test_incompressible_data() {
    let input = random(200 * 1024);
    let compressed = compress(&input, 6);
    assert_eq!(inflate(&compressed).unwrap(), input);
}

#[test]
fn test_all_zeros() {
    let input = vec![0u8; 300 * 1024];
    let compressed = compress(&input, 9);
    assert!(compressed.len() < input.len() / 100);
    assert_eq!(inflate(&compressed).unwrap(), input);
}

#[test]
fn test_tiny_input_buffer() {
    let input = text(64 * 1024);
    let compressed = compress(&input, 6);

    for input_buffer_size in [1usize, 7, 300] {
        let options = InflateOptions::default().with_input_buffer_size(input_buffer_size);
        let mut output = Vec::new();
        let summary = Inflater::with_options(options)
            .inflate_source(SliceSource::new(&compressed), &mut output)
            .unwrap();
        assert_eq!(output, input, "Input buffer {} failed", input_buffer_size);
        assert_eq!(summary.bytes_out, input.len() as u64);
        assert_eq!(summary.bytes_in, compressed.len() as u64);
    }
}

#[test]
fn test_payload_larger_than_window() {
    let mut input = text(512 * 1024);
    input.extend(random(64 * 1024));
    input.extend(text(512 * 1024));
    let compressed = compress(&input, 9);

    let mut sink = NullSink::new();
    let summary = Inflater::new()
        .inflate_source(SliceSource::new(&compressed), &mut sink)
        .unwrap();
    assert_eq!(sink.bytes(), input.len() as u64);
    assert_eq!(summary.bytes_out, input.len() as u64);
    // One flush per window turnover plus the final partial window.
    assert!(sink.flushes() >= (input.len() / 32768) as u64);

    let mut output = Vec::new();
    inflate_to(Cursor::new(&compressed), &mut output).unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_reader_source() {
    let input = text(10_000);
    let compressed = compress(&input, 1);
    let mut output = Vec::new();
    Inflater::new()
        .inflate_source(ReaderSource::new(Cursor::new(compressed)), &mut output)
        .unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_truncated_stream_fails() {
    let input = text(100 * 1024);
    let compressed = compress(&input, 6);
    let truncated = &compressed[..compressed.len() / 2];
    assert!(inflate(truncated).is_err());
}

#[test]
fn test_small_window_with_short_distances() {
    // A window smaller than the payload works as long as every
    // back-reference stays inside it.
    let mut block = common::FixedBlock::new(true);
    let mut expected = Vec::new();
    block.literals(b"abcdefgh");
    expected.extend_from_slice(b"abcdefgh");
    for i in 0..50u16 {
        let distance = 1 + i % 8;
        let length = 3 + i % 20;
        block.back_reference(length, distance);
        common::expand(&mut expected, length as usize, distance as usize);
        block.literal(b'0' + (i % 10) as u8);
        expected.push(b'0' + (i % 10) as u8);
    }
    let compressed = block.finish();

    let options = InflateOptions::default().with_window_size(16);
    let mut output = Vec::new();
    Inflater::with_options(options)
        .inflate_source(SliceSource::new(&compressed), &mut output)
        .unwrap();
    assert!(expected.len() > 16);
    assert_eq!(output, expected);
}

#[test]
fn test_back_reference_wraps_window() {
    // Window of 8: seven literals, then a copy whose source and destination
    // both straddle the end of the circular buffer.
    let mut block = common::FixedBlock::new(true);
    let mut expected = b"0123456".to_vec();
    block.literals(b"0123456");
    block.back_reference(6, 6);
    common::expand(&mut expected, 6, 6);
    block.back_reference(5, 8);
    common::expand(&mut expected, 5, 8);
    block.back_reference(3, 1);
    common::expand(&mut expected, 3, 1);
    let compressed = block.finish();

    let options = InflateOptions::default().with_window_size(8);
    let mut output = Vec::new();
    Inflater::with_options(options)
        .inflate_source(SliceSource::new(&compressed), &mut output)
        .unwrap();
    assert_eq!(output, expected);
}
