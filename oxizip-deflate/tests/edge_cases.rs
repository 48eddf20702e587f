//! Malformed and boundary DEFLATE streams.

mod common;

use common::{BitWriter, FixedBlock, distance_to_code, length_to_code};
use oxizip_core::OxiZipError;
use oxizip_core::stream::SliceSource;
use oxizip_deflate::{InflateOptions, InflateState, Inflater, inflate};

#[test]
fn test_fixed_block_symbol_mapping() {
    assert_eq!(length_to_code(3), (257, 0, 0));
    assert_eq!(length_to_code(12), (265, 1, 1));
    assert_eq!(length_to_code(257), (284, 5, 30));
    assert_eq!(length_to_code(258), (285, 0, 0));
    assert_eq!(distance_to_code(1), (0, 0, 0));
    assert_eq!(distance_to_code(6), (4, 1, 1));
    assert_eq!(distance_to_code(32768), (29, 13, 8191));
}

#[test]
fn test_max_match_length() {
    let mut block = FixedBlock::new(true);
    block.literal(42);
    for _ in 0..10 {
        block.back_reference(258, 1);
    }
    let decompressed = inflate(&block.finish()).unwrap();
    assert_eq!(decompressed, vec![42u8; 2581]);
}

#[test]
fn test_max_distance() {
    let mut input = vec![0u8; 32768];
    input[..4].copy_from_slice(b"WXYZ");

    let mut block = FixedBlock::new(true);
    block.literals(&input);
    block.back_reference(4, 32768);
    let decompressed = inflate(&block.finish()).unwrap();

    assert_eq!(decompressed.len(), 32772);
    assert_eq!(&decompressed[32768..], b"WXYZ");
}

#[test]
fn test_distance_before_start_of_output() {
    let mut block = FixedBlock::new(true);
    block.literals(b"abc");
    block.back_reference(3, 4);
    assert!(matches!(
        inflate(&block.finish()),
        Err(OxiZipError::InvalidDistance {
            distance: 4,
            available: 3
        })
    ));
}

#[test]
fn test_distance_beyond_window() {
    let mut block = FixedBlock::new(true);
    block.literals(b"0123456789");
    block.back_reference(3, 9);

    let options = InflateOptions::default().with_window_size(8);
    let mut inflater = Inflater::with_options(options);
    let mut output = Vec::new();
    let err = inflater
        .inflate_source(SliceSource::new(&block.finish()), &mut output)
        .unwrap_err();
    assert!(matches!(err, OxiZipError::InvalidDistance { distance: 9, .. }));
    assert_eq!(inflater.state(), InflateState::Failed);
}

#[test]
fn test_reserved_literal_length_symbols() {
    for symbol in [286u16, 287] {
        let mut block = FixedBlock::new(true);
        block.literal(b'x');
        block.symbol(symbol);
        let err = inflate(&block.finish()).unwrap_err();
        assert!(
            matches!(err, OxiZipError::InvalidHuffmanCode { .. }),
            "symbol {}: {}",
            symbol,
            err
        );
        assert!(err.to_string().contains("Bad huffman code"));
    }
}

#[test]
fn test_reserved_distance_symbols() {
    for symbol in [30u16, 31] {
        let mut block = FixedBlock::new(true);
        block.literals(b"xyz");
        block.symbol(257);
        block.distance_symbol(symbol);
        assert!(matches!(
            inflate(&block.finish()),
            Err(OxiZipError::InvalidHuffmanCode { .. })
        ));
    }
}

#[test]
fn test_fixed_block_ending_in_padding() {
    // Zero padding decodes as end of block in a fixed block.
    let mut block = FixedBlock::new(true);
    block.literals(b"abc");
    let decompressed = inflate(&block.truncate()).unwrap();
    assert_eq!(decompressed, b"abc");

    // A non-final block followed by nothing: the padding reads as a stored
    // block header with LEN 0 and NLEN 0.
    let mut block = FixedBlock::new(false);
    block.literals(b"abc");
    assert!(matches!(
        inflate(&block.finish()),
        Err(OxiZipError::StoredLengthMismatch { len: 0, nlen: 0 })
    ));
}

#[test]
fn test_stored_then_fixed_blocks() {
    let mut bits = BitWriter::new();
    // Stored, not final: header then pad to byte boundary.
    bits.write_bits(0, 1);
    bits.write_bits(0, 2);
    let mut stream = bits.finish();
    stream.extend_from_slice(&[0x03, 0x00, 0xFC, 0xFF]);
    stream.extend_from_slice(b"abc");

    let mut block = FixedBlock::new(true);
    block.back_reference(6, 3);
    stream.extend(block.finish());

    assert_eq!(inflate(&stream).unwrap(), b"abcabcabc");
}

#[test]
fn test_dynamic_block_repeat_without_previous_length() {
    let mut bits = BitWriter::new();
    bits.write_bits(1, 1); // BFINAL
    bits.write_bits(2, 2); // dynamic
    bits.write_bits(0, 5); // HLIT = 257
    bits.write_bits(0, 5); // HDIST = 1
    bits.write_bits(0, 4); // HCLEN = 4: symbols 16, 17, 18, 0
    // Code length code lengths: 16 -> 1, 17 -> 0, 18 -> 0, 0 -> 1
    bits.write_bits(1, 3);
    bits.write_bits(0, 3);
    bits.write_bits(0, 3);
    bits.write_bits(1, 3);
    // Symbol 0 has code 0, symbol 16 has code 1. Start with 16.
    bits.write_code(1, 1);
    bits.write_bits(0, 2);

    assert!(matches!(
        inflate(&bits.finish()),
        Err(OxiZipError::InvalidCodeLengths { .. })
    ));
}

#[test]
fn test_dynamic_block_run_overflows_lengths() {
    let mut bits = BitWriter::new();
    bits.write_bits(1, 1);
    bits.write_bits(2, 2);
    bits.write_bits(0, 5); // HLIT = 257
    bits.write_bits(0, 5); // HDIST = 1
    bits.write_bits(0, 4); // HCLEN = 4
    // 16 -> 0, 17 -> 0, 18 -> 1, 0 -> 1
    bits.write_bits(0, 3);
    bits.write_bits(0, 3);
    bits.write_bits(1, 3);
    bits.write_bits(1, 3);
    // Symbol 0 has code 0, symbol 18 has code 1.
    // 257 + 1 = 258 lengths; two runs of 138 overflow.
    bits.write_code(1, 1);
    bits.write_bits(127, 7);
    bits.write_code(1, 1);
    bits.write_bits(127, 7);

    assert!(matches!(
        inflate(&bits.finish()),
        Err(OxiZipError::InvalidCodeLengths { .. })
    ));
}

/// Dynamic block header whose literal/length code holds only 'a' ("0") and
/// end of block ("1"), with a single distance code.
fn write_two_symbol_dynamic_header(bits: &mut BitWriter) {
    bits.write_bits(1, 1);
    bits.write_bits(2, 2);
    bits.write_bits(0, 5); // HLIT = 257
    bits.write_bits(0, 5); // HDIST = 1
    bits.write_bits(14, 4); // HCLEN = 18: up to symbol 1 in transmission order
    // Give 18 -> 2, 0 -> 2, 1 -> 1, all others 0.
    let order = [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1];
    for symbol in order {
        let len = match symbol {
            18 | 0 => 2,
            1 => 1,
            _ => 0,
        };
        bits.write_bits(len, 3);
    }
    // Canonical: 1 -> "0", 0 -> "10", 18 -> "11".
    let one = |bits: &mut BitWriter| bits.write_code(0b0, 1);
    let zeros = |bits: &mut BitWriter, n: u32| {
        bits.write_code(0b11, 2);
        bits.write_bits(n - 11, 7);
    };
    // Lengths 0..=96 zero, 'a' (97) one, 98..=255 zero, 256 one, distance 0 one.
    zeros(bits, 97);
    one(bits);
    zeros(bits, 138);
    zeros(bits, 20);
    one(bits);
    one(bits);
}

#[test]
fn test_dynamic_block_hand_built() {
    let mut bits = BitWriter::new();
    write_two_symbol_dynamic_header(&mut bits);
    // Body: 'a' = "0", 'a', EOB = "1".
    bits.write_code(0, 1);
    bits.write_code(0, 1);
    bits.write_code(1, 1);

    assert_eq!(inflate(&bits.finish()).unwrap(), b"aa");
}

#[test]
fn test_dynamic_block_on_padding_hits_overrun_limit() {
    // Without a body, padding decodes as an endless run of 'a'.
    let mut bits = BitWriter::new();
    write_two_symbol_dynamic_header(&mut bits);
    let stream = bits.finish();

    let options = InflateOptions::default().with_overrun_limit(Some(4));
    let mut output = Vec::new();
    let err = Inflater::with_options(options)
        .inflate_source(SliceSource::new(&stream), &mut output)
        .unwrap_err();
    assert!(matches!(err, OxiZipError::UnexpectedEof { consumed } if consumed > 4));

    // The default limit also stops it.
    assert!(matches!(
        inflate(&stream),
        Err(OxiZipError::UnexpectedEof { .. })
    ));
}
