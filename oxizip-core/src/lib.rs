//! # OxiZip Core
//!
//! Core components for the OxiZip archive library.
//!
//! This crate provides the fundamental building blocks shared by the codec
//! and container layers:
//!
//! - [`bitstream`]: Bit-level input for DEFLATE decoding
//! - [`stream`]: Refillable byte sources and flushable byte sinks
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! OxiZip is designed as a layered protocol stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Command line                                        │
//! │     list, extract, test, create                         │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     ZIP directory, zip64, entry locator, writer         │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Streaming inflate, canonical Huffman tables         │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitReader, ByteSource/ByteSink                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxizip_core::{BitReader, ByteSink, SliceSource};
//!
//! let data = vec![0xAB, 0xCD];
//! let mut reader = BitReader::new(SliceSource::new(&data));
//! let bits = reader.receive(12).unwrap();
//! assert_eq!(bits, 0xDAB);
//!
//! let mut out = Vec::new();
//! out.put(b"abc").unwrap();
//! assert_eq!(out, b"abc");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod error;
pub mod stream;

// Re-exports for convenience
pub use bitstream::BitReader;
pub use error::{OxiZipError, Result};
pub use stream::{ByteSink, ByteSource, NullSink, ReaderSource, SliceSource, WriterSink};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::BitReader;
    pub use crate::error::{OxiZipError, Result};
    pub use crate::stream::{ByteSink, ByteSource, NullSink, ReaderSource, SliceSource, WriterSink};
}
