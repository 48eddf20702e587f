//! # OxiZip Deflate
//!
//! Pure Rust streaming DEFLATE decompression (RFC 1951).
//!
//! This crate decodes raw DEFLATE streams, the payload format of ZIP entries
//! stored with method 8. Input is pulled through a
//! [`ByteSource`](oxizip_core::ByteSource) and output pushed through a
//! [`ByteSink`](oxizip_core::ByteSink), so memory use is bounded by the input
//! buffer and the output window regardless of payload size.
//!
//! ## Features
//!
//! - All DEFLATE block types
//!   - Stored (uncompressed) blocks
//!   - Fixed Huffman codes
//!   - Dynamic Huffman codes
//! - Configurable window and input buffer sizes ([`InflateOptions`])
//! - Truncation detection through a bounded zero-padding allowance
//!
//! ## Example
//!
//! ```rust
//! use oxizip_deflate::inflate;
//!
//! // A single stored block holding "Hello"
//! let compressed = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];
//! let decompressed = inflate(&compressed).unwrap();
//! assert_eq!(&decompressed, b"Hello");
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use oxizip_core::stream::{SliceSource, WriterSink};
//! use oxizip_deflate::{InflateOptions, Inflater};
//!
//! let compressed = [0x01, 0x02, 0x00, 0xFD, 0xFF, b'o', b'k'];
//! let options = InflateOptions::default().with_input_buffer_size(4096);
//! let mut sink = WriterSink::new(Vec::new());
//! let summary = Inflater::with_options(options)
//!     .inflate_source(SliceSource::new(&compressed), &mut sink)
//!     .unwrap();
//! assert_eq!(summary.bytes_out, 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod huffman;
pub mod inflate;
pub mod tables;
pub mod window;

// Re-exports
pub use huffman::HuffmanTable;
pub use inflate::{InflateOptions, InflateState, InflateSummary, Inflater, inflate, inflate_to};
pub use window::OutputWindow;
