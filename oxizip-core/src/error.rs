//! Error types for OxiZip operations.
//!
//! Every failure in the workspace is one of three kinds: a format violation
//! (the archive or DEFLATE stream is malformed), resource exhaustion (an
//! allocation could not be satisfied), or an I/O failure of the underlying
//! source or sink. None of them is retried.

use std::io;
use thiserror::Error;

/// The main error type for OxiZip operations.
#[derive(Debug, Error)]
pub enum OxiZipError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record signature did not match.
    #[error("Invalid signature: expected {expected:#010x}, found {found:#010x}")]
    InvalidMagic {
        /// Expected signature.
        expected: u32,
        /// Signature actually read.
        found: u32,
    },

    /// Invalid or truncated header.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// The archive spans more than one disk.
    #[error(
        "Multi-disk archives are not supported (disk {disk}, directory disk {directory_disk}, \
         {entries_on_disk} of {total_entries} entries on this disk)"
    )]
    MultiDisk {
        /// Number of this disk.
        disk: u32,
        /// Disk where the central directory starts.
        directory_disk: u32,
        /// Entries recorded on this disk.
        entries_on_disk: u64,
        /// Total entries in the archive.
        total_entries: u64,
    },

    /// Unsupported compression method.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The compression method identifier.
        method: u16,
    },

    /// A Huffman code-length array does not describe a valid prefix code.
    #[error("Invalid code-length distribution: {message}")]
    InvalidCodeLengths {
        /// Description of the violation.
        message: String,
    },

    /// Reserved DEFLATE block type.
    #[error("Invalid block type {block_type}")]
    InvalidBlockType {
        /// The 2-bit block type read from the stream.
        block_type: u8,
    },

    /// Stored block LEN is not the one's complement of NLEN.
    #[error("Stored block length mismatch: LEN {len:#06x}, NLEN {nlen:#06x}")]
    StoredLengthMismatch {
        /// LEN field.
        len: u16,
        /// NLEN field.
        nlen: u16,
    },

    /// Bad Huffman code or out-of-range symbol.
    #[error("Bad huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where the invalid code was found.
        bit_position: u64,
    },

    /// Back-reference reaching before the start of output or beyond the window.
    #[error("Invalid back-reference distance {distance}: only {available} bytes available")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Bytes that can be referenced.
        available: u64,
    },

    /// Input ended before the structure was complete.
    #[error("Unexpected end of input: {consumed} padding bytes consumed")]
    UnexpectedEof {
        /// Padding bytes consumed past the end of the source.
        consumed: u64,
    },

    /// An allocation sized from archive metadata failed.
    #[error("Allocation of {requested} bytes failed")]
    AllocationFailed {
        /// Requested size in bytes.
        requested: u64,
    },

    /// Path traversal attack detected (e.g., "../" in filename).
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The suspicious path.
        path: String,
    },

    /// Entry not found in archive.
    #[error("Entry not found: {name}")]
    EntryNotFound {
        /// Name of the missing entry.
        name: String,
    },
}

/// Result type alias for OxiZip operations.
pub type Result<T> = std::result::Result<T, OxiZipError>;

impl OxiZipError {
    /// Create an invalid signature error.
    pub fn invalid_magic(expected: u32, found: u32) -> Self {
        Self::InvalidMagic { expected, found }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a multi-disk error.
    pub fn multi_disk(disk: u32, directory_disk: u32, entries_on_disk: u64, total_entries: u64) -> Self {
        Self::MultiDisk {
            disk,
            directory_disk,
            entries_on_disk,
            total_entries,
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: u16) -> Self {
        Self::UnsupportedMethod { method }
    }

    /// Create an invalid code-length distribution error.
    pub fn invalid_code_lengths(message: impl Into<String>) -> Self {
        Self::InvalidCodeLengths {
            message: message.into(),
        }
    }

    /// Create an invalid block type error.
    pub fn invalid_block_type(block_type: u8) -> Self {
        Self::InvalidBlockType { block_type }
    }

    /// Create a stored block length mismatch error.
    pub fn stored_length_mismatch(len: u16, nlen: u16) -> Self {
        Self::StoredLengthMismatch { len, nlen }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, available: u64) -> Self {
        Self::InvalidDistance {
            distance,
            available,
        }
    }

    /// Create an unexpected end of input error.
    pub fn unexpected_eof(consumed: u64) -> Self {
        Self::UnexpectedEof { consumed }
    }

    /// Create an allocation failure error.
    pub fn allocation_failed(requested: u64) -> Self {
        Self::AllocationFailed { requested }
    }

    /// Create a path traversal error.
    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Create an entry not found error.
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }

    /// Whether this error reports a malformed archive or stream.
    pub fn is_format_violation(&self) -> bool {
        !matches!(
            self,
            Self::Io(_) | Self::AllocationFailed { .. } | Self::EntryNotFound { .. }
        )
    }
}
