//! Error types for OxiFlate operations.
//!
//! A single error enum covers every failure mode of the codec and the two
//! container formats. Decoder errors are fatal for the stream: no recovery
//! is attempted mid-block, and no output is produced from data already
//! known to be invalid.

use std::io;
use thiserror::Error;

/// The main error type for OxiFlate operations.
#[derive(Debug, Error)]
pub enum FlateError {
    /// I/O error from the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input ended in the middle of a block.
    #[error("Unexpected end of stream: needed {expected} more byte(s)")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        expected: usize,
    },

    /// The compressed stream violates the DEFLATE format.
    #[error("Corrupted stream at offset {offset}: {message}")]
    Corrupted {
        /// Byte offset where the corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// An unresolvable or over/under-subscribed Huffman code.
    #[error("Invalid Huffman code at bit position {bit_position}")]
    InvalidHuffman {
        /// Bit position where decoding failed.
        bit_position: u64,
    },

    /// A back-reference distance exceeds the available history.
    #[error("Invalid back-reference distance: {distance} exceeds {available} byte(s) of history")]
    InvalidDistance {
        /// The offending distance.
        distance: usize,
        /// Bytes of history available at that point.
        available: u64,
    },

    /// A malformed container header (gzip magic/method, zlib FCHECK, ...).
    #[error("Bad container header: {message}")]
    BadHeader {
        /// Description of the header problem.
        message: String,
    },

    /// A malformed or inconsistent container trailer.
    #[error("Bad container footer: {message}")]
    BadFooter {
        /// Description of the footer problem.
        message: String,
    },

    /// A checksum in the container trailer does not match the data.
    #[error("Checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the stream.
        expected: u32,
        /// Checksum computed over the decoded data.
        computed: u32,
    },
}

/// Result type alias for OxiFlate operations.
pub type Result<T> = std::result::Result<T, FlateError>;

impl FlateError {
    /// Create an unexpected end-of-stream error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }

    /// Create a corrupted-stream error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::Corrupted {
            offset,
            message: message.into(),
        }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffman { bit_position }
    }

    /// Create an invalid back-reference distance error.
    pub fn invalid_distance(distance: usize, available: u64) -> Self {
        Self::InvalidDistance {
            distance,
            available,
        }
    }

    /// Create a bad container header error.
    pub fn bad_header(message: impl Into<String>) -> Self {
        Self::BadHeader {
            message: message.into(),
        }
    }

    /// Create a bad container footer error.
    pub fn bad_footer(message: impl Into<String>) -> Self {
        Self::BadFooter {
            message: message.into(),
        }
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(expected: u32, computed: u32) -> Self {
        Self::ChecksumMismatch { expected, computed }
    }
}
