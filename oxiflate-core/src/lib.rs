//! # OxiFlate Core
//!
//! Core components for the OxiFlate DEFLATE library.
//!
//! This crate provides the building blocks shared by the encoder and the
//! decoder:
//!
//! - [`bitstream`]: LSB-first bit-level I/O for variable-length codes
//! - [`ringbuffer`]: the decoder's 64 KiB history window
//! - [`crc`]: CRC-32 checksum (gzip trailer)
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! OxiFlate is layered; this crate is the bottom layer:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ oxiflate-cli:  gzip / gunzip / decompress /  │
//! │                roundtrip tools               │
//! ├──────────────────────────────────────────────┤
//! │ oxiflate:      containers (raw, zlib, gzip)  │
//! │                deflate / inflate codec       │
//! ├──────────────────────────────────────────────┤
//! │ oxiflate-core: BitReader/BitWriter,          │
//! │                CircularBuffer, CRC-32        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_core::bitstream::{BitReader, BitWriter};
//! use oxiflate_core::crc::Crc32;
//! use std::io::Cursor;
//!
//! let mut out = Vec::new();
//! {
//!     let mut writer = BitWriter::new(&mut out);
//!     writer.write_bits(0b101, 3).unwrap();
//!     writer.flush().unwrap();
//! }
//! let mut reader = BitReader::new(Cursor::new(&out));
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//!
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;
pub mod ringbuffer;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use crc::Crc32;
pub use error::{FlateError, Result};
pub use ringbuffer::CircularBuffer;
