//! # OxiFlate
//!
//! Pure Rust implementation of DEFLATE (RFC 1951) together with its two
//! standard wrapping formats: zlib (RFC 1950) and gzip (RFC 1952), plus a
//! raw variant exposing the bare bitstream.
//!
//! ## Features
//!
//! - **Decompression**: all three DEFLATE block types
//!   - Stored (uncompressed) blocks
//!   - Fixed Huffman codes
//!   - Dynamic Huffman codes
//! - **Compression**: hash-chain LZ77 with lazy matching and per-block
//!   stored / fixed / dynamic selection by estimated bit cost
//!   - Levels 0 (stored) and 4–9, plus a Huffman-only mode
//! - **Streaming**: incremental [`Compressor`] and [`Decompressor`] over
//!   any `Read`/`Write`, with container checksums verified at end of
//!   stream
//!
//! ## Example
//!
//! ```rust
//! use oxiflate::{gzip, Level};
//!
//! let original = b"Hello, World! Hello, World!";
//! let compressed = gzip::compress_to_vec(original, Level::DEFAULT).unwrap();
//! let decompressed = gzip::decompress_to_vec(&compressed).unwrap();
//! assert_eq!(&decompressed, original);
//! ```
//!
//! ## Compression levels
//!
//! - Level 0: no compression (stored blocks)
//! - Levels 4–6: balanced (default is 6)
//! - Levels 7–9: best compression (slower)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod container;
pub mod deflate;
pub mod gzip;
pub mod huffman;
pub mod inflate;
pub mod lz77;
pub mod raw;
pub mod tables;
pub mod token;
pub mod zlib;

// Re-exports
pub use container::{Compressor, Decompressor, Format};
pub use deflate::{deflate, Deflater, Level};
pub use huffman::{HuffmanBuilder, HuffmanDecoder};
pub use inflate::{inflate, Inflater};
pub use oxiflate_core::{FlateError, Result};
pub use token::Token;
