//! Raw DEFLATE framing: the bare bitstream with no header, trailer or
//! integrity hash. Useful when an outer format (ZIP, PNG, ...) provides
//! its own framing.

use crate::container::{self, Compressor, Decompressor, Format};
use crate::deflate::Level;
use oxiflate_core::Result;
use std::io::{Read, Write};

/// One-shot encode from `reader` to `writer`.
pub fn compress<R: Read, W: Write>(reader: &mut R, writer: W, level: Level) -> Result<u64> {
    container::compress(reader, writer, Format::Raw, level)
}

/// One-shot decode from `reader` to `writer`.
pub fn decompress<R: Read, W: Write>(reader: R, writer: &mut W) -> Result<u64> {
    container::decompress(reader, writer, Format::Raw)
}

/// Streaming raw compressor.
pub fn compressor<W: Write>(writer: W, level: Level) -> Result<Compressor<W>> {
    Compressor::new(writer, Format::Raw, level)
}

/// Streaming raw decompressor.
pub fn decompressor<R: Read>(reader: R) -> Result<Decompressor<R>> {
    Decompressor::new(reader, Format::Raw)
}

/// Streaming raw compressor that never emits back-references.
pub fn huffman_only_compressor<W: Write>(writer: W) -> Result<Compressor<W>> {
    Compressor::huffman_only(writer, Format::Raw)
}

/// Compress a byte slice to a raw DEFLATE stream.
pub fn compress_to_vec(data: &[u8], level: Level) -> Result<Vec<u8>> {
    container::compress_to_vec(data, Format::Raw, level)
}

/// Decompress a raw DEFLATE byte slice.
pub fn decompress_to_vec(data: &[u8]) -> Result<Vec<u8>> {
    container::decompress_to_vec(data, Format::Raw)
}
