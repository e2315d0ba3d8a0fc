//! Zlib framing (RFC 1950).
//!
//! ```text
//! +---+---+=================+---+---+---+---+
//! |CMF|FLG| DEFLATE body    |    ADLER32    |
//! +---+---+=================+---+---+---+---+
//! ```
//!
//! - CMF: CM (must be 8 = DEFLATE) in the low nibble, CINFO (window
//!   size, 7 = 32 KiB) in the high nibble
//! - FLG: FCHECK bits chosen so `CMF*256 + FLG` is a multiple of 31,
//!   FDICT (preset dictionary, rejected here), FLEVEL hint
//! - ADLER32: big-endian checksum of the uncompressed data

use crate::container::{self, Compressor, Decompressor, Format};
use crate::deflate::Level;
use oxiflate_core::error::{FlateError, Result};
use std::io::{self, Read, Write};

/// CM = 8 (DEFLATE), CINFO = 7 (32 KiB window).
const CMF: u8 = 0x78;

/// Largest prime smaller than 65536.
const ADLER_MOD: u32 = 65521;

/// Bytes that can accumulate before the sums must be reduced.
const NMAX: usize = 5552;

/// Streaming Adler-32 checksum.
///
/// # Example
///
/// ```
/// use oxiflate::zlib::Adler32;
///
/// assert_eq!(Adler32::checksum(b"Hello world\n"), 0x1CF20447);
/// ```
#[derive(Debug, Clone)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    /// Create a new checksum in its initial state.
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    /// Update with more data.
    pub fn update(&mut self, data: &[u8]) {
        let mut a = self.a;
        let mut b = self.b;

        let mut remaining = data;
        while remaining.len() >= NMAX {
            let (chunk, rest) = remaining.split_at(NMAX);
            remaining = rest;
            for &byte in chunk {
                a += u32::from(byte);
                b += a;
            }
            a %= ADLER_MOD;
            b %= ADLER_MOD;
        }
        for &byte in remaining {
            a += u32::from(byte);
            b += a;
        }

        self.a = a % ADLER_MOD;
        self.b = b % ADLER_MOD;
    }

    /// The current checksum value.
    pub fn finish(&self) -> u32 {
        (self.b << 16) | self.a
    }

    /// One-shot checksum of a byte slice.
    pub fn checksum(data: &[u8]) -> u32 {
        let mut adler = Self::new();
        adler.update(data);
        adler.finish()
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

/// The two-byte zlib header for a given compression level.
pub(crate) fn header_bytes(level: Level) -> [u8; 2] {
    let flevel: u8 = match level.get() {
        0..=2 => 0,
        3..=5 => 1,
        6 => 2,
        _ => 3,
    };
    let flg_base = flevel << 6;
    let remainder = (u16::from(CMF) * 256 + u16::from(flg_base)) % 31;
    let fcheck = if remainder == 0 {
        0
    } else {
        (31 - remainder) as u8
    };
    [CMF, flg_base | fcheck]
}

/// Read and validate a zlib header.
pub(crate) fn read_header<R: Read>(reader: &mut R) -> Result<()> {
    let mut header = [0u8; 2];
    reader.read_exact(&mut header).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            FlateError::bad_header("truncated zlib header")
        } else {
            FlateError::from(e)
        }
    })?;
    let [cmf, flg] = header;

    if cmf & 0x0F != 8 {
        return Err(FlateError::bad_header(format!(
            "unsupported zlib compression method {}",
            cmf & 0x0F
        )));
    }
    if cmf >> 4 > 7 {
        return Err(FlateError::bad_header("invalid zlib window size"));
    }
    if (u16::from(cmf) * 256 + u16::from(flg)) % 31 != 0 {
        return Err(FlateError::bad_header("zlib FCHECK failed"));
    }
    if flg & 0x20 != 0 {
        return Err(FlateError::bad_header("preset dictionary not supported"));
    }
    Ok(())
}

/// One-shot encode from `reader` to `writer` in zlib framing.
pub fn compress<R: Read, W: Write>(reader: &mut R, writer: W, level: Level) -> Result<u64> {
    container::compress(reader, writer, Format::Zlib, level)
}

/// One-shot decode from `reader` to `writer`, verifying the Adler-32.
pub fn decompress<R: Read, W: Write>(reader: R, writer: &mut W) -> Result<u64> {
    container::decompress(reader, writer, Format::Zlib)
}

/// Streaming zlib compressor.
pub fn compressor<W: Write>(writer: W, level: Level) -> Result<Compressor<W>> {
    Compressor::new(writer, Format::Zlib, level)
}

/// Streaming zlib decompressor.
pub fn decompressor<R: Read>(reader: R) -> Result<Decompressor<R>> {
    Decompressor::new(reader, Format::Zlib)
}

/// Streaming zlib compressor that never emits back-references.
pub fn huffman_only_compressor<W: Write>(writer: W) -> Result<Compressor<W>> {
    Compressor::huffman_only(writer, Format::Zlib)
}

/// Compress a byte slice to zlib format.
pub fn compress_to_vec(data: &[u8], level: Level) -> Result<Vec<u8>> {
    container::compress_to_vec(data, Format::Zlib, level)
}

/// Decompress a zlib byte slice.
pub fn decompress_to_vec(data: &[u8]) -> Result<Vec<u8>> {
    container::decompress_to_vec(data, Format::Zlib)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adler32_vectors() {
        assert_eq!(Adler32::checksum(b""), 1);
        assert_eq!(Adler32::checksum(b"Hello"), 0x058C01F5);
        assert_eq!(Adler32::checksum(b"Hello world\n"), 0x1CF20447);
    }

    #[test]
    fn test_adler32_incremental() {
        let data = b"Hello, World!";
        let mut adler = Adler32::new();
        adler.update(&data[..6]);
        adler.update(&data[6..]);
        assert_eq!(adler.finish(), Adler32::checksum(data));
    }

    #[test]
    fn test_adler32_large_input() {
        // Exercises the NMAX reduction path.
        let data = vec![0xFFu8; 3 * NMAX + 17];
        let mut adler = Adler32::new();
        adler.update(&data);
        let whole = adler.finish();

        let mut chunked = Adler32::new();
        for chunk in data.chunks(613) {
            chunked.update(chunk);
        }
        assert_eq!(chunked.finish(), whole);
    }

    #[test]
    fn test_header_default_level() {
        assert_eq!(header_bytes(Level::DEFAULT), [0x78, 0x9C]);
        // All headers must satisfy the FCHECK relation.
        for level in 0..=9 {
            let [cmf, flg] = header_bytes(Level::new(level));
            assert_eq!((u16::from(cmf) * 256 + u16::from(flg)) % 31, 0);
        }
    }

    #[test]
    fn test_roundtrip() {
        let data = b"Hello, World! Hello, World!";
        for level in [0u8, 4, 6, 9] {
            let compressed = compress_to_vec(data, Level::new(level)).unwrap();
            assert_eq!(decompress_to_vec(&compressed).unwrap(), data);
        }
    }

    #[test]
    fn test_decode_stored_vector() {
        // 0x78 0x9C header, stored DEFLATE block, big-endian Adler-32.
        let mut stream = vec![0x78, 0x9C, 0x01, 0x0C, 0x00, 0xF3, 0xFF];
        stream.extend_from_slice(b"Hello world\n");
        stream.extend_from_slice(&[0x1C, 0xF2, 0x04, 0x47]);
        assert_eq!(decompress_to_vec(&stream).unwrap(), b"Hello world\n");
    }

    #[test]
    fn test_rejects_bad_method() {
        let stream = [0x08, 0x1D, 0x01, 0x00, 0x00, 0xFF, 0xFF];
        assert!(matches!(
            decompress_to_vec(&stream),
            Err(FlateError::BadHeader { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_fcheck() {
        let mut stream = compress_to_vec(b"x", Level::DEFAULT).unwrap();
        stream[1] ^= 0x01;
        assert!(matches!(
            decompress_to_vec(&stream),
            Err(FlateError::BadHeader { .. })
        ));
    }

    #[test]
    fn test_rejects_preset_dictionary() {
        // 0x78 0x20 passes FCHECK but sets FDICT.
        let stream = [0x78, 0x20, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            decompress_to_vec(&stream),
            Err(FlateError::BadHeader { .. })
        ));
    }

    #[test]
    fn test_rejects_corrupt_checksum() {
        let mut stream = compress_to_vec(b"checksummed data", Level::DEFAULT).unwrap();
        let last = stream.len() - 1;
        stream[last] ^= 0xFF;
        assert!(matches!(
            decompress_to_vec(&stream),
            Err(FlateError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_truncated_trailer() {
        let mut stream = compress_to_vec(b"data", Level::DEFAULT).unwrap();
        stream.truncate(stream.len() - 2);
        assert!(matches!(
            decompress_to_vec(&stream),
            Err(FlateError::BadFooter { .. })
        ));
    }
}
