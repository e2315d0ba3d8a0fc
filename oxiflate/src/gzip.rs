//! Gzip framing (RFC 1952).
//!
//! The encoder writes the minimal fixed header (no optional fields,
//! mtime 0, OS 3) unless a filename is requested. The decoder tolerates
//! every optional field: FEXTRA is skipped, FNAME and FCOMMENT are read
//! as NUL-terminated strings, and FHCRC is verified against the low 16
//! bits of the header's CRC-32.
//!
//! Trailer: little-endian CRC-32 of the uncompressed data, then ISIZE
//! (uncompressed length mod 2^32, little-endian).

use crate::container::{self, Compressor, Decompressor, Format};
use crate::deflate::Level;
use oxiflate_core::crc::Crc32;
use oxiflate_core::error::{FlateError, Result};
use std::io::{self, Read, Write};

/// Gzip magic bytes.
pub const MAGIC: [u8; 2] = [0x1F, 0x8B];

/// The only supported compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// OS identifier written by the encoder (3 = Unix).
pub const OS_UNIX: u8 = 3;

/// Gzip header flag bits.
pub mod flags {
    /// Probably-text hint.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC-16 present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original filename present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
}

/// A gzip member header.
#[derive(Debug, Clone)]
pub struct Header {
    /// Compression method; 8 for DEFLATE.
    pub method: u8,
    /// Flag bits.
    pub flags: u8,
    /// Modification time (Unix timestamp, 0 = unknown).
    pub mtime: u32,
    /// Extra flags.
    pub xfl: u8,
    /// Originating operating system.
    pub os: u8,
    /// Original filename, when FNAME is set.
    pub filename: Option<String>,
    /// Comment, when FCOMMENT is set.
    pub comment: Option<String>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            method: CM_DEFLATE,
            flags: 0,
            mtime: 0,
            xfl: 0,
            os: OS_UNIX,
            filename: None,
            comment: None,
        }
    }
}

impl Header {
    /// The minimal header the encoder writes by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// A header recording the original filename.
    pub fn with_filename(filename: &str) -> Self {
        Self {
            flags: flags::FNAME,
            filename: Some(filename.to_string()),
            ..Self::default()
        }
    }

    /// Serialize this header.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&MAGIC)?;
        writer.write_all(&[self.method, self.flags])?;
        writer.write_all(&self.mtime.to_le_bytes())?;
        writer.write_all(&[self.xfl, self.os])?;

        if self.flags & flags::FNAME != 0 {
            if let Some(ref filename) = self.filename {
                writer.write_all(filename.as_bytes())?;
                writer.write_all(&[0])?;
            }
        }
        if self.flags & flags::FCOMMENT != 0 {
            if let Some(ref comment) = self.comment {
                writer.write_all(comment.as_bytes())?;
                writer.write_all(&[0])?;
            }
        }
        Ok(())
    }

    /// Parse a header, tolerating every optional field.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut crc = Crc32::new();

        let mut fixed = [0u8; 10];
        read_header_bytes(reader, &mut crc, &mut fixed)?;

        if fixed[0..2] != MAGIC {
            return Err(FlateError::bad_header(format!(
                "bad gzip magic: {:02x?}",
                &fixed[0..2]
            )));
        }
        let method = fixed[2];
        if method != CM_DEFLATE {
            return Err(FlateError::bad_header(format!(
                "unsupported gzip compression method {method}"
            )));
        }

        let header_flags = fixed[3];
        let mtime = u32::from_le_bytes(fixed[4..8].try_into().expect("four bytes"));
        let xfl = fixed[8];
        let os = fixed[9];

        if header_flags & flags::FEXTRA != 0 {
            let mut xlen_bytes = [0u8; 2];
            read_header_bytes(reader, &mut crc, &mut xlen_bytes)?;
            let mut extra = vec![0u8; usize::from(u16::from_le_bytes(xlen_bytes))];
            read_header_bytes(reader, &mut crc, &mut extra)?;
        }

        let filename = if header_flags & flags::FNAME != 0 {
            Some(read_nul_string(reader, &mut crc)?)
        } else {
            None
        };
        let comment = if header_flags & flags::FCOMMENT != 0 {
            Some(read_nul_string(reader, &mut crc)?)
        } else {
            None
        };

        if header_flags & flags::FHCRC != 0 {
            let computed = (crc.finalize() & 0xFFFF) as u16;
            let mut stored = [0u8; 2];
            reader
                .read_exact(&mut stored)
                .map_err(truncated_header_error)?;
            let stored = u16::from_le_bytes(stored);
            if stored != computed {
                return Err(FlateError::bad_header(format!(
                    "header CRC mismatch: stored {stored:#06x}, computed {computed:#06x}"
                )));
            }
        }

        Ok(Self {
            method,
            flags: header_flags,
            mtime,
            xfl,
            os,
            filename,
            comment,
        })
    }
}

fn truncated_header_error(err: io::Error) -> FlateError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        FlateError::bad_header("truncated gzip header")
    } else {
        FlateError::from(err)
    }
}

/// Read into `buf`, folding the bytes into the header CRC.
fn read_header_bytes<R: Read>(reader: &mut R, crc: &mut Crc32, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(truncated_header_error)?;
    crc.update(buf);
    Ok(())
}

/// Read a NUL-terminated string, including the terminator in the CRC.
fn read_nul_string<R: Read>(reader: &mut R, crc: &mut Crc32) -> Result<String> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte).map_err(truncated_header_error)?;
        crc.update(&byte);
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// One-shot encode from `reader` to `writer` in gzip framing.
pub fn compress<R: Read, W: Write>(reader: &mut R, writer: W, level: Level) -> Result<u64> {
    container::compress(reader, writer, Format::Gzip, level)
}

/// One-shot decode from `reader` to `writer`, verifying CRC and ISIZE.
pub fn decompress<R: Read, W: Write>(reader: R, writer: &mut W) -> Result<u64> {
    container::decompress(reader, writer, Format::Gzip)
}

/// Streaming gzip compressor.
pub fn compressor<W: Write>(writer: W, level: Level) -> Result<Compressor<W>> {
    Compressor::new(writer, Format::Gzip, level)
}

/// Streaming gzip decompressor.
pub fn decompressor<R: Read>(reader: R) -> Result<Decompressor<R>> {
    Decompressor::new(reader, Format::Gzip)
}

/// Streaming gzip compressor that never emits back-references.
pub fn huffman_only_compressor<W: Write>(writer: W) -> Result<Compressor<W>> {
    Compressor::huffman_only(writer, Format::Gzip)
}

/// Compress a byte slice to gzip format.
pub fn compress_to_vec(data: &[u8], level: Level) -> Result<Vec<u8>> {
    container::compress_to_vec(data, Format::Gzip, level)
}

/// Compress a byte slice to gzip format, recording a filename.
pub fn compress_with_filename(data: &[u8], filename: &str, level: Level) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut compressor =
        Compressor::gzip_with_header(&mut out, &Header::with_filename(filename), level)?;
    compressor.write(data)?;
    compressor.finish()?;
    Ok(out)
}

/// Decompress a gzip byte slice.
pub fn decompress_to_vec(data: &[u8]) -> Result<Vec<u8>> {
    container::decompress_to_vec(data, Format::Gzip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_header_bytes() {
        let mut out = Vec::new();
        Header::default().write(&mut out).unwrap();
        assert_eq!(out, [0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03]);
    }

    #[test]
    fn test_stored_stream_exact_bytes() {
        let compressed = compress_to_vec(b"Hello world\n", Level::STORED).unwrap();
        let mut expected = vec![0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03];
        expected.extend_from_slice(&[0x01, 0x0C, 0x00, 0xF3, 0xFF]);
        expected.extend_from_slice(b"Hello world\n");
        expected.extend_from_slice(&[0xD5, 0xE0, 0x39, 0xB7]); // CRC-32
        expected.extend_from_slice(&[0x0C, 0x00, 0x00, 0x00]); // ISIZE
        assert_eq!(compressed, expected);
        assert_eq!(decompress_to_vec(&compressed).unwrap(), b"Hello world\n");
    }

    #[test]
    fn test_roundtrip() {
        let data = b"Hello, GZIP World! This is a test of compression.";
        for level in [0u8, 4, 6, 9] {
            let compressed = compress_to_vec(data, Level::new(level)).unwrap();
            assert_eq!(decompress_to_vec(&compressed).unwrap(), data);
        }
    }

    #[test]
    fn test_roundtrip_with_filename() {
        let compressed =
            compress_with_filename(b"named data", "data.txt", Level::DEFAULT).unwrap();
        let mut decompressor = decompressor(&compressed[..]).unwrap();
        assert_eq!(
            decompressor.gzip_header().unwrap().filename.as_deref(),
            Some("data.txt")
        );
        let mut out = Vec::new();
        while let Some(chunk) = decompressor.next().unwrap() {
            out.extend_from_slice(chunk);
        }
        assert_eq!(out, b"named data");
    }

    #[test]
    fn test_tolerates_optional_fields() {
        // Hand-built header with FEXTRA, FNAME, FCOMMENT and FHCRC.
        let mut stream = Vec::new();
        let head_start = stream.len();
        stream.extend_from_slice(&MAGIC);
        stream.push(CM_DEFLATE);
        stream.push(flags::FEXTRA | flags::FNAME | flags::FCOMMENT | flags::FHCRC);
        stream.extend_from_slice(&[0; 4]); // mtime
        stream.extend_from_slice(&[0, OS_UNIX]);
        stream.extend_from_slice(&3u16.to_le_bytes()); // XLEN
        stream.extend_from_slice(b"xyz"); // extra payload
        stream.extend_from_slice(b"file.txt\0");
        stream.extend_from_slice(b"a comment\0");
        let crc16 = (Crc32::compute(&stream[head_start..]) & 0xFFFF) as u16;
        stream.extend_from_slice(&crc16.to_le_bytes());

        // Stored DEFLATE body + trailer.
        stream.extend_from_slice(&[0x01, 0x02, 0x00, 0xFD, 0xFF, b'o', b'k']);
        stream.extend_from_slice(&Crc32::compute(b"ok").to_le_bytes());
        stream.extend_from_slice(&2u32.to_le_bytes());

        let mut decompressor = decompressor(&stream[..]).unwrap();
        let header = decompressor.gzip_header().unwrap();
        assert_eq!(header.filename.as_deref(), Some("file.txt"));
        assert_eq!(header.comment.as_deref(), Some("a comment"));

        let mut out = Vec::new();
        while let Some(chunk) = decompressor.next().unwrap() {
            out.extend_from_slice(chunk);
        }
        assert_eq!(out, b"ok");
    }

    #[test]
    fn test_rejects_header_crc_mismatch() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&MAGIC);
        stream.push(CM_DEFLATE);
        stream.push(flags::FHCRC);
        stream.extend_from_slice(&[0; 4]);
        stream.extend_from_slice(&[0, OS_UNIX]);
        stream.extend_from_slice(&0xBEEFu16.to_le_bytes()); // wrong CRC16
        stream.extend_from_slice(&[0x01, 0x00, 0x00, 0xFF, 0xFF]);
        stream.extend_from_slice(&[0; 8]);

        assert!(matches!(
            decompress_to_vec(&stream),
            Err(FlateError::BadHeader { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let stream = [0x50, 0x4B, 0x03, 0x04, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            decompress_to_vec(&stream),
            Err(FlateError::BadHeader { .. })
        ));
    }

    #[test]
    fn test_rejects_corrupt_crc() {
        let mut stream = compress_to_vec(b"crc guarded", Level::DEFAULT).unwrap();
        let n = stream.len();
        stream[n - 5] ^= 0xFF; // inside the CRC field
        assert!(matches!(
            decompress_to_vec(&stream),
            Err(FlateError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_isize() {
        let mut stream = compress_to_vec(b"sized", Level::DEFAULT).unwrap();
        let n = stream.len();
        stream[n - 1] ^= 0x01; // high byte of ISIZE
        assert!(matches!(
            decompress_to_vec(&stream),
            Err(FlateError::BadFooter { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        let compressed = compress_to_vec(b"", Level::DEFAULT).unwrap();
        assert_eq!(decompress_to_vec(&compressed).unwrap(), b"");
    }
}
