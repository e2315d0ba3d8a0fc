//! Container framing around the DEFLATE body.
//!
//! Three framings share one codec: **raw** (no header, footer or hash),
//! **zlib** (RFC 1950, big-endian Adler-32 trailer) and **gzip**
//! (RFC 1952, little-endian CRC-32 + ISIZE trailer). The format is a
//! runtime enum; the cost is one branch per stream, not per byte.
//!
//! [`Compressor`] and [`Decompressor`] are the streaming halves. The
//! thin per-format function sets live in [`crate::raw`], [`crate::zlib`]
//! and [`crate::gzip`].

use crate::deflate::{Deflater, Level};
use crate::gzip;
use crate::inflate::Inflater;
use crate::zlib::{self, Adler32};
use oxiflate_core::{Crc32, FlateError, Result};
use std::io::{self, Read, Write};

/// The wrapping format around a DEFLATE body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Bare DEFLATE bitstream.
    Raw,
    /// RFC 1950 framing with an Adler-32 trailer.
    Zlib,
    /// RFC 1952 framing with CRC-32 and ISIZE trailer.
    Gzip,
}

/// The integrity hash a format maintains over the uncompressed data.
#[derive(Debug)]
enum Hasher {
    None,
    Adler(Adler32),
    Crc(Crc32),
}

impl Hasher {
    fn for_format(format: Format) -> Self {
        match format {
            Format::Raw => Self::None,
            Format::Zlib => Self::Adler(Adler32::new()),
            Format::Gzip => Self::Crc(Crc32::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::None => {}
            Self::Adler(adler) => adler.update(data),
            Self::Crc(crc) => crc.update(data),
        }
    }

    fn value(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Adler(adler) => adler.finish(),
            Self::Crc(crc) => crc.finalize(),
        }
    }
}

/// Map codec errors onto `std::io` errors for the `Read`/`Write` impls.
fn to_io_error(err: FlateError) -> io::Error {
    match err {
        FlateError::Io(inner) => inner,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

/// Streaming compressor for one of the three formats.
///
/// The header goes out on construction, the trailer on
/// [`finish`](Self::finish).
#[derive(Debug)]
pub struct Compressor<W: Write> {
    deflater: Deflater<W>,
    format: Format,
    hasher: Hasher,
    bytes_in: u64,
    finished: bool,
}

impl<W: Write> Compressor<W> {
    /// Create a compressor at the given level.
    pub fn new(writer: W, format: Format, level: Level) -> Result<Self> {
        Self::build(writer, format, level, false, None)
    }

    /// Create a Huffman-only compressor (no match search).
    pub fn huffman_only(writer: W, format: Format) -> Result<Self> {
        Self::build(writer, format, Level::DEFAULT, true, None)
    }

    /// Gzip with a caller-supplied header (filename, mtime, ...).
    pub(crate) fn gzip_with_header(
        writer: W,
        header: &gzip::Header,
        level: Level,
    ) -> Result<Self> {
        Self::build(writer, Format::Gzip, level, false, Some(header))
    }

    fn build(
        mut writer: W,
        format: Format,
        level: Level,
        huffman_only: bool,
        gzip_header: Option<&gzip::Header>,
    ) -> Result<Self> {
        match format {
            Format::Raw => {}
            Format::Zlib => writer.write_all(&zlib::header_bytes(level))?,
            Format::Gzip => match gzip_header {
                Some(header) => header.write(&mut writer)?,
                None => gzip::Header::default().write(&mut writer)?,
            },
        }
        let deflater = if huffman_only {
            Deflater::huffman_only(writer)
        } else {
            Deflater::new(writer, level)
        };
        Ok(Self {
            deflater,
            format,
            hasher: Hasher::for_format(format),
            bytes_in: 0,
            finished: false,
        })
    }

    /// Consume all of `data`.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.hasher.update(data);
        self.bytes_in += data.len() as u64;
        self.deflater.write(data)
    }

    /// Emit everything consumed so far at a byte-aligned block boundary.
    /// Calling this any number of times never changes the decoded output.
    pub fn flush(&mut self) -> Result<()> {
        self.deflater.flush()
    }

    /// Write the final block and the container trailer. Idempotent.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.deflater.finish()?;

        let checksum = self.hasher.value();
        let writer = self.deflater.writer_mut();
        match self.format {
            Format::Raw => {}
            Format::Zlib => writer.write_all(&checksum.to_be_bytes())?,
            Format::Gzip => {
                writer.write_all(&checksum.to_le_bytes())?;
                writer.write_all(&(self.bytes_in as u32).to_le_bytes())?;
            }
        }
        writer.flush()?;
        self.finished = true;
        Ok(())
    }

    /// Uncompressed bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.bytes_in
    }
}

impl<W: Write> io::Write for Compressor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Compressor::write(self, buf).map_err(to_io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        Compressor::flush(self).map_err(to_io_error)
    }
}

/// Streaming decompressor for one of the three formats.
///
/// The header is parsed on construction; the trailer is verified once
/// the DEFLATE body ends, before end-of-stream is reported.
#[derive(Debug)]
pub struct Decompressor<R: Read> {
    inflater: Inflater<R>,
    format: Format,
    hasher: Hasher,
    bytes_out: u64,
    gzip_header: Option<gzip::Header>,
    trailer_checked: bool,
}

impl<R: Read> Decompressor<R> {
    /// Create a decompressor, consuming the container header.
    pub fn new(mut reader: R, format: Format) -> Result<Self> {
        let mut gzip_header = None;
        match format {
            Format::Raw => {}
            Format::Zlib => zlib::read_header(&mut reader)?,
            Format::Gzip => gzip_header = Some(gzip::Header::read(&mut reader)?),
        }
        Ok(Self {
            inflater: Inflater::new(reader),
            format,
            hasher: Hasher::for_format(format),
            bytes_out: 0,
            gzip_header,
            trailer_checked: false,
        })
    }

    /// The parsed gzip header, when decoding gzip.
    pub fn gzip_header(&self) -> Option<&gzip::Header> {
        self.gzip_header.as_ref()
    }

    /// Uncompressed bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.bytes_out
    }

    /// Yield the next span of decoded bytes, or `None` at end of stream
    /// (after trailer verification). Stays `None` once it ends.
    pub fn next(&mut self) -> Result<Option<&[u8]>> {
        if !self.inflater.fill_pending()? {
            self.verify_trailer()?;
            return Ok(None);
        }
        let chunk = self.inflater.take_pending();
        self.hasher.update(chunk);
        self.bytes_out += chunk.len() as u64;
        Ok(Some(chunk))
    }

    /// Copy decoded bytes into `dst`; 0 only at (verified) end of stream.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        let n = self.inflater.read(dst)?;
        if n == 0 {
            self.verify_trailer()?;
        } else {
            self.hasher.update(&dst[..n]);
            self.bytes_out += n as u64;
        }
        Ok(n)
    }

    fn verify_trailer(&mut self) -> Result<()> {
        if self.trailer_checked {
            return Ok(());
        }
        match self.format {
            Format::Raw => {}
            Format::Zlib => {
                let mut buf = [0u8; 4];
                self.read_trailer(&mut buf)?;
                let expected = u32::from_be_bytes(buf);
                let computed = self.hasher.value();
                if expected != computed {
                    return Err(FlateError::checksum_mismatch(expected, computed));
                }
            }
            Format::Gzip => {
                let mut buf = [0u8; 8];
                self.read_trailer(&mut buf)?;
                let expected = u32::from_le_bytes(buf[0..4].try_into().expect("four bytes"));
                let computed = self.hasher.value();
                if expected != computed {
                    return Err(FlateError::checksum_mismatch(expected, computed));
                }
                let expected_size = u32::from_le_bytes(buf[4..8].try_into().expect("four bytes"));
                if expected_size != self.bytes_out as u32 {
                    return Err(FlateError::bad_footer(format!(
                        "ISIZE mismatch: trailer says {expected_size}, decoded {} bytes",
                        self.bytes_out
                    )));
                }
            }
        }
        self.trailer_checked = true;
        Ok(())
    }

    fn read_trailer(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inflater.trailing_bytes(buf).map_err(|err| match err {
            FlateError::UnexpectedEof { .. } => FlateError::bad_footer("truncated trailer"),
            other => other,
        })
    }
}

impl<R: Read> io::Read for Decompressor<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Decompressor::read(self, buf).map_err(to_io_error)
    }
}

/// One-shot encode: drain `reader` into `writer` at the given level.
/// Returns the number of uncompressed bytes consumed.
pub fn compress<R: Read, W: Write>(
    reader: &mut R,
    writer: W,
    format: Format,
    level: Level,
) -> Result<u64> {
    let mut compressor = Compressor::new(writer, format, level)?;
    let mut buf = vec![0u8; 32768];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        compressor.write(&buf[..n])?;
    }
    compressor.finish()?;
    Ok(compressor.total_in())
}

/// One-shot decode: drain `reader` into `writer`, verifying the trailer.
/// Returns the number of uncompressed bytes produced.
pub fn decompress<R: Read, W: Write>(reader: R, writer: &mut W, format: Format) -> Result<u64> {
    let mut decompressor = Decompressor::new(reader, format)?;
    let mut total = 0u64;
    while let Some(chunk) = decompressor.next()? {
        writer.write_all(chunk)?;
        total += chunk.len() as u64;
    }
    Ok(total)
}

/// Compress a byte slice into a fresh `Vec`.
pub fn compress_to_vec(data: &[u8], format: Format, level: Level) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut compressor = Compressor::new(&mut out, format, level)?;
    compressor.write(data)?;
    compressor.finish()?;
    Ok(out)
}

/// Decompress a byte slice into a fresh `Vec`.
pub fn decompress_to_vec(data: &[u8], format: Format) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decompress(data, &mut out, format)?;
    Ok(out)
}
