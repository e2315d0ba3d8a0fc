//! DEFLATE decompression (RFC 1951).
//!
//! The decoder is a block-level state machine:
//!
//! ```text
//! Header -> Stored | Tokens(fixed) | Tokens(dynamic) -> ... -> Header
//!                                                \-> Done (final block)
//! ```
//!
//! Output goes through a 64 KiB [`CircularBuffer`]; [`Inflater::next`]
//! yields decoded spans as they become contiguous, and decoding pauses
//! whenever the ring has no room for a worst-case match, so memory stays
//! bounded regardless of stream size.

use crate::huffman::HuffmanDecoder;
use crate::tables::{
    decode_distance, decode_length, fixed_distance_decoder, fixed_litlen_decoder,
    CODE_LENGTH_ORDER, DIST_LOOKUP_BITS, DIST_SYMBOLS, DISTANCE_EXTRA_BITS, LENGTH_EXTRA_BITS,
    LITLEN_LOOKUP_BITS, MAX_MATCH,
};
use oxiflate_core::error::{FlateError, Result};
use oxiflate_core::{BitReader, CircularBuffer};
use std::borrow::Cow;
use std::io::{Cursor, Read};

/// Scratch size for stored-block copies.
const STORED_CHUNK: usize = 512;

/// Decoding position within the current block.
#[derive(Debug)]
enum Stage {
    /// Expecting a BFINAL/BTYPE block header.
    Header,
    /// Copying the payload of a stored block.
    Stored { remaining: usize },
    /// Decoding Huffman-coded tokens.
    Tokens {
        litlen: Cow<'static, HuffmanDecoder>,
        dist: Cow<'static, HuffmanDecoder>,
    },
    /// The final block has ended.
    Done,
}

/// Streaming DEFLATE decompressor.
#[derive(Debug)]
pub struct Inflater<R: Read> {
    bits: BitReader<R>,
    out: CircularBuffer,
    stage: Stage,
    last_block: bool,
}

impl<R: Read> Inflater<R> {
    /// Create a decompressor over a raw DEFLATE byte stream.
    pub fn new(reader: R) -> Self {
        Self {
            bits: BitReader::new(reader),
            out: CircularBuffer::new(),
            stage: Stage::Header,
            last_block: false,
        }
    }

    /// Total decompressed bytes produced so far.
    pub fn bytes_written(&self) -> u64 {
        self.out.written()
    }

    /// Whether the final block has been fully decoded.
    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Done)
    }

    /// Decode until output is pending or the stream ends. Returns
    /// whether a span is ready for [`take_pending`](Self::take_pending).
    pub fn fill_pending(&mut self) -> Result<bool> {
        while self.out.pending() == 0 {
            if self.is_finished() {
                return Ok(false);
            }
            self.step()?;
        }
        Ok(true)
    }

    /// Consume and return the pending contiguous span of decoded bytes.
    pub fn take_pending(&mut self) -> &[u8] {
        self.out.take_readable()
    }

    /// Yield the next span of decoded bytes, or `None` at end of stream.
    ///
    /// Every call after the final block ended keeps returning `None`.
    pub fn next(&mut self) -> Result<Option<&[u8]>> {
        if self.fill_pending()? {
            Ok(Some(self.take_pending()))
        } else {
            Ok(None)
        }
    }

    /// Copy decoded bytes into `dst`; returns 0 only at end of stream.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        if dst.is_empty() || !self.fill_pending()? {
            return Ok(0);
        }
        let span = self.out.readable();
        let n = span.len().min(dst.len());
        dst[..n].copy_from_slice(&span[..n]);
        self.out.consume(n);
        Ok(n)
    }

    /// Read container trailer bytes following the DEFLATE stream.
    ///
    /// Only meaningful once [`is_finished`](Self::is_finished) is true;
    /// discards the bit-level remainder of the last byte first.
    pub fn trailing_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        debug_assert!(self.is_finished());
        self.bits.align_to_byte();
        self.bits.read_bytes(buf)
    }

    /// Byte offset for diagnostics.
    fn offset(&self) -> u64 {
        self.bits.bit_position() / 8
    }

    /// Advance the state machine until output is produced or the stream
    /// ends.
    fn step(&mut self) -> Result<()> {
        match self.stage {
            Stage::Header => self.read_block_header(),
            Stage::Stored { .. } => self.copy_stored(),
            Stage::Tokens { .. } => self.decode_tokens(),
            Stage::Done => Ok(()),
        }
    }

    fn end_of_block(&self) -> Stage {
        if self.last_block {
            Stage::Done
        } else {
            Stage::Header
        }
    }

    fn read_block_header(&mut self) -> Result<()> {
        self.last_block = self.bits.read_bit()?;
        let btype = self.bits.read_bits(2)?;

        self.stage = match btype {
            0 => {
                self.bits.align_to_byte();
                let len = self.bits.read_bits(16)? as u16;
                let nlen = self.bits.read_bits(16)? as u16;
                if len != !nlen {
                    return Err(FlateError::corrupted(
                        self.offset(),
                        format!("stored block LEN/NLEN mismatch: {len:#06x} vs {nlen:#06x}"),
                    ));
                }
                if len == 0 {
                    self.end_of_block()
                } else {
                    Stage::Stored {
                        remaining: usize::from(len),
                    }
                }
            }
            1 => Stage::Tokens {
                litlen: Cow::Borrowed(fixed_litlen_decoder()?),
                dist: Cow::Borrowed(fixed_distance_decoder()?),
            },
            2 => {
                let (litlen, dist) = self.read_dynamic_tables()?;
                Stage::Tokens {
                    litlen: Cow::Owned(litlen),
                    dist: Cow::Owned(dist),
                }
            }
            _ => {
                return Err(FlateError::corrupted(
                    self.offset(),
                    "reserved block type 3",
                ));
            }
        };
        Ok(())
    }

    fn copy_stored(&mut self) -> Result<()> {
        let Stage::Stored { remaining } = self.stage else {
            unreachable!();
        };

        let mut chunk = [0u8; STORED_CHUNK];
        let n = remaining.min(self.out.free()).min(STORED_CHUNK);
        self.bits.read_bytes(&mut chunk[..n])?;
        self.out.write_slice(&chunk[..n]);

        self.stage = if remaining == n {
            self.end_of_block()
        } else {
            Stage::Stored {
                remaining: remaining - n,
            }
        };
        Ok(())
    }

    /// Parse the dynamic block header (RFC 1951 §3.2.7) and build both
    /// decoding tables.
    fn read_dynamic_tables(&mut self) -> Result<(HuffmanDecoder, HuffmanDecoder)> {
        let hlit = self.bits.read_bits(5)? as usize + 257;
        let hdist = self.bits.read_bits(5)? as usize + 1;
        let hclen = self.bits.read_bits(4)? as usize + 4;

        let mut clen_lengths = [0u8; 19];
        for &symbol in &CODE_LENGTH_ORDER[..hclen] {
            clen_lengths[symbol] = self.bits.read_bits(3)? as u8;
        }
        let clen = self.build_table(&clen_lengths, 7)?;

        // Literal/length and distance lengths share one coded sequence,
        // and the repeat opcodes may run across the boundary.
        let mut lengths = vec![0u8; hlit + hdist];
        let mut i = 0;
        while i < lengths.len() {
            let symbol = clen.decode(&mut self.bits)?;
            match symbol {
                0..=15 => {
                    lengths[i] = symbol as u8;
                    i += 1;
                }
                16 => {
                    if i == 0 {
                        return Err(FlateError::corrupted(
                            self.offset(),
                            "length repeat with no previous length",
                        ));
                    }
                    let previous = lengths[i - 1];
                    let repeat = self.bits.read_bits(2)? as usize + 3;
                    self.fill_lengths(&mut lengths, &mut i, repeat, previous)?;
                }
                17 => {
                    let repeat = self.bits.read_bits(3)? as usize + 3;
                    self.fill_lengths(&mut lengths, &mut i, repeat, 0)?;
                }
                18 => {
                    let repeat = self.bits.read_bits(7)? as usize + 11;
                    self.fill_lengths(&mut lengths, &mut i, repeat, 0)?;
                }
                _ => {
                    return Err(FlateError::invalid_huffman(self.bits.bit_position()));
                }
            }
        }

        let litlen = self.build_table(&lengths[..hlit], LITLEN_LOOKUP_BITS)?;
        let dist = self.build_table(&lengths[hlit..], DIST_LOOKUP_BITS)?;
        Ok((litlen, dist))
    }

    fn fill_lengths(
        &self,
        lengths: &mut [u8],
        i: &mut usize,
        repeat: usize,
        value: u8,
    ) -> Result<()> {
        if *i + repeat > lengths.len() {
            return Err(FlateError::corrupted(
                self.offset(),
                "code length repeat overflows declared totals",
            ));
        }
        lengths[*i..*i + repeat].fill(value);
        *i += repeat;
        Ok(())
    }

    /// Build a decoder table, pinning the error offset to the stream.
    fn build_table(&self, lengths: &[u8], lookup_bits: u8) -> Result<HuffmanDecoder> {
        HuffmanDecoder::from_lengths(lengths, lookup_bits).map_err(|err| match err {
            FlateError::Corrupted { message, .. } => FlateError::corrupted(self.offset(), message),
            other => other,
        })
    }

    fn decode_tokens(&mut self) -> Result<()> {
        let Stage::Tokens { litlen, dist } = &self.stage else {
            unreachable!();
        };

        let mut block_ended = false;
        // Pause when the ring cannot take a worst-case match.
        while self.out.free() >= MAX_MATCH {
            let symbol = litlen.decode(&mut self.bits)?;
            if symbol < 256 {
                self.out.write_byte(symbol as u8);
            } else if symbol == 256 {
                block_ended = true;
                break;
            } else if symbol <= 285 {
                let idx = usize::from(symbol - 257);
                let extra = self.bits.read_bits(LENGTH_EXTRA_BITS[idx])?;
                let length = decode_length(symbol, extra as u16);

                let dsym = dist.decode(&mut self.bits)?;
                if usize::from(dsym) >= DIST_SYMBOLS {
                    return Err(FlateError::corrupted(
                        self.bits.bit_position() / 8,
                        format!("invalid distance code {dsym}"),
                    ));
                }
                let dextra = self.bits.read_bits(DISTANCE_EXTRA_BITS[usize::from(dsym)])?;
                let distance = decode_distance(dsym, dextra as u16);

                self.out
                    .copy_match(usize::from(distance), usize::from(length))?;
            } else {
                return Err(FlateError::corrupted(
                    self.bits.bit_position() / 8,
                    format!("invalid literal/length symbol {symbol}"),
                ));
            }
        }

        if block_ended {
            self.stage = self.end_of_block();
        }
        Ok(())
    }
}

/// Decompress a complete raw DEFLATE stream into a `Vec`.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Inflater::new(Cursor::new(data));
    let mut out = Vec::new();
    while let Some(chunk) = inflater.next()? {
        out.extend_from_slice(chunk);
    }
    Ok(out)
}
