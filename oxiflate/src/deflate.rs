//! DEFLATE compression (RFC 1951).
//!
//! [`Deflater`] is the streaming encoder core: input accumulates in the
//! sliding window, the tokenizer turns it into literals and
//! back-references, and each time the token buffer fills (or at flush
//! points) one block goes out through the block writer.
//!
//! Blocks and the window interact in one delicate way: the window may
//! only slide once everything in its lower half has been covered by an
//! emitted block, so a forced (non-final) block is written first when
//! needed. This keeps the stored-block fallback, which needs the block's
//! raw bytes, intact across slides.

use crate::block;
use crate::lz77::{LevelArgs, Tokenizer};
use oxiflate_core::{BitWriter, Result};
use std::io::Write;

/// Compression level: 0 stores, 4–9 trade speed for ratio.
///
/// Levels 1–3 behave like level 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Level(u8);

impl Level {
    /// No compression; stored blocks only.
    pub const STORED: Self = Self(0);
    /// Fastest match search.
    pub const FAST: Self = Self(4);
    /// The balanced default.
    pub const DEFAULT: Self = Self(6);
    /// Best compression.
    pub const BEST: Self = Self(9);

    /// Create a level, clamping to the 0–9 range.
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    /// The numeric level.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for Level {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

/// Streaming DEFLATE encoder.
#[derive(Debug)]
pub struct Deflater<W: Write> {
    bits: BitWriter<W>,
    tokenizer: Tokenizer,
    /// Stored-only streams skip the cost comparison entirely.
    force_stored: bool,
    finished: bool,
}

impl<W: Write> Deflater<W> {
    /// Create an encoder writing raw DEFLATE to `writer`.
    pub fn new(writer: W, level: Level) -> Self {
        let stored = level == Level::STORED;
        Self {
            bits: BitWriter::new(writer),
            tokenizer: Tokenizer::new(LevelArgs::for_level(level.get()), !stored),
            force_stored: stored,
            finished: false,
        }
    }

    /// Create an encoder that Huffman-codes literals without searching
    /// for matches.
    pub fn huffman_only(writer: W) -> Self {
        Self {
            bits: BitWriter::new(writer),
            tokenizer: Tokenizer::new(LevelArgs::for_level(Level::DEFAULT.get()), false),
            force_stored: false,
            finished: false,
        }
    }

    /// Whether [`finish`](Self::finish) has completed the stream.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Access the underlying writer (for container trailers).
    pub fn writer_mut(&mut self) -> &mut W {
        self.bits.get_mut()
    }

    /// Consume all of `data`, emitting blocks as they fill.
    pub fn write(&mut self, mut data: &[u8]) -> Result<usize> {
        debug_assert!(!self.finished);
        let total = data.len();
        while !data.is_empty() {
            let taken = self.tokenizer.fill(data);
            data = &data[taken..];
            self.drain_tokens(false)?;

            if self.tokenizer.window_full() {
                if !self.tokenizer.can_slide() {
                    self.emit_block(false)?;
                }
                self.tokenizer.slide();
            }
        }
        Ok(total)
    }

    /// Emit everything consumed so far as a non-final block, followed by
    /// an empty stored block that realigns the stream to a byte
    /// boundary. Decoders see all input up to this point.
    pub fn flush(&mut self) -> Result<()> {
        debug_assert!(!self.finished);
        self.drain_tokens(true)?;
        self.emit_block(false)?;
        block::write_stored(&mut self.bits, &[], false)?;
        self.bits.flush()?;
        Ok(())
    }

    /// Complete the stream with a final block. Idempotent.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.drain_tokens(true)?;
        self.emit_block(true)?;
        self.bits.flush()?;
        self.finished = true;
        Ok(())
    }

    /// Tokenize buffered input, writing blocks whenever the token buffer
    /// fills.
    fn drain_tokens(&mut self, flush: bool) -> Result<()> {
        loop {
            self.tokenizer.tokenize(flush);
            if self.tokenizer.tokens_nearly_full() {
                self.emit_block(false)?;
            } else {
                return Ok(());
            }
        }
    }

    /// Write out the current block. Non-final empty blocks are skipped;
    /// a final block is always written, even an empty one.
    fn emit_block(&mut self, last: bool) -> Result<()> {
        if !last && self.tokenizer.block_is_empty() {
            return Ok(());
        }
        let (tokens, bytes) = self.tokenizer.block();
        block::write_block(&mut self.bits, tokens, bytes, last, self.force_stored)?;
        self.tokenizer.finish_block();
        Ok(())
    }
}

/// Compress `data` to a raw DEFLATE stream in one shot.
pub fn deflate(data: &[u8], level: Level) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut deflater = Deflater::new(&mut out, level);
    deflater.write(data)?;
    deflater.finish()?;
    Ok(out)
}
