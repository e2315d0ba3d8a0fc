//! LZ77 match finding over a sliding window.
//!
//! The encoder keeps the last 64 KiB of input in a flat buffer: the lower
//! 32 KiB is history, the rest is lookahead. Three cursors order the
//! buffer, `fp <= rp <= wp`:
//!
//! ```text
//! fp   first byte not yet covered by an emitted block
//! rp   next byte to tokenize
//! wp   end of buffered input
//! ```
//!
//! Candidate matches come from a hash chain: `head` maps a 17-bit hash of
//! four bytes to the most recent position that hashed there, `chain`
//! links each position to the previous one with the same hash. Position
//! zero doubles as the empty marker, so the very first byte of a stream
//! is never a match source.
//!
//! The tokenizer walks the chain up to the level-dependent `chain` bound
//! (quartered once a match of `good` length is in hand), stops early at
//! `nice`, and defers emission by one byte (lazy matching) for matches
//! shorter than `lazy`.

use crate::tables::{MAX_DISTANCE, MAX_MATCH};
use crate::token::{Token, TokenBuffer};

/// DEFLATE history window (32 KiB).
pub const WINDOW_SIZE: usize = MAX_DISTANCE;

/// Total encoder buffer: history plus lookahead.
pub const BUFFER_LEN: usize = 2 * WINDOW_SIZE;

/// Shortest match the finder will surface. The position hash covers four
/// bytes, so three-byte matches never appear as candidates.
pub const MIN_MATCH_LEN: usize = 4;

/// Lookahead the tokenizer keeps in reserve between fills, so a match at
/// the current position can always extend to [`MAX_MATCH`].
const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH_LEN;

const HASH_BITS: u32 = 17;
const HASH_MUL: u32 = 0x1E35A7BD;

/// Match-finder tuning for one compression level (levels 4–9).
#[derive(Debug, Clone, Copy)]
pub struct LevelArgs {
    /// Once a match of this length is found, chain traversal is quartered.
    pub good: u16,
    /// Matches at least this long are emitted without lazy deferral.
    pub lazy: u16,
    /// Stop searching outright at this length.
    pub nice: u16,
    /// Maximum chain positions to examine.
    pub chain: u16,
}

impl LevelArgs {
    /// Tuning table for levels 4 (fast) through 9 (best). Levels 1–3
    /// share the level-4 row.
    pub fn for_level(level: u8) -> Self {
        let (good, lazy, nice, chain) = match level {
            0..=4 => (4, 4, 16, 16),
            5 => (8, 16, 32, 32),
            6 => (8, 16, 128, 128),
            7 => (8, 32, 128, 256),
            8 => (32, 128, 258, 1024),
            _ => (32, 258, 258, 4096),
        };
        Self {
            good,
            lazy,
            nice,
            chain,
        }
    }
}

/// The encoder's input buffer. See the module docs for the cursor layout.
#[derive(Debug)]
pub struct SlidingWindow {
    buf: Box<[u8]>,
    wp: usize,
    rp: usize,
    fp: usize,
}

impl SlidingWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; BUFFER_LEN].into_boxed_slice(),
            wp: 0,
            rp: 0,
            fp: 0,
        }
    }

    /// Free suffix of the buffer, ready to receive input.
    pub fn writable(&mut self) -> &mut [u8] {
        &mut self.buf[self.wp..]
    }

    /// Record that `n` bytes were copied into [`writable`](Self::writable).
    pub fn written(&mut self, n: usize) {
        self.wp += n;
        debug_assert!(self.wp <= BUFFER_LEN);
    }

    /// Current tokenization position.
    pub fn pos(&self) -> usize {
        self.rp
    }

    /// Bytes buffered beyond the tokenization position.
    pub fn lookahead_len(&self) -> usize {
        self.wp - self.rp
    }

    /// The byte at an absolute buffer position.
    pub fn byte_at(&self, pos: usize) -> u8 {
        self.buf[pos]
    }

    /// Four bytes at `pos`, packed little-endian for hashing.
    /// Requires `pos + 4 <= wp`.
    fn hash_input(&self, pos: usize) -> u32 {
        u32::from_le_bytes(self.buf[pos..pos + 4].try_into().expect("four bytes"))
    }

    /// Advance the tokenization position.
    pub fn advance(&mut self, step: usize) {
        self.rp += step;
        debug_assert!(self.rp <= self.wp);
    }

    /// Length of the match between `prev` and `pos`, or 0 if it cannot
    /// beat `best` (or is shorter than [`MIN_MATCH_LEN`]).
    pub fn match_len(&self, prev: usize, pos: usize, best: usize) -> usize {
        debug_assert!(prev < pos);
        let limit = MAX_MATCH.min(self.wp - pos);
        if limit < MIN_MATCH_LEN || best >= limit {
            return 0;
        }
        // A candidate that cannot improve on `best` fails this probe.
        if self.buf[prev + best] != self.buf[pos + best] {
            return 0;
        }
        let mut len = 0;
        while len < limit && self.buf[prev + len] == self.buf[pos + len] {
            len += 1;
        }
        if len >= MIN_MATCH_LEN {
            len
        } else {
            0
        }
    }

    /// The raw bytes covered by tokens of the current block, ending at
    /// `end` (an absolute position at or before `rp`).
    pub fn block_bytes(&self, end: usize) -> &[u8] {
        &self.buf[self.fp..end]
    }

    /// Mark everything before `end` as emitted in a block.
    pub fn set_flushed(&mut self, end: usize) {
        debug_assert!(self.fp <= end && end <= self.rp);
        self.fp = end;
    }

    /// Position of the last block boundary.
    pub fn flushed_pos(&self) -> usize {
        self.fp
    }

    /// Whether the buffer is full and needs a slide before more input.
    pub fn is_full(&self) -> bool {
        self.wp == BUFFER_LEN
    }

    /// Drop the oldest 32 KiB of history: the upper half moves down and
    /// every cursor shifts with it. Requires `fp >= WINDOW_SIZE`.
    pub fn slide(&mut self) {
        debug_assert!(self.fp >= WINDOW_SIZE);
        self.buf.copy_within(WINDOW_SIZE.., 0);
        self.wp -= WINDOW_SIZE;
        self.rp -= WINDOW_SIZE;
        self.fp -= WINDOW_SIZE;
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash table plus per-position chain of earlier same-hash positions.
#[derive(Debug)]
pub struct HashChain {
    head: Box<[u16]>,
    chain: Box<[u16]>,
}

impl HashChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            head: vec![0u16; 1 << HASH_BITS].into_boxed_slice(),
            chain: vec![0u16; BUFFER_LEN].into_boxed_slice(),
        }
    }

    #[inline]
    fn hash(four: u32) -> usize {
        (four.wrapping_mul(HASH_MUL) >> (32 - HASH_BITS)) as usize
    }

    /// Insert `pos` for the four bytes `four` and return the previous
    /// position with the same hash (0 = none).
    #[inline]
    pub fn add(&mut self, four: u32, pos: usize) -> usize {
        let slot = Self::hash(four);
        let prev = self.head[slot];
        self.chain[pos] = prev;
        self.head[slot] = pos as u16;
        usize::from(prev)
    }

    /// One step back along the chain from `pos` (0 = none).
    #[inline]
    pub fn prev(&self, pos: usize) -> usize {
        usize::from(self.chain[pos])
    }

    /// Shift every stored position down by `n`; positions that would go
    /// negative become 0 (no predecessor).
    pub fn slide(&mut self, n: usize) {
        let n16 = n as u16;
        for slot in self.head.iter_mut() {
            *slot = if *slot >= n16 { *slot - n16 } else { 0 };
        }
        for i in 0..self.chain.len() - n {
            let v = self.chain[i + n];
            self.chain[i] = if v >= n16 { v - n16 } else { 0 };
        }
        let len = self.chain.len();
        for v in &mut self.chain[len - n..] {
            *v = 0;
        }
    }
}

impl Default for HashChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns buffered input into a token stream, one block at a time.
///
/// The caller drives it: [`fill`](Self::fill) input, [`tokenize`](Self::tokenize),
/// and when the token buffer fills (or at flush points) hand the
/// [`block`](Self::block) to a block writer and call
/// [`finish_block`](Self::finish_block).
#[derive(Debug)]
pub struct Tokenizer {
    win: SlidingWindow,
    chain: HashChain,
    tokens: TokenBuffer,
    args: LevelArgs,
    /// When false, every byte becomes a literal (stored / Huffman-only).
    matching: bool,
    /// Byte at the previous position, pending a lazy-match decision.
    prev_literal: Option<u8>,
    /// Match found at the previous position, pending a better one here.
    prev_match: Option<(u16, u16)>,
}

impl Tokenizer {
    /// Create a tokenizer. `matching = false` disables the match finder.
    pub fn new(args: LevelArgs, matching: bool) -> Self {
        Self {
            win: SlidingWindow::new(),
            chain: HashChain::new(),
            tokens: TokenBuffer::new(),
            args,
            matching,
            prev_literal: None,
            prev_match: None,
        }
    }

    /// Copy as much of `data` as fits into the window; returns the number
    /// of bytes consumed (0 means the window must slide first).
    pub fn fill(&mut self, data: &[u8]) -> usize {
        let dst = self.win.writable();
        let n = dst.len().min(data.len());
        dst[..n].copy_from_slice(&data[..n]);
        self.win.written(n);
        n
    }

    /// Whether the window is full and needs [`slide`](Self::slide).
    pub fn window_full(&self) -> bool {
        self.win.is_full()
    }

    /// Whether sliding is possible without losing unemitted block bytes.
    pub fn can_slide(&self) -> bool {
        self.win.flushed_pos() >= WINDOW_SIZE
    }

    /// Slide the window and the hash chain by 32 KiB.
    pub fn slide(&mut self) {
        self.win.slide();
        self.chain.slide(WINDOW_SIZE);
    }

    /// Whether the token buffer is too full for another iteration.
    pub fn tokens_nearly_full(&self) -> bool {
        self.tokens.remaining() < 2
    }

    /// Whether the current block holds neither tokens nor bytes.
    pub fn block_is_empty(&self) -> bool {
        self.tokens.is_empty() && self.win.flushed_pos() == self.block_end()
    }

    /// End of the byte span covered by the tokens emitted so far: the
    /// byte consumed by a pending lazy decision is not yet covered.
    fn block_end(&self) -> usize {
        let pending = usize::from(self.prev_literal.is_some() || self.prev_match.is_some());
        self.win.pos() - pending
    }

    /// The current block: its token slice and the raw bytes they cover.
    pub fn block(&self) -> (&[Token], &[u8]) {
        (self.tokens.as_slice(), self.win.block_bytes(self.block_end()))
    }

    /// Reset token state after the current block was written out.
    pub fn finish_block(&mut self) {
        let end = self.block_end();
        self.win.set_flushed(end);
        self.tokens.clear();
    }

    /// Process buffered lookahead into tokens.
    ///
    /// Stops when the token buffer is nearly full, or when the remaining
    /// lookahead drops below the reserve (unless `flush`, which consumes
    /// everything and drains the pending literal).
    pub fn tokenize(&mut self, flush: bool) {
        loop {
            if self.tokens_nearly_full() {
                return;
            }
            let ahead = self.win.lookahead_len();
            if ahead == 0 || (!flush && ahead < MIN_LOOKAHEAD) {
                break;
            }

            let pos = self.win.pos();
            if !self.matching {
                self.tokens.push(Token::literal(self.win.byte_at(pos)));
                self.win.advance(1);
                continue;
            }

            let min_len = self.prev_match.map_or(0, |(len, _)| usize::from(len));
            match self.find_match(pos, min_len) {
                Some((len, dist)) => {
                    // A better match here commits the previous position
                    // as a literal.
                    if let Some(lit) = self.prev_literal.take() {
                        self.tokens.push(Token::literal(lit));
                    }
                    if len >= self.args.lazy {
                        self.prev_match = None;
                        self.tokens.push(Token::backreference(len, dist));
                        self.advance_indexed(pos, usize::from(len));
                    } else {
                        self.prev_match = Some((len, dist));
                        self.prev_literal = Some(self.win.byte_at(pos));
                        self.advance_indexed(pos, 1);
                    }
                }
                None => {
                    if let Some((len, dist)) = self.prev_match.take() {
                        // The deferred match stands; one of its bytes was
                        // already consumed at the previous position.
                        self.prev_literal = None;
                        self.tokens.push(Token::backreference(len, dist));
                        self.advance_indexed(pos, usize::from(len) - 1);
                    } else {
                        if let Some(lit) = self.prev_literal.take() {
                            self.tokens.push(Token::literal(lit));
                        }
                        self.prev_literal = Some(self.win.byte_at(pos));
                        self.advance_indexed(pos, 1);
                    }
                }
            }
        }

        if flush && self.win.lookahead_len() == 0 {
            // The tail was too short to match, so only a literal can be
            // pending here.
            debug_assert!(self.prev_match.is_none());
            if let Some(lit) = self.prev_literal.take() {
                self.tokens.push(Token::literal(lit));
            }
        }
    }

    /// Find the longest match at `pos` strictly better than `min_len`.
    fn find_match(&mut self, pos: usize, min_len: usize) -> Option<(u16, u16)> {
        if self.win.lookahead_len() < MIN_MATCH_LEN {
            return None;
        }
        let mut cand = self.chain.add(self.win.hash_input(pos), pos);

        let mut best_len = min_len;
        let mut best = None;
        let mut tries = usize::from(self.args.chain);
        if best_len >= usize::from(self.args.good) {
            tries /= 4;
        }

        while cand > 0 && tries > 0 {
            debug_assert!(cand < pos);
            let dist = pos - cand;
            if dist > MAX_DISTANCE {
                break;
            }
            let len = self.win.match_len(cand, pos, best_len);
            if len > best_len {
                best = Some((len as u16, dist as u16));
                if len >= usize::from(self.args.nice) {
                    break;
                }
                best_len = len;
            }
            cand = self.chain.prev(cand);
            tries -= 1;
        }
        best
    }

    /// Advance by `step`, indexing the hash of every skipped position.
    /// The position at the start of the step was indexed by the finder.
    fn advance_indexed(&mut self, pos: usize, step: usize) {
        for p in pos + 1..pos + step {
            if p + MIN_MATCH_LEN > self.win.wp {
                break;
            }
            self.chain.add(self.win.hash_input(p), p);
        }
        self.win.advance(step);
    }
}
