//! DEFLATE block emission.
//!
//! Given one block's tokens and the raw bytes they cover, estimate the
//! bit cost of the three encodings (RFC 1951 §3.2.3) and emit the
//! cheapest:
//!
//! - **Stored**: `BFINAL, 00`, byte-align, LEN, !LEN, raw bytes
//!   (split at 65 535 bytes)
//! - **Fixed**: `BFINAL, 01`, tokens in the §3.2.6 code, no header
//! - **Dynamic**: `BFINAL, 10`, HLIT/HDIST/HCLEN, the run-length-encoded
//!   code lengths, then the tokens
//!
//! Cost ties break dynamic over fixed over stored.

use crate::huffman::{canonical_codes, HuffmanBuilder, MAX_CODELEN_LENGTH, MAX_CODE_LENGTH};
use crate::tables::{
    distance_to_code, fixed_distance_codes, fixed_distance_lengths, fixed_litlen_codes,
    fixed_litlen_lengths, length_to_code, CODELEN_SYMBOLS, CODE_LENGTH_ORDER, DIST_SYMBOLS,
    END_OF_BLOCK, LITLEN_SYMBOLS,
};
use crate::token::{Token, TokenKind};
use oxiflate_core::{BitWriter, Result};
use std::io::Write;

/// Maximum payload of one stored block.
const MAX_STORED_LEN: usize = 65535;

/// One op of the run-length-encoded code-length sequence.
#[derive(Debug, Clone, Copy)]
struct ClenOp {
    symbol: u8,
    extra_bits: u8,
    extra: u8,
}

/// Write one DEFLATE block for `tokens`, whose literal expansion is
/// exactly `bytes`. `force_stored` bypasses the cost comparison
/// (stored-only streams).
pub fn write_block<W: Write>(
    writer: &mut BitWriter<W>,
    tokens: &[Token],
    bytes: &[u8],
    last: bool,
    force_stored: bool,
) -> Result<()> {
    debug_assert_eq!(
        tokens.iter().map(|t| t.coverage()).sum::<usize>(),
        bytes.len(),
        "tokens must cover the block bytes exactly"
    );

    if force_stored {
        return write_stored(writer, bytes, last);
    }

    // Symbol histograms, including the end-of-block marker.
    let mut litlen = HuffmanBuilder::new(LITLEN_SYMBOLS, MAX_CODE_LENGTH as u8);
    let mut dist = HuffmanBuilder::new(DIST_SYMBOLS, MAX_CODE_LENGTH as u8);
    for token in tokens {
        match token.kind() {
            TokenKind::Literal(byte) => litlen.add(u16::from(byte)),
            TokenKind::Match { length, distance } => {
                litlen.add(length_to_code(length).0);
                dist.add(distance_to_code(distance).0);
            }
        }
    }
    litlen.add(END_OF_BLOCK);

    // Strict inflaters reject incomplete trees, so both alphabets get at
    // least two coded symbols even when the block never uses them.
    ensure_two_symbols(&mut litlen);
    ensure_two_symbols(&mut dist);

    let litlen_lengths = litlen.build_lengths();
    let dist_lengths = dist.build_lengths();

    let hlit = coded_count(&litlen_lengths, 257);
    let hdist = coded_count(&dist_lengths, 1);
    let mut combined = Vec::with_capacity(hlit + hdist);
    combined.extend_from_slice(&litlen_lengths[..hlit]);
    combined.extend_from_slice(&dist_lengths[..hdist]);
    let (ops, clen_freqs) = rle_encode(&combined);

    let mut clen = HuffmanBuilder::new(CODELEN_SYMBOLS, MAX_CODELEN_LENGTH as u8);
    for (symbol, &freq) in clen_freqs.iter().enumerate() {
        if freq > 0 {
            clen.add_count(symbol as u16, freq);
        }
    }
    ensure_two_symbols(&mut clen);
    let clen_lengths = clen.build_lengths();
    let transmitted = transmitted_clen_count(&clen_lengths);

    // Bit costs of the three encodings.
    let stored_cost = stored_block_cost(bytes.len());
    let fixed_lengths = fixed_litlen_lengths();
    let fixed_dist_lengths = fixed_distance_lengths();
    let fixed_cost = 3 + coded_cost(tokens, &fixed_lengths, &fixed_dist_lengths);
    let header_cost: usize = 14
        + 3 * transmitted
        + ops
            .iter()
            .map(|op| {
                usize::from(clen_lengths[usize::from(op.symbol)]) + usize::from(op.extra_bits)
            })
            .sum::<usize>();
    let dynamic_cost = 3 + header_cost + coded_cost(tokens, &litlen_lengths, &dist_lengths);

    if dynamic_cost <= fixed_cost && dynamic_cost <= stored_cost {
        write_dynamic_header(
            writer,
            last,
            hlit,
            hdist,
            transmitted,
            &clen_lengths,
            &ops,
        )?;
        let litlen_codes = canonical_codes(&litlen_lengths);
        let dist_codes = canonical_codes(&dist_lengths);
        write_tokens(
            writer,
            tokens,
            &litlen_codes,
            &litlen_lengths,
            &dist_codes,
            &dist_lengths,
        )
    } else if fixed_cost <= stored_cost {
        writer.write_bit(last)?;
        writer.write_bits(0b01, 2)?;
        write_tokens(
            writer,
            tokens,
            fixed_litlen_codes(),
            &fixed_lengths,
            fixed_distance_codes(),
            &fixed_dist_lengths,
        )
    } else {
        write_stored(writer, bytes, last)
    }
}

/// Emit `bytes` as stored blocks, splitting at the 65 535-byte LEN limit.
/// Always emits at least one block (an empty one for empty input).
pub fn write_stored<W: Write>(writer: &mut BitWriter<W>, bytes: &[u8], last: bool) -> Result<()> {
    let mut rest = bytes;
    loop {
        let n = rest.len().min(MAX_STORED_LEN);
        let chunk = &rest[..n];
        rest = &rest[n..];

        let len = n as u16;
        writer.write_bit(last && rest.is_empty())?;
        writer.write_bits(0b00, 2)?;
        writer.align_to_byte()?;
        writer.write_bits(u32::from(len), 16)?;
        writer.write_bits(u32::from(!len), 16)?;
        writer.write_bytes(chunk)?;

        if rest.is_empty() {
            return Ok(());
        }
    }
}

/// Give `builder` at least two coded symbols so its tree is complete.
fn ensure_two_symbols(builder: &mut HuffmanBuilder) {
    let mut symbol = 0u16;
    while builder.used_symbols() < 2 {
        if builder.frequency(symbol) == 0 {
            builder.add(symbol);
        }
        symbol += 1;
    }
}

/// Number of leading code lengths that must be transmitted: up to the
/// last non-zero entry, but at least `min`.
fn coded_count(lengths: &[u8], min: usize) -> usize {
    lengths
        .iter()
        .rposition(|&len| len > 0)
        .map_or(min, |i| (i + 1).max(min))
}

/// Number of 3-bit code-length-code entries to transmit (HCLEN + 4).
fn transmitted_clen_count(clen_lengths: &[u8]) -> usize {
    let mut count = CODELEN_SYMBOLS;
    while count > 4 && clen_lengths[CODE_LENGTH_ORDER[count - 1]] == 0 {
        count -= 1;
    }
    count
}

/// Bit cost of emitting `bytes` as stored blocks, worst-case alignment.
fn stored_block_cost(len: usize) -> usize {
    let chunks = len.div_ceil(MAX_STORED_LEN).max(1);
    chunks * (3 + 7 + 32) + 8 * len
}

/// Bit cost of the token stream under the given code lengths.
fn coded_cost(tokens: &[Token], litlen_lengths: &[u8], dist_lengths: &[u8]) -> usize {
    let mut bits = 0usize;
    for token in tokens {
        match token.kind() {
            TokenKind::Literal(byte) => {
                bits += usize::from(litlen_lengths[usize::from(byte)]);
            }
            TokenKind::Match { length, distance } => {
                let (code, len_extra, _) = length_to_code(length);
                bits += usize::from(litlen_lengths[usize::from(code)]) + usize::from(len_extra);
                let (dcode, dist_extra, _) = distance_to_code(distance);
                bits += usize::from(dist_lengths[usize::from(dcode)]) + usize::from(dist_extra);
            }
        }
    }
    bits + usize::from(litlen_lengths[usize::from(END_OF_BLOCK)])
}

/// Run-length encode a code-length sequence with the 16/17/18 repeat
/// opcodes, returning the ops and the code-length-alphabet histogram.
fn rle_encode(lengths: &[u8]) -> (Vec<ClenOp>, [u32; CODELEN_SYMBOLS]) {
    let mut ops = Vec::new();
    let mut freqs = [0u32; CODELEN_SYMBOLS];
    let mut push = |ops: &mut Vec<ClenOp>, symbol: u8, extra_bits: u8, extra: u8| {
        ops.push(ClenOp {
            symbol,
            extra_bits,
            extra,
        });
        freqs[usize::from(symbol)] += 1;
    };

    let mut i = 0;
    while i < lengths.len() {
        let value = lengths[i];
        let mut run = 1;
        while i + run < lengths.len() && lengths[i + run] == value {
            run += 1;
        }
        i += run;

        if value == 0 {
            while run >= 11 {
                let n = run.min(138);
                push(&mut ops, 18, 7, (n - 11) as u8);
                run -= n;
            }
            if run >= 3 {
                push(&mut ops, 17, 3, (run - 3) as u8);
                run = 0;
            }
            while run > 0 {
                push(&mut ops, 0, 0, 0);
                run -= 1;
            }
        } else {
            // Repeats of a non-zero length need the length itself first.
            push(&mut ops, value, 0, 0);
            run -= 1;
            while run >= 3 {
                let n = run.min(6);
                push(&mut ops, 16, 2, (n - 3) as u8);
                run -= n;
            }
            while run > 0 {
                push(&mut ops, value, 0, 0);
                run -= 1;
            }
        }
    }

    (ops, freqs)
}

fn write_dynamic_header<W: Write>(
    writer: &mut BitWriter<W>,
    last: bool,
    hlit: usize,
    hdist: usize,
    transmitted: usize,
    clen_lengths: &[u8],
    ops: &[ClenOp],
) -> Result<()> {
    writer.write_bit(last)?;
    writer.write_bits(0b10, 2)?;
    writer.write_bits((hlit - 257) as u32, 5)?;
    writer.write_bits((hdist - 1) as u32, 5)?;
    writer.write_bits((transmitted - 4) as u32, 4)?;

    for &symbol in &CODE_LENGTH_ORDER[..transmitted] {
        writer.write_bits(u32::from(clen_lengths[symbol]), 3)?;
    }

    let clen_codes = canonical_codes(clen_lengths);
    for op in ops {
        let symbol = usize::from(op.symbol);
        writer.write_bits(
            u32::from(clen_codes[symbol]),
            clen_lengths[symbol],
        )?;
        if op.extra_bits > 0 {
            writer.write_bits(u32::from(op.extra), op.extra_bits)?;
        }
    }
    Ok(())
}

/// Emit the token stream followed by the end-of-block symbol.
fn write_tokens<W: Write>(
    writer: &mut BitWriter<W>,
    tokens: &[Token],
    litlen_codes: &[u16],
    litlen_lengths: &[u8],
    dist_codes: &[u16],
    dist_lengths: &[u8],
) -> Result<()> {
    for token in tokens {
        match token.kind() {
            TokenKind::Literal(byte) => {
                let sym = usize::from(byte);
                writer.write_bits(u32::from(litlen_codes[sym]), litlen_lengths[sym])?;
            }
            TokenKind::Match { length, distance } => {
                let (code, len_extra_bits, len_extra) = length_to_code(length);
                let sym = usize::from(code);
                writer.write_bits(u32::from(litlen_codes[sym]), litlen_lengths[sym])?;
                if len_extra_bits > 0 {
                    writer.write_bits(u32::from(len_extra), len_extra_bits)?;
                }

                let (dcode, dist_extra_bits, dist_extra) = distance_to_code(distance);
                let dsym = usize::from(dcode);
                writer.write_bits(u32::from(dist_codes[dsym]), dist_lengths[dsym])?;
                if dist_extra_bits > 0 {
                    writer.write_bits(u32::from(dist_extra), dist_extra_bits)?;
                }
            }
        }
    }

    let eob = usize::from(END_OF_BLOCK);
    writer.write_bits(u32::from(litlen_codes[eob]), litlen_lengths[eob])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inflate::inflate;

    fn emit(tokens: &[Token], bytes: &[u8], force_stored: bool) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        write_block(&mut writer, tokens, bytes, true, force_stored).unwrap();
        writer.flush().unwrap();
        out
    }

    #[test]
    fn test_stored_block_layout() {
        let data = b"Hello world\n";
        let tokens: Vec<Token> = data.iter().map(|&b| Token::literal(b)).collect();
        let out = emit(&tokens, data, true);

        let mut expected = vec![0x01, 0x0C, 0x00, 0xF3, 0xFF];
        expected.extend_from_slice(data);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_stored_block() {
        let out = emit(&[], b"", true);
        assert_eq!(out, vec![0x01, 0x00, 0x00, 0xFF, 0xFF]);
    }

    #[test]
    fn test_stored_block_splits_at_limit() {
        let data = vec![0xA5u8; MAX_STORED_LEN + 1];
        let tokens: Vec<Token> = data.iter().map(|&b| Token::literal(b)).collect();
        let out = emit(&tokens, &data, true);
        // Two blocks: 5-byte header + 65535 payload, then 5 + 1.
        assert_eq!(out.len(), 5 + MAX_STORED_LEN + 5 + 1);
        assert_eq!(inflate(&out).unwrap(), data);
    }

    #[test]
    fn test_short_blocks_prefer_fixed() {
        let tokens = [Token::literal(b'h'), Token::literal(b'i')];
        let out = emit(&tokens, b"hi", false);
        assert_eq!(out[0] & 0b111, 0b011); // BFINAL=1, BTYPE=01
        assert_eq!(inflate(&out).unwrap(), b"hi");
    }

    #[test]
    fn test_empty_final_block_is_fixed() {
        let out = emit(&[], b"", false);
        assert_eq!(out.len(), 2); // 3 header bits + 7-bit EOB, padded
        assert_eq!(inflate(&out).unwrap(), b"");
    }

    #[test]
    fn test_skewed_blocks_prefer_dynamic() {
        // A long, low-entropy literal run makes the dynamic header pay off.
        let data: Vec<u8> = std::iter::repeat(b"AB".as_slice())
            .take(2000)
            .flatten()
            .copied()
            .collect();
        let tokens: Vec<Token> = data.iter().map(|&b| Token::literal(b)).collect();
        let out = emit(&tokens, &data, false);
        assert_eq!(out[0] & 0b111, 0b101); // BFINAL=1, BTYPE=10
        assert_eq!(inflate(&out).unwrap(), data);
    }

    #[test]
    fn test_matches_roundtrip_through_all_encodings() {
        let bytes = b"Blah blah blah blah blah!";
        let tokens = [
            Token::literal(b'B'),
            Token::literal(b'l'),
            Token::literal(b'a'),
            Token::literal(b'h'),
            Token::literal(b' '),
            Token::literal(b'b'),
            Token::backreference(18, 5),
            Token::literal(b'!'),
        ];
        let coded = emit(&tokens, bytes, false);
        assert_eq!(inflate(&coded).unwrap(), bytes);

        let stored = emit(&tokens, bytes, true);
        assert_eq!(inflate(&stored).unwrap(), bytes);
    }

    #[test]
    fn test_rle_runs() {
        let lengths = [0u8; 140];
        let (ops, freqs) = rle_encode(&lengths);
        // 138 zeros via one op 18, then two literal zeros.
        assert_eq!(ops.len(), 3);
        assert_eq!(freqs[18], 1);
        assert_eq!(freqs[0], 2);

        let lengths = [5u8; 9];
        let (ops, freqs) = rle_encode(&lengths);
        // 5, repeat(6), then two more literals.
        assert_eq!(ops.len(), 4);
        assert_eq!(freqs[16], 1);
        assert_eq!(freqs[5], 3);
    }

    #[test]
    fn test_rle_mixed_sequence() {
        let lengths = [3u8, 3, 3, 3, 0, 0, 0, 0, 0, 2];
        let (ops, _) = rle_encode(&lengths);
        let mut decoded = Vec::new();
        for op in &ops {
            match op.symbol {
                16 => {
                    let prev = *decoded.last().unwrap();
                    decoded.extend(std::iter::repeat(prev).take(usize::from(op.extra) + 3));
                }
                17 => decoded.extend(std::iter::repeat(0).take(usize::from(op.extra) + 3)),
                18 => decoded.extend(std::iter::repeat(0).take(usize::from(op.extra) + 11)),
                v => decoded.push(v),
            }
        }
        assert_eq!(decoded, lengths);
    }
}
