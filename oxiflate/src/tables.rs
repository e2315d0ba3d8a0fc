//! DEFLATE protocol constants and code tables (RFC 1951).
//!
//! Length codes 257–285 and distance codes 0–29 each map a value range to
//! a base value plus a fixed number of extra bits (§3.2.5). The fixed
//! Huffman code (§3.2.6) needs no header and is cached per process.

use crate::huffman::{self, HuffmanDecoder};
use oxiflate_core::Result;
use std::sync::OnceLock;

/// Minimum back-reference length accepted by the format.
pub const MIN_MATCH: usize = 3;

/// Maximum back-reference length.
pub const MAX_MATCH: usize = 258;

/// Maximum back-reference distance (32 KiB window).
pub const MAX_DISTANCE: usize = 32768;

/// Size of the literal/length alphabet (0–285).
pub const LITLEN_SYMBOLS: usize = 286;

/// Size of the distance alphabet (0–29).
pub const DIST_SYMBOLS: usize = 30;

/// Size of the code-length alphabet (0–18).
pub const CODELEN_SYMBOLS: usize = 19;

/// End-of-block symbol in the literal/length alphabet.
pub const END_OF_BLOCK: u16 = 256;

/// Primary lookup width for the literal/length decoder.
pub const LITLEN_LOOKUP_BITS: u8 = 9;

/// Primary lookup width for the distance decoder.
pub const DIST_LOOKUP_BITS: u8 = 6;

/// Base length for codes 257–285.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, // 257-264: 0 extra bits
    11, 13, 15, 17, // 265-268: 1 extra bit
    19, 23, 27, 31, // 269-272: 2 extra bits
    35, 43, 51, 59, // 273-276: 3 extra bits
    67, 83, 99, 115, // 277-280: 4 extra bits
    131, 163, 195, 227, // 281-284: 5 extra bits
    258, // 285: 0 extra bits
];

/// Extra bits for length codes 257–285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 257-264
    1, 1, 1, 1, // 265-268
    2, 2, 2, 2, // 269-272
    3, 3, 3, 3, // 273-276
    4, 4, 4, 4, // 277-280
    5, 5, 5, 5, // 281-284
    0, // 285
];

/// Base distance for codes 0–29.
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, // 0-3: 0 extra bits
    5, 7, // 4-5: 1 extra bit
    9, 13, // 6-7: 2 extra bits
    17, 25, // 8-9: 3 extra bits
    33, 49, // 10-11: 4 extra bits
    65, 97, // 12-13: 5 extra bits
    129, 193, // 14-15: 6 extra bits
    257, 385, // 16-17: 7 extra bits
    513, 769, // 18-19: 8 extra bits
    1025, 1537, // 20-21: 9 extra bits
    2049, 3073, // 22-23: 10 extra bits
    4097, 6145, // 24-25: 11 extra bits
    8193, 12289, // 26-27: 12 extra bits
    16385, 24577, // 28-29: 13 extra bits
];

/// Extra bits for distance codes 0–29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, // 0-3
    1, 1, // 4-5
    2, 2, // 6-7
    3, 3, // 8-9
    4, 4, // 10-11
    5, 5, // 12-13
    6, 6, // 14-15
    7, 7, // 16-17
    8, 8, // 18-19
    9, 9, // 20-21
    10, 10, // 22-23
    11, 11, // 24-25
    12, 12, // 26-27
    13, 13, // 28-29
];

/// Transmission order of the code-length alphabet in a dynamic block
/// header (RFC 1951 §3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Fixed literal/length code lengths (RFC 1951 §3.2.6).
///
/// - Symbols 0–143: 8 bits
/// - Symbols 144–255: 9 bits
/// - Symbols 256–279: 7 bits
/// - Symbols 280–287: 8 bits
pub fn fixed_litlen_lengths() -> [u8; 288] {
    let mut lengths = [8u8; 288];
    for len in &mut lengths[144..256] {
        *len = 9;
    }
    for len in &mut lengths[256..280] {
        *len = 7;
    }
    lengths
}

/// Fixed distance code lengths: all 30 codes use 5 bits.
pub fn fixed_distance_lengths() -> [u8; 30] {
    [5u8; 30]
}

/// The cached fixed literal/length decoder.
pub fn fixed_litlen_decoder() -> Result<&'static HuffmanDecoder> {
    static DECODER: OnceLock<HuffmanDecoder> = OnceLock::new();
    Ok(DECODER.get_or_init(|| {
        HuffmanDecoder::from_lengths(&fixed_litlen_lengths(), LITLEN_LOOKUP_BITS)
            .expect("fixed literal/length table is well-formed")
    }))
}

/// The cached fixed distance decoder.
pub fn fixed_distance_decoder() -> Result<&'static HuffmanDecoder> {
    static DECODER: OnceLock<HuffmanDecoder> = OnceLock::new();
    Ok(DECODER.get_or_init(|| {
        HuffmanDecoder::from_lengths(&fixed_distance_lengths(), DIST_LOOKUP_BITS)
            .expect("fixed distance table is well-formed")
    }))
}

/// The cached encoder-side fixed literal/length codes (bit-reversed).
pub fn fixed_litlen_codes() -> &'static [u16] {
    static CODES: OnceLock<Vec<u16>> = OnceLock::new();
    CODES.get_or_init(|| huffman::canonical_codes(&fixed_litlen_lengths()))
}

/// The cached encoder-side fixed distance codes (bit-reversed).
pub fn fixed_distance_codes() -> &'static [u16] {
    static CODES: OnceLock<Vec<u16>> = OnceLock::new();
    CODES.get_or_init(|| huffman::canonical_codes(&fixed_distance_lengths()))
}

/// Map a match length (3–258) to `(code, extra_bits, extra_value)`.
pub fn length_to_code(length: u16) -> (u16, u8, u16) {
    debug_assert!((3..=258).contains(&length), "length out of range: {length}");

    let l = u32::from(length) - 3;
    let code = if l < 8 {
        257 + l
    } else if length == 258 {
        285
    } else {
        // Lengths 11..=257 group into runs of 4 codes per extra-bit count.
        let extra = (31 - l.leading_zeros()) - 2;
        257 + 4 * (extra + 1) + ((l >> extra) & 3)
    } as u16;

    let idx = usize::from(code - 257);
    (code, LENGTH_EXTRA_BITS[idx], length - LENGTH_BASE[idx])
}

/// Map a match distance (1–32768) to `(code, extra_bits, extra_value)`.
pub fn distance_to_code(distance: u16) -> (u16, u8, u16) {
    debug_assert!(distance >= 1, "distance out of range: {distance}");

    let d = u32::from(distance) - 1;
    let code = if d < 4 {
        d
    } else {
        // Distances 5..=32768 group into pairs of codes per extra-bit count.
        let log = 31 - d.leading_zeros();
        2 * log + ((d >> (log - 1)) & 1)
    } as u16;

    let idx = usize::from(code);
    (code, DISTANCE_EXTRA_BITS[idx], distance - DISTANCE_BASE[idx])
}

/// Reconstruct a length from its code and extra bits.
pub fn decode_length(code: u16, extra: u16) -> u16 {
    debug_assert!((257..=285).contains(&code), "invalid length code: {code}");
    LENGTH_BASE[usize::from(code - 257)] + extra
}

/// Reconstruct a distance from its code and extra bits.
pub fn decode_distance(code: u16, extra: u16) -> u16 {
    debug_assert!(code < 30, "invalid distance code: {code}");
    DISTANCE_BASE[usize::from(code)] + extra
}
