//! Edge case tests for DEFLATE compression.

use oxiflate::{raw, Level};

fn roundtrip(input: &[u8], level: u8) {
    let compressed = raw::compress_to_vec(input, Level::new(level)).unwrap();
    let decompressed = raw::decompress_to_vec(&compressed).unwrap();
    assert_eq!(decompressed, input, "level {level}, {} bytes", input.len());
}

#[test]
fn test_empty_input() {
    for level in [0, 4, 6, 9] {
        roundtrip(b"", level);
    }
}

#[test]
fn test_single_byte() {
    roundtrip(b"A", 6);
}

#[test]
fn test_all_zeros() {
    let input = vec![0u8; 1000];
    let compressed = raw::compress_to_vec(&input, Level::DEFAULT).unwrap();
    assert_eq!(raw::decompress_to_vec(&compressed).unwrap(), input);
    assert!(compressed.len() < input.len() / 10);
}

#[test]
fn test_all_same_byte() {
    let input = vec![255u8; 5000];
    let compressed = raw::compress_to_vec(&input, Level::DEFAULT).unwrap();
    assert_eq!(raw::decompress_to_vec(&compressed).unwrap(), input);
    assert!(compressed.len() < input.len() / 20);
}

#[test]
fn test_max_match_length() {
    // Repeats of a 258-byte pattern hit the maximum match length.
    let pattern = vec![42u8; 258];
    let mut input = Vec::new();
    for _ in 0..10 {
        input.extend_from_slice(&pattern);
    }
    roundtrip(&input, 9);
}

#[test]
fn test_alternating_pattern() {
    let input: Vec<u8> = (0..1000).map(|i| if i % 2 == 0 { b'A' } else { b'B' }).collect();
    roundtrip(&input, 6);
}

#[test]
fn test_large_input() {
    // 1 MiB of repetitive text exercises several window slides.
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    let mut input = Vec::with_capacity(1024 * 1024);
    while input.len() < 1024 * 1024 {
        input.extend_from_slice(pattern);
    }
    input.truncate(1024 * 1024);
    roundtrip(&input, 5);
}

#[test]
fn test_incompressible_data() {
    // Pseudo-random bytes; the encoder should fall back gracefully.
    let mut input = Vec::with_capacity(200_000);
    let mut seed = 0x9E3779B9u32;
    for _ in 0..200_000 {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        input.push(seed as u8);
    }
    for level in [0, 4, 6, 9] {
        roundtrip(&input, level);
    }
}

#[test]
fn test_incremental_pattern() {
    let mut input = Vec::new();
    for i in 0..256 {
        for _ in 0..10 {
            input.push(i as u8);
        }
    }
    roundtrip(&input, 4);
}

#[test]
fn test_compression_levels() {
    let input = b"Hello, world! This is a test of DEFLATE compression with various levels.";
    for level in 0..=9 {
        let compressed = raw::compress_to_vec(input, Level::new(level)).unwrap();
        assert_eq!(raw::decompress_to_vec(&compressed).unwrap(), input);
        if level == 0 {
            // Stored blocks carry a small framing overhead.
            assert!(compressed.len() > input.len());
        }
    }
}

#[test]
fn test_binary_data() {
    let input: Vec<u8> = (0..=255u8).cycle().take(5000).collect();
    roundtrip(&input, 6);
}

#[test]
fn test_long_distance_match() {
    // A pattern recurring almost a full window apart.
    let mut input = vec![0u8; 32768];
    let pattern = b"PATTERN_TO_MATCH";
    input[..pattern.len()].copy_from_slice(pattern);
    let tail = input.len() - pattern.len();
    input[tail..].copy_from_slice(pattern);
    roundtrip(&input, 9);
}

#[test]
fn test_matches_across_window_slides() {
    // A long periodic stream keeps matching against recently slid
    // history; decoding it verifies every emitted distance was valid.
    let mut input = Vec::with_capacity(400_000);
    let mut counter = 0u32;
    while input.len() < 400_000 {
        input.extend_from_slice(format!("record-{counter:06} ").as_bytes());
        counter = (counter + 1) % 500;
    }
    for level in [4, 6, 9] {
        roundtrip(&input, level);
    }
}

#[test]
fn test_utf8_text() {
    let text = "zip と gzip の両方に DEFLATE が使われている。".repeat(300);
    roundtrip(text.as_bytes(), 6);
}
