//! Property-based round-trip tests.

use oxiflate::{container, Format, Level};
use proptest::prelude::*;

fn roundtrip(data: &[u8], format: Format, level: u8) -> Result<(), TestCaseError> {
    let compressed = container::compress_to_vec(data, format, Level::new(level))
        .expect("compression is infallible for in-memory writers");
    let decompressed =
        container::decompress_to_vec(&compressed, format).expect("own output must decode");
    prop_assert_eq!(decompressed, data);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_bytes_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..8192),
        level in prop_oneof![Just(0u8), Just(4), Just(6), Just(9)],
    ) {
        roundtrip(&data, Format::Raw, level)?;
    }

    #[test]
    fn prop_repetitive_bytes_roundtrip(
        data in proptest::collection::vec(0u8..4, 0..16384),
        level in prop_oneof![Just(4u8), Just(6), Just(9)],
    ) {
        // A tiny alphabet produces long matches and deep lazy chains.
        roundtrip(&data, Format::Raw, level)?;
    }

    #[test]
    fn prop_gzip_and_zlib_framing_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..4096),
    ) {
        roundtrip(&data, Format::Gzip, 6)?;
        roundtrip(&data, Format::Zlib, 6)?;
    }

    #[test]
    fn prop_huffman_only_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..4096),
    ) {
        let mut out = Vec::new();
        let mut compressor = container::Compressor::huffman_only(&mut out, Format::Zlib)
            .expect("header write to Vec cannot fail");
        compressor.write(&data).unwrap();
        compressor.finish().unwrap();
        prop_assert_eq!(
            container::decompress_to_vec(&out, Format::Zlib).unwrap(),
            data
        );
    }

    #[test]
    fn prop_text_like_roundtrip(
        words in proptest::collection::vec("[a-f ]{1,12}", 0..600),
        level in prop_oneof![Just(4u8), Just(6), Just(9)],
    ) {
        let data = words.concat().into_bytes();
        roundtrip(&data, Format::Gzip, level)?;
    }
}
