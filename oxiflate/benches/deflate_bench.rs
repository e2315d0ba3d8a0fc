//! Throughput benchmarks for compression and decompression.

use oxiflate::{raw, Level};

fn main() {
    let corpora = [
        ("noise", noise(192 * 1024)),
        ("log_lines", log_lines(192 * 1024)),
        ("html_like", html_like(192 * 1024)),
        ("sparse", sparse(192 * 1024)),
    ];

    println!("DEFLATE Benchmarks");
    println!("==================\n");

    for (name, data) in &corpora {
        println!("Corpus: {} ({} bytes)", name, data.len());

        for level in [4, 6, 9] {
            let start = std::time::Instant::now();
            let compressed = raw::compress_to_vec(data, Level::new(level)).unwrap();
            let deflate_time = start.elapsed();

            let start = std::time::Instant::now();
            let decompressed = raw::decompress_to_vec(&compressed).unwrap();
            let inflate_time = start.elapsed();

            let deflate_mbps = data.len() as f64 / deflate_time.as_secs_f64() / 1024.0 / 1024.0;
            let inflate_mbps = data.len() as f64 / inflate_time.as_secs_f64() / 1024.0 / 1024.0;
            let ratio = data.len() as f64 / compressed.len() as f64;

            println!(
                "  Level {}: deflate {:7.2} MB/s, inflate {:7.2} MB/s, {:.2}x ratio ({} bytes)",
                level,
                deflate_mbps,
                inflate_mbps,
                ratio,
                compressed.len()
            );

            assert_eq!(&decompressed, data, "corpus {name} must roundtrip");
        }
        println!();
    }
}

/// Deterministic xorshift32 byte stream.
struct Rng(u32);

impl Rng {
    fn next(&mut self) -> u32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0
    }

    fn byte(&mut self) -> u8 {
        (self.next() >> 9) as u8
    }
}

/// Incompressible input: every byte from the generator.
fn noise(size: usize) -> Vec<u8> {
    let mut rng = Rng(0xC0FFEE01);
    (0..size).map(|_| rng.byte()).collect()
}

/// Timestamped key=value records with heavy cross-line repetition.
fn log_lines(size: usize) -> Vec<u8> {
    let mut rng = Rng(0xC0FFEE02);
    let levels = ["INFO", "WARN", "DEBUG", "ERROR"];
    let mut out = Vec::with_capacity(size + 80);
    let mut tick = 0u32;
    while out.len() < size {
        let level = levels[(rng.next() as usize) % levels.len()];
        let line = format!(
            "2026-08-02T10:{:02}:{:02}Z {level} request id={:08x} status={} bytes={}\n",
            tick / 60 % 60,
            tick % 60,
            rng.next(),
            200 + (rng.next() % 5) * 100,
            rng.next() % 65536,
        );
        out.extend_from_slice(line.as_bytes());
        tick = tick.wrapping_add(1);
    }
    out.truncate(size);
    out
}

/// Nested markup: long tag runs with short random payloads.
fn html_like(size: usize) -> Vec<u8> {
    let mut rng = Rng(0xC0FFEE03);
    let mut out = Vec::with_capacity(size + 64);
    while out.len() < size {
        out.extend_from_slice(b"<div class=\"row\"><span>");
        for _ in 0..(rng.next() % 12 + 1) {
            out.push(b'a' + (rng.next() % 26) as u8);
        }
        out.extend_from_slice(b"</span></div>\n");
    }
    out.truncate(size);
    out
}

/// Mostly zeros with occasional random bytes, like a sparse binary dump.
fn sparse(size: usize) -> Vec<u8> {
    let mut rng = Rng(0xC0FFEE04);
    let mut out = vec![0u8; size];
    let mut i = 0usize;
    while i < size {
        out[i] = rng.byte();
        i += (rng.next() % 97 + 3) as usize;
    }
    out
}
