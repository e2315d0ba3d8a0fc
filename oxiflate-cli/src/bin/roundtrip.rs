//! Compress then decompress stdin, verifying byte equality.

use clap::Parser;
use oxiflate::{container, Level};
use oxiflate_cli::{fail, FormatArg};
use std::io::{self, Read};

#[derive(Parser)]
#[command(
    name = "roundtrip",
    about = "Compress and decompress stdin, verifying the result"
)]
struct Cli {
    /// Compression level (0 = store, 4 fast .. 9 best).
    #[arg(short, long, default_value_t = 6)]
    level: u8,

    /// Container format to exercise.
    #[arg(long, value_enum, default_value = "gzip")]
    format: FormatArg,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        fail("roundtrip", &err);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = Vec::new();
    io::stdin().lock().read_to_end(&mut input)?;

    let format = cli.format.into();
    let compressed = container::compress_to_vec(&input, format, Level::new(cli.level))?;
    let decompressed = container::decompress_to_vec(&compressed, format)?;

    if decompressed != input {
        return Err(format!(
            "roundtrip mismatch: {} bytes in, {} bytes out",
            input.len(),
            decompressed.len()
        )
        .into());
    }

    println!(
        "{} bytes -> {} bytes ({:.1}%), roundtrip ok",
        input.len(),
        compressed.len(),
        100.0 * compressed.len() as f64 / input.len().max(1) as f64
    );
    Ok(())
}
