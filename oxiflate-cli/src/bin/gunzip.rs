//! Decompress a `.gz` file, writing the output without the suffix.

use clap::Parser;
use oxiflate::gzip;
use oxiflate_cli::{fail, write_atomic};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gunzip", about = "Decompress FILE.gz to FILE")]
struct Cli {
    /// File to decompress; must end in .gz.
    file: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        fail("gunzip", &err);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let name = cli.file.to_string_lossy();
    let Some(stem) = name.strip_suffix(".gz") else {
        return Err(format!("{name}: unknown suffix (expected .gz)").into());
    };
    let output = PathBuf::from(stem);

    let reader = BufReader::new(File::open(&cli.file)?);
    write_atomic(&output, |writer| {
        gzip::decompress(reader, writer)?;
        Ok(())
    })
}
