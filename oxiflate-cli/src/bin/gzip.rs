//! Compress a file to gzip format, writing `PATH.gz` next to it.

use clap::Parser;
use oxiflate::{gzip, Level};
use oxiflate_cli::{fail, write_atomic};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gzip", about = "Compress FILE to FILE.gz")]
struct Cli {
    /// File to compress.
    file: PathBuf,

    /// Compression level (0 = store, 4 fast .. 9 best).
    #[arg(short, long, default_value_t = 6)]
    level: u8,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        fail("gzip", &err);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut output = cli.file.as_os_str().to_os_string();
    output.push(".gz");
    let output = PathBuf::from(output);

    let mut reader = BufReader::new(File::open(&cli.file)?);
    write_atomic(&output, |writer| {
        gzip::compress(&mut reader, writer, Level::new(cli.level))?;
        Ok(())
    })
}
