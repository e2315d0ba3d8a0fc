//! Decompress stdin to stdout.

use clap::Parser;
use oxiflate::container;
use oxiflate_cli::{fail, FormatArg};
use std::io::{self, BufWriter};

#[derive(Parser)]
#[command(name = "decompress", about = "Decompress stdin to stdout")]
struct Cli {
    /// Container format of the input.
    #[arg(long, value_enum, default_value = "gzip")]
    format: FormatArg,
}

fn main() {
    let cli = Cli::parse();
    let stdin = io::stdin().lock();
    let mut stdout = BufWriter::new(io::stdout().lock());

    if let Err(err) = container::decompress(stdin, &mut stdout, cli.format.into()) {
        fail("decompress", &err);
    }
    if let Err(err) = io::Write::flush(&mut stdout) {
        fail("decompress", &err);
    }
}
