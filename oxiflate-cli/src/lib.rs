//! Shared plumbing for the OxiFlate command-line tools.

use clap::ValueEnum;
use oxiflate::Format;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Container format selector shared by the stream tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Gzip framing (RFC 1952).
    Gzip,
    /// Zlib framing (RFC 1950).
    Zlib,
    /// Bare DEFLATE bitstream.
    Raw,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Gzip => Format::Gzip,
            FormatArg::Zlib => Format::Zlib,
            FormatArg::Raw => Format::Raw,
        }
    }
}

/// Write `path` atomically: the closure writes to a `.tmp` sibling which
/// is renamed into place on success and removed on failure, so no
/// partial output file is ever left behind.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), Box<dyn std::error::Error>>,
{
    let tmp_path = tmp_sibling(path);
    let result = (|| {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        write(&mut writer)?;
        std::io::Write::flush(&mut writer)?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            std::fs::rename(&tmp_path, path)?;
            Ok(())
        }
        Err(err) => {
            let _ = std::fs::remove_file(&tmp_path);
            Err(err)
        }
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Print the diagnostic and exit non-zero.
pub fn fail(tool: &str, err: &dyn std::fmt::Display) -> ! {
    eprintln!("{tool}: {err}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmp_sibling_appends_suffix() {
        assert_eq!(
            tmp_sibling(Path::new("dir/file.gz")),
            PathBuf::from("dir/file.gz.tmp")
        );
    }

    #[test]
    fn test_format_arg_mapping() {
        assert_eq!(Format::from(FormatArg::Gzip), Format::Gzip);
        assert_eq!(Format::from(FormatArg::Zlib), Format::Zlib);
        assert_eq!(Format::from(FormatArg::Raw), Format::Raw);
    }
}
