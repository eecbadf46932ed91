//! Fixtures shared by the workspace integration tests.

use janusz_core::{ConversionConfig, OutputFormat};
use janusz_ingestion::{DocumentConverter, RecordAssembler};
use std::path::{Path, PathBuf};

/// Markdown guide with nested sections, practices and examples
pub const GUIDE_MD: &str = "\
# API Guide

Overview of the service.

## Best Practices

- Always validate input before calling the API.
- Keep tokens out of logs.

## Examples

For example: `curl https://localhost/health` returns ok.

### Errors

Retries should use exponential backoff.
";

/// Plain text with heuristic headings only
pub const NOTES_TXT: &str = "\
INSTALLATION

Download the archive and unpack it.

System Requirements

You must have a recent toolchain.

Installation Steps

Run the installer, such as ./install.sh.
";

/// Text with no structure at all
pub const FLAT_TXT: &str = "one line\nanother line\n\nlast line";

/// Write `content` to `dir/name`, creating parent directories
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Converter writing to `out` with no creation timestamp
pub fn reproducible_converter(format: OutputFormat, out: &Path) -> DocumentConverter {
    let config = ConversionConfig {
        output_format: format,
        output_dir: Some(out.to_path_buf()),
        ..ConversionConfig::default()
    };
    DocumentConverter::new(&config).with_assembler(RecordAssembler::without_timestamp())
}

/// Install an executable shell script standing in for the `toon` tool
#[cfg(unix)]
pub fn fake_encoder(dir: &Path, script: &str) -> std::io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("toon");
    std::fs::write(&path, script)?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// Shell script behaving like a working `toon`; encoding copies its input
pub const WORKING_ENCODER: &str = r#"#!/bin/sh
case "$1" in
  --version) echo "toon 0.9.0" ;;
  --encode) cp "$2" "$4" ;;
  --decode) cat "$2" ;;
  --stats) echo "tokens: 7" ;;
  *) exit 2 ;;
esac
"#;
