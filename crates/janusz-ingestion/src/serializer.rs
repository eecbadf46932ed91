//! Writes Document Records as YAML or JSON.

use janusz_core::{DocumentRecord, JanuszError, OutputFormat, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Render a record in the given format
pub fn to_string(record: &DocumentRecord, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(record)?),
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(record)?;
            text.push('\n');
            Ok(text)
        }
    }
}

/// Parse a record serialized in the given format
pub fn parse_record(text: &str, format: OutputFormat) -> Result<DocumentRecord> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::from_str(text)?),
        OutputFormat::Json => Ok(serde_json::from_str(text)?),
    }
}

/// Output path for `input`: same stem, format extension, in `output_dir`
/// or beside the input. Never returns the input path itself.
pub fn output_path(input: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "document".into());
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let file_name = |suffix: &str| {
        let mut name = stem.clone();
        name.push(suffix);
        name.push(".");
        name.push(format.extension());
        name
    };

    let candidate = dir.join(file_name(""));
    if same_file(&candidate, input) {
        return dir.join(file_name(".converted"));
    }
    candidate
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Writes records to disk
#[derive(Debug, Clone)]
pub struct RecordWriter {
    format: OutputFormat,
    output_dir: Option<PathBuf>,
}

impl RecordWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Where the record for `input` will be written
    pub fn target_for(&self, input: &Path) -> PathBuf {
        output_path(input, self.output_dir.as_deref(), self.format)
    }

    /// Serialize `record` for `input`, replacing any previous output atomically
    pub fn write(&self, record: &DocumentRecord, input: &Path) -> Result<PathBuf> {
        let target = self.target_for(input);
        let text = to_string(record, self.format)?;

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut temp_name = target
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| JanuszError::schema("output path has no file name"))?;
        temp_name.push(".tmp");
        let temp_path = target.with_file_name(temp_name);

        std::fs::write(&temp_path, text)?;
        if let Err(e) = std::fs::rename(&temp_path, &target) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!("Wrote {} record to {}", self.format, target.display());
        Ok(target)
    }
}
