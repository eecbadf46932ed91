//! Runs the external TOON encoder on serialized records.

use crate::probe::{probe, EncoderAvailability, ProbeOptions};
use janusz_core::{EncoderConfig, JanuszError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Suffix of the intermediate JSON written for YAML records
const TEMP_JSON_SUFFIX: &str = ".temp.json";

/// A record successfully encoded
#[derive(Debug, Clone)]
pub struct EncodeOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Whether `--decode` returned valid JSON
    pub validated: bool,
    pub stats: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeFailure {
    pub path: PathBuf,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct EncodeReport {
    pub encoded: Vec<EncodeOutcome>,
    pub failures: Vec<EncodeFailure>,
}

impl EncodeReport {
    pub fn success_count(&self) -> usize {
        self.encoded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What to do besides encoding
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub validate: bool,
    pub stats: bool,
}

impl From<&EncoderConfig> for EncodeOptions {
    fn from(config: &EncoderConfig) -> Self {
        Self {
            validate: config.validate_output,
            stats: config.collect_stats,
        }
    }
}

/// Removes the file it names when dropped
struct TempFile(PathBuf);

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove temporary file {:?}: {}", self.0, e);
            }
        }
    }
}

/// Handle on a usable encoder
#[derive(Debug, Clone)]
pub struct ToonEncoder {
    availability: EncoderAvailability,
    program: PathBuf,
    /// Arguments placed before every encoder invocation
    prefix: Vec<OsString>,
    timeout: Duration,
}

impl ToonEncoder {
    /// Wrap a probe result; a missing encoder is an error
    pub fn new(availability: EncoderAvailability, timeout: Duration) -> Result<Self> {
        let (program, prefix) = match &availability {
            EncoderAvailability::Available { path, .. } => (path.clone(), Vec::new()),
            EncoderAvailability::Fallback { launcher, package } => (
                launcher.clone(),
                vec![OsString::from("--yes"), OsString::from(package)],
            ),
            EncoderAvailability::Missing { reason } => {
                return Err(JanuszError::encoder_unavailable(reason.clone()));
            }
        };
        Ok(Self {
            availability,
            program,
            prefix,
            timeout,
        })
    }

    /// Probe according to `config` and wrap the result
    pub async fn from_config(config: &EncoderConfig) -> Result<Self> {
        let availability = probe(&ProbeOptions::from_config(config)).await;
        info!("TOON encoder: {}", availability);
        Self::new(availability, Duration::from_secs(config.timeout_secs))
    }

    pub fn availability(&self) -> &EncoderAvailability {
        &self.availability
    }

    /// Path of the `.toon` file written for `record_path`
    pub fn output_path(record_path: &Path) -> PathBuf {
        record_path.with_extension("toon")
    }

    /// Encode a YAML or JSON record into `<stem>.toon` beside it
    pub async fn encode(&self, record_path: &Path) -> Result<PathBuf> {
        let output = Self::output_path(record_path);

        let (json_path, _temp) = if is_yaml(record_path) {
            let temp = write_temp_json(record_path).await?;
            (temp.0.clone(), Some(temp))
        } else {
            (record_path.to_path_buf(), None)
        };

        self.run(vec![
            "--encode".into(),
            json_path.into_os_string(),
            "-o".into(),
            output.clone().into_os_string(),
        ])
        .await?;

        if !output.exists() {
            return Err(JanuszError::EncoderRejected {
                code: Some(0),
                stderr: format!("encoder did not write {}", output.display()),
            });
        }

        debug!("Encoded {:?} -> {:?}", record_path, output);
        Ok(output)
    }

    /// Decode a `.toon` file and require valid JSON back
    pub async fn decode_check(&self, toon_path: &Path) -> Result<serde_json::Value> {
        let stdout = self
            .run(vec!["--decode".into(), toon_path.as_os_str().to_os_string()])
            .await?;
        serde_json::from_str(&stdout).map_err(|e| JanuszError::EncoderRejected {
            code: Some(0),
            stderr: format!("--decode did not produce valid JSON: {}", e),
        })
    }

    /// Token statistics reported by the encoder
    pub async fn stats(&self, path: &Path) -> Result<String> {
        let stdout = self
            .run(vec!["--stats".into(), path.as_os_str().to_os_string()])
            .await?;
        Ok(stdout.trim().to_string())
    }

    /// Encode one record with optional validation and statistics
    pub async fn process(&self, record_path: &Path, options: EncodeOptions) -> Result<EncodeOutcome> {
        let output = self.encode(record_path).await?;

        let validated = if options.validate {
            self.decode_check(&output).await?;
            true
        } else {
            false
        };

        let stats = if options.stats {
            match self.stats(&output).await {
                Ok(stats) => Some(stats),
                Err(e) => {
                    warn!("Could not get token stats for {:?}: {}", output, e);
                    None
                }
            }
        } else {
            None
        };

        info!("Encoded {:?} -> {:?}", record_path, output);
        Ok(EncodeOutcome {
            source: record_path.to_path_buf(),
            output,
            validated,
            stats,
        })
    }

    /// Encode each record in order; failures are recorded and skipped
    pub async fn process_batch(&self, paths: &[PathBuf], options: EncodeOptions) -> EncodeReport {
        let mut report = EncodeReport::default();
        for path in paths {
            match self.process(path, options).await {
                Ok(outcome) => report.encoded.push(outcome),
                Err(e) => {
                    warn!("Failed to encode {:?} ({}): {}", path, e.kind(), e);
                    report.failures.push(EncodeFailure {
                        path: path.clone(),
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        report
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run the encoder with `args`, returning stdout
    async fn run(&self, args: Vec<OsString>) -> Result<String> {
        let mut cmd = self.command();
        cmd.args(&args);
        debug!("Executing encoder: {:?}", cmd);

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                JanuszError::timeout(format!(
                    "encoder did not finish within {:?} ({:?})",
                    self.timeout, args
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    JanuszError::encoder_unavailable(format!("failed to start encoder: {}", e))
                } else {
                    JanuszError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(JanuszError::EncoderRejected {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

/// Rewrite a YAML record as `<stem>.temp.json` beside it
async fn write_temp_json(yaml_path: &Path) -> Result<TempFile> {
    let text = tokio::fs::read_to_string(yaml_path).await?;
    let value: serde_json::Value = serde_yaml::from_str(&text)?;

    let mut name = yaml_path
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "record".into());
    name.push(TEMP_JSON_SUFFIX);
    let temp_path = yaml_path.with_file_name(name);

    let guard = TempFile(temp_path);
    tokio::fs::write(&guard.0, serde_json::to_string_pretty(&value)?).await?;
    Ok(guard)
}

/// Records below `dir` that can be encoded, sorted
pub fn collect_records(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut builder = ignore::WalkBuilder::new(dir);
    builder.hidden(false).git_ignore(true).require_git(false);
    if !recursive {
        builder.max_depth(Some(1));
    }

    let mut records = Vec::new();
    for entry in builder.build() {
        let entry = entry.map_err(|e| JanuszError::extraction(format!("Walk error: {}", e)))?;
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.ends_with(TEMP_JSON_SUFFIX) {
            continue;
        }
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_yaml(path) || is_json {
            records.push(path.to_path_buf());
        }
    }

    records.sort();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_encoder_rejected_up_front() {
        let err = ToonEncoder::new(
            EncoderAvailability::Missing {
                reason: "not installed".into(),
            },
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(err.is_encoder_unavailable());
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            ToonEncoder::output_path(Path::new("out/v1.2-guide.yaml")),
            PathBuf::from("out/v1.2-guide.toon")
        );
    }

    #[tokio::test]
    async fn test_temp_json_removed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let yaml = temp_dir.path().join("guide.yaml");
        std::fs::write(&yaml, "metadata:\n  title: Guide\n").unwrap();

        let temp = write_temp_json(&yaml).await.unwrap();
        let path = temp.0.clone();
        assert_eq!(path, temp_dir.path().join("guide.temp.json"));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["metadata"]["title"], "Guide");

        drop(temp);
        assert!(!path.exists());
    }

    #[test]
    fn test_collect_records_skips_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b.yaml", "a.json", "a.temp.json", "notes.md", "c.yml"] {
            std::fs::write(temp_dir.path().join(name), "{}").unwrap();
        }

        let records = collect_records(temp_dir.path(), true).unwrap();
        let names: Vec<_> = records
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.yaml", "c.yml"]);
    }
}
