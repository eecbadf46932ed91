//! Capability probe for the external TOON encoder.
//!
//! The probe runs once per batch. Its answer is one of three states: a
//! verified local binary, an `npx` launcher able to fetch the encoder on
//! demand, or nothing usable.

use janusz_core::EncoderConfig;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Name of the encoder executable looked up on `PATH`
pub const TOON_BINARY: &str = "toon";

/// Launcher used when no local binary exists
pub const NPX_LAUNCHER: &str = "npx";

/// How the encoder can be reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EncoderAvailability {
    /// A local binary answered `--version`
    Available { path: PathBuf, version: String },
    /// No binary, but `launcher <package>` can run the encoder
    Fallback { launcher: PathBuf, package: String },
    /// Nothing usable; batch encoding cannot proceed
    Missing { reason: String },
}

impl EncoderAvailability {
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Missing { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Available { .. } => "available",
            Self::Fallback { .. } => "fallback",
            Self::Missing { .. } => "missing",
        }
    }
}

impl fmt::Display for EncoderAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available { path, version } => {
                write!(f, "{} ({})", version, path.display())
            }
            Self::Fallback { launcher, package } => {
                write!(f, "via {} {}", launcher.display(), package)
            }
            Self::Missing { reason } => write!(f, "missing: {}", reason),
        }
    }
}

/// Where the probe looks
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Explicit binary; when set, nothing else is tried for a local binary
    pub binary: Option<PathBuf>,
    /// Look for `toon` on `PATH`
    pub search_path: bool,
    pub allow_npx_fallback: bool,
    pub npx_package: String,
    pub timeout: Duration,
}

impl ProbeOptions {
    pub fn from_config(config: &EncoderConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            search_path: true,
            allow_npx_fallback: config.allow_npx_fallback,
            npx_package: config.npx_package.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Options that only consider `binary`
    pub fn binary_only(binary: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary,
            search_path: false,
            allow_npx_fallback: false,
            npx_package: String::new(),
            timeout,
        }
    }
}

/// Determine how the encoder can be run
pub async fn probe(options: &ProbeOptions) -> EncoderAvailability {
    if let Some(binary) = &options.binary {
        debug!("Probing configured encoder binary {:?}", binary);
        return match query_version(binary, options.timeout).await {
            Ok(version) => EncoderAvailability::Available {
                path: binary.clone(),
                version,
            },
            Err(reason) => EncoderAvailability::Missing {
                reason: format!("configured binary {}: {}", binary.display(), reason),
            },
        };
    }

    let mut reasons = Vec::new();

    if options.search_path {
        match which::which(TOON_BINARY) {
            Ok(path) => {
                debug!("Found {} at {:?}", TOON_BINARY, path);
                match query_version(&path, options.timeout).await {
                    Ok(version) => return EncoderAvailability::Available { path, version },
                    Err(reason) => reasons.push(format!("{}: {}", path.display(), reason)),
                }
            }
            Err(e) => reasons.push(format!("{} not found on PATH: {}", TOON_BINARY, e)),
        }
    }

    if options.allow_npx_fallback && !options.npx_package.is_empty() {
        match which::which(NPX_LAUNCHER) {
            Ok(launcher) => {
                debug!("Falling back to {:?} {}", launcher, options.npx_package);
                return EncoderAvailability::Fallback {
                    launcher,
                    package: options.npx_package.clone(),
                };
            }
            Err(e) => reasons.push(format!("{} not found on PATH: {}", NPX_LAUNCHER, e)),
        }
    }

    if reasons.is_empty() {
        reasons.push("no encoder location configured".to_string());
    }
    EncoderAvailability::Missing {
        reason: reasons.join("; "),
    }
}

/// Run `<binary> --version`, returning its trimmed output
async fn query_version(binary: &std::path::Path, limit: Duration) -> Result<String, String> {
    let mut cmd = Command::new(binary);
    cmd.arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = timeout(limit, cmd.output())
        .await
        .map_err(|_| format!("--version timed out after {:?}", limit))?
        .map_err(|e| format!("failed to run: {}", e))?;

    if !output.status.success() {
        return Err(format!(
            "--version exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if version.is_empty() {
        return Err("--version printed nothing".to_string());
    }
    Ok(version)
}
