//! Janusz configuration.
//!
//! Configuration lives in `~/.janusz/config.toml` and is organized in three
//! sections:
//!
//! ```toml
//! [general]
//! version = "0.1.0"
//! log_level = "info"
//!
//! [conversion]
//! output_format = "yaml"
//! recursive = true
//! include_extensions = ["pdf", "md", "txt", "docx", "html"]
//! max_file_size_mb = 100
//!
//! [encoder]
//! timeout_secs = 30
//! validate_output = true
//! collect_stats = false
//! allow_npx_fallback = true
//! npx_package = "@toon-format/cli"
//! ```
//!
//! Every value can be overridden from the environment (`JANUSZ_*`), which is
//! applied after the file is parsed and before validation.

use crate::error::{JanuszError, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Current configuration version
pub const CONFIG_VERSION: &str = "0.1.0";

pub const ENV_CONFIG_PATH: &str = "JANUSZ_CONFIG_PATH";
pub const ENV_LOG_LEVEL: &str = "JANUSZ_LOG_LEVEL";
pub const ENV_OUTPUT_FORMAT: &str = "JANUSZ_OUTPUT_FORMAT";
pub const ENV_OUTPUT_DIR: &str = "JANUSZ_OUTPUT_DIR";
pub const ENV_TOON_PATH: &str = "JANUSZ_TOON_PATH";
pub const ENV_TOON_TIMEOUT_SECS: &str = "JANUSZ_TOON_TIMEOUT_SECS";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Serialization format of written records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// File extension of records written in this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = JanuszError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(JanuszError::config(format!(
                "Invalid output format '{}'. Must be one of: yaml, json",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JanuszConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Where records are written; next to the input when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Extensions picked up when a directory is converted
    #[serde(default = "default_include_extensions")]
    pub include_extensions: Vec<String>,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            output_dir: None,
            recursive: true,
            include_extensions: default_include_extensions(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

impl ConversionConfig {
    /// Size limit in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Explicit path of the `toon` executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub validate_output: bool,
    #[serde(default)]
    pub collect_stats: bool,
    #[serde(default = "default_true")]
    pub allow_npx_fallback: bool,
    #[serde(default = "default_npx_package")]
    pub npx_package: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            binary: None,
            timeout_secs: default_timeout_secs(),
            validate_output: true,
            collect_stats: false,
            allow_npx_fallback: true,
            npx_package: default_npx_package(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_include_extensions() -> Vec<String> {
    ["pdf", "md", "txt", "docx", "html"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_max_file_size_mb() -> u64 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_npx_package() -> String {
    "@toon-format/cli".to_string()
}

impl JanuszConfig {
    /// Load configuration from the default location, falling back to defaults
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from_path(&config_path).await
        } else {
            debug!(
                "No configuration at {}, using defaults",
                config_path.display()
            );
            let mut config = Self::default();
            config.merge_env_vars()?;
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific path
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| JanuszError::config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml(&content)?;
        config.merge_env_vars()?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text without applying overrides
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| JanuszError::config(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path).await
    }

    /// Save configuration to a specific path atomically
    pub async fn save_to_path(&self, path: &Path) -> Result<()> {
        debug!("Saving configuration to: {}", path.display());

        self.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    JanuszError::config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| JanuszError::config(format!("Failed to serialize config: {}", e)))?;

        let temp_path = path.with_extension("toml.tmp");
        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|e| JanuszError::config(format!("Failed to write config file: {}", e)))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| JanuszError::config(format!("Failed to rename config file: {}", e)))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(JanuszError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.general.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if self.conversion.max_file_size_mb == 0 {
            return Err(JanuszError::config(
                "max_file_size_mb must be greater than 0",
            ));
        }

        for ext in &self.conversion.include_extensions {
            if crate::SourceFormat::from_extension(ext.trim_start_matches('.')).is_none() {
                return Err(JanuszError::config(format!(
                    "include_extensions contains unsupported extension '{}'",
                    ext
                )));
            }
        }

        if self.encoder.timeout_secs == 0 {
            return Err(JanuszError::config("encoder timeout_secs must be greater than 0"));
        }

        if self.encoder.allow_npx_fallback && self.encoder.npx_package.trim().is_empty() {
            return Err(JanuszError::config(
                "npx_package must be set when allow_npx_fallback is enabled",
            ));
        }

        Ok(())
    }

    /// Merge `JANUSZ_*` environment variable overrides into the configuration
    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_overrides(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary lookup, keyed by environment variable name
    pub fn merge_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        debug!("Merging environment variable overrides");

        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            debug!("Overriding log_level from environment: {}", log_level);
            self.general.log_level = log_level.to_lowercase();
        }

        if let Some(format) = lookup(ENV_OUTPUT_FORMAT) {
            debug!("Overriding output_format from environment: {}", format);
            self.conversion.output_format = format.parse()?;
        }

        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            debug!("Overriding output_dir from environment: {}", dir);
            self.conversion.output_dir = Some(PathBuf::from(dir));
        }

        if let Some(binary) = lookup(ENV_TOON_PATH) {
            debug!("Overriding encoder binary from environment: {}", binary);
            self.encoder.binary = Some(PathBuf::from(binary));
        }

        if let Some(timeout) = lookup(ENV_TOON_TIMEOUT_SECS) {
            self.encoder.timeout_secs = timeout.parse().map_err(|e| {
                JanuszError::config(format!("Invalid {}: {}", ENV_TOON_TIMEOUT_SECS, e))
            })?;
        }

        Ok(())
    }

    /// Get the base Janusz directory path (~/.janusz/)
    pub fn base_dir() -> Result<PathBuf> {
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            let path = PathBuf::from(config_path);
            if let Some(parent) = path.parent() {
                return Ok(parent.to_path_buf());
            }
        }

        let base_dirs = BaseDirs::new()
            .ok_or_else(|| JanuszError::config("Could not determine home directory"))?;

        Ok(base_dirs.home_dir().join(".janusz"))
    }

    /// Get the configuration file path (~/.janusz/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return Ok(PathBuf::from(config_path));
        }

        Ok(Self::base_dir()?.join("config.toml"))
    }
}
