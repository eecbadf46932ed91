//! Subcommand implementations.
//!
//! Every command returns `Ok(true)` when all of its work succeeded and
//! `Ok(false)` when some files failed; the binary maps the latter to exit
//! status 1.

pub mod config;
pub mod convert;
pub mod probe;
pub mod toon;

use crate::output::{self, OutputFormat, TableBuilder};
use anyhow::{Context, Result};
use janusz_core::JanuszConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Directory used when no path is given
pub const DEFAULT_INPUT_DIR: &str = "new";

/// Load configuration from `path`, or the default location
pub async fn load_config(path: Option<&Path>) -> Result<JanuszConfig> {
    match path {
        Some(path) => JanuszConfig::load_from_path(path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => JanuszConfig::load().await.context("Failed to load configuration"),
    }
}

/// Where `config init` writes and `config path` points
pub fn config_file(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(JanuszConfig::config_path()?),
    }
}

/// A file that failed, as reported to the user
#[derive(Debug, Clone, Serialize)]
pub struct FailureRow {
    pub path: PathBuf,
    pub kind: String,
    pub message: String,
}

/// Print failures as a table
pub fn print_failures(failures: &[FailureRow]) {
    if failures.is_empty() {
        return;
    }

    output::header("Failures");
    let mut table = TableBuilder::new().header(vec!["File", "Kind", "Error"]);
    for failure in failures {
        table = table.row(vec![
            failure.path.display().to_string(),
            failure.kind.clone(),
            failure.message.clone(),
        ]);
    }
    table.print();
}

/// Final summary line
pub fn print_summary(action: &str, succeeded: usize, failed: usize, format: OutputFormat) {
    let msg = format!("{}: {} succeeded, {} failed", action, succeeded, failed);
    match (format, failed) {
        (OutputFormat::Json, _) => {}
        (_, 0) => output::success(msg),
        _ => output::warning(msg),
    }
}
