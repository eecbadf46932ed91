//! `janusz config`: inspect and create the configuration file.

use super::{config_file, load_config};
use crate::output::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use janusz_core::JanuszConfig;
use std::path::Path;

pub async fn show(path: Option<&Path>, format: OutputFormat) -> Result<bool> {
    let config = load_config(path).await?;

    if format.is_json() {
        output::output(&config)?;
        return Ok(true);
    }

    let text = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    if format == OutputFormat::Human {
        output::header(format!("Configuration ({})", config_file(path)?.display()));
    }
    println!("{}", text.trim_end());
    Ok(true)
}

pub async fn init(path: Option<&Path>, force: bool, format: OutputFormat) -> Result<bool> {
    let target = config_file(path)?;
    if target.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            target.display()
        );
    }

    JanuszConfig::default()
        .save_to_path(&target)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;

    if format.is_json() {
        output::output(&serde_json::json!({ "created": target }))?;
    } else {
        output::success(format!("Wrote default configuration to {}", target.display()));
    }
    Ok(true)
}

pub fn path(path: Option<&Path>, format: OutputFormat) -> Result<bool> {
    let target = config_file(path)?;
    if format.is_json() {
        output::output(&serde_json::json!({
            "path": target,
            "exists": target.exists(),
        }))?;
    } else {
        println!("{}", target.display());
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("config.toml");

        assert!(init(Some(&target), false, OutputFormat::Plain).await.unwrap());
        assert!(target.exists());
        assert!(init(Some(&target), false, OutputFormat::Plain).await.is_err());
        assert!(init(Some(&target), true, OutputFormat::Plain).await.unwrap());
    }

    #[tokio::test]
    async fn test_initialized_config_loads() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("nested").join("config.toml");

        init(Some(&target), false, OutputFormat::Plain).await.unwrap();
        let text = std::fs::read_to_string(&target).unwrap();
        assert_eq!(JanuszConfig::from_toml(&text).unwrap(), JanuszConfig::default());
    }
}
