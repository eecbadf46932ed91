//! `janusz probe`: report how the TOON encoder would be run.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use janusz_core::JanuszConfig;
use janusz_toon::{probe, EncoderAvailability, ProbeOptions};

pub async fn run(config: &JanuszConfig, format: OutputFormat) -> Result<bool> {
    let pb = output::spinner("Probing TOON encoder...", format);
    let availability = probe(&ProbeOptions::from_config(&config.encoder)).await;
    pb.finish_and_clear();

    if format.is_json() {
        output::output(&availability)?;
        return Ok(availability.is_usable());
    }

    output::header("TOON encoder");
    match &availability {
        EncoderAvailability::Available { path, version } => {
            output::success("Encoder available");
            output::kv("Path", path.display());
            output::kv("Version", version);
        }
        EncoderAvailability::Fallback { launcher, package } => {
            output::warning("No local encoder; it will be run through npx");
            output::kv("Launcher", launcher.display());
            output::kv("Package", package);
        }
        EncoderAvailability::Missing { reason } => {
            output::error("Encoder not available");
            output::kv("Reason", reason);
            output::info(format!(
                "Install the TOON CLI or point {} at it",
                janusz_core::config::ENV_TOON_PATH
            ));
        }
    }
    output::kv("Timeout", format!("{}s", config.encoder.timeout_secs));

    Ok(availability.is_usable())
}
