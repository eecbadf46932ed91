//! `janusz toon`: compress records with the external TOON encoder.

use super::{print_failures, print_summary, FailureRow, DEFAULT_INPUT_DIR};
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use janusz_core::JanuszConfig;
use janusz_toon::{collect_records, probe, EncodeOptions, EncodeReport, ProbeOptions, ToonEncoder};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ToonArgs {
    pub path: PathBuf,
    pub no_validate: bool,
    pub stats: bool,
    pub no_recursive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EncodedRow {
    pub source: PathBuf,
    pub output: PathBuf,
    pub validated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToonSummary {
    pub encoder: String,
    pub encoded: Vec<EncodedRow>,
    pub failures: Vec<FailureRow>,
}

impl ToonSummary {
    fn from_report(encoder: &ToonEncoder, report: EncodeReport) -> Self {
        Self {
            encoder: encoder.availability().to_string(),
            encoded: report
                .encoded
                .into_iter()
                .map(|outcome| EncodedRow {
                    source: outcome.source,
                    output: outcome.output,
                    validated: outcome.validated,
                    stats: outcome.stats,
                })
                .collect(),
            failures: report
                .failures
                .into_iter()
                .map(|failure| FailureRow {
                    path: failure.path,
                    kind: failure.kind,
                    message: failure.message,
                })
                .collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Probe the encoder once, then encode every record in `records`
pub async fn encode_records(
    config: &JanuszConfig,
    records: &[PathBuf],
    options: EncodeOptions,
    format: OutputFormat,
) -> Result<ToonSummary> {
    let pb = output::spinner("Probing TOON encoder...", format);
    let availability = probe(&ProbeOptions::from_config(&config.encoder)).await;
    pb.finish_and_clear();

    let encoder = ToonEncoder::new(
        availability,
        Duration::from_secs(config.encoder.timeout_secs),
    )?;
    tracing::info!("Using TOON encoder {}", encoder.availability());

    let pb = output::spinner(format!("Encoding {} records...", records.len()), format);
    let report = encoder.process_batch(records, options).await;
    pb.finish_and_clear();

    Ok(ToonSummary::from_report(&encoder, report))
}

/// Human-readable listing of an encoding run
pub fn print_encoded(summary: &ToonSummary) {
    output::kv("Encoder", &summary.encoder);
    for row in &summary.encoded {
        let check = if row.validated { " (validated)" } else { "" };
        output::success(format!(
            "{} -> {}{}",
            row.source.display(),
            row.output.display(),
            check
        ));
        if let Some(stats) = &row.stats {
            output::kv("Stats", stats);
        }
    }
    print_failures(&summary.failures);
}

pub async fn run(config: JanuszConfig, args: ToonArgs, format: OutputFormat) -> Result<bool> {
    let records = if args.path.is_dir() {
        collect_records(&args.path, !args.no_recursive)?
    } else if args.path.is_file() {
        vec![args.path.clone()]
    } else if args.path == PathBuf::from(DEFAULT_INPUT_DIR) {
        Vec::new()
    } else {
        bail!("{} does not exist", args.path.display());
    };

    if records.is_empty() {
        if format.is_json() {
            output::output(&serde_json::json!({ "encoded": [], "failures": [] }))?;
        } else {
            output::info(format!("No records found in {}", args.path.display()));
        }
        return Ok(true);
    }

    let options = EncodeOptions {
        validate: config.encoder.validate_output && !args.no_validate,
        stats: config.encoder.collect_stats || args.stats,
    };

    let summary = encode_records(&config, &records, options, format).await?;
    if format.is_json() {
        output::output(&summary)?;
    } else {
        output::header("TOON encoding");
        print_encoded(&summary);
    }
    print_summary(
        "Encoding",
        summary.encoded.len(),
        summary.failures.len(),
        format,
    );

    Ok(summary.is_success())
}
