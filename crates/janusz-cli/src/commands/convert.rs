//! `janusz convert`: turn documents into Document Records.

use super::toon::{encode_records, print_encoded, ToonSummary};
use super::{print_failures, print_summary, FailureRow, DEFAULT_INPUT_DIR};
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use janusz_core::JanuszConfig;
use janusz_ingestion::{BatchReport, DocumentConverter};
use janusz_toon::EncodeOptions;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ConvertArgs {
    pub path: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub record_format: Option<janusz_core::OutputFormat>,
    pub toon: bool,
    pub no_recursive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertedRow {
    pub source: PathBuf,
    pub output: PathBuf,
    pub title: String,
    pub sections: usize,
    pub keywords: usize,
    pub best_practices: usize,
    pub examples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    pub converted: Vec<ConvertedRow>,
    pub failures: Vec<FailureRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toon: Option<ToonSummary>,
}

impl From<&BatchReport> for ConvertSummary {
    fn from(report: &BatchReport) -> Self {
        Self {
            converted: report
                .converted
                .iter()
                .map(|outcome| {
                    let analysis = &outcome.record.analysis;
                    ConvertedRow {
                        source: outcome.source.clone(),
                        output: outcome.output.clone(),
                        title: outcome.record.metadata.title.clone(),
                        sections: outcome.record.section_count(),
                        keywords: analysis.keywords.len(),
                        best_practices: analysis.best_practices.len(),
                        examples: analysis.examples.len(),
                    }
                })
                .collect(),
            failures: report
                .failures
                .iter()
                .map(|failure| FailureRow {
                    path: failure.path.clone(),
                    kind: failure.kind.clone(),
                    message: failure.message.clone(),
                })
                .collect(),
            toon: None,
        }
    }
}

impl ConvertSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.toon.as_ref().is_none_or(ToonSummary::is_success)
    }
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut JanuszConfig, args: &ConvertArgs) {
    if let Some(dir) = &args.output_dir {
        config.conversion.output_dir = Some(dir.clone());
    }
    if let Some(record_format) = args.record_format {
        config.conversion.output_format = record_format;
    }
    if args.no_recursive {
        config.conversion.recursive = false;
    }
}

pub async fn run(mut config: JanuszConfig, args: ConvertArgs, format: OutputFormat) -> Result<bool> {
    apply_overrides(&mut config, &args);

    let path = args.path.clone();
    if !path.exists() && path == PathBuf::from(DEFAULT_INPUT_DIR) {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        if !format.is_json() {
            output::info(format!(
                "Created {}; place documents there and run again",
                path.display()
            ));
        }
    }

    let started = Instant::now();
    let pb = output::spinner(format!("Converting {}...", path.display()), format);
    let converter = DocumentConverter::new(&config.conversion);
    let report = tokio::task::spawn_blocking(move || converter.convert_path(&path))
        .await
        .context("Conversion task panicked")??;
    pb.finish_and_clear();

    let mut summary = ConvertSummary::from(&report);

    if args.toon && !report.converted.is_empty() {
        let records: Vec<PathBuf> = report.outputs().map(PathBuf::from).collect();
        let options = EncodeOptions::from(&config.encoder);
        summary.toon = Some(encode_records(&config, &records, options, format).await?);
    }

    if format.is_json() {
        output::output(&summary)?;
        return Ok(summary.is_success());
    }

    if summary.converted.is_empty() && summary.failures.is_empty() {
        output::info(format!("No documents found in {}", args.path.display()));
        return Ok(true);
    }

    output::header("Conversion");
    for row in &summary.converted {
        output::success(format!("{} -> {}", row.source.display(), row.output.display()));
        output::kv("Title", &row.title);
        output::kv(
            "Sections / keywords / practices / examples",
            format!(
                "{} / {} / {} / {}",
                row.sections, row.keywords, row.best_practices, row.examples
            ),
        );
    }
    print_failures(&summary.failures);
    print_summary(
        &format!("Conversion in {}", output::format_duration(started.elapsed())),
        summary.converted.len(),
        summary.failures.len(),
        format,
    );

    if let Some(toon) = &summary.toon {
        output::header("TOON encoding");
        print_encoded(toon);
        print_summary("Encoding", toon.encoded.len(), toon.failures.len(), format);
    }

    Ok(summary.is_success())
}
