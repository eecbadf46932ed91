//! Janusz CLI - convert documents into structured records.
//!
//! # Usage
//!
//! ```bash
//! # Convert everything under ./new into YAML records
//! janusz convert
//!
//! # Convert one file to JSON next to a records directory
//! janusz convert guide.pdf -o records --output json
//!
//! # Compress existing records with the TOON encoder
//! janusz toon records --stats
//!
//! # Check whether the encoder is installed
//! janusz probe
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use janusz_cli::commands::{self, convert::ConvertArgs, toon::ToonArgs, DEFAULT_INPUT_DIR};
use janusz_cli::{output, OutputFormat};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "janusz")]
#[command(about = "Janusz - convert documents into structured records", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (human, json, plain)
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
    Plain,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Plain => OutputFormat::Plain,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RecordFormatArg {
    Yaml,
    Json,
}

impl From<RecordFormatArg> for janusz_core::OutputFormat {
    fn from(arg: RecordFormatArg) -> Self {
        match arg {
            RecordFormatArg::Yaml => janusz_core::OutputFormat::Yaml,
            RecordFormatArg::Json => janusz_core::OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert documents into Document Records
    Convert {
        /// File or directory to convert
        #[arg(default_value = DEFAULT_INPUT_DIR)]
        path: PathBuf,

        /// Directory for the records (default: beside each input)
        #[arg(short = 'o', long = "output-dir")]
        output_dir: Option<PathBuf>,

        /// Record format
        #[arg(long = "output", value_enum)]
        record_format: Option<RecordFormatArg>,

        /// Also compress each record with the TOON encoder
        #[arg(long)]
        toon: bool,

        /// Only convert files directly inside the directory
        #[arg(long)]
        no_recursive: bool,
    },

    /// Compress existing records with the TOON encoder
    Toon {
        /// Record file or directory of records
        #[arg(default_value = DEFAULT_INPUT_DIR)]
        path: PathBuf,

        /// Skip decoding the output back to JSON
        #[arg(long)]
        no_validate: bool,

        /// Report token statistics
        #[arg(long)]
        stats: bool,

        /// Only encode records directly inside the directory
        #[arg(long)]
        no_recursive: bool,
    },

    /// Report whether the TOON encoder can be run
    Probe,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file location
    Path,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            output::error(format!("{:#}", e));
            process::exit(1);
        }
    }
}

async fn run() -> Result<bool> {
    let cli = Cli::parse();

    let format = OutputFormat::from(cli.format);
    format.apply();

    let config_path = cli.config.as_deref();
    let verbose = cli.verbose;

    match cli.command {
        Commands::Convert {
            path,
            output_dir,
            record_format,
            toon,
            no_recursive,
        } => {
            let config = load_config(config_path, verbose).await?;
            let args = ConvertArgs {
                path,
                output_dir,
                record_format: record_format.map(Into::into),
                toon,
                no_recursive,
            };
            commands::convert::run(config, args, format).await
        }

        Commands::Toon {
            path,
            no_validate,
            stats,
            no_recursive,
        } => {
            let config = load_config(config_path, verbose).await?;
            let args = ToonArgs {
                path,
                no_validate,
                stats,
                no_recursive,
            };
            commands::toon::run(config, args, format).await
        }

        Commands::Probe => {
            let config = load_config(config_path, verbose).await?;
            commands::probe::run(&config, format).await
        }

        // These must work even when the configuration file does not parse
        Commands::Config(config_cmd) => {
            init_logging(verbose, None);
            match config_cmd {
                ConfigCommands::Show => commands::config::show(config_path, format).await,
                ConfigCommands::Init { force } => {
                    commands::config::init(config_path, force, format).await
                }
                ConfigCommands::Path => commands::config::path(config_path, format),
            }
        }
    }
}

/// Load configuration, then start logging at its level
async fn load_config(
    path: Option<&std::path::Path>,
    verbose: bool,
) -> Result<janusz_core::JanuszConfig> {
    let config = commands::load_config(path).await?;
    init_logging(verbose, Some(&config.general.log_level));
    Ok(config)
}

fn init_logging(verbose: bool, level: Option<&str>) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    const CRATES: &[&str] = &[
        "janusz",
        "janusz_cli",
        "janusz_core",
        "janusz_ingestion",
        "janusz_toon",
    ];
    let directives = |level: &str| {
        let mut parts: Vec<String> = CRATES.iter().map(|c| format!("{}={}", c, level)).collect();
        parts.push("warn".to_string());
        parts.join(",")
    };

    let filter = if verbose {
        EnvFilter::new(directives("debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(directives(level.unwrap_or("warn"))))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
