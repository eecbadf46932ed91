//! Terminal output helpers for the Janusz CLI.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt::Display;
use std::time::Duration;

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Styled output for people
    Human,
    /// A single JSON document on stdout
    Json,
    /// Output without colors or spinners
    Plain,
}

impl OutputFormat {
    /// Configure the terminal for this format
    pub fn apply(&self) {
        if *self != Self::Human {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
    }

    pub fn is_json(&self) -> bool {
        *self == Self::Json
    }
}

pub fn success(msg: impl Display) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn error(msg: impl Display) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

pub fn warning(msg: impl Display) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

pub fn info(msg: impl Display) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a section header
pub fn header(msg: impl Display) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: impl Display, value: impl Display) {
    println!("  {}: {}", style(key).cyan(), value);
}

/// Spinner for work of unknown length; hidden unless output is for people
pub fn spinner(msg: impl Into<String>, format: OutputFormat) -> ProgressBar {
    if format != OutputFormat::Human {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .expect("spinner template"),
    );
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Table with the CLI's standard look
pub struct TableBuilder {
    table: Table,
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        Self { table }
    }

    pub fn header<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String> + Display,
    {
        let row: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect();
        self.table.set_header(row);
        self
    }

    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String> + Display,
    {
        let row: Vec<Cell> = cells.into_iter().map(Cell::new).collect();
        self.table.add_row(row);
        self
    }

    pub fn build(self) -> Table {
        self.table
    }

    pub fn print(self) {
        println!("{}", self.table);
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a duration for summaries
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print serializable data as pretty JSON
pub fn output<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}
