//! Janusz command line interface.

pub mod commands;
pub mod output;

pub use output::OutputFormat;
