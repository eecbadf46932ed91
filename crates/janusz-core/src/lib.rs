//! Core types for the Janusz document converter.
//!
//! This crate provides the Document Record data model, the source format
//! enumeration, configuration, and the error type shared by every Janusz
//! component.

pub mod config;
pub mod error;
pub mod format;
pub mod record;

pub use config::{ConversionConfig, EncoderConfig, GeneralConfig, JanuszConfig, OutputFormat};
pub use error::{JanuszError, Result};
pub use format::SourceFormat;
pub use record::{
    converter_identity, Analysis, ConfidenceLevel, DocumentRecord, ExtractionItem, RecordContent,
    RecordMetadata, Section, FORMAT_VERSION, PARSER_VERSION,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{JanuszConfig, OutputFormat};
    pub use crate::error::{JanuszError, Result};
    pub use crate::format::SourceFormat;
    pub use crate::record::*;
}
