//! Conversion pipeline for Janusz.
//!
//! Format readers extract text and structural hints, the structure parser
//! builds the section tree, the classifier scores content lines, and the
//! assembler and serializer produce the Document Record on disk.
//! [`converter::DocumentConverter`] ties the stages together.

pub mod assembler;
pub mod classifier;
pub mod converter;
pub mod readers;
pub mod serializer;
pub mod structure;

pub use assembler::{RecordAssembler, RecordParts};
pub use classifier::ContentClassifier;
pub use classifier::{Category, Rule, RuleScope, RuleTable};
pub use converter::{BatchReport, ConversionOutcome, DocumentConverter, FileFailure};
pub use readers::{
    read_bytes, read_document, ExtractedText, FormatReader, StructuralHint, StructureMode,
};
pub use serializer::{output_path, parse_record, RecordWriter};
pub use structure::StructureParser;

pub mod prelude {
    pub use crate::converter::{BatchReport, DocumentConverter};
    pub use crate::readers::{read_document, ExtractedText, FormatReader};
    pub use crate::{ContentClassifier, RecordAssembler, StructureParser};
}
