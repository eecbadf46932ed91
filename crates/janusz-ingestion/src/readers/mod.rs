//! Format readers.
//!
//! Each reader turns the bytes of one source format into an [`ExtractedText`]:
//! the full text, structural hints for the parser, and an optional title.
//! The set of formats is closed ([`SourceFormat`]); [`read_document`] and
//! [`read_bytes`] dispatch on it.

use janusz_core::{DocumentRecord, JanuszError, Result, SourceFormat};
use std::path::Path;
use tracing::debug;

pub mod docx;
pub mod html;
pub mod json;
pub mod markdown;
pub mod pdf;
pub mod txt;
pub mod yaml;

pub use docx::DocxReader;
pub use html::HtmlReader;
pub use json::JsonReader;
pub use markdown::MarkdownReader;
pub use pdf::PdfReader;
pub use txt::TxtReader;
pub use yaml::YamlReader;

/// A structural hint attached to a line of the extracted text.
///
/// Line numbers are zero-based indexes into `raw_text.split('\n')`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralHint {
    /// Lines `line..=end_line` form a heading of the given depth
    Heading {
        line: usize,
        end_line: usize,
        level: usize,
        title: String,
    },
    /// A new page starts at `line`
    PageBreak { line: usize, page: u32 },
    /// Lines `line..=end_line` carry no document content (front matter)
    Ignore { line: usize, end_line: usize },
}

/// How the structural parser should find headings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureMode {
    /// Only the `Heading` hints are headings
    Explicit,
    /// Detect headings from the shape of the lines
    Heuristic,
    /// The text has no section structure at all
    Opaque,
}

/// Output of a format reader
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub format: SourceFormat,
    pub raw_text: String,
    pub hints: Vec<StructuralHint>,
    pub mode: StructureMode,
    /// Title declared by the document itself
    pub title: Option<String>,
    /// Parsed value of structured inputs (JSON/YAML)
    pub structured_data: Option<serde_json::Value>,
    /// The input already was a serialized Document Record
    pub record: Option<DocumentRecord>,
}

impl ExtractedText {
    /// Create extracted text that is segmented heuristically
    pub fn new(format: SourceFormat, raw_text: String) -> Self {
        Self {
            format,
            raw_text,
            hints: Vec::new(),
            mode: StructureMode::Heuristic,
            title: None,
            structured_data: None,
            record: None,
        }
    }

    pub fn with_hints(mut self, hints: Vec<StructuralHint>) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_mode(mut self, mode: StructureMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    pub fn with_structured_data(mut self, data: serde_json::Value) -> Self {
        self.structured_data = Some(data);
        self
    }

    pub fn with_record(mut self, record: DocumentRecord) -> Self {
        self.record = Some(record);
        self
    }

    /// Number of heading hints
    pub fn heading_count(&self) -> usize {
        self.hints
            .iter()
            .filter(|hint| matches!(hint, StructuralHint::Heading { .. }))
            .count()
    }
}

/// Uniform capability of every format reader
pub trait FormatReader: Send + Sync {
    /// The format this reader handles
    fn format(&self) -> SourceFormat;

    /// Extract text and hints from the raw bytes of a document
    fn read_bytes(&self, input: &[u8]) -> Result<ExtractedText>;

    /// Read and extract a document from disk
    fn read(&self, path: &Path) -> Result<ExtractedText> {
        let bytes = std::fs::read(path)?;
        self.read_bytes(&bytes)
    }
}

/// Extract the document at `path`, detecting its format from the extension
pub fn read_document(path: &Path) -> Result<ExtractedText> {
    let format = SourceFormat::from_path(path)?;
    debug!("Reading {:?} as {}", path, format);
    let bytes = std::fs::read(path)?;
    read_bytes(format, &bytes)
}

/// Extract a document of a known format from memory
pub fn read_bytes(format: SourceFormat, input: &[u8]) -> Result<ExtractedText> {
    match format {
        SourceFormat::Pdf => PdfReader::new().read_bytes(input),
        SourceFormat::Markdown => MarkdownReader::new().read_bytes(input),
        SourceFormat::Text => TxtReader::new().read_bytes(input),
        SourceFormat::Docx => DocxReader::new().read_bytes(input),
        SourceFormat::Html => HtmlReader::new().read_bytes(input),
        SourceFormat::Json => JsonReader::new().read_bytes(input),
        SourceFormat::Yaml => YamlReader::new().read_bytes(input),
    }
}

/// Decode input as UTF-8, replacing invalid sequences
pub(crate) fn decode_utf8(input: &[u8]) -> String {
    match std::str::from_utf8(input) {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(input).into_owned(),
    }
}

/// Map byte offsets of `text` to zero-based line numbers
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));
        Self { starts }
    }

    pub(crate) fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        }
    }
}

/// Error for a format whose reader is compiled out
#[allow(dead_code)]
pub(crate) fn feature_disabled(format: SourceFormat, dependency: &str, feature: &str) -> JanuszError {
    JanuszError::optional_dependency(format.as_str().to_uppercase(), dependency, feature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index() {
        let text = "one\ntwo\n\nfour";
        let index = LineIndex::new(text);
        assert_eq!(index.line_of(0), 0);
        assert_eq!(index.line_of(2), 0);
        assert_eq!(index.line_of(4), 1);
        assert_eq!(index.line_of(8), 2);
        assert_eq!(index.line_of(9), 3);
    }

    #[test]
    fn test_read_document_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xyz");
        std::fs::write(&path, "content").unwrap();

        let err = read_document(&path).unwrap_err();
        assert!(err.is_unsupported_format());
    }

    #[test]
    fn test_decode_utf8_lossy() {
        assert_eq!(decode_utf8(b"plain"), "plain");
        assert!(decode_utf8(&[b'a', 0xff, b'b']).contains('\u{fffd}'));
    }

    #[test]
    fn test_with_title_drops_blank() {
        let text = ExtractedText::new(SourceFormat::Text, String::new())
            .with_title(Some("   ".to_string()));
        assert!(text.title.is_none());
    }
}
