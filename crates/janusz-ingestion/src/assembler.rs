//! Record assembler: combines metadata, the section tree and the analysis
//! into a validated [`DocumentRecord`]. Performs no I/O.

use janusz_core::{
    converter_identity, Analysis, DocumentRecord, JanuszError, RecordContent, RecordMetadata,
    Result, Section, SourceFormat, FORMAT_VERSION, PARSER_VERSION,
};
use std::path::Path;

/// Everything the assembler needs for one document
#[derive(Debug, Clone)]
pub struct RecordParts<'a> {
    pub source: &'a Path,
    pub format: SourceFormat,
    /// Title declared by the document itself
    pub declared_title: Option<String>,
    pub sections: Vec<Section>,
    pub raw_text: String,
    pub structured_data: Option<serde_json::Value>,
    pub analysis: Analysis,
}

#[derive(Debug, Clone)]
pub struct RecordAssembler {
    converted_by: String,
    stamp_time: bool,
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self {
            converted_by: converter_identity(),
            stamp_time: true,
        }
    }

    /// Assembler that leaves `created_at` empty, for reproducible output
    pub fn without_timestamp() -> Self {
        Self {
            stamp_time: false,
            ..Self::new()
        }
    }

    fn created_at(&self) -> Option<String> {
        self.stamp_time
            .then(|| chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }

    /// Build and validate a fresh record
    pub fn assemble(&self, parts: RecordParts<'_>) -> Result<DocumentRecord> {
        let source = parts.source.to_string_lossy().into_owned();
        if source.trim().is_empty() {
            return Err(JanuszError::schema("source path is empty"));
        }

        let title = resolve_title(parts.declared_title.as_deref(), &parts.sections, parts.source)
            .ok_or_else(|| {
                JanuszError::schema(format!("cannot determine a title for {}", source))
            })?;

        let record = DocumentRecord {
            metadata: RecordMetadata {
                title,
                source,
                source_type: parts.format,
                converted_by: self.converted_by.clone(),
                format_version: FORMAT_VERSION.to_string(),
                created_at: self.created_at(),
                parser_version: PARSER_VERSION.to_string(),
            },
            content: RecordContent {
                sections: parts.sections,
                raw_text: parts.raw_text,
                structured_data: parts.structured_data,
            },
            analysis: parts.analysis,
        };

        record.validate()?;
        Ok(record)
    }

    /// Revalidate a record read back from disk and stamp this converter on it
    pub fn restamp(&self, mut record: DocumentRecord) -> Result<DocumentRecord> {
        record.metadata.converted_by = self.converted_by.clone();
        record.metadata.format_version = FORMAT_VERSION.to_string();
        record.metadata.parser_version = PARSER_VERSION.to_string();
        record.metadata.created_at = self.created_at();

        record.validate()?;
        Ok(record)
    }
}

impl Default for RecordAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Declared title, else the first heading, else the file stem
fn resolve_title(declared: Option<&str>, sections: &[Section], source: &Path) -> Option<String> {
    if let Some(title) = declared.map(str::trim).filter(|t| !t.is_empty()) {
        return Some(title.to_string());
    }

    let mut heading = None;
    for root in sections {
        root.walk(&mut |section, _| {
            if heading.is_none() && !section.title.trim().is_empty() {
                heading = Some(section.title.trim().to_string());
            }
        });
    }
    if heading.is_some() {
        return heading;
    }

    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use janusz_core::{ConfidenceLevel, ExtractionItem};
    use std::path::PathBuf;

    fn parts<'a>(source: &'a Path, sections: Vec<Section>) -> RecordParts<'a> {
        RecordParts {
            source,
            format: SourceFormat::Text,
            declared_title: None,
            sections,
            raw_text: "body".into(),
            structured_data: None,
            analysis: Analysis::default(),
        }
    }

    fn titled(id: &str, title: &str) -> Section {
        Section {
            id: id.into(),
            title: title.into(),
            level: 1,
            ..Section::default()
        }
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let path = PathBuf::from("inbox/meeting-notes.txt");
        let record = RecordAssembler::new()
            .assemble(parts(&path, vec![titled("section_0", "")]))
            .unwrap();

        assert_eq!(record.metadata.title, "meeting-notes");
        assert_eq!(record.metadata.source, "inbox/meeting-notes.txt");
        assert_eq!(record.metadata.format_version, FORMAT_VERSION);
        assert!(record.metadata.created_at.is_some());
    }

    #[test]
    fn test_title_prefers_declared_then_heading() {
        let path = PathBuf::from("guide.md");
        let assembler = RecordAssembler::without_timestamp();

        let mut with_declared = parts(&path, vec![titled("section_0", "Heading")]);
        with_declared.declared_title = Some("Declared".into());
        assert_eq!(assembler.assemble(with_declared).unwrap().metadata.title, "Declared");

        let from_heading = parts(&path, vec![titled("section_0", "Heading")]);
        let record = assembler.assemble(from_heading).unwrap();
        assert_eq!(record.metadata.title, "Heading");
        assert!(record.metadata.created_at.is_none());
    }

    #[test]
    fn test_empty_source_is_schema_error() {
        let path = PathBuf::new();
        let err = RecordAssembler::new().assemble(parts(&path, vec![])).unwrap_err();
        assert!(err.is_schema_validation());
    }

    #[test]
    fn test_dangling_item_rejected() {
        let path = PathBuf::from("a.txt");
        let mut input = parts(&path, vec![titled("section_0", "A")]);
        input.analysis.examples.push(ExtractionItem {
            text: "x".into(),
            source_section_id: Some("section_7".into()),
            tags: vec![],
            confidence_level: ConfidenceLevel::Low,
        });
        assert!(RecordAssembler::new().assemble(input).unwrap_err().is_schema_validation());
    }

    #[test]
    fn test_restamp_keeps_content() {
        let path = PathBuf::from("a.txt");
        let assembler = RecordAssembler::without_timestamp();
        let mut record = assembler.assemble(parts(&path, vec![titled("section_0", "A")])).unwrap();
        record.metadata.converted_by = "someone else".into();

        let restamped = RecordAssembler::new().restamp(record.clone()).unwrap();
        assert_eq!(restamped.content, record.content);
        assert_eq!(restamped.metadata.converted_by, converter_identity());
    }
}
