//! The Document Record data model.
//!
//! A record is produced once per input file and is never mutated after it
//! has been written. Field order in these structs is the field order of the
//! serialized YAML/JSON output.

use crate::error::{JanuszError, Result};
use crate::format::SourceFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Version of the record schema written into `metadata.format_version`.
pub const FORMAT_VERSION: &str = "1.1.0";

/// Version of the structural parser written into `metadata.parser_version`.
pub const PARSER_VERSION: &str = "1.1.0";

/// Converter identity written into `metadata.converted_by`.
pub fn converter_identity() -> String {
    format!("janusz {}", env!("CARGO_PKG_VERSION"))
}

/// Structured representation of one converted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub metadata: RecordMetadata,
    pub content: RecordContent,
    #[serde(default)]
    pub analysis: Analysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub title: String,
    pub source: String,
    pub source_type: SourceFormat,
    #[serde(default = "converter_identity")]
    pub converted_by: String,
    #[serde(default = "default_format_version")]
    pub format_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default = "default_parser_version")]
    pub parser_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordContent {
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub raw_text: String,
    /// Parsed value of an opaque JSON/YAML input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<serde_json::Value>,
}

/// A node of the section tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Heading depth, 0 for the implicit untitled section
    #[serde(default)]
    pub level: usize,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub subsections: Vec<Section>,
}

impl Section {
    /// Visit this section and its descendants in document order
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Section, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut dyn FnMut(&'a Section, usize)) {
        visit(self, depth);
        for child in &self.subsections {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Text of the section's direct content, lines joined by `\n`
    pub fn text(&self) -> String {
        self.content.join("\n")
    }

    /// Whether the section holds no non-blank line of its own
    pub fn is_blank(&self) -> bool {
        self.content.iter().all(|line| line.trim().is_empty())
    }
}

/// Classifier output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub keywords: Vec<ExtractionItem>,
    #[serde(default)]
    pub best_practices: Vec<ExtractionItem>,
    #[serde(default)]
    pub examples: Vec<ExtractionItem>,
}

impl Analysis {
    /// Total number of extracted items across categories
    pub fn len(&self) -> usize {
        self.keywords.len() + self.best_practices.len() + self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn items(&self) -> impl Iterator<Item = &ExtractionItem> {
        self.keywords
            .iter()
            .chain(self.best_practices.iter())
            .chain(self.examples.iter())
    }
}

/// One keyword, best practice or example found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_section_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub confidence_level: ConfidenceLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl DocumentRecord {
    /// Visit every section of the tree in document order with its depth
    pub fn walk_sections<'a>(&'a self, mut visit: impl FnMut(&'a Section, usize)) {
        for section in &self.content.sections {
            section.walk(&mut visit);
        }
    }

    /// Look up a section anywhere in the tree by id
    pub fn find_section(&self, id: &str) -> Option<&Section> {
        let mut found = None;
        self.walk_sections(|section, _| {
            if found.is_none() && section.id == id {
                found = Some(section);
            }
        });
        found
    }

    /// Total number of sections in the tree
    pub fn section_count(&self) -> usize {
        let mut count = 0;
        self.walk_sections(|_, _| count += 1);
        count
    }

    /// Check the structural invariants of the record
    pub fn validate(&self) -> Result<()> {
        if self.metadata.source.trim().is_empty() {
            return Err(JanuszError::schema("metadata.source is empty"));
        }
        if self.metadata.title.trim().is_empty() {
            return Err(JanuszError::schema("metadata.title is empty"));
        }
        if self.metadata.format_version.trim().is_empty() {
            return Err(JanuszError::schema("metadata.format_version is empty"));
        }

        let mut ids = HashSet::new();
        let mut duplicate = None;
        self.walk_sections(|section, _| {
            if !ids.insert(section.id.as_str()) && duplicate.is_none() {
                duplicate = Some(section.id.clone());
            }
        });
        if let Some(id) = duplicate {
            return Err(JanuszError::schema(format!("duplicate section id {:?}", id)));
        }

        for item in self.analysis.items() {
            if let Some(id) = &item.source_section_id {
                if !ids.contains(id.as_str()) {
                    return Err(JanuszError::schema(format!(
                        "extraction item {:?} references unknown section {:?}",
                        item.text, id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Copy of the record without the fields that change between runs
    pub fn without_run_stamp(&self) -> Self {
        let mut record = self.clone();
        record.metadata.created_at = None;
        record.metadata.converted_by = String::new();
        record.metadata.parser_version = String::new();
        record
    }
}

fn default_format_version() -> String {
    FORMAT_VERSION.to_string()
}

fn default_parser_version() -> String {
    PARSER_VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, title: &str, level: usize, subsections: Vec<Section>) -> Section {
        Section {
            id: id.into(),
            title: title.into(),
            level,
            content: vec![format!("{} body", title)],
            subsections,
        }
    }

    fn record(sections: Vec<Section>) -> DocumentRecord {
        DocumentRecord {
            metadata: RecordMetadata {
                title: "Guide".into(),
                source: "docs/guide.md".into(),
                source_type: SourceFormat::Markdown,
                converted_by: converter_identity(),
                format_version: FORMAT_VERSION.into(),
                created_at: None,
                parser_version: PARSER_VERSION.into(),
            },
            content: RecordContent {
                sections,
                raw_text: "text".into(),
                structured_data: None,
            },
            analysis: Analysis::default(),
        }
    }

    #[test]
    fn test_walk_is_document_order() {
        let rec = record(vec![
            section("section_0", "A", 1, vec![section("section_1", "A.1", 2, vec![])]),
            section("section_2", "B", 1, vec![]),
        ]);

        let mut seen = Vec::new();
        rec.walk_sections(|s, depth| seen.push((s.title.clone(), depth)));
        assert_eq!(
            seen,
            vec![("A".to_string(), 0), ("A.1".to_string(), 1), ("B".to_string(), 0)]
        );
        assert_eq!(rec.section_count(), 3);
        assert_eq!(rec.find_section("section_1").map(|s| s.title.as_str()), Some("A.1"));
    }

    #[test]
    fn test_validate_rejects_dangling_reference() {
        let mut rec = record(vec![section("section_0", "A", 1, vec![])]);
        rec.analysis.examples.push(ExtractionItem {
            text: "foo()".into(),
            source_section_id: Some("section_9".into()),
            tags: vec!["example".into()],
            confidence_level: ConfidenceLevel::High,
        });

        let err = rec.validate().unwrap_err();
        assert!(err.is_schema_validation());
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let rec = record(vec![
            section("section_0", "A", 1, vec![]),
            section("section_0", "B", 1, vec![]),
        ]);
        assert!(rec.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_source() {
        let mut rec = record(vec![]);
        rec.metadata.source = "  ".into();
        assert!(rec.validate().unwrap_err().is_schema_validation());
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(ConfidenceLevel::High > ConfidenceLevel::Medium);
        assert!(ConfidenceLevel::Medium > ConfidenceLevel::Low);
    }

    #[test]
    fn test_minimal_record_deserializes_with_defaults() {
        let json = r#"{
            "metadata": {"title": "T", "source": "t.txt", "source_type": "text"},
            "content": {"raw_text": "hello"}
        }"#;
        let rec: DocumentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.metadata.format_version, FORMAT_VERSION);
        assert!(rec.content.sections.is_empty());
        assert!(rec.analysis.is_empty());
    }

    #[test]
    fn test_without_run_stamp_clears_volatile_fields() {
        let mut rec = record(vec![]);
        rec.metadata.created_at = Some("2026-01-01T00:00:00Z".into());
        let stripped = rec.without_run_stamp();
        assert!(stripped.metadata.created_at.is_none());
        assert_eq!(stripped.metadata.title, "Guide");
    }
}
