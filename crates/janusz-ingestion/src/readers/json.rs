//! JSON reader.
//!
//! A JSON document that already is a serialized Document Record is handed
//! back as-is. Any other value is kept whole as opaque structured data.

use super::txt::normalize_text;
use super::{decode_utf8, ExtractedText, FormatReader, StructureMode};
use janusz_core::{DocumentRecord, JanuszError, Result, SourceFormat};
use serde_json::Value;

/// Reader for JSON documents
pub struct JsonReader;

impl JsonReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Title-like top-level field of an object
pub(crate) fn declared_title(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    ["title", "name"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

/// Wrap a parsed structured value, recognizing serialized records
pub(crate) fn structured_text(format: SourceFormat, text: String, value: Value) -> ExtractedText {
    if value.get("metadata").is_some() && value.get("content").is_some() {
        match serde_json::from_value::<DocumentRecord>(value.clone()) {
            Ok(record) => {
                tracing::debug!("Input is a serialized Document Record");
                let raw_text = record.content.raw_text.clone();
                let title = Some(record.metadata.title.clone());
                return ExtractedText::new(format, raw_text)
                    .with_mode(StructureMode::Opaque)
                    .with_title(title)
                    .with_record(record);
            }
            Err(e) => tracing::debug!("Record-shaped input does not match the schema: {}", e),
        }
    }

    let title = declared_title(&value);
    ExtractedText::new(format, text)
        .with_mode(StructureMode::Opaque)
        .with_title(title)
        .with_structured_data(value)
}

impl FormatReader for JsonReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn read_bytes(&self, input: &[u8]) -> Result<ExtractedText> {
        tracing::debug!("Reading JSON document ({} bytes)", input.len());

        let text = normalize_text(&decode_utf8(input));
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| JanuszError::extraction(format!("Failed to parse JSON: {}", e)))?;

        Ok(structured_text(SourceFormat::Json, text, value))
    }
}
