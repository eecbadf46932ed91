//! YAML reader.

use super::json::structured_text;
use super::txt::normalize_text;
use super::{decode_utf8, ExtractedText, FormatReader};
use janusz_core::{JanuszError, Result, SourceFormat};
use serde_json::Value;

/// Reader for YAML documents
pub struct YamlReader;

impl YamlReader {
    pub fn new() -> Self {
        Self
    }

    /// Convert YAML into JSON, dropping tags and stringifying non-string keys
    fn to_json(value: serde_yaml::Value) -> Result<Value> {
        use serde_yaml::Value as Yaml;

        Ok(match value {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => Value::Bool(b),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    Value::from(u)
                } else {
                    n.as_f64()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
            }
            Yaml::String(s) => Value::String(s),
            Yaml::Sequence(items) => Value::Array(
                items
                    .into_iter()
                    .map(Self::to_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Yaml::Mapping(map) => {
                let mut out = serde_json::Map::new();
                for (key, item) in map {
                    let key = match key {
                        Yaml::String(s) => s,
                        Yaml::Number(n) => n.to_string(),
                        Yaml::Bool(b) => b.to_string(),
                        Yaml::Null => "null".to_string(),
                        other => serde_yaml::to_string(&other)?.trim_end().to_string(),
                    };
                    out.insert(key, Self::to_json(item)?);
                }
                Value::Object(out)
            }
            Yaml::Tagged(tagged) => Self::to_json(tagged.value)?,
        })
    }
}

impl Default for YamlReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatReader for YamlReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Yaml
    }

    fn read_bytes(&self, input: &[u8]) -> Result<ExtractedText> {
        tracing::debug!("Reading YAML document ({} bytes)", input.len());

        let text = normalize_text(&decode_utf8(input));
        let value: serde_yaml::Value = serde_yaml::from_str(&text)
            .map_err(|e| JanuszError::extraction(format!("Failed to parse YAML: {}", e)))?;

        let json = Self::to_json(value)?;
        Ok(structured_text(SourceFormat::Yaml, text, json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::StructureMode;

    #[test]
    fn test_yaml_reader_opaque_value() {
        let input = b"title: Deployment notes\nsteps:\n  - build\n  - ship\n";
        let text = YamlReader::new().read_bytes(input).unwrap();

        assert_eq!(text.mode, StructureMode::Opaque);
        assert_eq!(text.title.as_deref(), Some("Deployment notes"));
        let data = text.structured_data.unwrap();
        assert_eq!(data["steps"][1], "ship");
    }

    #[test]
    fn test_yaml_reader_tagged_and_numeric_keys() {
        let input = b"value: !custom 5\n1: one\n";
        let text = YamlReader::new().read_bytes(input).unwrap();
        let data = text.structured_data.unwrap();

        assert_eq!(data["value"], 5);
        assert_eq!(data["1"], "one");
    }

    #[test]
    fn test_yaml_reader_recognizes_record() {
        let input = b"metadata:\n  title: Notes\n  source: notes.txt\n  source_type: text\ncontent:\n  raw_text: hi\n";
        let text = YamlReader::new().read_bytes(input).unwrap();
        assert_eq!(text.record.unwrap().metadata.title, "Notes");
    }

    #[test]
    fn test_yaml_reader_invalid() {
        let err = YamlReader::new().read_bytes(b"key: [unclosed").unwrap_err();
        assert!(err.is_extraction());
    }
}
