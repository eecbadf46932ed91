//! DOCX reader.
//!
//! Requires the `docx` feature. The document is parsed with `docx-rs` and
//! walked through its JSON form: paragraphs and table-cell paragraphs become
//! text blocks in document order, and `Heading1`..`Heading6` / `Title`
//! paragraph styles become heading hints.

use super::{ExtractedText, FormatReader};
use janusz_core::{Result, SourceFormat};

/// Separator placed between paragraphs
#[cfg_attr(not(feature = "docx"), allow(dead_code))]
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Reader for Word documents
pub struct DocxReader;

impl DocxReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxReader {
    fn default() -> Self {
        Self::new()
    }
}

/// A paragraph of text with its heading level, if styled as one
#[cfg_attr(not(feature = "docx"), allow(dead_code))]
#[derive(Debug, Clone, PartialEq)]
struct Block {
    text: String,
    heading: Option<usize>,
}

/// Heading level implied by a paragraph style name
#[cfg_attr(not(feature = "docx"), allow(dead_code))]
fn heading_level(style: &str) -> Option<usize> {
    let normalized: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if normalized == "title" {
        return Some(1);
    }
    normalized
        .strip_prefix("heading")
        .and_then(|level| level.parse::<usize>().ok())
        .filter(|level| (1..=6).contains(level))
}

/// Join blocks and emit a heading hint per styled paragraph
#[cfg_attr(not(feature = "docx"), allow(dead_code))]
fn assemble(blocks: &[Block]) -> ExtractedText {
    use super::{StructuralHint, StructureMode};

    let mut text = String::new();
    let mut hints = Vec::new();
    let mut line = 0;

    for (idx, block) in blocks.iter().enumerate() {
        if idx > 0 {
            text.push_str(PARAGRAPH_SEPARATOR);
            line += PARAGRAPH_SEPARATOR.matches('\n').count();
        }
        let end_line = line + block.text.matches('\n').count();
        if let Some(level) = block.heading {
            hints.push(StructuralHint::Heading {
                line,
                end_line,
                level,
                title: block.text.trim().to_string(),
            });
        }
        text.push_str(&block.text);
        line = end_line;
    }

    let mode = if hints.is_empty() {
        StructureMode::Heuristic
    } else {
        StructureMode::Explicit
    };

    ExtractedText::new(SourceFormat::Docx, text)
        .with_hints(hints)
        .with_mode(mode)
}

#[cfg(feature = "docx")]
mod imp {
    use super::Block;
    use janusz_core::{JanuszError, Result};
    use serde_json::Value;

    fn node_type(node: &Value) -> Option<&str> {
        node.get("type").and_then(|t| t.as_str())
    }

    /// Concatenate every text run below `node`
    fn collect_text(node: &Value, out: &mut String) {
        match node {
            Value::Object(obj) => {
                if node_type(node) == Some("text") {
                    if let Some(text) = obj
                        .get("data")
                        .and_then(|data| data.get("text"))
                        .and_then(|t| t.as_str())
                    {
                        out.push_str(text);
                    }
                    return;
                }
                if node_type(node) == Some("break") {
                    out.push('\n');
                    return;
                }
                for value in obj.values() {
                    collect_text(value, out);
                }
            }
            Value::Array(items) => {
                for item in items {
                    collect_text(item, out);
                }
            }
            _ => {}
        }
    }

    fn paragraph_style(data: &Value) -> Option<String> {
        let style = data.get("property")?.get("style")?;
        style
            .as_str()
            .or_else(|| style.get("val").and_then(|v| v.as_str()))
            .map(str::to_string)
    }

    /// Walk document children in order, descending into tables
    fn collect_blocks(node: &Value, blocks: &mut Vec<Block>) {
        match node {
            Value::Array(items) => {
                for item in items {
                    collect_blocks(item, blocks);
                }
            }
            Value::Object(obj) => {
                if node_type(node) == Some("paragraph") {
                    let Some(data) = obj.get("data") else {
                        return;
                    };
                    let mut text = String::new();
                    if let Some(children) = data.get("children") {
                        collect_text(children, &mut text);
                    }
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        return;
                    }
                    let heading = paragraph_style(data).and_then(|s| super::heading_level(&s));
                    blocks.push(Block { text, heading });
                    return;
                }
                for value in obj.values() {
                    collect_blocks(value, blocks);
                }
            }
            _ => {}
        }
    }

    pub(super) fn read(input: &[u8]) -> Result<Vec<Block>> {
        let docx = docx_rs::read_docx(input)
            .map_err(|e| JanuszError::extraction(format!("Word document parsing error: {}", e)))?;

        let json_value: Value = serde_json::from_str(&docx.json())?;
        let children = json_value
            .get("document")
            .and_then(|document| document.get("children"))
            .ok_or_else(|| JanuszError::extraction("Word document has no body"))?;

        let mut blocks = Vec::new();
        collect_blocks(children, &mut blocks);
        Ok(blocks)
    }
}

impl FormatReader for DocxReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Docx
    }

    #[cfg(feature = "docx")]
    fn read_bytes(&self, input: &[u8]) -> Result<ExtractedText> {
        tracing::debug!("Reading DOCX document ({} bytes)", input.len());
        let blocks = imp::read(input)?;
        tracing::debug!("Extracted {} DOCX paragraphs", blocks.len());
        Ok(assemble(&blocks))
    }

    #[cfg(not(feature = "docx"))]
    fn read_bytes(&self, _input: &[u8]) -> Result<ExtractedText> {
        Err(super::feature_disabled(SourceFormat::Docx, "docx-rs", "docx"))
    }
}
