//! Plain text reader.

use super::{decode_utf8, ExtractedText, FormatReader};
use janusz_core::{Result, SourceFormat};

/// Reader for plain text documents
pub struct TxtReader;

impl TxtReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TxtReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize line endings and drop a leading byte-order mark
pub(crate) fn normalize_text(text: &str) -> String {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.replace("\r\n", "\n").replace('\r', "\n")
}

impl FormatReader for TxtReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Text
    }

    fn read_bytes(&self, input: &[u8]) -> Result<ExtractedText> {
        tracing::debug!("Reading text document ({} bytes)", input.len());

        let text = normalize_text(&decode_utf8(input));
        Ok(ExtractedText::new(SourceFormat::Text, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::StructureMode;

    #[test]
    fn test_txt_reader_keeps_text() {
        let reader = TxtReader::new();
        let text = reader.read_bytes(b"Line one\r\nLine two\n").unwrap();

        assert_eq!(text.raw_text, "Line one\nLine two\n");
        assert_eq!(text.mode, StructureMode::Heuristic);
        assert!(text.hints.is_empty());
    }

    #[test]
    fn test_txt_reader_empty() {
        let reader = TxtReader::new();
        let text = reader.read_bytes(b"").unwrap();
        assert!(text.raw_text.is_empty());
    }

    #[test]
    fn test_normalize_strips_bom() {
        assert_eq!(normalize_text("\u{feff}hello\rworld"), "hello\nworld");
    }
}
