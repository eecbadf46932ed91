//! HTML reader.
//!
//! Text comes from `html2text`; headings are located with `scraper` and
//! matched back onto the rendered lines. Requires the `html` feature.

use super::{ExtractedText, FormatReader};
use janusz_core::{Result, SourceFormat};

/// Reader for HTML documents
pub struct HtmlReader {
    #[cfg_attr(not(feature = "html"), allow(dead_code))]
    width: usize,
}

impl HtmlReader {
    pub fn new() -> Self {
        Self { width: 1000 }
    }

    /// Reader that wraps rendered text at `width` columns
    pub fn with_width(width: usize) -> Self {
        Self { width: width.max(20) }
    }
}

impl Default for HtmlReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "html")]
mod imp {
    use super::super::txt::normalize_text;
    use super::super::{ExtractedText, StructuralHint, StructureMode};
    use janusz_core::{JanuszError, Result, SourceFormat};
    use scraper::{Html, Selector};

    fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn document_title(document: &Html) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        let title = document.select(&selector).next()?;
        Some(collapse_whitespace(&title.text().collect::<String>()))
    }

    /// Headings in document order as (level, text)
    fn document_headings(document: &Html) -> Vec<(usize, String)> {
        let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|heading| {
                let level = heading.value().name()[1..].parse::<usize>().ok()?;
                let text = collapse_whitespace(&heading.text().collect::<String>());
                (!text.is_empty()).then_some((level, text))
            })
            .collect()
    }

    /// Find each heading on or after the previous match
    fn locate_headings(text: &str, headings: &[(usize, String)]) -> Vec<StructuralHint> {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut hints = Vec::new();
        let mut cursor = 0;

        for (level, heading) in headings {
            let found = (cursor..lines.len()).find(|&idx| {
                let line = lines[idx].trim().trim_start_matches('#').trim();
                collapse_whitespace(line) == *heading
            });

            match found {
                Some(line) => {
                    hints.push(StructuralHint::Heading {
                        line,
                        end_line: line,
                        level: *level,
                        title: heading.clone(),
                    });
                    cursor = line + 1;
                }
                None => tracing::debug!("HTML heading {:?} not found in rendered text", heading),
            }
        }

        hints
    }

    pub(super) fn read(input: &[u8], width: usize) -> Result<ExtractedText> {
        let html_content = String::from_utf8_lossy(input).to_string();
        let document = Html::parse_document(&html_content);

        let rendered = html2text::from_read(input, width).map_err(|e| {
            JanuszError::extraction(format!("Failed to extract text from HTML: {}", e))
        })?;
        let text = normalize_text(rendered.trim_end());

        let headings = document_headings(&document);
        let hints = locate_headings(&text, &headings);

        Ok(ExtractedText::new(SourceFormat::Html, text)
            .with_hints(hints)
            .with_mode(StructureMode::Explicit)
            .with_title(document_title(&document)))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_locate_headings_in_order() {
            let text = "# Intro\n\nBody\n\n## Intro\n\nAgain";
            let headings = vec![(1, "Intro".to_string()), (2, "Intro".to_string())];
            let hints = locate_headings(text, &headings);

            let lines: Vec<usize> = hints
                .iter()
                .filter_map(|hint| match hint {
                    StructuralHint::Heading { line, .. } => Some(*line),
                    _ => None,
                })
                .collect();
            assert_eq!(lines, vec![0, 4]);
        }
    }
}

impl FormatReader for HtmlReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Html
    }

    #[cfg(feature = "html")]
    fn read_bytes(&self, input: &[u8]) -> Result<ExtractedText> {
        tracing::debug!("Reading HTML document ({} bytes)", input.len());
        imp::read(input, self.width)
    }

    #[cfg(not(feature = "html"))]
    fn read_bytes(&self, _input: &[u8]) -> Result<ExtractedText> {
        Err(super::feature_disabled(SourceFormat::Html, "html2text", "html"))
    }
}

#[cfg(all(test, feature = "html"))]
mod tests {
    use super::*;
    use crate::readers::StructuralHint;

    #[test]
    fn test_html_reader_headings_and_title() {
        let html = b"<html><head><title>Style Guide</title></head><body>\
            <h1>Intro</h1><p>Always validate input.</p>\
            <h2>Details</h2><p>More detail here.</p></body></html>";

        let text = HtmlReader::new().read_bytes(html).unwrap();

        assert_eq!(text.title.as_deref(), Some("Style Guide"));
        assert!(text.raw_text.contains("Always validate input."));

        let levels: Vec<(usize, String)> = text
            .hints
            .iter()
            .filter_map(|hint| match hint {
                StructuralHint::Heading { level, title, .. } => Some((*level, title.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            levels,
            vec![(1, "Intro".to_string()), (2, "Details".to_string())]
        );
    }
}
