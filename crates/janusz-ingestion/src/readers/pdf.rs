//! PDF reader.
//!
//! Text is taken page by page with `lopdf` so that page boundaries survive as
//! [`StructuralHint::PageBreak`] hints. When lopdf yields nothing usable the
//! whole document goes through `pdf-extract` instead, without page hints.

use super::txt::normalize_text;
use super::{ExtractedText, FormatReader, StructuralHint};
use janusz_core::{JanuszError, Result, SourceFormat};
use lopdf::Document as PdfDocument;
use pdf_extract::extract_text_from_mem;

/// Separator placed between consecutive pages
const PAGE_SEPARATOR: &str = "\n\n";

/// Reader for PDF documents
pub struct PdfReader {
    page_hints: bool,
}

impl PdfReader {
    pub fn new() -> Self {
        Self { page_hints: true }
    }

    /// Reader that does not report page boundaries
    pub fn without_page_hints() -> Self {
        Self { page_hints: false }
    }

    /// Title from the document Info dictionary
    fn info_title(pdf: &PdfDocument) -> Option<String> {
        let (_, info) = pdf
            .trailer
            .get(b"Info")
            .and_then(|obj| pdf.dereference(obj))
            .ok()?;
        let dict = info.as_dict().ok()?;
        let value = dict.get(b"Title").ok()?;
        let bytes = value.as_str().ok()?;
        let title = String::from_utf8_lossy(bytes).trim().to_string();
        (!title.is_empty()).then_some(title)
    }

    /// Per-page text in page order
    fn extract_pages(pdf: &PdfDocument) -> Vec<(u32, String)> {
        pdf.get_pages()
            .keys()
            .map(|page_num| {
                let text = pdf.extract_text(&[*page_num]).unwrap_or_else(|e| {
                    tracing::debug!("lopdf could not extract page {}: {}", page_num, e);
                    String::new()
                });
                (*page_num, normalize_text(text.trim_end()))
            })
            .collect()
    }

    /// Join pages and record the line each page starts on
    fn join_pages(pages: &[(u32, String)]) -> (String, Vec<StructuralHint>) {
        let mut text = String::new();
        let mut hints = Vec::new();
        let mut line = 0;

        for (idx, (page, page_text)) in pages.iter().enumerate() {
            if idx > 0 {
                text.push_str(PAGE_SEPARATOR);
                line += PAGE_SEPARATOR.matches('\n').count();
            }
            hints.push(StructuralHint::PageBreak { line, page: *page });
            text.push_str(page_text);
            line += page_text.matches('\n').count();
        }

        (text, hints)
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatReader for PdfReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Pdf
    }

    fn read_bytes(&self, input: &[u8]) -> Result<ExtractedText> {
        tracing::debug!("Reading PDF document ({} bytes)", input.len());

        if input.is_empty() {
            return Err(JanuszError::extraction("PDF input is empty"));
        }

        let pdf = PdfDocument::load_mem(input)
            .map_err(|e| JanuszError::extraction(format!("Failed to parse PDF: {}", e)))?;

        if pdf.is_encrypted() {
            return Err(JanuszError::extraction("PDF is encrypted"));
        }

        let title = Self::info_title(&pdf);
        let pages = Self::extract_pages(&pdf);

        let (raw_text, hints) = if pages.iter().any(|(_, text)| !text.trim().is_empty()) {
            tracing::debug!("Extracted {} PDF pages", pages.len());
            Self::join_pages(&pages)
        } else {
            let text = extract_text_from_mem(input).map_err(|e| {
                JanuszError::extraction(format!("Failed to extract PDF text: {}", e))
            })?;
            (normalize_text(text.trim()), Vec::new())
        };

        if raw_text.trim().is_empty() {
            return Err(JanuszError::extraction("PDF contains no extractable text"));
        }

        let hints = if self.page_hints { hints } else { Vec::new() };

        Ok(ExtractedText::new(SourceFormat::Pdf, raw_text)
            .with_hints(hints)
            .with_title(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_reader_empty_input() {
        let reader = PdfReader::new();
        let err = reader.read_bytes(&[]).unwrap_err();
        assert!(err.is_extraction());
    }

    #[test]
    fn test_pdf_reader_corrupt_input() {
        let reader = PdfReader::new();
        let err = reader.read_bytes(b"%PDF-1.4 this is not really a pdf").unwrap_err();
        assert!(err.is_extraction());
    }

    #[test]
    fn test_join_pages_records_page_lines() {
        let pages = vec![
            (1, "INTRODUCTION\n\nFirst page.".to_string()),
            (2, "Second page.".to_string()),
        ];
        let (text, hints) = PdfReader::join_pages(&pages);

        assert_eq!(text, "INTRODUCTION\n\nFirst page.\n\nSecond page.");
        assert_eq!(
            hints,
            vec![
                StructuralHint::PageBreak { line: 0, page: 1 },
                StructuralHint::PageBreak { line: 4, page: 2 },
            ]
        );
        assert_eq!(text.split('\n').nth(4), Some("Second page."));
    }
}
