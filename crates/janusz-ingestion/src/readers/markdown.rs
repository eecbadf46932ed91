//! Markdown reader with front matter and heading detection.

use super::txt::normalize_text;
use super::{decode_utf8, ExtractedText, FormatReader, LineIndex, StructuralHint, StructureMode};
use janusz_core::{Result, SourceFormat};
use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

static FRONTMATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\n(.*?)\n---[ \t]*(?:\n|\z)").expect("front matter pattern")
});

/// Reader for Markdown documents
pub struct MarkdownReader {
    extract_frontmatter: bool,
}

impl MarkdownReader {
    pub fn new() -> Self {
        Self {
            extract_frontmatter: true,
        }
    }

    /// Treat front matter as ordinary text
    pub fn without_frontmatter() -> Self {
        Self {
            extract_frontmatter: false,
        }
    }

    /// Locate YAML front matter, returning its last line and declared title
    fn frontmatter(content: &str) -> Option<(usize, Option<String>)> {
        let captures = FRONTMATTER.captures(content)?;
        let whole = captures.get(0)?;
        let yaml_str = captures.get(1)?.as_str();

        let title = serde_yaml::from_str::<serde_yaml::Value>(yaml_str)
            .ok()
            .and_then(|value| {
                value
                    .get("title")
                    .and_then(|title| title.as_str())
                    .map(str::to_string)
            });

        let matched = whole.as_str();
        let end_line = matched.trim_end_matches('\n').matches('\n').count();
        Some((end_line, title))
    }

    /// Find every heading with its line span
    fn heading_hints(content: &str, skip_until: Option<usize>) -> Vec<StructuralHint> {
        let index = LineIndex::new(content);
        let mut hints = Vec::new();
        let mut current: Option<(usize, usize, usize, String)> = None;

        for (event, range) in Parser::new_ext(content, Options::empty()).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    let line = index.line_of(range.start);
                    let end = range.end.saturating_sub(1).max(range.start);
                    let end_line = index.line_of(end);
                    current = Some((line, end_line, level as usize, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((line, end_line, level, title)) = current.take() {
                        if skip_until.is_some_and(|last| line <= last) {
                            continue;
                        }
                        hints.push(StructuralHint::Heading {
                            line,
                            end_line,
                            level,
                            title: title.trim().to_string(),
                        });
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, _, _, title)) = current.as_mut() {
                        title.push_str(&text);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some((_, _, _, title)) = current.as_mut() {
                        title.push(' ');
                    }
                }
                _ => {}
            }
        }

        hints
    }
}

impl Default for MarkdownReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatReader for MarkdownReader {
    fn format(&self) -> SourceFormat {
        SourceFormat::Markdown
    }

    fn read_bytes(&self, input: &[u8]) -> Result<ExtractedText> {
        tracing::debug!("Reading Markdown document ({} bytes)", input.len());

        let content = normalize_text(&decode_utf8(input));

        let mut hints = Vec::new();
        let mut title = None;
        let mut skip_until = None;

        if self.extract_frontmatter {
            if let Some((end_line, declared)) = Self::frontmatter(&content) {
                hints.push(StructuralHint::Ignore { line: 0, end_line });
                title = declared;
                skip_until = Some(end_line);
            }
        }

        hints.extend(Self::heading_hints(&content, skip_until));
        tracing::debug!("Found {} Markdown headings", hints.len());

        Ok(ExtractedText::new(SourceFormat::Markdown, content)
            .with_hints(hints)
            .with_mode(StructureMode::Explicit)
            .with_title(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headings(text: &ExtractedText) -> Vec<(usize, usize, String)> {
        text.hints
            .iter()
            .filter_map(|hint| match hint {
                StructuralHint::Heading { line, level, title, .. } => {
                    Some((*line, *level, title.clone()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_markdown_reader_headings() {
        let markdown = "# Title\n\nIntro text.\n\n## Section 1\n\nBody.\n\n### Deep `code`\n";
        let text = MarkdownReader::new().read_bytes(markdown.as_bytes()).unwrap();

        assert_eq!(text.mode, StructureMode::Explicit);
        assert_eq!(
            headings(&text),
            vec![
                (0, 1, "Title".to_string()),
                (4, 2, "Section 1".to_string()),
                (8, 3, "Deep code".to_string()),
            ]
        );
    }

    #[test]
    fn test_markdown_reader_ignores_fenced_hashes() {
        let markdown = "# Real\n\n```sh\n# not a heading\n```\n";
        let text = MarkdownReader::new().read_bytes(markdown.as_bytes()).unwrap();
        assert_eq!(text.heading_count(), 1);
    }

    #[test]
    fn test_markdown_reader_setext_heading_span() {
        let markdown = "Overview\n========\n\nText.\n";
        let text = MarkdownReader::new().read_bytes(markdown.as_bytes()).unwrap();

        match &text.hints[..] {
            [StructuralHint::Heading { line, end_line, level, title }] => {
                assert_eq!((*line, *end_line, *level), (0, 1, 1));
                assert_eq!(title, "Overview");
            }
            other => panic!("unexpected hints: {other:?}"),
        }
    }

    #[test]
    fn test_markdown_reader_frontmatter() {
        let markdown = "---\ntitle: Style Guide\ntags: [docs]\n---\n# Body\n\nText.\n";
        let text = MarkdownReader::new().read_bytes(markdown.as_bytes()).unwrap();

        assert_eq!(text.title.as_deref(), Some("Style Guide"));
        assert_eq!(text.hints[0], StructuralHint::Ignore { line: 0, end_line: 3 });
        assert_eq!(headings(&text), vec![(4, 1, "Body".to_string())]);
    }

    #[test]
    fn test_markdown_reader_frontmatter_disabled() {
        let markdown = "---\ntitle: Style Guide\n---\nText.\n";
        let text = MarkdownReader::without_frontmatter()
            .read_bytes(markdown.as_bytes())
            .unwrap();
        assert!(text.title.is_none());
        assert!(!text.hints.iter().any(|h| matches!(h, StructuralHint::Ignore { .. })));
    }
}
