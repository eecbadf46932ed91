//! Source format enumeration.

use crate::error::{JanuszError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Format of an input document, detected from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Pdf,
    Markdown,
    Text,
    Docx,
    Html,
    Json,
    Yaml,
}

impl SourceFormat {
    /// Every recognized format, in a stable order
    pub const ALL: [SourceFormat; 7] = [
        Self::Pdf,
        Self::Markdown,
        Self::Text,
        Self::Docx,
        Self::Html,
        Self::Json,
        Self::Yaml,
    ];

    /// Detect the format from a bare extension (case-insensitive, no dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" | "text" => Some(Self::Text),
            "docx" => Some(Self::Docx),
            "html" | "htm" => Some(Self::Html),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Detect the format of `path`, failing fast on unknown extensions
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| JanuszError::unsupported_format(path))
    }

    /// File extensions accepted for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &["pdf"],
            Self::Markdown => &["md", "markdown"],
            Self::Text => &["txt", "text"],
            Self::Docx => &["docx"],
            Self::Html => &["html", "htm"],
            Self::Json => &["json"],
            Self::Yaml => &["yaml", "yml"],
        }
    }

    /// Lowercase name as it appears in `metadata.source_type`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::Text => "text",
            Self::Docx => "docx",
            Self::Html => "html",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// Whether the format carries its own heading markup
    pub fn has_explicit_structure(&self) -> bool {
        matches!(self, Self::Markdown | Self::Html)
    }

    /// Whether the format may already hold a serialized record
    pub fn is_structured_data(&self) -> bool {
        matches!(self, Self::Json | Self::Yaml)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_extension_aliases() {
        assert_eq!(SourceFormat::from_extension("MD"), Some(SourceFormat::Markdown));
        assert_eq!(SourceFormat::from_extension("htm"), Some(SourceFormat::Html));
        assert_eq!(SourceFormat::from_extension("yml"), Some(SourceFormat::Yaml));
        assert_eq!(SourceFormat::from_extension("xyz"), None);
    }

    #[test]
    fn test_from_path_rejects_unknown() {
        let err = SourceFormat::from_path(&PathBuf::from("data/file.xyz")).unwrap_err();
        assert!(err.is_unsupported_format());

        let err = SourceFormat::from_path(&PathBuf::from("README")).unwrap_err();
        assert!(err.is_unsupported_format());
    }

    #[test]
    fn test_extensions_round_trip() {
        for format in SourceFormat::ALL {
            for ext in format.extensions() {
                assert_eq!(SourceFormat::from_extension(ext), Some(format));
            }
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&SourceFormat::Docx).unwrap();
        assert_eq!(json, "\"docx\"");
        let parsed: SourceFormat = serde_json::from_str("\"markdown\"").unwrap();
        assert_eq!(parsed, SourceFormat::Markdown);
    }
}
