//! Error types for the Janusz converter.

use std::path::PathBuf;

/// Result type alias for Janusz operations.
pub type Result<T> = std::result::Result<T, JanuszError>;

/// Main error type for the Janusz converter.
#[derive(Debug, thiserror::Error)]
pub enum JanuszError {
    /// The file extension does not map to a known source format
    #[error("Unsupported format: {extension:?} ({path})")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The format is known but its reader was not compiled in
    #[error("{format} support requires the optional `{dependency}` dependency (enable the `{feature}` feature)")]
    OptionalDependencyMissing {
        format: String,
        dependency: String,
        feature: String,
    },

    /// The reader could not pull text out of the input
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The assembled record is missing a required field or is inconsistent
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external encoder is not installed or not runnable
    #[error("Encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// The external encoder ran but refused the input
    #[error("Encoder rejected input (exit code {code:?}): {stderr}")]
    EncoderRejected { code: Option<i32>, stderr: String },

    /// An external invocation exceeded its time limit
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Wrapped anyhow errors for compatibility
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JanuszError {
    /// Create an unsupported format error for `path`
    pub fn unsupported_format(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::UnsupportedFormat { path, extension }
    }

    /// Create an optional dependency error
    pub fn optional_dependency(
        format: impl Into<String>,
        dependency: impl Into<String>,
        feature: impl Into<String>,
    ) -> Self {
        Self::OptionalDependencyMissing {
            format: format.into(),
            dependency: dependency.into(),
            feature: feature.into(),
        }
    }

    /// Create a new extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create a new schema validation error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaValidation(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new encoder unavailable error
    pub fn encoder_unavailable(msg: impl Into<String>) -> Self {
        Self::EncoderUnavailable(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Short stable label used when reporting batch failures
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::OptionalDependencyMissing { .. } => "optional_dependency_missing",
            Self::Extraction(_) => "extraction",
            Self::SchemaValidation(_) => "schema_validation",
            Self::Io(_) => "io",
            Self::Serialization(_) | Self::Yaml(_) => "serialization",
            Self::Config(_) => "config",
            Self::EncoderUnavailable(_) => "encoder_unavailable",
            Self::EncoderRejected { .. } => "encoder_rejected",
            Self::Timeout(_) => "timeout",
            Self::Other(_) => "other",
        }
    }

    /// Check if this is an unsupported format error
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }

    /// Check if this is an optional dependency error
    pub fn is_optional_dependency_missing(&self) -> bool {
        matches!(self, Self::OptionalDependencyMissing { .. })
    }

    /// Check if this is an extraction error
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction(_))
    }

    /// Check if this is a schema validation error
    pub fn is_schema_validation(&self) -> bool {
        matches!(self, Self::SchemaValidation(_))
    }

    /// Check if this is an encoder unavailable error
    pub fn is_encoder_unavailable(&self) -> bool {
        matches!(self, Self::EncoderUnavailable(_))
    }

    /// Check if this is an encoder rejection
    pub fn is_encoder_rejected(&self) -> bool {
        matches!(self, Self::EncoderRejected { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_captures_extension() {
        let err = JanuszError::unsupported_format("notes/report.xyz");
        match &err {
            JanuszError::UnsupportedFormat { extension, .. } => assert_eq!(extension, "xyz"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_unsupported_format());
        assert_eq!(err.kind(), "unsupported_format");
    }

    #[test]
    fn test_optional_dependency_is_distinct() {
        let err = JanuszError::optional_dependency("DOCX", "docx-rs", "docx");
        assert!(err.is_optional_dependency_missing());
        assert!(!err.is_unsupported_format());
        assert!(err.to_string().contains("docx-rs"));
    }

    #[test]
    fn test_encoder_error_kinds() {
        let missing = JanuszError::encoder_unavailable("toon not found");
        let rejected = JanuszError::EncoderRejected {
            code: Some(2),
            stderr: "bad input".into(),
        };
        let timeout = JanuszError::timeout("toon --encode");

        assert_eq!(missing.kind(), "encoder_unavailable");
        assert_eq!(rejected.kind(), "encoder_rejected");
        assert_eq!(timeout.kind(), "timeout");
        assert!(rejected.to_string().contains("bad input"));
    }
}
