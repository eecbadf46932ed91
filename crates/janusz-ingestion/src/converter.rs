//! Drives the full pipeline for single files, path lists and directories.

use crate::assembler::{RecordAssembler, RecordParts};
use crate::classifier::ContentClassifier;
use crate::readers;
use crate::serializer::RecordWriter;
use crate::structure::StructureParser;
use janusz_core::{
    ConversionConfig, DocumentRecord, JanuszError, OutputFormat, Result, SourceFormat,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A successfully converted file
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    pub record: DocumentRecord,
}

/// A file the batch could not convert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    /// Stable error label, see [`JanuszError::kind`]
    pub kind: String,
    pub message: String,
}

impl FileFailure {
    fn new(path: &Path, error: &JanuszError) -> Self {
        Self {
            path: path.to_path_buf(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result of converting many files
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub converted: Vec<ConversionOutcome>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.converted.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.success_count() + self.failure_count()
    }

    /// True when no file failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Output paths of every converted file, in processing order
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.converted.iter().map(|outcome| outcome.output.as_path())
    }
}

pub struct DocumentConverter {
    parser: StructureParser,
    classifier: ContentClassifier,
    assembler: RecordAssembler,
    writer: RecordWriter,
    recursive: bool,
    include_extensions: Vec<String>,
    max_file_size: u64,
}

impl DocumentConverter {
    pub fn new(config: &ConversionConfig) -> Self {
        let writer =
            RecordWriter::new(config.output_format).with_output_dir(config.output_dir.clone());
        Self {
            parser: StructureParser::new(),
            classifier: ContentClassifier::new(),
            assembler: RecordAssembler::new(),
            writer,
            recursive: config.recursive,
            include_extensions: config
                .include_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_file_size: config.max_file_size_bytes(),
        }
    }

    pub fn with_classifier(mut self, classifier: ContentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_assembler(mut self, assembler: RecordAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn output_format(&self) -> OutputFormat {
        self.writer.format()
    }

    /// Build a record for `path` without writing anything
    pub fn build_record(&self, path: &Path) -> Result<DocumentRecord> {
        // Unknown extensions fail before the file is touched
        let format = SourceFormat::from_path(path)?;
        self.check_size(path)?;

        let extracted = readers::read_document(path)?;
        if let Some(record) = extracted.record.clone() {
            debug!("{:?} is already a document record", path);
            return self.assembler.restamp(record);
        }

        let sections = self.parser.parse(&extracted);
        let analysis = self.classifier.classify(&sections, &extracted.raw_text);
        debug!(
            "Parsed {} root sections and {} analysis items from {:?}",
            sections.len(),
            analysis.len(),
            path
        );

        self.assembler.assemble(RecordParts {
            source: path,
            format,
            declared_title: extracted.title,
            sections,
            raw_text: extracted.raw_text,
            structured_data: extracted.structured_data,
            analysis,
        })
    }

    /// Convert one file and write its record
    pub fn convert_file(&self, path: &Path) -> Result<ConversionOutcome> {
        let record = self.build_record(path)?;
        let output = self.writer.write(&record, path)?;
        info!("Converted {:?} -> {:?}", path, output);

        Ok(ConversionOutcome {
            source: path.to_path_buf(),
            output,
            record,
        })
    }

    /// Convert each path in order; failures are recorded and skipped
    pub fn convert_batch<P: AsRef<Path>>(&self, paths: &[P]) -> BatchReport {
        let mut report = BatchReport::default();
        for path in paths {
            let path = path.as_ref();
            match self.convert_file(path) {
                Ok(outcome) => report.converted.push(outcome),
                Err(e) => {
                    warn!("Failed to convert {:?} ({}): {}", path, e.kind(), e);
                    report.failures.push(FileFailure::new(path, &e));
                }
            }
        }
        report
    }

    /// Convert every included file below `dir`
    pub fn convert_directory(&self, dir: &Path) -> Result<BatchReport> {
        info!("Converting directory: {:?}", dir);
        let files = self.collect_files(dir)?;
        if files.is_empty() {
            info!("No convertible files found in {:?}", dir);
        }
        Ok(self.convert_batch(&files))
    }

    /// Convert a file or a directory
    pub fn convert_path(&self, path: &Path) -> Result<BatchReport> {
        if path.is_dir() {
            self.convert_directory(path)
        } else if path.exists() {
            Ok(self.convert_batch(&[path]))
        } else {
            Err(JanuszError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )))
        }
    }

    /// Included files below `dir`, sorted
    pub fn collect_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(JanuszError::config(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut builder = ignore::WalkBuilder::new(dir);
        builder.hidden(false).git_ignore(true).require_git(false);
        if !self.recursive {
            builder.max_depth(Some(1));
        }

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry.map_err(|e| JanuszError::extraction(format!("Walk error: {}", e)))?;
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.path();
            if self.is_included(path) {
                files.push(path.to_path_buf());
            } else {
                debug!("Skipping {:?}", path);
            }
        }

        files.sort();
        Ok(files)
    }

    fn is_included(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        if self.include_extensions.contains(&ext) {
            return true;
        }
        // Aliases such as `markdown` or `htm` count as their format
        SourceFormat::from_extension(&ext)
            .map(|format| {
                format
                    .extensions()
                    .iter()
                    .any(|alias| self.include_extensions.iter().any(|inc| inc == alias))
            })
            .unwrap_or(false)
    }

    fn check_size(&self, path: &Path) -> Result<()> {
        let size = std::fs::metadata(path)?.len();
        if size > self.max_file_size {
            return Err(JanuszError::extraction(format!(
                "{} is {} bytes, above the {} byte limit",
                path.display(),
                size,
                self.max_file_size
            )));
        }
        Ok(())
    }
}

impl Default for DocumentConverter {
    fn default() -> Self {
        Self::new(&ConversionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn converter(dir: &TempDir) -> DocumentConverter {
        let config = ConversionConfig {
            output_dir: Some(dir.path().join("out")),
            ..ConversionConfig::default()
        };
        DocumentConverter::new(&config).with_assembler(RecordAssembler::without_timestamp())
    }

    #[test]
    fn test_include_aliases() {
        let converter = DocumentConverter::default();
        assert!(converter.is_included(Path::new("a.md")));
        assert!(converter.is_included(Path::new("a.MARKDOWN")));
        assert!(converter.is_included(Path::new("a.htm")));
        assert!(!converter.is_included(Path::new("a.json")));
        assert!(!converter.is_included(Path::new("Makefile")));
    }

    #[test]
    fn test_size_limit_checked_before_reading() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big.txt");
        std::fs::write(&path, vec![b'a'; 2048]).unwrap();

        let mut converter = converter(&temp_dir);
        converter.max_file_size = 1024;
        let err = converter.convert_file(&path).unwrap_err();
        assert!(err.is_extraction());
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_convert_text_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        std::fs::write(&path, "just some words\nand more words").unwrap();

        let outcome = converter(&temp_dir).convert_file(&path).unwrap();
        assert_eq!(outcome.output, temp_dir.path().join("out").join("notes.yaml"));
        assert_eq!(outcome.record.metadata.title, "notes");
        assert_eq!(outcome.record.content.sections.len(), 1);
        assert!(outcome.output.exists());
    }

    #[test]
    fn test_collect_files_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        std::fs::write(temp_dir.path().join("b.md"), "# B").unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(temp_dir.path().join("skip.rs"), "fn main() {}").unwrap();
        std::fs::write(temp_dir.path().join("nested").join("c.txt"), "c").unwrap();

        let converter = converter(&temp_dir);
        let files = converter.collect_files(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.md"),
                PathBuf::from("nested/c.txt")
            ]
        );
    }

    #[test]
    fn test_non_recursive_walk() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(temp_dir.path().join("nested").join("c.txt"), "c").unwrap();

        let config = ConversionConfig {
            recursive: false,
            ..ConversionConfig::default()
        };
        let files = DocumentConverter::new(&config)
            .collect_files(temp_dir.path())
            .unwrap();
        assert_eq!(files, vec![temp_dir.path().join("a.txt")]);
    }

    #[test]
    fn test_missing_path_is_io_error() {
        let err = DocumentConverter::default()
            .convert_path(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
