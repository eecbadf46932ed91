//! End-to-end tests of the document pipeline

use janusz_core::{ConfidenceLevel, OutputFormat, SourceFormat};
use janusz_integration_tests::{
    reproducible_converter, write_fixture, FLAT_TXT, GUIDE_MD, NOTES_TXT,
};
use janusz_ingestion::{parse_record, read_document};
use tempfile::TempDir;

// ============================================================================
// Markdown
// ============================================================================

#[test]
fn test_markdown_guide_structure_and_analysis() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(temp_dir.path(), "api-guide.md", GUIDE_MD).unwrap();

    let outcome = reproducible_converter(OutputFormat::Yaml, &temp_dir.path().join("out"))
        .convert_file(&input)
        .unwrap();
    let record = &outcome.record;

    assert_eq!(record.metadata.title, "API Guide");
    assert_eq!(record.metadata.source_type, SourceFormat::Markdown);
    assert_eq!(record.content.sections.len(), 1);

    let root = &record.content.sections[0];
    assert_eq!(root.subsections.len(), 2);
    assert_eq!(root.subsections[1].title, "Examples");
    assert_eq!(root.subsections[1].subsections[0].title, "Errors");
    assert_eq!(root.subsections[1].subsections[0].level, 3);
    assert_eq!(record.section_count(), 4);

    let practices = &record.analysis.best_practices;
    assert!(practices
        .iter()
        .any(|item| item.text.starts_with("Always validate input")
            && item.confidence_level == ConfidenceLevel::High));
    assert!(record
        .analysis
        .examples
        .iter()
        .any(|item| item.text.contains("curl")));
    assert!(record
        .analysis
        .keywords
        .iter()
        .any(|item| item.text.eq_ignore_ascii_case("api")));

    record.validate().unwrap();
}

// ============================================================================
// Plain Text
// ============================================================================

#[test]
fn test_flat_text_single_root_reconstructs_input() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(temp_dir.path(), "flat.txt", FLAT_TXT).unwrap();

    let record = reproducible_converter(OutputFormat::Json, temp_dir.path())
        .convert_file(&input)
        .unwrap()
        .record;

    assert_eq!(record.content.sections.len(), 1);
    let root = &record.content.sections[0];
    assert!(root.title.is_empty());
    assert_eq!(root.content.join("\n"), FLAT_TXT);
    assert_eq!(record.content.raw_text, FLAT_TXT);
}

#[test]
fn test_text_heuristic_headings() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(temp_dir.path(), "notes.txt", NOTES_TXT).unwrap();

    let record = reproducible_converter(OutputFormat::Yaml, temp_dir.path())
        .convert_file(&input)
        .unwrap()
        .record;

    let root = &record.content.sections[0];
    assert_eq!(root.title, "INSTALLATION");
    assert_eq!(root.subsections.len(), 2);
    assert_eq!(root.subsections[0].title, "System Requirements");
    assert!(record
        .analysis
        .best_practices
        .iter()
        .any(|item| item.text.contains("You must have")));
}

// ============================================================================
// Serialization Round Trips
// ============================================================================

#[test]
fn test_yaml_and_json_outputs_describe_the_same_record() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(temp_dir.path(), "api-guide.md", GUIDE_MD).unwrap();

    let yaml = reproducible_converter(OutputFormat::Yaml, &temp_dir.path().join("yaml"))
        .convert_file(&input)
        .unwrap();
    let json = reproducible_converter(OutputFormat::Json, &temp_dir.path().join("json"))
        .convert_file(&input)
        .unwrap();

    let from_yaml =
        parse_record(&std::fs::read_to_string(&yaml.output).unwrap(), OutputFormat::Yaml).unwrap();
    let from_json =
        parse_record(&std::fs::read_to_string(&json.output).unwrap(), OutputFormat::Json).unwrap();
    assert_eq!(from_yaml, from_json);
}

#[test]
fn test_output_reads_back_as_record() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(temp_dir.path(), "notes.txt", NOTES_TXT).unwrap();

    for format in [OutputFormat::Yaml, OutputFormat::Json] {
        let outcome = reproducible_converter(format, &temp_dir.path().join(format.extension()))
            .convert_file(&input)
            .unwrap();

        let reread = read_document(&outcome.output)
            .unwrap()
            .record
            .expect("serialized record recognized");
        assert_eq!(reread.without_run_stamp(), outcome.record.without_run_stamp());
    }
}

#[test]
fn test_conversion_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(temp_dir.path(), "api-guide.md", GUIDE_MD).unwrap();
    let converter = reproducible_converter(OutputFormat::Yaml, temp_dir.path());

    let first = converter.convert_file(&input).unwrap();
    let first_text = std::fs::read_to_string(&first.output).unwrap();
    let second = converter.convert_file(&input).unwrap();
    let second_text = std::fs::read_to_string(&second.output).unwrap();

    assert_eq!(first_text, second_text);
}
