//! Content classifier.
//!
//! Tags lines of section content as best practices or examples and collects
//! keyword terms, all driven by a [`RuleTable`]. For every line and category
//! only the winning rule produces an item: highest confidence, then priority,
//! then match length, then table order.

pub mod rules;

pub use rules::{Category, Rule, RuleScope, RuleTable};

use janusz_core::{Analysis, ConfidenceLevel, ExtractionItem, Section};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// Maximum number of keywords kept per document
pub const MAX_KEYWORDS: usize = 50;

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*+•]|\d+[.)])\s+").expect("list marker pattern"));

const STOP_WORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
    "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
    "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me", "when", "make",
    "can", "like", "time", "no", "just", "him", "know", "take", "into", "your", "good", "some",
    "could", "them", "see", "other", "than", "then", "now", "only", "also", "after", "use",
    "how", "our", "first", "well", "way", "even", "new", "want", "because", "any", "these",
    "most", "us", "is", "was", "are", "been", "has", "had", "were", "does", "should", "must",
    "always", "never", "note", "here", "each", "every", "when", "where", "while", "with",
];

/// A run of lines classified together: one section, or the raw text
struct Unit<'a> {
    section_id: Option<&'a str>,
    title: &'a str,
    lines: Vec<&'a str>,
}

/// Best candidate so far for one (line, category) pair
#[derive(Clone, Copy)]
struct Vote<'r> {
    rule: &'r Rule,
    index: usize,
    match_len: usize,
}

impl Vote<'_> {
    fn rank(&self) -> (ConfidenceLevel, u8, usize, Reverse<usize>) {
        (self.rule.confidence, self.rule.priority, self.match_len, Reverse(self.index))
    }
}

struct KeywordEntry {
    text: String,
    section_id: Option<String>,
    rule: String,
    confidence: ConfidenceLevel,
    first_seen: usize,
}

/// Rule-driven classifier for section content
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    rules: RuleTable,
    max_keywords: usize,
}

impl ContentClassifier {
    /// Classifier using the builtin rule table
    pub fn new() -> Self {
        Self::with_rules(RuleTable::builtin())
    }

    pub fn with_rules(rules: RuleTable) -> Self {
        Self {
            rules,
            max_keywords: MAX_KEYWORDS,
        }
    }

    pub fn with_max_keywords(mut self, max_keywords: usize) -> Self {
        self.max_keywords = max_keywords;
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Classify a section tree; `raw_text` is used when there are no sections
    pub fn classify(&self, sections: &[Section], raw_text: &str) -> Analysis {
        let units = collect_units(sections, raw_text);

        let mut analysis = Analysis::default();
        let mut seen: HashSet<(rules::Category, String)> = HashSet::new();
        let mut keywords: HashMap<String, KeywordEntry> = HashMap::new();
        let mut position = 0usize;

        for unit in &units {
            let title_votes = self.title_votes(unit.title);

            if !unit.title.is_empty() {
                self.collect_terms(unit.title, unit.section_id, &mut keywords, &mut position);
            }

            for line in &unit.lines {
                let trimmed = line.trim();
                if trimmed.is_empty() || is_fence(trimmed) {
                    continue;
                }

                for category in [Category::BestPractice, Category::Example] {
                    let Some(vote) = self.line_vote(trimmed, category, &title_votes) else {
                        continue;
                    };
                    let text = clean_line(trimmed);
                    if !seen.insert((category, text.clone())) {
                        continue;
                    }

                    let item = ExtractionItem {
                        text,
                        source_section_id: unit.section_id.map(str::to_string),
                        tags: vec![category.tag().to_string(), vote.rule.name.clone()],
                        confidence_level: vote.rule.confidence,
                    };
                    match category {
                        Category::BestPractice => analysis.best_practices.push(item),
                        Category::Example => analysis.examples.push(item),
                        Category::Keyword => {}
                    }
                }

                self.collect_terms(trimmed, unit.section_id, &mut keywords, &mut position);
            }
        }

        analysis.keywords = self.rank_keywords(keywords);

        tracing::debug!(
            "Classified {} units: {} keywords, {} best practices, {} examples",
            units.len(),
            analysis.keywords.len(),
            analysis.best_practices.len(),
            analysis.examples.len()
        );

        analysis
    }

    /// Winning section-title rule per category
    fn title_votes(&self, title: &str) -> HashMap<Category, Vote<'_>> {
        let mut votes: HashMap<Category, Vote<'_>> = HashMap::new();
        if title.trim().is_empty() {
            return votes;
        }

        for (index, rule) in self.rules.scoped(RuleScope::SectionTitle) {
            if let Some(m) = rule.pattern.find(title) {
                let vote = Vote {
                    rule,
                    index,
                    match_len: m.len(),
                };
                let entry = votes.entry(rule.category).or_insert(vote);
                if vote.rank() > entry.rank() {
                    *entry = vote;
                }
            }
        }

        votes
    }

    fn line_vote<'r>(
        &'r self,
        line: &str,
        category: Category,
        title_votes: &HashMap<Category, Vote<'r>>,
    ) -> Option<Vote<'r>> {
        let mut best: Option<Vote<'r>> = title_votes.get(&category).copied();

        for (index, rule) in self.rules.scoped(RuleScope::Line) {
            if rule.category != category {
                continue;
            }
            if let Some(m) = rule.pattern.find(line) {
                let vote = Vote {
                    rule,
                    index,
                    match_len: m.len(),
                };
                if best.is_none_or(|current| vote.rank() > current.rank()) {
                    best = Some(vote);
                }
            }
        }

        best
    }

    fn collect_terms(
        &self,
        line: &str,
        section_id: Option<&str>,
        keywords: &mut HashMap<String, KeywordEntry>,
        position: &mut usize,
    ) {
        for (_, rule) in self.rules.scoped(RuleScope::Term) {
            for m in rule.pattern.find_iter(line) {
                if rule.skip_sentence_start && starts_sentence(line, m.start()) {
                    continue;
                }
                let term = m.as_str().trim();
                let key = term.to_lowercase();
                if term.is_empty() || STOP_WORDS.contains(&key.as_str()) {
                    continue;
                }

                *position += 1;
                match keywords.get_mut(&key) {
                    Some(entry) => {
                        if rule.confidence > entry.confidence {
                            entry.confidence = rule.confidence;
                            entry.rule = rule.name.clone();
                        }
                    }
                    None => {
                        keywords.insert(
                            key,
                            KeywordEntry {
                                text: term.to_string(),
                                section_id: section_id.map(str::to_string),
                                rule: rule.name.clone(),
                                confidence: rule.confidence,
                                first_seen: *position,
                            },
                        );
                    }
                }
            }
        }
    }

    fn rank_keywords(&self, keywords: HashMap<String, KeywordEntry>) -> Vec<ExtractionItem> {
        let mut entries: Vec<KeywordEntry> = keywords.into_values().collect();
        entries.sort_by_key(|entry| (Reverse(entry.confidence), entry.first_seen));
        entries.truncate(self.max_keywords);

        entries
            .into_iter()
            .map(|entry| ExtractionItem {
                text: entry.text,
                source_section_id: entry.section_id,
                tags: vec![Category::Keyword.tag().to_string(), entry.rule],
                confidence_level: entry.confidence,
            })
            .collect()
    }
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_units<'a>(sections: &'a [Section], raw_text: &'a str) -> Vec<Unit<'a>> {
    if sections.is_empty() {
        return vec![Unit {
            section_id: None,
            title: "",
            lines: raw_text.split('\n').collect(),
        }];
    }

    let mut units = Vec::new();
    for root in sections {
        root.walk(&mut |section, _| {
            units.push(Unit {
                section_id: Some(section.id.as_str()),
                title: section.title.as_str(),
                lines: section.content.iter().map(String::as_str).collect(),
            });
        });
    }
    units
}

fn is_fence(line: &str) -> bool {
    line.starts_with("```") || line.starts_with("~~~")
}

/// Strip list markers from a classified line
fn clean_line(line: &str) -> String {
    LIST_MARKER.replace(line, "").trim().to_string()
}

/// Whether byte offset `start` opens a sentence within `line`
fn starts_sentence(line: &str, start: usize) -> bool {
    let before = line[..start].trim_end();
    let before = LIST_MARKER.replace(before, "");
    before.trim().is_empty() || before.ends_with(['.', '!', '?', ':'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use janusz_core::ConfidenceLevel;

    fn section(id: &str, title: &str, lines: &[&str]) -> Section {
        Section {
            id: id.into(),
            title: title.into(),
            level: 1,
            content: lines.iter().map(|l| l.to_string()).collect(),
            subsections: Vec::new(),
        }
    }

    #[test]
    fn test_classify_empty_input() {
        let analysis = ContentClassifier::new().classify(&[], "");
        assert!(analysis.is_empty());

        let analysis = ContentClassifier::new().classify(&[section("section_0", "", &[""])], "");
        assert!(analysis.is_empty());
    }

    #[test]
    fn test_labelled_best_practice_wins_over_modal() {
        let sections = [section(
            "section_0",
            "Notes",
            &["", "Some best practice: always validate input.", ""],
        )];
        let analysis = ContentClassifier::new().classify(&sections, "");

        assert_eq!(analysis.best_practices.len(), 1);
        let item = &analysis.best_practices[0];
        assert_eq!(item.text, "Some best practice: always validate input.");
        assert_eq!(item.confidence_level, ConfidenceLevel::High);
        assert_eq!(item.tags, vec!["best_practice", "practice_label"]);
        assert_eq!(item.source_section_id.as_deref(), Some("section_0"));
    }

    #[test]
    fn test_modal_sentence_is_medium() {
        let sections = [section("section_0", "Notes", &["You should rotate keys yearly."])];
        let analysis = ContentClassifier::new().classify(&sections, "");
        assert_eq!(analysis.best_practices[0].confidence_level, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_labelled_example() {
        let sections = [section("section_1", "Sub", &["An example: foo()."])];
        let analysis = ContentClassifier::new().classify(&sections, "");

        assert_eq!(analysis.examples.len(), 1);
        assert!(analysis.examples[0].text.contains("foo()"));
        assert_eq!(analysis.examples[0].confidence_level, ConfidenceLevel::High);
        assert!(analysis.best_practices.is_empty());
    }

    #[test]
    fn test_section_title_cue_marks_lines() {
        let sections = [section(
            "section_0",
            "Best Practices",
            &["- Keep secrets out of git", "- Rotate credentials"],
        )];
        let analysis = ContentClassifier::new().classify(&sections, "");

        let texts: Vec<&str> = analysis
            .best_practices
            .iter()
            .map(|item| item.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Keep secrets out of git", "Rotate credentials"]);
        assert!(analysis
            .best_practices
            .iter()
            .all(|item| item.confidence_level == ConfidenceLevel::High));
        assert_eq!(analysis.best_practices[1].tags[1], "practice_section");
    }

    #[test]
    fn test_line_may_be_both_practice_and_example() {
        let sections = [section(
            "section_0",
            "Tips",
            &["Always quote variables, for example \"$HOME\"."],
        )];
        let analysis = ContentClassifier::new().classify(&sections, "");
        assert_eq!(analysis.best_practices.len(), 1);
        assert_eq!(analysis.examples.len(), 1);
    }

    #[test]
    fn test_duplicates_suppressed_within_category() {
        let sections = [
            section("section_0", "A", &["You must back up data."]),
            section("section_1", "B", &["You must back up data."]),
        ];
        let analysis = ContentClassifier::new().classify(&sections, "");
        assert_eq!(analysis.best_practices.len(), 1);
        assert_eq!(
            analysis.best_practices[0].source_section_id.as_deref(),
            Some("section_0")
        );
    }

    #[test]
    fn test_keywords_deduplicated_case_insensitively() {
        let sections = [section(
            "section_0",
            "Overview",
            &["The API talks JSON.", "Every api call returns json and uses utf8."],
        )];
        let analysis = ContentClassifier::new().classify(&sections, "");

        let texts: Vec<String> = analysis
            .keywords
            .iter()
            .map(|item| item.text.to_lowercase())
            .collect();
        assert_eq!(texts.iter().filter(|t| *t == "api").count(), 1);
        assert_eq!(texts.iter().filter(|t| *t == "json").count(), 1);
        assert!(texts.contains(&"utf8".to_string()));
        assert_eq!(analysis.keywords[0].confidence_level, ConfidenceLevel::High);
    }

    #[test]
    fn test_sentence_initial_capitals_are_not_keywords() {
        let sections = [section("section_0", "", &["Something happened near Krakow today."])];
        let analysis = ContentClassifier::new().classify(&sections, "");

        let texts: Vec<&str> = analysis.keywords.iter().map(|k| k.text.as_str()).collect();
        assert!(texts.contains(&"Krakow"));
        assert!(!texts.contains(&"Something"));
    }

    #[test]
    fn test_keywords_capped() {
        let line: String = (0..80).map(|n| format!("term{} ", n)).collect();
        let sections = [section("section_0", "", &[line.as_str()])];
        let analysis = ContentClassifier::new()
            .with_max_keywords(10)
            .classify(&sections, "");
        assert_eq!(analysis.keywords.len(), 10);
        assert_eq!(analysis.keywords[0].text, "term0");
    }

    #[test]
    fn test_raw_text_fallback_has_no_section_reference() {
        let analysis = ContentClassifier::new().classify(&[], "Never commit secrets.");
        assert_eq!(analysis.best_practices.len(), 1);
        assert!(analysis.best_practices[0].source_section_id.is_none());
    }

    #[test]
    fn test_custom_rule_extends_table() {
        let mut table = RuleTable::builtin();
        table.push(
            Rule::new(
                "warning_label",
                Category::BestPractice,
                RuleScope::Line,
                r"^WARNING:",
                ConfidenceLevel::High,
                40,
            )
            .unwrap(),
        );
        let sections = [section("section_0", "", &["WARNING: hot surface"])];
        let analysis = ContentClassifier::with_rules(table).classify(&sections, "");
        assert_eq!(analysis.best_practices[0].tags[1], "warning_label");
    }

    #[test]
    fn test_classification_is_deterministic() {
        let sections = [
            section("section_0", "Usage", &["Run `make test` before pushing.", "Avoid force pushes."]),
            section("section_1", "Rust Notes", &["Prefer Result over panics, e.g. parse()."]),
        ];
        let classifier = ContentClassifier::new();
        assert_eq!(
            classifier.classify(&sections, ""),
            classifier.classify(&sections, "")
        );
    }
}
