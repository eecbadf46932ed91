//! The classification policy table.
//!
//! Rules are plain data: a pattern, the category it votes for, where it is
//! applied, and how much its match is worth. Table order is the last
//! tie-breaker, so the builtin table lists rules from specific to generic.

use janusz_core::{ConfidenceLevel, JanuszError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// What a rule detects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Keyword,
    BestPractice,
    Example,
}

impl Category {
    /// Tag attached to every item of this category
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::BestPractice => "best_practice",
            Self::Example => "example",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Where a rule's pattern is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Against each content line; a match classifies the line
    Line,
    /// Against a section title; a match classifies every line of the section
    SectionTitle,
    /// Against each line; every match is a keyword term
    Term,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub category: Category,
    pub scope: RuleScope,
    pub pattern: Regex,
    pub confidence: ConfidenceLevel,
    /// Higher wins between rules of equal confidence
    pub priority: u8,
    /// Term rules only: ignore matches that open a sentence
    pub skip_sentence_start: bool,
}

impl Rule {
    /// Compile a rule, failing on an invalid pattern
    pub fn new(
        name: impl Into<String>,
        category: Category,
        scope: RuleScope,
        pattern: &str,
        confidence: ConfidenceLevel,
        priority: u8,
    ) -> Result<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|e| {
            JanuszError::config(format!("Invalid pattern for rule '{}': {}", name, e))
        })?;
        Ok(Self {
            name,
            category,
            scope,
            pattern,
            confidence,
            priority,
            skip_sentence_start: false,
        })
    }

    pub fn skipping_sentence_start(mut self) -> Self {
        self.skip_sentence_start = true;
        self
    }
}

/// Ordered set of classification rules
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

use Category::{BestPractice, Example, Keyword};
use ConfidenceLevel::{High, Low, Medium};
use RuleScope::{Line, SectionTitle, Term};

/// (name, category, scope, pattern, confidence, priority)
type RuleSpec = (&'static str, Category, RuleScope, &'static str, ConfidenceLevel, u8);

const BUILTIN_RULES: &[RuleSpec] = &[
    // best practices
    (
        "practice_label",
        BestPractice,
        Line,
        r"(?i)\b(?:best|good|recommended)\s+practices?\b",
        High,
        30,
    ),
    (
        "guideline_label",
        BestPractice,
        Line,
        r"(?i)^\W*(?:tip|guideline|recommendation|rule of thumb)s?\s*:",
        High,
        25,
    ),
    (
        "explicit_recommendation",
        BestPractice,
        Line,
        r"(?i)\b(?:we|i|it is)\s+(?:strongly\s+)?recommend(?:ed)?\b",
        High,
        20,
    ),
    (
        "practice_section",
        BestPractice,
        SectionTitle,
        r"(?i)\b(?:best practices?|recommendations?|guidelines?|do'?s and don'?ts|tips)\b",
        High,
        15,
    ),
    (
        "modal_verb",
        BestPractice,
        Line,
        r"(?i)\b(?:should|must|always|never|avoid|do not|don't|make sure|ensure)\b",
        Medium,
        10,
    ),
    (
        "leading_imperative",
        BestPractice,
        Line,
        r"^\W*(?:Use|Prefer|Avoid|Keep|Validate|Check|Limit|Document|Test|Handle|Write|Store|Protect|Review|Sanitize|Encrypt)\b",
        Medium,
        8,
    ),
    (
        "advice_marker",
        BestPractice,
        Line,
        r"(?i)\b(?:important|remember|note that|key point)\b",
        Low,
        1,
    ),
    // examples
    (
        "example_label",
        Example,
        Line,
        r"(?i)^\W*(?:an?\s+|for\s+)?(?:example|sample)s?\s*[:\-]",
        High,
        30,
    ),
    (
        "example_phrase",
        Example,
        Line,
        r"(?i)\b(?:for example|for instance|e\.g\.)",
        High,
        25,
    ),
    (
        "example_section",
        Example,
        SectionTitle,
        r"(?i)\b(?:examples?|samples?|demos?|usage)\b",
        High,
        15,
    ),
    (
        "illustration_phrase",
        Example,
        Line,
        r"(?i)\b(?:such as|like this|here is|here's|consider|suppose|imagine)\b",
        Medium,
        10,
    ),
    (
        "inline_code",
        Example,
        Line,
        r"`[^`]+`|\b[A-Za-z_][A-Za-z0-9_.]*\([^()]*\)",
        Medium,
        8,
    ),
    (
        "example_mention",
        Example,
        Line,
        r"(?i)\b(?:example|sample|demo)s?\b",
        Low,
        1,
    ),
    // keywords
    (
        "domain_term",
        Keyword,
        Term,
        r"(?i)\b(?:api|authentication|authorization|security|performance|testing|deployment|database|validation|error handling|logging|configuration|caching|encryption|monitoring|documentation|yaml|json|markdown|docker|kubernetes|python|rust|javascript|typescript|http|rest|graphql|sql|prompt|agent|llm|tokens?|schema)\b",
        High,
        20,
    ),
    (
        "technical_term",
        Keyword,
        Term,
        r"\b[a-zA-Z]+[0-9]+[a-zA-Z0-9]*\b|\b[a-z]+(?:_[a-z0-9]+)+\b|\b[a-z]+[A-Z][A-Za-z]*\b",
        Medium,
        10,
    ),
];

/// Capitalized words are only worth keeping away from sentence starts
const CAPITALIZED_TERM: &str = r"\b[A-Z][a-zA-Z]{3,}\b";

static BUILTIN: Lazy<RuleTable> = Lazy::new(|| {
    let mut table = RuleTable::default();
    for (name, category, scope, pattern, confidence, priority) in BUILTIN_RULES {
        let rule = Rule::new(*name, *category, *scope, pattern, *confidence, *priority)
            .expect("builtin classifier pattern");
        table.push(rule);
    }
    let capitalized = Rule::new("capitalized_term", Keyword, Term, CAPITALIZED_TERM, Low, 1)
        .expect("builtin classifier pattern")
        .skipping_sentence_start();
    table.push(capitalized);
    table
});

impl RuleTable {
    /// The default policy table
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Append a rule; it ranks after every existing rule of equal weight
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules of one scope with their table position
    pub fn scoped(&self, scope: RuleScope) -> impl Iterator<Item = (usize, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .filter(move |(_, rule)| rule.scope == scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_compiles() {
        let table = RuleTable::builtin();
        assert_eq!(table.len(), BUILTIN_RULES.len() + 1);
        assert!(table.scoped(RuleScope::SectionTitle).count() >= 2);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = Rule::new("broken", Category::Example, RuleScope::Line, "(", Low, 1).unwrap_err();
        assert!(matches!(err, JanuszError::Config(_)));
    }

    #[test]
    fn test_builtin_rule_names_unique() {
        let table = RuleTable::builtin();
        let mut names: Vec<&str> = table.rules().iter().map(|r| r.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), table.len());
    }
}
