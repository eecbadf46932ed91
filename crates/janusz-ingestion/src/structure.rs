//! Structural parser: turns extracted text into the section tree.
//!
//! Lines are scanned once, in order. A heading at depth `d` first closes
//! every open section whose level is `>= d`, then opens a new one; other
//! lines go to the innermost open section. Open sections live on an explicit
//! stack of builders owned by the parse call.

use crate::readers::{ExtractedText, StructuralHint, StructureMode};
use janusz_core::Section;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static ATX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").expect("atx heading pattern"));

static NUMBERED_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*)\.?\s+(\S.*)$").expect("numbered heading pattern")
});

/// Longest line still considered a heuristic heading
const MAX_HEADING_CHARS: usize = 80;
const MAX_TITLE_CASE_WORDS: usize = 10;

/// Words that may stay lowercase inside a Title Case heading
const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "into", "of", "on", "or", "the",
    "to", "vs", "via", "with",
];

/// How a heuristic heading was recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadingShape {
    Marker,
    Numbered,
    AllCaps,
    TitleCase,
    Styled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Heading {
    level: usize,
    title: String,
    /// Last line consumed by the heading
    end_line: usize,
    shape: HeadingShape,
}

/// An open section being filled
struct SectionBuilder {
    id: String,
    title: String,
    level: usize,
    shape: HeadingShape,
    content: Vec<String>,
    subsections: Vec<Section>,
}

impl SectionBuilder {
    fn build(self) -> Section {
        Section {
            id: self.id,
            title: self.title,
            level: self.level,
            content: self.content,
            subsections: self.subsections,
        }
    }
}

/// Parse state for one document
struct TreeBuilder {
    next_id: usize,
    roots: Vec<Section>,
    stack: Vec<SectionBuilder>,
    preamble: Vec<String>,
    saw_heading: bool,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            next_id: 0,
            roots: Vec::new(),
            stack: Vec::new(),
            preamble: Vec::new(),
            saw_heading: false,
        }
    }

    fn allocate_id(&mut self) -> String {
        let id = format!("section_{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn attach(&mut self, section: Section) {
        match self.stack.last_mut() {
            Some(parent) => parent.subsections.push(section),
            None => self.roots.push(section),
        }
    }

    fn close_top(&mut self) {
        if let Some(builder) = self.stack.pop() {
            let section = builder.build();
            self.attach(section);
        }
    }

    /// Text seen before the first heading becomes an untitled section
    fn flush_preamble(&mut self) {
        let preamble = std::mem::take(&mut self.preamble);
        if preamble.iter().any(|line| !line.trim().is_empty()) {
            let id = self.allocate_id();
            self.roots.push(Section {
                id,
                title: String::new(),
                level: 0,
                content: preamble,
                subsections: Vec::new(),
            });
        }
    }

    fn open(&mut self, heading: Heading) {
        if !self.saw_heading {
            self.saw_heading = true;
            self.flush_preamble();
        }

        while self
            .stack
            .last()
            .is_some_and(|top| top.level >= heading.level)
        {
            self.close_top();
        }

        let id = self.allocate_id();
        self.stack.push(SectionBuilder {
            id,
            title: heading.title,
            level: heading.level,
            shape: heading.shape,
            content: Vec::new(),
            subsections: Vec::new(),
        });
    }

    fn push_line(&mut self, line: &str) {
        match self.stack.last_mut() {
            Some(open) => open.content.push(line.to_string()),
            None => self.preamble.push(line.to_string()),
        }
    }

    fn inside_all_caps(&self) -> bool {
        self.stack.iter().any(|open| open.shape == HeadingShape::AllCaps)
    }

    fn finish(mut self) -> Vec<Section> {
        while !self.stack.is_empty() {
            self.close_top();
        }

        if !self.saw_heading {
            let id = self.allocate_id();
            self.roots.push(Section {
                id,
                title: String::new(),
                level: 0,
                content: std::mem::take(&mut self.preamble),
                subsections: Vec::new(),
            });
        }

        self.roots
    }
}

/// Builds the section tree for extracted text
#[derive(Debug, Clone, Default)]
pub struct StructureParser;

impl StructureParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse extracted text into ordered top-level sections
    pub fn parse(&self, text: &ExtractedText) -> Vec<Section> {
        match text.mode {
            StructureMode::Opaque => Vec::new(),
            mode => self.parse_text(&text.raw_text, &text.hints, mode),
        }
    }

    /// Parse raw text with explicit hints or heuristics
    pub fn parse_text(
        &self,
        raw_text: &str,
        hints: &[StructuralHint],
        mode: StructureMode,
    ) -> Vec<Section> {
        let lines: Vec<&str> = raw_text.split('\n').collect();

        let mut explicit: HashMap<usize, Heading> = HashMap::new();
        let mut ignored: HashSet<usize> = HashSet::new();
        let mut page_starts: HashSet<usize> = HashSet::new();

        for hint in hints {
            match hint {
                StructuralHint::Heading {
                    line,
                    end_line,
                    level,
                    title,
                } => {
                    explicit.insert(
                        *line,
                        Heading {
                            level: (*level).max(1),
                            title: title.clone(),
                            end_line: (*end_line).max(*line),
                            shape: HeadingShape::Styled,
                        },
                    );
                }
                StructuralHint::PageBreak { line, .. } => {
                    page_starts.insert(*line);
                }
                StructuralHint::Ignore { line, end_line } => {
                    ignored.extend(*line..=*end_line);
                }
            }
        }

        let mut tree = TreeBuilder::new();
        let mut idx = 0;

        while idx < lines.len() {
            if ignored.contains(&idx) {
                idx += 1;
                continue;
            }

            let heading = match mode {
                StructureMode::Explicit => explicit.get(&idx).cloned(),
                _ => explicit.get(&idx).cloned().or_else(|| {
                    detect_heading(&lines, idx, page_starts.contains(&idx), tree.inside_all_caps())
                }),
            };

            match heading {
                Some(heading) => {
                    tracing::trace!("Heading at line {}: {:?}", idx, heading.title);
                    let next = heading.end_line + 1;
                    tree.open(heading);
                    idx = next;
                }
                None => {
                    tree.push_line(lines[idx]);
                    idx += 1;
                }
            }
        }

        tree.finish()
    }
}

fn is_blank(lines: &[&str], idx: usize) -> bool {
    lines.get(idx).is_none_or(|line| line.trim().is_empty())
}

/// Recognize a heading from the shape of line `idx` and its neighbours
fn detect_heading(
    lines: &[&str],
    idx: usize,
    page_start: bool,
    inside_all_caps: bool,
) -> Option<Heading> {
    let line = lines[idx].trim();
    if line.is_empty() {
        return None;
    }

    if let Some(caps) = ATX_HEADING.captures(line) {
        return Some(Heading {
            level: caps[1].len(),
            title: caps[2].trim().to_string(),
            end_line: idx,
            shape: HeadingShape::Marker,
        });
    }

    let isolated_before = idx == 0 || page_start || is_blank(lines, idx - 1);
    let isolated_after = is_blank(lines, idx + 1);
    if !isolated_before || !isolated_after || line.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    if line.ends_with(['.', ',', ';', '!', '?']) {
        return None;
    }

    if let Some(caps) = NUMBERED_HEADING.captures(line) {
        let depth = caps[1].split('.').count();
        return Some(Heading {
            level: depth,
            title: line.to_string(),
            end_line: idx,
            shape: HeadingShape::Numbered,
        });
    }

    if is_all_caps(line) {
        return Some(Heading {
            level: 1,
            title: line.to_string(),
            end_line: idx,
            shape: HeadingShape::AllCaps,
        });
    }

    if is_title_case(line) {
        return Some(Heading {
            level: if inside_all_caps { 2 } else { 1 },
            title: line.to_string(),
            end_line: idx,
            shape: HeadingShape::TitleCase,
        });
    }

    None
}

fn is_all_caps(line: &str) -> bool {
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

fn is_title_case(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() < 2 || words.len() > MAX_TITLE_CASE_WORDS || line.ends_with(':') {
        return false;
    }

    words.iter().enumerate().all(|(pos, word)| {
        let Some(first) = word.chars().find(|c| c.is_alphanumeric()) else {
            return true;
        };
        if first.is_uppercase() || first.is_numeric() {
            return true;
        }
        pos > 0 && MINOR_WORDS.contains(&word.to_lowercase().as_str())
    })
}
