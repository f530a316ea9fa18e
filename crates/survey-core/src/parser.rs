//! Markdown section parser.
//!
//! Turns the text of one survey markdown file into a [`Section`]. The
//! format is line oriented:
//!
//! ```text
//! # Greeting                                   <- section title (first line)
//! A short introduction.                        <- description (before any question)
//! 1. How satisfied are you?                    <- starts a question
//! -- single                                    <- type directive
//! - Very satisfied                             <- option
//! - Not satisfied
//! 2. How likely are you to recommend us?
//! - 1 (Not likely) → 10 (Very likely)          <- range pair
//! 3. Comments?
//! -- text, optional
//! ```
//!
//! # Algorithm
//!
//! 1. Drop blank lines.
//! 2. The first remaining line is the heading. `# <title>` gives the
//!    section title; anything else falls back to `"Untitled Section"`.
//!    The line is consumed either way.
//! 3. Every further line is trimmed and classified, in precedence order:
//!    numbered question, single-dash option (or range pair), double-dash
//!    type directive, plain text.
//! 4. A [`SectionParser`] state machine applies each classified line. It is
//!    either idle (no question yet) or accumulating one question; starting
//!    a new question and reaching end of input both flush the pending one.
//!
//! Malformed input never fails: unknown lines are ignored and missing
//! pieces fall back to defaults. Every section, question and option gets a
//! fresh UUID on each parse, so ids are not stable across re-parses.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::models::{Question, QuestionOption, QuestionType, RangeLabels, Section};

/// Title used when the first line is not a `# ` heading.
pub const UNTITLED_SECTION: &str = "Untitled Section";

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s+(.+)$").expect("heading pattern compiles"));
static QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s+(.+)$").expect("question pattern compiles"));
static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s+(.+)$").expect("option pattern compiles"));
static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--\s+(.+)$").expect("directive pattern compiles"));
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+)\s*\(([^()]+)\)\s*(?:→|->)\s*(-?\d+)\s*\(([^()]+)\)$")
        .expect("range pattern compiles")
});

/// Type keywords recognized in a directive, checked in this order.
const TYPE_KEYWORDS: [(&str, QuestionType); 4] = [
    ("single", QuestionType::Single),
    ("multiple", QuestionType::Multiple),
    ("text", QuestionType::Text),
    ("range", QuestionType::Range),
];

/// Numeric bounds and labels of a range question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    pub min: i64,
    pub min_label: String,
    pub max: i64,
    pub max_label: String,
}

/// One classified markdown line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Question(&'a str),
    Option(&'a str),
    Range(RangeSpec),
    Directive(&'a str),
    Plain(&'a str),
}

/// Classify a trimmed line by its leading syntax.
pub fn classify_line(line: &str) -> Line<'_> {
    if let Some(caps) = QUESTION_RE.captures(line) {
        if let Some(text) = caps.get(2) {
            return Line::Question(text.as_str().trim());
        }
    }
    if let Some(caps) = OPTION_RE.captures(line) {
        if let Some(text) = caps.get(1) {
            let text = text.as_str().trim();
            return match parse_range(text) {
                Some(range) => Line::Range(range),
                None => Line::Option(text),
            };
        }
    }
    if let Some(caps) = DIRECTIVE_RE.captures(line) {
        if let Some(text) = caps.get(1) {
            return Line::Directive(text.as_str().trim());
        }
    }
    Line::Plain(line)
}

/// Parse `<int> (<label>) → <int> (<label>)`.
///
/// Returns `None` unless both bounds parse, both labels are non-empty, and
/// `min < max`.
pub fn parse_range(text: &str) -> Option<RangeSpec> {
    let caps = RANGE_RE.captures(text)?;
    let min: i64 = caps.get(1)?.as_str().parse().ok()?;
    let min_label = caps.get(2)?.as_str().trim();
    let max: i64 = caps.get(3)?.as_str().parse().ok()?;
    let max_label = caps.get(4)?.as_str().trim();

    if min >= max || min_label.is_empty() || max_label.is_empty() {
        return None;
    }

    Some(RangeSpec {
        min,
        min_label: min_label.to_string(),
        max,
        max_label: max_label.to_string(),
    })
}

/// Parse one markdown file's text into a [`Section`].
pub fn parse_section(markdown: &str) -> Section {
    let mut lines = markdown.lines().map(str::trim).filter(|l| !l.is_empty());

    let title = match lines.next() {
        Some(first) => match HEADING_RE.captures(first).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().trim().to_string(),
            None => {
                tracing::warn!(line = first, "section has no '# ' heading; using default title");
                UNTITLED_SECTION.to_string()
            }
        },
        None => UNTITLED_SECTION.to_string(),
    };

    let mut parser = SectionParser::new(title);
    for line in lines {
        parser.feed(classify_line(line));
    }
    parser.finish()
}

/// A question being built up line by line.
#[derive(Debug)]
struct PendingQuestion {
    text: String,
    kind: QuestionType,
    required: bool,
    options: Vec<QuestionOption>,
    range: Option<RangeSpec>,
}

impl PendingQuestion {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: QuestionType::default(),
            required: true,
            options: Vec::new(),
            range: None,
        }
    }

    fn apply_directive(&mut self, directive: &str) {
        let lower = directive.to_lowercase();

        if let Some((_, kind)) = TYPE_KEYWORDS.iter().find(|(kw, _)| lower.contains(kw)) {
            self.kind = *kind;
            if self.kind == QuestionType::Text {
                self.options.clear();
            }
        }

        if lower.contains("optional") {
            self.required = false;
        } else if lower.contains("required") {
            self.required = true;
        }
    }

    /// Finalize into a [`Question`], enforcing the per-type invariants.
    fn into_question(self, section_title: &str) -> Question {
        let PendingQuestion {
            text,
            mut kind,
            required,
            mut options,
            range,
        } = self;

        let mut range = range;
        match kind {
            QuestionType::Text => {
                options.clear();
                range = None;
            }
            QuestionType::Range if range.is_some() => options.clear(),
            QuestionType::Range => {
                tracing::warn!(
                    section = section_title,
                    question = %text,
                    "range question has no bounds line; treating it as single choice"
                );
                kind = QuestionType::Single;
            }
            QuestionType::Single | QuestionType::Multiple => range = None,
        }

        let (range_min, range_max, range_labels) = match range {
            Some(r) => (
                Some(r.min),
                Some(r.max),
                Some(RangeLabels {
                    min: r.min_label,
                    max: r.max_label,
                }),
            ),
            None => (None, None, None),
        };

        Question {
            id: Uuid::new_v4().to_string(),
            text,
            kind,
            required,
            options,
            range_min,
            range_max,
            range_labels,
        }
    }
}

#[derive(Debug)]
enum ParseState {
    Idle,
    Accumulating(PendingQuestion),
}

/// Line-driven state machine that assembles one section.
#[derive(Debug)]
pub struct SectionParser {
    title: String,
    description: Vec<String>,
    questions: Vec<Question>,
    state: ParseState,
}

impl SectionParser {
    pub fn new(title: String) -> Self {
        Self {
            title,
            description: Vec::new(),
            questions: Vec::new(),
            state: ParseState::Idle,
        }
    }

    pub fn feed(&mut self, line: Line<'_>) {
        match line {
            Line::Question(text) => {
                self.flush();
                self.state = ParseState::Accumulating(PendingQuestion::new(text));
            }
            Line::Option(text) => {
                if let ParseState::Accumulating(q) = &mut self.state {
                    q.options.push(QuestionOption {
                        id: Uuid::new_v4().to_string(),
                        text: text.to_string(),
                    });
                }
            }
            Line::Range(range) => {
                if let ParseState::Accumulating(q) = &mut self.state {
                    q.kind = QuestionType::Range;
                    q.options.clear();
                    q.range = Some(range);
                }
            }
            Line::Directive(text) => {
                if let ParseState::Accumulating(q) = &mut self.state {
                    q.apply_directive(text);
                }
            }
            Line::Plain(text) => {
                if let ParseState::Idle = self.state {
                    self.description.push(text.to_string());
                }
            }
        }
    }

    /// Move the pending question, if any, into the finished list.
    pub fn flush(&mut self) {
        if let ParseState::Accumulating(q) = std::mem::replace(&mut self.state, ParseState::Idle) {
            self.questions.push(q.into_question(&self.title));
        }
    }

    pub fn finish(mut self) -> Section {
        self.flush();
        let description = if self.description.is_empty() {
            None
        } else {
            Some(self.description.join(" "))
        };
        Section {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            description,
            questions: self.questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: &str = "# Greeting\n1. How satisfied are you?\n-- single\n- Very satisfied\n- Not satisfied\n2. Comments?\n-- text\n";

    fn option_texts(q: &Question) -> Vec<&str> {
        q.options.iter().map(|o| o.text.as_str()).collect()
    }

    #[test]
    fn test_greeting_example() {
        let section = parse_section(GREETING);
        assert_eq!(section.title, "Greeting");
        assert_eq!(section.questions.len(), 2);

        let q1 = &section.questions[0];
        assert_eq!(q1.text, "How satisfied are you?");
        assert_eq!(q1.kind, QuestionType::Single);
        assert!(q1.required);
        assert_eq!(option_texts(q1), vec!["Very satisfied", "Not satisfied"]);

        let q2 = &section.questions[1];
        assert_eq!(q2.text, "Comments?");
        assert_eq!(q2.kind, QuestionType::Text);
        assert!(q2.options.is_empty());
    }

    #[test]
    fn test_missing_heading_uses_placeholder() {
        let section = parse_section("Welcome\n1. First?\n- Yes\n");
        assert_eq!(section.title, UNTITLED_SECTION);
        assert_eq!(section.questions.len(), 1);
    }

    #[test]
    fn test_first_line_consumed_even_when_not_heading() {
        let section = parse_section("1. Lost question?\n2. Kept question?\n");
        assert_eq!(section.title, UNTITLED_SECTION);
        assert_eq!(section.questions.len(), 1);
        assert_eq!(section.questions[0].text, "Kept question?");
    }

    #[test]
    fn test_empty_input() {
        let section = parse_section("\n\n   \n");
        assert_eq!(section.title, UNTITLED_SECTION);
        assert!(section.questions.is_empty());
        assert!(section.description.is_none());
    }

    #[test]
    fn test_blank_lines_and_crlf_ignored() {
        let section = parse_section("# T\r\n\r\n1. Q?\r\n\r\n- A\r\n- B\r\n");
        assert_eq!(section.title, "T");
        assert_eq!(option_texts(&section.questions[0]), vec!["A", "B"]);
    }

    #[test]
    fn test_range_line_sets_range_and_discards_options() {
        let md = "# Scale\n1. Agree?\n- Yes\n- No\n- 1 (Strongly disagree) → 5 (Strongly agree)\n";
        let section = parse_section(md);
        let q = &section.questions[0];
        assert_eq!(q.kind, QuestionType::Range);
        assert!(q.options.is_empty());
        assert_eq!(q.range_min, Some(1));
        assert_eq!(q.range_max, Some(5));
        let labels = q.range_labels.as_ref().unwrap();
        assert_eq!(labels.min, "Strongly disagree");
        assert_eq!(labels.max, "Strongly agree");
    }

    #[test]
    fn test_ascii_arrow_range() {
        let range = parse_range("0 (Never) -> 10 (Always)").unwrap();
        assert_eq!((range.min, range.max), (0, 10));
        assert_eq!(range.max_label, "Always");
    }

    #[test]
    fn test_inverted_range_is_plain_option() {
        let section = parse_section("# S\n1. Q?\n- 5 (High) → 1 (Low)\n");
        let q = &section.questions[0];
        assert_eq!(q.kind, QuestionType::Single);
        assert_eq!(option_texts(q), vec!["5 (High) → 1 (Low)"]);
        assert!(q.range_min.is_none());
    }

    #[test]
    fn test_range_directive_without_bounds_falls_back_to_single() {
        let section = parse_section("# S\n1. Q?\n-- range\n- A\n");
        let q = &section.questions[0];
        assert_eq!(q.kind, QuestionType::Single);
        assert_eq!(option_texts(q), vec!["A"]);
    }

    #[test]
    fn test_options_after_range_are_dropped() {
        let section = parse_section("# S\n1. Q?\n- 1 (Lo) → 3 (Hi)\n- stray\n");
        let q = &section.questions[0];
        assert_eq!(q.kind, QuestionType::Range);
        assert!(q.options.is_empty());
    }

    #[test]
    fn test_directive_after_range_drops_range_metadata() {
        let section = parse_section("# S\n1. Q?\n- 1 (Lo) → 3 (Hi)\n-- multiple\n- A\n");
        let q = &section.questions[0];
        assert_eq!(q.kind, QuestionType::Multiple);
        assert!(q.range_min.is_none());
        assert!(q.range_labels.is_none());
        assert_eq!(option_texts(q), vec!["A"]);
    }

    #[test]
    fn test_text_directive_clears_options() {
        let section = parse_section("# S\n1. Q?\n- A\n- B\n-- Text answer\n- C\n");
        let q = &section.questions[0];
        assert_eq!(q.kind, QuestionType::Text);
        assert!(q.options.is_empty());
    }

    #[test]
    fn test_directive_first_keyword_wins_case_insensitive() {
        let section = parse_section("# S\n1. Q?\n-- MULTIPLE or single\n- A\n");
        assert_eq!(section.questions[0].kind, QuestionType::Single);

        let section = parse_section("# S\n1. Q?\n-- Multiple Choice\n- A\n");
        assert_eq!(section.questions[0].kind, QuestionType::Multiple);
    }

    #[test]
    fn test_unknown_directive_keeps_type() {
        let section = parse_section("# S\n1. Q?\n-- dropdown\n- A\n");
        assert_eq!(section.questions[0].kind, QuestionType::Single);
    }

    #[test]
    fn test_optional_directive() {
        let section = parse_section("# S\n1. Q?\n-- text, optional\n2. R?\n");
        assert!(!section.questions[0].required);
        assert_eq!(section.questions[0].kind, QuestionType::Text);
        assert!(section.questions[1].required);
    }

    #[test]
    fn test_dash_lines_before_question_ignored() {
        let section = parse_section("# S\n- orphan\n-- text\n1. Q?\n- A\n");
        assert_eq!(section.questions.len(), 1);
        assert_eq!(section.questions[0].kind, QuestionType::Single);
        assert_eq!(option_texts(&section.questions[0]), vec!["A"]);
    }

    #[test]
    fn test_description_from_leading_plain_lines() {
        let section = parse_section("# S\nTell us about\nyour visit.\n1. Q?\nignored line\n- A\n");
        assert_eq!(section.description.as_deref(), Some("Tell us about your visit."));
        assert_eq!(option_texts(&section.questions[0]), vec!["A"]);
    }

    #[test]
    fn test_ids_are_fresh_per_parse() {
        let a = parse_section(GREETING);
        let b = parse_section(GREETING);
        assert_ne!(a.id, b.id);
        assert_ne!(a.questions[0].id, b.questions[0].id);
        assert_ne!(a.questions[0].options[0].id, b.questions[0].options[0].id);
    }

    #[test]
    fn test_option_ids_unique_within_question() {
        let section = parse_section("# S\n1. Q?\n- A\n- A\n- B\n");
        let ids: std::collections::HashSet<_> =
            section.questions[0].options.iter().map(|o| &o.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_classify_precedence() {
        assert_eq!(classify_line("12. Twelve?"), Line::Question("Twelve?"));
        assert_eq!(classify_line("- Option"), Line::Option("Option"));
        assert_eq!(classify_line("-- single"), Line::Directive("single"));
        assert_eq!(classify_line("-nospace"), Line::Plain("-nospace"));
        assert!(matches!(classify_line("- 1 (a) → 2 (b)"), Line::Range(_)));
    }
}
