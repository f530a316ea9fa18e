//! Survey assembly: grouping file names into survey units and building
//! those units from parsed sections.
//!
//! Grouping rules:
//!
//! | File name | Result |
//! |-----------|--------|
//! | `<prefix>_Part<N>.md`, ≥ 2 files share `<prefix>` | one multi-section survey titled `<prefix>` |
//! | `<prefix>_Part<N>.md`, the only file for `<prefix>` | skipped (reported, not ingested) |
//! | `README.md` | never ingested |
//! | any name containing `,` | skipped (the stored file list is comma-joined) |
//! | any other `*.md` | one single-section survey titled from the file stem |
//!
//! `Part` matches case-insensitively. Underscores in titles become spaces.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::fingerprint::combined_fingerprint;
use crate::models::{SourceFile, SurveyUnit, SOURCE_FILE_SEPARATOR};
use crate::parser::parse_section;

/// File name that is never treated as survey content.
pub const README_FILE: &str = "README.md";

static PART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)_Part\d+\.md$").expect("part pattern compiles"));

/// Whether a unit was assembled from one file or from a group of parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Single,
    MultiSection,
}

/// A survey unit to build: its grouping key, display metadata and member
/// files (sorted ascending for multi-section units).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPlan {
    pub key: String,
    pub kind: UnitKind,
    pub title: String,
    pub description: String,
    pub files: Vec<String>,
}

/// The outcome of grouping a directory listing.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub units: Vec<UnitPlan>,
    /// Files that form no survey: `_Part<N>` files with no sibling parts,
    /// and names the stored file list cannot represent.
    pub skipped: Vec<String>,
}

/// The `<prefix>` of a `<prefix>_Part<N>.md` file name.
pub fn part_prefix(name: &str) -> Option<&str> {
    PART_RE
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Whether a listed file is survey content at all.
pub fn is_survey_file(name: &str) -> bool {
    name.ends_with(".md") && name != README_FILE
}

/// Title for a single-file survey: stem with underscores as spaces.
pub fn title_from_file_name(name: &str) -> String {
    name.strip_suffix(".md").unwrap_or(name).replace('_', " ")
}

pub fn title_from_prefix(prefix: &str) -> String {
    prefix.replace('_', " ")
}

/// Group file names into unit plans.
///
/// Input order does not matter; plans come out sorted by key.
pub fn plan_units(names: &[String]) -> Grouping {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut singles: Vec<String> = Vec::new();

    let mut grouping = Grouping::default();

    for name in names.iter().filter(|n| is_survey_file(n)) {
        if name.contains(SOURCE_FILE_SEPARATOR) {
            tracing::warn!(file = %name, "file name contains a comma; it is not ingested");
            grouping.skipped.push(name.clone());
            continue;
        }
        match part_prefix(name) {
            Some(prefix) => groups.entry(prefix.to_string()).or_default().push(name.clone()),
            None => singles.push(name.clone()),
        }
    }

    for (prefix, mut files) in groups {
        if files.len() < 2 {
            tracing::warn!(
                prefix = %prefix,
                files = ?files,
                "part file has no sibling parts; it is not ingested"
            );
            grouping.skipped.extend(files);
            continue;
        }
        files.sort();
        grouping.units.push(UnitPlan {
            title: title_from_prefix(&prefix),
            description: format!(
                "Multi-section survey created from {} files with prefix \"{}\"",
                files.len(),
                prefix
            ),
            key: prefix,
            kind: UnitKind::MultiSection,
            files,
        });
    }

    for name in singles {
        grouping.units.push(UnitPlan {
            key: name.clone(),
            kind: UnitKind::Single,
            title: title_from_file_name(&name),
            description: format!("Survey created from {}", name),
            files: vec![name],
        });
    }

    grouping.units.sort_by(|a, b| a.key.cmp(&b.key));
    grouping.skipped.sort();
    grouping
}

/// Build a [`SurveyUnit`] from a plan and its already-read member files.
///
/// Sections follow file-name order regardless of the order of `files`.
pub fn assemble(plan: &UnitPlan, files: &[SourceFile]) -> SurveyUnit {
    let mut ordered: Vec<&SourceFile> = files.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    let sections = ordered
        .iter()
        .map(|f| {
            let section = parse_section(&f.content);
            tracing::debug!(file = %f.name, section = %section.title, questions = section.questions.len(), "parsed section");
            section
        })
        .collect();

    SurveyUnit {
        title: plan.title.clone(),
        description: Some(plan.description.clone()),
        sections,
        source_files: ordered.iter().map(|f| f.name.clone()).collect(),
        fingerprint: combined_fingerprint(files),
    }
}
