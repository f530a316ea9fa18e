//! Core data models used throughout survey-seed.
//!
//! These types represent the parsed survey content, the in-memory survey
//! units that flow through reconciliation, and the persisted survey and
//! response records.
//!
//! The question/section/survey types serialize to the camelCase JSON shape
//! the REST layer serves, so a stored `sections` payload can be handed to a
//! client unchanged.

use serde::{Deserialize, Serialize};

use crate::answer::QuestionResponse;

/// Separator used to join source file names in [`SurveyRecord::source_file`].
pub const SOURCE_FILE_SEPARATOR: char = ',';

/// One selectable option of a `single` or `multiple` question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Single,
    Multiple,
    Text,
    Range,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Text => "text",
            QuestionType::Range => "range",
        }
    }

    /// Whether questions of this type carry a list of options.
    pub fn has_options(&self) -> bool {
        matches!(self, QuestionType::Single | QuestionType::Multiple)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels shown at the two ends of a `range` question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeLabels {
    pub min: String,
    pub max: String,
}

/// A single survey question.
///
/// `text` questions never carry options; `range` questions carry no options
/// but always carry `range_min < range_max` and both labels. The parser
/// enforces this when it finalizes a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_labels: Option<RangeLabels>,
}

impl Question {
    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// One section of a survey, produced from one markdown file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

/// Parsed survey content, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyData {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sections: Vec<Section>,
}

/// A markdown file read during one ingestion run. Never persisted.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
    pub fingerprint: String,
}

/// A logical survey before persistence: one or more parsed sections plus
/// the files they came from and the fingerprint over those files.
#[derive(Debug, Clone)]
pub struct SurveyUnit {
    pub title: String,
    pub description: Option<String>,
    pub sections: Vec<Section>,
    pub source_files: Vec<String>,
    pub fingerprint: String,
}

impl SurveyUnit {
    /// The order-preserving, comma-joined file list stored on the record.
    pub fn source_file(&self) -> String {
        join_source_files(&self.source_files)
    }

    pub fn to_new_survey(&self) -> NewSurvey {
        NewSurvey {
            data: SurveyData {
                title: self.title.clone(),
                description: self.description.clone(),
                sections: self.sections.clone(),
            },
            source_file: self.source_file(),
            file_hash: self.fingerprint.clone(),
        }
    }
}

/// Everything the store needs to create a survey record.
#[derive(Debug, Clone)]
pub struct NewSurvey {
    pub data: SurveyData,
    pub source_file: String,
    pub file_hash: String,
}

/// A persisted survey version.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub sections: Vec<Section>,
    pub is_active: bool,
    pub source_file: String,
    pub file_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SurveyRecord {
    pub fn index_entry(&self) -> SurveyIndexEntry {
        SurveyIndexEntry {
            id: self.id.clone(),
            title: self.title.clone(),
            source_file: self.source_file.clone(),
            is_active: self.is_active,
            file_hash: self.file_hash.clone(),
            created_at: self.created_at,
        }
    }

    /// Find a question anywhere in the survey by id.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.sections
            .iter()
            .flat_map(|s| s.questions.iter())
            .find(|q| q.id == question_id)
    }
}

/// The attributes reconciliation needs from each persisted survey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyIndexEntry {
    pub id: String,
    pub title: String,
    pub source_file: String,
    pub is_active: bool,
    pub file_hash: String,
    pub created_at: i64,
}

impl SurveyIndexEntry {
    pub fn source_files(&self) -> Vec<String> {
        split_source_files(&self.source_file)
    }
}

/// A response to store, already validated.
#[derive(Debug, Clone)]
pub struct NewResponse {
    pub survey_id: String,
    pub email: String,
    pub name: Option<String>,
    pub responses: Vec<QuestionResponse>,
}

/// A stored survey response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub id: String,
    pub survey_id: String,
    pub email: String,
    pub name: Option<String>,
    pub responses: Vec<QuestionResponse>,
    pub created_at: i64,
}

pub fn join_source_files(names: &[String]) -> String {
    names.join(&SOURCE_FILE_SEPARATOR.to_string())
}

/// Split a stored `source_file` value back into file names.
///
/// Empty segments are dropped. Names are kept verbatim, so a name with
/// leading or trailing spaces survives the round trip.
pub fn split_source_files(source_file: &str) -> Vec<String> {
    source_file
        .split(SOURCE_FILE_SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_source_files_preserves_order() {
        let names = split_source_files("B_Part2.md,A_Part1.md,,");
        assert_eq!(names, vec!["B_Part2.md", "A_Part1.md"]);
    }

    #[test]
    fn test_split_keeps_surrounding_spaces() {
        let names = vec![" Survey.md".to_string(), "Notes .md".to_string()];
        assert_eq!(split_source_files(&join_source_files(&names)), names);
    }

    #[test]
    fn test_question_serializes_camel_case() {
        let q = Question {
            id: "q1".into(),
            text: "Rate us".into(),
            kind: QuestionType::Range,
            required: true,
            options: Vec::new(),
            range_min: Some(1),
            range_max: Some(5),
            range_labels: Some(RangeLabels {
                min: "Bad".into(),
                max: "Good".into(),
            }),
        };
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "range");
        assert_eq!(json["rangeMin"], 1);
        assert_eq!(json["rangeLabels"]["max"], "Good");
        assert!(json.get("options").is_none());
    }
}
