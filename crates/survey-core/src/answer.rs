//! Answers to survey questions.
//!
//! An [`Answer`] is one of four variants, one per question type, so each
//! kind of payload has exactly one encoding and one validation path:
//!
//! ```json
//! {"kind": "single",   "value": "<option id>"}
//! {"kind": "multiple", "value": ["<option id>", "..."]}
//! {"kind": "text",     "value": "free text"}
//! {"kind": "range",    "value": 4}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Question, QuestionType};

/// Shown when an answer names an option the question no longer has.
pub const UNKNOWN_OPTION: &str = "Unknown option";

/// Shown in place of the question text when an answer names a question the
/// survey no longer has.
pub const UNKNOWN_QUESTION: &str = "Unknown question";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Answer {
    #[serde(rename = "single")]
    SingleChoice(String),
    #[serde(rename = "multiple")]
    MultiChoice(Vec<String>),
    #[serde(rename = "text")]
    FreeText(String),
    Range(i64),
}

/// One answered question inside a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub question_id: String,
    pub answer: Answer,
}

impl QuestionResponse {
    /// Question text and rendered answer, for display.
    ///
    /// Without a matching question the answer is shown as stored, under
    /// [`UNKNOWN_QUESTION`].
    pub fn describe(&self, question: Option<&Question>) -> (String, String) {
        match question {
            Some(question) => (question.text.clone(), self.answer.render(question)),
            None => (UNKNOWN_QUESTION.to_string(), self.answer.render_raw()),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerError {
    #[error("question {question} expects a {expected} answer, got {actual}")]
    WrongKind {
        question: String,
        expected: QuestionType,
        actual: QuestionType,
    },

    #[error("question {question} has no option {option}")]
    UnknownOption { question: String, option: String },

    #[error("question {question} lists option {option} more than once")]
    DuplicateOption { question: String, option: String },

    #[error("question {question} is required but the answer is empty")]
    Empty { question: String },

    #[error("question {question} accepts {min}..={max}, got {value}")]
    OutOfRange {
        question: String,
        min: i64,
        max: i64,
        value: i64,
    },
}

impl Answer {
    /// The question type this answer is shaped for.
    pub fn kind(&self) -> QuestionType {
        match self {
            Answer::SingleChoice(_) => QuestionType::Single,
            Answer::MultiChoice(_) => QuestionType::Multiple,
            Answer::FreeText(_) => QuestionType::Text,
            Answer::Range(_) => QuestionType::Range,
        }
    }

    /// Check this answer against the question it claims to answer.
    pub fn validate(&self, question: &Question) -> Result<(), AnswerError> {
        if self.kind() != question.kind {
            return Err(AnswerError::WrongKind {
                question: question.id.clone(),
                expected: question.kind,
                actual: self.kind(),
            });
        }

        match self {
            Answer::SingleChoice(option) => check_option(question, option),
            Answer::MultiChoice(options) => {
                if options.is_empty() && question.required {
                    return Err(AnswerError::Empty {
                        question: question.id.clone(),
                    });
                }
                for (i, option) in options.iter().enumerate() {
                    check_option(question, option)?;
                    if options[..i].contains(option) {
                        return Err(AnswerError::DuplicateOption {
                            question: question.id.clone(),
                            option: option.clone(),
                        });
                    }
                }
                Ok(())
            }
            Answer::FreeText(text) => {
                if text.trim().is_empty() && question.required {
                    return Err(AnswerError::Empty {
                        question: question.id.clone(),
                    });
                }
                Ok(())
            }
            Answer::Range(value) => {
                let (min, max) = match (question.range_min, question.range_max) {
                    (Some(min), Some(max)) => (min, max),
                    _ => return Ok(()),
                };
                if *value < min || *value > max {
                    return Err(AnswerError::OutOfRange {
                        question: question.id.clone(),
                        min,
                        max,
                        value: *value,
                    });
                }
                Ok(())
            }
        }
    }

    /// Human-readable rendering: option ids become option text.
    pub fn render(&self, question: &Question) -> String {
        let option_text = |id: &str| {
            question
                .option(id)
                .map(|o| o.text.clone())
                .unwrap_or_else(|| UNKNOWN_OPTION.to_string())
        };

        match self {
            Answer::SingleChoice(id) => option_text(id),
            Answer::MultiChoice(ids) => ids
                .iter()
                .map(|id| option_text(id))
                .collect::<Vec<_>>()
                .join(", "),
            Answer::FreeText(text) => text.clone(),
            Answer::Range(value) => match &question.range_labels {
                Some(labels) if Some(*value) == question.range_min => {
                    format!("{} ({})", value, labels.min)
                }
                Some(labels) if Some(*value) == question.range_max => {
                    format!("{} ({})", value, labels.max)
                }
                _ => value.to_string(),
            },
        }
    }

    /// The stored value as text, without looking up option labels.
    pub fn render_raw(&self) -> String {
        match self {
            Answer::SingleChoice(id) => id.clone(),
            Answer::MultiChoice(ids) => ids.join(", "),
            Answer::FreeText(text) => text.clone(),
            Answer::Range(value) => value.to_string(),
        }
    }
}

fn check_option(question: &Question, option: &str) -> Result<(), AnswerError> {
    if question.option(option).is_none() {
        return Err(AnswerError::UnknownOption {
            question: question.id.clone(),
            option: option.to_string(),
        });
    }
    Ok(())
}
