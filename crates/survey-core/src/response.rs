//! Response submission.
//!
//! Validates a submitted response against the exact survey version it
//! names and stores it. A response stays linked to that survey id forever;
//! superseding the survey creates a new id and leaves old responses alone.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::answer::{AnswerError, QuestionResponse};
use crate::models::{NewResponse, SurveyRecord};
use crate::store::SurveyStore;

/// A response as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub survey_id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub responses: Vec<QuestionResponse>,
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("a valid email address is required")]
    InvalidEmail,

    #[error("at least one answer is required")]
    NoAnswers,

    #[error("survey not found: {0}")]
    SurveyNotFound(String),

    #[error("survey {survey} has no question {question}")]
    UnknownQuestion { survey: String, question: String },

    #[error("question {0} is answered more than once")]
    DuplicateQuestion(String),

    #[error("required question {0} was not answered")]
    MissingRequired(String),

    #[error(transparent)]
    Answer(#[from] AnswerError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Check a submission against a survey without touching the store.
pub fn validate_submission(survey: &SurveyRecord, submit: &SubmitResponse) -> Result<(), ResponseError> {
    let email = submit.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ResponseError::InvalidEmail);
    }
    if submit.responses.is_empty() {
        return Err(ResponseError::NoAnswers);
    }

    let mut answered = HashSet::new();
    for response in &submit.responses {
        let question = survey
            .question(&response.question_id)
            .ok_or_else(|| ResponseError::UnknownQuestion {
                survey: survey.id.clone(),
                question: response.question_id.clone(),
            })?;
        if !answered.insert(question.id.as_str()) {
            return Err(ResponseError::DuplicateQuestion(question.id.clone()));
        }
        response.answer.validate(question)?;
    }

    let missing = survey
        .sections
        .iter()
        .flat_map(|s| s.questions.iter())
        .find(|q| q.required && !answered.contains(q.id.as_str()));
    if let Some(q) = missing {
        return Err(ResponseError::MissingRequired(q.id.clone()));
    }

    Ok(())
}

/// Validate and store a response. Returns the new response id.
pub async fn submit_response(
    store: &dyn SurveyStore,
    submit: SubmitResponse,
) -> Result<String, ResponseError> {
    let survey = store
        .get_survey(&submit.survey_id)
        .await?
        .ok_or_else(|| ResponseError::SurveyNotFound(submit.survey_id.clone()))?;

    validate_submission(&survey, &submit)?;

    let name = submit
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let id = store
        .insert_response(&NewResponse {
            survey_id: survey.id.clone(),
            email: submit.email.trim().to_string(),
            name,
            responses: submit.responses,
        })
        .await?;

    tracing::info!(response_id = %id, survey_id = %survey.id, survey = %survey.title, "response stored");
    Ok(id)
}
