//! Storage abstraction for survey-seed.
//!
//! The [`SurveyStore`] trait defines every persistence operation the
//! reconciliation engine and response submission need, so the SQLite
//! backend and the in-memory test store are interchangeable.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{NewResponse, NewSurvey, ResponseRecord, SurveyIndexEntry, SurveyRecord};

/// Abstract storage backend for surveys and responses.
///
/// Survey content is immutable once created: the only mutation of an
/// existing survey is [`set_active`](SurveyStore::set_active).
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`survey_index`](SurveyStore::survey_index) | All surveys (active and inactive), reconciliation attributes only |
/// | [`create_survey`](SurveyStore::create_survey) | Insert a new active survey version |
/// | [`set_active`](SurveyStore::set_active) | Flip a survey's active flag |
/// | [`get_survey`](SurveyStore::get_survey) | Full survey by id |
/// | [`list_surveys`](SurveyStore::list_surveys) | Surveys, newest first |
/// | [`insert_response`](SurveyStore::insert_response) | Store a submitted response |
/// | [`responses_for_survey`](SurveyStore::responses_for_survey) | Responses linked to one survey version |
/// | [`count_responses`](SurveyStore::count_responses) | Number of responses across all surveys |
/// | [`list_responses`](SurveyStore::list_responses) | One page of responses across all surveys, newest first |
#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Every persisted survey, including inactive ones.
    async fn survey_index(&self) -> Result<Vec<SurveyIndexEntry>>;

    /// Create an active survey with a fresh id. Returns the id.
    async fn create_survey(&self, survey: &NewSurvey) -> Result<String>;

    /// Set the active flag of an existing survey.
    async fn set_active(&self, id: &str, active: bool) -> Result<()>;

    async fn get_survey(&self, id: &str) -> Result<Option<SurveyRecord>>;

    /// Surveys ordered newest first; inactive ones only when asked.
    async fn list_surveys(&self, include_inactive: bool) -> Result<Vec<SurveyRecord>>;

    /// Store a response. Returns the response id.
    async fn insert_response(&self, response: &NewResponse) -> Result<String>;

    async fn responses_for_survey(&self, survey_id: &str) -> Result<Vec<ResponseRecord>>;

    async fn count_responses(&self) -> Result<usize>;

    /// Responses to any survey, newest first, skipping `offset` and
    /// returning at most `limit`.
    async fn list_responses(&self, offset: usize, limit: usize) -> Result<Vec<ResponseRecord>>;
}
