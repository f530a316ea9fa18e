//! Survey retrieval: `get`, `list` and `responses` (per survey, or paged
//! across all surveys).
//!
//! Reads only; none of these touch `is_active` or create records.

use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::Serialize;

use survey_core::models::{ResponseRecord, SurveyRecord};
use survey_core::store::SurveyStore;

use crate::config::Config;
use crate::sqlite_store::SqliteSurveyStore;

/// Shown for a response submitted without a name.
pub const ANONYMOUS: &str = "Anonymous";

/// Shown when a response's survey version is gone.
pub const UNKNOWN_SURVEY: &str = "Unknown survey";

/// Survey as printed by `get`: the stored record plus readable timestamps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyView {
    #[serde(flatten)]
    pub survey: SurveyRecord,
    pub created: String,
    pub updated: String,
    pub response_count: usize,
}

pub async fn get_survey(store: &dyn SurveyStore, id: &str) -> Result<SurveyView> {
    let survey = match store.get_survey(id).await? {
        Some(s) => s,
        None => bail!("survey not found: {}", id),
    };
    let response_count = store.responses_for_survey(id).await?.len();

    Ok(SurveyView {
        created: format_ts_iso(survey.created_at),
        updated: format_ts_iso(survey.updated_at),
        survey,
        response_count,
    })
}

/// CLI entry point for `get`: prints the survey as pretty JSON.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = SqliteSurveyStore::open(config).await?;
    let view = get_survey(&store, id).await;
    store.close().await;

    println!("{}", serde_json::to_string_pretty(&view?)?);
    Ok(())
}

/// CLI entry point for `list`.
pub async fn run_list(config: &Config, include_inactive: bool) -> Result<()> {
    let store = SqliteSurveyStore::open(config).await?;
    let surveys = store.list_surveys(include_inactive).await;
    store.close().await;
    let surveys = surveys?;

    if surveys.is_empty() {
        println!("No surveys.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<8}  {:<20}  {:<30}  SOURCE",
        "ID", "ACTIVE", "CREATED", "TITLE"
    );
    for survey in &surveys {
        println!(
            "{:<36}  {:<8}  {:<20}  {:<30}  {}",
            survey.id,
            if survey.is_active { "yes" } else { "no" },
            format_ts_iso(survey.created_at),
            survey.title,
            survey.source_file
        );
    }
    println!();
    println!("{} survey(s)", surveys.len());
    Ok(())
}

/// CLI entry point for `responses <id>`: every response to one survey
/// version, with option ids rendered as option text.
pub async fn run_responses(config: &Config, survey_id: &str) -> Result<()> {
    let store = SqliteSurveyStore::open(config).await?;
    let loaded = async {
        let survey = store.get_survey(survey_id).await?;
        let responses = store.responses_for_survey(survey_id).await?;
        anyhow::Ok((survey, responses))
    }
    .await;
    store.close().await;

    let (survey, responses) = loaded?;
    let survey = match survey {
        Some(s) => s,
        None => bail!("survey not found: {}", survey_id),
    };

    println!("--- {} ({}) ---", survey.title, survey.id);
    println!("responses: {}", responses.len());
    for response in &responses {
        println!();
        for line in response_lines(response, Some(&survey), false) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// One page of responses across every survey, newest first.
#[derive(Debug, Clone)]
pub struct ResponsePage {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub responses: Vec<(ResponseRecord, Option<SurveyRecord>)>,
}

impl ResponsePage {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.limit.max(1))
    }
}

/// Load page `page` (1-based) of `limit` responses, each with the survey
/// version it answers.
pub async fn response_page(store: &dyn SurveyStore, page: usize, limit: usize) -> Result<ResponsePage> {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = store.count_responses().await?;
    let records = store.list_responses((page - 1) * limit, limit).await?;

    let mut surveys: HashMap<String, Option<SurveyRecord>> = HashMap::new();
    let mut responses = Vec::with_capacity(records.len());
    for response in records {
        if !surveys.contains_key(&response.survey_id) {
            let survey = store.get_survey(&response.survey_id).await?;
            surveys.insert(response.survey_id.clone(), survey);
        }
        let survey = surveys.get(&response.survey_id).cloned().flatten();
        responses.push((response, survey));
    }

    Ok(ResponsePage {
        total,
        page,
        limit,
        responses,
    })
}

/// CLI entry point for `responses --all`.
pub async fn run_all_responses(config: &Config, page: usize, limit: usize) -> Result<()> {
    let store = SqliteSurveyStore::open(config).await?;
    let loaded = response_page(&store, page, limit).await;
    store.close().await;
    let page = loaded?;

    println!(
        "--- all responses: page {} of {} ({} total) ---",
        page.page,
        page.total_pages(),
        page.total
    );
    for (response, survey) in &page.responses {
        println!();
        for line in response_lines(response, survey.as_ref(), true) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Printable lines for one response: a header, then one line per answer.
pub fn response_lines(
    response: &ResponseRecord,
    survey: Option<&SurveyRecord>,
    with_title: bool,
) -> Vec<String> {
    let mut header = format!(
        "[{}] {} ({})",
        format_ts_iso(response.created_at),
        response.email,
        response.name.as_deref().unwrap_or(ANONYMOUS)
    );
    if with_title {
        header.push_str(" - ");
        header.push_str(survey.map(|s| s.title.as_str()).unwrap_or(UNKNOWN_SURVEY));
    }

    let mut lines = vec![header];
    for answer in &response.responses {
        let question = survey.and_then(|s| s.question(&answer.question_id));
        let (text, value) = answer.describe(question);
        lines.push(format!("  {}: {}", text, value));
    }
    lines
}

pub fn format_ts_iso(ts_millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts_millis)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts_millis.to_string())
}
