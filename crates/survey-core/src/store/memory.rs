//! In-memory [`SurveyStore`] implementation for testing.
//!
//! Uses `HashMap`/`Vec` behind `std::sync::RwLock`. Counts every write so
//! tests can assert that a reconciliation run was a no-op, and can be told
//! to reject creates for a given title to exercise per-unit failures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewResponse, NewSurvey, ResponseRecord, SurveyIndexEntry, SurveyRecord};

use super::SurveyStore;

/// In-memory store for tests.
pub struct InMemoryStore {
    surveys: RwLock<HashMap<String, SurveyRecord>>,
    responses: RwLock<Vec<ResponseRecord>>,
    rejected_titles: RwLock<HashSet<String>>,
    writes: AtomicUsize,
    clock: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            surveys: RwLock::new(HashMap::new()),
            responses: RwLock::new(Vec::new()),
            rejected_titles: RwLock::new(HashSet::new()),
            writes: AtomicUsize::new(0),
            clock: AtomicUsize::new(0),
        }
    }

    /// Number of survey/response writes performed so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every future `create_survey` with this title fail.
    pub fn reject_survey(&self, title: &str) {
        self.rejected_titles.write().unwrap().insert(title.to_string());
    }

    pub fn accept_survey(&self, title: &str) {
        self.rejected_titles.write().unwrap().remove(title);
    }

    /// Insert a record as-is, bypassing id generation. Not counted as a write.
    pub fn seed_record(&self, record: SurveyRecord) {
        self.surveys.write().unwrap().insert(record.id.clone(), record);
    }

    pub fn all_surveys(&self) -> Vec<SurveyRecord> {
        let mut all: Vec<SurveyRecord> = self.surveys.read().unwrap().values().cloned().collect();
        all.sort_by_key(|s| s.created_at);
        all
    }

    pub fn active_surveys(&self) -> Vec<SurveyRecord> {
        self.all_surveys().into_iter().filter(|s| s.is_active).collect()
    }

    /// Monotonic fake timestamp so ordering by creation is deterministic.
    fn tick(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst) as i64 + 1
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SurveyStore for InMemoryStore {
    async fn survey_index(&self) -> Result<Vec<SurveyIndexEntry>> {
        Ok(self.all_surveys().iter().map(SurveyRecord::index_entry).collect())
    }

    async fn create_survey(&self, survey: &NewSurvey) -> Result<String> {
        if self.rejected_titles.read().unwrap().contains(&survey.data.title) {
            bail!("store rejected survey \"{}\"", survey.data.title);
        }

        let now = self.tick();
        let id = Uuid::new_v4().to_string();
        let record = SurveyRecord {
            id: id.clone(),
            title: survey.data.title.clone(),
            description: survey.data.description.clone(),
            sections: survey.data.sections.clone(),
            is_active: true,
            source_file: survey.source_file.clone(),
            file_hash: survey.file_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        self.surveys.write().unwrap().insert(id.clone(), record);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<()> {
        let now = self.tick();
        let mut surveys = self.surveys.write().unwrap();
        let record = surveys
            .get_mut(id)
            .ok_or_else(|| anyhow!("survey not found: {}", id))?;
        record.is_active = active;
        record.updated_at = now;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_survey(&self, id: &str) -> Result<Option<SurveyRecord>> {
        Ok(self.surveys.read().unwrap().get(id).cloned())
    }

    async fn list_surveys(&self, include_inactive: bool) -> Result<Vec<SurveyRecord>> {
        let mut surveys: Vec<SurveyRecord> = self
            .all_surveys()
            .into_iter()
            .filter(|s| include_inactive || s.is_active)
            .collect();
        surveys.reverse();
        Ok(surveys)
    }

    async fn insert_response(&self, response: &NewResponse) -> Result<String> {
        if !self.surveys.read().unwrap().contains_key(&response.survey_id) {
            bail!("survey not found: {}", response.survey_id);
        }
        let id = Uuid::new_v4().to_string();
        let record = ResponseRecord {
            id: id.clone(),
            survey_id: response.survey_id.clone(),
            email: response.email.clone(),
            name: response.name.clone(),
            responses: response.responses.clone(),
            created_at: self.tick(),
        };
        self.responses.write().unwrap().push(record);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn responses_for_survey(&self, survey_id: &str) -> Result<Vec<ResponseRecord>> {
        Ok(self
            .responses
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.survey_id == survey_id)
            .cloned()
            .collect())
    }

    async fn count_responses(&self) -> Result<usize> {
        Ok(self.responses.read().unwrap().len())
    }

    async fn list_responses(&self, offset: usize, limit: usize) -> Result<Vec<ResponseRecord>> {
        Ok(self
            .responses
            .read()
            .unwrap()
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
