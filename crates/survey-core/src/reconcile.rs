//! Reconciliation of a survey directory against persisted surveys.
//!
//! One call to [`reconcile`] is one ingestion run. It lists the directory,
//! groups files into survey units, and compares each unit's fingerprint with
//! the survey record its files map to:
//!
//! | Mapping | Fingerprint | Action |
//! |---------|-------------|--------|
//! | no file maps to a record | – | create |
//! | all files map to one record | equal | nothing (or reactivate if inactive) |
//! | files map to one record | differs | supersede: deactivate old, create new |
//! | files map to several records | – | consolidate: deactivate all, create one |
//!
//! After every unit has been handled, a sweep deactivates active records
//! whose files have vanished, and active records that no unit claimed
//! (duplicates left behind by an interrupted run).
//!
//! Records are never deleted and their content is never rewritten, so
//! responses stay linked to the exact survey version that was answered.
//! A run over an unchanged directory performs no writes.
//!
//! Errors while listing the directory or loading the survey index abort the
//! run. Errors while reading, parsing or persisting one unit are logged and
//! counted; the run moves on to the next unit.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};

use crate::assembler::{assemble, plan_units, UnitPlan};
use crate::fingerprint::{combined_fingerprint, fingerprint_bytes};
use crate::models::{SourceFile, SurveyIndexEntry};
use crate::source::{SourceDir, SourceError};
use crate::store::SurveyStore;

#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Decide and report, but write nothing.
    pub dry_run: bool,
}

/// What happened (or, in a dry run, would happen) to one survey unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitAction {
    Create,
    Unchanged { id: String },
    Reactivate { id: String },
    Supersede { previous: String },
    Consolidate { previous: Vec<String> },
}

impl UnitAction {
    pub fn label(&self) -> &'static str {
        match self {
            UnitAction::Create => "create",
            UnitAction::Unchanged { .. } => "unchanged",
            UnitAction::Reactivate { .. } => "reactivate",
            UnitAction::Supersede { .. } => "supersede",
            UnitAction::Consolidate { .. } => "consolidate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepReason {
    /// One or more of the record's files are gone from the directory.
    Vanished,
    /// The record's files are present but another record now owns them.
    Orphaned,
}

#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub key: String,
    pub title: String,
    pub files: Vec<String>,
    pub action: UnitAction,
    /// Id of the record that is current for this unit after the run.
    /// `None` for creates in a dry run.
    pub survey_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub id: String,
    pub title: String,
    pub reason: SweepReason,
}

#[derive(Debug, Clone)]
pub struct UnitFailure {
    pub key: String,
    pub files: Vec<String>,
    pub error: String,
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub dry_run: bool,
    pub files_seen: usize,
    pub created: usize,
    pub superseded: usize,
    pub consolidated: usize,
    pub unchanged: usize,
    pub reactivated: usize,
    pub deactivated: usize,
    /// Files listed but not ingested (singleton `_Part<N>` files).
    pub skipped_files: Vec<String>,
    pub units: Vec<UnitOutcome>,
    pub swept: Vec<SweepOutcome>,
    pub failures: Vec<UnitFailure>,
    /// Store writes issued. Zero for a dry run or an unchanged directory.
    pub writes: usize,
}

impl ReconcileReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Run-local lookup from a source file name to the record that owns it.
///
/// Built fresh from the store at the start of every run. When several
/// records name the same file, the active one wins, then the most recently
/// created.
pub struct SourceIndex<'a> {
    entries: &'a [SurveyIndexEntry],
    by_file: HashMap<String, &'a SurveyIndexEntry>,
}

impl<'a> SourceIndex<'a> {
    pub fn build(entries: &'a [SurveyIndexEntry]) -> Self {
        let mut by_file: HashMap<String, &'a SurveyIndexEntry> = HashMap::new();
        for entry in entries {
            for name in entry.source_files() {
                match by_file.get(&name) {
                    Some(current) if !prefer(entry, current) => {}
                    _ => {
                        by_file.insert(name, entry);
                    }
                }
            }
        }
        Self { entries, by_file }
    }

    pub fn lookup(&self, file: &str) -> Option<&'a SurveyIndexEntry> {
        self.by_file.get(file).copied()
    }

    pub fn entries(&self) -> &'a [SurveyIndexEntry] {
        self.entries
    }
}

fn prefer(candidate: &SurveyIndexEntry, current: &SurveyIndexEntry) -> bool {
    (candidate.is_active, candidate.created_at, &candidate.id)
        > (current.is_active, current.created_at, &current.id)
}

/// Decide what to do with a unit made of `files` whose current content
/// fingerprints to `fingerprint`.
pub fn decide(index: &SourceIndex<'_>, files: &[String], fingerprint: &str) -> UnitAction {
    let mapped: Vec<Option<&SurveyIndexEntry>> = files.iter().map(|f| index.lookup(f)).collect();

    let mut implicated: Vec<&SurveyIndexEntry> = Vec::new();
    for entry in mapped.iter().flatten().copied() {
        if !implicated.iter().any(|e| e.id == entry.id) {
            implicated.push(entry);
        }
    }

    match implicated.as_slice() {
        [] => UnitAction::Create,
        [record] => {
            let all_mapped = mapped.iter().all(Option::is_some);
            if all_mapped && record.file_hash == fingerprint && same_files(record, files) {
                if record.is_active {
                    UnitAction::Unchanged {
                        id: record.id.clone(),
                    }
                } else {
                    UnitAction::Reactivate {
                        id: record.id.clone(),
                    }
                }
            } else {
                UnitAction::Supersede {
                    previous: record.id.clone(),
                }
            }
        }
        many => UnitAction::Consolidate {
            previous: many.iter().map(|e| e.id.clone()).collect(),
        },
    }
}

fn same_files(record: &SurveyIndexEntry, files: &[String]) -> bool {
    let mut stored = record.source_files();
    let mut current = files.to_vec();
    stored.sort();
    current.sort();
    stored == current
}

/// Read and fingerprint the member files of one unit.
pub fn read_unit_files(source: &dyn SourceDir, plan: &UnitPlan) -> Result<Vec<SourceFile>, SourceError> {
    plan.files
        .iter()
        .map(|name| {
            let bytes = source.read(name)?;
            let fingerprint = fingerprint_bytes(&bytes);
            let content = String::from_utf8(bytes)
                .map_err(|_| SourceError::InvalidUtf8 { name: name.clone() })?;
            tracing::debug!(file = %name, fingerprint = %fingerprint, "read source file");
            Ok(SourceFile {
                name: name.clone(),
                content,
                fingerprint,
            })
        })
        .collect()
}

struct Run<'a> {
    store: &'a dyn SurveyStore,
    dry_run: bool,
    index: SourceIndex<'a>,
    active: HashMap<String, bool>,
    claimed: HashSet<String>,
    unsettled: HashSet<String>,
    report: ReconcileReport,
}

impl<'a> Run<'a> {
    async fn deactivate(&mut self, id: &str) -> Result<bool> {
        if !self.active.get(id).copied().unwrap_or(false) {
            return Ok(false);
        }
        if !self.dry_run {
            self.store
                .set_active(id, false)
                .await
                .with_context(|| format!("failed to deactivate survey {}", id))?;
            self.report.writes += 1;
        }
        self.active.insert(id.to_string(), false);
        self.report.deactivated += 1;
        Ok(true)
    }

    async fn process_unit(&mut self, source: &dyn SourceDir, plan: &UnitPlan) -> Result<UnitOutcome> {
        let files = read_unit_files(source, plan)?;
        let fingerprint = combined_fingerprint(&files);
        let action = decide(&self.index, &plan.files, &fingerprint);

        let survey_id = match &action {
            UnitAction::Unchanged { id } => {
                self.report.unchanged += 1;
                Some(id.clone())
            }
            UnitAction::Reactivate { id } => {
                if !self.dry_run {
                    self.store
                        .set_active(id, true)
                        .await
                        .with_context(|| format!("failed to reactivate survey {}", id))?;
                    self.report.writes += 1;
                }
                self.active.insert(id.clone(), true);
                self.report.reactivated += 1;
                Some(id.clone())
            }
            UnitAction::Create => {
                let id = self.create(plan, &files).await?;
                self.report.created += 1;
                id
            }
            UnitAction::Supersede { previous } => {
                self.deactivate(previous).await?;
                let id = self.create(plan, &files).await?;
                self.report.superseded += 1;
                id
            }
            UnitAction::Consolidate { previous } => {
                for old in previous {
                    self.deactivate(old).await?;
                }
                let id = self.create(plan, &files).await?;
                self.report.consolidated += 1;
                id
            }
        };

        if let Some(id) = &survey_id {
            self.claimed.insert(id.clone());
        }

        Ok(UnitOutcome {
            key: plan.key.clone(),
            title: plan.title.clone(),
            files: plan.files.clone(),
            action,
            survey_id,
        })
    }

    async fn create(&mut self, plan: &UnitPlan, files: &[SourceFile]) -> Result<Option<String>> {
        let unit = assemble(plan, files);
        if self.dry_run {
            return Ok(None);
        }
        let id = self
            .store
            .create_survey(&unit.to_new_survey())
            .await
            .with_context(|| format!("failed to create survey \"{}\"", unit.title))?;
        self.report.writes += 1;
        self.active.insert(id.clone(), true);
        Ok(Some(id))
    }

    async fn sweep(&mut self, present: &HashSet<String>) -> Result<()> {
        for entry in self.index.entries() {
            if !self.active.get(&entry.id).copied().unwrap_or(false) {
                continue;
            }
            let files = entry.source_files();
            let reason = if files.is_empty() || files.iter().any(|f| !present.contains(f)) {
                SweepReason::Vanished
            } else if !self.claimed.contains(&entry.id)
                && !files.iter().any(|f| self.unsettled.contains(f))
            {
                SweepReason::Orphaned
            } else {
                continue;
            };

            match self.deactivate(&entry.id).await {
                Ok(_) => {
                    tracing::info!(
                        survey_id = %entry.id,
                        title = %entry.title,
                        source_file = %entry.source_file,
                        reason = ?reason,
                        "deactivated survey"
                    );
                    self.report.swept.push(SweepOutcome {
                        id: entry.id.clone(),
                        title: entry.title.clone(),
                        reason,
                    });
                }
                Err(err) => {
                    let error = format!("{:#}", err);
                    tracing::error!(survey_id = %entry.id, title = %entry.title, error = %error, "sweep failed");
                    self.report.failures.push(UnitFailure {
                        key: entry.source_file.clone(),
                        files,
                        error,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Run one full reconcile-and-seed pass.
///
/// Returns `Err` only for fatal failures: the directory cannot be listed
/// or the survey index cannot be loaded.
pub async fn reconcile(
    source: &dyn SourceDir,
    store: &dyn SurveyStore,
    options: &ReconcileOptions,
) -> Result<ReconcileReport> {
    let names = source.list().context("failed to list survey directory")?;
    let entries = store
        .survey_index()
        .await
        .context("failed to load survey index")?;

    let grouping = plan_units(&names);
    tracing::info!(
        files = names.len(),
        units = grouping.units.len(),
        known_surveys = entries.len(),
        dry_run = options.dry_run,
        "reconciling survey directory"
    );

    let mut run = Run {
        store,
        dry_run: options.dry_run,
        index: SourceIndex::build(&entries),
        active: entries.iter().map(|e| (e.id.clone(), e.is_active)).collect(),
        claimed: HashSet::new(),
        unsettled: HashSet::new(),
        report: ReconcileReport {
            dry_run: options.dry_run,
            files_seen: names.len(),
            skipped_files: grouping.skipped.clone(),
            ..Default::default()
        },
    };

    for plan in &grouping.units {
        match run.process_unit(source, plan).await {
            Ok(outcome) => {
                tracing::info!(
                    title = %outcome.title,
                    files = ?outcome.files,
                    action = outcome.action.label(),
                    survey_id = outcome.survey_id.as_deref().unwrap_or("-"),
                    "survey unit reconciled"
                );
                run.report.units.push(outcome);
            }
            Err(err) => {
                let error = format!("{:#}", err);
                tracing::error!(title = %plan.title, files = ?plan.files, error = %error, "survey unit failed");
                run.unsettled.extend(plan.files.iter().cloned());
                run.report.failures.push(UnitFailure {
                    key: plan.key.clone(),
                    files: plan.files.clone(),
                    error,
                });
            }
        }
    }

    let present: HashSet<String> = names.into_iter().collect();
    run.sweep(&present).await?;

    let report = run.report;
    tracing::info!(
        created = report.created,
        superseded = report.superseded,
        consolidated = report.consolidated,
        unchanged = report.unchanged,
        reactivated = report.reactivated,
        deactivated = report.deactivated,
        failed = report.failed(),
        writes = report.writes,
        "reconciliation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{Answer, QuestionResponse};
    use crate::models::{NewResponse, QuestionType, SurveyRecord};
    use crate::source::MemorySourceDir;
    use crate::store::memory::InMemoryStore;

    const GREETING: &str = "# Greeting\n1. How satisfied are you?\n-- single\n- Very satisfied\n- Not satisfied\n2. Comments?\n-- text\n";
    const GREETING_EDITED: &str = "# Greeting\n1. How satisfied are you?\n-- single\n- Extremely satisfied\n- Not satisfied\n2. Comments?\n-- text\n";

    async fn run(dir: &MemorySourceDir, store: &InMemoryStore) -> ReconcileReport {
        reconcile(dir, store, &ReconcileOptions::default()).await.unwrap()
    }

    fn record(id: &str, source_file: &str, hash: &str, active: bool, created_at: i64) -> SurveyRecord {
        SurveyRecord {
            id: id.into(),
            title: id.into(),
            description: None,
            sections: Vec::new(),
            is_active: active,
            source_file: source_file.into(),
            file_hash: hash.into(),
            created_at,
            updated_at: created_at,
        }
    }

    fn entry(id: &str, source_file: &str, hash: &str, active: bool, created_at: i64) -> SurveyIndexEntry {
        record(id, source_file, hash, active, created_at).index_entry()
    }

    #[tokio::test]
    async fn test_first_run_creates_and_second_run_writes_nothing() {
        let dir = MemorySourceDir::with_files([
            ("Survey.md", GREETING),
            ("Feedback_Part1.md", "# One\n1. A?\n"),
            ("Feedback_Part2.md", "# Two\n1. B?\n"),
            ("README.md", "# not a survey"),
        ]);
        let store = InMemoryStore::new();

        let first = run(&dir, &store).await;
        assert_eq!(first.created, 2);
        assert_eq!(first.writes, 2);
        assert_eq!(store.active_surveys().len(), 2);

        let before = store.all_surveys();
        let writes_before = store.write_count();
        let second = run(&dir, &store).await;
        assert_eq!(second.unchanged, 2);
        assert_eq!(second.created, 0);
        assert_eq!(second.deactivated, 0);
        assert_eq!(second.writes, 0);
        assert_eq!(store.write_count(), writes_before);

        let after = store.all_surveys();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!((&b.id, b.is_active, &b.file_hash), (&a.id, a.is_active, &a.file_hash));
        }
    }

    #[tokio::test]
    async fn test_greeting_survey_shape() {
        let dir = MemorySourceDir::with_files([("Survey.md", GREETING)]);
        let store = InMemoryStore::new();
        run(&dir, &store).await;

        let survey = &store.active_surveys()[0];
        assert_eq!(survey.title, "Survey");
        assert_eq!(survey.source_file, "Survey.md");
        assert_eq!(survey.file_hash, fingerprint_bytes(GREETING.as_bytes()));
        assert_eq!(survey.sections.len(), 1);
        let section = &survey.sections[0];
        assert_eq!(section.title, "Greeting");
        assert_eq!(section.questions[0].kind, QuestionType::Single);
        assert_eq!(section.questions[0].options.len(), 2);
        assert_eq!(section.questions[1].kind, QuestionType::Text);
        assert!(section.questions[1].options.is_empty());
    }

    #[tokio::test]
    async fn test_edit_supersedes_and_keeps_response_linkage() {
        let dir = MemorySourceDir::with_files([("Survey.md", GREETING)]);
        let store = InMemoryStore::new();
        run(&dir, &store).await;
        let original = store.active_surveys().remove(0);

        let q = &original.sections[0].questions[0];
        let response_id = store
            .insert_response(&NewResponse {
                survey_id: original.id.clone(),
                email: "ada@example.com".into(),
                name: None,
                responses: vec![QuestionResponse {
                    question_id: q.id.clone(),
                    answer: Answer::SingleChoice(q.options[0].id.clone()),
                }],
            })
            .await
            .unwrap();

        dir.write("Survey.md", GREETING_EDITED);
        let report = run(&dir, &store).await;
        assert_eq!(report.superseded, 1);
        assert_eq!(report.units[0].action, UnitAction::Supersede { previous: original.id.clone() });

        let all = store.all_surveys();
        assert_eq!(all.len(), 2);
        let old = store.get_survey(&original.id).await.unwrap().unwrap();
        assert!(!old.is_active);
        assert_eq!(old.file_hash, original.file_hash);
        assert_eq!(old.sections[0].questions[0].options[0].text, "Very satisfied");

        let current = store.active_surveys().remove(0);
        assert_ne!(current.id, original.id);
        assert_ne!(current.file_hash, original.file_hash);
        assert_eq!(current.sections[0].questions[0].options[0].text, "Extremely satisfied");

        let linked = store.responses_for_survey(&original.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].id, response_id);
        assert!(store.responses_for_survey(&current.id).await.unwrap().is_empty());

        let again = run(&dir, &store).await;
        assert_eq!(again.writes, 0);
        assert_eq!(store.all_surveys().len(), 2);
    }

    #[tokio::test]
    async fn test_multi_part_survey_and_deletion_sweep() {
        let dir = MemorySourceDir::with_files([
            ("Feedback_Part2.md", "# Second\n1. B?\n"),
            ("Feedback_Part1.md", "# First\n1. A?\n"),
        ]);
        let store = InMemoryStore::new();
        run(&dir, &store).await;

        let survey = store.active_surveys().remove(0);
        assert_eq!(survey.title, "Feedback");
        assert_eq!(survey.source_file, "Feedback_Part1.md,Feedback_Part2.md");
        let titles: Vec<_> = survey.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);

        dir.remove("Feedback_Part2.md");
        let report = run(&dir, &store).await;
        assert_eq!(report.deactivated, 1);
        assert_eq!(report.swept[0].reason, SweepReason::Vanished);
        assert_eq!(report.skipped_files, vec!["Feedback_Part1.md".to_string()]);
        assert_eq!(report.created, 0);
        assert!(store.active_surveys().is_empty());
        // Deactivated, not deleted.
        assert_eq!(store.all_surveys().len(), 1);
    }

    #[tokio::test]
    async fn test_restored_file_reactivates_same_record() {
        let dir = MemorySourceDir::with_files([("Survey.md", GREETING)]);
        let store = InMemoryStore::new();
        run(&dir, &store).await;
        let id = store.active_surveys()[0].id.clone();

        dir.remove("Survey.md");
        run(&dir, &store).await;
        assert!(store.active_surveys().is_empty());

        dir.write("Survey.md", GREETING);
        let report = run(&dir, &store).await;
        assert_eq!(report.reactivated, 1);
        assert_eq!(store.all_surveys().len(), 1);
        assert_eq!(store.active_surveys()[0].id, id);
    }

    #[tokio::test]
    async fn test_singleton_part_file_is_not_ingested() {
        let dir = MemorySourceDir::with_files([("Solo_Part1.md", GREETING)]);
        let store = InMemoryStore::new();
        let report = run(&dir, &store).await;
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped_files, vec!["Solo_Part1.md".to_string()]);
        assert!(store.all_surveys().is_empty());
    }

    #[tokio::test]
    async fn test_name_with_surrounding_spaces_is_stable() {
        let dir = MemorySourceDir::with_files([(" Survey.md", GREETING)]);
        let store = InMemoryStore::new();
        let first = run(&dir, &store).await;
        assert_eq!(first.created, 1);
        assert_eq!(store.active_surveys()[0].source_file, " Survey.md");

        let second = run(&dir, &store).await;
        assert_eq!(second.unchanged, 1);
        assert_eq!(second.deactivated, 0);
        assert_eq!(second.writes, 0);
        assert_eq!(store.all_surveys().len(), 1);
    }

    #[tokio::test]
    async fn test_name_with_comma_is_skipped_every_run() {
        let dir = MemorySourceDir::with_files([("Q1,Q2.md", GREETING), ("Survey.md", GREETING)]);
        let store = InMemoryStore::new();
        let first = run(&dir, &store).await;
        assert_eq!(first.created, 1);
        assert_eq!(first.skipped_files, vec!["Q1,Q2.md".to_string()]);

        let second = run(&dir, &store).await;
        assert_eq!(second.unchanged, 1);
        assert_eq!(second.skipped_files, vec!["Q1,Q2.md".to_string()]);
        assert_eq!(second.writes, 0);
        assert_eq!(store.all_surveys().len(), 1);
        assert_eq!(store.active_surveys()[0].source_file, "Survey.md");
    }

    #[tokio::test]
    async fn test_consolidation_of_separate_surveys() {
        let dir = MemorySourceDir::with_files([
            ("Intake_Part1.md", "# One\n1. A?\n"),
            ("Intake_Part2.md", "# Two\n1. B?\n"),
        ]);
        let store = InMemoryStore::new();
        store.seed_record(record("old-1", "Intake_Part1.md", "x", true, 1));
        store.seed_record(record("old-2", "Intake_Part2.md", "y", true, 2));

        let report = run(&dir, &store).await;
        assert_eq!(report.consolidated, 1);
        match &report.units[0].action {
            UnitAction::Consolidate { previous } => {
                let mut previous = previous.clone();
                previous.sort();
                assert_eq!(previous, vec!["old-1".to_string(), "old-2".to_string()]);
            }
            other => panic!("expected consolidate, got {:?}", other),
        }
        let active = store.active_surveys();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Intake");
        assert_eq!(active[0].sections.len(), 2);

        assert_eq!(run(&dir, &store).await.writes, 0);
    }

    #[tokio::test]
    async fn test_added_part_supersedes_group() {
        let dir = MemorySourceDir::with_files([
            ("Feedback_Part1.md", "# One\n1. A?\n"),
            ("Feedback_Part2.md", "# Two\n1. B?\n"),
        ]);
        let store = InMemoryStore::new();
        run(&dir, &store).await;
        let first = store.active_surveys().remove(0);

        dir.write("Feedback_Part3.md", "# Three\n1. C?\n");
        let report = run(&dir, &store).await;
        assert_eq!(report.superseded, 1);
        let current = store.active_surveys().remove(0);
        assert_ne!(current.id, first.id);
        assert_eq!(current.sections.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_active_records_are_repaired() {
        let hash = fingerprint_bytes(GREETING.as_bytes());
        let dir = MemorySourceDir::with_files([("Survey.md", GREETING)]);
        let store = InMemoryStore::new();
        store.seed_record(record("older", "Survey.md", &hash, true, 1));
        store.seed_record(record("newer", "Survey.md", &hash, true, 2));

        let report = run(&dir, &store).await;
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.swept.len(), 1);
        assert_eq!(report.swept[0].id, "older");
        assert_eq!(report.swept[0].reason, SweepReason::Orphaned);
        let active = store.active_surveys();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "newer");
    }

    #[tokio::test]
    async fn test_failed_unit_does_not_stop_batch() {
        let dir = MemorySourceDir::with_files([("Bad.md", GREETING), ("Good.md", GREETING)]);
        let store = InMemoryStore::new();
        store.reject_survey("Bad");

        let report = run(&dir, &store).await;
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].key, "Bad.md");
        assert_eq!(report.created, 1);
        assert_eq!(store.active_surveys()[0].title, "Good");

        store.accept_survey("Bad");
        let retry = run(&dir, &store).await;
        assert_eq!(retry.created, 1);
        assert_eq!(retry.unchanged, 1);
    }

    #[tokio::test]
    async fn test_unreadable_unit_keeps_existing_record() {
        let dir = MemorySourceDir::with_files([("Survey.md", GREETING)]);
        let store = InMemoryStore::new();
        run(&dir, &store).await;

        dir.write_bytes("Survey.md", vec![0xff, 0xfe, 0x00]);
        let report = run(&dir, &store).await;
        assert_eq!(report.failed(), 1);
        assert!(report.failures[0].error.contains("UTF-8"));
        assert_eq!(report.deactivated, 0);
        assert_eq!(store.active_surveys().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = MemorySourceDir::with_files([("Survey.md", GREETING)]);
        let store = InMemoryStore::new();
        let report = reconcile(&dir, &store, &ReconcileOptions { dry_run: true })
            .await
            .unwrap();
        assert!(report.dry_run);
        assert_eq!(report.created, 1);
        assert_eq!(report.writes, 0);
        assert!(report.units[0].survey_id.is_none());
        assert_eq!(store.write_count(), 0);
    }

    struct MissingDir;

    impl SourceDir for MissingDir {
        fn list(&self) -> Result<Vec<String>, SourceError> {
            Err(SourceError::DirectoryMissing("/nowhere".into()))
        }

        fn read(&self, name: &str) -> Result<Vec<u8>, SourceError> {
            Err(SourceError::NotFound(name.to_string()))
        }
    }

    #[tokio::test]
    async fn test_missing_directory_is_fatal() {
        let store = InMemoryStore::new();
        store.seed_record(record("keep", "Survey.md", "h", true, 1));
        let err = reconcile(&MissingDir, &store, &ReconcileOptions::default())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("does not exist"));
        assert_eq!(store.active_surveys().len(), 1);
    }

    #[test]
    fn test_index_prefers_active_then_newest() {
        let entries = vec![
            entry("inactive-new", "A.md", "h", false, 9),
            entry("active-old", "A.md", "h", true, 1),
            entry("active-new", "A.md", "h", true, 5),
        ];
        let index = SourceIndex::build(&entries);
        assert_eq!(index.lookup("A.md").unwrap().id, "active-new");
        assert!(index.lookup("B.md").is_none());
    }

    #[test]
    fn test_decide_matrix() {
        let entries = vec![
            entry("multi", "F_Part1.md,F_Part2.md", "hm", true, 1),
            entry("single", "S.md", "hs", false, 2),
        ];
        let index = SourceIndex::build(&entries);
        let files = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(decide(&index, &files(&["New.md"]), "h"), UnitAction::Create);
        assert_eq!(
            decide(&index, &files(&["F_Part1.md", "F_Part2.md"]), "hm"),
            UnitAction::Unchanged { id: "multi".into() }
        );
        assert_eq!(
            decide(&index, &files(&["F_Part1.md", "F_Part2.md"]), "changed"),
            UnitAction::Supersede { previous: "multi".into() }
        );
        assert_eq!(
            decide(&index, &files(&["S.md"]), "hs"),
            UnitAction::Reactivate { id: "single".into() }
        );
        assert_eq!(
            decide(&index, &files(&["F_Part1.md", "S.md"]), "x"),
            UnitAction::Consolidate {
                previous: vec!["multi".into(), "single".into()]
            }
        );
    }
}
