//! The `seed` command: one reconcile-and-seed pass over the survey
//! directory against the SQLite store.

use std::path::Path;

use anyhow::Result;

use survey_core::reconcile::{reconcile, ReconcileOptions, ReconcileReport, UnitAction};

use crate::config::Config;
use crate::source_fs::FsSourceDir;
use crate::sqlite_store::SqliteSurveyStore;

/// Run one pass and return its report.
///
/// `dir_override` replaces `[seed] dir` from the config. Fails only when
/// the directory is missing or the database cannot be opened or read;
/// per-survey failures are recorded in the report.
pub async fn run_seed(
    config: &Config,
    dir_override: Option<&Path>,
    dry_run: bool,
) -> Result<ReconcileReport> {
    let source = FsSourceDir::from_config(&config.seed, dir_override)?;
    let store = SqliteSurveyStore::open(config).await?;

    tracing::info!(dir = %source.root().display(), dry_run, "seeding surveys");
    let result = reconcile(&source, &store, &ReconcileOptions { dry_run }).await;
    store.close().await;
    result
}

/// Print the report summary to stdout.
pub fn print_report(dir: &Path, report: &ReconcileReport) {
    if report.dry_run {
        println!("seed {} (dry-run)", dir.display());
        for unit in &report.units {
            let target = match &unit.action {
                UnitAction::Unchanged { id } | UnitAction::Reactivate { id } => id.clone(),
                UnitAction::Supersede { previous } => format!("replaces {}", previous),
                UnitAction::Consolidate { previous } => format!("replaces {}", previous.join(", ")),
                UnitAction::Create => "new".to_string(),
            };
            println!(
                "  {:<11} {} [{}] ({})",
                unit.action.label(),
                unit.title,
                unit.files.join(", "),
                target
            );
        }
        for swept in &report.swept {
            println!("  {:<11} {} ({})", "deactivate", swept.title, swept.id);
        }
    } else {
        println!("seed {}", dir.display());
    }

    println!("  files: {}", report.files_seen);
    println!("  created: {}", report.created);
    println!("  superseded: {}", report.superseded);
    println!("  consolidated: {}", report.consolidated);
    println!("  unchanged: {}", report.unchanged);
    println!("  reactivated: {}", report.reactivated);
    println!("  deactivated: {}", report.deactivated);
    println!("  skipped: {}", report.skipped_files.len());
    println!("  failed: {}", report.failed());
    for failure in &report.failures {
        println!("    {}: {}", failure.key, failure.error);
    }
    if report.failed() == 0 {
        println!("ok");
    }
}
