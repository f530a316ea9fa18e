//! The `respond` command: submit a response from a JSON file.
//!
//! ```json
//! {
//!   "surveyId": "…",
//!   "email": "ada@example.com",
//!   "name": "Ada",
//!   "responses": [
//!     {"questionId": "…", "answer": {"kind": "single", "value": "<option id>"}}
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};

use survey_core::response::{submit_response, SubmitResponse};

use crate::config::Config;
use crate::sqlite_store::SqliteSurveyStore;

pub async fn run_respond(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read response file: {}", path.display()))?;
    let submit: SubmitResponse = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse response file: {}", path.display()))?;

    let store = SqliteSurveyStore::open(config).await?;
    let result = submit_response(&store, submit).await;
    store.close().await;

    let id = result?;
    println!("response stored: {}", id);
    Ok(())
}
