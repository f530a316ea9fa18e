//! The `parse` command: show how one markdown file parses, without a
//! database or config.

use std::path::Path;

use anyhow::{Context, Result};

use survey_core::parser::parse_section;

pub fn run_parse(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let section = parse_section(&content);

    println!("{}", serde_json::to_string_pretty(&section)?);
    Ok(())
}
