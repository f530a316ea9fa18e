//! Configuration parsing and validation.
//!
//! survey-seed is configured via a TOML file (default: `config/survey.toml`).
//!
//! # Example
//!
//! ```toml
//! [db]
//! path = "./data/surveys.sqlite"
//!
//! [seed]
//! dir = "./markdown"
//! exclude_globs = ["README.md", "drafts_*.md"]
//! follow_symlinks = true
//!
//! [logging]
//! filter = "info"
//! ```
//!
//! `[seed]` and `[logging]` may be omitted; `[db]` is required.

use anyhow::{bail, Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// The directory scanned by `seed` and which of its files to ignore.
#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    #[serde(default = "default_seed_dir")]
    pub dir: PathBuf,
    /// Matched against bare file names. `README.md` is always excluded by
    /// the assembler as well.
    #[serde(default = "default_exclude_globs")]
    pub exclude_globs: Vec<String>,
    /// List symlinked files as the files they point to. When off, links are
    /// invisible and count as deleted.
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            dir: default_seed_dir(),
            exclude_globs: default_exclude_globs(),
            follow_symlinks: default_follow_symlinks(),
        }
    }
}

fn default_seed_dir() -> PathBuf {
    PathBuf::from("./markdown")
}

fn default_exclude_globs() -> Vec<String> {
    vec!["README.md".to_string()]
}

fn default_follow_symlinks() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.path.as_os_str().is_empty() {
        bail!("db.path must not be empty");
    }

    if config.seed.dir.as_os_str().is_empty() {
        bail!("seed.dir must not be empty");
    }

    for pattern in &config.seed.exclude_globs {
        Glob::new(pattern)
            .with_context(|| format!("seed.exclude_globs: invalid pattern '{}'", pattern))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_defaults_apply() {
        let config = parse("[db]\npath = \"./data/s.sqlite\"\n").unwrap();
        assert_eq!(config.seed.dir, PathBuf::from("./markdown"));
        assert_eq!(config.seed.exclude_globs, vec!["README.md".to_string()]);
        assert!(config.seed.follow_symlinks);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_follow_symlinks_can_be_disabled() {
        let config = parse("[db]\npath = \"x.sqlite\"\n[seed]\nfollow_symlinks = false\n").unwrap();
        assert!(!config.seed.follow_symlinks);
        assert_eq!(config.seed.dir, PathBuf::from("./markdown"));
    }

    #[test]
    fn test_empty_seed_dir_rejected() {
        let err = parse("[db]\npath = \"x.sqlite\"\n[seed]\ndir = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("seed.dir"));
    }

    #[test]
    fn test_bad_glob_rejected() {
        let err = parse("[db]\npath = \"x.sqlite\"\n[seed]\ndir = \"md\"\nexclude_globs = [\"[oops\"]\n")
            .unwrap_err();
        assert!(err.to_string().contains("exclude_globs"));
    }

    #[test]
    fn test_missing_db_section_rejected() {
        assert!(parse("[seed]\ndir = \"md\"\n").is_err());
    }
}
