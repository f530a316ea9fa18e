//! Source directory abstraction.
//!
//! Reconciliation reads survey markdown through [`SourceDir`] so the engine
//! can run against the real filesystem (`survey-seed`'s `FsSourceDir`) or
//! an in-memory directory in tests.
//!
//! `list` failing is fatal for a run. `read` failing only fails the survey
//! unit the file belongs to.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("survey directory does not exist: {0}")]
    DirectoryMissing(PathBuf),

    #[error("failed to list survey directory {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} is not valid UTF-8")]
    InvalidUtf8 { name: String },

    #[error("{0} is not in the survey directory")]
    NotFound(String),
}

/// A flat directory of survey files.
pub trait SourceDir: Send + Sync {
    /// Names of every file currently in the directory, unfiltered.
    fn list(&self) -> Result<Vec<String>, SourceError>;

    /// Raw bytes of one file.
    fn read(&self, name: &str) -> Result<Vec<u8>, SourceError>;
}

/// In-memory [`SourceDir`] for tests. Files can be added, edited and
/// removed between runs.
#[derive(Debug, Default)]
pub struct MemorySourceDir {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemorySourceDir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let dir = Self::new();
        for (name, content) in files {
            dir.write(name, content);
        }
        dir
    }

    pub fn write(&self, name: &str, content: &str) {
        self.write_bytes(name, content.as_bytes().to_vec());
    }

    pub fn write_bytes(&self, name: &str, content: Vec<u8>) {
        self.files
            .write()
            .unwrap()
            .insert(name.to_string(), content);
    }

    pub fn remove(&self, name: &str) {
        self.files.write().unwrap().remove(name);
    }
}

impl SourceDir for MemorySourceDir {
    fn list(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.files.read().unwrap().keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, SourceError> {
        self.files
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }
}
