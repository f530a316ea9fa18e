//! Filesystem [`SourceDir`]: one flat directory of markdown files.
//!
//! Only the top level of the directory is listed. File names are matched
//! against `*.md` and then against the configured exclude globs; excluded
//! files are invisible to a run, exactly as if they had been deleted.
//! Symlinked files are listed under their link name when
//! `follow_symlinks` is on; a dangling link is logged and skipped.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use survey_core::source::{SourceDir, SourceError};

use crate::config::SeedConfig;

pub struct FsSourceDir {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    follow_symlinks: bool,
}

impl FsSourceDir {
    pub fn new(root: impl Into<PathBuf>, exclude_globs: &[String]) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            include: build_globset(&["*.md".to_string()])?,
            exclude: build_globset(exclude_globs)?,
            follow_symlinks: true,
        })
    }

    pub fn from_config(seed: &SeedConfig, dir_override: Option<&Path>) -> Result<Self> {
        let root = dir_override.unwrap_or(&seed.dir);
        Ok(Self::new(root, &seed.exclude_globs)?.follow_symlinks(seed.follow_symlinks))
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceDir for FsSourceDir {
    fn list(&self) -> Result<Vec<String>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::DirectoryMissing(self.root.clone()));
        }

        let mut names = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_symlinks);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() > 0 => {
                    tracing::warn!(path = ?e.path(), error = %e, "skipping unreadable directory entry");
                    continue;
                }
                Err(e) => {
                    return Err(SourceError::List {
                        path: self.root.clone(),
                        source: e.into(),
                    });
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if !self.include.is_match(&name) || self.exclude.is_match(&name) {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, SourceError> {
        std::fs::read(self.root.join(name)).map_err(|source| SourceError::Read {
            name: name.to_string(),
            source,
        })
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
