//! # survey-seed
//!
//! Keeps a database of surveys in step with a directory of markdown files.
//!
//! Each markdown file is one survey section. Files named
//! `<prefix>_Part<N>.md` are combined into one multi-section survey. Every
//! `seed` run fingerprints the directory and reconciles it with the stored
//! surveys: new files create surveys, edited files supersede them with a new
//! version, deleted files deactivate them. Survey versions are never
//! rewritten or deleted, so responses stay linked to the version answered.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌───────────┐
//! │ markdown/   │──▶│ survey-core       │──▶│  SQLite   │
//! │ FsSourceDir │   │ parse + reconcile │   │ surveys   │
//! └─────────────┘   └──────────────────┘   └─────┬─────┘
//!                                                │
//!                                                ▼
//!                                     ┌──────────────────────┐
//!                                     │ CLI (survey-seed)    │
//!                                     │ seed/list/get/respond│
//!                                     └──────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! survey-seed init                 # create database
//! survey-seed seed --dry-run       # show what would change
//! survey-seed seed                 # reconcile ./markdown
//! survey-seed list --all
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | `SurveyStore` over SQLite |
//! | [`source_fs`] | `SourceDir` over a filesystem directory |
//! | [`seed`] | The reconcile-and-seed command |
//! | [`get`] | Read-only survey and response commands |
//! | [`respond`] | Response submission command |
//! | [`parse`] | Single-file parse preview |

pub mod config;
pub mod db;
pub mod get;
pub mod migrate;
pub mod parse;
pub mod respond;
pub mod seed;
pub mod source_fs;
pub mod sqlite_store;
