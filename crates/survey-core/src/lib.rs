//! # Survey Core
//!
//! Shared logic for survey-seed: survey data models, the markdown section
//! parser, content fingerprinting, survey assembly, the storage and source
//! directory abstractions, and the reconciliation engine that keeps
//! persisted survey versions in step with a directory of markdown files.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Native
//! implementations of [`store::SurveyStore`] and [`source::SourceDir`]
//! live in the `survey-seed` app crate.
//!
//! ## Pipeline
//!
//! ```text
//! SourceDir::list ─▶ assembler::plan_units ─▶ read + fingerprint
//!                                                   │
//!          SurveyStore::survey_index ─▶ SourceIndex ┤
//!                                                   ▼
//!                               reconcile: create / supersede / skip
//!                                                   │
//!                                                   ▼
//!                                   sweep vanished and orphaned records
//! ```

pub mod answer;
pub mod assembler;
pub mod fingerprint;
pub mod models;
pub mod parser;
pub mod reconcile;
pub mod response;
pub mod source;
pub mod store;
