//! flakecheck - Python source checker
//!
//! Finds unused imports, undefined names and syntax errors in Python code,
//! sorts each finding into a severity tier and derives a CI-friendly exit
//! status from what was reported.

pub mod checker;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod reporters;
pub mod sources;

pub use checker::{Checker, Finder};
pub use classifier::Classifier;
pub use error::{FlakeError, Result};
pub use models::{ClassifiedFinding, Finding, FindingKind, ParseFailure, RunCounters, Tier};
pub use pipeline::{ExitStatus, Runner};
pub use reporters::Reporter;
