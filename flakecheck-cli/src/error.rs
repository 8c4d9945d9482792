//! Error types for flakecheck
//!
//! Per-file problems (unreadable files, syntax errors) are reported, not
//! returned. What remains are failures of the run itself.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlakeError {
    #[error("failed to write diagnostics: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, FlakeError>;
