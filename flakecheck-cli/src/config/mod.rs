//! Configuration module for flakecheck
//!
//! This module handles:
//! - Project-level configuration (flakecheck.toml, pyproject.toml)
//! - Explicitly named config files passed on the command line

mod project_config;

pub use project_config::{load_project_config, ProjectConfig, CONFIG_FILE, PYPROJECT_FILE};
