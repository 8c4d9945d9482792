//! Project-level configuration support
//!
//! Loads per-project configuration from `flakecheck.toml`, or from the
//! `[tool.flakecheck]` table of `pyproject.toml`, in the project root.
//!
//! # Configuration Format
//!
//! ```toml
//! # flakecheck.toml
//!
//! # Names that are never undefined
//! builtins = ["gettext"]
//!
//! # Undefined names reported as warnings rather than errors
//! allowed_undefined = ["ugettext"]
//!
//! # Syntax columns are measured against the whole error text
//! legacy_offsets = false
//! ```

use crate::error::{FlakeError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "flakecheck.toml";
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Project configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Extra names treated as built in
    pub builtins: Vec<String>,
    /// Added to the default allowlist of tolerated undefined names
    pub allowed_undefined: Vec<String>,
    pub legacy_offsets: bool,
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: PyProjectTools,
}

#[derive(Debug, Default, Deserialize)]
struct PyProjectTools {
    flakecheck: Option<ProjectConfig>,
}

impl ProjectConfig {
    /// Load an explicitly named config file.
    ///
    /// A `pyproject.toml` contributes only its `[tool.flakecheck]` table.
    pub fn from_path(path: &Path) -> Result<Self> {
        if is_pyproject(path) {
            return Ok(load_pyproject(path)?.unwrap_or_default());
        }
        let content = read(path)?;
        toml::from_str(&content).map_err(|source| FlakeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load configuration for the project rooted at `root`.
///
/// Files that fail to load are logged and skipped; with nothing usable the
/// defaults apply.
pub fn load_project_config(root: &Path) -> ProjectConfig {
    let toml_path = root.join(CONFIG_FILE);
    if toml_path.exists() {
        match ProjectConfig::from_path(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let pyproject_path = root.join(PYPROJECT_FILE);
    if pyproject_path.exists() {
        match load_pyproject(&pyproject_path) {
            Ok(Some(config)) => {
                debug!("Loaded project config from {}", pyproject_path.display());
                return config;
            }
            Ok(None) => {
                debug!("{} has no [tool.flakecheck] table", pyproject_path.display());
            }
            Err(e) => {
                warn!("Failed to load {}: {}", pyproject_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

fn is_pyproject(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == PYPROJECT_FILE)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| FlakeError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })
}

fn load_pyproject(path: &Path) -> Result<Option<ProjectConfig>> {
    let content = read(path)?;
    let pyproject: PyProject = toml::from_str(&content).map_err(|source| FlakeError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(pyproject.tool.flakecheck)
}
