//! CLI definition and handler

use anyhow::{Context, Result};
use clap::Parser;
use flakecheck::config::{load_project_config, ProjectConfig};
use flakecheck::{ExitStatus, Reporter, Runner};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name under which standard input is reported
pub const STDIN_NAME: &str = "<stdin>";

/// flakecheck - check Python source files for errors
#[derive(Parser, Debug)]
#[command(name = "flakecheck")]
#[command(
    version,
    about = "Check Python source files for unused imports, undefined names and syntax errors",
    after_help = "\
Exit status:
  0  nothing reported
  1  errors reported (undefined names, syntax errors, unreadable files)
  3  only warnings reported
  4  warnings counted but not reported

Examples:
  flakecheck .                       Check every .py file under the current directory
  flakecheck app.py tests/           Check a file and a directory
  cat app.py | flakecheck            Check standard input"
)]
pub struct Cli {
    /// Files or directories to check (default: read standard input)
    pub paths: Vec<PathBuf>,

    /// Config file (default: flakecheck.toml or pyproject.toml in the current directory)
    #[arg(long, short = 'c', env = "FLAKECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Extra names to treat as builtins, comma-separated
    #[arg(long, env = "FLAKECHECK_BUILTINS", value_delimiter = ',')]
    pub builtins: Vec<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,
}

pub fn run(cli: Cli) -> Result<ExitStatus> {
    let mut config = match &cli.config {
        Some(path) => ProjectConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => load_project_config(Path::new(".")),
    };
    config.builtins.extend(
        cli.builtins
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
    );
    debug!("Using config {:?}", config);

    let runner = Runner::from_config(&config);
    let mut reporter = Reporter::stdio().with_legacy_offsets(config.legacy_offsets);

    let warnings = if cli.paths.is_empty() {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read standard input")?;
        runner.check_stdin(bytes, STDIN_NAME, &mut reporter)?
    } else {
        runner.check_recursive(&cli.paths, &mut reporter)?
    };

    let counters = reporter.counters();
    debug!(
        "Reported {} warning(s) and {} error(s)",
        counters.warnings, counters.errors
    );
    Ok(ExitStatus::from_run(counters, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_paths_and_flags() {
        let cli = Cli::try_parse_from([
            "flakecheck",
            "--builtins",
            "a,b",
            "--log-level",
            "debug",
            "src",
            "setup.py",
        ])
        .unwrap();
        assert_eq!(cli.paths, vec![PathBuf::from("src"), PathBuf::from("setup.py")]);
        assert_eq!(cli.builtins, vec!["a", "b"]);
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["flakecheck", "--log-level", "loud"]).is_err());
    }
}
