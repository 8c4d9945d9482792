//! Run orchestration
//!
//! Drives each file through the pipeline:
//! 1. Walk source paths
//! 2. Read and decode the file
//! 3. Parse and collect findings
//! 4. Classify each finding and hand it to the reporter
//!
//! The reporter's counters then decide the process exit status.

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;

use crate::checker::{Checker, Finder};
use crate::classifier::Classifier;
use crate::config::ProjectConfig;
use crate::models::{RunCounters, Tier};
use crate::parsers::{analyze, python};
use crate::reporters::Reporter;
use crate::sources::iter_source_code;

/// How the process exits after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Clean,
    Errors,
    Warnings,
    /// Warnings were counted by the run but none reached the reporter
    Other,
}

impl ExitStatus {
    /// Errors outrank warnings; the raw warning total is only consulted when
    /// the reporter saw nothing.
    pub fn from_run(counters: RunCounters, warnings_reported: usize) -> Self {
        if counters.errors > 0 {
            ExitStatus::Errors
        } else if counters.warnings > 0 {
            ExitStatus::Warnings
        } else if warnings_reported > 0 {
            ExitStatus::Other
        } else {
            ExitStatus::Clean
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::Errors => 1,
            ExitStatus::Warnings => 3,
            ExitStatus::Other => 4,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Checks files and reports what it finds.
///
/// Every `check*` method returns the number of findings reported as
/// warnings. Files that fail to read or parse contribute nothing to it.
pub struct Runner<F: Finder = Checker> {
    finder: F,
    classifier: Classifier,
}

impl Runner<Checker> {
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self::new(
            Checker::with_builtins(config.builtins.iter().cloned()),
            Classifier::new().with_allowed_undefined(config.allowed_undefined.iter().cloned()),
        )
    }
}

impl Default for Runner<Checker> {
    fn default() -> Self {
        Self::new(Checker::new(), Classifier::new())
    }
}

impl<F: Finder> Runner<F> {
    pub fn new(finder: F, classifier: Classifier) -> Self {
        Self { finder, classifier }
    }

    /// Check already-decoded source text.
    pub fn check<W: Write, E: Write>(
        &self,
        source: &str,
        filename: &str,
        reporter: &mut Reporter<W, E>,
    ) -> io::Result<usize> {
        let findings = match analyze(source, filename, &self.finder) {
            Ok(findings) => findings,
            Err(failure) => {
                debug!("{} failed to parse: {:?}", filename, failure);
                reporter.report_parse_failure(filename, &failure)?;
                return Ok(0);
            }
        };

        let mut warnings = 0;
        for finding in findings {
            let classified = self.classifier.classify(finding);
            if classified.tier == Tier::Warning {
                warnings += 1;
            }
            reporter.report_finding(&classified)?;
        }
        Ok(warnings)
    }

    /// Check raw file contents.
    pub fn check_bytes<W: Write, E: Write>(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        reporter: &mut Reporter<W, E>,
    ) -> io::Result<usize> {
        // A final line without a newline must still parse
        self.check_decoded(bytes, filename, true, reporter)
    }

    /// Check raw standard input; the text is checked exactly as read.
    pub fn check_stdin<W: Write, E: Write>(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        reporter: &mut Reporter<W, E>,
    ) -> io::Result<usize> {
        self.check_decoded(bytes, filename, false, reporter)
    }

    fn check_decoded<W: Write, E: Write>(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        append_newline: bool,
        reporter: &mut Reporter<W, E>,
    ) -> io::Result<usize> {
        match python::decode(bytes) {
            Ok(mut source) => {
                if append_newline {
                    source.push('\n');
                }
                self.check(&source, filename, reporter)
            }
            Err(failure) => {
                reporter.report_parse_failure(filename, &failure)?;
                Ok(0)
            }
        }
    }

    /// Check one file on disk. Read failures are reported, not returned.
    pub fn check_path<W: Write, E: Write>(
        &self,
        path: &Path,
        reporter: &mut Reporter<W, E>,
    ) -> io::Result<usize> {
        let filename = path.display().to_string();
        debug!("Checking {}", filename);
        match std::fs::read(path) {
            Ok(bytes) => self.check_bytes(bytes, &filename, reporter),
            Err(e) => {
                reporter.report_failure(&filename, &e.to_string())?;
                Ok(0)
            }
        }
    }

    /// Check every source file under `paths`.
    pub fn check_recursive<P: AsRef<Path>, W: Write, E: Write>(
        &self,
        paths: &[P],
        reporter: &mut Reporter<W, E>,
    ) -> io::Result<usize> {
        let mut warnings = 0;
        for path in iter_source_code(paths) {
            warnings += self.check_path(&path, reporter)?;
        }
        Ok(warnings)
    }
}
