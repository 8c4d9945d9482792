//! Reporter for flakecheck runs
//!
//! The reporter owns the two output channels and the running counters:
//! - informational channel (stdout): one rendered line per reported finding
//! - severity channel (stderr): parse and read failures
//!
//! Counters only ever grow; a fresh run needs a fresh reporter.

mod text;

use crate::models::{ClassifiedFinding, ParseFailure, RunCounters, Tier};
use std::io::{self, Write};

use text::{caret_line, last_line, legacy_column, syntax_header};

/// Formats results to two sinks and keeps count of what it reported.
#[derive(Debug)]
pub struct Reporter<W: Write, E: Write> {
    out: W,
    err: E,
    counters: RunCounters,
    /// Syntax columns are measured against the whole failure text
    legacy_offsets: bool,
}

impl Reporter<io::Stdout, io::Stderr> {
    /// Reporter writing to the process's stdout and stderr
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<W: Write, E: Write> Reporter<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self {
            out,
            err,
            counters: RunCounters::default(),
            legacy_offsets: false,
        }
    }

    pub fn with_legacy_offsets(mut self, enabled: bool) -> Self {
        self.legacy_offsets = enabled;
        self
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    /// Give back the sinks, e.g. to inspect buffered output
    pub fn into_inner(self) -> (W, E) {
        (self.out, self.err)
    }

    /// A file that could not be read or decoded.
    pub fn report_failure(&mut self, filename: &str, message: &str) -> io::Result<()> {
        self.counters.errors += 1;
        writeln!(self.err, "{filename}: {message}")
    }

    /// A file that is not valid Python, with a caret under the offending
    /// character when the column is known.
    pub fn report_syntax_failure(
        &mut self,
        filename: &str,
        message: &str,
        line: usize,
        column: Option<usize>,
        text: &str,
    ) -> io::Result<()> {
        self.counters.errors += 1;
        let column = match column {
            Some(column) if self.legacy_offsets => Some(legacy_column(text, column)),
            other => other,
        };
        let source_line = last_line(text);

        writeln!(self.err, "{}", syntax_header(filename, message, line, column))?;
        writeln!(self.err, "{source_line}")?;
        if let Some(column) = column {
            writeln!(self.err, "{}", caret_line(source_line, column))?;
        }
        Ok(())
    }

    pub fn report_parse_failure(&mut self, filename: &str, failure: &ParseFailure) -> io::Result<()> {
        match failure {
            ParseFailure::Decode { detail } => {
                self.report_failure(filename, &ParseFailure::decode_message(detail.as_deref()))
            }
            ParseFailure::Syntax {
                message,
                line,
                column,
                text,
            } => self.report_syntax_failure(filename, message, *line, *column, text),
        }
    }

    pub fn report_finding(&mut self, classified: &ClassifiedFinding) -> io::Result<()> {
        match classified.tier {
            Tier::Silenced => return Ok(()),
            Tier::Warning => self.counters.warnings += 1,
            Tier::Error => self.counters.errors += 1,
        }
        writeln!(self.out, "{}", classified.finding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Finding, FindingKind};

    fn buffered() -> Reporter<Vec<u8>, Vec<u8>> {
        Reporter::new(Vec::new(), Vec::new())
    }

    fn output(reporter: Reporter<Vec<u8>, Vec<u8>>) -> (String, String) {
        let (out, err) = reporter.into_inner();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    fn classified(kind: FindingKind, tier: Tier) -> ClassifiedFinding {
        ClassifiedFinding {
            finding: Finding::new("mod.py", 2, kind, vec!["os".into()]),
            tier,
        }
    }

    #[test]
    fn test_failure_goes_to_severity_channel() {
        let mut reporter = buffered();
        reporter
            .report_failure("gone.py", "No such file or directory (os error 2)")
            .unwrap();
        assert_eq!(reporter.counters(), RunCounters { warnings: 0, errors: 1 });
        let (out, err) = output(reporter);
        assert_eq!(out, "");
        assert_eq!(err, "gone.py: No such file or directory (os error 2)\n");
    }

    #[test]
    fn test_syntax_failure_with_column_writes_three_lines() {
        let mut reporter = buffered();
        reporter
            .report_syntax_failure("bad.py", "invalid syntax", 1, Some(7), "def f(:")
            .unwrap();
        let (_, err) = output(reporter);
        assert_eq!(err, "bad.py:1:7: invalid syntax\ndef f(:\n      ^\n");
    }

    #[test]
    fn test_syntax_failure_without_column_has_no_caret() {
        let mut reporter = buffered();
        reporter
            .report_syntax_failure("bad.py", "invalid syntax", 4, None, "x = (")
            .unwrap();
        assert_eq!(reporter.counters().errors, 1);
        let (_, err) = output(reporter);
        assert_eq!(err, "bad.py:4: invalid syntax\nx = (\n");
    }

    #[test]
    fn test_syntax_failure_uses_last_line_of_text() {
        let mut reporter = buffered();
        reporter
            .report_syntax_failure("bad.py", "oops", 2, Some(3), "first\nab(\n")
            .unwrap();
        let (_, err) = output(reporter);
        assert_eq!(err, "bad.py:2:3: oops\nab(\n  ^\n");
    }

    #[test]
    fn test_legacy_offsets_adjust_column() {
        let mut reporter = buffered().with_legacy_offsets(true);
        reporter
            .report_syntax_failure("bad.py", "oops", 2, Some(9), "first\nab(")
            .unwrap();
        let (_, err) = output(reporter);
        assert_eq!(err, "bad.py:2:4: oops\nab(\n   ^\n");
    }

    #[test]
    fn test_parse_failure_dispatch() {
        let mut reporter = buffered();
        reporter
            .report_parse_failure("a.py", &ParseFailure::decode())
            .unwrap();
        reporter
            .report_parse_failure("b.py", &ParseFailure::decode_with("boom"))
            .unwrap();
        assert_eq!(reporter.counters().errors, 2);
        let (_, err) = output(reporter);
        assert_eq!(
            err,
            "a.py: problem decoding source\nb.py: problem decoding source: boom\n"
        );
    }

    #[test]
    fn test_findings_by_tier() {
        let mut reporter = buffered();
        reporter
            .report_finding(&classified(FindingKind::UnusedImport, Tier::Warning))
            .unwrap();
        reporter
            .report_finding(&classified(FindingKind::UndefinedName, Tier::Error))
            .unwrap();
        reporter
            .report_finding(&classified(FindingKind::UnusedImport, Tier::Silenced))
            .unwrap();
        assert_eq!(reporter.counters(), RunCounters { warnings: 1, errors: 1 });

        let (out, err) = output(reporter);
        assert_eq!(
            out,
            "mod.py:2: 'os' imported but unused\nmod.py:2: undefined name 'os'\n"
        );
        assert_eq!(err, "");
    }
}
