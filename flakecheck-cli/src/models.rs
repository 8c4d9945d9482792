//! Core data models for flakecheck
//!
//! These models flow from the checker through the classifier into the
//! reporter: raw findings, their assigned tier, and per-file parse failures.

use std::fmt;

/// What a finding is about.
///
/// The vocabulary is deliberately small; the classifier keys its policy on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingKind {
    UnusedImport,
    ImportStarUsed,
    UndefinedExport,
    UndefinedLocal,
    UndefinedName,
    UnusedVariable,
}

impl FindingKind {
    /// Render the human-readable message for this kind with its arguments.
    pub fn describe(&self, args: &[String]) -> String {
        let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or_default();
        match self {
            FindingKind::UnusedImport => format!("'{}' imported but unused", arg(0)),
            FindingKind::ImportStarUsed => format!(
                "'from {} import *' used; unable to detect undefined names",
                arg(0)
            ),
            FindingKind::UndefinedExport => format!("undefined name '{}' in __all__", arg(0)),
            FindingKind::UndefinedLocal => format!(
                "local variable '{}' defined in enclosing scope on line {} referenced before assignment",
                arg(0),
                arg(1)
            ),
            FindingKind::UndefinedName => format!("undefined name '{}'", arg(0)),
            FindingKind::UnusedVariable => {
                format!("local variable '{}' is assigned to but never used", arg(0))
            }
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::UnusedImport => write!(f, "unused-import"),
            FindingKind::ImportStarUsed => write!(f, "import-star-used"),
            FindingKind::UndefinedExport => write!(f, "undefined-export"),
            FindingKind::UndefinedLocal => write!(f, "undefined-local"),
            FindingKind::UndefinedName => write!(f, "undefined-name"),
            FindingKind::UnusedVariable => write!(f, "unused-variable"),
        }
    }
}

/// A single issue surfaced by the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub filename: String,
    /// 1-based source line
    pub line: usize,
    pub kind: FindingKind,
    /// Message arguments, e.g. the undefined name itself
    pub args: Vec<String>,
}

impl Finding {
    pub fn new(filename: impl Into<String>, line: usize, kind: FindingKind, args: Vec<String>) -> Self {
        Self {
            filename: filename.into(),
            line,
            kind,
            args,
        }
    }

    /// First message argument, if any.
    pub fn subject(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn message(&self) -> String {
        self.kind.describe(&self.args)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.filename, self.line, self.message())
    }
}

/// Severity tier assigned to a finding by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Silenced,
    Warning,
    Error,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Silenced => write!(f, "silenced"),
            Tier::Warning => write!(f, "warning"),
            Tier::Error => write!(f, "error"),
        }
    }
}

/// A finding together with the tier it was assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFinding {
    pub finding: Finding,
    pub tier: Tier,
}

/// Why a file could not be turned into a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// The bytes could not be read as source text. No location is known.
    Decode { detail: Option<String> },
    /// The text is not valid Python.
    Syntax {
        message: String,
        line: usize,
        /// 1-based character column, when known
        column: Option<usize>,
        /// Literal text of the offending line
        text: String,
    },
}

impl ParseFailure {
    pub fn decode() -> Self {
        ParseFailure::Decode { detail: None }
    }

    pub fn decode_with(detail: impl Into<String>) -> Self {
        ParseFailure::Decode {
            detail: Some(detail.into()),
        }
    }

    /// Message written for decode failures.
    pub fn decode_message(detail: Option<&str>) -> String {
        match detail {
            Some(detail) => format!("problem decoding source: {detail}"),
            None => "problem decoding source".to_string(),
        }
    }
}

/// Running totals owned by the reporter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub warnings: usize,
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_renders_like_a_compiler_diagnostic() {
        let finding = Finding::new("mod.py", 1, FindingKind::UnusedImport, vec!["os".into()]);
        assert_eq!(finding.to_string(), "mod.py:1: 'os' imported but unused");
    }

    #[test]
    fn test_undefined_local_message_names_origin_line() {
        let finding = Finding::new(
            "a.py",
            4,
            FindingKind::UndefinedLocal,
            vec!["x".into(), "1".into()],
        );
        assert_eq!(
            finding.message(),
            "local variable 'x' defined in enclosing scope on line 1 referenced before assignment"
        );
    }

    #[test]
    fn test_missing_args_do_not_panic() {
        let finding = Finding::new("a.py", 1, FindingKind::UndefinedName, vec![]);
        assert_eq!(finding.message(), "undefined name ''");
        assert_eq!(finding.subject(), None);
    }

    #[test]
    fn test_decode_message() {
        assert_eq!(ParseFailure::decode_message(None), "problem decoding source");
        assert_eq!(
            ParseFailure::decode_message(Some("boom")),
            "problem decoding source: boom"
        );
    }
}
