//! Front-end adapter
//!
//! Turns one file's text into findings: parse with the Python front-end,
//! hand the tree to a [`Finder`], and order the result by line.

pub mod python;

use crate::checker::Finder;
use crate::models::{Finding, ParseFailure};

/// Parse `source` and collect the finder's findings, sorted by line.
///
/// The sort is stable: findings on the same line keep the order the finder
/// emitted them in.
pub fn analyze<F: Finder + ?Sized>(
    source: &str,
    filename: &str,
    finder: &F,
) -> Result<Vec<Finding>, ParseFailure> {
    let module = python::compile(source, filename)?;
    let mut findings = finder.find(&module, filename);
    findings.sort_by_key(|f| f.line);
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FindingKind;
    use crate::parsers::python::Module;

    /// Emits a fixed list of findings regardless of the tree
    struct Canned(Vec<(usize, &'static str)>);

    impl Finder for Canned {
        fn find(&self, _module: &Module, filename: &str) -> Vec<Finding> {
            self.0
                .iter()
                .map(|(line, name)| {
                    Finding::new(filename, *line, FindingKind::UndefinedName, vec![name.to_string()])
                })
                .collect()
        }
    }

    #[test]
    fn test_sorts_by_line_keeping_emission_order_for_ties() {
        let finder = Canned(vec![(3, "c"), (1, "a1"), (2, "b"), (1, "a2"), (3, "d"), (1, "a3")]);
        let findings = analyze("pass\n", "t.py", &finder).unwrap();
        let order: Vec<&str> = findings.iter().filter_map(|f| f.subject()).collect();
        assert_eq!(order, vec!["a1", "a2", "a3", "b", "c", "d"]);
    }

    #[test]
    fn test_parse_failure_produces_no_findings() {
        let finder = Canned(vec![(1, "never")]);
        let result = analyze("def f(:\n", "bad.py", &finder);
        assert!(matches!(result, Err(ParseFailure::Syntax { .. })));
    }
}
