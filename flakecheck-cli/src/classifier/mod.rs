//! Severity classifier for findings
//!
//! A small ordered rule table assigns every raw finding one tier. The first
//! rule that applies wins; a finding no rule matches is a warning.

use crate::models::{ClassifiedFinding, Finding, FindingKind, Tier};
use rustc_hash::FxHashSet;
use std::path::Path;
use tracing::trace;

/// Undefined names that are tolerated (reported as warnings only).
pub const DEFAULT_ALLOWED_UNDEFINED: &[&str] = &["_", "openerp_version"];

/// Whether `filename` names a package initializer.
pub fn is_package_init(filename: &str) -> bool {
    Path::new(filename)
        .file_name()
        .is_some_and(|name| name == "__init__.py")
}

struct Rule {
    name: &'static str,
    applies: fn(&Classifier, &Finding) -> bool,
    tier: Tier,
}

const RULES: &[Rule] = &[
    Rule {
        name: "package-init-import",
        applies: package_init_import,
        tier: Tier::Silenced,
    },
    Rule {
        name: "allowed-undefined",
        applies: allowed_undefined,
        tier: Tier::Warning,
    },
    Rule {
        name: "undefined",
        applies: undefined,
        tier: Tier::Error,
    },
];

// Re-exporting names from `__init__.py` is the norm
fn package_init_import(_: &Classifier, finding: &Finding) -> bool {
    finding.kind == FindingKind::UnusedImport && is_package_init(&finding.filename)
}

fn allowed_undefined(classifier: &Classifier, finding: &Finding) -> bool {
    finding.kind == FindingKind::UndefinedName
        && finding
            .subject()
            .is_some_and(|name| classifier.allowed_undefined.contains(name))
}

fn undefined(_: &Classifier, finding: &Finding) -> bool {
    matches!(
        finding.kind,
        FindingKind::UndefinedExport | FindingKind::UndefinedLocal | FindingKind::UndefinedName
    )
}

/// Assigns findings to tiers
#[derive(Debug, Clone)]
pub struct Classifier {
    allowed_undefined: FxHashSet<String>,
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            allowed_undefined: DEFAULT_ALLOWED_UNDEFINED
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    /// Tolerate more undefined names on top of the defaults
    pub fn with_allowed_undefined<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_undefined
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn tier(&self, finding: &Finding) -> Tier {
        match RULES.iter().find(|rule| (rule.applies)(self, finding)) {
            Some(rule) => {
                trace!(
                    "{}:{} {} -> {} ({})",
                    finding.filename,
                    finding.line,
                    finding.kind,
                    rule.tier,
                    rule.name
                );
                rule.tier
            }
            None => {
                trace!(
                    "{}:{} {} -> warning (no rule)",
                    finding.filename,
                    finding.line,
                    finding.kind
                );
                Tier::Warning
            }
        }
    }

    pub fn classify(&self, finding: Finding) -> ClassifiedFinding {
        let tier = self.tier(&finding);
        ClassifiedFinding { finding, tier }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}
