//! Analysis engine
//!
//! This module defines the seam between the front-end and defect discovery:
//! - `Finder` trait that turns a parsed module into raw findings
//! - `Checker`, the bundled scope-tracking implementation

mod builtins;
mod scope;
mod walker;

use crate::models::Finding;
use crate::parsers::python::Module;
use rustc_hash::FxHashSet;

/// Walks a parsed module and emits raw findings.
///
/// Findings may come back in any order; the front-end adapter sorts them.
pub trait Finder {
    fn find(&self, module: &Module, filename: &str) -> Vec<Finding>;
}

/// Default finder: tracks bindings per scope and reports misused names
#[derive(Debug, Clone)]
pub struct Checker {
    /// Names that are never undefined
    builtins: FxHashSet<String>,
}

impl Checker {
    pub fn new() -> Self {
        Self::with_builtins(std::iter::empty::<String>())
    }

    /// Create a checker that also treats `extra` names as built in
    pub fn with_builtins<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let builtins = builtins::BUILTINS
            .iter()
            .chain(builtins::MAGIC_GLOBALS)
            .map(|name| name.to_string())
            .chain(extra.into_iter().map(Into::into))
            .collect();
        Self { builtins }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Finder for Checker {
    fn find(&self, module: &Module, filename: &str) -> Vec<Finding> {
        walker::Walker::new(module, filename, &self.builtins).run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FindingKind;
    use crate::parsers::analyze;

    fn flakes_in(filename: &str, source: &str) -> Vec<(usize, FindingKind, Vec<String>)> {
        analyze(source, filename, &Checker::new())
            .unwrap()
            .into_iter()
            .map(|f| (f.line, f.kind, f.args))
            .collect()
    }

    fn flakes(source: &str) -> Vec<(usize, FindingKind, Vec<String>)> {
        flakes_in("test.py", source)
    }

    fn one(line: usize, kind: FindingKind, args: &[&str]) -> (usize, FindingKind, Vec<String>) {
        (line, kind, args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_unused_import() {
        assert_eq!(flakes("import os\n"), vec![one(1, FindingKind::UnusedImport, &["os"])]);
        assert!(flakes("import os\nos.getcwd()\n").is_empty());
    }

    #[test]
    fn test_import_display_names() {
        assert_eq!(
            flakes("import os.path\nimport numpy as np\nfrom a import b as c\n"),
            vec![
                one(1, FindingKind::UnusedImport, &["os.path"]),
                one(2, FindingKind::UnusedImport, &["numpy as np"]),
                one(3, FindingKind::UnusedImport, &["a.b as c"]),
            ]
        );
    }

    #[test]
    fn test_same_line_imports_keep_statement_order() {
        assert_eq!(
            flakes("import os, sys\n"),
            vec![
                one(1, FindingKind::UnusedImport, &["os"]),
                one(1, FindingKind::UnusedImport, &["sys"]),
            ]
        );
    }

    #[test]
    fn test_future_imports_are_ignored() {
        assert!(flakes("from __future__ import annotations\n").is_empty());
    }

    #[test]
    fn test_undefined_name() {
        assert_eq!(flakes("x = y\n"), vec![one(1, FindingKind::UndefinedName, &["y"])]);
        assert!(flakes("print(len([]))\n").is_empty());
    }

    #[test]
    fn test_functions_see_later_module_names() {
        assert!(flakes("def f():\n    return g()\n\ndef g():\n    pass\n").is_empty());
    }

    #[test]
    fn test_star_import_suppresses_undefined_names() {
        assert_eq!(
            flakes("from os import *\nprint(path)\n"),
            vec![one(1, FindingKind::ImportStarUsed, &["os"])]
        );
    }

    #[test]
    fn test_undefined_export() {
        assert_eq!(
            flakes("__all__ = ['a', 'b']\na = 1\n"),
            vec![one(1, FindingKind::UndefinedExport, &["b"])]
        );
    }

    #[test]
    fn test_exported_imports_count_as_used() {
        assert!(flakes("from os import path\n__all__ = ['path']\n").is_empty());
        assert!(flakes("import os\n__all__ = []\n__all__ += ['os']\n").is_empty());
    }

    #[test]
    fn test_undefined_export_silent_in_package_init() {
        assert!(flakes_in("pkg/__init__.py", "__all__ = ['missing']\n").is_empty());
    }

    #[test]
    fn test_path_defined_in_package_init() {
        assert!(flakes_in("pkg/__init__.py", "print(__path__)\n").is_empty());
        assert_eq!(
            flakes("print(__path__)\n"),
            vec![one(1, FindingKind::UndefinedName, &["__path__"])]
        );
    }

    #[test]
    fn test_undefined_local() {
        let source = "x = 1\ndef f():\n    print(x)\n    x = 2\n";
        assert_eq!(
            flakes(source),
            vec![
                one(3, FindingKind::UndefinedLocal, &["x", "1"]),
                one(4, FindingKind::UnusedVariable, &["x"]),
            ]
        );
    }

    #[test]
    fn test_unused_variable() {
        assert_eq!(
            flakes("def f():\n    x = 1\n"),
            vec![one(2, FindingKind::UnusedVariable, &["x"])]
        );
        assert!(flakes("def f():\n    x = 1\n    return x\n").is_empty());
        assert!(flakes("def f():\n    _ = 1\n").is_empty());
        assert!(flakes("def f():\n    a, b = 1, 2\n").is_empty());
    }

    #[test]
    fn test_locals_call_uses_every_variable() {
        assert!(flakes("def f():\n    x = 1\n    return locals()\n").is_empty());
    }

    #[test]
    fn test_unused_except_name() {
        assert_eq!(
            flakes("try:\n    pass\nexcept Exception as e:\n    pass\n"),
            vec![one(3, FindingKind::UnusedVariable, &["e"])]
        );
        assert!(flakes("try:\n    pass\nexcept Exception as e:\n    print(e)\n").is_empty());
    }

    #[test]
    fn test_global_retracts_module_undefined_name() {
        let source = "def f():\n    global g\n    g = 1\n\nprint(g)\n";
        assert!(flakes(source).is_empty());
    }

    #[test]
    fn test_class_scope_hidden_from_methods() {
        let source = "class A:\n    x = 1\n    def f(self):\n        return x\n";
        assert_eq!(flakes(source), vec![one(4, FindingKind::UndefinedName, &["x"])]);
    }

    #[test]
    fn test_class_scope_visible_to_comprehensions() {
        assert!(flakes("class A:\n    x = 1\n    y = [x for _ in range(3)]\n").is_empty());
        assert!(flakes("class A:\n    __qualname__\n").is_empty());
    }

    #[test]
    fn test_comprehension_variables_do_not_leak() {
        assert_eq!(
            flakes("[i for i in range(3)]\nprint(i)\n"),
            vec![one(2, FindingKind::UndefinedName, &["i"])]
        );
    }

    #[test]
    fn test_walrus_binds_outside_comprehension() {
        assert!(flakes("[(y := i) for i in range(3)]\nprint(y)\n").is_empty());
    }

    #[test]
    fn test_lambda_body_is_checked() {
        assert_eq!(
            flakes("f = lambda: missing\n"),
            vec![one(1, FindingKind::UndefinedName, &["missing"])]
        );
        assert!(flakes("f = lambda a, *rest, **kw: (a, rest, kw)\n").is_empty());
    }

    #[test]
    fn test_delete() {
        assert_eq!(flakes("del x\n"), vec![one(1, FindingKind::UndefinedName, &["x"])]);
        assert!(flakes("x = 1\ndel x\n").is_empty());
        assert!(flakes("if True:\n    del x\n").is_empty());
        assert_eq!(
            flakes("x = 1\ndel x\nprint(x)\n"),
            vec![one(3, FindingKind::UndefinedName, &["x"])]
        );
    }

    #[test]
    fn test_match_captures_bind_names() {
        let source = "match p:\n    case [x, *rest]:\n        print(x, rest)\n    case {'k': v, **kw}:\n        print(v, kw)\n";
        assert_eq!(flakes(source), vec![one(1, FindingKind::UndefinedName, &["p"])]);
    }

    #[test]
    fn test_extra_builtins() {
        let checker = Checker::with_builtins(["_"]);
        let findings = analyze("_('hello')\n", "t.py", &checker).unwrap();
        assert!(findings.is_empty());

        let findings = analyze("_('hello')\n", "t.py", &Checker::new()).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_function_scope_unused_import() {
        assert_eq!(
            flakes("def f():\n    import json\n"),
            vec![one(2, FindingKind::UnusedImport, &["json"])]
        );
    }

    #[test]
    fn test_closure_reads_enclosing_variable() {
        let source = "def f():\n    x = 1\n    def g():\n        return x\n    return g\n";
        assert!(flakes(source).is_empty());
    }

    #[test]
    fn test_lambda_reads_enclosing_variable() {
        assert!(flakes("def f():\n    x = 1\n    return lambda: x\n").is_empty());
    }

    #[test]
    fn test_import_used_only_by_nested_function() {
        let source = "def f():\n    import os\n    def g():\n        return os.sep\n    return g\n";
        assert!(flakes(source).is_empty());
    }

    #[test]
    fn test_deeply_nested_closure_reads_outer_variable() {
        let source = "def f():\n    x = 1\n    def g():\n        def h():\n            return x\n        return h\n    return g\n";
        assert!(flakes(source).is_empty());
    }

    #[test]
    fn test_unused_variable_next_to_closure_still_reported() {
        let source = "def f():\n    x = 1\n    y = 2\n    return lambda: x\n";
        assert_eq!(
            flakes(source),
            vec![one(3, FindingKind::UnusedVariable, &["y"])]
        );
    }
}
