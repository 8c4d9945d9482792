//! Scopes and name bindings tracked while walking a module

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ScopeKind {
    Module,
    Class,
    Function,
    /// Comprehensions and generator expressions
    Generator,
}

/// How a name came to be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum BindingKind {
    /// `import x` / `from m import x`; `display` is what reports show
    Import { display: String },
    /// Plain `name = value`; the only kind reported as an unused variable
    Assignment,
    /// Loop targets, tuple unpacking, `with ... as`, walrus, match captures
    Plain,
    Argument,
    /// `def` and `class`
    Definition,
    /// Placeholder created in the module scope by a `global` statement
    Global,
}

/// Where a binding was first read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Usage {
    pub scope: usize,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub(super) struct Binding {
    pub kind: BindingKind,
    pub line: usize,
    pub used: Option<Usage>,
}

impl Binding {
    pub fn new(kind: BindingKind, line: usize) -> Self {
        Self {
            kind,
            line,
            used: None,
        }
    }
}

#[derive(Debug)]
pub(super) struct Scope {
    pub kind: ScopeKind,
    pub bindings: IndexMap<String, Binding>,
    /// Names declared `global` in this scope
    pub globals: FxHashSet<String>,
    /// Names declared `nonlocal` in this scope
    pub nonlocals: FxHashSet<String>,
    pub star_import: bool,
    pub uses_locals: bool,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            bindings: IndexMap::new(),
            globals: FxHashSet::default(),
            nonlocals: FxHashSet::default(),
            star_import: false,
            uses_locals: false,
        }
    }

    /// Imports in this scope that nothing read, in binding order.
    pub fn unused_imports(&self) -> impl Iterator<Item = (&str, &Binding)> + '_ {
        self.bindings
            .values()
            .filter_map(|binding| match (&binding.kind, binding.used) {
                (BindingKind::Import { display }, None) => Some((display.as_str(), binding)),
                _ => None,
            })
    }

    /// Plain assignments that were never read.
    pub fn unused_assignments(&self) -> impl Iterator<Item = (&str, &Binding)> + '_ {
        self.bindings.iter().filter_map(move |(name, binding)| {
            let unused = binding.used.is_none()
                && binding.kind == BindingKind::Assignment
                && name != "_"
                && !self.globals.contains(name)
                && !self.uses_locals
                && !super::builtins::TRACEBACK_HOOKS.contains(&name.as_str());
            unused.then_some((name.as_str(), binding))
        })
    }
}
