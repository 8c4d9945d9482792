//! AST walk that binds names to scopes and reports misuse
//!
//! Function and lambda bodies are deferred until the module body has been
//! walked, so a function may read a name the module binds further down.

use super::builtins::CLASS_MAGIC;
use super::scope::{Binding, BindingKind, Scope, ScopeKind, Usage};
use crate::classifier::is_package_init;
use crate::models::{Finding, FindingKind};
use crate::parsers::python::Module;
use rustc_hash::FxHashSet;
use rustpython_parser::ast::{
    Arguments, Comprehension, Constant, ExceptHandler, Expr, ExprContext, Pattern, Stmt,
};
use std::collections::VecDeque;

enum Body<'a> {
    Block(&'a [Stmt]),
    Lambda(&'a Expr),
}

/// A function body waiting to be walked, with the scopes it closes over.
struct Deferred<'a> {
    args: &'a Arguments,
    body: Body<'a>,
    stack: Vec<usize>,
}

/// Names listed in the module's `__all__`
struct Exports {
    names: Vec<String>,
    line: usize,
}

pub(super) struct Walker<'a> {
    module: &'a Module,
    filename: &'a str,
    builtins: &'a FxHashSet<String>,
    package_init: bool,
    /// Every scope ever opened; ids index into this
    scopes: Vec<Scope>,
    /// Currently open scopes, innermost last
    stack: Vec<usize>,
    deferred: VecDeque<Deferred<'a>>,
    exports: Option<Exports>,
    branch_depth: usize,
    findings: Vec<Finding>,
}

impl<'a> Walker<'a> {
    pub fn new(module: &'a Module, filename: &'a str, builtins: &'a FxHashSet<String>) -> Self {
        Self {
            module,
            filename,
            builtins,
            package_init: is_package_init(filename),
            scopes: Vec::new(),
            stack: Vec::new(),
            deferred: VecDeque::new(),
            exports: None,
            branch_depth: 0,
            findings: Vec::new(),
        }
    }

    pub fn run(mut self) -> Vec<Finding> {
        let module = self.module;
        self.push_scope(ScopeKind::Module);
        self.visit_body(module.body());

        // Nested bodies may read a function's locals, so unused checks wait
        // until every deferred body has been walked.
        let mut functions = Vec::new();
        while let Some(deferred) = self.deferred.pop_front() {
            functions.push(self.run_deferred(deferred));
        }
        for scope in functions {
            self.finish_function(scope);
        }

        self.stack.truncate(1);
        self.finish_module();
        self.findings
    }

    fn run_deferred(&mut self, deferred: Deferred<'a>) -> usize {
        self.stack = deferred.stack;
        self.branch_depth = 0;
        let scope = self.push_scope(ScopeKind::Function);
        self.bind_arguments(deferred.args);
        match deferred.body {
            Body::Block(body) => self.visit_body(body),
            Body::Lambda(expr) => self.visit_expr(expr),
        }
        self.stack.pop();
        scope
    }

    fn finish_function(&mut self, scope: usize) {
        let scope = &self.scopes[scope];
        let mut reports: Vec<(usize, FindingKind, String)> = scope
            .unused_assignments()
            .map(|(name, binding)| (binding.line, FindingKind::UnusedVariable, name.to_string()))
            .collect();
        reports.extend(
            scope
                .unused_imports()
                .map(|(display, binding)| (binding.line, FindingKind::UnusedImport, display.to_string())),
        );
        for (line, kind, arg) in reports {
            self.report(line, kind, vec![arg]);
        }
    }

    fn finish_module(&mut self) {
        let module_scope = self.stack[0];
        if let Some(exports) = self.exports.take() {
            let scope = &mut self.scopes[module_scope];
            let check_undefined = !scope.star_import && !self.package_init;
            let mut undefined = Vec::new();
            for name in &exports.names {
                match scope.bindings.get_mut(name) {
                    Some(binding) => {
                        binding.used.get_or_insert(Usage {
                            scope: module_scope,
                            line: exports.line,
                        });
                    }
                    None if check_undefined => {
                        undefined.push(name.clone());
                    }
                    None => {}
                }
            }
            for name in undefined {
                self.report(exports.line, FindingKind::UndefinedExport, vec![name]);
            }
        }

        let unused: Vec<(usize, String)> = self.scopes[module_scope]
            .unused_imports()
            .map(|(display, binding)| (binding.line, display.to_string()))
            .collect();
        for (line, display) in unused {
            self.report(line, FindingKind::UnusedImport, vec![display]);
        }
    }

    // ---- scopes and bindings ----

    fn push_scope(&mut self, kind: ScopeKind) -> usize {
        let id = self.scopes.len();
        self.scopes.push(Scope::new(kind));
        self.stack.push(id);
        id
    }

    fn current(&self) -> usize {
        self.stack.last().copied().unwrap_or_default()
    }

    fn in_branch(&mut self, walk: impl FnOnce(&mut Self)) {
        self.branch_depth += 1;
        walk(self);
        self.branch_depth -= 1;
    }

    fn line(&self, offset: impl Into<usize>) -> usize {
        self.module.line_of(offset.into())
    }

    fn report(&mut self, line: usize, kind: FindingKind, args: Vec<String>) {
        self.findings
            .push(Finding::new(self.filename, line, kind, args));
    }

    /// Scope a store to `name` lands in, honouring `global` and `nonlocal`.
    fn binding_target(&self, name: &str) -> usize {
        let current = self.current();
        let scope = &self.scopes[current];
        if scope.globals.contains(name) {
            return self.stack[0];
        }
        if scope.nonlocals.contains(name) {
            let enclosing = self.stack.iter().rev().skip(1).copied().find(|&id| {
                let scope = &self.scopes[id];
                scope.kind == ScopeKind::Function && scope.bindings.contains_key(name)
            });
            if let Some(id) = enclosing {
                return id;
            }
        }
        current
    }

    fn add_binding(&mut self, name: &str, binding: Binding) {
        let target = self.binding_target(name);
        self.add_binding_in(target, name, binding);
    }

    fn add_binding_in(&mut self, scope: usize, name: &str, mut binding: Binding) {
        let bindings = &mut self.scopes[scope].bindings;
        if let Some(existing) = bindings.get(name) {
            binding.used = existing.used;
        }
        bindings.insert(name.to_string(), binding);
    }

    fn handle_store(&mut self, name: &str, line: usize, kind: BindingKind) {
        self.check_undefined_local(name);
        self.add_binding(name, Binding::new(kind, line));
    }

    /// A function assigning a name it already read from an enclosing scope.
    fn check_undefined_local(&mut self, name: &str) {
        let current = self.current();
        let scope = &self.scopes[current];
        if scope.kind != ScopeKind::Function
            || scope.bindings.contains_key(name)
            || scope.globals.contains(name)
            || scope.nonlocals.contains(name)
        {
            return;
        }

        let enclosing = &self.stack[..self.stack.len() - 1];
        let hit = enclosing
            .iter()
            .filter(|&&id| matches!(self.scopes[id].kind, ScopeKind::Function | ScopeKind::Module))
            .find_map(|&id| {
                let binding = self.scopes[id].bindings.get(name)?;
                let usage = binding.used?;
                (usage.scope == current).then_some((usage.line, binding.line))
            });

        if let Some((used_line, bound_line)) = hit {
            self.report(
                used_line,
                FindingKind::UndefinedLocal,
                vec![name.to_string(), bound_line.to_string()],
            );
        }
    }

    fn handle_load(&mut self, name: &str, line: usize) {
        let current = self.current();
        if name == "locals" && self.scopes[current].kind == ScopeKind::Function {
            self.scopes[current].uses_locals = true;
        }

        // Class bodies are visible to themselves and to generators directly inside them
        let mut in_generators = false;
        let mut star_import = false;
        for i in (0..self.stack.len()).rev() {
            let id = self.stack[i];
            let scope = &mut self.scopes[id];
            if scope.kind == ScopeKind::Class && id != current && !in_generators {
                continue;
            }
            star_import |= scope.star_import;
            if let Some(binding) = scope.bindings.get_mut(name) {
                binding.used = Some(Usage {
                    scope: current,
                    line,
                });
                return;
            }
            in_generators = scope.kind == ScopeKind::Generator;
        }

        if star_import || self.builtins.contains(name) {
            return;
        }
        if name == "__path__" && self.package_init {
            return;
        }
        if CLASS_MAGIC.contains(&name) && self.scopes[current].kind == ScopeKind::Class {
            return;
        }
        self.report(line, FindingKind::UndefinedName, vec![name.to_string()]);
    }

    fn handle_delete(&mut self, name: &str, line: usize) {
        // A conditional branch may never run
        if self.branch_depth > 0 {
            return;
        }
        let current = self.current();
        let scope = &mut self.scopes[current];
        if scope.globals.remove(name) {
            return;
        }
        if scope.bindings.shift_remove(name).is_none() {
            self.report(line, FindingKind::UndefinedName, vec![name.to_string()]);
        }
    }

    // ---- statements ----

    fn visit_body(&mut self, body: &'a [Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::FunctionDef(func) => {
                let line = self.line(func.range.start());
                self.visit_function(
                    func.name.as_str(),
                    &func.decorator_list,
                    &func.args,
                    func.returns.as_deref(),
                    &func.body,
                    line,
                );
            }
            Stmt::AsyncFunctionDef(func) => {
                let line = self.line(func.range.start());
                self.visit_function(
                    func.name.as_str(),
                    &func.decorator_list,
                    &func.args,
                    func.returns.as_deref(),
                    &func.body,
                    line,
                );
            }
            Stmt::ClassDef(class) => {
                for decorator in &class.decorator_list {
                    self.visit_expr(decorator);
                }
                for base in &class.bases {
                    self.visit_expr(base);
                }
                for keyword in &class.keywords {
                    self.visit_expr(&keyword.value);
                }
                self.push_scope(ScopeKind::Class);
                self.visit_body(&class.body);
                self.stack.pop();
                let line = self.line(class.range.start());
                self.add_binding(class.name.as_str(), Binding::new(BindingKind::Definition, line));
            }
            Stmt::Return(ret) => {
                if let Some(value) = &ret.value {
                    self.visit_expr(value);
                }
            }
            Stmt::Delete(delete) => {
                for target in &delete.targets {
                    self.visit_expr(target);
                }
            }
            Stmt::Assign(assign) => {
                self.visit_expr(&assign.value);
                for target in &assign.targets {
                    self.collect_exports(target, &assign.value, false);
                    self.visit_target(target, BindingKind::Assignment);
                }
            }
            Stmt::AugAssign(aug) => {
                if let Expr::Name(name) = aug.target.as_ref() {
                    let line = self.line(name.range.start());
                    self.handle_load(name.id.as_str(), line);
                }
                self.visit_expr(&aug.value);
                self.collect_exports(&aug.target, &aug.value, true);
                self.visit_target(&aug.target, BindingKind::Assignment);
            }
            Stmt::AnnAssign(ann) => {
                self.visit_expr(&ann.annotation);
                if let Some(value) = &ann.value {
                    self.visit_expr(value);
                    self.collect_exports(&ann.target, value, false);
                    self.visit_target(&ann.target, BindingKind::Assignment);
                } else if !matches!(ann.target.as_ref(), Expr::Name(_)) {
                    self.visit_target(&ann.target, BindingKind::Plain);
                }
            }
            Stmt::For(for_stmt) => {
                self.visit_for(&for_stmt.target, &for_stmt.iter, &for_stmt.body, &for_stmt.orelse)
            }
            Stmt::AsyncFor(for_stmt) => {
                self.visit_for(&for_stmt.target, &for_stmt.iter, &for_stmt.body, &for_stmt.orelse)
            }
            Stmt::While(while_stmt) => {
                self.visit_expr(&while_stmt.test);
                self.in_branch(|w| {
                    w.visit_body(&while_stmt.body);
                    w.visit_body(&while_stmt.orelse);
                });
            }
            Stmt::If(if_stmt) => {
                self.visit_expr(&if_stmt.test);
                self.in_branch(|w| {
                    w.visit_body(&if_stmt.body);
                    w.visit_body(&if_stmt.orelse);
                });
            }
            Stmt::With(with_stmt) => {
                for item in &with_stmt.items {
                    self.visit_expr(&item.context_expr);
                    if let Some(vars) = &item.optional_vars {
                        self.visit_target(vars, BindingKind::Plain);
                    }
                }
                self.visit_body(&with_stmt.body);
            }
            Stmt::AsyncWith(with_stmt) => {
                for item in &with_stmt.items {
                    self.visit_expr(&item.context_expr);
                    if let Some(vars) = &item.optional_vars {
                        self.visit_target(vars, BindingKind::Plain);
                    }
                }
                self.visit_body(&with_stmt.body);
            }
            Stmt::Match(match_stmt) => {
                self.visit_expr(&match_stmt.subject);
                for case in &match_stmt.cases {
                    self.in_branch(|w| {
                        w.visit_pattern(&case.pattern);
                        if let Some(guard) = &case.guard {
                            w.visit_expr(guard);
                        }
                        w.visit_body(&case.body);
                    });
                }
            }
            Stmt::Raise(raise) => {
                if let Some(exc) = &raise.exc {
                    self.visit_expr(exc);
                }
                if let Some(cause) = &raise.cause {
                    self.visit_expr(cause);
                }
            }
            Stmt::Try(try_stmt) => self.visit_try(
                &try_stmt.body,
                &try_stmt.handlers,
                &try_stmt.orelse,
                &try_stmt.finalbody,
            ),
            Stmt::TryStar(try_stmt) => self.visit_try(
                &try_stmt.body,
                &try_stmt.handlers,
                &try_stmt.orelse,
                &try_stmt.finalbody,
            ),
            Stmt::Assert(assert) => {
                self.visit_expr(&assert.test);
                if let Some(msg) = &assert.msg {
                    self.visit_expr(msg);
                }
            }
            Stmt::Import(import) => {
                let line = self.line(import.range.start());
                for alias in &import.names {
                    let full = alias.name.as_str();
                    let (name, display) = match &alias.asname {
                        Some(asname) => (asname.as_str(), format!("{full} as {asname}")),
                        // `import a.b` binds `a`
                        None => (full.split('.').next().unwrap_or(full), full.to_string()),
                    };
                    self.add_binding(name, Binding::new(BindingKind::Import { display }, line));
                }
            }
            Stmt::ImportFrom(import) => {
                let module = import.module.as_ref().map(|m| m.as_str()).unwrap_or_default();
                if module == "__future__" {
                    return;
                }
                let line = self.line(import.range.start());
                for alias in &import.names {
                    let imported = alias.name.as_str();
                    if imported == "*" {
                        let current = self.current();
                        self.scopes[current].star_import = true;
                        let shown = if module.is_empty() { "." } else { module };
                        self.report(line, FindingKind::ImportStarUsed, vec![shown.to_string()]);
                        continue;
                    }
                    let qualified = if module.is_empty() {
                        imported.to_string()
                    } else {
                        format!("{module}.{imported}")
                    };
                    let (name, display) = match &alias.asname {
                        Some(asname) => (asname.as_str(), format!("{qualified} as {asname}")),
                        None => (imported, qualified),
                    };
                    self.add_binding(name, Binding::new(BindingKind::Import { display }, line));
                }
            }
            Stmt::Global(global) => {
                let current = self.current();
                if self.scopes[current].kind == ScopeKind::Module {
                    return;
                }
                let module_scope = self.stack[0];
                let line = self.line(global.range.start());
                for name in &global.names {
                    let name = name.as_str();
                    self.scopes[current].globals.insert(name.to_string());
                    // Reads at module level ran before this body did
                    self.findings.retain(|f| {
                        !(f.kind == FindingKind::UndefinedName && f.subject() == Some(name))
                    });
                    self.scopes[module_scope]
                        .bindings
                        .entry(name.to_string())
                        .or_insert_with(|| Binding {
                            kind: BindingKind::Global,
                            line,
                            used: Some(Usage {
                                scope: current,
                                line,
                            }),
                        });
                }
            }
            Stmt::Nonlocal(nonlocal) => {
                let current = self.current();
                for name in &nonlocal.names {
                    self.scopes[current].nonlocals.insert(name.to_string());
                }
            }
            Stmt::Expr(expr_stmt) => self.visit_expr(&expr_stmt.value),
            _ => {}
        }
    }

    fn visit_function(
        &mut self,
        name: &str,
        decorators: &'a [Expr],
        args: &'a Arguments,
        returns: Option<&'a Expr>,
        body: &'a [Stmt],
        line: usize,
    ) {
        for decorator in decorators {
            self.visit_expr(decorator);
        }
        self.visit_signature(args);
        if let Some(returns) = returns {
            self.visit_expr(returns);
        }
        self.add_binding(name, Binding::new(BindingKind::Definition, line));
        self.defer(args, Body::Block(body));
    }

    fn visit_for(&mut self, target: &'a Expr, iter: &'a Expr, body: &'a [Stmt], orelse: &'a [Stmt]) {
        self.visit_expr(iter);
        self.visit_target(target, BindingKind::Plain);
        self.in_branch(|w| {
            w.visit_body(body);
            w.visit_body(orelse);
        });
    }

    fn visit_try(
        &mut self,
        body: &'a [Stmt],
        handlers: &'a [ExceptHandler],
        orelse: &'a [Stmt],
        finalbody: &'a [Stmt],
    ) {
        self.in_branch(|w| {
            w.visit_body(body);
            for handler in handlers {
                w.visit_handler(handler);
            }
            w.visit_body(orelse);
        });
        self.visit_body(finalbody);
    }

    fn visit_handler(&mut self, handler: &'a ExceptHandler) {
        let ExceptHandler::ExceptHandler(h) = handler;
        if let Some(type_) = &h.type_ {
            self.visit_expr(type_);
        }
        let Some(name) = &h.name else {
            self.visit_body(&h.body);
            return;
        };

        let name = name.as_str();
        let line = self.line(h.range.start());
        let current = self.current();
        let previous = self.scopes[current].bindings.shift_remove(name);
        self.handle_store(name, line, BindingKind::Plain);
        self.visit_body(&h.body);

        // The name is unbound again once the handler exits
        if let Some(binding) = self.scopes[current].bindings.shift_remove(name) {
            if binding.used.is_none() {
                self.report(line, FindingKind::UnusedVariable, vec![name.to_string()]);
            }
        }
        if let Some(previous) = previous {
            self.scopes[current]
                .bindings
                .insert(name.to_string(), previous);
        }
    }

    fn visit_signature(&mut self, args: &'a Arguments) {
        for arg in args.posonlyargs.iter().chain(&args.args).chain(&args.kwonlyargs) {
            if let Some(default) = &arg.default {
                self.visit_expr(default);
            }
            if let Some(annotation) = &arg.def.annotation {
                self.visit_expr(annotation);
            }
        }
        for arg in args.vararg.iter().chain(args.kwarg.iter()) {
            if let Some(annotation) = &arg.annotation {
                self.visit_expr(annotation);
            }
        }
    }

    fn bind_arguments(&mut self, args: &'a Arguments) {
        for arg in args.posonlyargs.iter().chain(&args.args).chain(&args.kwonlyargs) {
            let line = self.line(arg.def.range.start());
            self.add_binding(arg.def.arg.as_str(), Binding::new(BindingKind::Argument, line));
        }
        for arg in args.vararg.iter().chain(args.kwarg.iter()) {
            let line = self.line(arg.range.start());
            self.add_binding(arg.arg.as_str(), Binding::new(BindingKind::Argument, line));
        }
    }

    fn defer(&mut self, args: &'a Arguments, body: Body<'a>) {
        self.deferred.push_back(Deferred {
            args,
            body,
            stack: self.stack.clone(),
        });
    }

    /// Record `__all__ = [...]` (or `+=`) at module level.
    fn collect_exports(&mut self, target: &Expr, value: &Expr, augmented: bool) {
        let Expr::Name(name) = target else {
            return;
        };
        if name.id.as_str() != "__all__" || self.scopes[self.current()].kind != ScopeKind::Module {
            return;
        }
        let elts = match value {
            Expr::List(list) => &list.elts,
            Expr::Tuple(tuple) => &tuple.elts,
            _ => return,
        };
        let names: Vec<String> = elts
            .iter()
            .filter_map(|elt| match elt {
                Expr::Constant(constant) => match &constant.value {
                    Constant::Str(s) => Some(s.clone()),
                    _ => None,
                },
                _ => None,
            })
            .collect();

        let line = self.line(name.range.start());
        match (&mut self.exports, augmented) {
            (Some(exports), true) => exports.names.extend(names),
            _ => self.exports = Some(Exports { names, line }),
        }
    }

    // ---- expressions ----

    fn visit_target(&mut self, target: &'a Expr, kind: BindingKind) {
        match target {
            Expr::Name(name) => {
                let line = self.line(name.range.start());
                self.handle_store(name.id.as_str(), line, kind);
            }
            Expr::Tuple(tuple) => {
                for elt in &tuple.elts {
                    self.visit_target(elt, BindingKind::Plain);
                }
            }
            Expr::List(list) => {
                for elt in &list.elts {
                    self.visit_target(elt, BindingKind::Plain);
                }
            }
            Expr::Starred(starred) => self.visit_target(&starred.value, BindingKind::Plain),
            Expr::Attribute(attr) => self.visit_expr(&attr.value),
            Expr::Subscript(sub) => {
                self.visit_expr(&sub.value);
                self.visit_expr(&sub.slice);
            }
            other => self.visit_expr(other),
        }
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Name(name) => {
                let line = self.line(name.range.start());
                let id = name.id.as_str();
                match name.ctx {
                    ExprContext::Load => self.handle_load(id, line),
                    ExprContext::Store => self.handle_store(id, line, BindingKind::Plain),
                    ExprContext::Del => self.handle_delete(id, line),
                }
            }
            Expr::Attribute(attr) => self.visit_expr(&attr.value),
            Expr::Call(call) => {
                self.visit_expr(&call.func);
                for arg in &call.args {
                    self.visit_expr(arg);
                }
                for keyword in &call.keywords {
                    self.visit_expr(&keyword.value);
                }
            }
            Expr::BinOp(binop) => {
                self.visit_expr(&binop.left);
                self.visit_expr(&binop.right);
            }
            Expr::UnaryOp(unary) => self.visit_expr(&unary.operand),
            Expr::Compare(cmp) => {
                self.visit_expr(&cmp.left);
                for comp in &cmp.comparators {
                    self.visit_expr(comp);
                }
            }
            Expr::BoolOp(boolop) => {
                for value in &boolop.values {
                    self.visit_expr(value);
                }
            }
            Expr::IfExp(ifexp) => {
                self.visit_expr(&ifexp.test);
                self.visit_expr(&ifexp.body);
                self.visit_expr(&ifexp.orelse);
            }
            Expr::Dict(dict) => {
                for key in dict.keys.iter().flatten() {
                    self.visit_expr(key);
                }
                for value in &dict.values {
                    self.visit_expr(value);
                }
            }
            Expr::List(list) => {
                for elt in &list.elts {
                    self.visit_expr(elt);
                }
            }
            Expr::Tuple(tuple) => {
                for elt in &tuple.elts {
                    self.visit_expr(elt);
                }
            }
            Expr::Set(set) => {
                for elt in &set.elts {
                    self.visit_expr(elt);
                }
            }
            Expr::Subscript(sub) => {
                self.visit_expr(&sub.value);
                self.visit_expr(&sub.slice);
            }
            Expr::Starred(starred) => self.visit_expr(&starred.value),
            Expr::Lambda(lambda) => {
                self.visit_signature(&lambda.args);
                self.defer(&lambda.args, Body::Lambda(&lambda.body));
            }
            Expr::ListComp(comp) => self.visit_comprehension(&comp.generators, &[comp.elt.as_ref()]),
            Expr::SetComp(comp) => self.visit_comprehension(&comp.generators, &[comp.elt.as_ref()]),
            Expr::GeneratorExp(comp) => {
                self.visit_comprehension(&comp.generators, &[comp.elt.as_ref()])
            }
            Expr::DictComp(comp) => self.visit_comprehension(
                &comp.generators,
                &[comp.key.as_ref(), comp.value.as_ref()],
            ),
            Expr::Await(await_expr) => self.visit_expr(&await_expr.value),
            Expr::Yield(yield_expr) => {
                if let Some(value) = &yield_expr.value {
                    self.visit_expr(value);
                }
            }
            Expr::YieldFrom(yf) => self.visit_expr(&yf.value),
            Expr::FormattedValue(fv) => {
                self.visit_expr(&fv.value);
                if let Some(spec) = &fv.format_spec {
                    self.visit_expr(spec);
                }
            }
            Expr::JoinedStr(js) => {
                for value in &js.values {
                    self.visit_expr(value);
                }
            }
            Expr::NamedExpr(named) => {
                self.visit_expr(&named.value);
                if let Expr::Name(target) = named.target.as_ref() {
                    // Walrus targets escape comprehensions into the enclosing scope
                    let line = self.line(target.range.start());
                    let scope = self
                        .stack
                        .iter()
                        .rev()
                        .copied()
                        .find(|&id| self.scopes[id].kind != ScopeKind::Generator)
                        .unwrap_or_else(|| self.current());
                    self.add_binding_in(scope, target.id.as_str(), Binding::new(BindingKind::Plain, line));
                }
            }
            Expr::Slice(slice) => {
                for part in [&slice.lower, &slice.upper, &slice.step].into_iter().flatten() {
                    self.visit_expr(part);
                }
            }
            _ => {}
        }
    }

    fn visit_comprehension(&mut self, generators: &'a [Comprehension], elts: &[&'a Expr]) {
        // The first iterable is evaluated in the enclosing scope
        if let Some(first) = generators.first() {
            self.visit_expr(&first.iter);
        }
        self.push_scope(ScopeKind::Generator);
        for (i, generator) in generators.iter().enumerate() {
            if i > 0 {
                self.visit_expr(&generator.iter);
            }
            self.visit_target(&generator.target, BindingKind::Plain);
            for cond in &generator.ifs {
                self.visit_expr(cond);
            }
        }
        for &elt in elts {
            self.visit_expr(elt);
        }
        self.stack.pop();
    }

    fn visit_pattern(&mut self, pattern: &'a Pattern) {
        match pattern {
            Pattern::MatchValue(p) => self.visit_expr(&p.value),
            Pattern::MatchSequence(p) => {
                for sub in &p.patterns {
                    self.visit_pattern(sub);
                }
            }
            Pattern::MatchMapping(p) => {
                for key in &p.keys {
                    self.visit_expr(key);
                }
                for sub in &p.patterns {
                    self.visit_pattern(sub);
                }
                if let Some(rest) = &p.rest {
                    let line = self.line(p.range.start());
                    self.handle_store(rest.as_str(), line, BindingKind::Plain);
                }
            }
            Pattern::MatchClass(p) => {
                self.visit_expr(&p.cls);
                for sub in p.patterns.iter().chain(&p.kwd_patterns) {
                    self.visit_pattern(sub);
                }
            }
            Pattern::MatchStar(p) => {
                if let Some(name) = &p.name {
                    let line = self.line(p.range.start());
                    self.handle_store(name.as_str(), line, BindingKind::Plain);
                }
            }
            Pattern::MatchAs(p) => {
                if let Some(sub) = &p.pattern {
                    self.visit_pattern(sub);
                }
                if let Some(name) = &p.name {
                    let line = self.line(p.range.start());
                    self.handle_store(name.as_str(), line, BindingKind::Plain);
                }
            }
            Pattern::MatchOr(p) => {
                for sub in &p.patterns {
                    self.visit_pattern(sub);
                }
            }
            _ => {}
        }
    }
}
