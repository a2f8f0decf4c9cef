//! Lexical binding of locals.
//!
//! Walks every function body of a finished tree and, for each identifier that
//! names a visible local, records its [`IdentifierSource`] and the function
//! that declared it. Suites receive their local tables, parent links and loop
//! flags; functions containing `await` are marked as coroutines.

use orchestrator_core::{
    ClassId, Diagnostic, ExprId, FunctionId, LambdaId, NodeId, PatternId, StmtId, SuiteId,
};

use super::scope::LocalScope;
use crate::ast::{
    ExprKind, IdentifierSource, Local, LocalKind, Member, PatternKind, PropertyStyle, StmtKind,
    SubscriptIndex, Tree,
};

pub(crate) struct Binder<'t> {
    tree: &'t mut Tree,
    scope: LocalScope,
    current_function: Option<FunctionId>,
    current_lambda: Option<LambdaId>,
    current_suite: Option<SuiteId>,
    in_loop: bool,
    errors: Vec<Diagnostic>,
}

impl<'t> Binder<'t> {
    pub(crate) fn new(tree: &'t mut Tree) -> Self {
        Self {
            tree,
            scope: LocalScope::new(),
            current_function: None,
            current_lambda: None,
            current_suite: None,
            in_loop: false,
            errors: Vec::new(),
        }
    }

    /// Bind the whole tree, returning redeclaration errors.
    pub(crate) fn bind(mut self) -> Vec<Diagnostic> {
        for index in 0..self.tree.classes.len() {
            self.bind_class(ClassId::from(index));
        }
        self.errors
    }

    fn bind_class(&mut self, class: ClassId) {
        let members = self.tree[class].members.clone();
        for annotation in self.tree[class].annotations.clone() {
            self.bind_annotation(annotation);
        }
        for member in members {
            match member {
                Member::Variable(id) => {
                    for annotation in self.tree[id].annotations.clone() {
                        self.bind_annotation(annotation);
                    }
                    if let Some(init) = self.tree[id].decl.initializer {
                        self.bind_expr(init);
                    }
                    if let PropertyStyle::Inline { getter, setter } = self.tree[id].style.clone() {
                        if let Some(getter) = getter {
                            self.bind_function(getter);
                        }
                        if let Some(setter) = setter {
                            self.bind_function(setter);
                        }
                    }
                }
                Member::Constant(id) => {
                    if let Some(init) = self.tree[id].decl.initializer {
                        self.bind_expr(init);
                    }
                }
                Member::Function(id) => self.bind_function(id),
                Member::Enum(id) => {
                    let values: Vec<_> = self.tree[id].values.iter().filter_map(|v| v.custom_value).collect();
                    for value in values {
                        self.bind_expr(value);
                    }
                }
                Member::EnumValue(id, index) => {
                    if let Some(value) = self.tree[id].values[index].custom_value {
                        self.bind_expr(value);
                    }
                }
                Member::Signal(_) | Member::Class(_) | Member::Group(_) => {}
            }
        }
    }

    fn bind_annotation(&mut self, annotation: orchestrator_core::AnnotationId) {
        for argument in self.tree[annotation].arguments.clone() {
            self.bind_expr(argument);
        }
    }

    fn bind_function(&mut self, function: FunctionId) {
        let saved = (self.current_function, self.current_suite, self.in_loop);

        let parameters = self.tree[function].parameters.clone();
        let rest = self.tree[function].rest_parameter;
        for &parameter in &parameters {
            if let Some(default) = self.tree[parameter].decl.initializer {
                self.bind_expr(default);
            }
        }

        self.current_function = Some(function);
        self.in_loop = false;
        self.scope.push_scope();

        if let Some(body) = self.tree[function].body {
            {
                let suite = &mut self.tree.suites[body.index()];
                suite.parent_block = saved.1;
                suite.parent_function = Some(function);
                suite.is_in_loop = false;
            }
            for parameter in parameters.into_iter().chain(rest) {
                let decl = &self.tree[parameter].decl;
                let local = Local {
                    kind: LocalKind::Parameter(parameter),
                    name: decl.identifier.name.clone(),
                    span: decl.span,
                    source_function: Some(function),
                };
                self.declare(body, local, NodeId::Parameter(parameter));
            }
            self.current_suite = Some(body);
            self.bind_statements(body);
        }

        self.scope.pop_scope();
        (self.current_function, self.current_suite, self.in_loop) = saved;
    }

    fn declare(&mut self, suite: SuiteId, local: Local, node: NodeId) {
        match self.scope.declare(local.clone()) {
            Ok(()) => self.tree[suite].add_local(local),
            Err(redeclaration) => self.errors.push(Diagnostic::new(
                format!(
                    r#"There is already a {} named "{}" declared in this scope."#,
                    redeclaration.kind, redeclaration.name
                ),
                local.span,
                Some(node),
            )),
        }
    }

    fn bind_suite(&mut self, suite: SuiteId, in_loop: bool) {
        let saved = (self.current_suite, self.in_loop);
        self.in_loop = in_loop;
        {
            let node = &mut self.tree.suites[suite.index()];
            node.parent_block = saved.0;
            node.parent_function = self.current_function;
            node.is_in_loop = in_loop;
        }
        self.current_suite = Some(suite);
        self.scope.push_scope();
        self.bind_statements(suite);
        self.scope.pop_scope();
        (self.current_suite, self.in_loop) = saved;
    }

    fn bind_statements(&mut self, suite: SuiteId) {
        for statement in self.tree[suite].statements.clone() {
            self.bind_stmt(suite, statement);
        }
    }

    fn bind_stmt(&mut self, suite: SuiteId, stmt: StmtId) {
        match self.tree[stmt].kind.clone() {
            StmtKind::Expression(expr) => self.bind_expr(expr),
            StmtKind::Variable(id) => {
                if let Some(init) = self.tree[id].decl.initializer {
                    self.bind_expr(init);
                }
                let decl = &self.tree[id].decl;
                let local = Local {
                    kind: LocalKind::Variable(id),
                    name: decl.identifier.name.clone(),
                    span: decl.span,
                    source_function: self.current_function,
                };
                self.declare(suite, local, NodeId::Variable(id));
            }
            StmtKind::Constant(id) => {
                if let Some(init) = self.tree[id].decl.initializer {
                    self.bind_expr(init);
                }
                let decl = &self.tree[id].decl;
                let local = Local {
                    kind: LocalKind::Constant(id),
                    name: decl.identifier.name.clone(),
                    span: decl.span,
                    source_function: self.current_function,
                };
                self.declare(suite, local, NodeId::Constant(id));
            }
            StmtKind::If {
                condition,
                true_block,
                false_block,
            } => {
                self.bind_expr(condition);
                self.bind_suite(true_block, self.in_loop);
                if let Some(false_block) = false_block {
                    self.bind_suite(false_block, self.in_loop);
                }
            }
            StmtKind::For {
                variable,
                list,
                body,
                ..
            } => {
                self.bind_expr(list);
                let saved = (self.current_suite, self.in_loop);
                {
                    let node = &mut self.tree.suites[body.index()];
                    node.parent_block = saved.0;
                    node.parent_function = self.current_function;
                    node.is_in_loop = true;
                }
                self.scope.push_scope();
                let name = self.tree.identifier_name(variable).to_string();
                let span = self.tree[variable].span;
                if let Some(identifier) = self.tree[variable].identifier_mut() {
                    identifier.suite = Some(body);
                }
                let local = Local {
                    kind: LocalKind::ForVariable(variable),
                    name,
                    span,
                    source_function: self.current_function,
                };
                self.declare(body, local, NodeId::Expr(variable));
                self.current_suite = Some(body);
                self.in_loop = true;
                self.bind_statements(body);
                self.scope.pop_scope();
                (self.current_suite, self.in_loop) = saved;
            }
            StmtKind::While { condition, body } => {
                self.bind_expr(condition);
                self.bind_suite(body, true);
            }
            StmtKind::Match { test, branches } => {
                self.bind_expr(test);
                for branch in branches {
                    let saved = self.current_suite;
                    {
                        let node = &mut self.tree.suites[branch.block.index()];
                        node.parent_block = saved;
                        node.parent_function = self.current_function;
                        node.is_in_loop = self.in_loop;
                    }
                    self.current_suite = Some(branch.block);
                    self.scope.push_scope();
                    for pattern in branch.patterns {
                        self.bind_pattern(branch.block, pattern);
                    }
                    if let Some(guard) = branch.guard {
                        self.bind_expr(guard);
                    }
                    self.bind_statements(branch.block);
                    self.scope.pop_scope();
                    self.current_suite = saved;
                }
            }
            StmtKind::Return { value, .. } => {
                if let Some(value) = value {
                    self.bind_expr(value);
                }
            }
            StmtKind::Assert { condition, message } => {
                self.bind_expr(condition);
                if let Some(message) = message {
                    self.bind_expr(message);
                }
            }
            StmtKind::Pass | StmtKind::Break | StmtKind::Continue | StmtKind::Breakpoint => {}
        }
    }

    fn bind_pattern(&mut self, block: SuiteId, pattern: PatternId) {
        match self.tree[pattern].kind.clone() {
            PatternKind::Literal(expr) | PatternKind::Expression(expr) => self.bind_expr(expr),
            PatternKind::Bind(ident) => {
                let local = Local {
                    kind: LocalKind::PatternBind(pattern),
                    name: ident.name.clone(),
                    span: ident.span,
                    source_function: self.current_function,
                };
                self.declare(block, local, NodeId::Pattern(pattern));
                self.tree[pattern].binds.insert(ident.name, pattern);
            }
            PatternKind::Array(elements) => {
                for element in elements {
                    self.bind_pattern(block, element);
                    self.collect_binds(pattern, element);
                }
            }
            PatternKind::Dictionary(entries) => {
                for (key, value) in entries {
                    if let Some(key) = key {
                        self.bind_expr(key);
                    }
                    if let Some(value) = value {
                        self.bind_pattern(block, value);
                        self.collect_binds(pattern, value);
                    }
                }
            }
            PatternKind::Rest | PatternKind::Wildcard => {}
        }
    }

    fn collect_binds(&mut self, parent: PatternId, child: PatternId) {
        let binds: Vec<_> = self.tree[child]
            .binds
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect();
        self.tree[parent].binds.extend(binds);
    }

    fn bind_identifier(&mut self, expr: ExprId) {
        let suite = self.current_suite;
        let Some(name) = self.tree.identifier(expr).map(|identifier| identifier.name.clone()) else {
            return;
        };
        let local = self.scope.get(&name).cloned();

        let source = match &local {
            Some(local) => match local.kind {
                LocalKind::Constant(id) => {
                    self.tree[id].decl.usages += 1;
                    IdentifierSource::LocalConstant(id)
                }
                LocalKind::Variable(id) => {
                    self.tree[id].decl.usages += 1;
                    IdentifierSource::LocalVariable(id)
                }
                LocalKind::Parameter(id) => {
                    self.tree[id].decl.usages += 1;
                    IdentifierSource::FunctionParameter(id)
                }
                LocalKind::ForVariable(id) => IdentifierSource::LocalIterator(id),
                LocalKind::PatternBind(id) => IdentifierSource::LocalBind(id),
            },
            None => IdentifierSource::Undefined,
        };

        if let Some(identifier) = self.tree[expr].identifier_mut() {
            identifier.suite = suite;
            if let Some(local) = local {
                identifier.source = source;
                identifier.source_function = local.source_function;
            }
        }
    }

    fn bind_expr(&mut self, expr: ExprId) {
        match self.tree[expr].kind.clone() {
            ExprKind::Identifier(_) => self.bind_identifier(expr),
            ExprKind::Array(elements) => {
                for element in elements {
                    self.bind_expr(element);
                }
            }
            ExprKind::Dictionary(pairs) => {
                for (key, value) in pairs {
                    self.bind_expr(key);
                    self.bind_expr(value);
                }
            }
            ExprKind::Assignment {
                op,
                assignee,
                assigned_value,
                ..
            } => {
                self.bind_expr(assignee);
                self.bind_expr(assigned_value);
                // Writing a local is not a use of it.
                match self.tree.identifier(assignee).map(|i| i.source) {
                    Some(IdentifierSource::LocalVariable(id)) => {
                        let variable = &mut self.tree[id];
                        variable.decl.usages = variable.decl.usages.saturating_sub(1);
                        if !op.is_compound() {
                            variable.assignments += 1;
                        }
                    }
                    Some(IdentifierSource::FunctionParameter(id)) => {
                        let parameter = &mut self.tree[id].decl;
                        parameter.usages = parameter.usages.saturating_sub(1);
                    }
                    _ => {}
                }
            }
            ExprKind::Await(operand) => {
                if let Some(function) = self.current_function {
                    self.tree[function].is_coroutine = true;
                }
                self.bind_expr(operand);
            }
            ExprKind::Binary { left, right, .. } => {
                self.bind_expr(left);
                self.bind_expr(right);
            }
            ExprKind::Call {
                callee, arguments, ..
            } => {
                if let Some(callee) = callee {
                    self.bind_expr(callee);
                }
                for argument in arguments {
                    self.bind_expr(argument);
                }
            }
            ExprKind::Cast { operand, .. }
            | ExprKind::TypeTest { operand, .. }
            | ExprKind::Unary { operand, .. } => self.bind_expr(operand),
            ExprKind::Lambda(lambda) => {
                let function = {
                    let node = &mut self.tree[lambda];
                    node.parent_function = self.current_function;
                    node.parent_lambda = self.current_lambda;
                    node.function
                };
                let saved = self.current_lambda;
                self.current_lambda = Some(lambda);
                self.bind_function(function);
                self.current_lambda = saved;
            }
            ExprKind::Preload { path, .. } => self.bind_expr(path),
            ExprKind::Subscript { base, index } => {
                self.bind_expr(base);
                match index {
                    // Attribute names are member names, resolved against the base.
                    SubscriptIndex::Attribute(attribute) => {
                        if let Some(identifier) = self.tree[attribute].identifier_mut() {
                            identifier.suite = self.current_suite;
                        }
                    }
                    SubscriptIndex::Index(index) => self.bind_expr(index),
                }
            }
            ExprKind::Ternary {
                condition,
                true_expr,
                false_expr,
            } => {
                self.bind_expr(condition);
                self.bind_expr(true_expr);
                self.bind_expr(false_expr);
            }
            ExprKind::GetNode { .. } | ExprKind::Literal(_) | ExprKind::SelfRef => {}
        }
    }
}
