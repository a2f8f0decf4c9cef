//! Expression reduction.
//!
//! Reducing an expression computes its static type, folds it into
//! `reduced_value` when every input is known at analysis time, and reports the
//! diagnostics that only types can reveal. Each node is reduced at most once;
//! the `reduced` flag on the node guards re-entry.
//!
//! | Kind                      | Module        |
//! |---------------------------|---------------|
//! | identifiers               | `identifier`  |
//! | attributes and indexing   | `subscript`   |
//! | calls and constructors    | `call`        |
//! | operators, casts, tests   | `operators`   |
//! | literal retyping          | `literals`    |

mod call;
mod identifier;
mod literals;
mod operators;
mod subscript;

use orchestrator_core::{
    DataType, ExprId, Kind, LambdaId, ObjectRef, ScriptRef, TypeSource, Variant, VariantType,
};
use orchestrator_parser::ExprKind;
use orchestrator_registry::CachedScript;

use crate::context::Analyzer;
use crate::path;

impl Analyzer<'_> {
    /// Mark `expr` as reduced. Returns `false` when it already was.
    fn begin_reduction(&mut self, expr: ExprId) -> bool {
        let node = &mut self.tree_mut()[expr];
        if node.reduced {
            return false;
        }
        node.reduced = true;
        true
    }

    /// An expression whose reduction did not settle on a type is a `Variant`.
    fn finish_reduction(&mut self, expr: ExprId) {
        let node = &mut self.tree_mut()[expr];
        if node.data_type.kind == Kind::Unresolved {
            node.data_type.kind = Kind::Variant;
        }
    }

    /// Reduce `expr`. `is_root` is set for expressions used as statements,
    /// whose value is discarded.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn reduce_expression(&mut self, expr: ExprId, is_root: bool) {
        if !self.begin_reduction(expr) {
            return;
        }

        let kind = self.tree()[expr].kind.clone();
        tracing::trace!(kind = kind.kind_name(), "reducing expression");
        match kind {
            ExprKind::Array(elements) => self.reduce_array(expr, &elements),
            ExprKind::Assignment { .. } => self.reduce_assignment(expr),
            ExprKind::Await(operand) => self.reduce_await(expr, operand),
            ExprKind::Binary { op, left, right } => self.reduce_binary_op(expr, op, left, right),
            ExprKind::Call { .. } => self.reduce_call(expr, false, is_root),
            ExprKind::Cast { operand, cast_type } => self.reduce_cast(expr, operand, cast_type),
            ExprKind::Dictionary(pairs) => self.reduce_dictionary(expr, &pairs),
            ExprKind::GetNode { .. } => self.reduce_get_node(expr),
            ExprKind::Identifier(_) => self.reduce_identifier(expr, false, false),
            ExprKind::Lambda(lambda) => self.reduce_lambda(expr, lambda),
            ExprKind::Literal(value) => self.reduce_literal(expr, value),
            ExprKind::Preload { path, .. } => self.reduce_preload(expr, path),
            ExprKind::SelfRef => self.reduce_self(expr),
            ExprKind::Subscript { .. } => self.reduce_subscript(expr, false),
            ExprKind::Ternary {
                condition,
                true_expr,
                false_expr,
            } => self.reduce_ternary(expr, condition, true_expr, false_expr, is_root),
            ExprKind::TypeTest { operand, test_type } => self.reduce_type_test(expr, operand, test_type),
            ExprKind::Unary { op, operand } => self.reduce_unary_op(expr, op, operand),
        }

        self.finish_reduction(expr);
    }

    /// Reduce a call, telling it whether it is awaited.
    pub(crate) fn reduce_call_expression(&mut self, expr: ExprId, is_await: bool, is_root: bool) {
        if !self.begin_reduction(expr) {
            return;
        }
        self.reduce_call(expr, is_await, is_root);
        self.finish_reduction(expr);
    }

    /// Reduce an identifier that may name a builtin type, as in `int.MAX`.
    pub(crate) fn reduce_identifier_expression(&mut self, expr: ExprId, can_be_builtin: bool, is_assignee: bool) {
        if !self.begin_reduction(expr) {
            return;
        }
        self.reduce_identifier(expr, can_be_builtin, is_assignee);
        self.finish_reduction(expr);
    }

    /// Reduce a subscript that may resolve to a pseudo type such as a native
    /// enum used as the base of another attribute.
    pub(crate) fn reduce_subscript_expression(&mut self, expr: ExprId, can_be_pseudo: bool) {
        if !self.begin_reduction(expr) {
            return;
        }
        self.reduce_subscript(expr, can_be_pseudo);
        self.finish_reduction(expr);
    }

    pub(crate) fn set_expression_type(&mut self, expr: ExprId, data_type: DataType) {
        self.tree_mut()[expr].data_type = data_type;
    }

    pub(crate) fn set_constant(&mut self, expr: ExprId, value: Variant) {
        let node = &mut self.tree_mut()[expr];
        node.is_constant = true;
        node.reduced_value = value;
    }

    // ------------------------------------------------------------------------
    // Literals and containers
    // ------------------------------------------------------------------------

    fn reduce_literal(&mut self, expr: ExprId, value: Variant) {
        let data_type = self.type_from_variant(&value, expr.into());
        self.set_constant(expr, value);
        self.set_expression_type(expr, data_type);
    }

    fn reduce_array(&mut self, expr: ExprId, elements: &[ExprId]) {
        for &element in elements {
            self.reduce_expression(element, false);
        }
        // Element types are applied later by whatever receives the literal.
        let data_type = DataType {
            is_constant: true,
            ..DataType::builtin(VariantType::Array, TypeSource::AnnotatedExplicit)
        };
        self.set_expression_type(expr, data_type);
    }

    fn reduce_dictionary(&mut self, expr: ExprId, pairs: &[(ExprId, ExprId)]) {
        let mut seen: Vec<(Variant, ExprId)> = Vec::new();
        for &(key, value) in pairs {
            self.reduce_expression(key, false);
            self.reduce_expression(value, false);

            if !self.tree()[key].is_constant {
                continue;
            }
            // String and StringName keys collide.
            let constant = match &self.tree()[key].reduced_value {
                Variant::StringName(name) => Variant::String(name.clone()),
                other => other.clone(),
            };
            match seen.iter().find(|(used, _)| *used == constant) {
                Some((_, first)) => {
                    let line = self.tree()[*first].span.line;
                    let shown = self.tree()[key].reduced_value.to_string();
                    self.push_error(
                        format!(r#"Key "{shown}" was already used in this dictionary (at line {line})."#),
                        key,
                    );
                }
                None => seen.push((constant, key)),
            }
        }

        let data_type = DataType {
            is_constant: true,
            ..DataType::builtin(VariantType::Dictionary, TypeSource::AnnotatedExplicit)
        };
        self.set_expression_type(expr, data_type);
    }

    // ------------------------------------------------------------------------
    // Self, lambdas and node paths
    // ------------------------------------------------------------------------

    fn reduce_self(&mut self, expr: ExprId) {
        if self.static_context {
            self.push_error(r#"Cannot use "self" inside a static function."#, expr);
        }
        self.mark_lambda_use_self();
        let data_type = self.current_class_instance_type();
        self.set_expression_type(expr, data_type);
    }

    /// Every lambda enclosing the current position keeps a reference to the
    /// instance.
    pub(crate) fn mark_lambda_use_self(&mut self) {
        let mut lambda = self.current_lambda;
        while let Some(id) = lambda {
            let node = &mut self.tree_mut()[id];
            node.use_self = true;
            lambda = node.parent_lambda;
        }
    }

    fn reduce_lambda(&mut self, expr: ExprId, lambda: LambdaId) {
        let function = self.tree()[lambda].function;
        self.set_expression_type(expr, DataType::builtin(VariantType::Callable, TypeSource::AnnotatedInferred));

        let saved = self.current_lambda.replace(lambda);
        self.resolve_function_signature(function, Some(expr.into()), true);
        self.current_lambda = saved;

        let info = self.tree()[function].info.clone();
        self.tree_mut()[expr].data_type.method_info = info;

        // Bodies wait until the enclosing statement is done, so locals
        // declared after the lambda are not visible to it.
        self.pending_lambdas.push(lambda);
    }

    /// Resolve the bodies of lambdas whose signatures are known.
    pub(crate) fn resolve_pending_lambdas(&mut self) {
        if self.pending_lambdas.is_empty() {
            return;
        }

        let saved_lambda = self.current_lambda;
        let saved_static = self.static_context;
        let lambdas = std::mem::take(&mut self.pending_lambdas);
        for lambda in lambdas {
            let function = self.tree()[lambda].function;
            self.current_lambda = Some(lambda);
            self.static_context = self.lambda_is_static(lambda);
            self.resolve_function_body(function, true);
        }
        self.current_lambda = saved_lambda;
        self.static_context = saved_static;
    }

    /// A lambda is static when it or any function it is nested in is.
    fn lambda_is_static(&self, lambda: LambdaId) -> bool {
        let tree = self.tree();
        let mut current = Some(lambda);
        while let Some(id) = current {
            let node = &tree[id];
            if tree[node.function].is_static {
                return true;
            }
            match node.parent_function {
                Some(parent) if tree[parent].is_static => return true,
                Some(parent) => current = tree[parent].source_lambda,
                None => current = None,
            }
        }
        false
    }

    fn reduce_get_node(&mut self, expr: ExprId) {
        let mut result = DataType::variant();

        let base_native = self.tree()[self.current_class].base_type.native_type.clone();
        if !self.host.classes.is_parent_class(&base_native, "Node") {
            self.push_error(
                r#"Cannot use shorthand "get_node()" notation ("$") on a class that isn't a node."#,
                expr,
            );
        } else if self.static_context {
            self.push_error(
                r#"Cannot use shorthand "get_node()" notation ("$") in a static function."#,
                expr,
            );
        } else {
            self.mark_lambda_use_self();
            result = DataType::native("Node", TypeSource::AnnotatedExplicit);
        }

        self.set_expression_type(expr, result);
    }

    // ------------------------------------------------------------------------
    // Preload
    // ------------------------------------------------------------------------

    fn reduce_preload(&mut self, expr: ExprId, path_expr: ExprId) {
        self.reduce_expression(path_expr, false);
        let path_node = &self.tree()[path_expr];
        if !path_node.is_constant {
            self.push_error("Preloaded path must be a constant string.", path_expr);
            return;
        }

        let mut resource = Variant::Nil;
        match path_node.reduced_value.clone() {
            Variant::String(written) => {
                let resolved = if path::is_relative(&written) {
                    path::resolve(self.script().base_dir(), &written)
                } else {
                    path::simplify(&written)
                };
                if let ExprKind::Preload { resolved_path, .. } = &mut self.tree_mut()[expr].kind {
                    resolved_path.clone_from(&resolved);
                }

                if !self.host.scripts.exists(&resolved) {
                    self.push_error(format!(r#"Preload file "{resolved}" does not exist."#), path_expr);
                } else {
                    match self.load_preloaded(&resolved) {
                        Some(value) => resource = value,
                        None => {
                            self.push_error(format!(r#"Could not preload resource file "{resolved}"."#), path_expr)
                        }
                    }
                }
            }
            _ => self.push_error("Preloaded path must be a constant string.", path_expr),
        }

        if let ExprKind::Preload { resource: stored, .. } = &mut self.tree_mut()[expr].kind {
            *stored = resource.clone();
        }
        let data_type = self.type_from_variant(&resource, expr.into());
        self.set_constant(expr, resource);
        self.set_expression_type(expr, data_type);
    }

    fn load_preloaded(&self, path: &str) -> Option<Variant> {
        let object = match self.host.scripts.load(path) {
            Ok(CachedScript::Source(_)) => ObjectRef::Script(ScriptRef {
                path: path.to_string(),
                foreign: None,
            }),
            Ok(CachedScript::Foreign(foreign)) => ObjectRef::Script(ScriptRef {
                path: path.to_string(),
                foreign: Some(foreign),
            }),
            Ok(CachedScript::Resource { path, class_name }) => ObjectRef::Resource { path, class_name },
            Err(err) => {
                tracing::debug!(path, %err, "preload failed");
                return None;
            }
        };
        Some(Variant::Object(Some(object)))
    }

    /// The name of the function a static-context diagnostic refers to:
    /// the innermost named function around the current position.
    pub(crate) fn static_context_function_name(&self) -> Option<String> {
        let tree = self.tree();
        let mut function = self.current_function?;
        while let Some(lambda) = tree[function].source_lambda {
            function = tree[lambda].parent_function?;
        }
        Some(tree[function].name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator_parser::{FuncDecl, ScriptParser, ScriptPool, TreeBuilder, VarDecl};
    use orchestrator_registry::{Host, MemoryScriptCache};

    use crate::config::AnalyzerConfig;

    fn analyze_with(host: &Host, b: TreeBuilder) -> ScriptParser {
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let config = AnalyzerConfig::default();
        let _ = Analyzer::new(&mut pool, host, &config, id).analyze();
        pool[id].clone()
    }

    fn analyze(b: TreeBuilder) -> ScriptParser {
        analyze_with(&Host::standard(), b)
    }

    fn errors(script: &ScriptParser) -> Vec<&str> {
        script.errors.iter().map(|error| error.message.as_str()).collect()
    }

    #[test]
    fn literals_are_constant() {
        let mut b = TreeBuilder::new("res://a.os");
        let value = b.lit(3);
        b.constant(VarDecl::new("THREE").init(value));
        let script = analyze(b);
        let node = &script.tree[value];
        assert!(node.is_constant);
        assert_eq!(node.reduced_value, Variant::Int(3));
        assert!(node.data_type.is_builtin(VariantType::Int));
    }

    #[test]
    fn duplicate_dictionary_keys() {
        let mut b = TreeBuilder::new("res://a.os");
        let first = b.lit("a");
        let one = b.lit(1);
        let second = b.lit("a");
        let two = b.lit(2);
        let dict = b.dictionary(vec![(first, one), (second, two)]);
        b.variable(VarDecl::new("table").init(dict));
        let script = analyze(b);
        assert_eq!(errors(&script).len(), 1);
        assert!(errors(&script)[0].starts_with(r#"Key "a" was already used in this dictionary"#));
    }

    #[test]
    fn get_node_requires_a_node_base() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["RefCounted"]);
        let path = b.get_node("Label");
        let body = b.suite_of(|b| vec![b.expr_stmt(path)]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(errors(&script).iter().any(|e| e.contains("on a class that isn't a node")));
    }

    #[test]
    fn get_node_in_a_node_is_a_node() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Node"]);
        let path = b.get_node("Label");
        let body = b.suite_of(|b| vec![b.local_var(VarDecl::new("label").init(path))]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        let ty = &script.tree[path].data_type;
        assert_eq!(ty.kind, Kind::Native);
        assert_eq!(ty.native_type, "Node");
    }

    #[test]
    fn lambdas_capture_enclosing_locals() {
        let mut b = TreeBuilder::new("res://a.os");
        let zero = b.lit(0);
        let read = b.ident("count");
        let inner = b.suite_of(|b| vec![b.ret(Some(read))]);
        let lambda = b.lambda(FuncDecl::new("").body(inner));
        let body = b.suite_of(|b| {
            vec![
                b.local_var(VarDecl::new("count").init(zero)),
                b.local_var(VarDecl::new("_getter").init(lambda)),
            ]
        });
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        let ExprKind::Lambda(id) = script.tree[lambda].kind else {
            panic!("expected a lambda");
        };
        assert!(script.tree[id].has_capture("count"));
        assert!(script.tree[lambda].data_type.is_builtin(VariantType::Callable));
    }

    #[test]
    fn lambda_using_members_uses_self() {
        let mut b = TreeBuilder::new("res://a.os");
        let one = b.lit(1);
        b.variable(VarDecl::new("health").init(one));
        let read = b.ident("health");
        let inner = b.suite_of(|b| vec![b.ret(Some(read))]);
        let lambda = b.lambda(FuncDecl::new("").body(inner));
        let body = b.suite_of(|b| vec![b.local_var(VarDecl::new("_getter").init(lambda))]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        let ExprKind::Lambda(id) = script.tree[lambda].kind else {
            panic!("expected a lambda");
        };
        assert!(script.tree[id].use_self);
        assert!(!script.tree[id].has_capture("health"));
    }

    #[test]
    fn preload_of_missing_file() {
        let mut b = TreeBuilder::new("res://a.os");
        let preload = b.preload("missing.png");
        b.constant(VarDecl::new("TEXTURE").init(preload));
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"Preload file "res://missing.png" does not exist."#]);
    }

    #[test]
    fn preload_resolves_relative_resources() {
        let mut cache = MemoryScriptCache::new();
        cache.insert_resource("res://art/icon.png", "Texture2D");
        let host = Host::standard().with_scripts(cache);

        let mut b = TreeBuilder::new("res://art/a.os");
        let preload = b.preload("./icon.png");
        b.constant(VarDecl::new("ICON").init(preload));
        let script = analyze_with(&host, b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        let ExprKind::Preload { resolved_path, .. } = &script.tree[preload].kind else {
            panic!("expected a preload");
        };
        assert_eq!(resolved_path, "res://art/icon.png");
        let ty = &script.tree[preload].data_type;
        assert_eq!(ty.kind, Kind::Native);
        assert_eq!(ty.native_type, "Texture2D");
    }

    #[test]
    fn self_in_static_function() {
        let mut b = TreeBuilder::new("res://a.os");
        let me = b.self_();
        let body = b.suite_of(|b| vec![b.ret(Some(me))]);
        b.function(FuncDecl::new("make").statik().body(body));
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"Cannot use "self" inside a static function."#]);
    }
}
