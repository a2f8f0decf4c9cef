//! Identifiers: sibling enum values, locals, class members and globals, in
//! that order.

use orchestrator_core::{
    CallableRef, ClassRef, DataType, ExprId, Kind, TypeSource, Variant, VariantType, WarningCode,
};
use orchestrator_parser::{IdentifierExpr, IdentifierSource, ParserStatus, Tree};
use orchestrator_registry::CachedScript;

use crate::context::Analyzer;
use crate::type_resolver::builtin_type_named;
use crate::types::{
    make_builtin_meta_type, make_callable_type, make_class_enum_type, make_global_enum_type, make_native_meta_type,
    type_from_metatype, UNNAMED_ENUM,
};

impl Analyzer<'_> {
    pub(super) fn reduce_identifier(&mut self, expr: ExprId, can_be_builtin: bool, is_assignee: bool) {
        let Some(identifier) = self.tree().identifier(expr).cloned() else {
            return;
        };
        let name = identifier.name.as_str();

        if self.reduce_enum_sibling(expr, name) {
            return;
        }

        let mut found_source = self.reduce_local_identifier(expr, &identifier, is_assignee);

        if !found_source {
            if let Some(suite) = identifier.suite {
                if self.tree()[suite].has_local(name) {
                    self.push_warning(expr, WarningCode::ConfusableLocalUsage, &[name]);
                }
            }
        }

        if !found_source {
            if let Some(found) = self.lookup_member(name, None, expr.into()) {
                if let Some(node) = self.tree_mut()[expr].identifier_mut() {
                    node.source = found.source;
                    node.function_source_is_static = found.function_source_is_static;
                }
                if let Some(value) = found.value {
                    self.set_constant(expr, value);
                }
                self.set_expression_type(expr, found.data_type);
                found_source = true;
            }
        }

        if found_source {
            self.check_identifier_context(expr);
            return;
        }

        self.reduce_global_identifier(expr, name, can_be_builtin);
    }

    /// Inside an enum body, earlier values of the same enum are visible by
    /// their bare name.
    fn reduce_enum_sibling(&mut self, expr: ExprId, name: &str) -> bool {
        let Some(current_enum) = self.current_enum else {
            return false;
        };
        let node = &self.tree()[current_enum];
        let Some(element) = node.values.iter().find(|value| value.identifier.name == name) else {
            return false;
        };
        let resolved = element.resolved.then_some(element.value);
        let parent_name = element
            .parent_enum
            .and_then(|parent| self.tree()[parent].identifier.as_ref())
            .map(|ident| ident.name.clone());
        let enum_name = node
            .identifier
            .as_ref()
            .map_or_else(|| UNNAMED_ENUM.to_string(), |ident| ident.name.clone());

        let class = self.class_handle(self.current_class_ref());
        let path = self.script().path.clone();
        let mut data_type = make_class_enum_type(&enum_name, class, &path, false);
        if let Some(parent_name) = parent_name {
            data_type.enum_type = parent_name;
        }
        self.set_expression_type(expr, data_type);

        match resolved {
            Some(value) => self.set_constant(expr, Variant::Int(value)),
            None => self.push_error("Cannot use another enum element before it was declared.", expr),
        }
        true
    }

    /// Sources bound while the tree was built. Returns whether one applied.
    fn reduce_local_identifier(&mut self, expr: ExprId, identifier: &IdentifierExpr, is_assignee: bool) -> bool {
        match identifier.source {
            IdentifierSource::FunctionParameter(parameter) => {
                let data_type = self.tree()[parameter].decl.data_type.clone();
                self.set_expression_type(expr, data_type);
            }
            IdentifierSource::LocalConstant(constant) => {
                let decl = &self.tree()[constant].decl;
                let data_type = decl.data_type.clone();
                let value = decl
                    .initializer
                    .map(|init| self.tree()[init].reduced_value.clone())
                    .unwrap_or_default();
                self.set_constant(expr, value);
                self.set_expression_type(expr, data_type);
            }
            IdentifierSource::LocalVariable(variable) => {
                let node = &self.tree()[variable];
                let data_type = node.decl.data_type.clone();
                let unassigned = !is_assignee
                    && node.assignments == 0
                    && !(data_type.is_hard_type() && data_type.kind == Kind::Builtin);
                if unassigned {
                    self.push_warning(expr, WarningCode::UnassignedVariable, &[&identifier.name]);
                    // Reported once per variable.
                    self.tree_mut()[variable].assignments = 1;
                }
                self.set_expression_type(expr, data_type);
            }
            IdentifierSource::LocalIterator(iterator) => {
                let data_type = self.tree()[iterator].data_type.clone();
                self.set_expression_type(expr, data_type);
            }
            IdentifierSource::LocalBind(pattern) => {
                let data_type = DataType {
                    is_constant: true,
                    ..self.tree()[pattern].data_type.clone()
                };
                self.set_expression_type(expr, data_type);
            }
            _ => return false,
        }
        true
    }

    /// Static-context errors, `self` use and captures for a resolved
    /// identifier.
    fn check_identifier_context(&mut self, expr: ExprId) {
        let Some(identifier) = self.tree().identifier(expr).cloned() else {
            return;
        };
        let is_callable = self.tree()[expr].data_type.is_builtin(VariantType::Callable);
        let (is_instance_variable, is_instance_function) = match identifier.source {
            IdentifierSource::MemberVariable(_) => (true, false),
            IdentifierSource::MemberFunction(_) => (false, !identifier.function_source_is_static),
            IdentifierSource::InheritedVariable if is_callable => (false, !identifier.function_source_is_static),
            IdentifierSource::InheritedVariable => (true, false),
            _ => (false, false),
        };
        let is_signal = matches!(identifier.source, IdentifierSource::MemberSignal(_));

        if self.static_context && (is_instance_variable || is_instance_function || is_signal) {
            let what = if is_instance_variable {
                "non-static variable"
            } else if is_instance_function {
                "non-static function"
            } else {
                "signal"
            };
            let name = &identifier.name;
            let message = match self.static_context_function_name() {
                Some(function) => {
                    format!(r#"Cannot access {what} "{name}" from the static function "{function}()"."#)
                }
                None => format!(r#"Cannot access {what} "{name}" from a static variable initializer."#),
            };
            self.push_error(message, expr);
        }

        let Some(lambda) = self.current_lambda else {
            return;
        };
        let uses_instance = is_instance_variable
            || is_signal
            || matches!(
                identifier.source,
                IdentifierSource::MemberFunction(_) | IdentifierSource::InheritedVariable
            );
        if uses_instance {
            self.mark_lambda_use_self();
            return;
        }

        let captured = matches!(
            identifier.source,
            IdentifierSource::FunctionParameter(_)
                | IdentifierSource::LocalVariable(_)
                | IdentifierSource::LocalIterator(_)
                | IdentifierSource::LocalBind(_)
        );
        if !captured {
            return;
        }

        // Every lambda between the use and the declaring function captures.
        let tree = self.tree_mut();
        let mut function = Some(tree[lambda].function);
        while let Some(current) = function {
            if Some(current) == identifier.source_function {
                break;
            }
            let Some(source_lambda) = tree[current].source_lambda else {
                break;
            };
            let node = &mut tree[source_lambda];
            if node.has_capture(&identifier.name) {
                break;
            }
            node.add_capture(&identifier.name, expr);
            function = node.parent_function;
        }
    }

    /// Names that are not members of any class in scope.
    fn reduce_global_identifier(&mut self, expr: ExprId, name: &str, can_be_builtin: bool) {
        let host = self.host;

        if let Some(ty) = builtin_type_named(name) {
            if can_be_builtin {
                self.set_expression_type(expr, make_builtin_meta_type(ty));
                return;
            }
            self.push_error("Builtin type cannot be used as a name on its own.", expr);
        }

        if host.classes.class_exists(name) {
            if let Some(node) = self.tree_mut()[expr].identifier_mut() {
                node.source = IdentifierSource::NativeClass;
            }
            self.set_expression_type(expr, make_native_meta_type(name));
            return;
        }

        if host.project.is_global_class(name) {
            let data_type = self.make_global_class_meta_type(name, expr.into());
            self.set_expression_type(expr, data_type);
            return;
        }

        if let Some(autoload) = host.project.autoload(name).filter(|autoload| autoload.is_singleton) {
            let path = autoload.path.clone();
            let data_type = DataType {
                is_constant: true,
                ..self.autoload_type(&path)
            };
            self.set_expression_type(expr, data_type);
            return;
        }

        if let Some(constant) = host.classes.global_constant(name) {
            let value = Variant::Int(constant.value);
            let data_type = match &constant.enum_name {
                Some(enum_name) => make_global_enum_type(&*host.classes, enum_name, "", false),
                None => self.type_from_variant(&value, expr.into()),
            };
            self.set_constant(expr, value);
            self.set_expression_type(expr, data_type);
            return;
        }

        if let Some(value) = host.utilities.language_constant(name).cloned() {
            let data_type = self.type_from_variant(&value, expr.into());
            self.set_constant(expr, value);
            self.set_expression_type(expr, data_type);
            return;
        }

        if host.classes.global_enum(name).is_some() {
            self.set_expression_type(expr, make_global_enum_type(&*host.classes, name, "", true));
            if !can_be_builtin {
                self.push_error(format!(r#"Global enum "{name}" cannot be used on its own."#), expr);
            }
            return;
        }

        if let Some(function) = host.utilities.function(name) {
            let value = Variant::Callable(CallableRef {
                target: String::new(),
                method: name.to_string(),
            });
            self.set_constant(expr, value);
            self.set_expression_type(expr, make_callable_type(function.info.clone()));
            return;
        }

        // `Variant` only names a type as the base of a nested name.
        if can_be_builtin && name == "Variant" {
            let data_type = DataType {
                kind: Kind::Variant,
                type_source: TypeSource::AnnotatedExplicit,
                is_meta_type: true,
                is_pseudo_type: true,
                ..Default::default()
            };
            self.set_expression_type(expr, data_type);
            return;
        }

        self.push_error(format!(r#"Identifier "{name}" not declared in the current scope."#), expr);
        self.set_expression_type(
            expr,
            DataType {
                kind: Kind::Variant,
                ..Default::default()
            },
        );
    }

    /// The instance type of a singleton autoload: a `Node`, or the class of
    /// its script when it is an orchestration.
    fn autoload_type(&mut self, path: &str) -> DataType {
        let node = DataType::native("Node", TypeSource::AnnotatedExplicit);
        let is_source =
            self.pool.find(path).is_some() || matches!(self.host.scripts.load(path), Ok(CachedScript::Source(_)));
        if !is_source {
            return node;
        }
        let Some(parser) = self.depended_parser_for(path) else {
            return node;
        };
        if parser != self.parser && !self.raise_status(parser, ParserStatus::InheritanceSolved) {
            return node;
        }
        let head = self.pool.class(ClassRef::new(parser, Tree::HEAD)).data_type.clone();
        if head.is_set() {
            type_from_metatype(&head)
        } else {
            node
        }
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_core::{Kind, Variant, VariantType, WarningCode};
    use orchestrator_parser::{FuncDecl, ParamDecl, ScriptParser, ScriptPool, TreeBuilder, VarDecl};
    use orchestrator_registry::{Host, ProjectRegistry};

    use crate::config::AnalyzerConfig;
    use crate::context::Analyzer;

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

    fn has_warning(script: &ScriptParser, code: WarningCode) -> bool {
        script.warnings.iter().any(|warning| warning.code == code)
    }

    #[test]
    fn undeclared_identifier() {
        let mut b = TreeBuilder::new("res://a.os");
        let missing = b.ident("nowhere");
        let body = b.suite_of(|b| vec![b.ret(Some(missing))]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![r#"Identifier "nowhere" not declared in the current scope."#]
        );
        assert_eq!(script.tree[missing].data_type.kind, Kind::Variant);
    }

    #[test]
    fn parameters_and_locals_take_declared_types() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let read = b.ident("amount");
        let body = b.suite_of(|b| vec![b.ret(Some(read))]);
        b.function(
            FuncDecl::new("f")
                .param(ParamDecl::new("amount").typed(int))
                .body(body),
        );
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert!(script.tree[read].data_type.is_builtin(VariantType::Int));
    }

    #[test]
    fn member_constants_fold() {
        let mut b = TreeBuilder::new("res://a.os");
        let ten = b.lit(10);
        b.constant(VarDecl::new("LIMIT").init(ten));
        let read = b.ident("LIMIT");
        b.constant(VarDecl::new("COPY").init(read));
        let script = analyze(b);
        assert!(script.tree[read].is_constant);
        assert_eq!(script.tree[read].reduced_value, Variant::Int(10));
    }

    #[test]
    fn global_constants_and_enums() {
        let mut b = TreeBuilder::new("res://a.os");
        let left = b.ident("SIDE_LEFT");
        b.constant(VarDecl::new("SIDE").init(left));
        let pi = b.ident("PI");
        b.constant(VarDecl::new("HALF_TURN").init(pi));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert_eq!(script.tree[left].data_type.kind, Kind::Enum);
        assert_eq!(script.tree[left].reduced_value, Variant::Int(0));
        assert!(script.tree[pi].data_type.is_builtin(VariantType::Float));
    }

    #[test]
    fn builtin_type_alone_is_an_error() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ident("int");
        let body = b.suite_of(|b| vec![b.ret(Some(int))]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(errors(&script).contains(&"Builtin type cannot be used as a name on its own."));
    }

    #[test]
    fn instance_member_from_static_function() {
        let mut b = TreeBuilder::new("res://a.os");
        let one = b.lit(1);
        b.variable(VarDecl::new("health").init(one));
        let read = b.ident("health");
        let body = b.suite_of(|b| vec![b.ret(Some(read))]);
        b.function(FuncDecl::new("peek").statik().body(body));
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![r#"Cannot access non-static variable "health" from the static function "peek()"."#]
        );
    }

    #[test]
    fn unassigned_local_warns_once() {
        let mut b = TreeBuilder::new("res://a.os");
        let first = b.ident("value");
        let second = b.ident("value");
        let body = b.suite_of(|b| {
            vec![
                b.local_var(VarDecl::new("value")),
                b.expr_stmt(first),
                b.ret(Some(second)),
            ]
        });
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        let count = script
            .warnings
            .iter()
            .filter(|warning| warning.code == WarningCode::UnassignedVariable)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn singleton_autoload_is_a_node() {
        let mut project = ProjectRegistry::new();
        project.add_autoload("Game", "res://game.tscn", true);
        let host = Host::standard().with_project(project);

        let mut b = TreeBuilder::new("res://a.os");
        let game = b.ident("Game");
        let body = b.suite_of(|b| vec![b.ret(Some(game))]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze_with(&host, b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        let ty = &script.tree[game].data_type;
        assert_eq!(ty.kind, Kind::Native);
        assert_eq!(ty.native_type, "Node");
    }

    #[test]
    fn later_local_in_block_is_confusable() {
        let mut b = TreeBuilder::new("res://a.os");
        let one = b.lit(1);
        b.variable(VarDecl::new("speed").init(one));
        let early = b.ident("speed");
        let two = b.lit(2);
        let body = b.suite_of(|b| {
            vec![
                b.ret(Some(early)),
                b.local_var(VarDecl::new("speed").init(two)),
            ]
        });
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(has_warning(&script, WarningCode::ConfusableLocalUsage));
    }

    #[test]
    fn utility_functions_are_callables() {
        let mut b = TreeBuilder::new("res://a.os");
        let print = b.ident("print");
        b.constant(VarDecl::new("PRINTER").init(print));
        let script = analyze(b);
        assert!(script.tree[print].data_type.is_builtin(VariantType::Callable));
        assert!(script.tree[print].is_constant);
    }
}
