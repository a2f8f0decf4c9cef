//! Bodies: functions, inline accessors and the class-level checks that need
//! every member resolved.

use orchestrator_core::{ClassRef, DataType, FunctionId, Kind, NodeId, TypeSource, VariableId, VariantType, WarningCode};
use orchestrator_parser::{Member, PropertyStyle};
use rustc_hash::FxHashSet;

use crate::context::Analyzer;
use crate::path;

impl Analyzer<'_> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn resolve_class_body(&mut self, class: ClassRef, source: Option<NodeId>) {
        if self.pool.class(class).resolved_body {
            return;
        }

        if !self.owns(class) {
            let report_on = source.unwrap_or(NodeId::Class(self.current_class));
            let fqcn = self.pool.class(class).fqcn.clone();
            let before = self.pool[class.parser].error_count();
            self.delegate(class.parser, |analyzer| analyzer.resolve_class_body(class, None));
            if self.pool[class.parser].error_count() > before {
                self.push_error(format!(r#"Could not resolve class "{fqcn}"."#), report_on);
            }
            return;
        }

        tracing::trace!(class = %self.pool.class(class).fqcn, "resolving body");
        self.tree_mut()[class.id].resolved_body = true;
        let saved_class = std::mem::replace(&mut self.current_class, class.id);

        self.resolve_class_interface(class, source);

        let base = &self.tree()[class.id].base_type;
        if base.kind == Kind::Class {
            if let Some(base_class) = base.class_type.as_ref().map(|handle| handle.id) {
                self.resolve_class_body(base_class, Some(NodeId::Class(class.id)));
            }
        }

        let members = self.tree()[class.id].members.clone();
        for &member in &members {
            match member {
                Member::Function(id) => {
                    self.resolve_function_annotations(id);
                    self.resolve_function_body(id, false);
                }
                Member::Variable(id) => self.resolve_inline_accessors(id),
                _ => {}
            }
        }

        for &member in &members {
            match member {
                Member::Variable(id) => {
                    let variable = &self.tree()[id];
                    let name = variable.decl.name().to_string();
                    let usages = variable.decl.usages;
                    let onready = variable.onready;
                    let style = variable.style.clone();
                    if usages == 0 && name.starts_with('_') {
                        self.push_warning(id, WarningCode::UnusedPrivateClassVariable, &[&name]);
                    }
                    if onready && !self.class_inherits_node(class) {
                        self.push_error(r#""@onready" can only be used in classes that inherit "Node"."#, id);
                    }
                    if let PropertyStyle::SetGet { getter, setter } = style {
                        self.check_setget(class, id, getter.map(|g| g.name), setter.map(|s| s.name));
                    }
                }
                Member::Signal(id) => {
                    let signal = &self.tree()[id];
                    let usages = signal.usages;
                    let name = signal.identifier.name.clone();
                    if usages == 0 {
                        self.push_warning(id, WarningCode::UnusedSignal, &[&name]);
                    }
                }
                _ => {}
            }
        }

        if !self.pending_lambdas.is_empty() {
            tracing::debug!(count = self.pending_lambdas.len(), "lambda bodies left pending after class body");
            self.resolve_pending_lambdas();
        }

        if !self.tree()[class.id].is_abstract {
            self.check_abstract_methods(class);
        }

        self.current_class = saved_class;
    }

    pub(crate) fn resolve_class_body_recursive(&mut self, class: ClassRef) {
        self.resolve_class_body(class, None);
        let nested: Vec<_> = self
            .pool
            .class(class)
            .members
            .iter()
            .filter_map(|member| match member {
                Member::Class(id) => Some(ClassRef::new(class.parser, *id)),
                _ => None,
            })
            .collect();
        for inner in nested {
            self.resolve_class_body_recursive(inner);
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn resolve_function_body(&mut self, function: FunctionId, is_lambda: bool) {
        if self.tree()[function].resolved_body {
            return;
        }
        self.tree_mut()[function].resolved_body = true;

        let node = &self.tree()[function];
        let name = node.name().to_string();
        let is_lambda_body = node.source_lambda.is_some();
        let is_abstract = node.is_abstract;
        let is_static = node.is_static;
        let body = node.body.filter(|body| !self.tree()[*body].statements.is_empty());
        let Some(body) = body else {
            if is_lambda_body {
                self.push_error(r#"A lambda function must have a ":" followed by a body."#, function);
            } else if !is_abstract {
                self.push_error(format!(r#"The function "{name}" is defined without a body."#), function);
            }
            return;
        };
        if is_abstract {
            self.push_error("An abstract function cannot have a body.", body);
            return;
        }

        tracing::trace!(function = %name, "resolving function body");
        let saved_function = self.current_function.replace(function);
        let saved_static = std::mem::replace(&mut self.static_context, is_static);

        self.resolve_suite(body);

        let return_type = self.tree()[function].data_type.clone();
        let suite = &self.tree()[body];
        if !return_type.is_hard_type() && suite.data_type.is_set() {
            let inferred = suite.data_type.clone();
            self.tree_mut()[function].data_type = inferred;
        } else if return_type.is_hard_type()
            && !return_type.is_builtin(VariantType::Nil)
            && !suite.has_return
            && (is_lambda || name != "_init")
        {
            self.push_error(format!(r#"Not all code paths return a value in function "{name}"."#), function);
        }

        self.current_function = saved_function;
        self.static_context = saved_static;
    }

    /// Inline accessors take the property's type: the getter returns it and
    /// the setter's single parameter receives it.
    fn resolve_inline_accessors(&mut self, variable: VariableId) {
        let PropertyStyle::Inline { getter, setter } = self.tree()[variable].style.clone() else {
            return;
        };
        let node = &self.tree()[variable];
        let property_type = node.decl.data_type.clone();
        let specifier = node.decl.datatype_specifier;
        let is_static = node.is_static;

        if let Some(getter) = getter {
            let function = &mut self.tree_mut()[getter];
            function.return_type = specifier;
            function.data_type = property_type.clone();
            function.is_static = is_static;
            function.resolved_signature = true;
            function.info.return_val = property_type.to_property_info("");
            self.resolve_function_body(getter, false);
        }

        if let Some(setter) = setter {
            let Some(&parameter) = self.tree()[setter].parameters.first() else {
                self.push_error("A setter must declare exactly one parameter.", setter);
                return;
            };
            let parameter_name = self.tree()[parameter].decl.name().to_string();
            let tree = self.tree_mut();
            tree[parameter].decl.datatype_specifier = specifier;
            tree[parameter].decl.data_type = property_type.clone();
            let function = &mut tree[setter];
            function.data_type = DataType::builtin(VariantType::Nil, TypeSource::AnnotatedExplicit);
            function.is_static = is_static;
            function.resolved_signature = true;
            function.info.arguments = vec![property_type.to_property_info(&parameter_name)];
            self.resolve_function_body(setter, false);
        }
    }

    /// `set`/`get` accessors naming member functions must have a usable
    /// signature for the property's type.
    fn check_setget(&mut self, class: ClassRef, variable: VariableId, getter: Option<String>, setter: Option<String>) {
        let property_type = self.tree()[variable].decl.data_type.clone();
        let find = |analyzer: &Self, name: &str| match analyzer.tree()[class.id].get_member(name) {
            Some(Member::Function(id)) => Some(id),
            _ => None,
        };

        let mut valid_getter = None;
        if let Some(getter) = getter {
            match find(self, &getter) {
                None => self.push_error(format!(r#"Getter "{getter}" not found."#), variable),
                Some(function) => {
                    let node = &self.tree()[function];
                    let mut return_type = node.data_type.clone();
                    return_type.is_meta_type = false;
                    let required = node
                        .parameters
                        .iter()
                        .filter(|parameter| self.tree()[**parameter].decl.initializer.is_none())
                        .count();
                    if required != 0 || return_type.has_no_type() {
                        self.push_error(
                            format!(r#"Function "{getter}" cannot be used as getter because of its signature."#),
                            variable,
                        );
                    } else if !self.is_type_compatible(&property_type, &return_type, true, None) {
                        self.push_error(
                            format!(
                                r#"Function with return type "{return_type}" cannot be used as getter for a property of type "{property_type}"."#
                            ),
                            variable,
                        );
                    } else {
                        if property_type.builtin_type == VariantType::Int && return_type.builtin_type == VariantType::Float {
                            self.push_warning(variable, WarningCode::NarrowingConversion, &[]);
                        }
                        valid_getter = Some(return_type);
                    }
                }
            }
        }

        let mut valid_setter = None;
        if let Some(setter) = setter {
            match find(self, &setter) {
                None => self.push_error(format!(r#"Setter "{setter}" not found."#), variable),
                Some(function) if self.tree()[function].parameters.len() != 1 => self.push_error(
                    format!(r#"Function "{setter}" cannot be used as setter because of its signature."#),
                    variable,
                ),
                Some(function) => {
                    let parameter = self.tree()[function].parameters[0];
                    let argument_type = self.tree()[parameter].decl.data_type.clone();
                    if !self.is_type_compatible(&property_type, &argument_type, true, None) {
                        self.push_error(
                            format!(
                                r#"Function with argument type "{argument_type}" cannot be used as setter for a property of type "{property_type}"."#
                            ),
                            variable,
                        );
                    } else {
                        if property_type.builtin_type == VariantType::Float && argument_type.builtin_type == VariantType::Int {
                            self.push_warning(variable, WarningCode::NarrowingConversion, &[]);
                        }
                        valid_setter = Some(argument_type);
                    }
                }
            }
        }

        if let (Some(getter_type), Some(setter_type)) = (valid_getter, valid_setter) {
            if property_type.is_variant() && !self.is_type_compatible(&getter_type, &setter_type, true, None) {
                self.push_error(
                    format!(r#"Getter with type "{getter_type}" cannot be used along with setter of type "{setter_type}"."#),
                    variable,
                );
            }
        }
    }

    fn class_inherits_node(&self, class: ClassRef) -> bool {
        let native = &self.pool.class(class).data_type.native_type;
        self.host.classes.is_parent_class(native, "Node")
    }

    /// A concrete class must implement every abstract method it inherits
    /// from the chain of abstract bases above it.
    fn check_abstract_methods(&mut self, class: ClassRef) {
        let class_name = self.class_display_name(class);
        let mut implemented = FxHashSet::default();
        let mut current = Some(class);

        while let Some(base_class) = current {
            let node = self.pool.class(base_class);
            if !node.is_abstract && base_class != class {
                break;
            }

            let tree = self.pool.tree(base_class.parser);
            for member in &node.members {
                let Member::Function(id) = *member else {
                    continue;
                };
                let function = &tree[id];
                if !function.is_abstract {
                    implemented.insert(function.name().to_string());
                    continue;
                }
                if base_class == class {
                    self.push_error(
                        format!(
                            r#"Class "{class_name}" is not abstract but contains abstract methods. Mark the class as "@abstract" or remove "@abstract" from all methods in this class."#
                        ),
                        class.id,
                    );
                    return;
                }
                if !implemented.contains(function.name()) {
                    let base_name = self.class_display_name(base_class);
                    let method = function.name().to_string();
                    self.push_error(
                        format!(
                            r#"Class "{class_name}" must implement "{base_name}.{method}()" and other inherited abstract methods or be marked as "@abstract"."#
                        ),
                        class.id,
                    );
                    return;
                }
            }

            let base = self.pool.class(base_class).base_type.clone();
            current = match base.kind {
                Kind::Class => base.class_type.map(|handle| handle.id),
                Kind::Script => {
                    let parser = self.depended_parser_for(&base.script_path);
                    parser.map(|parser| ClassRef::new(parser, orchestrator_parser::Tree::HEAD))
                }
                _ => None,
            };
        }
    }

    fn class_display_name(&self, class: ClassRef) -> String {
        let node = self.pool.class(class);
        match &node.identifier {
            Some(identifier) => identifier.name.clone(),
            None => path::file_name(&node.fqcn).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_core::{VariantType, WarningCode};
    use orchestrator_parser::{FuncDecl, ParamDecl, ScriptParser, ScriptPool, TreeBuilder, VarDecl};
    use orchestrator_registry::Host;

    use crate::config::AnalyzerConfig;
    use crate::context::Analyzer;

    fn analyze(b: TreeBuilder) -> ScriptParser {
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let _ = Analyzer::new(&mut pool, &host, &config, id).analyze();
        pool[id].clone()
    }

    fn errors(script: &ScriptParser) -> Vec<&str> {
        script.errors.iter().map(|error| error.message.as_str()).collect()
    }

    #[test]
    fn missing_return_path() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let body = b.suite_of(|b| vec![b.pass()]);
        b.function(FuncDecl::new("f").returns(int).body(body));
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"Not all code paths return a value in function "f"."#]);
    }

    #[test]
    fn untyped_function_infers_return_type() {
        let mut b = TreeBuilder::new("res://a.os");
        let value = b.lit(3);
        let body = b.suite_of(|b| vec![b.ret(Some(value))]);
        let f = b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(errors(&script).is_empty());
        assert_eq!(script.tree[f].data_type.builtin_type, VariantType::Int);
    }

    #[test]
    fn function_without_body() {
        let mut b = TreeBuilder::new("res://a.os");
        b.function(FuncDecl::new("f"));
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"The function "f" is defined without a body."#]);
    }

    #[test]
    fn abstract_method_in_concrete_class() {
        let mut b = TreeBuilder::new("res://a.os");
        b.class_name("Shape");
        b.function(FuncDecl::new("area").abstract_());
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![
                r#"Class "Shape" is not abstract but contains abstract methods. Mark the class as "@abstract" or remove "@abstract" from all methods in this class."#
            ]
        );
    }

    #[test]
    fn inherited_abstract_method_must_be_implemented() {
        let mut b = TreeBuilder::new("res://a.os");
        b.begin_class("Base");
        b.abstract_class();
        b.function(FuncDecl::new("area").abstract_());
        b.end_class();
        b.begin_class("Square");
        b.extends(&["Base"]);
        b.end_class();
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![
                r#"Class "Square" must implement "Base.area()" and other inherited abstract methods or be marked as "@abstract"."#
            ]
        );
    }

    #[test]
    fn setget_accessors_are_validated() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let string = b.ty("String");
        let text = b.lit("x");
        let getter_body = b.suite_of(|b| vec![b.ret(Some(text))]);
        b.function(FuncDecl::new("get_health").returns(string).body(getter_body));
        b.variable(VarDecl::new("health").typed(int).setget(Some("get_health"), Some("missing")));
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![
                r#"Function with return type "String" cannot be used as getter for a property of type "int"."#,
                r#"Setter "missing" not found."#,
            ]
        );
    }

    #[test]
    fn inline_setter_parameter_takes_property_type() {
        let mut b = TreeBuilder::new("res://a.os");
        let float = b.ty("float");
        let value = b.ident("value");
        let body = b.suite_of(|b| vec![b.expr_stmt(value)]);
        let id = b.variable(
            VarDecl::new("speed")
                .typed(float)
                .setter(FuncDecl::new("").param(ParamDecl::new("value")).body(body)),
        );
        let script = analyze(b);
        let orchestrator_parser::PropertyStyle::Inline { setter: Some(setter), .. } = script.tree[id].style else {
            panic!("expected an inline setter");
        };
        let parameter = script.tree[setter].parameters[0];
        assert_eq!(script.tree[parameter].decl.data_type.builtin_type, VariantType::Float);
        assert!(script.tree[setter].resolved_body);
    }

    #[test]
    fn unused_private_variable_and_signal_warn() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        b.variable(VarDecl::new("_secret").typed(int));
        b.signal("died", vec![]);
        let script = analyze(b);
        let codes: Vec<_> = script.warnings.iter().map(|warning| warning.code).collect();
        assert!(codes.contains(&WarningCode::UnusedPrivateClassVariable));
        assert!(codes.contains(&WarningCode::UnusedSignal));
    }

    #[test]
    fn onready_requires_node() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        b.variable(VarDecl::new("count").typed(int).onready());
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![r#""@onready" can only be used in classes that inherit "Node"."#]
        );
    }
}
