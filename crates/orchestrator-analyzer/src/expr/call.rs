//! Calls: builtin constructors, utility functions and methods.

use orchestrator_core::{
    CallError, DataType, ExprId, Kind, MethodFlags, MethodInfo, TypeSource, Variant, VariantType, WarningCode,
};
use orchestrator_parser::{ExprKind, Member, SubscriptIndex};

use crate::context::Analyzer;
use crate::type_resolver::builtin_type_named;
use crate::types::{make_builtin_meta_type, type_from_metatype};

/// The arguments of a call after reduction.
struct Arguments {
    ids: Vec<ExprId>,
    all_constant: bool,
}

impl Arguments {
    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// `"A", "B", or "C"` style list of the types that convert to `target`.
fn convertible_types(values: &dyn orchestrator_registry::ValueModel, target: VariantType) -> String {
    let types: Vec<&str> = VariantType::ALL
        .iter()
        .filter(|ty| **ty != target && values.can_convert_strict(**ty, target))
        .map(|ty| ty.name())
        .collect();
    let mut expected = target.name().to_string();
    match types.as_slice() {
        [] => {}
        [only] => {
            expected.push_str("\" or \"");
            expected.push_str(only);
        }
        [init @ .., last] => {
            for ty in init {
                expected.push_str("\", \"");
                expected.push_str(ty);
            }
            expected.push_str("\", or \"");
            expected.push_str(last);
        }
    }
    expected
}

impl Analyzer<'_> {
    pub(super) fn reduce_call(&mut self, expr: ExprId, is_await: bool, is_root: bool) {
        let ExprKind::Call {
            callee,
            arguments,
            function_name,
            is_super,
            ..
        } = self.tree()[expr].kind.clone()
        else {
            return;
        };

        let mut all_constant = true;
        for &argument in &arguments {
            self.reduce_expression(argument, false);
            all_constant &= self.tree()[argument].is_constant;
        }
        let args = Arguments {
            ids: arguments,
            all_constant,
        };

        let callee_is_identifier = callee.is_some_and(|callee| self.tree()[callee].is_identifier());
        if !is_super && callee_is_identifier {
            if function_name == "Object" {
                self.push_error(r#"Invalid constructor "Object()", use "Object.new()" instead."#, expr);
                self.set_expression_type(expr, DataType::variant());
                return;
            }
            if let Some(builtin) = builtin_type_named(&function_name) {
                let call_type = self.reduce_builtin_constructor(expr, callee, builtin, &args);
                self.set_expression_type(expr, call_type);
                return;
            }
            if self.reduce_utility_call(expr, &function_name, &args, is_await, is_root) {
                return;
            }
        }

        let mut is_self = false;
        let mut base_type = match callee.map(|callee| (callee, self.tree()[callee].kind.clone())) {
            _ if is_super => {
                if callee.is_none() && self.current_lambda.is_some() {
                    self.push_error("Cannot use `super()` inside a lambda.", expr);
                }
                is_self = true;
                let class = self.current_class_ref();
                DataType {
                    is_meta_type: false,
                    ..self.class_node(class).base_type.clone()
                }
            }
            Some((_, ExprKind::Identifier(_))) => {
                is_self = true;
                let class = self.current_class_ref();
                DataType {
                    is_meta_type: false,
                    ..self.class_node(class).data_type.clone()
                }
            }
            Some((_, ExprKind::Subscript {
                base,
                index: SubscriptIndex::Attribute(_),
            })) => {
                let builtin = self.tree().identifier(base).and_then(|id| builtin_type_named(&id.name));
                match builtin {
                    Some(ty) => make_builtin_meta_type(ty),
                    None => {
                        match self.tree()[base].kind {
                            ExprKind::Identifier(_) => self.reduce_identifier_expression(base, true, false),
                            ExprKind::Subscript { .. } => self.reduce_subscript_expression(base, true),
                            _ => self.reduce_expression(base, false),
                        }
                        is_self = matches!(self.tree()[base].kind, ExprKind::SelfRef);
                        self.tree()[base].data_type.clone()
                    }
                }
            }
            _ => {
                // Indexed callees and bare callables are only known at runtime.
                self.mark_unsafe(expr);
                self.set_expression_type(expr, DataType::variant());
                return;
            }
        };

        let is_constructor = (base_type.is_meta_type || callee_is_identifier) && function_name == "new";
        if is_constructor {
            if self.host.classes.singleton(&base_type.native_type).is_some() {
                self.push_error(
                    format!(
                        r#"Cannot construct native class "{}" because it is an engine singleton."#,
                        base_type.native_type
                    ),
                    expr,
                );
                self.set_expression_type(expr, DataType::variant());
                return;
            }
            let abstract_class = base_type.kind == Kind::Class
                && base_type
                    .class_type
                    .as_ref()
                    .is_some_and(|handle| self.pool.class(handle.id).is_abstract);
            if abstract_class {
                let shown = type_from_metatype(&base_type).to_string();
                self.push_error(format!(r#"Cannot construct abstract class "{shown}"."#), expr);
            }
        }

        let errors_before = self.error_count();
        let mut call_type = DataType::variant();
        match self.get_function_signature(expr.into(), is_constructor, &base_type, &function_name) {
            Some(signature) => {
                if is_super && signature.flags.contains(MethodFlags::VIRTUAL_REQUIRED) {
                    self.push_error(
                        format!(r#"Cannot call the parent class' abstract function "{function_name}()"."#),
                        expr,
                    );
                } else if is_super && signature.flags.contains(MethodFlags::VIRTUAL) {
                    self.push_error(
                        format!(
                            r#"Cannot call the parent class' virtual function "{function_name}()" because it hasn't been defined."#
                        ),
                        expr,
                    );
                }

                // Container literals passed to typed parameters take the parameter's element types.
                for (index, &argument) in args.ids.iter().enumerate() {
                    let Some(parameter) = signature.parameters.get(index) else {
                        break;
                    };
                    if !parameter.is_hard_type() {
                        continue;
                    }
                    match self.tree()[argument].kind {
                        ExprKind::Array(_) => {
                            if let Some(element) = parameter.get_container_element_type(0) {
                                let element = element.clone();
                                self.update_array_literal_element_type(argument, &element);
                            }
                        }
                        ExprKind::Dictionary(_) if parameter.has_container_element_types() => {
                            let key = parameter.get_container_element_type_or_variant(0);
                            let value = parameter.get_container_element_type_or_variant(1);
                            self.update_dictionary_literal_element_type(argument, &key, &value);
                        }
                        _ => {}
                    }
                }

                self.validate_call_arg(
                    &function_name,
                    &signature.parameters,
                    signature.default_arg_count,
                    signature.is_vararg(),
                    expr,
                    &args.ids,
                );

                if base_type.kind == Kind::Enum && base_type.is_meta_type {
                    // Enums answer Dictionary methods on their value.
                    base_type.is_meta_type = false;
                }

                let is_static = signature.is_static();
                if is_self && self.static_context && !is_static {
                    let message = match self.static_context_function_name() {
                        Some(parent) => format!(
                            r#"Cannot call non-static function "{function_name}()" from the static function "{parent}()"."#
                        ),
                        None => format!(
                            r#"Cannot call non-static function "{function_name}()" from a static variable initializer."#
                        ),
                    };
                    self.push_error(message, expr);
                } else if !is_self && base_type.is_meta_type && !is_static {
                    base_type.is_meta_type = false;
                    self.push_error(
                        format!(
                            r#"Cannot call non-static function "{function_name}()" on the class "{base_type}" directly. Make an instance instead."#
                        ),
                        expr,
                    );
                } else if is_self && !is_static {
                    self.mark_lambda_use_self();
                }

                let returns_void = signature.return_type.is_hard_type()
                    && signature.return_type.kind == Kind::Builtin
                    && signature.return_type.builtin_type == VariantType::Nil;
                if !is_root && !is_await && returns_void {
                    self.push_error(
                        format!(r#"Cannot get return value of call to "{function_name}()" because it returns "void"."#),
                        expr,
                    );
                }

                let super_init = is_super && function_name == "_init";
                if is_root
                    && signature.return_type.kind != Kind::Unresolved
                    && signature.return_type.builtin_type != VariantType::Nil
                    && !super_init
                {
                    self.push_warning(expr, WarningCode::ReturnValueDiscarded, &[&function_name]);
                }

                if is_static && !is_constructor && !base_type.is_meta_type && !is_self {
                    let caller = base_type.to_string();
                    self.push_warning(
                        expr,
                        WarningCode::StaticCalledOnInstance,
                        &[&function_name, &caller, &function_name],
                    );
                }

                if is_self && matches!(function_name.as_str(), "emit_signal" | "connect" | "disconnect") {
                    if let Some(&first) = args.ids.first() {
                        self.count_signal_use(first);
                    }
                }

                call_type = signature.return_type;
            }
            None if self.error_count() > errors_before => {}
            None => self.report_missing_function(expr, callee, &function_name, &base_type, is_self, is_super),
        }

        if call_type.is_coroutine && !is_await {
            if is_root {
                self.push_warning(expr, WarningCode::MissingAwait, &[&function_name]);
            } else {
                self.push_error(
                    format!(r#"Function "{function_name}()" is a coroutine, so it must be called with "await"."#),
                    expr,
                );
            }
        }

        self.set_expression_type(expr, call_type);
    }

    fn report_missing_function(
        &mut self,
        expr: ExprId,
        callee: Option<ExprId>,
        function_name: &str,
        base_type: &DataType,
        is_self: bool,
        is_super: bool,
    ) {
        let errors_before = self.error_count();
        let mut found = false;

        if base_type.kind == Kind::Enum && base_type.is_meta_type {
            let enum_name = &base_type.enum_type;
            let message = if base_type.builtin_type == VariantType::Dictionary {
                format!(
                    r#"Enums only have Dictionary built-in methods. Function "{function_name}()" does not exist for enum "{enum_name}"."#
                )
            } else {
                format!(
                    r#"The native enum "{enum_name}" does not behave like Dictionary and does not have methods of its own."#
                )
            };
            self.push_error(message, callee.unwrap_or(expr));
            return;
        }

        // The name may exist as something other than a function.
        let callee_id = match callee.map(|callee| (callee, &self.tree()[callee].kind)) {
            Some((callee, ExprKind::Identifier(_))) => Some(callee),
            Some((_, ExprKind::Subscript {
                index: SubscriptIndex::Attribute(attribute),
                ..
            })) => Some(*attribute),
            _ => None,
        };
        if let (false, Some(callee_id)) = (is_super, callee_id) {
            let callee_type = self
                .lookup_attribute(callee_id, function_name, base_type)
                .map(|found| found.data_type)
                .unwrap_or_default();
            if callee_type.is_set() && !callee_type.is_variant() {
                found = true;
                let message = if callee_type.builtin_type == VariantType::Callable {
                    format!(r#"Name "{function_name}" is a Callable. You can call it with "{function_name}.call()" instead."#)
                } else {
                    format!(r#"Name "{function_name}" called as a function but is a "{callee_type}"."#)
                };
                self.push_error(message, callee_id);
            } else if !is_self && !(base_type.is_hard_type() && base_type.kind == Kind::Builtin) {
                let shown = base_type.to_string();
                self.push_warning(expr, WarningCode::UnsafeMethodAccess, &[function_name, &shown]);
                self.mark_unsafe(expr);
            }
        }

        // A failed member lookup on a hard builtin already said why.
        if found || self.error_count() > errors_before {
            return;
        }
        if is_self || (base_type.is_hard_type() && base_type.kind == Kind::Builtin) {
            let base_name = if is_self && !is_super {
                "self".to_string()
            } else {
                base_type.to_string()
            };
            let node = if is_super { expr } else { callee.unwrap_or(expr) };
            self.push_error(format!(r#"Function "{function_name}()" not found in base {base_name}."#), node);
        } else if !is_super && base_type.is_hard_type() && base_type.is_meta_type {
            self.push_error(
                format!(
                    r#"Static function "{function_name}()" not found in base "{}"."#,
                    base_type.native_type
                ),
                expr,
            );
        }
    }

    /// `Type(args)` for a builtin type.
    fn reduce_builtin_constructor(
        &mut self,
        expr: ExprId,
        callee: Option<ExprId>,
        builtin: VariantType,
        args: &Arguments,
    ) -> DataType {
        let host = self.host;
        let type_name = builtin.name();
        let mut call_type = DataType::builtin(builtin, TypeSource::AnnotatedExplicit);

        // Shared containers must be built fresh on every evaluation.
        let safe_to_fold = !builtin.is_shared();

        if args.all_constant && safe_to_fold {
            let values: Vec<Variant> = args.ids.iter().map(|id| self.tree()[*id].reduced_value.clone()).collect();
            match host.values.construct(builtin, &values) {
                Ok(value) => self.set_constant(expr, value),
                Err(CallError::InvalidArgument { index, expected }) => {
                    let node = args.ids.get(index).copied().unwrap_or(expr);
                    let given = self.tree()[node].data_type.to_string();
                    self.push_error(
                        format!(
                            r#"Invalid argument for {type_name} constructor: argument {} should be "{expected}" but is "{given}"."#,
                            index + 1
                        ),
                        node,
                    );
                }
                Err(CallError::InvalidMethod | CallError::Failed(_)) => {
                    let signature = self.call_signature_text(type_name, &args.ids);
                    self.push_error(
                        format!(r#"No constructor of "{type_name}" matches the signature "{signature}"."#),
                        callee.unwrap_or(expr),
                    );
                }
                Err(CallError::TooManyArguments { expected }) => self.push_error(
                    format!(
                        "Too many arguments for {type_name} constructor. Received {} but expected {expected}.",
                        args.len()
                    ),
                    expr,
                ),
                Err(CallError::TooFewArguments { expected }) => self.push_error(
                    format!(
                        "Too few arguments for {type_name} constructor. Received {} but expected {expected}.",
                        args.len()
                    ),
                    expr,
                ),
            }
        } else {
            if let [only] = args.ids.as_slice() {
                let argument_type = self.tree()[*only].data_type.clone();
                if argument_type.is_hard_type() && !argument_type.is_variant() {
                    if argument_type.kind == Kind::Builtin && argument_type.builtin_type == builtin {
                        return call_type;
                    }
                } else {
                    // Copy and conversion constructors accept anything at runtime.
                    self.mark_unsafe(expr);
                    let expected = convertible_types(&*host.values, builtin);
                    let what = format!(r#"constructor "{type_name}()""#);
                    self.push_warning(*only, WarningCode::UnsafeCallArgument, &["1", &what, &expected, "Variant"]);
                    return call_type;
                }
            }

            match self.match_constructor(expr, builtin, &args.ids) {
                Some(data_type) => call_type = data_type,
                None => {
                    let signature = self.call_signature_text(type_name, &args.ids);
                    self.push_error(
                        format!(r#"No constructor of "{type_name}" matches the signature "{signature}"."#),
                        expr,
                    );
                }
            }
        }

        // `Signal(self, "name")` counts as a use of the signal.
        if builtin == VariantType::Signal {
            if let [object, signal, ..] = args.ids.as_slice() {
                if matches!(self.tree()[*object].kind, ExprKind::SelfRef) {
                    self.count_signal_use(*signal);
                }
            }
        }
        call_type
    }

    /// Pick the first constructor overload accepting the argument types.
    fn match_constructor(&mut self, expr: ExprId, builtin: VariantType, args: &[ExprId]) -> Option<DataType> {
        let host = self.host;
        let type_name = builtin.name();
        for info in host.values.constructor_list(builtin) {
            let required = info.arguments.len() - info.default_arguments.len().min(info.arguments.len());
            if args.len() < required || args.len() > info.arguments.len() {
                continue;
            }

            let mut types_match = true;
            for (argument, property) in args.iter().zip(&info.arguments) {
                let parameter = self.type_from_property(property, true, false);
                let argument_type = self.tree()[*argument].data_type.clone();
                if !self.is_type_compatible(&parameter, &argument_type, true, None) {
                    types_match = false;
                    break;
                }
                if parameter.builtin_type == VariantType::Int
                    && argument_type.builtin_type == VariantType::Float
                    && builtin != VariantType::Int
                {
                    self.push_warning(expr, WarningCode::NarrowingConversion, &[]);
                }
            }
            if !types_match {
                continue;
            }

            for (index, (argument, property)) in args.iter().zip(&info.arguments).enumerate() {
                let parameter = self.type_from_property(property, true, false);
                if self.tree()[*argument].is_constant {
                    self.update_const_expression_builtin_type(*argument, &parameter, "pass", false);
                }
                if parameter.is_variant() && parameter.is_hard_type() {
                    continue;
                }
                let argument_type = self.tree()[*argument].data_type.clone();
                if argument_type.is_variant() || !argument_type.is_hard_type() {
                    self.mark_unsafe(expr);
                    let position = (index + 1).to_string();
                    let what = format!(r#"constructor "{type_name}()""#);
                    let expected = parameter.to_string();
                    let given = argument_type.to_string_strict();
                    self.push_warning(
                        *argument,
                        WarningCode::UnsafeCallArgument,
                        &[&position, &what, &expected, &given],
                    );
                }
            }
            return Some(self.type_from_property(&info.return_val, false, false));
        }
        None
    }

    /// Script and engine utility functions. Returns `false` when `name` is
    /// neither.
    fn reduce_utility_call(&mut self, expr: ExprId, name: &str, args: &Arguments, is_await: bool, is_root: bool) -> bool {
        let host = self.host;
        let Some(utility) = host
            .utilities
            .script_function(name)
            .or_else(|| host.utilities.engine_function(name))
        else {
            return false;
        };
        let info: &MethodInfo = &utility.info;

        let returns_void = info.return_val.ty == VariantType::Nil && !info.return_val.is_variant();
        if !is_root && !is_await && returns_void {
            self.push_error(
                format!(r#"Cannot get return value of call to "{name}()" because it returns "void"."#),
                expr,
            );
        }

        if args.all_constant && host.utilities.can_fold(name) {
            let values: Vec<Variant> = args.ids.iter().map(|id| self.tree()[*id].reduced_value.clone()).collect();
            match host.utilities.call(&*host.classes, name, &values) {
                Ok(value) => self.set_constant(expr, value),
                Err(CallError::InvalidArgument { index, expected }) => {
                    let node = args.ids.get(index).copied().unwrap_or(expr);
                    let given = self.tree()[node].data_type.to_string();
                    self.push_error(
                        format!(
                            r#"Invalid argument for "{name}()" function: argument {} should be "{expected}" but is "{given}"."#,
                            index + 1
                        ),
                        node,
                    );
                }
                Err(CallError::Failed(message)) => {
                    self.push_error(format!(r#"Invalid argument for "{name}()" function: {message}"#), expr);
                }
                Err(CallError::InvalidMethod) => {
                    self.push_error(format!(r#"Invalid call for function "{name}"."#), expr);
                }
                Err(CallError::TooManyArguments { expected }) => self.push_error(
                    format!(
                        r#"Too many arguments for "{name}()" call. Expected at most {expected} but received {}."#,
                        args.len()
                    ),
                    expr,
                ),
                Err(CallError::TooFewArguments { expected }) => self.push_error(
                    format!(
                        r#"Too few arguments for "{name}()" call. Expected at least {expected} but received {}."#,
                        args.len()
                    ),
                    expr,
                ),
            }
        } else {
            let signature = self.function_signature_from_info(info);
            self.validate_call_arg(
                name,
                &signature.parameters,
                signature.default_arg_count,
                signature.is_vararg(),
                expr,
                &args.ids,
            );
        }

        let return_type = self.type_from_property(&info.return_val, false, false);
        self.set_expression_type(expr, return_type);
        true
    }

    /// Check argument count and types against a resolved parameter list.
    pub(crate) fn validate_call_arg(
        &mut self,
        function_name: &str,
        parameters: &[DataType],
        default_arg_count: usize,
        is_vararg: bool,
        call: ExprId,
        args: &[ExprId],
    ) {
        let required = parameters.len().saturating_sub(default_arg_count);
        if args.len() < required {
            self.push_error(
                format!(
                    r#"Too few arguments for "{function_name}()" call. Expected at least {required} but received {}."#,
                    args.len()
                ),
                call,
            );
        }
        if !is_vararg && args.len() > parameters.len() {
            self.push_error(
                format!(
                    r#"Too many arguments for "{function_name}()" call. Expected at most {} but received {}."#,
                    parameters.len(),
                    args.len()
                ),
                args[parameters.len()],
            );
        }

        for (index, (&argument, parameter)) in args.iter().zip(parameters).enumerate() {
            if parameter.is_hard_type() && self.tree()[argument].is_constant {
                self.update_const_expression_builtin_type(argument, parameter, "pass", false);
            }

            let argument_type = self.tree()[argument].data_type.clone();
            let unsafe_argument = |this: &mut Self, node: ExprId| {
                let position = (index + 1).to_string();
                let what = format!(r#"function "{function_name}()""#);
                let expected = parameter.to_string();
                let given = argument_type.to_string_strict();
                this.mark_unsafe(node);
                this.push_warning(
                    argument,
                    WarningCode::UnsafeCallArgument,
                    &[&position, &what, &expected, &given],
                );
            };

            if argument_type.is_variant() || !argument_type.is_hard_type() {
                // A hard Variant parameter takes anything.
                if !(parameter.is_hard_type() && parameter.is_variant()) {
                    unsafe_argument(self, argument);
                }
            } else if parameter.is_hard_type()
                && !self.is_type_compatible(parameter, &argument_type, true, Some(argument.into()))
            {
                if self.check_type_compatibility(&argument_type, parameter, false) {
                    // A supertype may hold the right subtype at runtime.
                    unsafe_argument(self, call);
                } else {
                    self.push_error(
                        format!(
                            r#"Invalid argument for "{function_name}()" function: argument {} should be "{parameter}" but is "{argument_type}"."#,
                            index + 1
                        ),
                        argument,
                    );
                }
            } else if parameter.kind == Kind::Builtin
                && parameter.builtin_type == VariantType::Int
                && argument_type.kind == Kind::Builtin
                && argument_type.builtin_type == VariantType::Float
            {
                self.push_warning(call, WarningCode::NarrowingConversion, &[]);
            }
        }
    }

    /// `Type(ArgType, ...)` as shown in constructor diagnostics.
    fn call_signature_text(&self, type_name: &str, args: &[ExprId]) -> String {
        let types: Vec<String> = args.iter().map(|id| self.tree()[*id].data_type.to_string()).collect();
        format!("{type_name}({})", types.join(", "))
    }

    /// A constant argument naming a signal of the current class counts as a
    /// use of that signal.
    fn count_signal_use(&mut self, argument: ExprId) {
        let node = &self.tree()[argument];
        if !node.is_constant {
            return;
        }
        let Some(name) = node.reduced_value.as_str().map(str::to_string) else {
            return;
        };
        let class = self.current_class_ref();
        if let Some(Member::Signal(signal)) = self.class_node(class).get_member(&name) {
            self.tree_mut()[signal].usages += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_core::{Variant, VariantType, WarningCode};
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
    fn builtin_constructor_folds() {
        let mut b = TreeBuilder::new("res://a.os");
        let x = b.lit(1.5);
        let y = b.lit(2.0);
        let vector = b.call("Vector2", vec![x, y]);
        b.constant(VarDecl::new("POINT").init(vector));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert!(script.tree[vector].is_constant);
        assert_eq!(script.tree[vector].reduced_value, Variant::vector2(1.5, 2.0));
        assert!(script.tree[vector].data_type.is_builtin(VariantType::Vector2));
    }

    #[test]
    fn object_constructor_is_rejected() {
        let mut b = TreeBuilder::new("res://a.os");
        let object = b.call("Object", vec![]);
        let body = b.suite_of(|b| vec![b.expr_stmt(object)]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"Invalid constructor "Object()", use "Object.new()" instead."#]);
    }

    #[test]
    fn utility_functions_fold() {
        let mut b = TreeBuilder::new("res://a.os");
        let text = b.lit("abc");
        let length = b.call("len", vec![text]);
        b.constant(VarDecl::new("LENGTH").init(length));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert_eq!(script.tree[length].reduced_value, Variant::Int(3));
    }

    #[test]
    fn too_few_arguments() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let int2 = b.ty("int");
        let empty = b.suite_of(|b| vec![b.pass()]);
        b.function(
            FuncDecl::new("add")
                .param(ParamDecl::new("a").typed(int))
                .param(ParamDecl::new("b").typed(int2))
                .body(empty),
        );
        let one = b.lit(1);
        let call = b.call("add", vec![one]);
        let body = b.suite_of(|b| vec![b.expr_stmt(call)]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(errors(&script).contains(&r#"Too few arguments for "add()" call. Expected at least 2 but received 1."#));
    }

    #[test]
    fn argument_of_wrong_type() {
        let mut b = TreeBuilder::new("res://a.os");
        let node = b.ty("Node");
        let empty = b.suite_of(|b| vec![b.pass()]);
        b.function(FuncDecl::new("take").param(ParamDecl::new("n").typed(node)).body(empty));
        let text = b.lit("x");
        let call = b.call("take", vec![text]);
        let body = b.suite_of(|b| vec![b.expr_stmt(call)]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(errors(&script)
            .contains(&r#"Invalid argument for "take()" function: argument 1 should be "Node" but is "String"."#));
    }

    #[test]
    fn void_result_cannot_be_used() {
        let mut b = TreeBuilder::new("res://a.os");
        let void = b.ty("void");
        let empty = b.suite_of(|b| vec![b.pass()]);
        b.function(FuncDecl::new("nothing").returns(void).body(empty));
        let call = b.call("nothing", vec![]);
        let body = b.suite_of(|b| vec![b.local_var(VarDecl::new("x").init(call))]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(errors(&script)
            .contains(&r#"Cannot get return value of call to "nothing()" because it returns "void"."#));
    }

    #[test]
    fn missing_function_on_self() {
        let mut b = TreeBuilder::new("res://a.os");
        let call = b.call("nowhere", vec![]);
        let body = b.suite_of(|b| vec![b.expr_stmt(call)]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"Function "nowhere()" not found in base self."#]);
    }

    #[test]
    fn instance_function_from_static_function() {
        let mut b = TreeBuilder::new("res://a.os");
        let empty = b.suite_of(|b| vec![b.pass()]);
        b.function(FuncDecl::new("instance_only").body(empty));
        let call = b.call("instance_only", vec![]);
        let body = b.suite_of(|b| vec![b.expr_stmt(call)]);
        b.function(FuncDecl::new("helper").statik().body(body));
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![r#"Cannot call non-static function "instance_only()" from the static function "helper()"."#]
        );
    }

    #[test]
    fn instance_method_on_native_class() {
        let mut b = TreeBuilder::new("res://a.os");
        let node = b.ident("Node");
        let call = b.method_call(node, "get_child_count", vec![]);
        let body = b.suite_of(|b| vec![b.expr_stmt(call)]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![r#"Cannot call non-static function "get_child_count()" on the class "Node" directly. Make an instance instead."#]
        );
    }

    #[test]
    fn coroutines_need_await() {
        let mut b = TreeBuilder::new("res://a.os");
        let one = b.lit(1);
        let wait = b.await_(one);
        let co_body = b.suite_of(|b| vec![b.expr_stmt(wait)]);
        b.function(FuncDecl::new("co").body(co_body));

        let used = b.call("co", vec![]);
        let discarded = b.call("co", vec![]);
        let body = b.suite_of(|b| vec![b.local_var(VarDecl::new("_x").init(used)), b.expr_stmt(discarded)]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![r#"Function "co()" is a coroutine, so it must be called with "await"."#]
        );
        assert!(script.warnings.iter().any(|w| w.code == WarningCode::MissingAwait));
    }

    #[test]
    fn emitting_a_signal_uses_it() {
        let mut b = TreeBuilder::new("res://a.os");
        let signal = b.signal("done", vec![]);
        let name = b.lit("done");
        let emit = b.call("emit_signal", vec![name]);
        let body = b.suite_of(|b| vec![b.expr_stmt(emit)]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert_eq!(script.tree[signal].usages, 1);
        assert!(!script.warnings.iter().any(|w| w.code == WarningCode::UnusedSignal));
    }
}
