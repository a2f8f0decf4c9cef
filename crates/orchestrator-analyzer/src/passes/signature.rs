//! Function signatures: parameter and return types, `MethodInfo`, and the
//! check that an override keeps the parent's signature.

use orchestrator_core::{
    DataType, FunctionId, Kind, MethodFlags, MethodInfo, NodeId, NodeRef, TypeSource, Variant, VariantType,
    WarningCode,
};
use orchestrator_parser::Member;

use crate::context::Analyzer;
use crate::types::type_from_metatype;

/// What a caller needs to know about a function it calls or overrides.
#[derive(Debug, Clone, Default)]
pub(crate) struct FunctionSignature {
    pub return_type: DataType,
    pub parameters: Vec<DataType>,
    pub default_arg_count: usize,
    pub flags: MethodFlags,
    /// Native class declaring the method, for non-virtual engine methods.
    pub native_class: Option<String>,
}

impl FunctionSignature {
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    pub fn is_vararg(&self) -> bool {
        self.flags.contains(MethodFlags::VARARG)
    }

    pub fn required_count(&self) -> usize {
        self.parameters.len().saturating_sub(self.default_arg_count)
    }

    /// `name(int, float = <default>, ...) -> String`.
    fn describe(&self, name: &str) -> String {
        let mut out = format!("{name}(");
        let required = self.required_count();
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            let parameter = parameter.to_string();
            out.push_str(if parameter == "null" { "Variant" } else { &parameter });
            if index >= required {
                out.push_str(" = <default>");
            }
        }
        if self.is_vararg() {
            if !self.parameters.is_empty() {
                out.push_str(", ");
            }
            out.push_str("...");
        }
        out.push_str(") -> ");
        let return_type = self.return_type.to_string_strict();
        out.push_str(if return_type == "null" { "void" } else { &return_type });
        out
    }
}

impl Analyzer<'_> {
    /// Resolve the signature of `function`. Lambdas take their static-ness
    /// from the enclosing context.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn resolve_function_signature(&mut self, function: FunctionId, source: Option<NodeId>, is_lambda: bool) {
        let report_on = source.unwrap_or(NodeId::Function(function));
        let name = self.tree()[function].name().to_string();

        if self.tree()[function].data_type.is_resolving() {
            self.push_error(format!(r#"Could not resolve function "{name}": Cyclic reference."#), report_on);
            return;
        }
        if self.tree()[function].resolved_signature {
            return;
        }
        self.tree_mut()[function].resolved_signature = true;
        tracing::trace!(function = %name, "resolving signature");

        let saved_function = self.current_function.replace(function);
        let saved_static = self.static_context;
        if is_lambda {
            let is_static = self.static_context;
            self.tree_mut()[function].is_static = is_static;
        } else {
            self.static_context = self.tree()[function].is_static;
        }

        let mut info = MethodInfo::new(name.clone());
        if self.tree()[function].is_static {
            info.flags |= MethodFlags::STATIC;
        }

        let previous = std::mem::replace(&mut self.tree_mut()[function].data_type, DataType::resolving());
        let is_abstract = self.tree()[function].is_abstract;

        let mut default_values = Vec::new();
        for parameter in self.tree()[function].parameters.clone() {
            self.resolve_parameter(parameter);
            let decl = &self.tree()[parameter].decl;
            let parameter_name = decl.name().to_string();
            info.arguments.push(decl.data_type.to_property_info(&parameter_name));
            if let Some(initializer) = decl.initializer {
                let default = &self.tree()[initializer];
                default_values.push(if default.is_constant {
                    default.reduced_value.clone()
                } else {
                    Variant::Nil
                });
            }
            self.check_parameter_usage(function, parameter, &name, is_abstract);
        }

        if let Some(rest) = self.tree()[function].rest_parameter {
            self.resolve_parameter(rest);
            info.flags |= MethodFlags::VARARG;
            match self.tree()[rest].decl.datatype_specifier {
                Some(specifier) => {
                    let specified = self.tree()[rest].decl.data_type.clone();
                    if !specified.is_builtin(VariantType::Array) {
                        self.push_error(
                            format!(r#"The rest parameter type must be "Array", but "{specified}" is specified."#),
                            specifier,
                        );
                    } else if specified.get_container_element_type(0).is_some_and(|element| !element.is_variant()) {
                        self.push_error("Typed arrays are currently not supported for the rest parameter.", specifier);
                    }
                }
                None => {
                    self.tree_mut()[rest].decl.data_type = DataType::builtin(VariantType::Array, TypeSource::Inferred);
                }
            }
            self.check_parameter_usage(function, rest, &name, is_abstract);
        }

        let return_type_node = self.tree()[function].return_type;
        if !is_lambda && name == "_init" {
            let instance = self.current_class_instance_type();
            self.tree_mut()[function].data_type = instance;
            if return_type_node.is_some() && !self.resolve_datatype(return_type_node).is_builtin(VariantType::Nil) {
                if let Some(node) = return_type_node {
                    self.push_error("Constructor cannot have an explicit return type.", node);
                }
            }
        } else if !is_lambda && name == "_static_init" {
            self.tree_mut()[function].data_type = DataType::builtin(VariantType::Nil, TypeSource::AnnotatedExplicit);
            if return_type_node.is_some() && !self.resolve_datatype(return_type_node).is_builtin(VariantType::Nil) {
                if let Some(node) = return_type_node {
                    self.push_error("Static constructor cannot have an explicit return type.", node);
                }
            }
        } else {
            let return_type = match return_type_node {
                Some(_) => type_from_metatype(&self.resolve_datatype(return_type_node)),
                None => DataType::variant(),
            };
            self.tree_mut()[function].data_type = return_type;
            if !is_lambda {
                self.check_parent_signature(function, &name, default_values.len());
            }
        }

        if return_type_node.is_none() {
            self.push_warning(function, WarningCode::UntypedDeclaration, &["Function", &name]);
        }

        let node = &mut self.tree_mut()[function];
        info.default_arguments = default_values.clone();
        info.return_val = node.data_type.to_property_info("");
        node.default_arg_values = default_values;
        node.info = info;
        if node.data_type.is_resolving() {
            node.data_type = previous;
        }

        self.current_function = saved_function;
        self.static_context = saved_static;
    }

    fn check_parameter_usage(
        &mut self,
        function: FunctionId,
        parameter: orchestrator_core::ParameterId,
        function_name: &str,
        is_abstract: bool,
    ) {
        let decl = &self.tree()[parameter].decl;
        let parameter_name = decl.name().to_string();
        if decl.usages == 0 && !parameter_name.starts_with('_') && !is_abstract && self.tree()[function].body.is_some() {
            self.push_warning(
                parameter,
                WarningCode::UnusedParameter,
                &[&parameter_name, function_name, &parameter_name],
            );
        }
        self.is_shadowing(&parameter_name, parameter.into(), "function parameter", true);
    }

    /// An override must accept every call the parent accepts and return
    /// something the parent's callers can use.
    fn check_parent_signature(&mut self, function: FunctionId, name: &str, default_count: usize) {
        let mut base = self.tree()[self.current_class].base_type.clone();
        base.is_meta_type = false;
        let Some(parent) = self.get_function_signature(NodeId::Function(function), false, &base, name) else {
            return;
        };

        let node = self.tree()[function].clone();
        let mut valid = node.is_static == parent.is_static();

        if node.return_type.is_some() {
            let return_type = &node.data_type;
            if return_type.is_variant() {
                valid = valid && parent.return_type.is_variant();
            } else if return_type.is_builtin(VariantType::Nil) {
                if parent.return_type.is_hard_type() && !parent.return_type.is_builtin(VariantType::Nil) {
                    valid = false;
                }
            } else {
                valid = valid && self.check_type_compatibility(&parent.return_type, return_type, false);
            }
        }

        let parent_min = parent.required_count();
        let parent_max = if parent.is_vararg() { usize::MAX } else { parent.parameters.len() };
        let current_min = node.parameters.len().saturating_sub(default_count);
        let current_max = if node.is_vararg() { usize::MAX } else { node.parameters.len() };
        valid = valid && current_min <= parent_min && parent_max <= current_max;

        if valid {
            for (parent_type, parameter) in parent.parameters.iter().zip(&node.parameters) {
                let current_type = self.tree()[*parameter].decl.data_type.clone();
                if parent_type.is_variant() && parent_type.is_hard_type() {
                    valid = valid && current_type.is_variant();
                } else {
                    valid = valid && self.check_type_compatibility(&current_type, parent_type, false);
                }
            }
        }

        if !valid {
            let signature = parent.describe(name);
            self.push_error(
                format!(r#"The function signature doesn't match the parent. Parent signature is "{signature}"."#),
                function,
            );
        }
        if let Some(native) = &parent.native_class {
            self.push_warning(function, WarningCode::NativeMethodOverride, &[name, native]);
        }
    }

    /// Find `name` on `base`: script classes first, then foreign scripts,
    /// the script resource class and finally the native class.
    pub(crate) fn get_function_signature(
        &mut self,
        source: NodeId,
        is_constructor: bool,
        base: &DataType,
        name: &str,
    ) -> Option<FunctionSignature> {
        let host = self.host;
        let classes = &*host.classes;
        let mut base = base.clone();

        let mut was_enum = false;
        if base.kind == Kind::Enum {
            if !base.is_meta_type {
                self.push_error("Cannot call function on enum value.", source);
                return None;
            }
            was_enum = true;
            base.kind = Kind::Builtin;
            base.builtin_type = VariantType::Dictionary;
            base.is_meta_type = false;
        }

        if base.kind == Kind::Builtin {
            let method = host.values.get_method(base.builtin_type, name)?;
            let signature = self.function_signature_from_info(method);
            if !signature.is_static() && was_enum && !method.flags.contains(MethodFlags::CONST) {
                self.push_error(
                    format!(r#"Cannot call non-const Dictionary function "{name}()" on enum "{}"."#, base.enum_type),
                    source,
                );
            }
            return Some(signature);
        }

        let native = base.native_type.clone();
        if !native.is_empty() {
            if !classes.class_exists(&native) {
                self.push_error(
                    format!("Native class {native} used in script doesn't exist or isn't exposed."),
                    source,
                );
                return None;
            }
            if is_constructor && classes.is_abstract(&native) {
                let message = match base.kind {
                    Kind::Class => {
                        let fqcn = base.class_type.as_ref().map_or("", |handle| handle.fqcn.as_str());
                        format!(
                            r#"Class "{}" cannot be constructed as it is based on abstract native class "{native}"."#,
                            crate::path::file_name(fqcn)
                        )
                    }
                    Kind::Script => format!(
                        r#"Script "{}" cannot be constructed as it is based on abstract native class "{native}"."#,
                        crate::path::file_name(&base.script_path)
                    ),
                    _ => format!(r#"Native class "{native}" cannot be constructed as it is abstract."#),
                };
                self.push_error(message, source);
                return None;
            }
        }

        let function_name = if is_constructor { "_init" } else { name };
        let mut flags = MethodFlags::NORMAL;
        if is_constructor {
            flags |= MethodFlags::STATIC;
        }

        let mut base_class = base.class_type.as_ref().map(|handle| handle.id);
        let mut found = None;
        while found.is_none() {
            let Some(class) = base_class else {
                break;
            };
            if let Some(member) = self.pool.class(class).get_member(function_name) {
                let Member::Function(id) = member else {
                    self.push_error(format!(r#"Member "{function_name}" is not a function."#), source);
                    return None;
                };
                self.resolve_class_member_by_name(class, function_name, Some(source));
                found = Some(NodeRef::new(class.parser, id));
            }
            let _ = self.resolve_class_inheritance(class, Some(source));
            base_class = self.pool.class(class).base_type.class_type.as_ref().map(|handle| handle.id);
        }

        if let Some(found) = found {
            let tree = self.pool.tree(found.parser);
            let function = &tree[found.id];
            if function.is_abstract {
                flags |= MethodFlags::VIRTUAL_REQUIRED;
            }
            if function.is_static {
                flags |= MethodFlags::STATIC;
            }
            if function.is_vararg() {
                flags |= MethodFlags::VARARG;
            }
            let parameters = function
                .parameters
                .iter()
                .map(|parameter| tree[*parameter].decl.data_type.clone())
                .collect();
            let default_arg_count = function
                .parameters
                .iter()
                .filter(|parameter| tree[**parameter].decl.initializer.is_some())
                .count();
            let mut return_type = if is_constructor {
                base.clone()
            } else {
                function.data_type.clone()
            };
            return_type.is_meta_type = false;
            return_type.is_coroutine = function.is_coroutine;
            return Some(FunctionSignature {
                return_type,
                parameters,
                default_arg_count,
                flags,
                native_class: None,
            });
        }

        if let Some(method) = base.script_type.as_ref().and_then(|script| script.get_method(function_name)) {
            return Some(self.function_signature_from_info(method));
        }

        // A script used as a value exposes the members of its resource class.
        if base.is_meta_type && !is_constructor && matches!(base.kind, Kind::Script | Kind::Class) {
            let script_class = match &base.script_type {
                Some(script) if base.kind == Kind::Script => script.resource_class(),
                _ => orchestrator_core::SCRIPT_CLASS_META,
            };
            if let Some(method) = classes.get_method_info(script_class, function_name) {
                return Some(self.function_signature_from_info(method));
            }
        }

        if is_constructor {
            let mut return_type = base;
            return_type.type_source = TypeSource::AnnotatedExplicit;
            return_type.is_meta_type = false;
            return Some(FunctionSignature {
                return_type,
                flags,
                ..Default::default()
            });
        }

        let method = classes.get_method_info(&native, function_name)?;
        let mut signature = self.function_signature_from_info(method);
        if classes.singleton(&native).is_some() {
            signature.flags |= MethodFlags::STATIC;
        }
        if !method.flags.contains(MethodFlags::VIRTUAL) {
            signature.native_class = Some(native);
        }
        Some(signature)
    }

    pub(crate) fn function_signature_from_info(&self, info: &MethodInfo) -> FunctionSignature {
        FunctionSignature {
            return_type: self.type_from_property(&info.return_val, false, false),
            parameters: info
                .arguments
                .iter()
                .map(|argument| self.type_from_property(argument, true, false))
                .collect(),
            default_arg_count: info.default_arguments.len(),
            flags: info.flags,
            native_class: None,
        }
    }
}
