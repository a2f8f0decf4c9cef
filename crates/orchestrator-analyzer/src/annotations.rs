//! Annotation resolution and `@export`.
//!
//! An annotation's arguments reduce once (`is_resolved`); its effect on the
//! annotated declaration applies once (`is_applied`).

use orchestrator_core::{
    AnnotationId, ClassId, DataType, FunctionId, Kind, PropertyHint, PropertyInfo, PropertyUsage, VariableId,
    VariantType,
};
use orchestrator_parser::AnnotationTarget;

use crate::context::Analyzer;

impl Analyzer<'_> {
    /// Reduce the arguments of an annotation; every argument must be constant.
    pub(crate) fn resolve_annotation(&mut self, annotation: AnnotationId) {
        let node = &self.tree()[annotation];
        if node.is_resolved {
            return;
        }
        let name = node.name.clone();
        let arguments = node.arguments.clone();
        self.tree_mut()[annotation].is_resolved = true;

        let mut resolved = Vec::with_capacity(arguments.len());
        for (index, argument) in arguments.into_iter().enumerate() {
            self.reduce_expression(argument, false);
            let expr = &self.tree()[argument];
            if !expr.is_constant {
                self.push_error(
                    format!(r#"Argument {} of annotation "{name}" isn't a constant expression."#, index + 1),
                    argument,
                );
                return;
            }
            resolved.push(expr.reduced_value.clone());
        }
        self.tree_mut()[annotation].resolved_arguments = resolved;
    }

    /// Check that each annotation is known and allowed on `target`.
    /// Returns the annotations that passed.
    fn validate_annotations(
        &mut self,
        annotations: &[AnnotationId],
        target: AnnotationTarget,
        target_name: &str,
    ) -> Vec<AnnotationId> {
        let mut valid = Vec::new();
        for &annotation in annotations {
            let node = &self.tree()[annotation];
            let name = node.name.clone();
            if node.info().is_none() {
                self.push_error(format!(r#"Unrecognized annotation: "{name}"."#), annotation);
                continue;
            }
            if !node.applies_to(target) {
                self.push_error(format!(r#"Annotation "{name}" cannot be applied to a {target_name}."#), annotation);
                continue;
            }
            self.resolve_annotation(annotation);
            valid.push(annotation);
        }
        valid
    }

    pub(crate) fn resolve_class_annotations(&mut self, class: ClassId) {
        let annotations = self.tree()[class].annotations.clone();
        let target = if self.tree()[class].outer.is_none() {
            AnnotationTarget::CLASS_LEVEL
        } else {
            AnnotationTarget::CLASS
        };
        self.validate_annotations(&annotations, target, "class");
    }

    pub(crate) fn resolve_function_annotations(&mut self, function: FunctionId) {
        let annotations = self.tree()[function].annotations.clone();
        self.validate_annotations(&annotations, AnnotationTarget::FUNCTION, "function");
    }

    /// Resolve and apply the annotations of a member variable whose type is
    /// already known.
    pub(crate) fn apply_variable_annotations(&mut self, variable: VariableId) {
        let annotations = self.tree()[variable].annotations.clone();
        for annotation in self.validate_annotations(&annotations, AnnotationTarget::VARIABLE, "variable") {
            if self.tree()[annotation].is_applied {
                continue;
            }
            self.tree_mut()[annotation].is_applied = true;
            if self.tree()[annotation].name == "@export" {
                self.apply_export(annotation, variable);
            }
        }
    }

    fn apply_export(&mut self, annotation: AnnotationId, variable: VariableId) {
        let node = &self.tree()[variable];
        let name = node.decl.name().to_string();
        if node.is_static {
            self.push_error(r#"Annotation "@export" cannot be applied to a static variable."#, annotation);
            return;
        }
        if node.exported {
            self.push_error(r#"Annotation "@export" cannot be used with another "@export" annotation."#, annotation);
            return;
        }
        if node.decl.datatype_specifier.is_none() && node.decl.initializer.is_none() {
            self.push_error(
                r#"Cannot use simple "@export" annotation with variable without type or initializer, since type can't be inferred."#,
                annotation,
            );
            return;
        }

        let mut export_type = node.decl.data_type.clone();
        if export_type.is_variant() {
            if let Some(initializer) = node.decl.initializer {
                let initializer_type = &self.tree()[initializer].data_type;
                if initializer_type.is_set() {
                    export_type = initializer_type.clone();
                }
            }
        }
        if export_type.has_no_type() {
            self.push_error(
                r#"Cannot use simple "@export" annotation because the type of the initialized value can't be inferred."#,
                annotation,
            );
            return;
        }

        let mut info = PropertyInfo::new(export_type.builtin_type, name);
        if export_type.is_builtin(VariantType::Array) && export_type.has_container_element_type(0) {
            let element = export_type.get_container_element_type_or_variant(0);
            match self.export_hint(&element) {
                Some((_, _, element_hint)) => {
                    info.ty = VariantType::Array;
                    info.hint = PropertyHint::ArrayType;
                    info.hint_string = element_hint;
                }
                None => {
                    self.push_error("Export type can only be built-in, a resource, a node, or an enum.", annotation);
                    return;
                }
            }
        } else if export_type.is_builtin(VariantType::Dictionary) && export_type.has_container_element_types() {
            let key = export_type.get_container_element_type_or_variant(0);
            let value = export_type.get_container_element_type_or_variant(1);
            match (self.export_hint(&key), self.export_hint(&value)) {
                (Some((_, _, key_hint)), Some((_, _, value_hint))) => {
                    info.ty = VariantType::Dictionary;
                    info.hint = PropertyHint::DictionaryType;
                    info.hint_string = format!("{key_hint};{value_hint}");
                }
                _ => {
                    self.push_error("Export type can only be built-in, a resource, a node, or an enum.", annotation);
                    return;
                }
            }
        } else {
            match export_type.kind {
                Kind::Builtin => {}
                Kind::Native | Kind::Script | Kind::Class => {
                    let Some((hint, class_name, _)) = self.export_hint(&export_type) else {
                        self.push_error("Export type can only be built-in, a resource, a node, or an enum.", annotation);
                        return;
                    };
                    info.ty = VariantType::Object;
                    info.hint = hint;
                    info.hint_string = class_name;
                }
                Kind::Enum if export_type.is_meta_type => info.ty = VariantType::Dictionary,
                Kind::Enum => {
                    info.ty = VariantType::Int;
                    info.hint = PropertyHint::Enum;
                    info.hint_string = enum_hint_string(&export_type);
                    info.usage |= PropertyUsage::CLASS_IS_ENUM;
                    info.class_name = export_type.native_type.replace("::", ".");
                }
                Kind::Variant => {
                    info.ty = VariantType::Nil;
                    info.usage |= PropertyUsage::NIL_IS_VARIANT;
                }
                Kind::Resolving | Kind::Unresolved => {
                    self.push_error("Export type can only be built-in, a resource, a node, or an enum.", annotation);
                    return;
                }
            }
        }

        if info.hint == PropertyHint::NodeType {
            let base = self.tree()[self.current_class].base_type.clone();
            if !self.host.classes.is_parent_class(&base.native_type, "Node") {
                self.push_error(
                    format!(r#"Node export is only supported in Node-derived classes, but the current class inherits "{base}"."#),
                    annotation,
                );
                return;
            }
        }

        info.usage |= PropertyUsage::DEFAULT | PropertyUsage::SCRIPT_VARIABLE;
        tracing::trace!(variable = %info.name, hint = ?info.hint, "exported");
        self.tree_mut()[annotation].export_info = info.clone();
        let node = &mut self.tree_mut()[variable];
        node.exported = true;
        node.export_info = info;
    }

    /// The property hint for exporting a value of `ty`, with the class name
    /// for object hints and the element hint string used inside containers.
    fn export_hint(&self, ty: &DataType) -> Option<(PropertyHint, String, String)> {
        match ty.kind {
            Kind::Builtin => Some((PropertyHint::None, String::new(), ty.builtin_type.name().to_string())),
            Kind::Variant => Some((PropertyHint::None, String::new(), VariantType::Nil.name().to_string())),
            Kind::Enum if !ty.is_meta_type => Some((
                PropertyHint::Enum,
                String::new(),
                format!("{}/{}:{}", VariantType::Int as i32, PropertyHint::Enum as i32, enum_hint_string(ty)),
            )),
            Kind::Native | Kind::Script | Kind::Class => {
                let class_name = narrowest_class_name(ty);
                let classes = &*self.host.classes;
                let hint = if classes.is_parent_class(&ty.native_type, "Resource") {
                    PropertyHint::ResourceType
                } else if classes.is_parent_class(&ty.native_type, "Node") {
                    PropertyHint::NodeType
                } else {
                    return None;
                };
                let element = format!("{}/{}:{class_name}", VariantType::Object as i32, hint as i32);
                Some((hint, class_name, element))
            }
            _ => None,
        }
    }
}

/// The global class name of a script type, falling back to its native base.
fn narrowest_class_name(ty: &DataType) -> String {
    if let Some(handle) = &ty.class_type {
        if !handle.global_name.is_empty() {
            return handle.global_name.clone();
        }
    }
    if let Some(script) = &ty.script_type {
        if !script.global_name.is_empty() {
            return script.global_name.clone();
        }
    }
    ty.native_type.clone()
}

/// `Name:value` pairs of an enum, in declaration order.
fn enum_hint_string(ty: &DataType) -> String {
    ty.enum_values
        .iter()
        .map(|(name, value)| format!("{}:{value}", capitalize(name)))
        .collect::<Vec<_>>()
        .join(",")
}

/// `SNAKE_CASE` or `snake_case` to `Snake Case`.
fn capitalize(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use orchestrator_parser::{ScriptParser, ScriptPool, TreeBuilder, VarDecl};
    use orchestrator_registry::Host;

    fn analyze(b: TreeBuilder) -> ScriptParser {
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let _ = Analyzer::new(&mut pool, &host, &config, id).analyze();
        pool[id].clone()
    }

    #[test]
    fn capitalize_enum_names() {
        assert_eq!(capitalize("WALK_SPEED"), "Walk Speed");
        assert_eq!(capitalize("idle"), "Idle");
    }

    #[test]
    fn export_builtin() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Node"]);
        let int = b.ty("int");
        let id = b.variable(VarDecl::new("health").typed(int).exported());
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        let variable = &script.tree[id];
        assert!(variable.exported);
        assert_eq!(variable.export_info.ty, VariantType::Int);
        assert!(variable.export_info.usage.contains(PropertyUsage::SCRIPT_VARIABLE));
    }

    #[test]
    fn export_node_type() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Node"]);
        let node = b.ty("Node");
        let id = b.variable(VarDecl::new("target").typed(node).exported());
        let script = analyze(b);
        let info = &script.tree[id].export_info;
        assert_eq!(info.ty, VariantType::Object);
        assert_eq!(info.hint, PropertyHint::NodeType);
        assert_eq!(info.hint_string, "Node");
    }

    #[test]
    fn export_without_type_or_initializer() {
        let mut b = TreeBuilder::new("res://a.os");
        b.variable(VarDecl::new("anything").exported());
        let script = analyze(b);
        assert_eq!(
            script.errors[0].message,
            r#"Cannot use simple "@export" annotation with variable without type or initializer, since type can't be inferred."#
        );
    }

    #[test]
    fn unknown_and_misplaced_annotations() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        b.variable(VarDecl::new("a").typed(int).annotate("@nope", vec![]));
        b.annotate_class("@export", vec![]);
        let script = analyze(b);
        let messages: Vec<_> = script.errors.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.contains(&r#"Unrecognized annotation: "@nope"."#));
        assert!(messages.contains(&r#"Annotation "@export" cannot be applied to a class."#));
    }
}
