//! Type compatibility.
//!
//! `is_type_compatible(target, source)` is asymmetric: a derived source fits a
//! base target but not the other way round. Call sites that want to tell an
//! error from an unsafe but possible assignment test both directions.

mod from_value;

use orchestrator_core::{
    ClassHandle, DataType, ExprId, Kind, NATIVE_CLASS_META, NodeId, SCRIPT_CLASS_META, VariantType, WarningCode,
};
use orchestrator_parser::ast::SubscriptIndex;
use orchestrator_parser::{ExprKind, IdentifierSource};

use crate::context::Analyzer;

impl Analyzer<'_> {
    /// Whether a value of `source` may be stored in `target`.
    ///
    /// With `source_node`, storing a plain int into an enum slot warns.
    pub(crate) fn is_type_compatible(
        &mut self,
        target: &DataType,
        source: &DataType,
        allow_implicit_conversion: bool,
        source_node: Option<NodeId>,
    ) -> bool {
        if let Some(node) = source_node {
            if target.kind == Kind::Enum && source.is_builtin(VariantType::Int) {
                self.push_warning(node, WarningCode::IntAsEnumWithoutCast, &[]);
            }
        }
        self.check_type_compatibility(target, source, allow_implicit_conversion)
    }

    pub(crate) fn check_type_compatibility(
        &self,
        target: &DataType,
        source: &DataType,
        allow_implicit_conversion: bool,
    ) -> bool {
        // Unset types never block analysis.
        if !target.is_set() || !source.is_set() {
            return true;
        }
        if target.kind == Kind::Variant || source.kind == Kind::Variant {
            return true;
        }

        if target.kind == Kind::Builtin {
            let mut valid = source.kind == Kind::Builtin && target.builtin_type == source.builtin_type;
            if !valid && allow_implicit_conversion {
                valid = self.host.values.can_convert_strict(source.builtin_type, target.builtin_type);
            }
            if !valid && target.builtin_type == VariantType::Int && source.kind == Kind::Enum && !source.is_meta_type {
                valid = true;
            }
            if valid && target.builtin_type == VariantType::Array && source.builtin_type == VariantType::Array {
                if let (Some(t), Some(s)) = (target.get_container_element_type(0), source.get_container_element_type(0)) {
                    valid = t == s;
                }
            }
            if valid && target.builtin_type == VariantType::Dictionary && source.builtin_type == VariantType::Dictionary {
                if let (Some(t), Some(s)) = (target.get_container_element_type(0), source.get_container_element_type(0)) {
                    valid = t == s;
                }
                if valid {
                    if let (Some(t), Some(s)) =
                        (target.get_container_element_type(1), source.get_container_element_type(1))
                    {
                        valid = t == s;
                    }
                }
            }
            return valid;
        }

        if target.kind == Kind::Enum {
            return source.is_builtin(VariantType::Int)
                || (source.kind == Kind::Enum && source.native_type == target.native_type);
        }

        // The target is object-like from here on.
        if source.is_builtin(VariantType::Nil) {
            return true;
        }

        let mut src_native = String::new();
        let mut src_script = None;
        let mut src_class: Option<ClassHandle> = None;

        match source.kind {
            Kind::Native => {
                if target.kind != Kind::Native {
                    return false;
                }
                src_native = if source.is_meta_type {
                    NATIVE_CLASS_META.to_string()
                } else {
                    source.native_type.clone()
                };
            }
            Kind::Script => {
                if target.kind == Kind::Class {
                    return false;
                }
                let Some(script) = &source.script_type else {
                    return false;
                };
                if source.is_meta_type {
                    src_native = script.resource_class().to_string();
                } else {
                    src_native = script.native_base.clone();
                    src_script = Some(script.clone());
                }
            }
            Kind::Class => {
                if source.is_meta_type {
                    src_native = SCRIPT_CLASS_META.to_string();
                } else {
                    src_class = source.class_type.clone();
                    let mut base = source.class_type.clone();
                    while let Some(handle) = base {
                        let base_type = &self.pool.class(handle.id).base_type;
                        if base_type.kind == Kind::Class {
                            base = base_type.class_type.clone();
                            continue;
                        }
                        src_native = base_type.native_type.clone();
                        src_script = base_type.script_type.clone();
                        break;
                    }
                }
            }
            Kind::Variant | Kind::Builtin | Kind::Enum | Kind::Resolving | Kind::Unresolved => {}
        }

        let host = self.host;
        let classes = &*host.classes;
        match target.kind {
            Kind::Native => {
                if target.is_meta_type {
                    classes.is_parent_class(&src_native, NATIVE_CLASS_META)
                } else {
                    classes.is_parent_class(&src_native, &target.native_type)
                }
            }
            Kind::Script => {
                let Some(target_script) = &target.script_type else {
                    return false;
                };
                if target.is_meta_type {
                    return classes.is_parent_class(&src_native, target_script.resource_class());
                }
                src_script.is_some_and(|script| script.inherits(target_script))
            }
            Kind::Class => {
                if target.is_meta_type {
                    return classes.is_parent_class(&src_native, SCRIPT_CLASS_META);
                }
                let Some(target_class) = &target.class_type else {
                    return false;
                };
                // Base chains are acyclic once inheritance resolved.
                while let Some(handle) = src_class {
                    if handle.id == target_class.id || handle.fqcn == target_class.fqcn {
                        return true;
                    }
                    src_class = self.pool.class(handle.id).base_type.class_type.clone();
                }
                false
            }
            Kind::Variant | Kind::Builtin | Kind::Enum | Kind::Resolving | Kind::Unresolved => false,
        }
    }

    /// Forget the inferred type of the declaration behind an identifier that
    /// was just reassigned with an incompatible weak value.
    pub(crate) fn downgrade_node_type_source(&mut self, expr: ExprId) {
        let identifier = match &self.tree()[expr].kind {
            ExprKind::Identifier(_) => Some(expr),
            ExprKind::Subscript {
                index: SubscriptIndex::Attribute(attribute),
                ..
            } => Some(*attribute),
            _ => None,
        };
        let Some(identifier) = identifier else {
            return;
        };
        let Some(source) = self.tree().identifier(identifier).map(|i| i.source) else {
            return;
        };

        let variant = DataType {
            kind: Kind::Variant,
            ..Default::default()
        };
        match source {
            IdentifierSource::MemberVariable(variable) => {
                self.pool.tree_mut(variable.parser)[variable.id].decl.data_type = variant;
            }
            IdentifierSource::FunctionParameter(parameter) => {
                self.tree_mut()[parameter].decl.data_type = variant;
            }
            IdentifierSource::LocalVariable(variable) => {
                self.tree_mut()[variable].decl.data_type = variant;
            }
            IdentifierSource::LocalIterator(iterator) => {
                self.tree_mut()[iterator].data_type = variant;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::types::{make_enum_type, make_native_meta_type};
    use orchestrator_core::TypeSource;
    use orchestrator_parser::{ScriptPool, TreeBuilder};
    use orchestrator_registry::Host;

    fn hard(ty: VariantType) -> DataType {
        DataType::builtin(ty, TypeSource::AnnotatedExplicit)
    }

    fn with_analyzer(f: impl FnOnce(&mut Analyzer<'_>)) {
        let mut pool = ScriptPool::new();
        let id = pool.insert(TreeBuilder::new("res://a.os").build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);
        f(&mut analyzer);
    }

    #[test]
    fn variant_accepts_everything() {
        with_analyzer(|a| {
            assert!(a.check_type_compatibility(&DataType::variant(), &hard(VariantType::Int), false));
            assert!(a.check_type_compatibility(&hard(VariantType::Int), &DataType::variant(), false));
        });
    }

    #[test]
    fn builtin_conversions() {
        with_analyzer(|a| {
            let int = hard(VariantType::Int);
            let float = hard(VariantType::Float);
            let string = hard(VariantType::String);
            assert!(a.check_type_compatibility(&int, &int, false));
            assert!(a.check_type_compatibility(&float, &int, true));
            assert!(!a.check_type_compatibility(&float, &int, false));
            assert!(!a.check_type_compatibility(&string, &int, true));
        });
    }

    #[test]
    fn typed_arrays_compare_elements() {
        with_analyzer(|a| {
            let mut ints = hard(VariantType::Array);
            ints.set_container_element_type(0, hard(VariantType::Int));
            let mut strings = hard(VariantType::Array);
            strings.set_container_element_type(0, hard(VariantType::String));
            let untyped = hard(VariantType::Array);
            assert!(!a.check_type_compatibility(&ints, &strings, true));
            assert!(a.check_type_compatibility(&ints, &untyped, true));
            assert!(a.check_type_compatibility(&untyped, &ints, true));
        });
    }

    #[test]
    fn enums_and_ints() {
        with_analyzer(|a| {
            let mode = make_enum_type("Mode", "Node", false);
            let other = make_enum_type("Side", "", false);
            assert!(a.check_type_compatibility(&mode, &hard(VariantType::Int), false));
            assert!(a.check_type_compatibility(&hard(VariantType::Int), &mode, false));
            assert!(!a.check_type_compatibility(&mode, &other, false));
        });
    }

    #[test]
    fn int_into_enum_warns() {
        with_analyzer(|a| {
            let mode = make_enum_type("Mode", "Node", false);
            let class = NodeId::Class(orchestrator_parser::Tree::HEAD);
            assert!(a.is_type_compatible(&mode, &hard(VariantType::Int), true, Some(class)));
            assert_eq!(a.script().warnings.len(), 1);
            assert_eq!(a.script().warnings[0].code, WarningCode::IntAsEnumWithoutCast);
        });
    }

    #[test]
    fn native_ancestry_is_asymmetric() {
        with_analyzer(|a| {
            let node = DataType::native("Node", TypeSource::AnnotatedExplicit);
            let sprite = DataType::native("Sprite2D", TypeSource::AnnotatedExplicit);
            assert!(a.check_type_compatibility(&node, &sprite, false));
            assert!(!a.check_type_compatibility(&sprite, &node, false));
            assert!(a.check_type_compatibility(&node, &hard(VariantType::Nil), false));
            assert!(!a.check_type_compatibility(&node, &make_native_meta_type("Node"), false));
        });
    }
}
