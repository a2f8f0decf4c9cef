//! Attribute access (`base.name`) and indexing (`base[index]`).

use orchestrator_core::{DataType, ExprId, Kind, NodeId, ObjectRef, TypeSource, Variant, VariantType, WarningCode};
use orchestrator_parser::{ExprKind, SubscriptIndex};

use crate::context::Analyzer;
use crate::lookup::MemberLookup;
use crate::types::{make_global_enum_type, type_from_metatype, ENUM_SEPARATOR};

/// A `Variant` carrying no type information.
fn unknown() -> DataType {
    DataType {
        kind: Kind::Variant,
        ..Default::default()
    }
}

impl Analyzer<'_> {
    pub(super) fn reduce_subscript(&mut self, expr: ExprId, can_be_pseudo: bool) {
        let ExprKind::Subscript { base, index } = self.tree()[expr].kind else {
            return;
        };

        match self.tree()[base].kind {
            ExprKind::Identifier(_) => self.reduce_identifier_expression(base, true, false),
            ExprKind::Subscript { .. } => self.reduce_subscript_expression(base, true),
            _ => self.reduce_expression(base, false),
        }

        let result = match index {
            SubscriptIndex::Attribute(attribute) => self.reduce_attribute(expr, base, attribute, can_be_pseudo),
            SubscriptIndex::Index(index) => self.reduce_index(expr, base, index),
        };
        self.set_expression_type(expr, result);
    }

    fn reduce_attribute(&mut self, expr: ExprId, base: ExprId, attribute: ExprId, can_be_pseudo: bool) -> DataType {
        let name = self.tree().identifier_name(attribute).to_string();
        let base_node = &self.tree()[base];
        let base_type = base_node.data_type.clone();
        let base_is_constant = base_node.is_constant;
        let base_value = base_node.reduced_value.clone();
        let errors_before = self.error_count();

        let mut valid = false;
        let mut result = DataType::default();

        // A constant value is asked directly; a constant script goes through
        // its meta type so class members resolve.
        if base_is_constant && !base_type.is_meta_type {
            if let Variant::Object(Some(ObjectRef::Script(_))) = &base_value {
                let meta = self.type_from_variant(&base_value, expr.into());
                if let Some(found) = self.lookup_attribute(attribute, &name, &meta) {
                    if found.data_type.is_set() {
                        valid = !found.data_type.is_pseudo_type || can_be_pseudo;
                        result = found.data_type.clone();
                        if let Some(value) = found.value {
                            self.set_constant(expr, value);
                        }
                    }
                }
                if !valid {
                    self.tree_mut()[attribute].data_type = DataType::default();
                }
            } else if let Some(value) = self.host.values.get_named(&base_value, &name) {
                result = self.type_from_variant(&value, expr.into());
                self.set_constant(expr, value);
                valid = true;
            }
        }

        if valid {
            // Folded above.
        } else if base_type.is_variant() || !base_type.is_hard_type() {
            valid = !base_type.is_pseudo_type || can_be_pseudo;
            result = unknown();
            let pseudo_base = base_type.is_variant()
                && base_type.is_hard_type()
                && base_type.is_meta_type
                && base_type.is_pseudo_type;
            if pseudo_base {
                // `Variant.Type` and friends: global enums under a pseudo base.
                let base_name = self.tree().identifier_name(base).to_string();
                let enum_name = format!("{base_name}{ENUM_SEPARATOR}{name}");
                if !base_name.is_empty() && self.host.classes.global_enum(&enum_name).is_some() {
                    result = make_global_enum_type(&*self.host.classes, &enum_name, "", true);
                } else {
                    valid = false;
                    self.mark_unsafe(expr);
                }
            } else {
                self.mark_unsafe(expr);
            }
        } else {
            match self.lookup_attribute(attribute, &name, &base_type) {
                Some(found) if found.data_type.is_set() => {
                    if base_type.builtin_type == VariantType::Dictionary && base_type.has_container_element_types() {
                        let key = base_type.get_container_element_type_or_variant(0).builtin_type;
                        valid = matches!(key, VariantType::Nil | VariantType::String | VariantType::StringName);
                        result = match base_type.get_container_element_type(1) {
                            Some(element) => DataType {
                                type_source: base_type.type_source,
                                ..element.clone()
                            },
                            None => DataType::undetected_variant(),
                        };
                    } else {
                        valid = !found.data_type.is_pseudo_type || can_be_pseudo;
                        result = found.data_type;
                        if let Some(value) = found.value {
                            self.set_constant(expr, value);
                        }
                    }
                }
                _ if !base_type.is_meta_type || !base_type.is_constant => {
                    valid = base_type.kind != Kind::Builtin;
                    if valid {
                        let shown = base_type.to_string();
                        self.push_warning(expr, WarningCode::UnsafePropertyAccess, &[&name, &shown]);
                    }
                    result = unknown();
                    self.mark_unsafe(expr);
                }
                _ => {}
            }
        }

        if !valid {
            // A failed lookup on a hard base already said why.
            if self.error_count() == errors_before {
                let attribute_type = &self.tree()[attribute].data_type;
                let is_pseudo = attribute_type.is_pseudo_type || result.is_pseudo_type;
                let shown = type_from_metatype(&base_type).to_string();
                let message = if !can_be_pseudo && is_pseudo {
                    format!(r#"Type "{name}" in base "{shown}" cannot be used on its own."#)
                } else {
                    format!(r#"Cannot find member "{name}" in base "{shown}"."#)
                };
                self.push_error(message, attribute);
            } else {
                self.mark_unsafe(attribute);
            }
            result = unknown();
        }
        result
    }

    /// Look `name` up on `base` and record what was found on the attribute
    /// identifier.
    pub(super) fn lookup_attribute(&mut self, attribute: ExprId, name: &str, base: &DataType) -> Option<MemberLookup> {
        let found = self.lookup_member(name, Some(base), NodeId::Expr(attribute))?;
        let node = &mut self.tree_mut()[attribute];
        node.data_type = found.data_type.clone();
        if let Some(value) = &found.value {
            node.is_constant = true;
            node.reduced_value = value.clone();
        }
        if let Some(identifier) = node.identifier_mut() {
            identifier.source = found.source;
            identifier.function_source_is_static = found.function_source_is_static;
        }
        Some(found)
    }

    fn reduce_index(&mut self, expr: ExprId, base: ExprId, index: ExprId) -> DataType {
        self.reduce_expression(index, false);

        let base_node = &self.tree()[base];
        let index_node = &self.tree()[index];
        if base_node.is_constant && index_node.is_constant {
            let base_value = base_node.reduced_value.clone();
            let index_value = index_node.reduced_value.clone();
            return match self.host.values.get_indexed(&base_value, &index_value) {
                Some(value) => {
                    let data_type = self.type_from_variant(&value, expr.into());
                    self.set_constant(expr, value);
                    data_type
                }
                None => {
                    self.push_error(format!(r#"Cannot get index "{index_value}" from "{base_value}"."#), index);
                    unknown()
                }
            };
        }

        let mut base_type = base_node.data_type.clone();
        let mut index_type = index_node.data_type.clone();
        if !index_type.is_set() {
            index_type = DataType::builtin(VariantType::Nil, TypeSource::Undetected);
        }

        if base_type.is_variant() {
            self.mark_unsafe(expr);
            return unknown();
        }

        if base_type.kind == Kind::Builtin && !index_type.is_variant() {
            let error = if index_type.kind != Kind::Builtin && base_type.builtin_type != VariantType::Dictionary {
                true
            } else {
                !self.is_valid_index(&base_type, &index_type)
            };
            if error {
                self.push_error(
                    format!(r#"Invalid index type "{index_type}" for a base of type "{base_type}"."#),
                    index,
                );
            }
        } else if base_type.kind != Kind::Builtin
            && !index_type.is_variant()
            && !matches!(index_type.builtin_type, VariantType::String | VariantType::StringName)
        {
            self.push_error(
                format!(
                    r#"Only "String" or "StringName" can be used as index for type "{base_type}", but received "{index_type}"."#
                ),
                index,
            );
        }

        let source = if base_type.is_hard_type() {
            TypeSource::AnnotatedInferred
        } else {
            TypeSource::Inferred
        };
        let shown_base = base_type.to_string();
        if base_type.kind != Kind::Builtin {
            base_type.builtin_type = VariantType::Object;
        }

        use VariantType as T;
        let element = match base_type.builtin_type {
            T::Rid | T::Bool | T::Callable | T::Float | T::Int | T::Nil | T::NodePath | T::Signal | T::StringName => {
                self.push_error(
                    format!(r#"Cannot use subscript operator on a base of type "{shown_base}"."#),
                    base,
                );
                return unknown();
            }
            ty if ty.is_packed_array() => ty.packed_element_type(),
            T::Vector2i | T::Vector3i | T::Vector4i => Some(T::Int),
            T::Vector2 | T::Vector3 | T::Vector4 | T::Quaternion => Some(T::Float),
            T::String => Some(T::String),
            T::Transform2D | T::Rect2 => Some(T::Vector2),
            T::Rect2i => Some(T::Vector2i),
            T::Aabb | T::Basis => Some(T::Vector3),
            T::Transform3D | T::Projection | T::Plane | T::Color | T::Object => None,
            T::Array | T::Dictionary => {
                let slot = usize::from(base_type.builtin_type == T::Dictionary);
                return match base_type.get_container_element_type(slot) {
                    Some(element) => DataType {
                        type_source: base_type.type_source,
                        ..element.clone()
                    },
                    None => unknown(),
                };
            }
            _ => None,
        };
        match element {
            Some(ty) => DataType::builtin(ty, source),
            None => DataType {
                kind: Kind::Variant,
                type_source: source,
                ..Default::default()
            },
        }
    }

    /// Whether a builtin `base` accepts `index`.
    fn is_valid_index(&self, base: &DataType, index: &DataType) -> bool {
        use VariantType as T;
        let ty = index.builtin_type;
        let is_number = matches!(ty, T::Int | T::Float);
        let is_string = matches!(ty, T::String | T::StringName);
        match base.builtin_type {
            T::Array | T::String => is_number,
            packed if packed.is_packed_array() => is_number,
            T::Rect2 | T::Rect2i | T::Plane | T::Quaternion | T::Aabb | T::Object => is_string,
            T::Basis
            | T::Vector2
            | T::Vector2i
            | T::Vector3
            | T::Vector3i
            | T::Vector4
            | T::Vector4i
            | T::Transform2D
            | T::Transform3D
            | T::Projection => is_number || is_string,
            T::Color => ty == T::Int || is_string,
            T::Dictionary => {
                let Some(key) = base.get_container_element_type(0) else {
                    return true;
                };
                match ty {
                    // null stands for an empty object.
                    T::Nil => key.builtin_type == T::Object,
                    T::Object if key.builtin_type == T::Object => self.check_type_compatibility(key, index, false),
                    T::Object => key.builtin_type == T::Nil,
                    T::String | T::StringName => matches!(key.builtin_type, T::String | T::StringName),
                    T::Int => matches!(key.builtin_type, T::Int | T::Float),
                    _ => key.builtin_type == ty,
                }
            }
            // Reported by the result check.
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_core::{Kind, Variant, VariantType, WarningCode, WarningLevel};
    use orchestrator_parser::{FuncDecl, ParamDecl, ScriptParser, ScriptPool, TreeBuilder, VarDecl};
    use orchestrator_registry::Host;

    use crate::config::AnalyzerConfig;
    use crate::context::Analyzer;

    fn analyze_with(config: &AnalyzerConfig, b: TreeBuilder) -> ScriptParser {
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let _ = Analyzer::new(&mut pool, &host, config, id).analyze();
        pool[id].clone()
    }

    fn analyze(b: TreeBuilder) -> ScriptParser {
        analyze_with(&AnalyzerConfig::default(), b)
    }

    fn errors(script: &ScriptParser) -> Vec<&str> {
        script.errors.iter().map(|error| error.message.as_str()).collect()
    }

    #[test]
    fn builtin_constants_fold() {
        let mut b = TreeBuilder::new("res://a.os");
        let vector = b.ident("Vector2");
        let zero = b.attribute(vector, "ZERO");
        b.constant(VarDecl::new("ORIGIN").init(zero));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert!(script.tree[zero].is_constant);
        assert!(script.tree[zero].data_type.is_builtin(VariantType::Vector2));
    }

    #[test]
    fn missing_member_of_hard_base_is_reported_once() {
        let mut b = TreeBuilder::new("res://a.os");
        let vector_type = b.ty("Vector2");
        let read = b.ident("point");
        let missing = b.attribute(read, "w");
        let body = b.suite_of(|b| vec![b.ret(Some(missing))]);
        b.function(
            FuncDecl::new("f")
                .param(ParamDecl::new("point").typed(vector_type))
                .body(body),
        );
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"Cannot find member "w" in base "Vector2"."#]);
    }

    #[test]
    fn vector_components_are_floats() {
        let mut b = TreeBuilder::new("res://a.os");
        let vector_type = b.ty("Vector3");
        let read = b.ident("point");
        let x = b.attribute(read, "x");
        let body = b.suite_of(|b| vec![b.ret(Some(x))]);
        b.function(
            FuncDecl::new("f")
                .param(ParamDecl::new("point").typed(vector_type))
                .body(body),
        );
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert!(script.tree[x].data_type.is_builtin(VariantType::Float));
    }

    #[test]
    fn untyped_base_is_unsafe() {
        let mut b = TreeBuilder::new("res://a.os");
        let read = b.ident("thing");
        let access = b.attribute(read, "anything");
        let body = b.suite_of(|b| vec![b.ret(Some(access))]);
        b.function(FuncDecl::new("f").param(ParamDecl::new("thing")).body(body));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert_eq!(script.tree[access].data_type.kind, Kind::Variant);
        assert!(script.is_unsafe(access.into()));
    }

    #[test]
    fn typed_array_index_yields_element() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let list_type = b.ty_container("Array", vec![int]);
        let list = b.ident("list");
        let zero = b.lit(0);
        let first = b.index(list, zero);
        let body = b.suite_of(|b| vec![b.ret(Some(first))]);
        b.function(
            FuncDecl::new("f")
                .param(ParamDecl::new("list").typed(list_type))
                .body(body),
        );
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert!(script.tree[first].data_type.is_builtin(VariantType::Int));
    }

    #[test]
    fn invalid_index_type() {
        let mut b = TreeBuilder::new("res://a.os");
        let array_type = b.ty("Array");
        let list = b.ident("list");
        let key = b.lit("name");
        let item = b.index(list, key);
        let body = b.suite_of(|b| vec![b.ret(Some(item))]);
        b.function(
            FuncDecl::new("f")
                .param(ParamDecl::new("list").typed(array_type))
                .body(body),
        );
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![r#"Invalid index type "String" for a base of type "Array"."#]
        );
    }

    #[test]
    fn ints_cannot_be_indexed() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let number = b.ident("number");
        let zero = b.lit(0);
        let item = b.index(number, zero);
        let body = b.suite_of(|b| vec![b.ret(Some(item))]);
        b.function(
            FuncDecl::new("f")
                .param(ParamDecl::new("number").typed(int))
                .body(body),
        );
        let script = analyze(b);
        assert!(errors(&script).contains(&r#"Cannot use subscript operator on a base of type "int"."#));
    }

    #[test]
    fn constant_indexing_folds() {
        let mut b = TreeBuilder::new("res://a.os");
        let one = b.lit(1);
        let two = b.lit(2);
        let list = b.array(vec![one, two]);
        b.constant(VarDecl::new("LIST").init(list));
        let read = b.ident("LIST");
        let index = b.lit(1);
        let second = b.index(read, index);
        b.constant(VarDecl::new("SECOND").init(second));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert_eq!(script.tree[second].reduced_value, Variant::Int(2));
    }

    #[test]
    fn native_property_on_untyped_object_warns_when_enabled() {
        let config = AnalyzerConfig::new().with_warning_level(WarningCode::UnsafePropertyAccess, WarningLevel::Warn);

        let mut b = TreeBuilder::new("res://a.os");
        let node_type = b.ty("Node");
        let read = b.ident("node");
        let access = b.attribute(read, "velocity");
        let body = b.suite_of(|b| vec![b.ret(Some(access))]);
        b.function(
            FuncDecl::new("f")
                .param(ParamDecl::new("node").typed(node_type))
                .body(body),
        );
        let script = analyze_with(&config, b);
        assert!(script.warnings.iter().any(|w| w.code == WarningCode::UnsafePropertyAccess));
    }
}
