//! Resolution of written type annotations.

use orchestrator_core::{ClassRef, DataType, Kind, NodeId, TypeNodeId, TypeSource, VariantType};
use orchestrator_parser::{Member, ParserStatus, Tree};

use crate::context::Analyzer;
use crate::types::{make_builtin_enum_type, make_global_enum_type, make_native_enum_type, type_from_metatype};

/// A builtin type by script name. `Object` names the native class.
pub(crate) fn builtin_type_named(name: &str) -> Option<VariantType> {
    VariantType::from_name(name).filter(|ty| *ty != VariantType::Object)
}

fn bad_type() -> DataType {
    DataType::variant()
}

impl Analyzer<'_> {
    /// Resolve a type annotation to the meta type it names. `None` is the
    /// absent annotation and resolves to an inferred `Variant`.
    ///
    /// Memoized on the node; a failed resolution memoizes the `Variant`
    /// fallback so the diagnostic is reported once.
    pub(crate) fn resolve_datatype(&mut self, type_node: Option<TypeNodeId>) -> DataType {
        let Some(id) = type_node else {
            return bad_type();
        };

        let cached = &self.tree()[id].data_type;
        if cached.is_resolving() {
            self.push_error("Could not resolve datatype: Cyclic reference.", id);
            return bad_type();
        }
        if !cached.has_no_type() {
            return cached.clone();
        }

        self.tree_mut()[id].data_type = DataType::resolving();
        let result = match self.resolve_datatype_uncached(id) {
            Some(result) => result,
            None => bad_type(),
        };
        self.tree_mut()[id].data_type = result.clone();
        result
    }

    fn resolve_datatype_uncached(&mut self, id: TypeNodeId) -> Option<DataType> {
        let node = self.tree()[id].clone();
        let source = NodeId::Type(id);

        let Some(first) = node.type_chain.first().map(|ident| ident.name.clone()) else {
            // void
            return Some(DataType::builtin(VariantType::Nil, TypeSource::AnnotatedExplicit));
        };
        let chain_len = node.type_chain.len();
        let segment = |index: usize| node.type_chain.get(index).map_or("", |ident| ident.name.as_str());

        let mut result = DataType {
            type_source: TypeSource::AnnotatedExplicit,
            ..Default::default()
        };

        let current_native = self.class_node(self.current_class_ref()).base_type.native_type.clone();
        let host = self.host;
        let classes = &*host.classes;

        if first == "Variant" {
            if chain_len == 2 {
                let qualified = format!("Variant.{}", segment(1));
                if classes.global_enum(&qualified).is_some() {
                    return Some(make_global_enum_type(classes, segment(1), "Variant", true));
                }
                self.push_error(format!(r#"Name "{}" is not a nested type of "Variant"."#, segment(1)), source);
                return None;
            }
            if chain_len > 2 {
                self.push_error("Variant only contains enum types, which do not have nested types.", source);
                return None;
            }
            result.kind = Kind::Variant;
        } else if let Some(builtin) = builtin_type_named(&first) {
            if chain_len == 2 {
                let values = &*host.values;
                if values.has_enum(builtin, segment(1)) {
                    return Some(make_builtin_enum_type(values, segment(1), builtin, true));
                }
                self.push_error(format!(r#"Name "{}" is not a nested type of "{first}"."#, segment(1)), source);
                return None;
            }
            if chain_len > 2 {
                self.push_error("Built-in types only contain enum types, which do not have nested types.", source);
                return None;
            }

            result.kind = Kind::Builtin;
            result.builtin_type = builtin;
            let element_slots = match builtin {
                VariantType::Array => 1,
                VariantType::Dictionary => 2,
                _ => 0,
            };
            for slot in 0..element_slots {
                let element = self.resolve_datatype(node.container_type(slot));
                let mut element = type_from_metatype(&element);
                if element.kind != Kind::Variant {
                    element.is_constant = false;
                    result.set_container_element_type(slot, element);
                }
            }
        } else if classes.class_exists(&first) {
            result.kind = Kind::Native;
            result.builtin_type = VariantType::Object;
            result.native_type = first.clone();
        } else if let Some(global) = self.host.project.global_class(&first) {
            let path = global.path.clone();
            if path == self.script().path {
                result = self.class_node(self.class_ref(Tree::HEAD)).data_type.clone();
            } else {
                let parser = self.depended_parser_for(&path);
                match parser {
                    Some(parser) => {
                        if !self.raise_status(parser, ParserStatus::InheritanceSolved) {
                            self.push_error(
                                format!(r#"Could not parse global class "{first}" from "{path}"."#),
                                source,
                            );
                            return None;
                        }
                        result = self.pool.class(ClassRef::new(parser, Tree::HEAD)).data_type.clone();
                    }
                    None => result = self.script_meta_type_for_path(&path, &first, source),
                }
            }
        } else if self.host.project.has_singleton_autoload(&first) {
            let path = self
                .host
                .project
                .autoload(&first)
                .map(|autoload| autoload.path.clone())
                .unwrap_or_default();
            let Some(parser) = self.depended_parser_for(&path) else {
                self.push_error(
                    format!(r#"The referenced autoload "{first}" (from "{path}") could not be loaded."#),
                    source,
                );
                return None;
            };
            if !self.raise_status(parser, ParserStatus::InheritanceSolved) {
                self.push_error(format!(r#"Could not parse singleton "{first}" from "{path}"."#), source);
                return None;
            }
            result = self.pool.class(ClassRef::new(parser, Tree::HEAD)).data_type.clone();
        } else if !current_native.is_empty() && classes.has_enum(&current_native, &first) {
            result = make_native_enum_type(classes, &first, &current_native, true);
        } else if classes.global_enum(&first).is_some() {
            if chain_len > 1 {
                self.push_error("Enums cannot contain nested types.", source);
                return None;
            }
            result = make_global_enum_type(classes, &first, "", true);
        } else {
            result = self.resolve_scope_type(&first, source)?;
        }

        if !result.is_set() {
            self.push_error(format!(r#"Could not find type "{first}" in the current scope."#), source);
            return None;
        }

        if chain_len > 1 {
            result = self.resolve_nested_type(result, &first, &node.type_chain[1..], source)?;
        }

        if !node.container_types.is_empty() {
            let message = match result.builtin_type {
                VariantType::Array if node.container_types.len() != 1 => {
                    Some("Typed arrays require exactly one collection element type.")
                }
                VariantType::Dictionary if node.container_types.len() != 2 => {
                    Some("Typed dictionaries require exactly two collection element types.")
                }
                VariantType::Array | VariantType::Dictionary => None,
                _ => Some("Only arrays and dictionaries can specify collection element types."),
            };
            if let Some(message) = message {
                self.push_error(message, source);
                return None;
            }
        }

        Some(result)
    }

    /// A type declared in the current class, its bases or its outer classes.
    fn resolve_scope_type(&mut self, name: &str, source: NodeId) -> Option<DataType> {
        for script_class in self.current_scope_classes(self.current_class_ref()) {
            let class_node = self.pool.class(script_class);
            if class_node.name() == name {
                return Some(class_node.data_type.clone());
            }
            let Some(member) = class_node.get_member(name) else {
                continue;
            };

            self.resolve_class_member_by_name(script_class, name, Some(source));
            let data_type = self
                .pool
                .tree(script_class.parser)
                .member_data_type(member)
                .cloned()
                .unwrap_or_default();
            return match member {
                Member::Class(_) | Member::Enum(_) => Some(data_type),
                Member::Constant(_) if data_type.is_meta_type => Some(data_type),
                _ => {
                    self.push_error(
                        format!(r#""{name}" is a {} but does not contain a type."#, member.type_name()),
                        source,
                    );
                    None
                }
            };
        }
        Some(DataType::default())
    }

    /// Follow `A.B.C` below an already resolved first segment.
    fn resolve_nested_type(
        &mut self,
        mut result: DataType,
        first: &str,
        rest: &[orchestrator_parser::ast::Ident],
        source: NodeId,
    ) -> Option<DataType> {
        match result.kind {
            Kind::Class => {
                for ident in rest {
                    let base = result.clone();
                    let found = self.lookup_member(&ident.name, Some(&base), source).map(|found| found.data_type);
                    match found {
                        Some(found) if found.is_set() && found.is_meta_type => result = found,
                        Some(found) if found.is_set() => {
                            self.push_error(
                                format!(r#"Member "{}" under base "{base}" is not a valid type."#, ident.name),
                                source,
                            );
                            return None;
                        }
                        _ => {
                            self.push_error(
                                format!(r#"Could not find type "{}" under base "{base}"."#, ident.name),
                                source,
                            );
                            return None;
                        }
                    }
                }
                Some(result)
            }
            Kind::Native => {
                let host = self.host;
                let classes = &*host.classes;
                let name = rest[0].name.as_str();
                if !classes.has_enum(&result.native_type, name) {
                    self.push_error(format!(r#"Could not find type "{name}" in "{first}"."#), source);
                    return None;
                }
                if rest.len() > 1 {
                    self.push_error("Enums cannot contain nested types.", source);
                    return None;
                }
                Some(make_native_enum_type(classes, name, &result.native_type, true))
            }
            _ => {
                self.push_error(
                    format!(r#"Could not find nested type "{}" under base "{result}"."#, rest[0].name),
                    source,
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use orchestrator_parser::{ScriptPool, TreeBuilder};
    use orchestrator_registry::Host;

    fn resolve(b: TreeBuilder, ty: TypeNodeId) -> (DataType, usize) {
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);
        let _ = analyzer.resolve_inheritance();
        let first = analyzer.resolve_datatype(Some(ty));
        let second = analyzer.resolve_datatype(Some(ty));
        assert_eq!(first.to_string(), second.to_string());
        (first, analyzer.error_count())
    }

    #[test]
    fn builtin_and_native_names() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let (ty, errors) = resolve(b, int);
        assert!(ty.is_builtin(VariantType::Int));
        assert_eq!(errors, 0);

        let mut b = TreeBuilder::new("res://a.os");
        let object = b.ty("Object");
        let (ty, _) = resolve(b, object);
        assert_eq!(ty.kind, Kind::Native);
        assert_eq!(ty.native_type, "Object");
    }

    #[test]
    fn typed_containers() {
        let mut b = TreeBuilder::new("res://a.os");
        let string = b.ty("String");
        let int = b.ty("int");
        let dict = b.ty_container("Dictionary", vec![string, int]);
        let (ty, _) = resolve(b, dict);
        assert_eq!(ty.to_string(), "Dictionary[String, int]");

        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let bad = b.ty_container("Vector2", vec![int]);
        let (ty, errors) = resolve(b, bad);
        assert!(ty.is_variant());
        assert_eq!(errors, 1);
    }

    #[test]
    fn nested_enums() {
        let mut b = TreeBuilder::new("res://a.os");
        let mode = b.ty("Node.ProcessMode");
        let (ty, errors) = resolve(b, mode);
        assert_eq!(ty.kind, Kind::Enum);
        assert!(ty.is_meta_type);
        assert_eq!(errors, 0);

        let mut b = TreeBuilder::new("res://a.os");
        let bad = b.ty("Node.Nope");
        let (_, errors) = resolve(b, bad);
        assert_eq!(errors, 1);
    }

    #[test]
    fn script_enums_and_inner_classes() {
        let mut b = TreeBuilder::new("res://a.os");
        b.enumeration(Some("State"), &[("IDLE", None), ("RUN", None)]);
        b.begin_class("Inner");
        b.end_class();
        let state = b.ty("State");
        let inner = b.ty("Inner");
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);
        let _ = analyzer.resolve_inheritance();

        let ty = analyzer.resolve_datatype(Some(state));
        assert_eq!(ty.kind, Kind::Enum);
        assert_eq!(ty.enum_values.get("RUN"), Some(&1));
        let ty = analyzer.resolve_datatype(Some(inner));
        assert_eq!(ty.kind, Kind::Class);
        assert_eq!(analyzer.error_count(), 0);
    }

    #[test]
    fn unknown_type_reports_once() {
        let mut b = TreeBuilder::new("res://a.os");
        let missing = b.ty("Missing");
        let (ty, errors) = resolve(b, missing);
        assert!(ty.is_variant());
        assert_eq!(errors, 1);
    }
}
