//! Member lookup against a base type.
//!
//! [`Analyzer::lookup_member`] answers "what is `base.name`" for every kind of
//! base: enums, builtin values and their meta types, script classes (walking
//! bases before outer classes), foreign scripts and native classes. Identifier
//! and attribute reduction, nested type names and extends chains all go
//! through it.

use orchestrator_core::{
    ClassRef, DataType, Kind, NodeId, NodeRef, ObjectRef, ScriptRef, TypeSource, Variant, VariantType,
};
use orchestrator_parser::{IdentifierSource, Member};

use crate::context::Analyzer;
use crate::types::{make_builtin_enum_type, make_callable_type, make_native_enum_type, make_signal_type, type_from_metatype};

/// What a member lookup found.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemberLookup {
    pub data_type: DataType,
    pub source: IdentifierSource,
    /// Value of a member known at analysis time.
    pub value: Option<Variant>,
    pub function_source_is_static: bool,
}

impl MemberLookup {
    fn typed(data_type: DataType, source: IdentifierSource) -> Self {
        Self {
            data_type,
            source,
            ..Default::default()
        }
    }

    fn constant(data_type: DataType, source: IdentifierSource, value: Variant) -> Self {
        Self {
            data_type,
            source,
            value: Some(value),
            function_source_is_static: false,
        }
    }
}

/// The value standing for a script class, addressed by its fqcn.
pub(crate) fn class_value(class_type: &DataType) -> Variant {
    let path = class_type
        .class_type
        .as_ref()
        .map_or_else(|| class_type.script_path.clone(), |handle| handle.fqcn.clone());
    Variant::Object(Some(ObjectRef::Script(ScriptRef { path, foreign: None })))
}

/// The node a diagnostic about a member points at.
pub(crate) fn member_node(member: Member, class: ClassRef) -> NodeId {
    match member {
        Member::Class(id) => NodeId::Class(id),
        Member::Constant(id) => NodeId::Constant(id),
        Member::Function(id) => NodeId::Function(id),
        Member::Signal(id) => NodeId::Signal(id),
        Member::Variable(id) => NodeId::Variable(id),
        Member::Enum(id) => NodeId::Enum(id),
        Member::EnumValue(id, index) => NodeId::EnumValue(id, index),
        Member::Group(_) => NodeId::Class(class.id),
    }
}

impl Analyzer<'_> {
    /// `class`, its script bases and its outer classes, bases first and
    /// without duplicates.
    pub(crate) fn current_scope_classes(&self, class: ClassRef) -> Vec<ClassRef> {
        let mut classes = Vec::new();
        self.collect_scope_classes(class, &mut classes);
        classes
    }

    fn collect_scope_classes(&self, class: ClassRef, classes: &mut Vec<ClassRef>) {
        if classes.contains(&class) {
            return;
        }
        classes.push(class);

        let node = self.pool.class(class);
        let base = (node.base_type.kind == Kind::Class)
            .then(|| node.base_type.class_type.as_ref().map(|handle| handle.id))
            .flatten();
        let outer = node.outer.map(|outer| ClassRef::new(class.parser, outer));
        if let Some(base) = base {
            self.collect_scope_classes(base, classes);
        }
        if let Some(outer) = outer {
            self.collect_scope_classes(outer, classes);
        }
    }

    /// Look `name` up on `base`, or on the current class scope when `base`
    /// is `None`. Returns `None` when nothing matched; errors are only
    /// reported for hard typed bases.
    pub(crate) fn lookup_member(&mut self, name: &str, base: Option<&DataType>, source: NodeId) -> Option<MemberLookup> {
        let explicit_base = base.is_some();
        let base = match base {
            Some(base) => base.clone(),
            None => self.current_class_instance_type(),
        };

        match base.kind {
            Kind::Enum => return self.lookup_enum_member(name, &base, source),
            Kind::Builtin => return self.lookup_builtin_member(name, &base, source),
            _ => {}
        }

        let mut name = name.to_string();
        let is_constructor = base.is_meta_type && name == "new";

        if let Some(base_class) = base.class_type.as_ref().map(|handle| handle.id) {
            let mut is_base = true;
            for script_class in self.current_scope_classes(base_class) {
                let class_node = self.pool.class(script_class);
                if !explicit_base && class_node.name() == name {
                    let data_type = class_node.data_type.clone();
                    let has_outer = class_node.outer.is_some();
                    let value = class_value(&data_type);
                    let source = if has_outer {
                        IdentifierSource::MemberClass(script_class)
                    } else {
                        IdentifierSource::Undefined
                    };
                    return Some(MemberLookup::constant(data_type, source, value));
                }

                if is_constructor {
                    name = "_init".to_string();
                }

                if class_node.has_member(&name) {
                    self.resolve_class_member_by_name(script_class, &name, Some(source));
                    if let Some(found) = self.class_member_lookup(script_class, &name, &base, is_base, is_constructor) {
                        return Some(found);
                    }
                }

                if is_base {
                    is_base = self.pool.class(script_class).base_type.class_type.is_some();
                    if !is_base && explicit_base {
                        break;
                    }
                }
            }
        }

        if base.class_type.is_none() {
            if let Some(script) = base.script_type.clone() {
                if let Some(property) = script.get_property(&name) {
                    let data_type = self.type_from_property(property, false, false);
                    return Some(MemberLookup::typed(data_type, IdentifierSource::InheritedVariable));
                }
                if let Some(method) = script.get_method(&name) {
                    let is_static = method.is_static();
                    return Some(MemberLookup {
                        function_source_is_static: is_static,
                        ..MemberLookup::typed(make_callable_type(method.clone()), IdentifierSource::InheritedVariable)
                    });
                }
                if let Some(signal) = script.get_signal(&name) {
                    return Some(MemberLookup::typed(
                        make_signal_type(signal.clone()),
                        IdentifierSource::InheritedVariable,
                    ));
                }
                if let Some(constant) = script.get_constant(&name).cloned() {
                    let data_type = self.type_from_variant(&constant, source);
                    return Some(MemberLookup::constant(data_type, IdentifierSource::Undefined, constant));
                }
            }
        }

        self.lookup_native_member(&name, &base, is_constructor, source)
    }

    fn lookup_enum_member(&mut self, name: &str, base: &DataType, source: NodeId) -> Option<MemberLookup> {
        if !base.is_meta_type {
            self.push_error("Cannot get property from enum value.", source);
            return None;
        }
        let value = *base.enum_values.get(name)?;
        Some(MemberLookup::constant(
            type_from_metatype(base),
            IdentifierSource::Undefined,
            Variant::Int(value),
        ))
    }

    fn lookup_builtin_member(&mut self, name: &str, base: &DataType, source: NodeId) -> Option<MemberLookup> {
        let host = self.host;
        let values = &*host.values;
        let ty = base.builtin_type;

        if base.is_meta_type {
            if let Some(constant) = values.constant(ty, name).cloned() {
                let data_type = self.type_from_variant(&constant, source);
                return Some(MemberLookup::constant(data_type, IdentifierSource::Undefined, constant));
            }
            if let Some(enum_name) = values.enum_for_constant(ty, name) {
                let data_type = make_builtin_enum_type(values, enum_name, ty, false);
                let value = data_type.enum_values.get(name).copied().unwrap_or_default();
                return Some(MemberLookup::constant(data_type, IdentifierSource::Undefined, Variant::Int(value)));
            }
            if values.has_enum(ty, name) {
                return Some(MemberLookup::typed(
                    make_builtin_enum_type(values, name, ty, true),
                    IdentifierSource::Undefined,
                ));
            }
            if base.is_hard_type() {
                self.push_error(format!(r#"Cannot find member "{name}" in base "{base}"."#), source);
            }
            return None;
        }

        match ty {
            VariantType::Nil => {
                if base.is_hard_type() {
                    self.push_error(format!(r#"Cannot get property "{name}" on a null object."#), source);
                }
                None
            }
            VariantType::Dictionary => Some(MemberLookup::typed(DataType::variant(), IdentifierSource::Undefined)),
            _ => {
                if let Some(member) = values.member_type(ty, name) {
                    let data_type = if member == VariantType::Nil {
                        DataType {
                            kind: Kind::Variant,
                            type_source: TypeSource::AnnotatedExplicit,
                            ..Default::default()
                        }
                    } else {
                        DataType::builtin(member, TypeSource::AnnotatedExplicit)
                    };
                    return Some(MemberLookup::typed(data_type, IdentifierSource::Undefined));
                }
                if let Some(method) = values.get_method(ty, name) {
                    return Some(MemberLookup::typed(
                        make_callable_type(method.clone()),
                        IdentifierSource::Undefined,
                    ));
                }
                if base.is_hard_type() {
                    self.push_error(format!(r#"Cannot find member "{name}" in base "{base}"."#), source);
                }
                None
            }
        }
    }

    /// A resolved member of a script class, if visible from `base`.
    fn class_member_lookup(
        &mut self,
        class: ClassRef,
        name: &str,
        base: &DataType,
        is_base: bool,
        is_constructor: bool,
    ) -> Option<MemberLookup> {
        let member = self.pool.class(class).get_member(name)?;
        let tree = self.pool.tree(class.parser);
        let data_type = tree.member_data_type(member).cloned().unwrap_or_default();

        match member {
            Member::Constant(id) => {
                let value = tree[id]
                    .decl
                    .initializer
                    .map(|init| tree[init].reduced_value.clone())
                    .unwrap_or_default();
                Some(MemberLookup::constant(
                    data_type,
                    IdentifierSource::MemberConstant(NodeRef::new(class.parser, id)),
                    value,
                ))
            }
            Member::EnumValue(id, index) => {
                let value = tree[id].values[index].value;
                Some(MemberLookup::constant(data_type, IdentifierSource::Undefined, Variant::Int(value)))
            }
            Member::Enum(id) => {
                let value = Variant::Dictionary(tree[id].dictionary.clone());
                Some(MemberLookup::constant(data_type, IdentifierSource::Undefined, value))
            }
            Member::Variable(id) => {
                let is_static = tree[id].is_static;
                if !(is_base && (!base.is_meta_type || is_static)) {
                    return None;
                }
                self.pool.tree_mut(class.parser)[id].decl.usages += 1;
                let variable = NodeRef::new(class.parser, id);
                let source = if is_static {
                    IdentifierSource::StaticVariable(variable)
                } else {
                    IdentifierSource::MemberVariable(variable)
                };
                Some(MemberLookup::typed(data_type, source))
            }
            Member::Signal(id) => {
                if !(is_base && !base.is_meta_type) {
                    return None;
                }
                self.pool.tree_mut(class.parser)[id].usages += 1;
                Some(MemberLookup::typed(
                    data_type,
                    IdentifierSource::MemberSignal(NodeRef::new(class.parser, id)),
                ))
            }
            Member::Function(id) => {
                let function = &tree[id];
                if !(is_base && (!base.is_meta_type || function.is_static || is_constructor)) {
                    return None;
                }
                Some(MemberLookup {
                    data_type: make_callable_type(function.info.clone()),
                    source: IdentifierSource::MemberFunction(NodeRef::new(class.parser, id)),
                    value: None,
                    function_source_is_static: function.is_static,
                })
            }
            Member::Class(id) => {
                let value = class_value(&data_type);
                Some(MemberLookup::constant(
                    data_type,
                    IdentifierSource::MemberClass(ClassRef::new(class.parser, id)),
                    value,
                ))
            }
            Member::Group(_) => None,
        }
    }

    fn lookup_native_member(
        &mut self,
        name: &str,
        base: &DataType,
        is_constructor: bool,
        source: NodeId,
    ) -> Option<MemberLookup> {
        let host = self.host;
        let classes = &*host.classes;
        let native = base.native_type.as_str();
        if !classes.class_exists(native) {
            return None;
        }
        let name = if is_constructor { "_init" } else { name };

        if let Some(property) = classes.get_property(native, name) {
            let data_type = self.type_from_property(&property.info, false, property.setter.is_empty());
            return Some(MemberLookup::typed(data_type, IdentifierSource::InheritedVariable));
        }
        if let Some(method) = classes.get_method_info(native, name) {
            return Some(MemberLookup {
                function_source_is_static: method.is_static(),
                ..MemberLookup::typed(make_callable_type(method.clone()), IdentifierSource::InheritedVariable)
            });
        }
        if let Some(signal) = classes.get_signal(native, name) {
            return Some(MemberLookup::typed(
                make_signal_type(signal.clone()),
                IdentifierSource::InheritedVariable,
            ));
        }
        if classes.has_enum(native, name) {
            return Some(MemberLookup::typed(
                make_native_enum_type(classes, name, native, true),
                IdentifierSource::Undefined,
            ));
        }
        let value = classes.get_integer_constant(native, name)?;
        let data_type = match classes.get_integer_constant_enum(native, name) {
            Some(enum_name) => make_native_enum_type(classes, enum_name, native, false),
            None => self.type_from_variant(&Variant::Int(value), source),
        };
        Some(MemberLookup::constant(data_type, IdentifierSource::Undefined, Variant::Int(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use orchestrator_parser::{ScriptPool, Tree, TreeBuilder, VarDecl};
    use orchestrator_registry::Host;

    fn with_analyzer(b: TreeBuilder, f: impl FnOnce(&mut Analyzer<'_>)) {
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);
        let _ = analyzer.resolve_interface();
        f(&mut analyzer);
    }

    const HEAD: NodeId = NodeId::Class(Tree::HEAD);

    #[test]
    fn own_members_come_first() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Node"]);
        let int = b.ty("int");
        b.variable(VarDecl::new("speed").typed(int));
        with_analyzer(b, |a| {
            let found = a.lookup_member("speed", None, HEAD).map(|l| l.data_type.to_string());
            assert_eq!(found.as_deref(), Some("int"));
            let native = a.lookup_member("process_mode", None, HEAD).map(|l| l.data_type.kind);
            assert_eq!(native, Some(Kind::Enum));
            assert!(a.lookup_member("missing", None, HEAD).is_none());
        });
    }

    #[test]
    fn native_constants_fold() {
        let b = TreeBuilder::new("res://a.os");
        with_analyzer(b, |a| {
            let node = crate::types::make_native_meta_type("Node");
            let found = a.lookup_member("NOTIFICATION_READY", Some(&node), HEAD);
            assert!(matches!(found.and_then(|l| l.value), Some(Variant::Int(_))));
        });
    }

    #[test]
    fn builtin_members() {
        let b = TreeBuilder::new("res://a.os");
        with_analyzer(b, |a| {
            let vector = DataType::builtin(VariantType::Vector2, TypeSource::AnnotatedExplicit);
            let x = a.lookup_member("x", Some(&vector), HEAD).map(|l| l.data_type.builtin_type);
            assert_eq!(x, Some(VariantType::Float));
            assert!(a.lookup_member("nope", Some(&vector), HEAD).is_none());
            assert_eq!(a.error_count(), 1);
        });
    }

    #[test]
    fn enum_values_only_on_meta_types() {
        let b = TreeBuilder::new("res://a.os");
        with_analyzer(b, |a| {
            let mut meta = crate::types::make_enum_type("Mode", "", true);
            meta.enum_values.insert("A".into(), 3);
            let found = a.lookup_member("A", Some(&meta), HEAD).and_then(|l| l.value);
            assert_eq!(found, Some(Variant::Int(3)));
            let value = type_from_metatype(&meta);
            assert!(a.lookup_member("A", Some(&value), HEAD).is_none());
            assert_eq!(a.error_count(), 1);
        });
    }

    #[test]
    fn scope_classes_cover_outer_classes() {
        let mut b = TreeBuilder::new("res://a.os");
        let inner = b.begin_class("Inner");
        b.end_class();
        with_analyzer(b, |a| {
            let classes = a.current_scope_classes(ClassRef::new(a.parser, inner));
            assert_eq!(classes.len(), 2);
            assert_eq!(classes[1].id, Tree::HEAD);
        });
    }
}
