//! Member resolution: the declared type of one class member.
//!
//! Members resolve on demand, from the interface pass or from any lookup that
//! reaches them first. The member's type cache doubles as the re-entry guard;
//! values of unnamed enums use their own `resolving`/`resolved` flags because
//! they share the enum's type.

use orchestrator_core::{
    ClassRef, DataType, EnumId, MethodInfo, NodeId, SignalId, Variant, VariableId, WarningCode,
};
use orchestrator_parser::{ExprKind, Member};
use orchestrator_parser::ast::SubscriptIndex;

use crate::context::Analyzer;
use crate::lookup::member_node;
use crate::types::{make_class_enum_type, make_signal_type, type_from_metatype, UNNAMED_ENUM};

impl Analyzer<'_> {
    /// Resolve the member of `class` called `name`, if there is one.
    pub(crate) fn resolve_class_member_by_name(&mut self, class: ClassRef, name: &str, source: Option<NodeId>) {
        if let Some(index) = self.pool.class(class).member_index(name) {
            self.resolve_class_member(class, index, source);
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn resolve_class_member(&mut self, class: ClassRef, index: usize, source: Option<NodeId>) {
        let member = self.pool.class(class).members[index];
        let report_on = source.unwrap_or(if self.owns(class) {
            member_node(member, class)
        } else {
            NodeId::Class(self.current_class)
        });

        let name = self.pool.tree(class.parser).member_name(member).to_string();
        if let Member::EnumValue(enum_id, value) = member {
            let value = &self.pool.tree(class.parser)[enum_id].values[value];
            if value.resolving {
                self.push_error(format!(r#"Could not resolve member "{name}": Cyclic reference."#), report_on);
                return;
            }
            if value.resolved {
                return;
            }
        } else {
            let Some(data_type) = self.pool.tree(class.parser).member_data_type(member) else {
                return;
            };
            if data_type.is_resolving() {
                self.push_error(format!(r#"Could not resolve member "{name}": Cyclic reference."#), report_on);
                return;
            }
            if data_type.is_set() {
                return;
            }
        }

        if !self.pool.class(class).base_type.is_resolving() {
            let _ = self.resolve_class_inheritance(class, source);
        }

        if !self.owns(class) {
            let before = self.pool[class.parser].error_count();
            self.delegate(class.parser, |analyzer| analyzer.resolve_class_member(class, index, None));
            if self.pool[class.parser].error_count() > before {
                self.push_error(format!(r#"Could not resolve external class member "{name}"."#), report_on);
            }
            return;
        }

        tracing::trace!(member = %name, kind = member.type_name(), "resolving member");
        let saved_class = self.current_class;
        let saved_static = self.static_context;
        self.current_class = class.id;

        match member {
            Member::Variable(id) => self.resolve_member_variable(class, id),
            Member::Constant(id) => {
                self.check_class_member_name_conflict(class, &name, id.into(), false);
                self.tree_mut()[id].decl.data_type = DataType::resolving();
                self.resolve_constant(id, false);
            }
            Member::Signal(id) => self.resolve_member_signal(class, id),
            Member::Enum(id) => self.resolve_member_enum(class, id),
            Member::Function(id) => {
                self.resolve_function_annotations(id);
                self.resolve_function_signature(id, source, false);
            }
            Member::EnumValue(id, value) => self.resolve_member_enum_value(class, id, value),
            Member::Class(id) => {
                self.check_class_member_name_conflict(class, &name, id.into(), false);
                let inner = ClassRef::new(class.parser, id);
                if !self.pool.class(inner).base_type.is_resolving() {
                    let _ = self.resolve_class_inheritance(inner, source);
                }
            }
            Member::Group(_) => {}
        }

        self.current_class = saved_class;
        self.static_context = saved_static;
    }

    fn resolve_member_variable(&mut self, class: ClassRef, id: VariableId) {
        let name = self.tree()[id].decl.name().to_string();
        self.static_context = self.tree()[id].is_static;
        self.check_class_member_name_conflict(class, &name, id.into(), false);
        self.tree_mut()[id].decl.data_type = DataType::resolving();
        self.resolve_variable(id, false);
        self.resolve_pending_lambdas();
        self.apply_variable_annotations(id);
        let default_value = self.make_variable_default_value(id);
        self.tree_mut()[id].default_value = default_value;

        let variable = &self.tree()[id];
        if variable.is_static || variable.onready {
            return;
        }
        let Some(initializer) = variable.decl.initializer else {
            return;
        };
        if let Some(symbol) = self.get_node_symbol(initializer) {
            self.push_warning(id, WarningCode::GetNodeDefaultWithoutOnready, &[symbol]);
        }
    }

    /// `$` or `get_node()` when the expression (possibly under a cast) fetches
    /// a node from the scene tree.
    fn get_node_symbol(&self, expr: orchestrator_core::ExprId) -> Option<&'static str> {
        let tree = self.tree();
        let expr = match &tree[expr].kind {
            ExprKind::Cast { operand, .. } => *operand,
            _ => expr,
        };
        match &tree[expr].kind {
            ExprKind::GetNode { .. } => Some("$"),
            ExprKind::Call {
                callee: Some(callee),
                function_name,
                ..
            } if function_name == "get_node" => match &tree[*callee].kind {
                ExprKind::Identifier(_) => Some("get_node()"),
                ExprKind::Subscript {
                    base,
                    index: SubscriptIndex::Attribute(_),
                } if matches!(tree[*base].kind, ExprKind::SelfRef) => Some("get_node()"),
                _ => None,
            },
            _ => None,
        }
    }

    fn resolve_member_signal(&mut self, class: ClassRef, id: SignalId) {
        let name = self.tree()[id].identifier.name.clone();
        self.check_class_member_name_conflict(class, &name, id.into(), false);

        let mut info = MethodInfo::new(name);
        for parameter in self.tree()[id].parameters.clone() {
            let spec = self.tree()[parameter].decl.datatype_specifier;
            let parameter_name = self.tree()[parameter].decl.name().to_string();
            let ty = match spec {
                Some(spec) => type_from_metatype(&self.resolve_datatype(Some(spec))),
                None => {
                    self.push_warning(parameter, WarningCode::UntypedDeclaration, &["Parameter", &parameter_name]);
                    DataType::variant()
                }
            };
            info.arguments.push(ty.to_property_info(&parameter_name));
            self.tree_mut()[parameter].decl.data_type = ty;
        }

        let signal = &mut self.tree_mut()[id];
        signal.data_type = make_signal_type(info.clone());
        signal.method_info = info;
    }

    fn resolve_member_enum(&mut self, class: ClassRef, id: EnumId) {
        let name = self.tree()[id].name().to_string();
        self.check_class_member_name_conflict(class, &name, id.into(), false);
        self.tree_mut()[id].data_type = DataType::resolving();

        let handle = self.class_handle(class);
        let path = self.script().path.clone();
        let mut enum_type = make_class_enum_type(&name, handle, &path, true);

        let saved_enum = self.current_enum.replace(id);
        let mut dictionary = orchestrator_core::Dictionary::new();
        for index in 0..self.tree()[id].values.len() {
            let value = self.enum_value(id, index);
            let value_name = self.tree()[id].values[index].identifier.name.clone();
            let slot = &mut self.tree_mut()[id].values[index];
            if let Some(value) = value {
                slot.value = value;
                slot.resolved = true;
            }
            let value = slot.value;
            enum_type.enum_values.insert(value_name.clone(), value);
            dictionary.insert(Variant::String(value_name), Variant::Int(value));
        }
        self.current_enum = saved_enum;

        dictionary.read_only = true;
        let node = &mut self.tree_mut()[id];
        node.dictionary = dictionary;
        node.data_type = enum_type;
    }

    /// The value of enum entry `index`: its reduced custom value, or one past
    /// the previous entry. `None` when the custom value is not an integer
    /// constant; the entry then stays unresolved.
    fn enum_value(&mut self, id: EnumId, index: usize) -> Option<i64> {
        let Some(custom) = self.tree()[id].values[index].custom_value else {
            return Some(match index.checked_sub(1) {
                Some(previous) => self.tree()[id].values[previous].value + 1,
                None => 0,
            });
        };
        // An invalid value stays unresolved; it is reported on the first
        // reduction only.
        let first_reduction = !self.tree()[custom].reduced;
        self.reduce_expression(custom, false);
        let expr = &self.tree()[custom];
        if !expr.is_constant {
            if first_reduction {
                self.push_error("Enum values must be constant.", custom);
            }
            return None;
        }
        match expr.reduced_value {
            Variant::Int(value) => Some(value),
            _ => {
                if first_reduction {
                    self.push_error("Enum values must be integers.", custom);
                }
                None
            }
        }
    }

    fn resolve_member_enum_value(&mut self, class: ClassRef, id: EnumId, index: usize) {
        let name = self.tree()[id].values[index].identifier.name.clone();
        let node = NodeId::EnumValue(id, index);
        self.check_class_member_name_conflict(class, &name, node, false);
        self.tree_mut()[id].values[index].resolving = true;

        let value = if self.tree()[id].values[index].custom_value.is_some() {
            let saved_enum = self.current_enum.replace(id);
            let value = self.enum_value(id, index);
            self.current_enum = saved_enum;
            value
        } else if let Some(previous) = index.checked_sub(1) {
            let previous_name = self.tree()[id].values[previous].identifier.name.clone();
            self.resolve_class_member_by_name(class, &previous_name, Some(node));
            Some(self.tree()[id].values[previous].value + 1)
        } else {
            Some(0)
        };

        let handle = self.class_handle(class);
        let path = self.script().path.clone();
        let enum_node = &mut self.tree_mut()[id];
        let slot = &mut enum_node.values[index];
        if let Some(value) = value {
            slot.value = value;
            slot.resolved = true;
        }
        slot.resolving = false;
        let value = slot.value;
        if !enum_node.data_type.is_set() {
            enum_node.data_type = make_class_enum_type(UNNAMED_ENUM, handle, &path, false);
        }
        enum_node.data_type.enum_values.insert(name.clone(), value);
        enum_node.dictionary.insert(Variant::String(name.clone()), Variant::Int(value));

        self.is_shadowing(&name, node, "enum member", false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use orchestrator_core::{Kind, VariantType};
    use orchestrator_parser::{BinaryOp, ScriptPool, Tree, TreeBuilder};
    use orchestrator_parser::builder::{ParamDecl, VarDecl};
    use orchestrator_registry::Host;

    fn with_analyzer(b: TreeBuilder, f: impl FnOnce(&mut Analyzer<'_>)) {
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);
        let _ = analyzer.resolve_inheritance();
        f(&mut analyzer);
    }

    fn resolve(a: &mut Analyzer<'_>, name: &str) {
        let head = a.class_ref(Tree::HEAD);
        a.resolve_class_member_by_name(head, name, None);
    }

    #[test]
    fn enum_values_count_from_previous() {
        let mut b = TreeBuilder::new("res://a.os");
        let ten = b.lit(10);
        let state = b.enumeration(Some("State"), &[("IDLE", None), ("RUN", Some(ten)), ("JUMP", None)]);
        with_analyzer(b, |a| {
            resolve(a, "State");
            let node = &a.tree()[state];
            assert!(node.data_type.is_meta_type);
            assert_eq!(node.data_type.enum_values.get("IDLE"), Some(&0));
            assert_eq!(node.data_type.enum_values.get("JUMP"), Some(&11));
            assert!(node.dictionary.read_only);
            assert_eq!(a.error_count(), 0);
        });
    }

    #[test]
    fn enum_values_must_be_integer_constants() {
        let mut b = TreeBuilder::new("res://a.os");
        let text = b.lit("x");
        b.enumeration(Some("Bad"), &[("A", Some(text))]);
        with_analyzer(b, |a| {
            resolve(a, "Bad");
            assert_eq!(a.script().errors[0].message, "Enum values must be integers.");
        });
    }

    #[test]
    fn unnamed_enum_values_resolve_on_demand() {
        let mut b = TreeBuilder::new("res://a.os");
        let first = b.ident("FIRST");
        let one = b.lit(1);
        let sum = b.binary(BinaryOp::Add, first, one);
        let values = b.enumeration(None, &[("FIRST", None), ("SECOND", Some(sum)), ("THIRD", None)]);
        with_analyzer(b, |a| {
            resolve(a, "FIRST");
            resolve(a, "SECOND");
            resolve(a, "THIRD");
            let node = &a.tree()[values];
            let resolved: Vec<_> = node.values.iter().map(|value| value.value).collect();
            assert_eq!(resolved, vec![0, 1, 2]);
            assert!(node.values.iter().all(|value| value.resolved));
            assert_eq!(node.data_type.kind, Kind::Enum);
            assert!(!node.data_type.is_meta_type);
            assert_eq!(a.error_count(), 0);
        });
    }

    #[test]
    fn enum_value_used_before_declaration() {
        let mut b = TreeBuilder::new("res://a.os");
        let first = b.ident("FIRST");
        let one = b.lit(1);
        let sum = b.binary(BinaryOp::Add, first, one);
        let values = b.enumeration(None, &[("FIRST", None), ("SECOND", Some(sum)), ("THIRD", None)]);
        with_analyzer(b, |a| {
            // THIRD pulls in SECOND, whose value reads FIRST before it resolved.
            resolve(a, "THIRD");
            assert_eq!(
                a.script().errors[0].message,
                "Cannot use another enum element before it was declared."
            );
            let node = &a.tree()[values];
            assert!(!node.values[1].resolved);
            assert!(node.values[2].resolved);
            assert_eq!(node.values[2].value, 1);
        });
    }

    #[test]
    fn invalid_enum_value_stays_unresolved() {
        let mut b = TreeBuilder::new("res://a.os");
        let text = b.lit("x");
        let first = b.ident("FIRST");
        let one = b.lit(1);
        let sum = b.binary(BinaryOp::Add, first, one);
        let values = b.enumeration(None, &[("FIRST", Some(text)), ("SECOND", Some(sum))]);
        with_analyzer(b, |a| {
            resolve(a, "FIRST");
            assert!(!a.tree()[values].values[0].resolved);
            resolve(a, "SECOND");
            let messages: Vec<_> = a.script().errors.iter().map(|error| error.message.as_str()).collect();
            assert_eq!(messages[0], "Enum values must be integers.");
            assert!(messages.contains(&"Cannot use another enum element before it was declared."));

            let count = a.error_count();
            resolve(a, "FIRST");
            assert_eq!(a.error_count(), count);
        });
    }

    #[test]
    fn signal_parameters() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let hit = b.signal("hit", vec![ParamDecl::new("damage").typed(int), ParamDecl::new("source")]);
        with_analyzer(b, |a| {
            resolve(a, "hit");
            let signal = &a.tree()[hit];
            assert_eq!(signal.method_info.arguments.len(), 2);
            assert_eq!(signal.method_info.arguments[0].ty, VariantType::Int);
            assert!(signal.method_info.arguments[1].is_variant());
            assert!(signal.data_type.is_builtin(VariantType::Signal));
        });
    }

    #[test]
    fn member_shadowing_native_property() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Node2D"]);
        let one = b.lit(1);
        b.variable(VarDecl::new("position").init(one));
        with_analyzer(b, |a| {
            resolve(a, "position");
            assert!(a.script().errors[0].message.contains("native class 'Node2D'"));
        });
    }

    #[test]
    fn get_node_default_needs_onready() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Node"]);
        let node = b.get_node("Label");
        b.variable(VarDecl::new("label").init(node));
        with_analyzer(b, |a| {
            resolve(a, "label");
            // Reported at error level unless configured otherwise.
            assert!(!a.script().warnings.iter().any(|w| w.code == WarningCode::GetNodeDefaultWithoutOnready));
            assert!(
                a.script().errors[0]
                    .message
                    .contains("won't return nodes in the scene tree before \"_ready()\" is called")
            );
        });
    }

    #[test]
    fn self_referencing_constant_is_cyclic() {
        let mut b = TreeBuilder::new("res://a.os");
        let own = b.ident("LOOP");
        b.constant(VarDecl::new("LOOP").init(own));
        with_analyzer(b, |a| {
            resolve(a, "LOOP");
            assert!(a
                .script()
                .errors
                .iter()
                .any(|e| e.message == r#"Could not resolve member "LOOP": Cyclic reference."#));
        });
    }
}
