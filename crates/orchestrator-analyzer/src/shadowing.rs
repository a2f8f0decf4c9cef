//! Member name conflicts and shadowing warnings.

use orchestrator_core::{ClassRef, Kind, NodeId, VariantType, WarningCode};
use orchestrator_parser::Member;

use crate::context::Analyzer;

impl Analyzer<'_> {
    /// Whether a native class already exposes `name` as a signal, property or
    /// integer constant.
    pub(crate) fn has_member_name_conflict_in_native_type(&self, name: &str, native: &str) -> bool {
        let host = self.host;
        let classes = &*host.classes;
        classes.has_signal(native, name)
            || classes.has_property(native, name)
            || classes.get_integer_constant(native, name).is_some()
            || name == "script"
    }

    /// Whether `class` declares `name` in a way a new member cannot override.
    /// Functions may only be overridden by functions.
    pub(crate) fn has_member_name_conflict_in_script_class(
        &self,
        name: &str,
        class: ClassRef,
        member_is_function: bool,
    ) -> bool {
        match self.pool.class(class).get_member(name) {
            Some(Member::Function(_)) => !member_is_function,
            Some(Member::Group(_)) | None => false,
            Some(_) => true,
        }
    }

    /// Report a clash between a member and its native base. Returns `true`
    /// when a conflict was reported.
    pub(crate) fn check_native_member_name_conflict(&mut self, name: &str, node: NodeId, native: &str) -> bool {
        if self.has_member_name_conflict_in_native_type(name, native) {
            self.push_error(format!("Member \"{name}\" redefined (original in native class '{native}')"), node);
            return true;
        }
        if self.host.classes.class_exists(name) {
            self.push_error(format!(r#"The member "{name}" shadows a native class."#), node);
            return true;
        }
        if VariantType::from_name(name).is_some() {
            self.push_error(
                format!(r#"The member "{name}" cannot have the same name as a builtin type."#),
                node,
            );
            return true;
        }
        false
    }

    /// Report a clash between a member of `class` and its script or native
    /// bases. Returns `true` when a conflict was reported.
    pub(crate) fn check_class_member_name_conflict(
        &mut self,
        class: ClassRef,
        name: &str,
        node: NodeId,
        member_is_function: bool,
    ) -> bool {
        let mut base = self.pool.class(class).base_type.clone();
        while base.kind == Kind::Class {
            let Some(handle) = base.class_type.clone() else {
                break;
            };
            if self.has_member_name_conflict_in_script_class(name, handle.id, member_is_function) {
                let parent = handle.identifier.unwrap_or(handle.fqcn);
                self.push_error(
                    format!(r#"The member "{name}" already exists in parent class {parent}."#),
                    node,
                );
                return true;
            }
            base = self.pool.class(handle.id).base_type.clone();
        }

        if base.kind == Kind::Native && !base.native_type.is_empty() {
            return self.check_native_member_name_conflict(name, node, &base.native_type);
        }
        false
    }

    /// Warn when a declaration hides a global, a member of the current class
    /// or a member of one of its bases.
    pub(crate) fn is_shadowing(&mut self, name: &str, node: NodeId, context: &str, in_local_scope: bool) {
        if !self.config.debug {
            return;
        }

        let global = if self.host.utilities.function(name).is_some() {
            Some("built-in function".to_string())
        } else if self.host.classes.class_exists(name) {
            Some("native class".to_string())
        } else if let Some(class) = self.host.project.global_class(name) {
            let file = class.path.rsplit('/').next().unwrap_or(&class.path);
            Some(format!(r#"global class defined in "{file}""#))
        } else if VariantType::from_name(name).is_some() {
            Some("built-in type".to_string())
        } else {
            None
        };
        if let Some(global) = global {
            self.push_warning(node, WarningCode::ShadowedGlobalIdentifier, &[context, name, &global]);
            return;
        }

        let current_type = self.class_node(self.current_class_ref()).data_type.clone();
        if in_local_scope {
            let mut base_class = current_type.class_type.as_ref().map(|handle| handle.id);
            if let Some(class) = base_class {
                if let Some(member) = self.pool.class(class).get_member(name) {
                    let line = self.pool.tree(class.parser).member_span(member).line.to_string();
                    self.push_warning(node, WarningCode::ShadowedVariable, &[context, name, member.type_name(), &line]);
                    return;
                }
                base_class = self.pool.class(class).base_type.class_type.as_ref().map(|handle| handle.id);
            }

            while let Some(class) = base_class {
                let class_node = self.pool.class(class);
                if let Some(member) = class_node.get_member(name) {
                    let global_name = self.class_handle(class).global_name;
                    let base_name = if global_name.is_empty() {
                        class_node.fqcn.clone()
                    } else {
                        global_name
                    };
                    self.push_warning(
                        node,
                        WarningCode::ShadowedVariableBaseClass,
                        &[context, name, member.type_name(), &base_name],
                    );
                    return;
                }
                base_class = class_node.base_type.class_type.as_ref().map(|handle| handle.id);
            }
        }

        let host = self.host;
        let classes = &*host.classes;
        let mut native = Some(current_type.native_type.clone()).filter(|native| !native.is_empty());
        while let Some(class_name) = native {
            let Some(class) = classes.get_class(&class_name) else {
                break;
            };
            let kind = if class.methods.contains_key(name) {
                Some("method")
            } else if class.signals.contains_key(name) {
                Some("signal")
            } else if class.properties.contains_key(name) {
                Some("property")
            } else if class.constants.contains_key(name) {
                Some("constant")
            } else if class.enums.contains_key(name) {
                Some("enum")
            } else {
                None
            };
            if let Some(kind) = kind {
                self.push_warning(node, WarningCode::ShadowedVariableBaseClass, &[context, name, kind, &class_name]);
                return;
            }
            native = class.parent.clone();
        }
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
        let _ = analyzer.resolve_inheritance();
        f(&mut analyzer);
    }

    #[test]
    fn native_conflicts() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Node"]);
        with_analyzer(b, |a| {
            assert!(a.has_member_name_conflict_in_native_type("process_mode", "Node"));
            assert!(a.has_member_name_conflict_in_native_type("script", "Node"));
            assert!(!a.has_member_name_conflict_in_native_type("speed", "Node"));
            let node = NodeId::Class(Tree::HEAD);
            assert!(a.check_native_member_name_conflict("Vector2", node, "Node"));
            assert!(a.check_native_member_name_conflict("Sprite2D", node, "Node"));
            assert_eq!(a.error_count(), 2);
        });
    }

    #[test]
    fn script_class_conflicts() {
        let mut b = TreeBuilder::new("res://a.os");
        b.variable(VarDecl::new("speed"));
        with_analyzer(b, |a| {
            let head = a.class_ref(Tree::HEAD);
            assert!(a.has_member_name_conflict_in_script_class("speed", head, true));
            assert!(!a.has_member_name_conflict_in_script_class("jump", head, false));
        });
    }

    #[test]
    fn shadowing_globals_warns() {
        let b = TreeBuilder::new("res://a.os");
        with_analyzer(b, |a| {
            a.is_shadowing("print", NodeId::Class(Tree::HEAD), "variable", true);
            a.is_shadowing("Node", NodeId::Class(Tree::HEAD), "variable", true);
            let codes: Vec<_> = a.script().warnings.iter().map(|w| w.code).collect();
            assert_eq!(codes, vec![WarningCode::ShadowedGlobalIdentifier; 2]);
            assert!(a.script().warnings[0].message.contains("built-in function"));
        });
    }
}
