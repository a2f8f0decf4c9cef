//! Inheritance: the base type of every class.
//!
//! A class's `base_type` is `Resolving` while its extends chain is followed.
//! Meeting that marker again is a cyclic reference; meeting the class's own
//! fqcn while walking the resolved bases is cyclic inheritance. A failed
//! resolution leaves a `Variant` base so the class is never revisited.

use orchestrator_core::{AnalysisError, ClassRef, DataType, Kind, NodeId, TypeSource, VariantType};
use orchestrator_parser::{Member, ParserStatus, Tree};

use crate::context::Analyzer;
use crate::path;
use crate::types::{make_script_meta_type, type_from_metatype};

impl Analyzer<'_> {
    /// Resolve the base of `class`. `source` is the node (of this analyzer's
    /// tree) that needed it, used for diagnostics about foreign classes.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn resolve_class_inheritance(
        &mut self,
        class: ClassRef,
        source: Option<NodeId>,
    ) -> Result<(), AnalysisError> {
        let report_on = source.unwrap_or(if self.owns(class) {
            NodeId::Class(class.id)
        } else {
            NodeId::Class(self.current_class)
        });

        let node = self.pool.class(class);
        if node.base_type.is_resolving() {
            let name = type_from_metatype(&node.data_type).to_string();
            self.push_error(format!(r#"Could not resolve class "{name}": Cyclic reference."#), report_on);
            return Err(self.parse_error());
        }
        if node.base_type.is_set() {
            return Ok(());
        }

        if !self.owns(class) {
            let fqcn = node.fqcn.clone();
            let before = self.pool[class.parser].error_count();
            let result = self.delegate(class.parser, |analyzer| analyzer.resolve_class_inheritance(class, None));
            if self.pool[class.parser].error_count() > before {
                self.push_error(format!(r#"Could not resolve inheritance for class "{fqcn}"."#), report_on);
                return Err(self.parse_error());
            }
            return result;
        }

        tracing::trace!(class = %self.pool.class(class).fqcn, "resolving inheritance");
        self.check_class_name_hiding(class);

        self.tree_mut()[class.id].base_type = DataType::resolving();
        let stamped = self.make_class_meta_type(class, "");
        self.tree_mut()[class.id].data_type = stamped;

        let Some(base) = self.resolve_base_type(class) else {
            self.tree_mut()[class.id].base_type = DataType::variant();
            return Err(self.parse_error());
        };

        let fqcn = self.tree()[class.id].fqcn.clone();
        let mut parent = Some(base.clone());
        while let Some(ty) = parent.take() {
            if ty.kind != Kind::Class {
                break;
            }
            let Some(handle) = ty.class_type else {
                break;
            };
            if handle.fqcn == fqcn {
                self.push_error("Cyclic inheritance.", class.id);
                self.tree_mut()[class.id].base_type = DataType::variant();
                return Err(self.parse_error());
            }
            parent = Some(self.pool.class(handle.id).base_type.clone());
        }

        let data_type = self.make_class_meta_type(class, &base.native_type);
        let tree = self.tree_mut();
        tree[class.id].base_type = base;
        tree[class.id].data_type = data_type;

        self.resolve_class_annotations(class.id);
        Ok(())
    }

    pub(crate) fn resolve_class_inheritance_recursive(&mut self, class: ClassRef) -> Result<(), AnalysisError> {
        self.resolve_class_inheritance(class, None)?;
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
            self.resolve_class_inheritance_recursive(inner)?;
        }
        Ok(())
    }

    fn check_class_name_hiding(&mut self, class: ClassRef) {
        let Some(name) = self.tree()[class.id].identifier.as_ref().map(|ident| ident.name.clone()) else {
            return;
        };
        let host = self.host;

        let hidden = if VariantType::from_name(&name).is_some() {
            Some("a built-in type")
        } else if host.classes.class_exists(&name) {
            Some("a native type")
        } else if host
            .project
            .global_class(&name)
            .is_some_and(|global| global.path != self.script().path || class.id != Tree::HEAD)
        {
            Some("a global script class")
        } else if host.project.has_singleton_autoload(&name) {
            Some("an autoload singleton")
        } else {
            None
        };
        if let Some(hidden) = hidden {
            self.push_error(format!(r#"Class "{name}" hides {hidden}."#), class.id);
        }
    }

    /// Follow the extends clause of `class`. Returns the instance type of the
    /// base, or `None` after reporting why it could not be resolved.
    fn resolve_base_type(&mut self, class: ClassRef) -> Option<DataType> {
        let node = self.tree()[class.id].clone();
        let report_on = NodeId::Class(class.id);

        if !node.extends_used {
            return Some(DataType::native("RefCounted", TypeSource::AnnotatedInferred));
        }

        let mut base;
        let mut chain = node.extends.iter();

        if let Some(raw_path) = &node.extends_path {
            let resolved = path::resolve(self.script().base_dir(), raw_path);
            base = self.resolve_base_path(&resolved, report_on)?;
        } else {
            let Some(first) = chain.next() else {
                self.push_error("Could not resolve an empty super class path.", report_on);
                return None;
            };
            base = self.resolve_base_name(class, &first.name, report_on)?;
        }

        for ident in chain {
            let name = ident.name.as_str();
            if base.kind != Kind::Class {
                self.push_error(
                    format!(r#"Cannot get nested types for extension from non-orchestration type "{base}"."#),
                    report_on,
                );
                return None;
            }
            let found = self
                .lookup_member(name, Some(&base), report_on)
                .map(|found| found.data_type)
                .filter(DataType::is_set);
            match found {
                Some(found) if matches!(found.kind, Kind::Script | Kind::Class) => base = found,
                Some(_) => {
                    self.push_error(
                        format!(r#"Identifier "{name}" is not a preloaded script or class."#),
                        report_on,
                    );
                    return None;
                }
                None => {
                    self.push_error(format!(r#"Could not find nested type "{name}"."#), report_on);
                    return None;
                }
            }
        }

        if !base.is_set() {
            let name = match node.identifier.as_ref() {
                Some(ident) => ident.name.clone(),
                None => "<main>".to_string(),
            };
            self.push_error(format!(r#"Could not resolve inheritance for class "{name}"."#), report_on);
            return None;
        }

        let mut base = base;
        base.is_meta_type = false;
        base.is_constant = false;
        Some(base)
    }

    fn resolve_base_path(&mut self, path: &str, report_on: NodeId) -> Option<DataType> {
        if path == self.script().path {
            return Some(self.class_node(self.class_ref(Tree::HEAD)).data_type.clone());
        }
        match self.depended_parser_for(path) {
            Some(parser) => {
                if !self.raise_status(parser, ParserStatus::InheritanceSolved) {
                    self.push_error(
                        format!(r#"Could not resolve super class inheritance from "{path}"."#),
                        report_on,
                    );
                    return None;
                }
                Some(self.pool.class(ClassRef::new(parser, Tree::HEAD)).data_type.clone())
            }
            None => match self.host.scripts.shallow_script(path) {
                Ok(script) => Some(make_script_meta_type(script)),
                Err(err) => {
                    tracing::debug!(path, %err, "super class path unavailable");
                    self.push_error(format!(r#"Could not resolve super class path "{path}"."#), report_on);
                    None
                }
            },
        }
    }

    fn resolve_base_name(&mut self, class: ClassRef, name: &str, report_on: NodeId) -> Option<DataType> {
        let host = self.host;

        if let Some(global) = host.project.global_class(name) {
            let global_path = global.path.clone();
            if global_path == self.script().path {
                return Some(self.class_node(self.class_ref(Tree::HEAD)).data_type.clone());
            }
            return match self.depended_parser_for(&global_path) {
                Some(parser) => {
                    if !self.raise_status(parser, ParserStatus::InheritanceSolved) {
                        self.push_error(
                            format!(r#"Could not resolve super class inheritance from "{name}"."#),
                            report_on,
                        );
                        return None;
                    }
                    Some(self.pool.class(ClassRef::new(parser, Tree::HEAD)).data_type.clone())
                }
                None => match host.scripts.shallow_script(&global_path) {
                    Ok(script) => Some(make_script_meta_type(script)),
                    Err(_) => {
                        self.push_error(format!(r#"Could not resolve super class "{name}"."#), report_on);
                        None
                    }
                },
            };
        }

        if host.project.has_singleton_autoload(name) {
            let autoload_path = host.project.autoload(name).map(|autoload| autoload.path.clone()).unwrap_or_default();
            let Some(parser) = self.depended_parser_for(&autoload_path) else {
                self.push_error(format!("Singleton {name} is not an orchestration."), report_on);
                return None;
            };
            if !self.raise_status(parser, ParserStatus::InheritanceSolved) {
                self.push_error(format!(r#"Could not parse singleton from "{autoload_path}"."#), report_on);
                return None;
            }
            return Some(self.pool.class(ClassRef::new(parser, Tree::HEAD)).data_type.clone());
        }

        if host.classes.class_exists(name) {
            if host.classes.singleton(name).is_some() {
                self.push_error(
                    format!(r#"Cannot inherit native class "{name}" because it is an engine singleton."#),
                    report_on,
                );
                return None;
            }
            return Some(DataType::native(name, TypeSource::AnnotatedExplicit));
        }

        // The class itself and its outer classes; bases are not known yet.
        let mut look = Some(class);
        while let Some(look_class) = look {
            let look_node = self.pool.class(look_class);
            if look_node.name() == name {
                if !look_node.data_type.is_set() {
                    let _ = self.resolve_class_inheritance(look_class, Some(report_on));
                }
                return Some(self.pool.class(look_class).data_type.clone());
            }
            if let Some(member) = look_node.get_member(name) {
                self.resolve_class_member_by_name(look_class, name, Some(report_on));
                let data_type = self
                    .pool
                    .tree(look_class.parser)
                    .member_data_type(member)
                    .cloned()
                    .unwrap_or_default();
                return match member {
                    Member::Class(_) => Some(data_type),
                    Member::Constant(_) if matches!(data_type.kind, Kind::Script | Kind::Class) => Some(data_type),
                    Member::Constant(_) => {
                        self.push_error(
                            format!(r#"Constant "{name}" is not a preloaded script or class."#),
                            report_on,
                        );
                        None
                    }
                    other => {
                        self.push_error(
                            format!(r#"Cannot use {} "{name}" in extends chain."#, other.type_name()),
                            report_on,
                        );
                        None
                    }
                };
            }
            look = look_node.outer.map(|outer| ClassRef::new(look_class.parser, outer));
        }

        self.push_error(format!(r#"Could not find base class "{name}"."#), report_on);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use orchestrator_parser::{ScriptPool, TreeBuilder};
    use orchestrator_registry::{Host, MemoryScriptCache, ProjectRegistry};

    fn inherit(b: TreeBuilder) -> (ScriptPool, Result<(), AnalysisError>) {
        crate::init_test_tracing();
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let result = Analyzer::new(&mut pool, &host, &config, id).resolve_inheritance();
        (pool, result)
    }

    fn head(pool: &ScriptPool) -> &orchestrator_parser::ClassNode {
        pool.iter().next().map(|(_, script)| script.head()).expect("one script")
    }

    #[test]
    fn implicit_base_is_ref_counted() {
        let (pool, result) = inherit(TreeBuilder::new("res://a.os"));
        assert!(result.is_ok());
        let base = &head(&pool).base_type;
        assert_eq!(base.kind, Kind::Native);
        assert_eq!(base.native_type, "RefCounted");
        assert_eq!(base.type_source, TypeSource::AnnotatedInferred);
        assert!(head(&pool).data_type.is_meta_type);
    }

    #[test]
    fn native_base() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Node2D"]);
        let (pool, result) = inherit(b);
        assert!(result.is_ok());
        assert_eq!(head(&pool).data_type.native_type, "Node2D");
    }

    #[test]
    fn engine_singletons_cannot_be_inherited() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Input"]);
        let (pool, result) = inherit(b);
        assert!(result.is_err());
        let errors = &pool.iter().next().expect("script").1.errors;
        assert!(errors[0].message.contains("engine singleton"));
    }

    #[test]
    fn inner_class_extends_sibling() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Node"]);
        b.begin_class("Base");
        b.extends(&["Node2D"]);
        b.end_class();
        let derived = b.begin_class("Derived");
        b.extends(&["Base"]);
        b.end_class();
        let (pool, result) = inherit(b);
        assert!(result.is_ok());
        let (id, _) = pool.iter().next().expect("script");
        let derived = pool.class(ClassRef::new(id, derived));
        assert_eq!(derived.base_type.kind, Kind::Class);
        assert_eq!(derived.data_type.native_type, "Node2D");
    }

    #[test]
    fn self_inheritance_is_cyclic() {
        let mut b = TreeBuilder::new("res://a.os");
        b.begin_class("Loop");
        b.extends(&["Loop"]);
        b.end_class();
        let (pool, result) = inherit(b);
        assert!(result.is_err());
        let errors = &pool.iter().next().expect("script").1.errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Cyclic inheritance.");
    }

    #[test]
    fn unknown_base() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Nowhere"]);
        let (pool, result) = inherit(b);
        assert!(result.is_err());
        assert!(head(&pool).base_type.is_variant());
    }

    #[test]
    fn cross_script_cycle() {
        let mut a = TreeBuilder::new("res://a.os");
        a.class_name("A").extends(&["B"]);
        let mut b = TreeBuilder::new("res://b.os");
        b.class_name("B").extends(&["A"]);

        let mut project = ProjectRegistry::new();
        project.add_global_class("A", "res://a.os", "RefCounted");
        project.add_global_class("B", "res://b.os", "RefCounted");
        let mut scripts = MemoryScriptCache::new();
        scripts.insert_source(b.build());
        let host = Host::standard().with_project(project).with_scripts(scripts);

        let mut pool = ScriptPool::new();
        let id = pool.insert(a.build());
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);
        analyzer.bump_status(ParserStatus::InheritanceSolved);
        let result = analyzer.resolve_inheritance();
        assert!(result.is_err());
        assert!(pool[id].errors.iter().any(|error| error.message == "Cyclic inheritance."));
    }

    #[test]
    fn hiding_native_names() {
        let mut b = TreeBuilder::new("res://a.os");
        b.begin_class("Node");
        b.end_class();
        let (pool, _) = inherit(b);
        let errors = &pool.iter().next().expect("script").1.errors;
        assert_eq!(errors[0].message, r#"Class "Node" hides a native type."#);
    }
}
