//! Interface: the type of every member, bases first.

use orchestrator_core::{ClassRef, Kind, NodeId};
use orchestrator_parser::Member;

use crate::context::Analyzer;

impl Analyzer<'_> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn resolve_class_interface(&mut self, class: ClassRef, source: Option<NodeId>) {
        if self.pool.class(class).resolved_interface {
            return;
        }

        if !self.owns(class) {
            let report_on = source.unwrap_or(NodeId::Class(self.current_class));
            let fqcn = self.pool.class(class).fqcn.clone();
            let before = self.pool[class.parser].error_count();
            self.delegate(class.parser, |analyzer| analyzer.resolve_class_interface(class, None));
            if self.pool[class.parser].error_count() > before {
                self.push_error(format!(r#"Could not resolve class "{fqcn}"."#), report_on);
            }
            return;
        }

        tracing::trace!(class = %self.pool.class(class).fqcn, "resolving interface");
        self.tree_mut()[class.id].resolved_interface = true;

        if self.resolve_class_inheritance(class, None).is_err() {
            return;
        }

        let base = &self.tree()[class.id].base_type;
        if base.kind == Kind::Class {
            if let Some(base_class) = base.class_type.as_ref().map(|handle| handle.id) {
                self.resolve_class_interface(base_class, Some(NodeId::Class(class.id)));
            }
        }

        let mut has_static_data = self.tree()[class.id].has_static_data;
        for index in 0..self.tree()[class.id].members.len() {
            self.resolve_class_member(class, index, None);
            if let Member::Class(inner) = self.tree()[class.id].members[index] {
                has_static_data |= self.tree()[inner].has_static_data;
            }
        }
        self.tree_mut()[class.id].has_static_data = has_static_data;
    }

    pub(crate) fn resolve_class_interface_recursive(&mut self, class: ClassRef) {
        self.resolve_class_interface(class, None);
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
            self.resolve_class_interface_recursive(inner);
        }
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_core::{Kind, VariantType};
    use orchestrator_parser::{FuncDecl, ParamDecl, ScriptPool, Tree, TreeBuilder, VarDecl};
    use orchestrator_registry::Host;

    use crate::config::AnalyzerConfig;
    use crate::context::Analyzer;

    #[test]
    fn every_member_gets_a_type() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends(&["Node"]);
        let int = b.ty("int");
        let one = b.lit(1);
        b.variable(VarDecl::new("speed").typed(int).init(one));
        let float = b.ty("float");
        let x = b.ident("x");
        let body = b.suite_of(|b| vec![b.ret(Some(x))]);
        let run = b.function(FuncDecl::new("run").param(ParamDecl::new("x").typed(float)).returns(float).body(body));
        b.signal("hit", vec![]);

        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);
        analyzer.resolve_inheritance().unwrap();
        analyzer.resolve_interface().unwrap();

        let tree = analyzer.tree();
        assert!(tree.head().resolved_interface);
        assert!(tree.head().members.iter().all(|m| tree.member_data_type(*m).is_some_and(|t| t.is_set())));
        assert!(tree[run].resolved_signature);
        assert_eq!(tree[run].data_type.builtin_type, VariantType::Float);
        assert_eq!(tree[run].info.arguments.len(), 1);
        assert!(tree[run].body.is_some_and(|body| !tree[body].data_type.is_set()));
    }

    #[test]
    fn nested_classes_resolve_recursively() {
        let mut b = TreeBuilder::new("res://a.os");
        let inner = b.begin_class("Inner");
        let int = b.ty("int");
        b.variable(VarDecl::new("count").typed(int).statik());
        b.end_class();

        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);
        analyzer.resolve_inheritance().unwrap();
        analyzer.resolve_interface().unwrap();

        let tree = analyzer.tree();
        assert!(tree[inner].resolved_interface);
        assert_eq!(tree[inner].base_type.kind, Kind::Native);
        assert!(tree[Tree::HEAD].has_static_data);
    }
}
