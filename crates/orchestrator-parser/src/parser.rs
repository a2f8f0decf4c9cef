//! One parsed script with its diagnostic sinks and dependency table.

use std::fmt;

use indexmap::IndexMap;
use orchestrator_core::{ClassId, Diagnostic, NodeId, ParserId, Span, Warning};
use rustc_hash::FxHashSet;

use crate::ast::{ClassNode, Tree};

/// How far a script has been analyzed.
///
/// Statuses only increase. A caller needing more raises the status, which is
/// memoized: raising to a status already reached is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ParserStatus {
    #[default]
    Empty,
    Parsed,
    InheritanceSolved,
    InterfaceSolved,
    FullySolved,
}

impl fmt::Display for ParserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParserStatus::Empty => "empty",
            ParserStatus::Parsed => "parsed",
            ParserStatus::InheritanceSolved => "inheritance solved",
            ParserStatus::InterfaceSolved => "interface solved",
            ParserStatus::FullySolved => "fully solved",
        };
        f.write_str(s)
    }
}

/// A script tree plus everything analysis records about it.
#[derive(Debug, Clone)]
pub struct ScriptParser {
    pub path: String,
    pub tree: Tree,
    pub status: ParserStatus,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Warning>,
    /// Nodes whose correctness depends on a runtime check.
    pub unsafe_nodes: FxHashSet<NodeId>,
    /// Scripts this one depends on, by path.
    pub depended_parsers: IndexMap<String, ParserId>,
}

impl ScriptParser {
    pub fn new(path: impl Into<String>, tree: Tree) -> Self {
        Self {
            path: path.into(),
            tree,
            status: ParserStatus::Parsed,
            errors: Vec::new(),
            warnings: Vec::new(),
            unsafe_nodes: FxHashSet::default(),
            depended_parsers: IndexMap::new(),
        }
    }

    pub fn head(&self) -> &ClassNode {
        self.tree.head()
    }

    pub fn find_class(&self, fqcn: &str) -> Option<ClassId> {
        self.tree.find_class(fqcn)
    }

    pub fn push_error(&mut self, message: impl Into<String>, span: Span, node: Option<NodeId>) {
        let diagnostic = Diagnostic::new(message, span, node);
        tracing::trace!(path = %self.path, %diagnostic, "error");
        self.errors.push(diagnostic);
    }

    pub fn push_warning(&mut self, warning: Warning) {
        tracing::trace!(path = %self.path, %warning, "warning");
        self.warnings.push(warning);
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn mark_unsafe(&mut self, node: NodeId) {
        self.unsafe_nodes.insert(node);
    }

    pub fn is_unsafe(&self, node: NodeId) -> bool {
        self.unsafe_nodes.contains(&node)
    }

    pub fn add_dependency(&mut self, path: impl Into<String>, parser: ParserId) {
        self.depended_parsers.entry(path.into()).or_insert(parser);
    }

    /// Directory of the script, with a trailing slash, for relative paths.
    pub fn base_dir(&self) -> &str {
        match self.path.rfind('/') {
            Some(index) => &self.path[..=index],
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator_core::ExprId;

    #[test]
    fn status_ladder_orders() {
        assert!(ParserStatus::Parsed < ParserStatus::InheritanceSolved);
        assert!(ParserStatus::InterfaceSolved < ParserStatus::FullySolved);
        assert_eq!(ParserStatus::InheritanceSolved.to_string(), "inheritance solved");
    }

    #[test]
    fn diagnostics_accumulate() {
        let mut parser = ScriptParser::new("res://a.os", Tree::default());
        parser.push_error("bad", Span::default(), None);
        parser.mark_unsafe(NodeId::Expr(ExprId::new(2)));
        assert_eq!(parser.error_count(), 1);
        assert!(parser.is_unsafe(NodeId::Expr(ExprId::new(2))));
        assert!(!parser.is_unsafe(NodeId::Expr(ExprId::new(3))));
    }

    #[test]
    fn dependencies_keep_first_entry() {
        let mut parser = ScriptParser::new("res://a.os", Tree::default());
        parser.add_dependency("res://b.os", ParserId::new(1));
        parser.add_dependency("res://b.os", ParserId::new(7));
        assert_eq!(parser.depended_parsers.get("res://b.os"), Some(&ParserId::new(1)));
    }

    #[test]
    fn base_dir() {
        let parser = ScriptParser::new("res://scenes/player.os", Tree::default());
        assert_eq!(parser.base_dir(), "res://scenes/");
    }
}
