//! The pool of every script taking part in one analysis.
//!
//! Parsers are owned here and addressed by [`ParserId`]. Links between trees
//! ([`ClassRef`]) are resolved through the pool, so a class node of another
//! file is always reached by lookup and never by ownership.

use std::ops::{Index, IndexMut};

use orchestrator_core::{ClassRef, ParserId};
use rustc_hash::FxHashMap;

use crate::ast::{ClassNode, Tree};
use crate::parser::ScriptParser;

#[derive(Debug, Default)]
pub struct ScriptPool {
    parsers: Vec<ScriptParser>,
    by_path: FxHashMap<String, ParserId>,
}

impl ScriptPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parser. A parser already registered under the same path is kept
    /// and its id returned.
    pub fn insert(&mut self, parser: ScriptParser) -> ParserId {
        if let Some(&existing) = self.by_path.get(&parser.path) {
            return existing;
        }
        let id = ParserId::from(self.parsers.len());
        self.by_path.insert(parser.path.clone(), id);
        self.parsers.push(parser);
        id
    }

    pub fn find(&self, path: &str) -> Option<ParserId> {
        self.by_path.get(path).copied()
    }

    pub fn get(&self, id: ParserId) -> Option<&ScriptParser> {
        self.parsers.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    pub fn ids(&self) -> Vec<ParserId> {
        (0..self.parsers.len()).map(ParserId::from).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParserId, &ScriptParser)> {
        self.parsers
            .iter()
            .enumerate()
            .map(|(index, parser)| (ParserId::from(index), parser))
    }

    pub fn tree(&self, id: ParserId) -> &Tree {
        &self[id].tree
    }

    pub fn tree_mut(&mut self, id: ParserId) -> &mut Tree {
        &mut self[id].tree
    }

    pub fn class(&self, class: ClassRef) -> &ClassNode {
        &self[class.parser].tree[class.id]
    }

    pub fn class_mut(&mut self, class: ClassRef) -> &mut ClassNode {
        &mut self[class.parser].tree[class.id]
    }

    /// The parser owning a class with the given fully qualified name.
    pub fn find_class(&self, fqcn: &str) -> Option<ClassRef> {
        let path = fqcn.split("::").next().unwrap_or(fqcn);
        let parser = self.find(path)?;
        let id = self[parser].find_class(fqcn)?;
        Some(ClassRef::new(parser, id))
    }

    pub fn total_errors(&self) -> usize {
        self.parsers.iter().map(ScriptParser::error_count).sum()
    }
}

impl Index<ParserId> for ScriptPool {
    type Output = ScriptParser;

    fn index(&self, id: ParserId) -> &ScriptParser {
        &self.parsers[id.index()]
    }
}

impl IndexMut<ParserId> for ScriptPool {
    fn index_mut(&mut self, id: ParserId) -> &mut ScriptParser {
        &mut self.parsers[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ClassNode;

    fn parser(path: &str) -> ScriptParser {
        let mut tree = Tree::default();
        tree.add_class(ClassNode {
            fqcn: path.to_string(),
            ..Default::default()
        });
        ScriptParser::new(path, tree)
    }

    #[test]
    fn insert_is_keyed_by_path() {
        let mut pool = ScriptPool::new();
        let a = pool.insert(parser("res://a.os"));
        let b = pool.insert(parser("res://b.os"));
        assert_ne!(a, b);
        assert_eq!(pool.insert(parser("res://a.os")), a);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.find("res://b.os"), Some(b));
    }

    #[test]
    fn find_class_across_trees() {
        let mut pool = ScriptPool::new();
        pool.insert(parser("res://a.os"));
        let b = pool.insert(parser("res://b.os"));
        let class = pool.find_class("res://b.os").map(|c| c.parser);
        assert_eq!(class, Some(b));
        assert!(pool.find_class("res://c.os").is_none());
    }
}
