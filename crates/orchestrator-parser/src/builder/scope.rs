//! Block-scoped local table used to bind identifiers while a tree is built.
//!
//! `LocalScope` tracks the locals visible at one point of a function body:
//! - declarations with their block depth
//! - nested blocks (if/while/for/match bodies)
//! - shadowing with restoration on block exit
//! - nested function bodies (lambdas) that keep seeing enclosing locals

use orchestrator_core::Span;
use rustc_hash::FxHashMap;

use crate::ast::Local;

/// A local together with the block depth that declared it.
#[derive(Debug, Clone)]
struct ScopedLocal {
    local: Local,
    depth: u32,
}

/// Raised when a name is declared twice in the same block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeclaration {
    pub name: String,
    pub kind: &'static str,
    pub original_span: Span,
}

#[derive(Debug, Default)]
pub struct LocalScope {
    /// Visible locals by name.
    locals: FxHashMap<String, ScopedLocal>,

    /// Current block depth (0 = outside any function body).
    scope_depth: u32,

    /// Shadowed locals as (shadowing depth, name, previous local).
    shadowed: Vec<(u32, String, ScopedLocal)>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a block.
    pub fn push_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Leave a block, dropping its locals and restoring shadowed ones.
    pub fn pop_scope(&mut self) {
        let depth = self.scope_depth;
        self.locals.retain(|_, scoped| scoped.depth < depth);

        while let Some((shadowing_depth, _, _)) = self.shadowed.last() {
            if *shadowing_depth != depth {
                break;
            }
            if let Some((_, name, previous)) = self.shadowed.pop() {
                self.locals.insert(name, previous);
            }
        }

        self.scope_depth = self.scope_depth.saturating_sub(1);
    }

    pub fn depth(&self) -> u32 {
        self.scope_depth
    }

    /// Declare a local in the current block.
    ///
    /// Declaring a name already visible from an outer block shadows it until
    /// the block is left; declaring it twice in the same block is rejected.
    pub fn declare(&mut self, local: Local) -> Result<(), Redeclaration> {
        if let Some(existing) = self.locals.get(&local.name) {
            if existing.depth == self.scope_depth {
                return Err(Redeclaration {
                    name: local.name.clone(),
                    kind: existing.local.kind.type_name(),
                    original_span: existing.local.span,
                });
            }
            self.shadowed
                .push((self.scope_depth, local.name.clone(), existing.clone()));
        }

        let name = local.name.clone();
        self.locals.insert(
            name,
            ScopedLocal {
                local,
                depth: self.scope_depth,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Local> {
        self.locals.get(name).map(|scoped| &scoped.local)
    }

    pub fn is_declared_in_current_scope(&self, name: &str) -> bool {
        self.locals
            .get(name)
            .is_some_and(|scoped| scoped.depth == self.scope_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LocalKind;
    use orchestrator_core::VariableId;

    fn local(name: &str, id: u32) -> Local {
        Local {
            kind: LocalKind::Variable(VariableId::new(id)),
            name: name.to_string(),
            span: Span::line(id),
            source_function: None,
        }
    }

    #[test]
    fn declare_and_lookup() {
        let mut scope = LocalScope::new();
        scope.push_scope();
        scope.declare(local("x", 1)).unwrap();
        assert!(scope.get("x").is_some());
        assert!(scope.is_declared_in_current_scope("x"));
        scope.pop_scope();
        assert!(scope.get("x").is_none());
    }

    #[test]
    fn redeclaration_error() {
        let mut scope = LocalScope::new();
        scope.push_scope();
        scope.declare(local("x", 1)).unwrap();
        let err = scope.declare(local("x", 2)).unwrap_err();
        assert_eq!(err.name, "x");
        assert_eq!(err.original_span, Span::line(1));
    }

    #[test]
    fn shadowing_restores_outer() {
        let mut scope = LocalScope::new();
        scope.push_scope();
        scope.declare(local("x", 1)).unwrap();
        scope.push_scope();
        scope.declare(local("x", 2)).unwrap();
        assert_eq!(scope.get("x").map(|l| l.span), Some(Span::line(2)));
        scope.pop_scope();
        assert_eq!(scope.get("x").map(|l| l.span), Some(Span::line(1)));
    }
}
