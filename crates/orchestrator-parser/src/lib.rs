//! Script trees for orchestration analysis.
//!
//! This crate owns everything the analyzer reads and annotates:
//! - the arena-backed AST ([`Tree`]) with typed ids
//! - [`TreeBuilder`] for producing trees from orchestration graphs
//! - [`ScriptParser`], one per script, with diagnostics and a status ladder
//! - [`ScriptPool`], the owner of every parser taking part in an analysis
//! - the annotation table
//!
//! # Example
//!
//! ```
//! use orchestrator_parser::{FuncDecl, ScriptPool, TreeBuilder};
//!
//! let mut b = TreeBuilder::new("res://player.os");
//! b.class_name("Player").extends(&["Node"]);
//! let body = b.suite_of(|b| vec![b.pass()]);
//! b.function(FuncDecl::new("_ready").body(body));
//!
//! let mut pool = ScriptPool::new();
//! let id = pool.insert(b.build());
//! assert_eq!(pool[id].head().name(), "Player");
//! ```

pub mod annotation;
pub mod ast;
pub mod builder;
pub mod parser;
pub mod pool;

pub use annotation::{AnnotationInfo, AnnotationNode, AnnotationTarget, is_annotation, lookup_annotation};
pub use ast::{
    AssignOp, BinaryOp, ClassNode, ExprKind, ExprNode, FunctionNode, IdentifierExpr, IdentifierSource, LambdaNode,
    Member, PropertyStyle, StmtKind, SubscriptIndex, Tree, UnaryOp,
};
pub use builder::{AccessorDecl, BranchDecl, FuncDecl, ParamDecl, TreeBuilder, VarDecl};
pub use parser::{ParserStatus, ScriptParser};
pub use pool::ScriptPool;
