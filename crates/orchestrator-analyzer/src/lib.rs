//! Semantic analysis for orchestration scripts.
//!
//! The analyzer annotates a parsed [`ScriptParser`](orchestrator_parser::ScriptParser)
//! tree in place: every expression gets a [`DataType`](orchestrator_core::DataType),
//! constant expressions get a reduced value, and diagnostics are appended to the
//! parser. Scripts that depend on each other are analyzed through one
//! [`ScriptPool`](orchestrator_parser::ScriptPool), so cross-file lookups raise the
//! other parser's status on demand.
//!
//! ## Passes
//!
//! - **Inheritance**: resolve `extends` chains and class identity
//! - **Interface**: resolve member signatures, types and annotations
//! - **Body**: reduce function bodies, member initializers and lambdas
//! - **Dependencies**: run the body pass over every script this one reached
//!
//! ## Modules
//!
//! - [`config`]: warning levels and ignored paths
//! - [`context`]: the [`Analyzer`] and its diagnostic plumbing
//! - [`types`]: constructors for meta, enum and callable types
//!
//! # Example
//!
//! ```
//! use orchestrator_analyzer::{Analyzer, AnalyzerConfig};
//! use orchestrator_parser::{FuncDecl, ScriptPool, TreeBuilder};
//! use orchestrator_registry::Host;
//!
//! let mut b = TreeBuilder::new("res://player.os");
//! b.extends(&["Node"]);
//! let body = b.suite_of(|b| vec![b.pass()]);
//! b.function(FuncDecl::new("_ready").body(body));
//!
//! let mut pool = ScriptPool::new();
//! let id = pool.insert(b.build());
//! let host = Host::standard();
//! let config = AnalyzerConfig::default();
//! Analyzer::new(&mut pool, &host, &config, id).analyze().unwrap();
//! assert!(pool[id].errors.is_empty());
//! ```

mod annotations;
pub mod config;
mod const_value;
pub mod context;
mod conversion;
mod expr;
mod lookup;
mod passes;
mod path;
mod shadowing;
mod stmt;
mod type_resolver;
pub mod types;

pub use config::AnalyzerConfig;
pub use context::Analyzer;
pub use types::{
    enum_has_value, make_builtin_meta_type, make_callable_type, make_native_meta_type, make_signal_type,
    type_from_metatype,
};

/// Route analyzer logs to the test writer; later calls are no-ops.
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
