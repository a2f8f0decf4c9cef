//! Semantic analysis for Orchestrator visual scripts.
//!
//! [`Project`] is the entry point: it owns the scripts, the host oracles
//! and the warning configuration, and runs the analyzer over them. The
//! member crates are re-exported for callers that build trees or host
//! registries themselves.
//!
//! ```
//! use orchestrator::prelude::*;
//!
//! let mut b = TreeBuilder::new("res://door.os");
//! b.extends(&["Node"]);
//! let body = b.suite_of(|b| vec![b.pass()]);
//! b.function(FuncDecl::new("_ready").body(body));
//!
//! let mut project = Project::default();
//! let id = project.add_script(b.build());
//! project.analyze(id).unwrap();
//! assert_eq!(project.errors().count(), 0);
//! ```

pub mod project;

pub use orchestrator_analyzer as analyzer;
pub use orchestrator_core as core;
pub use orchestrator_parser as parser;
pub use orchestrator_registry as registry;

pub use project::Project;

pub mod prelude {
    pub use crate::project::Project;
    pub use orchestrator_analyzer::{Analyzer, AnalyzerConfig};
    pub use orchestrator_core::{
        AnalysisError, DataType, Diagnostic, Kind, ParserId, Variant, VariantType, Warning, WarningCode,
        WarningLevel,
    };
    pub use orchestrator_parser::{
        AccessorDecl, BranchDecl, FuncDecl, ParamDecl, ParserStatus, ScriptParser, ScriptPool, TreeBuilder,
        VarDecl,
    };
    pub use orchestrator_registry::{Host, MemoryScriptCache, ProjectRegistry};
}
