//! Host oracles consulted by the analyzer.
//!
//! Each concern is a trait with an in-memory implementation:
//!
//! | Trait | Implementation | Answers |
//! |-------|----------------|---------|
//! | [`ClassDb`] | [`ClassRegistry`] | native classes, global constants and enums, singletons |
//! | [`ValueModel`] | [`BuiltinValueModel`] | builtin constructors, operators, members, conversions |
//! | [`UtilityFunctions`] | [`UtilityRegistry`] | global functions and language constants |
//! | [`ProjectSettings`] | [`ProjectRegistry`] | autoloads and global script classes |
//! | [`ScriptCache`] | [`MemoryScriptCache`] | other scripts and resources by path |
//!
//! [`Host`] bundles one of each.

pub mod cache;
pub mod class_db;
mod core_classes;
pub mod error;
pub mod host;
pub mod project;
pub mod utility;
pub mod value;

pub use cache::{CachedScript, MemoryScriptCache, ScriptCache};
pub use class_db::{ClassDb, ClassRegistry, GlobalConstant, NativeClass, NativeProperty};
pub use error::CacheError;
pub use host::Host;
pub use project::{Autoload, GlobalClass, ProjectRegistry, ProjectSettings};
pub use utility::{UtilityCategory, UtilityFunction, UtilityFunctions, UtilityRegistry};
pub use value::{BuiltinTypeInfo, BuiltinValueModel, ValueModel};
