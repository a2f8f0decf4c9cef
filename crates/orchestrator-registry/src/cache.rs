//! Loading other scripts and resources by path.

use std::sync::Arc;

use indexmap::IndexMap;
use orchestrator_core::ForeignScript;
use orchestrator_parser::ScriptParser;

use crate::error::CacheError;

/// What a path resolves to.
#[derive(Debug, Clone)]
pub enum CachedScript {
    /// An orchestration script whose tree takes part in analysis.
    Source(ScriptParser),
    /// A script known only through its reflected interface.
    Foreign(Arc<ForeignScript>),
    /// A non-script resource of the given native class.
    Resource { path: String, class_name: String },
}

impl CachedScript {
    pub fn is_script(&self) -> bool {
        !matches!(self, CachedScript::Resource { .. })
    }
}

pub trait ScriptCache {
    /// Produce the script or resource stored at `path`.
    fn load(&self, path: &str) -> Result<CachedScript, CacheError>;

    fn exists(&self, path: &str) -> bool;

    /// Interface of a script without building its tree.
    fn shallow_script(&self, path: &str) -> Result<Arc<ForeignScript>, CacheError> {
        match self.load(path)? {
            CachedScript::Foreign(script) => Ok(script),
            CachedScript::Source(_) | CachedScript::Resource { .. } => Err(CacheError::Unrecognized(path.to_string())),
        }
    }
}

/// In-memory [`ScriptCache`].
#[derive(Debug, Default)]
pub struct MemoryScriptCache {
    entries: IndexMap<String, CachedScript>,
}

impl MemoryScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an orchestration script under its own path.
    pub fn insert_source(&mut self, parser: ScriptParser) -> &mut Self {
        self.entries.insert(parser.path.clone(), CachedScript::Source(parser));
        self
    }

    pub fn insert_foreign(&mut self, script: ForeignScript) -> &mut Self {
        self.entries
            .insert(script.path.clone(), CachedScript::Foreign(Arc::new(script)));
        self
    }

    pub fn insert_resource(&mut self, path: &str, class_name: &str) -> &mut Self {
        self.entries.insert(
            path.to_string(),
            CachedScript::Resource {
                path: path.to_string(),
                class_name: class_name.to_string(),
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ScriptCache for MemoryScriptCache {
    fn load(&self, path: &str) -> Result<CachedScript, CacheError> {
        tracing::trace!(path, "script cache lookup");
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator_parser::Tree;

    #[test]
    fn load_by_path() {
        let mut cache = MemoryScriptCache::new();
        cache
            .insert_source(ScriptParser::new("res://a.os", Tree::default()))
            .insert_foreign(ForeignScript::new("res://b.cs", "Node"))
            .insert_resource("res://icon.png", "Texture2D");

        assert!(matches!(cache.load("res://a.os"), Ok(CachedScript::Source(_))));
        assert!(cache.load("res://b.cs").is_ok_and(|s| s.is_script()));
        assert!(cache.load("res://icon.png").is_ok_and(|s| !s.is_script()));
        assert_eq!(
            cache.load("res://missing.os").err(),
            Some(CacheError::NotFound("res://missing.os".into()))
        );
    }

    #[test]
    fn shallow_scripts() {
        let mut cache = MemoryScriptCache::new();
        cache
            .insert_foreign(ForeignScript::new("res://b.cs", "Node"))
            .insert_resource("res://icon.png", "Texture2D");
        assert_eq!(
            cache.shallow_script("res://b.cs").map(|s| s.native_base.clone()),
            Ok("Node".to_string())
        );
        assert_eq!(
            cache.shallow_script("res://icon.png").err(),
            Some(CacheError::Unrecognized("res://icon.png".into()))
        );
    }
}
