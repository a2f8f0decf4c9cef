//! A set of scripts analyzed against one host.

use orchestrator_analyzer::{Analyzer, AnalyzerConfig};
use orchestrator_core::{AnalysisError, Diagnostic, ParserId, Warning};
use orchestrator_parser::{ParserStatus, ScriptParser, ScriptPool};
use orchestrator_registry::{CacheError, CachedScript, Host};

/// Owns every script taking part in an analysis together with the host
/// oracles and warning configuration they are checked against.
///
/// Scripts reached through `extends`, `preload` or typed references are
/// pulled from the host's script cache on demand, so adding the entry
/// scripts is enough.
#[derive(Debug)]
pub struct Project {
    pool: ScriptPool,
    host: Host,
    config: AnalyzerConfig,
}

impl Project {
    pub fn new(host: Host, config: AnalyzerConfig) -> Self {
        Self {
            pool: ScriptPool::new(),
            host,
            config,
        }
    }

    /// Add an already built script. A script already loaded under the same
    /// path keeps its id and is not replaced.
    pub fn add_script(&mut self, script: ScriptParser) -> ParserId {
        match self.pool.find(&script.path) {
            Some(existing) => {
                tracing::debug!(path = %script.path, "script already in project");
                existing
            }
            None => self.pool.insert(script),
        }
    }

    /// Load the script at `path` through the host's script cache.
    pub fn load(&mut self, path: &str) -> Result<ParserId, AnalysisError> {
        if let Some(existing) = self.pool.find(path) {
            return Ok(existing);
        }
        match self.host.scripts.load(path) {
            Ok(CachedScript::Source(script)) => Ok(self.pool.insert(script)),
            Ok(_) => Err(AnalysisError::CantOpen {
                path: path.to_string(),
                reason: "not an orchestration".to_string(),
            }),
            Err(CacheError::NotFound(_)) => Err(AnalysisError::ScriptNotFound { path: path.to_string() }),
            Err(err) => Err(AnalysisError::CantOpen {
                path: path.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    /// Analyze one script and whatever it depends on.
    ///
    /// A script that was already fully analyzed, directly or as a
    /// dependency, reports its stored result without running again.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn analyze(&mut self, id: ParserId) -> Result<(), AnalysisError> {
        let script = &self.pool[id];
        if script.status == ParserStatus::FullySolved {
            tracing::trace!(path = %script.path, "already analyzed");
            return match script.errors.len() {
                0 => Ok(()),
                count => Err(AnalysisError::ParseError {
                    path: script.path.clone(),
                    count,
                }),
            };
        }
        tracing::debug!(path = %script.path, "analyzing");
        Analyzer::new(&mut self.pool, &self.host, &self.config, id).analyze()
    }

    /// Analyze every script in the project, including dependencies loaded
    /// along the way. Returns the failures in pool order.
    pub fn analyze_all(&mut self) -> Vec<AnalysisError> {
        let mut failures = Vec::new();
        let mut next = 0;
        // Analysis may grow the pool, so ids are re-read each round.
        while let Some(id) = self.pool.ids().get(next).copied() {
            if let Err(err) = self.analyze(id) {
                failures.push(err);
            }
            next += 1;
        }
        failures
    }

    pub fn script(&self, id: ParserId) -> &ScriptParser {
        &self.pool[id]
    }

    pub fn find(&self, path: &str) -> Option<ParserId> {
        self.pool.find(path)
    }

    pub fn pool(&self) -> &ScriptPool {
        &self.pool
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn error_count(&self) -> usize {
        self.pool.total_errors()
    }

    /// Every error diagnostic with the path of the script it belongs to.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &Diagnostic)> {
        self.pool
            .iter()
            .flat_map(|(_, script)| script.errors.iter().map(move |error| (script.path.as_str(), error)))
    }

    pub fn warnings(&self) -> impl Iterator<Item = (&str, &Warning)> {
        self.pool
            .iter()
            .flat_map(|(_, script)| script.warnings.iter().map(move |warning| (script.path.as_str(), warning)))
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new(Host::standard(), AnalyzerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_parser::{FuncDecl, TreeBuilder};
    use orchestrator_registry::MemoryScriptCache;

    use super::*;

    fn script(path: &str) -> ScriptParser {
        let mut b = TreeBuilder::new(path);
        b.extends(&["Node"]);
        let body = b.suite_of(|b| vec![b.pass()]);
        b.function(FuncDecl::new("_ready").body(body));
        b.build()
    }

    #[test]
    fn missing_script_is_not_found() {
        let mut project = Project::default();
        assert_eq!(
            project.load("res://missing.os"),
            Err(AnalysisError::ScriptNotFound {
                path: "res://missing.os".into()
            })
        );
    }

    #[test]
    fn resources_cannot_be_opened_as_scripts() {
        let mut cache = MemoryScriptCache::new();
        cache.insert_resource("res://icon.png", "Texture2D");
        let mut project = Project::new(Host::standard().with_scripts(cache), AnalyzerConfig::default());
        assert!(matches!(project.load("res://icon.png"), Err(AnalysisError::CantOpen { .. })));
    }

    #[test]
    fn adding_the_same_path_twice_keeps_the_first() {
        let mut project = Project::default();
        let first = project.add_script(script("res://a.os"));
        let second = project.add_script(script("res://a.os"));
        assert_eq!(first, second);
        assert_eq!(project.pool().len(), 1);
    }

    #[test]
    fn analysis_is_not_repeated() {
        let mut project = Project::default();
        let id = project.add_script(script("res://a.os"));
        assert_eq!(project.analyze(id), Ok(()));
        assert_eq!(project.script(id).status, ParserStatus::FullySolved);
        assert_eq!(project.analyze(id), Ok(()));
        assert_eq!(project.error_count(), 0);
    }
}
