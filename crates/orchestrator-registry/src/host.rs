//! The bundle of oracles an analysis runs against.

use crate::cache::{MemoryScriptCache, ScriptCache};
use crate::class_db::{ClassDb, ClassRegistry};
use crate::project::{ProjectRegistry, ProjectSettings};
use crate::utility::{UtilityFunctions, UtilityRegistry};
use crate::value::{BuiltinValueModel, ValueModel};

/// Read-only services shared by every analyzer of a project.
pub struct Host {
    pub classes: Box<dyn ClassDb>,
    pub values: Box<dyn ValueModel>,
    pub utilities: Box<dyn UtilityFunctions>,
    pub project: Box<dyn ProjectSettings>,
    pub scripts: Box<dyn ScriptCache>,
}

impl Host {
    /// Core engine classes, builtin types and utilities; no project data.
    pub fn standard() -> Self {
        Self {
            classes: Box::new(ClassRegistry::with_core_classes()),
            values: Box::new(BuiltinValueModel::new()),
            utilities: Box::new(UtilityRegistry::standard()),
            project: Box::new(ProjectRegistry::new()),
            scripts: Box::new(MemoryScriptCache::new()),
        }
    }

    pub fn with_classes(mut self, classes: impl ClassDb + 'static) -> Self {
        self.classes = Box::new(classes);
        self
    }

    pub fn with_project(mut self, project: impl ProjectSettings + 'static) -> Self {
        self.project = Box::new(project);
        self
    }

    pub fn with_scripts(mut self, scripts: impl ScriptCache + 'static) -> Self {
        self.scripts = Box::new(scripts);
        self
    }

    pub fn with_utilities(mut self, utilities: impl UtilityFunctions + 'static) -> Self {
        self.utilities = Box::new(utilities);
        self
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_host_answers_queries() {
        let mut project = ProjectRegistry::new();
        project.add_autoload("Game", "res://game.os", true);
        let host = Host::standard().with_project(project);

        assert!(host.classes.class_exists("Node"));
        assert!(host.values.has_method(orchestrator_core::VariantType::String, "length"));
        assert!(host.utilities.can_fold("sqrt"));
        assert!(host.project.has_singleton_autoload("Game"));
        assert!(!host.scripts.exists("res://game.os"));
    }
}
