//! Project-level registrations: autoload singletons and global script classes.

use indexmap::IndexMap;

/// A script or scene the engine instantiates at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autoload {
    pub name: String,
    pub path: String,
    /// Whether the autoload is reachable by name as a global.
    pub is_singleton: bool,
}

/// A script registered under a `class_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalClass {
    pub name: String,
    pub path: String,
    /// Native or global class the script extends.
    pub base: String,
}

pub trait ProjectSettings {
    fn autoload(&self, name: &str) -> Option<&Autoload>;

    fn global_class(&self, name: &str) -> Option<&GlobalClass>;

    /// Registered class name of the script at `path`.
    fn global_class_for_path(&self, path: &str) -> Option<&GlobalClass>;

    fn has_singleton_autoload(&self, name: &str) -> bool {
        self.autoload(name).is_some_and(|a| a.is_singleton)
    }

    fn is_global_class(&self, name: &str) -> bool {
        self.global_class(name).is_some()
    }
}

/// In-memory [`ProjectSettings`].
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    autoloads: IndexMap<String, Autoload>,
    global_classes: IndexMap<String, GlobalClass>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_autoload(&mut self, name: &str, path: &str, is_singleton: bool) -> &mut Self {
        tracing::trace!(name, path, "registering autoload");
        self.autoloads.insert(
            name.to_string(),
            Autoload {
                name: name.to_string(),
                path: path.to_string(),
                is_singleton,
            },
        );
        self
    }

    pub fn add_global_class(&mut self, name: &str, path: &str, base: &str) -> &mut Self {
        tracing::trace!(name, path, "registering global class");
        self.global_classes.insert(
            name.to_string(),
            GlobalClass {
                name: name.to_string(),
                path: path.to_string(),
                base: base.to_string(),
            },
        );
        self
    }

    pub fn autoloads(&self) -> impl Iterator<Item = &Autoload> {
        self.autoloads.values()
    }

    pub fn global_classes(&self) -> impl Iterator<Item = &GlobalClass> {
        self.global_classes.values()
    }
}

impl ProjectSettings for ProjectRegistry {
    fn autoload(&self, name: &str) -> Option<&Autoload> {
        self.autoloads.get(name)
    }

    fn global_class(&self, name: &str) -> Option<&GlobalClass> {
        self.global_classes.get(name)
    }

    fn global_class_for_path(&self, path: &str) -> Option<&GlobalClass> {
        self.global_classes.values().find(|class| class.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autoload_singletons() {
        let mut project = ProjectRegistry::new();
        project
            .add_autoload("Game", "res://game.os", true)
            .add_autoload("Hidden", "res://hidden.os", false);
        assert!(project.has_singleton_autoload("Game"));
        assert!(!project.has_singleton_autoload("Hidden"));
        assert_eq!(project.autoload("Hidden").map(|a| a.path.as_str()), Some("res://hidden.os"));
        assert_eq!(project.autoloads().count(), 2);
    }

    #[test]
    fn global_classes_by_name_and_path() {
        let mut project = ProjectRegistry::new();
        project.add_global_class("Enemy", "res://enemy.os", "CharacterBody2D");
        assert!(project.is_global_class("Enemy"));
        assert_eq!(
            project.global_class_for_path("res://enemy.os").map(|c| c.name.as_str()),
            Some("Enemy")
        );
        assert!(project.global_class_for_path("res://other.os").is_none());
    }
}
