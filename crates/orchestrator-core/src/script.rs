//! Scripts known only through their reflected interface.
//!
//! A [`ForeignScript`] describes a script whose tree is not part of the
//! analyzed pool, e.g. a script written in another language or a shallow
//! script served by the cache. The analyzer can query its members but never
//! resolves anything inside it.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::property_info::{MethodInfo, PropertyInfo};
use crate::variant::Variant;

#[derive(Debug, Clone, Default)]
pub struct ForeignScript {
    pub path: String,
    /// Registered global class name, empty when anonymous.
    pub global_name: String,
    /// Native class every instance ultimately derives from.
    pub native_base: String,
    pub base: Option<Arc<ForeignScript>>,
    pub is_abstract: bool,
    pub is_valid: bool,
    /// Whether this is an orchestration script loaded without its tree.
    pub is_orchestration: bool,
    pub constants: IndexMap<String, Variant>,
    pub properties: Vec<PropertyInfo>,
    pub methods: Vec<MethodInfo>,
    pub signals: Vec<MethodInfo>,
}

impl ForeignScript {
    pub fn new(path: impl Into<String>, native_base: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            native_base: native_base.into(),
            is_valid: true,
            ..Default::default()
        }
    }

    /// Resource class of the script object itself.
    pub fn resource_class(&self) -> &'static str {
        if self.is_orchestration { "OScript" } else { "Script" }
    }

    /// Iterate this script followed by its base scripts.
    pub fn ancestry(&self) -> impl Iterator<Item = &ForeignScript> {
        std::iter::successors(Some(self), |script| script.base.as_deref())
    }

    /// Whether `other` is this script or one of its bases.
    pub fn inherits(&self, other: &ForeignScript) -> bool {
        self.ancestry().any(|script| script.path == other.path)
    }

    pub fn get_constant(&self, name: &str) -> Option<&Variant> {
        self.ancestry().find_map(|script| script.constants.get(name))
    }

    pub fn get_property(&self, name: &str) -> Option<&PropertyInfo> {
        self.ancestry()
            .find_map(|script| script.properties.iter().find(|p| p.name == name))
    }

    pub fn get_method(&self, name: &str) -> Option<&MethodInfo> {
        self.ancestry()
            .find_map(|script| script.methods.iter().find(|m| m.name == name))
    }

    pub fn get_signal(&self, name: &str) -> Option<&MethodInfo> {
        self.ancestry()
            .find_map(|script| script.signals.iter().find(|s| s.name == name))
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.get_constant(name).is_some()
            || self.get_property(name).is_some()
            || self.get_method(name).is_some()
            || self.get_signal(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_resolve_through_base() {
        let mut base = ForeignScript::new("res://base.cs", "Node");
        base.constants.insert("SPEED".into(), Variant::Int(4));
        let mut child = ForeignScript::new("res://child.cs", "Node");
        child.base = Some(Arc::new(base));

        assert_eq!(child.get_constant("SPEED"), Some(&Variant::Int(4)));
        assert!(child.has_member("SPEED"));
        assert!(!child.has_member("missing"));
    }

    #[test]
    fn inherits_checks_ancestry() {
        let base = Arc::new(ForeignScript::new("res://base.cs", "Node"));
        let mut child = ForeignScript::new("res://child.cs", "Node");
        child.base = Some(base.clone());
        assert!(child.inherits(&base));
        assert!(!base.inherits(&child));
    }
}
