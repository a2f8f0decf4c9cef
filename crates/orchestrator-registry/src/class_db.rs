//! The native class database.
//!
//! [`ClassDb`] is the read-only oracle over engine classes: ancestry, methods,
//! properties, signals, integer constants and enums, plus the engine's global
//! scope (global constants, global enums and singletons). [`ClassRegistry`] is
//! the in-memory implementation, populated with [`NativeClass`] entries.
//!
//! Queries that name a member walk the parent chain unless stated otherwise.

use indexmap::IndexMap;
use orchestrator_core::{MethodInfo, PropertyInfo};
use rustc_hash::FxHashMap;

/// A property of a native class with its accessor names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeProperty {
    pub info: PropertyInfo,
    pub getter: String,
    pub setter: String,
}

/// One engine class.
#[derive(Debug, Clone, Default)]
pub struct NativeClass {
    pub name: String,
    pub parent: Option<String>,
    pub is_abstract: bool,
    /// Hidden from scripts.
    pub is_exposed: bool,
    pub methods: IndexMap<String, MethodInfo>,
    pub properties: IndexMap<String, NativeProperty>,
    pub signals: IndexMap<String, MethodInfo>,
    pub constants: IndexMap<String, i64>,
    /// `enum name -> (constant -> value)`.
    pub enums: IndexMap<String, IndexMap<String, i64>>,
}

impl NativeClass {
    pub fn new(name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            is_exposed: true,
            ..Default::default()
        }
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    /// A property with conventional `get_`/`set_` accessors.
    pub fn property(mut self, info: PropertyInfo) -> Self {
        let getter = format!("get_{}", info.name);
        let setter = format!("set_{}", info.name);
        self.properties
            .insert(info.name.clone(), NativeProperty { info, getter, setter });
        self
    }

    pub fn signal(mut self, signal: MethodInfo) -> Self {
        self.signals.insert(signal.name.clone(), signal);
        self
    }

    pub fn constant(mut self, name: &str, value: i64) -> Self {
        self.constants.insert(name.to_string(), value);
        self
    }

    /// An enum whose values are also exposed as class constants.
    pub fn enumeration(mut self, name: &str, values: &[(&str, i64)]) -> Self {
        let mut map = IndexMap::new();
        for (key, value) in values {
            map.insert(key.to_string(), *value);
            self.constants.insert(key.to_string(), *value);
        }
        self.enums.insert(name.to_string(), map);
        self
    }
}

/// A global constant of the engine scope, optionally belonging to a global enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConstant {
    pub value: i64,
    pub enum_name: Option<String>,
}

/// Read-only access to engine classes.
pub trait ClassDb {
    /// The class entry itself, without walking ancestry.
    fn get_class(&self, class: &str) -> Option<&NativeClass>;

    fn global_constant(&self, name: &str) -> Option<&GlobalConstant>;

    fn global_enum(&self, name: &str) -> Option<&IndexMap<String, i64>>;

    /// Native class of an engine singleton, e.g. `Input -> Input`.
    fn singleton(&self, name: &str) -> Option<&str>;

    fn class_exists(&self, class: &str) -> bool {
        self.get_class(class).is_some_and(|c| c.is_exposed)
    }

    fn parent_class(&self, class: &str) -> Option<&str> {
        self.get_class(class).and_then(|c| c.parent.as_deref())
    }

    fn is_abstract(&self, class: &str) -> bool {
        self.get_class(class).is_some_and(|c| c.is_abstract)
    }

    /// Whether `class` is `parent` or derives from it.
    fn is_parent_class(&self, class: &str, parent: &str) -> bool {
        let mut current = Some(class);
        while let Some(name) = current {
            if name == parent {
                return true;
            }
            current = self.parent_class(name);
        }
        false
    }

    /// `class` followed by its ancestors.
    fn ancestry(&self, class: &str) -> Vec<&NativeClass> {
        let mut chain = Vec::new();
        let mut current = self.get_class(class);
        while let Some(entry) = current {
            chain.push(entry);
            current = entry.parent.as_deref().and_then(|parent| self.get_class(parent));
        }
        chain
    }

    fn get_method_info(&self, class: &str, method: &str) -> Option<&MethodInfo> {
        self.ancestry(class)
            .into_iter()
            .find_map(|entry| entry.methods.get(method))
    }

    fn has_method(&self, class: &str, method: &str, no_inheritance: bool) -> bool {
        if no_inheritance {
            self.get_class(class).is_some_and(|c| c.methods.contains_key(method))
        } else {
            self.get_method_info(class, method).is_some()
        }
    }

    fn get_property(&self, class: &str, property: &str) -> Option<&NativeProperty> {
        self.ancestry(class)
            .into_iter()
            .find_map(|entry| entry.properties.get(property))
    }

    fn has_property(&self, class: &str, property: &str) -> bool {
        self.get_property(class, property).is_some()
    }

    fn get_signal(&self, class: &str, signal: &str) -> Option<&MethodInfo> {
        self.ancestry(class)
            .into_iter()
            .find_map(|entry| entry.signals.get(signal))
    }

    fn has_signal(&self, class: &str, signal: &str) -> bool {
        self.get_signal(class, signal).is_some()
    }

    fn get_integer_constant(&self, class: &str, name: &str) -> Option<i64> {
        self.ancestry(class)
            .into_iter()
            .find_map(|entry| entry.constants.get(name).copied())
    }

    /// The enum a class constant belongs to, if any.
    fn get_integer_constant_enum(&self, class: &str, name: &str) -> Option<&str> {
        self.ancestry(class).into_iter().find_map(|entry| {
            entry
                .enums
                .iter()
                .find(|(_, values)| values.contains_key(name))
                .map(|(enum_name, _)| enum_name.as_str())
        })
    }

    fn get_enum_constants(&self, class: &str, enum_name: &str) -> Option<&IndexMap<String, i64>> {
        self.ancestry(class)
            .into_iter()
            .find_map(|entry| entry.enums.get(enum_name))
    }

    fn has_enum(&self, class: &str, enum_name: &str) -> bool {
        self.get_enum_constants(class, enum_name).is_some()
    }
}

/// In-memory [`ClassDb`].
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, NativeClass>,
    global_constants: IndexMap<String, GlobalConstant>,
    global_enums: IndexMap<String, IndexMap<String, i64>>,
    singletons: IndexMap<String, String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the engine classes scripts commonly extend.
    pub fn with_core_classes() -> Self {
        let mut registry = Self::new();
        crate::core_classes::register(&mut registry);
        registry
    }

    pub fn register(&mut self, class: NativeClass) -> &mut Self {
        tracing::trace!(class = %class.name, "registering native class");
        self.classes.insert(class.name.clone(), class);
        self
    }

    /// A global enum whose values are also global constants.
    pub fn register_global_enum(&mut self, name: &str, values: &[(&str, i64)]) -> &mut Self {
        let mut map = IndexMap::new();
        for (key, value) in values {
            map.insert(key.to_string(), *value);
            self.global_constants.insert(
                key.to_string(),
                GlobalConstant {
                    value: *value,
                    enum_name: Some(name.to_string()),
                },
            );
        }
        self.global_enums.insert(name.to_string(), map);
        self
    }

    pub fn register_global_constant(&mut self, name: &str, value: i64) -> &mut Self {
        self.global_constants.insert(
            name.to_string(),
            GlobalConstant {
                value,
                enum_name: None,
            },
        );
        self
    }

    pub fn register_singleton(&mut self, name: &str, class: &str) -> &mut Self {
        self.singletons.insert(name.to_string(), class.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassDb for ClassRegistry {
    fn get_class(&self, class: &str) -> Option<&NativeClass> {
        self.classes.get(class)
    }

    fn global_constant(&self, name: &str) -> Option<&GlobalConstant> {
        self.global_constants.get(name)
    }

    fn global_enum(&self, name: &str) -> Option<&IndexMap<String, i64>> {
        self.global_enums.get(name)
    }

    fn singleton(&self, name: &str) -> Option<&str> {
        self.singletons.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator_core::VariantType;

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry
            .register(
                NativeClass::new("Object", None)
                    .method(MethodInfo::new("get_class").with_return(PropertyInfo::new(VariantType::String, ""))),
            )
            .register(
                NativeClass::new("Node", Some("Object"))
                    .property(PropertyInfo::new(VariantType::String, "name"))
                    .signal(MethodInfo::new("ready"))
                    .enumeration("ProcessMode", &[("PROCESS_MODE_INHERIT", 0), ("PROCESS_MODE_ALWAYS", 3)]),
            )
            .register(NativeClass::new("Timer", Some("Node")))
            .register_global_enum("Error", &[("OK", 0), ("FAILED", 1)])
            .register_singleton("Input", "Input");
        registry
    }

    #[test]
    fn ancestry_queries() {
        let db = registry();
        assert!(db.class_exists("Timer"));
        assert!(db.is_parent_class("Timer", "Object"));
        assert!(!db.is_parent_class("Object", "Timer"));
        assert_eq!(db.parent_class("Timer"), Some("Node"));
        assert_eq!(db.ancestry("Timer").len(), 3);
    }

    #[test]
    fn members_walk_parents() {
        let db = registry();
        assert!(db.has_method("Timer", "get_class", false));
        assert!(!db.has_method("Timer", "get_class", true));
        assert!(db.has_property("Timer", "name"));
        assert_eq!(db.get_property("Timer", "name").map(|p| p.setter.as_str()), Some("set_name"));
        assert!(db.has_signal("Timer", "ready"));
    }

    #[test]
    fn enums_and_constants() {
        let db = registry();
        assert_eq!(db.get_integer_constant("Timer", "PROCESS_MODE_ALWAYS"), Some(3));
        assert_eq!(db.get_integer_constant_enum("Node", "PROCESS_MODE_ALWAYS"), Some("ProcessMode"));
        assert!(db.has_enum("Timer", "ProcessMode"));
        assert_eq!(db.global_constant("FAILED").and_then(|c| c.enum_name.as_deref()), Some("Error"));
        assert_eq!(db.global_enum("Error").map(IndexMap::len), Some(2));
        assert_eq!(db.singleton("Input"), Some("Input"));
    }
}
