//! The type descriptor shared by every analysis pass.
//!
//! A [`DataType`] is a tagged union over the kinds of types a script can
//! observe:
//!
//! ```text
//! Builtin   a Variant kind, optionally with container element types
//! Native    an engine class
//! Script    a script known only through its reflected interface
//! Class     a class node of some tree in the pool
//! Enum      an enum; `native_type` names its owner for disambiguation
//! Variant   anything
//! Resolving sentinel while the type is being computed (cycle marker)
//! Unresolved sentinel before anything was computed
//! ```
//!
//! `type_source` ranks how much the type can be trusted. Only hard types
//! (explicitly annotated or inferred from an annotation) produce errors;
//! weaker types produce warnings and unsafe marks.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ids::ClassRef;
use crate::property_info::{MethodInfo, PropertyHint, PropertyInfo, PropertyUsage};
use crate::script::ForeignScript;
use crate::variant::VariantType;

/// Class name reported for native class meta types.
pub const NATIVE_CLASS_META: &str = "OScriptNativeClass";
/// Class name of orchestration script resources.
pub const SCRIPT_CLASS_META: &str = "OScript";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kind {
    Builtin,
    Native,
    Script,
    Class,
    Enum,
    Variant,
    Resolving,
    #[default]
    Unresolved,
}

/// How a type was obtained, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TypeSource {
    #[default]
    Undetected,
    Inferred,
    AnnotatedExplicit,
    AnnotatedInferred,
}

/// Non-owning link to a class node, together with the names needed to print
/// and compare it without reaching into the owning tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassHandle {
    pub id: ClassRef,
    pub fqcn: String,
    pub identifier: Option<String>,
    pub global_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct DataType {
    pub kind: Kind,
    pub type_source: TypeSource,
    pub builtin_type: VariantType,
    pub native_type: String,
    pub enum_type: String,
    pub script_type: Option<Arc<ForeignScript>>,
    pub script_path: String,
    pub class_type: Option<ClassHandle>,
    pub is_constant: bool,
    pub is_read_only: bool,
    pub is_meta_type: bool,
    pub is_pseudo_type: bool,
    pub is_coroutine: bool,
    pub method_info: MethodInfo,
    pub enum_values: IndexMap<String, i64>,
    pub container_element_types: Vec<DataType>,
}

impl DataType {
    /// A `Variant` with an inferred source.
    pub fn variant() -> DataType {
        DataType {
            kind: Kind::Variant,
            type_source: TypeSource::Inferred,
            ..Default::default()
        }
    }

    /// A `Variant` that carries no type information at all.
    pub fn undetected_variant() -> DataType {
        DataType {
            kind: Kind::Variant,
            type_source: TypeSource::Undetected,
            ..Default::default()
        }
    }

    pub fn resolving() -> DataType {
        DataType {
            kind: Kind::Resolving,
            ..Default::default()
        }
    }

    /// An instance of a builtin type.
    pub fn builtin(builtin_type: VariantType, type_source: TypeSource) -> DataType {
        DataType {
            kind: Kind::Builtin,
            type_source,
            builtin_type,
            ..Default::default()
        }
    }

    /// An instance of a native class.
    pub fn native(class_name: impl Into<String>, type_source: TypeSource) -> DataType {
        DataType {
            kind: Kind::Native,
            type_source,
            builtin_type: VariantType::Object,
            native_type: class_name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        !matches!(self.kind, Kind::Resolving | Kind::Unresolved)
    }

    #[inline]
    pub fn is_resolving(&self) -> bool {
        self.kind == Kind::Resolving
    }

    #[inline]
    pub fn has_no_type(&self) -> bool {
        self.type_source == TypeSource::Undetected
    }

    #[inline]
    pub fn is_variant(&self) -> bool {
        matches!(self.kind, Kind::Variant | Kind::Resolving | Kind::Unresolved)
    }

    #[inline]
    pub fn is_hard_type(&self) -> bool {
        self.type_source > TypeSource::Inferred
    }

    pub fn is_builtin(&self, builtin_type: VariantType) -> bool {
        self.kind == Kind::Builtin && self.builtin_type == builtin_type
    }

    // ------------------------------------------------------------------------
    // Container element types
    // ------------------------------------------------------------------------

    /// Set element type `index`, padding earlier slots with `Variant`.
    pub fn set_container_element_type(&mut self, index: usize, element: DataType) {
        while self.container_element_types.len() <= index {
            self.container_element_types.push(DataType::variant());
        }
        self.container_element_types[index] = element;
    }

    pub fn container_element_type_count(&self) -> usize {
        self.container_element_types.len()
    }

    pub fn get_container_element_type(&self, index: usize) -> Option<&DataType> {
        self.container_element_types.get(index)
    }

    pub fn get_container_element_type_or_variant(&self, index: usize) -> DataType {
        self.container_element_types
            .get(index)
            .cloned()
            .unwrap_or_else(DataType::variant)
    }

    pub fn has_container_element_type(&self, index: usize) -> bool {
        index < self.container_element_types.len()
    }

    pub fn has_container_element_types(&self) -> bool {
        !self.container_element_types.is_empty()
    }

    pub fn clear_container_element_types(&mut self) {
        self.container_element_types.clear();
    }

    /// Packed arrays behave as typed containers of their element kind.
    pub fn is_typed_container_type(&self) -> bool {
        self.kind == Kind::Builtin && self.builtin_type.packed_element_type().is_some()
    }

    pub fn get_typed_container_type(&self) -> DataType {
        DataType {
            kind: Kind::Builtin,
            builtin_type: self.builtin_type.packed_element_type().unwrap_or_default(),
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------------
    // Output contracts
    // ------------------------------------------------------------------------

    /// The type name, or `Variant` when the type is not hard.
    pub fn to_string_strict(&self) -> String {
        if self.is_hard_type() {
            self.to_string()
        } else {
            "Variant".to_string()
        }
    }

    /// Name used in container type hints.
    fn hint_name(&self) -> Option<String> {
        match self.kind {
            Kind::Builtin => Some(self.builtin_type.name().to_string()),
            Kind::Native => Some(self.native_type.clone()),
            Kind::Script => Some(match &self.script_type {
                Some(script) if !script.global_name.is_empty() => script.global_name.clone(),
                _ => self.native_type.clone(),
            }),
            Kind::Class => Some(match &self.class_type {
                Some(class) if !class.global_name.is_empty() => class.global_name.clone(),
                _ => self.native_type.clone(),
            }),
            Kind::Enum => Some(self.native_type.replace("::", ".")),
            Kind::Variant | Kind::Resolving | Kind::Unresolved => None,
        }
    }

    /// Describe this type the way the editor and the engine expect it.
    pub fn to_property_info(&self, name: &str) -> PropertyInfo {
        let mut result = PropertyInfo {
            name: name.to_string(),
            usage: PropertyUsage::empty(),
            ..Default::default()
        };

        if !self.is_hard_type() {
            result.usage |= PropertyUsage::NIL_IS_VARIANT;
            return result;
        }

        match self.kind {
            Kind::Builtin => {
                result.ty = self.builtin_type;
                if self.builtin_type == VariantType::Array {
                    if let Some(hint) = self.get_container_element_type(0).and_then(DataType::hint_name) {
                        result.hint = PropertyHint::ArrayType;
                        result.hint_string = hint;
                    }
                } else if self.builtin_type == VariantType::Dictionary && self.has_container_element_types() {
                    let key = self.get_container_element_type_or_variant(0);
                    let value = self.get_container_element_type_or_variant(1);
                    let unresolved = |t: &DataType| matches!(t.kind, Kind::Resolving | Kind::Unresolved);
                    let both_variant = key.kind == Kind::Variant && value.kind == Kind::Variant;
                    if !both_variant && !unresolved(&key) && !unresolved(&value) {
                        let key_hint = key.hint_name().unwrap_or_else(|| "Variant".to_string());
                        let value_hint = value.hint_name().unwrap_or_else(|| "Variant".to_string());
                        result.hint = PropertyHint::DictionaryType;
                        result.hint_string = format!("{key_hint};{value_hint}");
                    }
                }
            }
            Kind::Native => {
                result.ty = VariantType::Object;
                result.class_name = if self.is_meta_type {
                    NATIVE_CLASS_META.to_string()
                } else {
                    self.native_type.clone()
                };
            }
            Kind::Script => {
                result.ty = VariantType::Object;
                result.class_name = match &self.script_type {
                    Some(script) if self.is_meta_type => script.resource_class().to_string(),
                    None if self.is_meta_type => "Script".to_string(),
                    Some(script) if !script.global_name.is_empty() => script.global_name.clone(),
                    _ => self.native_type.clone(),
                };
            }
            Kind::Class => {
                result.ty = VariantType::Object;
                result.class_name = if self.is_meta_type {
                    SCRIPT_CLASS_META.to_string()
                } else {
                    match &self.class_type {
                        Some(class) if !class.global_name.is_empty() => class.global_name.clone(),
                        _ => self.native_type.clone(),
                    }
                };
            }
            Kind::Enum => {
                if self.is_meta_type {
                    result.ty = VariantType::Dictionary;
                } else {
                    result.ty = VariantType::Int;
                    result.usage |= PropertyUsage::CLASS_IS_ENUM;
                    result.class_name = self.native_type.replace("::", ".");
                }
            }
            Kind::Variant | Kind::Resolving | Kind::Unresolved => {
                result.usage |= PropertyUsage::NIL_IS_VARIANT;
            }
        }

        result
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Variant => f.write_str("Variant"),
            Kind::Builtin => {
                if self.builtin_type == VariantType::Nil {
                    return f.write_str("null");
                }
                if self.builtin_type == VariantType::Array {
                    if let Some(element) = self.get_container_element_type(0) {
                        return write!(f, "Array[{element}]");
                    }
                }
                if self.builtin_type == VariantType::Dictionary && self.has_container_element_types() {
                    return write!(
                        f,
                        "Dictionary[{}, {}]",
                        self.get_container_element_type_or_variant(0),
                        self.get_container_element_type_or_variant(1)
                    );
                }
                f.write_str(self.builtin_type.name())
            }
            Kind::Native => {
                if self.is_meta_type {
                    f.write_str(NATIVE_CLASS_META)
                } else {
                    f.write_str(&self.native_type)
                }
            }
            Kind::Class => match &self.class_type {
                Some(ClassHandle {
                    identifier: Some(name), ..
                }) => f.write_str(name),
                Some(class) => f.write_str(&class.fqcn),
                None => f.write_str("<unresolved type>"),
            },
            Kind::Script => {
                if self.is_meta_type {
                    let class = self.script_type.as_ref().map_or("", |s| s.resource_class());
                    return f.write_str(class);
                }
                if let Some(script) = &self.script_type {
                    if !script.global_name.is_empty() {
                        return f.write_str(&script.global_name);
                    }
                }
                if !self.script_path.is_empty() {
                    return f.write_str(&self.script_path);
                }
                f.write_str(&self.native_type)
            }
            Kind::Enum => {
                // Owner paths are dropped, the enum keeps its qualified tail.
                let name = self.native_type.rsplit('/').next().unwrap_or(&self.native_type);
                f.write_str(name)
            }
            Kind::Resolving | Kind::Unresolved => f.write_str("<unresolved type>"),
        }
    }
}

impl PartialEq for DataType {
    /// Approximate equality used while parsing: weakly typed sides always
    /// compare equal so re-entrant resolution does not flag spurious changes.
    fn eq(&self, other: &Self) -> bool {
        if self.type_source <= TypeSource::Inferred || other.type_source <= TypeSource::Inferred {
            return true;
        }
        if self.kind != other.kind {
            return false;
        }
        match self.kind {
            Kind::Variant => true,
            Kind::Builtin => self.builtin_type == other.builtin_type,
            Kind::Native | Kind::Enum => self.native_type == other.native_type,
            Kind::Script => match (&self.script_type, &other.script_type) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a.path == b.path,
                (None, None) => self.script_path == other.script_path,
                _ => false,
            },
            Kind::Class => match (&self.class_type, &other.class_type) {
                (Some(a), Some(b)) => a.id == b.id || a.fqcn == b.fqcn,
                _ => false,
            },
            Kind::Resolving | Kind::Unresolved => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ClassId, ParserId};

    fn hard(ty: VariantType) -> DataType {
        DataType::builtin(ty, TypeSource::AnnotatedExplicit)
    }

    fn class_handle(fqcn: &str, global_name: &str) -> ClassHandle {
        ClassHandle {
            id: ClassRef::new(ParserId::new(0), ClassId::new(0)),
            fqcn: fqcn.to_string(),
            identifier: None,
            global_name: global_name.to_string(),
        }
    }

    #[test]
    fn predicates() {
        let unresolved = DataType::default();
        assert!(!unresolved.is_set());
        assert!(unresolved.is_variant());
        assert!(unresolved.has_no_type());
        assert!(DataType::resolving().is_resolving());
        assert!(hard(VariantType::Int).is_hard_type());
        assert!(!DataType::variant().is_hard_type());
    }

    #[test]
    fn container_padding() {
        let mut dict = hard(VariantType::Dictionary);
        dict.set_container_element_type(1, hard(VariantType::Int));
        assert_eq!(dict.container_element_type_count(), 2);
        assert_eq!(dict.get_container_element_type(0).map(|t| t.kind), Some(Kind::Variant));
        assert_eq!(dict.to_string(), "Dictionary[Variant, int]");
    }

    #[test]
    fn type_names() {
        let mut array = hard(VariantType::Array);
        assert_eq!(array.to_string(), "Array");
        array.set_container_element_type(0, hard(VariantType::Int));
        assert_eq!(array.to_string(), "Array[int]");
        assert_eq!(hard(VariantType::Nil).to_string(), "null");
        assert_eq!(DataType::variant().to_string(), "Variant");
        assert_eq!(DataType::resolving().to_string(), "<unresolved type>");

        let mut native = DataType::native("Node", TypeSource::AnnotatedExplicit);
        assert_eq!(native.to_string(), "Node");
        native.is_meta_type = true;
        assert_eq!(native.to_string(), NATIVE_CLASS_META);
    }

    #[test]
    fn strict_names() {
        assert_eq!(DataType::builtin(VariantType::Int, TypeSource::Inferred).to_string_strict(), "Variant");
        assert_eq!(hard(VariantType::Int).to_string_strict(), "int");
    }

    #[test]
    fn equality_is_lenient_for_weak_sources() {
        let weak = DataType::builtin(VariantType::Int, TypeSource::Inferred);
        assert_eq!(weak, hard(VariantType::String));
        assert_ne!(hard(VariantType::Int), hard(VariantType::String));
        assert_eq!(hard(VariantType::Int), hard(VariantType::Int));
    }

    #[test]
    fn class_equality_falls_back_to_fqcn() {
        let mut a = DataType {
            kind: Kind::Class,
            type_source: TypeSource::AnnotatedExplicit,
            class_type: Some(class_handle("res://a.os", "")),
            ..Default::default()
        };
        let mut b = a.clone();
        if let Some(handle) = b.class_type.as_mut() {
            handle.id = ClassRef::new(ParserId::new(4), ClassId::new(0));
        }
        assert_eq!(a, b);
        if let Some(handle) = a.class_type.as_mut() {
            handle.fqcn = "res://other.os".to_string();
            handle.id = ClassRef::new(ParserId::new(9), ClassId::new(1));
        }
        assert_ne!(a, b);
    }

    #[test]
    fn property_info_for_weak_type() {
        let info = DataType::variant().to_property_info("x");
        assert_eq!(info.ty, VariantType::Nil);
        assert!(info.usage.contains(PropertyUsage::NIL_IS_VARIANT));
    }

    #[test]
    fn property_info_for_typed_array() {
        let mut array = hard(VariantType::Array);
        array.set_container_element_type(0, DataType::native("Node", TypeSource::AnnotatedExplicit));
        let info = array.to_property_info("nodes");
        assert_eq!(info.ty, VariantType::Array);
        assert_eq!(info.hint, PropertyHint::ArrayType);
        assert_eq!(info.hint_string, "Node");
    }

    #[test]
    fn property_info_for_typed_dictionary() {
        let mut dict = hard(VariantType::Dictionary);
        dict.set_container_element_type(1, hard(VariantType::Float));
        let info = dict.to_property_info("weights");
        assert_eq!(info.hint, PropertyHint::DictionaryType);
        assert_eq!(info.hint_string, "Variant;float");

        let mut untyped = hard(VariantType::Dictionary);
        untyped.set_container_element_type(1, DataType::variant());
        assert_eq!(untyped.to_property_info("d").hint, PropertyHint::None);
    }

    #[test]
    fn property_info_for_enum() {
        let enum_type = DataType {
            kind: Kind::Enum,
            type_source: TypeSource::AnnotatedExplicit,
            builtin_type: VariantType::Int,
            native_type: "Node::ProcessMode".to_string(),
            ..Default::default()
        };
        let info = enum_type.to_property_info("mode");
        assert_eq!(info.ty, VariantType::Int);
        assert_eq!(info.class_name, "Node.ProcessMode");
        assert!(info.usage.contains(PropertyUsage::CLASS_IS_ENUM));
    }

    #[test]
    fn property_info_for_class() {
        let class = DataType {
            kind: Kind::Class,
            type_source: TypeSource::AnnotatedExplicit,
            native_type: "Node".to_string(),
            class_type: Some(class_handle("res://player.os", "Player")),
            ..Default::default()
        };
        assert_eq!(class.to_property_info("p").class_name, "Player");
        let mut meta = class.clone();
        meta.is_meta_type = true;
        assert_eq!(meta.to_property_info("p").class_name, SCRIPT_CLASS_META);
    }

    #[test]
    fn packed_arrays_are_typed_containers() {
        let packed = hard(VariantType::PackedStringArray);
        assert!(packed.is_typed_container_type());
        assert_eq!(packed.get_typed_container_type().builtin_type, VariantType::String);
        assert!(!hard(VariantType::Array).is_typed_container_type());
    }
}
