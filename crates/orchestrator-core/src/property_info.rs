//! Reflection records exchanged with the editor and the engine.
//!
//! [`PropertyInfo`] and [`MethodInfo`] are the output contract of analysis:
//! every resolved declaration can be described with them, and the native
//! class database describes engine members with the same shapes.

use bitflags::bitflags;

use crate::variant::{Variant, VariantType};

bitflags! {
    /// Usage flags of a property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyUsage: u32 {
        const STORAGE = 1 << 1;
        const EDITOR = 1 << 2;
        const CHECKABLE = 1 << 4;
        const GROUP = 1 << 7;
        const CATEGORY = 1 << 8;
        const SUBGROUP = 1 << 9;
        const CLASS_IS_BITFIELD = 1 << 10;
        const SCRIPT_VARIABLE = 1 << 12;
        const CLASS_IS_ENUM = 1 << 16;
        const NIL_IS_VARIANT = 1 << 17;
        const READ_ONLY = 1 << 27;
        const DEFAULT = Self::STORAGE.bits() | Self::EDITOR.bits();
    }
}

bitflags! {
    /// Flags attached to a method description.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u32 {
        const NORMAL = 1;
        const EDITOR = 1 << 1;
        const CONST = 1 << 2;
        const VIRTUAL = 1 << 3;
        const VARARG = 1 << 4;
        const STATIC = 1 << 5;
        const OBJECT_CORE = 1 << 6;
        const VIRTUAL_REQUIRED = 1 << 7;
    }
}

impl Default for MethodFlags {
    fn default() -> Self {
        MethodFlags::NORMAL
    }
}

/// Editor hint of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropertyHint {
    #[default]
    None,
    Range,
    Enum,
    Flags,
    File,
    Dir,
    ResourceType,
    MultilineText,
    NodeType,
    TypeString,
    ArrayType,
    DictionaryType,
}

/// Description of a property, argument or return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PropertyInfo {
    pub ty: VariantType,
    pub name: String,
    pub class_name: String,
    pub hint: PropertyHint,
    pub hint_string: String,
    pub usage: PropertyUsage,
}

impl PropertyInfo {
    pub fn new(ty: VariantType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
            usage: PropertyUsage::DEFAULT,
            ..Default::default()
        }
    }

    /// A property holding an instance of a native class.
    pub fn object(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            ty: VariantType::Object,
            name: name.into(),
            class_name: class_name.into(),
            usage: PropertyUsage::DEFAULT,
            ..Default::default()
        }
    }

    /// An untyped slot that accepts any value.
    pub fn variant(name: impl Into<String>) -> Self {
        Self {
            ty: VariantType::Nil,
            name: name.into(),
            usage: PropertyUsage::DEFAULT | PropertyUsage::NIL_IS_VARIANT,
            ..Default::default()
        }
    }

    /// An integer slot typed as `Owner.Enum`.
    pub fn enumeration(name: impl Into<String>, enum_name: impl Into<String>) -> Self {
        Self {
            ty: VariantType::Int,
            name: name.into(),
            class_name: enum_name.into(),
            usage: PropertyUsage::DEFAULT | PropertyUsage::CLASS_IS_ENUM,
            ..Default::default()
        }
    }

    pub fn with_hint(mut self, hint: PropertyHint, hint_string: impl Into<String>) -> Self {
        self.hint = hint;
        self.hint_string = hint_string.into();
        self
    }

    pub fn is_variant(&self) -> bool {
        self.ty == VariantType::Nil && self.usage.contains(PropertyUsage::NIL_IS_VARIANT)
    }
}

/// Description of a method, signal or utility function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MethodInfo {
    pub name: String,
    pub arguments: Vec<PropertyInfo>,
    /// Defaults for the trailing arguments.
    pub default_arguments: Vec<Variant>,
    pub return_val: PropertyInfo,
    pub flags: MethodFlags,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, arguments: Vec<PropertyInfo>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_return(mut self, return_val: PropertyInfo) -> Self {
        self.return_val = return_val;
        self
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_defaults(mut self, defaults: Vec<Variant>) -> Self {
        self.default_arguments = defaults;
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    pub fn is_vararg(&self) -> bool {
        self.flags.contains(MethodFlags::VARARG)
    }

    /// Arguments that must always be supplied.
    pub fn required_argument_count(&self) -> usize {
        self.arguments.len().saturating_sub(self.default_arguments.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_arguments_exclude_defaults() {
        let method = MethodInfo::new("move")
            .with_args(vec![
                PropertyInfo::new(VariantType::Vector2, "to"),
                PropertyInfo::new(VariantType::Float, "speed"),
            ])
            .with_defaults(vec![Variant::float(1.0)]);
        assert_eq!(method.required_argument_count(), 1);
    }

    #[test]
    fn variant_property() {
        assert!(PropertyInfo::variant("value").is_variant());
        assert!(!PropertyInfo::new(VariantType::Nil, "value").is_variant());
    }

    #[test]
    fn method_flags_accumulate() {
        let method = MethodInfo::new("f").with_flags(MethodFlags::STATIC | MethodFlags::VARARG);
        assert!(method.is_static());
        assert!(method.is_vararg());
        assert!(method.flags.contains(MethodFlags::NORMAL));
    }
}
