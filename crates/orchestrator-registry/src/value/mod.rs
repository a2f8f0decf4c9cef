//! The builtin value model.
//!
//! [`ValueModel`] is the analyzer's view of builtin types: constructors,
//! operators, members, conversions and the constant-folding entry points.
//! [`BuiltinValueModel`] builds its member tables once per type.

mod construct;
mod convert;
mod members;
mod operators;

use indexmap::IndexMap;
use orchestrator_core::{CallError, MethodFlags, MethodInfo, Variant, VariantOperator, VariantType};
use rustc_hash::FxHashMap;

pub use construct::{construct, constructors, default_value};
pub use convert::{can_convert, can_convert_strict, convert};
pub use members::{call_method, get_indexed, get_named};
pub use operators::{evaluate, format_string, return_type, variant_equal};

/// Read-only access to builtin types.
pub trait ValueModel {
    /// Build a value of `ty`; the folding counterpart of a constructor call.
    fn construct(&self, ty: VariantType, args: &[Variant]) -> Result<Variant, CallError>;

    fn constructor_list(&self, ty: VariantType) -> &[MethodInfo];

    /// Result kind of the validated operator for the operand kinds.
    fn operator_return_type(&self, op: VariantOperator, a: VariantType, b: VariantType) -> Option<VariantType>;

    fn evaluate(&self, op: VariantOperator, a: &Variant, b: &Variant) -> Result<Variant, CallError>;

    fn method_list(&self, ty: VariantType) -> &[MethodInfo];

    fn get_method(&self, ty: VariantType, name: &str) -> Option<&MethodInfo> {
        self.method_list(ty).iter().find(|m| m.name == name)
    }

    fn has_method(&self, ty: VariantType, name: &str) -> bool {
        self.get_method(ty, name).is_some()
    }

    /// Type of the named property `ty.name`.
    fn member_type(&self, ty: VariantType, name: &str) -> Option<VariantType>;

    fn has_member(&self, ty: VariantType, name: &str) -> bool {
        self.member_type(ty, name).is_some()
    }

    fn constant(&self, ty: VariantType, name: &str) -> Option<&Variant>;

    fn has_constant(&self, ty: VariantType, name: &str) -> bool {
        self.constant(ty, name).is_some()
    }

    fn enum_values(&self, ty: VariantType, enum_name: &str) -> Option<&IndexMap<String, i64>>;

    fn has_enum(&self, ty: VariantType, enum_name: &str) -> bool {
        self.enum_values(ty, enum_name).is_some()
    }

    /// Enum a constant of `ty` belongs to.
    fn enum_for_constant(&self, ty: VariantType, name: &str) -> Option<&str>;

    fn get_named(&self, value: &Variant, name: &str) -> Option<Variant>;

    fn get_indexed(&self, value: &Variant, index: &Variant) -> Option<Variant>;

    /// Call a const method on a constant value.
    fn call_method(&self, value: &Variant, name: &str, args: &[Variant]) -> Result<Variant, CallError>;

    fn can_convert_strict(&self, from: VariantType, to: VariantType) -> bool;

    fn can_convert(&self, from: VariantType, to: VariantType) -> bool;

    fn convert(&self, value: &Variant, to: VariantType) -> Option<Variant>;

    fn default_value(&self, ty: VariantType) -> Variant;
}

/// Member tables of one builtin type.
#[derive(Debug, Default)]
pub struct BuiltinTypeInfo {
    pub constructors: Vec<MethodInfo>,
    pub methods: Vec<MethodInfo>,
    pub members: IndexMap<String, VariantType>,
    pub constants: IndexMap<String, Variant>,
    pub enums: IndexMap<String, IndexMap<String, i64>>,
}

impl BuiltinTypeInfo {
    fn new(ty: VariantType) -> Self {
        Self {
            constructors: constructors(ty),
            methods: members::methods(ty),
            members: members::properties(ty)
                .iter()
                .map(|(name, member_ty)| (name.to_string(), *member_ty))
                .collect(),
            constants: members::constants(ty),
            enums: members::enums(ty),
        }
    }
}

/// The engine's builtin types.
#[derive(Debug)]
pub struct BuiltinValueModel {
    types: FxHashMap<VariantType, BuiltinTypeInfo>,
}

impl BuiltinValueModel {
    pub fn new() -> Self {
        let types = VariantType::ALL
            .iter()
            .map(|ty| (*ty, BuiltinTypeInfo::new(*ty)))
            .collect();
        Self { types }
    }

    pub fn type_info(&self, ty: VariantType) -> Option<&BuiltinTypeInfo> {
        self.types.get(&ty)
    }
}

impl Default for BuiltinValueModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueModel for BuiltinValueModel {
    fn construct(&self, ty: VariantType, args: &[Variant]) -> Result<Variant, CallError> {
        construct(ty, args)
    }

    fn constructor_list(&self, ty: VariantType) -> &[MethodInfo] {
        self.type_info(ty).map(|info| info.constructors.as_slice()).unwrap_or_default()
    }

    fn operator_return_type(&self, op: VariantOperator, a: VariantType, b: VariantType) -> Option<VariantType> {
        return_type(op, a, b)
    }

    fn evaluate(&self, op: VariantOperator, a: &Variant, b: &Variant) -> Result<Variant, CallError> {
        evaluate(op, a, b)
    }

    fn method_list(&self, ty: VariantType) -> &[MethodInfo] {
        self.type_info(ty).map(|info| info.methods.as_slice()).unwrap_or_default()
    }

    fn member_type(&self, ty: VariantType, name: &str) -> Option<VariantType> {
        self.type_info(ty)?.members.get(name).copied()
    }

    fn constant(&self, ty: VariantType, name: &str) -> Option<&Variant> {
        self.type_info(ty)?.constants.get(name)
    }

    fn enum_values(&self, ty: VariantType, enum_name: &str) -> Option<&IndexMap<String, i64>> {
        self.type_info(ty)?.enums.get(enum_name)
    }

    fn enum_for_constant(&self, ty: VariantType, name: &str) -> Option<&str> {
        self.type_info(ty)?
            .enums
            .iter()
            .find(|(_, values)| values.contains_key(name))
            .map(|(enum_name, _)| enum_name.as_str())
    }

    fn get_named(&self, value: &Variant, name: &str) -> Option<Variant> {
        get_named(value, name)
    }

    fn get_indexed(&self, value: &Variant, index: &Variant) -> Option<Variant> {
        get_indexed(value, index)
    }

    fn call_method(&self, value: &Variant, name: &str, args: &[Variant]) -> Result<Variant, CallError> {
        let is_const = self
            .get_method(value.get_type(), name)
            .is_some_and(|m| m.flags.contains(MethodFlags::CONST));
        if !is_const {
            return Err(CallError::InvalidMethod);
        }
        call_method(value, name, args)
    }

    fn can_convert_strict(&self, from: VariantType, to: VariantType) -> bool {
        can_convert_strict(from, to)
    }

    fn can_convert(&self, from: VariantType, to: VariantType) -> bool {
        can_convert(from, to)
    }

    fn convert(&self, value: &Variant, to: VariantType) -> Option<Variant> {
        convert(value, to)
    }

    fn default_value(&self, ty: VariantType) -> Variant {
        default_value(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_cover_every_type() {
        let model = BuiltinValueModel::new();
        for ty in VariantType::ALL {
            assert!(model.type_info(ty).is_some());
        }
        assert!(model.constructor_list(VariantType::Nil).is_empty());
        assert!(!model.constructor_list(VariantType::Vector2).is_empty());
    }

    #[test]
    fn member_lookup() {
        let model = BuiltinValueModel::new();
        assert_eq!(model.member_type(VariantType::Vector2, "x"), Some(VariantType::Float));
        assert!(model.has_method(VariantType::Array, "append"));
        assert!(model.has_constant(VariantType::Color, "RED"));
        assert_eq!(model.enum_for_constant(VariantType::Vector3, "AXIS_Y"), Some("Axis"));
    }

    #[test]
    fn mutating_methods_do_not_fold() {
        let model = BuiltinValueModel::new();
        let array = Variant::Array(orchestrator_core::Array::new());
        assert_eq!(
            model.call_method(&array, "clear", &[]),
            Err(CallError::InvalidMethod)
        );
        assert_eq!(model.call_method(&array, "size", &[]), Ok(Variant::Int(0)));
    }
}
