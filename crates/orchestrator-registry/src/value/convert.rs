//! Builtin conversion tables.
//!
//! `can_convert_strict` is the set of implicit conversions a typed slot
//! accepts without losing meaning; `can_convert` additionally allows the
//! lossy conversions an explicit cast performs.

use orchestrator_core::{Array, PackedArray, Variant, VariantType};
use ordered_float::OrderedFloat;

use VariantType as T;

/// Source types strictly convertible to `to`, excluding identity and `Nil`.
fn strict_sources(to: VariantType) -> &'static [VariantType] {
    match to {
        T::Bool => &[T::Int, T::Float],
        T::Int => &[T::Bool, T::Float],
        T::Float => &[T::Bool, T::Int],
        T::String => &[T::NodePath, T::StringName],
        T::Vector2 => &[T::Vector2i],
        T::Vector2i => &[T::Vector2],
        T::Rect2 => &[T::Rect2i],
        T::Rect2i => &[T::Rect2],
        T::Vector3 => &[T::Vector3i],
        T::Vector3i => &[T::Vector3],
        T::Vector4 => &[T::Vector4i],
        T::Vector4i => &[T::Vector4],
        T::Transform2D => &[T::Transform3D],
        T::Quaternion => &[T::Basis],
        T::Basis => &[T::Quaternion],
        T::Transform3D => &[T::Transform2D, T::Quaternion, T::Basis, T::Projection],
        T::Projection => &[T::Transform3D],
        T::Color => &[T::String, T::Int],
        T::Rid => &[T::Object],
        T::StringName => &[T::String],
        T::NodePath => &[T::String],
        T::Array => &[
            T::PackedByteArray,
            T::PackedInt32Array,
            T::PackedInt64Array,
            T::PackedFloat32Array,
            T::PackedFloat64Array,
            T::PackedStringArray,
            T::PackedVector2Array,
            T::PackedVector3Array,
            T::PackedColorArray,
            T::PackedVector4Array,
        ],
        T::PackedByteArray
        | T::PackedInt32Array
        | T::PackedInt64Array
        | T::PackedFloat32Array
        | T::PackedFloat64Array
        | T::PackedStringArray
        | T::PackedVector2Array
        | T::PackedVector3Array
        | T::PackedColorArray
        | T::PackedVector4Array => &[T::Array],
        _ => &[],
    }
}

/// Whether a value of `from` may be stored in a slot of `to` implicitly.
pub fn can_convert_strict(from: VariantType, to: VariantType) -> bool {
    if from == to || to == T::Nil {
        return true;
    }
    if from == T::Nil {
        return to == T::Object;
    }
    strict_sources(to).contains(&from)
}

/// Whether an explicit conversion from `from` to `to` exists.
pub fn can_convert(from: VariantType, to: VariantType) -> bool {
    if can_convert_strict(from, to) {
        return true;
    }
    match to {
        T::Bool | T::Int | T::Float => from == T::String,
        T::String => from != T::Object,
        T::Basis => from == T::Vector3,
        _ => false,
    }
}

fn reals<const N: usize>(values: &[i64; N]) -> [OrderedFloat<f64>; N] {
    values.map(|v| OrderedFloat(v as f64))
}

fn ints<const N: usize>(values: &[OrderedFloat<f64>; N]) -> [i64; N] {
    values.map(|v| v.0 as i64)
}

/// Convert `value` to `to`, returning `None` when no conversion applies.
///
/// Only conversions available to constant folding are implemented; the
/// remaining pairs (e.g. quaternion to basis) are left to runtime.
pub fn convert(value: &Variant, to: VariantType) -> Option<Variant> {
    if value.get_type() == to {
        return Some(value.clone());
    }
    Some(match (value, to) {
        (Variant::Nil, T::Object) => Variant::Object(None),
        (v, T::Bool) => Variant::Bool(match v {
            Variant::String(s) => !s.is_empty(),
            other => other.as_float()? != 0.0,
        }),
        (Variant::String(s), T::Int) => Variant::Int(s.trim().parse::<i64>().unwrap_or(0)),
        (v, T::Int) => Variant::Int(v.as_int()?),
        (Variant::String(s), T::Float) => Variant::float(s.trim().parse::<f64>().unwrap_or(0.0)),
        (v, T::Float) => Variant::float(v.as_float()?),
        (v, T::String) if v.get_type() != T::Object => Variant::String(v.to_string()),
        (v, T::StringName) => Variant::StringName(v.as_str()?.to_string()),
        (v, T::NodePath) => Variant::NodePath(v.as_str()?.to_string()),
        (Variant::Vector2i(v), T::Vector2) => Variant::Vector2(reals(v)),
        (Variant::Vector2(v), T::Vector2i) => Variant::Vector2i(ints(v)),
        (Variant::Vector3i(v), T::Vector3) => Variant::Vector3(reals(v)),
        (Variant::Vector3(v), T::Vector3i) => Variant::Vector3i(ints(v)),
        (Variant::Vector4i(v), T::Vector4) => Variant::Vector4(reals(v)),
        (Variant::Vector4(v), T::Vector4i) => Variant::Vector4i(ints(v)),
        (Variant::Rect2i(v), T::Rect2) => Variant::Rect2(reals(v)),
        (Variant::Rect2(v), T::Rect2i) => Variant::Rect2i(ints(v)),
        (Variant::Int(rgba), T::Color) => {
            let channel = |shift: u32| OrderedFloat(((*rgba >> shift) & 0xff) as f64 / 255.0);
            Variant::Color([channel(24), channel(16), channel(8), channel(0)])
        }
        (Variant::String(s), T::Color) => crate::value::members::named_color(s)?,
        (Variant::Packed(packed), T::Array) => Variant::Array(Array::from_elements(packed.elements.clone())),
        (Variant::Array(array), packed) if packed.is_packed_array() => {
            let element = packed.packed_element_type()?;
            let elements = array
                .elements
                .iter()
                .map(|e| convert(e, element))
                .collect::<Option<Vec<_>>>()?;
            Variant::Packed(PackedArray {
                kind: packed,
                elements,
            })
        }
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_numeric_conversions() {
        assert!(can_convert_strict(T::Int, T::Float));
        assert!(can_convert_strict(T::Float, T::Int));
        assert!(can_convert_strict(T::Bool, T::Int));
        assert!(!can_convert_strict(T::String, T::Int));
        assert!(can_convert(T::String, T::Int));
    }

    #[test]
    fn nil_only_converts_to_object() {
        assert!(can_convert_strict(T::Nil, T::Object));
        assert!(!can_convert_strict(T::Nil, T::Int));
        assert!(can_convert_strict(T::Int, T::Nil));
    }

    #[test]
    fn string_like_conversions() {
        assert!(can_convert_strict(T::StringName, T::String));
        assert!(can_convert_strict(T::String, T::NodePath));
        assert!(!can_convert_strict(T::Int, T::String));
        assert!(can_convert(T::Int, T::String));
        assert!(!can_convert(T::Object, T::String));
    }

    #[test]
    fn containers_and_packed() {
        assert!(can_convert_strict(T::PackedInt32Array, T::Array));
        assert!(can_convert_strict(T::Array, T::PackedStringArray));
        assert!(!can_convert_strict(T::Array, T::Dictionary));
    }

    #[test]
    fn convert_values() {
        assert_eq!(convert(&Variant::Int(3), T::Float), Some(Variant::float(3.0)));
        assert_eq!(convert(&Variant::float(2.9), T::Int), Some(Variant::Int(2)));
        assert_eq!(convert(&Variant::Int(4), T::String), Some(Variant::string("4")));
        assert_eq!(
            convert(&Variant::Vector2i([1, 2]), T::Vector2),
            Some(Variant::vector2(1.0, 2.0))
        );
        assert_eq!(convert(&Variant::Int(1), T::Vector3), None);
    }

    #[test]
    fn convert_array_to_packed() {
        let array = Variant::Array(Array::from_elements(vec![Variant::Int(1), Variant::float(2.0)]));
        let packed = convert(&array, T::PackedInt64Array);
        assert_eq!(packed.map(|p| p.get_type()), Some(T::PackedInt64Array));
    }
}
