//! The host value model.
//!
//! [`Variant`] is the dynamically-typed value every orchestration operates on,
//! and [`VariantType`] is its kind tag. Constant folding produces `Variant`s,
//! literal nodes carry them and `DataType::builtin_type` stores a `VariantType`.
//!
//! ## Value shapes
//!
//! ```text
//! scalars      Nil, Bool, Int, Float, String, StringName, NodePath, Rid
//! math         Vector2..Vector4i, Rect2(i), Transform2D/3D, Plane, Quaternion,
//!              Aabb, Basis, Projection, Color (fixed-size component arrays)
//! references   Object, Callable, Signal
//! containers   Array, Dictionary (optionally typed), Packed*Array
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use ordered_float::OrderedFloat;

use crate::script::ForeignScript;

/// Float component type used by every real-valued variant.
pub type Real = OrderedFloat<f64>;

// ============================================================================
// VariantType
// ============================================================================

/// The kind tag of a [`Variant`].
///
/// Discriminants follow the engine's `Variant.Type` enumeration so the global
/// enum can be mapped back with `VariantType::try_from(value)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum VariantType {
    #[default]
    Nil = 0,
    Bool,
    Int,
    Float,
    String,
    Vector2,
    Vector2i,
    Rect2,
    Rect2i,
    Vector3,
    Vector3i,
    Transform2D,
    Vector4,
    Vector4i,
    Plane,
    Quaternion,
    Aabb,
    Basis,
    Transform3D,
    Projection,
    Color,
    StringName,
    NodePath,
    Rid,
    Object,
    Callable,
    Signal,
    Dictionary,
    Array,
    PackedByteArray,
    PackedInt32Array,
    PackedInt64Array,
    PackedFloat32Array,
    PackedFloat64Array,
    PackedStringArray,
    PackedVector2Array,
    PackedVector3Array,
    PackedColorArray,
    PackedVector4Array,
}

impl VariantType {
    /// Number of variant kinds.
    pub const COUNT: usize = 39;

    /// All kinds in discriminant order.
    pub const ALL: [VariantType; Self::COUNT] = [
        Self::Nil,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::String,
        Self::Vector2,
        Self::Vector2i,
        Self::Rect2,
        Self::Rect2i,
        Self::Vector3,
        Self::Vector3i,
        Self::Transform2D,
        Self::Vector4,
        Self::Vector4i,
        Self::Plane,
        Self::Quaternion,
        Self::Aabb,
        Self::Basis,
        Self::Transform3D,
        Self::Projection,
        Self::Color,
        Self::StringName,
        Self::NodePath,
        Self::Rid,
        Self::Object,
        Self::Callable,
        Self::Signal,
        Self::Dictionary,
        Self::Array,
        Self::PackedByteArray,
        Self::PackedInt32Array,
        Self::PackedInt64Array,
        Self::PackedFloat32Array,
        Self::PackedFloat64Array,
        Self::PackedStringArray,
        Self::PackedVector2Array,
        Self::PackedVector3Array,
        Self::PackedColorArray,
        Self::PackedVector4Array,
    ];

    /// The script-facing type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Nil => "Nil",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "String",
            Self::Vector2 => "Vector2",
            Self::Vector2i => "Vector2i",
            Self::Rect2 => "Rect2",
            Self::Rect2i => "Rect2i",
            Self::Vector3 => "Vector3",
            Self::Vector3i => "Vector3i",
            Self::Transform2D => "Transform2D",
            Self::Vector4 => "Vector4",
            Self::Vector4i => "Vector4i",
            Self::Plane => "Plane",
            Self::Quaternion => "Quaternion",
            Self::Aabb => "AABB",
            Self::Basis => "Basis",
            Self::Transform3D => "Transform3D",
            Self::Projection => "Projection",
            Self::Color => "Color",
            Self::StringName => "StringName",
            Self::NodePath => "NodePath",
            Self::Rid => "RID",
            Self::Object => "Object",
            Self::Callable => "Callable",
            Self::Signal => "Signal",
            Self::Dictionary => "Dictionary",
            Self::Array => "Array",
            Self::PackedByteArray => "PackedByteArray",
            Self::PackedInt32Array => "PackedInt32Array",
            Self::PackedInt64Array => "PackedInt64Array",
            Self::PackedFloat32Array => "PackedFloat32Array",
            Self::PackedFloat64Array => "PackedFloat64Array",
            Self::PackedStringArray => "PackedStringArray",
            Self::PackedVector2Array => "PackedVector2Array",
            Self::PackedVector3Array => "PackedVector3Array",
            Self::PackedColorArray => "PackedColorArray",
            Self::PackedVector4Array => "PackedVector4Array",
        }
    }

    /// Look a builtin type up by its script-facing name.
    ///
    /// `Nil` is not nameable from scripts and never matches.
    pub fn from_name(name: &str) -> Option<VariantType> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| *ty != Self::Nil && ty.name() == name)
    }

    pub fn is_packed_array(self) -> bool {
        (self as u8) >= (Self::PackedByteArray as u8)
    }

    /// Types whose values are shared by reference and therefore never folded.
    pub fn is_shared(self) -> bool {
        matches!(self, Self::Object | Self::Array | Self::Dictionary) || self.is_packed_array()
    }

    /// Element type of a packed array.
    pub fn packed_element_type(self) -> Option<VariantType> {
        Some(match self {
            Self::PackedByteArray | Self::PackedInt32Array | Self::PackedInt64Array => Self::Int,
            Self::PackedFloat32Array | Self::PackedFloat64Array => Self::Float,
            Self::PackedStringArray => Self::String,
            Self::PackedVector2Array => Self::Vector2,
            Self::PackedVector3Array => Self::Vector3,
            Self::PackedColorArray => Self::Color,
            Self::PackedVector4Array => Self::Vector4,
            _ => return None,
        })
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    pub fn is_string_like(self) -> bool {
        matches!(self, Self::String | Self::StringName)
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Reference values
// ============================================================================

/// A script resource held in a variant.
///
/// `foreign` is set when the script is not part of the analyzed pool.
#[derive(Debug, Clone)]
pub struct ScriptRef {
    pub path: String,
    pub foreign: Option<Arc<ForeignScript>>,
}

impl PartialEq for ScriptRef {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ScriptRef {}

impl Hash for ScriptRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// The object a non-null `Object` variant points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    /// A script resource.
    Script(ScriptRef),
    /// A loaded non-script resource such as a texture or a scene.
    Resource { path: String, class_name: String },
    /// A native instance, e.g. an engine singleton.
    Instance { class_name: String },
}

impl ObjectRef {
    /// Native class of the referenced object.
    pub fn class_name(&self) -> &str {
        match self {
            ObjectRef::Script(script) => match &script.foreign {
                Some(foreign) if !foreign.is_orchestration => "Script",
                _ => "OScript",
            },
            ObjectRef::Resource { class_name, .. } | ObjectRef::Instance { class_name } => class_name,
        }
    }
}

/// A bound callable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallableRef {
    /// Owner of the method; empty for global utility functions.
    pub target: String,
    pub method: String,
}

/// A signal on an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalRef {
    pub owner: String,
    pub name: String,
}

// ============================================================================
// Containers
// ============================================================================

/// The element type of a typed container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ContainerType {
    pub builtin: VariantType,
    pub class_name: String,
    pub script: Option<ScriptRef>,
}

impl ContainerType {
    pub fn builtin(builtin: VariantType) -> Self {
        Self {
            builtin,
            ..Default::default()
        }
    }
}

/// A generic or typed array value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Array {
    pub elements: Vec<Variant>,
    pub element_type: Option<ContainerType>,
    pub read_only: bool,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<Variant>) -> Self {
        Self {
            elements,
            ..Default::default()
        }
    }

    pub fn set_typed(&mut self, element_type: ContainerType) {
        self.element_type = Some(element_type);
    }

    pub fn is_typed(&self) -> bool {
        self.element_type.is_some()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn push(&mut self, value: Variant) {
        self.elements.push(value);
    }
}

/// A generic or typed dictionary value. Insertion order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dictionary {
    pub entries: IndexMap<Variant, Variant>,
    pub key_type: Option<ContainerType>,
    pub value_type: Option<ContainerType>,
    pub read_only: bool,
}

impl Hash for Dictionary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Entry order does not take part in equality.
        self.entries.len().hash(state);
        self.key_type.hash(state);
        self.value_type.hash(state);
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_typed(&self) -> bool {
        self.key_type.is_some() || self.value_type.is_some()
    }

    pub fn insert(&mut self, key: Variant, value: Variant) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &Variant) -> Option<&Variant> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Variant) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A packed array of one element kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackedArray {
    pub kind: VariantType,
    pub elements: Vec<Variant>,
}

// ============================================================================
// Variant
// ============================================================================

/// A dynamically-typed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(Real),
    String(String),
    Vector2([Real; 2]),
    Vector2i([i64; 2]),
    Rect2([Real; 4]),
    Rect2i([i64; 4]),
    Vector3([Real; 3]),
    Vector3i([i64; 3]),
    Transform2D([Real; 6]),
    Vector4([Real; 4]),
    Vector4i([i64; 4]),
    Plane([Real; 4]),
    Quaternion([Real; 4]),
    Aabb([Real; 6]),
    Basis([Real; 9]),
    Transform3D([Real; 12]),
    Projection([Real; 16]),
    Color([Real; 4]),
    StringName(String),
    NodePath(String),
    Rid(u64),
    /// `None` is a null object.
    Object(Option<ObjectRef>),
    Callable(CallableRef),
    Signal(SignalRef),
    Dictionary(Dictionary),
    Array(Array),
    Packed(PackedArray),
}

impl Variant {
    pub fn get_type(&self) -> VariantType {
        match self {
            Variant::Nil => VariantType::Nil,
            Variant::Bool(_) => VariantType::Bool,
            Variant::Int(_) => VariantType::Int,
            Variant::Float(_) => VariantType::Float,
            Variant::String(_) => VariantType::String,
            Variant::Vector2(_) => VariantType::Vector2,
            Variant::Vector2i(_) => VariantType::Vector2i,
            Variant::Rect2(_) => VariantType::Rect2,
            Variant::Rect2i(_) => VariantType::Rect2i,
            Variant::Vector3(_) => VariantType::Vector3,
            Variant::Vector3i(_) => VariantType::Vector3i,
            Variant::Transform2D(_) => VariantType::Transform2D,
            Variant::Vector4(_) => VariantType::Vector4,
            Variant::Vector4i(_) => VariantType::Vector4i,
            Variant::Plane(_) => VariantType::Plane,
            Variant::Quaternion(_) => VariantType::Quaternion,
            Variant::Aabb(_) => VariantType::Aabb,
            Variant::Basis(_) => VariantType::Basis,
            Variant::Transform3D(_) => VariantType::Transform3D,
            Variant::Projection(_) => VariantType::Projection,
            Variant::Color(_) => VariantType::Color,
            Variant::StringName(_) => VariantType::StringName,
            Variant::NodePath(_) => VariantType::NodePath,
            Variant::Rid(_) => VariantType::Rid,
            Variant::Object(_) => VariantType::Object,
            Variant::Callable(_) => VariantType::Callable,
            Variant::Signal(_) => VariantType::Signal,
            Variant::Dictionary(_) => VariantType::Dictionary,
            Variant::Array(_) => VariantType::Array,
            Variant::Packed(packed) => packed.kind,
        }
    }

    pub fn float(value: f64) -> Variant {
        Variant::Float(OrderedFloat(value))
    }

    pub fn string(value: impl Into<String>) -> Variant {
        Variant::String(value.into())
    }

    pub fn vector2(x: f64, y: f64) -> Variant {
        Variant::Vector2([OrderedFloat(x), OrderedFloat(y)])
    }

    pub fn vector3(x: f64, y: f64, z: f64) -> Variant {
        Variant::Vector3([OrderedFloat(x), OrderedFloat(y), OrderedFloat(z)])
    }

    /// Null in the script sense: `Nil` or an object variant without an object.
    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Nil | Variant::Object(None))
    }

    /// Truthiness used by conditions and ternaries.
    pub fn booleanize(&self) -> bool {
        match self {
            Variant::Nil | Variant::Object(None) => false,
            Variant::Bool(b) => *b,
            Variant::Int(i) => *i != 0,
            Variant::Float(f) => f.0 != 0.0,
            Variant::String(s) | Variant::StringName(s) | Variant::NodePath(s) => !s.is_empty(),
            Variant::Vector2(v) => v.iter().any(|c| c.0 != 0.0),
            Variant::Vector2i(v) => v.iter().any(|c| *c != 0),
            Variant::Vector3(v) => v.iter().any(|c| c.0 != 0.0),
            Variant::Vector3i(v) => v.iter().any(|c| *c != 0),
            Variant::Vector4(v) => v.iter().any(|c| c.0 != 0.0),
            Variant::Vector4i(v) => v.iter().any(|c| *c != 0),
            Variant::Rid(id) => *id != 0,
            Variant::Array(a) => !a.is_empty(),
            Variant::Dictionary(d) => !d.is_empty(),
            Variant::Packed(p) => !p.elements.is_empty(),
            _ => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Variant::Int(i) => Some(*i),
            Variant::Bool(b) => Some(i64::from(*b)),
            Variant::Float(f) => Some(f.0 as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Variant::Int(i) => Some(*i as f64),
            Variant::Float(f) => Some(f.0),
            Variant::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Borrow the text of a `String`, `StringName` or `NodePath`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) | Variant::StringName(s) | Variant::NodePath(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Variant::Object(Some(object)) => Some(object),
            _ => None,
        }
    }

    /// Mark a container value read-only. Other values are returned unchanged.
    pub fn into_read_only(self) -> Variant {
        match self {
            Variant::Array(mut array) => {
                array.read_only = true;
                Variant::Array(array)
            }
            Variant::Dictionary(mut dict) => {
                dict.read_only = true;
                Variant::Dictionary(dict)
            }
            other => other,
        }
    }

    /// The form used inside container literals and diagnostics quoting values.
    pub fn to_code_string(&self) -> String {
        match self {
            Variant::String(s) => format!("\"{s}\""),
            Variant::StringName(s) => format!("&\"{s}\""),
            Variant::NodePath(s) => format!("^\"{s}\""),
            other => other.to_string(),
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Int(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Int(i64::from(value))
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::float(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value)
    }
}

impl From<Array> for Variant {
    fn from(value: Array) -> Self {
        Variant::Array(value)
    }
}

impl From<Dictionary> for Variant {
    fn from(value: Dictionary) -> Self {
        Variant::Dictionary(value)
    }
}

/// Format a float the way scripts print it: integral values keep a `.0`.
pub fn format_real(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn write_reals(f: &mut fmt::Formatter<'_>, values: &[Real]) -> fmt::Result {
    f.write_str("(")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(&format_real(value.0))?;
    }
    f.write_str(")")
}

fn write_ints(f: &mut fmt::Formatter<'_>, values: &[i64]) -> fmt::Result {
    f.write_str("(")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Nil | Variant::Object(None) => f.write_str("<null>"),
            Variant::Bool(b) => write!(f, "{b}"),
            Variant::Int(i) => write!(f, "{i}"),
            Variant::Float(v) => f.write_str(&format_real(v.0)),
            Variant::String(s) | Variant::StringName(s) | Variant::NodePath(s) => f.write_str(s),
            Variant::Vector2(v) => write_reals(f, v),
            Variant::Vector3(v) => write_reals(f, v),
            Variant::Vector4(v) | Variant::Plane(v) | Variant::Quaternion(v) | Variant::Color(v) => {
                write_reals(f, v)
            }
            Variant::Rect2(v) => write_reals(f, v),
            Variant::Aabb(v) => write_reals(f, v),
            Variant::Transform2D(v) => write_reals(f, v),
            Variant::Basis(v) => write_reals(f, v),
            Variant::Transform3D(v) => write_reals(f, v),
            Variant::Projection(v) => write_reals(f, v),
            Variant::Vector2i(v) => write_ints(f, v),
            Variant::Vector3i(v) => write_ints(f, v),
            Variant::Vector4i(v) | Variant::Rect2i(v) => write_ints(f, v),
            Variant::Rid(id) => write!(f, "RID({id})"),
            Variant::Object(Some(object)) => match object {
                ObjectRef::Script(script) => write!(f, "<OScript#{}>", script.path),
                ObjectRef::Resource { path, class_name } => write!(f, "<{class_name}#{path}>"),
                ObjectRef::Instance { class_name } => write!(f, "<{class_name}>"),
            },
            Variant::Callable(callable) if callable.target.is_empty() => {
                write!(f, "@GlobalScope::{}", callable.method)
            }
            Variant::Callable(callable) => write!(f, "{}::{}", callable.target, callable.method),
            Variant::Signal(signal) => write!(f, "{}::[signal]{}", signal.owner, signal.name),
            Variant::Array(array) => {
                f.write_str("[")?;
                for (i, value) in array.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&value.to_code_string())?;
                }
                f.write_str("]")
            }
            Variant::Packed(packed) => {
                f.write_str("[")?;
                for (i, value) in packed.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&value.to_code_string())?;
                }
                f.write_str("]")
            }
            Variant::Dictionary(dict) => {
                if dict.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (key, value)) in dict.entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key.to_code_string(), value.to_code_string())?;
                }
                f.write_str(" }")
            }
        }
    }
}
