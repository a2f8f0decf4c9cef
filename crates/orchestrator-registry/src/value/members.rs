//! Builtin type members: methods, properties, constants and enums, plus the
//! constant-foldable accessors used when the base value is known at analysis
//! time.

use indexmap::IndexMap;
use orchestrator_core::{
    Array, CallError, MethodFlags, MethodInfo, PackedArray, PropertyInfo, Real, Variant, VariantType,
};
use ordered_float::OrderedFloat;

use super::operators::variant_equal;

use VariantType as T;

fn arg(name: &str, ty: VariantType) -> PropertyInfo {
    if ty == T::Nil {
        PropertyInfo::variant(name)
    } else {
        PropertyInfo::new(ty, name)
    }
}

/// A const method; `T::Nil` return means `Variant`, `None` means `void`.
fn method(name: &str, ret: Option<VariantType>, args: &[(&str, VariantType)]) -> MethodInfo {
    let return_val = match ret {
        Some(ty) => arg("", ty),
        None => PropertyInfo::default(),
    };
    MethodInfo::new(name)
        .with_args(args.iter().map(|(n, ty)| arg(n, *ty)).collect())
        .with_return(return_val)
        .with_flags(MethodFlags::CONST)
}

/// A method that mutates its receiver.
fn mutating(name: &str, ret: Option<VariantType>, args: &[(&str, VariantType)]) -> MethodInfo {
    let mut info = method(name, ret, args);
    info.flags.remove(MethodFlags::CONST);
    info
}

fn with_defaults(info: MethodInfo, defaults: Vec<Variant>) -> MethodInfo {
    info.with_defaults(defaults)
}

fn static_method(info: MethodInfo) -> MethodInfo {
    info.with_flags(MethodFlags::STATIC)
}

fn vararg(info: MethodInfo) -> MethodInfo {
    info.with_flags(MethodFlags::VARARG)
}

/// Methods of `ty`.
pub fn methods(ty: VariantType) -> Vec<MethodInfo> {
    let v = Some(T::Nil);
    match ty {
        T::String | T::StringName => string_methods(ty),
        T::NodePath => vec![
            method("is_empty", Some(T::Bool), &[]),
            method("is_absolute", Some(T::Bool), &[]),
            method("get_name_count", Some(T::Int), &[]),
            method("get_name", Some(T::StringName), &[("idx", T::Int)]),
            method("get_concatenated_names", Some(T::StringName), &[]),
        ],
        T::Vector2 | T::Vector3 | T::Vector4 => real_vector_methods(ty),
        T::Vector2i | T::Vector3i | T::Vector4i => vec![
            method("length", Some(T::Float), &[]),
            method("length_squared", Some(T::Int), &[]),
            method("abs", Some(ty), &[]),
            method("sign", Some(ty), &[]),
            method("clamp", Some(ty), &[("min", ty), ("max", ty)]),
            method("min_axis_index", Some(T::Int), &[]),
            method("max_axis_index", Some(T::Int), &[]),
        ],
        T::Rect2 | T::Rect2i => {
            let (scalar, vector) = if ty == T::Rect2 { (T::Float, T::Vector2) } else { (T::Int, T::Vector2i) };
            vec![
                method("get_area", Some(scalar), &[]),
                method("get_center", Some(vector), &[]),
                method("has_point", Some(T::Bool), &[("point", vector)]),
                method("has_area", Some(T::Bool), &[]),
                method("grow", Some(ty), &[("amount", scalar)]),
                method("merge", Some(ty), &[("b", ty)]),
                method("abs", Some(ty), &[]),
                with_defaults(
                    method("intersects", Some(T::Bool), &[("b", ty), ("include_borders", T::Bool)]),
                    vec![Variant::Bool(false)],
                ),
            ]
        }
        T::Color => vec![
            method("lightened", Some(T::Color), &[("amount", T::Float)]),
            method("darkened", Some(T::Color), &[("amount", T::Float)]),
            method("inverted", Some(T::Color), &[]),
            method("lerp", Some(T::Color), &[("to", T::Color), ("weight", T::Float)]),
            method("get_luminance", Some(T::Float), &[]),
            method("to_rgba32", Some(T::Int), &[]),
            with_defaults(
                method("to_html", Some(T::String), &[("with_alpha", T::Bool)]),
                vec![Variant::Bool(true)],
            ),
            static_method(with_defaults(
                method(
                    "from_hsv",
                    Some(T::Color),
                    &[("h", T::Float), ("s", T::Float), ("v", T::Float), ("alpha", T::Float)],
                ),
                vec![Variant::float(1.0)],
            )),
            static_method(method("html", Some(T::Color), &[("rgba", T::String)])),
            static_method(method("html_is_valid", Some(T::Bool), &[("color", T::String)])),
        ],
        T::Quaternion => vec![
            method("length", Some(T::Float), &[]),
            method("normalized", Some(T::Quaternion), &[]),
            method("inverse", Some(T::Quaternion), &[]),
            method("slerp", Some(T::Quaternion), &[("to", T::Quaternion), ("weight", T::Float)]),
            method("get_euler", Some(T::Vector3), &[]),
            method("dot", Some(T::Float), &[("with", T::Quaternion)]),
        ],
        T::Basis => vec![
            method("inverse", Some(T::Basis), &[]),
            method("transposed", Some(T::Basis), &[]),
            method("orthonormalized", Some(T::Basis), &[]),
            method("determinant", Some(T::Float), &[]),
            method("get_euler", Some(T::Vector3), &[]),
            method("get_scale", Some(T::Vector3), &[]),
            method("rotated", Some(T::Basis), &[("axis", T::Vector3), ("angle", T::Float)]),
        ],
        T::Transform2D => vec![
            method("inverse", Some(T::Transform2D), &[]),
            method("affine_inverse", Some(T::Transform2D), &[]),
            method("get_origin", Some(T::Vector2), &[]),
            method("get_rotation", Some(T::Float), &[]),
            method("get_scale", Some(T::Vector2), &[]),
            method("translated", Some(T::Transform2D), &[("offset", T::Vector2)]),
            method("rotated", Some(T::Transform2D), &[("angle", T::Float)]),
            method("scaled", Some(T::Transform2D), &[("scale", T::Vector2)]),
        ],
        T::Transform3D => vec![
            method("inverse", Some(T::Transform3D), &[]),
            method("affine_inverse", Some(T::Transform3D), &[]),
            method("orthonormalized", Some(T::Transform3D), &[]),
            method("translated", Some(T::Transform3D), &[("offset", T::Vector3)]),
            method("rotated", Some(T::Transform3D), &[("axis", T::Vector3), ("angle", T::Float)]),
            method("scaled", Some(T::Transform3D), &[("scale", T::Vector3)]),
            with_defaults(
                method(
                    "looking_at",
                    Some(T::Transform3D),
                    &[("target", T::Vector3), ("up", T::Vector3), ("use_model_front", T::Bool)],
                ),
                vec![Variant::vector3(0.0, 1.0, 0.0), Variant::Bool(false)],
            ),
        ],
        T::Plane => vec![
            method("normalized", Some(T::Plane), &[]),
            method("distance_to", Some(T::Float), &[("point", T::Vector3)]),
            method("has_point", Some(T::Bool), &[("point", T::Vector3)]),
            method("is_point_over", Some(T::Bool), &[("point", T::Vector3)]),
            method("project", Some(T::Vector3), &[("point", T::Vector3)]),
        ],
        T::Aabb => vec![
            method("get_volume", Some(T::Float), &[]),
            method("get_center", Some(T::Vector3), &[]),
            method("has_point", Some(T::Bool), &[("point", T::Vector3)]),
            method("grow", Some(T::Aabb), &[("by", T::Float)]),
            method("merge", Some(T::Aabb), &[("with", T::Aabb)]),
        ],
        T::Projection => vec![
            method("inverse", Some(T::Projection), &[]),
            method("determinant", Some(T::Float), &[]),
            method("get_fov", Some(T::Float), &[]),
        ],
        T::Rid => vec![method("get_id", Some(T::Int), &[]), method("is_valid", Some(T::Bool), &[])],
        T::Callable => vec![
            vararg(method("call", v, &[])),
            vararg(method("call_deferred", None, &[])),
            method("callv", v, &[("arguments", T::Array)]),
            vararg(method("bind", Some(T::Callable), &[])),
            method("bindv", Some(T::Callable), &[("arguments", T::Array)]),
            method("unbind", Some(T::Callable), &[("argcount", T::Int)]),
            method("is_valid", Some(T::Bool), &[]),
            method("is_null", Some(T::Bool), &[]),
            method("get_method", Some(T::StringName), &[]),
            method("get_object", Some(T::Object), &[]),
            method("get_argument_count", Some(T::Int), &[]),
        ],
        T::Signal => vec![
            vararg(method("emit", None, &[])),
            with_defaults(
                method("connect", Some(T::Int), &[("callable", T::Callable), ("flags", T::Int)]),
                vec![Variant::Int(0)],
            ),
            method("disconnect", None, &[("callable", T::Callable)]),
            method("is_connected", Some(T::Bool), &[("callable", T::Callable)]),
            method("is_null", Some(T::Bool), &[]),
            method("get_name", Some(T::StringName), &[]),
            method("get_object", Some(T::Object), &[]),
            method("get_connections", Some(T::Array), &[]),
        ],
        T::Array => array_methods(),
        T::Dictionary => vec![
            method("size", Some(T::Int), &[]),
            method("is_empty", Some(T::Bool), &[]),
            method("has", Some(T::Bool), &[("key", T::Nil)]),
            method("has_all", Some(T::Bool), &[("keys", T::Array)]),
            method("keys", Some(T::Array), &[]),
            method("values", Some(T::Array), &[]),
            with_defaults(method("get", v, &[("key", T::Nil), ("default", T::Nil)]), vec![Variant::Nil]),
            with_defaults(
                mutating("get_or_add", v, &[("key", T::Nil), ("default", T::Nil)]),
                vec![Variant::Nil],
            ),
            method("find_key", v, &[("value", T::Nil)]),
            method("hash", Some(T::Int), &[]),
            method("is_typed", Some(T::Bool), &[]),
            method("is_read_only", Some(T::Bool), &[]),
            with_defaults(method("duplicate", Some(T::Dictionary), &[("deep", T::Bool)]), vec![Variant::Bool(false)]),
            mutating("erase", Some(T::Bool), &[("key", T::Nil)]),
            mutating("clear", None, &[]),
            with_defaults(
                mutating("merge", None, &[("dictionary", T::Dictionary), ("overwrite", T::Bool)]),
                vec![Variant::Bool(false)],
            ),
            mutating("make_read_only", None, &[]),
        ],
        packed if packed.is_packed_array() => packed_methods(packed),
        _ => Vec::new(),
    }
}

fn string_methods(ty: VariantType) -> Vec<MethodInfo> {
    let s = T::String;
    let mut list = vec![
        method("length", Some(T::Int), &[]),
        method("is_empty", Some(T::Bool), &[]),
        method("to_upper", Some(s), &[]),
        method("to_lower", Some(s), &[]),
        method("capitalize", Some(s), &[]),
        method("begins_with", Some(T::Bool), &[("text", s)]),
        method("ends_with", Some(T::Bool), &[("text", s)]),
        method("contains", Some(T::Bool), &[("what", s)]),
        with_defaults(method("find", Some(T::Int), &[("what", s), ("from", T::Int)]), vec![Variant::Int(0)]),
        with_defaults(method("rfind", Some(T::Int), &[("what", s), ("from", T::Int)]), vec![Variant::Int(-1)]),
        with_defaults(method("substr", Some(s), &[("from", T::Int), ("len", T::Int)]), vec![Variant::Int(-1)]),
        method("left", Some(s), &[("length", T::Int)]),
        method("right", Some(s), &[("length", T::Int)]),
        method("replace", Some(s), &[("what", s), ("forwhat", s)]),
        method("repeat", Some(s), &[("count", T::Int)]),
        method("reverse", Some(s), &[]),
        with_defaults(
            method("strip_edges", Some(s), &[("left", T::Bool), ("right", T::Bool)]),
            vec![Variant::Bool(true), Variant::Bool(true)],
        ),
        with_defaults(
            method(
                "split",
                Some(T::PackedStringArray),
                &[("delimiter", s), ("allow_empty", T::Bool), ("maxsplit", T::Int)],
            ),
            vec![Variant::string(""), Variant::Bool(true), Variant::Int(0)],
        ),
        method("join", Some(s), &[("parts", T::PackedStringArray)]),
        with_defaults(
            method("format", Some(s), &[("values", T::Nil), ("placeholder", s)]),
            vec![Variant::string("{_}")],
        ),
        method("to_int", Some(T::Int), &[]),
        method("to_float", Some(T::Float), &[]),
        method("is_valid_int", Some(T::Bool), &[]),
        method("is_valid_float", Some(T::Bool), &[]),
        method("is_valid_identifier", Some(T::Bool), &[]),
        method("get_file", Some(s), &[]),
        method("get_extension", Some(s), &[]),
        method("get_basename", Some(s), &[]),
        method("get_base_dir", Some(s), &[]),
        method("path_join", Some(s), &[("file", s)]),
        method("similarity", Some(T::Float), &[("text", s)]),
        method("hash", Some(T::Int), &[]),
        method("to_utf8_buffer", Some(T::PackedByteArray), &[]),
        static_method(with_defaults(
            method("num", Some(s), &[("number", T::Float), ("decimals", T::Int)]),
            vec![Variant::Int(-1)],
        )),
        static_method(method("num_int64", Some(s), &[("number", T::Int)])),
        static_method(method("chr", Some(s), &[("char", T::Int)])),
    ];
    if ty == T::String {
        list.push(method("to_snake_case", Some(s), &[]));
    }
    list
}

fn real_vector_methods(ty: VariantType) -> Vec<MethodInfo> {
    let mut list = vec![
        method("length", Some(T::Float), &[]),
        method("length_squared", Some(T::Float), &[]),
        method("normalized", Some(ty), &[]),
        method("is_normalized", Some(T::Bool), &[]),
        method("is_zero_approx", Some(T::Bool), &[]),
        method("is_equal_approx", Some(T::Bool), &[("to", ty)]),
        method("dot", Some(T::Float), &[("with", ty)]),
        method("distance_to", Some(T::Float), &[("to", ty)]),
        method("distance_squared_to", Some(T::Float), &[("to", ty)]),
        method("direction_to", Some(ty), &[("to", ty)]),
        method("lerp", Some(ty), &[("to", ty), ("weight", T::Float)]),
        method("abs", Some(ty), &[]),
        method("floor", Some(ty), &[]),
        method("ceil", Some(ty), &[]),
        method("round", Some(ty), &[]),
        method("sign", Some(ty), &[]),
        method("clamp", Some(ty), &[("min", ty), ("max", ty)]),
        method("min_axis_index", Some(T::Int), &[]),
        method("max_axis_index", Some(T::Int), &[]),
    ];
    match ty {
        T::Vector2 => list.extend([
            method("angle", Some(T::Float), &[]),
            method("angle_to", Some(T::Float), &[("to", ty)]),
            method("cross", Some(T::Float), &[("with", ty)]),
            method("rotated", Some(ty), &[("angle", T::Float)]),
            method("orthogonal", Some(ty), &[]),
            static_method(method("from_angle", Some(ty), &[("angle", T::Float)])),
        ]),
        T::Vector3 => list.extend([
            method("angle_to", Some(T::Float), &[("to", ty)]),
            method("cross", Some(ty), &[("with", ty)]),
            method("rotated", Some(ty), &[("axis", ty), ("angle", T::Float)]),
        ]),
        _ => {}
    }
    list
}

fn array_methods() -> Vec<MethodInfo> {
    let v = Some(T::Nil);
    vec![
        method("size", Some(T::Int), &[]),
        method("is_empty", Some(T::Bool), &[]),
        method("has", Some(T::Bool), &[("value", T::Nil)]),
        with_defaults(method("find", Some(T::Int), &[("what", T::Nil), ("from", T::Int)]), vec![Variant::Int(0)]),
        method("count", Some(T::Int), &[("value", T::Nil)]),
        method("front", v, &[]),
        method("back", v, &[]),
        method("max", v, &[]),
        method("min", v, &[]),
        method("pick_random", v, &[]),
        method("hash", Some(T::Int), &[]),
        method("is_typed", Some(T::Bool), &[]),
        method("is_read_only", Some(T::Bool), &[]),
        method("get_typed_builtin", Some(T::Int), &[]),
        method("get_typed_class_name", Some(T::StringName), &[]),
        with_defaults(method("duplicate", Some(T::Array), &[("deep", T::Bool)]), vec![Variant::Bool(false)]),
        with_defaults(
            method(
                "slice",
                Some(T::Array),
                &[("begin", T::Int), ("end", T::Int), ("step", T::Int), ("deep", T::Bool)],
            ),
            vec![Variant::Int(i64::from(i32::MAX)), Variant::Int(1), Variant::Bool(false)],
        ),
        method("map", Some(T::Array), &[("method", T::Callable)]),
        method("filter", Some(T::Array), &[("method", T::Callable)]),
        with_defaults(method("reduce", v, &[("method", T::Callable), ("accum", T::Nil)]), vec![Variant::Nil]),
        method("any", Some(T::Bool), &[("method", T::Callable)]),
        method("all", Some(T::Bool), &[("method", T::Callable)]),
        mutating("append", None, &[("value", T::Nil)]),
        mutating("append_array", None, &[("array", T::Array)]),
        mutating("push_back", None, &[("value", T::Nil)]),
        mutating("push_front", None, &[("value", T::Nil)]),
        mutating("pop_back", v, &[]),
        mutating("pop_front", v, &[]),
        mutating("pop_at", v, &[("position", T::Int)]),
        mutating("insert", Some(T::Int), &[("position", T::Int), ("value", T::Nil)]),
        mutating("erase", None, &[("value", T::Nil)]),
        mutating("remove_at", None, &[("position", T::Int)]),
        mutating("resize", Some(T::Int), &[("size", T::Int)]),
        mutating("clear", None, &[]),
        mutating("fill", None, &[("value", T::Nil)]),
        mutating("sort", None, &[]),
        mutating("sort_custom", None, &[("func", T::Callable)]),
        mutating("reverse", None, &[]),
        mutating("shuffle", None, &[]),
        mutating("make_read_only", None, &[]),
    ]
}

fn packed_methods(ty: VariantType) -> Vec<MethodInfo> {
    let element = ty.packed_element_type().unwrap_or(T::Nil);
    let mut list = vec![
        method("size", Some(T::Int), &[]),
        method("is_empty", Some(T::Bool), &[]),
        method("has", Some(T::Bool), &[("value", element)]),
        with_defaults(method("find", Some(T::Int), &[("value", element), ("from", T::Int)]), vec![Variant::Int(0)]),
        method("count", Some(T::Int), &[("value", element)]),
        method("get", Some(element), &[("index", T::Int)]),
        method("duplicate", Some(ty), &[]),
        with_defaults(
            method("slice", Some(ty), &[("begin", T::Int), ("end", T::Int)]),
            vec![Variant::Int(i64::from(i32::MAX))],
        ),
        method("to_byte_array", Some(T::PackedByteArray), &[]),
        mutating("append", Some(T::Bool), &[("value", element)]),
        mutating("push_back", Some(T::Bool), &[("value", element)]),
        mutating("append_array", None, &[("array", ty)]),
        mutating("insert", Some(T::Int), &[("at_index", T::Int), ("value", element)]),
        mutating("remove_at", None, &[("index", T::Int)]),
        mutating("set", None, &[("index", T::Int), ("value", element)]),
        mutating("resize", Some(T::Int), &[("new_size", T::Int)]),
        mutating("fill", None, &[("value", element)]),
        mutating("clear", None, &[]),
        mutating("sort", None, &[]),
        mutating("reverse", None, &[]),
    ];
    if ty == T::PackedByteArray {
        list.push(method("get_string_from_utf8", Some(T::String), &[]));
        list.push(method("get_string_from_ascii", Some(T::String), &[]));
    }
    list
}

/// Named properties of `ty` and their types.
pub fn properties(ty: VariantType) -> &'static [(&'static str, VariantType)] {
    match ty {
        T::Vector2 => &[("x", T::Float), ("y", T::Float)],
        T::Vector2i => &[("x", T::Int), ("y", T::Int)],
        T::Vector3 => &[("x", T::Float), ("y", T::Float), ("z", T::Float)],
        T::Vector3i => &[("x", T::Int), ("y", T::Int), ("z", T::Int)],
        T::Vector4 | T::Quaternion => &[("x", T::Float), ("y", T::Float), ("z", T::Float), ("w", T::Float)],
        T::Vector4i => &[("x", T::Int), ("y", T::Int), ("z", T::Int), ("w", T::Int)],
        T::Rect2 => &[("position", T::Vector2), ("size", T::Vector2), ("end", T::Vector2)],
        T::Rect2i => &[("position", T::Vector2i), ("size", T::Vector2i), ("end", T::Vector2i)],
        T::Aabb => &[("position", T::Vector3), ("size", T::Vector3), ("end", T::Vector3)],
        T::Plane => &[
            ("normal", T::Vector3),
            ("d", T::Float),
            ("x", T::Float),
            ("y", T::Float),
            ("z", T::Float),
        ],
        T::Basis => &[("x", T::Vector3), ("y", T::Vector3), ("z", T::Vector3)],
        T::Transform2D => &[("x", T::Vector2), ("y", T::Vector2), ("origin", T::Vector2)],
        T::Transform3D => &[("basis", T::Basis), ("origin", T::Vector3)],
        T::Projection => &[("x", T::Vector4), ("y", T::Vector4), ("z", T::Vector4), ("w", T::Vector4)],
        T::Color => &[
            ("r", T::Float),
            ("g", T::Float),
            ("b", T::Float),
            ("a", T::Float),
            ("r8", T::Int),
            ("g8", T::Int),
            ("b8", T::Int),
            ("a8", T::Int),
            ("h", T::Float),
            ("s", T::Float),
            ("v", T::Float),
        ],
        _ => &[],
    }
}

fn r<const N: usize>(values: [f64; N]) -> [Real; N] {
    values.map(OrderedFloat)
}

/// Named colors as `(NAME, r, g, b)`, alpha 1.
const NAMED_COLORS: &[(&str, f64, f64, f64)] = &[
    ("BLACK", 0.0, 0.0, 0.0),
    ("WHITE", 1.0, 1.0, 1.0),
    ("RED", 1.0, 0.0, 0.0),
    ("GREEN", 0.0, 1.0, 0.0),
    ("BLUE", 0.0, 0.0, 1.0),
    ("YELLOW", 1.0, 1.0, 0.0),
    ("CYAN", 0.0, 1.0, 1.0),
    ("MAGENTA", 1.0, 0.0, 1.0),
    ("GRAY", 0.745098, 0.745098, 0.745098),
    ("DARK_GRAY", 0.662745, 0.662745, 0.662745),
    ("LIGHT_GRAY", 0.827451, 0.827451, 0.827451),
    ("ORANGE", 1.0, 0.647059, 0.0),
    ("PURPLE", 0.627451, 0.12549, 0.941176),
    ("PINK", 1.0, 0.752941, 0.796078),
    ("BROWN", 0.647059, 0.164706, 0.164706),
    ("GOLD", 1.0, 0.843137, 0.0),
    ("CORNFLOWER_BLUE", 0.392157, 0.584314, 0.929412),
    ("SKY_BLUE", 0.529412, 0.807843, 0.921569),
    ("NAVY_BLUE", 0.0, 0.0, 0.501961),
    ("FOREST_GREEN", 0.133333, 0.545098, 0.133333),
    ("CRIMSON", 0.862745, 0.0784314, 0.235294),
    ("TEAL", 0.0, 0.501961, 0.501961),
];

/// Parse a color name (`"red"`, `"Dark Gray"`) or an HTML code (`"#ff8000"`).
pub(crate) fn named_color(name: &str) -> Option<Variant> {
    if let Some(color) = html_color(name) {
        return Some(color);
    }
    let normalized: String = name
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '\'' | '.'))
        .flat_map(char::to_uppercase)
        .collect();
    if normalized == "TRANSPARENT" {
        return Some(Variant::Color(r([1.0, 1.0, 1.0, 0.0])));
    }
    NAMED_COLORS
        .iter()
        .find(|(color, ..)| color.replace('_', "") == normalized)
        .map(|(_, red, green, blue)| Variant::Color(r([*red, *green, *blue, 1.0])))
}

fn html_color(code: &str) -> Option<Variant> {
    let hex = code.strip_prefix('#').unwrap_or(code);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).ok().map(|v| f64::from(v) / 255.0);
    let expand = |c: &str| channel(&c.repeat(2));
    let components = match hex.len() {
        3 | 4 => (0..hex.len()).map(|i| expand(&hex[i..i + 1])).collect::<Option<Vec<_>>>()?,
        6 | 8 => (0..hex.len() / 2)
            .map(|i| channel(&hex[i * 2..i * 2 + 2]))
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    let alpha = components.get(3).copied().unwrap_or(1.0);
    Some(Variant::Color(r([components[0], components[1], components[2], alpha])))
}

/// Constants of `ty`, e.g. `Vector2.ZERO` or `Color.RED`.
pub fn constants(ty: VariantType) -> IndexMap<String, Variant> {
    let mut map = IndexMap::new();
    let mut add = |name: &str, value: Variant| {
        map.insert(name.to_string(), value);
    };
    let inf = f64::INFINITY;

    match ty {
        T::Vector2 => {
            add("ZERO", Variant::vector2(0.0, 0.0));
            add("ONE", Variant::vector2(1.0, 1.0));
            add("INF", Variant::vector2(inf, inf));
            add("LEFT", Variant::vector2(-1.0, 0.0));
            add("RIGHT", Variant::vector2(1.0, 0.0));
            add("UP", Variant::vector2(0.0, -1.0));
            add("DOWN", Variant::vector2(0.0, 1.0));
        }
        T::Vector2i => {
            add("ZERO", Variant::Vector2i([0, 0]));
            add("ONE", Variant::Vector2i([1, 1]));
            add("MIN", Variant::Vector2i([i64::from(i32::MIN); 2]));
            add("MAX", Variant::Vector2i([i64::from(i32::MAX); 2]));
            add("LEFT", Variant::Vector2i([-1, 0]));
            add("RIGHT", Variant::Vector2i([1, 0]));
            add("UP", Variant::Vector2i([0, -1]));
            add("DOWN", Variant::Vector2i([0, 1]));
        }
        T::Vector3 => {
            add("ZERO", Variant::vector3(0.0, 0.0, 0.0));
            add("ONE", Variant::vector3(1.0, 1.0, 1.0));
            add("INF", Variant::vector3(inf, inf, inf));
            add("LEFT", Variant::vector3(-1.0, 0.0, 0.0));
            add("RIGHT", Variant::vector3(1.0, 0.0, 0.0));
            add("UP", Variant::vector3(0.0, 1.0, 0.0));
            add("DOWN", Variant::vector3(0.0, -1.0, 0.0));
            add("FORWARD", Variant::vector3(0.0, 0.0, -1.0));
            add("BACK", Variant::vector3(0.0, 0.0, 1.0));
        }
        T::Vector3i => {
            add("ZERO", Variant::Vector3i([0, 0, 0]));
            add("ONE", Variant::Vector3i([1, 1, 1]));
            add("LEFT", Variant::Vector3i([-1, 0, 0]));
            add("RIGHT", Variant::Vector3i([1, 0, 0]));
            add("UP", Variant::Vector3i([0, 1, 0]));
            add("DOWN", Variant::Vector3i([0, -1, 0]));
            add("FORWARD", Variant::Vector3i([0, 0, -1]));
            add("BACK", Variant::Vector3i([0, 0, 1]));
        }
        T::Vector4 => {
            add("ZERO", Variant::Vector4(r([0.0; 4])));
            add("ONE", Variant::Vector4(r([1.0; 4])));
            add("INF", Variant::Vector4(r([inf; 4])));
        }
        T::Vector4i => {
            add("ZERO", Variant::Vector4i([0; 4]));
            add("ONE", Variant::Vector4i([1; 4]));
        }
        T::Color => {
            add("TRANSPARENT", Variant::Color(r([1.0, 1.0, 1.0, 0.0])));
            for (name, red, green, blue) in NAMED_COLORS {
                add(name, Variant::Color(r([*red, *green, *blue, 1.0])));
            }
        }
        T::Quaternion => add("IDENTITY", Variant::Quaternion(r([0.0, 0.0, 0.0, 1.0]))),
        T::Basis => {
            add("IDENTITY", Variant::Basis(r([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])));
            add("FLIP_X", Variant::Basis(r([-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])));
            add("FLIP_Y", Variant::Basis(r([1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0])));
            add("FLIP_Z", Variant::Basis(r([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0])));
        }
        T::Transform2D => {
            add("IDENTITY", Variant::Transform2D(r([1.0, 0.0, 0.0, 1.0, 0.0, 0.0])));
            add("FLIP_X", Variant::Transform2D(r([-1.0, 0.0, 0.0, 1.0, 0.0, 0.0])));
            add("FLIP_Y", Variant::Transform2D(r([1.0, 0.0, 0.0, -1.0, 0.0, 0.0])));
        }
        T::Transform3D => {
            add(
                "IDENTITY",
                Variant::Transform3D(r([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0])),
            );
        }
        T::Plane => {
            add("PLANE_YZ", Variant::Plane(r([1.0, 0.0, 0.0, 0.0])));
            add("PLANE_XZ", Variant::Plane(r([0.0, 1.0, 0.0, 0.0])));
            add("PLANE_XY", Variant::Plane(r([0.0, 0.0, 1.0, 0.0])));
        }
        T::Projection => {
            add(
                "IDENTITY",
                Variant::Projection(r([
                    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
                ])),
            );
            add("ZERO", Variant::Projection(r([0.0; 16])));
        }
        _ => {}
    }

    for values in enums(ty).into_values() {
        for (name, value) in values {
            map.insert(name, Variant::Int(value));
        }
    }
    map
}

/// Enums of `ty`; their values are also exposed through [`constants`].
pub fn enums(ty: VariantType) -> IndexMap<String, IndexMap<String, i64>> {
    let axes: &[&str] = match ty {
        T::Vector2 | T::Vector2i => &["AXIS_X", "AXIS_Y"],
        T::Vector3 | T::Vector3i => &["AXIS_X", "AXIS_Y", "AXIS_Z"],
        T::Vector4 | T::Vector4i => &["AXIS_X", "AXIS_Y", "AXIS_Z", "AXIS_W"],
        _ => &[],
    };
    let mut map = IndexMap::new();
    let numbered = |names: &[&str]| -> IndexMap<String, i64> {
        names.iter().zip(0i64..).map(|(name, i)| (name.to_string(), i)).collect()
    };
    if !axes.is_empty() {
        map.insert("Axis".to_string(), numbered(axes));
    }
    if ty == T::Projection {
        map.insert(
            "Planes".to_string(),
            numbered(&["PLANE_NEAR", "PLANE_FAR", "PLANE_LEFT", "PLANE_TOP", "PLANE_RIGHT", "PLANE_BOTTOM"]),
        );
    }
    map
}

// ============================================================================
// Constant access
// ============================================================================

fn rv<const N: usize>(values: &[Real], offset: usize) -> [Real; N] {
    std::array::from_fn(|i| values.get(offset + i).copied().unwrap_or_default())
}

fn color_hsv(c: &[Real; 4]) -> (f64, f64, f64) {
    let [red, green, blue] = [c[0].0, c[1].0, c[2].0];
    let max = red.max(green).max(blue);
    let min = red.min(green).min(blue);
    let delta = max - min;
    let hue = if delta == 0.0 {
        0.0
    } else if max == red {
        ((green - blue) / delta).rem_euclid(6.0) / 6.0
    } else if max == green {
        ((blue - red) / delta + 2.0) / 6.0
    } else {
        ((red - green) / delta + 4.0) / 6.0
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    (hue, saturation, max)
}

/// `value.name` for a constant base. `None` when the member does not exist
/// or cannot be computed statically.
pub fn get_named(value: &Variant, name: &str) -> Option<Variant> {
    let axis = |n: &str| match n {
        "x" => Some(0),
        "y" => Some(1),
        "z" => Some(2),
        "w" => Some(3),
        _ => None,
    };
    Some(match value {
        Variant::Vector2(v) => Variant::Float(*v.get(axis(name)?)?),
        Variant::Vector3(v) => Variant::Float(*v.get(axis(name)?)?),
        Variant::Vector4(v) | Variant::Quaternion(v) => Variant::Float(*v.get(axis(name)?)?),
        Variant::Vector2i(v) => Variant::Int(*v.get(axis(name)?)?),
        Variant::Vector3i(v) => Variant::Int(*v.get(axis(name)?)?),
        Variant::Vector4i(v) => Variant::Int(*v.get(axis(name)?)?),
        Variant::Rect2(v) => match name {
            "position" => Variant::Vector2(rv(v, 0)),
            "size" => Variant::Vector2(rv(v, 2)),
            "end" => Variant::vector2(v[0].0 + v[2].0, v[1].0 + v[3].0),
            _ => return None,
        },
        Variant::Rect2i(v) => match name {
            "position" => Variant::Vector2i([v[0], v[1]]),
            "size" => Variant::Vector2i([v[2], v[3]]),
            "end" => Variant::Vector2i([v[0] + v[2], v[1] + v[3]]),
            _ => return None,
        },
        Variant::Aabb(v) => match name {
            "position" => Variant::Vector3(rv(v, 0)),
            "size" => Variant::Vector3(rv(v, 3)),
            "end" => Variant::vector3(v[0].0 + v[3].0, v[1].0 + v[4].0, v[2].0 + v[5].0),
            _ => return None,
        },
        Variant::Plane(v) => match name {
            "normal" => Variant::Vector3(rv(v, 0)),
            "d" => Variant::Float(v[3]),
            _ => Variant::Float(*v[..3].get(axis(name)?)?),
        },
        Variant::Basis(m) => {
            let column = axis(name).filter(|c| *c < 3)?;
            Variant::Vector3([m[column], m[3 + column], m[6 + column]])
        }
        Variant::Transform2D(t) => match name {
            "x" => Variant::Vector2(rv(t, 0)),
            "y" => Variant::Vector2(rv(t, 2)),
            "origin" => Variant::Vector2(rv(t, 4)),
            _ => return None,
        },
        Variant::Transform3D(t) => match name {
            "basis" => Variant::Basis(rv(t, 0)),
            "origin" => Variant::Vector3(rv(t, 9)),
            _ => return None,
        },
        Variant::Projection(p) => Variant::Vector4(rv(p, axis(name)? * 4)),
        Variant::Color(c) => match name {
            "r" => Variant::Float(c[0]),
            "g" => Variant::Float(c[1]),
            "b" => Variant::Float(c[2]),
            "a" => Variant::Float(c[3]),
            "r8" | "g8" | "b8" | "a8" => {
                let index = ["r8", "g8", "b8", "a8"].iter().position(|n| *n == name)?;
                Variant::Int((c[index].0 * 255.0).round() as i64)
            }
            "h" => Variant::float(color_hsv(c).0),
            "s" => Variant::float(color_hsv(c).1),
            "v" => Variant::float(color_hsv(c).2),
            _ => return None,
        },
        Variant::Dictionary(dict) => dict.get(&Variant::string(name)).cloned()?,
        _ => return None,
    })
}

/// Resolve a possibly negative index against a length.
fn resolve_index(index: &Variant, len: usize) -> Option<usize> {
    let index = match index {
        Variant::Int(i) => *i,
        Variant::Float(f) => f.0 as i64,
        _ => return None,
    };
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { index + len } else { index };
    (0..len).contains(&resolved).then(|| resolved as usize)
}

/// `value[index]` for a constant base and index.
pub fn get_indexed(value: &Variant, index: &Variant) -> Option<Variant> {
    if let Some(name) = index.as_str()
        && !matches!(value, Variant::Dictionary(_))
    {
        return get_named(value, name);
    }
    Some(match value {
        Variant::Array(array) => array.elements.get(resolve_index(index, array.len())?)?.clone(),
        Variant::Packed(packed) => packed.elements.get(resolve_index(index, packed.elements.len())?)?.clone(),
        Variant::Dictionary(dict) => dict.get(index).cloned()?,
        Variant::String(s) => {
            let position = resolve_index(index, s.chars().count())?;
            Variant::String(s.chars().nth(position)?.to_string())
        }
        Variant::Vector2(v) => Variant::Float(v[resolve_index(index, 2)?]),
        Variant::Vector3(v) => Variant::Float(v[resolve_index(index, 3)?]),
        Variant::Vector4(v) | Variant::Quaternion(v) | Variant::Color(v) => Variant::Float(v[resolve_index(index, 4)?]),
        Variant::Vector2i(v) => Variant::Int(v[resolve_index(index, 2)?]),
        Variant::Vector3i(v) => Variant::Int(v[resolve_index(index, 3)?]),
        Variant::Vector4i(v) => Variant::Int(v[resolve_index(index, 4)?]),
        Variant::Basis(m) => {
            let column = resolve_index(index, 3)?;
            Variant::Vector3([m[column], m[3 + column], m[6 + column]])
        }
        Variant::Transform2D(t) => Variant::Vector2(rv(t, resolve_index(index, 3)? * 2)),
        Variant::Projection(p) => Variant::Vector4(rv(p, resolve_index(index, 4)? * 4)),
        _ => return None,
    })
}

fn expect_args(args: &[Variant], count: usize) -> Result<(), CallError> {
    match args.len().cmp(&count) {
        std::cmp::Ordering::Less => Err(CallError::TooFewArguments { expected: count }),
        std::cmp::Ordering::Greater => Err(CallError::TooManyArguments { expected: count }),
        std::cmp::Ordering::Equal => Ok(()),
    }
}

fn string_arg(args: &[Variant], index: usize) -> Result<&str, CallError> {
    args.get(index)
        .and_then(Variant::as_str)
        .ok_or_else(|| CallError::InvalidArgument {
            index,
            expected: T::String.name().to_string(),
        })
}

fn int_arg(args: &[Variant], index: usize) -> Result<i64, CallError> {
    args.get(index)
        .filter(|v| v.get_type().is_numeric())
        .and_then(Variant::as_int)
        .ok_or_else(|| CallError::InvalidArgument {
            index,
            expected: T::Int.name().to_string(),
        })
}

fn real_slice(value: &Variant) -> Option<&[Real]> {
    match value {
        Variant::Vector2(v) => Some(v),
        Variant::Vector3(v) => Some(v),
        Variant::Vector4(v) => Some(v),
        _ => None,
    }
}

fn rebuild_real(template: &Variant, components: Vec<f64>) -> Option<Variant> {
    let components: Vec<Real> = components.into_iter().map(OrderedFloat).collect();
    Some(match template {
        Variant::Vector2(_) => Variant::Vector2(rv(&components, 0)),
        Variant::Vector3(_) => Variant::Vector3(rv(&components, 0)),
        Variant::Vector4(_) => Variant::Vector4(rv(&components, 0)),
        _ => return None,
    })
}

/// Call a const builtin method on a constant value.
///
/// Only methods with a static result are evaluated; others report
/// `CallError::InvalidMethod` and stay runtime calls.
pub fn call_method(value: &Variant, name: &str, args: &[Variant]) -> Result<Variant, CallError> {
    match value {
        Variant::String(s) | Variant::StringName(s) => call_string(s, name, args),
        Variant::Array(array) => call_sequence(&array.elements, name, args),
        Variant::Packed(PackedArray { elements, .. }) => call_sequence(elements, name, args),
        Variant::Dictionary(dict) => match name {
            "size" => expect_args(args, 0).map(|_| Variant::Int(dict.len() as i64)),
            "is_empty" => expect_args(args, 0).map(|_| Variant::Bool(dict.is_empty())),
            "has" => {
                expect_args(args, 1)?;
                Ok(Variant::Bool(dict.entries.keys().any(|key| variant_equal(key, &args[0]))))
            }
            "keys" => expect_args(args, 0).map(|_| Variant::Array(Array::from_elements(dict.entries.keys().cloned().collect()))),
            "values" => {
                expect_args(args, 0).map(|_| Variant::Array(Array::from_elements(dict.entries.values().cloned().collect())))
            }
            "get" => {
                let default = args.get(1).cloned().unwrap_or_default();
                let key = args.first().ok_or(CallError::TooFewArguments { expected: 1 })?;
                Ok(dict.get(key).cloned().unwrap_or(default))
            }
            _ => Err(CallError::InvalidMethod),
        },
        vector @ (Variant::Vector2(_) | Variant::Vector3(_) | Variant::Vector4(_)) => call_vector(vector, name, args),
        Variant::Color(c) => match name {
            "inverted" => expect_args(args, 0).map(|_| Variant::Color(r([1.0 - c[0].0, 1.0 - c[1].0, 1.0 - c[2].0, c[3].0]))),
            "get_luminance" => {
                expect_args(args, 0).map(|_| Variant::float(0.2126 * c[0].0 + 0.7152 * c[1].0 + 0.0722 * c[2].0))
            }
            _ => Err(CallError::InvalidMethod),
        },
        _ => Err(CallError::InvalidMethod),
    }
}

fn call_string(s: &str, name: &str, args: &[Variant]) -> Result<Variant, CallError> {
    let text = |value: String| Ok(Variant::String(value));
    match name {
        "length" => expect_args(args, 0).map(|_| Variant::Int(s.chars().count() as i64)),
        "is_empty" => expect_args(args, 0).map(|_| Variant::Bool(s.is_empty())),
        "to_upper" => text(s.to_uppercase()),
        "to_lower" => text(s.to_lowercase()),
        "reverse" => text(s.chars().rev().collect()),
        "begins_with" => Ok(Variant::Bool(s.starts_with(string_arg(args, 0)?))),
        "ends_with" => Ok(Variant::Bool(s.ends_with(string_arg(args, 0)?))),
        "contains" => Ok(Variant::Bool(s.contains(string_arg(args, 0)?))),
        "find" => {
            let needle = string_arg(args, 0)?;
            let from = if args.len() > 1 { int_arg(args, 1)?.max(0) as usize } else { 0 };
            let found = s
                .char_indices()
                .skip(from)
                .find(|(byte, _)| s[*byte..].starts_with(needle))
                .map(|(byte, _)| s[..byte].chars().count() as i64);
            Ok(Variant::Int(found.unwrap_or(-1)))
        }
        "substr" => {
            let from = int_arg(args, 0)?.max(0) as usize;
            let len = if args.len() > 1 { int_arg(args, 1)? } else { -1 };
            let chars = s.chars().skip(from);
            text(if len < 0 { chars.collect() } else { chars.take(len as usize).collect() })
        }
        "left" => {
            let count = int_arg(args, 0)?;
            let total = s.chars().count() as i64;
            let take = if count < 0 { (total + count).max(0) } else { count };
            text(s.chars().take(take as usize).collect())
        }
        "right" => {
            let count = int_arg(args, 0)?;
            let total = s.chars().count() as i64;
            let take = if count < 0 { (total + count).max(0) } else { count.min(total) };
            text(s.chars().skip((total - take) as usize).collect())
        }
        "replace" => text(s.replace(string_arg(args, 0)?, string_arg(args, 1)?)),
        "repeat" => text(s.repeat(int_arg(args, 0)?.max(0) as usize)),
        "strip_edges" => text(s.trim().to_string()),
        "to_int" => Ok(Variant::Int(s.trim().parse().unwrap_or(0))),
        "to_float" => Ok(Variant::float(s.trim().parse().unwrap_or(0.0))),
        "is_valid_int" => Ok(Variant::Bool(s.parse::<i64>().is_ok())),
        "is_valid_float" => Ok(Variant::Bool(s.parse::<f64>().is_ok())),
        "get_extension" => text(s.rsplit_once('.').map(|(_, ext)| ext.to_string()).unwrap_or_default()),
        "get_file" => text(s.rsplit_once('/').map_or(s, |(_, file)| file).to_string()),
        "get_base_dir" => text(s.rsplit_once('/').map(|(dir, _)| dir.to_string()).unwrap_or_default()),
        "path_join" => {
            let file = string_arg(args, 0)?;
            text(if s.ends_with('/') { format!("{s}{file}") } else { format!("{s}/{file}") })
        }
        _ => Err(CallError::InvalidMethod),
    }
}

fn call_sequence(elements: &[Variant], name: &str, args: &[Variant]) -> Result<Variant, CallError> {
    match name {
        "size" => expect_args(args, 0).map(|_| Variant::Int(elements.len() as i64)),
        "is_empty" => expect_args(args, 0).map(|_| Variant::Bool(elements.is_empty())),
        "has" => {
            expect_args(args, 1)?;
            Ok(Variant::Bool(elements.iter().any(|e| variant_equal(e, &args[0]))))
        }
        "count" => {
            expect_args(args, 1)?;
            Ok(Variant::Int(elements.iter().filter(|e| variant_equal(e, &args[0])).count() as i64))
        }
        "find" => {
            let value = args.first().ok_or(CallError::TooFewArguments { expected: 1 })?;
            let from = if args.len() > 1 { int_arg(args, 1)?.max(0) as usize } else { 0 };
            let found = elements
                .iter()
                .enumerate()
                .skip(from)
                .find(|(_, e)| variant_equal(e, value))
                .map(|(i, _)| i as i64);
            Ok(Variant::Int(found.unwrap_or(-1)))
        }
        "front" => Ok(elements.first().cloned().unwrap_or_default()),
        "back" => Ok(elements.last().cloned().unwrap_or_default()),
        _ => Err(CallError::InvalidMethod),
    }
}

fn call_vector(vector: &Variant, name: &str, args: &[Variant]) -> Result<Variant, CallError> {
    let components: Vec<f64> = real_slice(vector).unwrap_or_default().iter().map(|c| c.0).collect();
    let other = || -> Result<Vec<f64>, CallError> {
        expect_args(args, 1)?;
        match real_slice(&args[0]) {
            Some(values) if args[0].get_type() == vector.get_type() => Ok(values.iter().map(|c| c.0).collect()),
            _ => Err(CallError::InvalidArgument {
                index: 0,
                expected: vector.get_type().name().to_string(),
            }),
        }
    };
    let length_squared: f64 = components.iter().map(|c| c * c).sum();
    let map = |f: fn(f64) -> f64| rebuild_real(vector, components.iter().copied().map(f).collect()).ok_or(CallError::InvalidMethod);

    match name {
        "length" => Ok(Variant::float(length_squared.sqrt())),
        "length_squared" => Ok(Variant::float(length_squared)),
        "normalized" => {
            let length = length_squared.sqrt();
            let normalized = components.iter().map(|c| if length == 0.0 { 0.0 } else { c / length }).collect();
            rebuild_real(vector, normalized).ok_or(CallError::InvalidMethod)
        }
        "dot" => {
            let other = other()?;
            Ok(Variant::float(components.iter().zip(&other).map(|(a, b)| a * b).sum()))
        }
        "distance_to" => {
            let other = other()?;
            Ok(Variant::float(components.iter().zip(&other).map(|(a, b)| (a - b) * (a - b)).sum::<f64>().sqrt()))
        }
        "abs" => map(f64::abs),
        "floor" => map(f64::floor),
        "ceil" => map(f64::ceil),
        "round" => map(f64::round),
        _ => Err(CallError::InvalidMethod),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_properties_and_constants() {
        assert_eq!(properties(T::Vector2i), &[("x", T::Int), ("y", T::Int)]);
        assert_eq!(constants(T::Vector2).get("UP"), Some(&Variant::vector2(0.0, -1.0)));
        assert_eq!(constants(T::Vector3).get("AXIS_Z"), Some(&Variant::Int(2)));
        assert_eq!(enums(T::Vector2).get("Axis").map(IndexMap::len), Some(2));
    }

    #[test]
    fn method_flags() {
        let array = methods(T::Array);
        let size = array.iter().find(|m| m.name == "size").map(|m| m.flags);
        let append = array.iter().find(|m| m.name == "append").map(|m| m.flags);
        assert!(size.is_some_and(|f| f.contains(MethodFlags::CONST)));
        assert!(append.is_some_and(|f| !f.contains(MethodFlags::CONST)));
        assert!(methods(T::String).iter().any(|m| m.name == "num" && m.is_static()));
    }

    #[test]
    fn named_colors() {
        assert_eq!(named_color("red"), Some(Variant::Color(r([1.0, 0.0, 0.0, 1.0]))));
        assert_eq!(named_color("Dark Gray"), constants(T::Color).get("DARK_GRAY").cloned());
        assert_eq!(named_color("#ff000080").map(|c| c.get_type()), Some(T::Color));
        assert_eq!(named_color("not a color"), None);
    }

    #[test]
    fn named_access() {
        assert_eq!(get_named(&Variant::vector2(3.0, 4.0), "y"), Some(Variant::float(4.0)));
        assert_eq!(get_named(&Variant::vector2(3.0, 4.0), "z"), None);
        assert_eq!(get_named(&Variant::Rect2i([1, 2, 3, 4]), "end"), Some(Variant::Vector2i([4, 6])));
        assert_eq!(
            get_named(&Variant::Color(r([1.0, 0.5, 0.0, 1.0])), "r8"),
            Some(Variant::Int(255))
        );
    }

    #[test]
    fn indexed_access() {
        let array = Variant::Array(Array::from_elements(vec![Variant::Int(1), Variant::Int(2)]));
        assert_eq!(get_indexed(&array, &Variant::Int(-1)), Some(Variant::Int(2)));
        assert_eq!(get_indexed(&array, &Variant::Int(2)), None);
        assert_eq!(get_indexed(&Variant::string("abc"), &Variant::Int(1)), Some(Variant::string("b")));
        assert_eq!(get_indexed(&Variant::Vector3i([1, 2, 3]), &Variant::string("z")), Some(Variant::Int(3)));
    }

    #[test]
    fn const_method_calls() {
        assert_eq!(call_method(&Variant::string("hello"), "length", &[]), Ok(Variant::Int(5)));
        assert_eq!(
            call_method(&Variant::string("hello"), "substr", &[Variant::Int(1), Variant::Int(3)]),
            Ok(Variant::string("ell"))
        );
        assert_eq!(call_method(&Variant::vector2(3.0, 4.0), "length", &[]), Ok(Variant::float(5.0)));
        assert_eq!(
            call_method(&Variant::string("x"), "push_back", &[]),
            Err(CallError::InvalidMethod)
        );
    }
}
