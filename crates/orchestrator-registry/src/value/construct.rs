//! Builtin constructors.
//!
//! Every builtin type lists its constructor overloads as [`MethodInfo`]s named
//! after the type. [`construct`] picks the overload matching the arguments
//! and builds the value, so a call like `Vector2(1, 2)` with constant
//! arguments folds at analysis time.

use orchestrator_core::{
    Array, CallError, CallableRef, ContainerType, Dictionary, MethodInfo, PackedArray, PropertyInfo, Real,
    SignalRef, Variant, VariantType,
};
use ordered_float::OrderedFloat;

use super::convert::{can_convert_strict, convert};

use VariantType as T;

fn arg(name: &str, ty: VariantType) -> PropertyInfo {
    if ty == T::Nil {
        PropertyInfo::variant(name)
    } else {
        PropertyInfo::new(ty, name)
    }
}

fn overload(ty: VariantType, args: &[(&str, VariantType)]) -> MethodInfo {
    MethodInfo::new(ty.name())
        .with_args(args.iter().map(|(name, arg_ty)| arg(name, *arg_ty)).collect())
        .with_return(PropertyInfo::new(ty, ""))
}

/// Constructor overloads of `ty`, the empty constructor first.
pub fn constructors(ty: VariantType) -> Vec<MethodInfo> {
    if ty == T::Nil {
        return Vec::new();
    }

    let mut list = vec![overload(ty, &[]), overload(ty, &[("from", ty)])];
    let mut add = |args: &[(&str, VariantType)]| list.push(overload(ty, args));

    match ty {
        T::Bool => {
            add(&[("from", T::Int)]);
            add(&[("from", T::Float)]);
        }
        T::Int => {
            add(&[("from", T::Float)]);
            add(&[("from", T::Bool)]);
            add(&[("from", T::String)]);
        }
        T::Float => {
            add(&[("from", T::Int)]);
            add(&[("from", T::Bool)]);
            add(&[("from", T::String)]);
        }
        T::String => {
            add(&[("from", T::StringName)]);
            add(&[("from", T::NodePath)]);
        }
        T::StringName | T::NodePath => add(&[("from", T::String)]),
        T::Vector2 => {
            add(&[("from", T::Vector2i)]);
            add(&[("x", T::Float), ("y", T::Float)]);
        }
        T::Vector2i => {
            add(&[("from", T::Vector2)]);
            add(&[("x", T::Int), ("y", T::Int)]);
        }
        T::Vector3 => {
            add(&[("from", T::Vector3i)]);
            add(&[("x", T::Float), ("y", T::Float), ("z", T::Float)]);
        }
        T::Vector3i => {
            add(&[("from", T::Vector3)]);
            add(&[("x", T::Int), ("y", T::Int), ("z", T::Int)]);
        }
        T::Vector4 => {
            add(&[("from", T::Vector4i)]);
            add(&[("x", T::Float), ("y", T::Float), ("z", T::Float), ("w", T::Float)]);
        }
        T::Vector4i => {
            add(&[("from", T::Vector4)]);
            add(&[("x", T::Int), ("y", T::Int), ("z", T::Int), ("w", T::Int)]);
        }
        T::Rect2 => {
            add(&[("from", T::Rect2i)]);
            add(&[("position", T::Vector2), ("size", T::Vector2)]);
            add(&[("x", T::Float), ("y", T::Float), ("width", T::Float), ("height", T::Float)]);
        }
        T::Rect2i => {
            add(&[("from", T::Rect2)]);
            add(&[("position", T::Vector2i), ("size", T::Vector2i)]);
            add(&[("x", T::Int), ("y", T::Int), ("width", T::Int), ("height", T::Int)]);
        }
        T::Transform2D => {
            add(&[("rotation", T::Float), ("position", T::Vector2)]);
            add(&[("rotation", T::Float), ("scale", T::Vector2), ("skew", T::Float), ("position", T::Vector2)]);
            add(&[("x_axis", T::Vector2), ("y_axis", T::Vector2), ("origin", T::Vector2)]);
        }
        T::Plane => {
            add(&[("normal", T::Vector3)]);
            add(&[("normal", T::Vector3), ("d", T::Float)]);
            add(&[("normal", T::Vector3), ("point", T::Vector3)]);
            add(&[("point1", T::Vector3), ("point2", T::Vector3), ("point3", T::Vector3)]);
            add(&[("a", T::Float), ("b", T::Float), ("c", T::Float), ("d", T::Float)]);
        }
        T::Quaternion => {
            add(&[("from", T::Basis)]);
            add(&[("axis", T::Vector3), ("angle", T::Float)]);
            add(&[("arc_from", T::Vector3), ("arc_to", T::Vector3)]);
            add(&[("x", T::Float), ("y", T::Float), ("z", T::Float), ("w", T::Float)]);
        }
        T::Aabb => add(&[("position", T::Vector3), ("size", T::Vector3)]),
        T::Basis => {
            add(&[("from", T::Quaternion)]);
            add(&[("axis", T::Vector3), ("angle", T::Float)]);
            add(&[("x_axis", T::Vector3), ("y_axis", T::Vector3), ("z_axis", T::Vector3)]);
        }
        T::Transform3D => {
            add(&[("basis", T::Basis), ("origin", T::Vector3)]);
            add(&[
                ("x_axis", T::Vector3),
                ("y_axis", T::Vector3),
                ("z_axis", T::Vector3),
                ("origin", T::Vector3),
            ]);
            add(&[("from", T::Projection)]);
        }
        T::Projection => {
            add(&[("from", T::Transform3D)]);
            add(&[("x_axis", T::Vector4), ("y_axis", T::Vector4), ("z_axis", T::Vector4), ("w_axis", T::Vector4)]);
        }
        T::Color => {
            add(&[("from", T::Color), ("alpha", T::Float)]);
            add(&[("r", T::Float), ("g", T::Float), ("b", T::Float)]);
            add(&[("r", T::Float), ("g", T::Float), ("b", T::Float), ("a", T::Float)]);
            add(&[("code", T::String)]);
            add(&[("code", T::String), ("alpha", T::Float)]);
        }
        T::Callable => add(&[("object", T::Object), ("method", T::StringName)]),
        T::Signal => add(&[("object", T::Object), ("signal", T::StringName)]),
        T::Dictionary => add(&[
            ("base", T::Dictionary),
            ("key_type", T::Int),
            ("key_class_name", T::StringName),
            ("key_script", T::Nil),
            ("value_type", T::Int),
            ("value_class_name", T::StringName),
            ("value_script", T::Nil),
        ]),
        T::Array => {
            add(&[("base", T::Array), ("type", T::Int), ("class_name", T::StringName), ("script", T::Nil)]);
            for packed in VariantType::ALL.iter().copied().filter(|t| t.is_packed_array()) {
                add(&[("from", packed)]);
            }
        }
        packed if packed.is_packed_array() => add(&[("from", T::Array)]),
        _ => {}
    }
    list
}

/// Default value of a builtin type, as produced by its empty constructor.
pub fn default_value(ty: VariantType) -> Variant {
    let zero = OrderedFloat(0.0);
    let one = OrderedFloat(1.0);
    match ty {
        T::Nil => Variant::Nil,
        T::Bool => Variant::Bool(false),
        T::Int => Variant::Int(0),
        T::Float => Variant::Float(zero),
        T::String => Variant::String(String::new()),
        T::Vector2 => Variant::Vector2([zero; 2]),
        T::Vector2i => Variant::Vector2i([0; 2]),
        T::Rect2 => Variant::Rect2([zero; 4]),
        T::Rect2i => Variant::Rect2i([0; 4]),
        T::Vector3 => Variant::Vector3([zero; 3]),
        T::Vector3i => Variant::Vector3i([0; 3]),
        T::Transform2D => Variant::Transform2D([one, zero, zero, one, zero, zero]),
        T::Vector4 => Variant::Vector4([zero; 4]),
        T::Vector4i => Variant::Vector4i([0; 4]),
        T::Plane => Variant::Plane([zero; 4]),
        T::Quaternion => Variant::Quaternion([zero, zero, zero, one]),
        T::Aabb => Variant::Aabb([zero; 6]),
        T::Basis => Variant::Basis(identity_basis()),
        T::Transform3D => {
            let mut transform = [zero; 12];
            transform[..9].copy_from_slice(&identity_basis());
            Variant::Transform3D(transform)
        }
        T::Projection => {
            let mut projection = [zero; 16];
            for i in 0..4 {
                projection[i * 5] = one;
            }
            Variant::Projection(projection)
        }
        T::Color => Variant::Color([zero, zero, zero, one]),
        T::StringName => Variant::StringName(String::new()),
        T::NodePath => Variant::NodePath(String::new()),
        T::Rid => Variant::Rid(0),
        T::Object => Variant::Object(None),
        T::Callable => Variant::Callable(CallableRef {
            target: String::new(),
            method: String::new(),
        }),
        T::Signal => Variant::Signal(SignalRef {
            owner: String::new(),
            name: String::new(),
        }),
        T::Dictionary => Variant::Dictionary(Dictionary::new()),
        T::Array => Variant::Array(Array::new()),
        packed => Variant::Packed(PackedArray {
            kind: packed,
            elements: Vec::new(),
        }),
    }
}

fn identity_basis() -> [Real; 9] {
    let mut basis = [OrderedFloat(0.0); 9];
    basis[0] = OrderedFloat(1.0);
    basis[4] = OrderedFloat(1.0);
    basis[8] = OrderedFloat(1.0);
    basis
}

fn accepts(param: &PropertyInfo, value: &Variant) -> bool {
    param.is_variant() || can_convert_strict(value.get_type(), param.ty)
}

/// Build a value of `ty` from `args`.
///
/// Overloads are matched by arity, then by argument type; a mismatch in the
/// only overload of that arity reports the offending argument.
pub fn construct(ty: VariantType, args: &[Variant]) -> Result<Variant, CallError> {
    if args.is_empty() {
        return Ok(default_value(ty));
    }

    let overloads = constructors(ty);
    let candidates: Vec<&MethodInfo> = overloads.iter().filter(|o| o.arguments.len() == args.len()).collect();
    if candidates.is_empty() {
        return Err(CallError::InvalidMethod);
    }

    // Exact matches win over overloads reached through conversion.
    let exact = candidates.iter().find(|o| {
        o.arguments
            .iter()
            .zip(args)
            .all(|(param, value)| param.is_variant() || param.ty == value.get_type())
    });
    let chosen = match exact {
        Some(found) => *found,
        None => match candidates.iter().find(|o| o.arguments.iter().zip(args).all(|(p, v)| accepts(p, v))) {
            Some(found) => *found,
            None if candidates.len() == 1 => {
                let (index, param) = candidates[0]
                    .arguments
                    .iter()
                    .enumerate()
                    .find(|(i, param)| !accepts(param, &args[*i]))
                    .ok_or(CallError::InvalidMethod)?;
                return Err(CallError::InvalidArgument {
                    index,
                    expected: param.ty.name().to_string(),
                });
            }
            None => return Err(CallError::InvalidMethod),
        },
    };

    let mut converted = Vec::with_capacity(args.len());
    for (index, (param, value)) in chosen.arguments.iter().zip(args).enumerate() {
        let value = if param.is_variant() {
            value.clone()
        } else {
            convert(value, param.ty).ok_or_else(|| CallError::InvalidArgument {
                index,
                expected: param.ty.name().to_string(),
            })?
        };
        converted.push(value);
    }

    build(ty, &converted)
}

fn real(value: &Variant) -> f64 {
    value.as_float().unwrap_or_default()
}

fn int(value: &Variant) -> i64 {
    value.as_int().unwrap_or_default()
}

fn reals<const N: usize>(args: &[Variant]) -> [Real; N] {
    std::array::from_fn(|i| OrderedFloat(args.get(i).map(real).unwrap_or_default()))
}

fn ints<const N: usize>(args: &[Variant]) -> [i64; N] {
    std::array::from_fn(|i| args.get(i).map(int).unwrap_or_default())
}

fn vec3(value: &Variant) -> [f64; 3] {
    match value {
        Variant::Vector3(v) => v.map(|c| c.0),
        _ => [0.0; 3],
    }
}

fn vec2(value: &Variant) -> [f64; 2] {
    match value {
        Variant::Vector2(v) => v.map(|c| c.0),
        _ => [0.0; 2],
    }
}

fn to_real<const N: usize>(values: [f64; N]) -> [Real; N] {
    values.map(OrderedFloat)
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}

fn normalized(v: [f64; 3]) -> [f64; 3] {
    let length = dot(v, v).sqrt();
    if length == 0.0 { v } else { v.map(|c| c / length) }
}

fn axis_angle_quaternion(axis: [f64; 3], angle: f64) -> [f64; 4] {
    let (s, c) = (angle * 0.5).sin_cos();
    [axis[0] * s, axis[1] * s, axis[2] * s, c]
}

/// Row-major rotation matrix of a unit quaternion.
fn quaternion_basis(q: [f64; 4]) -> [f64; 9] {
    let [x, y, z, w] = q;
    let d = x * x + y * y + z * z + w * w;
    let s = if d == 0.0 { 0.0 } else { 2.0 / d };
    let (xs, ys, zs) = (x * s, y * s, z * s);
    let (wx, wy, wz) = (w * xs, w * ys, w * zs);
    let (xx, xy, xz) = (x * xs, x * ys, x * zs);
    let (yy, yz, zz) = (y * ys, y * zs, z * zs);
    [
        1.0 - (yy + zz),
        xy - wz,
        xz + wy,
        xy + wz,
        1.0 - (xx + zz),
        yz - wx,
        xz - wy,
        yz + wx,
        1.0 - (xx + yy),
    ]
}

fn basis_quaternion(m: [f64; 9]) -> [f64; 4] {
    let trace = m[0] + m[4] + m[8];
    if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        [(m[7] - m[5]) / s, (m[2] - m[6]) / s, (m[3] - m[1]) / s, 0.25 * s]
    } else if m[0] > m[4] && m[0] > m[8] {
        let s = (1.0 + m[0] - m[4] - m[8]).sqrt() * 2.0;
        [0.25 * s, (m[1] + m[3]) / s, (m[2] + m[6]) / s, (m[7] - m[5]) / s]
    } else if m[4] > m[8] {
        let s = (1.0 + m[4] - m[0] - m[8]).sqrt() * 2.0;
        [(m[1] + m[3]) / s, 0.25 * s, (m[5] + m[7]) / s, (m[2] - m[6]) / s]
    } else {
        let s = (1.0 + m[8] - m[0] - m[4]).sqrt() * 2.0;
        [(m[2] + m[6]) / s, (m[5] + m[7]) / s, 0.25 * s, (m[3] - m[1]) / s]
    }
}

/// Rows from three column vectors.
fn basis_from_columns(x: [f64; 3], y: [f64; 3], z: [f64; 3]) -> [f64; 9] {
    [x[0], y[0], z[0], x[1], y[1], z[1], x[2], y[2], z[2]]
}

fn build(ty: VariantType, args: &[Variant]) -> Result<Variant, CallError> {
    let types: Vec<VariantType> = args.iter().map(Variant::get_type).collect();

    Ok(match (ty, types.as_slice()) {
        (_, [single]) if *single == ty => args[0].clone(),
        (T::Color, [T::Color, T::Float]) | (T::Color, [T::String, T::Float]) => {
            let Some(Variant::Color(mut color)) = convert(&args[0], T::Color) else {
                return Err(CallError::InvalidArgument {
                    index: 0,
                    expected: T::Color.name().to_string(),
                });
            };
            color[3] = OrderedFloat(real(&args[1]));
            Variant::Color(color)
        }
        (T::Color, [T::String]) => convert(&args[0], T::Color).ok_or_else(|| {
            CallError::Failed(format!("Invalid color code: \"{}\".", args[0]))
        })?,
        (T::Plane, [T::Vector3]) => {
            let n = vec3(&args[0]);
            Variant::Plane(to_real([n[0], n[1], n[2], 0.0]))
        }
        (T::Quaternion, [T::Basis]) => match &args[0] {
            Variant::Basis(m) => Variant::Quaternion(to_real(basis_quaternion(m.map(|c| c.0)))),
            _ => return Err(CallError::InvalidMethod),
        },
        (T::Basis, [T::Quaternion]) => match &args[0] {
            Variant::Quaternion(q) => Variant::Basis(to_real(quaternion_basis(q.map(|c| c.0)))),
            _ => return Err(CallError::InvalidMethod),
        },
        (T::Transform3D, [T::Projection]) => match &args[0] {
            Variant::Projection(p) => {
                let column = |i: usize| [p[i * 4].0, p[i * 4 + 1].0, p[i * 4 + 2].0];
                let mut transform = [OrderedFloat(0.0); 12];
                transform[..9].copy_from_slice(&to_real(basis_from_columns(column(0), column(1), column(2))));
                transform[9..].copy_from_slice(&to_real(column(3)));
                Variant::Transform3D(transform)
            }
            _ => return Err(CallError::InvalidMethod),
        },
        (T::Projection, [T::Transform3D]) => match &args[0] {
            Variant::Transform3D(t) => {
                let mut projection = [OrderedFloat(0.0); 16];
                for column in 0..3 {
                    for row in 0..3 {
                        projection[column * 4 + row] = t[row * 3 + column];
                    }
                    projection[12 + column] = t[9 + column];
                }
                projection[15] = OrderedFloat(1.0);
                Variant::Projection(projection)
            }
            _ => return Err(CallError::InvalidMethod),
        },
        (_, [_]) => convert(&args[0], ty).ok_or(CallError::InvalidMethod)?,

        (T::Vector2, _) => Variant::Vector2(reals(args)),
        (T::Vector2i, _) => Variant::Vector2i(ints(args)),
        (T::Vector3, _) => Variant::Vector3(reals(args)),
        (T::Vector3i, _) => Variant::Vector3i(ints(args)),
        (T::Vector4, _) => Variant::Vector4(reals(args)),
        (T::Vector4i, _) => Variant::Vector4i(ints(args)),
        (T::Rect2, [T::Vector2, T::Vector2]) => {
            let (p, s) = (vec2(&args[0]), vec2(&args[1]));
            Variant::Rect2(to_real([p[0], p[1], s[0], s[1]]))
        }
        (T::Rect2, _) => Variant::Rect2(reals(args)),
        (T::Rect2i, [T::Vector2i, T::Vector2i]) => match (&args[0], &args[1]) {
            (Variant::Vector2i(p), Variant::Vector2i(s)) => Variant::Rect2i([p[0], p[1], s[0], s[1]]),
            _ => return Err(CallError::InvalidMethod),
        },
        (T::Rect2i, _) => Variant::Rect2i(ints(args)),
        (T::Color, [_, _, _]) => {
            let [r, g, b]: [Real; 3] = reals(args);
            Variant::Color([r, g, b, OrderedFloat(1.0)])
        }
        (T::Color, _) => Variant::Color(reals(args)),
        (T::Quaternion, [T::Vector3, T::Float]) => {
            Variant::Quaternion(to_real(axis_angle_quaternion(normalized(vec3(&args[0])), real(&args[1]))))
        }
        (T::Quaternion, [T::Vector3, T::Vector3]) => {
            let (from, to) = (vec3(&args[0]), vec3(&args[1]));
            let c = cross(from, to);
            let d = dot(from, to);
            if d < -1.0 + f64::EPSILON.sqrt() {
                Variant::Quaternion(to_real([0.0, 1.0, 0.0, 0.0]))
            } else {
                let s = ((1.0 + d) * 2.0).sqrt();
                Variant::Quaternion(to_real([c[0] / s, c[1] / s, c[2] / s, s * 0.5]))
            }
        }
        (T::Quaternion, _) => Variant::Quaternion(reals(args)),
        (T::Plane, [T::Vector3, T::Float]) => {
            let n = vec3(&args[0]);
            Variant::Plane(to_real([n[0], n[1], n[2], real(&args[1])]))
        }
        (T::Plane, [T::Vector3, T::Vector3]) => {
            let (n, point) = (vec3(&args[0]), vec3(&args[1]));
            Variant::Plane(to_real([n[0], n[1], n[2], dot(n, point)]))
        }
        (T::Plane, [T::Vector3, T::Vector3, T::Vector3]) => {
            let (a, b, c) = (vec3(&args[0]), vec3(&args[1]), vec3(&args[2]));
            let ac = [a[0] - c[0], a[1] - c[1], a[2] - c[2]];
            let ab = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
            let n = normalized(cross(ac, ab));
            Variant::Plane(to_real([n[0], n[1], n[2], dot(n, a)]))
        }
        (T::Plane, _) => Variant::Plane(reals(args)),
        (T::Aabb, _) => {
            let (p, s) = (vec3(&args[0]), vec3(&args[1]));
            Variant::Aabb(to_real([p[0], p[1], p[2], s[0], s[1], s[2]]))
        }
        (T::Basis, [T::Vector3, T::Float]) => Variant::Basis(to_real(quaternion_basis(axis_angle_quaternion(
            normalized(vec3(&args[0])),
            real(&args[1]),
        )))),
        (T::Basis, _) => Variant::Basis(to_real(basis_from_columns(vec3(&args[0]), vec3(&args[1]), vec3(&args[2])))),
        (T::Transform2D, [T::Float, T::Vector2]) => {
            let (sin, cos) = real(&args[0]).sin_cos();
            let origin = vec2(&args[1]);
            Variant::Transform2D(to_real([cos, sin, -sin, cos, origin[0], origin[1]]))
        }
        (T::Transform2D, [T::Float, T::Vector2, T::Float, T::Vector2]) => {
            let rotation = real(&args[0]);
            let scale = vec2(&args[1]);
            let skew = real(&args[2]);
            let origin = vec2(&args[3]);
            Variant::Transform2D(to_real([
                rotation.cos() * scale[0],
                rotation.sin() * scale[0],
                -(rotation + skew).sin() * scale[1],
                (rotation + skew).cos() * scale[1],
                origin[0],
                origin[1],
            ]))
        }
        (T::Transform2D, _) => {
            let (x, y, o) = (vec2(&args[0]), vec2(&args[1]), vec2(&args[2]));
            Variant::Transform2D(to_real([x[0], x[1], y[0], y[1], o[0], o[1]]))
        }
        (T::Transform3D, [T::Basis, T::Vector3]) => {
            let Variant::Basis(basis) = &args[0] else {
                return Err(CallError::InvalidMethod);
            };
            let mut transform = [OrderedFloat(0.0); 12];
            transform[..9].copy_from_slice(basis);
            transform[9..].copy_from_slice(&to_real(vec3(&args[1])));
            Variant::Transform3D(transform)
        }
        (T::Transform3D, _) => {
            let basis = basis_from_columns(vec3(&args[0]), vec3(&args[1]), vec3(&args[2]));
            let mut transform = [OrderedFloat(0.0); 12];
            transform[..9].copy_from_slice(&to_real(basis));
            transform[9..].copy_from_slice(&to_real(vec3(&args[3])));
            Variant::Transform3D(transform)
        }
        (T::Projection, _) => {
            let mut projection = [OrderedFloat(0.0); 16];
            for (column, value) in args.iter().enumerate() {
                if let Variant::Vector4(v) = value {
                    projection[column * 4..column * 4 + 4].copy_from_slice(v);
                }
            }
            Variant::Projection(projection)
        }
        (T::Callable, _) => Variant::Callable(CallableRef {
            target: object_class(&args[0]),
            method: args[1].as_str().unwrap_or_default().to_string(),
        }),
        (T::Signal, _) => Variant::Signal(SignalRef {
            owner: object_class(&args[0]),
            name: args[1].as_str().unwrap_or_default().to_string(),
        }),
        (T::Array, _) => {
            let Variant::Array(base) = &args[0] else {
                return Err(CallError::InvalidMethod);
            };
            let mut array = base.clone();
            array.set_typed(container_type(&args[1], &args[2]));
            Variant::Array(array)
        }
        (T::Dictionary, _) => {
            let Variant::Dictionary(base) = &args[0] else {
                return Err(CallError::InvalidMethod);
            };
            let mut dictionary = base.clone();
            dictionary.key_type = Some(container_type(&args[1], &args[2]));
            dictionary.value_type = Some(container_type(&args[4], &args[5]));
            Variant::Dictionary(dictionary)
        }
        _ => return Err(CallError::InvalidMethod),
    })
}

fn object_class(value: &Variant) -> String {
    value
        .as_object()
        .map(|object| object.class_name().to_string())
        .unwrap_or_default()
}

fn container_type(builtin: &Variant, class_name: &Variant) -> ContainerType {
    let builtin = u8::try_from(int(builtin))
        .ok()
        .and_then(|tag| VariantType::try_from(tag).ok())
        .unwrap_or_default();
    ContainerType {
        builtin,
        class_name: class_name.as_str().unwrap_or_default().to_string(),
        script: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_from_components() {
        assert_eq!(
            construct(T::Vector2, &[Variant::Int(1), Variant::Int(2)]),
            Ok(Variant::vector2(1.0, 2.0))
        );
        assert_eq!(
            construct(T::Vector3i, &[Variant::Int(1), Variant::Int(2), Variant::Int(3)]),
            Ok(Variant::Vector3i([1, 2, 3]))
        );
    }

    #[test]
    fn empty_constructor_is_default() {
        assert_eq!(construct(T::Color, &[]), Ok(default_value(T::Color)));
        assert_eq!(construct(T::Array, &[]), Ok(Variant::Array(Array::new())));
    }

    #[test]
    fn conversion_constructors() {
        assert_eq!(construct(T::Int, &[Variant::float(2.5)]), Ok(Variant::Int(2)));
        assert_eq!(
            construct(T::String, &[Variant::StringName("a".into())]),
            Ok(Variant::string("a"))
        );
        assert_eq!(
            construct(T::Color, &[Variant::string("red")]),
            Ok(Variant::Color([OrderedFloat(1.0), OrderedFloat(0.0), OrderedFloat(0.0), OrderedFloat(1.0)]))
        );
    }

    #[test]
    fn color_with_alpha() {
        let color = construct(T::Color, &[Variant::float(0.5), Variant::float(0.5), Variant::float(0.5)]);
        assert_eq!(
            color,
            Ok(Variant::Color([OrderedFloat(0.5), OrderedFloat(0.5), OrderedFloat(0.5), OrderedFloat(1.0)]))
        );
    }

    #[test]
    fn argument_errors() {
        assert_eq!(
            construct(T::Vector2, &[Variant::Int(1), Variant::Int(2), Variant::Int(3)]),
            Err(CallError::InvalidMethod)
        );
        assert_eq!(
            construct(T::Vector2, &[Variant::string("x"), Variant::Int(2)]),
            Err(CallError::InvalidArgument {
                index: 0,
                expected: "float".to_string()
            })
        );
    }

    #[test]
    fn typed_array_constructor() {
        let array = construct(
            T::Array,
            &[
                Variant::Array(Array::new()),
                Variant::Int(T::Int as i64),
                Variant::StringName(String::new()),
                Variant::Nil,
            ],
        );
        let Ok(Variant::Array(array)) = array else {
            panic!("expected an array");
        };
        assert_eq!(array.element_type.map(|t| t.builtin), Some(T::Int));
    }

    #[test]
    fn transform_constructor() {
        let transform = construct(T::Transform2D, &[Variant::float(0.0), Variant::vector2(3.0, 4.0)]);
        assert_eq!(
            transform,
            Ok(Variant::Transform2D(to_real([1.0, 0.0, -0.0, 1.0, 3.0, 4.0])))
        );
    }
}
