//! Builtin operator table and evaluator.
//!
//! [`return_type`] is the static table of validated operators: an entry
//! exists exactly when the operator is defined for the operand kinds, and
//! gives the result kind. [`evaluate`] folds constant operands with runtime
//! semantics and agrees with the table on which pairs are defined. Unary
//! operators take `Nil` as their second operand.

use std::cmp::Ordering;

use orchestrator_core::{Array, CallError, PackedArray, Real, Variant, VariantOperator, VariantType};
use ordered_float::OrderedFloat;

use VariantOperator as Op;
use VariantType as T;

const DIVISION_BY_ZERO: &str = "Division by zero error";
const MODULO_BY_ZERO: &str = "Modulo by zero error";
const INVALID_SHIFT: &str = "Invalid operands for bit shifting. Only positive operands are supported.";

fn is_real_vector(ty: VariantType) -> bool {
    matches!(ty, T::Vector2 | T::Vector3 | T::Vector4)
}

fn is_int_vector(ty: VariantType) -> bool {
    matches!(ty, T::Vector2i | T::Vector3i | T::Vector4i)
}

/// Float vector with the same arity as an integer vector.
fn real_counterpart(ty: VariantType) -> VariantType {
    match ty {
        T::Vector2i => T::Vector2,
        T::Vector3i => T::Vector3,
        T::Vector4i => T::Vector4,
        other => other,
    }
}

fn is_logic_operand(ty: VariantType) -> bool {
    matches!(ty, T::Nil | T::Bool | T::Int | T::Float | T::Object)
}

fn is_ordered(ty: VariantType) -> bool {
    matches!(ty, T::Bool | T::Int | T::Float | T::String | T::StringName | T::Rid)
        || is_real_vector(ty)
        || is_int_vector(ty)
}

/// Result kind of `a op b`, `None` when the operator is not defined.
pub fn return_type(op: VariantOperator, a: VariantType, b: VariantType) -> Option<VariantType> {
    let numeric = a.is_numeric() && b.is_numeric();
    let both_int = a == T::Int && b == T::Int;
    match op {
        Op::Equal | Op::NotEqual => {
            let comparable = a == T::Nil
                || b == T::Nil
                || a == b
                || numeric
                || (a.is_string_like() && b.is_string_like());
            comparable.then_some(T::Bool)
        }
        Op::Less | Op::LessEqual | Op::Greater | Op::GreaterEqual => {
            let comparable = (a == b && is_ordered(a)) || numeric || (a.is_string_like() && b.is_string_like());
            comparable.then_some(T::Bool)
        }
        Op::Add => match (a, b) {
            _ if both_int => Some(T::Int),
            _ if numeric => Some(T::Float),
            _ if a.is_string_like() && b.is_string_like() => Some(T::String),
            _ if a == b
                && (is_real_vector(a)
                    || is_int_vector(a)
                    || matches!(a, T::Color | T::Quaternion | T::Array)
                    || a.is_packed_array()) =>
            {
                Some(a)
            }
            _ => None,
        },
        Op::Subtract => match (a, b) {
            _ if both_int => Some(T::Int),
            _ if numeric => Some(T::Float),
            _ if a == b && (is_real_vector(a) || is_int_vector(a) || matches!(a, T::Color | T::Quaternion)) => Some(a),
            _ => None,
        },
        Op::Multiply => multiply_type(a, b),
        Op::Divide => match (a, b) {
            _ if both_int => Some(T::Int),
            _ if numeric => Some(T::Float),
            _ if a == b && (is_real_vector(a) || is_int_vector(a) || a == T::Color) => Some(a),
            (vector, T::Int) if is_real_vector(vector) || is_int_vector(vector) => Some(vector),
            (vector, T::Float) if is_real_vector(vector) => Some(vector),
            (vector, T::Float) if is_int_vector(vector) => Some(real_counterpart(vector)),
            (T::Color | T::Quaternion, T::Int | T::Float) => Some(a),
            _ => None,
        },
        Op::Module => match (a, b) {
            (T::String, _) => Some(T::String),
            _ if both_int => Some(T::Int),
            _ if a == b && is_int_vector(a) => Some(a),
            (vector, T::Int) if is_int_vector(vector) => Some(vector),
            _ => None,
        },
        Op::Power => match (a, b) {
            _ if both_int => Some(T::Int),
            _ if numeric => Some(T::Float),
            _ => None,
        },
        Op::ShiftLeft | Op::ShiftRight | Op::BitAnd | Op::BitOr | Op::BitXor => both_int.then_some(T::Int),
        Op::Negate | Op::Positive => {
            let defined = b == T::Nil
                && (a.is_numeric()
                    || is_real_vector(a)
                    || is_int_vector(a)
                    || matches!(a, T::Quaternion | T::Plane)
                    || (op == Op::Negate && a == T::Color));
            defined.then_some(a)
        }
        Op::BitNegate => (a == T::Int && b == T::Nil).then_some(T::Int),
        Op::Not => (b == T::Nil).then_some(T::Bool),
        Op::And | Op::Or | Op::Xor => (is_logic_operand(a) && is_logic_operand(b)).then_some(T::Bool),
        Op::In => match b {
            T::Array | T::Dictionary => Some(T::Bool),
            T::String | T::StringName => a.is_string_like().then_some(T::Bool),
            T::Object => a.is_string_like().then_some(T::Bool),
            packed if packed.is_packed_array() => {
                let element = packed.packed_element_type()?;
                let matches = a == element || (element.is_numeric() && a.is_numeric());
                matches.then_some(T::Bool)
            }
            _ => None,
        },
    }
}

fn multiply_type(a: VariantType, b: VariantType) -> Option<VariantType> {
    match (a, b) {
        (T::Int, T::Int) => Some(T::Int),
        _ if a.is_numeric() && b.is_numeric() => Some(T::Float),
        _ if a == b
            && (is_real_vector(a)
                || is_int_vector(a)
                || matches!(
                    a,
                    T::Color | T::Quaternion | T::Transform2D | T::Basis | T::Transform3D | T::Projection
                )) =>
        {
            Some(a)
        }
        (vector, scalar) | (scalar, vector) if scalar.is_numeric() && is_real_vector(vector) => Some(vector),
        (vector, T::Int) | (T::Int, vector) if is_int_vector(vector) => Some(vector),
        (vector, T::Float) | (T::Float, vector) if is_int_vector(vector) => Some(real_counterpart(vector)),
        (T::Color, scalar) | (scalar, T::Color) if scalar.is_numeric() => Some(T::Color),
        (T::Quaternion, scalar) | (scalar, T::Quaternion) if scalar.is_numeric() => Some(T::Quaternion),
        (T::Quaternion, T::Vector3) => Some(T::Vector3),
        (T::Transform2D, T::Vector2) => Some(T::Vector2),
        (T::Basis, T::Vector3) | (T::Transform3D, T::Vector3) => Some(T::Vector3),
        (T::Projection, T::Vector4) => Some(T::Vector4),
        _ => None,
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate `a op b`.
///
/// `CallError::InvalidMethod` means the operator is undefined for the
/// operands; `CallError::Failed` carries the runtime error message, e.g. a
/// division by zero or a bad format string.
pub fn evaluate(op: VariantOperator, a: &Variant, b: &Variant) -> Result<Variant, CallError> {
    if return_type(op, a.get_type(), b.get_type()).is_none() {
        return Err(CallError::InvalidMethod);
    }

    match op {
        Op::Equal => Ok(Variant::Bool(variant_equal(a, b))),
        Op::NotEqual => Ok(Variant::Bool(!variant_equal(a, b))),
        Op::Less | Op::LessEqual | Op::Greater | Op::GreaterEqual => {
            let result = match compare(a, b) {
                Some(ordering) => match op {
                    Op::Less => ordering == Ordering::Less,
                    Op::LessEqual => ordering != Ordering::Greater,
                    Op::Greater => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                },
                None => false,
            };
            Ok(Variant::Bool(result))
        }
        Op::Not => Ok(Variant::Bool(!a.booleanize())),
        Op::And => Ok(Variant::Bool(a.booleanize() && b.booleanize())),
        Op::Or => Ok(Variant::Bool(a.booleanize() || b.booleanize())),
        Op::Xor => Ok(Variant::Bool(a.booleanize() != b.booleanize())),
        Op::In => Ok(Variant::Bool(contains(b, a))),
        Op::Negate | Op::Positive | Op::BitNegate => unary(op, a),
        Op::Module if a.get_type() == T::String => {
            let format = a.as_str().unwrap_or_default();
            let arguments = match b {
                Variant::Array(array) => array.elements.as_slice(),
                other => std::slice::from_ref(other),
            };
            format_string(format, arguments)
                .map(Variant::String)
                .map_err(CallError::Failed)
        }
        _ => arithmetic(op, a, b),
    }
}

/// Equality with numeric and string-like coercion, recursing into containers.
pub fn variant_equal(a: &Variant, b: &Variant) -> bool {
    match (a, b) {
        (Variant::Int(x), Variant::Float(y)) | (Variant::Float(y), Variant::Int(x)) => (*x as f64) == y.0,
        (Variant::Float(x), Variant::Float(y)) => x.0 == y.0,
        (l, r) if l.is_null() && r.is_null() => true,
        (Variant::String(x) | Variant::StringName(x), Variant::String(y) | Variant::StringName(y)) => x == y,
        (Variant::Array(x), Variant::Array(y)) => {
            x.len() == y.len() && x.elements.iter().zip(&y.elements).all(|(l, r)| variant_equal(l, r))
        }
        (Variant::Dictionary(x), Variant::Dictionary(y)) => {
            x.len() == y.len()
                && x.entries
                    .iter()
                    .all(|(key, value)| y.get(key).is_some_and(|other| variant_equal(value, other)))
        }
        _ => a == b,
    }
}

fn compare(a: &Variant, b: &Variant) -> Option<Ordering> {
    match (a, b) {
        (Variant::Int(x), Variant::Int(y)) => Some(x.cmp(y)),
        (Variant::Bool(x), Variant::Bool(y)) => Some(x.cmp(y)),
        (Variant::Rid(x), Variant::Rid(y)) => Some(x.cmp(y)),
        (Variant::String(x) | Variant::StringName(x), Variant::String(y) | Variant::StringName(y)) => Some(x.cmp(y)),
        (Variant::Vector2(x), Variant::Vector2(y)) => Some(x.cmp(y)),
        (Variant::Vector3(x), Variant::Vector3(y)) => Some(x.cmp(y)),
        (Variant::Vector4(x), Variant::Vector4(y)) => Some(x.cmp(y)),
        (Variant::Vector2i(x), Variant::Vector2i(y)) => Some(x.cmp(y)),
        (Variant::Vector3i(x), Variant::Vector3i(y)) => Some(x.cmp(y)),
        (Variant::Vector4i(x), Variant::Vector4i(y)) => Some(x.cmp(y)),
        (x, y) => x.as_float()?.partial_cmp(&y.as_float()?),
    }
}

fn contains(container: &Variant, value: &Variant) -> bool {
    match container {
        Variant::Array(array) => array.elements.iter().any(|e| variant_equal(e, value)),
        Variant::Packed(packed) => packed.elements.iter().any(|e| variant_equal(e, value)),
        Variant::Dictionary(dict) => dict.entries.keys().any(|key| variant_equal(key, value)),
        Variant::String(text) | Variant::StringName(text) => value.as_str().is_some_and(|needle| text.contains(needle)),
        _ => false,
    }
}

fn unary(op: VariantOperator, a: &Variant) -> Result<Variant, CallError> {
    if op == Op::Positive {
        return Ok(a.clone());
    }
    Ok(match (op, a) {
        (Op::BitNegate, Variant::Int(x)) => Variant::Int(!x),
        (Op::Negate, Variant::Int(x)) => Variant::Int(x.wrapping_neg()),
        (Op::Negate, Variant::Float(x)) => Variant::float(-x.0),
        (Op::Negate, Variant::Vector2(v)) => Variant::Vector2(v.map(|c| -c)),
        (Op::Negate, Variant::Vector3(v)) => Variant::Vector3(v.map(|c| -c)),
        (Op::Negate, Variant::Vector4(v)) => Variant::Vector4(v.map(|c| -c)),
        (Op::Negate, Variant::Vector2i(v)) => Variant::Vector2i(v.map(i64::wrapping_neg)),
        (Op::Negate, Variant::Vector3i(v)) => Variant::Vector3i(v.map(i64::wrapping_neg)),
        (Op::Negate, Variant::Vector4i(v)) => Variant::Vector4i(v.map(i64::wrapping_neg)),
        (Op::Negate, Variant::Quaternion(v)) => Variant::Quaternion(v.map(|c| -c)),
        (Op::Negate, Variant::Plane(v)) => Variant::Plane(v.map(|c| -c)),
        (Op::Negate, Variant::Color(v)) => Variant::Color(v.map(|c| OrderedFloat(1.0 - c.0))),
        _ => return Err(CallError::InvalidMethod),
    })
}

fn int_op(op: VariantOperator, a: i64, b: i64) -> Result<i64, CallError> {
    Ok(match op {
        Op::Add => a.wrapping_add(b),
        Op::Subtract => a.wrapping_sub(b),
        Op::Multiply => a.wrapping_mul(b),
        Op::Divide if b == 0 => return Err(CallError::Failed(DIVISION_BY_ZERO.to_string())),
        Op::Divide => a.wrapping_div(b),
        Op::Module if b == 0 => return Err(CallError::Failed(MODULO_BY_ZERO.to_string())),
        Op::Module => a.wrapping_rem(b),
        Op::Power => (a as f64).powf(b as f64) as i64,
        Op::ShiftLeft | Op::ShiftRight if a < 0 || b < 0 => {
            return Err(CallError::Failed(INVALID_SHIFT.to_string()));
        }
        Op::ShiftLeft => a.wrapping_shl(b as u32),
        Op::ShiftRight => a.wrapping_shr(b as u32),
        Op::BitAnd => a & b,
        Op::BitOr => a | b,
        Op::BitXor => a ^ b,
        _ => return Err(CallError::InvalidMethod),
    })
}

fn real_op(op: VariantOperator, a: f64, b: f64) -> Result<f64, CallError> {
    Ok(match op {
        Op::Add => a + b,
        Op::Subtract => a - b,
        Op::Multiply => a * b,
        Op::Divide => a / b,
        Op::Power => a.powf(b),
        _ => return Err(CallError::InvalidMethod),
    })
}

fn real_components<const N: usize>(op: VariantOperator, a: &[Real; N], b: &[Real; N]) -> Result<[Real; N], CallError> {
    let mut out = [OrderedFloat(0.0); N];
    for i in 0..N {
        out[i] = OrderedFloat(real_op(op, a[i].0, b[i].0)?);
    }
    Ok(out)
}

fn int_components<const N: usize>(op: VariantOperator, a: &[i64; N], b: &[i64; N]) -> Result<[i64; N], CallError> {
    let mut out = [0; N];
    for i in 0..N {
        out[i] = int_op(op, a[i], b[i])?;
    }
    Ok(out)
}

fn to_reals<const N: usize>(v: &[i64; N]) -> [Real; N] {
    v.map(|c| OrderedFloat(c as f64))
}

/// `vector op scalar`, or `scalar op vector` when `swapped`. Only
/// multiplication commutes.
fn real_scalar<const N: usize>(op: VariantOperator, v: &[Real; N], s: f64, swapped: bool) -> Result<[Real; N], CallError> {
    if swapped && op != Op::Multiply {
        return Err(CallError::InvalidMethod);
    }
    real_components(op, v, &[OrderedFloat(s); N])
}

fn int_scalar<const N: usize>(op: VariantOperator, v: &[i64; N], s: i64) -> Result<[i64; N], CallError> {
    int_components(op, v, &[s; N])
}

fn arithmetic(op: VariantOperator, a: &Variant, b: &Variant) -> Result<Variant, CallError> {
    use Variant as V;
    Ok(match (a, b) {
        (V::Int(x), V::Int(y)) => V::Int(int_op(op, *x, *y)?),
        (V::Int(_) | V::Float(_), V::Int(_) | V::Float(_)) => {
            let (x, y) = (a.as_float().unwrap_or_default(), b.as_float().unwrap_or_default());
            V::float(real_op(op, x, y)?)
        }
        (V::String(x) | V::StringName(x), V::String(y) | V::StringName(y)) if op == Op::Add => V::String(format!("{x}{y}")),

        (V::Vector2(x), V::Vector2(y)) => V::Vector2(real_components(op, x, y)?),
        (V::Vector3(x), V::Vector3(y)) => V::Vector3(real_components(op, x, y)?),
        (V::Vector4(x), V::Vector4(y)) => V::Vector4(real_components(op, x, y)?),
        (V::Vector2i(x), V::Vector2i(y)) => V::Vector2i(int_components(op, x, y)?),
        (V::Vector3i(x), V::Vector3i(y)) => V::Vector3i(int_components(op, x, y)?),
        (V::Vector4i(x), V::Vector4i(y)) => V::Vector4i(int_components(op, x, y)?),
        (V::Color(x), V::Color(y)) => V::Color(real_components(op, x, y)?),

        (V::Vector2(v), s @ (V::Int(_) | V::Float(_))) => V::Vector2(real_scalar(op, v, scalar(s), false)?),
        (V::Vector3(v), s @ (V::Int(_) | V::Float(_))) => V::Vector3(real_scalar(op, v, scalar(s), false)?),
        (V::Vector4(v), s @ (V::Int(_) | V::Float(_))) => V::Vector4(real_scalar(op, v, scalar(s), false)?),
        (V::Color(v), s @ (V::Int(_) | V::Float(_))) => V::Color(real_scalar(op, v, scalar(s), false)?),
        (V::Quaternion(v), s @ (V::Int(_) | V::Float(_))) => V::Quaternion(real_scalar(op, v, scalar(s), false)?),
        (s @ (V::Int(_) | V::Float(_)), V::Vector2(v)) => V::Vector2(real_scalar(op, v, scalar(s), true)?),
        (s @ (V::Int(_) | V::Float(_)), V::Vector3(v)) => V::Vector3(real_scalar(op, v, scalar(s), true)?),
        (s @ (V::Int(_) | V::Float(_)), V::Vector4(v)) => V::Vector4(real_scalar(op, v, scalar(s), true)?),
        (s @ (V::Int(_) | V::Float(_)), V::Color(v)) => V::Color(real_scalar(op, v, scalar(s), true)?),
        (s @ (V::Int(_) | V::Float(_)), V::Quaternion(v)) => V::Quaternion(real_scalar(op, v, scalar(s), true)?),

        (V::Vector2i(v), V::Int(s)) => V::Vector2i(int_scalar(op, v, *s)?),
        (V::Vector3i(v), V::Int(s)) => V::Vector3i(int_scalar(op, v, *s)?),
        (V::Vector4i(v), V::Int(s)) => V::Vector4i(int_scalar(op, v, *s)?),
        (V::Int(s), V::Vector2i(v)) if op == Op::Multiply => V::Vector2i(int_scalar(op, v, *s)?),
        (V::Int(s), V::Vector3i(v)) if op == Op::Multiply => V::Vector3i(int_scalar(op, v, *s)?),
        (V::Int(s), V::Vector4i(v)) if op == Op::Multiply => V::Vector4i(int_scalar(op, v, *s)?),
        (V::Vector2i(v), V::Float(s)) | (V::Float(s), V::Vector2i(v)) => {
            V::Vector2(real_scalar(op, &to_reals(v), s.0, matches!(a, V::Float(_)))?)
        }
        (V::Vector3i(v), V::Float(s)) | (V::Float(s), V::Vector3i(v)) => {
            V::Vector3(real_scalar(op, &to_reals(v), s.0, matches!(a, V::Float(_)))?)
        }
        (V::Vector4i(v), V::Float(s)) | (V::Float(s), V::Vector4i(v)) => {
            V::Vector4(real_scalar(op, &to_reals(v), s.0, matches!(a, V::Float(_)))?)
        }

        (V::Quaternion(x), V::Quaternion(y)) => match op {
            Op::Multiply => V::Quaternion(quaternion_mul(x, y)),
            _ => V::Quaternion(real_components(op, x, y)?),
        },
        (V::Quaternion(q), V::Vector3(v)) => V::Vector3(quaternion_xform(q, v)),
        (V::Transform2D(t), V::Vector2(v)) => V::Vector2(transform2d_xform(t, v)),
        (V::Transform2D(x), V::Transform2D(y)) => V::Transform2D(transform2d_mul(x, y)),
        (V::Basis(m), V::Vector3(v)) => V::Vector3(basis_xform(m, v)),
        (V::Basis(x), V::Basis(y)) => V::Basis(basis_mul(x, y)),
        (V::Transform3D(t), V::Vector3(v)) => V::Vector3(transform3d_xform(t, v)),
        (V::Transform3D(x), V::Transform3D(y)) => V::Transform3D(transform3d_mul(x, y)),
        (V::Projection(p), V::Vector4(v)) => V::Vector4(projection_xform(p, v)),
        (V::Projection(x), V::Projection(y)) => V::Projection(projection_mul(x, y)),

        (V::Array(x), V::Array(y)) if op == Op::Add => {
            let mut elements = x.elements.clone();
            elements.extend(y.elements.iter().cloned());
            let mut array = Array::from_elements(elements);
            if x.element_type == y.element_type {
                array.element_type = x.element_type.clone();
            }
            V::Array(array)
        }
        (V::Packed(x), V::Packed(y)) if op == Op::Add && x.kind == y.kind => {
            let mut elements = x.elements.clone();
            elements.extend(y.elements.iter().cloned());
            V::Packed(PackedArray { kind: x.kind, elements })
        }
        _ => return Err(CallError::InvalidMethod),
    })
}

fn scalar(value: &Variant) -> f64 {
    value.as_float().unwrap_or_default()
}

fn quaternion_mul(a: &[Real; 4], b: &[Real; 4]) -> [Real; 4] {
    let [x1, y1, z1, w1] = a.map(|c| c.0);
    let [x2, y2, z2, w2] = b.map(|c| c.0);
    [
        w1 * x2 + x1 * w2 + y1 * z2 - z1 * y2,
        w1 * y2 + y1 * w2 + z1 * x2 - x1 * z2,
        w1 * z2 + z1 * w2 + x1 * y2 - y1 * x2,
        w1 * w2 - x1 * x2 - y1 * y2 - z1 * z2,
    ]
    .map(OrderedFloat)
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}

fn quaternion_xform(q: &[Real; 4], v: &[Real; 3]) -> [Real; 3] {
    let u = [q[0].0, q[1].0, q[2].0];
    let w = q[3].0;
    let v = v.map(|c| c.0);
    let uv = cross(u, v);
    let uuv = cross(u, uv);
    [0, 1, 2].map(|i| OrderedFloat(v[i] + (uv[i] * w + uuv[i]) * 2.0))
}

/// Columns `x`, `y` then origin.
fn transform2d_xform(t: &[Real; 6], v: &[Real; 2]) -> [Real; 2] {
    let t = t.map(|c| c.0);
    let (x, y) = (v[0].0, v[1].0);
    [t[0] * x + t[2] * y + t[4], t[1] * x + t[3] * y + t[5]].map(OrderedFloat)
}

fn transform2d_mul(a: &[Real; 6], b: &[Real; 6]) -> [Real; 6] {
    let basis = |x: Real, y: Real| {
        let (x, y) = (x.0, y.0);
        [a[0].0 * x + a[2].0 * y, a[1].0 * x + a[3].0 * y]
    };
    let col_x = basis(b[0], b[1]);
    let col_y = basis(b[2], b[3]);
    let origin = transform2d_xform(a, &[b[4], b[5]]);
    [col_x[0], col_x[1], col_y[0], col_y[1], origin[0].0, origin[1].0].map(OrderedFloat)
}

/// Rows of a 3x3 matrix times a column vector.
fn basis_xform(m: &[Real; 9], v: &[Real; 3]) -> [Real; 3] {
    [0, 1, 2].map(|row| {
        OrderedFloat(m[row * 3].0 * v[0].0 + m[row * 3 + 1].0 * v[1].0 + m[row * 3 + 2].0 * v[2].0)
    })
}

fn basis_mul(a: &[Real; 9], b: &[Real; 9]) -> [Real; 9] {
    let mut out = [OrderedFloat(0.0); 9];
    for row in 0..3 {
        for col in 0..3 {
            out[row * 3 + col] = OrderedFloat((0..3).map(|k| a[row * 3 + k].0 * b[k * 3 + col].0).sum());
        }
    }
    out
}

/// Basis rows followed by the origin.
fn transform3d_xform(t: &[Real; 12], v: &[Real; 3]) -> [Real; 3] {
    let mut basis = [OrderedFloat(0.0); 9];
    basis.copy_from_slice(&t[..9]);
    let rotated = basis_xform(&basis, v);
    [0, 1, 2].map(|i| OrderedFloat(rotated[i].0 + t[9 + i].0))
}

fn transform3d_mul(a: &[Real; 12], b: &[Real; 12]) -> [Real; 12] {
    let mut basis_a = [OrderedFloat(0.0); 9];
    let mut basis_b = [OrderedFloat(0.0); 9];
    basis_a.copy_from_slice(&a[..9]);
    basis_b.copy_from_slice(&b[..9]);
    let basis = basis_mul(&basis_a, &basis_b);
    let origin = transform3d_xform(a, &[b[9], b[10], b[11]]);
    let mut out = [OrderedFloat(0.0); 12];
    out[..9].copy_from_slice(&basis);
    out[9..].copy_from_slice(&origin);
    out
}

/// Four columns of four components.
fn projection_xform(p: &[Real; 16], v: &[Real; 4]) -> [Real; 4] {
    [0, 1, 2, 3].map(|row| OrderedFloat((0..4).map(|col| p[col * 4 + row].0 * v[col].0).sum()))
}

fn projection_mul(a: &[Real; 16], b: &[Real; 16]) -> [Real; 16] {
    let mut out = [OrderedFloat(0.0); 16];
    for col in 0..4 {
        for row in 0..4 {
            out[col * 4 + row] = OrderedFloat((0..4).map(|k| a[k * 4 + row].0 * b[col * 4 + k].0).sum());
        }
    }
    out
}

// ============================================================================
// String formatting
// ============================================================================

/// `printf`-style formatting used by `String % value`.
///
/// Supports `%s %c %d %o %x %X %f %%` with `-`, `+`, `0` flags, a width and a
/// precision.
pub fn format_string(format: &str, arguments: &[Variant]) -> Result<String, String> {
    let mut out = String::new();
    let mut arguments = arguments.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut left_justified = false;
        let mut show_sign = false;
        let mut pad_zero = false;
        let mut width = 0usize;
        let mut precision: Option<usize> = None;

        loop {
            let Some(&next) = chars.peek() else {
                return Err("incomplete format".to_string());
            };
            match next {
                '%' if width == 0 && precision.is_none() => {
                    chars.next();
                    out.push('%');
                    break;
                }
                '-' => {
                    left_justified = true;
                    chars.next();
                }
                '+' => {
                    show_sign = true;
                    chars.next();
                }
                '0' if width == 0 && precision.is_none() => {
                    pad_zero = true;
                    chars.next();
                }
                '.' => {
                    precision = Some(0);
                    chars.next();
                }
                digit @ '0'..='9' => {
                    let value = digit as usize - '0' as usize;
                    match precision.as_mut() {
                        Some(p) => *p = *p * 10 + value,
                        None => width = width * 10 + value,
                    }
                    chars.next();
                }
                's' | 'c' | 'd' | 'i' | 'o' | 'x' | 'X' | 'f' => {
                    chars.next();
                    let argument = arguments
                        .next()
                        .ok_or_else(|| "not enough arguments for format string".to_string())?;
                    let text = format_one(next, argument, show_sign, precision)?;
                    pad(&mut out, &text, width, left_justified, pad_zero && next != 's' && next != 'c');
                    break;
                }
                other => return Err(format!("unsupported format character '{other}'")),
            }
        }
    }

    if arguments.next().is_some() {
        return Err("not all arguments converted during string formatting".to_string());
    }
    Ok(out)
}

fn format_one(conversion: char, argument: &Variant, show_sign: bool, precision: Option<usize>) -> Result<String, String> {
    let number_required = || "a number is required".to_string();
    let signed = |text: String, negative: bool| {
        if show_sign && !negative { format!("+{text}") } else { text }
    };
    Ok(match conversion {
        's' => argument.to_string(),
        'c' => match argument {
            Variant::Int(code) => u32::try_from(*code)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .ok_or_else(|| "invalid character code".to_string())?,
            Variant::String(s) if s.chars().count() == 1 => s.clone(),
            _ => return Err("%c requires number or single-character string".to_string()),
        },
        'd' | 'i' => {
            let value = argument.as_int().filter(|_| argument.get_type().is_numeric()).ok_or_else(number_required)?;
            signed(value.to_string(), value < 0)
        }
        'o' | 'x' | 'X' => {
            let value = argument.as_int().filter(|_| argument.get_type().is_numeric()).ok_or_else(number_required)?;
            let magnitude = value.unsigned_abs();
            let digits = match conversion {
                'o' => format!("{magnitude:o}"),
                'x' => format!("{magnitude:x}"),
                _ => format!("{magnitude:X}"),
            };
            let text = if value < 0 { format!("-{digits}") } else { digits };
            signed(text, value < 0)
        }
        _ => {
            let value = argument.as_float().filter(|_| argument.get_type().is_numeric()).ok_or_else(number_required)?;
            signed(format!("{value:.prec$}", prec = precision.unwrap_or(6)), value < 0.0)
        }
    })
}

fn pad(out: &mut String, text: &str, width: usize, left_justified: bool, pad_zero: bool) {
    let len = text.chars().count();
    if len >= width {
        out.push_str(text);
        return;
    }
    let fill = width - len;
    if left_justified {
        out.push_str(text);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if pad_zero {
        let (sign, digits) = match text.strip_prefix(['-', '+']) {
            Some(rest) => (&text[..1], rest),
            None => ("", text),
        };
        out.push_str(sign);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_result_types() {
        assert_eq!(return_type(Op::Add, T::Int, T::Int), Some(T::Int));
        assert_eq!(return_type(Op::Add, T::Int, T::Float), Some(T::Float));
        assert_eq!(return_type(Op::Divide, T::Int, T::Int), Some(T::Int));
        assert_eq!(return_type(Op::Module, T::Float, T::Float), None);
        assert_eq!(return_type(Op::Add, T::Int, T::String), None);
    }

    #[test]
    fn vector_result_types() {
        assert_eq!(return_type(Op::Multiply, T::Vector2, T::Float), Some(T::Vector2));
        assert_eq!(return_type(Op::Multiply, T::Float, T::Vector2i), Some(T::Vector2));
        assert_eq!(return_type(Op::Multiply, T::Transform2D, T::Vector2), Some(T::Vector2));
        assert_eq!(return_type(Op::Divide, T::Float, T::Vector2), None);
        assert_eq!(return_type(Op::Negate, T::Vector3, T::Nil), Some(T::Vector3));
    }

    #[test]
    fn comparisons_with_nil_are_defined() {
        assert_eq!(return_type(Op::Equal, T::Nil, T::Dictionary), Some(T::Bool));
        assert_eq!(return_type(Op::Equal, T::Object, T::Nil), Some(T::Bool));
        assert_eq!(return_type(Op::Equal, T::Int, T::String), None);
        assert_eq!(return_type(Op::Less, T::Object, T::Object), None);
    }

    #[test]
    fn evaluate_integers() {
        assert_eq!(evaluate(Op::Add, &Variant::Int(2), &Variant::Int(3)), Ok(Variant::Int(5)));
        assert_eq!(evaluate(Op::Divide, &Variant::Int(7), &Variant::Int(2)), Ok(Variant::Int(3)));
        assert_eq!(
            evaluate(Op::Divide, &Variant::Int(1), &Variant::Int(0)),
            Err(CallError::Failed(DIVISION_BY_ZERO.to_string()))
        );
        assert_eq!(evaluate(Op::Power, &Variant::Int(2), &Variant::Int(10)), Ok(Variant::Int(1024)));
        assert_eq!(evaluate(Op::Negate, &Variant::Int(4), &Variant::Nil), Ok(Variant::Int(-4)));
    }

    #[test]
    fn evaluate_shifts() {
        assert_eq!(evaluate(Op::ShiftLeft, &Variant::Int(1), &Variant::Int(4)), Ok(Variant::Int(16)));
        assert_eq!(evaluate(Op::ShiftRight, &Variant::Int(16), &Variant::Int(2)), Ok(Variant::Int(4)));
        for (a, b) in [(1, -1), (-1, 1)] {
            assert_eq!(
                evaluate(Op::ShiftLeft, &Variant::Int(a), &Variant::Int(b)),
                Err(CallError::Failed(INVALID_SHIFT.to_string()))
            );
            assert_eq!(
                evaluate(Op::ShiftRight, &Variant::Int(a), &Variant::Int(b)),
                Err(CallError::Failed(INVALID_SHIFT.to_string()))
            );
        }
    }

    #[test]
    fn evaluate_mixed_numbers() {
        assert_eq!(evaluate(Op::Multiply, &Variant::Int(2), &Variant::float(1.5)), Ok(Variant::float(3.0)));
        assert_eq!(evaluate(Op::Equal, &Variant::Int(1), &Variant::float(1.0)), Ok(Variant::Bool(true)));
        assert_eq!(evaluate(Op::Less, &Variant::float(0.5), &Variant::Int(1)), Ok(Variant::Bool(true)));
    }

    #[test]
    fn evaluate_strings() {
        assert_eq!(
            evaluate(Op::Add, &Variant::string("a"), &Variant::string("b")),
            Ok(Variant::string("ab"))
        );
        assert_eq!(
            evaluate(Op::Module, &Variant::string("%d apples"), &Variant::Int(3)),
            Ok(Variant::string("3 apples"))
        );
        assert!(matches!(
            evaluate(Op::Module, &Variant::string("%d %d"), &Variant::Int(3)),
            Err(CallError::Failed(_))
        ));
        assert_eq!(
            evaluate(Op::In, &Variant::string("ell"), &Variant::string("hello")),
            Ok(Variant::Bool(true))
        );
    }

    #[test]
    fn evaluate_null_comparisons() {
        assert_eq!(evaluate(Op::Equal, &Variant::Nil, &Variant::Int(1)), Ok(Variant::Bool(false)));
        assert_eq!(evaluate(Op::NotEqual, &Variant::Nil, &Variant::Object(None)), Ok(Variant::Bool(false)));
    }

    #[test]
    fn evaluate_vectors() {
        assert_eq!(
            evaluate(Op::Add, &Variant::vector2(1.0, 2.0), &Variant::vector2(3.0, 4.0)),
            Ok(Variant::vector2(4.0, 6.0))
        );
        assert_eq!(
            evaluate(Op::Multiply, &Variant::Int(2), &Variant::vector2(1.0, 2.0)),
            Ok(Variant::vector2(2.0, 4.0))
        );
        assert_eq!(
            evaluate(Op::Multiply, &Variant::Vector2i([1, 2]), &Variant::float(0.5)),
            Ok(Variant::vector2(0.5, 1.0))
        );
    }

    #[test]
    fn evaluate_undefined_operator() {
        assert_eq!(
            evaluate(Op::Add, &Variant::Int(1), &Variant::string("x")),
            Err(CallError::InvalidMethod)
        );
    }

    #[test]
    fn format_flags() {
        assert_eq!(format_string("%05.2f", &[Variant::float(3.14159)]), Ok("03.14".to_string()));
        assert_eq!(format_string("%-4s|", &[Variant::string("ab")]), Ok("ab  |".to_string()));
        assert_eq!(format_string("%x%%", &[Variant::Int(255)]), Ok("ff%".to_string()));
        assert!(format_string("%d", &[Variant::string("x")]).is_err());
        assert!(format_string("none", &[Variant::Int(1)]).is_err());
    }
}
