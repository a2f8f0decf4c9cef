//! Global utility functions.
//!
//! Two families are callable without a receiver: the script utilities the
//! orchestration language adds (`len`, `type_exists`, `load`, ...) and the
//! engine utilities (`sqrt`, `clamp`, `print`, ...). Script utilities fold
//! when marked constant; engine utilities fold only in the math category.

use indexmap::IndexMap;
use orchestrator_core::{CallError, MethodFlags, MethodInfo, PropertyInfo, Variant, VariantType};

use crate::class_db::ClassDb;
use crate::value::{can_convert_strict, convert};

use VariantType as T;

/// Category of an engine utility function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UtilityCategory {
    Math,
    Random,
    General,
    /// Provided by the orchestration language rather than the engine.
    Script,
}

/// Native implementation of a utility; arguments are already validated.
pub type UtilityFn = fn(&dyn ClassDb, &[Variant]) -> Result<Variant, CallError>;

#[derive(Debug, Clone)]
pub struct UtilityFunction {
    pub info: MethodInfo,
    pub category: UtilityCategory,
    /// Whether calls with constant arguments may be evaluated at analysis time.
    pub is_constant: bool,
    pub call: Option<UtilityFn>,
}

impl UtilityFunction {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn is_foldable(&self) -> bool {
        self.call.is_some()
            && match self.category {
                UtilityCategory::Script => self.is_constant,
                UtilityCategory::Math => true,
                _ => false,
            }
    }
}

/// Lookup of utility functions and language-level constants.
pub trait UtilityFunctions {
    fn script_function(&self, name: &str) -> Option<&UtilityFunction>;

    fn engine_function(&self, name: &str) -> Option<&UtilityFunction>;

    /// `PI`, `TAU`, `INF` and `NAN`.
    fn language_constant(&self, name: &str) -> Option<&Variant>;

    fn has_script_function(&self, name: &str) -> bool {
        self.script_function(name).is_some()
    }

    fn has_engine_function(&self, name: &str) -> bool {
        self.engine_function(name).is_some()
    }

    fn function(&self, name: &str) -> Option<&UtilityFunction> {
        self.script_function(name).or_else(|| self.engine_function(name))
    }

    fn function_info(&self, name: &str) -> Option<&MethodInfo> {
        self.function(name).map(|f| &f.info)
    }

    fn can_fold(&self, name: &str) -> bool {
        self.function(name).is_some_and(UtilityFunction::is_foldable)
    }

    /// Evaluate a foldable utility on constant arguments.
    fn call(&self, classes: &dyn ClassDb, name: &str, args: &[Variant]) -> Result<Variant, CallError> {
        let function = self.function(name).ok_or(CallError::InvalidMethod)?;
        let call = function.call.ok_or(CallError::InvalidMethod)?;
        let args = validate_arguments(&function.info, args)?;
        call(classes, &args)
    }
}

/// Check the argument count and convert typed arguments to their slot type.
pub fn validate_arguments(info: &MethodInfo, args: &[Variant]) -> Result<Vec<Variant>, CallError> {
    if info.is_vararg() {
        return Ok(args.to_vec());
    }
    if args.len() > info.arguments.len() {
        return Err(CallError::TooManyArguments {
            expected: info.arguments.len(),
        });
    }
    let required = info.required_argument_count();
    if args.len() < required {
        return Err(CallError::TooFewArguments { expected: required });
    }

    let mut converted = Vec::with_capacity(info.arguments.len());
    for (index, (slot, value)) in info.arguments.iter().zip(args).enumerate() {
        if slot.is_variant() {
            converted.push(value.clone());
            continue;
        }
        let expected = || CallError::InvalidArgument {
            index,
            expected: slot.ty.name().to_string(),
        };
        if !can_convert_strict(value.get_type(), slot.ty) {
            return Err(expected());
        }
        converted.push(convert(value, slot.ty).ok_or_else(expected)?);
    }
    let first_default = info.arguments.len() - info.default_arguments.len();
    converted.extend(info.default_arguments.iter().skip(args.len().saturating_sub(first_default)).cloned());
    Ok(converted)
}

// ============================================================================
// Registry
// ============================================================================

/// In-memory [`UtilityFunctions`].
#[derive(Debug, Default)]
pub struct UtilityRegistry {
    script: IndexMap<String, UtilityFunction>,
    engine: IndexMap<String, UtilityFunction>,
    constants: IndexMap<String, Variant>,
}

impl UtilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The script and engine utilities plus the language constants.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for function in script_functions() {
            registry.register_script(function);
        }
        for function in engine_functions() {
            registry.register_engine(function);
        }
        registry.constants.insert("PI".into(), Variant::float(std::f64::consts::PI));
        registry.constants.insert("TAU".into(), Variant::float(std::f64::consts::TAU));
        registry.constants.insert("INF".into(), Variant::float(f64::INFINITY));
        registry.constants.insert("NAN".into(), Variant::float(f64::NAN));
        registry
    }

    pub fn register_script(&mut self, function: UtilityFunction) -> &mut Self {
        self.script.insert(function.info.name.clone(), function);
        self
    }

    pub fn register_engine(&mut self, function: UtilityFunction) -> &mut Self {
        self.engine.insert(function.info.name.clone(), function);
        self
    }

    pub fn len(&self) -> usize {
        self.script.len() + self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty() && self.engine.is_empty()
    }
}

impl UtilityFunctions for UtilityRegistry {
    fn script_function(&self, name: &str) -> Option<&UtilityFunction> {
        self.script.get(name)
    }

    fn engine_function(&self, name: &str) -> Option<&UtilityFunction> {
        self.engine.get(name)
    }

    fn language_constant(&self, name: &str) -> Option<&Variant> {
        self.constants.get(name)
    }
}

// ============================================================================
// Definitions
// ============================================================================

fn slot(name: &str, ty: VariantType) -> PropertyInfo {
    if ty == T::Nil {
        PropertyInfo::variant(name)
    } else {
        PropertyInfo::new(ty, name)
    }
}

/// `ret` of `Some(T::Nil)` returns a Variant, `None` returns nothing.
fn signature(name: &str, ret: Option<VariantType>, args: &[(&str, VariantType)]) -> MethodInfo {
    let info = MethodInfo::new(name).with_args(args.iter().map(|(n, ty)| slot(n, *ty)).collect());
    match ret {
        Some(ty) => info.with_return(slot("", ty)),
        None => info,
    }
}

fn utility(
    category: UtilityCategory,
    info: MethodInfo,
    call: Option<UtilityFn>,
) -> UtilityFunction {
    UtilityFunction {
        info,
        category,
        is_constant: false,
        call,
    }
}

fn math(name: &str, ret: VariantType, args: &[(&str, VariantType)], call: UtilityFn) -> UtilityFunction {
    utility(UtilityCategory::Math, signature(name, Some(ret), args), Some(call))
}

fn math_vararg(name: &str, call: UtilityFn) -> UtilityFunction {
    let info = signature(name, Some(T::Nil), &[]).with_flags(MethodFlags::VARARG);
    utility(UtilityCategory::Math, info, Some(call))
}

fn general(name: &str, ret: Option<VariantType>, args: &[(&str, VariantType)]) -> UtilityFunction {
    utility(UtilityCategory::General, signature(name, ret, args), None)
}

fn general_vararg(name: &str, ret: Option<VariantType>) -> UtilityFunction {
    utility(
        UtilityCategory::General,
        signature(name, ret, &[]).with_flags(MethodFlags::VARARG),
        None,
    )
}

fn random(name: &str, ret: Option<VariantType>, args: &[(&str, VariantType)]) -> UtilityFunction {
    utility(UtilityCategory::Random, signature(name, ret, args), None)
}

fn script_functions() -> Vec<UtilityFunction> {
    let script = |info: MethodInfo, is_constant: bool, call: Option<UtilityFn>| UtilityFunction {
        info,
        category: UtilityCategory::Script,
        is_constant,
        call,
    };
    vec![
        script(
            signature("print_debug", Some(T::Nil), &[]).with_flags(MethodFlags::VARARG),
            false,
            None,
        ),
        script(signature("print_stack", None, &[]), false, None),
        script(signature("get_stack", Some(T::Array), &[]), false, None),
        script(
            signature("type_exists", Some(T::Bool), &[("type", T::StringName)]),
            true,
            Some(type_exists),
        ),
        script(signature("len", Some(T::Int), &[("var", T::Nil)]), true, Some(len)),
        script(
            signature("range", Some(T::Array), &[]).with_flags(MethodFlags::VARARG),
            false,
            None,
        ),
        script(
            MethodInfo::new("load")
                .with_args(vec![PropertyInfo::new(T::String, "path")])
                .with_return(PropertyInfo::object("", "Resource")),
            false,
            None,
        ),
    ]
}

fn engine_functions() -> Vec<UtilityFunction> {
    let f = T::Float;
    let i = T::Int;
    let v = T::Nil;
    vec![
        math("sin", f, &[("angle_rad", f)], |_, a| unary_float(a, f64::sin)),
        math("cos", f, &[("angle_rad", f)], |_, a| unary_float(a, f64::cos)),
        math("tan", f, &[("angle_rad", f)], |_, a| unary_float(a, f64::tan)),
        math("sinh", f, &[("x", f)], |_, a| unary_float(a, f64::sinh)),
        math("cosh", f, &[("x", f)], |_, a| unary_float(a, f64::cosh)),
        math("tanh", f, &[("x", f)], |_, a| unary_float(a, f64::tanh)),
        math("asin", f, &[("x", f)], |_, a| unary_float(a, |x| x.clamp(-1.0, 1.0).asin())),
        math("acos", f, &[("x", f)], |_, a| unary_float(a, |x| x.clamp(-1.0, 1.0).acos())),
        math("atan", f, &[("x", f)], |_, a| unary_float(a, f64::atan)),
        math("atan2", f, &[("y", f), ("x", f)], |_, a| binary_float(a, f64::atan2)),
        math("sqrt", f, &[("x", f)], |_, a| unary_float(a, f64::sqrt)),
        math("exp", f, &[("x", f)], |_, a| unary_float(a, f64::exp)),
        math("log", f, &[("x", f)], |_, a| unary_float(a, f64::ln)),
        math("pow", f, &[("base", f), ("exp", f)], |_, a| binary_float(a, f64::powf)),
        math("fmod", f, &[("x", f), ("y", f)], |_, a| binary_float(a, |x, y| x % y)),
        math("fposmod", f, &[("x", f), ("y", f)], |_, a| binary_float(a, fposmod)),
        math("posmod", i, &[("x", i), ("y", i)], |_, a| posmod(a)),
        math("floor", v, &[("x", v)], |_, a| round_variant(&a[0], f64::floor)),
        math("floorf", f, &[("x", f)], |_, a| unary_float(a, f64::floor)),
        math("floori", i, &[("x", f)], |_, a| Ok(Variant::Int(float_arg(a, 0).floor() as i64))),
        math("ceil", v, &[("x", v)], |_, a| round_variant(&a[0], f64::ceil)),
        math("ceilf", f, &[("x", f)], |_, a| unary_float(a, f64::ceil)),
        math("ceili", i, &[("x", f)], |_, a| Ok(Variant::Int(float_arg(a, 0).ceil() as i64))),
        math("round", v, &[("x", v)], |_, a| round_variant(&a[0], f64::round)),
        math("roundf", f, &[("x", f)], |_, a| unary_float(a, f64::round)),
        math("roundi", i, &[("x", f)], |_, a| Ok(Variant::Int(float_arg(a, 0).round() as i64))),
        math("abs", v, &[("x", v)], |_, a| abs(&a[0])),
        math("absf", f, &[("x", f)], |_, a| unary_float(a, f64::abs)),
        math("absi", i, &[("x", i)], |_, a| Ok(Variant::Int(int_arg(a, 0).wrapping_abs()))),
        math("sign", v, &[("x", v)], |_, a| sign(&a[0])),
        math("signf", f, &[("x", f)], |_, a| unary_float(a, float_sign)),
        math("signi", i, &[("x", i)], |_, a| Ok(Variant::Int(int_arg(a, 0).signum()))),
        math("snapped", v, &[("x", v), ("step", v)], |_, a| snapped(a)),
        math("snappedf", f, &[("x", f), ("step", f)], |_, a| binary_float(a, snap)),
        math("snappedi", i, &[("x", f), ("step", i)], |_, a| {
            Ok(Variant::Int(snap(float_arg(a, 0), int_arg(a, 1) as f64) as i64))
        }),
        math("lerp", v, &[("from", v), ("to", v), ("weight", v)], |_, a| lerp(a)),
        math("lerpf", f, &[("from", f), ("to", f), ("weight", f)], |_, a| {
            Ok(Variant::float(lerpf(float_arg(a, 0), float_arg(a, 1), float_arg(a, 2))))
        }),
        math("inverse_lerp", f, &[("from", f), ("to", f), ("weight", f)], |_, a| {
            let (from, to, weight) = (float_arg(a, 0), float_arg(a, 1), float_arg(a, 2));
            Ok(Variant::float((weight - from) / (to - from)))
        }),
        math(
            "remap",
            f,
            &[("value", f), ("istart", f), ("istop", f), ("ostart", f), ("ostop", f)],
            |_, a| {
                let t = (float_arg(a, 0) - float_arg(a, 1)) / (float_arg(a, 2) - float_arg(a, 1));
                Ok(Variant::float(lerpf(float_arg(a, 3), float_arg(a, 4), t)))
            },
        ),
        math("smoothstep", f, &[("from", f), ("to", f), ("x", f)], |_, a| {
            let (from, to, x) = (float_arg(a, 0), float_arg(a, 1), float_arg(a, 2));
            if from == to {
                return Ok(Variant::float(from));
            }
            let s = ((x - from) / (to - from)).clamp(0.0, 1.0);
            Ok(Variant::float(s * s * (3.0 - 2.0 * s)))
        }),
        math("move_toward", f, &[("from", f), ("to", f), ("delta", f)], |_, a| {
            let (from, to, delta) = (float_arg(a, 0), float_arg(a, 1), float_arg(a, 2));
            let moved = if (to - from).abs() <= delta { to } else { from + float_sign(to - from) * delta };
            Ok(Variant::float(moved))
        }),
        math("deg_to_rad", f, &[("deg", f)], |_, a| unary_float(a, f64::to_radians)),
        math("rad_to_deg", f, &[("rad", f)], |_, a| unary_float(a, f64::to_degrees)),
        math("linear_to_db", f, &[("lin", f)], |_, a| unary_float(a, |x| x.ln() * 8.685_889_638_065_037)),
        math("db_to_linear", f, &[("db", f)], |_, a| unary_float(a, |x| (x * 0.115_129_254_649_702_28).exp())),
        math("is_nan", T::Bool, &[("x", f)], |_, a| Ok(Variant::Bool(float_arg(a, 0).is_nan()))),
        math("is_inf", T::Bool, &[("x", f)], |_, a| Ok(Variant::Bool(float_arg(a, 0).is_infinite()))),
        math("is_finite", T::Bool, &[("x", f)], |_, a| Ok(Variant::Bool(float_arg(a, 0).is_finite()))),
        math("is_equal_approx", T::Bool, &[("a", f), ("b", f)], |_, a| {
            Ok(Variant::Bool(is_equal_approx(float_arg(a, 0), float_arg(a, 1))))
        }),
        math("is_zero_approx", T::Bool, &[("x", f)], |_, a| {
            Ok(Variant::Bool(float_arg(a, 0).abs() < CMP_EPSILON))
        }),
        math("wrap", v, &[("value", v), ("min", v), ("max", v)], |_, a| wrap(a)),
        math("wrapi", i, &[("value", i), ("min", i), ("max", i)], |_, a| {
            Ok(Variant::Int(wrapi(int_arg(a, 0), int_arg(a, 1), int_arg(a, 2))))
        }),
        math("wrapf", f, &[("value", f), ("min", f), ("max", f)], |_, a| {
            Ok(Variant::float(wrapf(float_arg(a, 0), float_arg(a, 1), float_arg(a, 2))))
        }),
        math_vararg("max", |_, a| extremum("max", a, |x, y| x > y)),
        math("maxi", i, &[("a", i), ("b", i)], |_, a| Ok(Variant::Int(int_arg(a, 0).max(int_arg(a, 1))))),
        math("maxf", f, &[("a", f), ("b", f)], |_, a| binary_float(a, f64::max)),
        math_vararg("min", |_, a| extremum("min", a, |x, y| x < y)),
        math("mini", i, &[("a", i), ("b", i)], |_, a| Ok(Variant::Int(int_arg(a, 0).min(int_arg(a, 1))))),
        math("minf", f, &[("a", f), ("b", f)], |_, a| binary_float(a, f64::min)),
        math("clamp", v, &[("value", v), ("min", v), ("max", v)], |_, a| clamp(a)),
        math("clampi", i, &[("value", i), ("min", i), ("max", i)], |_, a| {
            let (value, min, max) = (int_arg(a, 0), int_arg(a, 1), int_arg(a, 2));
            Ok(Variant::Int(value.max(min).min(max)))
        }),
        math("clampf", f, &[("value", f), ("min", f), ("max", f)], |_, a| {
            let (value, min, max) = (float_arg(a, 0), float_arg(a, 1), float_arg(a, 2));
            Ok(Variant::float(value.max(min).min(max)))
        }),
        math("nearest_po2", i, &[("value", i)], |_, a| {
            let value = int_arg(a, 0);
            Ok(Variant::Int(if value <= 0 { 0 } else { (value as u64).next_power_of_two() as i64 }))
        }),
        math("pingpong", f, &[("value", f), ("length", f)], |_, a| {
            let (value, length) = (float_arg(a, 0), float_arg(a, 1));
            let result = if length != 0.0 { (fposmod(value - length, length * 2.0) - length).abs() } else { 0.0 };
            Ok(Variant::float(result))
        }),
        random("randomize", None, &[]),
        random("randi", Some(i), &[]),
        random("randf", Some(f), &[]),
        random("randi_range", Some(i), &[("from", i), ("to", i)]),
        random("randf_range", Some(f), &[("from", f), ("to", f)]),
        random("randfn", Some(f), &[("mean", f), ("deviation", f)]),
        random("seed", None, &[("base", i)]),
        general_vararg("print", None),
        general_vararg("print_rich", None),
        general_vararg("printerr", None),
        general_vararg("printt", None),
        general_vararg("prints", None),
        general_vararg("printraw", None),
        general_vararg("print_verbose", None),
        general_vararg("push_error", None),
        general_vararg("push_warning", None),
        general_vararg("str", Some(T::String)),
        general("typeof", Some(i), &[("variable", v)]),
        general("type_string", Some(T::String), &[("type", i)]),
        general("type_convert", Some(v), &[("variant", v), ("type", i)]),
        general("var_to_str", Some(T::String), &[("variable", v)]),
        general("str_to_var", Some(v), &[("string", T::String)]),
        general("var_to_bytes", Some(T::PackedByteArray), &[("variable", v)]),
        general("bytes_to_var", Some(v), &[("bytes", T::PackedByteArray)]),
        general("error_string", Some(T::String), &[("error", i)]),
        general("hash", Some(i), &[("variable", v)]),
        general("is_same", Some(T::Bool), &[("a", v), ("b", v)]),
        general("rid_allocate_id", Some(i), &[]),
        general("rid_from_int64", Some(T::Rid), &[("base", i)]),
        utility(
            UtilityCategory::General,
            signature("is_instance_valid", Some(T::Bool), &[("instance", v)]),
            None,
        ),
        utility(
            UtilityCategory::General,
            MethodInfo::new("instance_from_id")
                .with_args(vec![PropertyInfo::new(i, "instance_id")])
                .with_return(PropertyInfo::object("", "Object")),
            None,
        ),
        utility(
            UtilityCategory::General,
            MethodInfo::new("weakref")
                .with_args(vec![PropertyInfo::variant("obj")])
                .with_return(PropertyInfo::variant("")),
            None,
        ),
    ]
}

// ============================================================================
// Implementations
// ============================================================================

const CMP_EPSILON: f64 = 0.00001;

fn float_arg(args: &[Variant], index: usize) -> f64 {
    args.get(index).and_then(Variant::as_float).unwrap_or_default()
}

fn int_arg(args: &[Variant], index: usize) -> i64 {
    args.get(index).and_then(Variant::as_int).unwrap_or_default()
}

fn unary_float(args: &[Variant], op: fn(f64) -> f64) -> Result<Variant, CallError> {
    Ok(Variant::float(op(float_arg(args, 0))))
}

fn binary_float(args: &[Variant], op: fn(f64, f64) -> f64) -> Result<Variant, CallError> {
    Ok(Variant::float(op(float_arg(args, 0), float_arg(args, 1))))
}

fn numeric_error(name: &str, allowed: &str) -> CallError {
    CallError::Failed(format!("Argument \"{name}\" must be {allowed}."))
}

fn float_sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn fposmod(x: f64, y: f64) -> f64 {
    let value = x % y;
    if (value < 0.0 && y > 0.0) || (value > 0.0 && y < 0.0) { value + y } else { value }
}

fn posmod(args: &[Variant]) -> Result<Variant, CallError> {
    let (x, y) = (int_arg(args, 0), int_arg(args, 1));
    if y == 0 {
        return Err(CallError::Failed("Modulo by zero error".into()));
    }
    let value = x % y;
    Ok(Variant::Int(if (value < 0 && y > 0) || (value > 0 && y < 0) { value + y } else { value }))
}

fn snap(x: f64, step: f64) -> f64 {
    if step != 0.0 { (x / step + 0.5).floor() * step } else { x }
}

fn lerpf(from: f64, to: f64, weight: f64) -> f64 {
    from + (to - from) * weight
}

fn is_equal_approx(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let tolerance = (CMP_EPSILON * a.abs()).max(CMP_EPSILON);
    (a - b).abs() < tolerance
}

fn wrapi(value: i64, min: i64, max: i64) -> i64 {
    let range = max - min;
    if range == 0 {
        min
    } else {
        min + ((((value - min) % range) + range) % range)
    }
}

fn wrapf(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if is_equal_approx(range, 0.0) {
        return min;
    }
    let result = value - range * ((value - min) / range).floor();
    if is_equal_approx(result, max) { min } else { result }
}

/// Apply `op` to an int, float or real-vector value.
fn round_variant(value: &Variant, op: fn(f64) -> f64) -> Result<Variant, CallError> {
    Ok(match value {
        Variant::Int(_) => value.clone(),
        Variant::Float(x) => Variant::float(op(x.0)),
        Variant::Vector2(v) => Variant::Vector2(v.map(|c| op(c.0).into())),
        Variant::Vector3(v) => Variant::Vector3(v.map(|c| op(c.0).into())),
        Variant::Vector4(v) => Variant::Vector4(v.map(|c| op(c.0).into())),
        Variant::Vector2i(_) | Variant::Vector3i(_) | Variant::Vector4i(_) => value.clone(),
        _ => return Err(numeric_error("x", "\"int\", \"float\" or a vector")),
    })
}

fn abs(value: &Variant) -> Result<Variant, CallError> {
    Ok(match value {
        Variant::Int(x) => Variant::Int(x.wrapping_abs()),
        Variant::Vector2i(v) => Variant::Vector2i(v.map(i64::wrapping_abs)),
        Variant::Vector3i(v) => Variant::Vector3i(v.map(i64::wrapping_abs)),
        Variant::Vector4i(v) => Variant::Vector4i(v.map(i64::wrapping_abs)),
        other => round_variant(other, f64::abs)?,
    })
}

fn sign(value: &Variant) -> Result<Variant, CallError> {
    Ok(match value {
        Variant::Int(x) => Variant::Int(x.signum()),
        Variant::Vector2i(v) => Variant::Vector2i(v.map(i64::signum)),
        Variant::Vector3i(v) => Variant::Vector3i(v.map(i64::signum)),
        Variant::Vector4i(v) => Variant::Vector4i(v.map(i64::signum)),
        other => round_variant(other, float_sign)?,
    })
}

fn snapped(args: &[Variant]) -> Result<Variant, CallError> {
    match (&args[0], &args[1]) {
        (Variant::Int(x), Variant::Int(step)) => {
            Ok(Variant::Int(snap(*x as f64, *step as f64) as i64))
        }
        (x, step) => match (x.as_float(), step.as_float()) {
            (Some(x), Some(step)) => Ok(Variant::float(snap(x, step))),
            _ => Err(numeric_error("x", "\"int\" or \"float\"")),
        },
    }
}

fn lerp(args: &[Variant]) -> Result<Variant, CallError> {
    let weight = args[2]
        .as_float()
        .ok_or_else(|| numeric_error("weight", "\"float\""))?;
    match (&args[0], &args[1]) {
        (Variant::Vector2(a), Variant::Vector2(b)) => Ok(Variant::vector2(
            lerpf(a[0].0, b[0].0, weight),
            lerpf(a[1].0, b[1].0, weight),
        )),
        (Variant::Vector3(a), Variant::Vector3(b)) => Ok(Variant::vector3(
            lerpf(a[0].0, b[0].0, weight),
            lerpf(a[1].0, b[1].0, weight),
            lerpf(a[2].0, b[2].0, weight),
        )),
        (from, to) => match (from.as_float(), to.as_float()) {
            (Some(from), Some(to)) => Ok(Variant::float(lerpf(from, to, weight))),
            _ => Err(numeric_error("from", "\"int\", \"float\" or a vector")),
        },
    }
}

fn wrap(args: &[Variant]) -> Result<Variant, CallError> {
    match (&args[0], &args[1], &args[2]) {
        (Variant::Int(value), Variant::Int(min), Variant::Int(max)) => Ok(Variant::Int(wrapi(*value, *min, *max))),
        (value, min, max) => match (value.as_float(), min.as_float(), max.as_float()) {
            (Some(value), Some(min), Some(max)) => Ok(Variant::float(wrapf(value, min, max))),
            _ => Err(numeric_error("value", "\"int\" or \"float\"")),
        },
    }
}

fn clamp(args: &[Variant]) -> Result<Variant, CallError> {
    match (&args[0], &args[1], &args[2]) {
        (Variant::Int(value), Variant::Int(min), Variant::Int(max)) => {
            Ok(Variant::Int((*value).max(*min).min(*max)))
        }
        (value, min, max) => match (value.as_float(), min.as_float(), max.as_float()) {
            (Some(value), Some(min), Some(max)) => Ok(Variant::float(value.max(min).min(max))),
            _ => Err(numeric_error("value", "\"int\" or \"float\"")),
        },
    }
}

/// `min`/`max` over two or more numbers; the result is an int only when
/// every argument is.
fn extremum(name: &str, args: &[Variant], better: fn(f64, f64) -> bool) -> Result<Variant, CallError> {
    if args.len() < 2 {
        return Err(CallError::TooFewArguments { expected: 2 });
    }
    let mut best = 0;
    for (index, arg) in args.iter().enumerate() {
        if !matches!(arg, Variant::Int(_) | Variant::Float(_)) {
            return Err(CallError::Failed(format!(
                "\"{name}\" function's argument {index} must be \"int\" or \"float\"."
            )));
        }
        if better(float_arg(args, index), float_arg(args, best)) {
            best = index;
        }
    }
    if args.iter().all(|a| matches!(a, Variant::Int(_))) {
        Ok(args[best].clone())
    } else {
        Ok(Variant::float(float_arg(args, best)))
    }
}

fn type_exists(classes: &dyn ClassDb, args: &[Variant]) -> Result<Variant, CallError> {
    let name = args.first().and_then(Variant::as_str).unwrap_or_default();
    Ok(Variant::Bool(classes.class_exists(name)))
}

fn len(_: &dyn ClassDb, args: &[Variant]) -> Result<Variant, CallError> {
    let length = match args.first() {
        Some(Variant::String(s) | Variant::StringName(s)) => s.chars().count(),
        Some(Variant::Dictionary(d)) => d.len(),
        Some(Variant::Array(a)) => a.len(),
        Some(Variant::Packed(p)) => p.elements.len(),
        other => {
            let ty = other.map(Variant::get_type).unwrap_or_default();
            return Err(CallError::Failed(format!(
                "Value of type '{}' cannot provide a length",
                ty.name()
            )));
        }
    };
    Ok(Variant::Int(length as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_db::{ClassRegistry, NativeClass};

    fn call(name: &str, args: &[Variant]) -> Result<Variant, CallError> {
        let classes = ClassRegistry::new();
        UtilityRegistry::standard().call(&classes, name, args)
    }

    #[test]
    fn lookup_order_prefers_script_functions() {
        let registry = UtilityRegistry::standard();
        assert!(registry.has_script_function("len"));
        assert!(!registry.has_engine_function("len"));
        assert!(registry.has_engine_function("sqrt"));
        assert_eq!(
            registry.function_info("load").map(|m| m.return_val.class_name.as_str()),
            Some("Resource")
        );
        assert!(registry.language_constant("TAU").is_some());
        assert!(registry.language_constant("E").is_none());
    }

    #[test]
    fn folding_categories() {
        let registry = UtilityRegistry::standard();
        assert!(registry.can_fold("len"));
        assert!(registry.can_fold("type_exists"));
        assert!(registry.can_fold("clamp"));
        assert!(!registry.can_fold("load"));
        assert!(!registry.can_fold("randi"));
        assert!(!registry.can_fold("print"));
        assert!(!registry.can_fold("missing"));
    }

    #[test]
    fn math_functions() {
        assert_eq!(call("sqrt", &[Variant::Int(16)]), Ok(Variant::float(4.0)));
        assert_eq!(call("absi", &[Variant::Int(-3)]), Ok(Variant::Int(3)));
        assert_eq!(call("abs", &[Variant::float(-2.5)]), Ok(Variant::float(2.5)));
        assert_eq!(
            call("clamp", &[Variant::Int(12), Variant::Int(0), Variant::Int(10)]),
            Ok(Variant::Int(10))
        );
        assert_eq!(call("max", &[Variant::Int(1), Variant::Int(7), Variant::Int(3)]), Ok(Variant::Int(7)));
        assert_eq!(call("min", &[Variant::Int(1), Variant::float(0.5)]), Ok(Variant::float(0.5)));
        assert_eq!(call("wrapi", &[Variant::Int(-1), Variant::Int(0), Variant::Int(4)]), Ok(Variant::Int(3)));
        assert_eq!(call("posmod", &[Variant::Int(-7), Variant::Int(3)]), Ok(Variant::Int(2)));
    }

    #[test]
    fn argument_validation() {
        assert_eq!(
            call("sqrt", &[Variant::string("x")]),
            Err(CallError::InvalidArgument {
                index: 0,
                expected: "float".into()
            })
        );
        assert_eq!(
            call("sqrt", &[Variant::Int(1), Variant::Int(2)]),
            Err(CallError::TooManyArguments { expected: 1 })
        );
        assert_eq!(call("pow", &[Variant::Int(1)]), Err(CallError::TooFewArguments { expected: 2 }));
        assert_eq!(call("max", &[Variant::Int(1)]), Err(CallError::TooFewArguments { expected: 2 }));
        assert!(matches!(call("abs", &[Variant::string("x")]), Err(CallError::Failed(_))));
    }

    #[test]
    fn script_functions_fold() {
        assert_eq!(call("len", &[Variant::string("héllo")]), Ok(Variant::Int(5)));
        assert_eq!(
            call("len", &[Variant::Int(3)]),
            Err(CallError::Failed("Value of type 'int' cannot provide a length".into()))
        );

        let mut classes = ClassRegistry::new();
        classes.register(NativeClass::new("Node", None));
        let registry = UtilityRegistry::standard();
        assert_eq!(
            registry.call(&classes, "type_exists", &[Variant::string("Node")]),
            Ok(Variant::Bool(true))
        );
        assert_eq!(
            registry.call(&classes, "type_exists", &[Variant::string("Nope")]),
            Ok(Variant::Bool(false))
        );
        assert_eq!(call("load", &[Variant::string("res://a.tres")]), Err(CallError::InvalidMethod));
    }
}
