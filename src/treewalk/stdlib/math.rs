use std::f64::consts;

use crate::treewalk::{
    types::{BuiltinFn, Exception, Module},
    utils::{check_args, Args},
    Raise, TreewalkInterpreter, TreewalkResult, TreewalkValue,
};

use super::new_module;

static FUNCTIONS: [(&str, BuiltinFn); 26] = [
    ("acos", acos),
    ("asin", asin),
    ("atan", atan),
    ("atan2", atan2),
    ("ceil", ceil),
    ("copysign", copysign),
    ("cos", cos),
    ("degrees", degrees),
    ("exp", exp),
    ("fabs", fabs),
    ("factorial", factorial),
    ("floor", floor),
    ("gcd", gcd),
    ("hypot", hypot),
    ("isclose", isclose),
    ("isfinite", isfinite),
    ("isinf", isinf),
    ("isnan", isnan),
    ("log", log),
    ("log10", log10),
    ("log2", log2),
    ("radians", radians),
    ("sin", sin),
    ("sqrt", sqrt),
    ("tan", tan),
    ("trunc", trunc),
];

pub(super) fn module() -> Module {
    let mut module = new_module("math", &FUNCTIONS);
    module.insert("pi", TreewalkValue::Float(consts::PI));
    module.insert("e", TreewalkValue::Float(consts::E));
    module.insert("tau", TreewalkValue::Float(consts::TAU));
    module.insert("inf", TreewalkValue::Float(f64::INFINITY));
    module.insert("nan", TreewalkValue::Float(f64::NAN));
    module
}

fn domain_error() -> Exception {
    Exception::value_error("math domain error")
}

/// A one-argument float function. `valid` rejects arguments outside the function's domain.
fn unary(
    interpreter: &TreewalkInterpreter,
    args: Args,
    name: &str,
    valid: fn(f64) -> bool,
    f: fn(f64) -> f64,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, name, 1, 1, &[]).raise(interpreter)?;
    let x = args.get_arg(0).as_float().raise(interpreter)?;
    if !valid(x) {
        return domain_error().raise(interpreter);
    }
    Ok(TreewalkValue::Float(f(x)))
}

fn any(_: f64) -> bool {
    true
}

fn acos(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "acos", |x| (-1.0..=1.0).contains(&x), f64::acos)
}

fn asin(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "asin", |x| (-1.0..=1.0).contains(&x), f64::asin)
}

fn atan(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "atan", any, f64::atan)
}

fn cos(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "cos", f64::is_finite, f64::cos)
}

fn sin(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "sin", f64::is_finite, f64::sin)
}

fn tan(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "tan", f64::is_finite, f64::tan)
}

fn degrees(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "degrees", any, f64::to_degrees)
}

fn radians(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "radians", any, f64::to_radians)
}

fn exp(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "exp", any, f64::exp)
}

fn fabs(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "fabs", any, f64::abs)
}

fn sqrt(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "sqrt", |x| x >= 0.0, f64::sqrt)
}

fn log10(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "log10", |x| x > 0.0, f64::log10)
}

fn log2(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    unary(interpreter, args, "log2", |x| x > 0.0, f64::log2)
}

fn isfinite(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "isfinite", 1, 1, &[]).raise(interpreter)?;
    let x = args.get_arg(0).as_float().raise(interpreter)?;
    Ok(TreewalkValue::Bool(x.is_finite()))
}

fn isinf(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "isinf", 1, 1, &[]).raise(interpreter)?;
    let x = args.get_arg(0).as_float().raise(interpreter)?;
    Ok(TreewalkValue::Bool(x.is_infinite()))
}

fn isnan(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "isnan", 1, 1, &[]).raise(interpreter)?;
    let x = args.get_arg(0).as_float().raise(interpreter)?;
    Ok(TreewalkValue::Bool(x.is_nan()))
}

/// `floor`, `ceil` and `trunc` return ints; ints pass through unchanged.
fn to_integral(
    interpreter: &TreewalkInterpreter,
    args: Args,
    name: &str,
    f: fn(f64) -> f64,
) -> TreewalkResult<TreewalkValue> {
    check_args(&args, name, 1, 1, &[]).raise(interpreter)?;
    let value = args.get_arg(0);
    if let TreewalkValue::Int(_) | TreewalkValue::Bool(_) = value {
        return value.as_int().raise(interpreter).map(TreewalkValue::Int);
    }
    let x = f(value.as_float().raise(interpreter)?);
    if x.is_nan() {
        return Exception::value_error("cannot convert float NaN to integer").raise(interpreter);
    }
    if !x.is_finite() || x.abs() >= i64::MAX as f64 {
        return Exception::overflow_error("cannot convert float infinity to integer")
            .raise(interpreter);
    }
    Ok(TreewalkValue::Int(x as i64))
}

fn floor(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    to_integral(interpreter, args, "floor", f64::floor)
}

fn ceil(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    to_integral(interpreter, args, "ceil", f64::ceil)
}

fn trunc(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    to_integral(interpreter, args, "trunc", f64::trunc)
}

fn log(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "log", 1, 2, &[]).raise(interpreter)?;
    let x = args.get_arg(0).as_float().raise(interpreter)?;
    if x <= 0.0 {
        return domain_error().raise(interpreter);
    }
    match args.get_arg_opt(1) {
        None => Ok(TreewalkValue::Float(x.ln())),
        Some(base) => {
            let base = base.as_float().raise(interpreter)?;
            if base <= 0.0 {
                return domain_error().raise(interpreter);
            }
            if base == 1.0 {
                return Exception::zero_division_error("float division by zero")
                    .raise(interpreter);
            }
            Ok(TreewalkValue::Float(x.ln() / base.ln()))
        }
    }
}

fn atan2(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "atan2", 2, 2, &[]).raise(interpreter)?;
    let y = args.get_arg(0).as_float().raise(interpreter)?;
    let x = args.get_arg(1).as_float().raise(interpreter)?;
    Ok(TreewalkValue::Float(y.atan2(x)))
}

fn copysign(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "copysign", 2, 2, &[]).raise(interpreter)?;
    let x = args.get_arg(0).as_float().raise(interpreter)?;
    let y = args.get_arg(1).as_float().raise(interpreter)?;
    Ok(TreewalkValue::Float(x.copysign(y)))
}

fn hypot(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "hypot", 0, usize::MAX, &[]).raise(interpreter)?;
    let mut sum = 0.0;
    for coordinate in args.positional() {
        let c = coordinate.as_float().raise(interpreter)?;
        sum += c * c;
    }
    Ok(TreewalkValue::Float(sum.sqrt()))
}

fn isclose(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "isclose", 2, 2, &["rel_tol", "abs_tol"]).raise(interpreter)?;
    let a = args.get_arg(0).as_float().raise(interpreter)?;
    let b = args.get_arg(1).as_float().raise(interpreter)?;
    let tolerance = |name: &str, default: f64| match args.get_kwarg(name) {
        Some(value) => value.as_float(),
        None => Ok(default),
    };
    let rel_tol = tolerance("rel_tol", 1e-9).raise(interpreter)?;
    let abs_tol = tolerance("abs_tol", 0.0).raise(interpreter)?;
    if rel_tol < 0.0 || abs_tol < 0.0 {
        return Exception::value_error("tolerances must be non-negative").raise(interpreter);
    }
    if a == b {
        return Ok(TreewalkValue::Bool(true));
    }
    if a.is_infinite() || b.is_infinite() {
        return Ok(TreewalkValue::Bool(false));
    }
    let diff = (a - b).abs();
    Ok(TreewalkValue::Bool(
        diff <= (rel_tol * b).abs() || diff <= (rel_tol * a).abs() || diff <= abs_tol,
    ))
}

fn gcd(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "gcd", 0, usize::MAX, &[]).raise(interpreter)?;
    let mut result: u64 = 0;
    for value in args.positional() {
        let mut b = value.as_int().raise(interpreter)?.unsigned_abs();
        let mut a = result;
        while b != 0 {
            (a, b) = (b, a % b);
        }
        result = a;
    }
    Ok(TreewalkValue::Int(result as i64))
}

fn factorial(interpreter: &TreewalkInterpreter, args: Args) -> TreewalkResult<TreewalkValue> {
    check_args(&args, "factorial", 1, 1, &[]).raise(interpreter)?;
    let n = args.get_arg(0).as_int().raise(interpreter)?;
    if n < 0 {
        return Exception::value_error("factorial() not defined for negative values")
            .raise(interpreter);
    }
    let mut result: i64 = 1;
    for i in 2..=n {
        result = match result.checked_mul(i) {
            Some(product) => product,
            None => {
                return Exception::overflow_error("integer overflow in factorial()")
                    .raise(interpreter)
            }
        };
    }
    Ok(TreewalkValue::Int(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::treewalk::{utils::args, ModuleRegistry};

    fn interpreter() -> TreewalkInterpreter {
        TreewalkInterpreter::new(ModuleRegistry::new(), vec![])
    }

    #[test]
    fn integral_results() {
        let interpreter = interpreter();
        assert_eq!(
            floor(&interpreter, args![TreewalkValue::Float(-1.5)]).unwrap(),
            TreewalkValue::Int(-2)
        );
        assert_eq!(
            ceil(&interpreter, args![TreewalkValue::Float(1.2)]).unwrap(),
            TreewalkValue::Int(2)
        );
        assert_eq!(
            gcd(&interpreter, args![TreewalkValue::Int(12), TreewalkValue::Int(-18)]).unwrap(),
            TreewalkValue::Int(6)
        );
        assert_eq!(
            factorial(&interpreter, args![TreewalkValue::Int(5)]).unwrap(),
            TreewalkValue::Int(120)
        );
    }

    #[test]
    fn domain_errors() {
        let interpreter = interpreter();
        let e = sqrt(&interpreter, args![TreewalkValue::Int(-1)]).unwrap_err();
        assert_eq!(e.exception.message(), "math domain error");
        assert_eq!(
            log(&interpreter, args![TreewalkValue::Int(8), TreewalkValue::Int(2)]).unwrap(),
            TreewalkValue::Float(3.0)
        );
    }
}
