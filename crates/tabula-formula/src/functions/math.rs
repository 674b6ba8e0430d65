//! Math functions

use super::number_arg;
use crate::ast::BinaryOperator;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{arithmetic, finite, EvaluationContext};
use tabula_core::{CellError, Number, Value};

/// Wrap a floating point result, rejecting NaN and infinities
fn double(result: f64) -> FormulaResult<Value> {
    finite(Number::Double(result)).map(Value::from)
}

/// Whole-number result, kept as an integer when it fits
fn whole(result: f64) -> FormulaResult<Value> {
    if result.is_finite() && result >= i64::MIN as f64 && result < i64::MAX as f64 {
        Ok(Value::Integer(result as i64))
    } else {
        double(result)
    }
}

fn unary(name: &str, args: &[Value], f: fn(f64) -> f64) -> FormulaResult<Value> {
    double(f(number_arg(name, args, 0)?))
}

/// PI function
pub fn fn_pi(_args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Double(std::f64::consts::PI))
}

/// E function
pub fn fn_e(_args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Double(std::f64::consts::E))
}

/// POW function, same semantics as `^`
pub fn fn_pow(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let base = scalar_number("POW", args, 0)?;
    let exponent = scalar_number("POW", args, 1)?;
    arithmetic(BinaryOperator::Power, base, exponent).map(Value::from)
}

/// SQRT function
pub fn fn_sqrt(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    unary("SQRT", args, f64::sqrt)
}

/// CBRT function
pub fn fn_cbrt(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    unary("CBRT", args, f64::cbrt)
}

/// ABS function
pub fn fn_abs(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    match scalar_number("ABS", args, 0)? {
        Number::Integer(i) => i.checked_abs().map(Value::Integer).ok_or_else(|| {
            FormulaError::evaluation(CellError::Num, format!("ABS({}) overflows", i))
        }),
        Number::Double(d) => Ok(Value::Double(d.abs())),
    }
}

/// CEILING function
pub fn fn_ceiling(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    match scalar_number("CEILING", args, 0)? {
        Number::Integer(i) => Ok(Value::Integer(i)),
        Number::Double(d) => whole(d.ceil()),
    }
}

/// FLOOR function
pub fn fn_floor(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    match scalar_number("FLOOR", args, 0)? {
        Number::Integer(i) => Ok(Value::Integer(i)),
        Number::Double(d) => whole(d.floor()),
    }
}

/// MOD function
///
/// The result takes the sign of the divisor.
pub fn fn_mod(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let dividend = scalar_number("MOD", args, 0)?;
    let divisor = scalar_number("MOD", args, 1)?;

    match (dividend, divisor) {
        (_, Number::Integer(0)) => Err(mod_by_zero()),
        (_, Number::Double(d)) if d == 0.0 => Err(mod_by_zero()),
        (Number::Integer(a), Number::Integer(b)) => {
            let rem = a.checked_rem(b).unwrap_or(0);
            if rem != 0 && (rem < 0) != (b < 0) {
                Ok(Value::Integer(rem + b))
            } else {
                Ok(Value::Integer(rem))
            }
        }
        (a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            double(a - b * (a / b).floor())
        }
    }
}

fn mod_by_zero() -> FormulaError {
    FormulaError::evaluation(CellError::Div0, "MOD by zero")
}

/// SIN function
pub fn fn_sin(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    unary("SIN", args, f64::sin)
}

/// COS function
pub fn fn_cos(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    unary("COS", args, f64::cos)
}

/// TAN function
pub fn fn_tan(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    unary("TAN", args, f64::tan)
}

/// CTG function (cotangent)
pub fn fn_ctg(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let x = number_arg("CTG", args, 0)?;
    if x == 0.0 {
        return Err(FormulaError::evaluation(CellError::Div0, "CTG(0) is undefined"));
    }
    double(1.0 / x.tan())
}

/// ASIN function
pub fn fn_asin(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    unary("ASIN", args, f64::asin)
}

/// ACOS function
pub fn fn_acos(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    unary("ACOS", args, f64::acos)
}

/// ATAN function
pub fn fn_atan(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    unary("ATAN", args, f64::atan)
}

/// LN function
pub fn fn_ln(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let x = number_arg("LN", args, 0)?;
    if x <= 0.0 {
        return Err(FormulaError::evaluation(
            CellError::Num,
            format!("LN is undefined for {}", x),
        ));
    }
    double(x.ln())
}

/// LOG(base, x)
pub fn fn_log(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let base = number_arg("LOG", args, 0)?;
    let x = number_arg("LOG", args, 1)?;
    if x <= 0.0 || base <= 0.0 || base == 1.0 {
        return Err(FormulaError::evaluation(
            CellError::Num,
            format!("LOG is undefined for base {} and value {}", base, x),
        ));
    }
    double(x.log(base))
}

fn scalar_number(name: &str, args: &[Value], index: usize) -> FormulaResult<Number> {
    match args.get(index) {
        Some(Value::Iterable(_)) | None => {
            // Reuse the argument checks of the f64 path for the error
            number_arg(name, args, index).map(Number::Double)
        }
        Some(value) => Ok(value.to_number()?),
    }
}
