//! Text functions

use super::{number_arg, text_arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::EvaluationContext;
use tabula_core::{CellError, Value};

/// Upper bound on the length REPEAT may produce, in characters
const MAX_REPEAT_LEN: usize = 32_767;

/// CONTAINS(text, part)
pub fn fn_contains(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let text = text_arg("CONTAINS", args, 0)?;
    let part = text_arg("CONTAINS", args, 1)?;
    Ok(Value::Boolean(text.contains(&part)))
}

/// CONCAT(value, ...)
///
/// Ranges contribute every cell in order.
pub fn fn_concat(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let mut result = String::new();
    for arg in args {
        match arg {
            Value::Iterable(values) => {
                for value in values {
                    result.push_str(&value.to_text());
                }
            }
            scalar => result.push_str(&scalar.to_text()),
        }
    }
    Ok(Value::String(result))
}

/// REPEAT(text, count)
pub fn fn_repeat(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let text = text_arg("REPEAT", args, 0)?;
    let count = number_arg("REPEAT", args, 1)?.trunc();

    if count < 0.0 {
        return Err(FormulaError::evaluation(
            CellError::Value,
            format!("REPEAT count must not be negative, got {}", count),
        ));
    }

    let count = count as usize;
    if text.chars().count().saturating_mul(count) > MAX_REPEAT_LEN {
        return Err(FormulaError::evaluation(
            CellError::Value,
            format!("REPEAT result exceeds {} characters", MAX_REPEAT_LEN),
        ));
    }

    Ok(Value::String(text.repeat(count)))
}

/// LENGTH(text), in characters
pub fn fn_length(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let text = text_arg("LENGTH", args, 0)?;
    Ok(Value::Integer(text.chars().count() as i64))
}

/// STRING(value)
pub fn fn_string(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    text_arg("STRING", args, 0).map(Value::String)
}
