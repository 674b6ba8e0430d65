//! Aggregate functions
//!
//! Every aggregate takes any mix of scalars and ranges. Scalar arguments
//! are coerced like arithmetic operands (booleans count as 0/1, text is an
//! error). Inside a range only numbers take part; text, booleans and empty
//! cells are skipped. Empty scalars (references to blank cells) are skipped
//! as well.

use crate::ast::BinaryOperator;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{arithmetic, finite, EvaluationContext};
use tabula_core::{CellError, Number, Value};

/// Collect the numbers taking part in an aggregate
fn numbers(args: &[Value]) -> FormulaResult<Vec<Number>> {
    let mut numbers = Vec::new();

    for arg in args {
        match arg {
            Value::Empty => {}
            Value::Iterable(values) => {
                numbers.extend(values.iter().filter_map(|value| match value {
                    Value::Integer(i) => Some(Number::Integer(*i)),
                    Value::Double(d) => Some(Number::Double(*d)),
                    _ => None,
                }));
            }
            scalar => numbers.push(scalar.to_number()?),
        }
    }

    Ok(numbers)
}

fn total(numbers: &[Number]) -> FormulaResult<Number> {
    numbers
        .iter()
        .try_fold(Number::Integer(0), |sum, n| {
            arithmetic(BinaryOperator::Add, sum, *n)
        })
}

/// SUM function
pub fn fn_sum(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    total(&numbers(args)?).map(Value::from)
}

/// AVERAGE function
pub fn fn_average(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let numbers = numbers(args)?;
    if numbers.is_empty() {
        return Err(FormulaError::evaluation(
            CellError::Div0,
            "AVERAGE of no numbers",
        ));
    }

    // Summing as doubles avoids spurious integer overflow
    let sum: f64 = numbers.iter().map(|n| n.as_f64()).sum();
    let average = sum / numbers.len() as f64;
    finite(Number::Double(average)).map(Value::from)
}

/// COUNT function
///
/// Counts numeric values. Unlike the other aggregates it never fails on
/// text.
pub fn fn_count(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let mut count = 0;

    for arg in args {
        match arg {
            Value::Integer(_) | Value::Double(_) | Value::Boolean(_) => count += 1,
            Value::Iterable(values) => {
                count += values.iter().filter(|v| v.is_number()).count() as i64;
            }
            _ => {}
        }
    }

    Ok(Value::Integer(count))
}

/// MIN function
pub fn fn_min(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    extreme(args, |candidate, best| candidate < best)
}

/// MAX function
pub fn fn_max(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    extreme(args, |candidate, best| candidate > best)
}

/// Pick the number that wins `better`; no numbers at all gives 0
fn extreme(args: &[Value], better: fn(f64, f64) -> bool) -> FormulaResult<Value> {
    let best = numbers(args)?.into_iter().reduce(|best, candidate| {
        if better(candidate.as_f64(), best.as_f64()) {
            candidate
        } else {
            best
        }
    });

    Ok(best.map_or(Value::Integer(0), Value::from))
}
