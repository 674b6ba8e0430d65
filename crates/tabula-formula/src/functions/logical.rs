//! Logical functions
//!
//! Both functions are short-circuiting: they receive the unevaluated
//! argument expressions and evaluate only the branch they need.

use crate::ast::Expression;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, EvaluationContext};
use tabula_core::{CellError, Value};

/// IF(condition, value_if_true, [value_if_false])
pub fn fn_if(args: &[Expression], ctx: &EvaluationContext) -> FormulaResult<Value> {
    let condition = match evaluate(&args[0], ctx)? {
        Value::Error(e) => {
            return Err(FormulaError::evaluation(e, format!("IF condition is {}", e)));
        }
        Value::Iterable(_) => {
            return Err(FormulaError::evaluation(
                CellError::Value,
                "IF condition must be a single value",
            ));
        }
        value => value.to_bool()?,
    };

    if condition {
        evaluate(&args[1], ctx)
    } else {
        match args.get(2) {
            Some(if_false) => evaluate(if_false, ctx),
            None => Ok(Value::Boolean(false)),
        }
    }
}

/// IFERROR(value, value_if_error)
///
/// Evaluation failures and error values are replaced by the fallback.
/// Structural failures (cycles, self references, bad arity) are not
/// recoverable and propagate.
pub fn fn_iferror(args: &[Expression], ctx: &EvaluationContext) -> FormulaResult<Value> {
    match evaluate(&args[0], ctx) {
        Ok(Value::Error(_)) => evaluate(&args[1], ctx),
        Err(e) if !e.is_abort() => {
            tracing::trace!("IFERROR caught: {}", e);
            evaluate(&args[1], ctx)
        }
        other => other,
    }
}
