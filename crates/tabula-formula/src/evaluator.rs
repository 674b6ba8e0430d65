//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values. Cell lookups go through a
//! [`CellResolver`], so evaluation is pure with respect to its resolver.

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionImpl;
use crate::operators::Registry;
use std::cmp::Ordering;
use tabula_core::{CellError, CellRange, CellReference, Number, Value};

/// Source of cell values during evaluation
pub trait CellResolver {
    /// Value of `cell`; never-written cells resolve to [`Value::Empty`]
    fn resolve(&self, cell: CellReference) -> FormulaResult<Value>;
}

impl<F> CellResolver for F
where
    F: Fn(CellReference) -> FormulaResult<Value>,
{
    fn resolve(&self, cell: CellReference) -> FormulaResult<Value> {
        self(cell)
    }
}

/// Resolver for formulas evaluated without any cells
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCells;

impl CellResolver for NoCells {
    fn resolve(&self, _cell: CellReference) -> FormulaResult<Value> {
        Ok(Value::Empty)
    }
}

static NO_CELLS: NoCells = NoCells;

/// Context for formula evaluation
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Functions available to the formula
    pub registry: &'a Registry,
    resolver: &'a dyn CellResolver,
    /// Cell whose formula is being evaluated, if any
    pub current_cell: Option<CellReference>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context over a resolver, using the global registry
    pub fn new(resolver: &'a dyn CellResolver) -> Self {
        Self {
            registry: Registry::global(),
            resolver,
            current_cell: None,
        }
    }

    /// Create a simple context without cells (for testing)
    pub fn simple() -> EvaluationContext<'static> {
        EvaluationContext::new(&NO_CELLS)
    }

    /// Use a different function registry
    pub fn with_registry(mut self, registry: &'a Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Evaluate on behalf of `cell`, so references back to it are rejected
    pub fn for_cell(mut self, cell: CellReference) -> Self {
        self.current_cell = Some(cell);
        self
    }

    /// Resolve a single cell through the resolver
    pub fn resolve(&self, cell: CellReference) -> FormulaResult<Value> {
        if self.current_cell == Some(cell) {
            return Err(FormulaError::DataSelfReference(cell));
        }
        match self.resolver.resolve(cell)? {
            Value::Error(code) => Err(FormulaError::evaluation(
                code,
                format!("cell {} is in an error state", cell),
            )),
            value => Ok(value),
        }
    }

    /// Resolve every cell of a range, in row-major order
    pub fn resolve_range(&self, range: &CellRange) -> FormulaResult<Value> {
        if let Some(current) = self.current_cell {
            if range.contains(&current) {
                return Err(FormulaError::DataSelfReference(current));
            }
        }

        let mut values = Vec::with_capacity(range.cells().len());
        for cell in range.cells() {
            match self.resolve(cell)? {
                Value::Iterable(_) => {
                    return Err(FormulaError::evaluation(
                        CellError::Value,
                        format!("cell {} holds a range and cannot be nested in {}", cell, range),
                    ));
                }
                value => values.push(value),
            }
        }
        Ok(Value::Iterable(values))
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &Expression, ctx: &EvaluationContext) -> FormulaResult<Value> {
    match expr {
        Expression::Value(value) => Ok(value.clone()),
        Expression::CellRef(cell) => ctx.resolve(*cell),
        Expression::Range(range) => ctx.resolve_range(range),
        Expression::Binary { op, left, right } => {
            let left = evaluate(left, ctx)?;
            let right = evaluate(right, ctx)?;
            apply_binary(*op, &left, &right)
        }
        Expression::Unary { op, operand } => {
            let operand = evaluate(operand, ctx)?;
            apply_unary(*op, &operand)
        }
        Expression::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[Expression],
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let func = ctx.registry.function(name).ok_or_else(|| {
        FormulaError::evaluation(CellError::Name, format!("unknown function {}", name))
    })?;

    func.check_arity(args.len())?;

    match func.implementation {
        FunctionImpl::Lazy(implementation) => implementation(args, ctx),
        FunctionImpl::Eager(implementation) => {
            // Left to right, all arguments before the call
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                let value = evaluate(arg, ctx)?;
                check_error(&value)?;
                evaluated_args.push(value);
            }
            implementation(&evaluated_args, ctx)
        }
    }
}

fn check_error(value: &Value) -> FormulaResult<()> {
    match value {
        Value::Error(code) => Err(FormulaError::evaluation(*code, format!("operand is {}", code))),
        _ => Ok(()),
    }
}

fn scalar(value: &Value) -> FormulaResult<&Value> {
    check_error(value)?;
    if let Value::Iterable(_) = value {
        return Err(FormulaError::evaluation(
            CellError::Value,
            "a range cannot be used as a single value",
        ));
    }
    Ok(value)
}

/// Apply a binary operator to two evaluated operands
pub fn apply_binary(op: BinaryOperator, left: &Value, right: &Value) -> FormulaResult<Value> {
    let left = scalar(left)?;
    let right = scalar(right)?;

    match op {
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Power => {
            let l = left.to_number()?;
            let r = right.to_number()?;
            arithmetic(op, l, r).map(Value::from)
        }

        BinaryOperator::Concat => Ok(Value::String(left.to_text() + &right.to_text())),

        // Different kinds are simply unequal
        BinaryOperator::Equal => Ok(Value::Boolean(
            left.compare(right).map_or(false, Ordering::is_eq),
        )),
        BinaryOperator::NotEqual => Ok(Value::Boolean(
            left.compare(right).map_or(true, Ordering::is_ne),
        )),

        BinaryOperator::LessThan => Ok(Value::Boolean(left.compare(right)?.is_lt())),
        BinaryOperator::LessEqual => Ok(Value::Boolean(left.compare(right)?.is_le())),
        BinaryOperator::GreaterThan => Ok(Value::Boolean(left.compare(right)?.is_gt())),
        BinaryOperator::GreaterEqual => Ok(Value::Boolean(left.compare(right)?.is_ge())),
    }
}

/// Apply a prefix operator to an evaluated operand
pub fn apply_unary(op: UnaryOperator, operand: &Value) -> FormulaResult<Value> {
    let n = scalar(operand)?.to_number()?;
    match (op, n) {
        (UnaryOperator::Plus, n) => Ok(n.into()),
        (UnaryOperator::Negate, Number::Integer(i)) => i
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| overflow("-", i)),
        (UnaryOperator::Negate, Number::Double(d)) => Ok(Value::Double(-d)),
    }
}

/// Numeric semantics of the arithmetic operators
///
/// Integer operands stay integers (with overflow checks) unless the result
/// has a fraction. Any double operand makes the result a double.
pub fn arithmetic(op: BinaryOperator, left: Number, right: Number) -> FormulaResult<Number> {
    if !matches!(
        op,
        BinaryOperator::Add
            | BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Power
    ) {
        return Err(FormulaError::evaluation(
            CellError::Value,
            format!("'{}' is not an arithmetic operator", op.symbol()),
        ));
    }

    if let (Number::Integer(l), Number::Integer(r)) = (left, right) {
        let result = match op {
            BinaryOperator::Add => l.checked_add(r),
            BinaryOperator::Subtract => l.checked_sub(r),
            BinaryOperator::Multiply => l.checked_mul(r),
            BinaryOperator::Divide => {
                if r == 0 {
                    return Err(division_by_zero());
                }
                match l.checked_rem(r) {
                    Some(0) => l.checked_div(r),
                    Some(_) => return Ok(Number::Double(l as f64 / r as f64)),
                    None => None,
                }
            }
            _ => {
                if r < 0 {
                    return finite(Number::Double((l as f64).powf(r as f64)));
                }
                u32::try_from(r).ok().and_then(|exp| l.checked_pow(exp))
            }
        };
        return result
            .map(Number::Integer)
            .ok_or_else(|| overflow(op.symbol(), l));
    }

    let l = left.as_f64();
    let r = right.as_f64();
    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Err(division_by_zero());
            }
            l / r
        }
        _ => l.powf(r),
    };
    finite(Number::Double(result))
}

/// Reject NaN and infinite results
pub fn finite(n: Number) -> FormulaResult<Number> {
    match n {
        Number::Double(d) if !d.is_finite() => Err(FormulaError::evaluation(
            CellError::Num,
            "result is not a finite number",
        )),
        n => Ok(n),
    }
}

fn division_by_zero() -> FormulaError {
    FormulaError::evaluation(CellError::Div0, "division by zero")
}

fn overflow(symbol: &str, operand: i64) -> FormulaError {
    FormulaError::evaluation(
        CellError::Num,
        format!("integer overflow in '{}' with operand {}", symbol, operand),
    )
}
