//! Tests for formula evaluation through the public API

use pretty_assertions::assert_eq;
use tabula::prelude::*;
use tabula::{evaluate, parse_formula, EvaluationContext};

fn eval(formula: &str) -> Value {
    let ast = parse_formula(formula).unwrap();
    evaluate(&ast, &EvaluationContext::simple()).unwrap()
}

/// Test basic formula evaluation without cell references
#[test]
fn test_evaluate_simple_formulas() {
    // Arithmetic
    assert_eq!(eval("=1+2*3"), Value::Integer(7));
    assert_eq!(eval("=(1+2)*3"), Value::Integer(9));
    assert_eq!(eval("=7/2"), Value::Double(3.5));
    assert_eq!(eval("=2^3^2"), Value::Integer(512));
    assert_eq!(eval("=-2^2"), Value::Integer(4));

    // String concatenation
    assert_eq!(eval("=\"Hello \"&\"World\""), Value::String("Hello World".into()));

    // Comparison
    assert_eq!(eval("=5>3"), Value::Boolean(true));
    assert_eq!(eval("=1+1=2"), Value::Boolean(true));
}

/// Test SUM and friends
#[test]
fn test_evaluate_statistical() {
    assert_eq!(eval("=SUM(1,2,3,4,5)"), Value::Integer(15));
    assert_eq!(eval("=AVERAGE(1,2,3,4)"), Value::Double(2.5));
    assert_eq!(eval("=MAX(3,9,2)"), Value::Integer(9));
    assert_eq!(eval("=MIN(3,9,2)"), Value::Integer(2));
}

/// Test IF function
#[test]
fn test_evaluate_if() {
    assert_eq!(eval("=IF(1>0,\"Yes\",\"No\")"), Value::String("Yes".into()));
    assert_eq!(eval("=IF(1<0,\"Yes\",\"No\")"), Value::String("No".into()));
    assert_eq!(eval("=IF(1<0,\"Yes\")"), Value::Boolean(false));

    // The branch not taken is never evaluated
    assert_eq!(eval("=IF(TRUE,1,1/0)"), Value::Integer(1));
    assert_eq!(eval("=IFERROR(1/0,\"fallback\")"), Value::String("fallback".into()));
}

/// Test text functions
#[test]
fn test_evaluate_text() {
    assert_eq!(eval("=CONCAT(\"a\",1,TRUE)"), Value::String("a1TRUE".into()));
    assert_eq!(eval("=REPEAT(\"ab\",3)"), Value::String("ababab".into()));
    assert_eq!(eval("=LENGTH(\"hello\")"), Value::Integer(5));
    assert_eq!(eval("=CONTAINS(\"haystack\",\"st\")"), Value::Boolean(true));
}

/// Test that failures surface as evaluation errors with the right code
#[test]
fn test_evaluation_errors() {
    let ctx = EvaluationContext::simple();
    for (formula, code) in [
        ("=1/0", CellError::Div0),
        ("=\"a\"+1", CellError::Value),
        ("=SQRT(-1)", CellError::Num),
        ("=MOD(5,0)", CellError::Div0),
    ] {
        let ast = parse_formula(formula).unwrap();
        let err = evaluate(&ast, &ctx).unwrap_err();
        assert_eq!(err.cell_error(), code, "{}", formula);
    }
}

/// Test that malformed formulas are rejected at parse time
#[test]
fn test_parse_errors() {
    assert!(matches!(
        parse_formula("=SUM(1,"),
        Err(FormulaError::ExpressionParsing(_))
    ));
    assert!(matches!(
        parse_formula("=POW(1)"),
        Err(FormulaError::FunctionArgument { actual: 1, .. })
    ));
    assert!(matches!(parse_formula("=1 $ 2"), Err(FormulaError::Parsing { .. })));
    assert!(parse_formula("=NOPE(1)").is_err());
}
