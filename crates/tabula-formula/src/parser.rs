//! Formula parser
//!
//! An operator-precedence (shunting-yard) parser. Operands go on one stack;
//! pending operators, parentheses and function calls go on another. Each
//! incoming infix operator first reduces every stacked operator that binds
//! more tightly, or equally tightly when the incoming operator is
//! left-associative.

use crate::ast::Expression;
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionDef;
use crate::operators::{Arity, Associativity, NonFunctionOperator, OperatorKind, Registry};
use crate::tokenizer::{Token, TokenKind, Tokenizer};
use std::iter::Peekable;
use tabula_core::{CellRange, CellReference, Value};

/// Deepest operator or call nesting a formula may have
///
/// Trees are evaluated, printed and dropped recursively, so the parser
/// refuses anything deeper instead of building it.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use tabula_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<Expression> {
    Parser::new(Registry::global()).parse_formula(formula)
}

/// Parse an expression without the leading `=`
pub fn parse_expression(body: &str) -> FormulaResult<Expression> {
    Parser::new(Registry::global()).parse_expression(body)
}

/// Formula parser over a function registry
#[derive(Clone, Copy)]
pub struct Parser<'r> {
    registry: &'r Registry,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Parse formula text, which must start with `=`
    ///
    /// Error positions are byte offsets into `formula`.
    pub fn parse_formula(&self, formula: &str) -> FormulaResult<Expression> {
        let body = formula
            .trim_start()
            .strip_prefix('=')
            .ok_or_else(|| FormulaError::parsing(0, "formula must start with '='"))?;
        let offset = formula.len() - body.len();

        let expr = self.parse_expression(body).map_err(|err| match err {
            FormulaError::Parsing { position, message } => FormulaError::Parsing {
                position: position + offset,
                message,
            },
            other => other,
        })?;

        tracing::trace!(formula, "parsed as {}", expr);
        Ok(expr)
    }

    /// Parse a bare expression
    pub fn parse_expression(&self, body: &str) -> FormulaResult<Expression> {
        ShuntingYard::new(self.registry).run(Tokenizer::new(body).peekable())
    }
}

/// Entry on the operator stack
enum Pending<'r> {
    Operator(&'static NonFunctionOperator),
    /// Grouping parenthesis
    Paren { position: usize },
    /// Function call; its arguments are the operands above `operand_base`
    Call {
        def: &'r FunctionDef,
        operand_base: usize,
        position: usize,
    },
}

/// Entry on the operand stack
struct Operand {
    expr: Expression,
    /// Levels of operator or call nodes, 1 for a leaf
    depth: usize,
    /// Came out of a grouping parenthesis
    grouped: bool,
}

impl Operand {
    fn leaf(expr: Expression) -> Self {
        Self {
            expr,
            depth: 1,
            grouped: false,
        }
    }
}

struct ShuntingYard<'r> {
    registry: &'r Registry,
    operands: Vec<Operand>,
    pending: Vec<Pending<'r>>,
    /// Next token must start an operand (prefix operators allowed)
    expect_operand: bool,
}

impl<'r> ShuntingYard<'r> {
    fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            operands: Vec::new(),
            pending: Vec::new(),
            expect_operand: true,
        }
    }

    fn run(mut self, mut tokens: Peekable<Tokenizer<'_>>) -> FormulaResult<Expression> {
        while let Some(token) = tokens.next() {
            let token = token?;
            match token.kind {
                TokenKind::Number => {
                    let value = number_literal(&token)?;
                    self.push_operand(Expression::Value(value), &token)?;
                }
                TokenKind::String => {
                    let value = Value::String(token.string_value());
                    self.push_operand(Expression::Value(value), &token)?;
                }
                TokenKind::Identifier => {
                    let is_call = matches!(
                        tokens.peek(),
                        Some(Ok(Token {
                            kind: TokenKind::LeftParen,
                            ..
                        }))
                    );
                    if is_call {
                        tokens.next();
                        self.open_call(&token)?;
                    } else {
                        let operand = name_operand(&token)?;
                        self.push_operand(operand, &token)?;
                    }
                }
                TokenKind::Operator => self.operator(&token)?,
                TokenKind::LeftParen => {
                    if !self.expect_operand {
                        return Err(missing_operator(&token));
                    }
                    self.pending.push(Pending::Paren {
                        position: token.position,
                    });
                }
                TokenKind::RightParen => self.close_paren(&token)?,
                TokenKind::Separator => self.separator(&token)?,
                TokenKind::End => return self.finish(&token),
            }
        }

        // Only reachable if the token stream lacks its End token
        Err(FormulaError::ExpressionParsing("unexpected end of input".into()))
    }

    fn push_operand(&mut self, operand: Expression, token: &Token) -> FormulaResult<()> {
        if !self.expect_operand {
            return Err(missing_operator(token));
        }
        self.operands.push(Operand::leaf(operand));
        self.expect_operand = false;
        Ok(())
    }

    fn open_call(&mut self, token: &Token) -> FormulaResult<()> {
        if !self.expect_operand {
            return Err(missing_operator(token));
        }
        let def = self.registry.function(token.lexeme).ok_or_else(|| {
            FormulaError::ExpressionParsing(format!(
                "unknown function '{}' at position {}",
                token.lexeme, token.position
            ))
        })?;
        self.pending.push(Pending::Call {
            def,
            operand_base: self.operands.len(),
            position: token.position,
        });
        Ok(())
    }

    fn operator(&mut self, token: &Token) -> FormulaResult<()> {
        if self.expect_operand {
            let op = self.registry.prefix(token.lexeme).ok_or_else(|| {
                FormulaError::ExpressionParsing(format!(
                    "missing operand before '{}' at position {}",
                    token.lexeme, token.position
                ))
            })?;
            // Nothing to reduce: a prefix operator applies to what follows
            self.pending.push(Pending::Operator(op));
            return Ok(());
        }

        let op = self.registry.infix(token.lexeme).ok_or_else(|| {
            FormulaError::ExpressionParsing(format!(
                "unknown operator '{}' at position {}",
                token.lexeme, token.position
            ))
        })?;

        while let Some(Pending::Operator(top)) = self.pending.last() {
            let reduce = top.precedence > op.precedence
                || (top.precedence == op.precedence && op.associativity == Associativity::Left);
            if !reduce {
                break;
            }
            self.reduce_top()?;
        }

        self.pending.push(Pending::Operator(op));
        self.expect_operand = true;
        Ok(())
    }

    fn close_paren(&mut self, token: &Token) -> FormulaResult<()> {
        if self.expect_operand {
            // Only `NAME()` may close right after opening
            return match self.pending.last() {
                Some(Pending::Call { operand_base, .. })
                    if *operand_base == self.operands.len() =>
                {
                    self.finish_call()
                }
                _ => Err(FormulaError::ExpressionParsing(format!(
                    "missing operand before ')' at position {}",
                    token.position
                ))),
            };
        }

        self.reduce_operators()?;
        match self.pending.last() {
            Some(Pending::Paren { .. }) => {
                self.pending.pop();
                if let Some(top) = self.operands.last_mut() {
                    top.grouped = true;
                }
                Ok(())
            }
            Some(Pending::Call { .. }) => self.finish_call(),
            _ => Err(FormulaError::ExpressionParsing(format!(
                "unbalanced parentheses: unexpected ')' at position {}",
                token.position
            ))),
        }
    }

    fn separator(&mut self, token: &Token) -> FormulaResult<()> {
        if self.expect_operand {
            return Err(FormulaError::ExpressionParsing(format!(
                "missing argument before ',' at position {}",
                token.position
            )));
        }

        self.reduce_operators()?;
        match self.pending.last() {
            Some(Pending::Call { .. }) => {
                self.expect_operand = true;
                Ok(())
            }
            _ => Err(FormulaError::ExpressionParsing(format!(
                "',' outside of a function call at position {}",
                token.position
            ))),
        }
    }

    fn finish(mut self, token: &Token) -> FormulaResult<Expression> {
        if self.expect_operand {
            let message = if self.operands.is_empty() && self.pending.is_empty() {
                "empty expression".to_string()
            } else {
                format!("missing operand at position {}", token.position)
            };
            return Err(FormulaError::ExpressionParsing(message));
        }

        self.reduce_operators()?;
        if let Some(Pending::Paren { position } | Pending::Call { position, .. }) =
            self.pending.last()
        {
            return Err(FormulaError::ExpressionParsing(format!(
                "unbalanced parentheses: '(' at position {} is never closed",
                position
            )));
        }

        match (self.operands.pop(), self.operands.is_empty()) {
            (Some(operand), true) => Ok(operand.expr),
            _ => Err(FormulaError::ExpressionParsing("malformed expression".into())),
        }
    }

    // === Reductions ===

    /// Reduce operators down to the nearest parenthesis or call
    fn reduce_operators(&mut self) -> FormulaResult<()> {
        while let Some(Pending::Operator(_)) = self.pending.last() {
            self.reduce_top()?;
        }
        Ok(())
    }

    /// Pop the top operator and replace its operands with the result
    fn reduce_top(&mut self) -> FormulaResult<()> {
        let Some(Pending::Operator(op)) = self.pending.pop() else {
            return Err(FormulaError::ExpressionParsing("malformed expression".into()));
        };

        let right = self.pop_operand(op)?;
        let left = match op.arity {
            Arity::Unary => None,
            Arity::Binary => Some(self.pop_operand(op)?),
        };

        let (expr, depth) = match (op.kind, left) {
            (OperatorKind::Prefix(unary), None) => {
                (Expression::unary(unary, right.expr), right.depth + 1)
            }
            (OperatorKind::Binary(binary), Some(left)) => {
                let depth = left.depth.max(right.depth) + 1;
                (Expression::binary(binary, left.expr, right.expr), depth)
            }
            (OperatorKind::Range, Some(left)) => {
                if left.grouped || right.grouped {
                    return Err(FormulaError::ExpressionParsing(format!(
                        "malformed range '{}:{}': range ends cannot be parenthesized",
                        left.expr, right.expr
                    )));
                }
                match (left.expr, right.expr) {
                    (Expression::CellRef(start), Expression::CellRef(end)) => {
                        (Expression::Range(CellRange::new(start, end)), 1)
                    }
                    (left, right) => {
                        return Err(FormulaError::ExpressionParsing(format!(
                            "malformed range '{}:{}': both ends must be cell references",
                            left, right
                        )));
                    }
                }
            }
            _ => {
                return Err(FormulaError::ExpressionParsing(format!(
                    "operator '{}' has the wrong number of operands",
                    op.symbol
                )));
            }
        };

        self.push_node(expr, depth)
    }

    /// Push a reduced node, refusing trees nested too deeply
    fn push_node(&mut self, expr: Expression, depth: usize) -> FormulaResult<()> {
        if depth > MAX_NESTING_DEPTH {
            return Err(FormulaError::ExpressionParsing(format!(
                "expression nests more than {} levels deep",
                MAX_NESTING_DEPTH
            )));
        }
        self.operands.push(Operand {
            expr,
            depth,
            grouped: false,
        });
        Ok(())
    }

    /// Close the call on top of the stack, collecting its arguments
    fn finish_call(&mut self) -> FormulaResult<()> {
        let Some(Pending::Call {
            def, operand_base, ..
        }) = self.pending.pop()
        else {
            return Err(FormulaError::ExpressionParsing("malformed expression".into()));
        };
        if operand_base > self.operands.len() {
            return Err(FormulaError::ExpressionParsing(format!(
                "malformed arguments for {}",
                def.name
            )));
        }

        let operands = self.operands.split_off(operand_base);
        def.check_arity(operands.len())?;

        let depth = operands.iter().map(|arg| arg.depth).max().unwrap_or(0) + 1;
        let args = operands.into_iter().map(|arg| arg.expr).collect();
        self.push_node(
            Expression::Function {
                name: def.name.to_string(),
                args,
            },
            depth,
        )?;
        self.expect_operand = false;
        Ok(())
    }

    fn pop_operand(&mut self, op: &NonFunctionOperator) -> FormulaResult<Operand> {
        self.operands.pop().ok_or_else(|| {
            FormulaError::ExpressionParsing(format!("missing operand for '{}'", op.symbol))
        })
    }
}

/// Boolean literal or cell reference
fn name_operand(token: &Token) -> FormulaResult<Expression> {
    let name = token.lexeme;
    if name.eq_ignore_ascii_case("TRUE") {
        return Ok(Expression::Value(Value::Boolean(true)));
    }
    if name.eq_ignore_ascii_case("FALSE") {
        return Ok(Expression::Value(Value::Boolean(false)));
    }
    if looks_like_cell_reference(name) {
        return Ok(Expression::CellRef(CellReference::parse(name)?));
    }
    Err(FormulaError::ExpressionParsing(format!(
        "unknown name '{}' at position {}",
        name, token.position
    )))
}

/// Letters followed by digits, e.g. `A1` or `xfd20`
fn looks_like_cell_reference(name: &str) -> bool {
    let digits = name.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    digits.len() < name.len()
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Integer literals that do not fit in an i64 become doubles
fn number_literal(token: &Token) -> FormulaResult<Value> {
    if token.is_integer_literal() {
        if let Ok(i) = token.lexeme.parse::<i64>() {
            return Ok(Value::Integer(i));
        }
    }

    match token.lexeme.parse::<f64>() {
        Ok(d) if d.is_finite() => Ok(Value::Double(d)),
        _ => Err(FormulaError::parsing(
            token.position,
            format!("number '{}' is out of range", token.lexeme),
        )),
    }
}

fn missing_operator(token: &Token) -> FormulaError {
    FormulaError::ExpressionParsing(format!(
        "missing operator before '{}' at position {}",
        token.lexeme, token.position
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOperator, UnaryOperator};
    use pretty_assertions::assert_eq;

    fn cell(s: &str) -> Expression {
        Expression::CellRef(CellReference::parse(s).unwrap())
    }

    fn int(i: i64) -> Expression {
        Expression::Value(Value::Integer(i))
    }

    fn malformed(formula: &str) -> String {
        match parse_formula(formula) {
            Err(FormulaError::ExpressionParsing(message)) => message,
            other => panic!("Expected malformed expression for {}, got {:?}", formula, other),
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("=42").unwrap(), int(42));
        assert_eq!(
            parse_formula("=3.14").unwrap(),
            Expression::Value(Value::Double(3.14))
        );
        assert_eq!(
            parse_formula("=1e10").unwrap(),
            Expression::Value(Value::Double(1e10))
        );
        // Too large for an integer, kept as a double
        assert_eq!(
            parse_formula("=99999999999999999999").unwrap(),
            Expression::Value(Value::Double(1e20))
        );
        assert!(matches!(
            parse_formula("=1e999"),
            Err(FormulaError::Parsing { position: 1, .. })
        ));
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(
            parse_formula("=\"Hello \"\"World\"\"\"").unwrap(),
            Expression::Value(Value::from("Hello \"World\""))
        );
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(
            parse_formula("=TRUE").unwrap(),
            Expression::Value(Value::Boolean(true))
        );
        assert_eq!(
            parse_formula("=false").unwrap(),
            Expression::Value(Value::Boolean(false))
        );
    }

    #[test]
    fn test_parse_arithmetic() {
        // 1+(2*3)
        assert_eq!(
            parse_formula("=1+2*3").unwrap(),
            Expression::binary(
                BinaryOperator::Add,
                int(1),
                Expression::binary(BinaryOperator::Multiply, int(2), int(3))
            )
        );
    }

    #[test]
    fn test_left_associativity() {
        // (10-4)-3
        assert_eq!(
            parse_formula("=10-4-3").unwrap(),
            Expression::binary(
                BinaryOperator::Subtract,
                Expression::binary(BinaryOperator::Subtract, int(10), int(4)),
                int(3)
            )
        );
    }

    #[test]
    fn test_right_associativity() {
        // 2^(3^2)
        assert_eq!(
            parse_formula("=2^3^2").unwrap(),
            Expression::binary(
                BinaryOperator::Power,
                int(2),
                Expression::binary(BinaryOperator::Power, int(3), int(2))
            )
        );
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(
            parse_formula("=-5").unwrap(),
            Expression::unary(UnaryOperator::Negate, int(5))
        );
        // Prefix minus binds tighter than ^
        assert_eq!(
            parse_formula("=-2^2").unwrap(),
            Expression::binary(
                BinaryOperator::Power,
                Expression::unary(UnaryOperator::Negate, int(2)),
                int(2)
            )
        );
        assert_eq!(
            parse_formula("=1--A1").unwrap(),
            Expression::binary(
                BinaryOperator::Subtract,
                int(1),
                Expression::unary(UnaryOperator::Negate, cell("A1"))
            )
        );
        assert_eq!(
            parse_formula("=+-1").unwrap(),
            Expression::unary(
                UnaryOperator::Plus,
                Expression::unary(UnaryOperator::Negate, int(1))
            )
        );
    }

    #[test]
    fn test_parse_comparison() {
        assert_eq!(
            parse_formula("=A1+1>=B2&\"x\"").unwrap(),
            Expression::binary(
                BinaryOperator::GreaterEqual,
                Expression::binary(BinaryOperator::Add, cell("A1"), int(1)),
                Expression::binary(
                    BinaryOperator::Concat,
                    cell("B2"),
                    Expression::Value(Value::from("x"))
                )
            )
        );
        assert!(matches!(
            parse_formula("=A1==B1").unwrap(),
            Expression::Binary {
                op: BinaryOperator::Equal,
                ..
            }
        ));
        assert!(matches!(
            parse_formula("=A1!=B1").unwrap(),
            Expression::Binary {
                op: BinaryOperator::NotEqual,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_cell_reference() {
        assert_eq!(
            parse_formula("=b2").unwrap(),
            Expression::CellRef(CellReference::new(1, 1))
        );
        assert!(matches!(
            parse_formula("=A0"),
            Err(FormulaError::CellReference(_))
        ));
        assert!(matches!(
            parse_formula("=XFE1"),
            Err(FormulaError::CellReference(_))
        ));
    }

    #[test]
    fn test_parse_range_reference() {
        let ast = parse_formula("=A1:B10").unwrap();
        assert_eq!(
            ast,
            Expression::Range(CellRange::new(
                CellReference::new(0, 0),
                CellReference::new(9, 1)
            ))
        );

        // Reversed corners are normalized
        assert_eq!(parse_formula("=B10:A1").unwrap(), ast);
    }

    #[test]
    fn test_malformed_range() {
        assert!(malformed("=A1:2").contains("malformed range"));
        assert!(malformed("=A1:B1:C1").contains("malformed range"));
        assert!(malformed("=(A1):SUM(B1)").contains("malformed range"));
    }

    #[test]
    fn test_parenthesized_range_ends() {
        assert!(malformed("=(A1):(B1)").contains("cannot be parenthesized"));
        assert!(malformed("=A1:(B1)").contains("cannot be parenthesized"));

        // Grouping the whole range is fine
        assert_eq!(
            parse_formula("=(A1:B2)").unwrap(),
            parse_formula("=A1:B2").unwrap()
        );
    }

    #[test]
    fn test_nesting_limit() {
        let deep_prefix = format!("={}1", "-".repeat(100_000));
        assert!(malformed(&deep_prefix).contains("levels deep"));

        let deep_sum = format!("={}1{}", "1+(".repeat(100_000), ")".repeat(100_000));
        assert!(malformed(&deep_sum).contains("levels deep"));

        let deep_call = format!("={}1{}", "ABS(".repeat(100_000), ")".repeat(100_000));
        assert!(malformed(&deep_call).contains("levels deep"));

        // Parentheses alone add no levels
        let deep_parens = format!("={}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(parse_formula(&deep_parens).unwrap(), int(1));

        // Right at the limit still parses
        let at_limit = format!("={}1", "-".repeat(MAX_NESTING_DEPTH - 1));
        assert!(parse_formula(&at_limit).is_ok());
        let over_limit = format!("={}1", "-".repeat(MAX_NESTING_DEPTH));
        assert!(malformed(&over_limit).contains("levels deep"));
    }

    #[test]
    fn test_parse_function() {
        let ast = parse_formula("=sum(1,2,3)").unwrap();
        assert_eq!(
            ast,
            Expression::Function {
                name: "SUM".into(),
                args: vec![int(1), int(2), int(3)],
            }
        );

        let ast = parse_formula("=PI()").unwrap();
        assert_eq!(
            ast,
            Expression::Function {
                name: "PI".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_parse_nested_function() {
        let ast = parse_formula("=IF(A1>0,SUM(B1:B10, -1),0)").unwrap();
        if let Expression::Function { name, args } = ast {
            assert_eq!(name, "IF");
            assert_eq!(args.len(), 3);
            assert!(matches!(&args[1], Expression::Function { args, .. } if args.len() == 2));
        } else {
            panic!("Expected Function");
        }
    }

    #[test]
    fn test_parse_parentheses() {
        assert_eq!(
            parse_formula("=(1+2)*3").unwrap(),
            Expression::binary(
                BinaryOperator::Multiply,
                Expression::binary(BinaryOperator::Add, int(1), int(2)),
                int(3)
            )
        );
        assert_eq!(parse_formula("=((7))").unwrap(), int(7));
    }

    #[test]
    fn test_function_arity() {
        assert_eq!(
            parse_formula("=POW(1)").unwrap_err(),
            FormulaError::FunctionArgument {
                function: "POW".into(),
                expected: "2".into(),
                actual: 1,
            }
        );
        assert!(matches!(
            parse_formula("=IF(TRUE, 1, 2, 3)"),
            Err(FormulaError::FunctionArgument { actual: 4, .. })
        ));
        assert!(matches!(
            parse_formula("=PI(1)"),
            Err(FormulaError::FunctionArgument { actual: 1, .. })
        ));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(malformed("=(1+2").contains("never closed"));
        assert!(malformed("=SUM(1").contains("never closed"));
        assert!(malformed("=1+2)").contains("unexpected ')'"));
    }

    #[test]
    fn test_missing_operands_and_operators() {
        assert!(malformed("=").contains("empty expression"));
        assert!(malformed("=1+").contains("missing operand"));
        assert!(malformed("=*2").contains("missing operand"));
        assert!(malformed("=()").contains("missing operand"));
        assert!(malformed("=SUM(1,)").contains("missing operand"));
        assert!(malformed("=SUM(,1)").contains("missing argument"));
        assert!(malformed("=1 2").contains("missing operator"));
        assert!(malformed("=A1 B1").contains("missing operator"));
        assert!(malformed("=(1)(2)").contains("missing operator"));
        assert!(malformed("=1,2").contains("outside of a function call"));
    }

    #[test]
    fn test_unknown_names() {
        assert!(malformed("=FOO(1)").contains("unknown function 'FOO'"));
        assert!(malformed("=foo + 1").contains("unknown name 'foo'"));
    }

    #[test]
    fn test_formula_prefix_and_positions() {
        assert!(matches!(
            parse_formula("1+2"),
            Err(FormulaError::Parsing { position: 0, .. })
        ));
        assert_eq!(parse_formula("  = 1").unwrap(), int(1));
        // Position counts from the start of the formula text
        assert!(matches!(
            parse_formula("=1 + #"),
            Err(FormulaError::Parsing { position: 5, .. })
        ));
        assert_eq!(parse_expression("1+1").unwrap(), parse_formula("=1+1").unwrap());
    }

    #[test]
    fn test_custom_registry() {
        use crate::functions::{FunctionDef, FunctionRegistry};
        use crate::evaluator::EvaluationContext;

        fn fn_double(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
            Ok(Value::Integer(args[0].to_number()?.as_integer().unwrap_or(0) * 2))
        }

        let mut functions = FunctionRegistry::empty();
        functions.register(FunctionDef::eager("TWICE", 1, Some(1), fn_double));
        let registry = Registry::with_functions(functions);
        let parser = Parser::new(&registry);

        assert!(parser.parse_formula("=TWICE(2)").is_ok());
        assert!(parser.parse_formula("=SUM(2)").is_err());
    }

    #[test]
    fn test_complex_formula() {
        let ast = parse_formula("=IF(A1>0,-B1*(C1+2)^2/LOG(10, D1),\"none\")").unwrap();
        assert_eq!(ast.references().len(), 4);
        assert_eq!(
            ast.to_string(),
            "IF(A1>0, -B1*(C1+2)^2/LOG(10, D1), \"none\")"
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn expression_text() -> impl Strategy<Value = String> {
            let leaf = prop_oneof![
                (0i64..1000).prop_map(|i| i.to_string()),
                (0u8..5, 1u32..20).prop_map(|(c, r)| format!("{}{}", (b'A' + c) as char, r)),
                Just("TRUE".to_string()),
                Just("\"s\"".to_string()),
            ];
            leaf.prop_recursive(4, 32, 3, |inner| {
                prop_oneof![
                    (
                        inner.clone(),
                        prop::sample::select(vec!["+", "-", "*", "/", "^", "&", "=", "<>", "<="]),
                        inner.clone()
                    )
                        .prop_map(|(l, op, r)| format!("{}{}{}", l, op, r)),
                    inner.clone().prop_map(|e| format!("({})", e)),
                    inner.clone().prop_map(|e| format!("-{}", e)),
                    prop::collection::vec(inner, 1..4)
                        .prop_map(|args| format!("SUM({})", args.join(","))),
                ]
            })
        }

        proptest! {
            #[test]
            fn display_reparses_to_same_tree(text in expression_text()) {
                let ast = parse_expression(&text).unwrap();
                let reparsed = parse_expression(&ast.to_string()).unwrap();
                prop_assert_eq!(reparsed, ast);
            }

            #[test]
            fn parsing_is_deterministic(text in expression_text()) {
                prop_assert_eq!(parse_expression(&text), parse_expression(&text));
            }

            #[test]
            fn arbitrary_input_never_panics(text in "\\PC{0,40}") {
                let _ = parse_formula(&format!("={}", text));
            }
        }
    }
}
