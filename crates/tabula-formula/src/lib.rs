//! # tabula-formula
//!
//! Formula engine for tabula.
//!
//! This crate provides:
//! - Tokenizing and parsing (text → AST) with an operator-precedence parser
//! - Evaluation (AST → value) against any cell resolver
//! - Built-in functions (math, aggregates, text, short-circuit logic)
//! - A dependency graph with cycle detection and topological ordering
//!
//! ## Example
//!
//! ```rust
//! use tabula_formula::{evaluate, parse_formula, EvaluationContext};
//! use tabula_core::Value;
//!
//! let ast = parse_formula("=POW(2, 3) + 1").unwrap();
//! let result = evaluate(&ast, &EvaluationContext::simple()).unwrap();
//! assert_eq!(result, Value::Integer(9));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod operators;
pub mod parser;
pub mod tokenizer;

pub use ast::{BinaryOperator, Expression, UnaryOperator};
pub use dependency::DependencyGraph;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, CellResolver, EvaluationContext, NoCells};
pub use functions::{FunctionDef, FunctionImpl, FunctionRegistry};
pub use operators::{Operator, Registry};
pub use parser::{parse_expression, parse_formula, Parser, MAX_NESTING_DEPTH};
pub use tokenizer::{tokenize, Token, TokenKind, Tokenizer};
