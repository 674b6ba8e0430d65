//! Operator and function registry
//!
//! Infix and prefix operators form a fixed table with precedence and
//! associativity. Named functions live in a [`FunctionRegistry`]. A
//! [`Registry`] combines both and is built once per process.

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::functions::{FunctionDef, FunctionRegistry};
use once_cell::sync::Lazy;

/// Operator associativity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// Number of operands an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

/// What an operator builds when reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Binary(BinaryOperator),
    Prefix(UnaryOperator),
    /// `:` joining two cell references
    Range,
}

/// A symbol-based operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonFunctionOperator {
    pub symbol: &'static str,
    /// Higher binds tighter
    pub precedence: u8,
    pub associativity: Associativity,
    pub arity: Arity,
    pub kind: OperatorKind,
}

/// Either a symbol operator or a named function
#[derive(Clone, Copy)]
pub enum Operator<'r> {
    NonFunction(&'static NonFunctionOperator),
    Function(&'r FunctionDef),
}

impl std::fmt::Debug for Operator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::NonFunction(op) => f.debug_tuple("NonFunction").field(&op.symbol).finish(),
            Operator::Function(def) => f.debug_tuple("Function").field(&def.name).finish(),
        }
    }
}

pub const RANGE_PRECEDENCE: u8 = 7;
pub const PREFIX_PRECEDENCE: u8 = 6;

const fn binary(
    symbol: &'static str,
    precedence: u8,
    associativity: Associativity,
    op: BinaryOperator,
) -> NonFunctionOperator {
    NonFunctionOperator {
        symbol,
        precedence,
        associativity,
        arity: Arity::Binary,
        kind: OperatorKind::Binary(op),
    }
}

const fn prefix(symbol: &'static str, op: UnaryOperator) -> NonFunctionOperator {
    NonFunctionOperator {
        symbol,
        precedence: PREFIX_PRECEDENCE,
        associativity: Associativity::Right,
        arity: Arity::Unary,
        kind: OperatorKind::Prefix(op),
    }
}

use Associativity::{Left, Right};

static RANGE: NonFunctionOperator = NonFunctionOperator {
    symbol: ":",
    precedence: RANGE_PRECEDENCE,
    associativity: Left,
    arity: Arity::Binary,
    kind: OperatorKind::Range,
};
static POWER: NonFunctionOperator = binary("^", 5, Right, BinaryOperator::Power);
static MULTIPLY: NonFunctionOperator = binary("*", 4, Left, BinaryOperator::Multiply);
static DIVIDE: NonFunctionOperator = binary("/", 4, Left, BinaryOperator::Divide);
static ADD: NonFunctionOperator = binary("+", 3, Left, BinaryOperator::Add);
static SUBTRACT: NonFunctionOperator = binary("-", 3, Left, BinaryOperator::Subtract);
static CONCAT: NonFunctionOperator = binary("&", 2, Left, BinaryOperator::Concat);
static EQUAL: NonFunctionOperator = binary("=", 1, Left, BinaryOperator::Equal);
static EQUAL_ALT: NonFunctionOperator = binary("==", 1, Left, BinaryOperator::Equal);
static NOT_EQUAL: NonFunctionOperator = binary("<>", 1, Left, BinaryOperator::NotEqual);
static NOT_EQUAL_ALT: NonFunctionOperator = binary("!=", 1, Left, BinaryOperator::NotEqual);
static LESS_THAN: NonFunctionOperator = binary("<", 1, Left, BinaryOperator::LessThan);
static LESS_EQUAL: NonFunctionOperator = binary("<=", 1, Left, BinaryOperator::LessEqual);
static GREATER_THAN: NonFunctionOperator = binary(">", 1, Left, BinaryOperator::GreaterThan);
static GREATER_EQUAL: NonFunctionOperator = binary(">=", 1, Left, BinaryOperator::GreaterEqual);

static INFIX_OPERATORS: [&NonFunctionOperator; 15] = [
    &RANGE,
    &POWER,
    &MULTIPLY,
    &DIVIDE,
    &ADD,
    &SUBTRACT,
    &CONCAT,
    &EQUAL,
    &EQUAL_ALT,
    &NOT_EQUAL,
    &NOT_EQUAL_ALT,
    &LESS_THAN,
    &LESS_EQUAL,
    &GREATER_THAN,
    &GREATER_EQUAL,
];

static NEGATE: NonFunctionOperator = prefix("-", UnaryOperator::Negate);
static PLUS: NonFunctionOperator = prefix("+", UnaryOperator::Plus);

impl BinaryOperator {
    /// Table entry for this operator (its canonical symbol)
    pub fn descriptor(self) -> &'static NonFunctionOperator {
        match self {
            BinaryOperator::Add => &ADD,
            BinaryOperator::Subtract => &SUBTRACT,
            BinaryOperator::Multiply => &MULTIPLY,
            BinaryOperator::Divide => &DIVIDE,
            BinaryOperator::Power => &POWER,
            BinaryOperator::Equal => &EQUAL,
            BinaryOperator::NotEqual => &NOT_EQUAL,
            BinaryOperator::LessThan => &LESS_THAN,
            BinaryOperator::LessEqual => &LESS_EQUAL,
            BinaryOperator::GreaterThan => &GREATER_THAN,
            BinaryOperator::GreaterEqual => &GREATER_EQUAL,
            BinaryOperator::Concat => &CONCAT,
        }
    }

    /// Canonical symbol used when formatting
    pub fn symbol(self) -> &'static str {
        self.descriptor().symbol
    }
}

/// Function registry plus the operator table
pub struct Registry {
    functions: FunctionRegistry,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

impl Registry {
    /// Create a registry with all built-in functions
    pub fn new() -> Self {
        Self::with_functions(FunctionRegistry::new())
    }

    /// Create a registry over a custom function set
    pub fn with_functions(functions: FunctionRegistry) -> Self {
        Self { functions }
    }

    /// The process-wide registry of built-in functions
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Resolve an infix operator symbol or a function name
    pub fn resolve(&self, symbol_or_name: &str) -> Option<Operator<'_>> {
        self.infix(symbol_or_name)
            .map(Operator::NonFunction)
            .or_else(|| self.function(symbol_or_name).map(Operator::Function))
    }

    /// Look up an infix operator by symbol
    pub fn infix(&self, symbol: &str) -> Option<&'static NonFunctionOperator> {
        INFIX_OPERATORS
            .iter()
            .copied()
            .find(|entry| entry.symbol == symbol)
    }

    /// Look up a prefix operator by symbol
    pub fn prefix(&self, symbol: &str) -> Option<&'static NonFunctionOperator> {
        match symbol {
            "-" => Some(&NEGATE),
            "+" => Some(&PLUS),
            _ => None,
        }
    }

    /// Look up a function by name (case-insensitive)
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// The function set
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
