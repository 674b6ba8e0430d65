//! Formula Abstract Syntax Tree types

use crate::operators::{Associativity, PREFIX_PRECEDENCE, RANGE_PRECEDENCE};
use std::collections::BTreeSet;
use std::fmt;
use tabula_core::{CellRange, CellReference, Value};

/// Formula expression AST
///
/// Each node owns its children; the tree is never shared or cyclic.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Value(Value),
    /// Single cell reference
    CellRef(CellReference),
    /// Range reference
    Range(CellRange),
    /// Binary operation
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Prefix operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    /// Function call, name in upper case
    Function { name: String, args: Vec<Expression> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Plus,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
        }
    }
}

impl Expression {
    /// Build a binary node
    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Build a prefix node
    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// All cells this expression reads, ranges expanded, in row-major order
    pub fn references(&self) -> BTreeSet<CellReference> {
        let mut cells = BTreeSet::new();
        self.collect_references(&mut cells);
        cells
    }

    fn collect_references(&self, cells: &mut BTreeSet<CellReference>) {
        match self {
            Expression::Value(_) => {}
            Expression::CellRef(cell) => {
                cells.insert(*cell);
            }
            Expression::Range(range) => cells.extend(range.cells()),
            Expression::Binary { left, right, .. } => {
                left.collect_references(cells);
                right.collect_references(cells);
            }
            Expression::Unary { operand, .. } => operand.collect_references(cells),
            Expression::Function { args, .. } => {
                for arg in args {
                    arg.collect_references(cells);
                }
            }
        }
    }

    /// Ranges used anywhere in the expression
    pub fn ranges(&self) -> Vec<CellRange> {
        let mut ranges = Vec::new();
        self.visit(&mut |expr| {
            if let Expression::Range(range) = expr {
                ranges.push(*range);
            }
        });
        ranges
    }

    fn visit(&self, f: &mut impl FnMut(&Expression)) {
        f(self);
        match self {
            Expression::Binary { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Expression::Unary { operand, .. } => operand.visit(f),
            Expression::Function { args, .. } => {
                for arg in args {
                    arg.visit(f);
                }
            }
            _ => {}
        }
    }

    /// Render the tree one node per line, children indented with dots
    ///
    /// ```rust
    /// use tabula_formula::parse_formula;
    ///
    /// let ast = parse_formula("=POW(A1, 2) + 1").unwrap();
    /// assert_eq!(ast.pretty_tree(), "+\n..POW\n....A1\n....2\n..1\n");
    /// ```
    pub fn pretty_tree(&self) -> String {
        let mut out = String::new();
        self.pretty_print(0, &mut out);
        out
    }

    fn pretty_print(&self, shift: usize, out: &mut String) {
        out.push_str(&".".repeat(shift));
        match self {
            Expression::Value(value) => write_literal(value, out),
            Expression::CellRef(cell) => out.push_str(&cell.to_string()),
            Expression::Range(range) => out.push_str(&range.to_string()),
            Expression::Binary { op, .. } => out.push_str(op.symbol()),
            Expression::Unary { op, .. } => out.push_str(op.symbol()),
            Expression::Function { name, .. } => out.push_str(name),
        }
        out.push('\n');

        match self {
            Expression::Binary { left, right, .. } => {
                left.pretty_print(shift + 2, out);
                right.pretty_print(shift + 2, out);
            }
            Expression::Unary { operand, .. } => operand.pretty_print(shift + 2, out),
            Expression::Function { args, .. } => {
                for arg in args {
                    arg.pretty_print(shift + 2, out);
                }
            }
            _ => {}
        }
    }

    /// Binding strength of the node's outermost operator (atoms bind tightest)
    fn precedence(&self) -> u8 {
        match self {
            Expression::Binary { op, .. } => op.descriptor().precedence,
            Expression::Unary { .. } => PREFIX_PRECEDENCE,
            Expression::Range(_) => RANGE_PRECEDENCE,
            _ => u8::MAX,
        }
    }

    fn fmt_operand(
        &self,
        f: &mut fmt::Formatter<'_>,
        parent: u8,
        needs_parens_on_tie: bool,
    ) -> fmt::Result {
        let own = self.precedence();
        if own < parent || (own == parent && needs_parens_on_tie) {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

fn write_literal(value: &Value, out: &mut String) {
    match value {
        // Keep the floating form so the text re-parses to the same literal
        Value::Double(d) => out.push_str(&format!("{:?}", d)),
        Value::String(s) => {
            out.push('"');
            out.push_str(&s.replace('"', "\"\""));
            out.push('"');
        }
        Value::Empty => out.push_str("\"\""),
        other => out.push_str(&other.to_string()),
    }
}

/// Formats the expression back to formula text (without the leading `=`),
/// with only the parentheses the precedence table requires
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Value(value) => {
                let mut out = String::new();
                write_literal(value, &mut out);
                f.write_str(&out)
            }
            Expression::CellRef(cell) => write!(f, "{}", cell),
            Expression::Range(range) => write!(f, "{}", range),
            Expression::Binary { op, left, right } => {
                let descriptor = op.descriptor();
                let right_assoc = descriptor.associativity == Associativity::Right;
                left.fmt_operand(f, descriptor.precedence, right_assoc)?;
                f.write_str(op.symbol())?;
                right.fmt_operand(f, descriptor.precedence, !right_assoc)
            }
            Expression::Unary { op, operand } => {
                f.write_str(op.symbol())?;
                operand.fmt_operand(f, PREFIX_PRECEDENCE, false)
            }
            Expression::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}
