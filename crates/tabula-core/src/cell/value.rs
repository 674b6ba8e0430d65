//! Cell value types

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

/// The computed value of a cell
///
/// `Iterable` only ever holds scalar values: it is produced by expanding a
/// range and is never nested.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Empty cell (never written, or cleared)
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Integer value
    Integer(i64),

    /// Floating point value
    Double(f64),

    /// String value
    String(String),

    /// Values of a range, in row-major order
    Iterable(Vec<Value>),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),
}

/// A value coerced for arithmetic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Double(f64),
}

impl Number {
    /// Widen to a double
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Double(d) => d,
        }
    }

    /// Get the integral value, if this number has one
    pub fn as_integer(self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(i),
            Number::Double(d) if d.fract() == 0.0 && d.abs() < 9.0e15 => Some(d as i64),
            Number::Double(_) => None,
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Integer(i) => Value::Integer(i),
            Number::Double(d) => Value::Double(d),
        }
    }
}

impl Value {
    /// Classify the raw text of a non-formula cell
    ///
    /// # Examples
    /// ```
    /// use tabula_core::Value;
    ///
    /// assert_eq!(Value::parse_literal("12"), Value::Integer(12));
    /// assert_eq!(Value::parse_literal("1.5"), Value::Double(1.5));
    /// assert_eq!(Value::parse_literal(" true "), Value::Boolean(true));
    /// assert_eq!(Value::parse_literal("hello"), Value::String("hello".into()));
    /// assert_eq!(Value::parse_literal("   "), Value::Empty);
    /// ```
    pub fn parse_literal(text: &str) -> Value {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Value::Empty;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Integer(i);
        }
        // `f64::from_str` also accepts "inf" and "NaN", which are not numbers here
        if trimmed.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '+')) {
            if let Ok(d) = trimmed.parse::<f64>() {
                if d.is_finite() {
                    return Value::Double(d);
                }
            }
        }
        Value::String(text.to_string())
    }

    /// Name of the value's kind, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Iterable(_) => "range",
            Value::Error(_) => "error",
        }
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Check if the value is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Get the error if this is one
    pub fn error(&self) -> Option<CellError> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Check if the value is an integer or a double
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Double(_))
    }

    /// Coerce for arithmetic
    ///
    /// Booleans become 0/1 and empty becomes 0. Strings, ranges and errors
    /// cannot be used as numbers.
    pub fn to_number(&self) -> Result<Number> {
        match self {
            Value::Empty => Ok(Number::Integer(0)),
            Value::Boolean(b) => Ok(Number::Integer(*b as i64)),
            Value::Integer(i) => Ok(Number::Integer(*i)),
            Value::Double(d) => Ok(Number::Double(*d)),
            other => Err(Error::ValueCast {
                expected: "number",
                actual: other.type_name(),
            }),
        }
    }

    /// Coerce to a double
    pub fn to_f64(&self) -> Result<f64> {
        self.to_number().map(Number::as_f64)
    }

    /// Coerce to a condition
    pub fn to_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Empty => Ok(false),
            Value::Integer(i) => Ok(*i != 0),
            Value::Double(d) => Ok(*d != 0.0),
            other => Err(Error::ValueCast {
                expected: "boolean",
                actual: other.type_name(),
            }),
        }
    }

    /// Text form of the value
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Compare two scalar values
    ///
    /// Numbers compare numerically (booleans are not numbers here), strings
    /// lexically and case-sensitively, booleans with FALSE < TRUE. An empty
    /// value compares as the zero of the other side's kind. Any other
    /// combination cannot be ordered.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        let incompatible = || Error::ValueCast {
            expected: other.type_name(),
            actual: self.type_name(),
        };

        match (self, other) {
            (Value::Empty, Value::Empty) => Ok(Ordering::Equal),
            (Value::Empty, Value::String(s)) => Ok("".cmp(s.as_str())),
            (Value::String(s), Value::Empty) => Ok(s.as_str().cmp("")),
            (Value::Empty, Value::Boolean(b)) => Ok(false.cmp(b)),
            (Value::Boolean(b), Value::Empty) => Ok(b.cmp(&false)),
            (Value::String(l), Value::String(r)) => Ok(l.cmp(r)),
            (Value::Boolean(l), Value::Boolean(r)) => Ok(l.cmp(r)),
            (Value::Integer(l), Value::Integer(r)) => Ok(l.cmp(r)),
            (
                Value::Empty | Value::Integer(_) | Value::Double(_),
                Value::Empty | Value::Integer(_) | Value::Double(_),
            ) => {
                let l = self.to_f64()?;
                let r = other.to_f64()?;
                l.partial_cmp(&r).ok_or_else(incompatible)
            }
            _ => Err(incompatible()),
        }
    }
}

/// Numeric-aware equality: `Integer(2) == Double(2.0)`
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Empty, Value::Empty) => true,
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::Integer(l), Value::Integer(r)) => l == r,
            (Value::Integer(l), Value::Double(r)) | (Value::Double(r), Value::Integer(l)) => {
                *l as f64 == *r
            }
            (Value::Double(l), Value::Double(r)) => l == r,
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Iterable(l), Value::Iterable(r)) => l == r,
            (Value::Error(l), Value::Error(r)) => l == r,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Double(d) => {
                // No trailing ".0" for integral doubles
                if d.fract() == 0.0 && d.abs() < 1e15 {
                    write!(f, "{}", *d as i64)
                } else {
                    write!(f, "{}", d)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Iterable(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Empty
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<CellError> for Value {
    fn from(e: CellError) -> Self {
        Value::Error(e)
    }
}

/// Error codes stored in cells whose evaluation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellError {
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference, or a reference to a failed cell
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
    /// #CYCLE! - Circular reference
    Cycle,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
            CellError::Cycle => "#CYCLE!",
        }
    }

    /// Parse an error string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            "#CYCLE!" => Some(CellError::Cycle),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_literal() {
        assert_eq!(Value::parse_literal("5"), Value::Integer(5));
        assert_eq!(Value::parse_literal("-5"), Value::Integer(-5));
        assert_eq!(Value::parse_literal("2.5e2"), Value::Double(250.0));
        assert_eq!(Value::parse_literal("FALSE"), Value::Boolean(false));
        assert_eq!(Value::parse_literal(""), Value::Empty);
        assert_eq!(Value::parse_literal("inf"), Value::String("inf".into()));
        assert_eq!(Value::parse_literal("NaN"), Value::String("NaN".into()));
        assert_eq!(Value::parse_literal("1e999"), Value::String("1e999".into()));
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(Value::Integer(2), Value::Double(2.0));
        assert_ne!(Value::Integer(2), Value::Double(2.5));
        assert_ne!(Value::Integer(1), Value::Boolean(true));
        assert_ne!(Value::String("1".into()), Value::Integer(1));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::Boolean(true).to_number().unwrap(), Number::Integer(1));
        assert_eq!(Value::Empty.to_number().unwrap(), Number::Integer(0));
        assert_eq!(Value::Double(1.5).to_number().unwrap(), Number::Double(1.5));
        assert_eq!(
            Value::String("x".into()).to_number(),
            Err(Error::ValueCast {
                expected: "number",
                actual: "string"
            })
        );
        assert!(Value::Iterable(vec![]).to_number().is_err());
    }

    #[test]
    fn test_compare() {
        assert_eq!(
            Value::Integer(1).compare(&Value::Double(1.5)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Value::from("b").compare(&Value::from("a")).unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            Value::from("B").compare(&Value::from("a")).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Value::Empty.compare(&Value::Integer(0)).unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            Value::Boolean(false).compare(&Value::Boolean(true)).unwrap(),
            Ordering::Less
        );
        assert!(Value::Integer(1).compare(&Value::from("1")).is_err());
        assert!(Value::Boolean(true).compare(&Value::Integer(1)).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Double(20.0).to_string(), "20");
        assert_eq!(Value::Double(2.5).to_string(), "2.5");
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Boolean(true).to_string(), "TRUE");
        assert_eq!(Value::Empty.to_string(), "");
        assert_eq!(
            Value::Iterable(vec![Value::Integer(1), Value::from("x")]).to_string(),
            "[1, x]"
        );
        assert_eq!(Value::Error(CellError::Div0).to_string(), "#DIV/0!");
    }

    #[test]
    fn test_number_as_integer() {
        assert_eq!(Number::Double(3.0).as_integer(), Some(3));
        assert_eq!(Number::Double(3.5).as_integer(), None);
        assert_eq!(Number::Integer(7).as_integer(), Some(7));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(CellError::Div0.to_string(), "#DIV/0!");
        assert_eq!(CellError::Cycle.to_string(), "#CYCLE!");
    }

    #[test]
    fn test_error_from_str() {
        assert_eq!(CellError::from_str("#DIV/0!"), Some(CellError::Div0));
        assert_eq!(CellError::from_str("#n/a"), Some(CellError::Na)); // Case insensitive
        assert_eq!(CellError::from_str("invalid"), None);
    }
}
