//! Formula error types

use tabula_core::{CellError, CellReference};
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing, dependency tracking or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula text could not be tokenized
    #[error("Parse error at position {position}: {message}")]
    Parsing { position: usize, message: String },

    /// Token sequence does not form a valid expression
    #[error("Malformed expression: {0}")]
    ExpressionParsing(String),

    /// Wrong number of arguments for a known function
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    FunctionArgument {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Edit would create a circular reference
    #[error("Circular reference: {}", cycle_path(.cycle))]
    DataDependency { cycle: Vec<CellReference> },

    /// Formula references its own cell
    #[error("Cell {0} references itself")]
    DataSelfReference(CellReference),

    /// Failure while computing a value
    #[error("Evaluation error {code}: {message}")]
    ExpressionEvaluation { code: CellError, message: String },

    /// Malformed cell reference text
    #[error("Invalid reference: {0}")]
    CellReference(tabula_core::Error),
}

impl FormulaError {
    /// Create a parsing error at a byte position
    pub fn parsing(position: usize, message: impl Into<String>) -> Self {
        FormulaError::Parsing {
            position,
            message: message.into(),
        }
    }

    /// Create an evaluation error with the code stored in the failed cell
    pub fn evaluation(code: CellError, message: impl Into<String>) -> Self {
        FormulaError::ExpressionEvaluation {
            code,
            message: message.into(),
        }
    }

    /// The error code a cell shows when this error is its outcome
    pub fn cell_error(&self) -> CellError {
        match self {
            FormulaError::Parsing { .. } | FormulaError::ExpressionParsing(_) => CellError::Name,
            FormulaError::FunctionArgument { .. } => CellError::Value,
            FormulaError::DataDependency { .. } | FormulaError::DataSelfReference(_) => {
                CellError::Cycle
            }
            FormulaError::ExpressionEvaluation { code, .. } => *code,
            FormulaError::CellReference(_) => CellError::Ref,
        }
    }

    /// Whether this error rejects an edit outright instead of being stored in the cell
    pub fn is_abort(&self) -> bool {
        !matches!(self, FormulaError::ExpressionEvaluation { .. })
    }
}

impl From<tabula_core::Error> for FormulaError {
    fn from(err: tabula_core::Error) -> Self {
        match err {
            tabula_core::Error::ValueCast { .. } => {
                FormulaError::evaluation(CellError::Value, err.to_string())
            }
            other => FormulaError::CellReference(other),
        }
    }
}

fn cycle_path(cycle: &[CellReference]) -> String {
    cycle
        .iter()
        .map(|cell| cell.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
