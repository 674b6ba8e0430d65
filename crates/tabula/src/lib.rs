//! # tabula
//!
//! A spreadsheet formula engine: cells hold literals or `=` formulas, and
//! every edit recalculates the cells that depend on it.
//!
//! ## Features
//!
//! - Formula parsing with operator precedence, ranges and function calls
//! - Built-in math, statistical, text and logical functions
//! - Dependency tracking with cycle and self-reference rejection
//! - Incremental recalculation in dependency order
//! - Change notification through watchers
//! - Bulk load and export of raw cell contents (`serde` feature for the
//!   `{"ref", "text"}` document shape)
//!
//! ## Example
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! let mut manager = DataManager::new();
//! for (cell, text) in [("A1", "1"), ("A2", "2"), ("A3", "3"), ("B1", "=SUM(A1:A3)")] {
//!     manager.set_cell_content(cell.parse().unwrap(), text).unwrap();
//! }
//! assert_eq!(manager.get_cell_value("B1".parse().unwrap()), Value::Integer(6));
//!
//! // Cycles are rejected and leave the cell untouched
//! let err = manager.set_cell_content("A1".parse().unwrap(), "=B1").unwrap_err();
//! assert!(matches!(err, FormulaError::DataDependency { .. }));
//! ```

pub mod document;
pub mod manager;
pub mod options;
pub mod prelude;
pub mod watcher;

pub use document::{CellContent, LoadReport};
pub use manager::{DataAccess, DataManager, RecalcSummary};
pub use options::ManagerOptions;
pub use watcher::{CellWatcher, WatcherId};

// Re-export core types
pub use tabula_core::{CellError, CellRange, CellReference, Number, Value, MAX_COLS, MAX_ROWS};

// Re-export formula types
pub use tabula_formula::{
    evaluate, parse_expression, parse_formula, DependencyGraph, EvaluationContext, Expression,
    FormulaError, FormulaResult, FunctionDef, FunctionRegistry, Parser, Registry,
};

/// Result type for data manager operations
pub type Result<T> = std::result::Result<T, FormulaError>;
