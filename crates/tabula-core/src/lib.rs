//! # tabula-core
//!
//! Core data structures for the tabula formula engine.
//!
//! This crate provides the fundamental types used throughout tabula:
//! - [`Value`] - Computed cell values (booleans, integers, doubles, strings, ranges, errors)
//! - [`CellReference`] and [`CellRange`] - Cell addressing and rectangular ranges
//! - [`CellError`] - Error codes stored in cells whose evaluation failed
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::{CellRange, CellReference, Value};
//!
//! let a1 = CellReference::parse("A1").unwrap();
//! let range = CellRange::new(a1, "B2".parse().unwrap());
//! assert_eq!(range.cells().len(), 4);
//!
//! assert_eq!(Value::parse_literal("42"), Value::Integer(42));
//! assert_eq!(Value::Double(2.0).to_string(), "2");
//! ```

pub mod cell;
pub mod error;

// Re-exports for convenience
pub use cell::{CellError, CellRange, CellRangeIterator, CellReference, Number, Value};
pub use error::{Error, Result};

/// Maximum number of rows addressable by a [`CellReference`]
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns addressable by a [`CellReference`]
pub const MAX_COLS: u16 = 16_384;
