//! Cell-related types and utilities
//!
//! This module contains:
//! - [`Value`] - The computed value of a cell
//! - [`CellReference`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A rectangular range of cells (e.g., "A1:B10")

mod address;
mod value;

pub use address::{CellRange, CellRangeIterator, CellReference};
pub use value::{CellError, Number, Value};
