//! Prelude module - common imports for tabula users
//!
//! ```rust
//! use tabula::prelude::*;
//! ```

pub use crate::{
    CellContent,
    CellError,
    CellRange,
    CellReference,
    CellWatcher,
    DataAccess,
    DataManager,
    FormulaError,
    LoadReport,
    ManagerOptions,
    RecalcSummary,
    Result,
    Value,
    WatcherId,
};
