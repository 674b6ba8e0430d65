//! Data manager configuration

/// Options for a [`DataManager`](crate::DataManager)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ManagerOptions {
    /// Largest range a formula may read, in cells (default: 1,048,576)
    ///
    /// Formulas with a larger range are rejected when they are set.
    pub max_range_cells: u64,
    /// Text shown by `display_value` for cells in an error state
    /// (default: the error code, e.g. `#DIV/0!`)
    pub error_text: Option<String>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            max_range_cells: 1_048_576,
            error_text: None,
        }
    }
}

impl ManagerOptions {
    /// Set the range size limit
    pub fn with_max_range_cells(mut self, max_range_cells: u64) -> Self {
        self.max_range_cells = max_range_cells;
        self
    }

    /// Show `text` instead of the error code for failed cells
    pub fn with_error_text(mut self, text: impl Into<String>) -> Self {
        self.error_text = Some(text.into());
        self
    }
}
