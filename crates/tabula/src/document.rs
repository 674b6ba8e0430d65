//! Bulk load and export of cell contents
//!
//! The manager only deals in (reference, text) pairs. Choosing a file
//! format is left to the caller.

use tabula_core::CellReference;
use tabula_formula::FormulaError;

/// Raw content of one cell
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellContent {
    #[cfg_attr(feature = "serde", serde(rename = "ref"))]
    pub reference: CellReference,
    pub text: String,
}

impl CellContent {
    pub fn new(reference: CellReference, text: impl Into<String>) -> Self {
        Self {
            reference,
            text: text.into(),
        }
    }
}

impl From<CellContent> for (CellReference, String) {
    fn from(content: CellContent) -> Self {
        (content.reference, content.text)
    }
}

/// Outcome of [`DataManager::load`](crate::DataManager::load)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Number of cells stored, rejected ones included
    pub loaded: usize,
    /// Cells whose formula failed to parse or would close a cycle
    ///
    /// They keep their text and hold an error value.
    pub rejected: Vec<(CellReference, FormulaError)>,
}

impl LoadReport {
    /// Check whether every cell loaded cleanly
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_shape() {
        let content = CellContent::new(CellReference::new(0, 1), "=A1*2");
        let json = serde_json::to_string(&content).unwrap();
        assert_eq!(json, r#"{"ref":"B1","text":"=A1*2"}"#);

        let parsed: Vec<CellContent> =
            serde_json::from_str(r#"[{"ref": "c3", "text": "7"}]"#).unwrap();
        assert_eq!(parsed, vec![CellContent::new(CellReference::new(2, 2), "7")]);
    }
}
