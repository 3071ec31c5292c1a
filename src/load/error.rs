//! Ways in which reading the workbook can fail
//!
//! All of them are fatal: no partial dataset is ever handed to the filters.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("cannot open workbook '{}': {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("sheet '{sheet}' not found in workbook")]
    MissingSheet { sheet: String },

    #[error("sheet '{sheet}' has no column '{column}'")]
    MissingColumn { sheet: String, column: String },

    #[error("sheet '{sheet}' row {row}: '{value}' is not a date")]
    BadDate {
        sheet: String,
        row: usize,
        value: String,
    },

    #[error("sheet '{sheet}' row {row}: '{value}' in column '{column}' is not an amount")]
    BadAmount {
        sheet: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("sheet '{sheet}' has no complete billing row")]
    EmptyDataset { sheet: String },
}

impl LoadError {
    /// Short name of the failure
    pub fn label(&self) -> &'static str {
        use LoadError::*;
        match self {
            Open { .. } => "Workbook not readable",
            MissingSheet { .. } => "Missing sheet",
            MissingColumn { .. } => "Missing column",
            BadDate { .. } => "Invalid date",
            BadAmount { .. } => "Invalid amount",
            EmptyDataset { .. } => "Empty calendar",
        }
    }

    /// What message to show to help fix the workbook
    pub fn fix_hint(&self) -> String {
        use LoadError::*;
        match self {
            Open { .. } => "check the path, or pass the workbook as the first argument".to_string(),
            MissingSheet { sheet } => format!("the workbook must contain a sheet named '{}'", sheet),
            MissingColumn { column, .. } => {
                format!("the first row of the sheet must hold the header '{}'", column)
            }
            BadDate { .. } => "write dates as spreadsheet dates, YYYY-MM-DD or DD/MM/YYYY".to_string(),
            BadAmount { .. } => "amounts must be numbers, e.g. 1234.56 or 1.234,56".to_string(),
            EmptyDataset { .. } => {
                "every billing row needs a date, revenue, segment, coordinator and supervisor"
                    .to_string()
            }
        }
    }
}
