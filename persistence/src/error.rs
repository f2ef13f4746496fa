//! FILENAME: persistence/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("Unsupported file type: {0} (expected .csv or .xlsx)")]
    UnsupportedFormat(String),

    #[error("Workbook contains no sheets")]
    NoSheets,

    #[error("File is empty or contains no data")]
    EmptyFile,

    #[error("No columns found in file")]
    NoColumns,
}

impl LoadError {
    /// True when the file decoded fine but held no usable table. These get a
    /// dedicated message rather than the generic read failure.
    pub fn is_structural(&self) -> bool {
        matches!(self, LoadError::EmptyFile | LoadError::NoColumns)
    }
}
