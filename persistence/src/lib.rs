//! FILENAME: persistence/src/lib.rs
//! Parkmap Persistence Module
//!
//! Decodes uploaded CSV and XLSX documents into a normalized `Table`,
//! independent of the source format.

mod csv_reader;
mod error;
mod normalize;
mod xlsx_reader;

pub use error::LoadError;

use serde::Serialize;
use std::path::Path;
use tabular::Table;

// ============================================================================
// SOURCE KIND
// ============================================================================

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Spreadsheet,
}

impl SourceKind {
    /// Accepts `csv` and `xlsx`, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(SourceKind::Csv),
            "xlsx" => Some(SourceKind::Spreadsheet),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

// ============================================================================
// LOAD RESULT
// ============================================================================

/// Counters gathered while normalizing. `dropped_*` cover cells that sat
/// to the right of the last named header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Data rows read, blank ones included.
    pub rows_read: usize,
    pub blank_rows: usize,
    pub dropped_cells: usize,
    pub dropped_columns: usize,
}

/// A successfully normalized document.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Table,
    pub kind: SourceKind,
    pub report: LoadReport,
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Normalizes an in-memory document of the given kind.
pub fn load_bytes(bytes: &[u8], kind: SourceKind) -> Result<LoadedTable, LoadError> {
    let rows = match kind {
        SourceKind::Csv => csv_reader::read_csv_rows(bytes)?,
        SourceKind::Spreadsheet => xlsx_reader::read_xlsx_rows(bytes)?,
    };
    let (table, report) = normalize::rows_to_table(rows)?;

    Ok(LoadedTable {
        table,
        kind,
        report,
    })
}

/// Reads and normalizes a file, inferring its kind from the extension.
pub fn load_path(path: &Path) -> Result<LoadedTable, LoadError> {
    let kind = SourceKind::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.display().to_string()))?;
    let bytes = std::fs::read(path)?;
    load_bytes(&bytes, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tabular::Scalar;

    const SAMPLE: &str = "Country,Prologis Market,Park/Bucket,Building Area,Occupancy %\n\
                          Poland,Warsaw,Park A,\"10,000\",80%\n\
                          ,,Park B,\"5,000\",\n";

    #[test]
    fn source_kind_from_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a/b.CSV")), Some(SourceKind::Csv));
        assert_eq!(SourceKind::from_path(Path::new("book.xlsx")), Some(SourceKind::Spreadsheet));
        assert_eq!(SourceKind::from_path(Path::new("book.xls")), None);
        assert_eq!(SourceKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn csv_bytes_keep_raw_text() {
        let loaded = load_bytes(SAMPLE.as_bytes(), SourceKind::Csv).unwrap();
        let table = &loaded.table;
        assert_eq!(table.width(), 5);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "Building Area"), Some(&Scalar::text("10,000")));
        // No forward fill at this stage.
        assert_eq!(table.value(1, "Country"), Some(&Scalar::empty()));
        assert_eq!(loaded.report.dropped_columns, 0);
    }

    #[test]
    fn empty_csv_is_reported() {
        let err = load_bytes(b"", SourceKind::Csv).unwrap_err();
        assert!(matches!(err, LoadError::EmptyFile));
        assert!(err.is_structural());

        let err = load_bytes(b"Country,Market\n", SourceKind::Csv).unwrap_err();
        assert!(matches!(err, LoadError::EmptyFile));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let loaded = load_path(file.path()).unwrap();
        assert_eq!(loaded.kind, SourceKind::Csv);
        assert_eq!(loaded.table.len(), 2);
    }

    #[test]
    fn rejects_unknown_extension_and_missing_file() {
        let err = load_path(Path::new("report.pdf")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
        assert!(!err.is_structural());

        let dir = tempfile::tempdir().unwrap();
        let err = load_path(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn spreadsheet_bytes_keep_numbers() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in ["Country", "Prologis Market", "Park/Bucket", "Building Area"]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        sheet.write_string(1, 0, "Poland").unwrap();
        sheet.write_string(1, 1, "Warsaw").unwrap();
        sheet.write_string(1, 2, "Park A").unwrap();
        sheet.write_number(1, 3, 10000.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let loaded = load_bytes(&bytes, SourceKind::Spreadsheet).unwrap();
        assert_eq!(loaded.kind, SourceKind::Spreadsheet);
        assert_eq!(loaded.table.value(0, "Building Area"), Some(&Scalar::Number(10000.0)));
    }
}
