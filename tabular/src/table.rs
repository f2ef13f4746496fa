//! FILENAME: tabular/src/table.rs
//! PURPOSE: The normalized table: ordered headers plus records keyed by them.
//! CONTEXT: Created once per file load, then mutated one cell at a time by
//! the table editor. Everything derived from it (aggregation tree, sorted
//! view) is recomputed from scratch, never patched.

use crate::scalar::Scalar;
use rustc_hash::{FxHashMap, FxHasher};
use serde::Serialize;
use std::hash::{Hash, Hasher};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Row {row} is out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

// ============================================================================
// RECORD
// ============================================================================

/// One data row. Cells are stored in header order, so a record always has
/// exactly the table's key set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    cells: Vec<Scalar>,
}

impl Record {
    pub fn cells(&self) -> &[Scalar] {
        &self.cells
    }

    pub fn get(&self, column: usize) -> Option<&Scalar> {
        self.cells.get(column)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn replace(&mut self, column: usize, value: Scalar) -> Option<Scalar> {
        self.cells
            .get_mut(column)
            .map(|slot| std::mem::replace(slot, value))
    }
}

// ============================================================================
// TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    headers: Vec<String>,
    records: Vec<Record>,
    #[serde(skip)]
    index: FxHashMap<String, usize>,
}

impl Table {
    /// Builds a table from header names and raw rows. Short rows are padded
    /// with empty text; cells past the last header are discarded.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Scalar>>) -> Self {
        let width = headers.len();
        let records = rows
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, Scalar::empty());
                Record { cells }
            })
            .collect();

        let mut index = FxHashMap::default();
        for (i, header) in headers.iter().enumerate() {
            index.entry(header.clone()).or_insert(i);
        }

        Table {
            headers,
            records,
            index,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, row: usize) -> Option<&Record> {
        self.records.get(row)
    }

    /// Number of records (data rows, header excluded).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Scalar> {
        self.records.get(row).and_then(|r| r.get(column))
    }

    /// Looks a cell up by header name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Scalar> {
        self.column_index(column).and_then(|c| self.cell(row, c))
    }

    /// Applies an edit from the table editor and returns the previous value.
    ///
    /// The typed text goes through `Scalar::from_input`; no other
    /// normalization happens on this path.
    pub fn set_cell(&mut self, row: usize, column: &str, input: &str) -> Result<Scalar, EditError> {
        let col = self
            .column_index(column)
            .ok_or_else(|| EditError::UnknownColumn(column.to_string()))?;
        let len = self.records.len();
        let record = self
            .records
            .get_mut(row)
            .ok_or(EditError::RowOutOfRange { row, len })?;

        record
            .replace(col, Scalar::from_input(input))
            .ok_or_else(|| EditError::UnknownColumn(column.to_string()))
    }

    pub(crate) fn replace_cell(&mut self, row: usize, column: usize, value: Scalar) -> Option<Scalar> {
        self.records
            .get_mut(row)
            .and_then(|r| r.replace(column, value))
    }

    /// Hash over headers and every cell. Used as the memo key for derived
    /// trees, so any edit changes it.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.headers.hash(&mut hasher);
        self.records.len().hash(&mut hasher);
        for record in &self.records {
            for cell in &record.cells {
                cell.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}
