//! FILENAME: persistence/src/normalize.rs
//! PURPOSE: Turns decoded rows into a rectangular `Table`.
//! CONTEXT: Both decoders produce plain rows of scalars. The first row names
//! the columns; every later non-blank row becomes a record. Header naming
//! follows the usual sheet-to-records convention (`__EMPTY`, `Name_1`, ...).

use crate::{LoadError, LoadReport};
use rustc_hash::FxHashMap;
use tabular::{Scalar, Table};

const EMPTY_HEADER: &str = "__EMPTY";

pub(crate) fn rows_to_table(rows: Vec<Vec<Scalar>>) -> Result<(Table, LoadReport), LoadError> {
    let mut rows = rows.into_iter();
    let header_row = rows.next().ok_or(LoadError::EmptyFile)?;
    let headers = header_names(&header_row);
    let width = headers.len();

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    let mut widest = width;

    for row in rows {
        report.rows_read += 1;
        if row.iter().all(Scalar::is_blank) {
            report.blank_rows += 1;
            continue;
        }

        // Columns the header row does not name are dropped, not added.
        if let Some(overflow) = row.get(width..) {
            if let Some(last) = overflow.iter().rposition(|c| !c.is_blank()) {
                report.dropped_cells += overflow.iter().filter(|c| !c.is_blank()).count();
                widest = widest.max(width + last + 1);
            }
        }

        records.push(row);
    }
    report.dropped_columns = widest - width;

    if records.is_empty() {
        return Err(LoadError::EmptyFile);
    }
    if width == 0 {
        return Err(LoadError::NoColumns);
    }

    Ok((Table::new(headers, records), report))
}

/// Names every header cell. Blank cells become `__EMPTY`; repeats get a
/// numeric suffix (`Area`, `Area_1`, `Area_2`).
fn header_names(row: &[Scalar]) -> Vec<String> {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    let mut names = Vec::with_capacity(row.len());

    for cell in row {
        let base = if cell.is_blank() {
            EMPTY_HEADER.to_string()
        } else {
            cell.to_text().into_owned()
        };

        let name = match counts.get(&base).copied() {
            None => {
                counts.insert(base.clone(), 1);
                base
            }
            Some(mut counter) => {
                let mut candidate = format!("{}_{}", base, counter);
                counter += 1;
                while counts.contains_key(&candidate) {
                    candidate = format!("{}_{}", base, counter);
                    counter += 1;
                }
                counts.insert(base, counter);
                counts.insert(candidate.clone(), 1);
                candidate
            }
        };
        names.push(name);
    }

    names
}
