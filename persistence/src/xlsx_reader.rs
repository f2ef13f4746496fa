// FILENAME: persistence/src/xlsx_reader.rs

use crate::LoadError;
use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;
use tabular::Scalar;

/// Reads the first worksheet of an XLSX workbook as rows of scalars.
pub(crate) fn read_xlsx_rows(bytes: &[u8]) -> Result<Vec<Vec<Scalar>>, LoadError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or(LoadError::NoSheets)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(data_to_scalar).collect())
        .collect())
}

/// Numeric cells keep their stored value, not their displayed text. A cell
/// holding 1.05 shown as "105%" reads as 1.05, which occupancy parsing then
/// treats as a percentage (0.0105).
fn data_to_scalar(cell: &Data) -> Scalar {
    match cell {
        Data::Empty => Scalar::empty(),
        Data::String(s) => Scalar::Text(s.clone()),
        Data::Float(f) => Scalar::Number(*f),
        Data::Int(i) => Scalar::Number(*i as f64),
        Data::Bool(b) => Scalar::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => Scalar::Text(e.to_string()),
        Data::DateTime(dt) => Scalar::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Scalar::Text(s.clone()),
        Data::DurationIso(s) => Scalar::Text(s.clone()),
    }
}
