//! FILENAME: persistence/src/csv_reader.rs

use crate::LoadError;
use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use tabular::Scalar;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Reads every CSV record as a row of text cells. Rows may differ in width.
pub(crate) fn read_csv_rows(bytes: &[u8]) -> Result<Vec<Vec<Scalar>>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut record = ByteRecord::new();
    let mut rows = Vec::new();

    while reader.read_byte_record(&mut record)? {
        let first_row = rows.is_empty();
        let cells = record
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                // Excel-exported CSVs commonly start with a BOM.
                let field = match field.strip_prefix(UTF8_BOM) {
                    Some(rest) if first_row && idx == 0 => rest,
                    _ => field,
                };
                Scalar::Text(decode_field(field).into_owned())
            })
            .collect();
        rows.push(cells);
    }

    Ok(rows)
}

/// UTF-8 when valid, otherwise Windows-1252.
fn decode_field(field: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(field) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (cow, _, _) = WINDOWS_1252.decode(field);
            cow
        }
    }
}
