//! FILENAME: tabular/src/numeric.rs
//! PURPOSE: Lenient number parsing for spreadsheet cells.
//! CONTEXT: Areas arrive as "10,000", occupancy as "45%" or "0.45", and extra
//! columns as whatever the sheet author typed. These helpers are the single
//! place that knows which characters to strip.

use crate::scalar::Scalar;

/// Parses a cell after removing thousands separators ("10,000" -> 10000).
pub fn parse_grouped_number(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Number(n) => finite(*n),
        Scalar::Text(s) => parse_stripped(s, &[',']),
    }
}

/// Parses a cell after removing both `,` and `%` ("12.5%" -> 12.5).
pub fn parse_measure(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Number(n) => finite(*n),
        Scalar::Text(s) => parse_stripped(s, &[',', '%']),
    }
}

/// Parses an occupancy cell into a fraction in `[0, 1]`-ish space.
///
/// Values above 1 are read as percentages ("45" and "45%" both give 0.45);
/// values at or below 1 are already fractions. Negative or unparseable input
/// yields `None`.
pub fn parse_occupancy(value: &Scalar) -> Option<f64> {
    if value.is_blank() {
        return None;
    }
    let n = parse_measure(value)?;
    if n < 0.0 {
        return None;
    }
    Some(if n > 1.0 { n / 100.0 } else { n })
}

fn finite(n: f64) -> Option<f64> {
    n.is_finite().then_some(n)
}

fn parse_stripped(text: &str, strip: &[char]) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| !strip.contains(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().and_then(finite)
}
