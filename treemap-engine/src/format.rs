//! FILENAME: treemap-engine/src/format.rs
//! Display text for tiles and tooltips.

use crate::definition::SortCriterion;
use crate::view::SortedNode;
use tabular::{parse_measure, Scalar};

const MAX_FRACTION_DIGITS: usize = 3;

/// Formats with `,` thousands grouping and at most three fraction digits
/// (`12345.6789` -> `12,345.679`).
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    let negative = value < 0.0 && (int_part != "0" || !frac_part.is_empty());
    if negative {
        out.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Formats an extra-column value. Text that reads as a number is reformatted
/// and keeps its `%`; `percent_hint` forces the suffix for such text.
pub fn format_scalar(value: &Scalar, percent_hint: bool) -> String {
    match value {
        Scalar::Number(n) => format_number(*n),
        Scalar::Text(text) => match parse_measure(value) {
            Some(n) => {
                let mut out = format_number(n);
                if text.contains('%') || percent_hint {
                    out.push('%');
                }
                out
            }
            None => text.clone(),
        },
    }
}

/// Occupancy fraction as a one-decimal percentage (`0.8` -> `80.0%`).
pub fn format_occupancy(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// The caption drawn inside a leaf tile for the active criterion.
pub fn tile_caption(node: &SortedNode, criterion: &SortCriterion) -> String {
    match criterion {
        SortCriterion::Value => format!("{} m²", format_number(node.value)),
        SortCriterion::Name => node.label.clone(),
        SortCriterion::Region => node.display_region().unwrap_or_default().to_string(),
        SortCriterion::Extra(column) => node
            .extra_data
            .as_ref()
            .and_then(|extra| extra.non_blank(column))
            .map(|value| format_scalar(value, column.contains('%')))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1,000");
        assert_eq!(format_number(15000.0), "15,000");
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(-2500.5), "-2,500.5");
    }

    #[test]
    fn limits_fraction_digits() {
        assert_eq!(format_number(12345.6789), "12,345.679");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(-0.0001), "0");
    }

    #[test]
    fn scalar_formatting() {
        assert_eq!(format_scalar(&Scalar::Number(1500.0), false), "1,500");
        assert_eq!(format_scalar(&Scalar::text("12.5%"), false), "12.5%");
        assert_eq!(format_scalar(&Scalar::text("2,000"), false), "2,000");
        assert_eq!(format_scalar(&Scalar::text("2000"), true), "2,000%");
        assert_eq!(format_scalar(&Scalar::text("Class A"), true), "Class A");
    }

    #[test]
    fn occupancy_text() {
        assert_eq!(format_occupancy(0.8), "80.0%");
        assert_eq!(format_occupancy(0.456), "45.6%");
    }
}
