//! FILENAME: tabular/src/scalar.rs
//! PURPOSE: Defines the value held by a single table cell.
//! CONTEXT: Decoders hand us either numbers or text. A missing cell is empty
//! text, never absent, so every record carries a value for every header.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A cell value as read from the source document or typed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    /// The blank cell.
    pub fn empty() -> Self {
        Scalar::Text(String::new())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Scalar::Text(value.into())
    }

    /// True for text that is empty after trimming. Numbers are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Number(_) => false,
            Scalar::Text(s) => s.trim().is_empty(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(_) => None,
        }
    }

    /// Returns the text form of the cell. Whole numbers print without a
    /// fractional part.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::Number(n) => Cow::Owned(format_plain(*n)),
            Scalar::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// The trimmed text form, used wherever a cell acts as a group label.
    pub fn trimmed(&self) -> String {
        self.to_text().trim().to_string()
    }

    /// Coerces a value typed into the table editor.
    ///
    /// Input that parses as a finite number becomes `Number`; anything else
    /// is kept as trimmed text. Thousands separators are not stripped here,
    /// so "20,000" stays text and is parsed later by the consumers that know
    /// the column's meaning.
    pub fn from_input(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Scalar::empty();
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Scalar::Number(n),
            _ => Scalar::Text(trimmed.to_string()),
        }
    }
}

fn format_plain(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::empty()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Scalar::Number(n) => {
                0u8.hash(state);
                n.to_bits().hash(state);
            }
            Scalar::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_coercion() {
        assert_eq!(Scalar::from_input("42"), Scalar::Number(42.0));
        assert_eq!(Scalar::from_input(" 0.5 "), Scalar::Number(0.5));
        assert_eq!(Scalar::from_input("20,000"), Scalar::text("20,000"));
        assert_eq!(Scalar::from_input("  Park A "), Scalar::text("Park A"));
        assert_eq!(Scalar::from_input("   "), Scalar::empty());
        assert_eq!(Scalar::from_input("NaN"), Scalar::text("NaN"));
        assert_eq!(Scalar::from_input("inf"), Scalar::text("inf"));
    }

    #[test]
    fn blank_detection() {
        assert!(Scalar::empty().is_blank());
        assert!(Scalar::text(" \t").is_blank());
        assert!(!Scalar::Number(0.0).is_blank());
        assert!(!Scalar::text("x").is_blank());
    }

    #[test]
    fn text_form_of_numbers() {
        assert_eq!(Scalar::Number(10000.0).to_text(), "10000");
        assert_eq!(Scalar::Number(0.45).to_text(), "0.45");
        assert_eq!(Scalar::text(" Warsaw ").trimmed(), "Warsaw");
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&vec![Scalar::Number(1.5), Scalar::text("a")]).unwrap();
        assert_eq!(json, r#"[1.5,"a"]"#);
    }
}
