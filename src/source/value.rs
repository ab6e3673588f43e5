//! Loosely-typed cell values as they come out of a spreadsheet or CSV export.

use chrono::NaiveDateTime;
use std::fmt;

/// A single cell read from a legacy export.
///
/// Spreadsheet cells keep the type the workbook stored; CSV cells are always
/// `Text` (or `Empty`) and get coerced later by the field normalizer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Blank cell (the legacy `null`)
    #[default]
    Empty,
    /// Boolean cell
    Bool(bool),
    /// Integer cell
    Int(i64),
    /// Floating-point cell
    Float(f64),
    /// Text cell
    Text(String),
    /// Date or date-time cell
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Whether the cell carries no value at all.
    ///
    /// Text made only of whitespace counts as empty; exports pad blank cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering of the value, `None` for blank cells.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            // Whole floats print like integers so `10.0` and `10` are the same legacy id
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
            Self::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::from("   ").is_empty());
        assert!(!CellValue::from("a").is_empty());
        assert!(!CellValue::Int(0).is_empty());
        assert!(!CellValue::Bool(false).is_empty());
    }

    #[test]
    fn test_display_whole_float_as_integer() {
        assert_eq!(CellValue::Float(10.0).to_string(), "10");
        assert_eq!(CellValue::Float(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Int(42).to_string(), "42");
    }

    #[test]
    fn test_as_text() {
        assert_eq!(CellValue::Empty.as_text(), None);
        assert_eq!(CellValue::from("x").as_text(), Some("x".to_string()));
        assert_eq!(CellValue::Int(7).as_text(), Some("7".to_string()));
    }
}
