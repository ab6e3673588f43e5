//! Row records keyed by normalized column name.

use super::CellValue;
use std::collections::BTreeMap;
use std::fmt;

/// One record from a legacy export.
///
/// Column names are stored trimmed and lower-cased, so lookups are
/// insensitive to how the export capitalised its headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a header the way rows store their keys.
    #[must_use]
    pub fn normalize_column(name: &str) -> String {
        name.trim_matches('\u{feff}').trim().to_lowercase()
    }

    /// Sets a cell, normalizing the column name.
    pub fn insert(&mut self, column: &str, value: CellValue) {
        self.cells.insert(Self::normalize_column(column), value);
    }

    /// Builder-style [`Row::insert`].
    #[must_use]
    pub fn with(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.insert(column, value.into());
        self
    }

    /// Returns the cell for `column`, or `None` when absent or blank.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .get(&Self::normalize_column(column))
            .filter(|value| !value.is_empty())
    }

    /// Returns the first non-blank cell among `aliases`, in order.
    #[must_use]
    pub fn first_present(&self, aliases: &[&str]) -> Option<&CellValue> {
        aliases.iter().find_map(|alias| self.get(alias))
    }

    /// Whether `column` holds a non-blank value.
    #[must_use]
    pub fn has(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Column names present in the row, in sorted order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Whether every cell is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_empty)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (column, value)) in self.cells.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{column}: {value:?}")?;
        }
        write!(f, "}}")
    }
}
