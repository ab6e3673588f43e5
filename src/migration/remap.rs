//! Legacy-id to new-id lookup tables.
//!
//! A remap lives for exactly one run. Stages receive the tables they read by
//! reference and hand back the tables they populate by value.

use crate::core::normalize::number_or;
use crate::source::CellValue;
use std::collections::HashMap;
use std::fmt;

/// Primary key of a record in the legacy system, kept as text.
///
/// Numeric cells are rendered the way they print (`10.0` becomes `"10"`), so a
/// key read as a number in one export matches the same key read as text in
/// another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegacyId(String);

impl LegacyId {
    /// Creates a legacy id from its text form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    /// Legacy id held by a cell, `None` when the cell is missing or blank.
    #[must_use]
    pub fn from_cell(value: Option<&CellValue>) -> Option<Self> {
        value
            .and_then(CellValue::as_text)
            .map(Self::new)
            .filter(|id| !id.0.is_empty())
    }

    /// Like [`LegacyId::from_cell`], but any cell reading as the number zero
    /// also counts as no reference (the legacy system used `0` for "none").
    ///
    /// Text cells are checked too, so `"0"` from a CSV export and `0` from a
    /// workbook resolve the same way.
    #[must_use]
    pub fn reference(value: Option<&CellValue>) -> Option<Self> {
        if number_or(value, f64::NAN) == 0.0 {
            return None;
        }
        Self::from_cell(value)
    }

    /// Text form of the id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LegacyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookup from legacy id to the id generated by the target store.
///
/// Entries are only ever added. Recording the same legacy id twice keeps the
/// latest new id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdRemap {
    entries: HashMap<LegacyId, i64>,
}

impl IdRemap {
    /// Creates an empty remap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `legacy` now lives at `new_id`.
    pub fn record(&mut self, legacy: LegacyId, new_id: i64) {
        self.entries.insert(legacy, new_id);
    }

    /// New id for `legacy`, if it was migrated.
    #[must_use]
    pub fn resolve(&self, legacy: &LegacyId) -> Option<i64> {
        self.entries.get(legacy).copied()
    }

    /// Number of distinct legacy ids recorded
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The four remaps a run threads between its stages.
#[derive(Debug, Clone, Default)]
pub struct RemapTables {
    /// Patients, filled by the patient stage
    pub patients: IdRemap,
    /// Treatments, filled by the catalog stage
    pub treatments: IdRemap,
    /// Products, filled by the catalog stage
    pub products: IdRemap,
    /// Budgets, filled by the budget stage
    pub budgets: IdRemap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_text_ids_match() {
        let from_float = LegacyId::from_cell(Some(&CellValue::Float(10.0)));
        let from_text = LegacyId::from_cell(Some(&CellValue::from(" 10 ")));
        assert_eq!(from_float, from_text);
        assert_eq!(from_float.map(|id| id.to_string()), Some("10".to_string()));
    }

    #[test]
    fn test_zero_is_not_a_reference() {
        assert_eq!(LegacyId::reference(Some(&CellValue::Int(0))), None);
        assert_eq!(LegacyId::reference(Some(&CellValue::Empty)), None);
        assert_eq!(LegacyId::reference(None), None);
        assert_eq!(
            LegacyId::reference(Some(&CellValue::Int(5))),
            Some(LegacyId::new("5"))
        );
    }

    #[test]
    fn test_text_zero_is_not_a_reference() {
        assert_eq!(LegacyId::reference(Some(&CellValue::from("0"))), None);
        assert_eq!(LegacyId::reference(Some(&CellValue::from(" 0.0 "))), None);
        assert_eq!(LegacyId::reference(Some(&CellValue::Float(0.0))), None);
        assert_eq!(
            LegacyId::reference(Some(&CellValue::from("10"))),
            Some(LegacyId::new("10"))
        );
        assert_eq!(
            LegacyId::reference(Some(&CellValue::from("A-07"))),
            Some(LegacyId::new("A-07"))
        );
    }

    #[test]
    fn test_remap_last_write_wins() {
        let mut remap = IdRemap::new();
        assert!(remap.is_empty());

        remap.record(LegacyId::new("7"), 1);
        remap.record(LegacyId::new("7"), 2);
        remap.record(LegacyId::new("8"), 3);

        assert_eq!(remap.len(), 2);
        assert_eq!(remap.resolve(&LegacyId::new("7")), Some(2));
        assert_eq!(remap.resolve(&LegacyId::new("9")), None);
    }
}
