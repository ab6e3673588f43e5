//! Entity deduplicator - discovers treatments and products on budget lines.
//!
//! The legacy system never exported its treatment and product catalogs. They
//! only exist as columns repeated on every budget line, so the catalog is
//! rebuilt by collapsing lines onto a business key: the trimmed, lower-cased
//! display name. The first line seen for a name supplies every attribute.

use super::columns::detail as cols;
use super::remap::LegacyId;
use crate::config::DefaultValues;
use crate::core::normalize::{decimal_or, integer_or, optional_text, reference_or, text_or};
use crate::source::Row;
use std::collections::HashMap;
use tracing::{debug, warn};

/// What a budget line refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// The line quotes a treatment
    Treatment(LegacyId),
    /// The line sells a product
    Product(LegacyId),
    /// The line carries neither reference (free-text line)
    Unclassified,
}

impl LineKind {
    /// Classifies a budget line by its reference columns.
    ///
    /// A line carrying both references is treated as a treatment line.
    #[must_use]
    pub fn of(row: &Row) -> Self {
        let treatment = LegacyId::reference(row.get(cols::TREATMENT));
        let product = LegacyId::reference(row.get(cols::PRODUCT));
        match (treatment, product) {
            (Some(treatment), Some(product)) => {
                warn!(
                    "Line references treatment {} and product {}; classifying as treatment",
                    treatment, product
                );
                Self::Treatment(treatment)
            }
            (Some(treatment), None) => Self::Treatment(treatment),
            (None, Some(product)) => Self::Product(product),
            (None, None) => Self::Unclassified,
        }
    }
}

/// A unique treatment discovered on budget lines
#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentDraft {
    /// Legacy id of the line that first named this treatment
    pub legacy_id: LegacyId,
    /// Other legacy ids that collapsed onto the same name
    pub aliases: Vec<LegacyId>,
    /// Display name as first seen
    pub name: String,
    /// Description from the first line
    pub description: String,
    /// Duration in minutes
    pub duration: i64,
    /// Unit price
    pub price: f64,
    /// Owning clinic
    pub clinic_id: i64,
    /// Parent clinic
    pub parent_clinic_id: i64,
    /// Tax type
    pub tax_type_id: i64,
    /// Registration state
    pub registration_state_id: i64,
}

/// A unique product discovered on budget lines
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    /// Legacy id of the line that first named this product
    pub legacy_id: LegacyId,
    /// Other legacy ids that collapsed onto the same name
    pub aliases: Vec<LegacyId>,
    /// Display name as first seen
    pub name: String,
    /// Description from the first line
    pub description: String,
    /// Units in stock
    pub stock: i64,
    /// Unit price
    pub price: f64,
    /// Owning clinic
    pub clinic_id: i64,
    /// Parent clinic
    pub parent_clinic_id: i64,
    /// Tax type
    pub tax_type_id: i64,
    /// Registration state
    pub registration_state_id: i64,
}

/// Result of scanning all budget lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogExtraction {
    /// Unique treatments in first-seen order
    pub treatments: Vec<TreatmentDraft>,
    /// Unique products in first-seen order
    pub products: Vec<ProductDraft>,
    /// Lines that referenced neither a treatment nor a product
    pub unclassified: usize,
}

/// Lower-cased, trimmed name used to collapse duplicates.
#[must_use]
pub fn dedup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Ordered map from dedup key to the draft that owns it.
struct Unique<T> {
    index: HashMap<String, usize>,
    items: Vec<T>,
}

impl<T> Unique<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            items: Vec::new(),
        }
    }

    /// Returns the existing draft for `key`, or inserts the one built by `create`.
    fn entry(&mut self, key: String, create: impl FnOnce() -> T) -> (&mut T, bool) {
        if let Some(&position) = self.index.get(&key) {
            return (&mut self.items[position], false);
        }
        self.index.insert(key, self.items.len());
        self.items.push(create());
        let last = self.items.len() - 1;
        (&mut self.items[last], true)
    }
}

fn add_alias(legacy_id: &LegacyId, aliases: &mut Vec<LegacyId>, alias: LegacyId) {
    if &alias != legacy_id && !aliases.contains(&alias) {
        aliases.push(alias);
    }
}

/// Scans budget lines and returns the distinct treatments and products.
///
/// Lines without a display name are named `"Treatment <id>"` / `"Product <id>"`.
#[must_use]
pub fn extract_catalog(rows: &[Row], defaults: &DefaultValues) -> CatalogExtraction {
    let mut treatments = Unique::new();
    let mut products = Unique::new();
    let mut unclassified = 0;

    for row in rows {
        match LineKind::of(row) {
            LineKind::Treatment(legacy_id) => {
                let name = optional_text(row.get(cols::TREATMENT_NAME))
                    .unwrap_or_else(|| format!("Treatment {legacy_id}"));
                let (draft, created) = treatments.entry(dedup_key(&name), || {
                    treatment_from_row(row, legacy_id.clone(), name, defaults)
                });
                if !created {
                    debug!("Treatment \"{}\" already seen, skipping line", draft.name);
                    add_alias(&draft.legacy_id, &mut draft.aliases, legacy_id);
                }
            }
            LineKind::Product(legacy_id) => {
                let name = optional_text(row.get(cols::PRODUCT_NAME))
                    .unwrap_or_else(|| format!("Product {legacy_id}"));
                let (draft, created) = products.entry(dedup_key(&name), || {
                    product_from_row(row, legacy_id.clone(), name, defaults)
                });
                if !created {
                    debug!("Product \"{}\" already seen, skipping line", draft.name);
                    add_alias(&draft.legacy_id, &mut draft.aliases, legacy_id);
                }
            }
            LineKind::Unclassified => unclassified += 1,
        }
    }

    if unclassified > 0 {
        warn!(
            "{} budget lines reference neither a treatment nor a product",
            unclassified
        );
    }

    CatalogExtraction {
        treatments: treatments.items,
        products: products.items,
        unclassified,
    }
}

fn treatment_from_row(
    row: &Row,
    legacy_id: LegacyId,
    name: String,
    defaults: &DefaultValues,
) -> TreatmentDraft {
    TreatmentDraft {
        legacy_id,
        aliases: Vec::new(),
        name,
        description: text_or(row.get(cols::TREATMENT_DESCRIPTION), ""),
        duration: integer_or(row.get(cols::DURATION), defaults.treatment_duration),
        price: decimal_or(row.get(cols::PRICE), 0.0),
        clinic_id: reference_or(row.get(cols::CLINIC), defaults.clinic_id),
        parent_clinic_id: reference_or(row.get(cols::PARENT_CLINIC), defaults.parent_clinic_id),
        tax_type_id: reference_or(row.get(cols::TAX_TYPE), defaults.tax_type_id),
        registration_state_id: defaults.registration_state_id,
    }
}

fn product_from_row(
    row: &Row,
    legacy_id: LegacyId,
    name: String,
    defaults: &DefaultValues,
) -> ProductDraft {
    ProductDraft {
        legacy_id,
        aliases: Vec::new(),
        name,
        description: text_or(row.get(cols::PRODUCT_DESCRIPTION), ""),
        stock: integer_or(row.get(cols::STOCK), 0),
        price: decimal_or(row.get(cols::PRICE), 0.0),
        clinic_id: reference_or(row.get(cols::CLINIC), defaults.clinic_id),
        parent_clinic_id: reference_or(row.get(cols::PARENT_CLINIC), defaults.parent_clinic_id),
        tax_type_id: reference_or(row.get(cols::TAX_TYPE), defaults.tax_type_id),
        registration_state_id: defaults.registration_state_id,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn treatment_line(id: i64, name: &str, price: &str) -> Row {
        Row::new()
            .with("id_tratamiento", id)
            .with("nombre_tratamiento", name)
            .with("precio", price)
    }

    #[test]
    fn test_classify_lines() {
        let treatment = Row::new().with("id_tratamiento", 3_i64);
        let product = Row::new().with("id_producto", "P7");
        let both = Row::new().with("id_tratamiento", 3_i64).with("id_producto", 4_i64);
        let neither = Row::new().with("id_tratamiento", 0_i64).with("descripcion", "x");

        assert_eq!(LineKind::of(&treatment), LineKind::Treatment(LegacyId::new("3")));
        assert_eq!(LineKind::of(&product), LineKind::Product(LegacyId::new("P7")));
        assert_eq!(LineKind::of(&both), LineKind::Treatment(LegacyId::new("3")));
        assert_eq!(LineKind::of(&neither), LineKind::Unclassified);
    }

    #[test]
    fn test_csv_and_workbook_zero_references_classify_alike() {
        let workbook = Row::new().with("id_tratamiento", 0_i64).with("id_producto", 5_i64);
        let csv = Row::new().with("id_tratamiento", "0").with("id_producto", "5");

        assert_eq!(LineKind::of(&workbook), LineKind::Product(LegacyId::new("5")));
        assert_eq!(LineKind::of(&csv), LineKind::of(&workbook));

        let catalog = extract_catalog(&[csv], &DefaultValues::default());
        assert!(catalog.treatments.is_empty());
        assert_eq!(catalog.products.len(), 1);
        assert_eq!(catalog.products[0].legacy_id, LegacyId::new("5"));
    }

    #[test]
    fn test_duplicate_names_collapse_case_insensitively() {
        let rows = vec![
            treatment_line(1, "Cleaning", "40"),
            treatment_line(2, "  cleaning ", "55"),
            treatment_line(1, "Cleaning", "40"),
            treatment_line(3, "Whitening", "120"),
        ];

        let catalog = extract_catalog(&rows, &DefaultValues::default());
        assert_eq!(catalog.treatments.len(), 2);

        let cleaning = &catalog.treatments[0];
        assert_eq!(cleaning.name, "Cleaning");
        assert_eq!(cleaning.legacy_id, LegacyId::new("1"));
        // First-seen attributes win
        assert_eq!(cleaning.price, 40.0);
        assert_eq!(cleaning.aliases, vec![LegacyId::new("2")]);

        assert_eq!(catalog.treatments[1].name, "Whitening");
        assert!(catalog.treatments[1].aliases.is_empty());
    }

    #[test]
    fn test_unnamed_entities_get_synthesized_names() {
        let rows = vec![
            Row::new().with("id_tratamiento", 9_i64),
            Row::new().with("id_producto", 4_i64).with("stock", "12"),
        ];

        let catalog = extract_catalog(&rows, &DefaultValues::default());
        assert_eq!(catalog.treatments[0].name, "Treatment 9");
        assert_eq!(catalog.treatments[0].duration, 30);
        assert_eq!(catalog.products[0].name, "Product 4");
        assert_eq!(catalog.products[0].stock, 12);
    }

    #[test]
    fn test_unclassified_lines_are_counted() {
        let rows = vec![
            Row::new().with("descripcion", "Consulta"),
            Row::new().with("id_producto", 1_i64).with("nombre_producto", "Floss"),
            Row::new().with("id_presupuesto", 5_i64),
        ];

        let catalog = extract_catalog(&rows, &DefaultValues::default());
        assert!(catalog.treatments.is_empty());
        assert_eq!(catalog.products.len(), 1);
        assert_eq!(catalog.unclassified, 2);
    }

    #[test]
    fn test_treatment_and_product_namespaces_are_separate() {
        let rows = vec![
            treatment_line(1, "Kit", "10"),
            Row::new().with("id_producto", 1_i64).with("nombre_producto", "Kit"),
        ];

        let catalog = extract_catalog(&rows, &DefaultValues::default());
        assert_eq!(catalog.treatments.len(), 1);
        assert_eq!(catalog.products.len(), 1);
        assert_eq!(catalog.products[0].clinic_id, 63);
        assert_eq!(catalog.products[0].tax_type_id, 1);
    }
}
