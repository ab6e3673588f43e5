//! Legacy clinic data migration.
//!
//! Rows from the three legacy exports are normalized, deduplicated, and
//! inserted in four ordered stages inside a single transaction. See
//! [`Migrator`] for the entry point.

mod columns;
pub mod dedup;
pub mod orchestrator;
pub mod records;
pub mod remap;
pub mod report;
pub mod stages;

use std::fmt;

pub use dedup::{CatalogExtraction, LineKind, ProductDraft, TreatmentDraft, extract_catalog};
pub use orchestrator::{MigrationInput, MigrationPhase, Migrator};
pub use remap::{IdRemap, LegacyId, RemapTables};
pub use report::{MigrationReport, StageCounts};
pub use stages::{StageContext, is_fatal};

/// One of the four ordered migration steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Patient records
    Patients,
    /// Treatments and products discovered on budget lines
    Catalog,
    /// Budgets linked to migrated patients
    Budgets,
    /// Budget lines linked to migrated budgets
    BudgetDetails,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Patients => "patients",
            Self::Catalog => "treatments and products",
            Self::Budgets => "budgets",
            Self::BudgetDetails => "budget details",
        };
        f.write_str(name)
    }
}
