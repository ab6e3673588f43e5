//! Per-entity counters and the end-of-run summary.

use super::orchestrator::MigrationPhase;
use std::fmt;

/// What happened to the rows of one entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    /// Rows (or unique entities) offered to the stage
    pub read: usize,
    /// Rows stored
    pub inserted: usize,
    /// Rows skipped because a required reference did not resolve
    pub skipped: usize,
    /// Rows the store rejected
    pub failed: usize,
}

impl StageCounts {
    pub(crate) fn with_read(read: usize) -> Self {
        Self {
            read,
            ..Self::default()
        }
    }
}

impl fmt::Display for StageCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted / {} read ({} skipped, {} failed)",
            self.inserted, self.read, self.skipped, self.failed
        )
    }
}

/// Outcome of a migration run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Stage 1
    pub patients: StageCounts,
    /// Stage 2, treatments
    pub treatments: StageCounts,
    /// Stage 2, products
    pub products: StageCounts,
    /// Stage 3
    pub budgets: StageCounts,
    /// Stage 4
    pub budget_details: StageCounts,
    /// Budget lines that referenced neither a treatment nor a product
    pub unclassified_lines: usize,
    /// Whether the transaction was committed
    pub committed: bool,
    /// Phase the migrator finished in
    pub final_phase: MigrationPhase,
}

impl MigrationReport {
    /// Total rows stored across all five tables
    #[must_use]
    pub const fn total_inserted(&self) -> usize {
        self.patients.inserted
            + self.treatments.inserted
            + self.products.inserted
            + self.budgets.inserted
            + self.budget_details.inserted
    }

    /// Total rows the store rejected
    #[must_use]
    pub const fn total_failed(&self) -> usize {
        self.patients.failed
            + self.treatments.failed
            + self.products.failed
            + self.budgets.failed
            + self.budget_details.failed
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.committed {
            "committed"
        } else {
            "rolled back"
        };
        writeln!(
            f,
            "Migration {} - {} rows inserted, {} failed",
            outcome,
            self.total_inserted(),
            self.total_failed()
        )?;
        writeln!(f, "  Patients:       {}", self.patients)?;
        writeln!(f, "  Treatments:     {}", self.treatments)?;
        writeln!(f, "  Products:       {}", self.products)?;
        writeln!(f, "  Budgets:        {}", self.budgets)?;
        write!(f, "  Budget details: {}", self.budget_details)?;
        if self.unclassified_lines > 0 {
            write!(
                f,
                "\n  {} budget lines had neither a treatment nor a product",
                self.unclassified_lines
            )?;
        }
        Ok(())
    }
}
