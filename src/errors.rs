//! Unified error types for the clinic migration.
//!
//! Row-level problems never reach this type: they are logged and the row is
//! skipped. What surfaces here is either a setup failure (configuration,
//! connection) or a stage-fatal database error that aborts the whole run.

use crate::migration::Stage;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur while configuring or running a migration
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Database error outside of a migration stage (connect, schema, queries)
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Spreadsheet workbook could not be opened or read
    #[error("Spreadsheet error: {message}")]
    Spreadsheet {
        /// Description of the workbook failure
        message: String,
    },

    /// CSV source could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A stage hit a transaction-level failure; the run was rolled back
    #[error("Migration stage `{stage}` failed: {source}")]
    StageFailed {
        /// The stage that was executing
        stage: Stage,
        /// The underlying database error
        #[source]
        source: DbErr,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
