//! Migration orchestrator - runs the four stages inside one transaction.
//!
//! A run moves through `Idle -> Connecting -> InTransaction ->
//! Committing | RollingBack -> Closed`. It always ends in `Closed`, whether the
//! transaction was committed or rolled back. The id remaps are created fresh
//! for each run and passed between stages by value, so nothing outlives it.

use super::remap::RemapTables;
use super::report::MigrationReport;
use super::stages::{
    StageContext, migrate_budget_details, migrate_budgets, migrate_catalog, migrate_patients,
};
use crate::config::database::{create_connection, create_tables};
use crate::config::{MigrationConfig, SourceFiles};
use crate::errors::Result;
use crate::source::{Row, load_rows};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{debug, error, info, instrument, warn};

/// Where a migration run currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MigrationPhase {
    /// Nothing has happened yet
    #[default]
    Idle,
    /// Opening the connection and preparing the schema
    Connecting,
    /// The transaction is open and stages are running
    InTransaction,
    /// All stages finished; committing
    Committing,
    /// A stage failed; discarding everything
    RollingBack,
    /// Connection released; terminal
    Closed,
}

/// Rows read from the three legacy exports
#[derive(Debug, Clone, Default)]
pub struct MigrationInput {
    /// Rows of the patient export
    pub patients: Vec<Row>,
    /// Rows of the budget export
    pub budgets: Vec<Row>,
    /// Rows of the budget line export
    pub budget_details: Vec<Row>,
}

impl MigrationInput {
    /// Reads all three exports. Unreadable files yield no rows.
    #[must_use]
    pub fn load(sources: &SourceFiles) -> Self {
        let input = Self {
            patients: load_rows(&sources.patients),
            budgets: load_rows(&sources.budgets),
            budget_details: load_rows(&sources.budget_details),
        };
        info!(
            "Loaded {} patients, {} budgets, {} budget lines",
            input.patients.len(),
            input.budgets.len(),
            input.budget_details.len()
        );
        input
    }
}

/// Runs migrations and tracks the phases each run goes through
#[derive(Debug)]
pub struct Migrator {
    config: MigrationConfig,
    phase: MigrationPhase,
    transitions: Vec<MigrationPhase>,
}

impl Migrator {
    /// Creates an idle migrator.
    #[must_use]
    pub const fn new(config: MigrationConfig) -> Self {
        Self {
            config,
            phase: MigrationPhase::Idle,
            transitions: Vec::new(),
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> MigrationPhase {
        self.phase
    }

    /// Every phase entered so far, in order
    #[must_use]
    pub fn transitions(&self) -> &[MigrationPhase] {
        &self.transitions
    }

    fn enter(&mut self, phase: MigrationPhase) {
        debug!("Migration phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.transitions.push(phase);
    }

    /// Connects to `database_url`, migrates `input`, and closes the
    /// connection whatever the outcome.
    ///
    /// # Errors
    /// Returns an error if the connection or schema setup fails, or if a stage
    /// failed and the transaction was rolled back.
    pub async fn run(&mut self, database_url: &str, input: &MigrationInput) -> Result<MigrationReport> {
        self.enter(MigrationPhase::Connecting);
        let db = match create_connection(database_url).await {
            Ok(db) => db,
            Err(e) => {
                error!("Failed to connect to the database: {}", e);
                self.enter(MigrationPhase::Closed);
                return Err(e);
            }
        };

        let result = self.execute(&db, input).await;
        if let Err(e) = db.close().await {
            warn!("Failed to close the database connection: {}", e);
        }
        self.finish(result)
    }

    /// Migrates `input` over a connection the caller owns and will close.
    ///
    /// # Errors
    /// Same as [`Migrator::run`], minus connection failures.
    pub async fn run_on(
        &mut self,
        db: &DatabaseConnection,
        input: &MigrationInput,
    ) -> Result<MigrationReport> {
        self.enter(MigrationPhase::Connecting);
        let result = self.execute(db, input).await;
        self.finish(result)
    }

    fn finish(&mut self, result: Result<MigrationReport>) -> Result<MigrationReport> {
        self.enter(MigrationPhase::Closed);
        result.map(|mut report| {
            report.final_phase = self.phase;
            report
        })
    }

    async fn execute(&mut self, db: &DatabaseConnection, input: &MigrationInput) -> Result<MigrationReport> {
        if self.config.create_schema {
            create_tables(db).await?;
        }

        let txn = db.begin().await?;
        self.enter(MigrationPhase::InTransaction);

        let ctx = StageContext {
            defaults: &self.config.defaults,
            linking: self.config.duplicate_linking,
            started_at: chrono::Local::now().naive_local(),
        };
        let outcome = run_stages(&txn, input, &ctx).await;

        match outcome {
            Ok(mut report) => {
                self.enter(MigrationPhase::Committing);
                txn.commit()
                    .await
                    .inspect_err(|e| error!("Failed to commit the migration: {}", e))?;
                report.committed = true;
                info!("Migration committed");
                Ok(report)
            }
            Err(e) => {
                self.enter(MigrationPhase::RollingBack);
                error!("Migration failed, rolling back: {}", e);
                if let Err(rollback_err) = txn.rollback().await {
                    error!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Runs the four stages in order on `db`.
///
/// Each stage consumes the remaps produced by the ones before it.
#[instrument(skip_all)]
pub(crate) async fn run_stages<C: ConnectionTrait>(
    db: &C,
    input: &MigrationInput,
    ctx: &StageContext<'_>,
) -> Result<MigrationReport> {
    info!("Stage 1/4: patients");
    let (patients, patient_counts) = migrate_patients(db, &input.patients, ctx).await?;

    info!("Stage 2/4: treatments and products");
    let catalog = migrate_catalog(db, &input.budget_details, ctx).await?;

    info!("Stage 3/4: budgets");
    let (budgets, budget_counts) = migrate_budgets(db, &input.budgets, &patients, ctx).await?;

    info!("Stage 4/4: budget details");
    let remaps = RemapTables {
        patients,
        treatments: catalog.treatments,
        products: catalog.products,
        budgets,
    };
    let detail_counts = migrate_budget_details(db, &input.budget_details, &remaps, ctx).await?;

    Ok(MigrationReport {
        patients: patient_counts,
        treatments: catalog.treatment_counts,
        products: catalog.product_counts,
        budgets: budget_counts,
        budget_details: detail_counts,
        unclassified_lines: catalog.unclassified,
        committed: false,
        final_phase: MigrationPhase::InTransaction,
    })
}
