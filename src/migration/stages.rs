//! The four migration stages.
//!
//! Every stage runs against whatever connection it is handed, which in
//! practice is the run's single open transaction. Insert errors are split in
//! two: [`is_fatal`] errors abort the stage and surface as
//! [`Error::StageFailed`]; anything else is logged with the offending row and
//! the stage moves on.

use super::Stage;
use super::dedup::{CatalogExtraction, ProductDraft, TreatmentDraft, extract_catalog};
use super::records::{BudgetDraft, DetailDraft, PatientDraft};
use super::remap::{IdRemap, LegacyId, RemapTables};
use super::report::StageCounts;
use crate::config::{DefaultValues, DuplicateLinking};
use crate::entities::{product, treatment};
use crate::errors::{Error, Result};
use crate::source::Row;
use chrono::NaiveDateTime;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, RuntimeErr, Set, sqlx};
use tracing::{error, info, instrument, warn};

/// Database error codes that mean the transaction itself is gone:
/// serialization failure and deadlock (SQLSTATE), plus `SQLite` BUSY/LOCKED
/// and their extended codes (`BUSY_RECOVERY`, `BUSY_SNAPSHOT`, `BUSY_TIMEOUT`,
/// `LOCKED_SHAREDCACHE`, `LOCKED_VTAB`).
const FATAL_CODES: &[&str] = &["40001", "40P01", "5", "6", "261", "517", "773", "262", "518"];

/// Settings shared by every stage of one run
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    /// Values substituted for missing fields
    pub defaults: &'a DefaultValues,
    /// How duplicate treatment/product ids are remapped
    pub linking: DuplicateLinking,
    /// Start of the run; stands in for "now" wherever a default date is needed
    pub started_at: NaiveDateTime,
}

/// Whether an insert error means the connection or transaction is lost.
#[must_use]
pub fn is_fatal(err: &DbErr) -> bool {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
        DbErr::Exec(RuntimeErr::SqlxError(inner)) | DbErr::Query(RuntimeErr::SqlxError(inner)) => {
            is_fatal_sqlx(inner)
        }
        _ => false,
    }
}

fn is_fatal_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| is_fatal_code(&code)),
        _ => false,
    }
}

fn is_fatal_code(code: &str) -> bool {
    FATAL_CODES.contains(&code)
}

/// Returns the error back for row-level handling, or aborts the stage.
fn escalate(stage: Stage, err: DbErr) -> Result<DbErr> {
    if is_fatal(&err) {
        error!("Stage {} hit a fatal database error: {}", stage, err);
        Err(Error::StageFailed { stage, source: err })
    } else {
        Ok(err)
    }
}

/// Stage 1: inserts every patient row and records its new id.
///
/// # Errors
/// Returns [`Error::StageFailed`] when the connection or transaction is lost.
#[instrument(skip_all, fields(rows = rows.len()))]
pub async fn migrate_patients<C: ConnectionTrait>(
    db: &C,
    rows: &[Row],
    ctx: &StageContext<'_>,
) -> Result<(IdRemap, StageCounts)> {
    let mut remap = IdRemap::new();
    let mut counts = StageCounts::with_read(rows.len());

    for row in rows {
        let PatientDraft { old_id, model } = PatientDraft::from_row(row, ctx.defaults, ctx.started_at);
        match model.insert(db).await {
            Ok(saved) => {
                info!("Migrated patient {} -> {}", old_id, saved.id);
                remap.record(old_id, saved.id);
                counts.inserted += 1;
            }
            Err(err) => {
                let err = escalate(Stage::Patients, err)?;
                error!("Failed to migrate patient {}: {} | row: {}", old_id, err, row);
                counts.failed += 1;
            }
        }
    }

    info!("Patients: {}", counts);
    Ok((remap, counts))
}

/// Remaps and counts produced by the catalog stage
#[derive(Debug, Clone, Default)]
pub struct CatalogOutcome {
    /// Legacy treatment ids to new ids
    pub treatments: IdRemap,
    /// Legacy product ids to new ids
    pub products: IdRemap,
    /// Counts for distinct treatments
    pub treatment_counts: StageCounts,
    /// Counts for distinct products
    pub product_counts: StageCounts,
    /// Budget lines that named neither a treatment nor a product
    pub unclassified: usize,
}

fn record_with_aliases(
    remap: &mut IdRemap,
    legacy_id: LegacyId,
    aliases: Vec<LegacyId>,
    new_id: i64,
    linking: DuplicateLinking,
) {
    if linking == DuplicateLinking::AllAliases {
        for alias in aliases {
            remap.record(alias, new_id);
        }
    }
    remap.record(legacy_id, new_id);
}

/// Stage 2: discovers treatments and products on the budget lines and
/// inserts one record per distinct name.
///
/// # Errors
/// Returns [`Error::StageFailed`] when the connection or transaction is lost.
#[instrument(skip_all, fields(rows = detail_rows.len()))]
pub async fn migrate_catalog<C: ConnectionTrait>(
    db: &C,
    detail_rows: &[Row],
    ctx: &StageContext<'_>,
) -> Result<CatalogOutcome> {
    let CatalogExtraction {
        treatments,
        products,
        unclassified,
    } = extract_catalog(detail_rows, ctx.defaults);
    info!(
        "Found {} unique treatments and {} unique products",
        treatments.len(),
        products.len()
    );

    let mut outcome = CatalogOutcome {
        treatment_counts: StageCounts::with_read(treatments.len()),
        product_counts: StageCounts::with_read(products.len()),
        unclassified,
        ..CatalogOutcome::default()
    };

    for draft in treatments {
        let TreatmentDraft {
            legacy_id,
            aliases,
            name,
            description,
            duration,
            price,
            clinic_id,
            parent_clinic_id,
            tax_type_id,
            registration_state_id,
        } = draft;
        let model = treatment::ActiveModel {
            name: Set(name.clone()),
            description: Set(description),
            duration: Set(duration),
            price: Set(price),
            clinic_id: Set(clinic_id),
            parent_clinic_id: Set(parent_clinic_id),
            tax_type_id: Set(tax_type_id),
            registration_state_id: Set(registration_state_id),
            ..Default::default()
        };
        match model.insert(db).await {
            Ok(saved) => {
                info!("Migrated treatment \"{}\" ({}) -> {}", name, legacy_id, saved.id);
                record_with_aliases(&mut outcome.treatments, legacy_id, aliases, saved.id, ctx.linking);
                outcome.treatment_counts.inserted += 1;
            }
            Err(err) => {
                let err = escalate(Stage::Catalog, err)?;
                error!("Failed to migrate treatment \"{}\" ({}): {}", name, legacy_id, err);
                outcome.treatment_counts.failed += 1;
            }
        }
    }

    for draft in products {
        let ProductDraft {
            legacy_id,
            aliases,
            name,
            description,
            stock,
            price,
            clinic_id,
            parent_clinic_id,
            tax_type_id,
            registration_state_id,
        } = draft;
        let model = product::ActiveModel {
            name: Set(name.clone()),
            description: Set(description),
            stock: Set(stock),
            price: Set(price),
            clinic_id: Set(clinic_id),
            parent_clinic_id: Set(parent_clinic_id),
            tax_type_id: Set(tax_type_id),
            registration_state_id: Set(registration_state_id),
            ..Default::default()
        };
        match model.insert(db).await {
            Ok(saved) => {
                info!("Migrated product \"{}\" ({}) -> {}", name, legacy_id, saved.id);
                record_with_aliases(&mut outcome.products, legacy_id, aliases, saved.id, ctx.linking);
                outcome.product_counts.inserted += 1;
            }
            Err(err) => {
                let err = escalate(Stage::Catalog, err)?;
                error!("Failed to migrate product \"{}\" ({}): {}", name, legacy_id, err);
                outcome.product_counts.failed += 1;
            }
        }
    }

    info!(
        "Treatments: {} | Products: {}",
        outcome.treatment_counts, outcome.product_counts
    );
    Ok(outcome)
}

/// Stage 3: inserts budgets whose patient was migrated.
///
/// Budgets whose patient does not resolve are skipped with a warning.
///
/// # Errors
/// Returns [`Error::StageFailed`] when the connection or transaction is lost.
#[instrument(skip_all, fields(rows = rows.len()))]
pub async fn migrate_budgets<C: ConnectionTrait>(
    db: &C,
    rows: &[Row],
    patients: &IdRemap,
    ctx: &StageContext<'_>,
) -> Result<(IdRemap, StageCounts)> {
    let mut remap = IdRemap::new();
    let mut counts = StageCounts::with_read(rows.len());

    for row in rows {
        let BudgetDraft {
            old_id,
            patient,
            mut model,
        } = BudgetDraft::from_row(row, ctx.defaults, ctx.started_at);

        let Some(patient_id) = patient.as_ref().and_then(|legacy| patients.resolve(legacy)) else {
            warn!(
                "Budget {} skipped: patient {} was not migrated",
                old_id,
                patient.as_ref().map_or("<none>", LegacyId::as_str)
            );
            counts.skipped += 1;
            continue;
        };
        model.patient_id = Set(patient_id);

        match model.insert(db).await {
            Ok(saved) => {
                info!("Migrated budget {} -> {}", old_id, saved.id);
                remap.record(old_id, saved.id);
                counts.inserted += 1;
            }
            Err(err) => {
                let err = escalate(Stage::Budgets, err)?;
                error!("Failed to migrate budget {}: {} | row: {}", old_id, err, row);
                counts.failed += 1;
            }
        }
    }

    info!("Budgets: {}", counts);
    Ok((remap, counts))
}

/// Resolves an optional treatment/product link, warning when it dangles.
fn resolve_link(kind: &str, detail: &LegacyId, legacy: Option<&LegacyId>, remap: &IdRemap) -> Option<i64> {
    let legacy = legacy?;
    let resolved = remap.resolve(legacy);
    if resolved.is_none() {
        warn!(
            "Budget line {}: {} {} was not migrated, leaving the link empty",
            detail, kind, legacy
        );
    }
    resolved
}

/// Stage 4: inserts budget lines whose budget was migrated.
///
/// Lines whose budget does not resolve are skipped. Unresolved treatment or
/// product links are left empty and the line is still inserted.
///
/// # Errors
/// Returns [`Error::StageFailed`] when the connection or transaction is lost.
#[instrument(skip_all, fields(rows = rows.len()))]
pub async fn migrate_budget_details<C: ConnectionTrait>(
    db: &C,
    rows: &[Row],
    remaps: &RemapTables,
    ctx: &StageContext<'_>,
) -> Result<StageCounts> {
    let mut counts = StageCounts::with_read(rows.len());

    for row in rows {
        let DetailDraft {
            old_id,
            budget,
            treatment,
            product,
            mut model,
        } = DetailDraft::from_row(row, ctx.defaults);

        let Some(budget_id) = budget.as_ref().and_then(|legacy| remaps.budgets.resolve(legacy)) else {
            warn!(
                "Budget line {} skipped: budget {} was not migrated",
                old_id,
                budget.as_ref().map_or("<none>", LegacyId::as_str)
            );
            counts.skipped += 1;
            continue;
        };

        model.budget_id = Set(budget_id);
        model.treatment_id = Set(resolve_link(
            "treatment",
            &old_id,
            treatment.as_ref(),
            &remaps.treatments,
        ));
        model.product_id = Set(resolve_link(
            "product",
            &old_id,
            product.as_ref(),
            &remaps.products,
        ));

        match model.insert(db).await {
            Ok(saved) => {
                info!("Migrated budget line {} -> {}", old_id, saved.id);
                counts.inserted += 1;
            }
            Err(err) => {
                let err = escalate(Stage::BudgetDetails, err)?;
                error!("Failed to migrate budget line {}: {} | row: {}", old_id, err, row);
                counts.failed += 1;
            }
        }
    }

    info!("Budget details: {}", counts);
    Ok(counts)
}
