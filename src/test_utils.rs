//! Shared test utilities for the clinic migration.
//!
//! This module provides helpers for setting up test databases, building
//! legacy rows the way the exports spell them, and seeding migrated records
//! for the read-side query tests.

use crate::{
    config::DefaultValues,
    entities::{budget, budget_detail, patient, product, treatment},
    errors::Result,
    migration::records::{BudgetDraft, PatientDraft},
    source::Row,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    ExecResult, QueryResult, RuntimeErr, Set, Statement,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes log output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Fixed run start used wherever a test needs "now"
pub fn started_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .unwrap_or_default()
}

/// Patient export row with a legacy id and first name.
pub fn patient_row(old_id: i64, name: &str) -> Row {
    Row::new()
        .with("id_paciente", old_id)
        .with("nombre", name)
        .with("apellido", "Test")
}

/// Budget export row issued to the patient with legacy id `patient`.
pub fn budget_row(old_id: i64, patient: i64) -> Row {
    Row::new()
        .with("id_presupuesto", old_id)
        .with("id_paciente", patient)
        .with("fecha", "2024-01-10")
        .with("monto_total", "100")
}

/// Budget line row belonging to the budget with legacy id `budget`.
///
/// Add `id_tratamiento`/`id_producto` columns with [`Row::with`].
pub fn detail_row(old_id: i64, budget: i64) -> Row {
    Row::new()
        .with("id_detalle_presupuesto", old_id)
        .with("id_presupuesto", budget)
        .with("item", old_id)
}

/// Inserts a patient built from a legacy row with default values.
pub async fn create_test_patient(
    db: &DatabaseConnection,
    old_id: &str,
    name: &str,
) -> Result<patient::Model> {
    let row = Row::new().with("id_paciente", old_id).with("nombre", name);
    let draft = PatientDraft::from_row(&row, &DefaultValues::default(), started_at());
    draft.model.insert(db).await.map_err(Into::into)
}

/// Inserts an open budget dated January 1st of `year`.
pub async fn create_test_budget(
    db: &DatabaseConnection,
    patient_id: i64,
    old_id: &str,
    year: i32,
) -> Result<budget::Model> {
    let row = Row::new()
        .with("id_presupuesto", old_id)
        .with("fecha", format!("{year}-01-01"));
    let mut draft = BudgetDraft::from_row(&row, &DefaultValues::default(), started_at());
    draft.model.patient_id = Set(patient_id);
    draft.model.insert(db).await.map_err(Into::into)
}

/// Inserts an active treatment with default pricing.
pub async fn create_test_treatment(db: &DatabaseConnection, name: &str) -> Result<treatment::Model> {
    let defaults = DefaultValues::default();
    treatment::ActiveModel {
        name: Set(name.to_string()),
        description: Set(format!("{name} treatment")),
        duration: Set(defaults.treatment_duration),
        price: Set(50.0),
        clinic_id: Set(defaults.clinic_id),
        parent_clinic_id: Set(defaults.parent_clinic_id),
        tax_type_id: Set(defaults.tax_type_id),
        registration_state_id: Set(defaults.registration_state_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts an active product with ten units in stock.
pub async fn create_test_product(db: &DatabaseConnection, name: &str) -> Result<product::Model> {
    let defaults = DefaultValues::default();
    product::ActiveModel {
        name: Set(name.to_string()),
        description: Set(String::new()),
        stock: Set(10),
        price: Set(5.0),
        clinic_id: Set(defaults.clinic_id),
        parent_clinic_id: Set(defaults.parent_clinic_id),
        tax_type_id: Set(defaults.tax_type_id),
        registration_state_id: Set(defaults.registration_state_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a one-unit budget line, optionally linked to a treatment.
pub async fn create_test_line(
    db: &DatabaseConnection,
    budget_id: i64,
    line_number: i64,
    treatment_id: Option<i64>,
) -> Result<budget_detail::Model> {
    budget_detail::ActiveModel {
        budget_id: Set(budget_id),
        treatment_id: Set(treatment_id),
        product_id: Set(None),
        line_number: Set(line_number),
        description: Set(format!("Line {line_number}")),
        quantity: Set(1.0),
        unit_price: Set(50.0),
        discount: Set(0.0),
        tax_type_id: Set(1),
        line_total: Set(50.0),
        old_id: Set(line_number.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Connection wrapper that loses the connection after a number of writes.
///
/// Reads always pass through, so inserts that succeed still return their row.
pub struct FlakyConnection<'a> {
    inner: &'a DatabaseTransaction,
    remaining_writes: AtomicUsize,
}

impl<'a> FlakyConnection<'a> {
    /// Allows `writes` statements through before every further write fails.
    pub const fn new(inner: &'a DatabaseTransaction, writes: usize) -> Self {
        Self {
            inner,
            remaining_writes: AtomicUsize::new(writes),
        }
    }

    fn take_write(&self) -> std::result::Result<(), DbErr> {
        self.remaining_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .map(|_| ())
            .map_err(|_| DbErr::Conn(RuntimeErr::Internal("connection lost".to_string())))
    }
}

#[async_trait::async_trait]
impl ConnectionTrait for FlakyConnection<'_> {
    fn get_database_backend(&self) -> DbBackend {
        self.inner.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> std::result::Result<ExecResult, DbErr> {
        self.take_write()?;
        self.inner.execute(stmt).await
    }

    async fn execute_unprepared(&self, sql: &str) -> std::result::Result<ExecResult, DbErr> {
        self.take_write()?;
        self.inner.execute_unprepared(sql).await
    }

    async fn query_one(&self, stmt: Statement) -> std::result::Result<Option<QueryResult>, DbErr> {
        self.inner.query_one(stmt).await
    }

    async fn query_all(&self, stmt: Statement) -> std::result::Result<Vec<QueryResult>, DbErr> {
        self.inner.query_all(stmt).await
    }
}
