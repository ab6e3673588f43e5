//! Patient queries - Read access to migrated patients.
//!
//! Only patients in the active registration state are listed. Lookups by id
//! return the patient regardless of state, along with every budget issued to
//! them.

use super::pagination::{Page, PageRequest};
use crate::{
    entities::{Budget, Patient, budget, patient},
    errors::Result,
};
use sea_orm::{PaginatorTrait, QueryOrder, prelude::*};

/// Registration state of records that are in use
pub const ACTIVE_REGISTRATION_STATE: i64 = 1;

/// A patient together with their budgets, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct PatientDetails {
    /// The patient record
    pub patient: patient::Model,
    /// Budgets issued to the patient
    pub budgets: Vec<budget::Model>,
}

/// Lists active patients, newest first.
///
/// The search text is matched against name, surname, email, and phone.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_patients(
    db: &DatabaseConnection,
    request: &PageRequest,
) -> Result<Page<patient::Model>> {
    let mut query = Patient::find()
        .filter(patient::Column::RegistrationStateId.eq(ACTIVE_REGISTRATION_STATE));
    if let Some(condition) = request.search_condition(&[
        patient::Column::Name,
        patient::Column::Surname,
        patient::Column::Email,
        patient::Column::Phone,
    ]) {
        query = query.filter(condition);
    }

    let paginator = query
        .order_by_desc(patient::Column::Id)
        .paginate(db, request.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(request.page_index()).await?;

    Ok(Page {
        items,
        total,
        page: request.page,
        limit: request.limit,
    })
}

/// Retrieves a patient and their budgets, or `None` if no such patient exists.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_patient(db: &DatabaseConnection, patient_id: i64) -> Result<Option<PatientDetails>> {
    let Some(patient) = Patient::find_by_id(patient_id).one(db).await? else {
        return Ok(None);
    };

    let budgets = Budget::find()
        .filter(budget::Column::PatientId.eq(patient.id))
        .order_by_desc(budget::Column::Date)
        .all(db)
        .await?;

    Ok(Some(PatientDetails { patient, budgets }))
}

/// Finds a migrated patient by their legacy id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_patient_by_old_id(
    db: &DatabaseConnection,
    old_id: &str,
) -> Result<Option<patient::Model>> {
    Patient::find()
        .filter(patient::Column::OldId.eq(old_id))
        .one(db)
        .await
        .map_err(Into::into)
}
