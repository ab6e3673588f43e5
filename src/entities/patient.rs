//! Patient entity - A person registered at one of the clinics.
//!
//! Patients are created once per legacy patient row and carry the legacy
//! identifier in `old_id` for traceability.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Patient database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "patients")]
pub struct Model {
    /// Unique identifier for the patient
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Given name
    pub name: String,
    /// Family name(s)
    pub surname: String,
    /// Contact email, if known
    pub email: Option<String>,
    /// Contact phone number
    pub phone: String,
    /// Date of birth, if known
    pub birth_date: Option<Date>,
    /// Reference to the sex lookup table
    pub sex_id: Option<i64>,
    /// Street address
    pub address: Option<String>,
    /// City of residence
    pub city: Option<String>,
    /// Clinic the patient belongs to
    pub clinic_id: i64,
    /// Postal code (`"0"` when unknown)
    pub postal_code: String,
    /// Tax / fiscal identifier (`"0"` when unknown)
    pub tax_id: String,
    /// Who referred the patient
    pub referred_by: Option<String>,
    /// Parent clinic group
    pub parent_clinic_id: i64,
    /// Registration state (active / archived)
    pub registration_state_id: i64,
    /// Whether the patient accepted the data-protection consent
    pub consent_accepted: bool,
    /// Identifier in the legacy system
    pub old_id: String,
    /// Date the patient was registered
    pub intake_date: Date,
    /// Tag of whoever created the record
    pub created_by: String,
}

/// Defines relationships between Patient and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One patient has many budgets
    #[sea_orm(has_many = "super::budget::Entity")]
    Budgets,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
