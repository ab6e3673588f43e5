//! Budget entity - A quote issued to a patient.
//!
//! Each budget belongs to exactly one patient and owns its detail lines.
//! Amounts are tracked as total, paid, and outstanding.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Patient the budget was issued to
    pub patient_id: i64,
    /// Parent clinic group
    pub parent_clinic_id: i64,
    /// Issuing clinic
    pub clinic_id: i64,
    /// When the budget was issued
    pub date: DateTime,
    /// Link to the rendered document
    pub document_url: String,
    /// Total amount quoted
    pub total_amount: f64,
    /// Amount already paid
    pub paid_amount: f64,
    /// Amount still owed
    pub outstanding_balance: f64,
    /// Budget status (open, accepted, ...)
    pub status_id: i64,
    /// Payment method
    pub payment_type_id: i64,
    /// Identifier in the legacy system
    pub old_id: String,
    /// Registration state (active / archived)
    pub registration_state_id: i64,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each budget belongs to one patient
    #[sea_orm(
        belongs_to = "super::patient::Entity",
        from = "Column::PatientId",
        to = "super::patient::Column::Id"
    )]
    Patient,
    /// One budget has many detail lines
    #[sea_orm(has_many = "super::budget_detail::Entity")]
    BudgetDetails,
}

impl Related<super::patient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl Related<super::budget_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
