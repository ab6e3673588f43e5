//! Treatment entity - A clinical service that can be quoted on a budget.
//!
//! Treatments are not exported by the legacy system on their own; they are
//! discovered inline on budget detail lines and deduplicated by name.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Treatment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "treatments")]
pub struct Model {
    /// Unique identifier for the treatment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Cleaning", "Root canal")
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Expected duration in minutes
    pub duration: i64,
    /// List price
    pub price: f64,
    /// Clinic offering the treatment
    pub clinic_id: i64,
    /// Parent clinic group
    pub parent_clinic_id: i64,
    /// Applicable tax type
    pub tax_type_id: i64,
    /// Registration state (active / archived)
    pub registration_state_id: i64,
}

/// Defines relationships between Treatment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A treatment can appear on many budget lines
    #[sea_orm(has_many = "super::budget_detail::Entity")]
    BudgetDetails,
}

impl Related<super::budget_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
