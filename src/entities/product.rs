//! Product entity - A stock item that can be sold on a budget.
//!
//! Like treatments, products are discovered on budget detail lines and
//! deduplicated by name.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Toothbrush")
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Units in stock
    pub stock: i64,
    /// Unit price
    pub price: f64,
    /// Clinic selling the product
    pub clinic_id: i64,
    /// Parent clinic group
    pub parent_clinic_id: i64,
    /// Applicable tax type
    pub tax_type_id: i64,
    /// Registration state (active / archived)
    pub registration_state_id: i64,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A product can appear on many budget lines
    #[sea_orm(has_many = "super::budget_detail::Entity")]
    BudgetDetails,
}

impl Related<super::budget_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
