//! Budget detail entity - One line item of a budget.
//!
//! A line may reference a treatment, a product, or neither. Both references
//! are nullable because the legacy link cannot always be resolved.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget detail database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_details")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Budget this line belongs to
    pub budget_id: i64,
    /// Referenced treatment, if any
    pub treatment_id: Option<i64>,
    /// Referenced product, if any
    pub product_id: Option<i64>,
    /// Line number within the budget
    pub line_number: i64,
    /// Free-text description
    pub description: String,
    /// Quantity
    pub quantity: f64,
    /// Price per unit
    pub unit_price: f64,
    /// Discount applied to the line
    pub discount: f64,
    /// Applicable tax type
    pub tax_type_id: i64,
    /// Line total
    pub line_total: f64,
    /// Identifier in the legacy system
    pub old_id: String,
}

/// Defines relationships between `BudgetDetail` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id"
    )]
    Budget,
    /// A line may reference a treatment
    #[sea_orm(
        belongs_to = "super::treatment::Entity",
        from = "Column::TreatmentId",
        to = "super::treatment::Column::Id"
    )]
    Treatment,
    /// A line may reference a product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::treatment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Treatment.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
