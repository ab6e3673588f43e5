//! Entity module - Contains all SeaORM entity definitions for the clinic database.
//! These entities represent the target tables the migration writes into and
//! the read-side queries select from.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod budget;
pub mod budget_detail;
pub mod patient;
pub mod product;
pub mod treatment;

// Re-export specific types to avoid conflicts
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use budget_detail::{
    Column as BudgetDetailColumn, Entity as BudgetDetail, Model as BudgetDetailModel,
};
pub use patient::{Column as PatientColumn, Entity as Patient, Model as PatientModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use treatment::{Column as TreatmentColumn, Entity as Treatment, Model as TreatmentModel};
