//! Core logic that does not depend on how the migration is driven: field
//! normalization and the read-side queries over migrated data.

pub mod budget;
pub mod catalog;
pub mod normalize;
pub mod pagination;
pub mod patient;

pub use normalize::{FieldKind, normalize, to_store_date};
pub use pagination::{Page, PageRequest};
