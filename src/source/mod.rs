//! Row source - reads legacy exports into ordered, loosely-typed records.
//!
//! The reader never interprets values beyond what the file format stores;
//! coercion into target types happens in [`crate::core::normalize`].

mod reader;
mod row;
mod value;

pub use reader::{load_rows, read_rows};
pub use row::Row;
pub use value::CellValue;
