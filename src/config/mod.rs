/// Database configuration and connection management
pub mod database;

/// Migration defaults and source file locations from migration.toml
pub mod migration;

pub use migration::{DefaultValues, DuplicateLinking, MigrationConfig, SourceFiles};
