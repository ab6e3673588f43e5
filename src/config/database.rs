//! Database configuration module for the clinic backend.
//!
//! This module handles database connections and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! models. Tables are created parents first so foreign keys resolve on
//! engines that check them eagerly.

use crate::entities::{Budget, BudgetDetail, Patient, Product, Treatment};
use crate::errors::Result;
use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Fallback database location when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/clinic.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

fn table_for<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    statement
}

/// Creates the five clinic tables if they do not already exist.
///
/// Order is patients, treatments, products, budgets, budget details.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        table_for(&schema, Patient),
        table_for(&schema, Treatment),
        table_for(&schema, Product),
        table_for(&schema, Budget),
        table_for(&schema, BudgetDetail),
    ];

    for table in &tables {
        db.execute(builder.build(table)).await?;
    }

    info!("Clinic tables ensured");
    Ok(())
}
