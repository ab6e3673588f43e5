#![allow(clippy::result_large_err)]

use clap::Parser;
use clinic_migrate::config::database::get_database_url;
use clinic_migrate::config::migration::{DEFAULT_CONFIG_PATH, load_config};
use clinic_migrate::config::DuplicateLinking;
use clinic_migrate::errors::Result;
use clinic_migrate::migration::{MigrationInput, Migrator};
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clinic-migrate")]
#[command(about = "Migrates legacy clinic spreadsheets into the clinic database")]
#[command(version = "0.1.0")]
struct Args {
    /// Path to migration.toml
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Database URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Patients export
    #[arg(long)]
    patients: Option<PathBuf>,

    /// Budgets export
    #[arg(long)]
    budgets: Option<PathBuf>,

    /// Budget detail lines export
    #[arg(long)]
    budget_details: Option<PathBuf>,

    /// Map every legacy treatment/product id that shares a name to the same record
    #[arg(long)]
    link_duplicates: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    let args = Args::parse();

    // 3. Load the migration configuration and apply command line overrides
    let mut config = load_config(&args.config)
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    if let Some(path) = args.patients {
        config.sources.patients = path;
    }
    if let Some(path) = args.budgets {
        config.sources.budgets = path;
    }
    if let Some(path) = args.budget_details {
        config.sources.budget_details = path;
    }
    if args.link_duplicates {
        config.duplicate_linking = DuplicateLinking::AllAliases;
    }
    let database_url = args.database_url.unwrap_or_else(get_database_url);

    // 4. Read the legacy exports
    info!("Starting migration");
    let input = MigrationInput::load(&config.sources);

    // 5. Run everything in one transaction; a rollback exits non-zero
    let mut migrator = Migrator::new(config);
    let report = migrator
        .run(&database_url, &input)
        .await
        .inspect_err(|e| error!("Migration aborted, no data was written: {}", e))?;

    info!("Migration completed successfully\n{}", report);
    Ok(())
}
