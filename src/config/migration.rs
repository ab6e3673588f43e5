//! Migration configuration loading from migration.toml
//!
//! Every setting has a default, so the file is optional. The defaults mirror
//! the values the legacy import always used: the "Grupo Clínico Dental Plus"
//! parent clinic (47) and its Madrid clinic (63), active registration state,
//! and the standard tax rate.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the migration configuration file
pub const DEFAULT_CONFIG_PATH: &str = "migration.toml";

/// Configuration structure representing the entire migration.toml file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MigrationConfig {
    /// Values substituted when a source field is absent
    pub defaults: DefaultValues,
    /// Locations of the legacy spreadsheets
    pub sources: SourceFiles,
    /// How legacy ids that collapse onto one treatment/product are remapped
    pub duplicate_linking: DuplicateLinking,
    /// Whether to create missing tables before migrating
    pub create_schema: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultValues::default(),
            sources: SourceFiles::default(),
            duplicate_linking: DuplicateLinking::FirstSeen,
            create_schema: true,
        }
    }
}

/// Values substituted when a legacy row leaves a field empty
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DefaultValues {
    /// Parent clinic group for records without one
    pub parent_clinic_id: i64,
    /// Clinic for records without one
    pub clinic_id: i64,
    /// Registration state meaning "active"
    pub registration_state_id: i64,
    /// Tax type meaning "standard rate"
    pub tax_type_id: i64,
    /// Budget status meaning "open"
    pub budget_status_id: i64,
    /// Payment type meaning "default method"
    pub payment_type_id: i64,
    /// Treatment duration in minutes when the source has none
    pub treatment_duration: i64,
    /// Creator tag stamped on migrated patients
    pub created_by: String,
}

impl Default for DefaultValues {
    fn default() -> Self {
        Self {
            parent_clinic_id: 47,
            clinic_id: 63,
            registration_state_id: 1,
            tax_type_id: 1,
            budget_status_id: 1,
            payment_type_id: 1,
            treatment_duration: 30,
            created_by: "Migration Script".to_string(),
        }
    }
}

/// Paths to the three legacy exports
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceFiles {
    /// Patients export
    pub patients: PathBuf,
    /// Budgets export
    pub budgets: PathBuf,
    /// Budget detail lines export
    pub budget_details: PathBuf,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            patients: PathBuf::from("data/pacientes.xlsx"),
            budgets: PathBuf::from("data/presupuestos.xlsx"),
            budget_details: PathBuf::from("data/presupuestos_detalle.xlsx"),
        }
    }
}

/// Remapping policy for legacy treatment/product ids that share a name.
///
/// Deduplication keeps one record per normalized name. `FirstSeen` records
/// only the legacy id of the row that created it, so lines pointing at the
/// other ids lose their link. `AllAliases` points every collapsed id at the
/// surviving record.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateLinking {
    /// Only the first legacy id per name is remapped
    #[default]
    FirstSeen,
    /// Every legacy id per name is remapped to the same new id
    AllAliases,
}

/// Loads migration configuration from a TOML file.
///
/// A missing file yields the defaults; a file that exists but cannot be read
/// or parsed is an error.
///
/// # Errors
/// Returns an error if the file exists but is unreadable or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MigrationConfig> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        tracing::debug!("No configuration at {:?}, using defaults", path_ref);
        return Ok(MigrationConfig::default());
    }

    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses migration configuration from TOML text.
///
/// # Errors
/// Returns an error if the text is not valid TOML for [`MigrationConfig`].
pub fn parse_config(contents: &str) -> Result<MigrationConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse migration.toml: {e}"),
    })
}
