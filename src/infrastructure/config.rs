//! Engine configuration
//!
//! Sources, later ones winning: built-in defaults, an optional config file
//! named by `MENAGERIE_CONFIG` (default `menagerie`, any format the `config`
//! crate recognizes by extension), then `MENAGERIE__*` environment variables
//! with `__` separating nested keys, e.g. `MENAGERIE__MAX_EVENT_RETRIES=8`.

use std::env;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::EngineTables;

const CONFIG_FILE_VAR: &str = "MENAGERIE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "menagerie";
const ENV_PREFIX: &str = "MENAGERIE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub tables: EngineTables,
    /// SQLite URL of the inventory ledger
    pub ledger_database_url: String,
    /// Compare-and-swap attempts per boss write before giving up
    pub max_event_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tables: EngineTables::default(),
            ledger_database_url: "sqlite::memory:".to_string(),
            max_event_retries: 5,
        }
    }
}

impl EngineConfig {
    /// Load from `.env`, the config file and the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let settings = Config::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(environment())
            .build()
            .with_context(|| format!("Failed to read configuration from {}", file))?;

        Self::finish(settings)
    }

    /// Parse a TOML document; environment variables still apply on top
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .add_source(environment())
            .build()
            .context("Failed to parse configuration")?;

        Self::finish(settings)
    }

    fn finish(settings: Config) -> Result<Self> {
        let config: Self = settings
            .try_deserialize()
            .context("Configuration does not match the engine schema")?;
        config.tables.validate().context("Invalid engine tables")?;

        tracing::info!(
            ledger = %config.ledger_database_url,
            max_event_retries = config.max_event_retries,
            special_items = config.tables.special_items.len(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
