use std::path::Path;

use anyhow::{Context, Result};

use recall_lib::config::RecallConfig;
use recall_lib::{Database, RecallError};

/// Shared application state for CLI commands
pub struct App {
    pub config: RecallConfig,
    pub db: Database,
}

impl App {
    /// Load the config and open the database it points at
    pub fn new(config_path: Option<&Path>, db_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => RecallConfig::default_path().context("Failed to get config directory")?,
        };
        let mut config = RecallConfig::load_from(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

        if let Some(path) = db_path {
            config.database.path = Some(path.to_path_buf());
        }
        let path = config.database_path().context("Failed to get data directory")?;

        let db = Database::open(&path, config.database.busy_timeout())
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        if let Some(path) = db.path() {
            log::debug!("Using database {}", path.display());
        }

        Ok(Self { config, db })
    }
}

/// True when the command failed because of the user's input rather than the store
pub fn is_invalid_input(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<RecallError>())
        .any(RecallError::is_validation)
}
