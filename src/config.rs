//! User configuration, read from `config.toml`
//!
//! ```toml
//! [database]
//! path = "/home/me/.local/share/recall/recall.db"
//! busyTimeoutMs = 5000
//!
//! [review]
//! retention = 90
//! maxInterval = 36500
//!
//! [synthesis]
//! separablePolicy = "prompt_set"
//!
//! [listing]
//! defaultLimit = 10
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notes::models::default_page_limit;
use crate::notes::SeparablePolicy;
use crate::review::ReviewConfig;

/// Overrides `database.path`
pub const DB_ENV: &str = "RECALL_DB";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Could not determine {0} directory")]
    NoDirectory(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Database file; defaults to the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisConfig {
    #[serde(default)]
    pub separable_policy: SeparablePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingConfig {
    #[serde(default = "default_page_limit")]
    pub default_limit: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Scheduler settings applied to new reviews
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

impl RecallConfig {
    /// `<config dir>/recall/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("recall").join("config.toml"))
            .ok_or(ConfigError::NoDirectory("config"))
    }

    /// Load from `path`, falling back to defaults when the file is missing
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::default();
        match fs::read_to_string(path) {
            Ok(raw) => config = toml::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
            }
            Err(e) => return Err(e.into()),
        }

        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(DB_ENV).filter(|p| !p.is_empty()) {
            self.database.path = Some(PathBuf::from(path));
        }
    }

    /// Configured database file, or `<data dir>/recall/recall.db`
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => dirs::data_local_dir()
                .map(|dir| dir.join("recall").join("recall.db"))
                .ok_or(ConfigError::NoDirectory("data")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let config = RecallConfig::load_from(dir.path().join("nonexistent.toml")).unwrap();

        assert_eq!(config.review, ReviewConfig::default());
        assert_eq!(config.listing.default_limit, 10);
        assert_eq!(config.synthesis.separable_policy, SeparablePolicy::PromptSet);
        assert_eq!(config.database.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[review]
retention = 85
dueFuzzed = true

[synthesis]
separablePolicy = "cross_product"
"#,
        )
        .unwrap();

        let config = RecallConfig::load_from(&path).unwrap();
        assert_eq!(config.review.retention, 85);
        assert!(config.review.due_fuzzed);
        assert!(config.review.learning_enabled);
        assert_eq!(config.review.weights.len(), 19);
        assert_eq!(config.synthesis.separable_policy, SeparablePolicy::CrossProduct);
        assert_eq!(config.listing.default_limit, 10);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        assert!(matches!(RecallConfig::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub/config.toml");

        let mut config = RecallConfig::default();
        config.database.path = Some(dir.path().join("cards.db"));
        config.listing.default_limit = 25;
        config.review.max_interval = 365;
        config.save_to(&path).unwrap();

        let mut loaded = RecallConfig::load_from(&path).unwrap();
        // The environment may point somewhere else
        loaded.database.path = config.database.path.clone();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_env_overrides_database_path() {
        let mut config = RecallConfig::default();
        config.apply_env(|key| (key == DB_ENV).then(|| "/tmp/other.db".to_string()));
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/other.db"));

        let mut config = RecallConfig::default();
        config.apply_env(|_| Some(String::new()));
        assert!(config.database.path.is_none());
    }
}
