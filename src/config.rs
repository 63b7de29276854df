//! Runtime settings loaded from an optional TOML file. Every section has
//! defaults, so a fresh install runs without any configuration at all.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};
use crate::fees::FeeSchedule;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-lending-tracker";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";
const CONFIG_FILE_NAME: &str = "config.toml";
/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "LIBRARY_TRACKER_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub lending: LendingSettings,
    pub fees: FeeSchedule,
    pub patrons: PatronSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Explicit database location. Falls back to the data directory.
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingSettings {
    pub loan_period_days: u32,
    /// Maximum number of outstanding loans per patron.
    pub borrow_limit: u32,
}

impl Default for LendingSettings {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            borrow_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatronSettings {
    /// Length of a library card number.
    pub card_digits: usize,
    /// When non-empty, only these identifiers are recognized.
    pub allowed: Vec<String>,
}

impl Default for PatronSettings {
    fn default() -> Self {
        Self {
            card_digits: 6,
            allowed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `$LIBRARY_TRACKER_CONFIG`, else from the data
    /// directory. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = match env::var_os(CONFIG_ENV_VAR) {
            Some(explicit) => PathBuf::from(explicit),
            None => data_dir()?.join(CONFIG_FILE_NAME),
        };

        if !path.exists() {
            tracing::debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        tracing::info!("loaded configuration from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| LibraryError::config(format!("failed to parse config: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lending.loan_period_days == 0 {
            return Err(LibraryError::config("lending.loan_period_days must be at least 1"));
        }
        if self.lending.borrow_limit == 0 {
            return Err(LibraryError::config("lending.borrow_limit must be at least 1"));
        }
        if self.patrons.card_digits == 0 {
            return Err(LibraryError::config("patrons.card_digits must be at least 1"));
        }
        self.fees.validate()
    }

    /// Resolve the database file, honoring `storage.database_path`.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(DB_FILE_NAME)),
        }
    }
}

/// Resolve the application data directory inside the user's home.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs =
        BaseDirs::new().ok_or_else(|| LibraryError::config("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
