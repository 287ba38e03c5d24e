//! Configuration loading.
//!
//! Settings come from a YAML file (by default in the platform config
//! directory), then `QBANK_DATA_DIR`, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::storage::schema::is_valid_store_name;
use crate::storage::StoreLocation;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "QBANK_DATA_DIR";

/// Value of `data_dir` that selects a throwaway in-memory database.
pub const IN_MEMORY: &str = ":memory:";

const CONFIG_FILE: &str = "config.yaml";

/// Which store a [`StorageHandle`](crate::storage::StorageHandle) talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Database name, one file per name.
    pub name: String,
    /// Table inside the database.
    pub store: String,
    /// Schema version. Raising it upgrades the database file.
    pub version: u32,
}

impl DbConfig {
    pub fn new(name: impl Into<String>, store: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: store.into(),
            version: 1,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Check that the name, store, and version are usable.
    pub fn validate(&self) -> StoreResult<()> {
        let bad_name = self.name.trim().is_empty()
            || self.name.starts_with('.')
            || self.name.contains(['/', '\\', ':']);
        if bad_name {
            return Err(StoreError::InvalidConfig(format!(
                "database name '{}' cannot be used as a file name",
                self.name
            )));
        }
        if !is_valid_store_name(&self.store) {
            return Err(StoreError::InvalidConfig(format!(
                "store name '{}' must be a plain identifier",
                self.store
            )));
        }
        if self.version == 0 {
            return Err(StoreError::InvalidConfig(
                "version must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new("QuestionBase", "Store1")
    }
}

/// Spreadsheet export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Fixed name of the generated file.
    pub file_name: String,
    /// Name of the single worksheet.
    pub sheet_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: "question-bank.xlsx".to_string(),
            sheet_name: "Questions".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding database files, or `:memory:`.
    pub data_dir: PathBuf,
    pub database: DbConfig,
    pub export: ExportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database: DbConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location if `path` is `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        Ok(config.with_env())
    }

    /// Like [`load`](Self::load) with an explicit path, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        Ok(config.with_env())
    }

    fn with_env(mut self) -> Self {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        self
    }

    /// Parse a YAML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Write this config as YAML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let text = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// Storage location described by `data_dir`.
    pub fn location(&self) -> StoreLocation {
        if self.data_dir.as_os_str() == IN_MEMORY {
            StoreLocation::InMemory
        } else {
            StoreLocation::Directory(self.data_dir.clone())
        }
    }
}

/// Default config file path in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".qbank"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "qbank")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_db_config_validate() {
        assert!(DbConfig::default().validate().is_ok());
        assert!(DbConfig::new("", "Store1").validate().is_err());
        assert!(DbConfig::new("../escape", "Store1").validate().is_err());
        assert!(DbConfig::new("QuestionBase", "bad name").validate().is_err());
        assert!(DbConfig::default().with_version(0).validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "database:\n  store: Drafts\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.database.name, "QuestionBase");
        assert_eq!(config.database.store, "Drafts");
        assert_eq!(config.database.version, 1);
        assert_eq!(config.export, ExportConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.yaml");

        let config = AppConfig {
            data_dir: temp.path().join("data"),
            database: DbConfig::new("Bank", "Chapter1").with_version(2),
            export: ExportConfig::default(),
        };
        config.save(&path).unwrap();

        assert_eq!(AppConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&temp.path().join("absent.yaml")).unwrap();
        assert_eq!(config.database, DbConfig::default());
        assert!(AppConfig::load(Some(&temp.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn test_in_memory_location() {
        let config = AppConfig {
            data_dir: PathBuf::from(IN_MEMORY),
            ..AppConfig::default()
        };
        assert_eq!(config.location(), StoreLocation::InMemory);
    }
}
