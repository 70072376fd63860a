use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration stored at `~/.hive-manager/config.json`.
///
/// Unknown fields are ignored and missing fields fall back to defaults, so
/// older config files keep working across upgrades.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the default database location when set.
    pub database_path: Option<PathBuf>,

    /// Default log filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: "info".into(),
        }
    }
}

impl AppConfig {
    /// Base directory for all application data: `~/.hive-manager`.
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".hive-manager"))
    }

    /// Path of the JSON config file.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Default database path: `~/.hive-manager/hives.db`.
    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("hives.db"))
    }

    /// Directory for rolling log files.
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Ensures all required directories exist. Called before the database
    /// or log files are first opened on a fresh install.
    pub fn ensure_dirs() -> Result<()> {
        let dirs = [Self::base_dir()?, Self::logs_dir()?];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads the config from the default location.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        Self::load_from(&Self::config_path()?)
    }

    /// Loads the config from an arbitrary path. A missing or unreadable
    /// file yields the defaults (graceful degradation).
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content).unwrap_or_default()),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Saves the config to an arbitrary path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// The database path to use: the explicit override, or the default.
    pub fn effective_db_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Self::db_path(),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
