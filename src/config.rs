//! User configuration for tmplpress.
//! The configuration is loaded once at start-up and handed to the resolver and
//! the press engine; nothing in the core reads process-wide state directly.

use crate::constants::{APP_DIR, CONFIG_FILE};
use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserConfig {
    /// Where template snapshots are cloned to
    pub cache_dir: PathBuf,
    /// Extensions (without leading dot) copied verbatim instead of rendered
    #[serde(default)]
    pub exclude_file_extensions: Vec<String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self { cache_dir: default_cache_dir(), exclude_file_extensions: Vec::new() }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join(APP_DIR)
}

/// Returns the configuration file path, honouring an explicit config directory.
///
/// # Errors
/// * `Error::ConfigError` if no override is given and the platform has no config directory
pub fn config_path(config_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| Error::ConfigError("could not determine the config directory".into()))?,
    };
    Ok(dir.join(CONFIG_FILE))
}

impl UserConfig {
    /// Loads the configuration from `path`.
    ///
    /// A missing file is not an error: first runs get the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No configuration at '{}', using defaults.", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("could not read '{}': {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::ConfigError(format!("could not parse '{}': {}", path.display(), e))
        })
    }

    /// Writes the configuration to `path`, creating its directory if needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("could not create '{}': {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("could not encode settings: {e}")))?;
        fs::write(path, content).map_err(|e| {
            Error::ConfigError(format!("could not save '{}': {}", path.display(), e))
        })?;
        debug!("Saved configuration to '{}'.", path.display());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "CacheDir" => Ok(self.cache_dir.display().to_string()),
            "ExcludeFileExtensions" => Ok(self.exclude_file_extensions.join(",")),
            _ => Err(Error::ConfigError(format!("no \"{key}\" setting found"))),
        }
    }

    /// Updates a single setting by its persisted name.
    ///
    /// `ExcludeFileExtensions` takes a comma separated list; leading dots are dropped.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "CacheDir" => self.cache_dir = PathBuf::from(value),
            "ExcludeFileExtensions" => {
                self.exclude_file_extensions = value
                    .split(',')
                    .map(|ext| ext.trim().trim_start_matches('.'))
                    .filter(|ext| !ext.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => return Err(Error::ConfigError(format!("no \"{key}\" setting found"))),
        }
        Ok(())
    }
}
