//! User configuration for the move pipelines.
//!
//! Loaded from `~/.config/media-mover.toml`, with one section per pipeline
//! plus a `[runner]` section for the shared worker pool and log settings.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use serde::Deserialize;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Default worker pool size when the config file does not set one.
pub const DEFAULT_WORKERS: usize = 8;

/// Path to the user config file: `$HOME/.config/media-mover.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// Paths for the movie pipeline.
///
/// Movies copy straight from source to target, so there is no staging path.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MoviesConfig {
    #[serde(default)]
    pub source_path: String,
    #[serde(default)]
    pub target_path: String,
}

/// Paths and flags for the TV pipeline.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TvConfig {
    #[serde(default)]
    pub source_path: String,
    #[serde(default)]
    pub staging_path: String,
    #[serde(default)]
    pub target_path: String,
    /// Replace an existing destination file instead of skipping it.
    #[serde(default)]
    pub overwrite: bool,
}

/// Shared runner settings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Worker pool size for concurrent file moves.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Log directory override. Defaults to `~/logs/media-mover`.
    #[serde(default)]
    pub log_dir: Option<String>,
}

/// Full user config file contents.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default)]
    pub movies: MoviesConfig,
    #[serde(default)]
    pub tv: TvConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl MediaConfig {
    /// Read and parse the user config file.
    ///
    /// # Errors
    /// Returns an error if the file is missing or not valid TOML.
    pub fn load() -> Result<Self> {
        let path = CONFIG_PATH
            .as_deref()
            .context("Failed to determine home directory for config path")?;
        Self::from_file(path)
    }

    /// Read and parse a config file from the given path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_string =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&config_string)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<Self>(toml_str).map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }

    /// Worker pool size, falling back to the default when unset or zero.
    #[must_use]
    pub fn workers(&self) -> usize {
        match self.runner.workers {
            Some(n) if n > 0 => n,
            _ => DEFAULT_WORKERS,
        }
    }
}

impl MoviesConfig {
    /// Validate that both movie paths are configured.
    ///
    /// # Errors
    /// Returns an error naming the missing key.
    pub fn validate(&self) -> Result<()> {
        if self.source_path.trim().is_empty() {
            anyhow::bail!("Config is missing [movies] source_path");
        }
        if self.target_path.trim().is_empty() {
            anyhow::bail!("Config is missing [movies] target_path");
        }
        Ok(())
    }
}

impl TvConfig {
    /// Validate that all TV paths are configured.
    ///
    /// # Errors
    /// Returns an error naming the missing key.
    pub fn validate(&self) -> Result<()> {
        if self.source_path.trim().is_empty() {
            anyhow::bail!("Config is missing [tv] source_path");
        }
        if self.staging_path.trim().is_empty() {
            anyhow::bail!("Config is missing [tv] staging_path");
        }
        if self.target_path.trim().is_empty() {
            anyhow::bail!("Config is missing [tv] target_path");
        }
        Ok(())
    }
}
