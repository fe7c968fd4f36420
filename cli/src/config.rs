//! Local CLI settings: where the ledger snapshot this client drives
//! lives. A TOML file under the user's config directory, written back
//! with defaults on first run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the three snapshot documents this CLI reads at
    /// startup and writes back after every mutating command.
    pub snapshot_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_dir: Self::default_snapshot_dir(),
        }
    }
}

impl Config {
    fn default_snapshot_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("carbon-cli")
            .join("snapshot")
    }

    fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("could not resolve a config directory for this platform")?
            .join("carbon-cli");
        Ok(dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = fs::read_to_string(&path).context("failed to read carbon-cli config")?;
            toml::from_str(&contents).context("failed to parse carbon-cli config")
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("failed to create carbon-cli config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("failed to serialize carbon-cli config")?;
        fs::write(&path, contents).context("failed to write carbon-cli config")
    }
}
