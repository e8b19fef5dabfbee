//! Runtime configuration.
//!
//! Read from `<config dir>/canopy/config.json`. A missing file yields the
//! defaults; environment variables override individual fields:
//!
//! - `CANOPY_DB` - database path
//! - `CANOPY_ANCESTOR_RESOLUTION` - `best_effort` or `strict`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::tree::AncestorResolution;

const APP_NAME: &str = "canopy";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// SQLite database file. Defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    /// How breadcrumbs treat ancestors that no longer exist.
    pub ancestor_resolution: AncestorResolution,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Config {
    /// Load from the user's config directory and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match get_config_path() {
            Ok(path) => Self::load_from(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from an explicit file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(db) = var("CANOPY_DB") {
            self.database_path = Some(PathBuf::from(db));
        }
        if let Some(mode) = var("CANOPY_ANCESTOR_RESOLUTION") {
            self.ancestor_resolution = serde_json::from_value(serde_json::Value::String(mode))
                .context("CANOPY_ANCESTOR_RESOLUTION must be 'best_effort' or 'strict'")?;
        }
        Ok(())
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
