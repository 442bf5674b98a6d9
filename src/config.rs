// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::rooms::{default_floors, validate_floors, Floor};

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "PAXGRID_CONFIG";
/// Config file picked up from the working directory when present.
pub const CONFIG_FILE: &str = "paxgrid.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Copy an existing output file to `BACKUP_<ts>_<name>` before replacing it.
    pub enabled: bool,
    /// Delete every `BACKUP_*` file next to the cleaned grid after a clean run.
    pub purge_on_clean: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            purge_on_clean: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub floors: Vec<Floor>,
    pub backup: BackupConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            floors: default_floors(),
            backup: BackupConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("parsing YAML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config `{}`", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in config `{}`", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        validate_floors(&self.floors).context("invalid floor layout")
    }

    /// `$PAXGRID_CONFIG`, else `./paxgrid.yaml` if it exists, else defaults.
    pub fn load() -> Result<Self> {
        let explicit = env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(explicit.as_deref(), Path::new(CONFIG_FILE))
    }

    fn load_from(explicit: Option<&Path>, fallback: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            info!(config = %path.display(), "loading config");
            return Self::from_file(path);
        }
        if fallback.is_file() {
            info!(config = %fallback.display(), "loading config");
            return Self::from_file(fallback);
        }
        debug!("no config file; using built-in floor layout");
        Ok(Self::default())
    }
}
