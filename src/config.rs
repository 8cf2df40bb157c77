//==================================================
// File: config.rs
//==================================================
// Author: Violet Contributors
// License: Duality Public License (DPL v1.0)
// Goal: Optional runner configuration
// Objective: Load violet.toml (working directory, then user config dir) and
//            the VIOLET_DEBUG environment switch
//==================================================

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE: &str = "violet.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed reading config '{}': {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("invalid config '{}': {error}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        error: toml::de::Error,
    },
}

/// Runner configuration. CLI flags win over the config file, the config file
/// wins over defaults; `VIOLET_DEBUG` counts as a flag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Extra module search roots, tried after the script's own directory.
    pub module_paths: Vec<PathBuf>,
    /// Same effect as `--verbose`.
    pub debug: bool,
}

impl Config {
    /// Load the first config file found, or defaults when there is none.
    pub fn load() -> Result<Config, ConfigError> {
        for candidate in Self::candidate_paths() {
            if candidate.is_file() {
                return Self::load_from(&candidate);
            }
        }
        Ok(Config::default())
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        toml::from_str(&text).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("violet").join(CONFIG_FILE));
        }
        candidates
    }
}

/// `VIOLET_DEBUG=1|true|yes|on` enables debug mode without a flag.
pub fn debug_from_env() -> bool {
    env::var("VIOLET_DEBUG")
        .map(|value| {
            let lower = value.to_ascii_lowercase();
            matches!(lower.as_str(), "1" | "true" | "yes" | "on")
        })
        .unwrap_or(false)
}
