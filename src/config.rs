use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ShiplogError};

/// User configuration, loaded from an optional JSON file. Absent or
/// malformed files silently fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preset key preselected on the date range screen.
    pub default_date_range: String,
    /// Repository filter pattern applied after each fetch.
    pub repo_filter: String,
    /// Export format preselected on the export screen: text, markdown, json.
    pub output_format: String,
    /// Optional template for the text export.
    pub custom_template: String,
    /// Copy the text summary to the clipboard when entering the summary.
    pub auto_copy: bool,
    /// Show the compact statistics line on the summary screen.
    pub show_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_date_range: "today".to_string(),
            repo_filter: String::new(),
            output_format: "text".to_string(),
            custom_template: String::new(),
            auto_copy: false,
            show_stats: true,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match config_file() {
                Ok(path) => path,
                Err(_) => return Self::default(),
            },
        };

        let Ok(raw) = std::fs::read(&path) else {
            return Self::default();
        };
        match serde_json::from_slice(&raw) {
            Ok(config) => {
                debug!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                debug!("ignoring malformed config {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

/// Per-user configuration directory, honoring `XDG_CONFIG_HOME`.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg).join("shiplog"));
        }
    }
    let home = dirs::home_dir()
        .ok_or_else(|| ShiplogError::Other("failed to resolve home directory".into()))?;
    Ok(home.join(".config").join("shiplog"))
}

pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

pub fn default_cache_dir() -> Result<PathBuf> {
    Ok(config_dir()?.join("cache"))
}

pub fn log_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("shiplog.log"))
}
