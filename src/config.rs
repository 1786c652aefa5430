//! Configuration file for the auto-fire tool.
//!
//! A single TOML file names the reference tables, the acquisition program
//! and its settings file, and the logging options. Relative paths are taken
//! relative to the directory holding the configuration file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::logging::LogLevel;
use crate::model::DEFAULT_TOTAL_BOTTLES;
use crate::reference::pressure_matrix::DEPTH_COLUMN;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "CTD_AUTOFIRE_CONFIG";

/// Used when neither `--config` nor the environment names a file.
pub const DEFAULT_CONFIG_FILE: &str = "ctd_autofire.toml";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub reference: ReferenceConfig,
    pub acquisition: AcquisitionSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    pub station_basin_file: PathBuf,
    pub pressure_matrix_file: PathBuf,
    pub bottle_order_file: PathBuf,
    #[serde(default = "default_depth_column")]
    pub depth_column: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionSection {
    pub settings_file: PathBuf,
    pub program_path: PathBuf,
    #[serde(default = "default_process_name")]
    pub process_name: String,
    #[serde(default = "default_total_bottles")]
    pub default_total_bottles: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: LogLevel,
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level(), file: None, timestamps: false }
    }
}

fn default_depth_column() -> String {
    DEPTH_COLUMN.to_string()
}

fn default_process_name() -> String {
    "Seasave.exe".to_string()
}

fn default_total_bottles() -> u32 {
    DEFAULT_TOTAL_BOTTLES
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, source: std::io::Error },
    Parse { path: String, source: toml::de::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "Cannot read config {}: {}", path, source),
            ConfigError::Parse { path, source } => write!(f, "Invalid config {}: {}", path, source),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Picks the configuration file: explicit path, then `CTD_AUTOFIRE_CONFIG`
/// (a `.env` file in the working directory is honoured), then
/// `./ctd_autofire.toml`.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    dotenv::dotenv().ok();
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    parse_config(&text, base).map_err(|source| ConfigError::Parse { path: display, source })
}

/// Parses configuration text, resolving relative paths against `base`.
pub fn parse_config(text: &str, base: &Path) -> Result<Config, toml::de::Error> {
    let mut config: Config = toml::from_str(text)?;

    let resolve = |p: &mut PathBuf| {
        if p.is_relative() {
            *p = base.join(&*p);
        }
    };
    resolve(&mut config.reference.station_basin_file);
    resolve(&mut config.reference.pressure_matrix_file);
    resolve(&mut config.reference.bottle_order_file);
    resolve(&mut config.acquisition.settings_file);
    if let Some(file) = config.logging.file.as_mut() {
        resolve(file);
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
