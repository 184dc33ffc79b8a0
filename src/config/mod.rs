//! Configuration file support for textscanner.
//!
//! This module handles loading and validating scanner settings from the
//! configuration file located at `~/.config/textscanner/config.toml`. Settings
//! include input bindings, hover delay, scan length and sentence parsing.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod error;
pub mod types;

// Re-export commonly used types at module level
pub use enums::TerminationMode;
pub use error::OptionError;
pub use types::{InputDefinition, ScanningConfig, SentenceParsingConfig, TerminationCharacter};

use anyhow::{Context, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Longest hover delay accepted, in milliseconds.
pub const MAX_DELAY_MS: u64 = 5_000;
/// Longest scan length accepted, in characters.
pub const MAX_SCAN_LENGTH: usize = 100;
/// Longest sentence extent accepted, in characters.
pub const MAX_SCAN_EXTENT: usize = 1_000;

/// Main configuration structure containing all user settings.
///
/// # Example TOML
/// ```toml
/// [scanning]
/// delay_ms = 20
/// scan_length = 16
/// select_text = true
///
/// [[scanning.inputs]]
/// include = "shift"
/// types = { mouse = true }
///
/// [scanning.sentence_parsing]
/// scan_extent = 200
/// termination_mode = "custom"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Scanning behaviour
    #[serde(default)]
    pub scanning: ScanningConfig,
}

impl Config {
    /// Clamps numeric settings to their accepted ranges.
    ///
    /// Validated ranges:
    /// - `delay_ms`: 0 - 5000
    /// - `scan_length`: up to 100
    /// - `sentence_parsing.scan_extent`: up to 1000
    ///
    /// Values that cannot be interpreted at all (zero lengths, unknown tokens)
    /// are left alone here and rejected individually when the runtime options
    /// are resolved.
    fn validate_and_clamp(&mut self) {
        let scanning = &mut self.scanning;

        if scanning.delay_ms > MAX_DELAY_MS {
            log::warn!(
                "Invalid delay_ms {}, clamping to 0-{} range",
                scanning.delay_ms,
                MAX_DELAY_MS
            );
            scanning.delay_ms = MAX_DELAY_MS;
        }

        if scanning.scan_length > MAX_SCAN_LENGTH {
            log::warn!(
                "Invalid scan_length {}, clamping to at most {}",
                scanning.scan_length,
                MAX_SCAN_LENGTH
            );
            scanning.scan_length = MAX_SCAN_LENGTH;
        }

        if scanning.sentence_parsing.scan_extent > MAX_SCAN_EXTENT {
            log::warn!(
                "Invalid scan_extent {}, clamping to at most {}",
                scanning.sentence_parsing.scan_extent,
                MAX_SCAN_EXTENT
            );
            scanning.sentence_parsing.scan_extent = MAX_SCAN_EXTENT;
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("textscanner");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from `config_path`, or returns defaults if the file
    /// does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or contains
    /// invalid TOML syntax.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let config = Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Parses configuration from a TOML string and clamps it.
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(config_str)?;
        config.validate_and_clamp();
        Ok(config)
    }

    /// Serializes the configuration to TOML and writes it to `config_path`,
    /// creating the parent directory if needed.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// JSON schema describing the configuration file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}
