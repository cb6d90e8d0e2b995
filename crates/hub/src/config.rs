//! TOML config file loading and validation for the hub.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub clock: ClockConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen_port: 5000 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_file: String,
    pub state_file: String,
    /// Record the optional motion column in a newly created log. Has no
    /// effect on a log that already exists; its header is fixed.
    pub motion_column: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: "data.csv".to_string(),
            state_file: "device_state.json".to_string(),
            motion_column: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Fixed offset from UTC in minutes, applied to every stamped reading.
    pub utc_offset_minutes: i32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        // +03:30, where the device fleet lives.
        Self {
            utc_offset_minutes: 210,
        }
    }
}

/// Largest offset accepted, in minutes (18 hours either way).
const MAX_OFFSET_MINUTES: i32 = 1080;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all config entries. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.server.listen_port == 0 {
            errors.push("server.listen_port must be nonzero".to_string());
        }

        if self.storage.data_file.trim().is_empty() {
            errors.push("storage.data_file is empty".to_string());
        }
        if self.storage.state_file.trim().is_empty() {
            errors.push("storage.state_file is empty".to_string());
        }
        if !self.storage.data_file.trim().is_empty()
            && self.storage.data_file == self.storage.state_file
        {
            errors.push(format!(
                "storage.data_file and storage.state_file both point at '{}'",
                self.storage.data_file
            ));
        }

        if self.clock.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            errors.push(format!(
                "clock.utc_offset_minutes {} out of range [-{MAX_OFFSET_MINUTES}, {MAX_OFFSET_MINUTES}]",
                self.clock.utc_offset_minutes
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file.
pub fn load(path: &str) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config: {path}"))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

/// A missing config file is not an error: a bare checkout runs on the
/// documented defaults.
pub fn load_or_default(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        load(path)
    } else {
        tracing::info!(path, "no config file found, using defaults");
        Ok(Config::default())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
