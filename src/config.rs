//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `dashboard.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - HistoryConfig: How many readings the rolling history keeps.
//!     - RefreshConfig: Seconds between sampling cycles.
//!     - RoomsConfig: Ordered room names (one sensor per room).
//!     - AcquisitionConfig: Ranges for the stand-in data generators.
//!     - ServerConfig: Where the web dashboard listens.
//!     - LoggingConfig: Log level and per-cycle metric output.
//!
//! ==============================================================================

use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub rooms: RoomsConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_seconds: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_seconds: 30 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RoomsConfig {
    pub names: Vec<String>,
    /// rooms whose simulated instrument refuses to connect
    pub fail_open: Vec<String>,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            names: vec!["Room 1".to_string(), "Room 2".to_string(), "Room 3".to_string()],
            fail_open: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            temperature_min: 20.0,
            temperature_max: 30.0,
            humidity_min: 40.0,
            humidity_max: 70.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { enabled: true, bind: "0.0.0.0:3000".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_sensor_data: true }
    }
}

/// where the running configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    /// no candidate loaded; files that existed but failed are listed with the error
    Defaults { rejected: Vec<(PathBuf, String)> },
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => tracing::info!("config loaded from {}", path.display()),
            ConfigSource::Defaults { rejected } => {
                for (path, err) in rejected {
                    tracing::warn!("failed to load {}: {}", path.display(), err);
                }
                tracing::warn!("no usable config file found, using defaults");
            }
        }
    }
}

/// bounds must be finite, ordered, and have a finite width
///
/// `rand` samples `min + (max - min) * u`, which panics on an infinite span.
fn check_range(name: &str, min: f64, max: f64) -> Result<()> {
    if !min.is_finite() || !max.is_finite() {
        bail!("acquisition.{name}_min and {name}_max must be finite numbers");
    }
    if !(min < max) {
        bail!("acquisition.{name}_min must be below {name}_max");
    }
    if !(max - min).is_finite() {
        bail!("acquisition.{name} range is too wide ({min}..{max})");
    }
    Ok(())
}

impl DashboardConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        Ok(config)
    }

    /// first readable file from `candidates`, else defaults
    ///
    /// runs before logging is installed, so nothing is printed here; the
    /// returned `ConfigSource` says what happened and main logs it.
    pub fn discover(candidates: &[PathBuf]) -> (Self, ConfigSource) {
        let mut rejected = Vec::new();
        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load(path) {
                Ok(config) => return (config, ConfigSource::File(path.clone())),
                Err(e) => rejected.push((path.clone(), format!("{:#}", e))),
            }
        }
        (Self::default(), ConfigSource::Defaults { rejected })
    }

    /// `config/dashboard.toml`, then `../config/dashboard.toml`, then defaults
    pub fn load_or_default() -> (Self, ConfigSource) {
        Self::discover(&[
            PathBuf::from("config").join("dashboard.toml"),
            PathBuf::from("..").join("config").join("dashboard.toml"),
        ])
    }

    /// reject values the refresh loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.history.max_entries == 0 {
            bail!("history.max_entries must be at least 1");
        }
        if self.refresh.interval_seconds == 0 {
            bail!("refresh.interval_seconds must be at least 1");
        }
        if self.rooms.names.is_empty() {
            bail!("rooms.names must list at least one room");
        }
        for (i, name) in self.rooms.names.iter().enumerate() {
            if self.rooms.names[..i].contains(name) {
                bail!("room '{}' is listed twice", name);
            }
        }
        for name in &self.rooms.fail_open {
            if !self.rooms.names.contains(name) {
                bail!("rooms.fail_open names '{}', which is not in rooms.names", name);
            }
        }
        let acq = &self.acquisition;
        check_range("temperature", acq.temperature_min, acq.temperature_max)?;
        check_range("humidity", acq.humidity_min, acq.humidity_max)?;
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│         DASHBOARD CONFIGURATION         │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Rooms: {}", self.rooms.names.join(", "));
        println!("│ History: last {} readings", self.history.max_entries);
        println!("│ Refresh Interval: {}s", self.refresh.interval_seconds);
        println!("│ Web: {}", if self.server.enabled { self.server.bind.as_str() } else { "disabled" });
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
