//! Dashboard configuration.
//!
//! Loaded from a TOML file where every field is optional, then adjusted by
//! environment variables. Missing values fall back to the timings the
//! dashboard page always used.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sensor backend location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Unset means requests may hang; a hung poll only stalls its own tick.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_live_interval")]
    pub live_interval_ms: u64,

    #[serde(default = "default_history_interval")]
    pub history_interval_ms: u64,

    #[serde(default = "default_pulse")]
    pub pulse_ms: u64,
}

fn default_live_interval() -> u64 {
    1000
}

fn default_history_interval() -> u64 {
    60_000
}

fn default_pulse() -> u64 {
    150
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            live_interval_ms: default_live_interval(),
            history_interval_ms: default_history_interval(),
            pulse_ms: default_pulse(),
        }
    }
}

impl PollingConfig {
    pub fn live_interval(&self) -> Duration {
        Duration::from_millis(self.live_interval_ms)
    }

    pub fn history_interval(&self) -> Duration {
        Duration::from_millis(self.history_interval_ms)
    }

    pub fn pulse(&self) -> Duration {
        Duration::from_millis(self.pulse_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_history_hours")]
    pub default_history_hours: u32,

    /// Lookback windows offered by the period selector, in hours.
    #[serde(default = "default_history_presets")]
    pub history_presets: Vec<u32>,

    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f64,

    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
}

fn default_history_hours() -> u32 {
    1
}

fn default_history_presets() -> Vec<u32> {
    vec![1, 6, 24, 168]
}

fn default_device_pixel_ratio() -> f64 {
    1.0
}

fn default_frame_interval() -> u64 {
    250
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_history_hours: default_history_hours(),
            history_presets: default_history_presets(),
            device_pixel_ratio: default_device_pixel_ratio(),
            frame_interval_ms: default_frame_interval(),
        }
    }
}

impl DisplayConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            level: default_log_level(),
        }
    }
}

impl DashboardConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, otherwise the first config found in the
    /// default locations, otherwise built-in defaults. Environment overrides
    /// are applied last and the result is validated.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match Self::default_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => {
                    debug!("Using config file {:?}", path);
                    Self::load(&path)?
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sensor-dashboard").join("config.toml"));
        }
        paths.push(PathBuf::from("./sensor-dashboard.toml"));
        paths
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SENSOR_DASHBOARD_URL") {
            self.server.base_url = url;
        }
        if let Ok(level) = std::env::var("SENSOR_DASHBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("server.base_url is empty".into()));
        }
        if self.polling.live_interval_ms == 0
            || self.polling.history_interval_ms == 0
            || self.display.frame_interval_ms == 0
        {
            return Err(ConfigError::Invalid("intervals must be greater than zero".into()));
        }
        if self.display.history_presets.is_empty() {
            return Err(ConfigError::Invalid("display.history_presets is empty".into()));
        }
        if self.display.default_history_hours == 0 || self.display.history_presets.contains(&0) {
            return Err(ConfigError::Invalid("history windows must be at least one hour".into()));
        }
        if !(self.display.device_pixel_ratio > 0.0) {
            return Err(ConfigError::Invalid("display.device_pixel_ratio must be positive".into()));
        }
        Ok(())
    }
}
