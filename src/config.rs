//! Configuration for the InfraSense agent.
//!
//! The core treats every value here as immutable for its lifetime;
//! changing the file takes effect on the next start.

use crate::alerts::{ThresholdTable, DEFAULT_STALE_AFTER_SECS};
use crate::store::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Message-bus broker host, consumed by the transport layer
    pub broker_host: String,

    /// Message-bus broker port
    pub broker_port: u16,

    /// Topic carrying sensor telemetry
    pub telemetry_topic: String,

    /// Topic carrying RFID checkpoint scans
    pub rfid_topic: String,

    /// Seconds without a fresh reading before a sensor is stale
    pub stale_after_secs: u64,

    /// Readings retained per sensor kind
    pub window_capacity: usize,

    /// Port for the HTTP query endpoint
    pub server_port: u16,

    /// Normal-range overrides merged over the built-in threshold table
    pub threshold_overrides: ThresholdTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_host: "127.0.0.1".to_string(),
            broker_port: 8883,
            telemetry_topic: "LOKI_2004".to_string(),
            rfid_topic: "rfid".to_string(),
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
            window_capacity: DEFAULT_CAPACITY,
            server_port: 8050,
            threshold_overrides: ThresholdTable::empty(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("infrasense")
            .join("config.json")
    }

    /// The effective threshold table: built-in defaults with this
    /// configuration's overrides merged on top.
    pub fn thresholds(&self) -> ThresholdTable {
        let mut table = ThresholdTable::default();
        table.apply_overrides(&self.threshold_overrides);
        table
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::NormalRange;
    use crate::telemetry::SensorKind;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.telemetry_topic, "LOKI_2004");
        assert_eq!(config.rfid_topic, "rfid");
        assert_eq!(config.stale_after_secs, 10);
        assert_eq!(config.window_capacity, 100);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.telemetry_topic, config.telemetry_topic);
        assert_eq!(back.window_capacity, config.window_capacity);
    }

    #[test]
    fn test_thresholds_merge_overrides() {
        let mut config = Config::default();
        config.threshold_overrides.set(
            SensorKind::EnvironmentTempHumidity,
            "temperature",
            NormalRange::new(15.0, 30.0),
        );

        let table = config.thresholds();
        assert_eq!(
            table.normal_range(SensorKind::EnvironmentTempHumidity, "temperature"),
            Some(NormalRange::new(15.0, 30.0))
        );
        // Untouched defaults remain.
        assert_eq!(
            table.normal_range(SensorKind::HeartRateOxygen, "heart_rate"),
            Some(NormalRange::new(40.0, 180.0))
        );
    }
}
