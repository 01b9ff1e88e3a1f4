//! Driver configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Protocol engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// How long a command waits for its acknowledgement, and how long the
    /// receive worker holds a partial frame before discarding it (default: 250).
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,
    /// Timeout for a single transport write (default: 1000).
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    /// Maximum number of replies retained while awaiting correlation;
    /// the oldest reply is evicted when exceeded (default: 16).
    #[serde(default = "default_inbound_capacity")]
    pub inbound_capacity: usize,
}

fn default_receive_timeout_ms() -> u64 {
    250
}

fn default_write_timeout_ms() -> u64 {
    1000
}

fn default_inbound_capacity() -> usize {
    16
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            receive_timeout_ms: default_receive_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            inbound_capacity: default_inbound_capacity(),
        }
    }
}

impl DriverConfig {
    /// Load and validate configuration from a toml file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: DriverConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.receive_timeout_ms < 10 {
            return Err(ConfigError::Validation(
                "Receive timeout must be at least 10 ms".to_string(),
            ));
        }
        if self.receive_timeout_ms > 60_000 {
            return Err(ConfigError::Validation(
                "Receive timeout cannot exceed 60 seconds".to_string(),
            ));
        }
        if self.write_timeout_ms < 10 {
            return Err(ConfigError::Validation(
                "Write timeout must be at least 10 ms".to_string(),
            ));
        }
        if self.inbound_capacity == 0 {
            return Err(ConfigError::Validation(
                "Inbound capacity must be at least 1".to_string(),
            ));
        }
        if self.inbound_capacity > 1024 {
            return Err(ConfigError::Validation(
                "Inbound capacity cannot exceed 1024".to_string(),
            ));
        }
        Ok(())
    }

    /// Reply wait window as a Duration.
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Transport write window as a Duration.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = DriverConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_capacity() {
        let mut config = DriverConfig::default();
        config.inbound_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_timeout_bounds() {
        let mut config = DriverConfig::default();

        config.receive_timeout_ms = 5;
        assert!(config.validate().is_err());

        config.receive_timeout_ms = 120_000;
        assert!(config.validate().is_err());

        config.receive_timeout_ms = 250;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = DriverConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: DriverConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.receive_timeout_ms, config.receive_timeout_ms);
        assert_eq!(parsed.inbound_capacity, config.inbound_capacity);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed: DriverConfig = toml::from_str("receive_timeout_ms = 100").unwrap();
        assert_eq!(parsed.receive_timeout_ms, 100);
        assert_eq!(parsed.write_timeout_ms, 1000);
        assert_eq!(parsed.inbound_capacity, 16);
    }
}
