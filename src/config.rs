use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PlayerError, Result};

/// Settings for [`SinkEngine`](crate::engine::SinkEngine), loadable from TOML.
///
/// ```toml
/// poll_interval_ms = 250
/// volume = 0.8
/// rate = 1.0
/// network_timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// How often the position poller samples the sink.
    pub poll_interval_ms: u64,
    pub volume: f32,
    pub rate: f32,
    pub network_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            volume: 1.0,
            rate: 1.0,
            network_timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(PlayerError::Config("poll_interval_ms must be positive".into()));
        }
        if !(self.volume >= 0.0) {
            return Err(PlayerError::Config(format!(
                "volume must be non-negative, got {}",
                self.volume
            )));
        }
        if !(self.rate > 0.0) {
            return Err(PlayerError::Config(format!(
                "rate must be positive, got {}",
                self.rate
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = EngineConfig::from_toml_str("volume = 0.5").unwrap();
        assert_eq!(config.volume, 0.5);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.rate, 1.0);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            EngineConfig::from_toml_str("poll_interval_ms = 0"),
            Err(PlayerError::Config(_))
        ));
        assert!(EngineConfig::from_toml_str("rate = 0.0").is_err());
        assert!(EngineConfig::from_toml_str("volume = -1.0").is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            EngineConfig::from_toml_str("colume = 1.0"),
            Err(PlayerError::ConfigParse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.toml");
        std::fs::write(&path, "rate = 1.5\nnetwork_timeout_secs = 5\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.rate, 1.5);
        assert_eq!(config.network_timeout(), Duration::from_secs(5));
    }
}
