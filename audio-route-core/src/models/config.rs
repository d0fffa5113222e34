use std::time::Duration;

use serde::Deserialize;

use super::error::RouteError;

/// Tunables of the routing engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum time between disabling a route and enabling any route, in
    /// milliseconds (default: 10). Lets the mixer settle so switches don't pop.
    pub debounce_ms: u64,

    /// Cached voice call volume applied when a call starts (default: 1.0).
    pub voice_volume: f32,

    /// Initial wideband voice flag (default: false).
    pub wideband: bool,
}

impl EngineConfig {
    /// Parse a JSON document; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, RouteError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RouteError::InvalidConfiguration(format!("failed to parse config: {}", e)))?;
        config.validate().map_err(RouteError::InvalidConfiguration)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.voice_volume) {
            return Err(format!("voice volume out of range: {}", self.voice_volume));
        }
        if self.debounce_ms > 1000 {
            return Err(format!("debounce window too long: {}ms", self.debounce_ms));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 10,
            voice_volume: 1.0,
            wideband: false,
        }
    }
}
