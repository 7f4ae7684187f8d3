//! # Player Configuration
//!
//! Timing constants and material tables, read from an optional YAML file.
//!
//! ## Format
//! ```yaml
//! settle-delay-ms: 50
//! probe-timeout-ms: 2000
//! default-tempo: 120
//! discovery-radius: 5
//! materials:
//!   bell: [gold_block]
//!   bass: [oak_planks, spruce_planks]
//!   percussion: [stone, netherrack]
//! ```
//!
//! Every key is optional; missing keys keep their defaults.
//!
//! ## Example
//! ```rust
//! use noteblock::PlayerConfig;
//!
//! let config = PlayerConfig::from_yaml("probe-timeout-ms: 500").unwrap();
//! assert_eq!(config.probe_timeout_ms, 500);
//! assert_eq!(config.settle_delay_ms, 50);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{NoteblockError, Result};

/// Runtime settings for discovery, tuning and playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PlayerConfig {
    /// Wait after each increment so the world registers the new step.
    pub settle_delay_ms: u64,
    /// How long a tuning probe waits for a matching sound before failing.
    pub probe_timeout_ms: u64,
    /// BPM used when a score carries no tempo data.
    pub default_tempo: f64,
    /// Half-edge of the cube searched for note blocks.
    pub discovery_radius: i32,
    pub materials: MaterialConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 50,
            probe_timeout_ms: 2000,
            default_tempo: 120.0,
            discovery_radius: 5,
            materials: MaterialConfig::default(),
        }
    }
}

/// Support materials that select a non-harp family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub bell: Vec<String>,
    pub bass: Vec<String>,
    pub percussion: Vec<String>,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            bell: names(&["gold_block"]),
            bass: names(&[
                "oak_planks",
                "spruce_planks",
                "birch_planks",
                "acacia_planks",
                "dark_oak_planks",
                "jungle_planks",
            ]),
            percussion: names(&["stone", "netherrack"]),
        }
    }
}

impl PlayerConfig {
    /// Parse a YAML document and validate the result.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: PlayerConfig = if content.trim().is_empty() {
            PlayerConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| NoteblockError::Config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| NoteblockError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if !(self.default_tempo.is_finite() && self.default_tempo > 0.0) {
            return Err(NoteblockError::Config(format!(
                "default-tempo must be positive, got {}",
                self.default_tempo
            )));
        }
        if self.probe_timeout_ms == 0 {
            return Err(NoteblockError::Config(
                "probe-timeout-ms must be greater than zero".to_string(),
            ));
        }
        if self.discovery_radius < 0 {
            return Err(NoteblockError::Config(format!(
                "discovery-radius cannot be negative, got {}",
                self.discovery_radius
            )));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
