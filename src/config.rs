//! Loader configuration.
//!
//! Every field has a default equal to the tuned constants, so an empty JSON
//! object is a valid config and a file only needs the values it changes.
//!
//! ```
//! use neuroboot::LoaderConfig;
//!
//! let config = LoaderConfig::from_json_str(r#"{ "seed": 7, "sampler": { "target": 400 } }"#).unwrap();
//! assert_eq!(config.seed, Some(7));
//! assert_eq!(config.sampler.target, 400);
//! assert_eq!(config.connectivity.k, 6);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::{Camera, Parallax};
use crate::choreography::ChoreographyConfig;
use crate::connectivity::ConnectivityConfig;
use crate::enter::EnterConfig;
use crate::error::ConfigError;
use crate::gate::GateConfig;
use crate::propagation::PropagationConfig;
use crate::spawn::SamplerConfig;
use crate::volume::BrainVolume;

/// Window and cortex styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Borderless fullscreen on the current monitor.
    pub fullscreen: bool,
    pub clear_color: [f32; 4],
    /// View depth where fog starts.
    pub fog_near: f32,
    /// View depth where fog fully hides a primitive.
    pub fog_far: f32,
    /// Blue level of a quiescent neuron.
    pub idle_intensity: f32,
    /// Extra blue at full firing intensity.
    pub firing_gain: f32,
    pub cortical_size: f32,
    pub subcortical_size: f32,
    /// Synapse brightness while carrying packets.
    pub synapse_active: f32,
    /// Synapse brightness when idle-visible.
    pub synapse_idle: f32,
    pub synapse_opacity: f32,
    /// Line width in pixels.
    pub synapse_width: f32,
    pub packet_size: f32,
    pub packet_opacity: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "neuroboot".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            fog_near: 150.0,
            fog_far: 350.0,
            idle_intensity: 0.15,
            firing_gain: 0.85,
            cortical_size: 1.8,
            subcortical_size: 2.5,
            synapse_active: 0.3,
            synapse_idle: 0.08,
            synapse_opacity: 0.6,
            synapse_width: 1.0,
            packet_size: 4.0,
            packet_opacity: 0.8,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Range { field: "render.size" });
        }
        if !(self.fog_far > self.fog_near) {
            return Err(ConfigError::Range { field: "render.fog" });
        }
        Ok(())
    }
}

/// Everything a loader needs, grouped by concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Fixed RNG seed. `None` seeds from the clock.
    pub seed: Option<u64>,
    pub volume: BrainVolume,
    pub sampler: SamplerConfig,
    pub connectivity: ConnectivityConfig,
    pub propagation: PropagationConfig,
    pub choreography: ChoreographyConfig,
    pub camera: Camera,
    pub parallax: Parallax,
    pub render: RenderConfig,
    pub gate: GateConfig,
    pub enter: EnterConfig,
}

impl LoaderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampler.validate()?;
        self.connectivity.validate()?;
        self.propagation.validate()?;
        self.choreography.validate()?;
        self.render.validate()?;
        self.gate.validate()?;
        self.enter.validate()?;
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = LoaderConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LoaderConfig::default());
        assert_eq!(config.sampler.target, 1500);
        assert_eq!(config.propagation.arrival_fire_probability, 0.6);
        assert_eq!(config.choreography.durations, vec![0.6, 1.4, 0.8, 0.5]);
        assert_eq!(config.render.fog_near, 150.0);
    }

    #[test]
    fn test_json_round_trip() {
        let config = LoaderConfig::default().with_seed(42);
        let json = config.to_json().unwrap();
        assert_eq!(LoaderConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            LoaderConfig::from_json_str(r#"{ "choreography": { "durations": [] } }"#),
            Err(ConfigError::EmptySchedule)
        ));
        assert!(matches!(
            LoaderConfig::from_json_str(r#"{ "render": { "fog_near": 400.0 } }"#),
            Err(ConfigError::Range { field: "render.fog" })
        ));
        assert!(matches!(
            LoaderConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            LoaderConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
