//! Neuron placement.
//!
//! Rejection-samples the bounding box of a [`Volume`] until the target
//! population is reached or the attempt budget runs out. Every random draw
//! goes through one injected RNG, so a seed reproduces the whole layout.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::neuron::{Neuron, Population};
use crate::volume::Volume;

/// Build the RNG every stochastic step draws from.
///
/// `None` seeds from the clock, so each mount looks different.
pub fn rng_from_seed(seed: Option<u64>) -> SmallRng {
    let seed = seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    });
    SmallRng::seed_from_u64(seed)
}

/// Uniform point in the box `[-half, half)` on every axis.
#[inline]
pub fn random_in_box<R: Rng + ?Sized>(rng: &mut R, half: Vec3) -> Vec3 {
    Vec3::new(
        rng.gen_range(-half.x..half.x),
        rng.gen_range(-half.y..half.y),
        rng.gen_range(-half.z..half.z),
    )
}

/// Neuron sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Target number of neurons.
    pub target: usize,
    /// Attempt budget as a multiple of `target`.
    pub attempt_factor: usize,
    /// Probability that an accepted candidate is cortical.
    pub cortical_ratio: f32,
    /// Surface-proximity threshold separating cortical from subcortical.
    pub surface_band: f32,
    /// Half extents of the sampling box. Must enclose the volume.
    pub half_extents: Vec3,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            target: 1500,
            attempt_factor: 5,
            cortical_ratio: 0.7,
            surface_band: 0.25,
            half_extents: Vec3::new(140.0, 120.0, 160.0),
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.cortical_ratio) {
            return Err(ConfigError::Range { field: "sampler.cortical_ratio" });
        }
        if !(self.surface_band > 0.0) {
            return Err(ConfigError::Range { field: "sampler.surface_band" });
        }
        if !(self.half_extents.min_element() > 0.0) {
            return Err(ConfigError::Range { field: "sampler.half_extents" });
        }
        Ok(())
    }

    /// Maximum number of candidates drawn.
    pub fn max_attempts(&self) -> usize {
        self.target.saturating_mul(self.attempt_factor)
    }
}

/// Result of a sampling run.
#[derive(Debug, Clone)]
pub struct Sampled {
    pub neurons: Vec<Neuron>,
    /// Candidates drawn, at most [`SamplerConfig::max_attempts`].
    pub attempts: usize,
}

impl Sampled {
    /// True when the attempt budget ran out first.
    pub fn is_short(&self, config: &SamplerConfig) -> bool {
        self.neurons.len() < config.target
    }
}

/// Place up to `config.target` neurons inside `volume`.
///
/// A candidate is kept only if its population matches its depth band:
/// cortical neurons hug the surface (`proximity < band`), subcortical ones
/// stay deeper. Running out of attempts is not an error; the caller gets
/// fewer neurons.
pub fn sample_neurons<V, R>(volume: &V, config: &SamplerConfig, rng: &mut R) -> Sampled
where
    V: Volume + ?Sized,
    R: Rng + ?Sized,
{
    let max_attempts = config.max_attempts();
    let mut neurons = Vec::with_capacity(config.target);
    let mut attempts = 0;

    while neurons.len() < config.target && attempts < max_attempts {
        attempts += 1;

        let p = random_in_box(rng, config.half_extents);
        if !volume.contains(p) {
            continue;
        }

        let proximity = volume.surface_proximity(p);
        let population = if rng.gen::<f32>() < config.cortical_ratio {
            Population::Cortical
        } else {
            Population::Subcortical
        };

        let in_band = match population {
            Population::Cortical => proximity < config.surface_band,
            Population::Subcortical => proximity >= config.surface_band,
        };
        if in_band {
            neurons.push(Neuron::new(neurons.len(), p, population));
        }
    }

    if neurons.len() < config.target {
        tracing::debug!(
            sampled = neurons.len(),
            target = config.target,
            attempts,
            "attempt budget exhausted before reaching target population"
        );
    }

    Sampled { neurons, attempts }
}
