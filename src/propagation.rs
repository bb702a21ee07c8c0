//! Spike propagation.
//!
//! Firing intensity and refractory time are two independent decaying
//! quantities per neuron. A neuron that fires sends one packet down each
//! outgoing synapse; packets that reach the arrival threshold sensitize
//! their destination and may make it fire in turn.
//!
//! All rates are expressed per frame at a 60 fps baseline and scaled by
//! `dt`, so animation speed does not depend on the display refresh rate.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::connectivity::Connectome;
use crate::error::ConfigError;
use crate::neuron::{Neuron, Packet};

/// Firing intensities below this snap to zero.
const FIRING_EPSILON: f32 = 1e-3;

/// Propagation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Seconds a neuron stays refractory after firing.
    pub refractory: f32,
    /// Multiplicative firing decay per baseline frame.
    pub firing_decay: f32,
    /// Packet speed range, progress per baseline frame.
    pub speed_min: f32,
    pub speed_max: f32,
    /// Packet render intensity range.
    pub intensity_min: f32,
    pub intensity_max: f32,
    /// Progress at which a packet delivers its arrival effect.
    pub arrival_threshold: f32,
    /// Chance an arrival fires the destination.
    pub arrival_fire_probability: f32,
    /// Spike-chance multiplier applied to the destination on arrival.
    pub sensitization: f32,
    /// Ceiling for sensitized spike chance.
    pub sensitization_cap: f32,
    /// Frame rate the per-frame constants were tuned at.
    pub baseline_fps: f32,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            refractory: 0.15,
            firing_decay: 0.85,
            speed_min: 0.015,
            speed_max: 0.025,
            intensity_min: 0.8,
            intensity_max: 1.0,
            arrival_threshold: 0.95,
            arrival_fire_probability: 0.6,
            sensitization: 1.5,
            sensitization_cap: 0.3,
            baseline_fps: 60.0,
        }
    }
}

impl PropagationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.refractory >= 0.0) {
            return Err(ConfigError::Range { field: "propagation.refractory" });
        }
        if !(0.0..=1.0).contains(&self.firing_decay) {
            return Err(ConfigError::Range { field: "propagation.firing_decay" });
        }
        if !(self.speed_min > 0.0 && self.speed_min <= self.speed_max) {
            return Err(ConfigError::Range { field: "propagation.speed_min" });
        }
        if !(self.intensity_min >= 0.0 && self.intensity_min <= self.intensity_max) {
            return Err(ConfigError::Range { field: "propagation.intensity_min" });
        }
        if !(self.arrival_threshold > 0.0 && self.arrival_threshold <= 1.0) {
            return Err(ConfigError::Range { field: "propagation.arrival_threshold" });
        }
        if !(0.0..=1.0).contains(&self.arrival_fire_probability) {
            return Err(ConfigError::Range { field: "propagation.arrival_fire_probability" });
        }
        if !(self.sensitization >= 1.0) {
            return Err(ConfigError::Range { field: "propagation.sensitization" });
        }
        if !(self.baseline_fps > 0.0) {
            return Err(ConfigError::Range { field: "propagation.baseline_fps" });
        }
        Ok(())
    }
}

/// Counters for one [`Propagation::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Neurons that fired, spontaneously or from an arrival.
    pub fired: usize,
    /// Arrival effects delivered.
    pub arrivals: usize,
    /// Packets removed after reaching their destination.
    pub removed: usize,
}

/// The propagation engine. Owns only scratch buffers; the network itself is
/// passed in so the caller decides who else may read it.
#[derive(Debug, Clone, Default)]
pub struct Propagation {
    config: PropagationConfig,
    arrivals: Vec<usize>,
    changed: Vec<usize>,
}

impl Propagation {
    pub fn new(config: PropagationConfig) -> Self {
        Self {
            config,
            arrivals: Vec::new(),
            changed: Vec::new(),
        }
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    /// Neurons whose firing intensity changed during the last tick.
    pub fn changed(&self) -> &[usize] {
        &self.changed
    }

    /// Fire neuron `i` unless it is refractory.
    ///
    /// Returns whether it fired. Each outgoing synapse gets one new packet
    /// with a random speed and intensity.
    pub fn fire<R: Rng + ?Sized>(
        &mut self,
        neurons: &mut [Neuron],
        graph: &mut Connectome,
        i: usize,
        rng: &mut R,
    ) -> bool {
        let Some(neuron) = neurons.get_mut(i) else {
            return false;
        };
        if !neuron.can_fire() {
            return false;
        }
        neuron.firing = 1.0;
        neuron.refractory = self.config.refractory;
        neuron.spikes = neuron.spikes.saturating_add(1);
        self.changed.push(i);

        let c = self.config;
        graph.emit_from(i, || {
            let speed = rng.gen_range(c.speed_min..=c.speed_max);
            let intensity = rng.gen_range(c.intensity_min..=c.intensity_max);
            Packet::new(speed, intensity)
        });
        true
    }

    /// Advance the network by `dt` seconds.
    ///
    /// Order within a tick: per-neuron decay, refractory countdown and
    /// spontaneous firing; then every packet advances; then the arrivals
    /// collected during the advance are applied. Packets emitted by an
    /// arrival start moving on the next tick.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        neurons: &mut [Neuron],
        graph: &mut Connectome,
        dt: f32,
        rng: &mut R,
    ) -> TickStats {
        let c = self.config;
        let frames = dt.max(0.0) * c.baseline_fps;
        let decay = c.firing_decay.powf(frames);
        let mut stats = TickStats::default();
        self.changed.clear();
        self.arrivals.clear();

        for i in 0..neurons.len() {
            let n = &mut neurons[i];
            if n.firing > 0.0 {
                n.firing *= decay;
                if n.firing < FIRING_EPSILON {
                    n.firing = 0.0;
                }
                self.changed.push(i);
            }
            n.refractory = (n.refractory - dt).max(0.0);

            if n.visible && n.can_fire() && rng.gen::<f32>() < n.spike_chance * frames {
                self.fire(neurons, graph, i, rng);
                stats.fired += 1;
            }
        }

        for synapse in &mut graph.synapses {
            let to = synapse.to;
            let before = synapse.packets.len();
            for packet in &mut synapse.packets {
                packet.progress += packet.speed * frames;
                if !packet.delivered && packet.progress >= c.arrival_threshold {
                    packet.delivered = true;
                    self.arrivals.push(to);
                }
            }
            synapse.packets.retain(|p| p.progress < 1.0);
            stats.removed += before - synapse.packets.len();
        }

        let arrivals = std::mem::take(&mut self.arrivals);
        for &to in &arrivals {
            let n = &mut neurons[to];
            n.spike_chance = (n.spike_chance * c.sensitization).min(c.sensitization_cap);
            if rng.gen::<f32>() < c.arrival_fire_probability && self.fire(neurons, graph, to, rng) {
                stats.fired += 1;
            }
        }
        stats.arrivals = arrivals.len();
        self.arrivals = arrivals;

        stats
    }

    /// Rebuild `out` with the world position and intensity of every packet.
    pub fn packet_positions(neurons: &[Neuron], graph: &Connectome, out: &mut Vec<(Vec3, f32)>) {
        out.clear();
        for s in &graph.synapses {
            let (a, b) = (neurons[s.from].position(), neurons[s.to].position());
            out.extend(s.packets.iter().map(|p| (a.lerp(b, p.progress), p.intensity)));
        }
    }
}
