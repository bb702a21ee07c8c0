//! Network data model.
//!
//! Neurons live in one flat array; synapses refer to them by index, so the
//! graph has no ownership cycles and buffer writes line up with
//! [`Neuron::index`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Which band of the volume a neuron was sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Population {
    /// Near the surface.
    Cortical,
    /// Interior.
    Subcortical,
}

impl Population {
    pub fn is_cortical(self) -> bool {
        matches!(self, Population::Cortical)
    }
}

/// One node of the simulated network.
#[derive(Debug, Clone)]
pub struct Neuron {
    position: Vec3,
    population: Population,
    index: usize,
    /// Firing intensity, `0` when quiescent. Decays every tick.
    pub firing: f32,
    /// Seconds left before the neuron may fire again. Never negative.
    pub refractory: f32,
    /// Per-frame ambient firing probability at the 60 fps baseline.
    pub spike_chance: f32,
    /// Revealed by the choreography; only visible neurons fire spontaneously.
    pub visible: bool,
    /// Fade-in progress, `0..=1`.
    pub reveal: f32,
    /// Number of times this neuron has fired.
    pub spikes: u32,
}

impl Neuron {
    /// Initial ambient spike probability before any phase has run.
    pub const RESTING_SPIKE_CHANCE: f32 = 0.002;

    pub fn new(index: usize, position: Vec3, population: Population) -> Self {
        Self {
            position,
            population,
            index,
            firing: 0.0,
            refractory: 0.0,
            spike_chance: Self::RESTING_SPIKE_CHANCE,
            visible: false,
            reveal: 0.0,
            spikes: 0,
        }
    }

    /// Position, fixed at sampling time.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn population(&self) -> Population {
        self.population
    }

    /// Stable slot in the neuron array and in every per-neuron buffer.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// False while the refractory timer is running.
    #[inline]
    pub fn can_fire(&self) -> bool {
        self.refractory <= 0.0
    }
}

/// A signal travelling along one synapse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packet {
    /// `0` at the source, `1` at the destination.
    pub progress: f32,
    /// Progress per 60 fps frame.
    pub speed: f32,
    /// Render brightness.
    pub intensity: f32,
    pub(crate) delivered: bool,
}

impl Packet {
    pub fn new(speed: f32, intensity: f32) -> Self {
        Self {
            progress: 0.0,
            speed,
            intensity,
            delivered: false,
        }
    }

    /// Whether the arrival side effect has already been applied.
    pub fn delivered(&self) -> bool {
        self.delivered
    }
}

/// Directed connection between two neurons.
#[derive(Debug, Clone)]
pub struct Synapse {
    pub from: usize,
    pub to: usize,
    /// Euclidean length, fixed at build time.
    pub length: f32,
    pub long_range: bool,
    /// Drawn even without traffic.
    pub show_idle: bool,
    pub packets: Vec<Packet>,
}

impl Synapse {
    pub fn new(from: usize, to: usize, length: f32, long_range: bool, show_idle: bool) -> Self {
        Self {
            from,
            to,
            length,
            long_range,
            show_idle,
            packets: Vec::new(),
        }
    }

    /// True while at least one packet is in flight.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.packets.is_empty()
    }

    /// Idle, invisible synapses are never drawn.
    #[inline]
    pub fn is_drawn(&self) -> bool {
        self.show_idle || self.is_active()
    }
}
