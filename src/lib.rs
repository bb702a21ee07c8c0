//! # Neuroboot
//!
//! A procedural neural-network boot loader rendered with wgpu.
//!
//! While an application loads its real assets, Neuroboot fills a window with
//! a brain-shaped cloud of neurons: spikes travel along synapses, a short
//! phase choreography reveals and excites the network, and once the host
//! signals that loading is done an "enter" control lets the user through.
//! A lighter 2D variant, the synapse gate, plays the same pattern with a
//! few dozen nodes and a scripted pulse.
//!
//! ## Quick Start
//!
//! ```ignore
//! use neuroboot::prelude::*;
//!
//! fn main() -> Result<(), LoaderError> {
//!     let signal = LoadSignal::new();
//!     let loader = signal.clone();
//!     std::thread::spawn(move || {
//!         // ... load assets ...
//!         loader.mark_loaded();
//!     });
//!
//!     LoaderApp::new(LoaderConfig::default())
//!         .with_variant(Variant::Cortex)
//!         .with_signal(signal)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Simulation
//!
//! Neurons are sampled by rejection inside an implicit [`BrainVolume`] and
//! wired to their k nearest neighbors plus a set of long-range
//! cross-hemisphere synapses. Synapses are index pairs into the neuron
//! array. [`Propagation::tick`] advances refractory timers, spontaneous
//! firing and packets; arrivals sensitize and may fire the target.
//!
//! ### Choreography
//!
//! A [`PhaseSchedule`] maps time to a phase and a progress value. The cortex
//! runs boot, growth, resonance and convergence; the gate runs seed,
//! inference, converge and unlock. After the load signal the
//! [`Choreographer`] finishes its cycle and holds the last phase.
//!
//! ### Rendering
//!
//! Loaders implement [`Visualization`] and emit sprites and segments into a
//! [`Frame`]. Only the [`gpu`] module talks to wgpu, so every loader can be
//! stepped and inspected in tests without a window.
//!
//! All time-based effects are normalized to a 60 fps baseline, and every
//! random draw goes through one injected RNG so a fixed seed replays
//! exactly.

mod app;
pub mod camera;
pub mod choreography;
pub mod config;
pub mod connectivity;
pub mod cortex;
pub mod enter;
pub mod error;
pub mod frame;
pub mod gate;
pub mod gpu;
pub mod input;
pub mod neuron;
pub mod propagation;
pub mod shader;
pub mod signals;
pub mod spatial;
pub mod spawn;
pub mod time;
pub mod volume;

pub use app::{LoaderApp, Variant};
pub use camera::{Camera, Parallax};
pub use choreography::{BootPhase, Choreographer, ChoreographyConfig, PhaseSchedule, PhaseState};
pub use config::{LoaderConfig, RenderConfig};
pub use connectivity::{k_nearest, Connectome, ConnectivityConfig, NeighborSearch};
pub use cortex::CortexLoader;
pub use enter::{EnterButton, EnterConfig};
pub use error::{ConfigError, GpuError, LoaderError};
pub use frame::{Frame, Layer, Segment, Sprite, Viewport, Visualization};
pub use gate::{GateConfig, GatePhase, SynapseGate};
pub use neuron::{Neuron, Packet, Population, Synapse};
pub use propagation::{Propagation, PropagationConfig, TickStats};
pub use signals::{HoverSink, HoverState, LoadSignal, PointerStyle};
pub use spawn::{rng_from_seed, sample_neurons, Sampled, SamplerConfig};
pub use volume::{BrainVolume, Ellipsoid, Volume};

pub use glam::{Vec2, Vec3};

/// Everything needed to mount a loader or drive one headless.
pub mod prelude {
    pub use crate::app::{LoaderApp, Variant};
    pub use crate::config::LoaderConfig;
    pub use crate::cortex::CortexLoader;
    pub use crate::error::LoaderError;
    pub use crate::frame::{Frame, Viewport, Visualization};
    pub use crate::gate::SynapseGate;
    pub use crate::signals::LoadSignal;
    pub use crate::time::Clock;
    pub use glam::{Vec2, Vec3};
}
