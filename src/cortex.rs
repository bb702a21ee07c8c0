//! The 3D loader: a brain-shaped cloud of neurons lighting up in phases.
//!
//! [`CortexLoader`] is the single simulation-state struct. One
//! [`update`](Visualization::update) runs, in order, the choreography, the
//! propagation tick, the color buffer refresh, the packet buffer rebuild and
//! the parallax filter. [`draw`](Visualization::draw) only reads.

use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;

use crate::camera::{Camera, Parallax};
use crate::choreography::{BootPhase, Choreographer, ChoreographyConfig, PhaseState};
use crate::config::{LoaderConfig, RenderConfig};
use crate::connectivity::Connectome;
use crate::error::ConfigError;
use crate::frame::{BlendMode, Fog, Frame, Segment, Shape, Sprite, Viewport, Visualization};
use crate::neuron::Neuron;
use crate::propagation::{Propagation, TickStats};
use crate::spawn::{rng_from_seed, sample_neurons};

/// The cortex loader's whole state.
pub struct CortexLoader {
    neurons: Vec<Neuron>,
    graph: Connectome,
    propagation: Propagation,
    choreographer: Choreographer,
    choreography: ChoreographyConfig,
    state: PhaseState,
    camera: Camera,
    parallax: Parallax,
    render: RenderConfig,
    /// Blue level per neuron, refreshed only where firing changed.
    intensity: Vec<f32>,
    /// Packet world positions and intensities, rebuilt every update.
    packets: Vec<(Vec3, f32)>,
    rng: SmallRng,
    attempts: usize,
    last_tick: TickStats,
}

impl CortexLoader {
    /// Sample the neurons and wire them up.
    pub fn new(config: &LoaderConfig, viewport: Viewport) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = rng_from_seed(config.seed);

        let sampled = sample_neurons(&config.volume, &config.sampler, &mut rng);
        if sampled.is_short(&config.sampler) {
            tracing::debug!(
                placed = sampled.neurons.len(),
                target = config.sampler.target,
                "sampler ran out of attempts"
            );
        }
        let graph = Connectome::build(&sampled.neurons, &config.connectivity, &mut rng);

        tracing::info!(
            neurons = sampled.neurons.len(),
            synapses = graph.len(),
            attempts = sampled.attempts,
            "built cortex"
        );

        let mut camera = config.camera;
        camera.resize(viewport.width as u32, viewport.height as u32);
        let choreographer = Choreographer::new(config.choreography.schedule()?);
        let state = choreographer.at(0.0);
        let intensity = vec![config.render.idle_intensity; sampled.neurons.len()];

        Ok(Self {
            neurons: sampled.neurons,
            graph,
            propagation: Propagation::new(config.propagation),
            choreographer,
            choreography: config.choreography.clone(),
            state,
            camera,
            parallax: config.parallax,
            render: config.render.clone(),
            intensity,
            packets: Vec::new(),
            rng,
            attempts: sampled.attempts,
            last_tick: TickStats::default(),
        })
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn graph(&self) -> &Connectome {
        &self.graph
    }

    /// Sampling attempts spent building the cloud.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn phase(&self) -> PhaseState {
        self.state
    }

    pub fn boot_phase(&self) -> BootPhase {
        BootPhase::from_index(self.state.index)
    }

    pub fn last_tick(&self) -> TickStats {
        self.last_tick
    }

    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }

    pub fn parallax(&self) -> &Parallax {
        &self.parallax
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Blue level of neuron `i` as last written to the color buffer.
    pub fn intensity(&self, i: usize) -> f32 {
        self.intensity.get(i).copied().unwrap_or(0.0)
    }

    /// Fire neuron `i` by hand. Refractory neurons ignore it.
    pub fn fire(&mut self, i: usize) -> bool {
        self.propagation.fire(&mut self.neurons, &mut self.graph, i, &mut self.rng)
    }

    /// Point opacity for the current phase.
    pub fn opacity(&self) -> f32 {
        self.choreography.opacity(self.state.index, self.choreographer.schedule().len())
    }

    fn refresh_colors(&mut self) {
        let idle = self.render.idle_intensity;
        let gain = self.render.firing_gain;
        for &i in self.propagation.changed() {
            self.intensity[i] = idle + self.neurons[i].firing * gain;
        }
    }
}

impl Visualization for CortexLoader {
    fn update(&mut self, t: f32, dt: f32) {
        let frames = dt.max(0.0) * self.propagation.config().baseline_fps;

        self.state = self.choreographer.at(t);
        BootPhase::from_index(self.state.index).apply(&mut self.neurons, self.state.progress, frames);

        self.last_tick = self
            .propagation
            .tick(&mut self.neurons, &mut self.graph, dt, &mut self.rng);

        self.refresh_colors();
        Propagation::packet_positions(&self.neurons, &self.graph, &mut self.packets);
        self.parallax.update(frames);
    }

    fn draw(&self, frame: &mut Frame, _viewport: Viewport) {
        frame.clear = self.render.clear_color;
        let layer = &mut frame.world;
        layer.view_proj = self.camera.view_proj();
        // Neurons, synapses and packets share one model matrix so they stay locked together
        layer.model = self.parallax.model();
        layer.attenuate = true;
        layer.fog = Some(Fog {
            near: self.render.fog_near,
            far: self.render.fog_far,
        });
        layer.blend = BlendMode::Additive;

        for synapse in self.graph.synapses.iter().filter(|s| s.is_drawn()) {
            let blue = if synapse.is_active() {
                self.render.synapse_active
            } else {
                self.render.synapse_idle
            };
            layer.segment(Segment::new(
                self.neurons[synapse.from].position(),
                self.neurons[synapse.to].position(),
                self.render.synapse_width,
                [0.0, 0.0, 1.0, blue * self.render.synapse_opacity],
            ));
        }

        let opacity = self.opacity();
        for (neuron, &blue) in self.neurons.iter().zip(&self.intensity) {
            if neuron.reveal <= 0.0 {
                continue;
            }
            let size = if neuron.population().is_cortical() {
                self.render.cortical_size
            } else {
                self.render.subcortical_size
            };
            layer.sprite(Sprite::new(
                neuron.position(),
                size,
                [0.0, 0.0, 1.0, blue * opacity * neuron.reveal],
            ));
        }

        for &(position, intensity) in &self.packets {
            layer.sprite(
                Sprite::new(
                    position,
                    self.render.packet_size,
                    [0.0, 0.0, 1.0, self.render.packet_opacity * intensity],
                )
                .with_shape(Shape::SoftDisc, 0.0),
            );
        }
    }

    fn pointer_moved(&mut self, position: Vec2, viewport: Viewport) {
        self.parallax.point_at(position / viewport.size());
    }

    fn resized(&mut self, viewport: Viewport) {
        self.camera.resize(viewport.width as u32, viewport.height as u32);
    }

    fn set_loaded(&mut self, t: f32) {
        self.choreographer.set_loaded(t);
    }

    fn status(&self) -> &str {
        match self.boot_phase() {
            BootPhase::Boot => "boot",
            BootPhase::Growth => "growth",
            BootPhase::Resonance => "resonance",
            BootPhase::Convergence => "convergence",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn small_config(seed: u64) -> LoaderConfig {
        let mut config = LoaderConfig::default().with_seed(seed);
        config.sampler.target = 300;
        config.connectivity.long_range_count = 20;
        config
    }

    fn loader(seed: u64) -> CortexLoader {
        CortexLoader::new(&small_config(seed), Viewport::new(800, 600)).unwrap()
    }

    #[test]
    fn test_build_counts() {
        let c = loader(1);
        assert!(!c.neurons().is_empty());
        assert!(c.neurons().len() <= 300);
        assert!(c.attempts() <= 1500);
        assert!(c.graph().len() >= c.neurons().len() * 6);
    }

    #[test]
    fn test_nothing_drawn_before_reveal() {
        let c = loader(2);
        let vp = Viewport::new(800, 600);
        let mut frame = Frame::new(vp);
        c.draw(&mut frame, vp);
        assert!(frame.world.sprites.is_empty());
        assert!(frame.world.attenuate);
        assert_eq!(frame.world.blend, BlendMode::Additive);
    }

    #[test]
    fn test_phases_reveal_everything() {
        let mut c = loader(3);
        let mut t = 0.0;
        while t < 2.5 {
            t += DT;
            c.update(t, DT);
        }
        assert_eq!(c.boot_phase(), BootPhase::Resonance);
        assert!(c.neurons().iter().all(|n| n.visible && n.reveal == 1.0));
        assert_eq!(c.status(), "resonance");
    }

    #[test]
    fn test_manual_fire_updates_color_and_packets() {
        let mut c = loader(4);
        assert!(c.fire(0));
        assert!(!c.fire(0));
        let outgoing = c.graph().outgoing(0).len();
        assert_eq!(c.graph().packet_count(), outgoing);

        c.update(DT, DT);
        assert!(c.intensity(0) > c.render.idle_intensity);
        assert!(c.packet_count() >= outgoing);
    }

    #[test]
    fn test_loaded_holds_convergence() {
        let mut c = loader(5);
        c.set_loaded(0.5);
        let mut t = 0.0;
        while t < 5.0 {
            t += DT;
            c.update(t, DT);
        }
        assert!(c.phase().held);
        assert_eq!(c.boot_phase(), BootPhase::Convergence);
        assert!((c.opacity() - 0.30).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_retargets_parallax() {
        let mut c = loader(6);
        let vp = Viewport::new(800, 600);
        c.pointer_moved(Vec2::new(800.0, 300.0), vp);
        assert!((c.parallax().target().y - 0.15).abs() < 1e-6);
        c.resized(Viewport::new(1000, 500));
        assert_eq!(c.camera().aspect(), 2.0);
    }
}
