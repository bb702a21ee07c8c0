//! The lighter 2D loader.
//!
//! Fifty-odd nodes scattered around a ring, wired to a few of their nearest
//! neighbors. Instead of stochastic propagation a fixed path of nodes lights
//! up in order. Four phases repeat: seed (nodes flicker on, edges draw in),
//! inference (the pulse walks the path), converge (nodes drift toward a
//! circle) and unlock (everything glows and dims).

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::choreography::{Choreographer, PhaseState};
use crate::connectivity::k_nearest;
use crate::error::ConfigError;
use crate::frame::{BlendMode, Frame, Segment, Shape, Sprite, Viewport, Visualization};

const STATUS_LABELS: [&str; 4] = ["LOADING", "SHADERS", "TEXTURES", "AUDIO"];

/// Gate layout and choreography parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub node_count: usize,
    /// Node radii, smallest first.
    pub sizes: [f32; 3],
    /// Cumulative population fractions for the first two sizes.
    pub size_split: [f32; 2],
    /// Inner radius of the placement ring, in pixels.
    pub ring_radius: f32,
    /// Random extra radius added on top of `ring_radius`.
    pub ring_spread: f32,
    /// Full width of the positional jitter box.
    pub jitter: f32,
    /// Neighbor candidates considered per node.
    pub k: usize,
    pub max_edges: usize,
    /// Probability a candidate becomes an edge.
    pub accept_probability: f32,
    pub dust_count: usize,
    /// Full width of the dust velocity range, pixels per 60 fps frame.
    pub dust_speed: f32,
    /// Node indices lit in order during inference.
    pub pulse_path: Vec<usize>,
    /// Seed, inference, converge and unlock durations in seconds.
    pub durations: Vec<f32>,
    /// Radius of the circle nodes converge toward.
    pub converge_radius: f32,
    /// How far along the way to that circle they travel.
    pub converge_fraction: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            node_count: 55,
            sizes: [1.5, 2.5, 4.0],
            size_split: [0.6, 0.9],
            ring_radius: 180.0,
            ring_spread: 140.0,
            jitter: 80.0,
            k: 4,
            max_edges: 180,
            accept_probability: 0.65,
            dust_count: 15,
            dust_speed: 0.15,
            pulse_path: vec![0, 5, 11, 18, 26, 34, 42, 49, 54],
            durations: vec![0.45, 1.4, 0.5, 0.45],
            converge_radius: 250.0,
            converge_fraction: 0.3,
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(&node) = self.pulse_path.iter().find(|&&n| n >= self.node_count) {
            return Err(ConfigError::PulsePath {
                node,
                count: self.node_count,
            });
        }
        if self.durations.len() != 4 {
            return Err(ConfigError::Range { field: "gate.durations" });
        }
        crate::choreography::PhaseSchedule::new(self.durations.clone())?;
        if !(0.0..=1.0).contains(&self.accept_probability) {
            return Err(ConfigError::Range { field: "gate.accept_probability" });
        }
        Ok(())
    }

    fn size_for(&self, i: usize) -> f32 {
        let f = i as f32 / self.node_count.max(1) as f32;
        if f < self.size_split[0] {
            self.sizes[0]
        } else if f < self.size_split[1] {
            self.sizes[1]
        } else {
            self.sizes[2]
        }
    }
}

#[derive(Debug, Clone)]
struct GateNode {
    /// Offset from the viewport center at mount.
    base: Vec2,
    /// Current offset from the viewport center.
    offset: Vec2,
    size: f32,
    depth: f32,
    opacity: f32,
    glow: f32,
    ring_wave: f32,
    specular_phase: f32,
}

#[derive(Debug, Clone)]
struct GateEdge {
    from: usize,
    to: usize,
    draw_progress: f32,
    pulse: f32,
    shimmer_offset: f32,
}

#[derive(Debug, Clone, Copy)]
struct Dust {
    position: Vec2,
    velocity: Vec2,
}

/// The gate loader.
#[derive(Debug, Clone)]
pub struct SynapseGate {
    config: GateConfig,
    nodes: Vec<GateNode>,
    edges: Vec<GateEdge>,
    /// Edge indices touching each node.
    incident: Vec<Vec<usize>>,
    dust: Vec<Dust>,
    choreographer: Choreographer,
    state: PhaseState,
    viewport: Viewport,
    t: f32,
}

/// Gate phases, in schedule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Seed,
    Inference,
    Converge,
    Unlock,
}

impl GatePhase {
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => GatePhase::Seed,
            1 => GatePhase::Inference,
            2 => GatePhase::Converge,
            _ => GatePhase::Unlock,
        }
    }
}

impl SynapseGate {
    pub fn new<R: Rng + ?Sized>(config: GateConfig, viewport: Viewport, rng: &mut R) -> Result<Self, ConfigError> {
        config.validate()?;
        let schedule = crate::choreography::PhaseSchedule::new(config.durations.clone())?;

        let n = config.node_count;
        let half_jitter = config.jitter * 0.5;
        let nodes: Vec<GateNode> = (0..n)
            .map(|i| {
                let angle = i as f32 / n as f32 * TAU;
                let radius = config.ring_radius + rng.gen::<f32>() * config.ring_spread;
                let jx = rng.gen_range(-half_jitter..=half_jitter);
                let jy = rng.gen_range(-half_jitter..=half_jitter);
                let base = Vec2::from_angle(angle) * radius + Vec2::new(jx, jy);
                GateNode {
                    base,
                    offset: base,
                    size: config.size_for(i),
                    depth: rng.gen_range(-0.25..=0.25),
                    opacity: 0.0,
                    glow: 0.0,
                    ring_wave: 0.0,
                    specular_phase: rng.gen::<f32>() * TAU,
                }
            })
            .collect();

        let positions: Vec<Vec2> = nodes.iter().map(|n| n.base).collect();
        let mut edges = Vec::new();
        for i in 0..n {
            for j in k_nearest(&positions, i, config.k) {
                if edges.len() < config.max_edges && rng.gen::<f32>() < config.accept_probability {
                    edges.push(GateEdge {
                        from: i,
                        to: j,
                        draw_progress: 0.0,
                        pulse: 0.0,
                        shimmer_offset: rng.gen::<f32>() * TAU,
                    });
                }
            }
        }

        let mut incident = vec![Vec::new(); n];
        for (e, edge) in edges.iter().enumerate() {
            incident[edge.from].push(e);
            if edge.to != edge.from {
                incident[edge.to].push(e);
            }
        }

        let half = config.dust_speed * 0.5;
        let dust = (0..config.dust_count)
            .map(|_| Dust {
                position: Vec2::new(
                    rng.gen::<f32>() * viewport.width,
                    rng.gen::<f32>() * viewport.height,
                ),
                velocity: Vec2::new(rng.gen_range(-half..=half), rng.gen_range(-half..=half)),
            })
            .collect();

        tracing::debug!(nodes = n, edges = edges.len(), "built synapse gate");

        let choreographer = Choreographer::new(schedule);
        let state = choreographer.at(0.0);
        Ok(Self {
            config,
            nodes,
            edges,
            incident,
            dust,
            choreographer,
            state,
            viewport,
            t: 0.0,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// `(from, to)` pairs in creation order.
    pub fn edge_pairs(&self) -> Vec<(usize, usize)> {
        self.edges.iter().map(|e| (e.from, e.to)).collect()
    }

    pub fn phase(&self) -> PhaseState {
        self.state
    }

    /// Current node positions relative to the viewport center.
    pub fn node_offsets(&self) -> Vec<Vec2> {
        self.nodes.iter().map(|n| n.offset).collect()
    }

    pub fn node_base_offsets(&self) -> Vec<Vec2> {
        self.nodes.iter().map(|n| n.base).collect()
    }

    pub fn node_sizes(&self) -> Vec<f32> {
        self.nodes.iter().map(|n| n.size).collect()
    }

    pub fn node_opacity(&self, i: usize) -> f32 {
        self.nodes.get(i).map(|n| n.opacity).unwrap_or(0.0)
    }

    pub fn node_glow(&self, i: usize) -> f32 {
        self.nodes.get(i).map(|n| n.glow).unwrap_or(0.0)
    }

    pub fn dust_positions(&self) -> Vec<Vec2> {
        self.dust.iter().map(|d| d.position).collect()
    }

    /// Seconds into the current cycle.
    fn cycle_time(&self) -> f32 {
        let durations = self.choreographer.schedule().durations();
        let before: f32 = durations[..self.state.index].iter().sum();
        before + self.state.progress * durations[self.state.index]
    }

    fn converge_toward(&mut self, amount: f32) {
        let n = self.nodes.len() as f32;
        let fraction = self.config.converge_fraction;
        let radius = self.config.converge_radius;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let target = Vec2::from_angle(i as f32 / n * TAU) * radius;
            node.offset = node.base + (target - node.base) * amount * fraction;
        }
    }

    fn seed(&mut self, p: f32) {
        let n = self.nodes.len().max(1) as f32;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let delay = i as f32 / n * 0.3;
            if p > delay {
                let flicker = (p - delay) / 0.15;
                node.opacity = (flicker * 1.5 + (flicker * 20.0).sin() * 0.2).min(1.0);
            }
        }
        let e = self.edges.len().max(1) as f32;
        for (i, edge) in self.edges.iter_mut().enumerate() {
            let delay = i as f32 / e * 0.35;
            if p > delay {
                edge.draw_progress = ((p - delay) / 0.1).min(1.0);
            }
        }
    }

    fn inference(&mut self, p: f32, frames: f32) {
        for node in &mut self.nodes {
            node.opacity = 1.0;
        }
        for edge in &mut self.edges {
            edge.draw_progress = 1.0;
        }

        let len = self.config.pulse_path.len();
        let reached = (p * len as f32).floor() as usize;
        for (step, &node) in self.config.pulse_path.iter().enumerate().take(reached.saturating_add(1)) {
            let n = &mut self.nodes[node];
            n.glow = 1.0;
            n.ring_wave = (p * len as f32 - step as f32) * 40.0;
            for &e in &self.incident[node] {
                self.edges[e].pulse = 0.8;
            }
        }

        let glow_decay = 0.95f32.powf(frames);
        let wave_decay = 0.92f32.powf(frames);
        let pulse_decay = 0.9f32.powf(frames);
        for node in &mut self.nodes {
            node.glow *= glow_decay;
            if node.ring_wave > 0.0 {
                node.ring_wave *= wave_decay;
            }
        }
        for edge in &mut self.edges {
            edge.pulse *= pulse_decay;
        }
    }

    fn unlock(&mut self, p: f32) {
        for node in &mut self.nodes {
            node.glow = node.glow.max(p * 1.5);
            node.opacity = 1.0 - p * 0.5;
        }
        for edge in &mut self.edges {
            edge.pulse = p;
        }
    }
}

impl Visualization for SynapseGate {
    fn update(&mut self, t: f32, dt: f32) {
        self.t = t;
        let frames = dt.max(0.0) * 60.0;

        let size = self.viewport.size();
        for d in &mut self.dust {
            d.position += d.velocity * frames;
            if d.position.x < 0.0 {
                d.position.x = size.x;
            }
            if d.position.x > size.x {
                d.position.x = 0.0;
            }
            if d.position.y < 0.0 {
                d.position.y = size.y;
            }
            if d.position.y > size.y {
                d.position.y = 0.0;
            }
        }

        self.state = self.choreographer.at(t);
        let p = self.state.progress;
        match GatePhase::from_index(self.state.index) {
            GatePhase::Seed => {
                // Nodes stay where the previous converge left them
                if self.state.cycle > 0 {
                    self.converge_toward(1.0);
                }
                self.seed(p);
            }
            GatePhase::Inference => {
                if self.state.cycle > 0 {
                    self.converge_toward(1.0);
                }
                self.inference(p, frames);
            }
            GatePhase::Converge => self.converge_toward(p),
            GatePhase::Unlock => {
                self.converge_toward(1.0);
                self.unlock(p);
            }
        }
    }

    fn draw(&self, frame: &mut Frame, viewport: Viewport) {
        let layer = &mut frame.overlay;
        layer.blend = BlendMode::Alpha;
        let center = viewport.center();
        let at = |offset: Vec2| (center + offset).extend(0.0);

        for d in &self.dust {
            layer.sprite(
                Sprite::new(d.position.extend(0.0), 1.0, [0.0, 0.0, 1.0, 0.03]).with_shape(Shape::Square, 0.0),
            );
        }

        for edge in &self.edges {
            if edge.draw_progress == 0.0 {
                continue;
            }
            let from = self.nodes[edge.from].offset;
            let to = self.nodes[edge.to].offset;
            let end = from + (to - from) * edge.draw_progress;
            let opacity = 0.15 + edge.pulse * 0.4;
            let width = 0.5 + edge.pulse * 0.75;
            layer.segment(Segment::new(at(from), at(end), width, [0.0, 0.0, 1.0, opacity]));

            if edge.pulse > 0.2 {
                let shimmer = (self.t * 3.0 + edge.shimmer_offset).sin() * 0.5 + 0.5;
                let mid = (from + end) * 0.5;
                layer.sprite(
                    Sprite::new(at(mid), 2.0, [0.0, 0.0, 1.0, shimmer * edge.pulse * 0.3])
                        .with_shape(Shape::Square, 0.0),
                );
            }
        }

        for node in &self.nodes {
            if node.opacity == 0.0 {
                continue;
            }
            let pos = at(node.offset);

            if node.glow > 0.1 {
                let radius = 6.0 + node.size * 2.0 + node.glow * 12.0;
                layer.sprite(
                    Sprite::new(pos, radius * 2.0, [0.0, 0.0, 1.0, node.glow * 0.5]).with_shape(Shape::Glow, 0.0),
                );
            }

            if node.ring_wave > 0.0 && node.ring_wave < 50.0 {
                let alpha = (1.0 - node.ring_wave / 50.0) * 0.6;
                layer.sprite(
                    Sprite::new(pos, node.ring_wave * 2.0, [0.0, 0.0, 1.0, alpha])
                        .with_shape(Shape::Ring, 1.0 / node.ring_wave.max(1.0)),
                );
            }

            let depth_scale = 1.0 + node.depth * 0.1;
            let opacity = node.opacity.clamp(0.0, 1.0);
            layer.sprite(
                Sprite::new(pos, node.size * depth_scale * 2.0, [0.0, 0.0, 1.0, opacity]).with_shape(Shape::Disc, 0.0),
            );

            let glint = Vec2::from_angle(self.t + node.specular_phase) * node.size * 0.4;
            layer.sprite(
                Sprite::new(pos + Vec3::new(glint.x, glint.y, 0.0), node.size * 0.3, [1.0, 1.0, 1.0, opacity * 0.8])
                    .with_shape(Shape::Square, 0.0),
            );
        }
    }

    fn pointer_moved(&mut self, _position: Vec2, _viewport: Viewport) {}

    fn resized(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_loaded(&mut self, t: f32) {
        self.choreographer.set_loaded(t);
    }

    /// Asset label while loading, empty once the aperture opens.
    fn status(&self) -> &str {
        if GatePhase::from_index(self.state.index) == GatePhase::Unlock {
            return "";
        }
        let durations = self.choreographer.schedule().durations();
        let span: f32 = durations[..3].iter().sum();
        let slot = (self.cycle_time() / span * STATUS_LABELS.len() as f32).floor() as usize;
        STATUS_LABELS[slot.min(STATUS_LABELS.len() - 1)]
    }
}
