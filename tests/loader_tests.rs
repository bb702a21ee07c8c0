//! Integration tests driving the loaders headless through the public API.

use std::collections::{BTreeSet, VecDeque};

use glam::{Vec2, Vec3};
use neuroboot::prelude::*;
use neuroboot::{
    k_nearest, sample_neurons, BrainVolume, Connectome, EnterButton, EnterConfig, Neuron,
    PhaseSchedule, Population, Propagation, PropagationConfig, SamplerConfig, Synapse, Volume,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const DT: f32 = 1.0 / 60.0;

fn small_config(seed: u64) -> LoaderConfig {
    let mut config = LoaderConfig::default().with_seed(seed);
    config.sampler.target = 500;
    config.connectivity.long_range_count = 40;
    config
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_fixed_seed_is_deterministic() {
    let vp = Viewport::new(800, 600);
    let a = CortexLoader::new(&small_config(1234), vp).unwrap();
    let b = CortexLoader::new(&small_config(1234), vp).unwrap();

    assert_eq!(a.neurons().len(), b.neurons().len());
    for (x, y) in a.neurons().iter().zip(b.neurons()) {
        assert_eq!(x.position(), y.position());
        assert_eq!(x.population(), y.population());
    }
    assert_eq!(a.graph().edge_pairs(), b.graph().edge_pairs());
}

#[test]
fn test_different_seeds_differ() {
    let vp = Viewport::new(800, 600);
    let a = CortexLoader::new(&small_config(1), vp).unwrap();
    let b = CortexLoader::new(&small_config(2), vp).unwrap();
    assert_ne!(a.neurons()[0].position(), b.neurons()[0].position());
}

#[test]
fn test_simulation_replays_with_same_seed() {
    let vp = Viewport::new(800, 600);
    let mut a = CortexLoader::new(&small_config(77), vp).unwrap();
    let mut b = CortexLoader::new(&small_config(77), vp).unwrap();

    let mut t = 0.0;
    for _ in 0..240 {
        t += DT;
        a.update(t, DT);
        b.update(t, DT);
    }
    let spikes_a: Vec<u32> = a.neurons().iter().map(|n| n.spikes).collect();
    let spikes_b: Vec<u32> = b.neurons().iter().map(|n| n.spikes).collect();
    assert_eq!(spikes_a, spikes_b);
    assert_eq!(a.packet_count(), b.packet_count());
}

#[test]
fn test_sampled_neurons_stay_inside_volume() {
    let volume = BrainVolume::default();
    let config = SamplerConfig::default();
    let mut rng = SmallRng::seed_from_u64(99);
    let sampled = sample_neurons(&volume, &config, &mut rng);

    assert!(sampled.neurons.len() <= config.target);
    assert!(sampled.attempts <= config.max_attempts());
    for n in &sampled.neurons {
        assert!(volume.contains(n.position()));
        let near_surface = volume.surface_proximity(n.position()) < config.surface_band;
        assert_eq!(n.population() == Population::Cortical, near_surface);
    }
}

// ============================================================================
// Propagation
// ============================================================================

/// Nodes reachable from `source` in at most `hops` steps.
fn within_hops(adjacency: &[Vec<usize>], source: usize, hops: usize) -> BTreeSet<usize> {
    let mut seen = BTreeSet::from([source]);
    let mut queue = VecDeque::from([(source, 0)]);
    while let Some((node, depth)) = queue.pop_front() {
        if depth == hops {
            continue;
        }
        for &next in &adjacency[node] {
            if seen.insert(next) {
                queue.push_back((next, depth + 1));
            }
        }
    }
    seen
}

#[test]
fn test_cascade_is_breadth_bounded() {
    let mut rng = SmallRng::seed_from_u64(2024);
    let positions: Vec<Vec3> = (0..20)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
            )
        })
        .collect();
    let mut neurons: Vec<Neuron> = positions
        .iter()
        .enumerate()
        .map(|(i, &p)| Neuron::new(i, p, Population::Cortical))
        .collect();

    let mut adjacency = vec![Vec::new(); 20];
    let mut edges = Vec::new();
    for i in 0..20 {
        for j in k_nearest(&positions, i, 3) {
            adjacency[i].push(j);
            edges.push(Synapse::new(i, j, positions[i].distance(positions[j]), false, false));
        }
    }
    let mut graph = Connectome::from_edges(20, edges);

    // Every hop takes exactly ten ticks
    let mut engine = Propagation::new(PropagationConfig {
        speed_min: 0.1,
        speed_max: 0.1,
        arrival_fire_probability: 1.0,
        ..Default::default()
    });
    assert!(engine.fire(&mut neurons, &mut graph, 0, &mut rng));

    let mut ticks = 0;
    for hops in 0..4 {
        while ticks < hops * 10 + 5 {
            engine.tick(&mut neurons, &mut graph, DT, &mut rng);
            ticks += 1;
        }
        let fired: BTreeSet<usize> = neurons
            .iter()
            .filter(|n| n.spikes > 0)
            .map(|n| n.index())
            .collect();
        assert_eq!(fired, within_hops(&adjacency, 0, hops), "after {hops} hops");
    }
    assert!(within_hops(&adjacency, 0, 1).len() < 20);
}

// ============================================================================
// Choreography and signals
// ============================================================================

#[test]
fn test_phases_cover_the_cycle() {
    let schedule = PhaseSchedule::new(vec![0.6, 1.4, 0.8, 0.5]).unwrap();
    let total: f32 = schedule.durations().iter().sum();
    assert_eq!(schedule.total(), total);

    let mut seen = [false; 4];
    let mut t = 0.0;
    while t < total * 2.0 {
        let state = schedule.locate(t);
        seen[state.index] = true;
        t += 0.01;
    }
    assert!(seen.iter().all(|&s| s));
}

/// A stripped-down driver: clock, load signal, loader and enter control.
fn drive(visualization: &mut dyn Visualization, load_at: f32, click_at: f32) -> (bool, f32) {
    let vp = Viewport::new(1280, 720);
    let signal = LoadSignal::new();
    let mut enter = EnterButton::new(EnterConfig::default(), &mut SmallRng::seed_from_u64(5));
    let mut clock = Clock::new();
    let mut loaded = false;

    for _ in 0..(60 * 12) {
        let (t, dt) = clock.advance_by(DT);
        if t >= load_at {
            signal.mark_loaded();
        }
        if !loaded && signal.is_loaded() {
            loaded = true;
            visualization.set_loaded(t);
            enter.set_loaded(t);
        }
        visualization.update(t, dt);
        enter.update(t);

        if t >= click_at && enter.accepts_click(enter.center(vp), vp) {
            signal.mark_ready();
        }
        if signal.is_ready() {
            return (true, t);
        }

        let mut frame = Frame::new(vp);
        visualization.draw(&mut frame, vp);
        enter.draw(&mut frame.overlay, vp);
    }
    (false, clock.elapsed())
}

#[test]
fn test_cortex_enters_only_after_load() {
    let mut cortex = CortexLoader::new(&small_config(3), Viewport::new(1280, 720)).unwrap();
    let (ready, t) = drive(&mut cortex, 5.0, 1.0);
    assert!(ready);
    assert!(t >= 5.0);
    assert!(cortex.phase().held || cortex.phase().cycle >= 1);
}

#[test]
fn test_gate_enters_after_unlock_hold() {
    let config = LoaderConfig::default();
    let mut gate =
        SynapseGate::new(config.gate, Viewport::new(1280, 720), &mut SmallRng::seed_from_u64(8)).unwrap();
    let (ready, t) = drive(&mut gate, 1.0, 6.0);
    assert!(ready);
    assert!(t >= 6.0);
    assert!(gate.phase().held);
    assert_eq!(gate.status(), "");
}

#[test]
fn test_gate_pointer_and_resize_are_harmless() {
    let config = LoaderConfig::default();
    let mut gate =
        SynapseGate::new(config.gate, Viewport::new(800, 600), &mut SmallRng::seed_from_u64(9)).unwrap();
    gate.pointer_moved(Vec2::new(10.0, 10.0), Viewport::new(800, 600));
    gate.resized(Viewport::new(0, 0));
    gate.update(0.5, DT);

    let vp = Viewport::new(1, 1);
    let mut frame = Frame::new(vp);
    gate.draw(&mut frame, vp);
    assert!(frame.primitive_count() > 0);
}
