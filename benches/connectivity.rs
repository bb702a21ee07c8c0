//! Benchmarks for building the connectome and ticking the network.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use neuroboot::spatial::SpatialGrid;
use neuroboot::{
    k_nearest, sample_neurons, BrainVolume, Connectome, ConnectivityConfig, NeighborSearch, Neuron,
    Propagation, PropagationConfig, SamplerConfig,
};

fn cloud(target: usize) -> Vec<Neuron> {
    let config = SamplerConfig {
        target,
        ..Default::default()
    };
    let mut rng = SmallRng::seed_from_u64(42);
    sample_neurons(&BrainVolume::default(), &config, &mut rng).neurons
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("connectome_build");
    group.sample_size(10);

    for &count in &[500usize, 1500, 3000] {
        let neurons = cloud(count);

        for (name, search) in [("brute_force", NeighborSearch::BruteForce), ("grid", NeighborSearch::Grid)] {
            let config = ConnectivityConfig {
                search,
                ..Default::default()
            };
            group.bench_with_input(BenchmarkId::new(name, count), &neurons, |b, neurons| {
                b.iter(|| {
                    let mut rng = SmallRng::seed_from_u64(7);
                    black_box(Connectome::build(neurons, &config, &mut rng))
                })
            });
        }
    }

    group.finish();
}

fn bench_k_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("k_nearest");
    let positions: Vec<Vec3> = cloud(3000).iter().map(Neuron::position).collect();
    let grid = SpatialGrid::auto(&positions, 6);

    group.bench_function("brute_force", |b| {
        b.iter(|| black_box(k_nearest(&positions, black_box(1234), 6)))
    });

    group.bench_function("grid", |b| b.iter(|| black_box(grid.k_nearest(black_box(1234), 6))));

    group.bench_function("grid_build", |b| {
        b.iter(|| black_box(SpatialGrid::auto(&positions, 6)))
    });

    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut neurons = cloud(3000);
    for n in &mut neurons {
        n.visible = true;
        n.spike_chance = 0.02;
    }
    let mut rng = SmallRng::seed_from_u64(3);
    let mut graph = Connectome::build(&neurons, &ConnectivityConfig::default(), &mut rng);
    let mut engine = Propagation::new(PropagationConfig::default());

    // Warm up so packets are in flight
    for _ in 0..120 {
        engine.tick(&mut neurons, &mut graph, 1.0 / 60.0, &mut rng);
    }

    c.bench_function("propagation_tick_3000", |b| {
        b.iter(|| black_box(engine.tick(&mut neurons, &mut graph, black_box(1.0 / 60.0), &mut rng)))
    });
}

criterion_group!(benches, bench_build, bench_k_nearest, bench_tick);
criterion_main!(benches);
