//! Synapse graph construction.
//!
//! Every neuron gets outgoing edges to its `k` nearest neighbors, then a
//! fixed number of long-range edges bridge the two hemispheres. Edges are
//! index pairs into the neuron array.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ConfigError;
use crate::neuron::{Neuron, Packet, Synapse};
use crate::spatial::SpatialGrid;

/// A point type with a Euclidean distance.
pub trait Metric: Copy {
    fn distance(self, other: Self) -> f32;
}

impl Metric for Vec3 {
    #[inline]
    fn distance(self, other: Self) -> f32 {
        Vec3::distance(self, other)
    }
}

impl Metric for Vec2 {
    #[inline]
    fn distance(self, other: Self) -> f32 {
        Vec2::distance(self, other)
    }
}

/// Brute-force k nearest neighbors of `points[index]`, excluding itself.
///
/// Sorted by distance ascending; equal distances keep the lower index first.
/// Returns fewer than `k` when the set is small.
pub fn k_nearest<P: Metric>(points: &[P], index: usize, k: usize) -> Vec<usize> {
    let Some(&query) = points.get(index) else {
        return Vec::new();
    };
    if k == 0 {
        return Vec::new();
    }
    let mut candidates: Vec<(f32, usize)> = points
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != index)
        .map(|(j, &p)| (query.distance(p), j))
        .collect();

    let order = |a: &(f32, usize), b: &(f32, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
    if candidates.len() > k {
        candidates.select_nth_unstable_by(k - 1, order);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(order);
    candidates.into_iter().map(|(_, j)| j).collect()
}

/// How local neighbors are found. Both produce identical edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSearch {
    /// O(n²) scan.
    #[default]
    BruteForce,
    /// Morton-sorted uniform grid.
    Grid,
}

/// Graph construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Local out-degree.
    pub k: usize,
    /// Number of cross-hemisphere edges attempted.
    pub long_range_count: usize,
    /// Neurons with `|x|` at or below this belong to neither hemisphere.
    pub hemisphere_margin: f32,
    /// Probability a local edge is drawn while idle.
    pub idle_local: f32,
    /// Probability a long-range edge is drawn while idle.
    pub idle_long_range: f32,
    /// Drop an edge whose unordered endpoint pair already exists.
    pub dedup_edges: bool,
    pub search: NeighborSearch,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            k: 6,
            long_range_count: 150,
            hemisphere_margin: 30.0,
            idle_local: 0.04,
            idle_long_range: 0.02,
            dedup_edges: false,
            search: NeighborSearch::BruteForce,
        }
    }
}

impl ConnectivityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.idle_local) {
            return Err(ConfigError::Range { field: "connectivity.idle_local" });
        }
        if !(0.0..=1.0).contains(&self.idle_long_range) {
            return Err(ConfigError::Range { field: "connectivity.idle_long_range" });
        }
        if !(self.hemisphere_margin >= 0.0) {
            return Err(ConfigError::Range { field: "connectivity.hemisphere_margin" });
        }
        Ok(())
    }
}

/// The synapse set plus a per-neuron outgoing adjacency list.
#[derive(Debug, Clone, Default)]
pub struct Connectome {
    pub synapses: Vec<Synapse>,
    outgoing: Vec<Vec<usize>>,
}

impl Connectome {
    /// Build local and long-range synapses over `neurons`.
    ///
    /// Random draws happen in a fixed order (one idle coin per local edge in
    /// neuron order, then endpoint pairs and idle coins for long-range
    /// edges) so a seeded RNG reproduces the edge list exactly.
    pub fn build<R: Rng + ?Sized>(neurons: &[Neuron], config: &ConnectivityConfig, rng: &mut R) -> Self {
        let positions: Vec<Vec3> = neurons.iter().map(Neuron::position).collect();
        let mut builder = EdgeBuilder::new(config.dedup_edges);

        let grid = match config.search {
            NeighborSearch::Grid => Some(SpatialGrid::auto(&positions, config.k)),
            NeighborSearch::BruteForce => None,
        };

        for i in 0..positions.len() {
            let neighbors = match &grid {
                Some(grid) => grid.k_nearest(i, config.k),
                None => k_nearest(&positions, i, config.k),
            };
            for j in neighbors {
                let show_idle = rng.gen::<f32>() < config.idle_local;
                builder.push(Synapse::new(i, j, positions[i].distance(positions[j]), false, show_idle));
            }
        }
        let local = builder.edges.len();

        let margin = config.hemisphere_margin;
        let left: Vec<usize> = (0..positions.len()).filter(|&i| positions[i].x < -margin).collect();
        let right: Vec<usize> = (0..positions.len()).filter(|&i| positions[i].x > margin).collect();

        if left.is_empty() || right.is_empty() {
            tracing::debug!(
                left = left.len(),
                right = right.len(),
                "a hemisphere is empty; skipping long-range synapses"
            );
        } else {
            for _ in 0..config.long_range_count {
                let a = left[rng.gen_range(0..left.len())];
                let b = right[rng.gen_range(0..right.len())];
                let show_idle = rng.gen::<f32>() < config.idle_long_range;
                builder.push(Synapse::new(a, b, positions[a].distance(positions[b]), true, show_idle));
            }
        }

        tracing::debug!(
            local,
            long_range = builder.edges.len() - local,
            dropped = builder.dropped,
            "built connectome"
        );

        Self::from_edges(neurons.len(), builder.edges)
    }

    /// Wrap an explicit edge list. Edges naming missing neurons are dropped.
    pub fn from_edges(neuron_count: usize, synapses: Vec<Synapse>) -> Self {
        let synapses: Vec<Synapse> = synapses
            .into_iter()
            .filter(|s| s.from < neuron_count && s.to < neuron_count)
            .collect();
        let mut outgoing = vec![Vec::new(); neuron_count];
        for (edge, s) in synapses.iter().enumerate() {
            outgoing[s.from].push(edge);
        }
        Self { synapses, outgoing }
    }

    /// Synapse indices leaving neuron `i`, in creation order.
    pub fn outgoing(&self, i: usize) -> &[usize] {
        self.outgoing.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.synapses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synapses.is_empty()
    }

    /// Number of packets currently in flight across all synapses.
    pub fn packet_count(&self) -> usize {
        self.synapses.iter().map(|s| s.packets.len()).sum()
    }

    /// Append a packet to every synapse leaving `from`. Returns how many.
    pub(crate) fn emit_from(&mut self, from: usize, mut make: impl FnMut() -> Packet) -> usize {
        let Some(edges) = self.outgoing.get(from) else {
            return 0;
        };
        for &e in edges {
            self.synapses[e].packets.push(make());
        }
        edges.len()
    }

    /// `(from, to)` pairs in creation order.
    pub fn edge_pairs(&self) -> Vec<(usize, usize)> {
        self.synapses.iter().map(|s| (s.from, s.to)).collect()
    }
}

struct EdgeBuilder {
    edges: Vec<Synapse>,
    seen: Option<HashSet<(usize, usize)>>,
    dropped: usize,
}

impl EdgeBuilder {
    fn new(dedup: bool) -> Self {
        Self {
            edges: Vec::new(),
            seen: dedup.then(HashSet::new),
            dropped: 0,
        }
    }

    fn push(&mut self, synapse: Synapse) {
        if let Some(seen) = &mut self.seen {
            let key = (synapse.from.min(synapse.to), synapse.from.max(synapse.to));
            if !seen.insert(key) {
                self.dropped += 1;
                return;
            }
        }
        self.edges.push(synapse);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuron::Population;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn line(n: usize) -> Vec<Neuron> {
        (0..n)
            .map(|i| Neuron::new(i, Vec3::new(i as f32 * 10.0 - 45.0, 0.0, 0.0), Population::Cortical))
            .collect()
    }

    #[test]
    fn test_knn_on_known_points() {
        let points: Vec<Vec3> = (0..10).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        // Equidistant neighbors at 4 and 6, lower index first
        assert_eq!(k_nearest(&points, 5, 4), vec![4, 6, 3, 7]);
        assert_eq!(k_nearest(&points, 0, 3), vec![1, 2, 3]);
        assert_eq!(k_nearest(&points, 9, 20).len(), 9);
    }

    #[test]
    fn test_knn_2d() {
        let points = vec![Vec2::ZERO, Vec2::new(3.0, 4.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        assert_eq!(k_nearest(&points, 0, 2), vec![2, 3]);
    }

    #[test]
    fn test_local_edges_follow_knn() {
        let neurons = line(10);
        let config = ConnectivityConfig { k: 2, long_range_count: 0, ..Default::default() };
        let mut rng = SmallRng::seed_from_u64(0);
        let graph = Connectome::build(&neurons, &config, &mut rng);

        assert_eq!(graph.len(), 20);
        assert_eq!(graph.outgoing(0).len(), 2);
        let targets: Vec<usize> = graph.outgoing(4).iter().map(|&e| graph.synapses[e].to).collect();
        assert_eq!(targets, vec![3, 5]);
        assert!(graph.synapses.iter().all(|s| !s.long_range && s.from != s.to));
    }

    #[test]
    fn test_long_range_crosses_hemispheres() {
        let neurons = line(10);
        let config = ConnectivityConfig { k: 0, long_range_count: 25, ..Default::default() };
        let mut rng = SmallRng::seed_from_u64(1);
        let graph = Connectome::build(&neurons, &config, &mut rng);

        assert_eq!(graph.len(), 25);
        for s in &graph.synapses {
            assert!(s.long_range);
            assert!(neurons[s.from].position().x < -30.0);
            assert!(neurons[s.to].position().x > 30.0);
        }
    }

    #[test]
    fn test_long_range_skipped_when_hemisphere_empty() {
        let neurons: Vec<Neuron> = (0..5)
            .map(|i| Neuron::new(i, Vec3::new(40.0 + i as f32, 0.0, 0.0), Population::Cortical))
            .collect();
        let config = ConnectivityConfig { k: 1, ..Default::default() };
        let mut rng = SmallRng::seed_from_u64(1);
        let graph = Connectome::build(&neurons, &config, &mut rng);
        assert!(graph.synapses.iter().all(|s| !s.long_range));
    }

    #[test]
    fn test_dedup_drops_reverse_pairs() {
        let neurons = line(10);
        let mut config = ConnectivityConfig { k: 2, long_range_count: 0, ..Default::default() };
        let mut rng = SmallRng::seed_from_u64(0);
        let dup = Connectome::build(&neurons, &config, &mut rng);

        config.dedup_edges = true;
        let mut rng = SmallRng::seed_from_u64(0);
        let dedup = Connectome::build(&neurons, &config, &mut rng);

        assert!(dedup.len() < dup.len());
        let mut pairs: Vec<(usize, usize)> =
            dedup.edge_pairs().into_iter().map(|(a, b)| (a.min(b), a.max(b))).collect();
        let before = pairs.len();
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs.len(), before);
    }

    #[test]
    fn test_grid_search_matches_brute_force() {
        let neurons: Vec<Neuron> = (0..200)
            .map(|i| {
                let f = i as f32;
                let p = Vec3::new((f * 12.9898).sin() * 100.0, (f * 78.233).sin() * 80.0, (f * 37.719).sin() * 120.0);
                Neuron::new(i, p, Population::Subcortical)
            })
            .collect();
        let brute = ConnectivityConfig::default();
        let grid = ConnectivityConfig { search: NeighborSearch::Grid, ..brute };

        let a = Connectome::build(&neurons, &brute, &mut SmallRng::seed_from_u64(5));
        let b = Connectome::build(&neurons, &grid, &mut SmallRng::seed_from_u64(5));
        assert_eq!(a.edge_pairs(), b.edge_pairs());
    }

    #[test]
    fn test_from_edges_drops_dangling() {
        let edges = vec![Synapse::new(0, 1, 1.0, false, false), Synapse::new(0, 9, 1.0, false, false)];
        let graph = Connectome::from_edges(2, edges);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.outgoing(0), &[0]);
        assert!(graph.outgoing(7).is_empty());
    }
}
