//! Uniform-grid neighbor index using Morton encoding (Z-order curve)
//!
//! Points are bucketed into cubic cells, sorted by the Morton code of their
//! cell, and each occupied cell records the range it owns in the sorted
//! array. [`SpatialGrid::k_nearest`] expands Chebyshev shells around the
//! query cell and stops once no unvisited cell can hold a closer point, so
//! the answer (tie-breaks included) matches a brute-force scan exactly.

use glam::{UVec3, Vec3};

/// Empty-cell marker in the start/end tables.
const EMPTY: u32 = u32::MAX;

/// Finest grid allowed per axis. `64^3` cells fit in an 18-bit Morton code.
pub const MAX_RESOLUTION: u32 = 64;

/// Expand a 10-bit integer to 30 bits by inserting 2 zeros between each bit.
#[inline]
pub fn expand_bits(v: u32) -> u32 {
    let mut x = v & 0x0000_03FF;
    x = (x | (x << 16)) & 0x0300_00FF;
    x = (x | (x << 8)) & 0x0300_F00F;
    x = (x | (x << 4)) & 0x030C_30C3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}

/// 30-bit Morton code for a cell (each coordinate `0..1024`).
#[inline]
pub fn morton_encode(x: u32, y: u32, z: u32) -> u32 {
    expand_bits(x) | (expand_bits(y) << 1) | (expand_bits(z) << 2)
}

/// Cell-sorted index over a fixed point set.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    points: Vec<Vec3>,
    origin: Vec3,
    cell_size: f32,
    resolution: u32,
    /// Point indices ordered by (Morton code, index).
    sorted: Vec<u32>,
    /// First slot in `sorted` for each Morton code, or [`EMPTY`].
    cell_start: Vec<u32>,
    /// One past the last slot in `sorted` for each Morton code, or [`EMPTY`].
    cell_end: Vec<u32>,
}

impl SpatialGrid {
    /// Build a grid with the requested cell size.
    ///
    /// The cell size is widened if the bounding box would need more than
    /// [`MAX_RESOLUTION`] cells per axis.
    pub fn build(points: &[Vec3], cell_size: f32) -> Self {
        let (min, max) = points.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(lo, hi), &p| (lo.min(p), hi.max(p)),
        );
        let (origin, extent) = if points.is_empty() {
            (Vec3::ZERO, 0.0)
        } else {
            (min, (max - min).max_element())
        };

        let mut cell_size = cell_size.max(1e-3);
        let cells_needed = (extent / cell_size).floor() as u32 + 1;
        let resolution = cells_needed.next_power_of_two().min(MAX_RESOLUTION);
        if cells_needed > MAX_RESOLUTION {
            cell_size = extent / (MAX_RESOLUTION - 1) as f32;
        }

        let mut grid = Self {
            points: points.to_vec(),
            origin,
            cell_size,
            resolution,
            sorted: Vec::new(),
            cell_start: vec![EMPTY; (resolution * resolution * resolution) as usize],
            cell_end: vec![EMPTY; (resolution * resolution * resolution) as usize],
        };

        let mut keyed: Vec<(u32, u32)> = points
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let c = grid.cell_of(p);
                (morton_encode(c.x, c.y, c.z), i as u32)
            })
            .collect();
        keyed.sort_unstable();

        for (slot, &(code, _)) in keyed.iter().enumerate() {
            let code = code as usize;
            if grid.cell_start[code] == EMPTY {
                grid.cell_start[code] = slot as u32;
            }
            grid.cell_end[code] = slot as u32 + 1;
        }
        grid.sorted = keyed.into_iter().map(|(_, i)| i).collect();
        grid
    }

    /// Build a grid sized for roughly `k` points per cell.
    pub fn auto(points: &[Vec3], k: usize) -> Self {
        if points.is_empty() {
            return Self::build(points, 1.0);
        }
        let (min, max) = points
            .iter()
            .fold((points[0], points[0]), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        let size = (max - min).max(Vec3::splat(1e-3));
        let volume_per_point = size.x * size.y * size.z / points.len() as f32;
        let cell = (volume_per_point * k.max(1) as f32).cbrt();
        Self::build(points, cell)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Cell coordinates of a world position, clamped to the grid.
    #[inline]
    pub fn cell_of(&self, p: Vec3) -> UVec3 {
        let normalized = (p - self.origin) / self.cell_size;
        let max = (self.resolution - 1) as f32;
        normalized.floor().clamp(Vec3::ZERO, Vec3::splat(max)).as_uvec3()
    }

    /// Point indices stored in one cell.
    fn cell_points(&self, cell: UVec3) -> &[u32] {
        let code = morton_encode(cell.x, cell.y, cell.z) as usize;
        let start = self.cell_start[code];
        if start == EMPTY {
            return &[];
        }
        &self.sorted[start as usize..self.cell_end[code] as usize]
    }

    /// The `k` points closest to point `index`, excluding itself.
    ///
    /// Ordered by distance, ties broken by lower index first.
    pub fn k_nearest(&self, index: usize, k: usize) -> Vec<usize> {
        let Some(&query) = self.points.get(index) else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let center = self.cell_of(query).as_ivec3();
        let res = self.resolution as i32;
        let mut best: Vec<(f32, usize)> = Vec::with_capacity(k * 4);

        for shell in 0..res {
            self.visit_shell(center, shell, |j| {
                if j != index {
                    best.push((query.distance(self.points[j]), j));
                }
            });

            // Anything outside shells 0..=shell is at least this far away
            let bound = shell as f32 * self.cell_size * (1.0 - 1e-4);
            if best.len() >= k {
                best.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                best.truncate(k);
                if best[k - 1].0 < bound {
                    break;
                }
            }
        }

        best.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        best.truncate(k);
        best.into_iter().map(|(_, j)| j).collect()
    }

    /// Call `f` for every point in cells at Chebyshev distance `shell`.
    fn visit_shell(&self, center: glam::IVec3, shell: i32, mut f: impl FnMut(usize)) {
        let res = self.resolution as i32;
        let in_grid = |v: i32| (0..res).contains(&v);

        for dx in -shell..=shell {
            let x = center.x + dx;
            if !in_grid(x) {
                continue;
            }
            for dy in -shell..=shell {
                let y = center.y + dy;
                if !in_grid(y) {
                    continue;
                }
                let on_face = dx.abs() == shell || dy.abs() == shell;
                let mut visit_z = |dz: i32| {
                    let z = center.z + dz;
                    if in_grid(z) {
                        let cell = UVec3::new(x as u32, y as u32, z as u32);
                        for &j in self.cell_points(cell) {
                            f(j as usize);
                        }
                    }
                };
                if on_face {
                    for dz in -shell..=shell {
                        visit_z(dz);
                    }
                } else {
                    visit_z(-shell);
                    visit_z(shell);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn brute(points: &[Vec3], i: usize, k: usize) -> Vec<usize> {
        let mut d: Vec<(f32, usize)> = points
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(j, p)| (points[i].distance(*p), j))
            .collect();
        d.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        d.into_iter().take(k).map(|(_, j)| j).collect()
    }

    #[test]
    fn test_morton_encoding() {
        assert_eq!(morton_encode(0, 0, 0), 0);
        assert_eq!(morton_encode(1, 0, 0), 1);
        assert_eq!(morton_encode(0, 1, 0), 2);
        assert_eq!(morton_encode(0, 0, 1), 4);
        assert_eq!(morton_encode(1, 1, 1), 7);
    }

    #[test]
    fn test_resolution_is_power_of_two_and_capped() {
        let points = vec![Vec3::ZERO, Vec3::splat(1000.0)];
        let grid = SpatialGrid::build(&points, 1.0);
        assert!(grid.resolution().is_power_of_two());
        assert!(grid.resolution() <= MAX_RESOLUTION);
        assert_eq!(grid.k_nearest(0, 1), vec![1]);
    }

    #[test]
    fn test_grid_matches_brute_force() {
        let mut rng = SmallRng::seed_from_u64(11);
        let points: Vec<Vec3> = (0..400)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-100.0..100.0),
                    rng.gen_range(-80.0..80.0),
                    rng.gen_range(-120.0..120.0),
                )
            })
            .collect();
        let grid = SpatialGrid::auto(&points, 6);
        for i in 0..points.len() {
            assert_eq!(grid.k_nearest(i, 6), brute(&points, i, 6), "point {i}");
        }
    }

    #[test]
    fn test_grid_ties_break_by_index() {
        // Lattice points have many equal distances
        let mut points = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..4 {
                    points.push(Vec3::new(x as f32, y as f32, z as f32) * 10.0);
                }
            }
        }
        let grid = SpatialGrid::build(&points, 10.0);
        for i in 0..points.len() {
            assert_eq!(grid.k_nearest(i, 6), brute(&points, i, 6));
        }
    }

    #[test]
    fn test_small_sets() {
        let points = vec![Vec3::ZERO, Vec3::X];
        let grid = SpatialGrid::auto(&points, 6);
        assert_eq!(grid.k_nearest(0, 6), vec![1]);
        assert!(SpatialGrid::auto(&[], 6).k_nearest(0, 6).is_empty());
    }
}
