//! Implicit brain volume.
//!
//! The solid is the smooth union of three ellipsoids: a central body and two
//! raised bulges offset along the X axis. The field is `0` at the centre of
//! each ellipsoid and `1` on its surface, so `field < 1` means inside.
//!
//! ```ignore
//! use neuroboot::volume::{BrainVolume, Volume};
//! use glam::Vec3;
//!
//! let brain = BrainVolume::default();
//! assert!(brain.contains(Vec3::ZERO));
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A scalar field that classifies points as inside or outside a solid.
///
/// Only [`field`](Volume::field) is required; containment and surface
/// proximity are derived from it.
pub trait Volume {
    /// Scalar field value at `p`. Values below `1.0` are inside.
    fn field(&self, p: Vec3) -> f32;

    /// Whether `p` lies inside the solid.
    fn contains(&self, p: Vec3) -> bool {
        self.field(p) < 1.0
    }

    /// `|field(p) - 1|`.
    ///
    /// Not a true distance, but monotonic near the surface, which is all the
    /// cortical/subcortical split needs.
    fn surface_proximity(&self, p: Vec3) -> f32 {
        (self.field(p) - 1.0).abs()
    }
}

/// Axis-aligned ellipsoid expressed as a normalized distance field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    pub center: Vec3,
    pub radii: Vec3,
}

impl Ellipsoid {
    pub const fn new(center: Vec3, radii: Vec3) -> Self {
        Self { center, radii }
    }

    /// Normalized distance: `1.0` exactly on the surface.
    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        ((p - self.center) / self.radii).length()
    }
}

/// Polynomial smooth minimum with blend radius `k`.
///
/// Equals `min(a, b)` whenever `|a - b| >= k` and never exceeds it.
#[inline]
pub fn smooth_min(a: f32, b: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return a.min(b);
    }
    let h = ((b - a + k) / (2.0 * k)).clamp(0.0, 1.0);
    a * h + b * (1.0 - h) - k * h * (1.0 - h)
}

/// The brain-shaped solid the cortex loader samples neurons from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainVolume {
    /// Central body.
    pub body: Ellipsoid,
    /// Bulge on the negative X side.
    pub left: Ellipsoid,
    /// Bulge on the positive X side.
    pub right: Ellipsoid,
    /// Smooth-min blend radius, in field units.
    pub blend: f32,
}

impl Default for BrainVolume {
    fn default() -> Self {
        Self {
            body: Ellipsoid::new(Vec3::ZERO, Vec3::new(120.0, 100.0, 140.0)),
            left: Ellipsoid::new(Vec3::new(-60.0, 20.0, 0.0), Vec3::new(80.0, 80.0, 100.0)),
            right: Ellipsoid::new(Vec3::new(60.0, 20.0, 0.0), Vec3::new(80.0, 80.0, 100.0)),
            blend: 0.3,
        }
    }
}

impl Volume for BrainVolume {
    fn field(&self, p: Vec3) -> f32 {
        let d = smooth_min(self.body.distance(p), self.left.distance(p), self.blend);
        smooth_min(d, self.right.distance(p), self.blend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_inside() {
        let brain = BrainVolume::default();
        assert_eq!(brain.field(Vec3::ZERO), 0.0);
        assert!(brain.contains(Vec3::ZERO));
    }

    #[test]
    fn test_far_point_is_outside() {
        let brain = BrainVolume::default();
        assert!(!brain.contains(Vec3::new(1000.0, 0.0, 0.0)));
        assert!(!brain.contains(Vec3::new(0.0, -500.0, 0.0)));
    }

    #[test]
    fn test_smooth_min_bounds() {
        for &(a, b) in &[(0.2, 0.3), (1.0, 0.9), (0.5, 0.5), (2.0, 0.1)] {
            let s = smooth_min(a, b, 0.3);
            assert!(s <= a.min(b) + 1e-6, "smooth_min({a}, {b}) = {s}");
        }
        // Far apart values are untouched
        assert_eq!(smooth_min(0.1, 2.0, 0.3), 0.1);
        assert_eq!(smooth_min(2.0, 0.1, 0.3), 0.1);
    }

    #[test]
    fn test_surface_proximity_on_single_ellipsoid() {
        // Bulges pushed far away so only the body contributes near +Z
        let brain = BrainVolume {
            left: Ellipsoid::new(Vec3::new(-10_000.0, 0.0, 0.0), Vec3::ONE),
            right: Ellipsoid::new(Vec3::new(10_000.0, 0.0, 0.0), Vec3::ONE),
            ..Default::default()
        };
        let on_surface = Vec3::new(0.0, 0.0, 140.0);
        assert!(brain.surface_proximity(on_surface) < 1e-5);
        assert!(brain.surface_proximity(Vec3::ZERO) > 0.99);
    }

    #[test]
    fn test_blend_smooths_seam() {
        let brain = BrainVolume::default();
        let hard = BrainVolume { blend: 0.0, ..brain };
        // Between body and bulge the blended field sits at or below the hard union
        let p = Vec3::new(100.0, 40.0, 0.0);
        assert!(brain.field(p) <= hard.field(p));
    }
}
