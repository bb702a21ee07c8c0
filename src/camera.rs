//! Fixed perspective camera and pointer parallax.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective camera looking down -Z at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Distance from the origin along +Z.
    pub distance: f32,
    pub near: f32,
    pub far: f32,
    #[serde(skip)]
    aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            distance: 400.0,
            near: 0.1,
            far: 1000.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl Camera {
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Update the aspect ratio after a resize. Zero-sized viewports are
    /// ignored so the projection never divides by zero.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Pointer-driven rotation with first-order smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parallax {
    /// Fraction of the remaining distance closed per 60 fps frame.
    pub smoothing: f32,
    /// Yaw swing across the full window width, in radians.
    pub yaw_range: f32,
    /// Pitch swing across the full window height, in radians.
    pub pitch_range: f32,
    /// Resting pitch.
    pub pitch_bias: f32,
    #[serde(skip)]
    rotation: Vec2,
    #[serde(skip)]
    target: Vec2,
}

impl Default for Parallax {
    fn default() -> Self {
        Self {
            smoothing: 0.05,
            yaw_range: 0.3,
            pitch_range: 0.06,
            pitch_bias: 0.1,
            rotation: Vec2::new(0.1, 0.0),
            target: Vec2::new(0.1, 0.0),
        }
    }
}

impl Parallax {
    /// Retarget from a pointer position normalized to `0..1`.
    pub fn point_at(&mut self, normalized: Vec2) {
        let centered = normalized - Vec2::splat(0.5);
        self.target = Vec2::new(
            self.pitch_bias + centered.y * self.pitch_range,
            centered.x * self.yaw_range,
        );
    }

    /// Move toward the target. `frames` is elapsed time in 60 fps frames.
    pub fn update(&mut self, frames: f32) {
        let alpha = 1.0 - (1.0 - self.smoothing.clamp(0.0, 1.0)).powf(frames.max(0.0));
        self.rotation += (self.target - self.rotation) * alpha;
    }

    /// Current `(pitch, yaw)` in radians.
    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Model matrix shared by every world-space layer.
    pub fn model(&self) -> Mat4 {
        Mat4::from_rotation_x(self.rotation.x) * Mat4::from_rotation_y(self.rotation.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_keeps_projection_finite() {
        let mut cam = Camera::default();
        cam.resize(0, 0);
        assert!(cam.view_proj().is_finite());
        cam.resize(1000, 500);
        assert_eq!(cam.aspect(), 2.0);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let cam = Camera::default();
        let clip = cam.view_proj() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-6);
        assert!((clip.y / clip.w).abs() < 1e-6);
        assert!((clip.w - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_parallax_converges_without_overshoot() {
        let mut p = Parallax::default();
        p.point_at(Vec2::new(1.0, 0.5));
        let target = p.target();
        assert!((target.y - 0.15).abs() < 1e-6);
        assert!((target.x - 0.1).abs() < 1e-6);

        let mut last = p.rotation().y;
        for _ in 0..300 {
            p.update(1.0);
            let y = p.rotation().y;
            assert!(y >= last && y <= target.y + 1e-6);
            last = y;
        }
        assert!((last - target.y).abs() < 1e-4);
    }

    #[test]
    fn test_single_frame_step_matches_smoothing() {
        let mut p = Parallax::default();
        p.point_at(Vec2::new(1.0, 0.5));
        p.update(1.0);
        assert!((p.rotation().y - 0.15 * 0.05).abs() < 1e-6);
    }
}
