//! The "enter" control drawn over either loader.
//!
//! A stack of concentric rings near the bottom of the viewport. Each ring
//! fades in after its own random delay and spins at its own period. Once
//! loading completes the rings dim to a fixed opacity, the label flips to
//! "enter" and the control starts accepting clicks.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::frame::{Layer, Shape, Sprite, Viewport};
use crate::signals::PointerStyle;

pub const LABEL_LOADING: &str = "loading";
pub const LABEL_ENTER: &str = "enter";

/// Enter control parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnterConfig {
    /// Seconds after mount before the control is shown.
    pub appear_after: f32,
    pub ring_count: usize,
    /// Whole-second range for each ring's fade-in delay.
    pub delay_range: (u32, u32),
    /// Whole-second range for each ring's rotation period.
    pub period_range: (u32, u32),
    /// Seconds a ring takes to fade in.
    pub fade_in: f32,
    /// Ring opacity once loaded.
    pub loaded_opacity: f32,
    /// Seconds to settle to `loaded_opacity`.
    pub loaded_fade: f32,
    /// Outer ring radius in pixels.
    pub radius: f32,
    /// Vertical position of the center as a fraction of viewport height.
    pub anchor_y: f32,
}

impl Default for EnterConfig {
    fn default() -> Self {
        Self {
            appear_after: 3.0,
            ring_count: 5,
            delay_range: (1, 4),
            period_range: (3, 8),
            fade_in: 2.0,
            loaded_opacity: 0.5,
            loaded_fade: 0.5,
            radius: 40.0,
            anchor_y: 0.9,
        }
    }
}

impl EnterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delay_range.0 > self.delay_range.1 {
            return Err(ConfigError::Range { field: "enter.delay_range" });
        }
        if self.period_range.0 == 0 || self.period_range.0 > self.period_range.1 {
            return Err(ConfigError::Range { field: "enter.period_range" });
        }
        if !(self.fade_in > 0.0 && self.loaded_fade > 0.0) {
            return Err(ConfigError::Range { field: "enter.fade_in" });
        }
        if !(self.radius > 0.0) {
            return Err(ConfigError::Range { field: "enter.radius" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Ring {
    delay: f32,
    period: f32,
}

/// State of the enter control.
#[derive(Debug, Clone)]
pub struct EnterButton {
    config: EnterConfig,
    rings: Vec<Ring>,
    t: f32,
    loaded_at: Option<f32>,
}

impl EnterButton {
    pub fn new<R: Rng + ?Sized>(config: EnterConfig, rng: &mut R) -> Self {
        let (d0, d1) = config.delay_range;
        let (p0, p1) = config.period_range;
        let rings = (0..config.ring_count)
            .map(|_| Ring {
                delay: rng.gen_range(d0..=d1) as f32,
                period: rng.gen_range(p0..=p1) as f32,
            })
            .collect();
        Self {
            config,
            rings,
            t: 0.0,
            loaded_at: None,
        }
    }

    pub fn update(&mut self, t: f32) {
        self.t = t;
    }

    /// First call wins.
    pub fn set_loaded(&mut self, t: f32) {
        if self.loaded_at.is_none() {
            self.loaded_at = Some(t);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.t >= self.config.appear_after
    }

    pub fn label(&self) -> &'static str {
        if self.is_loaded() {
            LABEL_ENTER
        } else {
            LABEL_LOADING
        }
    }

    pub fn center(&self, viewport: Viewport) -> Vec2 {
        Vec2::new(viewport.width * 0.5, viewport.height * self.config.anchor_y)
    }

    /// Whether `point` (window pixels) is over the control.
    pub fn contains(&self, point: Vec2, viewport: Viewport) -> bool {
        self.is_visible() && point.distance(self.center(viewport)) <= self.config.radius
    }

    /// True when a click at `point` should let the user in.
    pub fn accepts_click(&self, point: Vec2, viewport: Viewport) -> bool {
        self.is_loaded() && self.contains(point, viewport)
    }

    /// Pointer style wanted for a pointer at `point`. Only asks for the
    /// hover style once loading has finished.
    pub fn pointer_style(&self, point: Vec2, viewport: Viewport) -> PointerStyle {
        if self.accepts_click(point, viewport) {
            PointerStyle::Hover
        } else {
            PointerStyle::Default
        }
    }

    fn ring_opacity(&self, ring: &Ring, t: f32) -> f32 {
        ((t - ring.delay) / self.config.fade_in).clamp(0.0, 1.0)
    }

    /// Opacity of ring `i` at the current time.
    pub fn opacity(&self, i: usize) -> f32 {
        let Some(ring) = self.rings.get(i) else {
            return 0.0;
        };
        match self.loaded_at {
            None => self.ring_opacity(ring, self.t),
            Some(at) => {
                let from = self.ring_opacity(ring, at);
                let k = ((self.t - at) / self.config.loaded_fade).clamp(0.0, 1.0);
                from + (self.config.loaded_opacity - from) * k
            }
        }
    }

    /// Rotation of ring `i` in radians. Spinning starts after its delay.
    pub fn rotation(&self, i: usize) -> f32 {
        self.rings
            .get(i)
            .map(|r| TAU * ((self.t - r.delay).max(0.0) / r.period).fract())
            .unwrap_or(0.0)
    }

    pub fn draw(&self, layer: &mut Layer, viewport: Viewport) {
        if !self.is_visible() {
            return;
        }
        let center = self.center(viewport);

        for i in 0..self.rings.len() {
            let alpha = self.opacity(i);
            if alpha <= 0.0 {
                continue;
            }
            let radius = self.config.radius * (1.0 - 0.05 * i as f32);
            let color = [0.26, 0.44, 0.96, alpha];
            layer.sprite(
                Sprite::new(center.extend(0.0), radius * 2.0, color).with_shape(Shape::Ring, 0.06),
            );

            let angle = self.rotation(i);
            let marker = center + Vec2::from_angle(angle) * radius;
            layer.sprite(Sprite::new(marker.extend(0.0), 4.0, color).with_shape(Shape::Disc, 0.0));
        }

        if self.is_loaded() {
            let glow = [0.0, 0.0, 1.0, 0.35];
            layer.sprite(
                Sprite::new(center.extend(0.0), self.config.radius * 0.8, glow)
                    .with_shape(Shape::Glow, 0.0),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn button() -> EnterButton {
        EnterButton::new(EnterConfig::default(), &mut SmallRng::seed_from_u64(9))
    }

    #[test]
    fn test_hidden_until_appear_time() {
        let vp = Viewport::new(800, 600);
        let mut b = button();
        b.update(1.0);
        assert!(!b.is_visible());
        assert!(!b.contains(b.center(vp), vp));

        let mut layer = Layer::new();
        b.draw(&mut layer, vp);
        assert!(layer.is_empty());

        b.update(3.5);
        assert!(b.is_visible());
        assert!(b.contains(b.center(vp), vp));
    }

    #[test]
    fn test_click_ignored_before_loaded() {
        let vp = Viewport::new(800, 600);
        let mut b = button();
        b.update(5.0);
        assert!(!b.accepts_click(b.center(vp), vp));
        assert_eq!(b.pointer_style(b.center(vp), vp), PointerStyle::Default);
        assert_eq!(b.label(), LABEL_LOADING);

        b.set_loaded(5.0);
        assert!(b.accepts_click(b.center(vp), vp));
        assert_eq!(b.pointer_style(b.center(vp), vp), PointerStyle::Hover);
        assert_eq!(b.pointer_style(Vec2::ZERO, vp), PointerStyle::Default);
        assert_eq!(b.label(), LABEL_ENTER);
    }

    #[test]
    fn test_ring_opacity_settles_when_loaded() {
        let mut b = button();
        b.update(10.0);
        for i in 0..5 {
            assert_eq!(b.opacity(i), 1.0);
        }
        b.set_loaded(10.0);
        b.update(11.0);
        for i in 0..5 {
            assert!((b.opacity(i) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_ring_timing_ranges() {
        let b = button();
        assert_eq!(b.rings.len(), 5);
        for r in &b.rings {
            assert!((1.0..=4.0).contains(&r.delay));
            assert!((3.0..=8.0).contains(&r.period));
        }
    }
}
