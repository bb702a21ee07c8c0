//! Frame clock.
//!
//! The driver calls [`Clock::update`] once per redraw and hands the result
//! to the loader's `update(t, dt)`. Tests drive the same clock with
//! [`Clock::advance_by`] instead of sleeping.
//!
//! ```ignore
//! use neuroboot::time::Clock;
//!
//! let mut clock = Clock::new();
//! let (t, dt) = clock.update();
//! ```

use std::time::{Duration, Instant};

/// Longest step handed to the simulation, in seconds.
pub const DEFAULT_MAX_DELTA: f32 = 0.1;

/// Elapsed/delta tracking for the render loop.
#[derive(Debug)]
pub struct Clock {
    /// When the clock was created.
    start: Instant,
    /// When the last frame occurred.
    last_frame: Instant,
    /// Seconds since mount, advanced by clamped deltas.
    elapsed_secs: f32,
    /// Time since last frame in seconds, after clamping.
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    /// Replaces the measured delta when set.
    fixed_delta: Option<f32>,
    /// Upper bound on a single delta, so a stalled frame cannot teleport
    /// packets past their arrival threshold.
    max_delta: f32,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            fixed_delta: None,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }

    /// Measure the time since the last call. Call once per frame.
    ///
    /// Returns `(elapsed, delta)`.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let step = self.fixed_delta.unwrap_or(raw);
        self.step(step);

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    /// Advance by `dt` seconds without touching the wall clock.
    pub fn advance_by(&mut self, dt: f32) -> (f32, f32) {
        self.step(dt);
        (self.elapsed_secs, self.delta_secs)
    }

    fn step(&mut self, dt: f32) {
        self.delta_secs = dt.clamp(0.0, self.max_delta);
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;
    }

    /// Seconds since mount.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Wall-clock time since the clock was created.
    pub fn wall_elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Use a fixed step instead of measured frame time. `None` restores
    /// real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    pub fn set_max_delta(&mut self, max: f32) {
        self.max_delta = max.max(0.0);
    }

    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = Clock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_clock_update() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.update();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_stalled_frame_is_clamped() {
        let mut clock = Clock::new();
        let (t, dt) = clock.advance_by(2.0);
        assert_eq!(dt, DEFAULT_MAX_DELTA);
        assert_eq!(t, DEFAULT_MAX_DELTA);

        let (_, dt) = clock.advance_by(-1.0);
        assert_eq!(dt, 0.0);
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = Clock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));

        thread::sleep(Duration::from_millis(100));
        clock.update();

        assert!((clock.delta() - 1.0 / 60.0).abs() < 0.0001);
    }
}
