//! Timed phase choreography.
//!
//! A [`PhaseSchedule`] maps elapsed time to a phase index and progress by
//! wrapping `t` into one cycle; nothing is accumulated, so the cursor is a
//! pure function of time. [`Choreographer`] adds the terminal hold used
//! once loading has finished, and [`BootPhase`] holds the per-phase policy
//! the cortex loader applies to its neurons.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::neuron::Neuron;

/// Where in the schedule a given instant falls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseState {
    pub index: usize,
    /// Progress within the phase, `0..1` (exactly `1` while held).
    pub progress: f32,
    /// Completed cycles before this one.
    pub cycle: u32,
    /// True once the choreographer has frozen on its last phase.
    pub held: bool,
}

/// An ordered list of phase durations that repeats forever.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSchedule {
    durations: Vec<f32>,
    total: f32,
}

impl PhaseSchedule {
    /// Fails on an empty list or any non-finite or non-positive duration.
    pub fn new(durations: Vec<f32>) -> Result<Self, ConfigError> {
        if durations.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        if let Some((index, &duration)) = durations
            .iter()
            .enumerate()
            .find(|(_, d)| !(d.is_finite() && **d > 0.0))
        {
            return Err(ConfigError::PhaseDuration { index, duration });
        }
        let total = durations.iter().sum();
        Ok(Self { durations, total })
    }

    pub fn durations(&self) -> &[f32] {
        &self.durations
    }

    /// Length of one full cycle, the sum of all durations.
    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Locate `t` (seconds since mount). Negative `t` wraps like any other.
    pub fn locate(&self, t: f32) -> PhaseState {
        let cycle_time = t.rem_euclid(self.total);
        let cycle = (t / self.total).floor().max(0.0) as u32;

        let mut start = 0.0;
        for (index, &d) in self.durations.iter().enumerate() {
            if cycle_time < start + d {
                return PhaseState {
                    index,
                    progress: ((cycle_time - start) / d).clamp(0.0, 1.0 - f32::EPSILON),
                    cycle,
                    held: false,
                };
            }
            start += d;
        }

        // rem_euclid can round up to `total`; that instant belongs to the end of the last phase
        PhaseState {
            index: self.durations.len() - 1,
            progress: 1.0 - f32::EPSILON,
            cycle,
            held: false,
        }
    }
}

/// Schedule plus the terminal hold.
#[derive(Debug, Clone)]
pub struct Choreographer {
    schedule: PhaseSchedule,
    hold_after: Option<u32>,
}

impl Choreographer {
    pub fn new(schedule: PhaseSchedule) -> Self {
        Self {
            schedule,
            hold_after: None,
        }
    }

    pub fn schedule(&self) -> &PhaseSchedule {
        &self.schedule
    }

    /// Finish the cycle running at `t`, then hold the last phase.
    ///
    /// Later calls keep the first hold point.
    pub fn set_loaded(&mut self, t: f32) {
        if self.hold_after.is_none() {
            let cycle = self.schedule.locate(t).cycle;
            tracing::debug!(cycle, "choreography will hold after current cycle");
            self.hold_after = Some(cycle);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.hold_after.is_some()
    }

    /// Phase state at `t`.
    pub fn at(&self, t: f32) -> PhaseState {
        let state = self.schedule.locate(t);
        match self.hold_after {
            Some(last) if state.cycle > last => PhaseState {
                index: self.schedule.len() - 1,
                progress: 1.0,
                cycle: last,
                held: true,
            },
            _ => state,
        }
    }
}

/// Choreography parameters shared by both loaders' configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreographyConfig {
    /// Phase durations in seconds.
    pub durations: Vec<f32>,
    /// Point opacity in the first phase.
    pub opacity_floor: f32,
    /// Point opacity in the last phase. Kept low so the dense cloud does not
    /// wash out into a solid blob.
    pub opacity_ceiling: f32,
}

impl Default for ChoreographyConfig {
    fn default() -> Self {
        Self {
            durations: vec![0.6, 1.4, 0.8, 0.5],
            opacity_floor: 0.15,
            opacity_ceiling: 0.30,
        }
    }
}

impl ChoreographyConfig {
    pub fn schedule(&self) -> Result<PhaseSchedule, ConfigError> {
        PhaseSchedule::new(self.durations.clone())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule()?;
        if !(0.0..=1.0).contains(&self.opacity_floor) || !(0.0..=1.0).contains(&self.opacity_ceiling) {
            return Err(ConfigError::Range { field: "choreography.opacity" });
        }
        Ok(())
    }

    /// Global point opacity for a phase index, rising linearly and capped at
    /// the ceiling.
    pub fn opacity(&self, index: usize, phase_count: usize) -> f32 {
        let steps = phase_count.saturating_sub(1).max(1) as f32;
        let t = (index as f32 / steps).min(1.0);
        (self.opacity_floor + t * (self.opacity_ceiling - self.opacity_floor)).min(self.opacity_ceiling)
    }
}

/// The four acts of the cortex boot sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    /// A small nucleus lights up.
    Boot,
    /// The revealed population spreads to most of the volume.
    Growth,
    /// Everything visible, ambient activity rising.
    Resonance,
    /// Activity climbs to a climax before the cycle restarts.
    Convergence,
}

impl BootPhase {
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => BootPhase::Boot,
            1 => BootPhase::Growth,
            2 => BootPhase::Resonance,
            _ => BootPhase::Convergence,
        }
    }

    /// Apply this phase's policy to every neuron.
    ///
    /// `frames` is elapsed time in 60 fps frames and scales the reveal
    /// fade-in.
    pub fn apply(self, neurons: &mut [Neuron], progress: f32, frames: f32) {
        let n = neurons.len();
        match self {
            BootPhase::Boot => {
                let count = (n as f32 * 0.2 * progress).floor() as usize;
                for neuron in neurons.iter_mut().take(count) {
                    neuron.visible = true;
                    neuron.reveal = (neuron.reveal + 0.05 * frames).min(1.0);
                    neuron.spike_chance = 0.002;
                }
            }
            BootPhase::Growth => {
                let count = (n as f32 * (0.2 + 0.5 * progress)).floor() as usize;
                let chance = 0.005 + progress * 0.01;
                for neuron in neurons.iter_mut().take(count) {
                    neuron.visible = true;
                    neuron.reveal = (neuron.reveal + 0.03 * frames).min(1.0);
                    neuron.spike_chance = chance;
                }
            }
            BootPhase::Resonance => {
                let chance = 0.015 + progress * 0.02;
                for neuron in neurons.iter_mut() {
                    neuron.visible = true;
                    neuron.reveal = 1.0;
                    neuron.spike_chance = chance;
                }
            }
            BootPhase::Convergence => {
                let chance = 0.1 * (1.0 - progress) + 0.8 * progress;
                for neuron in neurons.iter_mut() {
                    neuron.spike_chance = chance;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuron::Population;
    use glam::Vec3;

    fn neurons(n: usize) -> Vec<Neuron> {
        (0..n).map(|i| Neuron::new(i, Vec3::ZERO, Population::Cortical)).collect()
    }

    #[test]
    fn test_schedule_rejects_bad_durations() {
        assert!(matches!(PhaseSchedule::new(vec![]), Err(ConfigError::EmptySchedule)));
        assert!(matches!(
            PhaseSchedule::new(vec![0.5, 0.0]),
            Err(ConfigError::PhaseDuration { index: 1, .. })
        ));
        assert!(PhaseSchedule::new(vec![f32::NAN]).is_err());
    }

    #[test]
    fn test_locate_each_phase() {
        let s = PhaseSchedule::new(vec![0.6, 1.4, 0.8, 0.5]).unwrap();
        assert!((s.total() - 3.3).abs() < 1e-6);

        assert_eq!(s.locate(0.0).index, 0);
        assert_eq!(s.locate(0.3).index, 0);
        assert!((s.locate(0.3).progress - 0.5).abs() < 1e-5);
        assert_eq!(s.locate(0.7).index, 1);
        assert_eq!(s.locate(2.1).index, 2);
        assert_eq!(s.locate(3.0).index, 3);
        let wrapped = s.locate(3.3 + 0.1);
        assert_eq!(wrapped.index, 0);
        assert_eq!(wrapped.cycle, 1);
    }

    #[test]
    fn test_every_instant_has_one_phase() {
        let s = PhaseSchedule::new(vec![0.6, 1.4, 0.8, 0.5]).unwrap();
        for step in 0..2000 {
            let t = step as f32 * 0.0071 - 3.0;
            let state = s.locate(t);
            assert!(state.index < 4);
            assert!((0.0..1.0).contains(&state.progress), "t={t} {:?}", state);
        }
    }

    #[test]
    fn test_hold_after_loaded() {
        let mut c = Choreographer::new(PhaseSchedule::new(vec![1.0, 1.0]).unwrap());
        c.set_loaded(0.5);
        // Current cycle keeps running
        assert_eq!(c.at(1.5).index, 1);
        assert!(!c.at(1.5).held);
        // Then freezes on the last phase at full progress
        let held = c.at(2.5);
        assert!(held.held);
        assert_eq!(held.index, 1);
        assert_eq!(held.progress, 1.0);
        assert_eq!(c.at(50.0), held);

        // A second signal does not move the hold point
        c.set_loaded(10.0);
        assert!(c.at(2.5).held);
    }

    #[test]
    fn test_opacity_is_capped() {
        let config = ChoreographyConfig::default();
        assert!((config.opacity(0, 4) - 0.15).abs() < 1e-6);
        assert!((config.opacity(3, 4) - 0.30).abs() < 1e-6);
        assert!(config.opacity(10, 4) <= 0.30);
    }

    #[test]
    fn test_boot_reveals_prefix() {
        let mut ns = neurons(100);
        BootPhase::Boot.apply(&mut ns, 0.5, 1.0);
        let visible = ns.iter().filter(|n| n.visible).count();
        assert_eq!(visible, 10);
        assert!(ns[..10].iter().all(|n| n.visible && n.reveal > 0.0));
        assert!(ns[10..].iter().all(|n| !n.visible && n.reveal == 0.0));
    }

    #[test]
    fn test_growth_and_resonance() {
        let mut ns = neurons(100);
        BootPhase::Growth.apply(&mut ns, 0.0, 1.0);
        assert_eq!(ns.iter().filter(|n| n.visible).count(), 20);
        assert!((ns[0].spike_chance - 0.005).abs() < 1e-6);

        BootPhase::Resonance.apply(&mut ns, 0.5, 1.0);
        assert!(ns.iter().all(|n| n.visible && n.reveal == 1.0));
        assert!((ns[99].spike_chance - 0.025).abs() < 1e-6);
    }

    #[test]
    fn test_convergence_ramps_to_ceiling() {
        let mut ns = neurons(4);
        BootPhase::Convergence.apply(&mut ns, 0.0, 1.0);
        assert!((ns[0].spike_chance - 0.1).abs() < 1e-6);
        BootPhase::Convergence.apply(&mut ns, 1.0, 1.0);
        assert!((ns[3].spike_chance - 0.8).abs() < 1e-6);
    }
}
