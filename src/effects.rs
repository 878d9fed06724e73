//! Hazard-mode audio/visual effects timing.
//!
//! A pure square wave alternating between two cue states. The controller
//! only decides the current phase; the run loop turns phase edges into beeps
//! and display updates, so nothing here ever blocks the sampling loop.

use std::time::{Duration, Instant};

/// One of the two alternating cue states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectPhase {
    /// High tone + square icon.
    High,
    /// Low tone + cross icon.
    Low,
}

/// Time-based square-wave toggler for hazard cues.
#[derive(Clone, Debug)]
pub struct EffectsController {
    started: Instant,
    half_cycle: Duration,
    last: Option<EffectPhase>,
}

impl EffectsController {
    /// `half_cycle` is the duration of each phase (400 ms in the stock
    /// hazard profile, for an 800 ms full cycle).
    pub fn new(half_cycle: Duration) -> Self {
        Self {
            started: Instant::now(),
            half_cycle: half_cycle.max(Duration::from_millis(1)),
            last: None,
        }
    }

    /// Phase at a given elapsed time since the run started. Pure.
    pub fn phase_at(&self, elapsed: Duration) -> EffectPhase {
        let half = self.half_cycle.as_millis();
        if (elapsed.as_millis() % (2 * half)) < half {
            EffectPhase::High
        } else {
            EffectPhase::Low
        }
    }

    /// Current phase if it changed since the last call, else `None`.
    ///
    /// The first call after a reset always reports a phase.
    pub fn update(&mut self) -> Option<EffectPhase> {
        let phase = self.phase_at(self.started.elapsed());
        if self.last != Some(phase) {
            self.last = Some(phase);
            Some(phase)
        } else {
            None
        }
    }

    /// Restart the cycle, e.g. when driving begins.
    pub fn reset(&mut self) {
        self.started = Instant::now();
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_for_first_half_cycle() {
        let fx = EffectsController::new(Duration::from_millis(400));
        assert_eq!(fx.phase_at(Duration::from_millis(0)), EffectPhase::High);
        assert_eq!(fx.phase_at(Duration::from_millis(399)), EffectPhase::High);
        assert_eq!(fx.phase_at(Duration::from_millis(400)), EffectPhase::Low);
        assert_eq!(fx.phase_at(Duration::from_millis(799)), EffectPhase::Low);
        assert_eq!(fx.phase_at(Duration::from_millis(800)), EffectPhase::High);
    }

    #[test]
    fn period_is_honored() {
        let fx = EffectsController::new(Duration::from_millis(100));
        assert_eq!(fx.phase_at(Duration::from_millis(50)), EffectPhase::High);
        assert_eq!(fx.phase_at(Duration::from_millis(150)), EffectPhase::Low);
        assert_eq!(fx.phase_at(Duration::from_millis(250)), EffectPhase::High);
    }

    #[test]
    fn update_reports_edges_only() {
        let mut fx = EffectsController::new(Duration::from_secs(3600));
        // First observation reports the initial phase.
        assert_eq!(fx.update(), Some(EffectPhase::High));
        // Still deep inside the first half-cycle: no edge.
        assert_eq!(fx.update(), None);
        fx.reset();
        assert_eq!(fx.update(), Some(EffectPhase::High));
    }
}
