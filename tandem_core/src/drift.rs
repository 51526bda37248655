// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stolen-time accounting between the fixed and variable tick sources.
//!
//! When frames render faster than the fixed step, several variable phases
//! can pass without a fixed one. Consumers are serviced on those frames with
//! the frame delta, so that wall-clock time has already been handed out once.
//! [`DriftClock`] accumulates it as *stolen time* and shortens the next fixed
//! dispatch by the same amount:
//!
//! ```text
//!   fixed_interval = 20ms
//!
//!   Fixed     ──► dispatch(20ms)          stolen = 0
//!   Variable  ──► (fixed already ran)     stolen = 0
//!   Variable  ──► dispatch(8ms)           stolen = 8ms
//!   Variable  ──► dispatch(7ms)           stolen = 15ms
//!   Fixed     ──► dispatch(20 - 15 = 5ms) stolen = 0
//! ```
//!
//! Stolen time never exceeds one fixed interval.

use crate::time::DeltaTime;

/// Tracks the last dispatched phase and the time stolen from the next fixed
/// step.
///
/// The fixed interval is owned by the host configuration and passed in by
/// the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DriftClock {
    last_phase_was_fixed: bool,
    stolen: DeltaTime,
}

impl DriftClock {
    /// Creates a clock in the reset state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_phase_was_fixed: false,
            stolen: DeltaTime::ZERO,
        }
    }

    /// Records that a fixed phase was dispatched.
    pub fn on_fixed_dispatch(&mut self) {
        self.last_phase_was_fixed = true;
        self.stolen = DeltaTime::ZERO;
    }

    /// Records a variable phase of length `dt`.
    ///
    /// `dt` counts as stolen only when the previous phase was also variable;
    /// the first variable phase after a fixed one was covered by that fixed
    /// step.
    pub fn on_variable_dispatch(&mut self, dt: DeltaTime, fixed_interval: DeltaTime) {
        if !self.last_phase_was_fixed {
            self.stolen += dt;
        }
        self.stolen = self.stolen.clamp_to(fixed_interval);
        self.last_phase_was_fixed = false;
    }

    /// Returns the elapsed time to hand to consumers on the next fixed
    /// dispatch.
    #[must_use]
    pub fn effective_fixed_delta(&self, fixed_interval: DeltaTime) -> DeltaTime {
        if self.stolen > DeltaTime::ZERO {
            fixed_interval.saturating_sub(self.stolen)
        } else {
            fixed_interval
        }
    }

    /// Returns whether the most recent phase was variable.
    ///
    /// The scheduler uses this to service consumers on frames that had no
    /// fixed step.
    #[must_use]
    pub const fn skipped_fixed_last_phase(&self) -> bool {
        !self.last_phase_was_fixed
    }

    /// Returns the accumulated stolen time.
    #[must_use]
    pub const fn stolen(&self) -> DeltaTime {
        self.stolen
    }

    /// Returns to the reset state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: DeltaTime = DeltaTime(0.02);

    fn approx(a: DeltaTime, b: f32) -> bool {
        (a.secs() - b).abs() < 1e-6
    }

    #[test]
    fn fresh_clock_reports_skipped_fixed() {
        let clock = DriftClock::new();
        assert!(clock.skipped_fixed_last_phase());
        assert_eq!(clock.effective_fixed_delta(INTERVAL), INTERVAL);
    }

    #[test]
    fn fixed_dispatch_clears_stolen() {
        let mut clock = DriftClock::new();
        clock.on_variable_dispatch(DeltaTime(0.01), INTERVAL);
        assert!(approx(clock.stolen(), 0.01));
        clock.on_fixed_dispatch();
        assert_eq!(clock.stolen(), DeltaTime::ZERO);
        assert!(!clock.skipped_fixed_last_phase());
    }

    #[test]
    fn first_variable_after_fixed_is_not_stolen() {
        let mut clock = DriftClock::new();
        clock.on_fixed_dispatch();
        clock.on_variable_dispatch(DeltaTime(0.016), INTERVAL);
        assert_eq!(clock.stolen(), DeltaTime::ZERO);
        assert!(clock.skipped_fixed_last_phase());
        clock.on_variable_dispatch(DeltaTime(0.004), INTERVAL);
        assert!(approx(clock.stolen(), 0.004));
    }

    #[test]
    fn stolen_time_clamps_at_interval() {
        let mut clock = DriftClock::new();
        for _ in 0..3 {
            clock.on_variable_dispatch(DeltaTime(0.01), INTERVAL);
            assert!(clock.stolen() <= INTERVAL, "stolen {:?}", clock.stolen());
        }
        assert!(approx(clock.stolen(), 0.02));
        assert_eq!(clock.effective_fixed_delta(INTERVAL), DeltaTime::ZERO);
    }

    #[test]
    fn effective_delta_subtracts_stolen() {
        let mut clock = DriftClock::new();
        clock.on_variable_dispatch(DeltaTime(0.008), INTERVAL);
        clock.on_variable_dispatch(DeltaTime(0.007), INTERVAL);
        assert!(approx(clock.effective_fixed_delta(INTERVAL), 0.005));
    }

    #[test]
    fn shrinking_interval_reclamps_on_next_variable() {
        let mut clock = DriftClock::new();
        clock.on_variable_dispatch(DeltaTime(0.015), INTERVAL);
        clock.on_variable_dispatch(DeltaTime(0.001), DeltaTime(0.01));
        assert!(approx(clock.stolen(), 0.01));
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut clock = DriftClock::new();
        clock.on_fixed_dispatch();
        clock.reset();
        assert_eq!(clock, DriftClock::new());
    }
}
