// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-supplied scheduler configuration.

use crate::time::DeltaTime;

/// Configuration for a [`HybridScheduler`](crate::scheduler::HybridScheduler).
///
/// The fixed interval mirrors the host's fixed-step setting. The scheduler
/// only reads it; hosts that change their step rate at runtime push the new
/// value through
/// [`HybridScheduler::set_fixed_interval`](crate::scheduler::HybridScheduler::set_fixed_interval).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Length of one fixed step.
    ///
    /// Also the upper bound on the stolen time the drift clock may
    /// accumulate.
    pub fixed_interval: DeltaTime,
}

impl SchedulerConfig {
    /// 50 Hz fixed step (20 ms), the common engine default.
    pub const DEFAULT: Self = Self {
        fixed_interval: DeltaTime(0.02),
    };

    /// Creates a configuration with the given fixed interval.
    #[must_use]
    pub const fn new(fixed_interval: DeltaTime) -> Self {
        Self { fixed_interval }
    }

    /// Creates a configuration stepping `hz` times per second.
    ///
    /// # Panics
    ///
    /// Panics if `hz` is zero.
    #[must_use]
    pub const fn with_rate(hz: u32) -> Self {
        assert!(hz != 0, "fixed step rate must not be zero");
        Self {
            fixed_interval: DeltaTime(1.0 / hz as f32),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_rate_matches_default() {
        let cfg = SchedulerConfig::with_rate(50);
        let default = SchedulerConfig::DEFAULT.fixed_interval;
        assert!((cfg.fixed_interval.secs() - default.secs()).abs() < 1e-7);
    }

    #[test]
    #[should_panic(expected = "fixed step rate must not be zero")]
    fn zero_rate_panics() {
        let _ = SchedulerConfig::with_rate(0);
    }
}
