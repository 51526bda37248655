// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Elapsed-time values handed to update consumers.
//!
//! [`DeltaTime`] is a span of seconds stored as `f32`, the resolution game
//! hosts typically report frame and fixed-step deltas in. It is always
//! produced non-negative by the scheduler; arithmetic that could go below
//! zero has a saturating form.

use core::fmt;
use core::ops::{Add, AddAssign, Sub};

/// A span of elapsed time in seconds.
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct DeltaTime(pub f32);

impl DeltaTime {
    /// A zero-length span.
    pub const ZERO: Self = Self(0.0);

    /// Creates a span from a number of seconds.
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: f32) -> Self {
        Self(secs)
    }

    /// Returns the span in seconds.
    #[inline]
    #[must_use]
    pub const fn secs(self) -> f32 {
        self.0
    }

    /// Returns the span in microseconds, widened to `f64`.
    #[inline]
    #[must_use]
    pub fn as_micros_f64(self) -> f64 {
        f64::from(self.0) * 1_000_000.0
    }

    /// Converts a [`core::time::Duration`] into a span.
    #[inline]
    #[must_use]
    pub fn from_duration(duration: core::time::Duration) -> Self {
        Self(duration.as_secs_f32())
    }

    /// Converts this span into a [`core::time::Duration`].
    ///
    /// Negative or non-finite spans convert to [`Duration::ZERO`](core::time::Duration::ZERO).
    #[inline]
    #[must_use]
    pub fn to_duration(self) -> core::time::Duration {
        core::time::Duration::try_from_secs_f32(self.0).unwrap_or(core::time::Duration::ZERO)
    }

    /// Replaces negative and NaN spans with zero.
    #[inline]
    #[must_use]
    pub fn non_negative(self) -> Self {
        Self(self.0.max(0.0))
    }

    /// Subtraction that clamps at zero.
    #[inline]
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self((self.0 - rhs.0).max(0.0))
    }

    /// Clamps the span into `[0, max]`.
    #[inline]
    #[must_use]
    pub fn clamp_to(self, max: Self) -> Self {
        Self(self.0.max(0.0).min(max.0.max(0.0)))
    }
}

impl Add for DeltaTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for DeltaTime {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for DeltaTime {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for DeltaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeltaTime({:.6}s)", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_sub_clamps_at_zero() {
        let a = DeltaTime(0.01);
        let b = DeltaTime(0.03);
        assert_eq!(a.saturating_sub(b), DeltaTime::ZERO);
        assert!((b.saturating_sub(a).secs() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn clamp_to_bounds_both_ends() {
        let max = DeltaTime(0.02);
        assert_eq!(DeltaTime(0.05).clamp_to(max), max);
        assert_eq!(DeltaTime(-1.0).clamp_to(max), DeltaTime::ZERO);
        assert_eq!(DeltaTime(0.01).clamp_to(max), DeltaTime(0.01));
    }

    #[test]
    fn non_negative_discards_nan() {
        assert_eq!(DeltaTime(f32::NAN).non_negative(), DeltaTime::ZERO);
        assert_eq!(DeltaTime(-0.5).non_negative(), DeltaTime::ZERO);
        assert_eq!(DeltaTime(0.5).non_negative(), DeltaTime(0.5));
    }

    #[test]
    fn duration_conversion() {
        let d = DeltaTime::from_duration(core::time::Duration::from_millis(20));
        assert!((d.secs() - 0.02).abs() < 1e-6, "got {d:?}");
        assert_eq!(DeltaTime(-3.0).to_duration(), core::time::Duration::ZERO);
        assert_eq!(
            DeltaTime(0.5).to_duration(),
            core::time::Duration::from_millis(500)
        );
    }
}
