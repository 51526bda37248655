// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Report counting that collapses N per-consumer tick reports into one.
//!
//! Every registered consumer forwards the same conceptual tick to the
//! scheduler. [`TickCoalescer`] tells the first report of a phase apart from
//! the rest purely by counting: the first report opens a phase, the phase
//! closes once as many reports as there are consumers have arrived, and the
//! next report opens a new one. No consumer needs to know how many others
//! exist.
//!
//! ```text
//!   consumers = 3
//!
//!   report_fixed()   ──► first   (phase Fixed, 1/3)
//!   report_fixed()   ──► absorbed          (2/3)
//!   report_fixed()   ──► absorbed          (3/3 → phase closed)
//!   report_variable()──► first   (phase Variable, 1/3)
//! ```

use crate::error::SchedulerError;

/// Which of the two external tick sources a report belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickKind {
    /// The stable fixed-rate tick.
    Fixed,
    /// The per-frame variable-rate tick.
    Variable,
}

/// Counts tick reports to decide which one triggers a dispatch.
///
/// The open phase is `None` exactly when no report of the current cycle has
/// been counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickCoalescer {
    total: u32,
    processed: u32,
    phase: Option<TickKind>,
}

impl TickCoalescer {
    /// Creates a coalescer with no consumers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total: 0,
            processed: 0,
            phase: None,
        }
    }

    /// Counts one report of `kind`.
    ///
    /// Returns `Ok(true)` when the report opened a new phase and should
    /// trigger a dispatch, `Ok(false)` when it was absorbed into the open
    /// phase.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PhaseViolation`] if a phase of the other
    /// kind is still open. The coalescer is left untouched.
    pub fn report(&mut self, kind: TickKind) -> Result<bool, SchedulerError> {
        let first = match self.phase {
            None => {
                self.phase = Some(kind);
                self.processed = 1;
                true
            }
            Some(open) if open == kind => {
                self.processed += 1;
                false
            }
            Some(open) => {
                return Err(SchedulerError::PhaseViolation {
                    open,
                    reported: kind,
                });
            }
        };
        if self.processed >= self.total {
            self.close_phase();
        }
        Ok(first)
    }

    /// Shorthand for [`report(TickKind::Fixed)`](Self::report).
    ///
    /// # Errors
    ///
    /// See [`report`](Self::report).
    pub fn report_fixed(&mut self) -> Result<bool, SchedulerError> {
        self.report(TickKind::Fixed)
    }

    /// Shorthand for [`report(TickKind::Variable)`](Self::report).
    ///
    /// # Errors
    ///
    /// See [`report`](Self::report).
    pub fn report_variable(&mut self) -> Result<bool, SchedulerError> {
        self.report(TickKind::Variable)
    }

    /// Accounts for a newly registered consumer.
    ///
    /// A consumer joining mid-phase is counted as having already reported,
    /// since the phase was opened without it.
    pub fn add(&mut self) {
        self.total += 1;
        if self.phase.is_some() {
            self.processed += 1;
        }
    }

    /// Accounts for an unregistered consumer.
    ///
    /// Mid-phase, the leaving consumer is assumed to have reported already.
    /// The phase originator always stays counted, and the phase closes if
    /// the remaining reports now cover every consumer.
    ///
    /// The count cannot tell who reported. If the leaver had not, the phase
    /// is left one report short and stays open until the next report of the
    /// same kind, or until [`close_phase`](Self::close_phase). A report of
    /// the other kind in the meantime is a [`SchedulerError::PhaseViolation`].
    pub fn subtract(&mut self) {
        self.total = self.total.saturating_sub(1);
        if self.phase.is_some() {
            self.processed = self.processed.saturating_sub(1).max(1);
            if self.processed >= self.total {
                self.close_phase();
            }
        }
    }

    /// Clears both counters and closes any open phase.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Returns the number of registered consumers.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Returns how many consumers have reported in the open phase.
    #[must_use]
    pub const fn processed(&self) -> u32 {
        self.processed
    }

    /// Returns the open phase, if any.
    #[must_use]
    pub const fn phase(&self) -> Option<TickKind> {
        self.phase
    }

    /// Abandons any open phase, keeping the consumer count.
    pub fn close_phase(&mut self) {
        self.processed = 0;
        self.phase = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_consumers(n: u32) -> TickCoalescer {
        let mut c = TickCoalescer::new();
        for _ in 0..n {
            c.add();
        }
        c
    }

    #[test]
    fn single_consumer_every_report_is_first() {
        let mut c = with_consumers(1);
        assert_eq!(c.report_fixed(), Ok(true));
        assert_eq!(c.phase(), None);
        assert_eq!(c.report_fixed(), Ok(true));
        assert_eq!(c.report_variable(), Ok(true));
        assert_eq!(c.processed(), 0);
    }

    #[test]
    fn only_first_of_n_reports_fires() {
        for n in 1..=8 {
            let mut c = with_consumers(n);
            let firsts = (0..n).filter(|_| c.report_fixed() == Ok(true)).count();
            assert_eq!(firsts, 1, "n = {n}");
            assert_eq!(c.phase(), None, "phase should close after {n} reports");
        }
    }

    #[test]
    fn phase_closes_then_reopens() {
        let mut c = with_consumers(2);
        assert_eq!(c.report_fixed(), Ok(true));
        assert_eq!(c.phase(), Some(TickKind::Fixed));
        assert_eq!(c.report_fixed(), Ok(false));
        assert_eq!(c.phase(), None);
        assert_eq!(c.report_variable(), Ok(true));
        assert_eq!(c.phase(), Some(TickKind::Variable));
    }

    #[test]
    fn mismatched_kind_is_a_violation() {
        let mut c = with_consumers(2);
        c.report_variable().unwrap();
        let before = c;
        assert_eq!(
            c.report_fixed(),
            Err(SchedulerError::PhaseViolation {
                open: TickKind::Variable,
                reported: TickKind::Fixed,
            })
        );
        assert_eq!(c, before, "violation must not mutate state");
    }

    #[test]
    fn joining_mid_phase_counts_as_reported() {
        let mut c = with_consumers(2);
        c.report_fixed().unwrap();
        c.add();
        assert_eq!(c.processed(), 2);
        assert_eq!(c.total(), 3);
        // One more report from the remaining original consumer closes it.
        assert_eq!(c.report_fixed(), Ok(false));
        assert_eq!(c.phase(), None);
    }

    #[test]
    fn leaving_mid_phase_can_close_it() {
        let mut c = with_consumers(2);
        c.report_fixed().unwrap();
        c.subtract();
        // The originator is the only consumer left.
        assert_eq!(c.total(), 1);
        assert_eq!(c.phase(), None);
        assert_eq!(c.report_fixed(), Ok(true));
    }

    #[test]
    fn leaving_mid_phase_keeps_originator_counted() {
        let mut c = with_consumers(3);
        c.report_fixed().unwrap();
        c.subtract();
        assert_eq!(c.total(), 2);
        assert_eq!(c.processed(), 1);
        assert_eq!(c.phase(), Some(TickKind::Fixed));
        assert_eq!(c.report_fixed(), Ok(false));
        assert_eq!(c.phase(), None);
    }

    #[test]
    fn unreported_leaver_leaves_phase_one_short() {
        let mut c = with_consumers(3);
        c.report_fixed().unwrap();
        c.report_fixed().unwrap();
        // The third consumer leaves without having reported.
        c.subtract();
        assert_eq!(c.total(), 2);
        assert_eq!(c.processed(), 1);
        assert_eq!(c.phase(), Some(TickKind::Fixed));
        assert_eq!(
            c.report_variable(),
            Err(SchedulerError::PhaseViolation {
                open: TickKind::Fixed,
                reported: TickKind::Variable,
            })
        );
        c.close_phase();
        assert_eq!(c.report_variable(), Ok(true));
    }

    #[test]
    fn last_consumer_leaving_closes_phase() {
        let mut c = with_consumers(2);
        c.report_variable().unwrap();
        c.subtract();
        c.subtract();
        assert_eq!(c.total(), 0);
        assert_eq!(c.phase(), None);
        assert_eq!(c.processed(), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut c = with_consumers(4);
        c.report_fixed().unwrap();
        c.reset();
        assert_eq!(c, TickCoalescer::new());
    }
}
