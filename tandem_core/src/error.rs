// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scheduler error type.

use core::fmt;

use crate::coalesce::TickKind;

/// Errors returned by scheduler and registry operations.
///
/// Every variant is a contract violation by the caller. None of them is
/// retried internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    /// A tick of one kind was reported while consumers were still reporting
    /// a phase of the other kind.
    ///
    /// Fatal for the scheduler instance: further tick reports fail with the
    /// same error until [`reset`](crate::scheduler::HybridScheduler::reset)
    /// is called.
    PhaseViolation {
        /// The phase that was still collecting reports.
        open: TickKind,
        /// The kind of tick that arrived.
        reported: TickKind,
    },
    /// The priority is already owned by a different tag.
    DuplicatePriority {
        /// The contested priority.
        priority: i32,
    },
    /// The token is not tracked by this registry.
    UnknownToken,
    /// The consumer reference was already dead when it was registered.
    EmptyRegistration,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhaseViolation { open, reported } => write!(
                f,
                "{reported:?} tick reported while a {open:?} phase is still open"
            ),
            Self::DuplicatePriority { priority } => {
                write!(f, "priority {priority} is already owned by another tag")
            }
            Self::UnknownToken => f.write_str("token is not registered with this scheduler"),
            Self::EmptyRegistration => f.write_str("cannot register a dead consumer"),
        }
    }
}

impl core::error::Error for SchedulerError {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_names_both_phases() {
        let e = SchedulerError::PhaseViolation {
            open: TickKind::Variable,
            reported: TickKind::Fixed,
        };
        assert_eq!(
            e.to_string(),
            "Fixed tick reported while a Variable phase is still open"
        );
    }

    #[test]
    fn display_duplicate_priority() {
        let e = SchedulerError::DuplicatePriority { priority: 7 };
        assert!(e.to_string().contains("priority 7"));
    }
}
