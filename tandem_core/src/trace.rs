// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the scheduler.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! scheduler calls as it coalesces reports, dispatches consumers, and
//! accounts drift. All method bodies default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) — gates [`ConsumerInvokedEvent`], emitted
//!   once per consumer per dispatch.

use crate::coalesce::TickKind;
use crate::consumer::ConsumerId;
use crate::time::DeltaTime;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every tick report, first or absorbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReportEvent {
    /// Cycle the report belongs to. Incremented by each first report.
    pub cycle: u64,
    /// Which tick source was reported.
    pub kind: TickKind,
    /// Whether the report opened the phase.
    pub first: bool,
    /// Consumers counted in the phase after this report (0 once it closed).
    pub processed: u32,
    /// Registered consumers.
    pub total: u32,
}

/// Emitted after every consumer has been called for a dispatch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DispatchEvent {
    /// Cycle that triggered the dispatch.
    pub cycle: u64,
    /// Which tick source triggered it.
    pub kind: TickKind,
    /// Elapsed time handed to every consumer.
    pub dt: DeltaTime,
    /// Consumers whose callback ran.
    pub invoked: u32,
    /// Consumers that were skipped.
    pub skipped: u32,
}

/// Emitted after the drift clock is updated for a first report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriftEvent {
    /// Cycle that updated the clock.
    pub cycle: u64,
    /// Stolen time after the update.
    pub stolen: DeltaTime,
    /// Elapsed time the next fixed dispatch would receive.
    pub effective_fixed_delta: DeltaTime,
    /// Whether the phase just recorded was fixed.
    pub last_phase_was_fixed: bool,
}

/// Emitted when a consumer joins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistrationEvent {
    /// Slot handle of the new consumer.
    pub consumer: ConsumerId,
    /// Priority the consumer is dispatched at.
    pub priority: i32,
    /// Registered consumers after the join.
    pub total: u32,
    /// Whether the join resynchronized an idle scheduler.
    pub resync: bool,
}

/// Emitted when a consumer leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnregistrationEvent {
    /// Slot handle the consumer occupied.
    pub consumer: ConsumerId,
    /// Priority the consumer was dispatched at.
    pub priority: i32,
    /// Registered consumers after the leave.
    pub total: u32,
}

/// Emitted when a tick report arrives for the wrong phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseViolationEvent {
    /// Cycle of the phase that was still open.
    pub cycle: u64,
    /// The open phase.
    pub open: TickKind,
    /// The kind that was reported.
    pub reported: TickKind,
}

/// Why a consumer was not called during a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The consumer's `Rc` was dropped without unregistering.
    Dropped,
    /// The consumer's `RefCell` was already borrowed.
    Busy,
}

/// Emitted when a consumer is skipped during a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsumerSkippedEvent {
    /// Cycle of the dispatch.
    pub cycle: u64,
    /// The skipped consumer.
    pub consumer: ConsumerId,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Emitted after each consumer callback returns (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsumerInvokedEvent {
    /// Cycle of the dispatch.
    pub cycle: u64,
    /// The consumer that ran.
    pub consumer: ConsumerId,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the scheduler.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called for every tick report.
    fn on_tick_report(&mut self, e: &TickReportEvent) {
        _ = e;
    }

    /// Called after a dispatch completes.
    fn on_dispatch(&mut self, e: &DispatchEvent) {
        _ = e;
    }

    /// Called after the drift clock is updated.
    fn on_drift(&mut self, e: &DriftEvent) {
        _ = e;
    }

    /// Called when a consumer registers.
    fn on_registration(&mut self, e: &RegistrationEvent) {
        _ = e;
    }

    /// Called when a consumer unregisters.
    fn on_unregistration(&mut self, e: &UnregistrationEvent) {
        _ = e;
    }

    /// Called when a phase violation is detected.
    fn on_phase_violation(&mut self, e: &PhaseViolationEvent) {
        _ = e;
    }

    /// Called when a consumer is skipped during dispatch.
    fn on_consumer_skipped(&mut self, e: &ConsumerSkippedEvent) {
        _ = e;
    }

    /// Called after each consumer callback (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_consumer_invoked(&mut self, e: &ConsumerInvokedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! emit {
    ($(#[$doc:meta])* $name:ident, $hook:ident, $event:ty) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$event) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$hook(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    emit!(
        /// Emits a [`TickReportEvent`].
        tick_report, on_tick_report, TickReportEvent
    );
    emit!(
        /// Emits a [`DispatchEvent`].
        dispatch, on_dispatch, DispatchEvent
    );
    emit!(
        /// Emits a [`DriftEvent`].
        drift, on_drift, DriftEvent
    );
    emit!(
        /// Emits a [`RegistrationEvent`].
        registration, on_registration, RegistrationEvent
    );
    emit!(
        /// Emits an [`UnregistrationEvent`].
        unregistration, on_unregistration, UnregistrationEvent
    );
    emit!(
        /// Emits a [`PhaseViolationEvent`].
        phase_violation, on_phase_violation, PhaseViolationEvent
    );
    emit!(
        /// Emits a [`ConsumerSkippedEvent`].
        consumer_skipped, on_consumer_skipped, ConsumerSkippedEvent
    );

    /// Emits a [`ConsumerInvokedEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn consumer_invoked(&mut self, e: &ConsumerInvokedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_consumer_invoked(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> TickReportEvent {
        TickReportEvent {
            cycle: 3,
            kind: TickKind::Fixed,
            first: true,
            processed: 1,
            total: 4,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_tick_report(&sample_report());
        sink.on_dispatch(&DispatchEvent {
            cycle: 3,
            kind: TickKind::Fixed,
            dt: DeltaTime(0.02),
            invoked: 4,
            skipped: 0,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.tick_report(&sample_report());
        tracer.phase_violation(&PhaseViolationEvent {
            cycle: 1,
            open: TickKind::Variable,
            reported: TickKind::Fixed,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            cycles: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_tick_report(&mut self, e: &TickReportEvent) {
                self.cycles.push(e.cycle);
            }
        }

        let mut sink = RecordingSink { cycles: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.tick_report(&sample_report());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.cycles, &[3]);
    }
}
