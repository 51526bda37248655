// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for tandem
//! diagnostics.
//!
//! This crate provides [`TraceSink`](tandem_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`] — compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from
//!   recorded bytes.
//! - [`FanOut`] — forwards every event to two sinks.

pub mod chrome;
pub mod pretty;
pub mod recorder;

use tandem_core::trace::{
    ConsumerInvokedEvent, ConsumerSkippedEvent, DispatchEvent, DriftEvent, PhaseViolationEvent,
    RegistrationEvent, TickReportEvent, TraceSink, UnregistrationEvent,
};

/// A [`TraceSink`] that forwards every event to `A` and then `B`.
///
/// [`Tracer`](tandem_core::trace::Tracer) holds a single sink; nest
/// `FanOut`s to feed more than two.
#[derive(Debug, Default)]
pub struct FanOut<A, B>(pub A, pub B);

impl<A: TraceSink, B: TraceSink> TraceSink for FanOut<A, B> {
    fn on_tick_report(&mut self, e: &TickReportEvent) {
        self.0.on_tick_report(e);
        self.1.on_tick_report(e);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.0.on_dispatch(e);
        self.1.on_dispatch(e);
    }

    fn on_drift(&mut self, e: &DriftEvent) {
        self.0.on_drift(e);
        self.1.on_drift(e);
    }

    fn on_registration(&mut self, e: &RegistrationEvent) {
        self.0.on_registration(e);
        self.1.on_registration(e);
    }

    fn on_unregistration(&mut self, e: &UnregistrationEvent) {
        self.0.on_unregistration(e);
        self.1.on_unregistration(e);
    }

    fn on_phase_violation(&mut self, e: &PhaseViolationEvent) {
        self.0.on_phase_violation(e);
        self.1.on_phase_violation(e);
    }

    fn on_consumer_skipped(&mut self, e: &ConsumerSkippedEvent) {
        self.0.on_consumer_skipped(e);
        self.1.on_consumer_skipped(e);
    }

    fn on_consumer_invoked(&mut self, e: &ConsumerInvokedEvent) {
        self.0.on_consumer_invoked(e);
        self.1.on_consumer_invoked(e);
    }
}
