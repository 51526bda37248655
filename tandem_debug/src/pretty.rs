// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Elapsed
//! times are printed in milliseconds.

use std::io::Write;

use tandem_core::coalesce::TickKind;
use tandem_core::time::DeltaTime;
use tandem_core::trace::{
    ConsumerInvokedEvent, ConsumerSkippedEvent, DispatchEvent, DriftEvent, PhaseViolationEvent,
    RegistrationEvent, SkipReason, TickReportEvent, TraceSink, UnregistrationEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    absorbed: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("absorbed", &self.absorbed)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            absorbed: false,
        }
    }

    /// Also prints absorbed tick reports (off by default; there is one per
    /// consumer per phase).
    #[must_use]
    pub fn with_absorbed(mut self, absorbed: bool) -> Self {
        self.absorbed = absorbed;
        self
    }

    /// Returns the destination, consuming the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn kind_name(kind: TickKind) -> &'static str {
    match kind {
        TickKind::Fixed => "fixed",
        TickKind::Variable => "variable",
    }
}

fn ms(dt: DeltaTime) -> f64 {
    dt.as_micros_f64() / 1000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick_report(&mut self, e: &TickReportEvent) {
        if !e.first && !self.absorbed {
            return;
        }
        let role = if e.first { "first" } else { "absorbed" };
        let _ = writeln!(
            self.writer,
            "[report] cycle={} {} {role} {}/{}",
            e.cycle,
            kind_name(e.kind),
            e.processed,
            e.total,
        );
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        let _ = writeln!(
            self.writer,
            "[dispatch] cycle={} {} dt={:.3}ms invoked={} skipped={}",
            e.cycle,
            kind_name(e.kind),
            ms(e.dt),
            e.invoked,
            e.skipped,
        );
    }

    fn on_drift(&mut self, e: &DriftEvent) {
        let last = if e.last_phase_was_fixed {
            "fixed"
        } else {
            "variable"
        };
        let _ = writeln!(
            self.writer,
            "[drift] cycle={} stolen={:.3}ms next_fixed={:.3}ms last={last}",
            e.cycle,
            ms(e.stolen),
            ms(e.effective_fixed_delta),
        );
    }

    fn on_registration(&mut self, e: &RegistrationEvent) {
        let resync = if e.resync { " resync" } else { "" };
        let _ = writeln!(
            self.writer,
            "[join] {:?} priority={} total={}{resync}",
            e.consumer, e.priority, e.total,
        );
    }

    fn on_unregistration(&mut self, e: &UnregistrationEvent) {
        let _ = writeln!(
            self.writer,
            "[leave] {:?} priority={} total={}",
            e.consumer, e.priority, e.total,
        );
    }

    fn on_phase_violation(&mut self, e: &PhaseViolationEvent) {
        let _ = writeln!(
            self.writer,
            "[VIOLATION] cycle={} {} reported during open {} phase",
            e.cycle,
            kind_name(e.reported),
            kind_name(e.open),
        );
    }

    fn on_consumer_skipped(&mut self, e: &ConsumerSkippedEvent) {
        let reason = match e.reason {
            SkipReason::Dropped => "dropped",
            SkipReason::Busy => "busy",
        };
        let _ = writeln!(
            self.writer,
            "[skip] cycle={} {:?} {reason}",
            e.cycle, e.consumer,
        );
    }

    fn on_consumer_invoked(&mut self, e: &ConsumerInvokedEvent) {
        let _ = writeln!(self.writer, "[invoke] cycle={} {:?}", e.cycle, e.consumer);
    }
}
