// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. Scheduler events carry no wall-clock
//! time, so the recorder stamps each record with a host timestamp that the
//! caller advances as its loop runs ([`advance`](RecorderSink::advance)).
//! [`decode`] reads the records back as an iterator of [`Record`].

use tandem_core::coalesce::TickKind;
use tandem_core::consumer::ConsumerId;
use tandem_core::time::DeltaTime;
use tandem_core::trace::{
    ConsumerInvokedEvent, ConsumerSkippedEvent, DispatchEvent, DriftEvent, PhaseViolationEvent,
    RegistrationEvent, SkipReason, TickReportEvent, TraceSink, UnregistrationEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TICK_REPORT: u8 = 1;
const TAG_DISPATCH: u8 = 2;
const TAG_DRIFT: u8 = 3;
const TAG_REGISTRATION: u8 = 4;
const TAG_UNREGISTRATION: u8 = 5;
const TAG_PHASE_VIOLATION: u8 = 6;
const TAG_CONSUMER_SKIPPED: u8 = 7;
const TAG_CONSUMER_INVOKED: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
    now_us: u64,
}

impl RecorderSink {
    /// Creates an empty recorder with its clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timestamp, in microseconds, stamped on subsequent records.
    pub fn set_time_us(&mut self, now_us: u64) {
        self.now_us = now_us;
    }

    /// Moves the record clock forward by `dt`.
    pub fn advance(&mut self, dt: DeltaTime) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "non-negative frame deltas fit comfortably in u64 microseconds"
        )]
        let us = dt.non_negative().as_micros_f64().round() as u64;
        self.now_us = self.now_us.saturating_add(us);
    }

    /// Returns the timestamp stamped on the next record.
    #[must_use]
    pub fn now_us(&self) -> u64 {
        self.now_us
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8) {
        self.write_u8(tag);
        self.write_u64(self.now_us);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_dt(&mut self, dt: DeltaTime) {
        self.buf.extend_from_slice(&dt.secs().to_le_bytes());
    }

    fn write_kind(&mut self, kind: TickKind) {
        self.write_u8(match kind {
            TickKind::Fixed => 0,
            TickKind::Variable => 1,
        });
    }

    fn write_consumer(&mut self, id: ConsumerId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }
}

impl TraceSink for RecorderSink {
    fn on_tick_report(&mut self, e: &TickReportEvent) {
        self.begin(TAG_TICK_REPORT);
        self.write_u64(e.cycle);
        self.write_kind(e.kind);
        self.write_bool(e.first);
        self.write_u32(e.processed);
        self.write_u32(e.total);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.begin(TAG_DISPATCH);
        self.write_u64(e.cycle);
        self.write_kind(e.kind);
        self.write_dt(e.dt);
        self.write_u32(e.invoked);
        self.write_u32(e.skipped);
    }

    fn on_drift(&mut self, e: &DriftEvent) {
        self.begin(TAG_DRIFT);
        self.write_u64(e.cycle);
        self.write_dt(e.stolen);
        self.write_dt(e.effective_fixed_delta);
        self.write_bool(e.last_phase_was_fixed);
    }

    fn on_registration(&mut self, e: &RegistrationEvent) {
        self.begin(TAG_REGISTRATION);
        self.write_consumer(e.consumer);
        self.write_i32(e.priority);
        self.write_u32(e.total);
        self.write_bool(e.resync);
    }

    fn on_unregistration(&mut self, e: &UnregistrationEvent) {
        self.begin(TAG_UNREGISTRATION);
        self.write_consumer(e.consumer);
        self.write_i32(e.priority);
        self.write_u32(e.total);
    }

    fn on_phase_violation(&mut self, e: &PhaseViolationEvent) {
        self.begin(TAG_PHASE_VIOLATION);
        self.write_u64(e.cycle);
        self.write_kind(e.open);
        self.write_kind(e.reported);
    }

    fn on_consumer_skipped(&mut self, e: &ConsumerSkippedEvent) {
        self.begin(TAG_CONSUMER_SKIPPED);
        self.write_u64(e.cycle);
        self.write_consumer(e.consumer);
        self.write_u8(match e.reason {
            SkipReason::Dropped => 0,
            SkipReason::Busy => 1,
        });
    }

    fn on_consumer_invoked(&mut self, e: &ConsumerInvokedEvent) {
        self.begin(TAG_CONSUMER_INVOKED);
        self.write_u64(e.cycle);
        self.write_consumer(e.consumer);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`TickReportEvent`].
    TickReport(TickReportEvent),
    /// A [`DispatchEvent`].
    Dispatch(DispatchEvent),
    /// A [`DriftEvent`].
    Drift(DriftEvent),
    /// A [`RegistrationEvent`].
    Registration(RegistrationEvent),
    /// An [`UnregistrationEvent`].
    Unregistration(UnregistrationEvent),
    /// A [`PhaseViolationEvent`].
    PhaseViolation(PhaseViolationEvent),
    /// A [`ConsumerSkippedEvent`].
    ConsumerSkipped(ConsumerSkippedEvent),
    /// A [`ConsumerInvokedEvent`].
    ConsumerInvoked(ConsumerInvokedEvent),
}

/// A decoded event with the host timestamp it was recorded at.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Recorder clock at the time of the event, in microseconds.
    pub at_us: u64,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Record`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded records.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[v]| v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_dt(&mut self) -> Option<DeltaTime> {
        self.read_array().map(f32::from_le_bytes).map(DeltaTime)
    }

    fn read_kind(&mut self) -> Option<TickKind> {
        Some(match self.read_u8()? {
            0 => TickKind::Fixed,
            _ => TickKind::Variable,
        })
    }

    fn read_consumer(&mut self) -> Option<ConsumerId> {
        Some(ConsumerId::from_raw(self.read_u32()?, self.read_u32()?))
    }

    fn read_reason(&mut self) -> Option<SkipReason> {
        Some(match self.read_u8()? {
            0 => SkipReason::Dropped,
            _ => SkipReason::Busy,
        })
    }

    fn decode_event(&mut self, tag: u8) -> Option<RecordedEvent> {
        Some(match tag {
            TAG_TICK_REPORT => RecordedEvent::TickReport(TickReportEvent {
                cycle: self.read_u64()?,
                kind: self.read_kind()?,
                first: self.read_bool()?,
                processed: self.read_u32()?,
                total: self.read_u32()?,
            }),
            TAG_DISPATCH => RecordedEvent::Dispatch(DispatchEvent {
                cycle: self.read_u64()?,
                kind: self.read_kind()?,
                dt: self.read_dt()?,
                invoked: self.read_u32()?,
                skipped: self.read_u32()?,
            }),
            TAG_DRIFT => RecordedEvent::Drift(DriftEvent {
                cycle: self.read_u64()?,
                stolen: self.read_dt()?,
                effective_fixed_delta: self.read_dt()?,
                last_phase_was_fixed: self.read_bool()?,
            }),
            TAG_REGISTRATION => RecordedEvent::Registration(RegistrationEvent {
                consumer: self.read_consumer()?,
                priority: self.read_i32()?,
                total: self.read_u32()?,
                resync: self.read_bool()?,
            }),
            TAG_UNREGISTRATION => RecordedEvent::Unregistration(UnregistrationEvent {
                consumer: self.read_consumer()?,
                priority: self.read_i32()?,
                total: self.read_u32()?,
            }),
            TAG_PHASE_VIOLATION => RecordedEvent::PhaseViolation(PhaseViolationEvent {
                cycle: self.read_u64()?,
                open: self.read_kind()?,
                reported: self.read_kind()?,
            }),
            TAG_CONSUMER_SKIPPED => RecordedEvent::ConsumerSkipped(ConsumerSkippedEvent {
                cycle: self.read_u64()?,
                consumer: self.read_consumer()?,
                reason: self.read_reason()?,
            }),
            TAG_CONSUMER_INVOKED => RecordedEvent::ConsumerInvoked(ConsumerInvokedEvent {
                cycle: self.read_u64()?,
                consumer: self.read_consumer()?,
            }),
            _ => return None, // unknown tag → stop iteration
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let at_us = self.read_u64()?;
        let event = self.decode_event(tag)?;
        Some(Record { at_us, event })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
