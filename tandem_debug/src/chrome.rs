// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Dispatches become complete (`"X"`) slices whose duration is the elapsed
//! time handed to consumers, on one track per tick kind. Everything else is
//! an instant event.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use tandem_core::coalesce::TickKind;
use tandem_core::consumer::ConsumerId;

use crate::recorder::{Record, RecordedEvent, decode};

const TID_FIXED: u32 = 1;
const TID_VARIABLE: u32 = 2;
const TID_MEMBERSHIP: u32 = 3;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = vec![
        thread_name(TID_FIXED, "fixed"),
        thread_name(TID_VARIABLE, "variable"),
        thread_name(TID_MEMBERSHIP, "membership"),
    ];

    for Record { at_us, event } in decode(bytes) {
        let value = match event {
            RecordedEvent::TickReport(e) => {
                if !e.first {
                    continue;
                }
                instant("TickReport", "Coalesce", at_us, kind_tid(e.kind), json!({
                    "cycle": e.cycle,
                    "total": e.total,
                }))
            }
            RecordedEvent::Dispatch(e) => json!({
                "ph": "X",
                "name": format!("{:?}Dispatch", e.kind),
                "cat": "Dispatch",
                "ts": at_us,
                "dur": e.dt.as_micros_f64(),
                "pid": 0,
                "tid": kind_tid(e.kind),
                "args": {
                    "cycle": e.cycle,
                    "dt_ms": e.dt.as_micros_f64() / 1000.0,
                    "invoked": e.invoked,
                    "skipped": e.skipped,
                }
            }),
            RecordedEvent::Drift(e) => json!({
                "ph": "C",
                "name": "Drift",
                "cat": "Drift",
                "ts": at_us,
                "pid": 0,
                "args": {
                    "stolen_us": e.stolen.as_micros_f64(),
                    "next_fixed_us": e.effective_fixed_delta.as_micros_f64(),
                }
            }),
            RecordedEvent::Registration(e) => {
                instant("Register", "Membership", at_us, TID_MEMBERSHIP, json!({
                    "consumer": consumer(e.consumer),
                    "priority": e.priority,
                    "total": e.total,
                    "resync": e.resync,
                }))
            }
            RecordedEvent::Unregistration(e) => {
                instant("Unregister", "Membership", at_us, TID_MEMBERSHIP, json!({
                    "consumer": consumer(e.consumer),
                    "priority": e.priority,
                    "total": e.total,
                }))
            }
            RecordedEvent::PhaseViolation(e) => {
                instant("PhaseViolation", "Error", at_us, kind_tid(e.reported), json!({
                    "cycle": e.cycle,
                    "open": format!("{:?}", e.open),
                    "reported": format!("{:?}", e.reported),
                }))
            }
            RecordedEvent::ConsumerSkipped(e) => {
                instant("ConsumerSkipped", "Dispatch", at_us, TID_MEMBERSHIP, json!({
                    "cycle": e.cycle,
                    "consumer": consumer(e.consumer),
                    "reason": format!("{:?}", e.reason),
                }))
            }
            // Per-consumer invocations would only clutter the timeline.
            RecordedEvent::ConsumerInvoked(_) => continue,
        };
        events.push(value);
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn instant(name: &str, cat: &str, ts: u64, tid: u32, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ts,
        "pid": 0,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

fn thread_name(tid: u32, name: &str) -> Value {
    json!({
        "ph": "M",
        "name": "thread_name",
        "pid": 0,
        "tid": tid,
        "args": { "name": name },
    })
}

fn kind_tid(kind: TickKind) -> u32 {
    match kind {
        TickKind::Fixed => TID_FIXED,
        TickKind::Variable => TID_VARIABLE,
    }
}

fn consumer(id: ConsumerId) -> String {
    format!("{id:?}")
}
