// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hybrid fixed/variable update scheduling.
//!
//! `tandem_core` merges two external tick sources, a stable fixed-rate tick
//! and a per-frame variable-rate tick, into one stream of update calls for a
//! set of registered consumers. Each consumer forwards every tick it sees;
//! the scheduler collapses those N reports into a single dispatch per phase
//! and hands every consumer the same elapsed time. It is `no_std`
//! compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   Host tick sources (fixed + variable)
//!       │  forwarded once per consumer
//!       ▼
//!   Membership ──► HybridScheduler::report_*_tick()
//!                        │
//!                        ▼
//!                  TickCoalescer ── first report? ──► DriftClock
//!                                                        │ dt
//!                        ┌───────────────────────────────┘
//!                        ▼
//!   CallbackRegistry::dispatch_all() ──► UpdateConsumer::update(dt)
//! ```
//!
//! **[`coalesce`]** — Counts reports per phase and tells the first one
//! apart from the rest.
//!
//! **[`drift`]** — Tracks time already handed out by variable dispatches and
//! shortens the next fixed dispatch by that amount.
//!
//! **[`registry`]** — Tags consumers under unique priorities and invokes them
//! in ascending priority order.
//!
//! **[`scheduler`]** — The [`HybridScheduler`](scheduler::HybridScheduler)
//! facade tying the three together.
//!
//! **[`membership`]** — Consumer-side helper that owns a registration and
//! forwards ticks only while registered.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! scheduler instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-consumer
//!   invocation events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod coalesce;
pub mod config;
pub mod consumer;
pub mod drift;
pub mod error;
pub mod membership;
pub mod registry;
pub mod scheduler;
pub mod time;
pub mod trace;
