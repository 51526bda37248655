// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The hybrid update scheduler.
//!
//! The [`HybridScheduler`] turns per-consumer fixed and variable tick reports
//! into at most one dispatch per phase, handing every consumer the same
//! elapsed time. See the [`HybridScheduler`] struct docs for the dispatch
//! rules.

use alloc::rc::Weak;
use core::cell::RefCell;
use core::fmt::Debug;
use core::hash::Hash;

use crate::coalesce::{TickCoalescer, TickKind};
use crate::config::SchedulerConfig;
use crate::consumer::{ConsumerToken, UpdateConsumer};
use crate::drift::DriftClock;
use crate::error::SchedulerError;
use crate::registry::{CallbackRegistry, DispatchOutcome};
use crate::time::DeltaTime;
use crate::trace::{
    DispatchEvent, DriftEvent, PhaseViolationEvent, RegistrationEvent, TickReportEvent, Tracer,
    UnregistrationEvent,
};

/// Running counters kept by a [`HybridScheduler`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Dispatches triggered by fixed ticks.
    pub fixed_dispatches: u64,
    /// Dispatches triggered by variable ticks.
    pub variable_dispatches: u64,
    /// Reports absorbed into an already open phase.
    pub absorbed_reports: u64,
    /// Consumers skipped during dispatch (dropped or busy).
    pub skipped_consumers: u64,
}

/// Coalesces tick reports from many consumers into single dispatches.
///
/// # Dispatch rules
///
/// Every consumer forwards each fixed and variable tick it observes. The
/// first report of a phase decides what happens; the rest are absorbed.
///
/// - **Fixed**: every consumer is called with the fixed interval minus the
///   time already handed out by variable dispatches since the last fixed
///   one.
/// - **Variable**: consumers are called with the frame delta only if no
///   fixed phase ran since the previous variable phase. That guarantees at
///   least one update per rendered frame without double-servicing frames
///   that already had a fixed step.
///
/// Dispatch order is ascending tag priority, then registration order.
///
/// # Failure
///
/// A report of one kind while a phase of the other kind is still open
/// poisons the scheduler: that report and every later one fail with
/// [`SchedulerError::PhaseViolation`] until [`reset`](Self::reset) is called
/// or the registry empties and refills.
///
/// # Usage
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use tandem_core::config::SchedulerConfig;
/// use tandem_core::scheduler::HybridScheduler;
/// use tandem_core::time::DeltaTime;
///
/// let mut scheduler = HybridScheduler::new(SchedulerConfig::DEFAULT);
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// let consumer = Rc::new(RefCell::new(move |dt: DeltaTime| sink.borrow_mut().push(dt)));
///
/// let token = scheduler.register("player", 0, Rc::downgrade(&consumer)).unwrap();
/// scheduler.report_fixed_tick().unwrap();
/// assert_eq!(seen.borrow().len(), 1);
/// scheduler.unregister(token).unwrap();
/// ```
#[derive(Debug)]
pub struct HybridScheduler<K> {
    config: SchedulerConfig,
    registry: CallbackRegistry<K>,
    coalescer: TickCoalescer,
    clock: DriftClock,
    poisoned: Option<SchedulerError>,
    cycle: u64,
    stats: DispatchStats,
}

impl<K: Clone + Eq + Hash + Debug> Default for HybridScheduler<K> {
    fn default() -> Self {
        Self::new(SchedulerConfig::DEFAULT)
    }
}

impl<K: Clone + Eq + Hash + Debug> HybridScheduler<K> {
    /// Creates a scheduler with no consumers.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            registry: CallbackRegistry::new(),
            coalescer: TickCoalescer::new(),
            clock: DriftClock::new(),
            poisoned: None,
            cycle: 0,
            stats: DispatchStats::default(),
        }
    }

    // -- Membership --

    /// Registers `consumer` under `tag`. See [`register_traced`](Self::register_traced).
    ///
    /// # Errors
    ///
    /// See [`CallbackRegistry::register`].
    pub fn register<C: UpdateConsumer + 'static>(
        &mut self,
        tag: K,
        priority: i32,
        consumer: Weak<RefCell<C>>,
    ) -> Result<ConsumerToken<K>, SchedulerError> {
        self.register_traced(tag, priority, consumer, &mut Tracer::none())
    }

    /// Registers `consumer` under `tag`, emitting a [`RegistrationEvent`].
    ///
    /// If the scheduler had no consumers, the coalescer and drift clock are
    /// reset first so a new wave of consumers starts from a clean phase.
    ///
    /// # Errors
    ///
    /// See [`CallbackRegistry::register`]. Nothing changes on error.
    pub fn register_traced<C: UpdateConsumer + 'static>(
        &mut self,
        tag: K,
        priority: i32,
        consumer: Weak<RefCell<C>>,
        tracer: &mut Tracer<'_>,
    ) -> Result<ConsumerToken<K>, SchedulerError> {
        let resync = self.registry.is_empty();
        let token = self.registry.register(tag, priority, consumer)?;
        if resync {
            self.resync();
        }
        self.coalescer.add();

        tracer.registration(&RegistrationEvent {
            consumer: token.id(),
            priority: self.registry.priority_of(token.tag()).unwrap_or(priority),
            total: self.coalescer.total(),
            resync,
        });
        Ok(token)
    }

    /// Releases a registration. See [`unregister_traced`](Self::unregister_traced).
    ///
    /// # Errors
    ///
    /// See [`CallbackRegistry::unregister`].
    pub fn unregister(&mut self, token: ConsumerToken<K>) -> Result<(), SchedulerError> {
        self.unregister_traced(token, &mut Tracer::none())
    }

    /// Releases a registration, emitting an [`UnregistrationEvent`].
    ///
    /// Leaving while a phase is open counts the leaving consumer as having
    /// already reported. If it had not, the phase stays open one report
    /// short, and the next report of the other kind poisons the scheduler.
    /// Unregister between frames, or [`reset`](Self::reset) after a
    /// mid-phase leave, to avoid that.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UnknownToken`] if `token` was not issued by
    /// this scheduler or was already released.
    pub fn unregister_traced(
        &mut self,
        token: ConsumerToken<K>,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), SchedulerError> {
        let consumer = token.id();
        let priority = self.registry.unregister(token)?;
        self.coalescer.subtract();

        tracer.unregistration(&UnregistrationEvent {
            consumer,
            priority,
            total: self.coalescer.total(),
        });
        Ok(())
    }

    // -- Tick reports --

    /// Reports one fixed tick. See [`report_fixed_tick_traced`](Self::report_fixed_tick_traced).
    ///
    /// # Errors
    ///
    /// See [`report_fixed_tick_traced`](Self::report_fixed_tick_traced).
    pub fn report_fixed_tick(&mut self) -> Result<bool, SchedulerError> {
        self.report_fixed_tick_traced(&mut Tracer::none())
    }

    /// Reports one fixed tick from one consumer.
    ///
    /// Returns whether the report triggered a dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PhaseViolation`] if a variable phase is
    /// still open or the scheduler is poisoned.
    pub fn report_fixed_tick_traced(
        &mut self,
        tracer: &mut Tracer<'_>,
    ) -> Result<bool, SchedulerError> {
        if !self.open_report(TickKind::Fixed, tracer)? {
            return Ok(false);
        }

        let dt = self.clock.effective_fixed_delta(self.config.fixed_interval);
        self.dispatch(TickKind::Fixed, dt, tracer);
        self.clock.on_fixed_dispatch();
        self.trace_drift(tracer);
        Ok(true)
    }

    /// Reports one variable tick.
    /// See [`report_variable_tick_traced`](Self::report_variable_tick_traced).
    ///
    /// # Errors
    ///
    /// See [`report_variable_tick_traced`](Self::report_variable_tick_traced).
    pub fn report_variable_tick(&mut self, dt: DeltaTime) -> Result<bool, SchedulerError> {
        self.report_variable_tick_traced(dt, &mut Tracer::none())
    }

    /// Reports one variable tick of length `dt` from one consumer.
    ///
    /// Negative or NaN deltas are treated as zero. Returns whether the
    /// report triggered a dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PhaseViolation`] if a fixed phase is still
    /// open or the scheduler is poisoned.
    pub fn report_variable_tick_traced(
        &mut self,
        dt: DeltaTime,
        tracer: &mut Tracer<'_>,
    ) -> Result<bool, SchedulerError> {
        if !self.open_report(TickKind::Variable, tracer)? {
            return Ok(false);
        }

        let dt = dt.non_negative();
        let dispatch = self.clock.skipped_fixed_last_phase();
        if dispatch {
            self.dispatch(TickKind::Variable, dt, tracer);
        }
        self.clock.on_variable_dispatch(dt, self.config.fixed_interval);
        self.trace_drift(tracer);
        Ok(dispatch)
    }

    // -- Host control --

    /// Clears phase, drift, and poison state. Registrations are kept.
    pub fn reset(&mut self) {
        self.coalescer.close_phase();
        self.clock.reset();
        self.poisoned = None;
    }

    /// Replaces the fixed interval used for subsequent dispatches.
    pub fn set_fixed_interval(&mut self, fixed_interval: DeltaTime) {
        self.config.fixed_interval = fixed_interval;
    }

    // -- Introspection --

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the consumer registry.
    #[must_use]
    pub fn registry(&self) -> &CallbackRegistry<K> {
        &self.registry
    }

    /// Returns the number of registered consumers.
    #[must_use]
    pub fn consumer_count(&self) -> u32 {
        self.coalescer.total()
    }

    /// Returns whether no consumer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Returns the number of distinct tags.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.registry.tag_count()
    }

    /// Returns the priority `tag` is dispatched at, if registered.
    #[must_use]
    pub fn priority_of(&self, tag: &K) -> Option<i32> {
        self.registry.priority_of(tag)
    }

    /// Iterates registered tags in dispatch order.
    pub fn tags(&self) -> impl Iterator<Item = (&K, i32)> + '_ {
        self.registry.tags()
    }

    /// Returns the phase currently collecting reports, if any.
    #[must_use]
    pub fn phase(&self) -> Option<TickKind> {
        self.coalescer.phase()
    }

    /// Returns the time stolen from the next fixed dispatch.
    #[must_use]
    pub fn stolen_time(&self) -> DeltaTime {
        self.clock.stolen()
    }

    /// Returns the elapsed time the next fixed dispatch would receive.
    #[must_use]
    pub fn effective_fixed_delta(&self) -> DeltaTime {
        self.clock.effective_fixed_delta(self.config.fixed_interval)
    }

    /// Returns whether the most recent phase was variable.
    #[must_use]
    pub fn skipped_fixed_last_phase(&self) -> bool {
        self.clock.skipped_fixed_last_phase()
    }

    /// Returns whether a phase violation has poisoned the scheduler.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Returns the number of phases opened so far.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Returns the running dispatch counters.
    #[must_use]
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    // -- Internals --

    /// Counts a report and returns whether it opened a phase.
    fn open_report(
        &mut self,
        kind: TickKind,
        tracer: &mut Tracer<'_>,
    ) -> Result<bool, SchedulerError> {
        if let Some(err) = self.poisoned {
            return Err(err);
        }

        let first = match self.coalescer.report(kind) {
            Ok(first) => first,
            Err(err) => {
                if let SchedulerError::PhaseViolation { open, reported } = err {
                    tracer.phase_violation(&PhaseViolationEvent {
                        cycle: self.cycle,
                        open,
                        reported,
                    });
                }
                self.poisoned = Some(err);
                return Err(err);
            }
        };

        if first {
            self.cycle += 1;
        } else {
            self.stats.absorbed_reports += 1;
        }
        tracer.tick_report(&TickReportEvent {
            cycle: self.cycle,
            kind,
            first,
            processed: self.coalescer.processed(),
            total: self.coalescer.total(),
        });
        Ok(first)
    }

    fn dispatch(&mut self, kind: TickKind, dt: DeltaTime, tracer: &mut Tracer<'_>) {
        let DispatchOutcome { invoked, skipped } =
            self.registry.dispatch_all(dt, self.cycle, tracer);

        match kind {
            TickKind::Fixed => self.stats.fixed_dispatches += 1,
            TickKind::Variable => self.stats.variable_dispatches += 1,
        }
        self.stats.skipped_consumers += u64::from(skipped);

        tracer.dispatch(&DispatchEvent {
            cycle: self.cycle,
            kind,
            dt,
            invoked,
            skipped,
        });
    }

    fn trace_drift(&self, tracer: &mut Tracer<'_>) {
        tracer.drift(&DriftEvent {
            cycle: self.cycle,
            stolen: self.clock.stolen(),
            effective_fixed_delta: self.effective_fixed_delta(),
            last_phase_was_fixed: !self.clock.skipped_fixed_last_phase(),
        });
    }

    fn resync(&mut self) {
        self.reset();
        self.coalescer.reset();
    }
}
