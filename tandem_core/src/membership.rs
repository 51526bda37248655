// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Consumer-side registration helper.
//!
//! A [`Membership`] remembers the tag and priority a consumer runs under and
//! holds its [`ConsumerToken`] while registered. Ticks forwarded through an
//! unjoined membership are dropped, so a consumer can keep forwarding from
//! its host hooks without tracking whether it is currently registered.

use alloc::rc::Weak;
use core::cell::RefCell;
use core::fmt::Debug;
use core::hash::Hash;

use crate::consumer::{ConsumerToken, UpdateConsumer};
use crate::error::SchedulerError;
use crate::scheduler::HybridScheduler;
use crate::time::DeltaTime;
use crate::trace::Tracer;

/// One consumer's registration with a [`HybridScheduler`].
#[derive(Debug)]
pub struct Membership<K> {
    tag: K,
    priority: i32,
    token: Option<ConsumerToken<K>>,
}

impl<K: Clone + Eq + Hash + Debug> Membership<K> {
    /// Creates an unjoined membership.
    #[must_use]
    pub fn new(tag: K, priority: i32) -> Self {
        Self {
            tag,
            priority,
            token: None,
        }
    }

    /// Registers `consumer`. Does nothing if already joined.
    ///
    /// # Errors
    ///
    /// Propagates registration errors; the membership stays unjoined.
    pub fn join<C: UpdateConsumer + 'static>(
        &mut self,
        scheduler: &mut HybridScheduler<K>,
        consumer: Weak<RefCell<C>>,
    ) -> Result<(), SchedulerError> {
        self.join_traced(scheduler, consumer, &mut Tracer::none())
    }

    /// Like [`join`](Self::join), reporting to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`join`](Self::join).
    pub fn join_traced<C: UpdateConsumer + 'static>(
        &mut self,
        scheduler: &mut HybridScheduler<K>,
        consumer: Weak<RefCell<C>>,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), SchedulerError> {
        if self.token.is_none() {
            let token =
                scheduler.register_traced(self.tag.clone(), self.priority, consumer, tracer)?;
            self.token = Some(token);
        }
        Ok(())
    }

    /// Unregisters. Does nothing if not joined.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UnknownToken`] if `scheduler` is not the one
    /// this membership joined. The membership is unjoined either way.
    pub fn leave(&mut self, scheduler: &mut HybridScheduler<K>) -> Result<(), SchedulerError> {
        self.leave_traced(scheduler, &mut Tracer::none())
    }

    /// Like [`leave`](Self::leave), reporting to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`leave`](Self::leave).
    pub fn leave_traced(
        &mut self,
        scheduler: &mut HybridScheduler<K>,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), SchedulerError> {
        match self.token.take() {
            Some(token) => scheduler.unregister_traced(token, tracer),
            None => Ok(()),
        }
    }

    /// Forwards a fixed tick. Returns `Ok(false)` while not joined.
    ///
    /// # Errors
    ///
    /// See [`HybridScheduler::report_fixed_tick`].
    pub fn fixed_tick(&self, scheduler: &mut HybridScheduler<K>) -> Result<bool, SchedulerError> {
        self.fixed_tick_traced(scheduler, &mut Tracer::none())
    }

    /// Like [`fixed_tick`](Self::fixed_tick), reporting to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`HybridScheduler::report_fixed_tick`].
    pub fn fixed_tick_traced(
        &self,
        scheduler: &mut HybridScheduler<K>,
        tracer: &mut Tracer<'_>,
    ) -> Result<bool, SchedulerError> {
        if self.token.is_none() {
            return Ok(false);
        }
        scheduler.report_fixed_tick_traced(tracer)
    }

    /// Forwards a variable tick. Returns `Ok(false)` while not joined.
    ///
    /// # Errors
    ///
    /// See [`HybridScheduler::report_variable_tick`].
    pub fn variable_tick(
        &self,
        scheduler: &mut HybridScheduler<K>,
        dt: DeltaTime,
    ) -> Result<bool, SchedulerError> {
        self.variable_tick_traced(scheduler, dt, &mut Tracer::none())
    }

    /// Like [`variable_tick`](Self::variable_tick), reporting to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`HybridScheduler::report_variable_tick`].
    pub fn variable_tick_traced(
        &self,
        scheduler: &mut HybridScheduler<K>,
        dt: DeltaTime,
        tracer: &mut Tracer<'_>,
    ) -> Result<bool, SchedulerError> {
        if self.token.is_none() {
            return Ok(false);
        }
        scheduler.report_variable_tick_traced(dt, tracer)
    }

    /// Returns whether the consumer is currently registered.
    #[must_use]
    pub fn is_joined(&self) -> bool {
        self.token.is_some()
    }

    /// Returns the tag.
    #[must_use]
    pub fn tag(&self) -> &K {
        &self.tag
    }

    /// Returns the requested priority.
    ///
    /// If the tag was already registered, the scheduler dispatches at that
    /// tag's existing priority instead.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }
}
