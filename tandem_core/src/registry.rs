// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Priority-ordered consumer storage.
//!
//! Consumers are grouped by a caller-supplied tag. Each tag owns exactly one
//! priority, and priorities are unique across tags, so groups form a total
//! order. Dispatch visits groups by ascending priority and, inside a group,
//! consumers in registration order:
//!
//! ```text
//!   priority 1  "input"    ──► [a, d]
//!   priority 2  "physics"  ──► [b]
//!   priority 3  "camera"   ──► [c, e, f]
//!
//!   dispatch order: a d b c e f
//! ```
//!
//! Consumer references live in a slot array addressed by generational
//! [`ConsumerId`]s; released slots are recycled through a free list.

use alloc::collections::BTreeMap;
use alloc::rc::Weak;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt::Debug;
use core::hash::Hash;
use core::sync::atomic::{AtomicU32, Ordering};

use hashbrown::HashMap;

use crate::consumer::{ConsumerId, ConsumerRef, ConsumerToken, RegistryId, UpdateConsumer};
use crate::error::SchedulerError;
use crate::time::DeltaTime;
use crate::trace::{ConsumerSkippedEvent, SkipReason, Tracer};

static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(0);

#[derive(Debug)]
struct Group<K> {
    tag: K,
    members: Vec<ConsumerId>,
}

/// Result of one [`CallbackRegistry::dispatch_all`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Consumers whose callback ran.
    pub invoked: u32,
    /// Consumers that could not be called (dropped or already borrowed).
    pub skipped: u32,
}

/// Tag-grouped, priority-ordered set of consumer callbacks.
#[derive(Debug)]
pub struct CallbackRegistry<K> {
    id: RegistryId,

    // -- Slots --
    slots: Vec<Option<ConsumerRef>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    len: u32,

    // -- Ordering --
    groups: BTreeMap<i32, Group<K>>,
    priorities: HashMap<K, i32>,

    // -- Dispatch order cache --
    order: Vec<ConsumerId>,
    order_dirty: bool,
}

impl<K: Clone + Eq + Hash + Debug> Default for CallbackRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash + Debug> CallbackRegistry<K> {
    /// Creates an empty registry with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: RegistryId(NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed)),
            slots: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            groups: BTreeMap::new(),
            priorities: HashMap::new(),
            order: Vec::new(),
            order_dirty: false,
        }
    }

    /// Returns this registry's identity.
    #[must_use]
    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// Adds a consumer under `tag`.
    ///
    /// Only a [`Weak`] reference is kept; the caller keeps the consumer
    /// alive.
    ///
    /// The first registration of a tag claims `priority` for it. Later
    /// registrations of the same tag join the existing group and their
    /// `priority` argument is ignored.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::EmptyRegistration`] if `consumer` is already dead.
    /// - [`SchedulerError::DuplicatePriority`] if `tag` is new and another
    ///   tag owns `priority`.
    ///
    /// On error the registry is unchanged.
    pub fn register<C: UpdateConsumer + 'static>(
        &mut self,
        tag: K,
        priority: i32,
        consumer: Weak<RefCell<C>>,
    ) -> Result<ConsumerToken<K>, SchedulerError> {
        if consumer.strong_count() == 0 {
            return Err(SchedulerError::EmptyRegistration);
        }
        let priority = match self.priorities.get(&tag) {
            Some(&existing) => existing,
            None => {
                if self.groups.contains_key(&priority) {
                    return Err(SchedulerError::DuplicatePriority { priority });
                }
                self.priorities.insert(tag.clone(), priority);
                priority
            }
        };

        let id = self.alloc(consumer);
        self.groups
            .entry(priority)
            .or_insert_with(|| Group {
                tag: tag.clone(),
                members: Vec::new(),
            })
            .members
            .push(id);
        self.order_dirty = true;

        Ok(ConsumerToken {
            tag,
            id,
            owner: self.id,
        })
    }

    /// Removes the consumer behind `token`, dropping its tag when the tag's
    /// group empties. Returns the priority the consumer was dispatched at.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UnknownToken`] if the token was issued by
    /// another registry or its slot is no longer live. The registry is
    /// unchanged in that case.
    pub fn unregister(&mut self, token: ConsumerToken<K>) -> Result<i32, SchedulerError> {
        if token.owner != self.id || !self.is_live(token.id) {
            return Err(SchedulerError::UnknownToken);
        }
        let Some(&priority) = self.priorities.get(&token.tag) else {
            return Err(SchedulerError::UnknownToken);
        };
        let Some(group) = self.groups.get_mut(&priority) else {
            return Err(SchedulerError::UnknownToken);
        };
        let Some(pos) = group.members.iter().position(|m| *m == token.id) else {
            return Err(SchedulerError::UnknownToken);
        };

        group.members.remove(pos);
        if group.members.is_empty() {
            self.groups.remove(&priority);
            self.priorities.remove(&token.tag);
        }
        self.release(token.id);
        self.order_dirty = true;
        Ok(priority)
    }

    /// Invokes every live consumer with `dt`, by ascending priority and then
    /// registration order.
    ///
    /// Consumers whose `Rc` has been dropped, or whose `RefCell` is already
    /// borrowed by the caller, are skipped and reported to `tracer`.
    pub fn dispatch_all(
        &mut self,
        dt: DeltaTime,
        cycle: u64,
        tracer: &mut Tracer<'_>,
    ) -> DispatchOutcome {
        self.refresh_order();

        let mut outcome = DispatchOutcome::default();
        for &id in &self.order {
            let Some(weak) = &self.slots[id.idx as usize] else {
                continue;
            };
            let Some(rc) = weak.upgrade() else {
                skip(&mut outcome, tracer, cycle, id, SkipReason::Dropped);
                continue;
            };
            let Ok(mut consumer) = rc.try_borrow_mut() else {
                skip(&mut outcome, tracer, cycle, id, SkipReason::Busy);
                continue;
            };
            consumer.update(dt);
            outcome.invoked += 1;
            #[cfg(feature = "trace-rich")]
            tracer.consumer_invoked(&crate::trace::ConsumerInvokedEvent {
                cycle,
                consumer: id,
            });
        }
        outcome
    }

    /// Returns the number of registered consumers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns whether no consumer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of distinct tags.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.groups.len()
    }

    /// Returns the priority owned by `tag`, if it has live registrations.
    #[must_use]
    pub fn priority_of(&self, tag: &K) -> Option<i32> {
        self.priorities.get(tag).copied()
    }

    /// Iterates `(tag, priority)` pairs in dispatch order.
    pub fn tags(&self) -> impl Iterator<Item = (&K, i32)> + '_ {
        self.groups.iter().map(|(&priority, group)| (&group.tag, priority))
    }

    /// Returns whether `id` refers to a live registration.
    #[must_use]
    pub fn is_live(&self, id: ConsumerId) -> bool {
        (id.idx as usize) < self.slots.len()
            && self.generation[id.idx as usize] == id.generation
            && self.slots[id.idx as usize].is_some()
    }

    // -- Slot allocation --

    fn alloc(&mut self, consumer: ConsumerRef) -> ConsumerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize] = Some(consumer);
            idx
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "consumer slots are bounded well below u32::MAX"
            )]
            let idx = self.slots.len() as u32;
            self.slots.push(Some(consumer));
            self.generation.push(0);
            idx
        };
        self.len += 1;
        ConsumerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn release(&mut self, id: ConsumerId) {
        self.slots[id.idx as usize] = None;
        // Bump generation so the released handle fails validation.
        self.generation[id.idx as usize] = self.generation[id.idx as usize].wrapping_add(1);
        self.free_list.push(id.idx);
        self.len -= 1;
    }

    fn refresh_order(&mut self) {
        if !self.order_dirty {
            return;
        }
        self.order.clear();
        for group in self.groups.values() {
            self.order.extend_from_slice(&group.members);
        }
        self.order_dirty = false;
    }
}

fn skip(
    outcome: &mut DispatchOutcome,
    tracer: &mut Tracer<'_>,
    cycle: u64,
    consumer: ConsumerId,
    reason: SkipReason,
) {
    outcome.skipped += 1;
    tracer.consumer_skipped(&ConsumerSkippedEvent {
        cycle,
        consumer,
        reason,
    });
}
