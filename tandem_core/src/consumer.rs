// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Consumer-facing callback trait and registration handles.

use alloc::rc::Weak;
use core::cell::RefCell;
use core::fmt;

use crate::time::DeltaTime;

/// Receives one aggregated update per scheduler dispatch.
///
/// Implemented for every `FnMut(DeltaTime)`, so closures can be registered
/// directly.
pub trait UpdateConsumer {
    /// Called once per dispatch with the elapsed time shared by every
    /// consumer in that dispatch.
    fn update(&mut self, dt: DeltaTime);
}

impl<F: FnMut(DeltaTime)> UpdateConsumer for F {
    fn update(&mut self, dt: DeltaTime) {
        self(dt);
    }
}

/// A non-owning reference to a registered consumer, as stored by the
/// registry.
///
/// Registration takes the concrete `Weak<RefCell<C>>` and unsizes it into
/// this form. The scheduler never keeps a consumer alive; the consumer's
/// owner holds the `Rc` and must unregister before dropping it.
pub type ConsumerRef = Weak<RefCell<dyn UpdateConsumer>>;

/// A slot handle into a [`CallbackRegistry`](crate::registry::CallbackRegistry).
///
/// Carries a generation counter so that handles to released slots are
/// rejected after the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl ConsumerId {
    /// Rebuilds a handle from its raw parts, e.g. when decoding a recorded
    /// trace. A handle built this way is only live if a registry issued the
    /// same index and generation.
    #[inline]
    #[must_use]
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self {
            idx: index,
            generation,
        }
    }

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsumerId({}@gen{})", self.idx, self.generation)
    }
}

/// Identifies the registry that issued a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistryId(pub(crate) u32);

/// Proof of registration, returned by `register` and consumed by
/// `unregister`.
///
/// Tokens are move-only: each registration is released exactly once. A
/// token is only meaningful to the scheduler that issued it.
#[derive(Debug, PartialEq, Eq)]
pub struct ConsumerToken<K> {
    pub(crate) tag: K,
    pub(crate) id: ConsumerId,
    pub(crate) owner: RegistryId,
}

impl<K> ConsumerToken<K> {
    /// Returns the tag the consumer was registered under.
    #[must_use]
    pub fn tag(&self) -> &K {
        &self.tag
    }

    /// Returns the consumer's slot handle.
    #[must_use]
    pub fn id(&self) -> ConsumerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use super::*;

    #[test]
    fn closures_are_consumers() {
        let mut total = 0.0;
        let mut f = |dt: DeltaTime| total += dt.secs();
        f.update(DeltaTime(0.25));
        f.update(DeltaTime(0.25));
        assert!((total - 0.5).abs() < 1e-6);
    }

    #[test]
    fn consumer_ref_coerces_from_concrete_rc() {
        struct Counter(u32);
        impl UpdateConsumer for Counter {
            fn update(&mut self, _dt: DeltaTime) {
                self.0 += 1;
            }
        }

        let rc = Rc::new(RefCell::new(Counter(0)));
        let weak = Rc::downgrade(&rc);
        let weak: ConsumerRef = weak;
        let strong = weak.upgrade().unwrap();
        strong.borrow_mut().update(DeltaTime::ZERO);
        drop(strong);
        assert_eq!(rc.borrow().0, 1);
        drop(rc);
        assert!(weak.upgrade().is_none());
    }
}
