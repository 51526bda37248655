// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-loop scenarios driven through the public API only.

use std::cell::RefCell;
use std::rc::Rc;

use tandem_core::coalesce::TickKind;
use tandem_core::config::SchedulerConfig;
use tandem_core::error::SchedulerError;
use tandem_core::membership::Membership;
use tandem_core::scheduler::HybridScheduler;
use tandem_core::time::DeltaTime;

type Log = Rc<RefCell<Vec<(&'static str, f32)>>>;

struct Actor {
    name: &'static str,
    log: Log,
}

impl tandem_core::consumer::UpdateConsumer for Actor {
    fn update(&mut self, dt: DeltaTime) {
        self.log.borrow_mut().push((self.name, dt.secs()));
    }
}

fn actor(log: &Log, name: &'static str) -> Rc<RefCell<Actor>> {
    Rc::new(RefCell::new(Actor {
        name,
        log: Rc::clone(log),
    }))
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-6
}

/// A set of actors, each forwarding every tick through its own membership.
struct World {
    scheduler: HybridScheduler<&'static str>,
    members: Vec<Membership<&'static str>>,
    actors: Vec<Rc<RefCell<Actor>>>,
    log: Log,
}

impl World {
    fn new(cast: &[(&'static str, &'static str, i32)]) -> Self {
        let log = Log::default();
        let mut scheduler = HybridScheduler::new(SchedulerConfig::new(DeltaTime(0.02)));
        let mut members = Vec::new();
        let mut actors = Vec::new();
        for &(name, tag, priority) in cast {
            let a = actor(&log, name);
            let mut m = Membership::new(tag, priority);
            m.join(&mut scheduler, Rc::downgrade(&a)).unwrap();
            members.push(m);
            actors.push(a);
        }
        Self {
            scheduler,
            members,
            actors,
            log,
        }
    }

    fn fixed(&mut self) -> usize {
        self.members
            .iter()
            .filter(|m| m.fixed_tick(&mut self.scheduler).unwrap())
            .count()
    }

    fn variable(&mut self, dt: f32) -> usize {
        self.members
            .iter()
            .filter(|m| m.variable_tick(&mut self.scheduler, DeltaTime(dt)).unwrap())
            .count()
    }

    fn drain(&self) -> Vec<(&'static str, f32)> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

#[test]
fn dispatch_order_follows_priority_not_registration() {
    let mut world = World::new(&[("a", "A", 3), ("b", "B", 1), ("c", "C", 2)]);
    assert_eq!(world.fixed(), 1);
    let names: Vec<_> = world.drain().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, ["b", "c", "a"]);
}

#[test]
fn same_tag_runs_in_registration_order() {
    let mut world = World::new(&[("x1", "X", 5), ("y", "Y", 0), ("x2", "X", 5)]);
    world.fixed();
    let names: Vec<_> = world.drain().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, ["y", "x1", "x2"]);
    assert_eq!(world.scheduler.tag_count(), 2);
}

#[test]
fn alternating_frames_update_every_frame_exactly_once() {
    let mut world = World::new(&[("a", "A", 0), ("b", "B", 1), ("c", "C", 2)]);

    // Frame with a fixed step: serviced by the fixed dispatch only.
    assert_eq!(world.fixed(), 1);
    assert_eq!(world.variable(0.016), 0);
    let log = world.drain();
    assert_eq!(log.len(), 3);
    assert!(log.iter().all(|&(_, dt)| approx(dt, 0.02)));

    // Frame without one: serviced by the variable dispatch.
    assert_eq!(world.variable(0.016), 1);
    let log = world.drain();
    assert_eq!(log.len(), 3);
    assert!(log.iter().all(|&(_, dt)| approx(dt, 0.016)));
}

#[test]
fn fast_frames_shorten_the_next_fixed_step() {
    let mut world = World::new(&[("a", "A", 0), ("b", "B", 1)]);
    world.variable(0.008);
    world.variable(0.007);
    world.drain();

    world.fixed();
    let log = world.drain();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|&(_, dt)| approx(dt, 0.005)), "{log:?}");
    assert_eq!(world.scheduler.stolen_time(), DeltaTime::ZERO);
}

#[test]
fn very_fast_frames_cannot_steal_more_than_one_step() {
    let mut world = World::new(&[("a", "A", 0)]);
    for _ in 0..10 {
        world.variable(0.004);
        assert!(world.scheduler.stolen_time() <= DeltaTime(0.02));
    }
    assert_eq!(world.scheduler.stolen_time(), DeltaTime(0.02));
    world.drain();
    world.fixed();
    let log = world.drain();
    assert_eq!(log.len(), 1);
    assert!(approx(log[0].1, 0.0), "{log:?}");
}

#[test]
fn duplicate_priority_is_rejected_without_side_effects() {
    let mut world = World::new(&[("a", "A", 4)]);
    let b = actor(&world.log, "b");
    let mut member = Membership::new("B", 4);
    assert_eq!(
        member.join(&mut world.scheduler, Rc::downgrade(&b)),
        Err(SchedulerError::DuplicatePriority { priority: 4 })
    );
    assert_eq!(world.scheduler.consumer_count(), 1);
    assert_eq!(world.scheduler.priority_of(&"B"), None);
    assert_eq!(world.fixed(), 1);
}

#[test]
fn register_then_unregister_restores_counts() {
    let mut world = World::new(&[("a", "A", 0), ("b", "B", 1)]);
    let before = (world.scheduler.consumer_count(), world.scheduler.tag_count());

    let c = actor(&world.log, "c");
    let mut member = Membership::new("C", 7);
    member.join(&mut world.scheduler, Rc::downgrade(&c)).unwrap();
    assert_eq!(world.scheduler.consumer_count(), 3);
    member.leave(&mut world.scheduler).unwrap();

    let after = (world.scheduler.consumer_count(), world.scheduler.tag_count());
    assert_eq!(before, after);
    assert_eq!(world.scheduler.priority_of(&"C"), None);
}

#[test]
fn leaving_mid_phase_lets_the_phase_close() {
    let mut world = World::new(&[("a", "A", 0), ("b", "B", 1), ("c", "C", 2)]);
    assert!(world.members[0].fixed_tick(&mut world.scheduler).unwrap());
    assert_eq!(world.scheduler.phase(), Some(TickKind::Fixed));

    let mut leaving = world.members.pop().unwrap();
    leaving.leave(&mut world.scheduler).unwrap();
    assert!(!world.members[1].fixed_tick(&mut world.scheduler).unwrap());
    assert_eq!(world.scheduler.phase(), None);

    // The next frame proceeds normally.
    assert_eq!(world.variable(0.016), 0);
    assert_eq!(world.variable(0.016), 1);
}

#[test]
fn leaving_before_reporting_keeps_the_phase_open() {
    let mut world = World::new(&[("a", "A", 0), ("b", "B", 1), ("c", "C", 2)]);
    assert!(world.members[0].fixed_tick(&mut world.scheduler).unwrap());
    assert!(!world.members[1].fixed_tick(&mut world.scheduler).unwrap());

    // "c" never reported, but its leave is counted as a report.
    let mut leaving = world.members.pop().unwrap();
    leaving.leave(&mut world.scheduler).unwrap();
    assert_eq!(world.scheduler.consumer_count(), 2);
    assert_eq!(world.scheduler.phase(), Some(TickKind::Fixed));

    let err = world.members[0]
        .variable_tick(&mut world.scheduler, DeltaTime(0.016))
        .unwrap_err();
    assert!(matches!(err, SchedulerError::PhaseViolation { .. }));
    assert!(world.scheduler.is_poisoned());

    world.scheduler.reset();
    assert_eq!(world.fixed(), 1);
    assert_eq!(world.variable(0.016), 0);
}

#[test]
fn emptying_and_refilling_starts_fresh() {
    let mut world = World::new(&[("a", "A", 0), ("b", "B", 1)]);
    world.variable(0.01);
    assert!(world.members[0].fixed_tick(&mut world.scheduler).unwrap());
    for m in &mut world.members {
        m.leave(&mut world.scheduler).unwrap();
    }
    assert!(world.scheduler.is_empty());

    let c = actor(&world.log, "c");
    let mut member = Membership::new("C", 0);
    member.join(&mut world.scheduler, Rc::downgrade(&c)).unwrap();
    assert_eq!(world.scheduler.phase(), None);
    assert_eq!(world.scheduler.effective_fixed_delta(), DeltaTime(0.02));
    assert!(member.variable_tick(&mut world.scheduler, DeltaTime(0.01)).unwrap());
}

#[test]
fn out_of_phase_report_poisons_until_reset() {
    let mut world = World::new(&[("a", "A", 0), ("b", "B", 1)]);
    assert!(world.members[0].fixed_tick(&mut world.scheduler).unwrap());
    let err = world.members[1]
        .variable_tick(&mut world.scheduler, DeltaTime(0.01))
        .unwrap_err();
    assert_eq!(
        err,
        SchedulerError::PhaseViolation {
            open: TickKind::Fixed,
            reported: TickKind::Variable,
        }
    );
    assert!(world.scheduler.is_poisoned());

    world.scheduler.reset();
    assert_eq!(world.fixed(), 1);
    assert_eq!(world.scheduler.stats().fixed_dispatches, 2);
}

#[test]
fn dropped_actor_is_skipped_and_counted() {
    let mut world = World::new(&[("a", "A", 0), ("b", "B", 1)]);
    world.actors.remove(0);
    // The dropped actor's membership still forwards; the phase still closes.
    assert_eq!(world.fixed(), 1);
    assert_eq!(world.drain(), [("b", 0.02)]);
    assert_eq!(world.scheduler.stats().skipped_consumers, 1);
    assert_eq!(world.scheduler.phase(), None);
}

#[test]
fn registrations_and_unregistrations_balance_in_any_order() {
    let log = Log::default();
    let mut scheduler = HybridScheduler::new(SchedulerConfig::DEFAULT);
    let actors: Vec<_> = (0..6).map(|_| actor(&log, "x")).collect();
    let mut tokens: Vec<_> = actors
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let tag = ["A", "B", "C"][i % 3];
            let priority = i32::try_from(i % 3).unwrap();
            scheduler.register(tag, priority, Rc::downgrade(a)).unwrap()
        })
        .collect();
    assert_eq!(scheduler.consumer_count(), 6);
    assert_eq!(scheduler.tag_count(), 3);

    // Release in a scrambled order.
    for i in [4, 0, 3, 1, 1, 0] {
        let token = tokens.remove(i);
        scheduler.unregister(token).unwrap();
    }
    assert!(tokens.is_empty());
    assert_eq!(scheduler.consumer_count(), 0);
    assert_eq!(scheduler.tag_count(), 0);
    assert!(scheduler.is_empty());
}
