// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated host loop that exercises the scheduler and the diagnostics
//! pipeline.
//!
//! Runs 120 frames with jittered frame times. A fixed-step accumulator
//! produces 50 Hz fixed ticks; every consumer forwards each fixed and
//! variable tick through its [`Membership`]. Events go to both a
//! [`PrettyPrintSink`](tandem_debug::pretty::PrettyPrintSink) on stdout and a
//! [`RecorderSink`](tandem_debug::recorder::RecorderSink), which is exported
//! as a Chrome trace JSON file at the end.

use std::cell::RefCell;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use tandem_core::config::SchedulerConfig;
use tandem_core::consumer::UpdateConsumer;
use tandem_core::membership::Membership;
use tandem_core::scheduler::HybridScheduler;
use tandem_core::time::DeltaTime;
use tandem_core::trace::Tracer;

use tandem_debug::FanOut;
use tandem_debug::pretty::PrettyPrintSink;
use tandem_debug::recorder::RecorderSink;

const FRAME_COUNT: usize = 120;
/// Frame times in seconds, cycled. Mixes frames faster and slower than the
/// 20ms fixed step.
const FRAME_PATTERN: [f32; 8] = [0.016, 0.017, 0.008, 0.009, 0.033, 0.016, 0.007, 0.025];
/// The HUD leaves at this frame and rejoins at [`HUD_REJOIN`].
const HUD_LEAVE: usize = 40;
const HUD_REJOIN: usize = 60;

/// A consumer that only records how much time it was handed.
#[derive(Debug)]
struct Actor {
    name: &'static str,
    updates: u32,
    simulated: DeltaTime,
}

impl UpdateConsumer for Actor {
    fn update(&mut self, dt: DeltaTime) {
        self.updates += 1;
        self.simulated += dt;
    }
}

struct CastMember {
    actor: Rc<RefCell<Actor>>,
    membership: Membership<&'static str>,
}

fn cast() -> Vec<CastMember> {
    [
        ("physics", "physics", 0),
        ("ai-0", "ai", 10),
        ("ai-1", "ai", 10),
        ("camera", "camera", 20),
        ("hud", "hud", 30),
    ]
    .into_iter()
    .map(|(name, tag, priority)| CastMember {
        actor: Rc::new(RefCell::new(Actor {
            name,
            updates: 0,
            simulated: DeltaTime::ZERO,
        })),
        membership: Membership::new(tag, priority),
    })
    .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    // -- sinks -------------------------------------------------------------
    let mut sinks = FanOut(
        RecorderSink::new(),
        PrettyPrintSink::new(Box::new(std::io::stdout())),
    );

    // -- scheduler ---------------------------------------------------------
    let mut scheduler = HybridScheduler::new(SchedulerConfig::with_rate(50));

    let mut cast = cast();
    {
        let mut tracer = Tracer::new(&mut sinks);
        for member in &mut cast {
            let consumer = Rc::downgrade(&member.actor);
            member
                .membership
                .join_traced(&mut scheduler, consumer, &mut tracer)?;
        }
    }
    let hud = cast.len() - 1;

    // -- simulated loop ----------------------------------------------------
    let mut accumulator = DeltaTime::ZERO;
    let mut wall = DeltaTime::ZERO;

    for frame in 0..FRAME_COUNT {
        let dt = DeltaTime::from_secs(FRAME_PATTERN[frame % FRAME_PATTERN.len()]);
        sinks.0.advance(dt);
        wall += dt;
        let mut tracer = Tracer::new(&mut sinks);

        // 1. Fixed steps owed by this frame.
        accumulator += dt;
        let fixed_interval = scheduler.config().fixed_interval;
        while accumulator >= fixed_interval {
            accumulator = accumulator - fixed_interval;
            for member in &cast {
                member
                    .membership
                    .fixed_tick_traced(&mut scheduler, &mut tracer)?;
            }
        }

        // 2. The frame itself.
        for member in &cast {
            member
                .membership
                .variable_tick_traced(&mut scheduler, dt, &mut tracer)?;
        }

        // 3. Membership churn between frames.
        if frame == HUD_LEAVE {
            cast[hud]
                .membership
                .leave_traced(&mut scheduler, &mut tracer)?;
        } else if frame == HUD_REJOIN {
            let consumer = Rc::downgrade(&cast[hud].actor);
            cast[hud]
                .membership
                .join_traced(&mut scheduler, consumer, &mut tracer)?;
        }
    }

    // -- report ------------------------------------------------------------
    println!();
    println!("wall time: {:.3}s over {FRAME_COUNT} frames", wall.secs());
    for member in &cast {
        let actor = member.actor.borrow();
        println!(
            "{:>8}: {:>3} updates, {:.3}s simulated",
            actor.name,
            actor.updates,
            actor.simulated.secs(),
        );
    }
    println!("{:?}", scheduler.stats());

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    tandem_debug::chrome::export(sinks.0.as_bytes(), &mut writer)?;

    println!("Wrote {path} ({FRAME_COUNT} frames)");
    Ok(())
}
