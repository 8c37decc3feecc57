//! Boss AI with health-driven phases and a blocking enrage animation.
//!
//! The root state `Alive` keeps ticking while its child machine picks
//! attack patterns, so damage keeps landing during every phase.

use framefsm::builder::{BuildError, StateBuilder};
use framefsm::core::Condition;
use framefsm::runtime::{Controller, ControllerConfig};
use std::cell::Cell;
use std::rc::Rc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const ENRAGE_FRAMES: u32 = 4;

fn main() -> Result<(), BuildError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("framefsm=debug")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let hp = Rc::new(Cell::new(100_i32));
    let enrage_left = Rc::new(Cell::new(0_u32));

    let mut boss = Controller::with_config(
        ControllerConfig::default()
            .with_name("boss")
            .root_name("Boss")
            .manual(true),
    );

    let (damage, dead) = (Rc::clone(&hp), Rc::clone(&hp));
    let mut root = boss.root_mut();
    root.add_state(StateBuilder::new("Alive").on_fixed_step(move |_| {
        damage.set(damage.get() - 7);
    }))?
    .add_state(StateBuilder::new("Dead").on_enter(|_| tracing::info!("boss defeated")))?
    .begin_path("Alive", Condition::Always)?
    .transfer_path("Alive", "Dead", Condition::when(move |_| dead.get() <= 0))?;

    let (calm, raging) = (Rc::clone(&hp), Rc::clone(&hp));
    let start_timer = Rc::clone(&enrage_left);
    let mut phases = root.promote("Alive", "Phases", true)?;
    phases
        .add_state(StateBuilder::new("Sweep").on_variable_step(|cx| {
            tracing::debug!(frame = cx.frame(), "sweeping attack");
        }))?
        .add_state(StateBuilder::new("Enrage").on_enter(move |cx| {
            // Hold the transition until the animation has played.
            start_timer.set(ENRAGE_FRAMES);
            cx.block();
            tracing::info!("enraging");
        }))?
        .add_state(
            StateBuilder::new("Frenzy")
                .on_variable_step(|cx| tracing::debug!(frame = cx.frame(), "frenzy attack"))
                .on_frame_end(|cx| {
                    tracing::trace!(from = ?cx.entered_from(), "frenzy frame done");
                }),
        )?
        .begin_path("Sweep", Condition::Always)?
        .transfer_path("Sweep", "Enrage", Condition::when(move |_| calm.get() < 50))?
        .transfer_path("Enrage", "Frenzy", Condition::Always)?
        .exit_path("Frenzy", Condition::when(move |_| raging.get() <= 0))?;

    boss.run();
    for _ in 0..40 {
        boss.tick_frame();
        // The animation system releases the block once it finishes.
        if boss.is_blocking() {
            enrage_left.set(enrage_left.get().saturating_sub(1));
            if enrage_left.get() == 0 {
                boss.cancel_block();
            }
        }
        println!(
            "frame {:>2} hp {:>4} {:?}{}",
            boss.frame(),
            hp.get(),
            boss.active_path(),
            if boss.is_blocking() { " (blocking)" } else { "" }
        );
        if boss.active_state_name() == "Dead" {
            break;
        }
    }
    Ok(())
}
