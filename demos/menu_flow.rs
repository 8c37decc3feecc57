//! A title screen, a menu and a nested level, driven through a registry.
//!
//! Run with `RUST_LOG=framefsm=debug cargo run --example menu_flow` to see
//! every transition the controller makes.

use framefsm::builder::{BuildError, PathBuilder, StateBuilder};
use framefsm::core::Condition;
use framefsm::{ControllerConfig, Registry};
use std::cell::Cell;
use std::rc::Rc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() -> Result<(), BuildError> {
    init_logging();

    // Simulated input: the "start" button is pressed on frame 5.
    let frame = Rc::new(Cell::new(0_u64));
    let pressed = Rc::clone(&frame);
    let waves_cleared = Rc::new(Cell::new(0_u32));
    let waves = Rc::clone(&waves_cleared);

    let mut registry = Registry::new();
    let handle = registry.create_controller_with(ControllerConfig::default().with_name("menu"));
    let Some(controller) = registry.get_mut(handle) else {
        return Ok(());
    };

    let mut root = controller.root_mut();
    root.add_state(StateBuilder::new("Title").on_enter(|_| tracing::info!("press start")))?
        .add_state(StateBuilder::new("MainMenu").on_enter(|cx| {
            tracing::info!(from = ?cx.entered_from(), "main menu");
            // Pick a difficulty straight away.
            cx.transfer_with("Level", 3_u32);
        }))?
        .add_state("Level")?
        .add_state(StateBuilder::new("Results").on_enter(|cx| {
            tracing::info!(from = ?cx.entered_from(), "results screen");
        }))?
        .begin_path("Title", Condition::Always)?
        .transfer_path(
            "Title",
            "MainMenu",
            Condition::when(move |_| pressed.get() >= 5),
        )?
        .transfer_path(
            "MainMenu",
            "Level",
            PathBuilder::manual()
                .data(|_| 1_u32)
                .on_transfer(|cx| tracing::info!(to = ?cx.target_name(), "loading")),
        )?
        .transfer_path("Level", "Results", Condition::Always)?;

    root.promote("Level", "Level", true)?
        .add_state(StateBuilder::new("Intro").on_enter(|cx| {
            let parent = cx.controller().root_machine().state_by_name("Level");
            let waves = parent
                .and_then(|state| state.attached())
                .and_then(|data| data.downcast_ref::<u32>())
                .copied()
                .unwrap_or(1);
            tracing::info!(waves, "level intro");
        }))?
        .add_state(StateBuilder::new("Fight").on_variable_step(move |cx| {
            waves.set(waves.get() + 1);
            if waves.get() >= 3 {
                cx.exit();
            }
        }))?
        .begin_path("Intro", Condition::Always)?
        .transfer_path("Intro", "Fight", Condition::Always)?
        .exit_path("Fight", Condition::Manual)?;

    controller.run();

    for _ in 0..30 {
        registry.tick_frame();
        frame.set(frame.get() + 1);
    }

    if let Some(controller) = registry.get(handle) {
        println!("visited: {}", controller.history().path().join(" -> "));
        println!("waves cleared: {}", waves_cleared.get());
    }
    Ok(())
}
