//! Property-based tests for the controller runtime.
//!
//! These tests use proptest to drive controllers through random
//! sequences of ticks, transfers and lifecycle calls, checking the
//! structural invariants after every step.

use framefsm::core::{Condition, Hook, MachineId, Phase};
use framefsm::runtime::{Controller, ControllerConfig};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Debug)]
enum Op {
    Tick(Phase),
    Frame,
    Transfer(usize),
    Exit,
    Block,
    CancelBlock,
    Pause,
    Run,
    Stop,
    Toggle,
}

const TARGETS: [&str; 7] = ["Idle", "Game", "Menu", "Load", "Play", "__EXIT", "Missing"];

fn arbitrary_phase() -> impl Strategy<Value = Phase> {
    (0..Phase::ALL.len()).prop_map(|i| Phase::ALL[i])
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arbitrary_phase().prop_map(Op::Tick),
        6 => Just(Op::Frame),
        3 => (0..TARGETS.len()).prop_map(Op::Transfer),
        1 => Just(Op::Exit),
        1 => Just(Op::Block),
        2 => Just(Op::CancelBlock),
        1 => Just(Op::Pause),
        2 => Just(Op::Run),
        1 => Just(Op::Stop),
        2 => Just(Op::Toggle),
    ]
}

struct Harness {
    controller: Controller,
    flag: Rc<Cell<bool>>,
    dispatched: Rc<Cell<u32>>,
    frame_ends: u64,
}

impl Harness {
    fn new(scan_fixed_step: bool) -> Self {
        let flag = Rc::new(Cell::new(false));
        let dispatched = Rc::new(Cell::new(0));
        let mut controller = Controller::with_config(
            ControllerConfig::default()
                .scan_fixed_step(scan_fixed_step)
                .history_capacity(8),
        );

        let (outer, inner) = (Rc::clone(&flag), Rc::clone(&flag));
        let mut root = controller.root_mut();
        root.add_state("Idle")
            .unwrap()
            .add_state("Game")
            .unwrap()
            .add_state("Menu")
            .unwrap()
            .begin_path("Idle", Condition::Always)
            .unwrap()
            .transfer_path("Idle", "Game", Condition::when(move |_| outer.get()))
            .unwrap()
            .transfer_path("Idle", "Menu", Condition::Manual)
            .unwrap()
            .transfer_path("Game", "Menu", Condition::Always)
            .unwrap()
            .transfer_path("Menu", "Idle", Condition::Never)
            .unwrap();
        for state in ["Idle", "Game", "Menu"] {
            count_phases(&mut root, state, &dispatched);
        }

        let mut game = root.promote("Game", "Game", true).unwrap();
        game.add_state("Load")
            .unwrap()
            .add_state("Play")
            .unwrap()
            .begin_path("Load", Condition::Always)
            .unwrap()
            .transfer_path("Load", "Play", Condition::when(move |_| !inner.get()))
            .unwrap()
            .exit_path("Play", Condition::Manual)
            .unwrap();
        for state in ["Load", "Play"] {
            count_phases(&mut game, state, &dispatched);
        }

        Self {
            controller,
            flag,
            dispatched,
            frame_ends: 0,
        }
    }

    fn apply(&mut self, op: &Op) -> Result<(), TestCaseError> {
        match op {
            Op::Tick(phase) => self.tick(*phase)?,
            Op::Frame => {
                for phase in Phase::ALL {
                    self.tick(phase)?;
                }
            }
            Op::Transfer(i) => {
                self.controller.transfer(TARGETS[*i]);
            }
            Op::Exit => {
                self.controller.exit();
            }
            Op::Block => self.controller.block(),
            Op::CancelBlock => self.controller.cancel_block(),
            Op::Pause => self.controller.pause(),
            Op::Run => self.controller.run(),
            Op::Stop => self.controller.stop(),
            Op::Toggle => self.flag.set(!self.flag.get()),
        }
        self.check()
    }

    fn tick(&mut self, phase: Phase) -> Result<(), TestCaseError> {
        let transitioning = self.controller.is_transitioning();
        let pending = self.controller.has_pending();
        let before = self.dispatched.get();

        self.controller.tick(phase);
        if phase == Phase::FrameEnd {
            self.frame_ends += 1;
        }

        // Only the fixed step can finish a transition before dispatching.
        if transitioning && phase != Phase::FixedStep {
            prop_assert_eq!(self.dispatched.get(), before);
            prop_assert_eq!(self.controller.has_pending(), pending);
        }
        Ok(())
    }

    fn check(&self) -> Result<(), TestCaseError> {
        let controller = &self.controller;

        // Exactly one active state per machine.
        for machine in controller.machines() {
            let active = machine.active_state_name();
            prop_assert_eq!(machine.states().filter(|s| s.name() == active).count(), 1);
        }

        // The active machine is the deepest entered, still-running child.
        if !controller.is_transitioning() {
            prop_assert_eq!(deepest_entered(controller), controller.active_machine_id());
        }

        prop_assert!(controller.history().len() <= controller.history().capacity());
        prop_assert_eq!(controller.frame(), self.frame_ends);
        Ok(())
    }
}

fn count_phases(
    builder: &mut framefsm::MachineBuilder<'_>,
    state: &str,
    counter: &Rc<Cell<u32>>,
) {
    for phase in Phase::ALL {
        let counter = Rc::clone(counter);
        builder
            .on(state, Hook::Phase(phase), move |_| counter.set(counter.get() + 1))
            .unwrap();
    }
}

fn deepest_entered(controller: &Controller) -> MachineId {
    let mut machine = controller.root_machine();
    while let Some(child) = machine
        .active_state()
        .child()
        .and_then(|id| controller.machine(id))
    {
        if child.is_exited() {
            break;
        }
        machine = child;
    }
    machine.id()
}

proptest! {
    #[test]
    fn invariants_hold_under_random_driving(
        scan_fixed_step in any::<bool>(),
        ops in prop::collection::vec(arbitrary_op(), 1..200),
    ) {
        let mut harness = Harness::new(scan_fixed_step);
        harness.controller.run();
        for op in &ops {
            harness.apply(op)?;
        }
    }

    #[test]
    fn manual_edge_never_fires_by_itself(frames in 0usize..60) {
        let mut controller = Controller::new();
        controller
            .root_mut()
            .add_state("A")
            .unwrap()
            .add_state("B")
            .unwrap()
            .begin_path("A", Condition::Always)
            .unwrap()
            .transfer_path("A", "B", Condition::Manual)
            .unwrap();
        controller.run();
        for _ in 0..frames + 2 {
            controller.tick_frame();
            prop_assert_ne!(controller.active_state_name(), "B");
        }

        prop_assert!(controller.transfer("B"));
        controller.tick_frame();
        controller.tick_frame();
        prop_assert_eq!(controller.active_state_name(), "B");
        let fired = controller.history().records().filter(|r| r.to == "B").count();
        prop_assert_eq!(fired, 1);
    }

    #[test]
    fn blocked_transition_never_advances(held in 1usize..40, phase_first in arbitrary_phase()) {
        let mut controller = Controller::new();
        controller
            .root_mut()
            .add_state("A")
            .unwrap()
            .add_state("B")
            .unwrap()
            .begin_path("A", Condition::Always)
            .unwrap()
            .transfer_path("A", "B", Condition::Manual)
            .unwrap();
        controller.run();
        controller.tick_frame();
        controller.tick_frame();

        controller.block();
        controller.transfer("B");
        controller.tick_frame();
        controller.tick_frame();
        let step = controller.transition_step();
        prop_assert!(step.is_some());

        controller.tick(phase_first);
        for _ in 0..held {
            controller.tick_frame();
            prop_assert_eq!(controller.transition_step(), step);
            prop_assert_eq!(controller.active_state_name(), "A");
        }

        controller.cancel_block();
        controller.tick_fixed_step();
        prop_assert!(!controller.is_transitioning());
        prop_assert_eq!(controller.active_state_name(), "B");
    }
}
