//! The multi-frame transition protocol.
//!
//! A transition is decided in one frame and executed at the start of the
//! next, in fixed steps separated by checkpoints. While the controller is
//! blocking, execution halts at the next checkpoint and resumes from the
//! same step once blocking is cancelled.

use super::controller::Controller;
use crate::core::{DataDelivery, Edge, Hook, Machine, PathRef, StateRef, TransitionRecord};
use chrono::Utc;
use tracing::{debug, trace};

/// Where an in-flight transition currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionStep {
    /// Decided; waiting for the frame boundary.
    AwaitFrameEnd,
    /// Next: run the source's exit handlers.
    Exit,
    /// Next: run the path's transfer callbacks.
    Transfer,
    /// Next: make the target active and run its enter handlers.
    Commit,
    /// Next: descend into or ascend out of child machines.
    Reconcile,
}

impl TransitionStep {
    /// Whether a blocking checkpoint sits in front of this step.
    pub fn follows_checkpoint(self) -> bool {
        matches!(
            self,
            TransitionStep::Transfer | TransitionStep::Commit | TransitionStep::Reconcile
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Transition {
    pub(crate) path: PathRef,
    pub(crate) target: StateRef,
    pub(crate) step: TransitionStep,
}

impl Controller {
    /// Step the in-flight transition is waiting on, if any.
    pub fn transition_step(&self) -> Option<TransitionStep> {
        self.transition.map(|t| t.step)
    }

    /// Start executing a pending path, unless its source is no longer active.
    pub(crate) fn begin_transition(&mut self, path: PathRef) {
        let machine = &self.machines[path.source.machine.0];
        if machine.active() != path.source.state {
            let (from, to) = self.path_names(path);
            trace!(
                controller = %self.config.name,
                from,
                to,
                "dropped pending transfer from inactive state"
            );
            return;
        }
        let Some(target) = machine.path(path.source.state, path.slot).map(|p| p.target()) else {
            return;
        };

        self.transition = Some(Transition {
            path,
            target: StateRef {
                machine: path.source.machine,
                state: target,
            },
            step: TransitionStep::AwaitFrameEnd,
        });
        let (from, to) = self.path_names(path);
        debug!(controller = %self.config.name, from, to, "transition started");
    }

    pub(crate) fn cross_frame_boundary(&mut self) {
        if let Some(transition) = self.transition.as_mut() {
            if transition.step == TransitionStep::AwaitFrameEnd {
                transition.step = TransitionStep::Exit;
                trace!(controller = %self.config.name, frame = self.frame, "frame boundary crossed");
            }
        }
    }

    /// Run the in-flight transition until it finishes or a checkpoint holds it.
    pub(crate) fn advance_transition(&mut self) {
        loop {
            let Some(transition) = self.transition else {
                return;
            };
            if transition.step.follows_checkpoint() && self.is_blocking() {
                trace!(
                    controller = %self.config.name,
                    step = ?transition.step,
                    "transition held at checkpoint"
                );
                return;
            }

            let next = match transition.step {
                TransitionStep::AwaitFrameEnd => return,
                TransitionStep::Exit => {
                    self.invoke(transition.path.source, Hook::Exit);
                    TransitionStep::Transfer
                }
                TransitionStep::Transfer => {
                    self.invoke_transfer(transition.path, transition.target);
                    TransitionStep::Commit
                }
                TransitionStep::Commit => {
                    self.commit(transition.path, transition.target);
                    self.invoke(transition.target, Hook::Enter);
                    TransitionStep::Reconcile
                }
                TransitionStep::Reconcile => {
                    self.reconcile(transition.target);
                    self.transition = None;
                    return;
                }
            };

            // Stop from inside a handler discards the transition.
            match self.transition.as_mut() {
                Some(current) => current.step = next,
                None => return,
            }
        }
    }

    fn commit(&mut self, path: PathRef, target: StateRef) {
        let (from, to) = self.path_names(path);
        let (from, to) = (from.to_string(), to.to_string());
        let edge = Edge {
            source: &from,
            target: &to,
        };
        let (explicit_data, data) = match self.path_mut(path) {
            Some(transfer) => (
                transfer.delivery() == DataDelivery::Explicit,
                transfer.resolve_data(&edge),
            ),
            None => (false, None),
        };

        let machine = &mut self.machines[target.machine.0];
        machine.active = target.state;
        let entered = machine.state_mut(target.state);
        entered.entered_from = Some(path.source.state);
        entered.attached = data;

        let record = TransitionRecord {
            machine: machine.name().to_string(),
            from,
            to,
            frame: self.frame,
            timestamp: Utc::now(),
            explicit_data,
        };
        debug!(
            controller = %self.config.name,
            machine = %record.machine,
            from = %record.from,
            to = %record.to,
            frame = record.frame,
            "transition committed"
        );
        self.log.record(record);
    }

    fn reconcile(&mut self, target: StateRef) {
        let machine = &self.machines[target.machine.0];
        if let Some(child) = machine.state(target.state).child() {
            self.active_machine = child;
            let child = &mut self.machines[child.0];
            child.active = Machine::ENTRY_ID;
            debug!(
                controller = %self.config.name,
                machine = %child.name(),
                "entered child machine"
            );
        } else if target.state == Machine::EXIT_ID {
            match machine.parent() {
                Some(parent) => {
                    self.active_machine = parent.machine;
                    debug!(
                        controller = %self.config.name,
                        machine = %machine.name(),
                        parent = %self.machines[parent.machine.0].name(),
                        "child machine exited"
                    );
                }
                None => self.active_machine = target.machine,
            }
        } else {
            self.active_machine = target.machine;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateBuilder;
    use crate::core::{Condition, ENTRY, EXIT};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn traced(log: &Rc<RefCell<Vec<String>>>, name: &str) -> StateBuilder {
        let (enter, exit) = (Rc::clone(log), Rc::clone(log));
        StateBuilder::new(name)
            .on_enter(move |cx| enter.borrow_mut().push(format!("enter {}", cx.name())))
            .on_exit(move |cx| exit.borrow_mut().push(format!("exit {}", cx.name())))
    }

    #[test]
    fn checkpoint_steps_are_the_last_three() {
        assert!(!TransitionStep::AwaitFrameEnd.follows_checkpoint());
        assert!(!TransitionStep::Exit.follows_checkpoint());
        assert!(TransitionStep::Transfer.follows_checkpoint());
        assert!(TransitionStep::Commit.follows_checkpoint());
        assert!(TransitionStep::Reconcile.follows_checkpoint());
    }

    #[test]
    fn exit_transfer_enter_run_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let on_path = Rc::clone(&log);

        let mut controller = Controller::new();
        controller
            .root_mut()
            .add_state(traced(&log, "A"))
            .unwrap()
            .add_state(traced(&log, "B"))
            .unwrap()
            .begin_path("A", Condition::Always)
            .unwrap()
            .transfer_path(
                "A",
                "B",
                crate::builder::PathBuilder::always().on_transfer(move |cx| {
                    on_path.borrow_mut().push(format!(
                        "transfer {} -> {}",
                        cx.name(),
                        cx.target_name().unwrap_or("?")
                    ))
                }),
            )
            .unwrap();
        controller.run();
        for _ in 0..3 {
            controller.tick_frame();
        }

        assert_eq!(
            *log.borrow(),
            vec!["enter A", "exit A", "transfer A -> B", "enter B"]
        );
        assert_eq!(controller.history().path(), vec![ENTRY, "A", "B"]);
    }

    #[test]
    fn blocking_holds_then_resumes_from_same_step() {
        let mut controller = Controller::new();
        controller
            .root_mut()
            .add_state(StateBuilder::new("A").on_exit(|cx| cx.block()))
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
        assert_eq!(controller.active_state_name(), "A");

        controller.transfer("B");
        controller.tick_frame();
        controller.tick_frame();
        assert_eq!(controller.transition_step(), Some(TransitionStep::Transfer));
        assert_eq!(controller.active_state_name(), "A");

        for _ in 0..5 {
            controller.tick_frame();
        }
        assert_eq!(controller.transition_step(), Some(TransitionStep::Transfer));

        controller.cancel_block();
        controller.tick_fixed_step();
        assert_eq!(controller.active_state_name(), "B");
        assert!(!controller.is_transitioning());
    }

    #[test]
    fn transition_advances_while_paused() {
        let mut controller = Controller::new();
        controller
            .root_mut()
            .add_state("A")
            .unwrap()
            .begin_path("A", Condition::Always)
            .unwrap();
        controller.run();
        controller.tick_frame();
        controller.pause();
        controller.tick_frame();

        assert_eq!(controller.active_state_name(), "A");
    }

    #[test]
    fn stop_discards_in_flight_transition() {
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
        controller.transfer("B");
        controller.tick_frame();
        controller.stop();
        controller.tick_frame();

        assert!(!controller.is_transitioning());
        assert_eq!(controller.active_state_name(), ENTRY);
    }

    #[test]
    fn exiting_child_returns_to_parent_machine() {
        let mut controller = Controller::new();
        let mut root = controller.root_mut();
        root.add_state("Game")
            .unwrap()
            .add_state("Menu")
            .unwrap()
            .begin_path("Game", Condition::Always)
            .unwrap()
            .transfer_path("Game", "Menu", Condition::Always)
            .unwrap();
        root.promote("Game", "Game", false)
            .unwrap()
            .add_state("Play")
            .unwrap()
            .begin_path("Play", Condition::Always)
            .unwrap()
            .exit_path("Play", Condition::Always)
            .unwrap();
        controller.run();

        controller.tick_frame();
        controller.tick_frame();
        assert_eq!(controller.active_machine_name(), "Game");
        assert_eq!(controller.active_state_name(), ENTRY);

        controller.tick_frame();
        assert_eq!(controller.active_state_name(), "Play");

        controller.tick_frame();
        assert_eq!(controller.active_machine_name(), "Root");
        assert_eq!(controller.active_path(), vec!["Game", EXIT]);

        controller.tick_frame();
        assert_eq!(controller.active_state_name(), "Menu");
        assert_eq!(controller.active_path(), vec!["Menu"]);
    }
}
