//! Context handed to state and transfer handlers.

use super::controller::Controller;
use crate::core::{StateRef, EXIT};
use std::any::Any;

/// What a handler sees while it runs.
///
/// The *subject* is the state whose slot is being invoked. For a transfer
/// callback the subject is the path's source and [`target_name`] reports
/// where the path leads.
///
/// Handlers cannot mutate the machine directly. They request transfers
/// and toggle blocking, which the controller acts on at its next
/// opportunity.
///
/// [`target_name`]: StateContext::target_name
pub struct StateContext<'a> {
    controller: &'a mut Controller,
    state: StateRef,
    target: Option<StateRef>,
}

impl<'a> StateContext<'a> {
    pub(crate) fn new(
        controller: &'a mut Controller,
        state: StateRef,
        target: Option<StateRef>,
    ) -> Self {
        Self {
            controller,
            state,
            target,
        }
    }

    pub fn state(&self) -> StateRef {
        self.state
    }

    pub fn name(&self) -> &str {
        self.controller.state(self.state).name()
    }

    pub fn machine_name(&self) -> &str {
        self.controller.machines[self.state.machine.0].name()
    }

    /// Name of the state the subject was last entered from.
    pub fn entered_from(&self) -> Option<&str> {
        let from = self.controller.state(self.state).entered_from()?;
        Some(self.controller.machines[self.state.machine.0].state(from).name())
    }

    /// Data attached by the last transition into the subject.
    pub fn attached<T: Any>(&self) -> Option<&T> {
        self.controller
            .state(self.state)
            .attached()
            .and_then(|data| data.downcast_ref::<T>())
    }

    /// Target of the path being traversed, for transfer callbacks.
    pub fn target_name(&self) -> Option<&str> {
        self.target
            .map(|target| self.controller.state(target).name())
    }

    pub fn frame(&self) -> u64 {
        self.controller.frame()
    }

    /// Read-only view of the whole controller.
    pub fn controller(&self) -> &Controller {
        self.controller
    }

    /// Request a transfer from the controller's active state.
    ///
    /// See [`Controller::transfer`].
    pub fn transfer(&mut self, target: &str) -> bool {
        self.controller.transfer(target)
    }

    /// Request a transfer carrying explicit data.
    pub fn transfer_with<T: Any>(&mut self, target: &str, data: T) -> bool {
        self.controller.transfer_with(target, data)
    }

    /// Request a transfer to the active machine's exit sentinel.
    pub fn exit(&mut self) -> bool {
        self.controller.transfer(EXIT)
    }

    /// Stall any in-flight transition at its next checkpoint.
    pub fn block(&mut self) {
        self.controller.block();
    }

    pub fn cancel_block(&mut self) {
        self.controller.cancel_block();
    }

    pub fn is_blocking(&self) -> bool {
        self.controller.is_blocking()
    }
}
