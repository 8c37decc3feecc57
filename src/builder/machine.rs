//! Builder for wiring states and paths into a machine.

use crate::builder::error::BuildError;
use crate::builder::path::PathBuilder;
use crate::builder::state::StateBuilder;
use crate::core::{Hook, Machine, MachineId, StateId, StateKind, StateRef, EXIT};
use crate::runtime::{Controller, StateContext};
use tracing::debug;

/// Mutable view of one machine inside a controller.
///
/// Obtained from [`Controller::root_mut`] or [`Controller::machine_mut`].
/// Every operation either succeeds completely or leaves the machine
/// untouched.
///
/// # Example
///
/// ```rust
/// use framefsm::core::Condition;
/// use framefsm::runtime::Controller;
///
/// # fn main() -> Result<(), framefsm::builder::BuildError> {
/// let mut controller = Controller::new();
/// let mut root = controller.root_mut();
/// root.add_state("Idle")?
///     .add_state("Active")?
///     .begin_path("Idle", Condition::Always)?
///     .transfer_path("Idle", "Active", Condition::Manual)?
///     .transfer_path("Active", "Idle", Condition::Always)?;
/// # Ok(())
/// # }
/// ```
pub struct MachineBuilder<'a> {
    controller: &'a mut Controller,
    machine: MachineId,
}

impl<'a> MachineBuilder<'a> {
    pub(crate) fn new(controller: &'a mut Controller, machine: MachineId) -> Self {
        Self {
            controller,
            machine,
        }
    }

    pub fn id(&self) -> MachineId {
        self.machine
    }

    pub fn name(&self) -> &str {
        self.get().name()
    }

    fn get(&self) -> &Machine {
        &self.controller.machines[self.machine.0]
    }

    fn get_mut(&mut self) -> &mut Machine {
        &mut self.controller.machines[self.machine.0]
    }

    /// Resolve a state name in this machine.
    pub fn state_ref(&self, name: &str) -> Result<StateRef, BuildError> {
        let machine = self.get();
        machine
            .lookup(name)
            .map(|state| StateRef {
                machine: self.machine,
                state,
            })
            .ok_or_else(|| BuildError::UnknownState {
                machine: machine.name().to_string(),
                state: name.to_string(),
            })
    }

    /// Add a state with its handlers.
    pub fn add_state(&mut self, state: impl Into<StateBuilder>) -> Result<&mut Self, BuildError> {
        let state = state.into().build();
        let name = state.name().to_string();
        if self.get_mut().insert(state).is_none() {
            return Err(BuildError::DuplicateState {
                machine: self.name().to_string(),
                state: name,
            });
        }
        Ok(self)
    }

    /// Add a handler to an existing state's slot, sentinels included.
    pub fn on<F>(&mut self, state: &str, hook: Hook, handler: F) -> Result<&mut Self, BuildError>
    where
        F: FnMut(&mut StateContext<'_>) + 'static,
    {
        let state = self.state_ref(state)?;
        self.get_mut()
            .state_mut(state.state)
            .hooks
            .push(hook, Box::new(handler));
        Ok(self)
    }

    /// Declare the edge from the entry sentinel to `target`.
    pub fn begin_path(
        &mut self,
        target: &str,
        path: impl Into<PathBuilder>,
    ) -> Result<&mut Self, BuildError> {
        self.connect(Machine::ENTRY_ID, target, path)
    }

    /// Declare an edge from `source` to the exit sentinel.
    pub fn exit_path(
        &mut self,
        source: &str,
        path: impl Into<PathBuilder>,
    ) -> Result<&mut Self, BuildError> {
        let source = self.state_ref(source)?;
        self.connect(source.state, EXIT, path)
    }

    /// Declare an edge between two named states.
    ///
    /// Paths out of a state are scanned in the order they are declared.
    pub fn transfer_path(
        &mut self,
        source: &str,
        target: &str,
        path: impl Into<PathBuilder>,
    ) -> Result<&mut Self, BuildError> {
        let source = self.state_ref(source)?;
        self.connect(source.state, target, path)
    }

    /// Set the path evaluated after all declared paths of `source`.
    ///
    /// Replaces any previous default path. Default paths are not reachable
    /// through an explicit transfer.
    pub fn default_path(
        &mut self,
        source: &str,
        target: &str,
        path: impl Into<PathBuilder>,
    ) -> Result<&mut Self, BuildError> {
        let source = self.state_ref(source)?;
        let target = self.state_ref(target)?;
        let path = path.into().build(source.state, target.state);
        self.get_mut().state_mut(source.state).default_path = Some(path);
        Ok(self)
    }

    /// Declare an edge between two resolved states.
    ///
    /// Both must belong to this machine.
    pub fn connect_refs(
        &mut self,
        source: StateRef,
        target: StateRef,
        path: impl Into<PathBuilder>,
    ) -> Result<&mut Self, BuildError> {
        for end in [source, target] {
            if end.machine != self.machine {
                let other = self
                    .controller
                    .machines
                    .get(end.machine.0)
                    .ok_or(BuildError::UnknownMachine(end.machine.0))?;
                return Err(BuildError::CrossMachineEdge {
                    from_machine: self.name().to_string(),
                    to_machine: other.name().to_string(),
                });
            }
            if end.state.0 >= self.get().len() {
                return Err(BuildError::UnknownState {
                    machine: self.name().to_string(),
                    state: format!("#{}", end.state.0),
                });
            }
        }
        let path = path.into().build(source.state, target.state);
        self.get_mut().state_mut(source.state).paths.push(path);
        Ok(self)
    }

    fn connect(
        &mut self,
        source: StateId,
        target: &str,
        path: impl Into<PathBuilder>,
    ) -> Result<&mut Self, BuildError> {
        let target = self.state_ref(target)?;
        let source = StateRef {
            machine: self.machine,
            state: source,
        };
        self.connect_refs(source, target, path)
    }

    /// Promote `state` into a child machine named `child_name`.
    ///
    /// With `keep_running`, the promoted state keeps receiving phase
    /// callbacks while its child machine is active. Returns a builder for
    /// the new child.
    pub fn promote(
        &mut self,
        state: &str,
        child_name: &str,
        keep_running: bool,
    ) -> Result<MachineBuilder<'_>, BuildError> {
        let parent = self.state_ref(state)?;
        let existing = self.get().state(parent.state);
        if existing.kind() != StateKind::Regular {
            return Err(BuildError::SentinelPromotion {
                machine: self.name().to_string(),
                state: state.to_string(),
            });
        }
        if existing.is_promoted() {
            return Err(BuildError::AlreadyPromoted {
                machine: self.name().to_string(),
                state: state.to_string(),
            });
        }
        // The active chain would end at a child nobody scans.
        if self.controller.is_on_active_chain(parent) {
            return Err(BuildError::PromoteActiveState {
                machine: self.name().to_string(),
                state: state.to_string(),
            });
        }

        let child = MachineId(self.controller.machines.len());
        self.controller
            .machines
            .push(Machine::new(child, child_name, Some(parent)));
        let promoted = self.get_mut().state_mut(parent.state);
        promoted.child = Some(child);
        promoted.keep_running = keep_running;
        debug!(
            controller = %self.controller.name(),
            machine = %self.get().name(),
            state,
            child = child_name,
            keep_running,
            "promoted state into child machine"
        );

        Ok(MachineBuilder::new(&mut *self.controller, child))
    }
}
