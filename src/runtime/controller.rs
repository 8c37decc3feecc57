//! The controller: runtime driver of one machine tree.

use super::config::ControllerConfig;
use super::context::StateContext;
use super::transition::Transition;
use crate::builder::{BuildError, MachineBuilder};
use crate::core::{
    AttachedData, Edge, Hook, Machine, MachineId, PathRef, PathSlot, Phase, State, StateKind,
    StateRef, TransferPath, TransitionLog, EXIT,
};
use std::any::Any;
use tracing::debug;

/// Drives a tree of machines one frame phase at a time.
///
/// A controller owns its root machine and every child machine created by
/// promoting states. It tracks which machine is currently active, runs
/// phase callbacks down the active chain, scans transfer paths, and
/// carries out transitions as a multi-frame protocol that can be held at
/// fixed checkpoints with [`block`](Controller::block).
///
/// # Example
///
/// ```rust
/// use framefsm::core::Condition;
/// use framefsm::runtime::Controller;
///
/// let mut controller = Controller::new();
/// controller
///     .root_mut()
///     .add_state("Idle")
///     .and_then(|root| root.begin_path("Idle", Condition::Always))
///     .unwrap();
///
/// controller.run();
/// controller.tick_frame(); // decide __ENTER -> Idle
/// controller.tick_frame(); // execute it
/// assert_eq!(controller.active_state_name(), "Idle");
/// ```
pub struct Controller {
    pub(crate) machines: Vec<Machine>,
    pub(crate) config: ControllerConfig,
    pub(crate) active_machine: MachineId,
    running: bool,
    blocking: bool,
    pub(crate) pending: Option<PathRef>,
    pub(crate) transition: Option<Transition>,
    pub(crate) frame: u64,
    pub(crate) log: TransitionLog,
}

impl Controller {
    /// A stopped controller with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    /// A stopped controller whose root machine is named after `config.root_name`.
    pub fn with_config(config: ControllerConfig) -> Self {
        let root = MachineId(0);
        Self {
            machines: vec![Machine::new(root, config.root_name.clone(), None)],
            log: TransitionLog::with_capacity(config.history_capacity),
            config,
            active_machine: root,
            running: false,
            blocking: false,
            pending: None,
            transition: None,
            frame: 0,
        }
    }

    /// Configuration this controller was built with.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Name used in log events.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Whether the registry leaves this controller to bespoke driving code.
    pub fn is_manual(&self) -> bool {
        self.config.manual
    }

    /// Opt in or out of registry driving.
    pub fn set_manual(&mut self, manual: bool) {
        self.config.manual = manual;
    }

    // ---- structure -------------------------------------------------------

    /// Id of the root machine, always the first in the arena.
    pub fn root(&self) -> MachineId {
        MachineId(0)
    }

    /// The root machine.
    pub fn root_machine(&self) -> &Machine {
        &self.machines[0]
    }

    /// Look up a machine by id.
    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(id.0)
    }

    /// All machines, root first, then children in promotion order.
    pub fn machines(&self) -> impl Iterator<Item = &Machine> {
        self.machines.iter()
    }

    /// Builder for the root machine.
    pub fn root_mut(&mut self) -> MachineBuilder<'_> {
        let root = self.root();
        MachineBuilder::new(self, root)
    }

    /// Builder for any machine in the tree, usually a promoted child.
    pub fn machine_mut(&mut self, id: MachineId) -> Result<MachineBuilder<'_>, BuildError> {
        if id.0 >= self.machines.len() {
            return Err(BuildError::UnknownMachine(id.0));
        }
        Ok(MachineBuilder::new(self, id))
    }

    pub(crate) fn state(&self, at: StateRef) -> &State {
        self.machines[at.machine.0].state(at.state)
    }

    pub(crate) fn state_mut(&mut self, at: StateRef) -> &mut State {
        self.machines[at.machine.0].state_mut(at.state)
    }

    pub(crate) fn path_mut(&mut self, path: PathRef) -> Option<&mut TransferPath> {
        self.machines[path.source.machine.0].path_mut(path.source.state, path.slot)
    }

    fn root_ref(&self) -> StateRef {
        StateRef {
            machine: self.root(),
            state: self.root_machine().active(),
        }
    }

    fn active_ref(&self) -> StateRef {
        StateRef {
            machine: self.active_machine,
            state: self.machines[self.active_machine.0].active(),
        }
    }

    // ---- observation -----------------------------------------------------

    /// Id of the machine whose active state is scanned.
    pub fn active_machine_id(&self) -> MachineId {
        self.active_machine
    }

    /// The machine whose active state is scanned for transfers.
    pub fn active_machine(&self) -> &Machine {
        &self.machines[self.active_machine.0]
    }

    /// Name of the active machine.
    pub fn active_machine_name(&self) -> &str {
        self.active_machine().name()
    }

    /// Active state of the active machine.
    pub fn active_state(&self) -> &State {
        self.active_machine().active_state()
    }

    /// Name of the active machine's active state, sentinels included.
    pub fn active_state_name(&self) -> &str {
        self.active_state().name()
    }

    /// Data attached to the active state by the transition that entered it.
    pub fn attached<T: Any>(&self) -> Option<&T> {
        self.active_state()
            .attached()
            .and_then(|data| data.downcast_ref::<T>())
    }

    /// Names of the states visited by phase dispatch, root first.
    pub fn active_path(&self) -> Vec<&str> {
        self.active_chain()
            .into_iter()
            .map(|at| self.state(at).name())
            .collect()
    }

    /// Whether `at` is one of the states phase dispatch currently visits.
    pub fn is_on_active_chain(&self, at: StateRef) -> bool {
        self.active_chain().contains(&at)
    }

    fn active_chain(&self) -> Vec<StateRef> {
        let mut chain = Vec::new();
        let mut current = self.root_ref();
        loop {
            chain.push(current);
            match self.state(current).child() {
                Some(child) => {
                    current = StateRef {
                        machine: child,
                        state: self.machines[child.0].active(),
                    }
                }
                None => return chain,
            }
        }
    }

    /// Whether phase dispatch and path scanning are enabled.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether transitions are held at their next checkpoint.
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Whether a transition has started and not yet reconciled.
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Whether a path is waiting for the late step to start it.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of frame ends this controller has seen.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Committed transitions, oldest first, bounded by the configured capacity.
    pub fn history(&self) -> &TransitionLog {
        &self.log
    }

    // ---- lifecycle -------------------------------------------------------

    /// Start (or restart) dispatching phases and scanning paths.
    pub fn run(&mut self) {
        self.running = true;
    }

    /// Stop dispatching without rewinding. An in-flight transition still advances.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Same as [`run`](Controller::run).
    pub fn resume(&mut self) {
        self.run();
    }

    /// Stop and rewind to the root machine's entry sentinel.
    ///
    /// Drops any pending path and any in-flight transition. Child machines
    /// keep their last active state until they are entered again.
    pub fn stop(&mut self) {
        self.running = false;
        self.pending = None;
        if let Some(transition) = self.transition.take() {
            debug!(
                controller = %self.config.name,
                step = ?transition.step,
                "stop discarded in-flight transition"
            );
        }
        self.active_machine = self.root();
        self.machines[0].active = Machine::ENTRY_ID;
        debug!(controller = %self.config.name, "controller stopped");
    }

    /// Hold any in-flight transition at its next checkpoint.
    pub fn block(&mut self) {
        self.blocking = true;
    }

    /// Release a [`block`](Controller::block); the held step resumes at the next fixed step.
    pub fn cancel_block(&mut self) {
        self.blocking = false;
    }

    // ---- manual transfers ------------------------------------------------

    /// Queue the active state's path leading to `target`.
    ///
    /// Searches the active state's declared paths in order, ignoring their
    /// conditions. Returns `false` and does nothing when no such path
    /// exists. Replaces any path already pending.
    pub fn transfer(&mut self, target: &str) -> bool {
        self.request_transfer(target, None)
    }

    /// Like [`transfer`](Controller::transfer), delivering `data` to the
    /// target instead of the path's data getter.
    pub fn transfer_with<T: Any>(&mut self, target: &str, data: T) -> bool {
        self.request_transfer(target, Some(Box::new(data)))
    }

    /// Transfer to the active machine's exit sentinel.
    pub fn exit(&mut self) -> bool {
        self.transfer(EXIT)
    }

    fn request_transfer(&mut self, target: &str, data: Option<AttachedData>) -> bool {
        let source = self.active_ref();
        let machine = &self.machines[source.machine.0];
        let Some(target_id) = machine.lookup(target) else {
            debug!(
                controller = %self.config.name,
                machine = %machine.name(),
                target,
                "transfer ignored: no such state"
            );
            return false;
        };
        let Some(index) = machine
            .state(source.state)
            .paths()
            .iter()
            .position(|path| path.target() == target_id)
        else {
            debug!(
                controller = %self.config.name,
                from = %machine.state(source.state).name(),
                target,
                "transfer ignored: no path from active state"
            );
            return false;
        };

        self.queue_path(
            PathRef {
                source,
                slot: PathSlot::Declared(index),
            },
            data,
        );
        true
    }

    pub(crate) fn queue_path(&mut self, path: PathRef, data: Option<AttachedData>) {
        let Some(transfer) = self.path_mut(path) else {
            return;
        };
        match data {
            Some(data) => transfer.deliver_explicit(data),
            None => transfer.deliver_auto(),
        }
        self.pending = Some(path);

        let (from, to) = self.path_names(path);
        debug!(controller = %self.config.name, from, to, "transfer pending");
    }

    pub(crate) fn path_names(&self, path: PathRef) -> (&str, &str) {
        let machine = &self.machines[path.source.machine.0];
        let from = machine.state(path.source.state).name();
        let to = machine
            .path(path.source.state, path.slot)
            .map(|p| machine.state(p.target()).name())
            .unwrap_or("?");
        (from, to)
    }

    // ---- dispatch --------------------------------------------------------

    /// Drive one phase.
    pub fn tick(&mut self, phase: Phase) {
        match phase {
            Phase::FixedStep => {
                self.advance_transition();
                self.dispatch(phase);
            }
            Phase::VariableStep | Phase::DebugDraw => self.dispatch(phase),
            Phase::LateStep => self.late_step(),
            Phase::FrameEnd => {
                self.dispatch(phase);
                self.cross_frame_boundary();
                self.frame += 1;
            }
        }
    }

    /// Advance any in-flight transition, then dispatch the fixed step.
    pub fn tick_fixed_step(&mut self) {
        self.tick(Phase::FixedStep);
    }

    /// Dispatch the variable step and scan for a firing path.
    pub fn tick_variable_step(&mut self) {
        self.tick(Phase::VariableStep);
    }

    /// Start the pending transition, or dispatch the late step when none is pending.
    pub fn tick_late_step(&mut self) {
        self.tick(Phase::LateStep);
    }

    /// Dispatch the debug draw phase.
    pub fn tick_debug_draw(&mut self) {
        self.tick(Phase::DebugDraw);
    }

    /// Dispatch the frame end and count the frame.
    pub fn tick_frame_end(&mut self) {
        self.tick(Phase::FrameEnd);
    }

    /// Drive all five phases in host order.
    pub fn tick_frame(&mut self) {
        for phase in Phase::ALL {
            self.tick(phase);
        }
    }

    fn dispatch(&mut self, phase: Phase) {
        if !self.running || self.transition.is_some() || self.pending.is_some() {
            return;
        }
        if phase.scans(self.config.scan_fixed_step) {
            if let Some(path) = self.first_ready_path(self.active_ref()) {
                self.queue_path(path, None);
                return;
            }
        }
        self.walk(phase);
    }

    fn late_step(&mut self) {
        if !self.running || self.transition.is_some() {
            return;
        }
        if let Some(path) = self.pending.take() {
            self.begin_transition(path);
            return;
        }
        self.walk(Phase::LateStep);
    }

    /// First path out of `source` whose condition holds, default path last.
    fn first_ready_path(&self, source: StateRef) -> Option<PathRef> {
        let machine = &self.machines[source.machine.0];
        let state = machine.state(source.state);
        let ready = |path: &TransferPath| {
            path.condition().check(&Edge {
                source: state.name(),
                target: machine.state(path.target()).name(),
            })
        };

        if let Some(index) = state.paths().iter().position(|path| ready(path)) {
            return Some(PathRef {
                source,
                slot: PathSlot::Declared(index),
            });
        }
        state
            .default_path()
            .filter(|&path| ready(path))
            .map(|_| PathRef {
                source,
                slot: PathSlot::Default,
            })
    }

    /// Invoke `phase` from the root down the active chain.
    ///
    /// Promoted states run only when flagged keep-running; the first
    /// non-promoted state always runs.
    fn walk(&mut self, phase: Phase) {
        let mut current = self.root_ref();
        loop {
            let state = self.state(current);
            match state.child() {
                Some(child) => {
                    if state.keeps_running() {
                        self.invoke(current, Hook::Phase(phase));
                    }
                    current = StateRef {
                        machine: child,
                        state: self.machines[child.0].active(),
                    };
                }
                None => {
                    if state.kind() == StateKind::Exit && phase == Phase::VariableStep {
                        self.rescan_parent(current.machine);
                    }
                    self.invoke(current, Hook::Phase(phase));
                    return;
                }
            }
        }
    }

    /// Exit sentinel behavior: offer the owning state's paths as the
    /// parent machine's next transition.
    fn rescan_parent(&mut self, machine: MachineId) {
        let Some(parent) = self.machines[machine.0].parent() else {
            return;
        };
        if let Some(path) = self.first_ready_path(parent) {
            self.queue_path(path, None);
        }
    }

    /// Run every handler in a slot, in registration order.
    pub(crate) fn invoke(&mut self, at: StateRef, hook: Hook) {
        let mut handlers = std::mem::take(self.state_mut(at).hooks.slot_mut(hook));
        if handlers.is_empty() {
            return;
        }
        {
            let mut cx = StateContext::new(self, at, None);
            for handler in handlers.iter_mut() {
                handler(&mut cx);
            }
        }
        let slot = self.state_mut(at).hooks.slot_mut(hook);
        handlers.append(slot);
        *slot = handlers;
    }

    /// Run a path's transfer callbacks with the source as subject.
    pub(crate) fn invoke_transfer(&mut self, path: PathRef, target: StateRef) {
        let Some(transfer) = self.path_mut(path) else {
            return;
        };
        let mut handlers = std::mem::take(&mut transfer.on_transfer);
        if handlers.is_empty() {
            return;
        }
        {
            let mut cx = StateContext::new(self, path.source, Some(target));
            for handler in handlers.iter_mut() {
                handler(&mut cx);
            }
        }
        if let Some(transfer) = self.path_mut(path) {
            handlers.append(&mut transfer.on_transfer);
            transfer.on_transfer = handlers;
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
