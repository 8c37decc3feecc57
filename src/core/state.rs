//! States: named units of behavior with hook slots.
//!
//! A state belongs to exactly one [`Machine`](super::Machine) and is
//! addressed by a [`StateRef`]. States hold their outgoing transfer paths,
//! and a state that has been promoted also points at its child machine.

use super::machine::MachineId;
use super::path::TransferPath;
use super::phase::{Hook, Phase};
use crate::runtime::StateContext;
use std::any::Any;
use std::fmt;

/// Data handed to a state when a transition enters it.
pub type AttachedData = Box<dyn Any>;

/// A callback invoked for one hook slot of a state.
///
/// Transfer callbacks on paths use the same signature; their context
/// reports the path's target through [`StateContext::target_name`].
pub type StateHandler = Box<dyn FnMut(&mut StateContext<'_>)>;

/// Index of a state within its machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Controller-wide address of a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateRef {
    pub machine: MachineId,
    pub state: StateId,
}

/// Distinguishes user states from the two sentinels every machine owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    Regular,
    /// Initial active state before the machine first runs.
    Entry,
    /// Hand-back point that returns control to a parent machine.
    Exit,
}

/// Ordered handler lists, one per hook slot.
#[derive(Default)]
pub(crate) struct Hooks {
    enter: Vec<StateHandler>,
    exit: Vec<StateHandler>,
    phases: [Vec<StateHandler>; 5],
}

impl Hooks {
    pub(crate) fn slot_mut(&mut self, hook: Hook) -> &mut Vec<StateHandler> {
        match hook {
            Hook::Enter => &mut self.enter,
            Hook::Exit => &mut self.exit,
            Hook::Phase(phase) => &mut self.phases[phase_index(phase)],
        }
    }

    pub(crate) fn len(&self, hook: Hook) -> usize {
        match hook {
            Hook::Enter => self.enter.len(),
            Hook::Exit => self.exit.len(),
            Hook::Phase(phase) => self.phases[phase_index(phase)].len(),
        }
    }

    pub(crate) fn push(&mut self, hook: Hook, handler: StateHandler) {
        self.slot_mut(hook).push(handler);
    }
}

fn phase_index(phase: Phase) -> usize {
    match phase {
        Phase::FixedStep => 0,
        Phase::VariableStep => 1,
        Phase::LateStep => 2,
        Phase::DebugDraw => 3,
        Phase::FrameEnd => 4,
    }
}

/// A named unit of behavior inside a machine.
pub struct State {
    pub(crate) name: String,
    pub(crate) kind: StateKind,
    pub(crate) paths: Vec<TransferPath>,
    pub(crate) default_path: Option<TransferPath>,
    pub(crate) child: Option<MachineId>,
    pub(crate) keep_running: bool,
    pub(crate) hooks: Hooks,
    pub(crate) entered_from: Option<StateId>,
    pub(crate) attached: Option<AttachedData>,
}

impl State {
    pub(crate) fn new(name: impl Into<String>, kind: StateKind) -> Self {
        Self {
            name: name.into(),
            kind,
            paths: Vec::new(),
            default_path: None,
            child: None,
            keep_running: false,
            hooks: Hooks::default(),
            entered_from: None,
            attached: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    /// Whether this state has been promoted into a child machine.
    pub fn is_promoted(&self) -> bool {
        self.child.is_some()
    }

    /// The child machine, present only once promoted.
    pub fn child(&self) -> Option<MachineId> {
        self.child
    }

    /// Whether this state keeps receiving phase callbacks while its
    /// child machine runs.
    pub fn keeps_running(&self) -> bool {
        self.keep_running
    }

    /// Outgoing paths in declaration order.
    pub fn paths(&self) -> &[TransferPath] {
        &self.paths
    }

    pub fn default_path(&self) -> Option<&TransferPath> {
        self.default_path.as_ref()
    }

    /// The state whose transition most recently entered this one.
    pub fn entered_from(&self) -> Option<StateId> {
        self.entered_from
    }

    /// Data delivered by the last transition into this state.
    pub fn attached(&self) -> Option<&dyn Any> {
        self.attached.as_deref()
    }

    /// Number of handlers registered on a slot.
    pub fn handler_count(&self, hook: Hook) -> usize {
        self.hooks.len(hook)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("paths", &self.paths)
            .field("default_path", &self.default_path)
            .field("child", &self.child)
            .field("keep_running", &self.keep_running)
            .field("entered_from", &self.entered_from)
            .field("attached", &self.attached.is_some())
            .finish()
    }
}
