//! Machines: named tables of mutually exclusive states.

use super::path::{PathSlot, TransferPath};
use super::state::{State, StateId, StateKind, StateRef};
use std::collections::HashMap;

/// Name of the entry sentinel every machine starts in.
pub const ENTRY: &str = "__ENTER";

/// Name of the exit sentinel that hands control back to a parent machine.
pub const EXIT: &str = "__EXIT";

/// Index of a machine within its controller's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MachineId(pub(crate) usize);

impl MachineId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named set of states with exactly one active at a time.
///
/// States are kept in insertion order. The entry and exit sentinels are
/// always the first two.
#[derive(Debug)]
pub struct Machine {
    pub(crate) id: MachineId,
    pub(crate) name: String,
    pub(crate) states: Vec<State>,
    index: HashMap<String, StateId>,
    pub(crate) active: StateId,
    pub(crate) parent: Option<StateRef>,
}

impl Machine {
    pub(crate) const ENTRY_ID: StateId = StateId(0);
    pub(crate) const EXIT_ID: StateId = StateId(1);

    pub(crate) fn new(id: MachineId, name: impl Into<String>, parent: Option<StateRef>) -> Self {
        let mut machine = Self {
            id,
            name: name.into(),
            states: Vec::new(),
            index: HashMap::new(),
            active: Self::ENTRY_ID,
            parent,
        };
        machine.insert(State::new(ENTRY, StateKind::Entry));
        machine.insert(State::new(EXIT, StateKind::Exit));
        machine
    }

    /// Add a state, returning `None` if the name is taken.
    pub(crate) fn insert(&mut self, state: State) -> Option<StateId> {
        if self.index.contains_key(&state.name) {
            return None;
        }
        let id = StateId(self.states.len());
        self.index.insert(state.name.clone(), id);
        self.states.push(state);
        Some(id)
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The promoted state that owns this machine, if any.
    pub fn parent(&self) -> Option<StateRef> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn lookup(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub(crate) fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.0]
    }

    pub fn path(&self, source: StateId, slot: PathSlot) -> Option<&TransferPath> {
        let state = self.states.get(source.0)?;
        match slot {
            PathSlot::Declared(index) => state.paths.get(index),
            PathSlot::Default => state.default_path.as_ref(),
        }
    }

    pub(crate) fn path_mut(&mut self, source: StateId, slot: PathSlot) -> Option<&mut TransferPath> {
        let state = self.states.get_mut(source.0)?;
        match slot {
            PathSlot::Declared(index) => state.paths.get_mut(index),
            PathSlot::Default => state.default_path.as_mut(),
        }
    }

    pub fn state_by_name(&self, name: &str) -> Option<&State> {
        self.lookup(name).map(|id| self.state(id))
    }

    pub fn active(&self) -> StateId {
        self.active
    }

    pub fn active_state(&self) -> &State {
        self.state(self.active)
    }

    pub fn active_state_name(&self) -> &str {
        &self.active_state().name
    }

    /// Whether the machine sits at its exit sentinel.
    pub fn is_exited(&self) -> bool {
        self.active == Self::EXIT_ID
    }

    /// All states in insertion order, sentinels first.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false: the sentinels are present from construction.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
