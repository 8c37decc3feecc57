//! Transfer paths: conditioned edges between states of one machine.

use super::condition::{Condition, Edge};
use super::state::{AttachedData, StateHandler, StateId, StateRef};
use std::fmt;

/// Produces the data attached to the target state when a path fires.
pub type DataGetter = Box<dyn Fn(&Edge<'_>) -> Option<AttachedData>>;

/// How the next traversal of a path obtains its attached data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DataDelivery {
    /// Call the path's data getter, or attach nothing without one.
    #[default]
    Auto,
    /// Use the value supplied by the caller of an explicit transfer.
    Explicit,
}

/// A directed, conditioned edge from one state to another.
///
/// Topology is fixed once built; only the per-traversal data delivery
/// changes.
pub struct TransferPath {
    pub(crate) source: StateId,
    pub(crate) target: StateId,
    pub(crate) condition: Condition,
    pub(crate) data_getter: Option<DataGetter>,
    pub(crate) on_transfer: Vec<StateHandler>,
    pub(crate) delivery: DataDelivery,
    pub(crate) explicit_data: Option<AttachedData>,
}

impl TransferPath {
    pub(crate) fn new(
        source: StateId,
        target: StateId,
        condition: Condition,
        data_getter: Option<DataGetter>,
        on_transfer: Vec<StateHandler>,
    ) -> Self {
        Self {
            source,
            target,
            condition,
            data_getter,
            on_transfer,
            delivery: DataDelivery::Auto,
            explicit_data: None,
        }
    }

    pub fn source(&self) -> StateId {
        self.source
    }

    pub fn target(&self) -> StateId {
        self.target
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn delivery(&self) -> DataDelivery {
        self.delivery
    }

    pub fn has_data_getter(&self) -> bool {
        self.data_getter.is_some()
    }

    /// Mark the next traversal as carrying caller-supplied data.
    pub(crate) fn deliver_explicit(&mut self, data: AttachedData) {
        self.delivery = DataDelivery::Explicit;
        self.explicit_data = Some(data);
    }

    /// Mark the next traversal as fetching its own data.
    pub(crate) fn deliver_auto(&mut self) {
        self.delivery = DataDelivery::Auto;
        self.explicit_data = None;
    }

    /// Resolve the data for the traversal in progress.
    ///
    /// Explicit data is consumed; the path returns to auto delivery.
    pub(crate) fn resolve_data(&mut self, edge: &Edge<'_>) -> Option<AttachedData> {
        match self.delivery {
            DataDelivery::Explicit => {
                self.delivery = DataDelivery::Auto;
                self.explicit_data.take()
            }
            DataDelivery::Auto => self.data_getter.as_ref().and_then(|get| get(edge)),
        }
    }
}

impl fmt::Debug for TransferPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferPath")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("condition", &self.condition)
            .field("data_getter", &self.data_getter.is_some())
            .field("on_transfer", &self.on_transfer.len())
            .field("delivery", &self.delivery)
            .finish()
    }
}

/// Which of a state's outgoing paths is meant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathSlot {
    /// Index into the declared paths.
    Declared(usize),
    /// The state's default path.
    Default,
}

/// Controller-wide address of a transfer path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PathRef {
    pub(crate) source: StateRef,
    pub(crate) slot: PathSlot,
}
