//! Core state machine data.
//!
//! This module holds the passive half of the runtime:
//! - Phases and hook slots a state can react to
//! - Transfer conditions and paths (the edges of a machine)
//! - States and the machines that own them
//! - A bounded log of committed transitions
//!
//! Nothing here drives a machine. Dispatch and the transition protocol
//! live in [`crate::runtime`].

mod condition;
mod history;
mod machine;
mod path;
mod phase;
mod state;

pub use condition::{Condition, Edge};
pub use history::{TransitionLog, TransitionRecord};
pub use machine::{Machine, MachineId, ENTRY, EXIT};
pub use path::{DataDelivery, DataGetter, PathSlot, TransferPath};
pub use phase::{Hook, Phase};
pub use state::{AttachedData, State, StateHandler, StateId, StateKind, StateRef};
pub(crate) use path::PathRef;
