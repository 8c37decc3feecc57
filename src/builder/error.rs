//! Errors raised while building or wiring machines.

use thiserror::Error;

/// Broad category of a [`BuildError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A name or id did not resolve.
    Lookup,
    /// The requested wiring would break the machine tree.
    InvalidTopology,
}

/// Errors that can occur when building machines.
///
/// All of them abort the build step that raised them; the machine is left
/// as it was before the failing call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("State '{state}' not found in machine '{machine}'")]
    UnknownState { machine: String, state: String },

    #[error("Machine #{0} does not belong to this controller")]
    UnknownMachine(usize),

    #[error("State '{state}' already exists in machine '{machine}'")]
    DuplicateState { machine: String, state: String },

    #[error("State '{state}' in machine '{machine}' is already promoted")]
    AlreadyPromoted { machine: String, state: String },

    #[error("Sentinel '{state}' in machine '{machine}' cannot be promoted")]
    SentinelPromotion { machine: String, state: String },

    #[error("State '{state}' in machine '{machine}' is active and cannot be promoted")]
    PromoteActiveState { machine: String, state: String },

    #[error("Path cannot join machine '{from_machine}' to machine '{to_machine}'")]
    CrossMachineEdge {
        from_machine: String,
        to_machine: String,
    },
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownState { .. } | Self::UnknownMachine(_) => ErrorKind::Lookup,
            Self::DuplicateState { .. }
            | Self::AlreadyPromoted { .. }
            | Self::SentinelPromotion { .. }
            | Self::PromoteActiveState { .. }
            | Self::CrossMachineEdge { .. } => ErrorKind::InvalidTopology,
        }
    }
}
