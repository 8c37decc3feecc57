//! Builder API for assembling machine trees.
//!
//! States and paths are described with small value builders
//! ([`StateBuilder`], [`PathBuilder`]) and added to a machine through a
//! [`MachineBuilder`] borrowed from its [`Controller`](crate::runtime::Controller).

pub mod error;
pub mod machine;
pub mod path;
pub mod state;

pub use error::{BuildError, ErrorKind};
pub use machine::MachineBuilder;
pub use path::PathBuilder;
pub use state::StateBuilder;
