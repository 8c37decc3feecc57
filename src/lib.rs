//! Framefsm: a frame-synchronous hierarchical state machine runtime
//!
//! Framefsm drives stateful behavior from a game loop. A [`Controller`]
//! owns a tree of machines: any state can be promoted into a child machine
//! of its own, and control descends into that child when the state is
//! entered and returns when the child reaches its exit sentinel.
//!
//! Transitions are never executed inline. A transfer path that fires (or
//! is requested by name) is recorded during one frame and carried out at
//! the start of the next, in steps that a handler can hold in place with
//! [`Controller::block`].
//!
//! # Core Concepts
//!
//! - **State**: named callbacks for the five frame phases plus enter/exit
//! - **Transfer path**: a conditioned edge between two states of one machine
//! - **Machine**: a set of states with entry and exit sentinels
//! - **Controller**: the runtime driver of one machine tree
//! - **Registry**: every live controller, ticked once per frame phase
//!
//! # Example
//!
//! ```rust
//! use framefsm::builder::{BuildError, PathBuilder, StateBuilder};
//! use framefsm::core::Condition;
//! use framefsm::runtime::Controller;
//!
//! # fn main() -> Result<(), BuildError> {
//! let mut controller = Controller::new();
//! let mut root = controller.root_mut();
//! root.add_state("Idle")?
//!     .add_state(StateBuilder::new("Active").on_enter(|cx| {
//!         println!("active, carrying {:?}", cx.attached::<u32>());
//!     }))?
//!     .begin_path("Idle", Condition::Always)?
//!     .transfer_path("Idle", "Active", PathBuilder::manual().data(|_| 7_u32))?
//!     .transfer_path("Active", "Idle", Condition::Never)?;
//!
//! controller.run();
//! controller.tick_frame();
//! controller.tick_frame();
//! assert_eq!(controller.active_state_name(), "Idle");
//!
//! controller.transfer("Active");
//! controller.tick_frame();
//! controller.tick_frame();
//! assert_eq!(controller.active_state_name(), "Active");
//! assert_eq!(controller.attached::<u32>(), Some(&7));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod core;
pub mod registry;
pub mod runtime;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder, PathBuilder, StateBuilder};
pub use crate::core::{Condition, Phase, ENTRY, EXIT};
pub use registry::{ControllerHandle, Registry, RegistryQueue};
pub use runtime::{Controller, ControllerConfig, StateContext};
