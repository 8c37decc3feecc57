//! Runtime: controllers, their configuration and the handler context.

pub mod config;
pub mod context;
pub mod controller;
pub mod transition;

pub use config::ControllerConfig;
pub use context::StateContext;
pub use controller::Controller;
pub use transition::TransitionStep;
