//! Builder for declaring a state and its handlers.

use crate::core::{Hook, Phase, State, StateHandler, StateKind};
use crate::runtime::StateContext;

/// Builder for a state with a fluent API.
///
/// Each `on_*` call appends a handler; handlers on the same slot run in the
/// order they were added.
///
/// # Example
///
/// ```rust
/// use framefsm::builder::StateBuilder;
///
/// let idle = StateBuilder::new("Idle")
///     .on_enter(|cx| println!("entered {}", cx.name()))
///     .on_variable_step(|_| {})
///     .on_exit(|_| {});
/// assert_eq!(idle.name(), "Idle");
/// ```
pub struct StateBuilder {
    name: String,
    handlers: Vec<(Hook, StateHandler)>,
}

impl StateBuilder {
    /// Start declaring a state named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a handler to any slot.
    pub fn on<F>(mut self, hook: Hook, handler: F) -> Self
    where
        F: FnMut(&mut StateContext<'_>) + 'static,
    {
        self.handlers.push((hook, Box::new(handler)));
        self
    }

    /// Called after the state becomes active.
    pub fn on_enter<F>(self, handler: F) -> Self
    where
        F: FnMut(&mut StateContext<'_>) + 'static,
    {
        self.on(Hook::Enter, handler)
    }

    /// Called as the first step of a transition out of this state.
    pub fn on_exit<F>(self, handler: F) -> Self
    where
        F: FnMut(&mut StateContext<'_>) + 'static,
    {
        self.on(Hook::Exit, handler)
    }

    pub fn on_fixed_step<F>(self, handler: F) -> Self
    where
        F: FnMut(&mut StateContext<'_>) + 'static,
    {
        self.on(Hook::Phase(Phase::FixedStep), handler)
    }

    pub fn on_variable_step<F>(self, handler: F) -> Self
    where
        F: FnMut(&mut StateContext<'_>) + 'static,
    {
        self.on(Hook::Phase(Phase::VariableStep), handler)
    }

    pub fn on_late_step<F>(self, handler: F) -> Self
    where
        F: FnMut(&mut StateContext<'_>) + 'static,
    {
        self.on(Hook::Phase(Phase::LateStep), handler)
    }

    pub fn on_debug_draw<F>(self, handler: F) -> Self
    where
        F: FnMut(&mut StateContext<'_>) + 'static,
    {
        self.on(Hook::Phase(Phase::DebugDraw), handler)
    }

    pub fn on_frame_end<F>(self, handler: F) -> Self
    where
        F: FnMut(&mut StateContext<'_>) + 'static,
    {
        self.on(Hook::Phase(Phase::FrameEnd), handler)
    }

    pub(crate) fn build(self) -> State {
        let mut state = State::new(self.name, StateKind::Regular);
        for (hook, handler) in self.handlers {
            state.hooks.push(hook, handler);
        }
        state
    }
}

impl From<&str> for StateBuilder {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StateBuilder {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
