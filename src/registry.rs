//! The registry: every live controller, driven once per frame phase.

use crate::core::Phase;
use crate::runtime::{Controller, ControllerConfig};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Stable handle to a controller owned by a [`Registry`].
///
/// Handles are never reused, so a stale handle simply finds nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerHandle(u64);

impl ControllerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControllerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller#{}", self.0)
    }
}

enum Command {
    Create(ControllerHandle, Controller),
    Destroy(ControllerHandle),
}

#[derive(Default)]
struct Shared {
    next_id: u64,
    commands: VecDeque<Command>,
}

impl Shared {
    fn allocate(&mut self) -> ControllerHandle {
        let handle = ControllerHandle(self.next_id);
        self.next_id += 1;
        handle
    }
}

/// Deferred registry mutations, usable from inside handlers.
///
/// Handlers run while the registry is mid-pass, so they cannot borrow it.
/// They queue creates and destroys here instead; the registry applies them
/// before and after every pass, in the order they were queued.
///
/// A queued command is only applied at a pass boundary, so a create queued
/// between frames registers at the start of the next tick. Outside a pass,
/// call [`Registry::insert`] or [`Registry::destroy_controller`] to apply
/// the change immediately.
///
/// # Example
///
/// ```rust
/// use framefsm::builder::StateBuilder;
/// use framefsm::core::Condition;
/// use framefsm::runtime::Controller;
/// use framefsm::Registry;
///
/// let mut registry = Registry::new();
/// let queue = registry.queue();
///
/// let handle = registry.create_controller();
/// let controller = registry.get_mut(handle).unwrap();
/// controller
///     .root_mut()
///     .add_state(StateBuilder::new("Spawner").on_enter(move |_| {
///         queue.create(Controller::new());
///     }))
///     .and_then(|root| root.begin_path("Spawner", Condition::Always))
///     .unwrap();
/// controller.run();
///
/// registry.tick_frame();
/// registry.tick_frame();
/// assert_eq!(registry.len(), 2);
/// ```
#[derive(Clone)]
pub struct RegistryQueue {
    shared: Rc<RefCell<Shared>>,
}

impl RegistryQueue {
    fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared::default())),
        }
    }

    /// Queue `controller` for registration; the handle is valid immediately.
    pub fn create(&self, controller: Controller) -> ControllerHandle {
        let mut shared = self.shared.borrow_mut();
        let handle = shared.allocate();
        shared.commands.push_back(Command::Create(handle, controller));
        handle
    }

    /// Queue removal of `handle`. Unknown handles are ignored when applied.
    pub fn destroy(&self, handle: ControllerHandle) {
        self.shared
            .borrow_mut()
            .commands
            .push_back(Command::Destroy(handle));
    }

    /// Commands waiting for the next pass boundary.
    pub fn pending(&self) -> usize {
        self.shared.borrow().commands.len()
    }
}

struct Slot {
    handle: ControllerHandle,
    controller: Option<Controller>,
}

/// Owns controllers and ticks them in registration order.
///
/// The host constructs one registry at startup and calls the five tick
/// methods once per frame, in order (or [`tick_frame`](Registry::tick_frame)).
/// Destroyed controllers leave a tombstone that is compacted at frame end.
pub struct Registry {
    slots: Vec<Slot>,
    queue: RegistryQueue,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            queue: RegistryQueue::new(),
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle for queuing mutations from inside handlers.
    pub fn queue(&self) -> RegistryQueue {
        self.queue.clone()
    }

    pub fn create_controller(&mut self) -> ControllerHandle {
        self.insert(Controller::new())
    }

    pub fn create_controller_with(&mut self, config: ControllerConfig) -> ControllerHandle {
        self.insert(Controller::with_config(config))
    }

    /// Register an already built controller.
    pub fn insert(&mut self, controller: Controller) -> ControllerHandle {
        let handle = self.queue.shared.borrow_mut().allocate();
        self.push(handle, controller);
        handle
    }

    fn push(&mut self, handle: ControllerHandle, controller: Controller) {
        debug!(
            controller = %controller.name(),
            handle = %handle,
            "controller registered"
        );
        self.slots.push(Slot {
            handle,
            controller: Some(controller),
        });
    }

    /// Unregister a controller, returning it if it was live.
    ///
    /// Its slot is tombstoned and reclaimed at the next frame end.
    pub fn destroy_controller(&mut self, handle: ControllerHandle) -> Option<Controller> {
        let slot = self.slots.iter_mut().find(|slot| slot.handle == handle)?;
        let controller = slot.controller.take()?;
        debug!(
            controller = %controller.name(),
            handle = %handle,
            "controller destroyed"
        );
        Some(controller)
    }

    pub fn get(&self, handle: ControllerHandle) -> Option<&Controller> {
        self.slots
            .iter()
            .find(|slot| slot.handle == handle)
            .and_then(|slot| slot.controller.as_ref())
    }

    pub fn get_mut(&mut self, handle: ControllerHandle) -> Option<&mut Controller> {
        self.slots
            .iter_mut()
            .find(|slot| slot.handle == handle)
            .and_then(|slot| slot.controller.as_mut())
    }

    pub fn contains(&self, handle: ControllerHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Live controllers.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.controller.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles of live controllers in registration order.
    pub fn handles(&self) -> Vec<ControllerHandle> {
        self.slots
            .iter()
            .filter(|slot| slot.controller.is_some())
            .map(|slot| slot.handle)
            .collect()
    }

    pub fn tick_fixed_step(&mut self) {
        self.pass(Phase::FixedStep);
    }

    pub fn tick_variable_step(&mut self) {
        self.pass(Phase::VariableStep);
    }

    pub fn tick_late_step(&mut self) {
        self.pass(Phase::LateStep);
    }

    pub fn tick_debug_draw(&mut self) {
        self.pass(Phase::DebugDraw);
    }

    /// Deliver the frame boundary, then reclaim destroyed slots.
    pub fn tick_frame_end(&mut self) {
        self.pass(Phase::FrameEnd);
        self.slots.retain(|slot| slot.controller.is_some());
    }

    /// Run all five phases in host order.
    pub fn tick_frame(&mut self) {
        self.tick_fixed_step();
        self.tick_variable_step();
        self.tick_late_step();
        self.tick_debug_draw();
        self.tick_frame_end();
    }

    /// Tick every live controller for `phase`.
    ///
    /// Commands queued during the pass take effect once it completes, so
    /// the walk never sees the slot list change. Manual controllers only
    /// receive the frame end.
    fn pass(&mut self, phase: Phase) {
        self.apply_commands();
        for slot in self.slots.iter_mut() {
            let Some(controller) = slot.controller.as_mut() else {
                continue;
            };
            if controller.is_manual() && phase != Phase::FrameEnd {
                continue;
            }
            controller.tick(phase);
        }
        self.apply_commands();
    }

    fn apply_commands(&mut self) {
        loop {
            let command = self.queue.shared.borrow_mut().commands.pop_front();
            match command {
                Some(Command::Create(handle, controller)) => self.push(handle, controller),
                Some(Command::Destroy(handle)) => {
                    self.destroy_controller(handle);
                }
                None => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateBuilder;
    use crate::core::Condition;
    use std::cell::Cell;

    fn counting(ticks: &Rc<Cell<u32>>) -> Controller {
        let ticks = Rc::clone(ticks);
        let mut controller = Controller::new();
        controller
            .root_mut()
            .add_state(StateBuilder::new("A").on_variable_step(move |_| ticks.set(ticks.get() + 1)))
            .unwrap()
            .begin_path("A", Condition::Always)
            .unwrap();
        controller.run();
        controller
    }

    #[test]
    fn handles_are_unique_and_never_reused() {
        let mut registry = Registry::new();
        let a = registry.create_controller();
        registry.destroy_controller(a);
        registry.tick_frame_end();
        let b = registry.create_controller();

        assert_ne!(a, b);
        assert!(registry.get(a).is_none());
        assert!(registry.contains(b));
    }

    #[test]
    fn destroy_tombstones_until_frame_end() {
        let mut registry = Registry::new();
        let a = registry.create_controller();
        let b = registry.create_controller();

        assert!(registry.destroy_controller(a).is_some());
        assert!(registry.destroy_controller(a).is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.slots.len(), 2);

        registry.tick_frame_end();
        assert_eq!(registry.slots.len(), 1);
        assert_eq!(registry.handles(), vec![b]);
    }

    #[test]
    fn manual_controllers_are_skipped_except_at_frame_end() {
        let ticks = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        let mut controller = counting(&ticks);
        controller.set_manual(true);
        let handle = registry.insert(controller);

        for _ in 0..5 {
            registry.tick_frame();
        }
        assert_eq!(ticks.get(), 0);
        assert_eq!(registry.get(handle).unwrap().frame(), 5);
    }

    #[test]
    fn automatic_controllers_tick_every_frame() {
        let ticks = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        registry.insert(counting(&ticks));

        for _ in 0..4 {
            registry.tick_frame();
        }
        // Entered during the second frame.
        assert_eq!(ticks.get(), 3);
    }

    #[test]
    fn queued_create_is_applied_after_the_pass() {
        let mut registry = Registry::new();
        let queue = registry.queue();

        let handle = queue.create(Controller::new());
        assert_eq!(queue.pending(), 1);
        assert!(!registry.contains(handle));

        registry.tick_fixed_step();
        assert!(registry.contains(handle));
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn queues_share_the_registry_handle_sequence() {
        let mut registry = Registry::new();
        let (first, second) = (registry.queue(), registry.queue());

        let a = first.create(Controller::new());
        let b = registry.insert(Controller::new());
        let c = second.create(Controller::new());
        assert_eq!(first.pending(), 2);
        assert!(a < b && b < c);

        registry.tick_frame();
        assert_eq!(registry.handles(), vec![b, a, c]);
    }

    #[test]
    fn controller_can_destroy_itself_from_a_handler() {
        let mut registry = Registry::new();
        let queue = registry.queue();
        let own = Rc::new(Cell::new(None));
        let seen = Rc::clone(&own);

        let mut controller = Controller::new();
        controller
            .root_mut()
            .add_state(StateBuilder::new("Done").on_enter(move |cx| {
                assert!(cx.controller().is_transitioning());
                if let Some(handle) = seen.get() {
                    queue.destroy(handle);
                }
            }))
            .unwrap()
            .begin_path("Done", Condition::Always)
            .unwrap();
        controller.run();
        let handle = registry.insert(controller);
        own.set(Some(handle));

        registry.tick_frame();
        assert!(registry.contains(handle));
        registry.tick_frame();
        assert!(!registry.contains(handle));
        assert!(registry.is_empty());
    }

    #[test]
    fn destroy_from_handler_takes_effect_after_the_pass() {
        let ticks = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        let queue = registry.queue();
        let victim = Rc::new(Cell::new(None));
        let target = Rc::clone(&victim);

        let mut killer = Controller::new();
        killer
            .root_mut()
            .add_state(StateBuilder::new("Kill").on_variable_step(move |_| {
                if let Some(handle) = target.get() {
                    queue.destroy(handle);
                }
            }))
            .unwrap()
            .begin_path("Kill", Condition::Always)
            .unwrap();
        killer.run();
        registry.insert(killer);
        let handle = registry.insert(counting(&ticks));
        victim.set(Some(handle));

        for _ in 0..3 {
            registry.tick_frame();
        }
        // The victim still ran in the pass that destroyed it.
        assert_eq!(ticks.get(), 1);
        assert!(!registry.contains(handle));
    }
}
