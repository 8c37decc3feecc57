//! Builder for transfer paths.

use crate::core::{AttachedData, Condition, DataGetter, Edge, StateHandler, StateId, TransferPath};
use crate::runtime::StateContext;
use std::any::Any;

/// Builder for a transfer path's behavior.
///
/// The endpoints are supplied by [`MachineBuilder`](super::MachineBuilder);
/// this builder carries the condition, the optional data getter and the
/// transfer callbacks.
///
/// # Example
///
/// ```rust
/// use framefsm::builder::PathBuilder;
/// use framefsm::core::Condition;
///
/// let path = PathBuilder::new(Condition::Always)
///     .data(|edge| format!("{} -> {}", edge.source, edge.target))
///     .on_transfer(|cx| println!("leaving {}", cx.name()));
/// ```
pub struct PathBuilder {
    condition: Condition,
    data_getter: Option<DataGetter>,
    on_transfer: Vec<StateHandler>,
}

impl PathBuilder {
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            data_getter: None,
            on_transfer: Vec::new(),
        }
    }

    /// A path that fires whenever scanned.
    pub fn always() -> Self {
        Self::new(Condition::Always)
    }

    /// A path reachable only through an explicit transfer.
    pub fn manual() -> Self {
        Self::new(Condition::Manual)
    }

    /// A path that fires when `predicate` holds.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&Edge<'_>) -> bool + 'static,
    {
        Self::new(Condition::when(predicate))
    }

    /// Attach a value produced at transition time.
    pub fn data<T, F>(self, getter: F) -> Self
    where
        T: Any,
        F: Fn(&Edge<'_>) -> T + 'static,
    {
        self.data_with(move |edge| Some(Box::new(getter(edge)) as AttachedData))
    }

    /// Attach an optional value produced at transition time.
    pub fn data_with<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Edge<'_>) -> Option<AttachedData> + 'static,
    {
        self.data_getter = Some(Box::new(getter));
        self
    }

    /// Add a callback run between the source's exit and the target's enter.
    ///
    /// The context's subject is the source state.
    pub fn on_transfer<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut StateContext<'_>) + 'static,
    {
        self.on_transfer.push(Box::new(handler));
        self
    }

    pub(crate) fn build(self, source: StateId, target: StateId) -> TransferPath {
        TransferPath::new(
            source,
            target,
            self.condition,
            self.data_getter,
            self.on_transfer,
        )
    }
}

impl From<Condition> for PathBuilder {
    fn from(condition: Condition) -> Self {
        Self::new(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataDelivery;

    const EDGE: Edge<'static> = Edge {
        source: "Idle",
        target: "Active",
    };

    #[test]
    fn condition_converts_into_builder() {
        let path = PathBuilder::from(Condition::Manual).build(StateId(2), StateId(3));

        assert!(matches!(path.condition(), Condition::Manual));
        assert_eq!(path.source(), StateId(2));
        assert_eq!(path.target(), StateId(3));
        assert!(!path.has_data_getter());
        assert_eq!(path.delivery(), DataDelivery::Auto);
    }

    #[test]
    fn data_getter_boxes_values() {
        let mut path = PathBuilder::always()
            .data(|e| e.target.len())
            .build(StateId(2), StateId(3));

        let data = path.resolve_data(&EDGE);
        assert_eq!(data.and_then(|d| d.downcast::<usize>().ok()).map(|b| *b), Some(6));
    }

    #[test]
    fn when_builds_custom_condition() {
        let path = PathBuilder::when(|e| e.source == "Idle").build(StateId(2), StateId(3));
        assert!(path.condition().check(&EDGE));
    }

    #[test]
    fn transfer_callbacks_accumulate() {
        let path = PathBuilder::always()
            .on_transfer(|_| {})
            .on_transfer(|_| {})
            .build(StateId(2), StateId(3));
        assert_eq!(path.on_transfer.len(), 2);
    }
}
