//! Transfer conditions for controlling when a path fires.
//!
//! A condition is a predicate evaluated by the controller's scanner each
//! time it looks for an outgoing edge. Conditions receive the [`Edge`]
//! being evaluated so a single closure can serve several paths.

use std::fmt;

/// The two endpoints of a transfer path, by name.
///
/// Passed to conditions and data getters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge<'a> {
    pub source: &'a str,
    pub target: &'a str,
}

/// Predicate that decides whether a transfer path fires.
///
/// Conditions only gate the scanner. An explicit transfer by target name
/// selects a path regardless of its condition, which is what makes
/// [`Condition::Manual`] edges reachable.
///
/// # Example
///
/// ```rust
/// use framefsm::core::{Condition, Edge};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let x = Rc::new(Cell::new(0));
/// let seen = Rc::clone(&x);
/// let over_five = Condition::when(move |_| seen.get() > 5);
///
/// let edge = Edge { source: "Idle", target: "Active" };
/// assert!(!over_five.check(&edge));
/// x.set(6);
/// assert!(over_five.check(&edge));
///
/// assert!(Condition::Always.check(&edge));
/// assert!(!Condition::Never.check(&edge));
/// assert!(!Condition::Manual.check(&edge));
/// ```
pub enum Condition {
    /// Fires whenever scanned.
    Always,
    /// Never fires on its own.
    Never,
    /// Invisible to the scanner; fires only through an explicit transfer.
    Manual,
    /// Custom predicate.
    When(Box<dyn Fn(&Edge<'_>) -> bool>),
}

impl Condition {
    /// Create a condition from a predicate.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&Edge<'_>) -> bool + 'static,
    {
        Condition::When(Box::new(predicate))
    }

    /// Evaluate the condition for the scanner.
    pub fn check(&self, edge: &Edge<'_>) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never | Condition::Manual => false,
            Condition::When(predicate) => predicate(edge),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => f.write_str("Always"),
            Condition::Never => f.write_str("Never"),
            Condition::Manual => f.write_str("Manual"),
            Condition::When(_) => f.write_str("When(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const EDGE: Edge<'static> = Edge {
        source: "Idle",
        target: "Active",
    };

    #[test]
    fn constants_evaluate_as_documented() {
        assert!(Condition::Always.check(&EDGE));
        assert!(!Condition::Never.check(&EDGE));
        assert!(!Condition::Manual.check(&EDGE));
    }

    #[test]
    fn predicate_sees_the_edge() {
        let cond = Condition::when(|e: &Edge| e.target == "Active");
        assert!(cond.check(&EDGE));
        assert!(!cond.check(&Edge {
            source: "Active",
            target: "Idle",
        }));
    }

    #[test]
    fn predicate_tracks_captured_state() {
        let x = Rc::new(Cell::new(0));
        let captured = Rc::clone(&x);
        let cond = Condition::when(move |_| captured.get() > 5);

        assert!(!cond.check(&EDGE));
        x.set(6);
        assert!(cond.check(&EDGE));
    }

    #[test]
    fn debug_hides_closures() {
        assert_eq!(format!("{:?}", Condition::when(|_| true)), "When(..)");
        assert_eq!(format!("{:?}", Condition::Manual), "Manual");
    }
}
