//! Frame phases and the hook slots a state exposes.

use std::fmt;

/// One of the per-frame phases the host loop drives.
///
/// The host calls each phase exactly once per frame, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Fixed-rate simulation step.
    FixedStep,
    /// Variable-rate step, once per rendered frame.
    VariableStep,
    /// Runs after every variable step of the frame.
    LateStep,
    /// Debug overlay drawing.
    DebugDraw,
    /// End-of-frame boundary.
    FrameEnd,
}

impl Phase {
    /// All phases in the order the host drives them.
    pub const ALL: [Phase; 5] = [
        Phase::FixedStep,
        Phase::VariableStep,
        Phase::LateStep,
        Phase::DebugDraw,
        Phase::FrameEnd,
    ];

    /// Whether dispatch in this phase evaluates transfer conditions.
    ///
    /// The fixed step scans only when the controller is configured to.
    pub fn scans(self, scan_fixed_step: bool) -> bool {
        match self {
            Phase::VariableStep => true,
            Phase::FixedStep => scan_fixed_step,
            _ => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::FixedStep => "fixed_step",
            Phase::VariableStep => "variable_step",
            Phase::LateStep => "late_step",
            Phase::DebugDraw => "debug_draw",
            Phase::FrameEnd => "frame_end",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A callback slot on a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hook {
    Enter,
    Exit,
    Phase(Phase),
}

impl From<Phase> for Hook {
    fn from(phase: Phase) -> Self {
        Hook::Phase(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_variable_step_scans_by_default() {
        assert!(Phase::VariableStep.scans(false));
        assert!(!Phase::FixedStep.scans(false));
        assert!(Phase::FixedStep.scans(true));
        assert!(!Phase::LateStep.scans(true));
        assert!(!Phase::DebugDraw.scans(true));
        assert!(!Phase::FrameEnd.scans(true));
    }

    #[test]
    fn phases_are_listed_in_host_order() {
        assert_eq!(Phase::ALL.first(), Some(&Phase::FixedStep));
        assert_eq!(Phase::ALL.last(), Some(&Phase::FrameEnd));
    }

    #[test]
    fn phase_converts_into_hook() {
        assert_eq!(Hook::from(Phase::LateStep), Hook::Phase(Phase::LateStep));
        assert_eq!(Phase::DebugDraw.to_string(), "debug_draw");
    }
}
