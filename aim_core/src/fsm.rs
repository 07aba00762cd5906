//! Session State Machine
//!
//! Tracks where a session is in its life: waiting to start, running, or done.

/// Session phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Ready,
    Playing,
    Finished,
    Aborted,
}

/// Actions that trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Start,
    TimeUp,
    Abort,
    Restart,
    /// Hand results to persistence, phase is unchanged
    Finalize,
}

/// Result of a phase transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionResult {
    success: bool,
    from_phase: SessionPhase,
    to_phase: SessionPhase,
    action: SessionAction,
}

impl TransitionResult {
    pub fn success(&self) -> bool {
        self.success
    }

    #[allow(clippy::wrong_self_convention)]
    pub fn from_phase(&self) -> SessionPhase {
        self.from_phase
    }

    pub fn to_phase(&self) -> SessionPhase {
        self.to_phase
    }

    pub fn action(&self) -> SessionAction {
        self.action
    }
}

/// Session Finite State Machine
#[derive(Debug, Clone)]
pub struct SessionFsm {
    phase: SessionPhase,
}

impl SessionFsm {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Ready,
        }
    }

    /// Get current phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Check if a transition is valid
    pub fn can_transition(&self, action: SessionAction) -> bool {
        self.get_next_phase(action).is_some()
    }

    /// Attempt a transition
    pub fn transition(&mut self, action: SessionAction) -> TransitionResult {
        let from_phase = self.phase;

        if let Some(next_phase) = self.get_next_phase(action) {
            self.phase = next_phase;
            TransitionResult {
                success: true,
                from_phase,
                to_phase: next_phase,
                action,
            }
        } else {
            TransitionResult {
                success: false,
                from_phase,
                to_phase: from_phase,
                action,
            }
        }
    }

    /// Get next phase for a given action (if valid)
    fn get_next_phase(&self, action: SessionAction) -> Option<SessionPhase> {
        match (self.phase, action) {
            // From Ready
            (SessionPhase::Ready, SessionAction::Start) => Some(SessionPhase::Playing),
            (SessionPhase::Ready, SessionAction::Abort) => Some(SessionPhase::Aborted),

            // From Playing
            (SessionPhase::Playing, SessionAction::TimeUp) => Some(SessionPhase::Finished),
            (SessionPhase::Playing, SessionAction::Abort) => Some(SessionPhase::Aborted),

            // From Finished / Aborted
            (SessionPhase::Finished, SessionAction::Restart) => Some(SessionPhase::Ready),
            (SessionPhase::Finished, SessionAction::Finalize) => Some(SessionPhase::Finished),
            (SessionPhase::Aborted, SessionAction::Restart) => Some(SessionPhase::Ready),
            (SessionPhase::Aborted, SessionAction::Finalize) => Some(SessionPhase::Aborted),

            // Invalid transition
            _ => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    /// Finished or Aborted
    pub fn is_over(&self) -> bool {
        matches!(self.phase, SessionPhase::Finished | SessionPhase::Aborted)
    }
}

impl Default for SessionFsm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_phase() {
        let fsm = SessionFsm::new();
        assert_eq!(fsm.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_valid_transition() {
        let mut fsm = SessionFsm::new();
        let result = fsm.transition(SessionAction::Start);
        assert!(result.success());
        assert_eq!(result.from_phase(), SessionPhase::Ready);
        assert_eq!(fsm.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_invalid_transition() {
        let mut fsm = SessionFsm::new();
        let result = fsm.transition(SessionAction::TimeUp);
        assert!(!result.success());
        assert_eq!(result.to_phase(), SessionPhase::Ready);
        assert_eq!(fsm.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_full_session_flow() {
        let mut fsm = SessionFsm::new();
        fsm.transition(SessionAction::Start);
        fsm.transition(SessionAction::TimeUp);
        assert_eq!(fsm.phase(), SessionPhase::Finished);
        assert!(fsm.is_over());
        fsm.transition(SessionAction::Restart);
        assert_eq!(fsm.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_abort_mid_session() {
        let mut fsm = SessionFsm::new();
        fsm.transition(SessionAction::Start);
        assert!(fsm.transition(SessionAction::Abort).success());
        assert_eq!(fsm.phase(), SessionPhase::Aborted);
        assert!(
            !fsm.can_transition(SessionAction::TimeUp),
            "Aborted sessions cannot finish"
        );
    }

    #[test]
    fn test_finalize_keeps_phase() {
        let mut fsm = SessionFsm::new();
        assert!(!fsm.can_transition(SessionAction::Finalize), "Nothing to finalize yet");
        fsm.transition(SessionAction::Start);
        fsm.transition(SessionAction::TimeUp);
        let result = fsm.transition(SessionAction::Finalize);
        assert!(result.success());
        assert_eq!(fsm.phase(), SessionPhase::Finished);
    }

    #[test]
    fn test_restart_only_after_end() {
        let mut fsm = SessionFsm::new();
        assert!(!fsm.can_transition(SessionAction::Restart));
        fsm.transition(SessionAction::Start);
        assert!(!fsm.can_transition(SessionAction::Restart));
    }
}
