use serde::{Deserialize, Serialize};

/// Sub-states of a running session.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunningPhase {
    /// Lead-in and stimulus frames are being shown; input is not yet accepted.
    Presenting,
    /// The response window of the current trial is open.
    AwaitingResponse,
    /// Pause between the end of one trial and the start of the next.
    InterTrialInterval,
}

/// Lifecycle of a session: `Idle -> Running -> (Stopped | Completed)`.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Idle,
    Running(RunningPhase),
    Stopped,
    Completed,
}

impl SessionPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub fn allows_input(&self) -> bool {
        matches!(self, Self::Running(RunningPhase::AwaitingResponse))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Completed)
    }

    /// A new session may start from any phase except a running one.
    pub fn can_start(&self) -> bool {
        !self.is_running()
    }

    pub fn running(&self) -> Option<RunningPhase> {
        match self {
            Self::Running(sub) => Some(*sub),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_awaiting_response_accepts_input() {
        assert!(!SessionPhase::Idle.allows_input());
        assert!(!SessionPhase::Running(RunningPhase::Presenting).allows_input());
        assert!(SessionPhase::Running(RunningPhase::AwaitingResponse).allows_input());
        assert!(!SessionPhase::Running(RunningPhase::InterTrialInterval).allows_input());
        assert!(!SessionPhase::Completed.allows_input());
    }

    #[test]
    fn terminal_phases_can_restart() {
        assert!(SessionPhase::Stopped.can_start());
        assert!(SessionPhase::Completed.can_start());
        assert!(SessionPhase::Idle.can_start());
        assert!(!SessionPhase::Running(RunningPhase::Presenting).can_start());
    }
}
