use serde::Serialize;

use crate::trial::Outcome;

/// Presentation side effects emitted by the engine, in order.
///
/// The host decides how (and whether) each one is drawn or sounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RenderInstruction<S> {
    Clear,
    /// Lead-in before the first frame of a trial.
    Ready { trial: usize },
    ShowStimulus { trial: usize, frame: usize, stimulus: S },
    HideStimulus { trial: usize, frame: usize },
    /// The response window opened after the presentation finished.
    PromptResponse { trial: usize },
    Feedback { trial: usize, outcome: Outcome },
    ClearFeedback { trial: usize },
    SessionEnded { completed: bool },
}

impl<S> RenderInstruction<S> {
    pub fn trial(&self) -> Option<usize> {
        match self {
            RenderInstruction::Ready { trial }
            | RenderInstruction::ShowStimulus { trial, .. }
            | RenderInstruction::HideStimulus { trial, .. }
            | RenderInstruction::PromptResponse { trial }
            | RenderInstruction::Feedback { trial, .. }
            | RenderInstruction::ClearFeedback { trial } => Some(*trial),
            RenderInstruction::Clear | RenderInstruction::SessionEnded { .. } => None,
        }
    }
}
