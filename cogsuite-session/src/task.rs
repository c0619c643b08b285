use std::fmt::Debug;

use cogsuite_core::{Outcome, ResponseMode, ResponseRecord, Stimulus, Trial};
use rand::Rng;
use serde::Serialize;

/// Response record of task `T`.
pub type Record<T> = ResponseRecord<<T as Task>::Stimulus, <T as Task>::Response>;

/// Classification of one response plus its effect on the running score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    pub outcome: Outcome,
    pub delta: i64,
    /// Replaces the trial's inter-trial interval, for tasks whose pause
    /// depends on how the trial went.
    pub isi_ms: Option<u64>,
}

impl Scored {
    pub fn new(outcome: Outcome, delta: i64) -> Self {
        Self {
            outcome,
            delta,
            isi_ms: None,
        }
    }

    pub fn with_isi(mut self, isi_ms: u64) -> Self {
        self.isi_ms = Some(isi_ms);
        self
    }
}

/// One cognitive task: what to show, what counts as correct, how to sum up.
///
/// The engine owns all timing; a task only generates trials, scores
/// responses and aggregates the records at the end.
pub trait Task {
    type Stimulus: Stimulus;
    type Response: Clone + Debug + PartialEq + Serialize;
    type Summary: Clone + Debug + Serialize;

    fn name(&self) -> &'static str;

    /// How silence on a target trial is tagged.
    fn mode(&self) -> ResponseMode;

    /// Clears per-session state. Pre-generating tasks build their trial list here.
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R);

    /// The trial with the given index, or `None` once the task is finished.
    fn next_trial<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        history: &[Record<Self>],
        rng: &mut R,
    ) -> Option<Trial<Self::Stimulus, Self::Response>>;

    /// Scores a response, or the lack of one once the window closed.
    fn score(
        &mut self,
        trial: &Trial<Self::Stimulus, Self::Response>,
        response: Option<&Self::Response>,
    ) -> Scored {
        Scored::new(trial.classify(response, self.mode()), 0)
    }

    /// Called after every record is appended.
    fn observe(&mut self, _record: &Record<Self>) {}

    fn summarize(&self, records: &[Record<Self>]) -> Self::Summary;
}
