use serde::{Deserialize, Serialize};

/// When the response window of a trial is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseWindow {
    /// Opens at stimulus onset, closes `stimulus_ms + extension_ms` after onset.
    Timed { extension_ms: u64 },
    /// Opens at stimulus onset and stays open until a response arrives.
    SelfPaced,
    /// Opens `recall_delay_ms` after the last frame went dark, no deadline.
    AfterPresentation,
}

/// Per-trial timing parameters, fixed when the trial is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialTiming {
    /// Blank "get ready" pause before the first frame.
    pub lead_in_ms: u64,
    /// Number of frames shown in sequence (1 for single-stimulus tasks).
    pub frames: usize,
    /// Display time of each frame; `None` keeps it visible until the trial ends.
    pub stimulus_ms: Option<u64>,
    /// Blank between consecutive frames.
    pub frame_gap_ms: u64,
    /// Pause between the last frame and the recall window.
    pub recall_delay_ms: u64,
    pub window: ResponseWindow,
    /// Whether a scored response ends the trial early. Fixed-pace tasks
    /// (n-back, CPT) keep running until the deadline regardless.
    pub ends_on_response: bool,
    /// Inter-trial interval once the trial has ended.
    pub isi_ms: u64,
}

impl TrialTiming {
    /// Single stimulus, window open from onset until `stimulus + extension`.
    pub fn timed(stimulus_ms: u64, extension_ms: u64, isi_ms: u64) -> Self {
        Self {
            lead_in_ms: 0,
            frames: 1,
            stimulus_ms: Some(stimulus_ms),
            frame_gap_ms: 0,
            recall_delay_ms: 0,
            window: ResponseWindow::Timed { extension_ms },
            ends_on_response: true,
            isi_ms,
        }
    }

    /// Single stimulus that stays up until the participant answers.
    pub fn self_paced(isi_ms: u64) -> Self {
        Self {
            lead_in_ms: 0,
            frames: 1,
            stimulus_ms: None,
            frame_gap_ms: 0,
            recall_delay_ms: 0,
            window: ResponseWindow::SelfPaced,
            ends_on_response: true,
            isi_ms,
        }
    }

    /// `frames` items shown one after another, recalled afterwards.
    pub fn sequence(frames: usize, frame_ms: u64, gap_ms: u64, isi_ms: u64) -> Self {
        Self {
            lead_in_ms: 0,
            frames,
            stimulus_ms: Some(frame_ms),
            frame_gap_ms: gap_ms,
            recall_delay_ms: 0,
            window: ResponseWindow::AfterPresentation,
            ends_on_response: true,
            isi_ms,
        }
    }

    pub fn with_lead_in(mut self, lead_in_ms: u64) -> Self {
        self.lead_in_ms = lead_in_ms;
        self
    }

    pub fn with_recall_delay(mut self, recall_delay_ms: u64) -> Self {
        self.recall_delay_ms = recall_delay_ms;
        self
    }

    pub fn fixed_pace(mut self) -> Self {
        self.ends_on_response = false;
        self
    }

    /// Deadline measured from stimulus onset, if the window has one.
    pub fn deadline_ms(&self) -> Option<u64> {
        match self.window {
            ResponseWindow::Timed { extension_ms } => {
                Some(self.stimulus_ms.unwrap_or(0) + extension_ms)
            }
            ResponseWindow::SelfPaced | ResponseWindow::AfterPresentation => None,
        }
    }

    pub fn opens_at_onset(&self) -> bool {
        !matches!(self.window, ResponseWindow::AfterPresentation)
    }
}

/// How a missing response is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseMode {
    /// Respond only to targets; silence on a target is a miss.
    Detection,
    /// Every trial asks for an answer; silence is a timeout.
    Choice,
}

/// Classification of a single trial's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Hit,
    Miss,
    FalseAlarm,
    CorrectRejection,
    Timeout,
    /// A response on a trial where a correct answer was not yet possible.
    TooEarly,
    /// A response outside the expected set on a choice trial.
    Incorrect,
}

impl Outcome {
    pub fn is_correct(self) -> bool {
        matches!(self, Outcome::Hit | Outcome::CorrectRejection)
    }
}

/// Immutable descriptor of one stimulus presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trial<S, A> {
    pub index: usize,
    pub stimulus: S,
    /// Accepted responses. Empty means the correct behaviour is to withhold.
    pub expected: Vec<A>,
    pub timing: TrialTiming,
}

impl<S, A: PartialEq> Trial<S, A> {
    pub fn new(index: usize, stimulus: S, expected: Vec<A>, timing: TrialTiming) -> Self {
        Self {
            index,
            stimulus,
            expected,
            timing,
        }
    }

    pub fn is_target(&self) -> bool {
        !self.expected.is_empty()
    }

    /// Maps a response (or its absence) onto an outcome tag.
    pub fn classify(&self, response: Option<&A>, mode: ResponseMode) -> Outcome {
        match (response, self.is_target()) {
            (Some(r), true) if self.expected.contains(r) => Outcome::Hit,
            (Some(_), true) => Outcome::Incorrect,
            (Some(_), false) => Outcome::FalseAlarm,
            (None, false) => Outcome::CorrectRejection,
            (None, true) => match mode {
                ResponseMode::Detection => Outcome::Miss,
                ResponseMode::Choice => Outcome::Timeout,
            },
        }
    }
}

/// Recorded result per trial. Produced at most once per trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord<S, A> {
    pub trial_id: usize,
    pub stimulus: S,
    pub response: Option<A>,
    pub reaction_time_ns: Option<u64>,
    pub outcome: Outcome,
    pub score_delta: i64,
    pub timestamp_ns: u64,
}

impl<S, A> ResponseRecord<S, A> {
    pub fn correct(&self) -> bool {
        self.outcome.is_correct()
    }

    pub fn reaction_ms(&self) -> Option<f64> {
        self.reaction_time_ns.map(|ns| ns as f64 / 1_000_000.0)
    }
}
