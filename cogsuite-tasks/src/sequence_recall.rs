//! Digit span and Corsi blocks: a sequence is shown one item at a time and
//! has to be reproduced, forward or backward. The span grows by one after
//! every correct replay and the session ends once all attempts at a span
//! have failed.

use cogsuite_core::{ConfigError, Outcome, ResponseMode, Stimulus, Trial, TrialTiming};
use cogsuite_session::{Record, Scored, SessionStats, Task};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecallOrder {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Digits,
    /// Positions on a board of `alphabet` blocks.
    Blocks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceRecallConfig {
    pub kind: ItemKind,
    /// Number of distinct items: 10 digits, or the number of blocks.
    pub alphabet: u8,
    pub order: RecallOrder,
    pub start_span: usize,
    /// Failed replays allowed at one span before the session ends.
    pub attempts: u32,
    pub frame_ms: u64,
    pub gap_ms: u64,
    pub lead_in_ms: u64,
    pub recall_delay_ms: u64,
    pub success_pause_ms: u64,
    pub failure_pause_ms: u64,
}

impl Default for SequenceRecallConfig {
    fn default() -> Self {
        Self::digits()
    }
}

impl SequenceRecallConfig {
    pub fn digits() -> Self {
        Self {
            kind: ItemKind::Digits,
            alphabet: 10,
            order: RecallOrder::Forward,
            start_span: 3,
            attempts: 2,
            frame_ms: 1000,
            gap_ms: 200,
            lead_in_ms: 1000,
            recall_delay_ms: 500,
            success_pause_ms: 1500,
            failure_pause_ms: 3000,
        }
    }

    pub fn corsi() -> Self {
        Self {
            kind: ItemKind::Blocks,
            alphabet: 9,
            order: RecallOrder::Forward,
            start_span: 3,
            attempts: 1,
            frame_ms: 500,
            gap_ms: 500,
            lead_in_ms: 1000,
            recall_delay_ms: 500,
            success_pause_ms: 1500,
            failure_pause_ms: 1500,
        }
    }

    pub fn backward(mut self) -> Self {
        self.order = RecallOrder::Backward;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let range = match self.kind {
            ItemKind::Digits => 2..=10,
            ItemKind::Blocks => 2..=20,
        };
        if !range.contains(&self.alphabet) {
            return Err(ConfigError::Invalid(format!(
                "alphabet of {} items outside {range:?}",
                self.alphabet
            )));
        }
        if self.start_span == 0 || self.attempts == 0 {
            return Err(ConfigError::Invalid(
                "start_span and attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// The items of one trial. Frame `i` of the trial shows `items[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    pub items: Vec<u8>,
}

impl Sequence {
    /// Draws `len` items below `alphabet`, never the same item twice in a row.
    pub fn random<R: Rng + ?Sized>(len: usize, alphabet: u8, rng: &mut R) -> Self {
        let mut items: Vec<u8> = Vec::with_capacity(len);
        for _ in 0..len {
            let item = loop {
                let candidate = rng.random_range(0..alphabet);
                if items.last() != Some(&candidate) {
                    break candidate;
                }
            };
            items.push(item);
        }
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, frame: usize) -> Option<u8> {
        self.items.get(frame).copied()
    }

    /// The answer expected for the given recall order.
    pub fn replay(&self, order: RecallOrder) -> Vec<u8> {
        match order {
            RecallOrder::Forward => self.items.clone(),
            RecallOrder::Backward => self.items.iter().rev().copied().collect(),
        }
    }
}

impl Stimulus for Sequence {
    fn describe(&self) -> String {
        self.items
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceRecallSummary {
    pub stats: SessionStats,
    /// Longest span replayed correctly, 0 if none was.
    pub max_span: usize,
    pub rating: Rating,
}

pub struct SequenceRecall {
    config: SequenceRecallConfig,
    span: usize,
    failures: u32,
    max_span: usize,
    finished: bool,
}

impl SequenceRecall {
    pub fn new(config: SequenceRecallConfig) -> Self {
        let span = config.start_span;
        Self {
            config,
            span,
            failures: 0,
            max_span: 0,
            finished: false,
        }
    }

    pub fn config(&self) -> &SequenceRecallConfig {
        &self.config
    }

    /// Length of the next sequence.
    pub fn span(&self) -> usize {
        self.span
    }

    pub fn max_span(&self) -> usize {
        self.max_span
    }

    pub fn rating(&self) -> Rating {
        let (excellent, good, average) = match self.config.kind {
            ItemKind::Digits => (9, 7, 5),
            ItemKind::Blocks => (7, 6, 5),
        };
        match self.max_span {
            s if s >= excellent => Rating::Excellent,
            s if s >= good => Rating::Good,
            s if s >= average => Rating::Average,
            _ => Rating::Poor,
        }
    }
}

impl Task for SequenceRecall {
    type Stimulus = Sequence;
    type Response = Vec<u8>;
    type Summary = SequenceRecallSummary;

    fn name(&self) -> &'static str {
        match self.config.kind {
            ItemKind::Digits => "digit_span",
            ItemKind::Blocks => "corsi",
        }
    }

    fn mode(&self) -> ResponseMode {
        ResponseMode::Choice
    }

    fn reset<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
        self.span = self.config.start_span;
        self.failures = 0;
        self.max_span = 0;
        self.finished = false;
    }

    fn next_trial<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        _history: &[Record<Self>],
        rng: &mut R,
    ) -> Option<Trial<Sequence, Vec<u8>>> {
        if self.finished {
            return None;
        }
        let c = &self.config;
        let sequence = Sequence::random(self.span, c.alphabet, rng);
        let expected = vec![sequence.replay(c.order)];
        let timing = TrialTiming::sequence(self.span, c.frame_ms, c.gap_ms, c.success_pause_ms)
            .with_lead_in(c.lead_in_ms)
            .with_recall_delay(c.recall_delay_ms);
        Some(Trial::new(index, sequence, expected, timing))
    }

    fn score(&mut self, trial: &Trial<Sequence, Vec<u8>>, response: Option<&Vec<u8>>) -> Scored {
        let span = trial.stimulus.len() as i64;
        match trial.classify(response, self.mode()) {
            Outcome::Hit => Scored::new(Outcome::Hit, span * 10).with_isi(self.config.success_pause_ms),
            other => Scored::new(other, 0).with_isi(self.config.failure_pause_ms),
        }
    }

    fn observe(&mut self, record: &Record<Self>) {
        let span = record.stimulus.len();
        if record.correct() {
            self.max_span = self.max_span.max(span);
            self.span = span + 1;
            self.failures = 0;
        } else {
            self.failures += 1;
            if self.failures >= self.config.attempts {
                self.finished = true;
            }
        }
        debug!(span, next = self.span, failures = self.failures, "span updated");
    }

    fn summarize(&self, records: &[Record<Self>]) -> SequenceRecallSummary {
        SequenceRecallSummary {
            stats: SessionStats::from_records(records),
            max_span: self.max_span,
            rating: self.rating(),
        }
    }
}
