//! Go/no-go: press on the go signal, withhold on the no-go signal.

use cogsuite_core::{ConfigError, Outcome, ResponseMode, Stimulus, Trial, TrialTiming};
use cogsuite_session::{Record, Scored, SessionStats, Task, mean, percent};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Press;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Go,
    NoGo,
}

impl Stimulus for Signal {
    fn describe(&self) -> String {
        match self {
            Signal::Go => "go".into(),
            Signal::NoGo => "no-go".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoNoGoConfig {
    pub trials: usize,
    pub go_probability: f64,
    /// The signal stays up and the window stays open this long.
    pub window_ms: u64,
    /// Blank after a press before the inter-trial interval starts.
    pub feedback_ms: u64,
    pub isi_min_ms: u64,
    pub isi_max_ms: u64,
}

impl Default for GoNoGoConfig {
    fn default() -> Self {
        Self {
            trials: 50,
            go_probability: 0.8,
            window_ms: 1000,
            feedback_ms: 200,
            isi_min_ms: 800,
            isi_max_ms: 1500,
        }
    }
}

impl GoNoGoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::Invalid("go/no-go needs at least one trial".into()));
        }
        if self.isi_min_ms >= self.isi_max_ms {
            return Err(ConfigError::Invalid(format!(
                "empty ISI range {}..{}",
                self.isi_min_ms, self.isi_max_ms
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoNoGoSummary {
    pub stats: SessionStats,
    pub go_accuracy_pct: f64,
    pub nogo_accuracy_pct: f64,
    /// Mean reaction time over correct presses on go trials.
    pub mean_go_rt_ms: Option<f64>,
}

pub struct GoNoGo {
    config: GoNoGoConfig,
    plan: Vec<(Signal, u64)>,
}

impl GoNoGo {
    pub fn new(config: GoNoGoConfig) -> Self {
        Self {
            config,
            plan: Vec::new(),
        }
    }

    pub fn plan(&self) -> &[(Signal, u64)] {
        &self.plan
    }
}

impl Task for GoNoGo {
    type Stimulus = Signal;
    type Response = Press;
    type Summary = GoNoGoSummary;

    fn name(&self) -> &'static str {
        "go_no_go"
    }

    fn mode(&self) -> ResponseMode {
        ResponseMode::Detection
    }

    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let c = &self.config;
        self.plan = (0..c.trials)
            .map(|_| {
                let signal = if rng.random_bool(c.go_probability) {
                    Signal::Go
                } else {
                    Signal::NoGo
                };
                (signal, rng.random_range(c.isi_min_ms..c.isi_max_ms))
            })
            .collect();
    }

    fn next_trial<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        _history: &[Record<Self>],
        _rng: &mut R,
    ) -> Option<Trial<Signal, Press>> {
        let &(signal, isi) = self.plan.get(index)?;
        let expected = match signal {
            Signal::Go => vec![Press],
            Signal::NoGo => vec![],
        };
        let timing = TrialTiming::timed(self.config.window_ms, 0, isi);
        Some(Trial::new(index, signal, expected, timing))
    }

    fn score(&mut self, trial: &Trial<Signal, Press>, response: Option<&Press>) -> Scored {
        let outcome = trial.classify(response, self.mode());
        let scored = Scored::new(outcome, i64::from(outcome.is_correct()));
        if response.is_some() {
            scored.with_isi(self.config.feedback_ms + trial.timing.isi_ms)
        } else {
            scored
        }
    }

    fn summarize(&self, records: &[Record<Self>]) -> GoNoGoSummary {
        let of = |signal: Signal| records.iter().filter(move |r| r.stimulus == signal);
        let go = of(Signal::Go).count();
        let nogo = of(Signal::NoGo).count();
        GoNoGoSummary {
            go_accuracy_pct: percent(of(Signal::Go).filter(|r| r.correct()).count(), go),
            nogo_accuracy_pct: percent(of(Signal::NoGo).filter(|r| r.correct()).count(), nogo),
            mean_go_rt_ms: mean(
                of(Signal::Go)
                    .filter(|r| r.outcome == Outcome::Hit)
                    .filter_map(|r| r.reaction_ms()),
            ),
            stats: SessionStats::from_records(records),
        }
    }
}
