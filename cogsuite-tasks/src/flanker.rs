//! Flanker: a row of arrows, answer with the direction of the highlighted
//! one while ignoring its neighbours.

use cogsuite_core::{
    ArrowDirection, ConfigError, Outcome, ResponseMode, Stimulus, Trial, TrialTiming,
};
use cogsuite_session::{Record, Scored, SessionConfig, SessionStats, Task, mean};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrowRow {
    pub arrows: Vec<ArrowDirection>,
    /// Position of the arrow to judge.
    pub target: usize,
}

impl ArrowRow {
    pub fn new(len: usize, target: usize, direction: ArrowDirection, congruent: bool) -> Self {
        let flank = if congruent {
            direction
        } else {
            direction.opposite()
        };
        let arrows = (0..len)
            .map(|i| if i == target { direction } else { flank })
            .collect();
        Self { arrows, target }
    }

    pub fn direction(&self) -> Option<ArrowDirection> {
        self.arrows.get(self.target).copied()
    }

    pub fn is_congruent(&self) -> bool {
        self.arrows.windows(2).all(|w| w[0] == w[1])
    }
}

impl Stimulus for ArrowRow {
    fn describe(&self) -> String {
        self.arrows
            .iter()
            .enumerate()
            .map(|(i, a)| {
                if i == self.target {
                    format!("[{}]", a.glyph())
                } else {
                    a.glyph().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlankerConfig {
    pub arrows: usize,
    pub congruent_probability: f64,
    pub isi_ms: u64,
    pub duration_secs: u64,
}

impl Default for FlankerConfig {
    fn default() -> Self {
        Self {
            arrows: 5,
            congruent_probability: 0.6,
            isi_ms: 150,
            duration_secs: 30,
        }
    }
}

impl FlankerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(5..=300).contains(&self.duration_secs) {
            return Err(ConfigError::Invalid(format!(
                "flanker duration {}s outside 5..=300",
                self.duration_secs
            )));
        }
        if self.arrows == 0 {
            return Err(ConfigError::Invalid("flanker rows need at least one arrow".into()));
        }
        Ok(())
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            start_delay_ms: 0,
            ..SessionConfig::default()
        }
        .with_session_limit(self.duration_secs * 1000)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlankerSummary {
    pub stats: SessionStats,
    /// Correct answers, one point each.
    pub score: i64,
    /// Mean over every answered trial, right or wrong.
    pub mean_rt_ms: Option<f64>,
    /// Mean correct incongruent RT minus mean correct congruent RT.
    pub congruency_cost_ms: Option<f64>,
}

pub struct Flanker {
    config: FlankerConfig,
}

impl Flanker {
    pub fn new(config: FlankerConfig) -> Self {
        Self { config }
    }
}

impl Task for Flanker {
    type Stimulus = ArrowRow;
    type Response = ArrowDirection;
    type Summary = FlankerSummary;

    fn name(&self) -> &'static str {
        "flanker"
    }

    fn mode(&self) -> ResponseMode {
        ResponseMode::Choice
    }

    fn reset<R: Rng + ?Sized>(&mut self, _rng: &mut R) {}

    fn next_trial<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        _history: &[Record<Self>],
        rng: &mut R,
    ) -> Option<Trial<ArrowRow, ArrowDirection>> {
        let direction = if rng.random_bool(0.5) {
            ArrowDirection::Left
        } else {
            ArrowDirection::Right
        };
        let congruent = rng.random_bool(self.config.congruent_probability);
        let target = rng.random_range(0..self.config.arrows);
        let row = ArrowRow::new(self.config.arrows, target, direction, congruent);
        Some(Trial::new(
            index,
            row,
            vec![direction],
            TrialTiming::self_paced(self.config.isi_ms),
        ))
    }

    fn score(
        &mut self,
        trial: &Trial<ArrowRow, ArrowDirection>,
        response: Option<&ArrowDirection>,
    ) -> Scored {
        let outcome = trial.classify(response, self.mode());
        Scored::new(outcome, i64::from(outcome == Outcome::Hit))
    }

    fn summarize(&self, records: &[Record<Self>]) -> FlankerSummary {
        let stats = SessionStats::from_records(records);
        let correct_rt = |congruent: bool| {
            mean(
                records
                    .iter()
                    .filter(|r| r.correct() && r.stimulus.is_congruent() == congruent)
                    .filter_map(|r| r.reaction_ms()),
            )
        };
        let congruency_cost_ms = match (correct_rt(false), correct_rt(true)) {
            (Some(incongruent), Some(congruent)) => Some(incongruent - congruent),
            _ => None,
        };
        FlankerSummary {
            score: stats.score,
            mean_rt_ms: mean(records.iter().filter_map(|r| r.reaction_ms())),
            congruency_cost_ms,
            stats,
        }
    }
}
