//! Continuous performance test: letters flash at a fixed pace for a fixed
//! time, press only on the target letter.

use cogsuite_core::{ConfigError, ResponseMode, Trial, TrialTiming};
use cogsuite_session::{Record, SessionConfig, SessionStats, Task, mean, percent};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::Press;

/// Non-target letters; the target is left out.
const DISTRACTORS: &str = "ABCDEFGHIJKLMNOPQRSTUVWYZ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CptConfig {
    pub target: char,
    pub target_probability: f64,
    pub stimulus_ms: u64,
    /// Blank after each letter; responses still count for that letter.
    pub isi_ms: u64,
    pub duration_ms: u64,
}

impl Default for CptConfig {
    fn default() -> Self {
        Self {
            target: 'X',
            target_probability: 0.2,
            stimulus_ms: 250,
            isi_ms: 1500,
            duration_ms: 120_000,
        }
    }
}

impl CptConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_ms == 0 || self.stimulus_ms == 0 {
            return Err(ConfigError::Invalid("CPT durations must be positive".into()));
        }
        Ok(())
    }

    /// The run is bounded by time, not trial count, and starts immediately.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            start_delay_ms: 0,
            ..SessionConfig::default()
        }
        .with_session_limit(self.duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CptSummary {
    pub hits: usize,
    pub misses: usize,
    pub false_alarms: usize,
    pub mean_hit_rt_ms: Option<f64>,
    /// hits / (hits + misses), in percent.
    pub accuracy_pct: f64,
    pub stats: SessionStats,
}

pub struct Cpt {
    config: CptConfig,
    distractors: Vec<char>,
}

impl Cpt {
    pub fn new(config: CptConfig) -> Self {
        let distractors = DISTRACTORS
            .chars()
            .filter(|&c| c != config.target)
            .collect();
        Self {
            config,
            distractors,
        }
    }
}

impl Task for Cpt {
    type Stimulus = char;
    type Response = Press;
    type Summary = CptSummary;

    fn name(&self) -> &'static str {
        "cpt"
    }

    fn mode(&self) -> ResponseMode {
        ResponseMode::Detection
    }

    fn reset<R: Rng + ?Sized>(&mut self, _rng: &mut R) {}

    fn next_trial<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        _history: &[Record<Self>],
        rng: &mut R,
    ) -> Option<Trial<char, Press>> {
        let c = &self.config;
        let (letter, expected) = if rng.random_bool(c.target_probability) {
            (c.target, vec![Press])
        } else {
            (*self.distractors.choose(rng)?, vec![])
        };
        let timing = TrialTiming::timed(c.stimulus_ms, c.isi_ms, 0).fixed_pace();
        Some(Trial::new(index, letter, expected, timing))
    }

    fn summarize(&self, records: &[Record<Self>]) -> CptSummary {
        let stats = SessionStats::from_records(records);
        CptSummary {
            hits: stats.hits,
            misses: stats.misses,
            false_alarms: stats.false_alarms,
            mean_hit_rt_ms: mean(
                records
                    .iter()
                    .filter(|r| r.correct())
                    .filter_map(|r| r.reaction_ms()),
            ),
            accuracy_pct: percent(stats.hits, stats.hits + stats.misses),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn only_the_target_letter_is_a_target() {
        let mut task = Cpt::new(CptConfig::default());
        let mut rng = StdRng::seed_from_u64(8);
        let mut targets = 0;
        for i in 0..1000 {
            let trial = task.next_trial(i, &[], &mut rng).unwrap();
            assert_eq!(trial.is_target(), trial.stimulus == 'X');
            assert_eq!(trial.timing.deadline_ms(), Some(1750));
            assert!(!trial.timing.ends_on_response);
            targets += usize::from(trial.is_target());
        }
        assert!((120..=280).contains(&targets), "{targets}");
    }

    #[test]
    fn session_is_time_bounded() {
        let session = CptConfig::default().session();
        assert_eq!(session.session_limit_ms, Some(120_000));
        assert_eq!(session.max_trials, None);
    }
}
