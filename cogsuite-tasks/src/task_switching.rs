//! Task switching: classify a digit by parity or by magnitude, with the rule
//! changing unpredictably from trial to trial.

use cogsuite_core::{ConfigError, ResponseMode, Stimulus, Trial, TrialTiming};
use cogsuite_session::{Record, SessionStats, Task, mean, percent, switch_cost};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

pub const NUMBERS: [u8; 8] = [1, 2, 3, 4, 6, 7, 8, 9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    Parity,
    Magnitude,
}

impl Rule {
    pub fn other(self) -> Self {
        match self {
            Rule::Parity => Rule::Magnitude,
            Rule::Magnitude => Rule::Parity,
        }
    }

    /// Odd and low numbers go left.
    pub fn answer(self, number: u8) -> Hand {
        let left = match self {
            Rule::Parity => number % 2 == 1,
            Rule::Magnitude => number < 5,
        };
        if left { Hand::Left } else { Hand::Right }
    }
}

/// Left key ("A") or right key ("L").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cue {
    pub rule: Rule,
    pub number: u8,
    /// Rule differs from the previous trial's. Never set on the first trial.
    pub switch: bool,
}

impl Stimulus for Cue {
    fn describe(&self) -> String {
        format!("{:?} {}{}", self.rule, self.number, if self.switch { " (switch)" } else { "" })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSwitchingConfig {
    pub trials: usize,
    pub switch_probability: f64,
    pub isi_ms: u64,
}

impl Default for TaskSwitchingConfig {
    fn default() -> Self {
        Self {
            trials: 40,
            switch_probability: 0.5,
            isi_ms: 400,
        }
    }
}

impl TaskSwitchingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::Invalid("task switching needs at least one trial".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSwitchingSummary {
    pub stats: SessionStats,
    /// Correct answers over all planned trials.
    pub accuracy_pct: f64,
    pub mean_rt_ms: Option<f64>,
    /// Mean correct switch RT minus mean correct repeat RT.
    pub switch_cost_ms: Option<f64>,
}

pub struct TaskSwitching {
    config: TaskSwitchingConfig,
    plan: Vec<Cue>,
}

impl TaskSwitching {
    pub fn new(config: TaskSwitchingConfig) -> Self {
        Self {
            config,
            plan: Vec::new(),
        }
    }

    pub fn plan(&self) -> &[Cue] {
        &self.plan
    }
}

impl Task for TaskSwitching {
    type Stimulus = Cue;
    type Response = Hand;
    type Summary = TaskSwitchingSummary;

    fn name(&self) -> &'static str {
        "task_switching"
    }

    fn mode(&self) -> ResponseMode {
        ResponseMode::Choice
    }

    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut previous = if rng.random_bool(0.5) {
            Rule::Parity
        } else {
            Rule::Magnitude
        };
        self.plan = (0..self.config.trials)
            .map(|i| {
                let switched = rng.random_bool(self.config.switch_probability);
                let rule = if switched { previous.other() } else { previous };
                let cue = Cue {
                    rule,
                    number: *NUMBERS.choose(rng).unwrap_or(&1),
                    switch: i > 0 && rule != previous,
                };
                previous = rule;
                cue
            })
            .collect();
    }

    fn next_trial<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        _history: &[Record<Self>],
        _rng: &mut R,
    ) -> Option<Trial<Cue, Hand>> {
        let cue = *self.plan.get(index)?;
        let expected = vec![cue.rule.answer(cue.number)];
        Some(Trial::new(index, cue, expected, TrialTiming::self_paced(self.config.isi_ms)))
    }

    fn summarize(&self, records: &[Record<Self>]) -> TaskSwitchingSummary {
        let stats = SessionStats::from_records(records);
        let correct: Vec<_> = records.iter().filter(|r| r.correct()).collect();
        let rts = |switch: bool| -> Vec<f64> {
            correct
                .iter()
                .filter(|r| r.trial_id > 0 && r.stimulus.switch == switch)
                .filter_map(|r| r.reaction_ms())
                .collect()
        };
        TaskSwitchingSummary {
            accuracy_pct: percent(correct.len(), self.config.trials),
            mean_rt_ms: mean(correct.iter().filter_map(|r| r.reaction_ms())),
            switch_cost_ms: switch_cost(&rts(true), &rts(false)),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogsuite_core::{Outcome, ResponseRecord};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn answers_follow_the_rule() {
        assert_eq!(Rule::Parity.answer(7), Hand::Left);
        assert_eq!(Rule::Parity.answer(8), Hand::Right);
        assert_eq!(Rule::Magnitude.answer(4), Hand::Left);
        assert_eq!(Rule::Magnitude.answer(6), Hand::Right);
    }

    #[test]
    fn first_trial_is_never_a_switch() {
        for seed in 0..30 {
            let mut task = TaskSwitching::new(TaskSwitchingConfig::default());
            task.reset(&mut StdRng::seed_from_u64(seed));
            let plan = task.plan();
            assert_eq!(plan.len(), 40);
            assert!(!plan[0].switch);
            for pair in plan.windows(2) {
                assert_eq!(pair[1].switch, pair[0].rule != pair[1].rule);
            }
            assert!(plan.iter().all(|c| NUMBERS.contains(&c.number)));
        }
    }

    #[test]
    fn switch_cost_uses_correct_non_first_trials() {
        let rec = |id, switch, outcome, rt: u64| ResponseRecord {
            trial_id: id,
            stimulus: Cue {
                rule: Rule::Parity,
                number: 3,
                switch,
            },
            response: Some(Hand::Left),
            reaction_time_ns: Some(rt * 1_000_000),
            outcome,
            score_delta: 0,
            timestamp_ns: 0,
        };
        let records = vec![
            rec(0, false, Outcome::Hit, 2000),
            rec(1, true, Outcome::Hit, 900),
            rec(2, false, Outcome::Hit, 600),
            rec(3, true, Outcome::Incorrect, 100),
        ];
        let mut config = TaskSwitchingConfig::default();
        config.trials = 4;
        let summary = TaskSwitching::new(config).summarize(&records);
        assert_eq!(summary.switch_cost_ms, Some(300.0));
        assert_eq!(summary.accuracy_pct, 75.0);
    }
}
