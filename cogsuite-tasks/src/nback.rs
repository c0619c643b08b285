//! N-back: a stream of characters at a fixed pace, press when the current
//! one matches the one `n` steps earlier. With `n = 0` a match is any
//! character seen before in the session.

use cogsuite_core::{ConfigError, Outcome, ResponseMode, Trial, TrialTiming};
use cogsuite_session::{Record, Scored, SessionStats, Task, percent};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::Press;

const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const HANZI: &str = "日月山水火木金土天人中大小多上下左右前后红白蓝绿";

/// Draws before a non-match gives up on avoiding accidental matches.
const MAX_DRAWS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Charset {
    Letters,
    Hanzi,
}

impl Charset {
    pub fn chars(self) -> Vec<char> {
        match self {
            Charset::Letters => LETTERS.chars().collect(),
            Charset::Hanzi => HANZI.chars().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NBackConfig {
    pub n: usize,
    pub rounds: usize,
    /// Time each character stays up; also the trial length.
    pub speed_ms: u64,
    pub match_probability: f64,
    pub charset: Charset,
}

impl Default for NBackConfig {
    fn default() -> Self {
        Self {
            n: 2,
            rounds: 20,
            speed_ms: 2000,
            match_probability: 0.3,
            charset: Charset::Letters,
        }
    }
}

impl NBackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(5..=100).contains(&self.rounds) {
            return Err(ConfigError::Invalid(format!(
                "n-back rounds {} outside 5..=100",
                self.rounds
            )));
        }
        if self.speed_ms == 0 {
            return Err(ConfigError::Invalid("n-back speed must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NBackSummary {
    pub stats: SessionStats,
    pub n: usize,
    /// hits / (hits + misses + false alarms + premature presses), in percent.
    pub accuracy_pct: f64,
}

pub struct NBack {
    config: NBackConfig,
    alphabet: Vec<char>,
    sequence: Vec<char>,
}

impl NBack {
    pub fn new(config: NBackConfig) -> Self {
        let alphabet = config.charset.chars();
        Self {
            config,
            alphabet,
            sequence: Vec::new(),
        }
    }

    pub fn sequence(&self) -> &[char] {
        &self.sequence
    }

    /// Whether `c`, appended after `earlier`, is a match.
    fn is_match(&self, earlier: &[char], c: char) -> bool {
        let n = self.config.n;
        if n == 0 {
            earlier.contains(&c)
        } else {
            earlier.len() >= n && earlier[earlier.len() - n] == c
        }
    }

    fn accidental(&self, c: char) -> bool {
        let n = self.config.n;
        let seq = &self.sequence;
        if n == 0 {
            return seq.contains(&c);
        }
        if self.is_match(seq, c) || seq.last() == Some(&c) {
            return true;
        }
        let recent = seq.len().saturating_sub(10usize.max(3 * n));
        seq[recent..].iter().filter(|&&s| s == c).count() >= 2
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        let n = self.config.n;
        let seq = &self.sequence;
        let can_match = seq.len() >= n.max(1);
        if can_match && rng.random_bool(self.config.match_probability) {
            let picked = if n == 0 { seq.choose(rng) } else { seq.get(seq.len() - n) };
            if let Some(&c) = picked {
                return c;
            }
        }
        let mut c = 'A';
        for _ in 0..MAX_DRAWS {
            c = *self.alphabet.choose(rng).unwrap_or(&'A');
            if !self.accidental(c) {
                break;
            }
        }
        c
    }
}

impl Task for NBack {
    type Stimulus = char;
    type Response = Press;
    type Summary = NBackSummary;

    fn name(&self) -> &'static str {
        "nback"
    }

    fn mode(&self) -> ResponseMode {
        ResponseMode::Detection
    }

    fn reset<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
        self.sequence.clear();
    }

    fn next_trial<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        _history: &[Record<Self>],
        rng: &mut R,
    ) -> Option<Trial<char, Press>> {
        if index >= self.config.rounds {
            return None;
        }
        let c = self.draw(rng);
        let expected = if self.is_match(&self.sequence, c) {
            vec![Press]
        } else {
            vec![]
        };
        self.sequence.push(c);
        let timing = TrialTiming::timed(self.config.speed_ms, 0, 0).fixed_pace();
        Some(Trial::new(index, c, expected, timing))
    }

    fn score(&mut self, trial: &Trial<char, Press>, response: Option<&Press>) -> Scored {
        if response.is_some() && trial.index < self.config.n {
            return Scored::new(Outcome::TooEarly, 0);
        }
        match trial.classify(response, self.mode()) {
            Outcome::Hit => Scored::new(Outcome::Hit, 10),
            Outcome::FalseAlarm => Scored::new(Outcome::FalseAlarm, -5),
            other => Scored::new(other, 0),
        }
    }

    fn summarize(&self, records: &[Record<Self>]) -> NBackSummary {
        let stats = SessionStats::from_records(records);
        let answered = stats.hits + stats.misses + stats.false_alarms + stats.too_early;
        NBackSummary {
            accuracy_pct: percent(stats.hits, answered),
            n: self.config.n,
            stats,
        }
    }
}
