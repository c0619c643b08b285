//! Mental rotation: two copies of a glyph at different angles, possibly one
//! mirrored. Reaction time should grow with the angular disparity.

use cogsuite_core::{ConfigError, ResponseMode, Stimulus, Trial, TrialTiming};
use cogsuite_session::{Record, SessionStats, Task, mean, ols_slope, percent};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

pub const GLYPHS: [char; 10] = ['F', 'R', 'G', 'L', 'P', '4', '7', 'J', 'S', 'k'];
pub const DISPARITIES: [u16; 5] = [0, 45, 90, 135, 180];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Judgement {
    Same,
    Different,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RotatedPair {
    pub glyph: char,
    /// Orientation of the reference copy, a multiple of 45 degrees.
    pub base_deg: u16,
    /// Orientation of the probe copy, in `0..360`.
    pub probe_deg: u16,
    pub disparity_deg: u16,
    /// The probe is the reference's mirror image.
    pub mirrored: bool,
}

impl RotatedPair {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let base_deg = rng.random_range(0..8u16) * 45;
        let disparity_deg = *DISPARITIES.choose(rng).unwrap_or(&0);
        let signed = if rng.random_bool(0.5) {
            i32::from(disparity_deg)
        } else {
            -i32::from(disparity_deg)
        };
        let probe_deg = (i32::from(base_deg) + signed).rem_euclid(360) as u16;
        Self {
            glyph: *GLYPHS.choose(rng).unwrap_or(&'F'),
            base_deg,
            probe_deg,
            disparity_deg,
            mirrored: rng.random_bool(0.5),
        }
    }

    pub fn answer(&self) -> Judgement {
        if self.mirrored {
            Judgement::Different
        } else {
            Judgement::Same
        }
    }
}

impl Stimulus for RotatedPair {
    fn describe(&self) -> String {
        format!(
            "{}@{} vs {}{}@{}",
            self.glyph,
            self.base_deg,
            if self.mirrored { "mirrored " } else { "" },
            self.glyph,
            self.probe_deg
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentalRotationConfig {
    pub rounds: usize,
    pub isi_ms: u64,
}

impl Default for MentalRotationConfig {
    fn default() -> Self {
        Self {
            rounds: 20,
            isi_ms: 300,
        }
    }
}

impl MentalRotationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds == 0 {
            return Err(ConfigError::Invalid("mental rotation needs at least one round".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentalRotationSummary {
    pub stats: SessionStats,
    pub accuracy_pct: f64,
    pub mean_rt_ms: Option<f64>,
    /// Milliseconds per degree of disparity, fitted over correct trials.
    pub slope_ms_per_deg: f64,
}

pub struct MentalRotation {
    config: MentalRotationConfig,
}

impl MentalRotation {
    pub fn new(config: MentalRotationConfig) -> Self {
        Self { config }
    }
}

impl Task for MentalRotation {
    type Stimulus = RotatedPair;
    type Response = Judgement;
    type Summary = MentalRotationSummary;

    fn name(&self) -> &'static str {
        "mental_rotation"
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
    ) -> Option<Trial<RotatedPair, Judgement>> {
        if index >= self.config.rounds {
            return None;
        }
        let pair = RotatedPair::random(rng);
        let expected = vec![pair.answer()];
        Some(Trial::new(index, pair, expected, TrialTiming::self_paced(self.config.isi_ms)))
    }

    fn summarize(&self, records: &[Record<Self>]) -> MentalRotationSummary {
        let stats = SessionStats::from_records(records);
        let points: Vec<(f64, f64)> = records
            .iter()
            .filter(|r| r.correct())
            .filter_map(|r| Some((f64::from(r.stimulus.disparity_deg), r.reaction_ms()?)))
            .collect();
        MentalRotationSummary {
            accuracy_pct: percent(stats.correct(), self.config.rounds),
            mean_rt_ms: mean(points.iter().map(|p| p.1)),
            slope_ms_per_deg: ols_slope(&points),
            stats,
        }
    }
}
