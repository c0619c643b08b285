//! End-of-session aggregation helpers.

use cogsuite_core::{Outcome, ResponseRecord};
use serde::Serialize;

/// Counts and timing shared by every task summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub trials: usize,
    pub hits: usize,
    pub misses: usize,
    pub false_alarms: usize,
    pub correct_rejections: usize,
    pub timeouts: usize,
    pub too_early: usize,
    pub incorrect: usize,
    pub score: i64,
    /// Correct trials as a percentage of all trials.
    pub accuracy_pct: f64,
    /// Mean reaction time over correct responses only.
    pub mean_rt_ms: Option<f64>,
}

impl SessionStats {
    pub fn from_records<S, A>(records: &[ResponseRecord<S, A>]) -> Self {
        let mut stats = Self {
            trials: records.len(),
            ..Self::default()
        };
        for r in records {
            stats.score += r.score_delta;
            match r.outcome {
                Outcome::Hit => stats.hits += 1,
                Outcome::Miss => stats.misses += 1,
                Outcome::FalseAlarm => stats.false_alarms += 1,
                Outcome::CorrectRejection => stats.correct_rejections += 1,
                Outcome::Timeout => stats.timeouts += 1,
                Outcome::TooEarly => stats.too_early += 1,
                Outcome::Incorrect => stats.incorrect += 1,
            }
        }
        stats.accuracy_pct = percent(stats.correct(), stats.trials);
        stats.mean_rt_ms = mean(
            records
                .iter()
                .filter(|r| r.correct())
                .filter_map(|r| r.reaction_ms()),
        );
        stats
    }

    pub fn correct(&self) -> usize {
        self.hits + self.correct_rejections
    }
}

/// `part / whole` as a percentage, zero for an empty whole.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Least-squares slope of `y` against `x`. Fewer than two points, or no
/// spread in `x`, gives 0.
pub fn ols_slope(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), (x, y)| {
        (num + (x - mean_x) * (y - mean_y), den + (x - mean_x).powi(2))
    });
    if den == 0.0 { 0.0 } else { num / den }
}

/// Mean switch RT minus mean repeat RT, when both exist.
pub fn switch_cost(switch_rts: &[f64], repeat_rts: &[f64]) -> Option<f64> {
    Some(mean(switch_rts.iter().copied())? - mean(repeat_rts.iter().copied())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(outcome: Outcome, rt_ms: Option<u64>, delta: i64) -> ResponseRecord<u8, u8> {
        ResponseRecord {
            trial_id: 0,
            stimulus: 0,
            response: None,
            reaction_time_ns: rt_ms.map(|ms| ms * 1_000_000),
            outcome,
            score_delta: delta,
            timestamp_ns: 0,
        }
    }

    #[test]
    fn mean_rt_uses_correct_trials_only() {
        let records = vec![
            record(Outcome::Hit, Some(300), 10),
            record(Outcome::Hit, Some(500), 10),
            record(Outcome::FalseAlarm, Some(100), -5),
            record(Outcome::Miss, None, 0),
        ];
        let stats = SessionStats::from_records(&records);
        assert_eq!(stats.trials, 4);
        assert_eq!(stats.correct(), 2);
        assert_eq!(stats.accuracy_pct, 50.0);
        assert_eq!(stats.mean_rt_ms, Some(400.0));
        assert_eq!(stats.score, 15);
    }

    #[test]
    fn slope_needs_two_points() {
        assert_eq!(ols_slope(&[]), 0.0);
        assert_eq!(ols_slope(&[(45.0, 900.0)]), 0.0);
        assert_eq!(ols_slope(&[(90.0, 1.0), (90.0, 2.0)]), 0.0);
        let slope = ols_slope(&[(0.0, 500.0), (90.0, 800.0), (180.0, 1100.0)]);
        assert!((slope - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn switch_cost_requires_both_kinds() {
        assert_eq!(switch_cost(&[700.0, 900.0], &[600.0]), Some(200.0));
        assert_eq!(switch_cost(&[], &[600.0]), None);
    }
}
