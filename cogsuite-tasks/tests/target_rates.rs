//! Share of target trials against the configured rate.

use cogsuite_core::Trial;
use cogsuite_session::Task;
use cogsuite_tasks::{
    Cpt, CptConfig, Flanker, FlankerConfig, GoNoGo, GoNoGoConfig, NBack, NBackConfig,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

type TrialOf<K> = Trial<<K as Task>::Stimulus, <K as Task>::Response>;

/// Trials of one session after a fresh reset, at most `limit` of them.
fn session<K: Task>(task: &mut K, seed: u64, limit: usize) -> Vec<TrialOf<K>> {
    let mut rng = StdRng::seed_from_u64(seed);
    task.reset(&mut rng);
    (0..limit)
        .map_while(|i| task.next_trial(i, &[], &mut rng))
        .collect()
}

fn share(hits: usize, total: usize) -> f64 {
    hits as f64 / total.max(1) as f64
}

/// Match share over the trials where a match was possible at all.
fn nback_rate(config: NBackConfig, seeds: impl Iterator<Item = u64>) -> f64 {
    let n = config.n;
    let mut task = NBack::new(config);
    let (mut matches, mut eligible) = (0, 0);
    for seed in seeds {
        for trial in session(&mut task, seed, usize::MAX).into_iter().skip(n) {
            eligible += 1;
            matches += usize::from(trial.is_target());
        }
    }
    share(matches, eligible)
}

fn go_rate(config: GoNoGoConfig, seeds: impl Iterator<Item = u64>) -> f64 {
    let mut task = GoNoGo::new(config);
    let (mut go, mut total) = (0, 0);
    for seed in seeds {
        let trials = session(&mut task, seed, usize::MAX);
        total += trials.len();
        go += trials.iter().filter(|t| t.is_target()).count();
    }
    share(go, total)
}

fn cpt_rate(config: CptConfig, seed: u64, trials: usize) -> f64 {
    let target = config.target;
    let mut task = Cpt::new(config);
    let trials = session(&mut task, seed, trials);
    assert!(trials.iter().all(|t| t.is_target() == (t.stimulus == target)));
    share(trials.iter().filter(|t| t.is_target()).count(), trials.len())
}

fn congruent_rate(config: FlankerConfig, seed: u64, trials: usize) -> f64 {
    let mut task = Flanker::new(config);
    let trials = session(&mut task, seed, trials);
    share(
        trials.iter().filter(|t| t.stimulus.is_congruent()).count(),
        trials.len(),
    )
}

#[test]
fn default_rates_hold_over_many_sessions() {
    let nback = nback_rate(NBackConfig::default(), 0..200);
    assert!((nback - 0.3).abs() < 0.04, "n-back match share {nback}");

    let go = go_rate(GoNoGoConfig::default(), 0..200);
    assert!((go - 0.8).abs() < 0.03, "go share {go}");

    let cpt = cpt_rate(CptConfig::default(), 200, 5000);
    assert!((cpt - 0.2).abs() < 0.03, "cpt target share {cpt}");

    let congruent = congruent_rate(FlankerConfig::default(), 200, 5000);
    assert!((congruent - 0.6).abs() < 0.03, "congruent share {congruent}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn nback_match_share_follows_config(p in 0.1..0.6f64, seed in any::<u64>()) {
        let config = NBackConfig {
            rounds: 100,
            match_probability: p,
            ..NBackConfig::default()
        };
        let rate = nback_rate(config, (0..40).map(|i| seed.wrapping_add(i)));
        prop_assert!((rate - p).abs() < 0.06, "share {} for p {}", rate, p);
    }

    #[test]
    fn go_share_follows_config(p in 0.1..0.9f64, seed in any::<u64>()) {
        let config = GoNoGoConfig {
            trials: 4000,
            go_probability: p,
            ..GoNoGoConfig::default()
        };
        let rate = go_rate(config, std::iter::once(seed));
        prop_assert!((rate - p).abs() < 0.05, "share {} for p {}", rate, p);
    }

    #[test]
    fn cpt_target_share_follows_config(p in 0.1..0.9f64, seed in any::<u64>()) {
        let config = CptConfig {
            target_probability: p,
            ..CptConfig::default()
        };
        let rate = cpt_rate(config, seed, 4000);
        prop_assert!((rate - p).abs() < 0.05, "share {} for p {}", rate, p);
    }

    #[test]
    fn flanker_congruent_share_follows_config(p in 0.1..0.9f64, seed in any::<u64>()) {
        let config = FlankerConfig {
            congruent_probability: p,
            ..FlankerConfig::default()
        };
        let rate = congruent_rate(config, seed, 4000);
        prop_assert!((rate - p).abs() < 0.05, "share {} for p {}", rate, p);
    }
}
