//! Whole sessions of individual tasks on the trial engine.

use cogsuite_core::{Outcome, RenderInstruction, RunningPhase, SessionPhase};
use cogsuite_session::{SessionConfig, Task, TrialEngine};
use cogsuite_tasks::sequence_recall::Sequence;
use cogsuite_tasks::{
    Cpt, CptConfig, NBack, NBackConfig, Press, SequenceRecall, SequenceRecallConfig,
};
use cogsuite_timing::{Clock, VirtualClock};
use rand::SeedableRng;
use rand::rngs::StdRng;

const MS: u64 = 1_000_000;

type Engine<K> = TrialEngine<K, VirtualClock, StdRng>;

fn engine<K: Task>(task: K, config: SessionConfig) -> (Engine<K>, VirtualClock) {
    let clock = VirtualClock::new();
    let engine = TrialEngine::new(task, config, clock.clone(), StdRng::seed_from_u64(17));
    (engine, clock)
}

/// Steps the clock until the recall window opens, then waits a plausible
/// reaction time.
fn await_window<K: Task>(engine: &mut Engine<K>, clock: &VirtualClock) {
    for _ in 0..1000 {
        if engine.phase() == SessionPhase::Running(RunningPhase::AwaitingResponse) {
            clock.advance_ms(600);
            engine.tick();
            return;
        }
        clock.advance_ms(100);
        engine.tick();
    }
    panic!("window never opened, phase {:?}", engine.phase());
}

fn run_out<K: Task>(engine: &mut Engine<K>, clock: &VirtualClock) {
    for _ in 0..1000 {
        if engine.phase().is_terminal() {
            return;
        }
        clock.advance_ms(100);
        engine.tick();
    }
    panic!("session never ended");
}

#[test]
fn span_grows_on_success_and_ends_after_two_failures() {
    let (mut engine, clock) = engine(
        SequenceRecall::new(SequenceRecallConfig::digits()),
        SessionConfig::default(),
    );
    engine.start().unwrap();

    await_window(&mut engine, &clock);
    let trial = engine.current_trial().unwrap();
    assert_eq!(trial.stimulus.len(), 3);
    let answer = trial.expected[0].clone();
    assert_eq!(engine.respond(answer, clock.now()), Ok(Outcome::Hit));
    assert_eq!(engine.score(), 30);
    assert_eq!(engine.task().span(), 4);

    for attempt in 0..2 {
        await_window(&mut engine, &clock);
        assert_eq!(engine.current_trial().unwrap().stimulus.len(), 4, "attempt {attempt}");
        assert_eq!(engine.respond(vec![], clock.now()), Ok(Outcome::Incorrect));
    }
    run_out(&mut engine, &clock);

    assert_eq!(engine.phase(), SessionPhase::Completed);
    let summary = engine.summary().unwrap();
    assert_eq!(summary.max_span, 3);
    assert_eq!(summary.stats.trials, 3);
    assert_eq!(engine.score(), 30);
}

#[test]
fn recall_frames_are_shown_one_by_one() {
    let (mut engine, clock) = engine(
        SequenceRecall::new(SequenceRecallConfig::digits()),
        SessionConfig::default(),
    );
    engine.start().unwrap();
    await_window(&mut engine, &clock);

    let shown: Vec<usize> = engine
        .drain_instructions()
        .into_iter()
        .filter_map(|i| match i {
            RenderInstruction::ShowStimulus { frame, .. } => Some(frame),
            _ => None,
        })
        .collect();
    assert_eq!(shown, vec![0, 1, 2]);
    let items: &Sequence = &engine.current_trial().unwrap().stimulus;
    assert!(items.item(2).is_some());
}

#[test]
fn nback_runs_at_a_fixed_pace() {
    let (mut engine, clock) = engine(NBack::new(NBackConfig::default()), SessionConfig::default());
    engine.start().unwrap();

    let mut seen: Option<(usize, u64)> = None;
    let mut pressed = Vec::new();
    for _ in 0..2000 {
        if engine.phase().is_terminal() {
            break;
        }
        clock.advance_ms(50);
        engine.tick();
        let Some(trial) = engine.current_trial() else {
            continue;
        };
        let (index, target) = (trial.index, trial.is_target());
        let onset = match seen {
            Some((i, at)) if i == index => at,
            _ => {
                seen = Some((index, clock.now()));
                clock.now()
            }
        };
        if target && !pressed.contains(&index) && clock.now() - onset >= 400 * MS {
            assert_eq!(engine.respond(Press, clock.now()), Ok(Outcome::Hit));
            pressed.push(index);
            // A response does not cut the item short.
            assert_eq!(engine.current_trial().map(|t| t.index), Some(index));
        }
    }

    assert_eq!(engine.phase(), SessionPhase::Completed);
    let records = engine.records();
    assert_eq!(records.len(), 20);
    assert!(records.iter().enumerate().all(|(i, r)| r.trial_id == i));
    let summary = engine.summary().unwrap();
    assert_eq!(summary.stats.hits, pressed.len());
    assert_eq!(summary.stats.misses, 0);
    assert_eq!(summary.stats.false_alarms, 0);
    assert_eq!(engine.score(), 10 * pressed.len() as i64);
}

#[test]
fn cpt_stops_at_the_time_limit() {
    let config = CptConfig::default();
    let session = config.session();
    let (mut engine, clock) = engine(Cpt::new(config), session);
    engine.start().unwrap();

    clock.set(120_000 * MS);
    engine.tick();

    assert_eq!(engine.phase(), SessionPhase::Completed);
    // Letters every 1750 ms; the one still running at the limit is dropped.
    assert_eq!(engine.records().len(), 68);
    let summary = engine.summary().unwrap();
    assert_eq!(summary.hits, 0);
    assert_eq!(summary.false_alarms, 0);
    assert_eq!(summary.misses + summary.stats.correct_rejections, 68);
}
