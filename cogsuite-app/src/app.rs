use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use cogsuite_core::{Outcome, SessionPhase};
use cogsuite_geometry::{Layout, PartitionConfig, PartitionReport, Point};
use cogsuite_render::{Renderer as _, SkiaRenderer};
use cogsuite_session::{SessionConfig, TrialEngine, load_json};
use cogsuite_tasks::search::{CellState, Click, SearchBoard, SearchResult};
use cogsuite_tasks::{
    Cpt, Flanker, GoNoGo, MatrixReasoning, MentalRotation, NBack, SequenceRecall, TasksConfig,
    TaskSwitching,
};
use cogsuite_timing::{Clock, HighPrecisionClock, LatenessStats, VirtualClock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::participant::{Participant, Scripted};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskName {
    DigitSpan,
    Corsi,
    Nback,
    GoNoGo,
    TaskSwitching,
    MentalRotation,
    Cpt,
    Flanker,
    Matrix,
    Search,
}

/// Where time comes from while a session runs.
pub trait Pacing: Clock {
    /// Called after waking for a timer due at `due_ns`.
    fn woke(&mut self, _due_ns: u64) {}

    fn lateness(&self) -> Option<LatenessStats> {
        None
    }
}

impl Pacing for VirtualClock {}

impl Pacing for HighPrecisionClock {
    fn woke(&mut self, due_ns: u64) {
        let late = self.now().saturating_sub(due_ns);
        self.record_lateness(Duration::from_nanos(late));
    }

    fn lateness(&self) -> Option<LatenessStats> {
        Some(self.lateness_stats())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport<S> {
    pub task: &'static str,
    pub phase: SessionPhase,
    pub score: i64,
    pub trials: usize,
    pub summary: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lateness: Option<LatenessStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutReport {
    pub kind: String,
    pub cells: usize,
    pub effective_count: usize,
    pub font_px: f64,
    pub partition: PartitionReport,
}

/// Options of one scripted run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub seed: u64,
    pub accuracy: f64,
    pub mean_rt_ms: u64,
    pub realtime: bool,
}

pub struct App {
    tasks: TasksConfig,
}

impl App {
    pub fn new(config: Option<PathBuf>) -> Result<Self> {
        let tasks: TasksConfig = match config {
            Some(path) => load_json(&path)
                .with_context(|| format!("reading task config {}", path.display()))?,
            None => TasksConfig::default(),
        };
        tasks.validate()?;
        Ok(Self { tasks })
    }

    /// Builds a board, writes it as PNG and reports the partition outcome.
    pub fn layout(
        &self,
        width: f64,
        height: f64,
        count: usize,
        grid: Option<usize>,
        seed: u64,
        out: &Path,
    ) -> Result<LayoutReport> {
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = match grid {
            Some(k) => Layout::grid(width, height, k, &mut rng)?,
            None => Layout::shattered(width, height, count, &PartitionConfig::default(), &mut rng)?,
        };
        if layout.report.is_short() {
            warn!(
                requested = layout.report.requested,
                achieved = layout.report.achieved,
                "board has fewer cells than requested"
            );
        }
        let mut renderer = SkiaRenderer::for_layout(&layout)?;
        renderer.draw_layout(&layout, &|_| CellState::Idle);
        renderer.save_png(out)?;
        Ok(LayoutReport {
            kind: format!("{:?}", layout.kind),
            cells: layout.cells.len(),
            effective_count: layout.effective_count(),
            font_px: layout.font_px,
            partition: layout.report,
        })
    }

    /// Runs one task with the scripted participant and returns the report
    /// as JSON.
    pub fn run(&self, task: TaskName, opts: &RunOptions) -> Result<serde_json::Value> {
        let c = &self.tasks;
        let plain = SessionConfig::default();
        let value = match task {
            TaskName::DigitSpan => {
                to_json(session(SequenceRecall::new(c.digit_span.clone()), plain, opts)?)?
            }
            TaskName::Corsi => to_json(session(SequenceRecall::new(c.corsi.clone()), plain, opts)?)?,
            TaskName::Nback => to_json(session(NBack::new(c.nback.clone()), plain, opts)?)?,
            TaskName::GoNoGo => to_json(session(GoNoGo::new(c.go_no_go.clone()), plain, opts)?)?,
            TaskName::TaskSwitching => to_json(session(
                TaskSwitching::new(c.task_switching.clone()),
                plain,
                opts,
            )?)?,
            TaskName::MentalRotation => to_json(session(
                MentalRotation::new(c.mental_rotation.clone()),
                plain,
                opts,
            )?)?,
            TaskName::Cpt => to_json(session(Cpt::new(c.cpt.clone()), c.cpt.session(), opts)?)?,
            TaskName::Flanker => {
                to_json(session(Flanker::new(c.flanker.clone()), c.flanker.session(), opts)?)?
            }
            TaskName::Matrix => {
                to_json(session(MatrixReasoning::new(c.matrix.clone()), plain, opts)?)?
            }
            TaskName::Search => to_json(self.search(opts)?)?,
        };
        Ok(value)
    }

    /// Clears a search board in label order, clicking a wrong cell first
    /// whenever the participant errs.
    pub fn search(&self, opts: &RunOptions) -> Result<SearchResult> {
        let mut rng = StdRng::seed_from_u64(opts.seed);
        let mut board = SearchBoard::from_config(&self.tasks.search, &mut rng)?;
        let clock = VirtualClock::new();
        board.start(clock.now());

        while !board.is_finished() {
            clock.advance_ms(opts.mean_rt_ms.max(1));
            let target = board.layout().cell_for_label(board.target()).with_context(|| {
                format!("label {} has no cell", board.target())
            })?;
            let cells = board.layout().cells.len();
            if cells > 1 && !rng.random_bool(opts.accuracy.clamp(0.0, 1.0)) {
                let wrong = (target + rng.random_range(1..cells)) % cells;
                let anchor: Point = board.layout().cells[wrong].anchor;
                let click = board.click(&anchor, clock.now());
                debug!(?click, "scripted slip");
                clock.advance_ms(opts.mean_rt_ms.max(1));
            }
            let anchor: Point = board.layout().cells[target].anchor;
            match board.click(&anchor, clock.now()) {
                Click::Correct { .. } => {}
                other => bail!("click on the target cell was {other:?}"),
            }
        }
        board.result().context("board finished without a result")
    }
}

fn to_json<T: Serialize>(value: T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

fn session<K>(task: K, config: SessionConfig, opts: &RunOptions) -> Result<SessionReport<K::Summary>>
where
    K: Scripted,
{
    if opts.realtime {
        drive(task, config, HighPrecisionClock::new(), opts)
    } else {
        drive(task, config, VirtualClock::new(), opts)
    }
}

/// Runs `task` to the end, sleeping on `clock` between timers and scripted
/// responses.
pub fn drive<K, C>(
    task: K,
    config: SessionConfig,
    clock: C,
    opts: &RunOptions,
) -> Result<SessionReport<K::Summary>>
where
    K: Scripted,
    C: Pacing,
{
    config.validate()?;
    let mut engine = TrialEngine::new(task, config, clock, StdRng::seed_from_u64(opts.seed));
    let mut rng = StdRng::seed_from_u64(opts.seed.wrapping_add(1));
    let mut participant = Participant::new(opts.accuracy, opts.mean_rt_ms);
    engine.start()?;
    info!(task = engine.task().name(), realtime = opts.realtime, "session started");

    while !engine.phase().is_terminal() {
        let now = engine.clock().now();
        if engine.phase().allows_input() {
            if let Some(trial) = engine.current_trial() {
                participant.consider::<K, _>(trial, now, &mut rng);
            }
        }
        if let Some((trial, response)) = participant.take_due(now) {
            match engine.respond(response, now) {
                Ok(outcome) => debug!(trial, ?outcome, "scripted response"),
                Err(rejected) => debug!(trial, %rejected, "scripted response rejected"),
            }
            continue;
        }

        let next = match (engine.next_due(), participant.due_at()) {
            (Some(a), Some(b)) => a.min(b),
            (a, b) => match a.or(b) {
                Some(t) => t,
                None => {
                    warn!("nothing left to wait for, stopping session");
                    engine.stop()?;
                    break;
                }
            },
        };
        engine.clock().sleep_until(next);
        engine.clock_mut().woke(next);
        engine.tick();
    }

    let records = engine.records();
    let hits = records.iter().filter(|r| r.outcome == Outcome::Hit).count();
    info!(
        task = engine.task().name(),
        trials = records.len(),
        hits,
        score = engine.score(),
        "session finished"
    );
    Ok(SessionReport {
        task: engine.task().name(),
        phase: engine.phase(),
        score: engine.score(),
        trials: records.len(),
        summary: engine.summary().cloned(),
        lateness: engine.clock().lateness(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogsuite_tasks::GoNoGoConfig;

    fn opts(accuracy: f64) -> RunOptions {
        RunOptions {
            seed: 11,
            accuracy,
            mean_rt_ms: 450,
            realtime: false,
        }
    }

    #[test]
    fn perfect_go_no_go_scores_every_trial() {
        let report = drive(
            GoNoGo::new(GoNoGoConfig::default()),
            SessionConfig::default(),
            VirtualClock::new(),
            &opts(1.0),
        )
        .unwrap();
        assert_eq!(report.phase, SessionPhase::Completed);
        assert_eq!(report.trials, 50);
        assert_eq!(report.score, 50);
        let summary = report.summary.unwrap();
        assert_eq!(summary.go_accuracy_pct, 100.0);
        assert!(report.lateness.is_none());
    }

    #[test]
    fn every_task_runs_to_completion() {
        let app = App::new(None).unwrap();
        for task in TaskName::value_variants() {
            let report = app.run(*task, &opts(0.8)).unwrap();
            if *task != TaskName::Search {
                assert_eq!(report["phase"], "Completed", "{task:?}");
            }
        }
    }

    #[test]
    fn search_is_cleared_with_slips_counted() {
        let app = App::new(None).unwrap();
        let result = app.search(&opts(0.0)).unwrap();
        assert!(result.count > 1);
        assert_eq!(result.wrong_clicks, result.count);
    }

    #[test]
    fn layout_is_written_as_png() {
        let app = App::new(None).unwrap();
        let out = std::env::temp_dir().join("cogsuite-layout-test.png");
        let report = app.layout(400.0, 300.0, 12, None, 5, &out).unwrap();
        assert_eq!(report.partition.requested, 12);
        assert!(report.effective_count <= 12);
        assert!(std::fs::metadata(&out).unwrap().len() > 0);
        let _ = std::fs::remove_file(&out);
    }
}
