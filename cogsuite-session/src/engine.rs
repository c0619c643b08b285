use std::mem;
use std::time::Duration;

use cogsuite_core::{
    InputRejected, Outcome, RenderInstruction, ResponseRecord, RunningPhase, SessionError,
    SessionPhase, Stimulus, Trial,
};
use cogsuite_timing::{Clock, Fired, Generation, Scheduler};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::task::{Record, Scored, Task};

/// What a scheduled timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    BeginTrial,
    FrameOn(usize),
    FrameOff(usize),
    OpenWindow,
    Deadline,
    ClearFeedback,
    SessionTimeUp,
}

/// A timer payload: the cue and the trial it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Due {
    pub trial: usize,
    pub cue: Cue,
}

struct LiveTrial<S, A> {
    index: usize,
    trial: Trial<S, A>,
    visible_frame: Option<usize>,
    window_opened_ns: Option<u64>,
    deadline_ns: Option<u64>,
    responded: bool,
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Drives one task through `Idle -> Running -> (Stopped | Completed)`.
///
/// Nothing here sleeps: timers are queued on a [`Scheduler`] and fired by
/// [`TrialEngine::tick`]. Presentation is reported as [`RenderInstruction`]s
/// collected with [`TrialEngine::drain_instructions`].
pub struct TrialEngine<K, C, R>
where
    K: Task,
    C: Clock,
    R: Rng,
{
    task: K,
    clock: C,
    rng: R,
    config: SessionConfig,
    phase: SessionPhase,
    scheduler: Scheduler<Due>,
    live: Option<LiveTrial<K::Stimulus, K::Response>>,
    trial_index: usize,
    score: i64,
    records: Vec<Record<K>>,
    outbox: Vec<RenderInstruction<K::Stimulus>>,
    summary: Option<K::Summary>,
}

impl<K, C, R> TrialEngine<K, C, R>
where
    K: Task,
    C: Clock,
    R: Rng,
{
    pub fn new(task: K, config: SessionConfig, clock: C, rng: R) -> Self {
        Self {
            task,
            clock,
            rng,
            config,
            phase: SessionPhase::Idle,
            scheduler: Scheduler::new(),
            live: None,
            trial_index: 0,
            score: 0,
            records: Vec::new(),
            outbox: Vec::new(),
            summary: None,
        }
    }

    /// Resets all counters and schedules the first trial.
    ///
    /// Calling this while a session is running leaves it untouched.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if !self.phase.can_start() {
            warn!(task = self.task.name(), "start ignored, session already running");
            return Err(SessionError::AlreadyRunning);
        }

        self.task.reset(&mut self.rng);
        self.records.clear();
        self.outbox.clear();
        self.live = None;
        self.summary = None;
        self.trial_index = 0;
        self.score = 0;
        self.scheduler.invalidate();

        let now = self.clock.now();
        self.phase = SessionPhase::Running(RunningPhase::Presenting);
        self.outbox.push(RenderInstruction::Clear);
        self.scheduler.schedule(
            now,
            self.config.start_delay(),
            Due {
                trial: 0,
                cue: Cue::BeginTrial,
            },
        );
        if let Some(limit) = self.config.session_limit_ms {
            self.scheduler.schedule(
                now,
                ms(limit),
                Due {
                    trial: 0,
                    cue: Cue::SessionTimeUp,
                },
            );
        }
        info!(task = self.task.name(), generation = ?self.scheduler.generation(), "session started");
        Ok(())
    }

    /// Abandons the session. Pending timers are dropped and any that were
    /// already handed out become no-ops. No summary is produced.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        if !self.phase.is_running() {
            return Err(SessionError::NotRunning);
        }
        self.scheduler.invalidate();
        self.phase = SessionPhase::Stopped;
        self.live = None;
        self.outbox.push(RenderInstruction::Clear);
        self.outbox.push(RenderInstruction::SessionEnded { completed: false });
        info!(task = self.task.name(), trials = self.records.len(), "session stopped");
        Ok(())
    }

    /// Fires every timer that is due at the clock's current time, in order.
    /// Returns how many fired.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some(event) = self.scheduler.pop_due(now) {
            self.on_timer(event);
            fired += 1;
        }
        fired
    }

    /// Handles one fired timer. Timers from an earlier generation, or for a
    /// trial that already ended, change nothing.
    pub fn on_timer(&mut self, fired: Fired<Due>) {
        if !self.scheduler.is_current(&fired) || !self.phase.is_running() {
            warn!(due_ns = fired.due_ns, cue = ?fired.event.cue, "ignoring stale timer");
            return;
        }
        let Due { trial, cue } = fired.event;
        let at = fired.due_ns;
        let is_live = self.live.as_ref().is_some_and(|l| l.index == trial);

        match cue {
            Cue::SessionTimeUp => {
                info!(task = self.task.name(), "session time limit reached");
                self.complete();
            }
            Cue::BeginTrial if trial == self.trial_index && self.live.is_none() => {
                self.begin_trial(at)
            }
            Cue::ClearFeedback => self.outbox.push(RenderInstruction::ClearFeedback { trial }),
            Cue::FrameOn(frame) if is_live => self.frame_on(frame, at),
            Cue::FrameOff(frame) if is_live => self.frame_off(frame, at),
            Cue::OpenWindow if is_live => self.open_window(at),
            Cue::Deadline if is_live => self.deadline(at),
            _ => debug!(trial, ?cue, "timer outlived its trial"),
        }
    }

    /// Delivers a normalized response taken at `timestamp_ns` (clock time).
    pub fn respond(
        &mut self,
        value: K::Response,
        timestamp_ns: u64,
    ) -> Result<Outcome, InputRejected> {
        if !self.phase.is_running() {
            return Err(InputRejected::NotRunning);
        }
        let Some(live) = self.live.as_ref() else {
            return Err(InputRejected::WindowClosed);
        };
        if live.responded {
            debug!(trial = live.index, "duplicate response ignored");
            return Err(InputRejected::AlreadyResponded);
        }
        if !self.phase.allows_input() {
            return Err(InputRejected::WindowClosed);
        }
        if let Some(deadline) = live.deadline_ns {
            if timestamp_ns >= deadline {
                self.finish_unanswered(deadline);
                return Err(InputRejected::AfterDeadline);
            }
        }

        let opened = live.window_opened_ns.unwrap_or(timestamp_ns);
        let rt_ns = timestamp_ns.saturating_sub(opened);
        if rt_ns < self.config.min_reaction_ns() {
            debug!(trial = live.index, rt_ns, "response below plausible latency");
            return Err(InputRejected::TooEarly {
                reaction_ms: rt_ns / 1_000_000,
            });
        }

        let scored = self.task.score(&live.trial, Some(&value));
        let ends_trial = live.trial.timing.ends_on_response;
        let outcome = self.record(Some(value), Some(rt_ns), scored, timestamp_ns);
        if let Some(live) = self.live.as_mut() {
            live.responded = true;
            if let Some(isi) = scored.isi_ms {
                live.trial.timing.isi_ms = isi;
            }
        }
        if ends_trial {
            self.end_trial(timestamp_ns);
        }
        Ok(outcome)
    }

    fn begin_trial(&mut self, at: u64) {
        let index = self.trial_index;
        if self.config.max_trials.is_some_and(|max| index >= max) {
            self.complete();
            return;
        }
        let Some(trial) = self.task.next_trial(index, &self.records, &mut self.rng) else {
            self.complete();
            return;
        };

        debug!(trial = index, stimulus = %trial.stimulus.describe(), "trial begins");
        self.phase = SessionPhase::Running(RunningPhase::Presenting);
        let lead_in = trial.timing.lead_in_ms;
        if lead_in > 0 {
            self.outbox.push(RenderInstruction::Ready { trial: index });
        }
        self.scheduler.schedule(
            at,
            ms(lead_in),
            Due {
                trial: index,
                cue: Cue::FrameOn(0),
            },
        );
        self.live = Some(LiveTrial {
            index,
            trial,
            visible_frame: None,
            window_opened_ns: None,
            deadline_ns: None,
            responded: false,
        });
    }

    fn frame_on(&mut self, frame: usize, at: u64) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        live.visible_frame = Some(frame);
        let (index, timing) = (live.index, live.trial.timing);
        self.outbox.push(RenderInstruction::ShowStimulus {
            trial: index,
            frame,
            stimulus: live.trial.stimulus.clone(),
        });

        if frame == 0 && timing.opens_at_onset() {
            self.open_window(at);
        }
        match timing.stimulus_ms {
            Some(shown) => self.scheduler.schedule(
                at,
                ms(shown),
                Due {
                    trial: index,
                    cue: Cue::FrameOff(frame),
                },
            ),
            None if !timing.opens_at_onset() => self.scheduler.schedule(
                at,
                ms(timing.recall_delay_ms),
                Due {
                    trial: index,
                    cue: Cue::OpenWindow,
                },
            ),
            None => {}
        }
    }

    fn frame_off(&mut self, frame: usize, at: u64) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        live.visible_frame = None;
        let (index, timing) = (live.index, live.trial.timing);
        self.outbox
            .push(RenderInstruction::HideStimulus { trial: index, frame });

        let (delay, cue) = if frame + 1 < timing.frames {
            (timing.frame_gap_ms, Cue::FrameOn(frame + 1))
        } else if !timing.opens_at_onset() {
            (timing.recall_delay_ms, Cue::OpenWindow)
        } else {
            return;
        };
        self.scheduler.schedule(at, ms(delay), Due { trial: index, cue });
    }

    fn open_window(&mut self, at: u64) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        live.window_opened_ns = Some(at);
        live.deadline_ns = live
            .trial
            .timing
            .deadline_ms()
            .map(|d| at.saturating_add(d * 1_000_000));
        let (index, deadline, prompt) = (
            live.index,
            live.deadline_ns,
            !live.trial.timing.opens_at_onset(),
        );

        self.phase = SessionPhase::Running(RunningPhase::AwaitingResponse);
        if prompt {
            self.outbox.push(RenderInstruction::PromptResponse { trial: index });
        }
        if let Some(deadline) = deadline {
            self.scheduler.schedule_at(
                deadline,
                Due {
                    trial: index,
                    cue: Cue::Deadline,
                },
            );
        }
        debug!(trial = index, ?deadline, "response window open");
    }

    fn deadline(&mut self, at: u64) {
        match self.live.as_ref() {
            Some(live) if live.responded => self.end_trial(at),
            Some(_) => self.finish_unanswered(at),
            None => {}
        }
    }

    /// Scores the live trial as unanswered and moves on.
    fn finish_unanswered(&mut self, at: u64) {
        let Some(live) = self.live.as_ref() else {
            return;
        };
        let scored = self.task.score(&live.trial, None);
        self.record(None, None, scored, at);
        if let (Some(live), Some(isi)) = (self.live.as_mut(), scored.isi_ms) {
            live.trial.timing.isi_ms = isi;
        }
        self.end_trial(at);
    }

    fn record(
        &mut self,
        response: Option<K::Response>,
        rt_ns: Option<u64>,
        scored: Scored,
        at: u64,
    ) -> Outcome {
        let Some(live) = self.live.as_ref() else {
            return scored.outcome;
        };
        let index = live.index;
        let record = ResponseRecord {
            trial_id: index,
            stimulus: live.trial.stimulus.clone(),
            response,
            reaction_time_ns: rt_ns,
            outcome: scored.outcome,
            score_delta: scored.delta,
            timestamp_ns: at,
        };
        debug!(trial = index, outcome = ?scored.outcome, rt_ns = ?rt_ns, delta = scored.delta, "trial scored");

        self.score += scored.delta;
        self.task.observe(&record);
        self.records.push(record);

        if scored.outcome != Outcome::CorrectRejection {
            self.outbox.push(RenderInstruction::Feedback {
                trial: index,
                outcome: scored.outcome,
            });
            self.scheduler.schedule(
                at,
                self.config.feedback(),
                Due {
                    trial: index,
                    cue: Cue::ClearFeedback,
                },
            );
        }
        scored.outcome
    }

    fn end_trial(&mut self, at: u64) {
        let Some(live) = self.live.take() else {
            return;
        };
        if let Some(frame) = live.visible_frame {
            self.outbox.push(RenderInstruction::HideStimulus {
                trial: live.index,
                frame,
            });
        }
        self.trial_index = live.index + 1;
        self.phase = SessionPhase::Running(RunningPhase::InterTrialInterval);
        self.scheduler.schedule(
            at,
            ms(live.trial.timing.isi_ms),
            Due {
                trial: self.trial_index,
                cue: Cue::BeginTrial,
            },
        );
    }

    fn complete(&mut self) {
        if let Some(live) = self.live.take() {
            debug!(trial = live.index, "unfinished trial dropped at completion");
        }
        self.scheduler.invalidate();
        self.phase = SessionPhase::Completed;
        self.summary = Some(self.task.summarize(&self.records));
        self.outbox
            .push(RenderInstruction::SessionEnded { completed: true });
        info!(
            task = self.task.name(),
            trials = self.records.len(),
            score = self.score,
            "session completed"
        );
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn records(&self) -> &[Record<K>] {
        &self.records
    }

    /// Final statistics; only set once the session completed.
    pub fn summary(&self) -> Option<&K::Summary> {
        self.summary.as_ref()
    }

    /// Index of the live trial, or of the next one during a pause.
    pub fn trial_index(&self) -> usize {
        self.trial_index
    }

    /// The trial currently on screen or awaiting a response.
    pub fn current_trial(&self) -> Option<&Trial<K::Stimulus, K::Response>> {
        self.live.as_ref().map(|l| &l.trial)
    }

    pub fn task(&self) -> &K {
        &self.task
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn generation(&self) -> Generation {
        self.scheduler.generation()
    }

    /// When the next timer is due, so a real-time host can sleep until then.
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    pub fn drain_instructions(&mut self) -> Vec<RenderInstruction<K::Stimulus>> {
        mem::take(&mut self.outbox)
    }
}
