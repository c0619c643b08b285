//! A scripted participant that answers with a fixed accuracy.

use cogsuite_core::{ArrowDirection, Trial};
use cogsuite_session::Task;
use cogsuite_tasks::mental_rotation::Judgement;
use cogsuite_tasks::task_switching::Hand;
use cogsuite_tasks::{
    Cpt, Flanker, GoNoGo, MatrixReasoning, MentalRotation, NBack, Press, SequenceRecall,
    TaskSwitching,
};
use rand::Rng;

type TrialOf<K> = Trial<<K as Task>::Stimulus, <K as Task>::Response>;

/// Tasks the scripted participant knows how to get wrong.
pub trait Scripted: Task {
    /// A response that is scored as an error, or `None` when the error is
    /// staying silent.
    fn wrong_answer(trial: &TrialOf<Self>) -> Option<Self::Response>;
}

/// Detection tasks: a wrong answer is a miss on targets and a press otherwise.
fn wrong_press<S>(trial: &Trial<S, Press>) -> Option<Press> {
    if trial.is_target() { None } else { Some(Press) }
}

impl Scripted for NBack {
    fn wrong_answer(trial: &TrialOf<Self>) -> Option<Press> {
        wrong_press(trial)
    }
}

impl Scripted for GoNoGo {
    fn wrong_answer(trial: &TrialOf<Self>) -> Option<Press> {
        wrong_press(trial)
    }
}

impl Scripted for Cpt {
    fn wrong_answer(trial: &TrialOf<Self>) -> Option<Press> {
        wrong_press(trial)
    }
}

impl Scripted for SequenceRecall {
    fn wrong_answer(trial: &TrialOf<Self>) -> Option<Vec<u8>> {
        let mut items = trial.expected.first()?.clone();
        items.reverse();
        items.push(u8::MAX);
        Some(items)
    }
}

impl Scripted for TaskSwitching {
    fn wrong_answer(trial: &TrialOf<Self>) -> Option<Hand> {
        Some(match trial.expected.first()? {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        })
    }
}

impl Scripted for MentalRotation {
    fn wrong_answer(trial: &TrialOf<Self>) -> Option<Judgement> {
        Some(match trial.expected.first()? {
            Judgement::Same => Judgement::Different,
            Judgement::Different => Judgement::Same,
        })
    }
}

impl Scripted for Flanker {
    fn wrong_answer(trial: &TrialOf<Self>) -> Option<ArrowDirection> {
        trial.expected.first().map(|d| d.opposite())
    }
}

impl Scripted for MatrixReasoning {
    fn wrong_answer(trial: &TrialOf<Self>) -> Option<usize> {
        let options = trial.stimulus.options.len();
        trial.expected.first().map(|&a| (a + 1) % options.max(1))
    }
}

/// A response the participant has committed to for one trial.
#[derive(Debug, Clone)]
pub struct Planned<A> {
    pub trial: usize,
    pub at_ns: u64,
    pub response: Option<A>,
}

pub struct Participant<A> {
    accuracy: f64,
    mean_rt_ms: u64,
    plan: Option<Planned<A>>,
}

impl<A: Clone> Participant<A> {
    pub fn new(accuracy: f64, mean_rt_ms: u64) -> Self {
        Self {
            accuracy: accuracy.clamp(0.0, 1.0),
            mean_rt_ms: mean_rt_ms.max(1),
            plan: None,
        }
    }

    /// Decides how to answer `trial` once its window is open at `now_ns`.
    /// Trials that already have a plan are left alone.
    pub fn consider<K, R>(&mut self, trial: &TrialOf<K>, now_ns: u64, rng: &mut R)
    where
        K: Scripted<Response = A>,
        R: Rng + ?Sized,
    {
        if self.plan.as_ref().is_some_and(|p| p.trial == trial.index) {
            return;
        }
        let response = if rng.random_bool(self.accuracy) {
            trial.expected.first().cloned()
        } else {
            K::wrong_answer(trial)
        };
        let jitter = rng.random_range(0.7..1.3);
        let rt_ns = (self.mean_rt_ms as f64 * jitter * 1_000_000.0) as u64;
        self.plan = Some(Planned {
            trial: trial.index,
            at_ns: now_ns + rt_ns,
            response,
        });
    }

    /// When the pending response is due, if there is one.
    pub fn due_at(&self) -> Option<u64> {
        self.plan
            .as_ref()
            .filter(|p| p.response.is_some())
            .map(|p| p.at_ns)
    }

    /// Hands out the pending response if it is due by `now_ns`.
    pub fn take_due(&mut self, now_ns: u64) -> Option<(usize, A)> {
        let plan = self.plan.as_mut()?;
        if plan.at_ns > now_ns {
            return None;
        }
        plan.response.take().map(|r| (plan.trial, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogsuite_core::TrialTiming;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn hand_trial(index: usize, expected: Hand) -> TrialOf<TaskSwitching> {
        let cue = cogsuite_tasks::task_switching::Cue {
            rule: cogsuite_tasks::task_switching::Rule::Parity,
            number: 3,
            switch: false,
        };
        Trial::new(index, cue, vec![expected], TrialTiming::self_paced(400))
    }

    #[test]
    fn perfect_participant_gives_the_expected_answer() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Participant::new(1.0, 500);
        let trial = hand_trial(0, Hand::Right);
        p.consider::<TaskSwitching, _>(&trial, 0, &mut rng);
        let due = p.due_at().unwrap();
        assert!((350_000_000..650_000_000).contains(&due));
        assert_eq!(p.take_due(due - 1), None);
        assert_eq!(p.take_due(due), Some((0, Hand::Right)));
        assert_eq!(p.take_due(due), None);
    }

    #[test]
    fn hopeless_participant_answers_wrong() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut p = Participant::new(0.0, 300);
        p.consider::<TaskSwitching, _>(&hand_trial(4, Hand::Left), 0, &mut rng);
        assert_eq!(p.take_due(u64::MAX), Some((4, Hand::Right)));
    }

    #[test]
    fn a_trial_is_planned_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = Participant::new(1.0, 300);
        let trial = hand_trial(2, Hand::Left);
        p.consider::<TaskSwitching, _>(&trial, 0, &mut rng);
        let due = p.due_at();
        p.consider::<TaskSwitching, _>(&trial, 10_000_000_000, &mut rng);
        assert_eq!(p.due_at(), due);
    }

    #[test]
    fn wrong_detection_answer_depends_on_target() {
        let timing = TrialTiming::timed(1000, 0, 800);
        let target = Trial::new(0, 'X', vec![Press], timing);
        let lure = Trial::new(1, 'K', vec![], timing);
        assert_eq!(<Cpt as Scripted>::wrong_answer(&target), None);
        assert_eq!(<Cpt as Scripted>::wrong_answer(&lure), Some(Press));
    }
}
