//! Matrix reasoning: eight fixed 3 × 3 puzzles with the last cell missing,
//! answered by picking one of six candidate figures.

use cogsuite_core::{ConfigError, Outcome, ResponseMode, Stimulus, Trial, TrialTiming};
use cogsuite_session::{Record, Scored, SessionStats, Task, percent};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::Rating;

/// Candidate kinds a distractor may swap in.
const DISTRACTOR_KINDS: [ShapeKind; 6] = [
    ShapeKind::Square,
    ShapeKind::Circle,
    ShapeKind::Triangle,
    ShapeKind::Diamond,
    ShapeKind::Star,
    ShapeKind::Cross,
];
const SIZES: [u16; 6] = [20, 30, 40, 50, 60, 70];
const ROTATIONS: [u16; 5] = [0, 45, 90, 135, 180];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Square,
    Circle,
    Triangle,
    Diamond,
    Cross,
    Star,
    LeftHalf,
    RightHalf,
    TopHalf,
    BottomHalf,
    VerticalBar,
    HorizontalBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fill {
    Outline,
    Solid,
}

impl Fill {
    fn flipped(self) -> Self {
        match self {
            Fill::Outline => Fill::Solid,
            Fill::Solid => Fill::Outline,
        }
    }
}

/// One figure drawn in a 100 × 100 cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatrixFigure {
    pub kind: ShapeKind,
    /// Nominal extent in cell units.
    pub size: u16,
    pub fill: Fill,
    pub rotation_deg: u16,
}

impl MatrixFigure {
    pub const fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            size: 40,
            fill: Fill::Outline,
            rotation_deg: 0,
        }
    }

    pub const fn sized(mut self, size: u16) -> Self {
        self.size = size;
        self
    }

    pub const fn solid(mut self) -> Self {
        self.fill = Fill::Solid;
        self
    }

    pub const fn rotated(mut self, deg: u16) -> Self {
        self.rotation_deg = deg;
        self
    }

    /// A copy differing from `self` in exactly one attribute.
    pub fn distractor<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut other = *self;
        let roll: f64 = rng.random();
        if roll < 0.33 {
            other.kind = pick_other(&DISTRACTOR_KINDS, self.kind, rng);
        } else if roll < 0.66 {
            if self.fill == Fill::Solid {
                other.fill = self.fill.flipped();
            } else {
                other.size = pick_other(&SIZES, self.size, rng);
            }
        } else if self.rotation_deg != 0 {
            other.rotation_deg = pick_other(&ROTATIONS, self.rotation_deg, rng);
        } else {
            other.kind = pick_other(&DISTRACTOR_KINDS, self.kind, rng);
        }
        other
    }
}

fn pick_other<T: Copy + PartialEq, R: Rng + ?Sized>(choices: &[T], current: T, rng: &mut R) -> T {
    let rest: Vec<T> = choices.iter().copied().filter(|&c| c != current).collect();
    rest.choose(rng).copied().unwrap_or(current)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixLevel {
    pub rule: &'static str,
    /// Row-major 3 × 3 grid, last cell left blank.
    pub cells: [Option<MatrixFigure>; 9],
    pub answer: MatrixFigure,
}

fn grid(figures: [MatrixFigure; 8]) -> [Option<MatrixFigure>; 9] {
    let mut cells = [None; 9];
    for (cell, figure) in cells.iter_mut().zip(figures) {
        *cell = Some(figure);
    }
    cells
}

/// The fixed puzzle set, easiest first.
pub fn levels() -> Vec<MatrixLevel> {
    use ShapeKind::*;
    let f = MatrixFigure::new;
    vec![
        MatrixLevel {
            rule: "shape identity",
            cells: grid([
                f(Square),
                f(Square),
                f(Square),
                f(Circle),
                f(Circle),
                f(Circle),
                f(Triangle),
                f(Triangle),
            ]),
            answer: f(Triangle),
        },
        MatrixLevel {
            rule: "size progression",
            cells: grid([
                f(Diamond).sized(20),
                f(Diamond).sized(40),
                f(Diamond).sized(60),
                f(Square).sized(20),
                f(Square).sized(40),
                f(Square).sized(60),
                f(Circle).sized(20),
                f(Circle).sized(40),
            ]),
            answer: f(Circle).sized(60),
        },
        MatrixLevel {
            rule: "rotation by 45 degrees",
            cells: grid([
                f(Square),
                f(Square).rotated(45),
                f(Square).rotated(90),
                f(Triangle),
                f(Triangle).rotated(45),
                f(Triangle).rotated(90),
                f(Cross),
                f(Cross).rotated(45),
            ]),
            answer: f(Cross).rotated(90),
        },
        MatrixLevel {
            rule: "shape distribution",
            cells: grid([
                f(Circle),
                f(Square),
                f(Triangle),
                f(Triangle),
                f(Circle),
                f(Square),
                f(Square),
                f(Triangle),
            ]),
            answer: f(Circle),
        },
        MatrixLevel {
            rule: "fill alternation",
            cells: grid([
                f(Square).solid(),
                f(Square),
                f(Square).solid(),
                f(Circle),
                f(Circle).solid(),
                f(Circle),
                f(Diamond).solid(),
                f(Diamond),
            ]),
            answer: f(Diamond).solid(),
        },
        MatrixLevel {
            rule: "shape addition",
            cells: grid([
                f(LeftHalf),
                f(RightHalf),
                f(Square).solid(),
                f(TopHalf),
                f(BottomHalf),
                f(Square).solid(),
                f(VerticalBar).sized(60),
                f(HorizontalBar).sized(60),
            ]),
            answer: f(Cross).sized(60),
        },
        MatrixLevel {
            rule: "size reduction",
            cells: grid([
                f(Star).sized(70),
                f(Star).sized(50),
                f(Star).sized(30),
                f(Circle).sized(70),
                f(Circle).sized(50),
                f(Circle).sized(30),
                f(Square).sized(70),
                f(Square).sized(50),
            ]),
            answer: f(Square).sized(30),
        },
        MatrixLevel {
            rule: "fill and rotation",
            cells: grid([
                f(Triangle).solid(),
                f(Triangle).rotated(90),
                f(Triangle).solid().rotated(180),
                f(Diamond).solid(),
                f(Diamond).rotated(90),
                f(Diamond).solid().rotated(180),
                f(Star).solid(),
                f(Star).rotated(90),
            ]),
            answer: f(Star).solid().rotated(180),
        },
    ]
}

/// A level together with its shuffled answer options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixPuzzle {
    pub level: usize,
    pub rule: &'static str,
    pub cells: [Option<MatrixFigure>; 9],
    pub options: Vec<MatrixFigure>,
}

impl Stimulus for MatrixPuzzle {
    fn describe(&self) -> String {
        format!("level {} ({})", self.level + 1, self.rule)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Number of distractors offered next to the answer.
    pub distractors: usize,
    pub isi_ms: u64,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            distractors: 5,
            isi_ms: 500,
        }
    }
}

impl MatrixConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.distractors == 0 {
            return Err(ConfigError::Invalid("matrix puzzles need a distractor".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixSummary {
    pub stats: SessionStats,
    pub score: i64,
    /// Score over the maximum possible, in percent.
    pub accuracy_pct: f64,
    pub rating: Rating,
}

pub struct MatrixReasoning {
    config: MatrixConfig,
    levels: Vec<MatrixLevel>,
}

impl MatrixReasoning {
    pub fn new(config: MatrixConfig) -> Self {
        Self {
            config,
            levels: levels(),
        }
    }

    /// Answer plus distractors, shuffled. Returns the options and the
    /// position of the answer among them.
    pub fn options<R: Rng + ?Sized>(
        &self,
        answer: &MatrixFigure,
        rng: &mut R,
    ) -> (Vec<MatrixFigure>, usize) {
        let mut options = vec![*answer];
        options.extend((0..self.config.distractors).map(|_| answer.distractor(rng)));
        options.shuffle(rng);
        let position = options.iter().position(|o| o == answer).unwrap_or(0);
        (options, position)
    }
}

impl Task for MatrixReasoning {
    type Stimulus = MatrixPuzzle;
    /// Index of the chosen option.
    type Response = usize;
    type Summary = MatrixSummary;

    fn name(&self) -> &'static str {
        "matrix"
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
    ) -> Option<Trial<MatrixPuzzle, usize>> {
        let level = self.levels.get(index)?;
        let (options, answer) = self.options(&level.answer, rng);
        let puzzle = MatrixPuzzle {
            level: index,
            rule: level.rule,
            cells: level.cells,
            options,
        };
        Some(Trial::new(
            index,
            puzzle,
            vec![answer],
            TrialTiming::self_paced(self.config.isi_ms),
        ))
    }

    fn score(&mut self, trial: &Trial<MatrixPuzzle, usize>, response: Option<&usize>) -> Scored {
        match trial.classify(response, self.mode()) {
            Outcome::Hit => Scored::new(Outcome::Hit, 10),
            other => Scored::new(other, 0),
        }
    }

    fn summarize(&self, records: &[Record<Self>]) -> MatrixSummary {
        let stats = SessionStats::from_records(records);
        let accuracy_pct = percent(stats.hits, self.levels.len());
        let rating = match accuracy_pct {
            a if a >= 90.0 => Rating::Excellent,
            a if a >= 70.0 => Rating::Good,
            a if a >= 50.0 => Rating::Average,
            _ => Rating::Poor,
        };
        MatrixSummary {
            score: stats.score,
            accuracy_pct,
            rating,
            stats,
        }
    }
}
