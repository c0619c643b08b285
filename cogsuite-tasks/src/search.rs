//! Visual search boards: find the labels `1..=N` in order on a shattered
//! board or a Schulte grid.
//!
//! The board is self-paced with any number of clicks per target, so it does
//! not run on the trial engine. Time is passed in by the host.

use cogsuite_core::{ConfigError, GeometryError};
use cogsuite_geometry::{Layout, LayoutKind, PartitionConfig, Point};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Rating;

/// How long a wrongly clicked grid cell stays highlighted.
pub const GRID_FLASH_NS: u64 = 200_000_000;
/// Flash of a wrongly clicked shattered cell, fade in plus fade out.
pub const SHATTERED_FLASH_NS: u64 = 400_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightPolicy {
    /// Every found cell stays greyed out; wrong clicks flash.
    Simple,
    /// Only the most recently found cell is greyed out. Wrong clicks flash
    /// on grids only.
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub board: LayoutKind,
    /// Labels on a shattered board, clamped to `1..=100`.
    pub count: usize,
    /// Side of a Schulte grid, clamped to `3..=9`.
    pub grid_size: usize,
    pub width: f64,
    pub height: f64,
    pub highlight: HighlightPolicy,
    pub partition: PartitionConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            board: LayoutKind::Shattered,
            count: 100,
            grid_size: 5,
            width: 800.0,
            height: 600.0,
            highlight: HighlightPolicy::Simple,
            partition: PartitionConfig::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(self.width) || !ok(self.height) {
            return Err(ConfigError::Invalid(format!(
                "board surface {}x{} must be positive",
                self.width, self.height
            )));
        }
        Ok(())
    }

    pub fn clamped_count(&self) -> usize {
        self.count.clamp(1, 100)
    }

    pub fn clamped_grid(&self) -> usize {
        self.grid_size.clamp(3, 9)
    }

    pub fn layout<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Layout, GeometryError> {
        match self.board {
            LayoutKind::Shattered => Layout::shattered(
                self.width,
                self.height,
                self.clamped_count(),
                &self.partition,
                rng,
            ),
            LayoutKind::Grid => Layout::grid(self.width, self.height, self.clamped_grid(), rng),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellState {
    Idle,
    Found,
    /// Recently clicked out of order.
    Flash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Click {
    Correct { label: u32, finished: bool },
    Wrong { label: Option<u32> },
    /// Between cells or off the board.
    Missed,
    /// Board not started or already finished.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub count: usize,
    pub elapsed_secs: u64,
    pub wrong_clicks: usize,
    /// Time scaled to a 100-label board.
    pub equivalent_minutes: f64,
    pub grade: Rating,
}

/// Converts a completion time on an `N`-label board to its 100-label
/// equivalent (`minutes * (100 / N)^2`) and grades it.
pub fn grade(elapsed_secs: u64, count: usize) -> (f64, Rating) {
    let scale = (100.0 / count.max(1) as f64).powi(2);
    let minutes = elapsed_secs as f64 / 60.0 * scale;
    let rating = match minutes {
        m if m < 15.0 => Rating::Excellent,
        m if m < 20.0 => Rating::Good,
        m if m < 25.0 => Rating::Average,
        m if m < 30.0 => Rating::Pass,
        _ => Rating::Poor,
    };
    (minutes, rating)
}

pub struct SearchBoard {
    layout: Layout,
    highlight: HighlightPolicy,
    found: Vec<bool>,
    latest: Option<usize>,
    flash: Option<(usize, u64)>,
    target: u32,
    wrong_clicks: usize,
    started_ns: Option<u64>,
    finished_ns: Option<u64>,
}

impl SearchBoard {
    pub fn new(layout: Layout, highlight: HighlightPolicy) -> Self {
        let found = vec![false; layout.cells.len()];
        Self {
            layout,
            highlight,
            found,
            latest: None,
            flash: None,
            target: 1,
            wrong_clicks: 0,
            started_ns: None,
            finished_ns: None,
        }
    }

    pub fn from_config<R: Rng + ?Sized>(
        config: &SearchConfig,
        rng: &mut R,
    ) -> Result<Self, GeometryError> {
        Ok(Self::new(config.layout(rng)?, config.highlight))
    }

    pub fn start(&mut self, now_ns: u64) {
        self.found.iter_mut().for_each(|f| *f = false);
        self.latest = None;
        self.flash = None;
        self.target = 1;
        self.wrong_clicks = 0;
        self.started_ns = Some(now_ns);
        self.finished_ns = None;
        info!(count = self.count(), kind = ?self.layout.kind, "search board started");
    }

    /// Routes a click to the cell under `point`.
    pub fn click(&mut self, point: &Point, now_ns: u64) -> Click {
        if self.started_ns.is_none() || self.finished_ns.is_some() {
            return Click::Ignored;
        }
        let Some(cell) = self.layout.cell_at(point) else {
            return Click::Missed;
        };
        let label = self.layout.cells[cell].label;

        if label != Some(self.target) {
            self.wrong_clicks += 1;
            if let Some(duration) = self.flash_ns() {
                self.flash = Some((cell, now_ns + duration));
            }
            debug!(?label, target = self.target, "wrong cell");
            return Click::Wrong { label };
        }

        if self.highlight == HighlightPolicy::Advanced {
            if let Some(previous) = self.latest {
                self.found[previous] = false;
            }
        }
        self.found[cell] = true;
        self.latest = Some(cell);

        let found = self.target;
        let finished = found as usize >= self.count();
        if finished {
            self.finished_ns = Some(now_ns);
            info!(
                elapsed_ms = self.elapsed_ns(now_ns) / 1_000_000,
                wrong = self.wrong_clicks,
                "search board cleared"
            );
        } else {
            self.target += 1;
        }
        Click::Correct {
            label: found,
            finished,
        }
    }

    /// Flash length for a wrong click, if this board flashes at all.
    pub fn flash_ns(&self) -> Option<u64> {
        match (self.layout.kind, self.highlight) {
            (LayoutKind::Grid, _) => Some(GRID_FLASH_NS),
            (LayoutKind::Shattered, HighlightPolicy::Simple) => Some(SHATTERED_FLASH_NS),
            (LayoutKind::Shattered, HighlightPolicy::Advanced) => None,
        }
    }

    pub fn cell_state(&self, cell: usize, now_ns: u64) -> CellState {
        match self.flash {
            Some((flashing, until)) if flashing == cell && now_ns < until => CellState::Flash,
            _ if self.found.get(cell).copied().unwrap_or(false) => CellState::Found,
            _ => CellState::Idle,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn count(&self) -> usize {
        self.layout.effective_count()
    }

    /// The label to find next.
    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn wrong_clicks(&self) -> usize {
        self.wrong_clicks
    }

    pub fn is_finished(&self) -> bool {
        self.finished_ns.is_some()
    }

    /// Time since start, frozen once the board is cleared.
    pub fn elapsed_ns(&self, now_ns: u64) -> u64 {
        let Some(start) = self.started_ns else {
            return 0;
        };
        self.finished_ns.unwrap_or(now_ns).saturating_sub(start)
    }

    pub fn result(&self) -> Option<SearchResult> {
        let finished = self.finished_ns?;
        let elapsed_secs = self.elapsed_ns(finished) / 1_000_000_000;
        let (equivalent_minutes, grade) = grade(elapsed_secs, self.count());
        Some(SearchResult {
            count: self.count(),
            elapsed_secs,
            wrong_clicks: self.wrong_clicks,
            equivalent_minutes,
            grade,
        })
    }
}
