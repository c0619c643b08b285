//! The trial loop: a single-threaded state machine that presents trials,
//! collects at most one response per trial and sequences the pauses between
//! them on a [`cogsuite_timing::Scheduler`].

pub mod config;
pub mod engine;
pub mod stats;
pub mod task;

pub use config::{SessionConfig, load_json};
pub use engine::{Cue, Due, TrialEngine};
pub use stats::{SessionStats, mean, ols_slope, percent, switch_cost};
pub use task::{Record, Scored, Task};
