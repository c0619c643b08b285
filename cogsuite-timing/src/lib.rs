//! Clocks and deferred-callback scheduling for timed tasks.

pub mod scheduler;
pub mod timer;

pub use scheduler::{Fired, Generation, Scheduler};
pub use timer::{Clock, HighPrecisionClock, LatenessStats, VirtualClock};
