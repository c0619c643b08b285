use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Monotonic nanosecond clock. Timestamps are relative to the clock's origin.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> u64;
    fn sleep(&self, d: Duration);

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn sleep_until(&self, deadline_ns: u64) {
        let now = self.now();
        if deadline_ns > now {
            self.sleep(Duration::from_nanos(deadline_ns - now));
        }
    }
}

/// How late deferred callbacks fired relative to their due time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LatenessStats {
    pub samples: usize,
    pub mean_ns: f64,
    pub jitter_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
}

/// Wall clock backed by `Instant` with an OS-level precise sleep.
#[derive(Debug, Clone)]
pub struct HighPrecisionClock {
    start: Instant,
    lateness: Vec<Duration>,
    max_samples: usize,
}

impl Clock for HighPrecisionClock {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
}

impl HighPrecisionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            lateness: Vec::with_capacity(1000),
            max_samples: 1000,
        }
    }

    /// Records how far past its due time a callback ran.
    pub fn record_lateness(&mut self, d: Duration) {
        if self.lateness.len() >= self.max_samples {
            self.lateness.remove(0);
        }
        self.lateness.push(d);
    }

    pub fn lateness_stats(&self) -> LatenessStats {
        let times: Vec<f64> = self.lateness.iter().map(|d| d.as_nanos() as f64).collect();
        if times.is_empty() {
            return LatenessStats::default();
        }
        let n = times.len() as f64;
        let mean = times.iter().sum::<f64>() / n;
        let var = times.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        LatenessStats {
            samples: times.len(),
            mean_ns: mean,
            jitter_ns: var.sqrt(),
            min_ns: times.iter().copied().fold(f64::INFINITY, f64::min),
            max_ns: times.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{CLOCK_MONOTONIC, clock_nanosleep, timespec};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }
}

impl Default for HighPrecisionClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now_ns: Arc<AtomicU64>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, ns: u64) {
        self.now_ns.store(ns, Ordering::SeqCst);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
