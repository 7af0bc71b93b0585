//! Lightweight wall-clock timing.
//!
//! Timers are reported through `tracing` at debug level. They are active when
//! the `MC_TIMING` environment variable is set or when created with
//! [`Timer::forced`].

use std::time::Instant;

/// Check if timing is requested through the environment.
pub fn is_enabled() -> bool {
    std::env::var_os("MC_TIMING").is_some()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// Create a timer that always reports, regardless of `MC_TIMING`.
    pub fn forced(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: true,
        }
    }

    /// Elapsed seconds so far (always available).
    pub fn elapsed_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Stop the timer and return elapsed time in seconds.
    /// If timing is disabled, returns None.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop the timer and log the result if enabled.
    pub fn stop_and_log(self) {
        let label = self.label;
        if let Some(elapsed) = self.stop() {
            tracing::debug!(target: "mc_timing", label, elapsed_s = elapsed, "timer");
        }
    }
}

/// Accumulating timer for tracking total time across many short calls
/// (e.g. vector field evaluations). Owned by a single solver instance.
#[derive(Debug, Default, Clone)]
pub struct AccumulatingTimer {
    total_s: f64,
    count: u64,
}

impl AccumulatingTimer {
    pub const fn new() -> Self {
        Self {
            total_s: 0.0,
            count: 0,
        }
    }

    /// Record a timing measurement.
    pub fn record(&mut self, duration_s: f64) {
        self.total_s += duration_s;
        self.count += 1;
    }

    /// Get total time spent (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_s
    }

    /// Get number of calls.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Get average time per call (in seconds).
    pub fn average_seconds(&self) -> f64 {
        if self.count > 0 {
            self.total_s / self.count as f64
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        self.total_s = 0.0;
        self.count = 0;
    }
}
