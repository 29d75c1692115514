use std::time::{Duration, Instant};
use tracing::info;

/// Processing statistics of the calculator loop
/// (not to be confused with the performance values it computes)
pub struct AppMetrics {
    /// Number of input lines read
    pub input_lines: u64,
    /// Lines that could not be parsed or were rejected
    pub decode_errors: u64,
    /// Messages dropped by the source filter
    pub filtered_messages: u64,
    /// Cycles that produced a result
    pub computed_cycles: u64,
    /// Cycles with no result (engine running or no apparent wind)
    pub skipped_cycles: u64,
    /// H5000 frames written
    pub telemetry_frames: u64,
}

impl AppMetrics {
    /// Create a new AppMetrics instance with all counters at zero
    pub fn new() -> Self {
        Self {
            input_lines: 0,
            decode_errors: 0,
            filtered_messages: 0,
            computed_cycles: 0,
            skipped_cycles: 0,
            telemetry_frames: 0,
        }
    }

    /// Reset all counters to zero
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Log current metrics to the info log
    pub fn log(&self) {
        info!(
            "[Metrics] Input lines: {}, Decode errors: {}, Filtered: {}, Computed: {}, Skipped: {}, Telemetry frames: {}",
            self.input_lines,
            self.decode_errors,
            self.filtered_messages,
            self.computed_cycles,
            self.skipped_cycles,
            self.telemetry_frames
        );
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Manages periodic logging of application metrics
pub struct MetricsLogger {
    last_log: Instant,
    log_interval: Duration,
}

impl MetricsLogger {
    /// Create a new MetricsLogger with the specified logging interval
    pub fn new(log_interval: Duration) -> Self {
        Self {
            last_log: Instant::now(),
            log_interval,
        }
    }

    /// Check if it's time to log metrics, and if so, log them and reset
    /// Returns true if metrics were logged
    pub fn check_and_log(&mut self, metrics: &mut AppMetrics) -> bool {
        if self.last_log.elapsed() >= self.log_interval {
            metrics.log();
            metrics.reset();
            self.last_log = Instant::now();
            true
        } else {
            false
        }
    }
}
