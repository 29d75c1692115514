use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

/// Default cooldown between two warnings of the same cause
pub const WARNING_COOLDOWN: Duration = Duration::from_secs(30);

/// Distinct reasons a polar lookup can come back empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum DiagnosticCause {
    /// A wind-speed bin has fewer than two samples, so no curve was built
    MissingCurve = 0,
    /// A curve was evaluated but produced no usable number
    InvalidValue = 1,
}

impl DiagnosticCause {
    pub const ALL: [DiagnosticCause; 2] = [DiagnosticCause::MissingCurve, DiagnosticCause::InvalidValue];

    pub fn as_index(&self) -> usize {
        *self as usize
    }
}

/// Receiver for non-fatal diagnostics raised by polar lookups
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, cause: DiagnosticCause, message: String);
}

/// Sink that forwards to `tracing`, at most once per cause per cooldown.
///
/// The last emission time of each cause is kept in an atomic, so the sink can
/// be shared by any number of concurrent lookups without a lock.
#[derive(Debug)]
pub struct RateLimitedWarner {
    epoch: Instant,
    cooldown: Duration,
    // milliseconds since epoch + 1, 0 = never emitted
    last_emitted: [AtomicU64; DiagnosticCause::ALL.len()],
}

impl RateLimitedWarner {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            cooldown,
            last_emitted: [AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    /// Decide whether a diagnostic of `cause` observed at `now` may be emitted,
    /// and claim the slot if so. Exactly one concurrent caller wins the claim.
    pub fn should_emit_at(&self, cause: DiagnosticCause, now: Instant) -> bool {
        let now_ms = now.saturating_duration_since(self.epoch).as_millis() as u64 + 1;
        let slot = &self.last_emitted[cause.as_index()];
        let last = slot.load(Ordering::Acquire);

        if last != 0 && now_ms.saturating_sub(last) < self.cooldown.as_millis() as u64 {
            return false;
        }
        slot.compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(WARNING_COOLDOWN)
    }
}

impl DiagnosticSink for RateLimitedWarner {
    fn report(&self, cause: DiagnosticCause, message: String) {
        if self.should_emit_at(cause, Instant::now()) {
            warn!(?cause, "[Polar] {}", message);
        }
    }
}
