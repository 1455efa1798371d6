//! Rate limiting for warnings emitted per event.
//!
//! Formatter fallbacks fire once per formatted line and delivery failures
//! once per retry, so a misconfigured file or an unreachable collector would
//! otherwise flood the host's log. Callers count occurrences and report them
//! in batches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Minimum spacing between two reports from the same warner.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Counter of suppressed occurrences with a report interval.
///
/// [`record`] counts one occurrence (a fallback, a failed attempt).
/// [`warn_if_due`] hands the count accumulated since the last report to the
/// callback once the interval has elapsed; the first report is never
/// delayed. [`flush`] reports whatever is outstanding straight away, which
/// the retry driver uses after a recovery and on shutdown.
///
/// Resolution is whole seconds. Shared references suffice, so a warner can
/// live inside a `TransportCore` that is only borrowed while formatting.
///
/// [`record`]: RateLimitedWarner::record
/// [`warn_if_due`]: RateLimitedWarner::warn_if_due
/// [`flush`]: RateLimitedWarner::flush
#[derive(Debug)]
pub struct RateLimitedWarner {
    interval_secs: u64,
    last_report: AtomicU64,
    pending: AtomicU64,
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

impl RateLimitedWarner {
    /// Create a warner reporting at most once per `interval`.
    pub fn new(interval: Duration) -> Self {
        let interval_secs = interval.as_secs();
        Self {
            interval_secs,
            last_report: AtomicU64::new(now_secs().saturating_sub(interval_secs)),
            pending: AtomicU64::new(0),
        }
    }

    /// Count one occurrence.
    pub fn record(&self) {
        self.pending.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of occurrences not yet reported.
    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Report the outstanding count if the interval has elapsed.
    pub fn warn_if_due(&self, mut report: impl FnMut(u64)) {
        let now = now_secs();
        let prev = self.last_report.load(Ordering::Relaxed);
        if now.saturating_sub(prev) < self.interval_secs {
            return;
        }
        let count = self.pending.swap(0, Ordering::Relaxed);
        if count > 0 {
            report(count);
        }
        self.last_report.store(now, Ordering::Relaxed);
    }

    /// Report the outstanding count now, if any.
    pub fn flush(&self, mut report: impl FnMut(u64)) {
        let count = self.pending.swap(0, Ordering::Relaxed);
        if count > 0 {
            report(count);
            self.last_report.store(now_secs(), Ordering::Relaxed);
        }
    }
}
