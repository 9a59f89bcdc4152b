//! Connection-scoped performance monitor.
//!
//! One `PerformanceMonitor` is created per connection and dies with
//! it, so the latency timer and error counters cannot outlive the
//! socket or accumulate process-wide. The timer is single-slot: one
//! in-flight exchange per connection.

use std::collections::HashMap;
use std::time::Duration;

use charla_types::error::ErrorCategory;
use charla_types::identity::UserId;
use tokio::time::Instant;
use tracing::{error, warn};

use crate::event::EventSink;

/// Responses at or above this latency are flagged slow in metrics.
pub const SLOW_RESPONSE_MS: u64 = 5_000;

/// Responses at or above this latency log a server-side warning.
pub const WARN_RESPONSE_MS: u64 = 3_000;

/// Alert once a category's error count reaches this value.
pub const ERROR_ALERT_THRESHOLD: u32 = 3;

/// A stream running longer than this triggers a one-time warning.
pub const STREAM_WATCHDOG_MS: u64 = 30_000;

/// Result of closing the latency timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseTiming {
    pub elapsed_ms: u64,
    pub is_slow: bool,
}

/// Per-connection latency timer and error counters.
pub struct PerformanceMonitor {
    user_id: UserId,
    timer: Option<Instant>,
    error_counts: HashMap<ErrorCategory, u32>,
}

impl PerformanceMonitor {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            timer: None,
            error_counts: HashMap::new(),
        }
    }

    /// Arm the single-slot timer. A second start before `end_timer`
    /// restarts the measurement.
    pub fn start_timer(&mut self) {
        self.timer = Some(Instant::now());
    }

    /// Close the timer and report elapsed time.
    ///
    /// Returns zero elapsed with no matching start. Logs a warning at
    /// the lower threshold independently of the slow flag.
    pub fn end_timer(&mut self) -> ResponseTiming {
        let Some(start) = self.timer.take() else {
            return ResponseTiming {
                elapsed_ms: 0,
                is_slow: false,
            };
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if elapsed_ms >= WARN_RESPONSE_MS {
            warn!(user_id = %self.user_id, elapsed_ms, "Slow response");
        }
        ResponseTiming {
            elapsed_ms,
            is_slow: elapsed_ms >= SLOW_RESPONSE_MS,
        }
    }

    /// Count a failure for this connection. Never resets; alerts once
    /// the category's count reaches [`ERROR_ALERT_THRESHOLD`] and on
    /// every failure after that.
    pub fn track_error(&mut self, category: ErrorCategory) -> u32 {
        let count = self.error_counts.entry(category).or_insert(0);
        *count += 1;
        if *count >= ERROR_ALERT_THRESHOLD {
            error!(
                user_id = %self.user_id,
                category = %category,
                count = *count,
                "Repeated errors for connection"
            );
        }
        *count
    }

    /// Current error count for a category.
    pub fn error_count(&self, category: ErrorCategory) -> u32 {
        self.error_counts.get(&category).copied().unwrap_or(0)
    }

    /// Start a watchdog for a stream beginning now.
    pub fn watch_stream(&self) -> StreamWatchdog {
        StreamWatchdog::new(Duration::from_millis(STREAM_WATCHDOG_MS))
    }

    /// Best-effort liveness probe: false once signaling is impossible.
    pub fn check_health<E: EventSink>(&self, sink: &E) -> bool {
        sink.is_open()
    }
}

/// One-shot watchdog for a long-running stream.
///
/// Purely observational: crossing the limit produces exactly one
/// signal and never cancels or alters the stream.
pub struct StreamWatchdog {
    started: Instant,
    limit: Duration,
    warned: bool,
}

impl StreamWatchdog {
    pub fn new(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
            warned: false,
        }
    }

    /// When the limit will be crossed (for timer-driven polling).
    pub fn deadline(&self) -> Instant {
        self.started + self.limit
    }

    pub fn warned(&self) -> bool {
        self.warned
    }

    /// Mark the watchdog fired and report elapsed stream duration.
    pub fn trip(&mut self) -> Duration {
        self.warned = true;
        self.started.elapsed()
    }

    /// Poll-style check: elapsed duration on the first crossing of the
    /// limit, `None` before then and forever after.
    pub fn check(&mut self) -> Option<Duration> {
        if !self.warned && self.started.elapsed() >= self.limit {
            Some(self.trip())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChannelSink;

    #[tokio::test]
    async fn check_health_tracks_sink_openness() {
        let monitor = PerformanceMonitor::new(UserId::new());
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        let sink = ChannelSink::new(tx);
        assert!(monitor.check_health(&sink));

        drop(rx);
        assert!(!monitor.check_health(&sink));
    }

    #[test]
    fn end_timer_without_start_returns_zero() {
        let mut monitor = PerformanceMonitor::new(UserId::new());
        let timing = monitor.end_timer();
        assert_eq!(timing.elapsed_ms, 0);
        assert!(!timing.is_slow);
    }

    #[tokio::test(start_paused = true)]
    async fn end_timer_flags_slow_responses() {
        let mut monitor = PerformanceMonitor::new(UserId::new());

        monitor.start_timer();
        tokio::time::advance(Duration::from_millis(1_000)).await;
        let timing = monitor.end_timer();
        assert_eq!(timing.elapsed_ms, 1_000);
        assert!(!timing.is_slow);

        monitor.start_timer();
        tokio::time::advance(Duration::from_millis(6_000)).await;
        let timing = monitor.end_timer();
        assert_eq!(timing.elapsed_ms, 6_000);
        assert!(timing.is_slow);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_is_single_slot() {
        let mut monitor = PerformanceMonitor::new(UserId::new());
        monitor.start_timer();
        tokio::time::advance(Duration::from_millis(100)).await;
        let first = monitor.end_timer();
        assert_eq!(first.elapsed_ms, 100);

        // Consumed: a second end without start reports zero.
        let second = monitor.end_timer();
        assert_eq!(second.elapsed_ms, 0);
    }

    #[test]
    fn track_error_counts_per_category() {
        let mut monitor = PerformanceMonitor::new(UserId::new());
        assert_eq!(monitor.track_error(ErrorCategory::ConnectivityIssue), 1);
        assert_eq!(monitor.track_error(ErrorCategory::ConnectivityIssue), 2);
        assert_eq!(monitor.track_error(ErrorCategory::GenerationFailure), 1);
        assert_eq!(monitor.track_error(ErrorCategory::ConnectivityIssue), 3);
        assert_eq!(monitor.track_error(ErrorCategory::ConnectivityIssue), 4);
        assert_eq!(monitor.error_count(ErrorCategory::ConnectivityIssue), 4);
        assert_eq!(monitor.error_count(ErrorCategory::GenerationFailure), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_fires_exactly_once() {
        let mut watchdog = StreamWatchdog::new(Duration::from_millis(30_000));
        assert!(watchdog.check().is_none());

        tokio::time::advance(Duration::from_millis(30_001)).await;
        let elapsed = watchdog.check().expect("should fire on first crossing");
        assert!(elapsed >= Duration::from_millis(30_000));

        tokio::time::advance(Duration::from_millis(60_000)).await;
        assert!(watchdog.check().is_none());
    }
}
