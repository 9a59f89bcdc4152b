//! Performance and health monitoring.

pub mod performance;

pub use performance::{
    PerformanceMonitor, ResponseTiming, StreamWatchdog, ERROR_ALERT_THRESHOLD, SLOW_RESPONSE_MS,
    STREAM_WATCHDOG_MS, WARN_RESPONSE_MS,
};
