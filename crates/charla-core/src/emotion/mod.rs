//! Emotion classification and animation dispatch.
//!
//! Runs off the main conversation flow. Classification never fails:
//! anything it cannot score comes back neutral, with the detail logged
//! at debug level rather than surfaced to the caller.

pub mod dispatch;
pub mod sentiment;

pub use dispatch::classify;
pub use sentiment::sentiment_score;
