//! Outbound event transport port.

pub mod sink;

pub use sink::{ChannelSink, EventSink, SinkError};
