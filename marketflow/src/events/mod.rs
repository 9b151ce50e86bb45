//! Event sinks for run observability.
//!
//! Sinks are passed explicitly through the runtime context; there is no
//! process-wide sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
