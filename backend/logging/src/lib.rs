//! Structured logging for plugboard.
//!
//! Sets up the `tracing` subscriber (console plus optional rolling NDJSON file)
//! and emits typed resolution events.

pub mod event_logger;
pub mod logger;

pub use event_logger::{EVENT_TARGET, EventLogger, ResolutionEvent, ResolutionEventEntry};
pub use logger::init_logger;
