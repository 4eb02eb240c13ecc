//! Resolution Event Logger
//!
//! Typed events for every notable step of a plugin resolution, emitted through
//! `tracing` under a dedicated target so they can be routed to the NDJSON log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// `tracing` target all resolution events are logged under.
pub const EVENT_TARGET: &str = "plugboard::resolution";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionEvent {
    /// A candidate failed to load or to validate and was left out.
    CandidateDropped {
        interface: String,
        binding: String,
        reason: String,
    },
    /// A single plugin was chosen.
    Resolved {
        interface: String,
        binding: String,
        candidates: usize,
        strategy: Option<String>,
    },
    NotFound {
        interface: String,
    },
    Ambiguous {
        interface: String,
        external_count: usize,
    },
}

impl ResolutionEvent {
    /// Whether the event describes a problem worth a warning.
    pub fn is_problem(&self) -> bool {
        !matches!(self, ResolutionEvent::Resolved { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct ResolutionEventEntry {
    pub timestamp: DateTime<Utc>,
    pub event: ResolutionEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Log a resolution event. Problems go out at WARN, outcomes at INFO.
    pub fn log_event(event: ResolutionEvent) -> ResolutionEventEntry {
        let entry = ResolutionEventEntry {
            timestamp: Utc::now(),
            event,
        };
        let payload = serde_json::to_string(&entry.event).unwrap_or_default();

        if entry.event.is_problem() {
            warn!(target: EVENT_TARGET, event = %payload, "Resolution event");
        } else {
            info!(target: EVENT_TARGET, event = %payload, "Resolution event");
        }
        entry
    }
}
