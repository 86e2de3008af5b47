//! Unified error handling for tama.
//!
//! Protocol and transport failures come from `tama_proto`; this module holds
//! the errors raised by the event bus, the per-connection verb handlers, and
//! action-table construction at startup. Plugin handlers return
//! `anyhow::Result` and are converted to log lines at the dispatch boundary.

use thiserror::Error;

use crate::event::{EventKind, SubscriptionId};

// ============================================================================
// Event bus
// ============================================================================

/// Misuse of an [`crate::event::EventBus`], or a synchronous subscriber failing.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("event kind {0:?} is not accepted by this bus")]
    UnknownKind(EventKind),

    #[error("subscription {0} is not registered")]
    NotSubscribed(SubscriptionId),

    #[error("subscriber for {kind:?} failed: {error:#}")]
    Subscriber { kind: EventKind, error: anyhow::Error },
}

// ============================================================================
// Verb handler errors (one inbound frame)
// ============================================================================

/// Failure to act on a single inbound frame. Logged, never fatal.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("{verb} is missing parameter {index}")]
    MissingParam { verb: String, index: usize },

    #[error(transparent)]
    Bus(#[from] BusError),
}

impl FrameError {
    /// Get a static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingParam { .. } => "MISSING_PARAM",
            Self::Bus(BusError::Subscriber { .. }) => "SUBSCRIBER_FAILED",
            Self::Bus(_) => "BUS_MISUSE",
        }
    }
}

// ============================================================================
// Startup errors
// ============================================================================

/// The plugin action table could not be assembled.
#[derive(Debug, Error)]
pub enum ActionTableError {
    #[error("command {name:?} is registered twice ({first} and {second})")]
    DuplicateCommand {
        name: String,
        first: String,
        second: String,
    },

    #[error("command name {0:?} must be a single non-empty word")]
    InvalidName(String),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_error_codes() {
        let missing = FrameError::MissingParam {
            verb: "JOIN".into(),
            index: 0,
        };
        assert_eq!(missing.error_code(), "MISSING_PARAM");
        assert_eq!(missing.to_string(), "JOIN is missing parameter 0");

        let bus = FrameError::from(BusError::UnknownKind(EventKind::Closed));
        assert_eq!(bus.error_code(), "BUS_MISUSE");
    }

    #[test]
    fn subscriber_error_includes_cause() {
        let err = BusError::Subscriber {
            kind: EventKind::Messaged,
            error: anyhow::anyhow!("boom"),
        };
        assert!(err.to_string().ends_with("boom"));
    }
}
