// src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    // Lookup errors
    #[error("no cryptocurrency associated with this address: {0}")]
    NotAssociated(String),

    #[error("network error: {0}")]
    Transport(String),

    // Detection errors; absorbed inside the enrichment service and
    // never surfaced as a blocking failure.
    #[error("mixing detection unavailable: {0}")]
    DetectionUnavailable(String),

    // Selection errors
    #[error("cannot determine a counterparty for the selected transfer")]
    AmbiguousSelection,

    // Validation errors
    #[error("empty wallet address")]
    EmptyAddress,

    // Expansion errors
    #[error("could not fetch either endpoint of edge {from} -> {to}")]
    ExpansionFailed { from: String, to: String },
}

impl TraceError {
    /// Whether retrying the same action might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TraceError::Transport(_)
                | TraceError::DetectionUnavailable(_)
                | TraceError::ExpansionFailed { .. }
        )
    }

    /// Errors that carry a message meant for the analyst rather than
    /// the diagnostics log.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            TraceError::NotAssociated(_)
                | TraceError::AmbiguousSelection
                | TraceError::EmptyAddress
        )
    }

    /// Error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            TraceError::NotAssociated(_) => "lookup",
            TraceError::Transport(_) => "network",
            TraceError::DetectionUnavailable(_) => "detection",
            TraceError::AmbiguousSelection => "selection",
            TraceError::EmptyAddress => "validation",
            TraceError::ExpansionFailed { .. } => "expansion",
        }
    }
}

pub type TraceResult<T> = Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_is_retryable_not_associated_is_not() {
        assert!(TraceError::Transport("timeout".into()).is_retryable());
        assert!(!TraceError::NotAssociated("1abc".into()).is_retryable());
    }

    #[test]
    fn categories_cover_taxonomy() {
        assert_eq!(TraceError::NotAssociated("x".into()).category(), "lookup");
        assert_eq!(TraceError::AmbiguousSelection.category(), "selection");
        assert!(TraceError::NotAssociated("x".into()).is_user_facing());
        assert!(!TraceError::Transport("x".into()).is_user_facing());
    }
}
