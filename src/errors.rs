//! Error types for the Accordo negotiation engine
//!
//! This module defines every error the engine's pure components and the
//! message pipeline can produce, with enough structure for callers to
//! decide whether to retry, surface to a user, or log and move on.

use thiserror::Error;

/// Result type alias for Accordo engine operations.
pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// Errors produced by the negotiation engine.
///
/// Variants map onto the error kinds in the design: `NotFound`, `Conflict`,
/// `Validation`, `DependencyTransient`, `DependencyPermanent`, and
/// `Internal`. None of these leak implementation details of whatever
/// backs the `Store`, `LLMClient`, `Notifier`, or `Reporter` capabilities.
#[derive(Error, Debug)]
pub enum NegotiationError {
    /// A referenced entity (deal, message, requisition, vendor profile)
    /// does not exist. Never auto-created.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was not found.
        entity: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// The requested action requires a deal in a particular status and the
    /// deal is not in it, or a round race was detected.
    #[error("conflict: {message} (current status: {current_status})")]
    Conflict {
        /// Description of the conflicting action.
        message: String,
        /// The deal's current status at the time of the conflict.
        current_status: String,
    },

    /// Input failed validation before any mutation was attempted.
    #[error("validation failed for {field}: {reason}")]
    Validation {
        /// Field or parameter that failed validation.
        field: String,
        /// Reason the value was rejected.
        reason: String,
    },

    /// A dependency (Store, LLM) failed in a way that is plausibly
    /// retryable: timeouts, transient unavailability.
    #[error("dependency transient error: {message}")]
    DependencyTransient {
        /// Description of the transient failure.
        message: String,
    },

    /// A dependency failed in a way that retrying will not fix, e.g. a
    /// persisted config blob that failed to deserialize.
    #[error("dependency permanent error: {message}")]
    DependencyPermanent {
        /// Description of the permanent failure.
        message: String,
    },

    /// Serialization/deserialization of a persisted JSON blob failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An error that should never happen in correct operation.
    #[error("internal engine error: {message}")]
    Internal {
        /// Description of the internal failure.
        message: String,
    },
}

impl NegotiationError {
    /// Build a [`NegotiationError::NotFound`].
    pub fn not_found<S: Into<String>>(entity: S, id: S) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Build a [`NegotiationError::Conflict`].
    pub fn conflict<S: Into<String>>(message: S, current_status: S) -> Self {
        Self::Conflict {
            message: message.into(),
            current_status: current_status.into(),
        }
    }

    /// Build a [`NegotiationError::Validation`].
    pub fn validation<S: Into<String>>(field: S, reason: S) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`NegotiationError::DependencyTransient`].
    pub fn dependency_transient<S: Into<String>>(message: S) -> Self {
        Self::DependencyTransient {
            message: message.into(),
        }
    }

    /// Build a [`NegotiationError::DependencyPermanent`].
    pub fn dependency_permanent<S: Into<String>>(message: S) -> Self {
        Self::DependencyPermanent {
            message: message.into(),
        }
    }

    /// Build a [`NegotiationError::Internal`].
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether a caller may reasonably retry the operation that produced
    /// this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DependencyTransient { .. })
    }

    /// Severity level, useful for log routing.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound { .. } => ErrorSeverity::Info,
            Self::Conflict { .. } => ErrorSeverity::Warning,
            Self::Validation { .. } => ErrorSeverity::Warning,
            Self::DependencyTransient { .. } => ErrorSeverity::Warning,
            Self::DependencyPermanent { .. } => ErrorSeverity::Error,
            Self::Serialization(_) => ErrorSeverity::Error,
            Self::Internal { .. } => ErrorSeverity::Critical,
        }
    }
}

/// Severity levels used for log routing and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Expected, doesn't need action.
    Info,
    /// Should be logged but the round can still proceed via fallback.
    Warning,
    /// Prevents the requested operation from completing.
    Error,
    /// Needs immediate attention; something assumed-invariant broke.
    Critical,
}

impl ErrorSeverity {
    /// String form, for structured log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = NegotiationError::validation("weights", "must sum to 1.0");
        match error {
            NegotiationError::Validation { field, .. } => assert_eq!(field, "weights"),
            _ => panic!("expected Validation error"),
        }
    }

    #[test]
    fn test_retryable() {
        assert!(NegotiationError::dependency_transient("llm timeout").is_retryable());
        assert!(!NegotiationError::validation("x", "y").is_retryable());
        assert!(!NegotiationError::dependency_permanent("bad config").is_retryable());
    }

    #[test]
    fn test_severity() {
        assert_eq!(
            NegotiationError::internal("unreachable").severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(
            NegotiationError::not_found("Deal", "123").severity(),
            ErrorSeverity::Info
        );
        assert_eq!(ErrorSeverity::Critical.as_str(), "CRITICAL");
    }
}
