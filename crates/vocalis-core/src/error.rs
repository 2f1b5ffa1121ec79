// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Vocalis.

use thiserror::Error;

/// The primary error type used across all Vocalis adapter traits and core operations.
#[derive(Debug, Error)]
pub enum VocalisError {
    /// Configuration errors (invalid TOML, missing credentials, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An embedding, speech, or LLM provider call failed (network, quota, bad response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A single unit of work exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The operation was aborted by the user or the system. A terminal state, not a fault.
    #[error("operation cancelled")]
    Cancelled,

    /// A response carried data belonging to a different (avatar, user) pair.
    #[error("tenant isolation violation: expected {expected}, found {found}")]
    IsolationViolation { expected: String, found: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VocalisError {
    /// Convenience constructor for provider failures without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        VocalisError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Whether callers may degrade gracefully instead of aborting.
    ///
    /// Isolation violations and configuration errors are never recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VocalisError::Provider { .. }
                | VocalisError::Timeout { .. }
                | VocalisError::Storage { .. }
        )
    }

    /// True for the `Cancelled` terminal state.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, VocalisError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(VocalisError::provider("quota").is_recoverable());
        assert!(VocalisError::Timeout {
            duration: std::time::Duration::from_secs(1)
        }
        .is_recoverable());
        assert!(!VocalisError::Cancelled.is_recoverable());
        assert!(!VocalisError::IsolationViolation {
            expected: "a/u".into(),
            found: "b/u".into(),
        }
        .is_recoverable());
        assert!(!VocalisError::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn isolation_violation_message_names_both_scopes() {
        let err = VocalisError::IsolationViolation {
            expected: "avatar-1/user-1".into(),
            found: "avatar-2/user-1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("avatar-1/user-1"));
        assert!(msg.contains("avatar-2/user-1"));
    }
}
