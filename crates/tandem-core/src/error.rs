// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tandem matchmaking service.

use thiserror::Error;

use crate::types::ParticipantId;

/// The primary error type used across all Tandem traits and core operations.
#[derive(Debug, Error)]
pub enum TandemError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Delivery channel errors (send failure, connection dropped, malformed frame).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A participant's delivery channel could not be resolved or written to.
    ///
    /// This is the expected, common-case failure: the counterpart disappeared
    /// between enrolling and being matched. Callers degrade to marking the
    /// participant inaccessible rather than retrying.
    #[error("participant {participant} is unreachable")]
    Unreachable { participant: ParticipantId },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TandemError {
    /// True when the error means a specific counterpart cannot be delivered to.
    ///
    /// Both the dedicated [`TandemError::Unreachable`] variant and generic
    /// channel failures count: a send that errors for any reason is treated
    /// as a disappeared partner, never retried.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            TandemError::Unreachable { .. } | TandemError::Channel { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_classification() {
        let unreachable = TandemError::Unreachable {
            participant: ParticipantId(7),
        };
        let channel = TandemError::Channel {
            message: "connection reset".into(),
            source: None,
        };
        let storage = TandemError::Storage {
            source: Box::new(std::io::Error::other("disk")),
        };

        assert!(unreachable.is_unreachable());
        assert!(channel.is_unreachable());
        assert!(!storage.is_unreachable());
        assert!(!TandemError::Internal("x".into()).is_unreachable());
    }

    #[test]
    fn display_messages() {
        let err = TandemError::Unreachable {
            participant: ParticipantId(42),
        };
        assert_eq!(err.to_string(), "participant 42 is unreachable");

        let err = TandemError::Config("bad port".into());
        assert_eq!(err.to_string(), "configuration error: bad port");
    }
}
