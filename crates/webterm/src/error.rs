//! Error types for Webterm
//!
//! Most failures in a terminal session are not errors from the caller's point
//! of view: a blocked command, a missing `cd` target or a process that failed
//! to start all end up as output lines inside a normal
//! [`ExecutionResult`](crate::ExecutionResult). The dispatcher still works with
//! these typed variants internally so every outcome has a single place where
//! it is rendered.
//!
//! Only store failures ([`Error::Io`], [`Error::Serialization`],
//! [`Error::InvalidSessionId`]) propagate out of [`Terminal`](crate::Terminal).

use std::time::Duration;
use thiserror::Error;

/// Result type alias using Webterm's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Webterm error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Command matched a denylist pattern.
    #[error("command blocked by security policy: {pattern}")]
    Blocked { pattern: String },

    /// `cd` target does not exist or is not a directory.
    ///
    /// Carries the target as the user typed it, before `~` substitution and
    /// canonicalization.
    #[error("directory not found: {target}")]
    NotFound { target: String },

    /// The host interpreter could not be started.
    #[error("could not execute command: {0}")]
    Spawn(String),

    /// The subprocess outlived the configured timeout and was killed.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// Inbound action name is not part of the operation set.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Alias names are restricted to `[A-Za-z0-9_]+`.
    #[error("invalid alias name: {0}")]
    InvalidAliasName(String),

    /// Session identifiers are used as store keys and file names.
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    /// I/O error from the filesystem or the session store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Short machine-readable category, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Blocked { .. } => "blocked",
            Error::NotFound { .. } => "not_found",
            Error::Spawn(_) => "spawn_failure",
            Error::Timeout(_) => "timeout",
            Error::UnknownOperation(_) => "unknown_operation",
            Error::InvalidAliasName(_) => "invalid_alias_name",
            Error::InvalidSessionId(_) => "invalid_session_id",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_human_readable() {
        let err = Error::NotFound {
            target: "~/missing".to_string(),
        };
        assert_eq!(err.to_string(), "directory not found: ~/missing");

        let err = Error::Timeout(Duration::from_secs(2));
        assert_eq!(err.to_string(), "command timed out after 2s");
    }

    #[test]
    fn test_kind() {
        assert_eq!(Error::Spawn("x".into()).kind(), "spawn_failure");
        assert_eq!(
            Error::Blocked {
                pattern: "sudo".into()
            }
            .kind(),
            "blocked"
        );
    }
}
