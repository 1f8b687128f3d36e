//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// UserId validation error
    #[error("UserId cannot be empty")]
    UserIdEmpty,

    /// UserId too long error
    #[error("UserId cannot exceed {max} characters (got {actual})")]
    UserIdTooLong { max: usize, actual: usize },

    /// ConnectionId validation error
    #[error("ConnectionId cannot be empty")]
    ConnectionIdEmpty,

    /// ConnectionId invalid format error (not a valid UUID format)
    #[error("ConnectionId must be a valid UUID format (got: {0})")]
    ConnectionIdInvalidFormat(String),
}

/// Errors related to playback state and command validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlaybackError {
    /// Neither `status` nor `isPlaying` was supplied
    #[error("Transport status is required")]
    MissingStatus,

    /// Neither `position` nor `currentTime` was supplied
    #[error("Playback position is required")]
    MissingPosition,

    /// Unrecognized transport status string
    #[error("Unknown transport status: '{0}' (expected playing or paused)")]
    UnknownStatus(String),

    /// Unrecognized media kind string
    #[error("Unknown media kind: '{0}' (expected audio or video)")]
    UnknownMediaKind(String),

    /// Seconds value that is negative, NaN or infinite
    #[error("{field} must be a finite, non-negative number of seconds (got {value})")]
    InvalidSeconds { field: &'static str, value: f64 },

    /// Command name outside the closed command set
    #[error("Unknown command: '{0}' (expected one of play, pause, next, previous, seek)")]
    UnknownCommand(String),

    /// `seek` without a usable target position
    #[error("seek requires a finite, non-negative value")]
    MissingSeekValue,
}

/// Errors returned by token verification
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token in the handshake or request
    #[error("Authentication token is missing")]
    MissingToken,

    /// Token failed signature, expiry or claim checks
    #[error("Authentication token is invalid: {0}")]
    InvalidToken(String),
}

/// Errors raised by repository implementations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Connection is not present in the session registry
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),
}
