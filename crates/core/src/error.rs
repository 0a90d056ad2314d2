//! Error types for cbridge
//!
//! Two families of failure exist and they travel on different paths:
//!
//! | Type | Raised | Surfaced |
//! |------|--------|----------|
//! | [`Error`] | admission, lifecycle, configuration | synchronously, to the caller |
//! | [`HandlerError`] | while a task runs | asynchronously, as an error [`Reply`](crate::Reply) |
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::CommandId;
use crate::term::Term;

/// Result type alias for cbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Synchronous failures of the bridge itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The command id is not in the command table
    #[error("invalid command: {command}")]
    InvalidCommand {
        /// Raw id the caller sent
        command: i64,
    },

    /// The argument list does not match what the command expects
    #[error("invalid arguments for {command}: {reason}")]
    ParseError {
        /// Command whose parser rejected the arguments
        command: CommandId,
        /// What was wrong
        reason: String,
    },

    /// A handle could not be constructed
    #[error("handle initialization failed: {reason}")]
    InitError {
        /// What failed
        reason: String,
    },

    /// The handle is tearing down and accepts no new work
    #[error("handle is shutting down")]
    HandleShuttingDown,

    /// The handle has been destroyed
    #[error("handle has been destroyed")]
    HandleDestroyed,

    /// A configuration value is out of range
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong
        reason: String,
    },

    /// Reply encoding or decoding failed
    #[error("serialization error: {reason}")]
    Serialization {
        /// Underlying codec message
        reason: String,
    },
}

impl Error {
    /// Build a parse error for `command`.
    pub fn parse(command: CommandId, reason: impl Into<String>) -> Self {
        Error::ParseError {
            command,
            reason: reason.into(),
        }
    }

    /// Build an initialization error.
    pub fn init(reason: impl Into<String>) -> Self {
        Error::InitError {
            reason: reason.into(),
        }
    }

    /// True for errors that reject a request at admission.
    ///
    /// A rejected request never produces a later reply.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::InvalidCommand { .. } | Error::ParseError { .. })
    }

    /// Caller-side encoding of this error.
    ///
    /// Rejections become the bare `badarg` atom; everything else becomes
    /// `{error, Reason}`.
    pub fn to_term(&self) -> Term {
        match self {
            Error::InvalidCommand { .. } | Error::ParseError { .. } => Term::atom("badarg"),
            Error::InitError { .. } => Term::error("init_failed"),
            Error::HandleShuttingDown => Term::error("shutting_down"),
            Error::HandleDestroyed => Term::error("destroyed"),
            Error::InvalidConfig { .. } => Term::error("invalid_config"),
            Error::Serialization { .. } => Term::error("serialization"),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization {
            reason: e.to_string(),
        }
    }
}

/// Failures reported by a backend handler while a task executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum HandlerError {
    /// An operation other than connect ran before a successful connect
    #[error("backend is not connected")]
    NotConnected,

    /// The backend refused the connection
    #[error("connection failed: {reason}")]
    ConnectFailed {
        /// Backend message
        reason: String,
    },

    /// Key does not exist
    #[error("key not found")]
    KeyNotFound,

    /// Key exists, or the supplied CAS does not match
    #[error("key exists or CAS mismatch")]
    KeyExists,

    /// Item is locked or the backend is temporarily unable to serve it
    #[error("temporary failure")]
    TemporaryFailure,

    /// Arithmetic on a value that is not a number
    #[error("value is not a number")]
    DeltaBadValue,

    /// Append or prepend on a missing item
    #[error("item not stored")]
    NotStored,

    /// The backend rejected an argument the parser could not check
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Backend message
        reason: String,
    },

    /// Bug or invariant violation inside the handler or executor
    #[error("internal error: {reason}")]
    Internal {
        /// What went wrong
        reason: String,
    },
}

impl HandlerError {
    /// Build an internal error.
    pub fn internal(reason: impl Into<String>) -> Self {
        HandlerError::Internal {
            reason: reason.into(),
        }
    }

    /// Reason atom delivered to the caller.
    pub fn reason(&self) -> &'static str {
        match self {
            HandlerError::NotConnected => "not_connected",
            HandlerError::ConnectFailed { .. } => "connect_failed",
            HandlerError::KeyNotFound => "key_enoent",
            HandlerError::KeyExists => "key_eexists",
            HandlerError::TemporaryFailure => "etmpfail",
            HandlerError::DeltaBadValue => "delta_badval",
            HandlerError::NotStored => "not_stored",
            HandlerError::InvalidArgument { .. } => "einval",
            HandlerError::Internal { .. } => "internal",
        }
    }

    /// `{error, Reason}`
    pub fn to_term(&self) -> Term {
        Term::error(self.reason())
    }
}
