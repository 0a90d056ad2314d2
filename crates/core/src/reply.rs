//! Tagged task results.
//!
//! Success and failure travel on the same delivery path; the receiver tells
//! them apart by the [`Reply`] tag, never by channel.

use serde::{Deserialize, Serialize};

use crate::backend::BackendResult;
use crate::error::{HandlerError, Result};
use crate::term::Term;

/// The single outcome delivered for every accepted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Handler succeeded; payload is the encoded result
    Ok(Term),
    /// Handler failed; payload is `{error, Reason}`
    Error(Term),
}

impl Reply {
    /// Encode a handler result.
    pub fn from_result(result: BackendResult<Term>) -> Self {
        match result {
            Ok(term) => Reply::Ok(term),
            Err(e) => Reply::from(e),
        }
    }

    /// Internal-error reply.
    pub fn internal(reason: impl Into<String>) -> Self {
        Reply::from(HandlerError::internal(reason))
    }

    /// True for the success tag.
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }

    /// The payload regardless of tag.
    pub fn payload(&self) -> &Term {
        match self {
            Reply::Ok(t) | Reply::Error(t) => t,
        }
    }

    /// Serialize for delivery across a process boundary.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Inverse of [`Reply::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl From<HandlerError> for Reply {
    fn from(e: HandlerError) -> Self {
        Reply::Error(e.to_term())
    }
}
