//! The backend contract.
//!
//! A [`Backend`] is one native client session. It is `Send` (it can be
//! moved onto a worker thread) but deliberately not required to be `Sync`:
//! the executors guarantee that at most one thread calls into a given
//! instance at a time.
//!
//! Every method may block for as long as the underlying I/O takes.

use serde::{Deserialize, Serialize};

use crate::args::{
    ArithmeticArgs, ConnectArgs, HttpArgs, MultiGetArgs, RemoveArgs, StoreArgs, TouchArgs,
    UnlockArgs,
};
use crate::error::HandlerError;

/// Result type alias for backend operations
pub type BackendResult<T> = std::result::Result<T, HandlerError>;

/// A fetched item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item key
    pub key: Vec<u8>,
    /// CAS at the time of the read (the lock CAS for locking reads)
    pub cas: u64,
    /// Client flags
    pub flags: u32,
    /// Item value
    pub value: Vec<u8>,
}

/// Per-key outcome of a multi-key operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOutcome<T> {
    /// Key the outcome belongs to
    pub key: Vec<u8>,
    /// What happened to it
    pub result: BackendResult<T>,
}

/// Counter state after an arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// New CAS
    pub cas: u64,
    /// New counter value
    pub value: u64,
}

/// Response to an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

/// A native backend session.
///
/// Whole-operation failures are returned as `Err`. Multi-key operations
/// report per-key failures inside their [`KeyOutcome`]s and only fail as a
/// whole when the operation could not be attempted at all.
pub trait Backend: Send + 'static {
    /// Open the session.
    fn connect(&mut self, args: &ConnectArgs) -> BackendResult<()>;

    /// Write an item; returns the new CAS.
    fn store(&mut self, args: &StoreArgs) -> BackendResult<u64>;

    /// Read several items.
    fn multi_get(&mut self, args: &MultiGetArgs) -> BackendResult<Vec<KeyOutcome<Item>>>;

    /// Release a lock.
    fn unlock(&mut self, args: &UnlockArgs) -> BackendResult<()>;

    /// Update expiries.
    fn touch(&mut self, args: &TouchArgs) -> BackendResult<Vec<KeyOutcome<()>>>;

    /// Apply a counter delta.
    fn arithmetic(&mut self, args: &ArithmeticArgs) -> BackendResult<Counter>;

    /// Delete an item.
    fn remove(&mut self, args: &RemoveArgs) -> BackendResult<()>;

    /// Issue an HTTP request.
    fn http(&mut self, args: &HttpArgs) -> BackendResult<HttpResponse>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn connect(&mut self, args: &ConnectArgs) -> BackendResult<()> {
        (**self).connect(args)
    }

    fn store(&mut self, args: &StoreArgs) -> BackendResult<u64> {
        (**self).store(args)
    }

    fn multi_get(&mut self, args: &MultiGetArgs) -> BackendResult<Vec<KeyOutcome<Item>>> {
        (**self).multi_get(args)
    }

    fn unlock(&mut self, args: &UnlockArgs) -> BackendResult<()> {
        (**self).unlock(args)
    }

    fn touch(&mut self, args: &TouchArgs) -> BackendResult<Vec<KeyOutcome<()>>> {
        (**self).touch(args)
    }

    fn arithmetic(&mut self, args: &ArithmeticArgs) -> BackendResult<Counter> {
        (**self).arithmetic(args)
    }

    fn remove(&mut self, args: &RemoveArgs) -> BackendResult<()> {
        (**self).remove(args)
    }

    fn http(&mut self, args: &HttpArgs) -> BackendResult<HttpResponse> {
        (**self).http(args)
    }
}
