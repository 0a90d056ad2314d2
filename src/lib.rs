//! cbridge - asynchronous task-execution bridge
//!
//! Accepts command requests from callers that must never block, runs each as
//! a task against a blocking backend, and routes the result back to the
//! caller that issued it.
//!
//! # Quick Start
//!
//! ```ignore
//! use cbridge::{mailbox, BridgeConfig, Handle, MemoryBackend, Term};
//!
//! let handle = Handle::create(MemoryBackend::new(), &BridgeConfig::worker())?;
//! let (issuer, mut replies) = mailbox();
//!
//! // Connect: [Host, Username, Password, Bucket]
//! handle.submit(&issuer, 0, vec![
//!     Term::binary("localhost:8091"),
//!     Term::binary(""),
//!     Term::binary(""),
//!     Term::binary("default"),
//! ])?;
//! assert!(replies.blocking_recv().unwrap().is_ok());
//!
//! handle.destroy()?;
//! ```
//!
//! # Architecture
//!
//! Everything goes through a [`Handle`], which owns the backend and one of
//! two executors chosen by [`BridgeConfig`]. The vocabulary types (terms,
//! argument structures, the backend contract) live in `cbridge-core`; the
//! in-process [`MemoryBackend`] lives in `cbridge-backend`.

// Re-export the public API from cbridge-executor
pub use cbridge_executor::*;

pub use cbridge_backend::MemoryBackend;
pub use cbridge_core::{
    args, Arguments, ArithmeticArgs, BackendResult, ConnectArgs, Counter, HttpArgs, HttpMethod,
    HttpResponse, HttpType, Item, KeyOutcome, MultiGetArgs, RemoveArgs, StoreArgs, StoreOp,
    TouchArgs, UnlockArgs,
};
