//! # cbridge executor
//!
//! Turns command requests from callers that must not block into tasks run
//! against a blocking backend, and routes each result back to its issuer.
//!
//! ## Quick Start
//!
//! ```text
//! use cbridge_executor::{mailbox, BridgeConfig, Handle};
//!
//! let handle = Handle::create(backend, &BridgeConfig::worker())?;
//! let (issuer, mut replies) = mailbox();
//!
//! handle.submit(&issuer, 1, args)?;      // Store; returns immediately
//! let reply = replies.blocking_recv();   // {ok, Cas}
//!
//! handle.destroy()?;                     // drains, then drops the backend
//! ```
//!
//! ## Execution Strategies
//!
//! | Strategy | Runs on | Ordering | Reply path |
//! |----------|---------|----------|------------|
//! | **worker** | one dedicated thread per handle | FIFO | issuer mailbox |
//! | **dirty** | tokio blocking pool | none, serialized by a mutex | [`Completion`] |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod dirty;
mod handle;
mod issuer;
mod queue;
mod table;
mod task;
mod worker;

// Handler modules
pub mod handlers;

// Test modules
#[cfg(test)]
mod tests;

// =============================================================================
// Public API
// =============================================================================

pub use config::{BridgeConfig, ExecutionStrategy, CONFIG_FILE_NAME, DEFAULT_WORKER_THREAD_NAME};
pub use dirty::{Completion, DirtyOffload};
pub use handle::{Accepted, Handle, HandleBuilder, HandleId, HandleState};
pub use issuer::{mailbox, Issuer, IssuerId, Mailbox};
pub use queue::{Dequeued, TaskQueue};
pub use table::{ArgParser, CommandEntry, CommandTable, Handler};
pub use task::Task;
pub use worker::QueueWorker;

// Re-export the shared vocabulary so callers need only this crate.
pub use cbridge_core::{Backend, CommandId, Error, HandlerError, Reply, Result, Term};
