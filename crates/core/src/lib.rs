//! Core types for cbridge
//!
//! This crate defines the vocabulary shared by every layer of the bridge:
//! - Term: the caller-side value representation carried in requests and replies
//! - CommandId: the closed set of commands the bridge accepts
//! - Arguments: typed argument structures and their parsers
//! - Reply: the tagged result delivered back to the issuer
//! - Backend: the contract a native backend instance must fulfil
//! - Error / HandlerError: admission, lifecycle and execution failures

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod args;
pub mod backend;
pub mod command;
pub mod error;
pub mod reply;
pub mod term;

pub use args::{
    Arguments, ArithmeticArgs, ConnectArgs, HttpArgs, HttpMethod, HttpType, MultiGetArgs,
    RemoveArgs, StoreArgs, StoreOp, TouchArgs, UnlockArgs,
};
pub use backend::{Backend, BackendResult, Counter, HttpResponse, Item, KeyOutcome};
pub use command::CommandId;
pub use error::{Error, HandlerError, Result};
pub use reply::Reply;
pub use term::Term;
