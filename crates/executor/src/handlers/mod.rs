//! Command handlers organized by backend surface.
//!
//! Each handler unwraps its typed arguments, makes exactly one call into the
//! backend and encodes the outcome as a [`Term`](cbridge_core::Term):
//!
//! | Module | Commands |
//! |--------|----------|
//! | `session` | connect |
//! | `kv` | store, mget, unlock, mtouch, arithmetic, remove |
//! | `http` | http |

use cbridge_core::{Arguments, CommandId, HandlerError};

pub mod http;
pub mod kv;
pub mod session;

/// Error for a handler invoked with another command's arguments.
///
/// The table pairs parsers and handlers per command, so this only fires
/// when a custom table wires them inconsistently.
fn wrong_arguments(expected: CommandId, got: &Arguments) -> HandlerError {
    HandlerError::internal(format!(
        "{} handler received {} arguments",
        expected,
        got.command()
    ))
}
