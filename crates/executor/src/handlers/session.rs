//! Session command handlers.

use cbridge_core::{Arguments, Backend, BackendResult, CommandId, Term};

use super::wrong_arguments;

/// Handle Connect. Returns `ok`.
pub fn connect<B: Backend>(args: Arguments, backend: &mut B) -> BackendResult<Term> {
    match args {
        Arguments::Connect(a) => {
            backend.connect(&a)?;
            Ok(Term::ok())
        }
        other => Err(wrong_arguments(CommandId::Connect, &other)),
    }
}
