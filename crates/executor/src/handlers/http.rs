//! HTTP command handler.

use cbridge_core::{Arguments, Backend, BackendResult, CommandId, Term};

use super::wrong_arguments;

/// Handle Http. Returns `{ok, Status, Body}`.
pub fn http<B: Backend>(args: Arguments, backend: &mut B) -> BackendResult<Term> {
    match args {
        Arguments::Http(a) => {
            let response = backend.http(&a)?;
            Ok(Term::tuple(vec![
                Term::ok(),
                Term::Int(i64::from(response.status)),
                Term::Binary(response.body),
            ]))
        }
        other => Err(wrong_arguments(CommandId::Http, &other)),
    }
}
