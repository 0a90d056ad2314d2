//! Key/value command handlers.
//!
//! Multi-key commands report per-key failures inline as
//! `{Key, {error, Reason}}` and succeed as a whole.

use cbridge_core::{Arguments, Backend, BackendResult, CommandId, Item, KeyOutcome, Term};

use super::wrong_arguments;

// =============================================================================
// Encoding
// =============================================================================

fn encode_item(item: Item) -> Term {
    Term::tuple(vec![
        Term::Binary(item.key),
        Term::from(item.cas),
        Term::Int(i64::from(item.flags)),
        Term::Binary(item.value),
    ])
}

fn encode_outcomes<T>(outcomes: Vec<KeyOutcome<T>>, ok: impl Fn(Vec<u8>, T) -> Term) -> Term {
    Term::list(
        outcomes
            .into_iter()
            .map(|o| match o.result {
                Ok(v) => ok(o.key, v),
                Err(e) => Term::tuple(vec![Term::Binary(o.key), e.to_term()]),
            })
            .collect(),
    )
}

// =============================================================================
// Individual Handlers
// =============================================================================

/// Handle Store. Returns `{ok, Cas}`.
pub fn store<B: Backend>(args: Arguments, backend: &mut B) -> BackendResult<Term> {
    match args {
        Arguments::Store(a) => {
            let cas = backend.store(&a)?;
            Ok(Term::tuple(vec![Term::ok(), Term::from(cas)]))
        }
        other => Err(wrong_arguments(CommandId::Store, &other)),
    }
}

/// Handle MultiGet. Returns a list of `{Key, Cas, Flags, Value}` or
/// `{Key, {error, Reason}}`, in request order.
pub fn multi_get<B: Backend>(args: Arguments, backend: &mut B) -> BackendResult<Term> {
    match args {
        Arguments::MultiGet(a) => {
            let outcomes = backend.multi_get(&a)?;
            Ok(encode_outcomes(outcomes, |_, item| encode_item(item)))
        }
        other => Err(wrong_arguments(CommandId::MultiGet, &other)),
    }
}

/// Handle Unlock. Returns `ok`.
pub fn unlock<B: Backend>(args: Arguments, backend: &mut B) -> BackendResult<Term> {
    match args {
        Arguments::Unlock(a) => {
            backend.unlock(&a)?;
            Ok(Term::ok())
        }
        other => Err(wrong_arguments(CommandId::Unlock, &other)),
    }
}

/// Handle Touch. Returns a list of `{Key, ok}` or `{Key, {error, Reason}}`.
pub fn touch<B: Backend>(args: Arguments, backend: &mut B) -> BackendResult<Term> {
    match args {
        Arguments::Touch(a) => {
            let outcomes = backend.touch(&a)?;
            Ok(encode_outcomes(outcomes, |key, ()| {
                Term::tuple(vec![Term::Binary(key), Term::ok()])
            }))
        }
        other => Err(wrong_arguments(CommandId::Touch, &other)),
    }
}

/// Handle Arithmetic. Returns `{ok, Cas, Value}`.
pub fn arithmetic<B: Backend>(args: Arguments, backend: &mut B) -> BackendResult<Term> {
    match args {
        Arguments::Arithmetic(a) => {
            let counter = backend.arithmetic(&a)?;
            Ok(Term::tuple(vec![
                Term::ok(),
                Term::from(counter.cas),
                Term::from(counter.value),
            ]))
        }
        other => Err(wrong_arguments(CommandId::Arithmetic, &other)),
    }
}

/// Handle Remove. Returns `ok`.
pub fn remove<B: Backend>(args: Arguments, backend: &mut B) -> BackendResult<Term> {
    match args {
        Arguments::Remove(a) => {
            backend.remove(&a)?;
            Ok(Term::ok())
        }
        other => Err(wrong_arguments(CommandId::Remove, &other)),
    }
}
