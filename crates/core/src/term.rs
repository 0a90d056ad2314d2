//! Caller-side value representation.
//!
//! Requests arrive as lists of [`Term`]s and replies are built from them.
//! The bridge never interprets a term beyond what an argument parser asks
//! for, so the set of shapes is deliberately small.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value in the caller's term representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Symbolic constant such as `ok` or `error`
    Atom(String),
    /// Signed integer
    Int(i64),
    /// Raw byte string (keys, values, bodies)
    Binary(Vec<u8>),
    /// Variable-length sequence
    List(Vec<Term>),
    /// Fixed-size record
    Tuple(Vec<Term>),
}

impl Term {
    /// Build an atom.
    pub fn atom(name: &str) -> Self {
        Term::Atom(name.to_string())
    }

    /// The `ok` atom.
    pub fn ok() -> Self {
        Term::atom("ok")
    }

    /// Build a binary from anything byte-like.
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Term::Binary(bytes.into())
    }

    /// Build a tuple.
    pub fn tuple(items: Vec<Term>) -> Self {
        Term::Tuple(items)
    }

    /// Build a list.
    pub fn list(items: Vec<Term>) -> Self {
        Term::List(items)
    }

    /// `{error, Reason}`
    pub fn error(reason: &str) -> Self {
        Term::Tuple(vec![Term::atom("error"), Term::atom(reason)])
    }

    /// Integer value, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Byte contents, if this is a `Binary`.
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Term::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Elements, if this is a `List`.
    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(items) => Some(items),
            _ => None,
        }
    }

    /// Atom name, if this is an `Atom`.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(name) => Some(name),
            _ => None,
        }
    }

    /// Short name of the term's shape, used in parse error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Term::Atom(_) => "atom",
            Term::Int(_) => "integer",
            Term::Binary(_) => "binary",
            Term::List(_) => "list",
            Term::Tuple(_) => "tuple",
        }
    }
}

impl From<i64> for Term {
    fn from(v: i64) -> Self {
        Term::Int(v)
    }
}

impl From<u64> for Term {
    fn from(v: u64) -> Self {
        // Values above i64::MAX keep their bit pattern; the caller decodes
        // counters and CAS values as unsigned.
        Term::Int(v as i64)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(name) => write!(f, "{}", name),
            Term::Int(v) => write!(f, "{}", v),
            Term::Binary(b) => write!(f, "<<\"{}\">>", String::from_utf8_lossy(b)),
            Term::List(items) => {
                write!(f, "[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
            Term::Tuple(items) => {
                write!(f, "{{")?;
                write_joined(f, items)?;
                write!(f, "}}")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Term]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
