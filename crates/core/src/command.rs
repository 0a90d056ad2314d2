//! Command identifiers.
//!
//! Callers address commands by integer. The integer is resolved to a
//! [`CommandId`] exactly once, at admission; everything past admission
//! works with the enum and can never see an out-of-range id.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The closed set of commands the bridge accepts.
///
/// Discriminants are the wire values used by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandId {
    /// Open the backend session
    Connect = 0,
    /// Add / replace / set / append / prepend a value
    Store = 1,
    /// Fetch several keys, optionally locking or touching them
    MultiGet = 2,
    /// Release a lock taken by a locking get
    Unlock = 3,
    /// Update expiry on several keys
    Touch = 4,
    /// Increment or decrement a counter
    Arithmetic = 5,
    /// Delete a key
    Remove = 6,
    /// Issue an HTTP request against the backend's REST surface
    Http = 7,
}

impl CommandId {
    /// Number of commands.
    pub const COUNT: usize = 8;

    /// Every command, in wire order.
    pub const ALL: [CommandId; CommandId::COUNT] = [
        CommandId::Connect,
        CommandId::Store,
        CommandId::MultiGet,
        CommandId::Unlock,
        CommandId::Touch,
        CommandId::Arithmetic,
        CommandId::Remove,
        CommandId::Http,
    ];

    /// Resolve a raw wire value. Returns `None` for anything outside the set.
    pub fn from_raw(raw: i64) -> Option<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Wire value.
    pub fn as_raw(self) -> i64 {
        self as u8 as i64
    }

    /// Dense index into per-command tables; always `< COUNT`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lower-case command name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            CommandId::Connect => "connect",
            CommandId::Store => "store",
            CommandId::MultiGet => "mget",
            CommandId::Unlock => "unlock",
            CommandId::Touch => "mtouch",
            CommandId::Arithmetic => "arithmetic",
            CommandId::Remove => "remove",
            CommandId::Http => "http",
        }
    }
}

impl TryFrom<i64> for CommandId {
    type Error = Error;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or(Error::InvalidCommand { command: raw })
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
