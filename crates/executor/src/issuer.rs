//! Issuer identity and reply mailboxes.
//!
//! An [`Issuer`] is the address a worker delivers a task's [`Reply`] to.
//! Each issuer is paired with exactly one [`Mailbox`]. Sending never
//! blocks, so the worker thread cannot be stalled by a slow receiver.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use cbridge_core::Reply;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::debug;

static NEXT_ISSUER: AtomicU64 = AtomicU64::new(1);

/// Process-unique issuer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssuerId(u64);

impl fmt::Display for IssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "issuer-{}", self.0)
    }
}

/// Create a connected issuer / mailbox pair.
pub fn mailbox() -> (Issuer, Mailbox) {
    let id = IssuerId(NEXT_ISSUER.fetch_add(1, Ordering::Relaxed));
    let (tx, rx) = mpsc::unbounded_channel();
    (Issuer { id, tx }, Mailbox { id, rx })
}

/// The requester entitled to receive a task's asynchronous result.
#[derive(Clone)]
pub struct Issuer {
    id: IssuerId,
    tx: UnboundedSender<Reply>,
}

impl Issuer {
    /// Identifier shared with the paired mailbox.
    pub fn id(&self) -> IssuerId {
        self.id
    }

    /// True once the paired mailbox has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Deliver a reply. Returns `false` if nobody is listening any more.
    pub(crate) fn deliver(&self, reply: Reply) -> bool {
        if self.tx.send(reply).is_err() {
            debug!(target: "cbridge::worker", issuer = %self.id, "Issuer gone, reply dropped");
            return false;
        }
        true
    }
}

impl fmt::Debug for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Issuer").field("id", &self.id).finish()
    }
}

/// Receiving end of an issuer's replies.
///
/// Replies arrive in the order the worker produced them.
pub struct Mailbox {
    id: IssuerId,
    rx: UnboundedReceiver<Reply>,
}

impl Mailbox {
    /// Identifier shared with the paired issuer.
    pub fn id(&self) -> IssuerId {
        self.id
    }

    /// Wait for the next reply from async code.
    ///
    /// Returns `None` once every issuer clone and every task holding one
    /// has been dropped.
    pub async fn recv(&mut self) -> Option<Reply> {
        self.rx.recv().await
    }

    /// Wait for the next reply from a plain thread.
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<Reply> {
        self.rx.blocking_recv()
    }

    /// Take a reply if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Reply> {
        match self.rx.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox").field("id", &self.id).finish()
    }
}
