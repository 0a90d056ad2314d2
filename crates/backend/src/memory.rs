//! In-process key/value backend.
//!
//! Items carry a CAS counter, client flags, a logical expiry and an optional
//! lock. Expiry is recorded but never enforced by a clock; tests can observe
//! it through [`MemoryBackend::expiry`].

use rustc_hash::FxHashMap;
use tracing::debug;

use cbridge_core::{
    ArithmeticArgs, Backend, BackendResult, ConnectArgs, Counter, HandlerError, HttpArgs,
    HttpMethod, HttpResponse, HttpType, Item, KeyOutcome, MultiGetArgs, RemoveArgs, StoreArgs,
    StoreOp, TouchArgs, UnlockArgs,
};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    flags: u32,
    exp: u32,
    cas: u64,
    /// CAS handed out by the locking read, while the lock is held
    lock: Option<u64>,
}

impl Entry {
    /// A write carrying `cas` may proceed on a locked entry only if it
    /// presents the lock CAS.
    fn check_lock(&self, cas: u64) -> BackendResult<()> {
        match self.lock {
            Some(lock_cas) if lock_cas != cas => Err(HandlerError::TemporaryFailure),
            _ => Ok(()),
        }
    }

    fn check_cas(&self, cas: u64) -> BackendResult<()> {
        if cas != 0 && cas != self.cas && Some(cas) != self.lock {
            return Err(HandlerError::KeyExists);
        }
        Ok(())
    }
}

/// A single-bucket in-memory backend session.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    bucket: Option<String>,
    items: FxHashMap<Vec<u8>, Entry>,
    last_cas: u64,
}

impl MemoryBackend {
    /// Create a disconnected backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket opened by the last successful connect.
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no items are stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Recorded expiry for `key`.
    pub fn expiry(&self, key: &[u8]) -> Option<u32> {
        self.items.get(key).map(|e| e.exp)
    }

    fn next_cas(&mut self) -> u64 {
        self.last_cas += 1;
        self.last_cas
    }

    fn require_connected(&self) -> BackendResult<()> {
        if self.bucket.is_none() {
            return Err(HandlerError::NotConnected);
        }
        Ok(())
    }

    /// Only the locking read learns the lock CAS. Plain reads of a locked
    /// entry see the stored CAS, which `check_lock` refuses.
    fn get_one(&mut self, key: &[u8], exp: u32, lock: bool) -> BackendResult<Item> {
        let lock_cas = if lock { Some(self.next_cas()) } else { None };
        let entry = self.items.get_mut(key).ok_or(HandlerError::KeyNotFound)?;
        if lock_cas.is_some() {
            if entry.lock.is_some() {
                return Err(HandlerError::TemporaryFailure);
            }
            entry.lock = lock_cas;
        }
        if exp > 0 {
            entry.exp = exp;
        }
        Ok(Item {
            key: key.to_vec(),
            cas: lock_cas.unwrap_or(entry.cas),
            flags: entry.flags,
            value: entry.value.clone(),
        })
    }
}

impl Backend for MemoryBackend {
    fn connect(&mut self, args: &ConnectArgs) -> BackendResult<()> {
        if args.host.trim().is_empty() {
            return Err(HandlerError::ConnectFailed {
                reason: "no host given".to_string(),
            });
        }
        if args.bucket.is_empty() {
            return Err(HandlerError::ConnectFailed {
                reason: "no bucket given".to_string(),
            });
        }
        debug!(target: "cbridge::backend", host = %args.host, bucket = %args.bucket, "Connected");
        self.bucket = Some(args.bucket.clone());
        Ok(())
    }

    fn store(&mut self, args: &StoreArgs) -> BackendResult<u64> {
        self.require_connected()?;
        let cas = self.next_cas();

        match self.items.get_mut(&args.key) {
            Some(entry) => {
                entry.check_lock(args.cas)?;
                entry.check_cas(args.cas)?;
                match args.op {
                    StoreOp::Add => return Err(HandlerError::KeyExists),
                    StoreOp::Replace | StoreOp::Set => {
                        entry.value = args.value.clone();
                        entry.flags = args.flags;
                    }
                    StoreOp::Append => entry.value.extend_from_slice(&args.value),
                    StoreOp::Prepend => {
                        let mut value = args.value.clone();
                        value.extend_from_slice(&entry.value);
                        entry.value = value;
                    }
                }
                entry.exp = args.exp;
                entry.cas = cas;
                entry.lock = None;
            }
            None => {
                match args.op {
                    StoreOp::Replace => return Err(HandlerError::KeyNotFound),
                    StoreOp::Append | StoreOp::Prepend => return Err(HandlerError::NotStored),
                    StoreOp::Add | StoreOp::Set if args.cas != 0 => {
                        return Err(HandlerError::KeyNotFound)
                    }
                    StoreOp::Add | StoreOp::Set => {}
                }
                self.items.insert(
                    args.key.clone(),
                    Entry {
                        value: args.value.clone(),
                        flags: args.flags,
                        exp: args.exp,
                        cas,
                        lock: None,
                    },
                );
            }
        }
        Ok(cas)
    }

    fn multi_get(&mut self, args: &MultiGetArgs) -> BackendResult<Vec<KeyOutcome<Item>>> {
        self.require_connected()?;
        Ok(args
            .keys
            .iter()
            .map(|key| KeyOutcome {
                key: key.clone(),
                result: self.get_one(key, args.exp, args.lock),
            })
            .collect())
    }

    fn unlock(&mut self, args: &UnlockArgs) -> BackendResult<()> {
        self.require_connected()?;
        let entry = self.items.get_mut(&args.key).ok_or(HandlerError::KeyNotFound)?;
        match entry.lock {
            Some(lock_cas) if lock_cas == args.cas => {
                entry.lock = None;
                Ok(())
            }
            _ => Err(HandlerError::TemporaryFailure),
        }
    }

    fn touch(&mut self, args: &TouchArgs) -> BackendResult<Vec<KeyOutcome<()>>> {
        self.require_connected()?;
        Ok(args
            .entries
            .iter()
            .map(|(key, exp)| {
                let result = match self.items.get_mut(key) {
                    None => Err(HandlerError::KeyNotFound),
                    Some(entry) if entry.lock.is_some() => Err(HandlerError::TemporaryFailure),
                    Some(entry) => {
                        entry.exp = *exp;
                        Ok(())
                    }
                };
                KeyOutcome {
                    key: key.clone(),
                    result,
                }
            })
            .collect())
    }

    fn arithmetic(&mut self, args: &ArithmeticArgs) -> BackendResult<Counter> {
        self.require_connected()?;
        let cas = self.next_cas();

        let value = match self.items.get_mut(&args.key) {
            Some(entry) => {
                entry.check_lock(0)?;
                let current: u64 = std::str::from_utf8(&entry.value)
                    .ok()
                    .and_then(|s| s.trim().parse().ok())
                    .ok_or(HandlerError::DeltaBadValue)?;
                // Increments wrap at 2^64, decrements stop at zero.
                let next = if args.delta >= 0 {
                    current.wrapping_add(args.delta as u64)
                } else {
                    current.saturating_sub(args.delta.unsigned_abs())
                };
                entry.value = next.to_string().into_bytes();
                entry.cas = cas;
                if args.exp > 0 {
                    entry.exp = args.exp;
                }
                next
            }
            None if args.create => {
                self.items.insert(
                    args.key.clone(),
                    Entry {
                        value: args.initial.to_string().into_bytes(),
                        flags: 0,
                        exp: args.exp,
                        cas,
                        lock: None,
                    },
                );
                args.initial
            }
            None => return Err(HandlerError::KeyNotFound),
        };
        Ok(Counter { cas, value })
    }

    fn remove(&mut self, args: &RemoveArgs) -> BackendResult<()> {
        self.require_connected()?;
        let entry = self.items.get(&args.key).ok_or(HandlerError::KeyNotFound)?;
        entry.check_lock(args.cas)?;
        entry.check_cas(args.cas)?;
        self.items.remove(&args.key);
        Ok(())
    }

    fn http(&mut self, args: &HttpArgs) -> BackendResult<HttpResponse> {
        self.require_connected()?;
        let bucket = self.bucket.clone().unwrap_or_default();

        let (status, body) = match (args.kind, args.method) {
            (HttpType::Raw, _) => (200, args.body.clone()),
            (HttpType::View, HttpMethod::Get) if args.path.starts_with("_design/") => (
                200,
                format!("{{\"total_rows\":{},\"rows\":[]}}", self.items.len()).into_bytes(),
            ),
            (HttpType::Management, HttpMethod::Get) if args.path == "/pools" => (
                200,
                format!("{{\"bucket\":\"{}\"}}", bucket).into_bytes(),
            ),
            (HttpType::Management, HttpMethod::Post) if args.path == "/flush" => {
                self.items.clear();
                (200, Vec::new())
            }
            _ => (404, b"{\"error\":\"not_found\"}".to_vec()),
        };
        Ok(HttpResponse { status, body })
    }
}
