//! Common test utilities for bridge tests

use std::sync::Arc;
use std::time::{Duration, Instant};

use cbridge::{
    ArithmeticArgs, Backend, BackendResult, CommandId, ConnectArgs, Counter, HttpArgs,
    HttpResponse, Item, KeyOutcome, MemoryBackend, MultiGetArgs, RemoveArgs, StoreArgs, Term,
    TouchArgs, UnlockArgs,
};
use parking_lot::Mutex;

/// Log of (operation, entered, exited) shared with the test body.
pub type CallLog = Arc<Mutex<Vec<(&'static str, Instant, Instant)>>>;

/// MemoryBackend that sleeps for `delay` inside every call and logs it.
pub struct SlowBackend {
    inner: MemoryBackend,
    delay: Duration,
    log: CallLog,
}

impl SlowBackend {
    pub fn new(delay: Duration) -> (Self, CallLog) {
        let log = CallLog::default();
        (
            Self {
                inner: MemoryBackend::new(),
                delay,
                log: Arc::clone(&log),
            },
            log,
        )
    }

    fn timed<T>(&mut self, op: &'static str, f: impl FnOnce(&mut MemoryBackend) -> T) -> T {
        let entered = Instant::now();
        std::thread::sleep(self.delay);
        let out = f(&mut self.inner);
        self.log.lock().push((op, entered, Instant::now()));
        out
    }
}

impl Backend for SlowBackend {
    fn connect(&mut self, args: &ConnectArgs) -> BackendResult<()> {
        self.timed("connect", |b| b.connect(args))
    }
    fn store(&mut self, args: &StoreArgs) -> BackendResult<u64> {
        self.timed("store", |b| b.store(args))
    }
    fn multi_get(&mut self, args: &MultiGetArgs) -> BackendResult<Vec<KeyOutcome<Item>>> {
        self.timed("mget", |b| b.multi_get(args))
    }
    fn unlock(&mut self, args: &UnlockArgs) -> BackendResult<()> {
        self.timed("unlock", |b| b.unlock(args))
    }
    fn touch(&mut self, args: &TouchArgs) -> BackendResult<Vec<KeyOutcome<()>>> {
        self.timed("mtouch", |b| b.touch(args))
    }
    fn arithmetic(&mut self, args: &ArithmeticArgs) -> BackendResult<Counter> {
        self.timed("arithmetic", |b| b.arithmetic(args))
    }
    fn remove(&mut self, args: &RemoveArgs) -> BackendResult<()> {
        self.timed("remove", |b| b.remove(args))
    }
    fn http(&mut self, args: &HttpArgs) -> BackendResult<HttpResponse> {
        self.timed("http", |b| b.http(args))
    }
}

/// Panics if any two logged calls overlap.
pub fn assert_no_overlap(log: &CallLog) {
    let mut calls = log.lock().clone();
    calls.sort_by_key(|(_, entered, _)| *entered);
    for pair in calls.windows(2) {
        assert!(pair[0].2 <= pair[1].1, "{} overlapped {}", pair[0].0, pair[1].0);
    }
}

pub fn connect() -> (i64, Vec<Term>) {
    (
        CommandId::Connect.as_raw(),
        vec![
            Term::binary("localhost:8091"),
            Term::binary("admin"),
            Term::binary("secret"),
            Term::binary("default"),
        ],
    )
}

/// `[Op, Key, Value, Flags, Exp, Cas]` with op = set.
pub fn set(key: &str, value: &str) -> (i64, Vec<Term>) {
    (
        CommandId::Store.as_raw(),
        vec![
            Term::Int(3),
            Term::binary(key),
            Term::binary(value),
            Term::Int(0),
            Term::Int(0),
            Term::Int(0),
        ],
    )
}

pub fn mget(keys: &[&str]) -> (i64, Vec<Term>) {
    (
        CommandId::MultiGet.as_raw(),
        vec![
            Term::list(keys.iter().map(|k| Term::binary(*k)).collect()),
            Term::Int(0),
            Term::Int(0),
        ],
    )
}
