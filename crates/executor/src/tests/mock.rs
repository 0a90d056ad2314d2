//! Recording backend used by the executor tests.
//!
//! Wraps [`MemoryBackend`], sleeps inside every call and records when each
//! call entered and left, plus the highest number of calls ever active at
//! once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

use cbridge_backend::MemoryBackend;
use cbridge_core::{
    ArithmeticArgs, Backend, BackendResult, ConnectArgs, Counter, HttpArgs, HttpResponse, Item,
    KeyOutcome, MultiGetArgs, RemoveArgs, StoreArgs, Term, TouchArgs, UnlockArgs,
};
use parking_lot::Mutex;

use crate::CommandId;

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct Call {
    pub op: &'static str,
    pub key: Vec<u8>,
    pub entered: Instant,
    pub exited: Instant,
}

/// Shared view of everything a [`RecordingBackend`] did.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.calls.lock().iter().map(|c| c.key.clone()).collect()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Panics if any two recorded calls overlap in time.
    pub fn assert_serialized(&self) {
        let mut calls = self.calls();
        calls.sort_by_key(|c| c.entered);
        for pair in calls.windows(2) {
            assert!(
                pair[0].exited <= pair[1].entered,
                "backend calls overlapped: {:?} and {:?}",
                pair[0].op,
                pair[1].op
            );
        }
        assert!(self.max_active() <= 1);
    }
}

pub struct RecordingBackend {
    inner: MemoryBackend,
    delay: Duration,
    gate: Option<Arc<Barrier>>,
    recorder: Arc<Recorder>,
}

impl RecordingBackend {
    pub fn new(delay: Duration) -> (Self, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let backend = Self {
            inner: MemoryBackend::new(),
            delay,
            gate: None,
            recorder: Arc::clone(&recorder),
        };
        (backend, recorder)
    }

    /// Like `new`, but every call first waits on `gate`.
    pub fn gated(gate: Arc<Barrier>) -> (Self, Arc<Recorder>) {
        let (mut backend, recorder) = Self::new(Duration::ZERO);
        backend.gate = Some(gate);
        (backend, recorder)
    }

    fn record<T>(
        &mut self,
        op: &'static str,
        key: &[u8],
        f: impl FnOnce(&mut MemoryBackend) -> T,
    ) -> T {
        let entered = Instant::now();
        let now_active = self.recorder.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.recorder.max_active.fetch_max(now_active, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.wait();
        }
        std::thread::sleep(self.delay);
        let out = f(&mut self.inner);

        self.recorder.active.fetch_sub(1, Ordering::SeqCst);
        self.recorder.calls.lock().push(Call {
            op,
            key: key.to_vec(),
            entered,
            exited: Instant::now(),
        });
        out
    }
}

impl Backend for RecordingBackend {
    fn connect(&mut self, args: &ConnectArgs) -> BackendResult<()> {
        self.record("connect", b"", |b| b.connect(args))
    }

    fn store(&mut self, args: &StoreArgs) -> BackendResult<u64> {
        self.record("store", &args.key, |b| b.store(args))
    }

    fn multi_get(&mut self, args: &MultiGetArgs) -> BackendResult<Vec<KeyOutcome<Item>>> {
        let key = args.keys.first().cloned().unwrap_or_default();
        self.record("mget", &key, |b| b.multi_get(args))
    }

    fn unlock(&mut self, args: &UnlockArgs) -> BackendResult<()> {
        self.record("unlock", &args.key, |b| b.unlock(args))
    }

    fn touch(&mut self, args: &TouchArgs) -> BackendResult<Vec<KeyOutcome<()>>> {
        let key = args.entries.first().map(|(k, _)| k.clone()).unwrap_or_default();
        self.record("mtouch", &key, |b| b.touch(args))
    }

    fn arithmetic(&mut self, args: &ArithmeticArgs) -> BackendResult<Counter> {
        self.record("arithmetic", &args.key, |b| b.arithmetic(args))
    }

    fn remove(&mut self, args: &RemoveArgs) -> BackendResult<()> {
        self.record("remove", &args.key, |b| b.remove(args))
    }

    fn http(&mut self, args: &HttpArgs) -> BackendResult<HttpResponse> {
        self.record("http", args.path.as_bytes(), |b| b.http(args))
    }
}

// =============================================================================
// Raw argument builders
// =============================================================================

pub fn connect_terms() -> (i64, Vec<Term>) {
    (
        CommandId::Connect.as_raw(),
        vec![
            Term::binary("localhost:8091"),
            Term::binary(""),
            Term::binary(""),
            Term::binary("default"),
        ],
    )
}

/// Set `key` to `value`.
pub fn store_terms(key: &str, value: &str) -> (i64, Vec<Term>) {
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

pub fn mget_terms(keys: &[&str]) -> (i64, Vec<Term>) {
    (
        CommandId::MultiGet.as_raw(),
        vec![
            Term::list(keys.iter().map(|k| Term::binary(*k)).collect()),
            Term::Int(0),
            Term::Int(0),
        ],
    )
}
