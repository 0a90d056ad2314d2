//! Handle lifecycle.
//!
//! A [`Handle`] owns one backend instance, the command table and the
//! executor chosen by its configuration. Requests are admitted on the
//! caller's thread: the command id is resolved and the arguments parsed
//! before a [`Task`] exists, so a rejected request never reaches the
//! backend and never produces a later reply.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──start──▶ Running ──destroy──▶ ShuttingDown ──drained──▶ Destroyed
//! ```
//!
//! `destroy` blocks until every admitted task has produced its reply, then
//! drops the backend. Operations on a handle past `Running` fail with
//! `HandleShuttingDown` or `HandleDestroyed`.

use std::fmt;
use std::sync::Arc;

use cbridge_core::{Backend, Error, Reply, Result, Term};
use parking_lot::RwLock;
use tokio::runtime::Handle as RuntimeHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{BridgeConfig, ExecutionStrategy};
use crate::dirty::{Completion, DirtyOffload};
use crate::issuer::{self, Issuer};
use crate::table::CommandTable;
use crate::task::Task;
use crate::worker::QueueWorker;

/// Unique handle identifier, attached to every log line about the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(Uuid);

impl HandleId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Table built, executor not started yet
    Created,
    /// Accepting requests
    Running,
    /// `destroy` is draining admitted work
    ShuttingDown,
    /// Backend dropped; every operation fails
    Destroyed,
}

/// Outcome of a successful [`Handle::submit`].
#[derive(Debug)]
pub enum Accepted {
    /// Queued for the worker. The reply arrives in the issuer's mailbox.
    Queued,
    /// Offloaded to the blocking pool. Await the completion for the reply.
    Offloaded(Completion),
}

enum Executor<B> {
    Worker(QueueWorker<B>),
    Dirty(DirtyOffload<B>),
}

impl<B: Backend> Executor<B> {
    fn dispatch(&self, task: Task) -> Accepted {
        match self {
            Executor::Worker(worker) => {
                worker.dispatch(task);
                Accepted::Queued
            }
            Executor::Dirty(dirty) => Accepted::Offloaded(dirty.dispatch(task)),
        }
    }

    fn shutdown(self) -> Option<B> {
        match self {
            Executor::Worker(mut worker) => worker.shutdown(),
            Executor::Dirty(dirty) => dirty.shutdown(),
        }
    }
}

struct Inner<B> {
    state: HandleState,
    executor: Option<Executor<B>>,
}

/// A bridge session: one backend, one command table, one executor.
///
/// `Handle` is `Sync`; share it behind an `Arc` to submit from many threads.
pub struct Handle<B: Backend> {
    id: HandleId,
    strategy: ExecutionStrategy,
    table: Arc<CommandTable<B>>,
    inner: RwLock<Inner<B>>,
}

impl<B: Backend> Handle<B> {
    /// A handle with no executor yet. `submit` refuses it until `start`.
    pub(crate) fn created(
        id: HandleId,
        strategy: ExecutionStrategy,
        table: Arc<CommandTable<B>>,
    ) -> Self {
        Self {
            id,
            strategy,
            table,
            inner: RwLock::new(Inner {
                state: HandleState::Created,
                executor: None,
            }),
        }
    }

    fn start(&self, executor: Executor<B>) {
        let mut inner = self.inner.write();
        inner.executor = Some(executor);
        inner.state = HandleState::Running;
    }

    /// Create a handle with the standard command table.
    ///
    /// The dirty strategy runs on the tokio runtime current at this call.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `config` does not validate
    /// - `InitError` if the worker thread cannot be spawned, or the dirty
    ///   strategy is selected outside a tokio runtime
    pub fn create(backend: B, config: &BridgeConfig) -> Result<Self> {
        Self::builder(backend).config(config.clone()).build()
    }

    /// Start configuring a handle.
    pub fn builder(backend: B) -> HandleBuilder<B> {
        HandleBuilder::new(backend)
    }

    /// This handle's id.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Execution strategy chosen at creation.
    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HandleState {
        self.inner.read().state
    }

    /// Admit a request and hand it to the executor.
    ///
    /// # Errors
    ///
    /// - `HandleShuttingDown` / `HandleDestroyed` past `Running`
    /// - `InvalidCommand` if `command` names no command
    /// - `ParseError` if `args` do not fit the command
    ///
    /// A rejected request never produces a reply.
    pub fn submit(&self, issuer: &Issuer, command: i64, args: Vec<Term>) -> Result<Accepted> {
        // The read lock is held through dispatch so destroy cannot close the
        // queue between the state check and the put.
        let inner = self.inner.read();
        let executor = match (inner.state, inner.executor.as_ref()) {
            (HandleState::Running, Some(executor)) => executor,
            (HandleState::Destroyed, _) => return Err(Error::HandleDestroyed),
            (HandleState::Created, _) => return Err(Error::init("handle not started")),
            _ => return Err(Error::HandleShuttingDown),
        };

        let (command, arguments) = match self.table.parse(command, &args) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(
                    target: "cbridge::admission",
                    handle = %self.id,
                    issuer = %issuer.id(),
                    error = %e,
                    "Request rejected"
                );
                return Err(e);
            }
        };

        let task = Task::new(command, arguments, issuer.clone(), self.id);
        Ok(executor.dispatch(task))
    }

    /// Submit and wait for the reply.
    ///
    /// Works with both strategies; the worker strategy replies through a
    /// private mailbox. Admission failures come back as a `Reply::Error`
    /// carrying the same term a rejected request would map to.
    pub async fn call(&self, command: i64, args: Vec<Term>) -> Reply {
        let (issuer, mut mailbox) = issuer::mailbox();
        let accepted = match self.submit(&issuer, command, args) {
            Ok(accepted) => accepted,
            Err(e) => return Reply::Error(e.to_term()),
        };
        // Only queued tasks hold issuer clones now.
        drop(issuer);

        match accepted {
            Accepted::Offloaded(completion) => completion.await,
            Accepted::Queued => match mailbox.recv().await {
                Some(reply) => reply,
                None => Reply::internal("worker stopped before replying"),
            },
        }
    }

    /// Stop accepting work, drain everything admitted and drop the backend.
    ///
    /// Blocks the calling thread until teardown completes.
    ///
    /// # Errors
    ///
    /// `HandleShuttingDown` if another destroy is in progress,
    /// `HandleDestroyed` if the handle is already gone.
    pub fn destroy(&self) -> Result<()> {
        let executor = {
            let mut inner = self.inner.write();
            match inner.state {
                HandleState::Destroyed => return Err(Error::HandleDestroyed),
                HandleState::ShuttingDown => return Err(Error::HandleShuttingDown),
                HandleState::Created | HandleState::Running => {}
            }
            inner.state = HandleState::ShuttingDown;
            inner.executor.take()
        };

        debug!(target: "cbridge::handle", handle = %self.id, "Draining handle");
        let backend = executor.and_then(Executor::shutdown);
        drop(backend);

        self.inner.write().state = HandleState::Destroyed;
        info!(target: "cbridge::handle", handle = %self.id, "Handle destroyed");
        Ok(())
    }
}

impl<B: Backend> Drop for Handle<B> {
    fn drop(&mut self) {
        if self.inner.get_mut().state != HandleState::Destroyed {
            let _ = self.destroy();
        }
    }
}

impl<B: Backend> fmt::Debug for Handle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("strategy", &self.strategy)
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Handle Builder
// ============================================================================

/// Builder for [`Handle`].
///
/// ```ignore
/// let handle = Handle::builder(backend)
///     .config(BridgeConfig::dirty())
///     .runtime(runtime.handle().clone())
///     .build()?;
/// ```
pub struct HandleBuilder<B: Backend> {
    backend: B,
    config: BridgeConfig,
    runtime: Option<RuntimeHandle>,
    table: Option<CommandTable<B>>,
}

impl<B: Backend> HandleBuilder<B> {
    /// Builder with the default (worker) configuration.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: BridgeConfig::default(),
            runtime: None,
            table: None,
        }
    }

    /// Use `config` instead of the defaults.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Run dirty tasks on `runtime` instead of the runtime current at build.
    pub fn runtime(mut self, runtime: RuntimeHandle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Use a custom command table.
    pub fn table(mut self, table: CommandTable<B>) -> Self {
        self.table = Some(table);
        self
    }

    /// Validate the configuration, start the executor and return a running
    /// handle.
    pub fn build(self) -> Result<Handle<B>> {
        self.config.validate()?;
        let strategy = self.config.execution_strategy()?;
        let table = Arc::new(self.table.unwrap_or_default());
        // A failed start drops the handle in `Created`, which tears it down.
        let handle = Handle::created(HandleId::new(), strategy, Arc::clone(&table));
        let id = handle.id;
        debug!(
            target: "cbridge::handle",
            handle = %id,
            state = ?handle.state(),
            "Starting executor"
        );

        let executor = match strategy {
            ExecutionStrategy::QueueWorker => {
                Executor::Worker(QueueWorker::start(self.backend, table, id, &self.config)?)
            }
            ExecutionStrategy::DirtyOffload => {
                let runtime = match self.runtime {
                    Some(runtime) => runtime,
                    None => RuntimeHandle::try_current().map_err(|e| {
                        Error::init(format!("dirty strategy needs a tokio runtime: {}", e))
                    })?,
                };
                Executor::Dirty(DirtyOffload::new(self.backend, table, runtime, id))
            }
        };
        handle.start(executor);

        info!(
            target: "cbridge::handle",
            handle = %id,
            strategy = strategy.as_str(),
            "Handle created"
        );
        Ok(handle)
    }
}
