//! Dirty offload execution strategy.
//!
//! Tasks skip the queue and run on the async runtime's blocking pool. The
//! backend sits behind a per-handle mutex, so concurrent submissions run in
//! no particular order but never overlap inside the backend. Each submission
//! is counted while in flight; shutdown waits for the count to reach zero
//! before releasing the backend.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use cbridge_core::{Backend, Reply};
use parking_lot::{Condvar, Mutex};
use tokio::runtime::Handle as RuntimeHandle;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use crate::handle::HandleId;
use crate::table::CommandTable;
use crate::task::Task;

struct Shared<B> {
    backend: Mutex<Option<B>>,
    in_flight: Mutex<usize>,
    idle: Condvar,
}

/// RAII guard that decrements the in-flight count on drop.
///
/// Lives inside the blocking closure, so the count is released whether the
/// closure ran, panicked or was discarded by a shutting-down runtime.
struct InFlightGuard<B> {
    shared: Arc<Shared<B>>,
}

impl<B> InFlightGuard<B> {
    fn enter(shared: &Arc<Shared<B>>) -> Self {
        *shared.in_flight.lock() += 1;
        Self {
            shared: Arc::clone(shared),
        }
    }
}

impl<B> Drop for InFlightGuard<B> {
    fn drop(&mut self) {
        let mut count = self.shared.in_flight.lock();
        *count -= 1;
        if *count == 0 {
            self.shared.idle.notify_all();
        }
    }
}

/// Runs each task on the runtime's blocking pool.
pub struct DirtyOffload<B> {
    shared: Arc<Shared<B>>,
    table: Arc<CommandTable<B>>,
    runtime: RuntimeHandle,
    handle: HandleId,
}

impl<B: Backend> DirtyOffload<B> {
    /// Wrap `backend` for offloaded execution on `runtime`.
    pub fn new(
        backend: B,
        table: Arc<CommandTable<B>>,
        runtime: RuntimeHandle,
        handle: HandleId,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend: Mutex::new(Some(backend)),
                in_flight: Mutex::new(0),
                idle: Condvar::new(),
            }),
            table,
            runtime,
            handle,
        }
    }

    /// Offload a task. The reply is produced by the returned [`Completion`].
    ///
    /// The task runs even if the completion is dropped.
    pub fn dispatch(&self, task: Task) -> Completion {
        let guard = InFlightGuard::enter(&self.shared);
        let table = Arc::clone(&self.table);

        let join = self.runtime.spawn_blocking(move || {
            let guard = guard;
            let (command, arguments, issuer, handle) = task.into_parts();
            trace!(
                target: "cbridge::dirty",
                %handle,
                %command,
                issuer = %issuer.id(),
                "Executing task"
            );

            let mut slot = guard.shared.backend.lock();
            match slot.as_mut() {
                Some(backend) => table.execute(command, arguments, backend),
                None => {
                    error!(target: "cbridge::dirty", %handle, %command, "Backend already released");
                    Reply::internal("backend released")
                }
            }
        });

        Completion { join }
    }

    /// Submissions that have not finished yet.
    pub fn in_flight(&self) -> usize {
        *self.shared.in_flight.lock()
    }

    /// Block until no submission is in flight, then take the backend out.
    ///
    /// Returns `None` if the backend was already taken.
    pub fn shutdown(&self) -> Option<B> {
        {
            let mut count = self.shared.in_flight.lock();
            if *count > 0 {
                debug!(
                    target: "cbridge::dirty",
                    handle = %self.handle,
                    in_flight = *count,
                    "Waiting for in-flight tasks"
                );
            }
            while *count > 0 {
                self.shared.idle.wait(&mut count);
            }
        }
        self.shared.backend.lock().take()
    }
}

/// Future resolving to the reply of one offloaded task.
#[must_use = "the reply is only observable by awaiting the completion"]
pub struct Completion {
    join: JoinHandle<Reply>,
}

impl Future for Completion {
    type Output = Reply;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Reply> {
        match Pin::new(&mut self.join).poll(cx) {
            Poll::Ready(Ok(reply)) => Poll::Ready(reply),
            Poll::Ready(Err(e)) => {
                error!(target: "cbridge::dirty", error = %e, "Offloaded task did not complete");
                Poll::Ready(Reply::internal(format!("offloaded task failed: {}", e)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("finished", &self.join.is_finished())
            .finish()
    }
}
