//! Queue-and-worker execution strategy.
//!
//! One named thread per handle drains a [`TaskQueue`] in FIFO order. The
//! thread owns the backend outright for its whole life, so backend calls are
//! serialized without a lock, and hands it back when it exits.

use std::sync::Arc;
use std::thread::JoinHandle;

use cbridge_core::{Backend, Error, Result};
use tracing::{debug, error, trace};

use crate::config::BridgeConfig;
use crate::handle::HandleId;
use crate::queue::{Dequeued, TaskQueue};
use crate::table::CommandTable;
use crate::task::Task;

/// A running worker thread and its queue.
pub struct QueueWorker<B> {
    queue: Arc<TaskQueue<Task>>,
    thread: Option<JoinHandle<B>>,
    handle: HandleId,
}

impl<B: Backend> QueueWorker<B> {
    /// Spawn the worker thread, moving `backend` onto it.
    ///
    /// # Errors
    ///
    /// `InitError` if the OS refuses to spawn the thread.
    pub fn start(
        backend: B,
        table: Arc<CommandTable<B>>,
        handle: HandleId,
        config: &BridgeConfig,
    ) -> Result<Self> {
        let queue = Arc::new(TaskQueue::new());

        let mut builder = std::thread::Builder::new().name(config.worker_thread_name.clone());
        if let Some(size) = config.worker_stack_size {
            builder = builder.stack_size(size);
        }

        let q = Arc::clone(&queue);
        let thread = builder
            .spawn(move || worker_loop(backend, &table, &q, handle))
            .map_err(|e| Error::init(format!("failed to spawn worker thread: {}", e)))?;

        Ok(Self {
            queue,
            thread: Some(thread),
            handle,
        })
    }

    /// Queue a task behind everything already submitted.
    pub fn dispatch(&self, task: Task) {
        self.queue.put(task);
    }

    /// Close the queue, wait for every pending task to run and join the
    /// thread.
    ///
    /// Returns the backend, or `None` if the worker already stopped or the
    /// thread died.
    pub fn shutdown(&mut self) -> Option<B> {
        let thread = self.thread.take()?;
        self.queue.close();
        match thread.join() {
            Ok(backend) => Some(backend),
            Err(_) => {
                error!(
                    target: "cbridge::worker",
                    handle = %self.handle,
                    "Worker thread panicked"
                );
                None
            }
        }
    }
}

impl<B> Drop for QueueWorker<B> {
    fn drop(&mut self) {
        // Let a never-joined thread drain and exit on its own.
        if self.thread.is_some() {
            self.queue.close();
        }
    }
}

fn worker_loop<B: Backend>(
    mut backend: B,
    table: &CommandTable<B>,
    queue: &TaskQueue<Task>,
    handle: HandleId,
) -> B {
    debug!(target: "cbridge::worker", %handle, "Worker started");
    let mut executed: u64 = 0;
    loop {
        let task = match queue.get() {
            Dequeued::Item(task) => task,
            Dequeued::Shutdown => break,
        };
        let (command, arguments, issuer, owner) = task.into_parts();
        debug_assert_eq!(owner, handle);
        trace!(
            target: "cbridge::worker",
            handle = %owner,
            %command,
            issuer = %issuer.id(),
            "Executing task"
        );

        // Panics are contained by the table so the loop always survives.
        let reply = table.execute(command, arguments, &mut backend);
        issuer.deliver(reply);
        executed += 1;
    }
    debug!(target: "cbridge::worker", %handle, executed, "Worker stopped");
    backend
}
