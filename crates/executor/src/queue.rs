//! Blocking FIFO handing tasks from submitters to a worker thread.
//!
//! Unbounded: `put` never blocks and never fails. Shutdown is in-band: `close`
//! appends a sentinel behind everything already queued, so the consumer sees
//! every earlier item before it sees [`Dequeued::Shutdown`].

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

enum Slot<T> {
    Item(T),
    Sentinel,
}

/// Result of [`TaskQueue::get`].
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued<T> {
    /// Next queued item
    Item(T),
    /// The queue was closed and everything before the close was consumed
    Shutdown,
}

/// Multi-producer, single-consumer FIFO built on a mutex and a condvar.
pub struct TaskQueue<T> {
    slots: Mutex<VecDeque<Slot<T>>>,
    ready: Condvar,
}

impl<T> TaskQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    /// Append an item and wake the consumer.
    pub fn put(&self, item: T) {
        self.push(Slot::Item(item));
    }

    /// Append the shutdown sentinel.
    pub fn close(&self) {
        self.push(Slot::Sentinel);
    }

    fn push(&self, slot: Slot<T>) {
        // Notify while holding the lock so a consumer between its emptiness
        // check and wait() cannot miss the wakeup.
        let mut slots = self.slots.lock();
        slots.push_back(slot);
        self.ready.notify_one();
    }

    /// Remove the oldest entry, blocking while the queue is empty.
    pub fn get(&self) -> Dequeued<T> {
        let mut slots = self.slots.lock();
        loop {
            match slots.pop_front() {
                Some(Slot::Item(item)) => return Dequeued::Item(item),
                Some(Slot::Sentinel) => return Dequeued::Shutdown,
                None => self.ready.wait(&mut slots),
            }
        }
    }

    /// Number of queued entries, sentinel included.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
