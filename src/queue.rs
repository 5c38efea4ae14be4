//! Bounded FIFO buffer shared by producers and consumers.
//!
//! [`RingBuffer`] is the plain circular storage: it never blocks and must be
//! guarded by the caller. [`BoundedQueue`] owns a `RingBuffer` together with
//! its lock and the two wait conditions ("not full", "not empty"), and only
//! exposes blocking `push`/`pop` plus a one-shot [`close`](BoundedQueue::close).
//!
//! # Termination
//!
//! Closing the queue means no further item will ever be pushed. `close`
//! broadcasts on both conditions: consumers asleep on an empty queue wake,
//! observe the closed state and return `None` once the buffer is drained.

use crate::error::{LookupError, Result};
use parking_lot::{Condvar, Mutex};

/// Fixed-capacity circular buffer indexed by a head cursor and a length.
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidConfig`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(LookupError::InvalidConfig(
                "queue capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            head: 0,
            len: 0,
        })
    }

    /// Appends `item` at the tail. Hands the item back if the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` when `len == capacity`.
    pub fn push(&mut self, item: T) -> std::result::Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let tail = (self.head + self.len) % self.slots.len();
        self.slots[tail] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the head item, or `None` if empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        item
    }

    /// Number of buffered items.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Maximum number of buffered items.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }
}

/// Lifecycle of a [`BoundedQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Producers may still push.
    Open,
    /// Closed, but items remain to be drained.
    Closing,
    /// Closed and empty. Every `pop` returns `None`.
    Closed,
}

/// Why a [`BoundedQueue::push`] was refused. The item is handed back.
#[derive(Debug, PartialEq, Eq)]
pub enum PushError<T> {
    /// The queue was closed before room became available.
    Closed(T),
    /// The buffer was full despite the wait predicate holding. Indicates a
    /// synchronization bug, never a normal runtime condition.
    Full(T),
}

impl<T> PushError<T> {
    /// Recovers the rejected item.
    pub fn into_inner(self) -> T {
        match self {
            Self::Closed(item) | Self::Full(item) => item,
        }
    }
}

#[derive(Debug)]
struct Shared<T> {
    buffer: RingBuffer<T>,
    closed: bool,
}

/// Blocking bounded queue.
///
/// All size and content access happens under one lock. Waiters always
/// re-check their predicate after waking, so spurious wakeups and items
/// stolen by a competing thread are harmless.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    shared: Mutex<Shared<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates an open queue with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidConfig`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            shared: Mutex::new(Shared {
                buffer: RingBuffer::new(capacity)?,
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    /// Pushes `item`, blocking while the queue is full.
    ///
    /// Wakes one waiting consumer on success.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Closed`] if the queue is closed, before or while
    /// waiting for room.
    pub fn push(&self, item: T) -> std::result::Result<(), PushError<T>> {
        let mut shared = self.shared.lock();
        while shared.buffer.is_full() && !shared.closed {
            self.not_full.wait(&mut shared);
        }
        if shared.closed {
            return Err(PushError::Closed(item));
        }
        if let Err(item) = shared.buffer.push(item) {
            tracing::warn!(
                len = shared.buffer.len(),
                capacity = shared.buffer.capacity(),
                "Queue push failed on a full buffer"
            );
            return Err(PushError::Full(item));
        }
        drop(shared);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pops the head item, blocking while the queue is empty and open.
    ///
    /// Items left at close time are still handed out; `None` means the queue
    /// is closed and fully drained. Wakes one waiting producer on success.
    pub fn pop(&self) -> Option<T> {
        let mut shared = self.shared.lock();
        loop {
            if let Some(item) = shared.buffer.pop() {
                drop(shared);
                self.not_full.notify_one();
                return Some(item);
            }
            if shared.closed {
                return None;
            }
            self.not_empty.wait(&mut shared);
        }
    }

    /// Marks the queue closed and wakes every waiter.
    ///
    /// Idempotent. Pending items remain poppable.
    pub fn close(&self) {
        let mut shared = self.shared.lock();
        if shared.closed {
            return;
        }
        shared.closed = true;
        drop(shared);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> QueueState {
        let shared = self.shared.lock();
        match (shared.closed, shared.buffer.is_empty()) {
            (false, _) => QueueState::Open,
            (true, false) => QueueState::Closing,
            (true, true) => QueueState::Closed,
        }
    }

    /// Number of buffered items at the time of the call.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.lock().buffer.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.lock().buffer.capacity()
    }
}
