use crate::{Result as StoreResult, StoreError};

use herald_core::{Message, MessagePriority};

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::panic::Location;
use std::sync::{Mutex, MutexGuard, PoisonError};

use error_location::ErrorLocation;
use tokio::sync::Notify;

/// Bounded, priority-ordered buffer of pending `SERVER_PUSH` messages.
///
/// The head is always the most urgent message; among equal priorities the
/// earliest arrival wins. Safe for one producer and one consumer running
/// concurrently.
pub struct PriorityBuffer {
    inner: Mutex<BufferInner>,
    capacity: usize,
    changed: Notify,
}

struct BufferInner {
    heap: BinaryHeap<QueuedMessage>,
    next_sequence: u64,
}

struct QueuedMessage {
    priority: MessagePriority,
    sequence: u64,
    message: Message,
}

impl PartialEq for QueuedMessage {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for QueuedMessage {}

impl PartialOrd for QueuedMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max heap: reverse both keys so the lowest rank and
        // the oldest sequence surface first.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PriorityBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BufferInner {
                heap: BinaryHeap::with_capacity(capacity),
                next_sequence: 0,
            }),
            capacity,
            changed: Notify::new(),
        }
    }

    /// Insert a message, failing with `CapacityExceeded` when the buffer is full.
    #[track_caller]
    pub fn push(&self, message: Message) -> StoreResult<()> {
        let Some(priority) = message.priority() else {
            return Err(StoreError::NotPushMessage {
                message_type: message.message_type().to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        {
            let mut inner = self.lock();

            if inner.heap.len() >= self.capacity {
                return Err(StoreError::CapacityExceeded {
                    capacity: self.capacity,
                    message: Box::new(message),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            let sequence = inner.next_sequence;
            inner.next_sequence += 1;
            inner.heap.push(QueuedMessage {
                priority,
                sequence,
                message,
            });
        }

        self.changed.notify_one();
        Ok(())
    }

    /// Current head without removing it.
    pub fn peek(&self) -> Option<Message> {
        self.lock().heap.peek().map(|queued| queued.message.clone())
    }

    /// Remove whatever `peek()` currently returns.
    pub fn pop(&self) -> Option<Message> {
        self.lock().heap.pop().map(|queued| queued.message)
    }

    /// Remove the message with the given id, wherever it sits.
    ///
    /// The head may have changed while a broadcast round was in flight, so the
    /// dispatcher retires by id rather than popping blindly.
    pub fn retire(&self, id: &str) -> Option<Message> {
        let mut inner = self.lock();

        if inner
            .heap
            .peek()
            .is_some_and(|queued| queued.message.id() == id)
        {
            return inner.heap.pop().map(|queued| queued.message);
        }

        let retired = inner
            .heap
            .iter()
            .find(|queued| queued.message.id() == id)
            .map(|queued| queued.message.clone())?;
        inner.heap.retain(|queued| queued.message.id() != id);

        Some(retired)
    }

    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has_capacity(&self) -> bool {
        self.len() < self.capacity
    }

    /// Resolves after the next successful push. A push that happened while
    /// nobody was waiting is remembered, so the wake-up is never lost.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }

    fn lock(&self) -> MutexGuard<'_, BufferInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
