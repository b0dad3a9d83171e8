//! Download queue contract and in-memory implementation.
//!
//! The core never assumes a storage technology for queued downloads; it
//! talks to a [`QueueStore`]. Any implementation that enforces forward-only
//! status transitions satisfies the contract. [`MemoryQueue`] is the
//! bundled in-memory implementation; durable storage is an external
//! concern.

mod item;

pub use item::{QueueItem, QueueStatus};

use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

/// Errors from queue store operations.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    /// No item with the given id exists.
    #[error("queue item not found: id {0}")]
    NotFound(u64),

    /// The requested status change would move an item backwards.
    #[error("invalid status transition for item {id}: {from} -> {to}")]
    InvalidTransition {
        /// Item id.
        id: u64,
        /// Current status.
        from: QueueStatus,
        /// Requested status.
        to: QueueStatus,
    },
}

/// Narrow queue contract used by the orchestrator and callers.
pub trait QueueStore: Send + Sync {
    /// Appends an item to the queue.
    fn append(&self, item: QueueItem);

    /// Returns all items in insertion order.
    fn list(&self) -> Vec<QueueItem>;

    /// Moves an item to a new status.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotFound`] for unknown ids and
    /// [`QueueError::InvalidTransition`] for backward or skipping moves.
    fn update_status(&self, id: u64, status: QueueStatus) -> Result<(), QueueError>;
}

/// In-memory queue store.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    items: Mutex<Vec<QueueItem>>,
}

impl MemoryQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<QueueItem>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl QueueStore for MemoryQueue {
    fn append(&self, item: QueueItem) {
        debug!(id = item.id, url = %item.url, "queue append");
        self.lock().push(item);
    }

    fn list(&self) -> Vec<QueueItem> {
        self.lock().clone()
    }

    fn update_status(&self, id: u64, status: QueueStatus) -> Result<(), QueueError> {
        let mut items = self.lock();
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(QueueError::NotFound(id))?;

        if !item.status.can_transition_to(status) {
            return Err(QueueError::InvalidTransition {
                id,
                from: item.status,
                to: status,
            });
        }

        debug!(id, from = %item.status, to = %status, "queue status update");
        item.status = status;
        Ok(())
    }
}
