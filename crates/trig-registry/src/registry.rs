//! `TriggerRegistry` implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use trig_core::{Price, Trigger, TriggerId, TriggerKey};
use trig_telemetry::Metrics;

use crate::error::{RegistryError, RegistryResult};

/// Which book to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Book {
    Pending,
    Active,
}

/// Result of `register`.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The new PENDING trigger.
    pub trigger: Trigger,
    /// Trigger that previously held the key, if any (now CANCELLED).
    pub replaced: Option<Trigger>,
}

/// Result of `activate`: enough to start a poller.
#[derive(Debug, Clone)]
pub struct Activation {
    pub trigger: Trigger,
    /// Cancelled by `cancel`, by a replacing `register`, or on shutdown.
    pub stop: CancellationToken,
}

struct ActiveEntry {
    trigger: Trigger,
    stop: CancellationToken,
}

#[derive(Default)]
struct Books {
    pending: HashMap<TriggerKey, Trigger>,
    active: HashMap<TriggerKey, ActiveEntry>,
}

impl Books {
    fn publish_sizes(&self) {
        Metrics::book_sizes(self.pending.len(), self.active.len());
    }
}

/// Owner of every live trigger.
///
/// Critical sections only touch the maps; no I/O happens under the lock.
pub struct TriggerRegistry {
    books: Mutex<Books>,
    next_id: AtomicU64,
    /// Parent of every poller token.
    shutdown: CancellationToken,
}

impl Default for TriggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(Books::default()),
            next_id: AtomicU64::new(1),
            shutdown: CancellationToken::new(),
        }
    }

    /// Insert a new PENDING trigger.
    ///
    /// Last write wins: an existing trigger with the same key, pending or
    /// active, is replaced. A replaced active trigger has its poller
    /// stopped and leaves the active book, keeping the books disjoint.
    pub fn register(
        &self,
        key: TriggerKey,
        transaction_number: i64,
        share_amount: u64,
    ) -> Registration {
        let id = TriggerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let trigger = Trigger::new_pending(id, key.clone(), transaction_number, share_amount);

        let mut books = self.books.lock();
        let mut replaced = books.pending.remove(&key);
        if let Some(entry) = books.active.remove(&key) {
            entry.stop.cancel();
            replaced = Some(entry.trigger);
        }
        books.pending.insert(key, trigger.clone());
        books.publish_sizes();
        drop(books);

        let replaced = replaced.map(|mut old| {
            debug!(key = %old.key, old_id = %old.id, new_id = %id, "Replaced existing trigger");
            old.mark_cancelled();
            old
        });

        Registration { trigger, replaced }
    }

    /// Move a trigger from pending to active with the given threshold.
    ///
    /// Fails with `NotPending` if the key was never registered, was already
    /// activated, or was cancelled.
    pub fn activate(&self, key: &TriggerKey, threshold: Price) -> RegistryResult<Activation> {
        let mut books = self.books.lock();
        let mut trigger = books
            .pending
            .remove(key)
            .ok_or_else(|| RegistryError::NotPending(key.clone()))?;

        trigger.activate(threshold);
        let stop = self.shutdown.child_token();
        books.active.insert(
            key.clone(),
            ActiveEntry {
                trigger: trigger.clone(),
                stop: stop.clone(),
            },
        );
        books.publish_sizes();

        Ok(Activation { trigger, stop })
    }

    /// Remove a trigger from whichever book holds it (active first).
    ///
    /// An active trigger's poller token is cancelled before the key leaves
    /// the book, so the poller cannot emit for it afterwards.
    pub fn cancel(&self, key: &TriggerKey) -> RegistryResult<Trigger> {
        let mut books = self.books.lock();

        let mut trigger = if let Some(entry) = books.active.remove(key) {
            entry.stop.cancel();
            entry.trigger
        } else if let Some(trigger) = books.pending.remove(key) {
            trigger
        } else {
            return Err(RegistryError::NotFound(key.clone()));
        };
        books.publish_sizes();
        drop(books);

        Metrics::cancelled(trigger.state.as_str());
        trigger.mark_cancelled();
        Ok(trigger)
    }

    /// Remove a fired trigger from the active book.
    ///
    /// `id` must match the trigger currently holding the key. A mismatch or
    /// an absent key means the trigger was cancelled or replaced after it
    /// fired; callers treat that `NotActive` as a benign race.
    pub fn complete(&self, key: &TriggerKey, id: TriggerId) -> RegistryResult<Trigger> {
        let mut books = self.books.lock();

        match books.active.get(key) {
            Some(entry) if entry.trigger.id == id => {}
            _ => return Err(RegistryError::NotActive(key.clone())),
        }
        let entry = books
            .active
            .remove(key)
            .ok_or_else(|| RegistryError::NotActive(key.clone()))?;
        books.publish_sizes();
        drop(books);

        // The poller already stopped; release the token's child registration.
        entry.stop.cancel();

        let mut trigger = entry.trigger;
        trigger.mark_completed();
        Ok(trigger)
    }

    /// Whether the trigger `id` still owns `key` in the active book.
    #[cfg(test)]
    fn is_active(&self, key: &TriggerKey, id: TriggerId) -> bool {
        self.books
            .lock()
            .active
            .get(key)
            .map(|entry| entry.trigger.id == id && !entry.stop.is_cancelled())
            .unwrap_or(false)
    }

    /// Copy of one book, sorted by key.
    pub fn snapshot(&self, book: Book) -> Vec<Trigger> {
        let books = self.books.lock();
        let mut triggers: Vec<Trigger> = match book {
            Book::Pending => books.pending.values().cloned().collect(),
            Book::Active => books.active.values().map(|e| e.trigger.clone()).collect(),
        };
        drop(books);

        triggers.sort_by(|a, b| a.key.cmp(&b.key));
        triggers
    }

    /// Both books taken under one lock acquisition: `(pending, active)`.
    pub fn snapshot_all(&self) -> (Vec<Trigger>, Vec<Trigger>) {
        let books = self.books.lock();
        let pending = books.pending.values().cloned().collect();
        let active = books.active.values().map(|e| e.trigger.clone()).collect();
        (pending, active)
    }

    /// `(pending, active)` sizes.
    pub fn len(&self) -> (usize, usize) {
        let books = self.books.lock();
        (books.pending.len(), books.active.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == (0, 0)
    }

    /// Stop every poller. Triggers stay in their books.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl std::fmt::Debug for TriggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (pending, active) = self.len();
        f.debug_struct("TriggerRegistry")
            .field("pending", &pending)
            .field("active", &active)
            .finish()
    }
}
