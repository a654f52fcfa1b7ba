//! In-memory transactional record store.
//!
//! Readers take a consistent snapshot and never block writers; writers
//! buffer their changes and publish them in a single atomic commit. The
//! store holds the two record kinds the dispatcher works with: messages
//! indexed by id and worker registrations indexed by handler.

pub mod records;

use crate::error::StoreError;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub use records::{Message, MessageRole, Worker};

#[derive(Debug, Clone, Default)]
struct State {
    messages: HashMap<String, Message>,
    workers: HashMap<String, Worker>,
}

/// Shared record store. Cheap to clone behind an [`Arc`]; all methods take
/// `&self`.
#[derive(Debug)]
pub struct Store {
    state: ArcSwap<State>,
    // Serializes commits; the swapped pointer itself is lock-free for readers.
    writer: Mutex<()>,
    closed: AtomicBool,
}

impl Store {
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(State::default()),
            writer: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    /// Begin a read-only transaction over a point-in-time snapshot.
    pub fn read(&self) -> Result<ReadTxn, StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(ReadTxn {
            snapshot: self.state.load_full(),
        })
    }

    /// Begin a read-write transaction. Writes are buffered and invisible to
    /// other transactions until [`WriteTxn::commit`].
    pub fn write(&self) -> Result<WriteTxn<'_>, StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(WriteTxn {
            store: self,
            snapshot: self.state.load_full(),
            pending: Vec::new(),
        })
    }

    /// Fence the store. Later `read`/`write`/`commit` calls fail with
    /// [`StoreError::Closed`]; snapshots already taken stay readable.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Consistent read-only view of the store.
///
/// Lookups return `None` for absence; backend failures are reported when
/// the transaction is opened, never per lookup.
#[derive(Debug, Clone)]
pub struct ReadTxn {
    snapshot: Arc<State>,
}

impl ReadTxn {
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.snapshot.messages.get(id)
    }

    pub fn worker(&self, handler: &str) -> Option<&Worker> {
        self.snapshot.workers.get(handler)
    }

    pub fn message_count(&self) -> usize {
        self.snapshot.messages.len()
    }

    pub fn worker_count(&self) -> usize {
        self.snapshot.workers.len()
    }
}

#[derive(Debug, Clone)]
enum Pending {
    PutMessage(Message),
    PutWorker(Worker),
    DeleteWorker(String),
}

/// Buffered read-write transaction.
///
/// Reads observe the snapshot taken at `write()` overlaid with this
/// transaction's own pending writes. Dropping the transaction discards
/// everything, same as [`WriteTxn::abort`].
#[derive(Debug)]
pub struct WriteTxn<'a> {
    store: &'a Store,
    snapshot: Arc<State>,
    pending: Vec<Pending>,
}

impl WriteTxn<'_> {
    /// Insert or replace a message record, keyed by id.
    pub fn put_message(&mut self, message: Message) {
        self.pending.push(Pending::PutMessage(message));
    }

    /// Insert or replace a worker registration, keyed by handler.
    pub fn put_worker(&mut self, worker: Worker) {
        self.pending.push(Pending::PutWorker(worker));
    }

    /// Remove a worker registration. Removing an unknown handler is a no-op.
    pub fn delete_worker(&mut self, handler: impl Into<String>) {
        self.pending.push(Pending::DeleteWorker(handler.into()));
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        for entry in self.pending.iter().rev() {
            if let Pending::PutMessage(message) = entry
                && message.id == id
            {
                return Some(message);
            }
        }
        self.snapshot.messages.get(id)
    }

    pub fn worker(&self, handler: &str) -> Option<&Worker> {
        for entry in self.pending.iter().rev() {
            match entry {
                Pending::PutWorker(worker) if worker.handler == handler => return Some(worker),
                Pending::DeleteWorker(deleted) if deleted == handler => return None,
                _ => {}
            }
        }
        self.snapshot.workers.get(handler)
    }

    /// Apply every buffered write in one atomic swap.
    pub fn commit(self) -> Result<(), StoreError> {
        let _guard = self
            .store
            .writer
            .lock()
            .map_err(|_| StoreError::Poisoned)?;
        if self.store.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }

        // Rebased onto the latest committed state, not this transaction's
        // begin snapshot, so concurrent commits to other keys survive.
        let current = self.store.state.load_full();
        let mut next = State::clone(&current);
        for entry in self.pending {
            match entry {
                Pending::PutMessage(message) => {
                    next.messages.insert(message.id.clone(), message);
                }
                Pending::PutWorker(worker) => {
                    next.workers.insert(worker.handler.clone(), worker);
                }
                Pending::DeleteWorker(handler) => {
                    next.workers.remove(&handler);
                }
            }
        }
        self.store.state.store(Arc::new(next));
        Ok(())
    }

    /// Discard every buffered write.
    pub fn abort(self) {
        drop(self);
    }
}
