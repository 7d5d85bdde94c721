//! Background save writer.
//!
//! Saves are fire-and-forget: the session enqueues an encoded blob and moves
//! on. A dedicated thread drains the queue, keeps only the latest pending
//! value per key, and writes it to the store. A clear enqueued after a save
//! for the same key replaces that save, so the two are never reordered.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use skillmint_common::UserId;
use tracing::{debug, error, info};

use crate::persistence::{encode_blob, storage_key, PersistError, PersistResult, PersistedProgress};
use crate::store::{ProgressStore, StoreError};

/// Work item for the writer thread.
#[derive(Debug)]
enum WriteOp {
    /// Store `value` under `key`.
    Put { key: String, value: String },
    /// Delete `key`.
    Remove { key: String },
    /// Acknowledge once everything queued before it is written.
    Flush(Sender<()>),
    /// Write what is pending and exit.
    Shutdown,
}

/// Pending operation per key; `None` means remove.
type Pending = BTreeMap<String, Option<String>>;

/// Handle to the background writer thread.
///
/// Dropping the handle writes everything still queued and joins the thread.
#[derive(Debug)]
pub struct SaveWriter {
    sender: Sender<WriteOp>,
    handle: Option<JoinHandle<()>>,
}

impl SaveWriter {
    /// Starts a writer over `store`.
    pub fn spawn(store: Arc<dyn ProgressStore>) -> PersistResult<Self> {
        let (sender, receiver) = unbounded();
        let handle = thread::Builder::new()
            .name("skillmint-save-writer".to_string())
            .spawn(move || run(store.as_ref(), &receiver))
            .map_err(StoreError::from)?;

        debug!("Save writer started");
        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    /// Queues a save of `progress` for `user`.
    pub fn enqueue_save(&self, user: &UserId, progress: &PersistedProgress) -> PersistResult<()> {
        let value = encode_blob(progress)?;
        self.send(WriteOp::Put {
            key: storage_key(user),
            value,
        })
    }

    /// Queues removal of `user`'s progress.
    pub fn enqueue_clear(&self, user: &UserId) -> PersistResult<()> {
        self.send(WriteOp::Remove {
            key: storage_key(user),
        })
    }

    /// Blocks until everything queued so far has been written.
    pub fn flush(&self) -> PersistResult<()> {
        let (ack_tx, ack_rx) = bounded(1);
        self.send(WriteOp::Flush(ack_tx))?;
        ack_rx.recv().map_err(|_| PersistError::WriterClosed)
    }

    fn send(&self, op: WriteOp) -> PersistResult<()> {
        self.sender.send(op).map_err(|_| PersistError::WriterClosed)
    }
}

impl Drop for SaveWriter {
    fn drop(&mut self) {
        let _ = self.sender.send(WriteOp::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Save writer thread panicked");
            }
        }
    }
}

/// Writer thread body.
fn run(store: &dyn ProgressStore, receiver: &Receiver<WriteOp>) {
    let mut pending = Pending::new();
    let mut acks = Vec::new();

    while let Ok(op) = receiver.recv() {
        let mut shutdown = absorb(op, &mut pending, &mut acks);
        while let Ok(op) = receiver.try_recv() {
            shutdown |= absorb(op, &mut pending, &mut acks);
        }

        write_pending(store, &mut pending);
        for ack in acks.drain(..) {
            let _ = ack.send(());
        }

        if shutdown {
            break;
        }
    }

    info!("Save writer stopped");
}

/// Folds one op into the pending batch. Returns true on shutdown.
fn absorb(op: WriteOp, pending: &mut Pending, acks: &mut Vec<Sender<()>>) -> bool {
    match op {
        WriteOp::Put { key, value } => {
            if pending.insert(key, Some(value)).is_some() {
                debug!("Coalesced pending save");
            }
            false
        }
        WriteOp::Remove { key } => {
            pending.insert(key, None);
            false
        }
        WriteOp::Flush(ack) => {
            acks.push(ack);
            false
        }
        WriteOp::Shutdown => true,
    }
}

fn write_pending(store: &dyn ProgressStore, pending: &mut Pending) {
    for (key, value) in std::mem::take(pending) {
        let result = match &value {
            Some(text) => store.write(&key, text),
            None => store.remove(&key),
        };
        match result {
            Ok(()) => debug!("Wrote {} ({})", key, if value.is_some() { "save" } else { "clear" }),
            Err(e) => error!("Failed to persist {}: {}", key, e),
        }
    }
}
