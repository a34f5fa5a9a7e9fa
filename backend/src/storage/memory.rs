//! # In-Memory Document Store
//!
//! Volatile [`DocumentStore`] used by tests and by ephemeral sessions.
//! Supports fault injection so the error paths of the page controllers can
//! be exercised without a real backend.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;

use super::collections::{generate_id, CollectionSet};
use super::merge::apply_patch;
use super::traits::{
    ChangeEvent, CollectionKind, Document, DocumentStore, Fields, Snapshot, StoreError, TransactFn,
    WriteOptions, WriteReceipt,
};

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct Faults {
    deny_writes: AtomicBool,
    fail_reads: AtomicBool,
}

#[derive(Clone)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<CollectionSet>>,
    feed: broadcast::Sender<ChangeEvent>,
    faults: Arc<Faults>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(CollectionSet::new())),
            feed,
            faults: Arc::new(Faults::default()),
        }
    }

    /// Make every mutation fail with [`StoreError::PermissionDenied`]
    pub fn deny_writes(&self, deny: bool) {
        self.faults.deny_writes.store(deny, Ordering::SeqCst);
    }

    /// Make every read fail with [`StoreError::Unavailable`]
    pub fn fail_reads(&self, fail: bool) {
        self.faults.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, CollectionSet>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.faults.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads are disabled".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.faults.deny_writes.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied("writes are disabled".to_string()));
        }
        Ok(())
    }

    fn publish(&self, event: ChangeEvent) {
        debug!("Change feed: {:?} {} {}", event.change, event.kind, event.id);
        // No receivers is fine
        let _ = self.feed.send(event);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list(&self, kind: CollectionKind) -> Result<Snapshot, StoreError> {
        self.check_read()?;
        Ok(self.lock()?.snapshot(kind))
    }

    async fn get(&self, kind: CollectionKind, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_read()?;
        Ok(self.lock()?.get(kind, id))
    }

    async fn create(&self, kind: CollectionKind, fields: Fields) -> Result<WriteReceipt, StoreError> {
        self.check_write()?;
        let (receipt, event) = self.lock()?.put(kind, &generate_id(kind), fields);
        self.publish(event);
        Ok(receipt)
    }

    async fn write(
        &self,
        kind: CollectionKind,
        id: &str,
        patch: Fields,
        options: WriteOptions,
    ) -> Result<WriteReceipt, StoreError> {
        self.check_write()?;
        let (receipt, event) = {
            let mut state = self.lock()?;
            let existing = state.get(kind, id).map(|doc| doc.fields);
            state.put(kind, id, apply_patch(existing, patch, options.merge))
        };
        self.publish(event);
        Ok(receipt)
    }

    async fn delete(&self, kind: CollectionKind, id: &str) -> Result<Option<u64>, StoreError> {
        self.check_write()?;
        let event = self.lock()?.remove(kind, id);
        Ok(event.map(|event| {
            let revision = event.revision;
            self.publish(event);
            revision
        }))
    }

    async fn transact(
        &self,
        kind: CollectionKind,
        id: &str,
        update: TransactFn,
    ) -> Result<WriteReceipt, StoreError> {
        self.check_write()?;
        let (receipt, event) = {
            let mut state = self.lock()?;
            let current = state.get(kind, id).map(|doc| doc.fields);
            let next = update(current).map_err(StoreError::Aborted)?;
            state.put(kind, id, next)
        };
        self.publish(event);
        Ok(receipt)
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}
