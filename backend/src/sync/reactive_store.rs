//! # Reactive Data Store
//!
//! Thin layer over a [`DocumentStore`] that turns its change feed into
//! per-collection subscriptions and gives writes a single entry point.
//!
//! A subscription fires once with the current contents of its collection,
//! then again after every change-feed event for that collection. Events
//! for different collections are not ordered relative to each other.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::storage::{
    CollectionKind, DocumentStore, Fields, Snapshot, StoreError, TransactFn, WriteOptions,
    WriteReceipt,
};

/// Live subscription; dropping it stops the callbacks
pub struct Subscription {
    kind: CollectionKind,
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn unsubscribe(self) {
        // Drop aborts the feed task
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!("Unsubscribing from {}", self.kind);
        self.handle.abort();
    }
}

#[derive(Clone)]
pub struct ReactiveStore {
    store: Arc<dyn DocumentStore>,
}

impl ReactiveStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Subscribe to a collection. The initial call to `on_change` happens
    /// before this returns; later calls run on a background task.
    pub async fn subscribe<F>(&self, kind: CollectionKind, on_change: F) -> Subscription
    where
        F: Fn(Result<Snapshot, StoreError>) + Send + Sync + 'static,
    {
        // Subscribe before listing so nothing between the two is missed
        let mut feed = self.store.changes();
        on_change(self.store.list(kind).await);

        let store = self.store.clone();
        let handle = tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(event) if event.kind == kind => {
                        debug!("Feed event {:?} {} {} r{}", event.change, kind, event.id, event.revision);
                        on_change(store.list(kind).await);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Change feed lagged by {} events, re-listing {}", skipped, kind);
                        on_change(store.list(kind).await);
                    }
                    Err(RecvError::Closed) => {
                        debug!("Change feed closed, ending {} subscription", kind);
                        break;
                    }
                }
            }
        });

        Subscription { kind, handle }
    }

    /// Create (`id` = None) or upsert a document
    pub async fn write(
        &self,
        kind: CollectionKind,
        id: Option<&str>,
        patch: Fields,
        options: WriteOptions,
    ) -> Result<WriteReceipt, StoreError> {
        match id {
            Some(id) => self.store.write(kind, id, patch, options).await,
            None => self.store.create(kind, patch).await,
        }
    }

    pub async fn transact(
        &self,
        kind: CollectionKind,
        id: &str,
        update: TransactFn,
    ) -> Result<WriteReceipt, StoreError> {
        self.store.transact(kind, id, update).await
    }

    pub async fn delete(&self, kind: CollectionKind, id: &str) -> Result<Option<u64>, StoreError> {
        self.store.delete(kind, id).await
    }

    pub async fn list(&self, kind: CollectionKind) -> Result<Snapshot, StoreError> {
        self.store.list(kind).await
    }

    pub async fn create(&self, kind: CollectionKind, fields: Fields) -> Result<WriteReceipt, StoreError> {
        self.store.create(kind, fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryDocumentStore;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    async fn wait_for(counts: &Arc<Mutex<Vec<usize>>>, len: usize) {
        for _ in 0..100 {
            if counts.lock().unwrap().len() >= len {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_subscription_fires_immediately_and_on_change() {
        let memory = InMemoryDocumentStore::new();
        let store = ReactiveStore::new(Arc::new(memory.clone()));
        store
            .write(CollectionKind::Tasks, None, fields(json!({"name": "Read"})), WriteOptions::default())
            .await
            .unwrap();

        let counts = Arc::new(Mutex::new(Vec::new()));
        let sink = counts.clone();
        let _subscription = store
            .subscribe(CollectionKind::Tasks, move |result| {
                sink.lock().unwrap().push(result.map(|s| s.documents.len()).unwrap_or(usize::MAX));
            })
            .await;
        assert_eq!(*counts.lock().unwrap(), vec![1]);

        // Other collections do not trigger this subscription
        store
            .write(CollectionKind::Rewards, None, fields(json!({"name": "Cake"})), WriteOptions::default())
            .await
            .unwrap();
        store
            .write(CollectionKind::Tasks, Some("task::x"), fields(json!({"name": "Sweep"})), WriteOptions::default())
            .await
            .unwrap();

        wait_for(&counts, 2).await;
        assert_eq!(*counts.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_feed_error_reaches_callback() {
        let memory = InMemoryDocumentStore::new();
        memory.fail_reads(true);
        let store = ReactiveStore::new(Arc::new(memory));

        let errors = Arc::new(Mutex::new(0));
        let sink = errors.clone();
        let _subscription = store
            .subscribe(CollectionKind::Children, move |result| {
                if result.is_err() {
                    *sink.lock().unwrap() += 1;
                }
            })
            .await;

        assert_eq!(*errors.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_callbacks() {
        let memory = InMemoryDocumentStore::new();
        let store = ReactiveStore::new(Arc::new(memory));

        let counts = Arc::new(Mutex::new(Vec::new()));
        let sink = counts.clone();
        let subscription = store
            .subscribe(CollectionKind::Tasks, move |_| sink.lock().unwrap().push(0))
            .await;
        subscription.unsubscribe();
        tokio::task::yield_now().await;

        store
            .write(CollectionKind::Tasks, None, fields(json!({"name": "Read"})), WriteOptions::default())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(counts.lock().unwrap().len(), 1);
    }
}
