//! # YAML Document Store
//!
//! Durable [`DocumentStore`] keeping one YAML file per collection inside the
//! identity's namespace directory:
//!
//! ```text
//! data/users/{user_id}/
//! ├── kids.yaml         ← child documents keyed by id
//! ├── tasks.yaml
//! ├── rewards.yaml
//! └── kid_states.yaml   ← progress documents keyed by child id
//! ```
//!
//! All collections are loaded into memory when the store is opened. Every
//! mutation is applied to a copy of the collection set, the touched
//! collection file is rewritten atomically, and only then is the copy
//! installed and the change published. A failed write therefore leaves both
//! the file and the in-memory view untouched.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::collections::{generate_id, CollectionSet};
use super::connection::YamlConnection;
use super::merge::apply_patch;
use super::traits::{
    ChangeEvent, CollectionKind, Document, DocumentStore, Fields, Snapshot, StoreError, TransactFn,
    WriteOptions, WriteReceipt,
};

const FEED_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct YamlDocumentStore {
    connection: YamlConnection,
    namespace_path: String,
    state: Arc<Mutex<CollectionSet>>,
    feed: broadcast::Sender<ChangeEvent>,
}

impl YamlDocumentStore {
    /// Open (and load) the store of a namespace such as `users/<id>`
    pub fn open(connection: YamlConnection, namespace_path: &str) -> Result<Self, StoreError> {
        let directory = connection.namespace_directory(namespace_path);
        if !directory.exists() {
            fs::create_dir_all(&directory)?;
            info!("📁 Created namespace directory: {}", directory.display());
        }

        let mut collections = HashMap::new();
        for kind in CollectionKind::ALL {
            let path = connection.collection_file_path(namespace_path, kind);
            collections.insert(kind, Self::load_collection(&path)?);
        }

        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        info!("📂 Opened document store at {}", directory.display());

        Ok(Self {
            connection,
            namespace_path: namespace_path.to_string(),
            state: Arc::new(Mutex::new(CollectionSet::from_collections(collections))),
            feed,
        })
    }

    fn load_collection(path: &Path) -> Result<BTreeMap<String, Fields>, StoreError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let documents: BTreeMap<String, Fields> = serde_yaml::from_str(&content)?;
        debug!("Loaded {} documents from {}", documents.len(), path.display());
        Ok(documents)
    }

    fn persist(&self, set: &CollectionSet, kind: CollectionKind) -> Result<(), StoreError> {
        let path = self.connection.collection_file_path(&self.namespace_path, kind);
        let empty = BTreeMap::new();
        let documents = set.collection(kind).unwrap_or(&empty);
        let yaml = serde_yaml::to_string(documents)?;

        YamlConnection::write_atomic(&path, &yaml).map_err(|e| {
            warn!("Failed to persist {}: {}", path.display(), e);
            StoreError::from(e)
        })?;
        debug!("Saved {} {} documents", documents.len(), kind);
        Ok(())
    }

    /// Apply `mutate` to a copy of the state, persist, then install the copy
    async fn commit<T>(
        &self,
        kind: CollectionKind,
        mutate: impl FnOnce(&mut CollectionSet) -> Result<(T, Option<ChangeEvent>), StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let (result, event) = mutate(&mut next)?;

        if let Some(event) = event {
            self.persist(&next, kind)?;
            *state = next;
            drop(state);
            let _ = self.feed.send(event);
        }
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for YamlDocumentStore {
    async fn list(&self, kind: CollectionKind) -> Result<Snapshot, StoreError> {
        Ok(self.state.lock().await.snapshot(kind))
    }

    async fn get(&self, kind: CollectionKind, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.state.lock().await.get(kind, id))
    }

    async fn create(&self, kind: CollectionKind, fields: Fields) -> Result<WriteReceipt, StoreError> {
        let id = generate_id(kind);
        self.commit(kind, |set| {
            let (receipt, event) = set.put(kind, &id, fields);
            Ok((receipt, Some(event)))
        })
        .await
    }

    async fn write(
        &self,
        kind: CollectionKind,
        id: &str,
        patch: Fields,
        options: WriteOptions,
    ) -> Result<WriteReceipt, StoreError> {
        self.commit(kind, |set| {
            let existing = set.get(kind, id).map(|doc| doc.fields);
            let (receipt, event) = set.put(kind, id, apply_patch(existing, patch, options.merge));
            Ok((receipt, Some(event)))
        })
        .await
    }

    async fn delete(&self, kind: CollectionKind, id: &str) -> Result<Option<u64>, StoreError> {
        self.commit(kind, |set| {
            let event = set.remove(kind, id);
            Ok((event.as_ref().map(|e| e.revision), event))
        })
        .await
    }

    async fn transact(
        &self,
        kind: CollectionKind,
        id: &str,
        update: TransactFn,
    ) -> Result<WriteReceipt, StoreError> {
        self.commit(kind, |set| {
            let current = set.get(kind, id).map(|doc| doc.fields);
            let next = update(current).map_err(StoreError::Aborted)?;
            let (receipt, event) = set.put(kind, id, next);
            Ok((receipt, Some(event)))
        })
        .await
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}
