//! # Storage Traits
//!
//! This module defines the document-store abstraction the rest of the
//! application is written against. A backing store holds four logical
//! collections per identity and pushes every mutation onto a change feed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tokio::sync::broadcast;

/// Top-level document fields
pub type Fields = Map<String, Value>;

/// The four logical collections of an identity namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Children,
    Tasks,
    Rewards,
    /// One progress document per child, keyed by the child id
    Progress,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Children,
        CollectionKind::Tasks,
        CollectionKind::Rewards,
        CollectionKind::Progress,
    ];

    /// Name of the collection inside the namespace
    pub fn collection_name(&self) -> &'static str {
        match self {
            CollectionKind::Children => "kids",
            CollectionKind::Tasks => "tasks",
            CollectionKind::Rewards => "rewards",
            CollectionKind::Progress => "kid_states",
        }
    }

    /// Prefix used when generating ids for new documents
    pub fn id_prefix(&self) -> &'static str {
        match self {
            CollectionKind::Children => "child",
            CollectionKind::Tasks => "task",
            CollectionKind::Rewards => "reward",
            CollectionKind::Progress => "progress",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

/// A stored document: its id plus its fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Contents of one collection at a given store revision
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub revision: u64,
    pub documents: Vec<Document>,
}

/// Returned by every successful mutation
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReceipt {
    pub revision: u64,
    pub document: Document,
}

/// How a patch is combined with an existing document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// The patch becomes the whole document
    Replace,
    /// Top-level fields of the patch overwrite the document's; nested maps
    /// are replaced wholesale, so callers must spread sibling keys themselves
    Shallow,
    /// Nested maps are merged key by key; arrays and scalars are replaced
    #[default]
    Deep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    pub merge: MergeMode,
}

impl WriteOptions {
    pub fn replace() -> Self {
        Self { merge: MergeMode::Replace }
    }

    pub fn shallow() -> Self {
        Self { merge: MergeMode::Shallow }
    }

    pub fn deep() -> Self {
        Self { merge: MergeMode::Deep }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

/// One entry of the store's change feed
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: CollectionKind,
    pub id: String,
    pub change: ChangeType,
    pub revision: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} document not found: {id}")]
    NotFound { kind: CollectionKind, id: String },
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A transaction callback refused to produce a new document
    #[error("transaction aborted: {0}")]
    Aborted(anyhow::Error),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_yaml::Error> for StoreError {
    fn from(e: serde_yaml::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Read-modify-write callback for [`DocumentStore::transact`].
///
/// Receives the current fields (None when the document does not exist yet)
/// and returns the complete replacement. Returning an error aborts the
/// transaction without touching the store.
pub type TransactFn = Box<dyn FnOnce(Option<Fields>) -> anyhow::Result<Fields> + Send>;

/// Interface every backing document store implements
///
/// Implementations must bump a store-wide revision on every mutation and
/// publish a [`ChangeEvent`] after the mutation is durable.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List every document of a collection, ordered by id
    async fn list(&self, kind: CollectionKind) -> Result<Snapshot, StoreError>;

    /// Fetch one document
    async fn get(&self, kind: CollectionKind, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create a document with a generated id
    async fn create(&self, kind: CollectionKind, fields: Fields) -> Result<WriteReceipt, StoreError>;

    /// Upsert a document, combining the patch according to `options`
    async fn write(
        &self,
        kind: CollectionKind,
        id: &str,
        patch: Fields,
        options: WriteOptions,
    ) -> Result<WriteReceipt, StoreError>;

    /// Delete a document. Returns the new revision, or None if nothing was deleted.
    async fn delete(&self, kind: CollectionKind, id: &str) -> Result<Option<u64>, StoreError>;

    /// Atomic read-modify-write of a single document
    async fn transact(
        &self,
        kind: CollectionKind,
        id: &str,
        update: TransactFn,
    ) -> Result<WriteReceipt, StoreError>;

    /// Subscribe to the change feed
    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}
