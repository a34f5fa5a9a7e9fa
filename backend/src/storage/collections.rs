//! In-memory collection set shared by the document store implementations.

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::traits::{ChangeEvent, ChangeType, CollectionKind, Document, Fields, Snapshot, WriteReceipt};

/// Generate a document id: `<prefix>::<epoch_millis>::<8 hex chars>`
pub fn generate_id(kind: CollectionKind) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}::{}::{}", kind.id_prefix(), Utc::now().timestamp_millis(), &suffix[..8])
}

/// All collections of one namespace plus the store-wide revision counter
#[derive(Debug, Clone, Default)]
pub struct CollectionSet {
    revision: u64,
    collections: HashMap<CollectionKind, BTreeMap<String, Fields>>,
}

impl CollectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from persisted collections
    pub fn from_collections(collections: HashMap<CollectionKind, BTreeMap<String, Fields>>) -> Self {
        Self { revision: 0, collections }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn collection(&self, kind: CollectionKind) -> Option<&BTreeMap<String, Fields>> {
        self.collections.get(&kind)
    }

    pub fn snapshot(&self, kind: CollectionKind) -> Snapshot {
        let documents = self
            .collections
            .get(&kind)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document { id: id.clone(), fields: fields.clone() })
                    .collect()
            })
            .unwrap_or_default();

        Snapshot { revision: self.revision, documents }
    }

    pub fn get(&self, kind: CollectionKind, id: &str) -> Option<Document> {
        self.collections
            .get(&kind)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document { id: id.to_string(), fields: fields.clone() })
    }

    /// Store `fields` under `id`, returning the receipt and the change to publish
    pub fn put(&mut self, kind: CollectionKind, id: &str, fields: Fields) -> (WriteReceipt, ChangeEvent) {
        self.revision += 1;
        let docs = self.collections.entry(kind).or_default();
        let change = if docs.insert(id.to_string(), fields.clone()).is_some() {
            ChangeType::Updated
        } else {
            ChangeType::Created
        };

        let receipt = WriteReceipt {
            revision: self.revision,
            document: Document { id: id.to_string(), fields },
        };
        let event = ChangeEvent { kind, id: id.to_string(), change, revision: self.revision };
        (receipt, event)
    }

    /// Remove a document; None when it did not exist
    pub fn remove(&mut self, kind: CollectionKind, id: &str) -> Option<ChangeEvent> {
        let removed = self.collections.get_mut(&kind).and_then(|docs| docs.remove(id));
        removed.map(|_| {
            self.revision += 1;
            ChangeEvent {
                kind,
                id: id.to_string(),
                change: ChangeType::Deleted,
                revision: self.revision,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(points: i64) -> Fields {
        let mut fields = Fields::new();
        fields.insert("points".to_string(), json!(points));
        fields
    }

    #[test]
    fn test_generate_id_has_kind_prefix() {
        let id = generate_id(CollectionKind::Children);
        let parts: Vec<&str> = id.split("::").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "child");
        assert_eq!(parts[2].len(), 8);
        assert_ne!(id, generate_id(CollectionKind::Children));
    }

    #[test]
    fn test_put_reports_created_then_updated() {
        let mut set = CollectionSet::new();
        let (first, created) = set.put(CollectionKind::Progress, "child::1", fields(1));
        let (second, updated) = set.put(CollectionKind::Progress, "child::1", fields(2));

        assert_eq!(created.change, ChangeType::Created);
        assert_eq!(updated.change, ChangeType::Updated);
        assert!(second.revision > first.revision);
        assert_eq!(set.snapshot(CollectionKind::Progress).documents.len(), 1);
    }

    #[test]
    fn test_remove_missing_document_keeps_revision() {
        let mut set = CollectionSet::new();
        set.put(CollectionKind::Tasks, "task::1", fields(1));
        let revision = set.revision();

        assert!(set.remove(CollectionKind::Tasks, "task::404").is_none());
        assert_eq!(set.revision(), revision);

        let event = set.remove(CollectionKind::Tasks, "task::1").unwrap();
        assert_eq!(event.change, ChangeType::Deleted);
        assert!(set.get(CollectionKind::Tasks, "task::1").is_none());
    }

    #[test]
    fn test_snapshot_is_ordered_by_id() {
        let mut set = CollectionSet::new();
        set.put(CollectionKind::Rewards, "reward::2", fields(2));
        set.put(CollectionKind::Rewards, "reward::1", fields(1));

        let ids: Vec<String> = set
            .snapshot(CollectionKind::Rewards)
            .documents
            .into_iter()
            .map(|doc| doc.id)
            .collect();
        assert_eq!(ids, vec!["reward::1", "reward::2"]);
    }
}
