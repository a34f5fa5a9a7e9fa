//! # In-Memory Mirror
//!
//! The session's local copy of the four collections, read directly by the
//! page controllers. Two kinds of input update it:
//!
//! - full snapshots from the subscriptions ([`Mirror::apply_snapshot`]),
//!   discarded when older than what the mirror already holds
//! - single documents returned by a successful write
//!   ([`Mirror::apply_confirmed`]); nothing is applied before the store
//!   has accepted the write
//!
//! The mirror also owns the active-child selection and keeps it pointing at
//! an existing child.

use shared::{Child, ChildProgress, Reward, Task};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::storage::documents::{decode_all, from_document, progress_from_fields};
use crate::storage::{CollectionKind, Document, Fields, Snapshot};

#[derive(Debug, Clone, Default)]
pub struct MirrorState {
    pub kids: Vec<Child>,
    pub tasks: Vec<Task>,
    pub rewards: Vec<Reward>,
    /// Progress records keyed by child id
    pub kid_data: HashMap<String, ChildProgress>,
    pub active_child_id: Option<String>,
    revisions: HashMap<CollectionKind, u64>,
}

impl MirrorState {
    pub fn revision(&self, kind: CollectionKind) -> Option<u64> {
        self.revisions.get(&kind).copied()
    }

    /// True once the first snapshot of `kind` arrived
    pub fn is_loaded(&self, kind: CollectionKind) -> bool {
        self.revisions.contains_key(&kind)
    }

    pub fn find_child(&self, id: &str) -> Option<&Child> {
        self.kids.iter().find(|child| child.id == id)
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn find_reward(&self, id: &str) -> Option<&Reward> {
        self.rewards.iter().find(|reward| reward.id == id)
    }

    pub fn active_child(&self) -> Option<&Child> {
        self.active_child_id.as_deref().and_then(|id| self.find_child(id))
    }

    /// Progress of a child; a child without a record yet starts from zero
    pub fn progress_for(&self, child_id: &str) -> ChildProgress {
        self.kid_data.get(child_id).cloned().unwrap_or_default()
    }

    /// Point the active child at an existing child. Returns true if it changed.
    pub fn reconcile_active_child(&mut self) -> bool {
        let still_valid = self
            .active_child_id
            .as_deref()
            .map(|id| self.kids.iter().any(|child| child.id == id))
            .unwrap_or(false);
        if still_valid {
            return false;
        }

        let next = self.kids.first().map(|child| child.id.clone());
        let changed = next != self.active_child_id;
        self.active_child_id = next;
        changed
    }

    fn replace_collection(&mut self, kind: CollectionKind, documents: &[Document]) {
        match kind {
            CollectionKind::Children => self.kids = decode_all(documents),
            CollectionKind::Tasks => self.tasks = decode_all(documents),
            CollectionKind::Rewards => self.rewards = decode_all(documents),
            CollectionKind::Progress => {
                self.kid_data = documents
                    .iter()
                    .filter_map(|doc| {
                        progress_from_fields(&doc.fields)
                            .map(|progress| (doc.id.clone(), progress))
                            .map_err(|e| tracing::warn!("Skipping malformed progress {}: {}", doc.id, e))
                            .ok()
                    })
                    .collect();
            }
        }
    }

    fn upsert<T>(items: &mut Vec<T>, id: &str, item: Option<T>, id_of: impl Fn(&T) -> &str) {
        let position = items.iter().position(|existing| id_of(existing) == id);
        match (position, item) {
            (Some(index), Some(item)) => items[index] = item,
            (None, Some(item)) => {
                // Keep id order, matching snapshot order
                let index = items.partition_point(|existing| id_of(existing) < id);
                items.insert(index, item);
            }
            (Some(index), None) => {
                items.remove(index);
            }
            (None, None) => {}
        }
    }

    fn replace_document(&mut self, kind: CollectionKind, id: &str, fields: Option<&Fields>) {
        let document = fields.map(|fields| Document { id: id.to_string(), fields: fields.clone() });

        match kind {
            CollectionKind::Children => {
                let item = document.as_ref().and_then(|doc| from_document::<Child>(doc).ok());
                Self::upsert(&mut self.kids, id, item, |c| c.id.as_str());
            }
            CollectionKind::Tasks => {
                let item = document.as_ref().and_then(|doc| from_document::<Task>(doc).ok());
                Self::upsert(&mut self.tasks, id, item, |t| t.id.as_str());
            }
            CollectionKind::Rewards => {
                let item = document.as_ref().and_then(|doc| from_document::<Reward>(doc).ok());
                Self::upsert(&mut self.rewards, id, item, |r| r.id.as_str());
            }
            CollectionKind::Progress => match document.and_then(|doc| progress_from_fields(&doc.fields).ok()) {
                Some(progress) => {
                    self.kid_data.insert(id.to_string(), progress);
                }
                None => {
                    self.kid_data.remove(id);
                }
            },
        }
    }
}

/// Shared handle to the session's [`MirrorState`]
#[derive(Debug, Clone, Default)]
pub struct Mirror {
    state: Arc<RwLock<MirrorState>>,
}

impl Mirror {
    pub fn new(active_child_id: Option<String>) -> Self {
        let state = MirrorState { active_child_id, ..MirrorState::default() };
        Self { state: Arc::new(RwLock::new(state)) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, MirrorState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MirrorState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> MirrorState {
        self.read().clone()
    }

    /// Replace a whole collection. Returns false when the snapshot is older
    /// than what the mirror holds and was ignored.
    pub fn apply_snapshot(&self, kind: CollectionKind, snapshot: &Snapshot) -> bool {
        let mut state = self.write();
        if let Some(current) = state.revision(kind) {
            if snapshot.revision < current {
                debug!("Ignoring stale {} snapshot r{} (have r{})", kind, snapshot.revision, current);
                return false;
            }
        }
        state.replace_collection(kind, &snapshot.documents);
        state.revisions.insert(kind, snapshot.revision);
        debug!("Mirror {} <- {} documents at r{}", kind, snapshot.documents.len(), snapshot.revision);
        true
    }

    /// Apply one document confirmed by the store; `None` means deleted
    pub fn apply_confirmed(&self, kind: CollectionKind, id: &str, fields: Option<&Fields>, revision: u64) {
        let mut state = self.write();
        state.replace_document(kind, id, fields);
        let current = state.revision(kind).unwrap_or(0);
        state.revisions.insert(kind, current.max(revision));
    }

    /// See [`MirrorState::reconcile_active_child`]
    pub fn reconcile_active_child(&self) -> Option<Option<String>> {
        let mut state = self.write();
        if state.reconcile_active_child() {
            Some(state.active_child_id.clone())
        } else {
            None
        }
    }

    pub fn set_active_child(&self, child_id: Option<String>) {
        self.write().active_child_id = child_id;
    }
}
