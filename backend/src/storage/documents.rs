//! Mapping between typed entities and stored document fields.
//!
//! Entities carry their id as a struct field while the store keys documents
//! by id, so the `id` key is stripped on the way in and re-inserted on the
//! way out. Progress records are keyed by their child's id and have no id
//! field of their own.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared::ChildProgress;

use super::traits::{Document, Fields, StoreError};

/// Serialize an entity into document fields, dropping its `id`
pub fn to_fields<T: Serialize>(entity: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(entity)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Decode a stored document into an entity with an `id` field
pub fn from_document<T: DeserializeOwned>(document: &Document) -> Result<T, StoreError> {
    let mut fields = document.fields.clone();
    fields.insert("id".to_string(), Value::String(document.id.clone()));
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Decode every document, skipping (and logging) the ones that do not parse
pub fn decode_all<T: DeserializeOwned>(documents: &[Document]) -> Vec<T> {
    documents
        .iter()
        .filter_map(|doc| match from_document(doc) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!("Skipping malformed document {}: {}", doc.id, e);
                None
            }
        })
        .collect()
}

/// Decode a progress record, padding its egg slots
pub fn progress_from_fields(fields: &Fields) -> Result<ChildProgress, StoreError> {
    let progress: ChildProgress = serde_json::from_value(Value::Object(fields.clone()))?;
    Ok(progress.normalized())
}

pub fn progress_to_fields(progress: &ChildProgress) -> Result<Fields, StoreError> {
    to_fields(progress)
}
