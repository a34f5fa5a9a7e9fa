//! Patch application for document writes.

use serde_json::Value;

use super::traits::{Fields, MergeMode};

/// Combine `patch` into `existing` according to `mode`
pub fn apply_patch(existing: Option<Fields>, patch: Fields, mode: MergeMode) -> Fields {
    match (existing, mode) {
        (None, _) | (_, MergeMode::Replace) => patch,
        (Some(mut current), MergeMode::Shallow) => {
            for (key, value) in patch {
                current.insert(key, value);
            }
            current
        }
        (Some(mut current), MergeMode::Deep) => {
            deep_merge(&mut current, patch);
            current
        }
    }
}

fn deep_merge(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => deep_merge(existing, nested),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}
