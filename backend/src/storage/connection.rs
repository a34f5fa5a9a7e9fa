//! # Data Directory Connection
//!
//! Resolves every on-disk location used by the application.
//!
//! ```text
//! data/
//! ├── config.yaml               ← optional application config
//! ├── identity.yaml             ← anonymous identity of this install
//! ├── local_preferences.yaml    ← client-local flags (active child, audio)
//! └── users/{user_id}/
//!     ├── kids.yaml
//!     ├── tasks.yaml
//!     ├── rewards.yaml
//!     └── kid_states.yaml
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::traits::CollectionKind;

/// Manages file paths below the data directory
#[derive(Debug, Clone)]
pub struct YamlConnection {
    base_directory: PathBuf,
}

impl YamlConnection {
    /// Create a new connection, creating the base directory if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("Failed to create data directory {}", base_path.display()))?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self { base_directory: base_path })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn identity_file_path(&self) -> PathBuf {
        self.base_directory.join("identity.yaml")
    }

    pub fn preferences_file_path(&self) -> PathBuf {
        self.base_directory.join("local_preferences.yaml")
    }

    /// Directory holding the documents of a namespace such as `users/<id>`
    pub fn namespace_directory(&self, namespace_path: &str) -> PathBuf {
        namespace_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.base_directory.clone(), |dir, segment| dir.join(segment))
    }

    pub fn collection_file_path(&self, namespace_path: &str, kind: CollectionKind) -> PathBuf {
        self.namespace_directory(namespace_path)
            .join(format!("{}.yaml", kind.collection_name()))
    }

    /// Write a file through a temp file + rename so readers never see a torn file
    pub fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, path)
    }
}
