//! # Local Preferences Repository
//!
//! Client-local flags kept in `<data_dir>/local_preferences.yaml`. These are
//! never written to the document store.
//!
//! ```yaml
//! active_child_id: "child::1760000000000::1a2b3c4d"
//! first_run_seen: true
//! background_audio_enabled: false
//! ```

use anyhow::Result;
use shared::LocalPreferences;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::storage::YamlConnection;

#[derive(Debug, Clone)]
pub struct PreferencesRepository {
    path: PathBuf,
    cached: Arc<Mutex<LocalPreferences>>,
}

impl PreferencesRepository {
    /// Load preferences from disk; a missing or unreadable file yields defaults
    pub fn load(connection: &YamlConnection) -> Self {
        let path = connection.preferences_file_path();
        let preferences = match fs::read_to_string(&path) {
            Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring corrupt preferences file {}: {}", path.display(), e);
                LocalPreferences::default()
            }),
            Err(_) => LocalPreferences::default(),
        };
        debug!("Loaded local preferences: {:?}", preferences);
        Self { path, cached: Arc::new(Mutex::new(preferences)) }
    }

    pub fn get(&self) -> LocalPreferences {
        self.cached.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Apply `change` and persist the result
    pub fn update(&self, change: impl FnOnce(&mut LocalPreferences)) -> Result<LocalPreferences> {
        let mut cached = self.cached.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next = cached.clone();
        change(&mut next);
        if next == *cached {
            return Ok(next);
        }

        let yaml = serde_yaml::to_string(&next)?;
        YamlConnection::write_atomic(&self.path, &yaml)?;
        *cached = next.clone();
        debug!("Saved local preferences to {}", self.path.display());
        Ok(next)
    }

    pub fn set_active_child(&self, child_id: Option<String>) -> Result<()> {
        info!("👤 Active child set to {:?}", child_id);
        self.update(|prefs| prefs.active_child_id = child_id)?;
        Ok(())
    }
}
