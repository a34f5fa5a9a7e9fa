//! # Application Configuration
//!
//! Settings are resolved in three layers:
//!
//! 1. built-in defaults
//! 2. a YAML file: `$CHORE_QUEST_CONFIG` if set, else `<data_dir>/config.yaml` if present
//! 3. environment overrides: `CHORE_QUEST_DATA_DIR`, `CHORE_QUEST_BIND`
//!
//! ```yaml
//! data_dir: "/home/me/Documents/Chore Quest"
//! bind_address: "127.0.0.1:3000"
//! allowed_origin: "http://localhost:8080"
//! seed_defaults: true
//! toast_ttl_ms: 3000
//! render_debounce_ms: 25
//! identity_retry:
//!   max_attempts: 5
//!   initial_backoff_ms: 200
//!   max_backoff_ms: 5000
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const CONFIG_ENV: &str = "CHORE_QUEST_CONFIG";
pub const DATA_DIR_ENV: &str = "CHORE_QUEST_DATA_DIR";
pub const BIND_ENV: &str = "CHORE_QUEST_BIND";

/// Bounded exponential backoff for identity bootstrap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, initial_backoff_ms: 200, max_backoff_ms: 5000 }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), doubling up to the ceiling
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(20);
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bind_address: String,
    pub allowed_origin: String,
    pub seed_defaults: bool,
    pub toast_ttl_ms: u64,
    pub render_debounce_ms: u64,
    pub identity_retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bind_address: "127.0.0.1:3000".to_string(),
            allowed_origin: "http://localhost:8080".to_string(),
            seed_defaults: true,
            toast_ttl_ms: 3000,
            render_debounce_ms: 25,
            identity_retry: RetryPolicy::default(),
        }
    }
}

/// `~/Documents/Chore Quest`, or `./Chore Quest` when no documents directory is known
pub fn default_data_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Chore Quest")
}

impl AppConfig {
    /// Defaults suitable for tests: everything lives under `data_dir`
    pub fn for_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self { data_dir: data_dir.as_ref().to_path_buf(), ..Self::default() }
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    pub fn render_debounce(&self) -> Duration {
        Duration::from_millis(self.render_debounce_ms)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("⚙️ Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve the configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration, reading environment variables through `env`
    pub fn load_with<F>(env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_data_dir = env(DATA_DIR_ENV).map(PathBuf::from);

        let mut config = match env(CONFIG_ENV) {
            Some(path) => Self::from_yaml_file(Path::new(&path))?,
            None => {
                let data_dir = env_data_dir.clone().unwrap_or_else(default_data_dir);
                let candidate = data_dir.join("config.yaml");
                if candidate.exists() {
                    Self::from_yaml_file(&candidate)?
                } else {
                    Self::for_data_dir(data_dir)
                }
            }
        };

        if let Some(data_dir) = env_data_dir {
            config.data_dir = data_dir;
        }
        if let Some(bind) = env(BIND_ENV) {
            config.bind_address = bind;
        }
        Ok(config)
    }
}
