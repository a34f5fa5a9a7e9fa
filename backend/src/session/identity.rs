//! # Anonymous Identity
//!
//! Each install owns one anonymous identity, created on first use and kept in
//! `<data_dir>/identity.yaml`. All documents of the identity live under the
//! namespace `users/<user_id>`.
//!
//! If the identity cannot be established after the configured retries the
//! whole application enters a fatal state: nothing is read or written.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RetryPolicy;
use crate::storage::YamlConnection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub user_id: String,
    pub created_at: String,
}

/// The per-identity data namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNamespace {
    pub user_id: String,
    /// `users/<user_id>`
    pub root_path: String,
}

impl UserNamespace {
    pub fn new(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let root_path = format!("users/{}", user_id);
        Self { user_id, root_path }
    }

    pub fn current_user_id(&self) -> &str {
        &self.user_id
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("could not establish an identity after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },
}

/// Source of the anonymous identity
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Return the existing identity, creating one if none exists
    async fn sign_in_anonymously(&self) -> Result<IdentityRecord>;
}

/// Identity persisted in a YAML file
#[derive(Debug, Clone)]
pub struct FileIdentityProvider {
    path: PathBuf,
}

impl FileIdentityProvider {
    pub fn new(connection: &YamlConnection) -> Self {
        Self { path: connection.identity_file_path() }
    }
}

#[async_trait]
impl IdentityProvider for FileIdentityProvider {
    async fn sign_in_anonymously(&self) -> Result<IdentityRecord> {
        if self.path.exists() {
            let content = fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {}", self.path.display()))?;
            let record: IdentityRecord = serde_yaml::from_str(&content)
                .with_context(|| format!("Corrupt identity file {}", self.path.display()))?;
            return Ok(record);
        }

        let record = IdentityRecord {
            user_id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        let yaml = serde_yaml::to_string(&record)?;
        YamlConnection::write_atomic(&self.path, &yaml)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        info!("🆕 Created anonymous identity {}", record.user_id);
        Ok(record)
    }
}

/// Sign in with bounded exponential backoff
pub async fn bootstrap_identity(
    provider: &dyn IdentityProvider,
    policy: &RetryPolicy,
) -> Result<UserNamespace, IdentityError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match provider.sign_in_anonymously().await {
            Ok(record) => {
                info!("🔑 Signed in as {} (attempt {})", record.user_id, attempt);
                return Ok(UserNamespace::new(record.user_id));
            }
            Err(e) => {
                last_error = format!("{:#}", e);
                warn!("Identity attempt {}/{} failed: {}", attempt, max_attempts, last_error);
                if attempt < max_attempts {
                    tokio::time::sleep(policy.backoff(attempt)).await;
                }
            }
        }
    }

    Err(IdentityError::Unavailable { attempts: max_attempts, last_error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    struct FlakyProvider {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl IdentityProvider for FlakyProvider {
        async fn sign_in_anonymously(&self) -> Result<IdentityRecord> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures_before_success {
                anyhow::bail!("network down");
            }
            Ok(IdentityRecord { user_id: "flaky-user".to_string(), created_at: String::new() })
        }
    }

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, initial_backoff_ms: 1, max_backoff_ms: 2 }
    }

    #[tokio::test]
    async fn test_identity_is_stable_across_sign_ins() {
        let temp_dir = TempDir::new().unwrap();
        let connection = YamlConnection::new(temp_dir.path()).unwrap();
        let provider = FileIdentityProvider::new(&connection);

        let first = provider.sign_in_anonymously().await.unwrap();
        let second = provider.sign_in_anonymously().await.unwrap();
        assert_eq!(first.user_id, second.user_id);
        assert!(connection.identity_file_path().exists());

        let namespace = UserNamespace::new(first.user_id.clone());
        assert_eq!(namespace.root_path, format!("users/{}", first.user_id));
        assert_eq!(namespace.current_user_id(), first.user_id);
    }

    #[tokio::test]
    async fn test_bootstrap_retries_until_success() {
        let provider = FlakyProvider { failures_before_success: 2, calls: AtomicU32::new(0) };

        let namespace = bootstrap_identity(&provider, &quick_policy(5)).await.unwrap();
        assert_eq!(namespace.user_id, "flaky-user");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_bootstrap_gives_up_after_max_attempts() {
        let provider = FlakyProvider { failures_before_success: u32::MAX, calls: AtomicU32::new(0) };

        let error = bootstrap_identity(&provider, &quick_policy(3)).await.unwrap_err();
        let IdentityError::Unavailable { attempts, last_error } = error;
        assert_eq!(attempts, 3);
        assert!(last_error.contains("network down"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }
}
