//! Secret store backends.
//!
//! The lock settings live in an encrypted, OS-backed key/value store. The
//! [`SecretStore`] trait is the seam; [`KeyringSecretStore`] talks to the
//! platform keychain and [`MemorySecretStore`] keeps everything in process.

use std::collections::HashMap;

use async_trait::async_trait;
use keyring::Entry;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Key-scoped string store. Every call may fail.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key has never been written.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write or overwrite a value.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Removing a missing key succeeds.
    async fn delete_item(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// OS KEYCHAIN
// ============================================================================

/// Platform keychain store (Keychain, Credential Manager, Secret Service).
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    /// Store whose entries are filed under `service`.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(service: &str, key: &str) -> Result<Entry, StoreError> {
        Entry::new(service, key).map_err(|e| StoreError::InvalidKey(format!("{key}: {e}")))
    }

    // Keychain calls block on IPC with the OS credential daemon.
    async fn run<T, F>(&self, key: &str, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> Result<T, StoreError> + Send + 'static,
    {
        let entry = Self::entry(&self.service, key)?;
        tokio::task::spawn_blocking(move || op(entry))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl SecretStore for KeyringSecretStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.run(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::Unavailable(format!("load: {e}"))),
        })
        .await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let value = zeroize::Zeroizing::new(value.to_owned());
        self.run(key, move |entry| {
            entry
                .set_password(&value)
                .map_err(|e| StoreError::Unavailable(format!("store: {e}")))
        })
        .await
    }

    async fn delete_item(&self, key: &str) -> Result<(), StoreError> {
        self.run(key, |entry| match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::Unavailable(format!("delete: {e}"))),
        })
        .await
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Process-local store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently held, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.write().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
