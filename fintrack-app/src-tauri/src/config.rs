//! App lock configuration.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{LockError, Result};
use crate::pin_entry::PinPolicy;
use crate::secret_store::{KeyringSecretStore, MemorySecretStore, SecretStore};

/// Where lock settings are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// OS keychain.
    Keyring,
    /// Process memory only (tests, devices without a keychain).
    Memory,
}

/// Configuration for the app lock engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LockConfig {
    /// Keychain service entries are filed under.
    pub keyring_service: String,
    /// Text shown in the system biometric prompt.
    pub biometric_prompt: String,
    /// Digits in a PIN.
    pub pin_length: usize,
    /// Settings backend.
    pub store: StoreBackend,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            keyring_service: "FinTrack".into(),
            biometric_prompt: "Unlock FinTrack".into(),
            pin_length: 4,
            store: StoreBackend::Keyring,
        }
    }
}

impl LockConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LockError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if PinPolicy::new(self.pin_length).is_none() {
            return Err(LockError::Config(format!(
                "unsupported PIN length {}",
                self.pin_length
            )));
        }
        if self.store == StoreBackend::Keyring && self.keyring_service.trim().is_empty() {
            return Err(LockError::Config("keyring service name is empty".into()));
        }
        Ok(())
    }

    /// PIN policy for the configured length. Falls back to the default
    /// policy for an unsupported length.
    pub fn pin_policy(&self) -> PinPolicy {
        PinPolicy::new(self.pin_length).unwrap_or_default()
    }

    /// Instantiate the configured store.
    pub fn build_store(&self) -> Arc<dyn SecretStore> {
        match self.store {
            StoreBackend::Keyring => Arc::new(KeyringSecretStore::new(&self.keyring_service)),
            StoreBackend::Memory => Arc::new(MemorySecretStore::new()),
        }
    }
}
