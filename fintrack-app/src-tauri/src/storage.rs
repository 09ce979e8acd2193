//! Lock settings persistence.
//!
//! One JSON record per user scope, stored under
//! `app_lock_settings_<sanitized-scope>` in the secret store.

use std::sync::Arc;

use crate::error::Result;
use crate::scope::UserScope;
use crate::secret_store::SecretStore;
use crate::security::LockSettings;

/// Storage key prefix for lock settings.
pub const SETTINGS_KEY_PREFIX: &str = "app_lock_settings_";

/// Storage key for a scope.
pub fn settings_key(scope: &UserScope) -> String {
    format!("{}{}", SETTINGS_KEY_PREFIX, scope.sanitized())
}

// ============================================================================
// REPOSITORY
// ============================================================================

/// Reads and writes [`LockSettings`] through a [`SecretStore`].
///
/// Failures never propagate: they are logged and reported as `None` or
/// `false` so the lock screen keeps working with a broken keychain.
#[derive(Clone)]
pub struct LockSettingsRepository {
    store: Arc<dyn SecretStore>,
}

impl LockSettingsRepository {
    /// Repository backed by `store`.
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Settings for `scope`, or `None` when absent, unreadable or invalid.
    pub async fn get(&self, scope: &UserScope) -> Option<LockSettings> {
        match self.load(scope).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to read lock settings for {}: {}", scope, e);
                None
            }
        }
    }

    /// Persist `settings` for `scope`.
    pub async fn save(&self, settings: &LockSettings, scope: &UserScope) -> bool {
        match self.store_settings(settings, scope).await {
            Ok(()) => {
                tracing::debug!("Saved lock settings for {}", scope);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to save lock settings for {}: {}", scope, e);
                false
            }
        }
    }

    /// Remove the settings for `scope`.
    pub async fn delete(&self, scope: &UserScope) -> bool {
        match self.store.delete_item(&settings_key(scope)).await {
            Ok(()) => {
                tracing::debug!("Deleted lock settings for {}", scope);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to delete lock settings for {}: {}", scope, e);
                false
            }
        }
    }

    async fn load(&self, scope: &UserScope) -> Result<Option<LockSettings>> {
        let Some(json) = self.store.get_item(&settings_key(scope)).await? else {
            return Ok(None);
        };
        let settings: LockSettings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(Some(settings))
    }

    async fn store_settings(&self, settings: &LockSettings, scope: &UserScope) -> Result<()> {
        settings.validate()?;
        let json = zeroize::Zeroizing::new(serde_json::to_string(settings)?);
        self.store.set_item(&settings_key(scope), &json).await?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret_store::MemorySecretStore;
    use crate::test_support::FaultyStore;

    fn sample() -> LockSettings {
        LockSettings::enabled("feedface".into(), true)
    }

    #[test]
    fn test_settings_key() {
        assert_eq!(settings_key(&UserScope::new("u1")), "app_lock_settings_u1");
        assert_eq!(
            settings_key(&UserScope::new("jane@example.com")),
            "app_lock_settings_jane_example.com"
        );
        assert_eq!(settings_key(&UserScope::global()), "app_lock_settings_global");
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let repo = LockSettingsRepository::new(Arc::new(MemorySecretStore::new()));
        let scope = UserScope::new("u1");

        assert_eq!(repo.get(&scope).await, None);
        assert!(repo.save(&sample(), &scope).await);
        assert_eq!(repo.get(&scope).await, Some(sample()));
        assert!(repo.delete(&scope).await);
        assert_eq!(repo.get(&scope).await, None);
    }

    #[tokio::test]
    async fn test_persisted_json_layout() {
        let store = Arc::new(MemorySecretStore::new());
        let repo = LockSettingsRepository::new(store.clone());
        let scope = UserScope::new("u1");

        assert!(repo.save(&sample(), &scope).await);

        let raw = store
            .get_item("app_lock_settings_u1")
            .await
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"isEnabled": true, "biometricsEnabled": true, "pinHash": "feedface"})
        );
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let store = Arc::new(MemorySecretStore::new());
        let repo = LockSettingsRepository::new(store.clone());

        assert!(repo.save(&sample(), &UserScope::new("u1")).await);

        assert_eq!(repo.get(&UserScope::new("u2")).await, None);
        assert_eq!(store.keys().await, vec!["app_lock_settings_u1".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_record_reads_as_absent() {
        let store = Arc::new(MemorySecretStore::new());
        store
            .set_item("app_lock_settings_u1", "{not json")
            .await
            .unwrap();
        store
            .set_item(
                "app_lock_settings_u2",
                r#"{"isEnabled":true,"biometricsEnabled":false,"pinHash":""}"#,
            )
            .await
            .unwrap();
        let repo = LockSettingsRepository::new(store);

        assert_eq!(repo.get(&UserScope::new("u1")).await, None);
        assert_eq!(repo.get(&UserScope::new("u2")).await, None);
    }

    #[tokio::test]
    async fn test_store_failures_map_to_false() {
        let store = Arc::new(FaultyStore::new());
        let repo = LockSettingsRepository::new(store.clone());
        let scope = UserScope::new("u1");

        assert!(repo.save(&sample(), &scope).await);

        store.fail_all(true);
        assert_eq!(repo.get(&scope).await, None);
        assert!(!repo.save(&sample(), &scope).await);
        assert!(!repo.delete(&scope).await);

        store.fail_all(false);
        assert_eq!(repo.get(&scope).await, Some(sample()));
    }

    #[tokio::test]
    async fn test_invalid_settings_are_not_written() {
        let store = Arc::new(FaultyStore::new());
        let repo = LockSettingsRepository::new(store.clone());

        let broken = LockSettings::enabled(String::new(), false);
        assert!(!repo.save(&broken, &UserScope::new("u1")).await);
        assert_eq!(store.writes(), 0);
    }
}
