//! FinTrack app lock - Rust backend
//!
//! PIN and biometric app lock for the FinTrack mobile client. Settings are
//! kept per signed-in user in the OS keychain; the [`LockStateMachine`]
//! decides when the lock screen is shown and is the only write path to
//! those settings. With the `tauri` feature the engine is exposed to the
//! webview as a plugin.

pub mod biometrics;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod lock;
pub mod pin_entry;
pub mod scope;
pub mod secret_store;
pub mod security;
pub mod storage;

#[cfg(feature = "tauri")]
pub mod plugin;

#[cfg(test)]
mod test_support;

pub use biometrics::{BiometricGate, BiometricOutcome, UnavailableBiometricGate};
pub use config::{LockConfig, StoreBackend};
pub use error::{BiometricError, LockError, StoreError};
pub use fintrack_crypto::{CredentialHasher, Pin, Sha256PinHasher};
pub use lifecycle::{lifecycle_channel, AppPhase, LifecycleFeed, LifecycleWorker};
pub use lock::{LockStateMachine, LockStatus};
pub use pin_entry::{EntryProgress, PinEntry, PinPolicy};
pub use scope::{UserIdentity, UserScope};
pub use secret_store::{KeyringSecretStore, MemorySecretStore, SecretStore};
pub use security::{LockPhase, LockRuntimeState, LockSettings, LockSettingsUpdate};
pub use storage::LockSettingsRepository;
