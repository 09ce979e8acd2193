//! App lock state machine.
//!
//! ```text
//! UNINITIALIZED ──load──▶ LOADING ──no settings / disabled──▶ UNLOCKED_NO_LOCK
//!                            │
//!                            └──enabled──▶ LOCKED ◀──leave foreground── UNLOCKED
//!                                            │                             ▲
//!                                            └──── PIN / biometrics ───────┘
//! ```
//!
//! Any state goes back to LOADING when the signed-in user changes.
//!
//! Every mutating operation persists first and only then touches the
//! runtime state, so the UI never shows a setting that failed to save.
//! Read-modify-write sequences on the settings hold a per-scope mutex.
//!
//! Failed PIN attempts are neither counted nor throttled.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use fintrack_crypto::{CredentialHasher, Pin, Sha256PinHasher};

use crate::biometrics::BiometricGate;
use crate::config::LockConfig;
use crate::lifecycle::{AppPhase, LifecycleTracker, PhaseTransition};
use crate::pin_entry::PinEntry;
use crate::scope::{UserIdentity, UserScope};
use crate::secret_store::SecretStore;
use crate::security::{LockPhase, LockRuntimeState, LockSettings, LockSettingsUpdate};
use crate::storage::LockSettingsRepository;

// ============================================================================
// STATUS
// ============================================================================

/// Everything the lock screen needs to render, in one read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStatus {
    pub phase: LockPhase,
    #[serde(flatten)]
    pub state: LockRuntimeState,
    pub pin_length: usize,
}

// ============================================================================
// STATE MACHINE
// ============================================================================

struct Inner {
    scope: UserScope,
    /// Bumped on every (re)load so results computed for a previous scope
    /// are not applied to the current one.
    generation: u64,
    runtime: LockRuntimeState,
    lifecycle: LifecycleTracker,
}

impl Inner {
    fn unlock(&mut self) {
        self.runtime.is_locked = false;
        // Unlocking takes user input, so the app is in the foreground
        // whatever the last reported phase was.
        self.lifecycle = LifecycleTracker::new(AppPhase::Active);
    }
}

/// The app lock. One instance per app, owned by the host and shared by
/// reference with whatever renders the lock screen.
pub struct LockStateMachine {
    repository: LockSettingsRepository,
    hasher: Arc<dyn CredentialHasher>,
    biometrics: Arc<dyn BiometricGate>,
    config: LockConfig,
    inner: RwLock<Inner>,
    scope_locks: Mutex<HashMap<UserScope, Arc<Mutex<()>>>>,
}

impl LockStateMachine {
    /// Lock engine over `store`, starting in the global scope.
    pub fn new(
        store: Arc<dyn SecretStore>,
        biometrics: Arc<dyn BiometricGate>,
        config: LockConfig,
    ) -> Self {
        Self {
            repository: LockSettingsRepository::new(store),
            hasher: Arc::new(Sha256PinHasher),
            biometrics,
            config,
            inner: RwLock::new(Inner {
                scope: UserScope::global(),
                generation: 0,
                runtime: LockRuntimeState::default(),
                lifecycle: LifecycleTracker::default(),
            }),
            scope_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lock engine using the store named in `config`.
    pub fn from_config(config: LockConfig, biometrics: Arc<dyn BiometricGate>) -> Self {
        let store = config.build_store();
        Self::new(store, biometrics, config)
    }

    /// Replace the PIN hasher.
    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    // ------------------------------------------------------------------------
    // Loading and scope
    // ------------------------------------------------------------------------

    /// Load settings for the current scope. Called once on mount.
    pub async fn load(&self) -> LockPhase {
        let scope = self.inner.read().await.scope.clone();
        self.reload(scope).await
    }

    /// React to the signed-in user changing. Reloads only when the derived
    /// scope differs from the current one (or nothing was loaded yet).
    pub async fn switch_user(&self, identity: Option<&UserIdentity>) -> LockPhase {
        let scope = UserScope::from_identity(identity);
        {
            let inner = self.inner.read().await;
            if inner.scope == scope && inner.runtime.initialized {
                return inner.runtime.phase();
            }
        }
        self.reload(scope).await
    }

    async fn reload(&self, scope: UserScope) -> LockPhase {
        let generation = {
            let mut inner = self.inner.write().await;
            inner.scope = scope.clone();
            inner.generation += 1;
            inner.runtime = LockRuntimeState::loading();
            inner.generation
        };
        tracing::debug!("Loading lock settings for {}", scope);

        let settings = self.repository.get(&scope).await;

        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            return inner.runtime.phase();
        }
        inner.runtime = LockRuntimeState::loaded(settings.as_ref());
        let phase = inner.runtime.phase();
        tracing::info!("App lock for {} is {:?}", scope, phase);
        phase
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Copy of the runtime state.
    pub async fn snapshot(&self) -> LockRuntimeState {
        self.inner.read().await.runtime.clone()
    }

    /// Current phase.
    pub async fn phase(&self) -> LockPhase {
        self.inner.read().await.runtime.phase()
    }

    /// Last lifecycle phase applied.
    pub async fn app_phase(&self) -> AppPhase {
        self.inner.read().await.lifecycle.current()
    }

    /// Current scope.
    pub async fn scope(&self) -> UserScope {
        self.inner.read().await.scope.clone()
    }

    /// Render-ready status.
    pub async fn status(&self) -> LockStatus {
        let state = self.snapshot().await;
        LockStatus {
            phase: state.phase(),
            state,
            pin_length: self.config.pin_policy().length,
        }
    }

    /// Persisted settings for the current scope.
    pub async fn settings(&self) -> Option<LockSettings> {
        let scope = self.scope().await;
        self.repository.get(&scope).await
    }

    /// Whether the device can do biometrics right now.
    pub async fn is_biometrics_available(&self) -> bool {
        self.biometrics.is_available().await
    }

    // ------------------------------------------------------------------------
    // Unlocking
    // ------------------------------------------------------------------------

    /// Unlock with a PIN. A wrong PIN changes nothing.
    pub async fn unlock_with_pin(&self, pin: &Pin) -> bool {
        let (scope, generation) = self.current().await;

        let Some(settings) = self.repository.get(&scope).await else {
            tracing::debug!("PIN unlock for {} without lock settings", scope);
            return false;
        };

        if !self.hasher.verify(pin, &settings.pin_hash) {
            tracing::info!("PIN rejected for {}", scope);
            return false;
        }

        self.reflect(generation, Inner::unlock).await
    }

    /// Empty keypad buffer for the configured PIN length.
    pub fn pin_entry(&self) -> PinEntry {
        PinEntry::new(self.config.pin_policy())
    }

    /// Submit a full keypad buffer as a PIN unlock. An incomplete buffer is
    /// left as is and nothing is checked.
    pub async fn submit_pin_entry(&self, entry: &mut PinEntry) -> bool {
        match entry.take() {
            Some(pin) => self.unlock_with_pin(&pin).await,
            None => false,
        }
    }

    /// Unlock through the system biometric prompt.
    pub async fn unlock_with_biometrics(&self) -> bool {
        let (enabled, generation) = {
            let inner = self.inner.read().await;
            (
                inner.runtime.is_biometrics_enabled && inner.runtime.requires_unlock(),
                inner.generation,
            )
        };
        if !enabled {
            return false;
        }
        if !self.biometrics.is_available().await {
            tracing::debug!("Biometric unlock requested but no biometrics available");
            return false;
        }

        match self.biometrics.prompt(&self.config.biometric_prompt).await {
            Ok(outcome) if outcome.is_success() => {
                self.reflect(generation, Inner::unlock).await
            }
            Ok(outcome) => {
                tracing::info!("Biometric unlock not completed: {:?}", outcome);
                false
            }
            Err(e) => {
                tracing::warn!("Biometric prompt failed: {}", e);
                false
            }
        }
    }

    /// Lock immediately. Only meaningful with the lock enabled.
    pub async fn lock_now(&self) -> bool {
        let mut inner = self.inner.write().await;
        let state = &mut inner.runtime;
        if !state.is_app_lock_enabled || state.is_loading {
            return false;
        }
        state.is_locked = true;
        true
    }

    /// Feed a host lifecycle event. Leaving the foreground with the lock
    /// enabled locks; returning to the foreground never unlocks.
    pub async fn handle_lifecycle(&self, phase: AppPhase) -> LockPhase {
        let mut inner = self.inner.write().await;
        let transition = inner.lifecycle.advance(phase);
        let state = &mut inner.runtime;

        if transition == PhaseTransition::LeftForeground
            && state.is_app_lock_enabled
            && !state.is_locked
        {
            state.is_locked = true;
            tracing::debug!("App left foreground, locked");
        }
        state.phase()
    }

    // ------------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------------

    /// Turn the lock on with a new PIN, replacing any previous settings.
    pub async fn enable_lock(&self, pin: &Pin, enable_biometrics: bool) -> bool {
        if !self.config.pin_policy().accepts(pin) {
            tracing::info!(
                "Rejected PIN that does not match the {}-digit policy",
                self.config.pin_length
            );
            return false;
        }

        let (scope, generation) = self.current().await;
        let _guard = self.scope_guard(&scope).await;

        let settings = LockSettings::enabled(self.hasher.hash(pin), enable_biometrics);
        if !self.repository.save(&settings, &scope).await {
            return false;
        }

        self.reflect(generation, |inner| {
            inner.runtime.is_app_lock_enabled = true;
            inner.runtime.is_biometrics_enabled = enable_biometrics;
        })
        .await;
        tracing::info!("App lock enabled for {}", scope);
        true
    }

    /// Turn the lock off and forget the PIN.
    pub async fn disable_lock(&self) -> bool {
        let (scope, generation) = self.current().await;
        let _guard = self.scope_guard(&scope).await;

        if !self.repository.delete(&scope).await {
            return false;
        }

        self.reflect(generation, |inner| {
            let state = &mut inner.runtime;
            state.is_app_lock_enabled = false;
            state.is_biometrics_enabled = false;
            state.is_locked = false;
        })
        .await;
        tracing::info!("App lock disabled for {}", scope);
        true
    }

    /// Merge `update` into the persisted settings.
    pub async fn update_settings(&self, update: &LockSettingsUpdate) -> bool {
        let (scope, generation) = self.current().await;
        let _guard = self.scope_guard(&scope).await;

        let Some(current) = self.repository.get(&scope).await else {
            tracing::debug!("Settings update for {} without lock settings", scope);
            return false;
        };

        if update.is_empty() {
            return true;
        }

        let merged = current.merged(update);
        if let Err(e) = merged.validate() {
            tracing::warn!("Refusing settings update for {}: {}", scope, e);
            return false;
        }
        if !self.repository.save(&merged, &scope).await {
            return false;
        }

        self.reflect(generation, |inner| {
            let state = &mut inner.runtime;
            if let Some(enabled) = update.is_enabled {
                state.is_app_lock_enabled = enabled;
                if !enabled {
                    state.is_locked = false;
                }
            }
            if let Some(biometrics) = update.biometrics_enabled {
                state.is_biometrics_enabled = biometrics;
            }
        })
        .await;
        true
    }

    /// Verify `old`, then store `new`. Two steps: if the second fails the
    /// old PIN stays in force.
    pub async fn change_pin(&self, old: &Pin, new: &Pin) -> bool {
        if !self.unlock_with_pin(old).await {
            return false;
        }
        let biometrics = self.inner.read().await.runtime.is_biometrics_enabled;
        self.enable_lock(new, biometrics).await
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn current(&self) -> (UserScope, u64) {
        let inner = self.inner.read().await;
        (inner.scope.clone(), inner.generation)
    }

    /// Apply `apply` to the in-memory state unless the scope was reloaded
    /// since `generation` was read.
    async fn reflect(&self, generation: u64, apply: impl FnOnce(&mut Inner)) -> bool {
        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            tracing::debug!("Scope changed during operation; result not applied");
            return false;
        }
        apply(&mut *inner);
        true
    }

    async fn scope_guard(&self, scope: &UserScope) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.scope_locks.lock().await;
            locks
                .entry(scope.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

// ============================================================================
// TESTS
// ============================================================================
