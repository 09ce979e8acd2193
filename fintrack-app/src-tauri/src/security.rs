//! Security model for the FinTrack app lock.
//!
//! - [`LockSettings`]: the persisted per-user record
//! - [`LockSettingsUpdate`]: typed partial update merged over it
//! - [`LockRuntimeState`]: in-memory state the UI renders from

use serde::{Deserialize, Serialize};

use crate::error::{LockError, Result};

// ============================================================================
// PERSISTED SETTINGS
// ============================================================================

/// Lock configuration stored in the secure store, one record per user scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockSettings {
    /// Whether app lock is active at all.
    pub is_enabled: bool,
    /// Whether biometric unlock is offered next to the PIN.
    pub biometrics_enabled: bool,
    /// Digest of the PIN, never the raw PIN.
    pub pin_hash: String,
}

impl LockSettings {
    /// Fresh enabled settings for a newly chosen PIN.
    pub fn enabled(pin_hash: String, biometrics_enabled: bool) -> Self {
        Self {
            is_enabled: true,
            biometrics_enabled,
            pin_hash,
        }
    }

    /// An enabled lock must carry a PIN digest.
    pub fn validate(&self) -> Result<()> {
        if self.is_enabled && self.pin_hash.is_empty() {
            return Err(LockError::InvalidSettings("lock enabled without a PIN hash"));
        }
        Ok(())
    }

    /// Shallow merge: every field present in `update` wins.
    pub fn merged(&self, update: &LockSettingsUpdate) -> Self {
        Self {
            is_enabled: update.is_enabled.unwrap_or(self.is_enabled),
            biometrics_enabled: update
                .biometrics_enabled
                .unwrap_or(self.biometrics_enabled),
            pin_hash: update
                .pin_hash
                .clone()
                .unwrap_or_else(|| self.pin_hash.clone()),
        }
    }
}

/// Partial update of [`LockSettings`]. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometrics_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_hash: Option<String>,
}

impl LockSettingsUpdate {
    /// Update that only toggles biometrics.
    pub fn biometrics(enabled: bool) -> Self {
        Self {
            biometrics_enabled: Some(enabled),
            ..Default::default()
        }
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.is_enabled.is_none() && self.biometrics_enabled.is_none() && self.pin_hash.is_none()
    }
}

// ============================================================================
// RUNTIME STATE
// ============================================================================

/// Coarse lock state derived from [`LockRuntimeState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockPhase {
    /// Nothing loaded yet.
    Uninitialized,
    /// Settings fetch in flight.
    Loading,
    /// Lock feature disabled for this user.
    UnlockedNoLock,
    /// Unlock screen must be shown.
    Locked,
    /// Lock enabled, user authenticated.
    Unlocked,
}

/// In-memory lock state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRuntimeState {
    pub is_locked: bool,
    pub is_app_lock_enabled: bool,
    pub is_biometrics_enabled: bool,
    pub is_loading: bool,
    #[serde(skip)]
    pub(crate) initialized: bool,
}

impl Default for LockRuntimeState {
    fn default() -> Self {
        Self {
            is_locked: false,
            is_app_lock_enabled: false,
            is_biometrics_enabled: false,
            is_loading: true,
            initialized: false,
        }
    }
}

impl LockRuntimeState {
    /// State while settings for a scope are being fetched.
    pub(crate) fn loading() -> Self {
        Self {
            initialized: true,
            ..Default::default()
        }
    }

    /// State after a settings fetch. Cold starts with the lock enabled
    /// always begin locked.
    pub(crate) fn loaded(settings: Option<&LockSettings>) -> Self {
        match settings {
            Some(s) if s.is_enabled => Self {
                is_locked: true,
                is_app_lock_enabled: true,
                is_biometrics_enabled: s.biometrics_enabled,
                is_loading: false,
                initialized: true,
            },
            _ => Self {
                is_locked: false,
                is_app_lock_enabled: false,
                is_biometrics_enabled: false,
                is_loading: false,
                initialized: true,
            },
        }
    }

    /// Current coarse phase.
    pub fn phase(&self) -> LockPhase {
        if !self.initialized {
            LockPhase::Uninitialized
        } else if self.is_loading {
            LockPhase::Loading
        } else if !self.is_app_lock_enabled {
            LockPhase::UnlockedNoLock
        } else if self.is_locked {
            LockPhase::Locked
        } else {
            LockPhase::Unlocked
        }
    }

    /// Whether the UI must show the unlock screen.
    pub fn requires_unlock(&self) -> bool {
        self.phase() == LockPhase::Locked
    }
}

// ============================================================================
// TESTS
// ============================================================================
