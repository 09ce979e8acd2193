//! Biometric gate abstraction.
//!
//! The platform prompt (Face ID, Touch ID, Android BiometricPrompt) is an
//! external collaborator. The lock engine only needs to know whether it can
//! be offered and whether a prompt succeeded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BiometricError;

/// Result of a completed biometric prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometricOutcome {
    /// User verified.
    Success,
    /// Wrong finger/face or too many tries.
    Failed,
    /// User dismissed the prompt, or the platform timed it out.
    Cancelled,
}

impl BiometricOutcome {
    /// Whether the user was verified.
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Platform biometric provider.
#[async_trait]
pub trait BiometricGate: Send + Sync {
    /// Whether biometric hardware exists on this device.
    async fn hardware_present(&self) -> bool;

    /// Whether at least one biometric is enrolled.
    async fn enrolled(&self) -> bool;

    /// Show the system prompt with `message`.
    async fn prompt(&self, message: &str) -> Result<BiometricOutcome, BiometricError>;

    /// Hardware present and enrolled.
    async fn is_available(&self) -> bool {
        self.hardware_present().await && self.enrolled().await
    }
}

/// Gate for devices without biometrics. Never prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBiometricGate;

#[async_trait]
impl BiometricGate for UnavailableBiometricGate {
    async fn hardware_present(&self) -> bool {
        false
    }

    async fn enrolled(&self) -> bool {
        false
    }

    async fn prompt(&self, _message: &str) -> Result<BiometricOutcome, BiometricError> {
        Err(BiometricError::NotAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGate;

    #[tokio::test]
    async fn test_unavailable_gate() {
        let gate = UnavailableBiometricGate;
        assert!(!gate.is_available().await);
        assert!(matches!(
            gate.prompt("Unlock").await,
            Err(BiometricError::NotAvailable)
        ));
    }

    #[tokio::test]
    async fn test_availability_needs_enrollment() {
        let gate = ScriptedGate::new(BiometricOutcome::Success).with_enrolled(false);
        assert!(gate.hardware_present().await);
        assert!(!gate.is_available().await);

        let gate = ScriptedGate::new(BiometricOutcome::Success);
        assert!(gate.is_available().await);
    }

    #[test]
    fn test_outcome_success() {
        assert!(BiometricOutcome::Success.is_success());
        assert!(!BiometricOutcome::Failed.is_success());
        assert!(!BiometricOutcome::Cancelled.is_success());
    }
}
