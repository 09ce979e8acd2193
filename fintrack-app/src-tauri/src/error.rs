//! Error types for the lock subsystem.
//!
//! None of these escape the public lock API: the repository and the state
//! machine catch them, log them, and answer `false`/`None`.

use thiserror::Error;

/// Failures of the underlying secret store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The OS keychain refused or failed the request.
    #[error("secure store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the key.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// A blocking store task did not complete.
    #[error("store task failed: {0}")]
    Task(String),
}

/// Failures of the biometric subsystem.
#[derive(Debug, Error)]
pub enum BiometricError {
    /// No biometric hardware on this device.
    #[error("biometric hardware not available")]
    NotAvailable,

    /// Hardware present but nothing enrolled.
    #[error("no biometrics enrolled")]
    NotEnrolled,

    /// Platform API failure.
    #[error("biometric platform error: {0}")]
    Platform(String),
}

/// Errors raised inside the lock subsystem.
#[derive(Debug, Error)]
pub enum LockError {
    /// Reading, writing or deleting settings failed.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// Persisted settings could not be encoded or decoded.
    #[error("settings serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted or merged settings break the enabled-implies-hash rule.
    #[error("invalid lock settings: {0}")]
    InvalidSettings(&'static str),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for lock subsystem internals.
pub type Result<T> = std::result::Result<T, LockError>;
